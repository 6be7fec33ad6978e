// Copyright (C) 2025 Kevin Exton
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Deliberately covers both "unknown user" and "wrong password" so
    /// callers cannot enumerate accounts.
    #[error("Invalid username or password")]
    InvalidCredentials,
    #[error("Username '{0}' is already taken")]
    UsernameTaken(String),
    #[error("Email '{0}' is already taken")]
    EmailTaken(String),
    #[error("Password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
    #[error("Token signing failed: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("Google sign-in is not configured")]
    GoogleNotConfigured,
    #[error("Google token was rejected")]
    GoogleTokenRejected,
    #[error("Google verification request failed: {0}")]
    GoogleRequest(#[from] reqwest::Error),
    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UsernameTaken(username) => AuthError::UsernameTaken(username),
            StoreError::EmailTaken(email) => AuthError::EmailTaken(email),
            other => AuthError::Storage(other),
        }
    }
}
