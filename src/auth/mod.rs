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
use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{NewUser, PublicUser, Role, User};
use crate::store::Storage;

pub mod errors;
pub mod google;

pub use errors::AuthError;
pub use google::{GoogleAuth, GoogleProfile};

const TOKEN_TTL_DAYS: i64 = 7;

/// JWT claims embedded at issuance and handed back by verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Expiration time (seconds since epoch).
    pub exp: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Outcome of a successful register/login: the password-stripped user
/// plus a signed bearer token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: PublicUser,
    pub token: String,
}

/// Registration, login and token issuance on top of [`Storage`].
/// Hashing and signing are delegated to bcrypt and jsonwebtoken; this
/// service implements no cryptography of its own.
pub struct AuthService {
    store: Arc<dyn Storage>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(store: Arc<dyn Storage>, jwt_secret: &str) -> Self {
        AuthService {
            store,
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }

    /// Lowers the bcrypt work factor. Only sensible in tests.
    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn store(&self) -> &Arc<dyn Storage> {
        &self.store
    }

    /// Creates the account and signs the first token. Uniqueness is
    /// enforced atomically by the store; a duplicate surfaces as
    /// [`AuthError::UsernameTaken`] / [`AuthError::EmailTaken`] without
    /// mutating anything.
    pub async fn register(&self, request: RegisterRequest) -> Result<AuthSession, AuthError> {
        let hashed_password = bcrypt::hash(&request.password, self.bcrypt_cost)?;
        let user = self
            .store
            .create_user(NewUser {
                username: request.username,
                email: request.email,
                hashed_password,
                full_name: request.full_name,
                role: request.role,
            })
            .await?;
        self.session_for(user)
    }

    /// Looks the account up by username, falling back to email. Unknown
    /// identifier and wrong password fail identically.
    pub async fn login(&self, credentials: LoginRequest) -> Result<AuthSession, AuthError> {
        let user = match self.store.get_user_by_username(&credentials.username).await? {
            Some(user) => Some(user),
            None => self.store.get_user_by_email(&credentials.username).await?,
        };
        let Some(user) = user else {
            return Err(AuthError::InvalidCredentials);
        };
        if !bcrypt::verify(&credentials.password, &user.hashed_password)? {
            return Err(AuthError::InvalidCredentials);
        }
        self.store.update_user_last_login(user.id).await?;
        self.session_for(user)
    }

    /// Signs a token for an already-verified federated identity,
    /// creating the local account on first sign-in.
    pub async fn login_with_google(&self, profile: GoogleProfile) -> Result<AuthSession, AuthError> {
        let user = match self.store.get_user_by_email(&profile.email).await? {
            Some(user) => user,
            None => self.create_google_user(&profile).await?,
        };
        self.store.update_user_last_login(user.id).await?;
        self.session_for(user)
    }

    async fn create_google_user(&self, profile: &GoogleProfile) -> Result<User, AuthError> {
        // Local-part username; a random suffix resolves collisions.
        // The password hash is of a throwaway secret, so password login
        // stays effectively disabled for federated accounts.
        let local_part = profile
            .email
            .split('@')
            .next()
            .unwrap_or(profile.email.as_str())
            .to_string();
        let unusable_password = bcrypt::hash(Uuid::new_v4().to_string(), self.bcrypt_cost)?;
        let full_name = profile.name.clone().unwrap_or_else(|| profile.email.clone());

        let first_try = self
            .store
            .create_user(NewUser {
                username: local_part.clone(),
                email: profile.email.clone(),
                hashed_password: unusable_password.clone(),
                full_name: full_name.clone(),
                role: Some(Role::Student),
            })
            .await;
        match first_try {
            Err(crate::store::StoreError::UsernameTaken(_)) => {
                let suffix = Uuid::new_v4().simple().to_string();
                Ok(self
                    .store
                    .create_user(NewUser {
                        username: format!("{}-{}", local_part, &suffix[..8]),
                        email: profile.email.clone(),
                        hashed_password: unusable_password,
                        full_name,
                        role: Some(Role::Student),
                    })
                    .await?)
            }
            other => Ok(other?),
        }
    }

    /// Decodes and verifies signature and expiry. Invalid signature,
    /// expiry and malformed input all collapse into `None`.
    pub fn verify_token(&self, token: &str) -> Option<Claims> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .ok()
    }

    /// verify_token composed with a store lookup.
    pub async fn current_user(&self, token: &str) -> Result<Option<PublicUser>, AuthError> {
        let Some(claims) = self.verify_token(token) else {
            return Ok(None);
        };
        Ok(self
            .store
            .get_user(claims.sub)
            .await?
            .map(PublicUser::from))
    }

    fn session_for(&self, user: User) -> Result<AuthSession, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + Duration::days(TOKEN_TTL_DAYS)).timestamp(),
        };
        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(AuthSession {
            user: user.into(),
            token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use anyhow::Result;

    fn test_service() -> AuthService {
        let store: Arc<dyn Storage> = Arc::new(MemoryStore::new());
        AuthService::new(store, "test-secret").with_bcrypt_cost(4)
    }

    fn register_request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "mat-khau-123".to_string(),
            full_name: "Nguyễn Văn A".to_string(),
            role: None,
        }
    }

    #[tokio::test]
    async fn register_issues_a_verifiable_token() -> Result<()> {
        let auth = test_service();
        let session = auth.register(register_request("hocsinh1", "hs1@example.com")).await?;

        let claims = auth
            .verify_token(&session.token)
            .expect("freshly issued token must verify");
        assert_eq!(claims.sub, session.user.id);
        assert_eq!(claims.username, "hocsinh1");
        assert_eq!(claims.role, Role::Student);
        assert!(claims.exp > claims.iat);
        Ok(())
    }

    #[tokio::test]
    async fn tampered_token_is_rejected() -> Result<()> {
        let auth = test_service();
        let session = auth.register(register_request("hocsinh1", "hs1@example.com")).await?;

        let mut parts: Vec<String> = session.token.split('.').map(str::to_string).collect();
        assert_eq!(parts.len(), 3);
        parts[2] = parts[2].chars().rev().collect();
        let tampered = parts.join(".");

        assert!(auth.verify_token(&tampered).is_none());
        assert!(auth.verify_token("not-a-token").is_none());
        Ok(())
    }

    #[tokio::test]
    async fn token_from_other_secret_is_rejected() -> Result<()> {
        let auth = test_service();
        let other = AuthService::new(Arc::new(MemoryStore::new()), "other-secret")
            .with_bcrypt_cost(4);
        let session = other.register(register_request("hocsinh1", "hs1@example.com")).await?;

        assert!(auth.verify_token(&session.token).is_none());
        Ok(())
    }

    #[tokio::test]
    async fn duplicate_registration_fails_with_stable_messages() -> Result<()> {
        let auth = test_service();
        auth.register(register_request("hocsinh1", "hs1@example.com")).await?;

        let err = auth
            .register(register_request("hocsinh1", "khac@example.com"))
            .await
            .expect_err("duplicate username must fail");
        assert_eq!(err.to_string(), "Username 'hocsinh1' is already taken");

        let err = auth
            .register(register_request("hocsinh2", "hs1@example.com"))
            .await
            .expect_err("duplicate email must fail");
        assert_eq!(err.to_string(), "Email 'hs1@example.com' is already taken");

        // The failed attempts left nothing behind.
        assert!(auth.store().get_user_by_username("hocsinh2").await?.is_none());
        assert!(auth.store().get_user_by_email("khac@example.com").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn login_does_not_reveal_which_part_was_wrong() -> Result<()> {
        let auth = test_service();
        auth.register(register_request("hocsinh1", "hs1@example.com")).await?;

        let wrong_password = auth
            .login(LoginRequest {
                username: "hocsinh1".to_string(),
                password: "sai-mat-khau".to_string(),
            })
            .await
            .expect_err("wrong password must fail");
        let unknown_user = auth
            .login(LoginRequest {
                username: "khong-ton-tai".to_string(),
                password: "mat-khau-123".to_string(),
            })
            .await
            .expect_err("unknown user must fail");

        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        Ok(())
    }

    #[tokio::test]
    async fn login_accepts_email_as_identifier_and_updates_last_login() -> Result<()> {
        let auth = test_service();
        let registered = auth.register(register_request("hocsinh1", "hs1@example.com")).await?;
        assert!(registered.user.last_login_at.is_none());

        let session = auth
            .login(LoginRequest {
                username: "hs1@example.com".to_string(),
                password: "mat-khau-123".to_string(),
            })
            .await?;
        assert_eq!(session.user.id, registered.user.id);

        let stored = auth
            .store()
            .get_user(registered.user.id)
            .await?
            .expect("user should exist");
        assert!(stored.last_login_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn current_user_strips_the_password() -> Result<()> {
        let auth = test_service();
        let session = auth.register(register_request("hocsinh1", "hs1@example.com")).await?;

        let user = auth
            .current_user(&session.token)
            .await?
            .expect("token should resolve to a user");
        assert_eq!(user.username, "hocsinh1");
        let body = serde_json::to_string(&user)?;
        assert!(!body.contains("password"));

        assert!(auth.current_user("gibberish").await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn google_login_finds_or_creates_by_email() -> Result<()> {
        let auth = test_service();
        let profile = GoogleProfile {
            email: "hs1@gmail.com".to_string(),
            name: Some("Nguyễn Văn A".to_string()),
            picture: None,
        };

        let first = auth.login_with_google(profile.clone()).await?;
        assert_eq!(first.user.email, "hs1@gmail.com");
        assert_eq!(first.user.username, "hs1");

        let second = auth.login_with_google(profile).await?;
        assert_eq!(second.user.id, first.user.id);

        let claims = auth.verify_token(&second.token).expect("token must verify");
        assert_eq!(claims.sub, first.user.id);
        Ok(())
    }
}
