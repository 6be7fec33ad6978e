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

use anyhow::Result;
use tracing_subscriber::EnvFilter;

mod auth;
mod config;
mod http_server;
mod models;
mod store;

use auth::{AuthService, GoogleAuth};
use config::Config;
use http_server::AppState;
use store::{MemoryStore, PgStore, Storage};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env();

    let store: Arc<dyn Storage> = match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to the relational store...");
            Arc::new(PgStore::connect(url).await?)
        }
        None => {
            tracing::info!("DATABASE_URL not set; serving from the in-memory store");
            Arc::new(MemoryStore::with_fixtures().await)
        }
    };

    let auth = Arc::new(AuthService::new(store.clone(), &config.jwt_secret));
    let google = Arc::new(GoogleAuth::new(config.google_client_id.clone())?);
    if !google.is_configured() {
        tracing::info!("GOOGLE_CLIENT_ID not set; Google sign-in is disabled");
    }

    http_server::run_server(AppState { store, auth, google }, config.bind_addr).await
}
