use std::net::SocketAddr;

/// Runtime configuration, read from the process environment once at
/// startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    /// Absent means Google sign-in is disabled.
    pub google_client_id: Option<String>,
    /// Absent means the in-memory store backs the API.
    pub database_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("TUTORMATCH_ADDR")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 3000)));

        let jwt_secret = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("JWT_SECRET is not set; using the insecure development default");
                "tutormatch-dev-secret".to_string()
            }
        };

        Config {
            bind_addr,
            jwt_secret,
            google_client_id: std::env::var("GOOGLE_CLIENT_ID").ok().filter(|v| !v.is_empty()),
            database_url: std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()),
        }
    }
}
