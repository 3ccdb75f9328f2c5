use std::{net::SocketAddr, path::PathBuf, time::Duration};

use anyhow::{Context, Result};

pub const DEFAULT_POSTS_PER_PAGE: u32 = 10;
pub const DEFAULT_INDEX_CACHE_TTL: Duration = Duration::from_secs(20);

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_address: SocketAddr,
    pub media_root: PathBuf,
    pub posts_per_page: u32,
    pub index_cache_ttl: Duration,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// `DATABASE_URL` and `JWT_SECRET` are required, everything else falls
    /// back to a default.
    pub fn from_env() -> Result<Config> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;
        let bind_address = std::env::var("BIND_ADDRESS")
            .unwrap_or_else(|_| "127.0.0.1:3001".to_string())
            .parse()
            .context("BIND_ADDRESS is not a valid socket address")?;
        let media_root = std::env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("media"));
        let posts_per_page = match std::env::var("POSTS_PER_PAGE") {
            Ok(value) => value
                .parse()
                .context("POSTS_PER_PAGE must be a positive integer")?,
            Err(_) => DEFAULT_POSTS_PER_PAGE,
        };
        let index_cache_ttl = match std::env::var("INDEX_CACHE_TTL") {
            Ok(value) => Duration::from_secs(
                value
                    .parse()
                    .context("INDEX_CACHE_TTL must be a number of seconds")?,
            ),
            Err(_) => DEFAULT_INDEX_CACHE_TTL,
        };

        Ok(Config {
            database_url,
            jwt_secret,
            bind_address,
            media_root,
            posts_per_page: posts_per_page.max(1),
            index_cache_ttl,
        })
    }
}
