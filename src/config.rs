use serde::{Deserialize, Serialize};
use std::env;

use crate::feed::DEFAULT_PAGE_SIZE;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub feed: FeedConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Vendor snapshot served as the ranking dataset
    pub dataset_path: String,
    /// Directory of static front-end assets
    pub static_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Comments shown before the "load all" affordance
    pub page_size: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let page_size: u32 = env::var("COMMENTS_PAGE_SIZE")
            .unwrap_or_else(|_| DEFAULT_PAGE_SIZE.to_string())
            .parse()
            .unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            anyhow::bail!("COMMENTS_PAGE_SIZE must be at least 1");
        }

        Ok(Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:data/doener.db".to_string()),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },
            site: SiteConfig {
                dataset_path: env::var("DATASET_PATH")
                    .unwrap_or_else(|_| "data/doener.json".to_string()),
                static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "public".to_string()),
            },
            feed: FeedConfig { page_size },
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
