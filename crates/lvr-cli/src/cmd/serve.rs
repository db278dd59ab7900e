//! `lvr serve`: run the HTTP API.

use anyhow::Context;
use clap::Args;
use lvr_core::Store;
use lvr_core::config::ServiceConfig;
use lvr_cli::http::{self, AppState};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on, e.g. 0.0.0.0:5000.
    #[arg(long)]
    pub bind: Option<String>,

    /// SQLite database file.
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Origin used to build public projection and tracking URLs.
    #[arg(long)]
    pub public_base_url: Option<String>,
}

impl ServeArgs {
    fn apply(&self, config: &mut ServiceConfig) {
        if let Some(bind) = &self.bind {
            config.server.bind.clone_from(bind);
        }
        if let Some(db) = &self.db {
            config.storage.db_path.clone_from(db);
        }
        if let Some(base) = &self.public_base_url {
            config.server.public_base_url.clone_from(base);
        }
    }
}

pub fn run_serve(args: &ServeArgs, mut config: ServiceConfig) -> anyhow::Result<()> {
    args.apply(&mut config);

    let store = Store::open(&config.storage.db_path)?;
    tracing::info!(
        db = %config.storage.db_path.display(),
        public_base_url = %config.server.public_base_url,
        "opened projection store"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;

    runtime.block_on(async move {
        let state = AppState::from_config(&config, store)?;
        http::setup_and_serve(state, &config.server.bind).await
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let mut config = ServiceConfig::default();
        let args = ServeArgs {
            bind: Some("0.0.0.0:8080".to_string()),
            db: None,
            public_base_url: Some("https://projections.example.com".to_string()),
        };
        let default_db = config.storage.db_path.clone();
        args.apply(&mut config);

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.server.public_base_url, "https://projections.example.com");
        assert_eq!(config.storage.db_path, default_db);
    }
}
