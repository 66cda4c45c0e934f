mod api;
mod auth;
mod config;
mod dto;
mod engine;
mod error;
mod reconcile;
mod schema;
#[cfg(test)]
mod test;

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use actix_web::http::HeaderValue;

use crate::config::AppConfig;
use crate::engine::{Engine, RediSearchEngine};

pub use crate::error::Error;
pub type Result<T, E = crate::error::Error> = std::result::Result<T, E>;

pub struct AppState {
    pub config: AppConfig,
    pub cors_origin: HeaderValue,
    pub engine: Arc<dyn Engine>,
}

impl AppState {
    pub fn new(config: AppConfig, engine: Arc<dyn Engine>) -> crate::Result<Self> {
        let cors_origin = HeaderValue::from_str(&config.cors_allow_origins)
            .map_err(crate::error::value_parsing_err)?;
        Ok(Self {
            config,
            cors_origin,
            engine,
        })
    }
}

#[actix_web::main]
async fn main() -> crate::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "info");
    }
    pretty_env_logger::init();

    let config_path = match std::env::args().nth(1) {
        Some(arg) => PathBuf::from(arg),
        None => {
            eprintln!("Config file path not provided.");
            eprintln!("Here is an example configuration to get started:");
            match config::sample_yaml() {
                Ok(sample) => println!("{}", sample),
                Err(err) => eprintln!("Failed to render the sample config: {}", err),
            }
            process::exit(2);
        }
    };
    if !config_path.is_file() {
        eprintln!("Config file {} does not exist", config_path.display());
        process::exit(3);
    }

    let config = AppConfig::load(&config_path)?;
    log::debug!("App config:\n{:#?}", &config);

    // A failed reconciliation other than "index already exists" aborts
    // startup; the gateway never serves traffic over a half-evolved schema.
    let engine = RediSearchEngine::connect(&config)?;
    reconcile::reconcile(&engine, &config.schema)?;

    log::info!("API server at http://{}", config.bind_address);
    let state = AppState::new(config, Arc::new(engine))?;
    api::run_server(state).await?;

    // The server future resolves on a shutdown signal; dropping the state
    // releases the engine handle.
    log::info!("Shutting down");
    Ok(())
}
