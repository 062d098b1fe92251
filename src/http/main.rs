use clap::Parser;
use std::sync::Arc;
use crate::config::{Args, Config};
use crate::http::{AppState, server};
use crate::status::aggregator::Aggregator;
use crate::status::cache::StatusCache;
use crate::status::geo;
use crate::status::upstream::GluetunClient;
use crate::utils;

pub async fn run_server() {
    let args = Args::parse();

    if let Err(e) = utils::init_tracing() {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let cfg = match Config::resolve(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Invalid configuration: {:#}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "gluetun: {}, cache: {}s, geo lookup: {:?}",
        cfg.gluetun_base,
        cfg.cache_seconds,
        cfg.geo_lookup
    );

    let upstream = GluetunClient::new(&cfg.gluetun_base, cfg.upstream_timeout());
    let locator = geo::new_locator(cfg.geo_lookup, cfg.geo_timeout());
    let aggregator = Aggregator::new(Arc::new(upstream), Arc::from(locator));
    let cache = Arc::new(StatusCache::new(aggregator, cfg.cache_window()));

    if let Err(e) = server::start(&cfg.listen_addr, AppState::new(cache)).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
