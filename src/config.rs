//! Service configuration
//!
//! Defaults, then an optional TOML file, then flags / environment variables.

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::time::Duration;
use crate::status::geo::GeoLookup;

/// Gluetun status dashboard
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Optional TOML config file, overridden by flags and environment
    #[arg(short, long, env = "STATUS_CONFIG")]
    pub config: Option<String>,

    /// Base URL of the Gluetun control server (e.g., http://vpn:8000)
    #[arg(long, env = "GLUETUN_BASE")]
    pub gluetun_base: Option<String>,

    /// Seconds a status snapshot is served from cache
    #[arg(long, env = "CACHE_SECONDS")]
    pub cache_seconds: Option<u64>,

    /// Fallback geolocation provider
    #[arg(long, env = "GEO_LOOKUP", value_enum)]
    pub geo_lookup: Option<GeoLookup>,

    /// Address the HTTP server binds to
    #[arg(short, long, env = "LISTEN_ADDR")]
    pub listen: Option<String>,

    /// Timeout in seconds for each gateway call
    #[arg(long, env = "UPSTREAM_TIMEOUT")]
    pub upstream_timeout: Option<u64>,

    /// Timeout in seconds for the geolocation call
    #[arg(long, env = "GEO_TIMEOUT")]
    pub geo_timeout: Option<u64>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Config {
    // gluetun control server, eg: http://vpn:8000
    #[serde(default = "default_gluetun_base")]
    pub gluetun_base: String,

    // freshness window of the status cache
    #[serde(default = "default_cache_seconds")]
    pub cache_seconds: u64,

    #[serde(default)]
    pub geo_lookup: GeoLookup,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_timeout_secs")]
    pub upstream_timeout_secs: u64,

    #[serde(default = "default_timeout_secs")]
    pub geo_timeout_secs: u64,
}

fn default_gluetun_base() -> String {
    "http://vpn:8000".to_string()
}

fn default_cache_seconds() -> u64 {
    15
}

fn default_listen_addr() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_timeout_secs() -> u64 {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gluetun_base: default_gluetun_base(),
            cache_seconds: default_cache_seconds(),
            geo_lookup: GeoLookup::default(),
            listen_addr: default_listen_addr(),
            upstream_timeout_secs: default_timeout_secs(),
            geo_timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    /// Resolve the final configuration from parsed arguments
    pub fn resolve(args: &Args) -> anyhow::Result<Config> {
        let mut config = match &args.config {
            Some(path) => load(path)?,
            None => Config::default(),
        };
        config.apply(args);
        Ok(config)
    }

    fn apply(&mut self, args: &Args) {
        if let Some(base) = &args.gluetun_base {
            self.gluetun_base = base.clone();
        }
        if let Some(secs) = args.cache_seconds {
            self.cache_seconds = secs;
        }
        if let Some(geo) = args.geo_lookup {
            self.geo_lookup = geo;
        }
        if let Some(listen) = &args.listen {
            self.listen_addr = listen.clone();
        }
        if let Some(secs) = args.upstream_timeout {
            self.upstream_timeout_secs = secs;
        }
        if let Some(secs) = args.geo_timeout {
            self.geo_timeout_secs = secs;
        }
        self.gluetun_base = self.gluetun_base.trim_end_matches('/').to_string();
    }

    pub fn cache_window(&self) -> Duration {
        Duration::from_secs(self.cache_seconds)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn geo_timeout(&self) -> Duration {
        Duration::from_secs(self.geo_timeout_secs)
    }
}

pub fn load(path: &str) -> anyhow::Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("failed to parse config file {}", path))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::resolve(&Args::default()).unwrap();
        assert_eq!(config.gluetun_base, "http://vpn:8000");
        assert_eq!(config.cache_seconds, 15);
        assert_eq!(config.geo_lookup, GeoLookup::IpApi);
        assert_eq!(config.listen_addr, "0.0.0.0:5000");
        assert_eq!(config.upstream_timeout(), Duration::from_secs(3));
        assert_eq!(config.geo_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            gluetun_base = "http://gluetun:8000/"
            geo_lookup = "none"
            "#,
        )
        .unwrap();
        assert_eq!(config.geo_lookup, GeoLookup::Disabled);
        assert_eq!(config.cache_seconds, 15);
        assert_eq!(config.listen_addr, "0.0.0.0:5000");
    }

    #[test]
    fn test_args_override_and_strip_slash() {
        let args = Args::parse_from([
            "gluetun-status",
            "--gluetun-base",
            "http://10.0.0.2:8000/",
            "--cache-seconds",
            "30",
            "--geo-lookup",
            "none",
        ]);
        let config = Config::resolve(&args).unwrap();
        assert_eq!(config.gluetun_base, "http://10.0.0.2:8000");
        assert_eq!(config.cache_seconds, 30);
        assert_eq!(config.geo_lookup, GeoLookup::Disabled);
    }

    #[test]
    fn test_invalid_geo_lookup_rejected() {
        assert!(Args::try_parse_from(["gluetun-status", "--geo-lookup", "ipinfo"]).is_err());
    }

    #[test]
    fn test_missing_config_file() {
        let args = Args {
            config: Some("/nonexistent/status.toml".to_string()),
            ..Default::default()
        };
        assert!(Config::resolve(&args).is_err());
    }
}
