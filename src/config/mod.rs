// Configuration module entry point
// Ambient settings, the fixed listen address, and shared runtime state

mod state;
mod types;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

// Re-export public types
pub use state::AppState;
pub use types::Config;

/// Listen on all interfaces
pub const LISTEN_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

pub const LISTEN_PORT: u16 = 8080;

/// Config file looked up in the working directory (any extension the `config` crate knows)
pub const DEFAULT_CONFIG_PATH: &str = "redirector";

/// Prefix for environment overrides, e.g. `REDIRECTOR_LOGGING__ACCESS_LOG=true`
pub const ENV_PREFIX: &str = "REDIRECTOR";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// The file is optional; missing keys fall back to defaults
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false));
        Self::build(builder)
    }

    fn build(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("logging.level", "error")?
            .set_default("logging.access_log", false)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.connection_timeout", 0)?
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> SocketAddr {
        SocketAddr::new(LISTEN_HOST, LISTEN_PORT)
    }
}
