//! Configuration module - environment variable parsing

use std::env;
use std::net::SocketAddr;

use crate::game::{AmmoPolicy, Loadout, PlayerId};

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Bridge binding address
    pub server_addr: SocketAddr,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Which player this device renders as
    pub local_role: PlayerId,
    /// Behaviour of local ammo consumption on an empty magazine
    pub ammo_policy: AmmoPolicy,
    /// Apply damage locally when an attack is decided as a hit
    pub predict_damage: bool,
    /// Resources both players start with
    pub loadout: Loadout,

    /// Max inbound feed frames per second per socket
    pub feed_rate_limit: u32,
    /// Allowed origins for CORS ("*" for any)
    pub client_origin: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // PORT wins over SERVER_ADDR when both are set
        let server_addr = match lookup("PORT") {
            Some(port) => format!("0.0.0.0:{}", port),
            None => lookup("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        };

        let local_role = lookup("LOCAL_ROLE").ok_or(ConfigError::Missing("LOCAL_ROLE"))?;
        let local_role =
            PlayerId::parse_role(&local_role).ok_or_else(|| invalid("LOCAL_ROLE", &local_role))?;

        let defaults = Loadout::default();

        Ok(Self {
            server_addr: server_addr
                .parse()
                .map_err(|_| ConfigError::InvalidAddress)?,

            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),

            local_role,
            ammo_policy: parse_or("AMMO_EMPTY_POLICY", &lookup, AmmoPolicy::Wrap)?,
            predict_damage: parse_bool_or("PREDICT_DAMAGE", &lookup, true)?,
            loadout: Loadout {
                health: defaults.health,
                ammo: parse_or("INITIAL_AMMO", &lookup, defaults.ammo)?,
                grenades: parse_or("INITIAL_GRENADES", &lookup, defaults.grenades)?,
                shield_count: parse_or("INITIAL_SHIELDS", &lookup, defaults.shield_count)?,
            },

            feed_rate_limit: parse_or("FEED_RATE_LIMIT", &lookup, 30)?,
            client_origin: lookup("CLIENT_ORIGIN").unwrap_or_else(|| "*".to_string()),
        })
    }
}

fn invalid(var: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
    }
}

fn parse_or<T, F>(var: &'static str, lookup: &F, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) => value.trim().parse().map_err(|_| invalid(var, &value)),
        None => Ok(default),
    }
}

fn parse_bool_or<F>(var: &'static str, lookup: &F, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(invalid(var, &value)),
        },
        None => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Invalid server address format")]
    InvalidAddress,
}
