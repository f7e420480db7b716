use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use solana_sdk::commitment_config::CommitmentConfig;

use crate::errors::CustomError;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_RPC_TIMEOUT_SECS: u64 = 20;
const DEFAULT_CONFIRM_TIMEOUT_SECS: u64 = 30;

/// Key material read from the environment. Never printed.
#[derive(Clone)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Answer input errors with 400 instead of the historical 500.
    pub strict_status_codes: bool,
    pub solana: SolanaConfig,
    pub ethereum: EthereumConfig,
}

#[derive(Debug, Clone)]
pub struct SolanaConfig {
    pub rpc_url: String,
    /// JSON array of the 64 keypair bytes.
    pub private_key: Secret,
    pub recipient: String,
    pub commitment: CommitmentConfig,
    pub rpc_timeout: Duration,
    pub confirm_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct EthereumConfig {
    pub rpc_url: String,
    pub private_key: Secret,
    pub recipient: String,
    /// Queried from the provider at startup when unset.
    pub chain_id: Option<u64>,
    pub rpc_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, CustomError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, CustomError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);
        let rpc_timeout =
            Duration::from_secs(env.parse_or("RPC_TIMEOUT_SECS", DEFAULT_RPC_TIMEOUT_SECS)?);

        Ok(Self {
            host: env.get("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: env.parse_or("PORT", DEFAULT_PORT)?,
            strict_status_codes: env.parse_or("STRICT_STATUS_CODES", false)?,
            solana: SolanaConfig {
                rpc_url: env.required("SOLANA_RPC_URL")?,
                private_key: Secret::new(env.required("SOL_PRIVATE_KEY")?),
                recipient: env.required("SOL_RECEIVER")?,
                commitment: parse_commitment(
                    env.get("SOLANA_COMMITMENT").as_deref().unwrap_or("confirmed"),
                )?,
                rpc_timeout,
                confirm_timeout: Duration::from_secs(
                    env.parse_or("SOLANA_CONFIRM_TIMEOUT_SECS", DEFAULT_CONFIRM_TIMEOUT_SECS)?,
                ),
            },
            ethereum: EthereumConfig {
                rpc_url: env
                    .get("ETH_RPC_URL")
                    .or_else(|| env.get("INFURA_URL"))
                    .ok_or_else(|| missing("ETH_RPC_URL"))?,
                private_key: Secret::new(env.required("ETH_PRIVATE_KEY")?),
                recipient: env.required("ETH_RECEIVER")?,
                chain_id: env.parse_opt("ETH_CHAIN_ID")?,
                rpc_timeout,
            },
        })
    }
}

pub fn parse_commitment(level: &str) -> Result<CommitmentConfig, CustomError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "processed" => Ok(CommitmentConfig::processed()),
        "confirmed" => Ok(CommitmentConfig::confirmed()),
        "finalized" => Ok(CommitmentConfig::finalized()),
        other => Err(CustomError::ConfigError(format!(
            "SOLANA_COMMITMENT must be processed, confirmed or finalized, got '{}'",
            other
        ))),
    }
}

fn missing(key: &str) -> CustomError {
    CustomError::ConfigError(format!("{} is not set", key))
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn required(&self, key: &str) -> Result<String, CustomError> {
        self.get(key).ok_or_else(|| missing(key))
    }

    fn parse_opt<T: FromStr>(&self, key: &str) -> Result<Option<T>, CustomError> {
        self.get(key)
            .map(|raw| {
                raw.parse::<T>().map_err(|_| {
                    CustomError::ConfigError(format!("{} has an invalid value '{}'", key, raw))
                })
            })
            .transpose()
    }

    fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T, CustomError> {
        Ok(self.parse_opt(key)?.unwrap_or(default))
    }
}
