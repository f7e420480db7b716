use chrono::{DateTime, Utc};
use serde::Serialize;

use super::transfer::Chain;

#[derive(Debug, Clone, Serialize)]
pub struct ChainStatus {
    pub chain: Chain,
    pub symbol: String,
    pub sender: String,
    pub recipient: String,
    pub rpc_timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commitment: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NetworkStatus {
    pub chains: Vec<ChainStatus>,
    pub timestamp: DateTime<Utc>,
}
