use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::CustomError;

use super::amount::Amount;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Chain {
    Solana,
    Ethereum,
}

impl Chain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Solana => "solana",
            Chain::Ethereum => "ethereum",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Chain::Solana => "SOL",
            Chain::Ethereum => "ETH",
        }
    }
}

impl FromStr for Chain {
    type Err = CustomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "solana" => Ok(Chain::Solana),
            "ethereum" => Ok(Chain::Ethereum),
            other => Err(CustomError::UnsupportedChainError(other.to_string())),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub chain: Chain,
    pub amount: Amount,
}

impl TransferRequest {
    /// Validates a raw request body into a typed request. Nothing reaches a
    /// chain client unless this succeeds.
    pub fn from_body(chain: Chain, body: &[u8]) -> Result<Self, CustomError> {
        let json: Value = serde_json::from_slice(body)
            .map_err(|e| CustomError::ValidationError(format!("body is not valid JSON: {}", e)))?;

        let fields = json.as_object().ok_or_else(|| {
            CustomError::ValidationError("body must be a JSON object".to_string())
        })?;

        let amount = Amount::from_json(fields.get("amount"))?;

        // An amount the chain cannot represent would be rejected anyway.
        match chain {
            Chain::Solana => amount.to_lamports().map(drop)?,
            Chain::Ethereum => amount.to_wei().map(drop)?,
        }

        Ok(Self { chain, amount })
    }
}

/// Outcome of a single transfer attempt: a reference on success, a message
/// on failure, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferResult {
    pub success: bool,
    pub reference: Option<String>,
    pub error: Option<String>,
}

impl TransferResult {
    pub fn submitted(reference: impl Into<String>) -> Self {
        Self {
            success: true,
            reference: Some(reference.into()),
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            reference: None,
            error: Some(message.into()),
        }
    }
}

impl From<Result<String, CustomError>> for TransferResult {
    fn from(result: Result<String, CustomError>) -> Self {
        match result {
            Ok(reference) => TransferResult::submitted(reference),
            Err(e) => TransferResult::failed(e.to_string()),
        }
    }
}

/// Wire shape consumed by the static front end. The reference key depends
/// on the chain: `signature` for Solana, `txHash` for Ethereum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TransferResponse {
    pub fn from_result(chain: Chain, result: TransferResult) -> Self {
        let (signature, tx_hash) = match chain {
            Chain::Solana => (result.reference, None),
            Chain::Ethereum => (None, result.reference),
        };
        Self {
            success: result.success,
            signature,
            tx_hash,
            error: result.error,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            signature: None,
            tx_hash: None,
            error: Some(message.into()),
        }
    }
}
