use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use solana_client::{client_error::ClientError, nonblocking::rpc_client::RpcClient};
use solana_sdk::{
    commitment_config::CommitmentConfig,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use solana_system_interface::instruction as system_instruction;

use crate::{
    config::SolanaConfig,
    errors::{redact_endpoint, CustomError},
    models::{
        amount::Amount,
        network_status::ChainStatus,
        transfer::{Chain, TransferResult},
    },
};

use super::chain_client::{with_timeout, ChainClient};

const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct SolanaClient {
    rpc: RpcClient,
    rpc_url: String,
    payer: Keypair,
    recipient: Pubkey,
    commitment: CommitmentConfig,
    rpc_timeout: Duration,
    confirm_timeout: Duration,
}

impl SolanaClient {
    pub fn new(config: &SolanaConfig) -> Result<Self, CustomError> {
        let rpc = RpcClient::new_with_timeout_and_commitment(
            config.rpc_url.clone(),
            config.rpc_timeout,
            config.commitment,
        );
        Self::with_rpc(rpc, config)
    }

    fn with_rpc(rpc: RpcClient, config: &SolanaConfig) -> Result<Self, CustomError> {
        let payer = keypair_from_json(config.private_key.expose())?;
        let recipient = Pubkey::from_str(&config.recipient).map_err(|_| {
            CustomError::InvalidAddressError(format!("SOL_RECEIVER '{}'", config.recipient))
        })?;

        Ok(Self {
            rpc,
            rpc_url: config.rpc_url.clone(),
            payer,
            recipient,
            commitment: config.commitment,
            rpc_timeout: config.rpc_timeout,
            confirm_timeout: config.confirm_timeout,
        })
    }

    fn provider_error(&self, err: ClientError) -> CustomError {
        CustomError::ProviderError(redact_endpoint(err.to_string(), &self.rpc_url))
    }

    /// Builds, signs and sends a single system transfer. Preflight runs on
    /// the node, so insufficient funds fail here rather than on-chain.
    async fn send(&self, lamports: u64) -> Result<Signature, CustomError> {
        let blockhash = self
            .rpc
            .get_latest_blockhash()
            .await
            .map_err(|e| self.provider_error(e))?;

        let instruction =
            system_instruction::transfer(&self.payer.pubkey(), &self.recipient, lamports);
        let transaction = Transaction::new_signed_with_payer(
            &[instruction],
            Some(&self.payer.pubkey()),
            &[&self.payer],
            blockhash,
        );

        self.rpc
            .send_transaction(&transaction)
            .await
            .map_err(|e| self.provider_error(e))
    }

    /// Polls the signature until it reaches the configured commitment.
    /// Runs without its own bound; the caller wraps it in the confirmation
    /// timeout.
    async fn wait_for_confirmation(&self, signature: &Signature) -> Result<(), CustomError> {
        loop {
            match self
                .rpc
                .get_signature_status_with_commitment(signature, self.commitment)
                .await
            {
                Ok(Some(Ok(()))) => return Ok(()),
                Ok(Some(Err(e))) => {
                    return Err(CustomError::ConfirmationError {
                        signature: signature.to_string(),
                        reason: e.to_string(),
                    })
                }
                Ok(None) => {}
                Err(e) => warn!(
                    "status poll for {} failed: {}",
                    signature,
                    redact_endpoint(e.to_string(), &self.rpc_url)
                ),
            }
            tokio::time::sleep(STATUS_POLL_INTERVAL).await;
        }
    }

    async fn transfer(&self, amount: &Amount) -> Result<String, CustomError> {
        let lamports = amount.to_lamports()?;

        let signature =
            with_timeout("Solana submission", self.rpc_timeout, self.send(lamports)).await?;
        debug!("sent {} lamports to {}, signature {}", lamports, self.recipient, signature);

        tokio::time::timeout(self.confirm_timeout, self.wait_for_confirmation(&signature))
            .await
            .map_err(|_| CustomError::ConfirmationError {
                signature: signature.to_string(),
                reason: format!(
                    "{:?} commitment not reached within {}s",
                    self.commitment.commitment,
                    self.confirm_timeout.as_secs()
                ),
            })??;

        info!("solana transfer {} reached {:?}", signature, self.commitment.commitment);
        Ok(signature.to_string())
    }
}

#[async_trait]
impl ChainClient for SolanaClient {
    fn chain(&self) -> Chain {
        Chain::Solana
    }

    fn status(&self) -> ChainStatus {
        ChainStatus {
            chain: Chain::Solana,
            symbol: Chain::Solana.symbol().to_string(),
            sender: self.payer.pubkey().to_string(),
            recipient: self.recipient.to_string(),
            rpc_timeout_secs: self.rpc_timeout.as_secs(),
            commitment: Some(format!("{:?}", self.commitment.commitment).to_lowercase()),
        }
    }

    async fn submit_transfer(&self, amount: &Amount) -> TransferResult {
        self.transfer(amount).await.into()
    }
}

/// Parses key material given as a JSON array of byte values, the format
/// written by `solana-keygen`. The input is never echoed back in errors.
pub fn keypair_from_json(raw: &str) -> Result<Keypair, CustomError> {
    let bytes: Vec<u8> = serde_json::from_str(raw).map_err(|_| {
        CustomError::ConfigError("SOL_PRIVATE_KEY must be a JSON array of byte values".to_string())
    })?;

    Keypair::try_from(bytes.as_slice()).map_err(|_| {
        CustomError::ConfigError("SOL_PRIVATE_KEY is not a valid 64-byte keypair".to_string())
    })
}
