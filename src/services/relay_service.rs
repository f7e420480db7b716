use std::sync::Arc;

use actix_web::http::StatusCode;
use log::{error, info, warn};
use uuid::Uuid;

use crate::{
    config::Config,
    errors::CustomError,
    models::{
        network_status::ChainStatus,
        transfer::{Chain, TransferRequest, TransferResponse},
    },
};

use super::{
    chain_client::ChainClient, ethereum_client::EthereumClient, solana_client::SolanaClient,
};

/// Routes validated transfer requests to the adapter for their chain.
///
/// Holds no per-request state: concurrent requests share only the
/// read-only adapters. There is no idempotency key either, so two identical
/// requests are two on-chain transfers.
pub struct TransferRelay {
    solana: Arc<dyn ChainClient>,
    ethereum: Arc<dyn ChainClient>,
    strict_status_codes: bool,
}

impl TransferRelay {
    pub fn new(
        solana: Arc<dyn ChainClient>,
        ethereum: Arc<dyn ChainClient>,
        strict_status_codes: bool,
    ) -> Self {
        Self {
            solana,
            ethereum,
            strict_status_codes,
        }
    }

    /// Builds both chain adapters. Any failure here is fatal for the process.
    pub async fn from_config(config: &Config) -> Result<Self, CustomError> {
        let solana = SolanaClient::new(&config.solana)?;
        let ethereum = EthereumClient::new(&config.ethereum).await?;

        Ok(Self::new(
            Arc::new(solana),
            Arc::new(ethereum),
            config.strict_status_codes,
        ))
    }

    fn client(&self, chain: Chain) -> &dyn ChainClient {
        match chain {
            Chain::Solana => self.solana.as_ref(),
            Chain::Ethereum => self.ethereum.as_ref(),
        }
    }

    pub fn statuses(&self) -> Vec<ChainStatus> {
        vec![self.solana.status(), self.ethereum.status()]
    }

    /// Status used for failures caused by the request itself.
    pub fn input_error_status(&self) -> StatusCode {
        if self.strict_status_codes {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Every error out of validation is the caller's fault, so it always
    /// takes the input-error status.
    pub async fn handle_transfer(
        &self,
        chain: Chain,
        body: &[u8],
    ) -> (StatusCode, TransferResponse) {
        let request_id = Uuid::new_v4();

        let request = match TransferRequest::from_body(chain, body) {
            Ok(request) => request,
            Err(e) => {
                warn!("[{}] rejected {} transfer: {}", request_id, chain, e);
                return (
                    self.input_error_status(),
                    TransferResponse::failure(e.to_string()),
                );
            }
        };

        info!(
            "[{}] submitting {} {} transfer",
            request_id,
            request.amount,
            chain.symbol()
        );
        let result = self.client(chain).submit_transfer(&request.amount).await;

        let status = if result.success {
            info!(
                "[{}] {} transfer submitted: {}",
                request_id,
                chain,
                result.reference.as_deref().unwrap_or_default()
            );
            StatusCode::OK
        } else {
            error!(
                "[{}] {} transfer failed: {}",
                request_id,
                chain,
                result.error.as_deref().unwrap_or_default()
            );
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, TransferResponse::from_result(chain, result))
    }
}
