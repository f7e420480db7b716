use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, JsonRpcClient, Middleware, MiddlewareError, Provider},
    signers::{LocalWallet, Signer},
    types::{Address, TransactionRequest},
};
use log::info;

use crate::{
    config::EthereumConfig,
    errors::{redact_endpoint, CustomError},
    models::{
        amount::Amount,
        network_status::ChainStatus,
        transfer::{Chain, TransferResult},
    },
};

use super::chain_client::{with_timeout, ChainClient};

/// Generic over the JSON-RPC transport so tests can run against a mocked one.
pub struct EthereumClient<P = Http> {
    client: SignerMiddleware<Provider<P>, LocalWallet>,
    rpc_url: String,
    recipient: Address,
    chain_id: u64,
    rpc_timeout: Duration,
}

impl EthereumClient<Http> {
    pub async fn new(config: &EthereumConfig) -> Result<Self, CustomError> {
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|_| CustomError::ConfigError("ETH_RPC_URL is not a valid URL".to_string()))?;
        Self::with_provider(provider, config).await
    }
}

impl<P: JsonRpcClient + 'static> EthereumClient<P> {
    /// Connects the signing wallet to the provider. When no chain id is
    /// configured it is read from the node, so the process refuses to start
    /// against an unreachable endpoint.
    pub async fn with_provider(
        provider: Provider<P>,
        config: &EthereumConfig,
    ) -> Result<Self, CustomError> {
        let wallet = LocalWallet::from_str(config.private_key.expose()).map_err(|_| {
            CustomError::ConfigError("ETH_PRIVATE_KEY is not a valid secp256k1 key".to_string())
        })?;

        let recipient = Address::from_str(&config.recipient).map_err(|_| {
            CustomError::InvalidAddressError(format!("ETH_RECEIVER '{}'", config.recipient))
        })?;

        let chain_id = match config.chain_id {
            Some(id) => id,
            None => {
                with_timeout("Ethereum chain id lookup", config.rpc_timeout, async {
                    provider
                        .get_chainid()
                        .await
                        .map(|id| id.as_u64())
                        .map_err(|e| provider_error(e, &config.rpc_url))
                })
                .await?
            }
        };

        Ok(Self {
            client: SignerMiddleware::new(provider, wallet.with_chain_id(chain_id)),
            rpc_url: config.rpc_url.clone(),
            recipient,
            chain_id,
            rpc_timeout: config.rpc_timeout,
        })
    }

    /// Returns once the node has accepted the transaction; inclusion in a
    /// block is not awaited.
    async fn transfer(&self, amount: &Amount) -> Result<String, CustomError> {
        let wei = amount.to_wei()?;
        let tx = TransactionRequest::new()
            .from(self.client.address())
            .to(self.recipient)
            .value(wei);

        let tx_hash = with_timeout("Ethereum submission", self.rpc_timeout, async {
            self.client
                .send_transaction(tx, None)
                .await
                .map(|pending| pending.tx_hash())
                .map_err(|e| provider_error(e, &self.rpc_url))
        })
        .await?;

        info!("ethereum transfer {:?} accepted on chain {}", tx_hash, self.chain_id);
        Ok(format!("{:?}", tx_hash))
    }
}

/// Prefers the node's JSON-RPC message ("insufficient funds for gas * price
/// + value") over the wrapped error chain.
fn provider_error<E: MiddlewareError>(err: E, rpc_url: &str) -> CustomError {
    let message = err
        .as_error_response()
        .map(|rpc| rpc.message.clone())
        .unwrap_or_else(|| err.to_string());
    CustomError::ProviderError(redact_endpoint(message, rpc_url))
}

#[async_trait]
impl<P: JsonRpcClient + 'static> ChainClient for EthereumClient<P> {
    fn chain(&self) -> Chain {
        Chain::Ethereum
    }

    fn status(&self) -> ChainStatus {
        ChainStatus {
            chain: Chain::Ethereum,
            symbol: Chain::Ethereum.symbol().to_string(),
            sender: format!("{:?}", self.client.address()),
            recipient: format!("{:?}", self.recipient),
            rpc_timeout_secs: self.rpc_timeout.as_secs(),
            commitment: None,
        }
    }

    async fn submit_transfer(&self, amount: &Amount) -> TransferResult {
        self.transfer(amount).await.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Secret;
    use ethers::providers::{JsonRpcError, MockProvider, MockResponse};
    use ethers::types::H256;

    // Well-known development key (anvil/hardhat account #0).
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const DEV_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";
    const RECIPIENT: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc79c8";

    fn config(key: &str, recipient: &str) -> EthereumConfig {
        EthereumConfig {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            private_key: Secret::new(key),
            recipient: recipient.to_string(),
            chain_id: Some(31337),
            rpc_timeout: Duration::from_secs(20),
        }
    }

    #[actix_web::test]
    async fn builds_client_with_configured_chain_id() {
        let client = EthereumClient::new(&config(DEV_KEY, RECIPIENT)).await.unwrap();
        let status = client.status();

        assert_eq!(client.chain(), Chain::Ethereum);
        assert_eq!(client.chain_id, 31337);
        assert_eq!(status.sender, DEV_ADDRESS);
        assert_eq!(status.recipient, RECIPIENT);
        assert_eq!(status.commitment, None);
    }

    #[actix_web::test]
    async fn rejects_bad_key_without_echoing_it() {
        let err = EthereumClient::new(&config("0xnot-a-key", RECIPIENT)).await.err().unwrap();
        assert!(matches!(err, CustomError::ConfigError(_)));
        assert!(!err.to_string().contains("not-a-key"));
    }

    #[actix_web::test]
    async fn rejects_malformed_recipient() {
        let err = EthereumClient::new(&config(DEV_KEY, "0x1234")).await.err().unwrap();
        assert!(matches!(err, CustomError::InvalidAddressError(_)));
    }

    #[actix_web::test]
    async fn rejects_sub_wei_amount_before_any_rpc_call() {
        let client = EthereumClient::new(&config(DEV_KEY, RECIPIENT)).await.unwrap();
        let amount: Amount = "0.0000000000000000001".parse().unwrap();

        let result = client.submit_transfer(&amount).await;
        assert!(!result.success);
        assert!(result.reference.is_none());
        assert!(result.error.unwrap().contains("decimal places"));
    }

    async fn mocked_client() -> (EthereumClient<MockProvider>, MockProvider) {
        let (provider, mock) = Provider::mocked();
        let client = EthereumClient::with_provider(provider, &config(DEV_KEY, RECIPIENT))
            .await
            .unwrap();
        (client, mock)
    }

    #[actix_web::test]
    async fn accepted_transfer_returns_node_tx_hash() {
        let (client, mock) = mocked_client().await;
        // nonce, gas price, gas estimate and the raw send each take one
        // response; a 32-byte word decodes as both U256 and H256, so the
        // order the middleware asks in does not matter
        let hash = H256::repeat_byte(0x11);
        for _ in 0..6 {
            mock.push(hash).unwrap();
        }
        let amount: Amount = "0.5".parse().unwrap();

        let reference = client.transfer(&amount).await.unwrap();
        assert_eq!(reference, format!("{:?}", hash));
        assert!(reference.starts_with("0x") && reference.len() == 66);
    }

    #[actix_web::test]
    async fn node_rejection_surfaces_json_rpc_message() {
        let (client, mock) = mocked_client().await;
        mock.push_response(MockResponse::Error(JsonRpcError {
            code: -32000,
            message: "insufficient funds for gas * price + value".to_string(),
            data: None,
        }));
        let amount: Amount = "1".parse().unwrap();

        let result = client.submit_transfer(&amount).await;
        assert!(!result.success);
        assert!(result.reference.is_none());
        assert!(result.error.unwrap().contains("insufficient funds for gas * price + value"));
    }

    #[actix_web::test]
    async fn unreachable_endpoint_error_keeps_api_key_out() {
        let mut config = config(DEV_KEY, RECIPIENT);
        config.rpc_url = "http://LOCALHOST:1/v3/SECRETKEY".to_string();
        config.chain_id = None;
        config.rpc_timeout = Duration::from_secs(5);

        let err = EthereumClient::new(&config).await.err().unwrap();
        let message = err.to_string();
        assert!(!message.contains("SECRETKEY"), "{}", message);
    }
}
