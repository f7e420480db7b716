use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    errors::CustomError,
    models::{
        amount::Amount,
        network_status::ChainStatus,
        transfer::{Chain, TransferResult},
    },
};

/// A pre-configured client able to send the chain's native asset from one
/// fixed account to one fixed recipient.
///
/// Implementations own their signing key and RPC handle and are never
/// mutated after construction, so a single instance serves every request.
#[async_trait]
pub trait ChainClient: Send + Sync {
    fn chain(&self) -> Chain;

    /// Public description for the health endpoint. Must not include keys.
    fn status(&self) -> ChainStatus;

    /// Sends `amount` (major units) to the configured recipient. Failures
    /// are reported in the result, never retried.
    async fn submit_transfer(&self, amount: &Amount) -> TransferResult;
}

/// Bounds one network suspend point.
pub async fn with_timeout<T, F>(
    stage: &'static str,
    limit: Duration,
    fut: F,
) -> Result<T, CustomError>
where
    F: Future<Output = Result<T, CustomError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| CustomError::TimeoutError {
            stage,
            secs: limit.as_secs(),
        })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn passes_through_results_within_limit() {
        let value = with_timeout("test", Duration::from_secs(1), async { Ok::<_, CustomError>(7) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[actix_web::test]
    async fn fails_with_timeout_error_when_limit_elapses() {
        let err = with_timeout("Solana submission", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, CustomError>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, CustomError::TimeoutError { stage: "Solana submission", .. }));
    }
}
