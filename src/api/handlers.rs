use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;

use crate::{
    errors::CustomError,
    models::{
        api_response::success_response,
        network_status::NetworkStatus,
        transfer::{Chain, TransferResponse},
    },
    services::relay_service::TransferRelay,
};

/// The body is taken raw so that malformed JSON still gets the
/// `{success, error}` shape the front end expects.
#[post("/swap/{chain}")]
pub async fn swap(
    relay: web::Data<TransferRelay>,
    chain: web::Path<String>,
    body: web::Bytes,
) -> HttpResponse {
    let chain = match chain.parse::<Chain>() {
        Ok(chain) => chain,
        Err(e) => return HttpResponse::NotFound().json(TransferResponse::failure(e.to_string())),
    };

    let (status, response) = relay.handle_transfer(chain, &body).await;
    HttpResponse::build(status).json(response)
}

#[get("/health")]
pub async fn health(relay: web::Data<TransferRelay>) -> HttpResponse {
    success_response(NetworkStatus {
        chains: relay.statuses(),
        timestamp: Utc::now(),
    })
}

pub async fn not_found() -> Result<HttpResponse, CustomError> {
    Err(CustomError::NotFoundError)
}
