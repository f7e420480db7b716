use actix_web::HttpResponse;
use serde::Serialize;

use crate::errors::ApiError;

/// Envelope for the relay's auxiliary endpoints. Transfer routes answer with
/// `TransferResponse` instead, whose shape the front end depends on.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub code: u16,
    pub result: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "SUCCESS".to_string(),
            code: 200,
            result: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn failure(error: ApiError) -> Self {
        Self {
            status: "FAILURE".to_string(),
            code: error.code,
            result: None,
            error: Some(error),
        }
    }
}

pub fn success_response<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(data))
}
