pub mod amount;
pub mod api_response;
pub mod network_status;
pub mod transfer;
