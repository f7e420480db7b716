pub mod chain_client;
pub mod ethereum_client;
pub mod relay_service;
pub mod solana_client;
