pub mod config;
pub mod credential_store;
pub mod error;
pub mod oauth_client;
pub mod record_log;
pub mod row_mapper;
pub mod settings;
pub mod sheets_client;
