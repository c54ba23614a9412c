pub mod altstore;
pub mod app_store;
pub mod credential_manager;
pub mod discovery;
pub mod operator;
pub mod request_executor;
