pub mod accounts;
pub mod blob_store;
pub mod config;
pub mod identity;
pub mod identity_provider;
pub mod portfolio;
pub mod session;
