pub mod app_config;
pub mod bridge;
pub mod bus;
pub mod claim;
pub mod display_store;
pub mod domain;
pub mod ingest;
pub mod registry;
pub mod relay;
pub mod sse;
pub mod translator;
