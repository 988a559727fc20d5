pub mod analyzers;
pub mod config;
pub mod error;
pub mod fetch;
pub mod infra;
pub mod ingest;
pub mod markdown;
pub mod output;
pub mod record;
pub mod services;
pub mod session;
pub mod stats;
pub mod view;
