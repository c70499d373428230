pub mod config;
pub mod decay;
pub mod distributor;
pub mod engine;
pub mod envelope;
pub mod error;
pub mod event;
pub mod pool;
pub mod pressure;
pub mod registry;
pub mod store;
pub mod types;
