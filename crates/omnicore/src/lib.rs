pub mod adapters;
pub mod audit;
pub mod checkout;
pub mod config;
pub mod error;
pub mod portal;
pub mod service;
pub mod telemetry;
