pub mod adapters;
pub mod config;
pub mod domain;
pub mod scanner;
pub mod telemetry;
