pub mod errors;
pub mod models;
pub mod ports;
pub mod scan;
pub mod token;
