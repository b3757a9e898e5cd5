pub mod http;
pub mod line_source;
