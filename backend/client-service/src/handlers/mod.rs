/// HTTP endpoints
pub mod clients;

pub use clients::configure;
