/// Middleware module
///
/// Request counting for the static file server.

mod metrics;

pub use metrics::{CountHits, FileServerHits};
