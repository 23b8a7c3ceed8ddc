//! HTTP protocol layer module
//!
//! Response construction shared by the request handler.

pub mod response;

// Re-export commonly used types
pub use response::{build_404_response, build_405_response, build_redirect_response};
