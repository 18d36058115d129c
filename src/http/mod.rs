//! HTTP protocol layer module
//!
//! Protocol helpers shared by the static resolver and the router: cache
//! validators, HTTP dates, MIME detection, bodies and response builders.

pub mod body;
pub mod cache;
pub mod date;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use body::StaticBody;
pub use response::{
    build_304_response, build_401_response, build_404_response, build_405_response,
    build_500_response, build_error_response, build_file_response, build_redirect_response,
    FileHeaders,
};
