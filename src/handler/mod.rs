//! Request handler module
//!
//! Static file serving: roots, the resolver, and mount dispatch.

pub mod error;
pub mod roots;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use error::StaticFilesError;
pub use roots::{PackageLocator, PackageSpec, Root};
pub use router::{handle_request, Mount, RequestContext};
pub use static_files::{StaticFiles, StaticFilesOptions};
