//! Static file server
//!
//! Serves files from ordered directory and package roots with conditional
//! GET support (`ETag`, `Last-Modified`), traversal protection and optional
//! html mode (`index.html` for directories, custom `404.html`).
//!
//! ```no_run
//! use staticfiles::handler::{PackageLocator, StaticFiles, StaticFilesOptions};
//!
//! let files = StaticFiles::new(
//!     StaticFilesOptions {
//!         directories: vec!["public".into()],
//!         html: true,
//!         ..StaticFilesOptions::default()
//!     },
//!     &PackageLocator::default(),
//! )?;
//! # Ok::<(), staticfiles::handler::StaticFilesError>(())
//! ```

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;
