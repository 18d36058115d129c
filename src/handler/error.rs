//! Static resolver configuration errors
//!
//! Filesystem failures while serving a request are answered with an HTTP
//! status and never surface here. These variants are misconfigurations:
//! they abort startup or fail the first request that touches the roots.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StaticFilesError {
    #[error("StaticFiles instance has no directories or packages configured")]
    NotConfigured,

    /// Raised at construction when `check_dir` is enabled
    #[error("Directory '{}' does not exist", .0.display())]
    DirectoryNotFound(PathBuf),

    /// Raised by the lazy check on first request
    #[error("StaticFiles directory '{}' does not exist.", .0.display())]
    DirectoryMissing(PathBuf),

    #[error("StaticFiles path '{}' is not a directory.", .0.display())]
    NotADirectory(PathBuf),

    #[error("Package '{0}' could not be found.")]
    PackageNotFound(String),

    #[error("Directory '{subpath}' in package '{package}' could not be found.")]
    PackageDirectoryNotFound { package: String, subpath: String },

    #[error("Failed to inspect '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = StaticFilesError::DirectoryNotFound(PathBuf::from("/srv/none"));
        assert!(err.to_string().contains("does not exist"));

        let err = StaticFilesError::NotADirectory(PathBuf::from("/srv/file.txt"));
        assert!(err.to_string().contains("is not a directory"));

        let err = StaticFilesError::PackageDirectoryNotFound {
            package: "assets".to_string(),
            subpath: "statics".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Directory 'statics' in package 'assets' could not be found."
        );
    }
}
