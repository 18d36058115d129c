// Configuration types module
// Defines all configuration-related data structures

use crate::handler::roots::{PackageLocator, PackageSpec};
use crate::handler::static_files::StaticFilesOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub packages: PackagesConfig,
    #[serde(default)]
    pub mounts: Vec<MountConfig>,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Tokio worker threads. Connections are served on the main thread's
    /// `LocalSet`; the workers run spawned tasks such as signal handling and
    /// back the blocking pool used by `tokio::fs`.
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    pub show_headers: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
}

/// Where packaged static roots are looked up
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct PackagesConfig {
    /// Directories searched, in order, for `<package>/`
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
    /// Explicit package locations, consulted before `search_paths`
    #[serde(default)]
    pub locations: HashMap<String, PathBuf>,
}

impl PackagesConfig {
    pub fn locator(&self) -> PackageLocator {
        PackageLocator::new(self.search_paths.clone(), self.locations.clone())
    }
}

/// A static resolver mounted under a URL prefix
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MountConfig {
    pub prefix: String,
    #[serde(default)]
    pub directories: Vec<PathBuf>,
    #[serde(default)]
    pub packages: Vec<PackageSpec>,
    #[serde(default)]
    pub html: bool,
    #[serde(default = "default_check_dir")]
    pub check_dir: bool,
    #[serde(default)]
    pub follow_symlink: bool,
    #[serde(default)]
    pub cache_control: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_check_dir() -> bool {
    true
}

impl MountConfig {
    pub fn to_options(&self) -> StaticFilesOptions {
        StaticFilesOptions {
            directories: self.directories.clone(),
            packages: self.packages.clone(),
            html: self.html,
            check_dir: self.check_dir,
            follow_symlink: self.follow_symlink,
            cache_control: self.cache_control.clone(),
        }
    }
}
