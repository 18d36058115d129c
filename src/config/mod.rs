// Configuration module entry point
// Loads layered configuration and builds the runtime state from it

mod state;
mod types;

use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, HttpConfig, LoggingConfig, MountConfig, PackagesConfig, PerformanceConfig,
    ServerConfig,
};

/// Environment variables override file values, e.g. `STATICFILES__SERVER__PORT=9000`
const ENV_PREFIX: &str = "STATICFILES";

impl Config {
    /// Load configuration from specified file path (extension optional)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::builder()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Load configuration from TOML text, defaults applied
    pub fn from_toml_str(content: &str) -> Result<Self, config::ConfigError> {
        Self::builder()?
            .add_source(config::File::from_str(content, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError>
    {
        config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.show_headers", false)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "staticfiles/0.1")
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    /// Effective configuration rendered back to TOML
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::roots::PackageSpec;
    use std::path::PathBuf;

    #[test]
    fn test_defaults() {
        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 8080);
        assert!(cfg.logging.access_log);
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert_eq!(cfg.performance.read_timeout, 30);
        assert!(cfg.mounts.is_empty());
        assert!(cfg.packages.search_paths.is_empty());
        assert_eq!(
            cfg.get_socket_addr().unwrap(),
            "127.0.0.1:8080".parse().unwrap()
        );
    }

    #[test]
    fn test_mounts() {
        let cfg = Config::from_toml_str(
            r#"
            [server]
            port = 9000

            [packages]
            search_paths = ["vendor"]

            [[mounts]]
            prefix = "/static"
            directories = ["public", "assets"]
            packages = ["theme", { name = "docs", path = "site" }]
            cache_control = "public, max-age=3600"

            [[mounts]]
            prefix = "/"
            directories = ["www"]
            html = true
            check_dir = false
            "#,
        )
        .unwrap();

        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.packages.search_paths, [PathBuf::from("vendor")]);
        assert_eq!(cfg.mounts.len(), 2);

        let statics = &cfg.mounts[0];
        assert_eq!(statics.prefix, "/static");
        assert_eq!(
            statics.directories,
            [PathBuf::from("public"), PathBuf::from("assets")]
        );
        assert_eq!(
            statics.packages,
            [PackageSpec::from("theme"), PackageSpec::from(("docs", "site"))]
        );
        assert!(!statics.html);
        assert!(statics.check_dir);

        let site = cfg.mounts[1].to_options();
        assert!(site.html);
        assert!(!site.check_dir);
        assert!(!site.follow_symlink);
        assert!(site.cache_control.is_none());
    }

    #[test]
    fn test_toml_round_trip_keeps_mounts() {
        let cfg = Config::from_toml_str(
            r#"
            [[mounts]]
            prefix = "/"
            directories = ["www"]
            "#,
        )
        .unwrap();
        let rendered = cfg.to_toml_string().unwrap();
        assert!(rendered.contains("[[mounts]]"));
        assert!(rendered.contains("prefix = \"/\""));
    }
}
