// Application state module
// Immutable runtime state shared by every connection

use super::types::Config;
use crate::handler::error::StaticFilesError;
use crate::handler::router::Mount;
use crate::handler::static_files::StaticFiles;

/// Application state
#[derive(Debug)]
pub struct AppState {
    pub config: Config,
    pub mounts: Vec<Mount>,
}

impl AppState {
    /// Build every configured mount
    ///
    /// Any misconfigured mount aborts startup.
    pub fn new(config: &Config) -> Result<Self, StaticFilesError> {
        let locator = config.packages.locator();
        let mounts = config
            .mounts
            .iter()
            .map(|m| {
                Ok(Mount {
                    prefix: m.prefix.clone(),
                    files: StaticFiles::new(m.to_options(), &locator)?,
                })
            })
            .collect::<Result<Vec<_>, StaticFilesError>>()?;

        Ok(Self {
            config: config.clone(),
            mounts,
        })
    }
}
