//! Client configuration, loadable from TOML or JSON.
//!
//! ```toml
//! app_name = "orders-service"
//!
//! [read_preference]
//! mode = "secondaryPreferred"
//! maxStalenessSeconds = 120
//!
//! [write_concern]
//! w = "majority"
//! j = true
//! wtimeout = 500
//!
//! [logging]
//! dir = "/var/log/orders"
//! level = "debug"
//! retention = 3
//! ```

use crate::errors::DbError;
use crate::settings::{ReadPreference, Settings, WriteConcern};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientOptions {
    pub app_name: Option<String>,
    pub read_preference: ReadPreference,
    pub write_concern: WriteConcern,
    pub logging: LoggingOptions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingOptions {
    pub dir: Option<PathBuf>,
    pub level: Option<String>,
    pub retention: Option<usize>,
}

impl ClientOptions {
    /// # Errors
    /// `Config` on malformed TOML, `InvalidArgument` on invalid settings.
    pub fn from_toml_str(s: &str) -> Result<Self, DbError> {
        let opts: Self = toml::from_str(s)?;
        opts.validate()?;
        Ok(opts)
    }

    /// # Errors
    /// `Config` on malformed JSON, `InvalidArgument` on invalid settings.
    pub fn from_json_str(s: &str) -> Result<Self, DbError> {
        let opts: Self = serde_json::from_str(s)?;
        opts.validate()?;
        Ok(opts)
    }

    /// Loads a `.json` file as JSON and anything else as TOML.
    ///
    /// # Errors
    /// `Config` if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, DbError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| DbError::Config(format!("{}: {e}", path.display())))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&text),
            _ => Self::from_toml_str(&text),
        }
    }

    /// # Errors
    /// `InvalidArgument` if either policy is structurally invalid.
    pub fn validate(&self) -> Result<(), DbError> {
        self.read_preference.validate()?;
        self.write_concern.validate()
    }

    #[must_use]
    pub fn settings(&self) -> Settings {
        Settings::new(self.read_preference.clone(), self.write_concern.clone())
    }
}

impl LoggingOptions {
    /// Installs the process logger described by these options.
    ///
    /// # Errors
    /// Propagates [`crate::logger::configure_logging`] failures as `Config`.
    pub fn apply(&self) -> Result<(), DbError> {
        crate::logger::configure_logging(self.dir.as_deref(), self.level.as_deref(), self.retention)
            .map_err(|e| DbError::Config(e.to_string()))
    }
}
