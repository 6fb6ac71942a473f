//! Capture settings with XDG Base Directory compliance.
//!
//! Settings are stored as JSON. Every field has a default, so a partial file
//! (or no file at all) yields a working configuration.

use std::{
    env::var,
    fs::{create_dir_all, read_to_string, write},
    io::Error as StdError,
    path::PathBuf,
};

use {
    parking_lot::{RwLock, RwLockReadGuard},
    serde::{Deserialize, Serialize},
    serde_json::{Error as SerdeJsonError, from_str, to_string_pretty},
    thiserror::Error,
    tracing::debug,
};

/// Documentation link appended to hydration errors without a diff.
pub const HYDRATION_DOCS_LINK: &str = "https://nextjs.org/docs/messages/react-hydration-error";

/// Warning injected when a hydration error carries no recorded warning.
pub const DEFAULT_HYDRATION_MESSAGE: &str =
    "Hydration failed because the initial UI does not match what was rendered on the server.";

/// Error type for settings operations.
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Failed to read or write settings file.
    #[error("IO error: {0}")]
    IoError(#[from] StdError),
    /// Failed to serialize or deserialize settings.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] SerdeJsonError),
    /// Invalid settings value.
    #[error("Invalid settings value: {reason}")]
    InvalidValue { reason: String },
}

/// Build flavour of the running bundle.
///
/// The framework's error-boundary logger passes the offending error at a
/// different console argument position depending on the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Development build (default).
    #[default]
    Development,
    /// Production build.
    Production,
}

impl BuildMode {
    /// Position of the error among `console.error` arguments.
    ///
    /// # Returns
    ///
    /// `1` for development builds, `0` for production builds.
    #[must_use]
    pub const fn console_error_index(self) -> usize {
        match self {
            Self::Development => 1,
            Self::Production => 0,
        }
    }
}

/// Serializable capture settings with default values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureSettings {
    /// Build flavour, selects the console error argument.
    pub build_mode: BuildMode,
    /// Whether partial prerendering is enabled for the route.
    pub route_ppr_enabled: bool,
    /// Link appended to hydration errors that have no diff.
    pub hydration_docs_link: String,
    /// Warning used when no hydration warning was recorded.
    pub default_hydration_message: String,
    /// Minimum capacity of async capture feeds.
    pub feed_capacity: usize,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            build_mode: BuildMode::Development,
            route_ppr_enabled: false,
            hydration_docs_link: HYDRATION_DOCS_LINK.to_string(),
            default_hydration_message: DEFAULT_HYDRATION_MESSAGE.to_string(),
            feed_capacity: 64,
        }
    }
}

impl CaptureSettings {
    /// Checks values that serde cannot reject on its own.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError::InvalidValue` for an empty docs link or a zero
    /// feed capacity.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.hydration_docs_link.trim().is_empty() {
            return Err(SettingsError::InvalidValue {
                reason: "hydration_docs_link must not be empty".to_string(),
            });
        }
        if self.feed_capacity == 0 {
            return Err(SettingsError::InvalidValue {
                reason: "feed_capacity must be > 0".to_string(),
            });
        }
        Ok(())
    }
}

/// Handles loading, saving, and validation of capture settings.
#[derive(Debug)]
pub struct SettingsManager {
    /// Thread-safe settings storage.
    settings: RwLock<CaptureSettings>,
    /// Path to the configuration file on disk.
    config_path: PathBuf,
}

impl SettingsManager {
    /// Creates a new settings manager with the default config path.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if settings cannot be loaded from disk.
    pub fn new() -> Result<Self, SettingsError> {
        Self::with_config_path(get_config_path())
    }

    /// Creates a new settings manager with a custom config path.
    ///
    /// A missing file yields default settings; nothing is written until
    /// [`SettingsManager::update_settings`] is called.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Path of the settings file.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the file exists but cannot be read, parsed,
    /// or validated.
    pub fn with_config_path(config_path: PathBuf) -> Result<Self, SettingsError> {
        let settings = if config_path.exists() {
            debug!("Loading settings from existing file: {:?}", config_path);
            let contents = read_to_string(&config_path)?;
            let settings: CaptureSettings = from_str(&contents)?;
            settings.validate()?;
            settings
        } else {
            debug!("No settings file at {:?}, using defaults", config_path);
            CaptureSettings::default()
        };

        Ok(SettingsManager {
            settings: RwLock::new(settings),
            config_path,
        })
    }

    /// Gets the current settings.
    pub fn get_settings(&self) -> RwLockReadGuard<'_, CaptureSettings> {
        self.settings.read()
    }

    /// Gets the configuration file path.
    pub fn get_config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Validates, applies, and saves new settings.
    ///
    /// # Arguments
    ///
    /// * `new_settings` - New settings to apply.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if the settings are invalid or cannot be saved.
    pub fn update_settings(&self, new_settings: CaptureSettings) -> Result<(), SettingsError> {
        new_settings.validate()?;
        *self.settings.write() = new_settings;
        self.save_settings()
    }

    fn save_settings(&self) -> Result<(), SettingsError> {
        debug!("Saving settings to file: {:?}", self.config_path);
        if let Some(parent) = self.config_path.parent() {
            create_dir_all(parent)?;
        }
        let contents = to_string_pretty(&*self.settings.read())?;
        write(&self.config_path, contents)?;
        Ok(())
    }
}

/// Default settings path under the XDG config home.
#[must_use]
pub fn get_config_path() -> PathBuf {
    let mut config_dir = get_xdg_config_home();
    config_dir.push("catchlight");
    config_dir.push("settings.json");
    config_dir
}

/// Uses `XDG_CONFIG_HOME` if set, otherwise `$HOME/.config`.
fn get_xdg_config_home() -> PathBuf {
    if let Ok(config_home) = var("XDG_CONFIG_HOME")
        && !config_home.is_empty()
    {
        return PathBuf::from(config_home);
    }

    if let Ok(home) = var("HOME") {
        let mut path = PathBuf::from(home);
        path.push(".config");
        return path;
    }

    PathBuf::from(".")
}
