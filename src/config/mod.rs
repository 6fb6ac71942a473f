//! Capture settings and their persistent storage.

pub mod settings;

pub use settings::{
    BuildMode, CaptureSettings, DEFAULT_HYDRATION_MESSAGE, HYDRATION_DOCS_LINK, SettingsError,
    SettingsManager, get_config_path,
};
