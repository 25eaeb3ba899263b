// Configuration loading

pub mod settings;

pub use settings::{delimiter_byte, ConfigError, DisplaySettings, ImportSettings, Settings};
