//! Configuration management

use crate::domain::shared::error::DomainError;
use crate::domain::shared::result::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix, e.g. `CALLFLOW__PREFERENCES__AUTO_ANSWER_ENABLED=true`
pub const ENV_PREFIX: &str = "CALLFLOW";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub preferences: CallPreferences,
    pub platform: PlatformConfig,
    pub logging: LoggingConfig,
}

/// User preferences that drive call policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallPreferences {
    pub auto_answer_enabled: bool,
    /// Zero means answer immediately
    pub auto_answer_delay_ms: u64,
    pub route_audio_to_bluetooth_if_available: bool,
    pub automatically_start_call_recording: bool,
    pub prevent_interface_from_showing_up: bool,
    pub use_telecom_manager: bool,
    pub redirect_declined_call_to_voicemail: bool,
    pub voicemail_uri: Option<String>,
    pub disable_video: bool,
    /// Mirrors the engine video activation policy
    pub video_auto_initiate: bool,
    pub publish_presence: bool,
    pub keep_service_alive: bool,
    pub send_early_media: bool,
    /// Engine downloads incoming files on its own
    pub auto_download_enabled: bool,
    pub make_public_media_files_downloaded: bool,
    pub vfs_enabled: bool,
    pub recordings_dir: PathBuf,
}

impl Default for CallPreferences {
    fn default() -> Self {
        Self {
            auto_answer_enabled: false,
            auto_answer_delay_ms: 0,
            route_audio_to_bluetooth_if_available: true,
            automatically_start_call_recording: false,
            prevent_interface_from_showing_up: false,
            use_telecom_manager: false,
            redirect_declined_call_to_voicemail: false,
            voicemail_uri: None,
            disable_video: false,
            video_auto_initiate: false,
            publish_presence: true,
            keep_service_alive: false,
            send_early_media: false,
            auto_download_enabled: true,
            make_public_media_files_downloaded: false,
            vfs_enabled: false,
            recordings_dir: PathBuf::from("recordings"),
        }
    }
}

impl CallPreferences {
    pub fn auto_answer_delay(&self) -> Duration {
        Duration::from_millis(self.auto_answer_delay_ms)
    }
}

/// What the host platform offers, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub sdk_level: u32,
    pub telecom_permissions_granted: bool,
    pub phone_state_permission_granted: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            sdk_level: 33,
            telecom_permissions_granted: false,
            phone_state_permission_granted: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Layered load: defaults, then the optional file, then environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder().add_source(
            config::Config::try_from(&Config::default()).map_err(config_error)?,
        );

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Config = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .map_err(config_error)?
            .try_deserialize()
            .map_err(config_error)?;

        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Config = toml::from_str(input)
            .map_err(|e| DomainError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let prefs = &self.preferences;

        if prefs.recordings_dir.as_os_str().is_empty() {
            return Err(DomainError::Configuration(
                "recordings_dir must not be empty".to_string(),
            ));
        }

        if prefs.redirect_declined_call_to_voicemail
            && prefs.voicemail_uri.as_deref().map_or(true, str::is_empty)
        {
            return Err(DomainError::Configuration(
                "redirect_declined_call_to_voicemail requires voicemail_uri".to_string(),
            ));
        }

        Ok(())
    }
}

fn config_error(e: config::ConfigError) -> DomainError {
    DomainError::Configuration(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(!config.preferences.auto_answer_enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_from_toml_overrides_defaults() {
        let config = Config::from_toml_str(
            r#"
            [preferences]
            auto_answer_enabled = true
            auto_answer_delay_ms = 1500

            [platform]
            sdk_level = 30
            telecom_permissions_granted = true
            "#,
        )
        .unwrap();

        assert!(config.preferences.auto_answer_enabled);
        assert_eq!(config.preferences.auto_answer_delay(), Duration::from_millis(1500));
        assert_eq!(config.platform.sdk_level, 30);
        // Untouched fields keep their defaults
        assert!(config.preferences.route_audio_to_bluetooth_if_available);
        assert!(config.platform.phone_state_permission_granted);
    }

    #[test]
    fn test_voicemail_redirect_requires_uri() {
        let result = Config::from_toml_str(
            r#"
            [preferences]
            redirect_declined_call_to_voicemail = true
            "#,
        );
        assert!(matches!(result, Err(DomainError::Configuration(_))));
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = Config::load(None).unwrap();
        assert_eq!(config.preferences, CallPreferences::default());
    }
}
