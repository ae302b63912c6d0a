//! Platform capabilities and live platform probes
//!
//! Capability checks (SDK level, permissions, user opt-in) happen once at
//! startup. Everything that changes while the process runs goes through
//! [`PlatformProbe`].

use crate::config::{CallPreferences, PlatformConfig};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Telecom integration crashes on older platforms, so it is never enabled
/// below this SDK level.
pub const TELECOM_MIN_SDK: u32 = 29;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    Supported,
    Unsupported,
}

impl Capability {
    pub fn is_supported(&self) -> bool {
        matches!(self, Capability::Supported)
    }
}

/// What the platform telecom service says about incoming calls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelecomStatus {
    pub incoming_call_permitted: bool,
    pub in_managed_call: bool,
}

impl Default for TelecomStatus {
    fn default() -> Self {
        Self {
            incoming_call_permitted: true,
            in_managed_call: false,
        }
    }
}

/// Capabilities resolved once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformCapabilities {
    /// Platform telecom integration mediates call audio and focus
    pub telecom: Capability,
    /// Cellular call state can be read
    pub phone_state: Capability,
}

impl PlatformCapabilities {
    pub fn resolve(prefs: &CallPreferences, platform: &PlatformConfig) -> Self {
        let telecom = if !prefs.use_telecom_manager {
            Capability::Unsupported
        } else if platform.sdk_level < TELECOM_MIN_SDK {
            warn!(
                "SDK level {} is below {}, disabling telecom manager",
                platform.sdk_level, TELECOM_MIN_SDK
            );
            Capability::Unsupported
        } else if !platform.telecom_permissions_granted {
            warn!("Can't use telecom manager, permissions have been revoked");
            Capability::Unsupported
        } else {
            info!("Telecom manager enabled");
            Capability::Supported
        };

        let phone_state = if platform.phone_state_permission_granted {
            Capability::Supported
        } else {
            warn!("Can't monitor phone state, READ_PHONE_STATE permission isn't granted");
            Capability::Unsupported
        };

        Self {
            telecom,
            phone_state,
        }
    }

    pub fn unsupported() -> Self {
        Self {
            telecom: Capability::Unsupported,
            phone_state: Capability::Unsupported,
        }
    }
}

/// Live platform state, queried while handling an event
#[cfg_attr(test, mockall::automock)]
pub trait PlatformProbe: Send + Sync {
    /// A cellular call is in progress
    fn is_gsm_call_active(&self) -> bool;

    fn telecom_status(&self) -> TelecomStatus;

    fn is_headset_available(&self) -> bool;

    fn is_bluetooth_available(&self) -> bool;

    /// Current network is too slow for full-quality media
    fn has_low_bandwidth(&self) -> bool;

    fn is_network_reachable(&self) -> bool;

    fn has_storage_permission(&self) -> bool;
}
