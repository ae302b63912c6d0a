//! Account bounded context - registration state of SIP accounts

use crate::domain::shared::value_objects::SipAddress;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Registration state as reported by the engine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RegistrationState {
    #[default]
    None,
    Progress,
    Ok,
    Failed,
    Cleared,
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegistrationState::None => "None",
            RegistrationState::Progress => "Progress",
            RegistrationState::Ok => "Ok",
            RegistrationState::Failed => "Failed",
            RegistrationState::Cleared => "Cleared",
        };
        f.write_str(name)
    }
}

/// Engine account projection carried by registration events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub identity: SipAddress,
    pub publish_presence: bool,
    /// The engine's default account
    pub is_default: bool,
}

impl AccountSnapshot {
    pub fn new(identity: SipAddress, is_default: bool) -> Self {
        Self {
            identity,
            publish_presence: false,
            is_default,
        }
    }
}

/// Account as tracked by the registration watcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    snapshot: AccountSnapshot,
    state: RegistrationState,
}

impl Account {
    pub fn new(snapshot: AccountSnapshot) -> Self {
        Self {
            snapshot,
            state: RegistrationState::None,
        }
    }

    /// Apply a new registration state, returning the old one
    pub fn transition(&mut self, snapshot: AccountSnapshot, state: RegistrationState) -> RegistrationState {
        self.snapshot = snapshot;
        std::mem::replace(&mut self.state, state)
    }

    pub fn identity(&self) -> &SipAddress {
        &self.snapshot.identity
    }

    pub fn state(&self) -> RegistrationState {
        self.state
    }

    pub fn is_default(&self) -> bool {
        self.snapshot.is_default
    }

    pub fn is_registered(&self) -> bool {
        self.state == RegistrationState::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_transition() {
        let identity = SipAddress::parse("sip:alice@example.com").unwrap();
        let mut account = Account::new(AccountSnapshot::new(identity.clone(), true));
        assert_eq!(account.state(), RegistrationState::None);

        let old = account.transition(AccountSnapshot::new(identity, true), RegistrationState::Ok);
        assert_eq!(old, RegistrationState::None);
        assert!(account.is_registered());
        assert!(account.is_default());
    }
}
