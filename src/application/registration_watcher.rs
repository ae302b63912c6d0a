//! Registration watcher
//!
//! Tracks the last registration state of every account and drives the
//! foreground notification: once the default account is registered the
//! notification is no longer needed.

use crate::domain::account::{Account, AccountSnapshot, RegistrationState};
use crate::domain::call::Command;
use crate::domain::shared::value_objects::SipAddress;
use std::collections::HashMap;
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct RegistrationWatcher {
    accounts: HashMap<SipAddress, Account>,
    default_account: Option<SipAddress>,
}

impl RegistrationWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_registration_changed(
        &mut self,
        snapshot: AccountSnapshot,
        state: RegistrationState,
        message: &str,
    ) -> Vec<Command> {
        let identity = snapshot.identity.clone();
        info!(
            "Account [{}] registration state changed [{}] {}",
            identity.uri_only(),
            state,
            message
        );

        if snapshot.is_default {
            self.default_account = Some(identity.clone());
        } else if self.default_account.as_ref() == Some(&identity) {
            self.default_account = None;
        }

        let is_default = snapshot.is_default;
        let previous = self
            .accounts
            .entry(identity)
            .or_insert_with(|| Account::new(snapshot.clone()))
            .transition(snapshot, state);
        debug!("Registration {} -> {}", previous, state);

        if state == RegistrationState::Ok && is_default {
            return vec![Command::StopForegroundNotification];
        }

        Vec::new()
    }

    /// Delayed check: drop the foreground notification once the default
    /// account is registered.
    pub fn on_foreground_check(&self) -> Vec<Command> {
        if self.is_default_account_registered() {
            info!("Default account is registered, cancel foreground service notification if possible");
            vec![Command::StopForegroundNotification]
        } else {
            debug!("Default account not registered yet, keeping foreground notification");
            Vec::new()
        }
    }

    pub fn is_default_account_registered(&self) -> bool {
        self.default_account()
            .map(Account::is_registered)
            .unwrap_or(false)
    }

    pub fn default_account(&self) -> Option<&Account> {
        self.default_account
            .as_ref()
            .and_then(|identity| self.accounts.get(identity))
    }

    pub fn account(&self, identity: &SipAddress) -> Option<&Account> {
        self.accounts.get(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(uri: &str, is_default: bool) -> AccountSnapshot {
        AccountSnapshot::new(SipAddress::parse(uri).unwrap(), is_default)
    }

    #[test]
    fn test_default_account_ok_stops_foreground() {
        let mut watcher = RegistrationWatcher::new();
        let default = account("sip:alice@example.com", true);

        let commands =
            watcher.on_registration_changed(default.clone(), RegistrationState::Progress, "");
        assert!(commands.is_empty());

        let commands = watcher.on_registration_changed(default, RegistrationState::Ok, "Registration successful");
        assert_eq!(commands, vec![Command::StopForegroundNotification]);
        assert!(watcher.is_default_account_registered());
    }

    #[test]
    fn test_other_account_ok_is_logged_only() {
        let mut watcher = RegistrationWatcher::new();
        let other = account("sip:bob@example.com", false);

        let commands = watcher.on_registration_changed(other.clone(), RegistrationState::Ok, "");
        assert!(commands.is_empty());
        assert_eq!(
            watcher.account(&other.identity).unwrap().state(),
            RegistrationState::Ok
        );
    }

    #[test]
    fn test_repeated_ok_is_idempotent() {
        let mut watcher = RegistrationWatcher::new();
        let default = account("sip:alice@example.com", true);

        let first = watcher.on_registration_changed(default.clone(), RegistrationState::Ok, "");
        let second = watcher.on_registration_changed(default, RegistrationState::Ok, "");
        assert_eq!(first, second);
    }

    #[test]
    fn test_foreground_check() {
        let mut watcher = RegistrationWatcher::new();
        assert!(watcher.on_foreground_check().is_empty());

        let default = account("sip:alice@example.com", true);
        watcher.on_registration_changed(default.clone(), RegistrationState::Failed, "");
        assert!(watcher.on_foreground_check().is_empty());

        watcher.on_registration_changed(default, RegistrationState::Ok, "");
        assert_eq!(
            watcher.on_foreground_check(),
            vec![Command::StopForegroundNotification]
        );
    }

    #[test]
    fn test_default_designation_moves() {
        let mut watcher = RegistrationWatcher::new();
        let alice = account("sip:alice@example.com", true);
        watcher.on_registration_changed(alice, RegistrationState::Ok, "");

        let alice_not_default = account("sip:alice@example.com", false);
        watcher.on_registration_changed(alice_not_default, RegistrationState::Ok, "");
        assert!(watcher.default_account().is_none());
    }
}
