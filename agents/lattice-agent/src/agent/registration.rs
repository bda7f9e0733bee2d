//! Registration State
//!
//! Shared flag tracking whether this agent is currently registered with the
//! controller. Set by the connection layer, read by the status reporter.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle to the registration flag.
///
/// Readers take no lock; concurrent reads around a registration transition
/// may observe either value, which the reporter loop tolerates by checking
/// the flag independently for the send and the clear paths.
#[derive(Debug, Clone, Default)]
pub struct RegistrationState {
    registered: Arc<AtomicBool>,
}

impl RegistrationState {
    /// Create a new handle starting unregistered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the agent is currently registered with the controller.
    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    /// Update the flag. Called by the registration protocol on handshake
    /// completion and on disconnect.
    pub fn set_registered(&self, registered: bool) {
        self.registered.store(registered, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_unregistered() {
        let state = RegistrationState::new();
        assert!(!state.is_registered());
    }

    #[test]
    fn test_clones_share_state() {
        let state = RegistrationState::new();
        let clone = state.clone();

        state.set_registered(true);
        assert!(clone.is_registered());

        clone.set_registered(false);
        assert!(!state.is_registered());
    }
}
