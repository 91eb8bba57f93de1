//! Server shared state
//!
//! Each service gets its own state, built once at startup and shared by
//! every handler through an `Arc`.

use crate::locations::LocationService;
use crate::matching::MatchResolver;

/// Shared state for the location service
pub struct LocationsState {
    pub service: LocationService,

    /// Pre-shared key every `/api/v1` request must present
    api_key: String,
}

impl LocationsState {
    pub fn new(service: LocationService, api_key: impl Into<String>) -> Self {
        Self {
            service,
            api_key: api_key.into(),
        }
    }

    /// Compare a presented key against the configured one
    ///
    /// Runs in time independent of where the keys differ. An empty
    /// configured key never matches.
    pub fn accepts_key(&self, presented: &str) -> bool {
        let expected = self.api_key.as_bytes();
        let presented = presented.as_bytes();

        if expected.is_empty() || expected.len() != presented.len() {
            return false;
        }

        expected
            .iter()
            .zip(presented)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }
}

/// Shared state for the matching service
pub struct MatchingState {
    pub resolver: MatchResolver,
}

impl MatchingState {
    pub fn new(resolver: MatchResolver) -> Self {
        Self { resolver }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locations::tests::memory_service;

    #[test]
    fn test_accepts_key() {
        let (_, service) = memory_service();
        let state = LocationsState::new(service, "secret");

        assert!(state.accepts_key("secret"));
        assert!(!state.accepts_key("secreT"));
        assert!(!state.accepts_key("secret2"));
        assert!(!state.accepts_key(""));
    }

    #[test]
    fn test_empty_key_never_matches() {
        let (_, service) = memory_service();
        let state = LocationsState::new(service, "");
        assert!(!state.accepts_key(""));
    }
}
