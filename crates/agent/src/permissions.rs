//! Tracking consent flags.
//!
//! The headless counterpart of runtime location permissions: two consent
//! flags resolved from the environment, queried on demand and never stored.

/// Consent state for location tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermissionState {
    /// Consent to read the device position at all.
    pub fine_location: bool,

    /// Consent to keep tracking while unattended.
    pub background_location: bool,
}

impl PermissionState {
    /// Both consents granted.
    pub fn granted(&self) -> bool {
        self.fine_location && self.background_location
    }

    /// Resolve the current consent flags from the environment.
    pub fn from_env() -> Self {
        Self {
            fine_location: flag_from(std::env::var("LOCATOR_ALLOW_LOCATION").ok().as_deref()),
            background_location: flag_from(
                std::env::var("LOCATOR_ALLOW_BACKGROUND").ok().as_deref(),
            ),
        }
    }

    /// A fully granted state, for callers that gate consent elsewhere.
    pub fn all_granted() -> Self {
        Self {
            fine_location: true,
            background_location: true,
        }
    }

    /// A fully denied state.
    pub fn denied() -> Self {
        Self {
            fine_location: false,
            background_location: false,
        }
    }
}

fn flag_from(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1") | Some("true") | Some("yes")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_parsing() {
        assert!(flag_from(Some("1")));
        assert!(flag_from(Some("true")));
        assert!(flag_from(Some("TRUE")));
        assert!(flag_from(Some("yes")));
        assert!(!flag_from(Some("0")));
        assert!(!flag_from(Some("false")));
        assert!(!flag_from(Some("")));
        assert!(!flag_from(None));
    }

    #[test]
    fn test_granted_requires_both() {
        let partial = PermissionState {
            fine_location: true,
            background_location: false,
        };
        assert!(!partial.granted());
        assert!(PermissionState::all_granted().granted());
        assert!(!PermissionState::denied().granted());
    }
}
