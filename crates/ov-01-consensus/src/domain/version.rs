//! Protocol-version gating.
//!
//! Responses from validators running an incompatible protocol version are
//! ignored entirely: not counted toward quorum, not treated as errors.

use tracing::debug;

/// Checks peer protocol versions against this node's.
///
/// Compatibility is major-version equality on `"major.minor.patch"` strings.
/// A malformed version is incompatible, never an error.
#[derive(Clone, Debug)]
pub struct VersionChecker {
    own_major: u32,
    own_version: String,
}

fn major_of(version: &str) -> Option<u32> {
    version.split('.').next()?.trim().parse().ok()
}

impl VersionChecker {
    pub fn new(own_version: impl Into<String>) -> Self {
        let own_version = own_version.into();
        let own_major = major_of(&own_version).unwrap_or(0);
        Self {
            own_major,
            own_version,
        }
    }

    /// Whether a peer's version is compatible with ours.
    pub fn is_compatible(&self, peer_version: &str) -> bool {
        match major_of(peer_version) {
            Some(major) => major == self.own_major,
            None => {
                debug!(
                    peer_version = %peer_version,
                    own_version = %self.own_version,
                    "Ignoring response with malformed protocol version"
                );
                false
            }
        }
    }
}
