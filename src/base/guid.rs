//! Two-part node identifiers.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A document-wide unique node identifier.
///
/// Combines the editing session that minted the node with a
/// session-local counter. Symbol descendants and the override entries
/// that address them are usually minted in different sessions, which is
/// why [`crate::resolve::translate`] exists at all.
///
/// Ordering is session first, then local id.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "interchange", derive(serde::Serialize, serde::Deserialize))]
pub struct Guid {
    /// The session that minted this identifier
    pub session_id: u32,
    /// The counter within that session
    pub local_id: u32,
}

impl Guid {
    /// Create a new Guid.
    #[inline]
    pub const fn new(session_id: u32, local_id: u32) -> Self {
        Self {
            session_id,
            local_id,
        }
    }

    /// The local id `offset` slots below this one.
    ///
    /// Returns `None` when the result would leave the `u32` range.
    #[inline]
    pub fn local_minus(self, offset: i64) -> Option<u32> {
        u32::try_from(i64::from(self.local_id) - offset).ok()
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({}:{})", self.session_id, self.local_id)
    }
}

/// Canonical `session:local` form, used as a map key by hosts.
impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.session_id, self.local_id)
    }
}

impl From<(u32, u32)> for Guid {
    #[inline]
    fn from((session_id, local_id): (u32, u32)) -> Self {
        Self::new(session_id, local_id)
    }
}

/// Error returned when a string is not in `session:local` form.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid guid '{input}': expected 'session:local'")]
pub struct ParseGuidError {
    input: String,
}

impl FromStr for Guid {
    type Err = ParseGuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseGuidError {
            input: s.to_string(),
        };
        let (session, local) = s.split_once(':').ok_or_else(err)?;
        let session_id = session.trim().parse().map_err(|_| err())?;
        let local_id = local.trim().parse().map_err(|_| err())?;
        Ok(Self::new(session_id, local_id))
    }
}
