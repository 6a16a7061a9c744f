//! Coercion of loose bundle version strings into comparable versions.

use std::{cmp::Ordering, fmt, str::FromStr};

use crate::Error;

/// A semantic version coerced from a looser string.
///
/// `"1"`, `"v1.2"` and `"1.2.0"` are all accepted; missing components are
/// zero. Build metadata (`+...`) is dropped and does not take part in
/// comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BundleVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub pre: Option<String>,
}

impl BundleVersion {
    pub fn coerce(raw: &str) -> crate::Result<Self> {
        let invalid = || Error::InvalidBundleVersion {
            version: raw.to_string(),
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(Error::EmptyBundleVersion);
        }
        let body = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        let body = body.split_once('+').map_or(body, |(core, _)| core);
        let (core, pre) = match body.split_once('-') {
            Some((core, pre)) if !pre.is_empty() => (core, Some(pre.to_string())),
            Some(_) => return Err(invalid()),
            None => (body, None),
        };

        let mut parts = [0u64; 3];
        let mut count = 0;
        for piece in core.split('.') {
            if count == 3 || piece.is_empty() || !piece.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            parts[count] = piece.parse().map_err(|_| invalid())?;
            count += 1;
        }

        Ok(Self {
            major: parts[0],
            minor: parts[1],
            patch: parts[2],
            pre,
        })
    }
}

impl FromStr for BundleVersion {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::coerce(s)
    }
}

impl fmt::Display for BundleVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}

impl Ord for BundleVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                // A pre-release sorts before its release.
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for BundleVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
