//! Semantic version value
//!
//! Only ever persisted as its `major.minor.patch` string form inside the
//! version ledger table.

use crate::error::VersionError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Version assigned to the first snapshot of a document
pub const SEED_VERSION: VersionInfo = VersionInfo::new(0, 1, 0);

/// Semantic version `major.minor.patch`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VersionInfo {
    /// Major component
    pub major: u32,
    /// Minor component
    pub minor: u32,
    /// Patch component
    pub patch: u32,
}

/// Component targeted by [`VersionInfo::increment`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionPart {
    /// Breaking change
    Major,
    /// New version of the document
    Minor,
    /// Small correction
    Patch,
}

impl VersionInfo {
    /// Create version
    #[inline]
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse `major.minor.patch`
    ///
    /// # Errors
    /// [`VersionError::Format`] unless the string has exactly three
    /// non-negative integer components.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let format_error = || VersionError::Format(s.to_string());

        let parts: Vec<&str> = s.trim().split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(format_error());
        };

        let component = |p: &str| p.trim().parse::<u32>().map_err(|_| format_error());
        Ok(Self::new(component(major)?, component(minor)?, component(patch)?))
    }

    /// Bump one component in place
    ///
    /// Lower components reset to zero.
    ///
    /// # Errors
    /// [`VersionError::Overflow`] if the component is already `u32::MAX`;
    /// the version is left unchanged.
    pub fn increment(&mut self, part: VersionPart) -> Result<(), VersionError> {
        let current = *self;
        let overflow = || VersionError::Overflow(current.to_string());
        *self = match part {
            VersionPart::Major => Self::new(self.major.checked_add(1).ok_or_else(overflow)?, 0, 0),
            VersionPart::Minor => Self::new(self.major, self.minor.checked_add(1).ok_or_else(overflow)?, 0),
            VersionPart::Patch => Self::new(self.major, self.minor, self.patch.checked_add(1).ok_or_else(overflow)?),
        };
        Ok(())
    }

    /// Bump one component named by string
    ///
    /// # Errors
    /// [`VersionError::InvalidPart`] for anything but `major`, `minor` or
    /// `patch`, [`VersionError::Overflow`] as for [`VersionInfo::increment`].
    /// On error the version is left unchanged.
    pub fn increment_named(&mut self, part: &str) -> Result<(), VersionError> {
        self.increment(part.parse()?)
    }

    /// Copy with one component bumped
    ///
    /// # Errors
    /// Same as [`VersionInfo::increment`].
    #[inline]
    pub fn bumped(mut self, part: VersionPart) -> Result<Self, VersionError> {
        self.increment(part)?;
        Ok(self)
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for VersionInfo {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl FromStr for VersionPart {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            other => Err(VersionError::InvalidPart(other.to_string())),
        }
    }
}

impl Serialize for VersionInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VersionInfo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_valid() {
        assert_eq!(VersionInfo::parse("1.2.3").unwrap(), VersionInfo::new(1, 2, 3));
        assert_eq!(" 0.10.0 ".parse::<VersionInfo>().unwrap(), VersionInfo::new(0, 10, 0));
    }

    #[test]
    fn parse_rejects_wrong_component_count() {
        for bad in ["", "1", "1.2", "1.2.3.4", "1..3"] {
            assert!(
                matches!(VersionInfo::parse(bad), Err(VersionError::Format(_))),
                "expected format error for {bad:?}"
            );
        }
    }

    #[test]
    fn parse_rejects_non_integers() {
        for bad in ["a.b.c", "1.2.x", "1.-2.3", "v1.2.3"] {
            assert!(matches!(VersionInfo::parse(bad), Err(VersionError::Format(_))));
        }
    }

    #[test]
    fn increment_major_resets_minor_and_patch() {
        assert_eq!(VersionInfo::new(1, 2, 3).bumped(VersionPart::Major).unwrap(), VersionInfo::new(2, 0, 0));
    }

    #[test]
    fn increment_minor_resets_patch_only() {
        assert_eq!(VersionInfo::new(1, 2, 3).bumped(VersionPart::Minor).unwrap(), VersionInfo::new(1, 3, 0));
    }

    #[test]
    fn increment_patch_changes_patch_only() {
        assert_eq!(VersionInfo::new(1, 2, 3).bumped(VersionPart::Patch).unwrap(), VersionInfo::new(1, 2, 4));
    }

    #[test]
    fn increment_at_component_limit_overflows() {
        let cases = [
            (VersionInfo::new(u32::MAX, 0, 0), VersionPart::Major),
            (VersionInfo::new(1, u32::MAX, 0), VersionPart::Minor),
            (VersionInfo::new(1, 2, u32::MAX), VersionPart::Patch),
        ];
        for (start, part) in cases {
            let mut version = start;
            let err = version.increment(part).unwrap_err();

            assert_eq!(err, VersionError::Overflow(start.to_string()));
            assert_eq!(version, start, "{part:?} bump must leave the version unchanged");
        }
    }

    #[test]
    fn stored_limit_version_parses_but_cannot_be_bumped() {
        let latest = VersionInfo::parse("1.4294967295.0").unwrap();
        assert!(matches!(latest.bumped(VersionPart::Minor), Err(VersionError::Overflow(_))));
        // Lower components at their limit are reset, not incremented.
        assert_eq!(
            latest.bumped(VersionPart::Major).unwrap(),
            VersionInfo::new(2, 0, 0)
        );
    }

    #[test]
    fn increment_named_rejects_unknown_part() {
        let mut version = VersionInfo::new(1, 2, 3);
        let err = version.increment_named("build").unwrap_err();

        assert_eq!(err, VersionError::InvalidPart("build".to_string()));
        assert_eq!(version, VersionInfo::new(1, 2, 3));

        version.increment_named("minor").unwrap();
        assert_eq!(version, VersionInfo::new(1, 3, 0));
    }

    #[test]
    fn seed_version_string() {
        assert_eq!(SEED_VERSION.to_string(), "0.1.0");
    }

    #[test]
    fn serde_uses_string_form() {
        let json = serde_json::to_string(&VersionInfo::new(2, 1, 0)).unwrap();
        assert_eq!(json, "\"2.1.0\"");

        let back: VersionInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, VersionInfo::new(2, 1, 0));
        assert!(serde_json::from_str::<VersionInfo>("\"2.1\"").is_err());
    }

    proptest! {
        #[test]
        fn parse_inverts_display(major in any::<u32>(), minor in any::<u32>(), patch in any::<u32>()) {
            let version = VersionInfo::new(major, minor, patch);
            prop_assert_eq!(VersionInfo::parse(&version.to_string()).unwrap(), version);
        }
    }
}
