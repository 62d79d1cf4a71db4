//! Relative reference parsing for operation targets.
//!
//! Instance-scoped operations receive their target identity out-of-band as a
//! relative reference (`Type/id`). The engine uses the parsed resource type
//! to narrow dispatch when the caller did not name one explicitly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A parsed relative reference (`Type/id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Reference {
    /// The resource type (e.g., "Patient", "Observation")
    pub resource_type: String,
    /// The resource ID
    pub id: String,
}

impl Reference {
    /// Creates a new reference.
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Returns the reference as a relative string (`Type/id`).
    pub fn to_relative(&self) -> String {
        format!("{}/{}", self.resource_type, self.id)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_relative())
    }
}

impl FromStr for Reference {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let reference = s.trim();
        if reference.is_empty() {
            return Err(CoreError::invalid_reference("empty reference"));
        }

        let mut parts = reference.splitn(2, '/');
        let resource_type = parts.next().unwrap_or_default();
        let id = parts.next().unwrap_or_default();

        // Resource types start with an uppercase ASCII letter.
        if !resource_type
            .chars()
            .next()
            .map(|c| c.is_ascii_uppercase())
            .unwrap_or(false)
        {
            return Err(CoreError::invalid_reference(reference));
        }

        if id.is_empty() || id.contains('/') {
            return Err(CoreError::invalid_reference(reference));
        }

        Ok(Self {
            resource_type: resource_type.to_string(),
            id: id.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_relative_reference() {
        let r: Reference = "Patient/123".parse().unwrap();
        assert_eq!(r.resource_type, "Patient");
        assert_eq!(r.id, "123");
    }

    #[test]
    fn test_parse_rejects_lowercase_type() {
        assert!("patient/123".parse::<Reference>().is_err());
    }

    #[test]
    fn test_parse_rejects_missing_id() {
        assert!("Patient".parse::<Reference>().is_err());
        assert!("Patient/".parse::<Reference>().is_err());
    }

    #[test]
    fn test_parse_rejects_extra_segments() {
        assert!("Patient/123/_history/1".parse::<Reference>().is_err());
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!("".parse::<Reference>().is_err());
        assert!("   ".parse::<Reference>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        let r = Reference::new("Observation", "obs-1");
        assert_eq!(r.to_string(), "Observation/obs-1");
        assert_eq!(r.to_string().parse::<Reference>().unwrap(), r);
    }
}
