//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Identifier of a local user account.
///
/// Users are keyed by the database sequence, so the id is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Creates a new UserId, returning error if not positive.
    pub fn new(id: i64) -> Result<Self, ValidationError> {
        if id <= 0 {
            return Err(ValidationError::invalid_format(
                "user_id",
                format!("must be positive, got {}", id),
            ));
        }
        Ok(Self(id))
    }

    /// Returns the raw database value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s
            .trim()
            .parse::<i64>()
            .map_err(|e| ValidationError::invalid_format("user_id", e.to_string()))?;
        Self::new(raw)
    }
}

/// Local identifier of a stored subscription record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(i64);

impl SubscriptionId {
    pub fn from_i64(id: i64) -> Self {
        Self(id)
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_accepts_positive_values() {
        let id = UserId::new(42).unwrap();
        assert_eq!(id.as_i64(), 42);
    }

    #[test]
    fn user_id_rejects_zero_and_negative() {
        assert!(UserId::new(0).is_err());
        match UserId::new(-7) {
            Err(ValidationError::InvalidFormat { field, .. }) => assert_eq!(field, "user_id"),
            _ => panic!("Expected InvalidFormat error"),
        }
    }

    #[test]
    fn user_id_parses_from_string() {
        let id: UserId = "17".parse().unwrap();
        assert_eq!(id, UserId::new(17).unwrap());
        assert!("abc".parse::<UserId>().is_err());
        assert!("0".parse::<UserId>().is_err());
    }

    #[test]
    fn user_id_displays_correctly() {
        let id = UserId::new(456).unwrap();
        assert_eq!(format!("{}", id), "456");
    }

    #[test]
    fn user_id_serializes_transparently() {
        let id = UserId::new(9).unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "9");
    }

    #[test]
    fn subscription_id_roundtrips_raw_value() {
        let id = SubscriptionId::from_i64(3);
        assert_eq!(id.as_i64(), 3);
        assert_eq!(id.to_string(), "3");
    }
}
