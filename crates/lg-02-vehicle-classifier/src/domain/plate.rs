//! Licence plate validation

use crate::error::PlateRejection;
use serde::{Deserialize, Serialize};

/// Rules a plate string must satisfy to identify a vehicle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlateRules {
    /// Minimum length in characters
    pub min_len: usize,
    /// Maximum length in characters
    pub max_len: usize,
    /// Texts detectors send instead of a plate, compared case-insensitively
    pub placeholders: Vec<String>,
}

impl Default for PlateRules {
    fn default() -> Self {
        Self {
            min_len: 2,
            max_len: 16,
            placeholders: ["UNKNOWN", "NONE", "-", "无车牌"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl PlateRules {
    /// Check a non-empty plate.
    pub fn check(&self, plate: &str) -> Result<(), PlateRejection> {
        if plate.chars().any(char::is_control) {
            return Err(PlateRejection::ControlCharacters);
        }
        if self
            .placeholders
            .iter()
            .any(|p| p.to_lowercase() == plate.to_lowercase())
        {
            return Err(PlateRejection::Placeholder);
        }

        let len = plate.chars().count();
        if len < self.min_len {
            return Err(PlateRejection::TooShort(self.min_len));
        }
        if len > self.max_len {
            return Err(PlateRejection::TooLong(self.max_len));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_regular_plates() {
        let rules = PlateRules::default();
        assert!(rules.check("ABC123").is_ok());
        assert!(rules.check("京A12345").is_ok());
    }

    #[test]
    fn test_placeholders_case_insensitive() {
        let rules = PlateRules::default();
        assert_eq!(rules.check("unknown"), Err(PlateRejection::Placeholder));
        assert_eq!(rules.check("None"), Err(PlateRejection::Placeholder));
        assert_eq!(rules.check("-"), Err(PlateRejection::Placeholder));
        assert_eq!(rules.check("无车牌"), Err(PlateRejection::Placeholder));
    }

    #[test]
    fn test_length_bounds_count_characters() {
        let rules = PlateRules {
            min_len: 3,
            max_len: 4,
            placeholders: Vec::new(),
        };
        assert_eq!(rules.check("AB"), Err(PlateRejection::TooShort(3)));
        assert_eq!(rules.check("ABCDE"), Err(PlateRejection::TooLong(4)));
        // Four characters, twelve bytes
        assert!(rules.check("京京京京").is_ok());
    }

    #[test]
    fn test_control_characters_rejected() {
        let rules = PlateRules::default();
        assert_eq!(
            rules.check("AB\u{1}C"),
            Err(PlateRejection::ControlCharacters)
        );
    }

    #[test]
    fn test_partial_rules_from_toml() {
        let rules: PlateRules = toml::from_str("min_len = 5").unwrap();
        assert_eq!(rules.min_len, 5);
        assert_eq!(rules.max_len, 16);
        assert_eq!(rules.placeholders.len(), 4);
    }
}
