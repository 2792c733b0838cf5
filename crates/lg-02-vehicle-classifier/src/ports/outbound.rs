//! Driven Ports (SPI - Outbound Dependencies)

use crate::domain::PlateRules;
use crate::error::PlateRejection;

/// Configured valid-licence-plate predicate
///
/// Called only with non-empty plate text.
pub trait PlateValidator: Send + Sync {
    fn validate(&self, plate: &str) -> Result<(), PlateRejection>;
}

impl PlateValidator for PlateRules {
    fn validate(&self, plate: &str) -> Result<(), PlateRejection> {
        self.check(plate)
    }
}
