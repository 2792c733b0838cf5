//! Vehicle Classifier Service
//!
//! Shared by every detector connection. Wraps the pure [`classify`] function
//! with drop accounting and logging.

use crate::domain::{classify, ClassifiedEvent, LaneMap, PlateRules};
use crate::error::{ClassifyDrop, ClassifyResult};
use crate::ports::PlateValidator;
use lg_01_detector_protocol::VehicleDetection;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Classification counters
///
/// Thread-safe; updated from every connection task.
#[derive(Debug, Default)]
pub struct ClassifierStats {
    pub classified: AtomicU64,
    pub missing_plate: AtomicU64,
    pub invalid_plate: AtomicU64,
    pub unmapped_lane: AtomicU64,
    pub statistics_only: AtomicU64,
    pub unknown_direction: AtomicU64,
}

/// Point-in-time copy of [`ClassifierStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassifierStatsSnapshot {
    pub classified: u64,
    pub missing_plate: u64,
    pub invalid_plate: u64,
    pub unmapped_lane: u64,
    pub statistics_only: u64,
    pub unknown_direction: u64,
}

impl ClassifierStatsSnapshot {
    pub fn total_dropped(&self) -> u64 {
        self.missing_plate
            + self.invalid_plate
            + self.unmapped_lane
            + self.statistics_only
            + self.unknown_direction
    }
}

impl ClassifierStats {
    fn record_drop(&self, drop: &ClassifyDrop) {
        let counter = match drop {
            ClassifyDrop::MissingPlate => &self.missing_plate,
            ClassifyDrop::InvalidPlate { .. } => &self.invalid_plate,
            ClassifyDrop::UnmappedLane(_) => &self.unmapped_lane,
            ClassifyDrop::StatisticsOnly(_) => &self.statistics_only,
            ClassifyDrop::UnknownDirection(_) => &self.unknown_direction,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ClassifierStatsSnapshot {
        ClassifierStatsSnapshot {
            classified: self.classified.load(Ordering::Relaxed),
            missing_plate: self.missing_plate.load(Ordering::Relaxed),
            invalid_plate: self.invalid_plate.load(Ordering::Relaxed),
            unmapped_lane: self.unmapped_lane.load(Ordering::Relaxed),
            statistics_only: self.statistics_only.load(Ordering::Relaxed),
            unknown_direction: self.unknown_direction.load(Ordering::Relaxed),
        }
    }
}

/// Vehicle classifier
pub struct VehicleClassifier<V = PlateRules> {
    lanes: LaneMap,
    plates: V,
    stats: ClassifierStats,
}

impl VehicleClassifier<PlateRules> {
    pub fn with_rules(lanes: LaneMap, rules: PlateRules) -> Self {
        Self::new(lanes, rules)
    }
}

impl<V: PlateValidator> VehicleClassifier<V> {
    pub fn new(lanes: LaneMap, plates: V) -> Self {
        Self {
            lanes,
            plates,
            stats: ClassifierStats::default(),
        }
    }

    /// Classify one detection, counting the outcome.
    pub fn classify(&self, detection: &VehicleDetection) -> ClassifyResult<ClassifiedEvent> {
        match classify(detection, &self.lanes, &self.plates) {
            Ok(classified) => {
                self.stats.classified.fetch_add(1, Ordering::Relaxed);
                debug!(
                    segment_id = classified.segment_id,
                    event = ?classified.event,
                    plate = %detection.plate,
                    "Vehicle classified"
                );
                Ok(classified)
            }
            Err(drop) => {
                self.stats.record_drop(&drop);
                match drop {
                    // Expected traffic on shared detectors
                    ClassifyDrop::StatisticsOnly(_) | ClassifyDrop::MissingPlate => {
                        debug!(lane = detection.lane, reason = drop.reason(), "Detection dropped");
                    }
                    _ => {
                        warn!(lane = detection.lane, error = %drop, "Detection dropped");
                    }
                }
                Err(drop)
            }
        }
    }

    pub fn lanes(&self) -> &LaneMap {
        &self.lanes
    }

    pub fn stats(&self) -> ClassifierStatsSnapshot {
        self.stats.snapshot()
    }
}
