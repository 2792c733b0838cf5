//! Detection → segment event mapping

use super::lane_map::{LaneMap, LaneParity};
use crate::error::{ClassifyDrop, ClassifyResult};
use crate::ports::PlateValidator;
use chrono::{DateTime, Utc};
use lg_01_detector_protocol::VehicleDetection;
use shared_types::{EventPayload, PlateId, SegmentEvent, SegmentId, STATISTICS_ONLY_SEGMENT};

/// A detection that passed classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub segment_id: SegmentId,
    pub event: SegmentEvent,
    pub payload: EventPayload,
    pub detected_at: DateTime<Utc>,
}

/// Pure classification over a lane map and a plate predicate.
///
/// Checks run in order: plate present, plate valid, lane mapped, segment not
/// statistics-only, direction known.
pub fn classify<V>(
    detection: &VehicleDetection,
    lanes: &LaneMap,
    plates: &V,
) -> ClassifyResult<ClassifiedEvent>
where
    V: PlateValidator + ?Sized,
{
    if detection.plate.is_empty() {
        return Err(ClassifyDrop::MissingPlate);
    }
    plates
        .validate(&detection.plate)
        .map_err(|reason| ClassifyDrop::InvalidPlate {
            plate: detection.plate.clone(),
            reason,
        })?;

    let segment_id = lanes
        .segment_for(detection.lane)
        .ok_or(ClassifyDrop::UnmappedLane(detection.lane))?;
    if segment_id == STATISTICS_ONLY_SEGMENT {
        return Err(ClassifyDrop::StatisticsOnly(detection.lane));
    }

    let event = LaneParity::of(detection.lane)
        .event_for(detection.direction_code)
        .ok_or(ClassifyDrop::UnknownDirection(detection.direction_code))?;

    Ok(ClassifiedEvent {
        segment_id,
        event,
        payload: EventPayload::vehicle(segment_id, PlateId::new(detection.plate.as_str())),
        detected_at: detection.timestamp,
    })
}
