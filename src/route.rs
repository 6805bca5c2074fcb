//! # Route Encoding
//!
//! Turns a [`Route`] into the payload of one of the three route message
//! variants:
//!
//! - **v1** (legacy): raw latitude/longitude/altitude triples
//! - **v2**: projected planar x/y pairs, for firmware that renders in
//!   planar space but has no elevation display
//! - **v3**: projected x/y/altitude triples
//!
//! All variants share the same pipeline: thin the track to the device
//! point cap, project if the variant calls for it (dropping any point the
//! projection marks invalid), then flatten into wire values.

use crate::projection::{project_direction_point, project_point};
use crate::wire::WireValue;
use crate::{DirectionPoint, Point, Route};
use tracing::debug;

/// Hard cap on track points per transmitted route. The device preallocates
/// its route buffer from this value, so exceeding it is not an option.
pub const MAX_WIRE_POINTS: usize = 400;

/// Thin `points` to at most [`MAX_WIRE_POINTS`] entries.
///
/// Over-long tracks keep every `stride`-th point with
/// `stride = ceil(len / 400)`, **starting at index 1** — the retained
/// indices are `{1, 1+stride, 1+2·stride, …}`. Starting at 1 rather than 0
/// is a quirk the deployed firmware generation baked in; both ends must
/// skip the same points or re-sent routes shift by one sample. Stride
/// sampling keeps the overall shape, unlike head/tail cropping.
pub fn thin_points<T: Copy>(points: &[T]) -> Vec<T> {
    if points.len() <= MAX_WIRE_POINTS {
        return points.to_vec();
    }
    let stride = points.len().div_ceil(MAX_WIRE_POINTS);
    points.iter().skip(1).step_by(stride).copied().collect()
}

fn push_raw_points(payload: &mut Vec<WireValue>, points: &[Point]) {
    payload.push(WireValue::I16(points.len() as i16));
    for point in points {
        payload.push(WireValue::F32(point.lat));
        payload.push(WireValue::F32(point.lon));
        payload.push(WireValue::F32(point.altitude));
    }
}

fn push_raw_directions(payload: &mut Vec<WireValue>, points: &[DirectionPoint]) {
    payload.push(WireValue::I16(points.len() as i16));
    for point in points {
        payload.push(WireValue::F32(point.lat));
        payload.push(WireValue::F32(point.lon));
        payload.push(WireValue::F32(point.angle));
    }
}

/// Payload for the legacy route message (tag 0).
pub fn payload_v1(route: &Route) -> Vec<WireValue> {
    let points = thin_points(&route.points);
    let mut payload = vec![WireValue::Str(route.name.clone())];
    push_raw_points(&mut payload, &points);
    push_raw_directions(&mut payload, &route.direction_points);
    payload
}

/// Payload for the planar route message (tag 7): x/y pairs, no altitude.
pub fn payload_v2(route: &Route) -> Vec<WireValue> {
    let (points, directions) = projected_geometry(route);
    let mut payload = vec![WireValue::Str(route.name.clone())];
    payload.push(WireValue::I16(points.len() as i16));
    for point in &points {
        payload.push(WireValue::F32(point.x));
        payload.push(WireValue::F32(point.y));
    }
    push_projected_directions(&mut payload, &directions);
    payload
}

/// Payload for the planar route message with elevation (tag 9).
pub fn payload_v3(route: &Route) -> Vec<WireValue> {
    let (points, directions) = projected_geometry(route);
    let mut payload = vec![WireValue::Str(route.name.clone())];
    payload.push(WireValue::I16(points.len() as i16));
    for point in &points {
        payload.push(WireValue::F32(point.x));
        payload.push(WireValue::F32(point.y));
        payload.push(WireValue::F32(point.altitude));
    }
    push_projected_directions(&mut payload, &directions);
    payload
}

fn push_projected_directions(
    payload: &mut Vec<WireValue>,
    directions: &[crate::projection::ProjectedDirectionPoint],
) {
    payload.push(WireValue::I16(directions.len() as i16));
    for point in directions {
        payload.push(WireValue::F32(point.x));
        payload.push(WireValue::F32(point.y));
        payload.push(WireValue::F32(point.angle));
    }
}

/// Thin, project and NaN-filter the route geometry.
///
/// Projection failures are dropped silently from the sequence — a route
/// where every point fails still encodes as a valid, empty payload;
/// whether that is worth telling the user is the caller's decision.
fn projected_geometry(
    route: &Route,
) -> (
    Vec<crate::projection::ProjectedPoint>,
    Vec<crate::projection::ProjectedDirectionPoint>,
) {
    let thinned = thin_points(&route.points);
    let points: Vec<_> = thinned.iter().filter_map(project_point).collect();
    if points.len() < thinned.len() {
        debug!(
            dropped = thinned.len() - points.len(),
            route = %route.name,
            "dropped track points with invalid projection"
        );
    }
    let directions: Vec<_> = route
        .direction_points
        .iter()
        .filter_map(project_direction_point)
        .collect();
    (points, directions)
}
