//! # Planar Projection
//!
//! Converts geographic latitude/longitude to the rectangular coordinate
//! system the device renders routes in — a spherical Web-Mercator-style
//! transform in meters.
//!
//! The firmware reimplements the inverse of this math independently, so the
//! formula is preserved verbatim, constant precision included. Touching the
//! rounding, the `20037508.34` half-circumference or the 360° phase offset
//! desynchronizes phone and device and silently warps rendered routes.

use crate::{DirectionPoint, Point};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Half the Mercator projection circumference in meters (the planar
/// coordinate of longitude 180°). The devices ship with this literal.
const HALF_CIRCUMFERENCE_M: f64 = 20037508.34;

/// A projected track point in planar meters. Derived from [`Point`];
/// never constructed with NaN components.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectedPoint {
    pub x: f32,
    pub y: f32,
    pub altitude: f32,
}

/// A projected direction point: planar position plus the original heading.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectedDirectionPoint {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

/// Project latitude/longitude in degrees to planar (x, y) meters.
///
/// ```text
/// y = ln(tan((90 + lat)·π/360)) / (π/180) · (20037508.34 / 180)
/// x = lon · (20037508.34 / 180)
/// ```
///
/// Latitudes below -90° make the `ln` argument negative and yield NaN;
/// callers filter through the `project_*` helpers rather than checking
/// here. Only NaN is filtered — the firmware applies the same rule, so
/// infinities ride through untouched.
pub fn to_planar(lat: f64, lon: f64) -> (f32, f32) {
    let y = ((90.0 + lat) * PI / 360.0).tan().ln() / (PI / 180.0) * (HALF_CIRCUMFERENCE_M / 180.0);
    let x = lon * (HALF_CIRCUMFERENCE_M / 180.0);
    (x as f32, y as f32)
}

/// Project a track point, rejecting any result with a NaN component.
///
/// Invalid points are dropped from the transmitted sequence, never replaced
/// with defaults — the device would render a substituted point as a real
/// position.
pub fn project_point(point: &Point) -> Option<ProjectedPoint> {
    let (x, y) = to_planar(point.lat as f64, point.lon as f64);
    if x.is_nan() || y.is_nan() || point.altitude.is_nan() {
        return None;
    }
    Some(ProjectedPoint {
        x,
        y,
        altitude: point.altitude,
    })
}

/// Project a direction point; same validity rule as [`project_point`].
pub fn project_direction_point(point: &DirectionPoint) -> Option<ProjectedDirectionPoint> {
    let (x, y) = to_planar(point.lat as f64, point.lon as f64);
    if x.is_nan() || y.is_nan() || point.angle.is_nan() {
        return None;
    }
    Some(ProjectedDirectionPoint {
        x,
        y,
        angle: point.angle,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference values computed with the firmware's copy of the formula.
    #[test]
    fn matches_firmware_reference_values() {
        let (x, y) = to_planar(-27.297514, 152.753860);
        // Float32 epsilon scaled to coordinate magnitude (~1e7 meters).
        let tolerance = 4.0;
        assert!(
            (x - 17004482.0).abs() < tolerance,
            "x = {x}, expected ≈ 17004482"
        );
        assert!(
            (y + 3160691.5).abs() < tolerance,
            "y = {y}, expected ≈ -3160691.5"
        );
    }

    #[test]
    fn equator_and_meridian_project_to_origin() {
        let (x, y) = to_planar(0.0, 0.0);
        assert_eq!(x, 0.0);
        assert!(y.abs() < 1e-6, "equator should project to y ≈ 0, got {y}");
    }

    #[test]
    fn longitude_180_hits_half_circumference() {
        let (x, _) = to_planar(0.0, 180.0);
        assert!(
            (x - 20037508.34f32).abs() < 4.0,
            "x at lon 180° should be the half circumference, got {x}"
        );
    }

    #[test]
    fn below_south_pole_is_rejected_not_defaulted() {
        // (90 + lat) goes negative, ln(tan(...)) is NaN; the point must
        // vanish rather than become junk.
        let p = Point::new(-95.0, 0.0, 0.0);
        assert!(project_point(&p).is_none());
    }

    #[test]
    fn only_nan_is_filtered() {
        // Exactly -90° degenerates to ln(0) = -inf, which the firmware's
        // NaN check deliberately lets through. Match it.
        let p = Point::new(-90.0, 0.0, 0.0);
        let projected = project_point(&p).expect("-inf is not NaN");
        assert!(projected.y.is_infinite());
    }

    #[test]
    fn nan_passthrough_fields_invalidate_the_point() {
        let p = Point::new(10.0, 10.0, f32::NAN);
        assert!(project_point(&p).is_none());

        let d = DirectionPoint::new(10.0, 10.0, f32::NAN);
        assert!(project_direction_point(&d).is_none());
    }

    #[test]
    fn valid_point_survives_with_altitude_passthrough() {
        let p = Point::new(45.0, 7.5, 321.5);
        let projected = project_point(&p).expect("mid-latitude point is valid");
        assert_eq!(projected.altitude, 321.5);
        assert!(projected.x > 0.0 && projected.y > 0.0);
    }
}
