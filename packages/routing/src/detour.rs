//! Fallback detour planning when no external router is available.
//!
//! Builds a waypoint-adjusted geometry from a start/end pair: every hotspot
//! whose centroid lies inside the direct corridor and within the clearance
//! distance of the straight segment gets a perpendicular-offset waypoint
//! pushing the path around it. The result feeds [`crate::compare`] as the
//! adjusted candidate.
//!
//! Offsets use the flat-earth 1 degree ~ 111 km approximation, which is
//! adequate at the city scale this runs at.

use safe_route_models::{GeoPoint, Hotspot};

use crate::RoutePolicy;

/// Kilometers per degree used for waypoint offsets.
const KM_PER_DEGREE: f64 = 111.0;

/// Whether a point falls inside the padded bounding box of the direct
/// start/end corridor. Cheap pre-filter before the exact segment-distance
/// check.
#[must_use]
pub fn in_corridor(point: &GeoPoint, start: &GeoPoint, end: &GeoPoint, pad_deg: f64) -> bool {
    let lat_min = start.latitude.min(end.latitude) - pad_deg;
    let lat_max = start.latitude.max(end.latitude) + pad_deg;
    let lng_min = start.longitude.min(end.longitude) - pad_deg;
    let lng_max = start.longitude.max(end.longitude) + pad_deg;

    (lat_min..=lat_max).contains(&point.latitude)
        && (lng_min..=lng_max).contains(&point.longitude)
}

/// Approximate distance from a point to the straight segment `a`-`b`, in
/// kilometers.
///
/// Projects into a local flat frame (latitude-corrected degrees scaled to
/// kilometers), clamps the projection onto the segment, and measures the
/// remainder. Good to city scale; not a geodesic cross-track distance.
#[must_use]
pub fn segment_distance_km(point: &GeoPoint, a: &GeoPoint, b: &GeoPoint) -> f64 {
    let cos_lat = a.latitude.to_radians().cos().abs().max(0.01);
    let to_xy = |p: &GeoPoint| {
        [
            (p.longitude - a.longitude) * KM_PER_DEGREE * cos_lat,
            (p.latitude - a.latitude) * KM_PER_DEGREE,
        ]
    };

    let p = to_xy(point);
    let seg = to_xy(b);
    let seg_len_sq = seg[0].mul_add(seg[0], seg[1] * seg[1]);

    let t = if seg_len_sq > 0.0 {
        (p[0].mul_add(seg[0], p[1] * seg[1]) / seg_len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };

    let dx = p[0] - t * seg[0];
    let dy = p[1] - t * seg[1];
    dx.hypot(dy)
}

/// Builds a waypoint-adjusted geometry from `start` to `end` that swings
/// around hotspots sitting on the direct segment.
///
/// Hotspots outside the padded corridor or farther than the policy's
/// detour clearance from the segment are ignored. Each remaining hotspot
/// contributes one waypoint offset perpendicular to the travel direction
/// by the clearance distance, and waypoints are emitted in travel order.
/// With nothing to avoid (or a degenerate zero-length segment) the result
/// is exactly `[start, end]`.
#[must_use]
pub fn plan_detour(
    start: &GeoPoint,
    end: &GeoPoint,
    hotspots: &[Hotspot],
    policy: &RoutePolicy,
) -> Vec<GeoPoint> {
    // Travel direction in a latitude-corrected local frame, so the offset
    // comes out the same length east-west as north-south.
    let cos_lat = start.latitude.to_radians().cos().abs().max(0.01);
    let dir_east = (end.longitude - start.longitude) * cos_lat;
    let dir_north = end.latitude - start.latitude;
    let length = dir_east.hypot(dir_north);
    if length == 0.0 {
        return vec![*start, *end];
    }

    let perp_east = -dir_north / length;
    let perp_north = dir_east / length;
    let offset_deg = policy.detour_clearance_km / KM_PER_DEGREE;

    // (position along the segment, waypoint) pairs, so the final geometry
    // visits waypoints in travel order.
    let mut waypoints: Vec<(f64, GeoPoint)> = hotspots
        .iter()
        .filter(|hotspot| in_corridor(&hotspot.centroid, start, end, policy.corridor_pad_deg))
        .filter(|hotspot| {
            segment_distance_km(&hotspot.centroid, start, end) < policy.detour_clearance_km
        })
        .map(|hotspot| {
            let centroid = hotspot.centroid;
            let east = (centroid.longitude - start.longitude) * cos_lat;
            let north = centroid.latitude - start.latitude;
            let along = east.mul_add(dir_east, north * dir_north) / (length * length);
            let waypoint = GeoPoint::new(
                perp_north.mul_add(offset_deg, centroid.latitude),
                (perp_east * offset_deg / cos_lat) + centroid.longitude,
            );
            (along.clamp(0.0, 1.0), waypoint)
        })
        .collect();
    waypoints.sort_by(|a, b| a.0.total_cmp(&b.0));
    waypoints.dedup_by(|a, b| a.1 == b.1);

    let avoided = waypoints.len();
    let mut route = Vec::with_capacity(avoided + 2);
    route.push(*start);
    route.extend(waypoints.into_iter().map(|(_, waypoint)| waypoint));
    route.push(*end);

    log::debug!(
        "Planned detour with {avoided} avoidance waypoints over {} candidate hotspots",
        hotspots.len(),
    );

    route
}
