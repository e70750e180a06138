#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Route safety scoring against a hotspot set.
//!
//! Scores an externally supplied road geometry (ordered vertices, at least
//! two) against ranked hotspots: a hotspot is proximate when any vertex
//! comes within the proximity threshold of its centroid, and each proximate
//! hotspot deducts a severity-weighted penalty from a starting score of
//! 100. [`compare`] runs the same evaluation over a direct and a
//! waypoint-adjusted geometry and recommends one under an explicit margin
//! policy.
//!
//! Everything here is a pure function over immutable inputs; the network
//! calls that produced the geometry happened upstream.

pub mod detour;

use safe_route_models::{
    GeoPoint, Hotspot, Recommendation, RouteComparison, RouteEvaluation, RouteSummary, Severity,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while scoring or comparing routes.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A route geometry had fewer than two vertices.
    #[error("Route geometry must contain at least 2 points, got {count}")]
    InvalidRoute {
        /// Number of vertices supplied.
        count: usize,
    },

    /// A scoring parameter was out of range.
    #[error("Invalid routing parameter: {message}")]
    InvalidParameter {
        /// Description of the rejected parameter.
        message: String,
    },
}

/// Tunable scoring and recommendation policy.
///
/// Deserializable from TOML so deployments can override the defaults
/// without a rebuild:
///
/// ```toml
/// high_penalty = 20.0
/// recommendation_margin = 10.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RoutePolicy {
    /// Score deduction per proximate high-severity hotspot.
    pub high_penalty: f64,
    /// Score deduction per proximate medium-severity hotspot.
    pub medium_penalty: f64,
    /// Score deduction per proximate low-severity hotspot.
    pub low_penalty: f64,
    /// Minimum safety-score gain before the adjusted geometry is
    /// recommended over the direct one.
    pub recommendation_margin: f64,
    /// How far detour planning pushes the path away from a hotspot, in
    /// kilometers.
    pub detour_clearance_km: f64,
    /// Average travel speed used for duration estimates, in km/h.
    pub average_speed_kmh: f64,
    /// Bounding-box pad around the direct corridor when pre-filtering
    /// hotspots for detour planning, in degrees.
    pub corridor_pad_deg: f64,
}

impl Default for RoutePolicy {
    fn default() -> Self {
        Self {
            high_penalty: 20.0,
            medium_penalty: 10.0,
            low_penalty: 5.0,
            recommendation_margin: 10.0,
            detour_clearance_km: 0.5,
            average_speed_kmh: 40.0,
            corridor_pad_deg: 0.1,
        }
    }
}

impl RoutePolicy {
    /// Parses a policy from TOML text. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns the underlying parse error if the text is not valid TOML or
    /// a key has the wrong type.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::de::from_str(toml_str)
    }

    /// Score deduction for one proximate hotspot of the given severity.
    #[must_use]
    pub const fn penalty(&self, severity: Severity) -> f64 {
        match severity {
            Severity::High => self.high_penalty,
            Severity::Medium => self.medium_penalty,
            Severity::Low => self.low_penalty,
        }
    }
}

/// Scores one route geometry against a hotspot set.
///
/// A hotspot is proximate when the minimum distance from any route vertex
/// to its centroid is within `proximity_threshold_km`. The safety score
/// starts at 100, loses a severity-weighted penalty per proximate hotspot,
/// and is clamped to `[0, 100]`. `avoided_zone_count` is the number of
/// supplied hotspots the geometry did not pass near.
///
/// An empty hotspot set is valid and yields a score of 100 with zero
/// avoided zones.
///
/// # Errors
///
/// Returns [`RouteError::InvalidRoute`] if the geometry has fewer than two
/// vertices, or [`RouteError::InvalidParameter`] if
/// `proximity_threshold_km` is not strictly positive.
pub fn evaluate(
    route: &[GeoPoint],
    hotspots: &[Hotspot],
    proximity_threshold_km: f64,
    policy: &RoutePolicy,
) -> Result<RouteEvaluation, RouteError> {
    validate_route(route)?;
    validate_threshold(proximity_threshold_km)?;

    let mut proximate: Vec<Hotspot> = hotspots
        .iter()
        .filter(|hotspot| {
            route
                .iter()
                .any(|vertex| vertex.distance_km(&hotspot.centroid) <= proximity_threshold_km)
        })
        .cloned()
        .collect();
    proximate.sort_by(Hotspot::ranking_cmp);

    let penalty_total: f64 = proximate.iter().map(|h| policy.penalty(h.severity)).sum();
    let safety_score = (100.0 - penalty_total).clamp(0.0, 100.0);
    let avoided_zone_count = (hotspots.len() - proximate.len()) as u64;

    log::debug!(
        "Route with {} vertices passes near {}/{} hotspots, safety score {safety_score}",
        route.len(),
        proximate.len(),
        hotspots.len(),
    );

    Ok(RouteEvaluation {
        safety_score,
        avoided_zone_count,
        proximate_hotspots: proximate,
    })
}

/// Total length and estimated duration of a route geometry.
///
/// Length is the haversine sum over consecutive vertices; duration assumes
/// the policy's average travel speed.
///
/// # Errors
///
/// Returns [`RouteError::InvalidRoute`] if the geometry has fewer than two
/// vertices, or [`RouteError::InvalidParameter`] if the policy's average
/// speed is not strictly positive.
pub fn summarize(route: &[GeoPoint], policy: &RoutePolicy) -> Result<RouteSummary, RouteError> {
    validate_route(route)?;
    if !policy.average_speed_kmh.is_finite() || policy.average_speed_kmh <= 0.0 {
        return Err(RouteError::InvalidParameter {
            message: format!(
                "average_speed_kmh must be > 0, got {}",
                policy.average_speed_kmh
            ),
        });
    }

    let distance_km: f64 = route
        .windows(2)
        .map(|pair| pair[0].distance_km(&pair[1]))
        .sum();
    let duration_minutes = distance_km / policy.average_speed_kmh * 60.0;

    Ok(RouteSummary {
        distance_km,
        duration_minutes,
    })
}

/// Evaluates a direct and a waypoint-adjusted geometry for the same
/// start/end intent and recommends one.
///
/// Both geometries are scored independently against the same hotspot set
/// and threshold. The adjusted geometry is recommended only when its
/// safety-score gain meets the policy's recommendation margin; otherwise
/// the verdict is [`Recommendation::EitherOk`], since the detour's extra
/// length is not worth a marginal gain. Equal scores always yield
/// `EitherOk`.
///
/// # Errors
///
/// Propagates [`RouteError`] from either evaluation or summary.
pub fn compare(
    direct_route: &[GeoPoint],
    adjusted_route: &[GeoPoint],
    hotspots: &[Hotspot],
    proximity_threshold_km: f64,
    policy: &RoutePolicy,
) -> Result<RouteComparison, RouteError> {
    let direct = evaluate(direct_route, hotspots, proximity_threshold_km, policy)?;
    let adjusted = evaluate(adjusted_route, hotspots, proximity_threshold_km, policy)?;
    let direct_summary = summarize(direct_route, policy)?;
    let adjusted_summary = summarize(adjusted_route, policy)?;

    let recommendation =
        if adjusted.safety_score - direct.safety_score >= policy.recommendation_margin {
            Recommendation::PreferAdjusted
        } else {
            Recommendation::EitherOk
        };
    let extra_distance_km = adjusted_summary.distance_km - direct_summary.distance_km;

    Ok(RouteComparison {
        direct,
        adjusted,
        direct_summary,
        adjusted_summary,
        extra_distance_km,
        recommendation,
    })
}

fn validate_route(route: &[GeoPoint]) -> Result<(), RouteError> {
    if route.len() < 2 {
        return Err(RouteError::InvalidRoute { count: route.len() });
    }
    Ok(())
}

fn validate_threshold(proximity_threshold_km: f64) -> Result<(), RouteError> {
    if !proximity_threshold_km.is_finite() || proximity_threshold_km <= 0.0 {
        return Err(RouteError::InvalidParameter {
            message: format!("proximity_threshold_km must be > 0, got {proximity_threshold_km}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hotspot(latitude: f64, longitude: f64, severity: Severity, risk_score: f64) -> Hotspot {
        Hotspot {
            centroid: GeoPoint::new(latitude, longitude),
            incident_count: 12,
            risk_score,
            severity,
        }
    }

    fn two_point_route() -> Vec<GeoPoint> {
        vec![
            GeoPoint::new(41.8781, -87.6298),
            GeoPoint::new(41.8881, -87.6298),
        ]
    }

    #[test]
    fn rejects_route_with_fewer_than_two_points() {
        let result = evaluate(
            &[GeoPoint::new(41.0, -87.0)],
            &[],
            0.5,
            &RoutePolicy::default(),
        );
        assert!(matches!(result, Err(RouteError::InvalidRoute { count: 1 })));
    }

    #[test]
    fn rejects_non_positive_threshold() {
        let result = evaluate(&two_point_route(), &[], 0.0, &RoutePolicy::default());
        assert!(matches!(result, Err(RouteError::InvalidParameter { .. })));
    }

    #[test]
    fn empty_hotspots_score_one_hundred() {
        let evaluation = evaluate(&two_point_route(), &[], 0.5, &RoutePolicy::default()).unwrap();

        assert!((evaluation.safety_score - 100.0).abs() < f64::EPSILON);
        assert_eq!(evaluation.avoided_zone_count, 0);
        assert!(evaluation.proximate_hotspots.is_empty());
    }

    #[test]
    fn route_past_high_severity_hotspot_scores_eighty() {
        // Hotspot centroid ~0.1 km east of the route start.
        let hotspots = vec![hotspot(41.8781, -87.6286, Severity::High, 100.0)];
        let evaluation =
            evaluate(&two_point_route(), &hotspots, 0.5, &RoutePolicy::default()).unwrap();

        assert_eq!(evaluation.proximate_hotspots.len(), 1);
        assert!((evaluation.safety_score - 80.0).abs() < f64::EPSILON);
        assert_eq!(evaluation.avoided_zone_count, 0);
    }

    #[test]
    fn distant_hotspots_count_as_avoided() {
        let hotspots = vec![
            hotspot(41.8781, -87.6286, Severity::High, 100.0),
            hotspot(42.5, -88.0, Severity::Medium, 50.0),
            hotspot(40.5, -86.0, Severity::Low, 20.0),
        ];
        let evaluation =
            evaluate(&two_point_route(), &hotspots, 0.5, &RoutePolicy::default()).unwrap();

        assert_eq!(evaluation.proximate_hotspots.len(), 1);
        assert_eq!(evaluation.avoided_zone_count, 2);
    }

    #[test]
    fn penalties_accumulate_by_severity() {
        // All three centroids sit on the route start vertex.
        let hotspots = vec![
            hotspot(41.8781, -87.6298, Severity::High, 100.0),
            hotspot(41.8781, -87.6298, Severity::Medium, 50.0),
            hotspot(41.8781, -87.6298, Severity::Low, 20.0),
        ];
        let evaluation =
            evaluate(&two_point_route(), &hotspots, 0.5, &RoutePolicy::default()).unwrap();

        assert!((evaluation.safety_score - 65.0).abs() < f64::EPSILON);
    }

    #[test]
    fn safety_score_never_goes_negative() {
        let hotspots: Vec<Hotspot> = (0..10)
            .map(|_| hotspot(41.8781, -87.6298, Severity::High, 100.0))
            .collect();
        let evaluation =
            evaluate(&two_point_route(), &hotspots, 0.5, &RoutePolicy::default()).unwrap();

        assert!((evaluation.safety_score - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn proximate_hotspots_are_ranked_by_risk() {
        let hotspots = vec![
            hotspot(41.8781, -87.6298, Severity::Low, 20.0),
            hotspot(41.8781, -87.6298, Severity::High, 100.0),
            hotspot(41.8781, -87.6298, Severity::Medium, 50.0),
        ];
        let evaluation =
            evaluate(&two_point_route(), &hotspots, 0.5, &RoutePolicy::default()).unwrap();

        let scores: Vec<f64> = evaluation
            .proximate_hotspots
            .iter()
            .map(|h| h.risk_score)
            .collect();
        assert_eq!(scores, vec![100.0, 50.0, 20.0]);
    }

    #[test]
    fn evaluate_is_idempotent() {
        let hotspots = vec![hotspot(41.8781, -87.6286, Severity::High, 100.0)];
        let policy = RoutePolicy::default();
        let first = evaluate(&two_point_route(), &hotspots, 0.5, &policy).unwrap();
        let second = evaluate(&two_point_route(), &hotspots, 0.5, &policy).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn summary_of_two_point_route_matches_endpoint_distance() {
        let route = two_point_route();
        let summary = summarize(&route, &RoutePolicy::default()).unwrap();

        let endpoint_distance = route[0].distance_km(&route[1]);
        assert!((summary.distance_km - endpoint_distance).abs() < 1e-12);
        assert!(
            (summary.duration_minutes - endpoint_distance / 40.0 * 60.0).abs() < 1e-9
        );
    }

    #[test]
    fn compare_prefers_adjusted_when_gain_meets_margin() {
        // Direct route passes the hotspot; the adjusted one swings wide.
        let hotspots = vec![hotspot(41.8781, -87.6286, Severity::High, 100.0)];
        let direct = two_point_route();
        let adjusted = vec![
            GeoPoint::new(41.8781, -87.6498),
            GeoPoint::new(41.8881, -87.6498),
        ];

        let comparison = compare(&direct, &adjusted, &hotspots, 0.5, &RoutePolicy::default())
            .unwrap();

        assert!((comparison.direct.safety_score - 80.0).abs() < f64::EPSILON);
        assert!((comparison.adjusted.safety_score - 100.0).abs() < f64::EPSILON);
        assert_eq!(comparison.recommendation, Recommendation::PreferAdjusted);
        assert_eq!(comparison.adjusted.avoided_zone_count, 1);
    }

    #[test]
    fn equal_scores_recommend_either() {
        let comparison = compare(
            &two_point_route(),
            &two_point_route(),
            &[],
            0.5,
            &RoutePolicy::default(),
        )
        .unwrap();

        assert_eq!(comparison.recommendation, Recommendation::EitherOk);
        assert!((comparison.extra_distance_km - 0.0).abs() < 1e-12);
    }

    #[test]
    fn gain_below_margin_recommends_either() {
        // Single low-severity hotspot: 5-point gain is under the 10 margin.
        let hotspots = vec![hotspot(41.8781, -87.6286, Severity::Low, 20.0)];
        let direct = two_point_route();
        let adjusted = vec![
            GeoPoint::new(41.8781, -87.6498),
            GeoPoint::new(41.8881, -87.6498),
        ];

        let comparison = compare(&direct, &adjusted, &hotspots, 0.5, &RoutePolicy::default())
            .unwrap();

        assert!((comparison.adjusted.safety_score - comparison.direct.safety_score - 5.0).abs()
            < f64::EPSILON);
        assert_eq!(comparison.recommendation, Recommendation::EitherOk);
    }

    #[test]
    fn policy_parses_from_toml_with_partial_overrides() {
        let policy = RoutePolicy::from_toml("recommendation_margin = 15.0\n").unwrap();
        assert!((policy.recommendation_margin - 15.0).abs() < f64::EPSILON);
        assert!((policy.high_penalty - 20.0).abs() < f64::EPSILON);
    }
}
