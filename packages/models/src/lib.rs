#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Shared data-model types for the hotspot-risk and safe-route pipeline.
//!
//! Every type here is immutable once constructed and serializable, so the
//! HTTP layer can emit evaluation results directly. The pipeline crates
//! (`safe_route_spatial`, `safe_route_hotspot`, `safe_route_routing`) consume
//! and produce these types; none of them own persisted state.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use geo::{Distance, Haversine};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A latitude/longitude coordinate in decimal degrees (WGS84).
///
/// Used both for incident locations, cluster centroids, and route geometry
/// vertices. Route geometries are ordered sequences of these points in
/// travel order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point from latitude and longitude in decimal degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle (haversine) distance to another point, in kilometers.
    ///
    /// City-scale distances only need spherical accuracy, so the mean earth
    /// radius used by [`Haversine`] is sufficient.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        let from = geo::Point::new(self.longitude, self.latitude);
        let to = geo::Point::new(other.longitude, other.latitude);
        Haversine.distance(from, to) / 1000.0
    }
}

/// A single geo-tagged incident record supplied by the incident store.
///
/// Read-only to this pipeline. The incident store guarantees non-null
/// coordinates; malformed rows are filtered out before they reach
/// `safe_route_spatial::cluster`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentPoint {
    /// Stable incident identifier.
    pub id: u64,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// When the incident occurred.
    pub occurred_at: DateTime<Utc>,
    /// Incident category name (e.g. "THEFT").
    pub category: String,
    /// Relative severity weight assigned at ingestion.
    pub severity_weight: f64,
}

impl IncidentPoint {
    /// The incident location as a [`GeoPoint`].
    #[must_use]
    pub const fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Filters incidents to a rolling time window, bounds inclusive.
///
/// The pipeline has no notion of "now"; the caller picks the window (e.g.
/// the last 30 days) and passes a consistent snapshot through here before
/// clustering.
#[must_use]
pub fn incidents_in_window(
    points: &[IncidentPoint],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<IncidentPoint> {
    points
        .iter()
        .filter(|p| p.occurred_at >= start && p.occurred_at <= end)
        .cloned()
        .collect()
}

/// A density-based spatial cluster of incidents.
///
/// Every member lies within the clustering distance of at least one other
/// member. Clusters are recomputed from the current incident window on every
/// run and carry no identity across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Identifiers of the member incidents.
    pub member_ids: BTreeSet<u64>,
    /// Arithmetic mean of member latitudes/longitudes.
    pub centroid: GeoPoint,
}

impl Cluster {
    /// Number of member incidents.
    #[must_use]
    pub fn incident_count(&self) -> u64 {
        self.member_ids.len() as u64
    }
}

/// Severity tier of a hotspot, derived from its risk score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    /// Risk score below the medium threshold.
    Low,
    /// Risk score at or above the medium threshold.
    Medium,
    /// Risk score at or above the high threshold.
    High,
}

/// A ranked crime hotspot derived deterministically from a [`Cluster`].
///
/// Recomputed per request over a rolling incident window; never persisted as
/// authoritative state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    /// Cluster centroid.
    pub centroid: GeoPoint,
    /// Number of incidents in the underlying cluster.
    pub incident_count: u64,
    /// Saturating-linear risk score in `[0, 100]`, monotonic in count.
    pub risk_score: f64,
    /// Severity tier derived from the risk score.
    pub severity: Severity,
}

impl Hotspot {
    /// Canonical ranking order: risk score descending, ties broken by
    /// incident count descending, then centroid latitude ascending.
    ///
    /// Both aggregation output and the proximate-hotspot list of a route
    /// evaluation are sorted with this comparator, keeping results
    /// reproducible across runs.
    #[must_use]
    pub fn ranking_cmp(&self, other: &Self) -> std::cmp::Ordering {
        other
            .risk_score
            .total_cmp(&self.risk_score)
            .then_with(|| other.incident_count.cmp(&self.incident_count))
            .then_with(|| {
                self.centroid
                    .latitude
                    .total_cmp(&other.centroid.latitude)
            })
    }
}

/// Result of scoring one route geometry against a hotspot set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteEvaluation {
    /// Safety score in `[0, 100]`; 100 means no proximate hotspots.
    pub safety_score: f64,
    /// Known hotspots this geometry did NOT pass near.
    pub avoided_zone_count: u64,
    /// Hotspots the route passes near, ranked by risk score descending.
    pub proximate_hotspots: Vec<Hotspot>,
}

/// Length and estimated travel time of a route geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    /// Total polyline length in kilometers.
    pub distance_km: f64,
    /// Estimated duration at the configured average speed.
    pub duration_minutes: f64,
}

/// Which of two candidate geometries to recommend.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Recommendation {
    /// The adjusted geometry is safer by at least the recommendation margin.
    PreferAdjusted,
    /// The safety gain does not justify the detour; either route is fine.
    EitherOk,
}

/// Side-by-side evaluation of a direct and a waypoint-adjusted geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteComparison {
    /// Evaluation of the direct geometry.
    pub direct: RouteEvaluation,
    /// Evaluation of the waypoint-adjusted geometry.
    pub adjusted: RouteEvaluation,
    /// Length/duration of the direct geometry.
    pub direct_summary: RouteSummary,
    /// Length/duration of the adjusted geometry.
    pub adjusted_summary: RouteSummary,
    /// Extra distance the adjusted geometry costs, in kilometers.
    pub extra_distance_km: f64,
    /// Recommendation under the configured margin policy.
    pub recommendation: Recommendation,
}
