#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Converts spatial clusters into ranked crime hotspots.
//!
//! The risk formula is a deliberate simplification: saturating-linear in
//! incident count, bounded to `[0, 100]`, and reproducible. It claims no
//! statistical validity; it exists so hotspots are comparable across
//! clusters and across runs. Scale factor and severity thresholds are
//! deployment configuration, not fixed truth.

use safe_route_models::{Cluster, Hotspot, Severity};
use serde::{Deserialize, Serialize};

/// Tunable constants for risk scoring and severity tiering.
///
/// Deserializable from TOML so deployments can override the defaults
/// without a rebuild:
///
/// ```toml
/// scale_factor = 10.0
/// high_threshold = 70.0
/// medium_threshold = 40.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct RiskConfig {
    /// Risk points added per incident before saturation.
    pub scale_factor: f64,
    /// Inclusive lower bound for [`Severity::High`].
    pub high_threshold: f64,
    /// Inclusive lower bound for [`Severity::Medium`].
    pub medium_threshold: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            scale_factor: 10.0,
            high_threshold: 70.0,
            medium_threshold: 40.0,
        }
    }
}

impl RiskConfig {
    /// Parses a config from TOML text. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns the underlying parse error if the text is not valid TOML or
    /// a key has the wrong type.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::de::from_str(toml_str)
    }

    /// Saturating-linear risk score for an incident count, in `[0, 100]`.
    #[must_use]
    pub fn risk_score(&self, incident_count: u64) -> f64 {
        (incident_count as f64 * self.scale_factor).min(100.0)
    }

    /// Severity tier for a risk score. Thresholds are inclusive lower
    /// bounds.
    #[must_use]
    pub fn severity(&self, risk_score: f64) -> Severity {
        if risk_score >= self.high_threshold {
            Severity::High
        } else if risk_score >= self.medium_threshold {
            Severity::Medium
        } else {
            Severity::Low
        }
    }
}

/// Turns clusters into hotspots ranked by risk.
///
/// Output is ordered by risk score descending, ties broken by incident
/// count descending, then centroid latitude ascending. The full ranked
/// sequence is returned; callers truncate to their own top-N.
///
/// `total_incidents_in_window` is the size of the incident snapshot the
/// clusters were computed from, used only for diagnostics on how much of
/// the window ended up clustered.
#[must_use]
pub fn aggregate(
    clusters: &[Cluster],
    total_incidents_in_window: u64,
    config: &RiskConfig,
) -> Vec<Hotspot> {
    let mut hotspots: Vec<Hotspot> = clusters
        .iter()
        .map(|cluster| {
            let incident_count = cluster.incident_count();
            let risk_score = config.risk_score(incident_count);
            Hotspot {
                centroid: cluster.centroid,
                incident_count,
                risk_score,
                severity: config.severity(risk_score),
            }
        })
        .collect();

    hotspots.sort_by(Hotspot::ranking_cmp);

    let clustered: u64 = hotspots.iter().map(|h| h.incident_count).sum();
    log::debug!(
        "Aggregated {} hotspots covering {clustered}/{total_incidents_in_window} incidents in window",
        hotspots.len(),
    );

    hotspots
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use safe_route_models::GeoPoint;

    fn cluster_of(ids: &[u64], latitude: f64) -> Cluster {
        Cluster {
            member_ids: ids.iter().copied().collect::<BTreeSet<u64>>(),
            centroid: GeoPoint::new(latitude, -87.6298),
        }
    }

    #[test]
    fn empty_clusters_yield_empty_hotspots() {
        let hotspots = aggregate(&[], 0, &RiskConfig::default());
        assert!(hotspots.is_empty());
    }

    #[test]
    fn risk_score_is_count_times_scale_factor() {
        let config = RiskConfig::default();
        let hotspots = aggregate(&[cluster_of(&[1, 2, 3], 41.0)], 3, &config);
        assert!((hotspots[0].risk_score - 30.0).abs() < f64::EPSILON);
        assert_eq!(hotspots[0].severity, Severity::Low);
    }

    #[test]
    fn risk_score_saturates_at_one_hundred() {
        let ids: Vec<u64> = (0..12).collect();
        let hotspots = aggregate(&[cluster_of(&ids, 41.0)], 12, &RiskConfig::default());

        assert_eq!(hotspots[0].incident_count, 12);
        assert!((hotspots[0].risk_score - 100.0).abs() < f64::EPSILON);
        assert_eq!(hotspots[0].severity, Severity::High);
    }

    #[test]
    fn risk_score_is_monotonic_in_count() {
        let config = RiskConfig::default();
        let mut previous = 0.0;
        for count in 0..=20 {
            let score = config.risk_score(count);
            assert!(score >= previous);
            assert!(score <= 100.0);
            previous = score;
        }
    }

    #[test]
    fn severity_thresholds_are_inclusive() {
        let config = RiskConfig::default();
        assert_eq!(config.severity(70.0), Severity::High);
        assert_eq!(config.severity(69.9), Severity::Medium);
        assert_eq!(config.severity(40.0), Severity::Medium);
        assert_eq!(config.severity(39.9), Severity::Low);
    }

    #[test]
    fn output_is_ranked_by_risk_then_count_then_latitude() {
        let clusters = vec![
            cluster_of(&[1, 2], 42.0),
            cluster_of(&(0..15).collect::<Vec<u64>>(), 43.0),
            cluster_of(&(20..32).collect::<Vec<u64>>(), 41.0),
            cluster_of(&(40..52).collect::<Vec<u64>>(), 40.0),
        ];
        let hotspots = aggregate(&clusters, 41, &RiskConfig::default());

        // 15-count saturated cluster first, then the two 12-count saturated
        // clusters by ascending latitude, then the small one.
        assert_eq!(hotspots[0].incident_count, 15);
        assert!((hotspots[1].centroid.latitude - 40.0).abs() < f64::EPSILON);
        assert!((hotspots[2].centroid.latitude - 41.0).abs() < f64::EPSILON);
        assert_eq!(hotspots[3].incident_count, 2);
    }

    #[test]
    fn aggregate_is_idempotent() {
        let clusters = vec![cluster_of(&[1, 2, 3, 4, 5], 41.0), cluster_of(&[9], 42.0)];
        let config = RiskConfig::default();
        assert_eq!(aggregate(&clusters, 6, &config), aggregate(&clusters, 6, &config));
    }

    #[test]
    fn config_parses_from_toml_with_partial_overrides() {
        let config = RiskConfig::from_toml("scale_factor = 5.0\n").unwrap();
        assert!((config.scale_factor - 5.0).abs() < f64::EPSILON);
        assert!((config.high_threshold - 70.0).abs() < f64::EPSILON);
        assert!((config.medium_threshold - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_toml_yields_defaults() {
        let config = RiskConfig::from_toml("").unwrap();
        assert_eq!(config, RiskConfig::default());
    }
}
