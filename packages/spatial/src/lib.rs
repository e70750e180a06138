#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Density-based spatial clustering of incident points.
//!
//! Partitions a snapshot of geo-tagged incidents into proximity clusters
//! using DBSCAN semantics over great-circle distance in kilometers. An
//! R-tree narrows each neighborhood query to a bounding envelope before the
//! exact haversine check, keeping runs fast on city-sized inputs.
//!
//! Cluster membership is independent of input ordering: expansion always
//! proceeds in ascending incident-id order, so permuting the input yields
//! identical clusters.

use std::collections::{BTreeSet, VecDeque};

use rstar::{AABB, RTree, primitives::GeomWithData};
use safe_route_models::{Cluster, GeoPoint, IncidentPoint};
use thiserror::Error;

/// Kilometers per degree of latitude, rounded down so R-tree query
/// envelopes always cover the full `eps_km` circle. Exactness comes from
/// the haversine check applied to every envelope hit.
const KM_PER_DEGREE: f64 = 110.0;

/// Errors that can occur during clustering.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// A clustering parameter was out of range.
    #[error("Invalid clustering parameter: {message}")]
    InvalidParameter {
        /// Description of the rejected parameter.
        message: String,
    },
}

/// An incident position in the R-tree, tagged with its index into the
/// input slice. Coordinates are stored `[lng, lat]`.
type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// Partitions incidents into density-based clusters.
///
/// A point is a core point if at least `min_points` points (itself
/// included) lie within `eps_km` of it. Clusters are the density-reachable
/// closures of core points; non-core points inside a core point's
/// neighborhood join as border points. Points reachable from no core point
/// are noise and appear in no returned cluster.
///
/// An empty input yields an empty result. Returned cluster order is an
/// implementation detail; callers must key off membership and centroid, not
/// position in the sequence.
///
/// # Errors
///
/// Returns [`SpatialError::InvalidParameter`] if `eps_km` is not strictly
/// positive or `min_points` is zero.
pub fn cluster(
    points: &[IncidentPoint],
    eps_km: f64,
    min_points: usize,
) -> Result<Vec<Cluster>, SpatialError> {
    if !eps_km.is_finite() || eps_km <= 0.0 {
        return Err(SpatialError::InvalidParameter {
            message: format!("eps_km must be > 0, got {eps_km}"),
        });
    }
    if min_points == 0 {
        return Err(SpatialError::InvalidParameter {
            message: "min_points must be >= 1".to_string(),
        });
    }
    if points.is_empty() {
        return Ok(Vec::new());
    }

    let tree = RTree::bulk_load(
        points
            .iter()
            .enumerate()
            .map(|(i, p)| IndexedPoint::new([p.longitude, p.latitude], i))
            .collect(),
    );

    // Canonical processing order. Seeding and expansion both walk ids
    // ascending, which makes membership independent of input ordering.
    let mut order: Vec<usize> = (0..points.len()).collect();
    order.sort_by_key(|&i| points[i].id);

    let mut visited = vec![false; points.len()];
    let mut assignment: Vec<Option<usize>> = vec![None; points.len()];
    let mut cluster_count = 0;

    for &seed in &order {
        if visited[seed] {
            continue;
        }
        visited[seed] = true;

        let seed_neighbors = neighbors_within(&tree, points, seed, eps_km);
        if seed_neighbors.len() < min_points {
            // Provisionally noise; a later core point may still claim it
            // as a border member.
            continue;
        }

        let label = cluster_count;
        cluster_count += 1;
        assignment[seed] = Some(label);

        let mut queue: VecDeque<usize> = seed_neighbors.into();
        while let Some(i) = queue.pop_front() {
            match assignment[i] {
                None => assignment[i] = Some(label),
                // Border points stay with the cluster that claimed them
                // first; never reassigned.
                Some(existing) if existing != label => continue,
                Some(_) => {}
            }
            if !visited[i] {
                visited[i] = true;
                let reachable = neighbors_within(&tree, points, i, eps_km);
                if reachable.len() >= min_points {
                    queue.extend(reachable);
                }
            }
        }
    }

    let clusters = build_clusters(points, &order, &assignment, cluster_count);
    let clustered: usize = clusters.iter().map(|c| c.member_ids.len()).sum();
    log::debug!(
        "Clustered {clustered}/{} incidents into {} clusters (eps={eps_km}km, min_points={min_points})",
        points.len(),
        clusters.len(),
    );

    Ok(clusters)
}

/// Indices of all points within `eps_km` of `center`, the center itself
/// included, sorted by incident id.
fn neighbors_within(
    tree: &RTree<IndexedPoint>,
    points: &[IncidentPoint],
    center: usize,
    eps_km: f64,
) -> Vec<usize> {
    let origin = points[center].location();
    let delta_lat = eps_km / KM_PER_DEGREE;
    let cos_lat = origin.latitude.to_radians().cos().abs().max(0.01);
    let delta_lng = eps_km / (KM_PER_DEGREE * cos_lat);

    let envelope = AABB::from_corners(
        [origin.longitude - delta_lng, origin.latitude - delta_lat],
        [origin.longitude + delta_lng, origin.latitude + delta_lat],
    );

    let mut found: Vec<usize> = tree
        .locate_in_envelope_intersecting(&envelope)
        .filter(|entry| points[entry.data].location().distance_km(&origin) <= eps_km)
        .map(|entry| entry.data)
        .collect();
    found.sort_by_key(|&i| points[i].id);
    found
}

/// Materializes labeled points into [`Cluster`] values.
///
/// Members are folded in ascending id order so centroid arithmetic is
/// bit-reproducible no matter how the input was ordered.
fn build_clusters(
    points: &[IncidentPoint],
    order: &[usize],
    assignment: &[Option<usize>],
    cluster_count: usize,
) -> Vec<Cluster> {
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); cluster_count];
    for &i in order {
        if let Some(label) = assignment[i] {
            members[label].push(i);
        }
    }

    members
        .into_iter()
        .filter(|indices| !indices.is_empty())
        .map(|indices| {
            let count = indices.len() as f64;
            let (lat_sum, lng_sum) = indices.iter().fold((0.0, 0.0), |(lat, lng), &i| {
                (lat + points[i].latitude, lng + points[i].longitude)
            });
            let member_ids: BTreeSet<u64> = indices.iter().map(|&i| points[i].id).collect();
            Cluster {
                member_ids,
                centroid: GeoPoint::new(lat_sum / count, lng_sum / count),
            }
        })
        .collect()
}
