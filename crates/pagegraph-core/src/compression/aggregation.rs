//! Sorting and duplicate-target aggregation of one node's relationship batch.
//!
//! Property values travel with their target in a flattened buffer with one
//! row of `aggregations.len()` values per relationship.

use crate::types::{Aggregation, GraphError};

/// Resolve the per-property policies of one relationship type.
///
/// Returns the resolved property aggregations and whether the topology
/// collapses parallel relationships.
pub fn resolve_aggregations(
    type_aggregation: Aggregation,
    property_aggregations: &[Aggregation],
) -> Result<(Vec<Aggregation>, bool), GraphError> {
    if property_aggregations.is_empty() {
        return Ok((Vec::new(), type_aggregation.collapses()));
    }
    let resolved: Vec<Aggregation> = property_aggregations
        .iter()
        .map(|a| match a {
            Aggregation::Default => type_aggregation.resolve(),
            other => *other,
        })
        .collect();
    let keeps = resolved.iter().filter(|a| !a.collapses()).count();
    if keeps != 0 && keeps != resolved.len() {
        return Err(GraphError::ConflictingAggregations);
    }
    Ok((resolved, keeps == 0))
}

/// Sort `targets` ascending and, when `collapse` is set, merge relationships
/// with equal targets. `properties` is permuted and merged alongside.
///
/// Returns the number of relationships left.
pub fn sort_and_aggregate(
    targets: &mut Vec<u64>,
    properties: &mut Vec<f64>,
    aggregations: &[Aggregation],
    collapse: bool,
) -> usize {
    let stride = aggregations.len();
    if stride == 0 {
        targets.sort_unstable();
        if collapse {
            targets.dedup();
        }
        return targets.len();
    }

    let mut order: Vec<usize> = (0..targets.len()).collect();
    order.sort_by_key(|&i| targets[i]);
    let sorted_targets: Vec<u64> = order.iter().map(|&i| targets[i]).collect();
    let mut sorted_properties = Vec::with_capacity(properties.len());
    for &i in &order {
        sorted_properties.extend_from_slice(&properties[i * stride..(i + 1) * stride]);
    }
    *targets = sorted_targets;
    *properties = sorted_properties;

    if collapse {
        collapse_parallel(targets, properties, aggregations);
    }
    targets.len()
}

fn collapse_parallel(targets: &mut Vec<u64>, properties: &mut Vec<f64>, aggregations: &[Aggregation]) {
    let stride = aggregations.len();
    let mut write = 0;
    for read in 0..targets.len() {
        let row = read * stride;
        if write > 0 && targets[read] == targets[write - 1] {
            let into = (write - 1) * stride;
            for (p, aggregation) in aggregations.iter().enumerate() {
                properties[into + p] = merge(*aggregation, properties[into + p], properties[row + p]);
            }
            continue;
        }
        targets[write] = targets[read];
        let into = write * stride;
        for (p, aggregation) in aggregations.iter().enumerate() {
            properties[into + p] = match aggregation {
                Aggregation::Count => 1.0,
                _ => properties[row + p],
            };
        }
        write += 1;
    }
    targets.truncate(write);
    properties.truncate(write * stride);
}

#[inline]
fn merge(aggregation: Aggregation, existing: f64, incoming: f64) -> f64 {
    match aggregation {
        Aggregation::Default | Aggregation::None | Aggregation::Single => existing,
        Aggregation::Sum => existing + incoming,
        Aggregation::Min => existing.min(incoming),
        Aggregation::Max => existing.max(incoming),
        Aggregation::Count => existing + 1.0,
    }
}
