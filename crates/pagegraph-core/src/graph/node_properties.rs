//! # Node Properties
//!
//! Per-node values read by mapped node id.
//!
//! Array-backed values live in the root space. Filtered views wrap them in a
//! translating adapter so callers keep using the view's own ids. Nodes with no
//! value read as the property's [`DefaultValue`].

use super::id_map::FilteredIdMap;
use crate::collections::HugeArray;
use crate::primitives::NOT_FOUND;
use crate::types::ValueType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fallback for absent long values.
pub const DEFAULT_LONG_VALUE: i64 = i64::MIN;

/// Fallback for absent double values.
pub const DEFAULT_DOUBLE_VALUE: f64 = f64::NAN;

/// The value a property reads as where a node has none, in both value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DefaultValue {
    pub long: i64,
    pub double: f64,
}

impl DefaultValue {
    pub const ABSENT: Self = Self {
        long: DEFAULT_LONG_VALUE,
        double: DEFAULT_DOUBLE_VALUE,
    };

    #[must_use]
    pub fn of_long(value: i64) -> Self {
        Self {
            long: value,
            double: value as f64,
        }
    }

    #[must_use]
    pub fn of_double(value: f64) -> Self {
        let long = if value.is_nan() {
            DEFAULT_LONG_VALUE
        } else {
            value as i64
        };
        Self { long, double: value }
    }
}

impl Default for DefaultValue {
    fn default() -> Self {
        Self::ABSENT
    }
}

/// Read access to one node property.
pub trait NodePropertyValues: Send + Sync + std::fmt::Debug {
    fn value_type(&self) -> ValueType;

    /// Number of nodes with a slot for this property.
    fn node_count(&self) -> u64;

    fn double_value(&self, node: u64) -> f64;

    fn long_value(&self, node: u64) -> i64;

    /// What nodes without a value read as.
    fn default_value(&self) -> DefaultValue {
        DefaultValue::ABSENT
    }

    /// Heap bytes held by the values.
    fn size_of(&self) -> u64 {
        0
    }
}

// =============================================================================
// ARRAY-BACKED VALUES
// =============================================================================

/// `NaN` slots are absent and read as the default.
#[derive(Debug)]
pub struct DoubleArrayNodePropertyValues {
    values: HugeArray<f64>,
    default: DefaultValue,
}

impl DoubleArrayNodePropertyValues {
    pub fn new(values: HugeArray<f64>) -> Self {
        Self::with_default(values, DefaultValue::ABSENT)
    }

    pub fn with_default(values: HugeArray<f64>, default: DefaultValue) -> Self {
        Self { values, default }
    }
}

impl NodePropertyValues for DoubleArrayNodePropertyValues {
    fn value_type(&self) -> ValueType {
        ValueType::Double
    }

    fn node_count(&self) -> u64 {
        self.values.size()
    }

    fn double_value(&self, node: u64) -> f64 {
        let value = self.values.get(node);
        if value.is_nan() { self.default.double } else { value }
    }

    fn long_value(&self, node: u64) -> i64 {
        let value = self.values.get(node);
        if value.is_nan() {
            self.default.long
        } else {
            value as i64
        }
    }

    fn default_value(&self) -> DefaultValue {
        self.default
    }

    fn size_of(&self) -> u64 {
        self.values.size_of()
    }
}

/// [`DEFAULT_LONG_VALUE`] slots are absent and read as the default.
#[derive(Debug)]
pub struct LongArrayNodePropertyValues {
    values: HugeArray<i64>,
    default: DefaultValue,
}

impl LongArrayNodePropertyValues {
    pub fn new(values: HugeArray<i64>) -> Self {
        Self::with_default(values, DefaultValue::ABSENT)
    }

    pub fn with_default(values: HugeArray<i64>, default: DefaultValue) -> Self {
        Self { values, default }
    }
}

impl NodePropertyValues for LongArrayNodePropertyValues {
    fn value_type(&self) -> ValueType {
        ValueType::Long
    }

    fn node_count(&self) -> u64 {
        self.values.size()
    }

    fn double_value(&self, node: u64) -> f64 {
        let value = self.values.get(node);
        if value == DEFAULT_LONG_VALUE {
            self.default.double
        } else {
            value as f64
        }
    }

    fn long_value(&self, node: u64) -> i64 {
        let value = self.values.get(node);
        if value == DEFAULT_LONG_VALUE { self.default.long } else { value }
    }

    fn default_value(&self) -> DefaultValue {
        self.default
    }

    fn size_of(&self) -> u64 {
        self.values.size_of()
    }
}

// =============================================================================
// TRANSLATING ADAPTERS
// =============================================================================

/// Root-space values read through filtered ids.
///
/// Filtered ids outside the filter read as the inner property's default.
#[derive(Debug)]
pub struct FilteredNodePropertyValues {
    inner: Arc<dyn NodePropertyValues>,
    id_map: Arc<FilteredIdMap>,
    default: DefaultValue,
}

impl FilteredNodePropertyValues {
    pub fn new(inner: Arc<dyn NodePropertyValues>, id_map: Arc<FilteredIdMap>) -> Self {
        let default = inner.default_value();
        Self {
            inner,
            id_map,
            default,
        }
    }

    fn root(&self, filtered: u64) -> Option<u64> {
        (filtered < self.id_map.node_count()).then(|| self.id_map.to_root_node_id(filtered))
    }
}

impl NodePropertyValues for FilteredNodePropertyValues {
    fn value_type(&self) -> ValueType {
        self.inner.value_type()
    }

    fn node_count(&self) -> u64 {
        self.id_map.node_count()
    }

    fn double_value(&self, node: u64) -> f64 {
        self.root(node)
            .map_or(self.default.double, |root| self.inner.double_value(root))
    }

    fn long_value(&self, node: u64) -> i64 {
        self.root(node)
            .map_or(self.default.long, |root| self.inner.long_value(root))
    }

    fn default_value(&self) -> DefaultValue {
        self.default
    }
}

/// Filtered-space values read through root ids.
///
/// Root ids outside the filter read as the inner property's default.
#[derive(Debug)]
pub struct OriginalNodePropertyValues {
    inner: Arc<dyn NodePropertyValues>,
    id_map: Arc<FilteredIdMap>,
    default: DefaultValue,
}

impl OriginalNodePropertyValues {
    pub fn new(inner: Arc<dyn NodePropertyValues>, id_map: Arc<FilteredIdMap>) -> Self {
        let default = inner.default_value();
        Self {
            inner,
            id_map,
            default,
        }
    }

    fn filtered(&self, root: u64) -> Option<u64> {
        let filtered = self.id_map.to_filtered_node_id(root);
        (filtered != NOT_FOUND).then_some(filtered)
    }
}

impl NodePropertyValues for OriginalNodePropertyValues {
    fn value_type(&self) -> ValueType {
        self.inner.value_type()
    }

    fn node_count(&self) -> u64 {
        self.id_map.root_node_count()
    }

    fn double_value(&self, node: u64) -> f64 {
        self.filtered(node)
            .map_or(self.default.double, |filtered| self.inner.double_value(filtered))
    }

    fn long_value(&self, node: u64) -> i64 {
        self.filtered(node)
            .map_or(self.default.long, |filtered| self.inner.long_value(filtered))
    }

    fn default_value(&self) -> DefaultValue {
        self.default
    }
}

// =============================================================================
// TESTS
// =============================================================================
