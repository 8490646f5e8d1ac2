//! Dense vector assembly from sparse name→value mappings.
//!
//! Pure functions: a schema (or its prebuilt index) plus a sparse mapping
//! produce a vector laid out exactly in schema order, with a default value
//! at every position the mapping omits. Keys absent from the schema are
//! ignored.

use std::collections::HashMap;

use thiserror::Error;

use crate::schema::{FeatureSchema, SchemaIndex};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AssembleError {
    #[error("destination too small: needed {needed}, got {got}")]
    DestinationTooSmall { needed: usize, got: usize },
}

/// Allocates a fresh vector of the schema's length, one lookup per position.
pub fn build_vector(
    schema: &FeatureSchema,
    source: &HashMap<String, f64>,
    default_value: f64,
) -> Vec<f64> {
    schema
        .names()
        .iter()
        .map(|name| source.get(name).copied().unwrap_or(default_value))
        .collect()
}

/// Fills a caller-owned buffer in schema order.
///
/// Every position within the schema length is written — defaulted first,
/// then overwritten by matches — so a destination reused across calls never
/// leaks stale values. The sizing check happens before any write; a failed
/// call leaves `destination` untouched.
pub fn fill_vector(
    schema: &FeatureSchema,
    source: &HashMap<String, f64>,
    destination: &mut [f64],
    default_value: f64,
) -> Result<(), AssembleError> {
    let count = schema.len();
    if destination.len() < count {
        return Err(AssembleError::DestinationTooSmall {
            needed: count,
            got: destination.len(),
        });
    }

    for (slot, name) in destination[..count].iter_mut().zip(schema.names()) {
        *slot = source.get(name).copied().unwrap_or(default_value);
    }
    Ok(())
}

/// Fills a caller-owned buffer using a prebuilt [`SchemaIndex`], iterating
/// the (typically much smaller) sparse mapping instead of the schema.
///
/// Matching cost is O(|source|) rather than O(|schema|), which is why this
/// is the per-observation hot path. Resolved slots outside the schema length
/// are ignored rather than faulted; the index and destination are expected
/// schema-consistent.
pub fn fill_vector_indexed(
    schema: &FeatureSchema,
    index: &SchemaIndex,
    source: &HashMap<String, f64>,
    destination: &mut [f64],
    default_value: f64,
) -> Result<(), AssembleError> {
    let count = schema.len();
    if destination.len() < count {
        return Err(AssembleError::DestinationTooSmall {
            needed: count,
            got: destination.len(),
        });
    }

    destination[..count].fill(default_value);
    for (name, value) in source {
        if let Some(slot) = index.resolve(name) {
            if slot < count {
                destination[slot] = *value;
            }
        }
    }
    Ok(())
}
