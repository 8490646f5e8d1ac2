//! Feature schema and name→slot index.
//!
//! A schema is the ordered declaration of feature names; it defines the
//! layout of every dense vector produced for it and acts as the wire
//! contract with downstream inference. The fingerprint pins that layout so
//! a silent reorder within a running pipeline is detectable.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("invalid feature schema: {0}")]
    InvalidSchema(String),
    #[error("feature '{name}' is not defined in the schema")]
    UnknownFeature { name: String },
    #[error("schema fingerprint mismatch: expected {expected}, got {actual}")]
    FingerprintMismatch { expected: String, actual: String },
}

/// Immutable ordered list of feature names.
///
/// Names are expected unique but uniqueness is not enforced; a duplicate
/// resolves to its last position through the index. Schemas are treated as
/// immutable for the lifetime of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    names: Vec<String>,
    fingerprint: String,
}

impl FeatureSchema {
    /// Builds a schema from an ordered name list.
    ///
    /// An empty list or a blank name is a configuration error and is
    /// rejected at construction, never at assembly time.
    pub fn new(names: Vec<String>) -> Result<Self, SchemaError> {
        if names.is_empty() {
            return Err(SchemaError::InvalidSchema(
                "schema must declare at least one feature name".to_string(),
            ));
        }
        if let Some(blank) = names.iter().find(|n| n.trim().is_empty()) {
            return Err(SchemaError::InvalidSchema(format!(
                "blank feature name at position {}",
                names.iter().position(|n| n == blank).unwrap_or(0)
            )));
        }

        let fingerprint = fingerprint_of(&names);
        info!(
            component = "schema",
            event = "schema.built",
            feature_count = names.len(),
            fingerprint = fingerprint
        );

        Ok(Self { names, fingerprint })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Hex SHA-256 over the ordered names; stable across rebuilds of the
    /// same declaration.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }
}

/// Fails when `actual` does not carry the expected layout fingerprint.
///
/// Used at pipeline start to catch a schema/collaborator mismatch before any
/// vector crosses the boundary.
pub fn assert_schema_compatible(
    expected_fingerprint: &str,
    actual: &FeatureSchema,
) -> Result<(), SchemaError> {
    if expected_fingerprint != actual.fingerprint {
        return Err(SchemaError::FingerprintMismatch {
            expected: expected_fingerprint.to_string(),
            actual: actual.fingerprint.clone(),
        });
    }
    Ok(())
}

/// Name→slot lookup built once per schema and reused across evaluations.
///
/// Hot-path assembly must not re-derive name positions per evaluation.
#[derive(Debug, Clone)]
pub struct SchemaIndex {
    slots: HashMap<String, usize>,
    len: usize,
}

impl SchemaIndex {
    pub fn new(schema: &FeatureSchema) -> Self {
        let mut slots = HashMap::with_capacity(schema.len());
        for (i, name) in schema.names().iter().enumerate() {
            slots.insert(name.clone(), i);
        }
        Self {
            slots,
            len: schema.len(),
        }
    }

    /// Number of features in the underlying schema.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// O(1) average slot resolution; `None` when the name is not declared.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.slots.get(name).copied()
    }

    /// Like [`resolve`](Self::resolve), but an unknown name is an error —
    /// distinct from a routine miss in a sparse mapping, since it indicates
    /// a schema/collaborator mismatch.
    pub fn resolve_or_fail(&self, name: &str) -> Result<usize, SchemaError> {
        self.slots
            .get(name)
            .copied()
            .ok_or_else(|| SchemaError::UnknownFeature {
                name: name.to_string(),
            })
    }
}

fn fingerprint_of(names: &[String]) -> String {
    let mut hasher = Sha256::new();
    hasher.update("names:");
    for name in names {
        hasher.update(name.as_bytes());
        hasher.update(";");
    }
    hex::encode(hasher.finalize())
}
