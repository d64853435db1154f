use serde::{Deserialize, Serialize};

use crate::workflow::identifier;

/// A unit of extractable information from a paper.
///
/// Features form a taxonomy through their dotted `feature_identifier` rather than
/// an explicit parent reference. An identifier whose last segment is `parent`
/// (e.g. `paper.experiments.parent`) is a containment group rather than a leaf
/// value. Identity is `id`; identifiers are assumed unique within one catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    pub feature_identifier: String,
    pub feature_name: String,
    #[serde(default)]
    pub feature_description: String,
    #[serde(default)]
    pub selected: bool,
}

impl Feature {
    /// Human-readable path, leaf first: `name ← conditions ← experiments ← paper`.
    pub fn trail(&self) -> String {
        identifier::trail(&self.feature_identifier)
    }

    /// Whether this feature is a containment group (`*.parent`).
    pub fn is_group(&self) -> bool {
        identifier::is_group(&self.feature_identifier)
    }
}

/// The set of features available for selection.
///
/// Accepts either a bare JSON array or the backend's `{ "features": [...] }`
/// envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureCatalog {
    Envelope { features: Vec<Feature> },
    List(Vec<Feature>),
}

impl FeatureCatalog {
    pub fn into_features(self) -> Vec<Feature> {
        match self {
            Self::Envelope { features } => features,
            Self::List(features) => features,
        }
    }
}
