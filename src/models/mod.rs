//! Domain models for the Atlas workflow builder.
//!
//! # Core Concepts
//!
//! - [`Feature`]: A unit of extractable information, positioned in a dotted taxonomy
//!   by its `feature_identifier` (e.g. `paper.experiments.conditions.name`).
//! - [`GraphNode`] / [`GraphEdge`]: The visual workflow graph. Nodes are derived from
//!   features with deterministic ids, edges point from a taxonomy parent to its child.
//! - [`WorkflowSnapshot`]: The persisted tuple of nodes, edges and selected feature ids.
//!
//! Node payloads are kept neutral: a [`NodeKind`] tag plus opaque JSON `data`, so
//! nothing here depends on a particular rendering library.

mod feature;
mod graph;
mod snapshot;

pub use feature::*;
pub use graph::*;
pub use snapshot::*;
