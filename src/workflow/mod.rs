//! The feature workflow graph.
//!
//! Selecting a feature pulls in its taxonomy ancestors: [`identifier`] derives the
//! ancestor identifiers, [`chain`] maps them back onto the feature catalog, and
//! [`store`] inserts the missing nodes and edges. [`Workflow`] ties these to a
//! layout engine and the local cache for one editing session.

pub mod chain;
pub mod identifier;
mod session;
pub mod store;
mod tree_render;

pub use chain::resolve_chain;
pub use session::*;
pub use store::{ChainInsert, GraphStore, NodeDataFn};
pub use tree_render::render_tree;
