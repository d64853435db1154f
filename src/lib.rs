//! Atlas workflow builder.
//!
//! Turns selections from a dotted feature taxonomy into a laid-out node/edge
//! graph, cached locally and served to the editor over a small JSON API.

pub mod api;
pub mod config;
pub mod layout;
pub mod models;
pub mod storage;
pub mod workflow;
