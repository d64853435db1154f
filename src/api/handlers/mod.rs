use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::models::*;
use crate::workflow::{render_tree, Workflow};

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Feature catalog
// ============================================================

pub async fn list_features(State(workflow): State<Workflow>) -> Json<Vec<Feature>> {
    Json(workflow.features())
}

pub async fn replace_features(
    State(workflow): State<Workflow>,
    Json(catalog): Json<FeatureCatalog>,
) -> Json<Vec<Feature>> {
    workflow.seed_from_catalog(catalog.into_features());
    Json(workflow.features())
}

// ============================================================
// Workflow graph
// ============================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ToggleFeatureInput {
    pub checked: bool,
}

pub async fn get_workflow(State(workflow): State<Workflow>) -> Json<WorkflowSnapshot> {
    Json(workflow.snapshot())
}

pub async fn get_workflow_tree(State(workflow): State<Workflow>) -> String {
    render_tree(&workflow.snapshot())
}

pub async fn toggle_feature(
    State(workflow): State<Workflow>,
    Path(id): Path<String>,
    Json(input): Json<ToggleFeatureInput>,
) -> Json<WorkflowSnapshot> {
    workflow.toggle_feature(&id, input.checked);
    Json(workflow.snapshot())
}

pub async fn remove_feature(
    State(workflow): State<Workflow>,
    Path(id): Path<String>,
) -> Json<WorkflowSnapshot> {
    workflow.toggle_feature(&id, false);
    Json(workflow.snapshot())
}

pub async fn apply_node_changes(
    State(workflow): State<Workflow>,
    Json(changes): Json<Vec<NodeChange>>,
) -> Json<WorkflowSnapshot> {
    workflow.on_nodes_change(&changes);
    Json(workflow.snapshot())
}

pub async fn apply_edge_changes(
    State(workflow): State<Workflow>,
    Json(changes): Json<Vec<EdgeChange>>,
) -> Json<WorkflowSnapshot> {
    workflow.on_edges_change(&changes);
    Json(workflow.snapshot())
}

pub async fn connect(
    State(workflow): State<Workflow>,
    Json(connection): Json<Connection>,
) -> Json<WorkflowSnapshot> {
    workflow.on_connect(&connection);
    Json(workflow.snapshot())
}

/// Run a layout pass and wait for it, unlike the passes scheduled by mutations.
pub async fn relayout(
    State(workflow): State<Workflow>,
) -> Result<Json<WorkflowSnapshot>, (StatusCode, String)> {
    workflow.relayout().await.map_err(internal_error)?;
    Ok(Json(workflow.snapshot()))
}

pub async fn save_workflow(
    State(workflow): State<Workflow>,
) -> Result<StatusCode, (StatusCode, String)> {
    workflow.save().map_err(internal_error)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn load_workflow(State(workflow): State<Workflow>) -> Json<WorkflowSnapshot> {
    workflow.load_saved();
    Json(workflow.snapshot())
}

pub async fn reset_workflow(State(workflow): State<Workflow>) -> Json<WorkflowSnapshot> {
    workflow.reset_all();
    Json(workflow.snapshot())
}
