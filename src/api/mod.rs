mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::workflow::Workflow;

pub fn create_router(workflow: Workflow) -> Router {
    let api = Router::new()
        // Feature catalog
        .route("/features", get(handlers::list_features).put(handlers::replace_features))
        // Workflow graph
        .route("/workflow", get(handlers::get_workflow))
        .route("/workflow/tree", get(handlers::get_workflow_tree))
        .route(
            "/workflow/features/{id}",
            post(handlers::toggle_feature).delete(handlers::remove_feature),
        )
        .route("/workflow/nodes/changes", post(handlers::apply_node_changes))
        .route("/workflow/edges/changes", post(handlers::apply_edge_changes))
        .route("/workflow/connect", post(handlers::connect))
        .route("/workflow/layout", post(handlers::relayout))
        .route("/workflow/save", post(handlers::save_workflow))
        .route("/workflow/load", post(handlers::load_workflow))
        .route("/workflow/reset", post(handlers::reset_workflow))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(workflow)
}
