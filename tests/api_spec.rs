use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use atlas_workflow::api::create_router;
use atlas_workflow::layout::NoopLayout;
use atlas_workflow::models::*;
use atlas_workflow::storage::Persistence;
use atlas_workflow::workflow::Workflow;
use serde_json::json;

fn catalog() -> serde_json::Value {
    json!({
        "features": [
            { "id": "1", "feature_identifier": "paper.experiments.parent", "feature_name": "Experiments" },
            { "id": "2", "feature_identifier": "paper.experiments.name", "feature_name": "Experiment name" },
            { "id": "3", "feature_identifier": "paper.experiments.size", "feature_name": "Sample size" },
        ]
    })
}

fn setup() -> TestServer {
    let workflow = Workflow::builder(Persistence::in_memory())
        .layout(Arc::new(NoopLayout))
        .build();
    let app = create_router(workflow);
    TestServer::new(app).expect("Failed to create test server")
}

async fn setup_with_catalog() -> TestServer {
    let server = setup();
    server.put("/api/v1/features").json(&catalog()).await.assert_status_ok();
    server
}

async fn select(server: &TestServer, id: &str) -> WorkflowSnapshot {
    server
        .post(&format!("/api/v1/workflow/features/{}", id))
        .json(&json!({ "checked": true }))
        .await
        .json::<WorkflowSnapshot>()
}

mod health {
    use super::*;

    #[tokio::test]
    async fn reports_ok() {
        let server = setup();
        let response = server.get("/api/v1/health").await;
        response.assert_status_ok();
        response.assert_json(&json!({ "status": "ok" }));
    }
}

mod features {
    use super::*;

    #[tokio::test]
    async fn starts_with_empty_catalog() {
        let server = setup();
        let features: Vec<Feature> = server.get("/api/v1/features").await.json();
        assert!(features.is_empty());
    }

    #[tokio::test]
    async fn replaces_catalog_from_envelope_or_list() {
        let server = setup_with_catalog().await;
        let features: Vec<Feature> = server.get("/api/v1/features").await.json();
        assert_eq!(features.len(), 3);

        let replaced: Vec<Feature> = server
            .put("/api/v1/features")
            .json(&json!([{ "id": "9", "feature_identifier": "title", "feature_name": "Title" }]))
            .await
            .json();
        assert_eq!(replaced.len(), 1);
        assert_eq!(replaced[0].id, "9");
    }

    #[tokio::test]
    async fn put_honours_selected_flags() {
        let server = setup();
        let features: Vec<Feature> = server
            .put("/api/v1/features")
            .json(&json!([
                { "id": "1", "feature_identifier": "paper.experiments.parent", "feature_name": "Experiments" },
                { "id": "2", "feature_identifier": "paper.experiments.name", "feature_name": "Experiment name", "selected": true }
            ]))
            .await
            .json();
        assert!(features.iter().any(|f| f.id == "2" && f.selected));

        let snapshot: WorkflowSnapshot = server.get("/api/v1/workflow").await.json();
        assert_eq!(snapshot.selected_feature_ids, vec!["2"]);
        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.edges.len(), 1);
    }

    #[tokio::test]
    async fn reflects_selection() {
        let server = setup_with_catalog().await;
        select(&server, "2").await;

        let features: Vec<Feature> = server.get("/api/v1/features").await.json();
        let selected: Vec<_> = features.iter().filter(|f| f.selected).map(|f| f.id.as_str()).collect();
        assert_eq!(selected, vec!["2"]);
    }
}

mod workflow {
    use super::*;

    #[tokio::test]
    async fn starts_empty() {
        let server = setup();
        let snapshot: WorkflowSnapshot = server.get("/api/v1/workflow").await.json();
        assert_eq!(snapshot, WorkflowSnapshot::default());
    }

    #[tokio::test]
    async fn selecting_adds_the_chain() {
        let server = setup_with_catalog().await;
        let snapshot = select(&server, "2").await;

        assert_eq!(snapshot.nodes.len(), 2);
        assert_eq!(snapshot.edges.len(), 1);
        assert_eq!(snapshot.edges[0].source, "feature-node-1");
        assert_eq!(snapshot.edges[0].target, "feature-node-2");
        assert_eq!(snapshot.selected_feature_ids, vec!["2"]);
    }

    #[tokio::test]
    async fn snapshot_uses_camel_case_keys() {
        let server = setup_with_catalog().await;
        select(&server, "1").await;

        let raw: serde_json::Value = server.get("/api/v1/workflow").await.json();
        assert_eq!(raw["selectedFeatureIds"], json!(["1"]));
        assert_eq!(raw["nodes"][0]["type"], "SingleOutputNode");
    }

    #[tokio::test]
    async fn unknown_feature_is_ignored() {
        let server = setup_with_catalog().await;
        let snapshot = select(&server, "404").await;
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn deleting_removes_only_the_feature() {
        let server = setup_with_catalog().await;
        select(&server, "2").await;

        let snapshot: WorkflowSnapshot = server
            .delete("/api/v1/workflow/features/2")
            .await
            .json();

        assert_eq!(snapshot.nodes.len(), 1);
        assert_eq!(snapshot.nodes[0].id, "feature-node-1");
        assert!(snapshot.edges.is_empty());
        assert!(snapshot.selected_feature_ids.is_empty());
    }

    #[tokio::test]
    async fn unchecking_via_post_deselects() {
        let server = setup_with_catalog().await;
        select(&server, "3").await;

        let snapshot: WorkflowSnapshot = server
            .post("/api/v1/workflow/features/3")
            .json(&json!({ "checked": false }))
            .await
            .json();

        assert_eq!(snapshot.nodes.len(), 1);
        assert!(snapshot.selected_feature_ids.is_empty());
    }

    #[tokio::test]
    async fn renders_tree() {
        let server = setup_with_catalog().await;
        select(&server, "2").await;
        select(&server, "3").await;

        let response = server.get("/api/v1/workflow/tree").await;
        response.assert_status_ok();
        assert_eq!(
            response.text(),
            "○ Experiments\n├── ● Experiment name\n└── ● Sample size\n"
        );
    }

    #[tokio::test]
    async fn applies_node_changes() {
        let server = setup_with_catalog().await;
        select(&server, "2").await;

        let snapshot: WorkflowSnapshot = server
            .post("/api/v1/workflow/nodes/changes")
            .json(&json!([
                { "type": "position", "id": "feature-node-2", "position": { "x": 12.0, "y": 34.0 } },
                { "type": "remove", "id": "feature-node-1" }
            ]))
            .await
            .json();

        assert_eq!(snapshot.nodes.len(), 1);
        assert_eq!(snapshot.nodes[0].position, Position { x: 12.0, y: 34.0 });
        assert!(snapshot.edges.is_empty());
    }

    #[tokio::test]
    async fn connects_and_removes_edges() {
        let server = setup_with_catalog().await;
        select(&server, "2").await;
        select(&server, "3").await;

        let snapshot: WorkflowSnapshot = server
            .post("/api/v1/workflow/connect")
            .json(&Connection {
                source: "feature-node-2".to_string(),
                target: "feature-node-3".to_string(),
            })
            .await
            .json();
        assert_eq!(snapshot.edges.len(), 3);

        let snapshot: WorkflowSnapshot = server
            .post("/api/v1/workflow/edges/changes")
            .json(&json!([{ "type": "remove", "id": "edge-1-2" }]))
            .await
            .json();
        assert_eq!(snapshot.edges.len(), 2);
    }

    #[tokio::test]
    async fn skips_untracked_change_types_in_a_batch() {
        let server = setup_with_catalog().await;
        select(&server, "2").await;

        let snapshot: WorkflowSnapshot = server
            .post("/api/v1/workflow/nodes/changes")
            .json(&json!([
                { "type": "select", "id": "feature-node-2", "selected": true },
                { "type": "dimensions", "id": "feature-node-2", "dimensions": { "width": 160, "height": 60 } },
                { "type": "position", "id": "feature-node-2", "position": { "x": 8.0, "y": 9.0 } }
            ]))
            .await
            .json();

        let moved = snapshot.nodes.iter().find(|n| n.id == "feature-node-2").expect("node missing");
        assert_eq!(moved.position, Position { x: 8.0, y: 9.0 });
    }

    #[tokio::test]
    async fn rejects_malformed_changes() {
        let server = setup_with_catalog().await;
        let response = server
            .post("/api/v1/workflow/nodes/changes")
            .json(&json!([{ "type": "position", "id": "feature-node-2" }]))
            .expect_failure()
            .await;
        assert_eq!(response.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn layout_endpoint_waits_for_positions() {
        let workflow = Workflow::builder(Persistence::in_memory()).build();
        let server = TestServer::new(create_router(workflow)).expect("Failed to create test server");
        server.put("/api/v1/features").json(&catalog()).await;
        select(&server, "2").await;

        let snapshot: WorkflowSnapshot = server.post("/api/v1/workflow/layout").await.json();

        assert!(snapshot.nodes.iter().all(|n| !n.draggable));
        let parent = snapshot.nodes.iter().find(|n| n.id == "feature-node-1").expect("node missing");
        let child = snapshot.nodes.iter().find(|n| n.id == "feature-node-2").expect("node missing");
        assert!(parent.position.y < child.position.y);
    }

    #[tokio::test]
    async fn reset_then_load_restores_saved_state() {
        let server = setup_with_catalog().await;
        select(&server, "2").await;

        server
            .post("/api/v1/workflow/save")
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let loaded: WorkflowSnapshot = server.post("/api/v1/workflow/load").await.json();
        assert_eq!(loaded.nodes.len(), 2);

        let reset: WorkflowSnapshot = server.post("/api/v1/workflow/reset").await.json();
        assert!(reset.is_empty());

        let loaded: WorkflowSnapshot = server.post("/api/v1/workflow/load").await.json();
        assert!(loaded.is_empty());
    }
}
