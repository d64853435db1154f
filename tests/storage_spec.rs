use std::sync::Arc;

use atlas_workflow::models::*;
use atlas_workflow::storage::*;
use speculate2::speculate;

fn sample_snapshot() -> WorkflowSnapshot {
    WorkflowSnapshot {
        nodes: vec![
            GraphNode {
                id: feature_node_id("1"),
                kind: NodeKind::SingleOutput,
                position: Position { x: 120.0, y: 0.0 },
                data: serde_json::json!({ "name": "Experiments", "maxLength": 60 }),
                draggable: false,
            },
            GraphNode {
                id: feature_node_id("2"),
                kind: NodeKind::SingleOutput,
                position: Position::ORIGIN,
                data: serde_json::json!({ "name": "Name" }),
                draggable: true,
            },
        ],
        edges: vec![GraphEdge {
            id: feature_edge_id("1", "2"),
            source: feature_node_id("1"),
            target: feature_node_id("2"),
        }],
        selected_feature_ids: vec!["2".to_string()],
    }
}

speculate! {
    describe "persistence over memory" {
        before {
            let store = Arc::new(MemoryStore::new());
            let persistence = Persistence::new(store.clone());
        }

        it "loads an empty snapshot from an empty store" {
            assert_eq!(persistence.load(), WorkflowSnapshot::default());
        }

        it "round-trips a saved snapshot" {
            let snapshot = sample_snapshot();
            persistence.save(&snapshot).expect("Failed to save");
            assert_eq!(persistence.load(), snapshot);
        }

        it "writes three independent keys" {
            persistence.save(&sample_snapshot()).expect("Failed to save");
            assert_eq!(store.len(), 3);
            let selected = store.get(SELECTED_KEY).expect("Read failed");
            assert_eq!(selected.as_deref(), Some(r#"["2"]"#));
        }

        it "overwrites the previous snapshot wholesale" {
            persistence.save(&sample_snapshot()).expect("Failed to save");
            persistence.save(&WorkflowSnapshot::default()).expect("Failed to save");
            assert!(persistence.load().is_empty());
        }

        it "falls back per key when an entry is corrupt" {
            persistence.save(&sample_snapshot()).expect("Failed to save");
            store.set(NODES_KEY, "{ definitely not json").expect("Write failed");

            let loaded = persistence.load();
            assert!(loaded.nodes.is_empty());
            assert_eq!(loaded.edges.len(), 1);
            assert_eq!(loaded.selected_feature_ids, vec!["2"]);
        }

        it "clears every key" {
            persistence.save(&sample_snapshot()).expect("Failed to save");
            persistence.clear().expect("Failed to clear");
            assert!(store.is_empty());
            assert!(persistence.load().is_empty());
        }
    }

    describe "sqlite store" {
        before {
            let store = SqliteStore::open_memory().expect("Failed to open cache");
            store.migrate().expect("Failed to migrate");
        }

        it "returns None for a missing key" {
            assert!(store.get("missing").expect("Read failed").is_none());
        }

        it "last write wins" {
            store.set("k", "first").expect("Write failed");
            store.set("k", "second").expect("Write failed");
            assert_eq!(store.get("k").expect("Read failed").as_deref(), Some("second"));
        }

        it "removes keys and tolerates removing absent ones" {
            store.set("k", "v").expect("Write failed");
            store.remove("k").expect("Remove failed");
            store.remove("k").expect("Remove failed");
            assert!(store.get("k").expect("Read failed").is_none());
        }

        it "round-trips a snapshot through persistence" {
            let persistence = Persistence::new(Arc::new(store.clone()));
            persistence.save(&sample_snapshot()).expect("Failed to save");
            assert_eq!(persistence.load(), sample_snapshot());
        }
    }

    describe "sqlite file" {
        it "keeps the snapshot across reopen" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("nested").join("atlas.db");

            {
                let store = SqliteStore::open(&path).expect("Failed to open cache");
                store.migrate().expect("Failed to migrate");
                Persistence::new(Arc::new(store))
                    .save(&sample_snapshot())
                    .expect("Failed to save");
            }

            let store = SqliteStore::open(&path).expect("Failed to reopen cache");
            store.migrate().expect("Failed to migrate");
            assert_eq!(Persistence::new(Arc::new(store)).load(), sample_snapshot());
        }
    }
}
