//! End-to-end CLI flows against a mock service.

use clap::Parser;
use neurograph_client::cli::{run, Cli};
use neurograph_core::{Edge, GraphData, Node};
use neurograph_e2e_tests::utils::{chunked_run, config_for, event_stream, mount_generation};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn social_graph() -> (Value, Value) {
    (
        json!([
            {"id": "Alice", "type": "Person"},
            {"id": "Bob", "type": "Person"},
            {"id": "Acme", "type": "Company"}
        ]),
        json!([
            {"source": "Alice", "target": "Bob", "type": "KNOWS"},
            {"source": "Alice", "target": "Acme", "type": "WORKS_AT"},
            {"source": "Bob", "target": "Acme", "type": "WORKS_AT"}
        ]),
    )
}

async fn serve_social_graph() -> MockServer {
    let server = MockServer::start().await;
    let (nodes, edges) = social_graph();
    mount_generation(&server, event_stream(&chunked_run(3, nodes, edges))).await;
    server
}

#[tokio::test]
async fn test_unfiltered_run_prints_whole_graph() {
    let server = serve_social_graph().await;
    let cli = Cli::try_parse_from(["neurograph", "--text", "Alice and Bob work at Acme"]).unwrap();

    let graph = run(&cli, config_for(&server)).await.unwrap();

    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(graph.edges.len(), 3);
}

#[tokio::test]
async fn test_node_and_edge_type_filters() {
    let server = serve_social_graph().await;
    let cli = Cli::try_parse_from([
        "neurograph",
        "--text",
        "Alice and Bob work at Acme",
        "--nodes",
        "Alice,Acme,Bob",
        "--edge-types",
        "WORKS_AT",
    ])
    .unwrap();

    let graph = run(&cli, config_for(&server)).await.unwrap();

    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(
        graph.edges,
        vec![
            Edge::new("Alice", "Acme", "WORKS_AT"),
            Edge::new("Bob", "Acme", "WORKS_AT"),
        ]
    );
}

#[tokio::test]
async fn test_node_filter_drops_edges_to_hidden_nodes() {
    let server = serve_social_graph().await;
    let cli = Cli::try_parse_from(["neurograph", "--text", "Alice and Bob", "--nodes", "Alice,Bob"]).unwrap();

    let graph = run(&cli, config_for(&server)).await.unwrap();

    assert_eq!(
        graph,
        GraphData::new(
            vec![Node::new("Alice", "Person"), Node::new("Bob", "Person")],
            vec![Edge::new("Alice", "Bob", "KNOWS")],
        )
    );
}

#[tokio::test]
async fn test_unknown_node_is_rejected() {
    let server = serve_social_graph().await;
    let cli = Cli::try_parse_from(["neurograph", "--text", "Alice", "--nodes", "Mallory"]).unwrap();

    let err = run(&cli, config_for(&server)).await.unwrap_err();
    assert!(err.to_string().contains("Invalid selection"));
}

#[tokio::test]
async fn test_remote_filter_uses_service_response() {
    let server = serve_social_graph().await;
    Mock::given(method("POST"))
        .and(path("/api/filter-graph"))
        .and(body_json(json!({
            "text": "Alice and Bob",
            "selected_nodes": ["Alice", "Bob"],
            "selected_edges": [{"source": "Alice", "target": "Bob", "type": "KNOWS"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": [{"id": "Alice", "type": "Person"}, {"id": "Bob", "type": "Person"}],
            "edges": [
                {"source": "Alice", "target": "Bob", "type": "KNOWS"},
                {"source": "Bob", "target": "Carol", "type": "KNOWS"}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let cli = Cli::try_parse_from(["neurograph", "--text", "Alice and Bob", "--nodes", "Alice,Bob", "--remote-filter"])
        .unwrap();
    let graph = run(&cli, config_for(&server)).await.unwrap();

    // The dangling edge in the response is dropped
    assert_eq!(graph.edges, vec![Edge::new("Alice", "Bob", "KNOWS")]);
}

#[tokio::test]
async fn test_remote_filter_without_selection_stays_local() {
    let server = serve_social_graph().await;
    Mock::given(method("POST"))
        .and(path("/api/filter-graph"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let cli = Cli::try_parse_from(["neurograph", "--text", "Alice and Bob work at Acme", "--remote-filter"]).unwrap();
    let graph = run(&cli, config_for(&server)).await.unwrap();

    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(graph.edges.len(), 3);
}

#[tokio::test]
async fn test_service_failure_is_reported() {
    let server = MockServer::start().await;
    mount_generation(&server, event_stream(&[json!({"error": "No graph generated"})])).await;

    let cli = Cli::try_parse_from(["neurograph", "--text", "nothing here"]).unwrap();
    let err = run(&cli, config_for(&server)).await.unwrap_err();

    assert_eq!(err.to_string(), "Graph generation failed: No graph generated");
}

#[tokio::test]
async fn test_query_not_found_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/wikipedia-search"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "No page for 'qwzx'"})))
        .mount(&server)
        .await;

    let cli = Cli::try_parse_from(["neurograph", "--query", "qwzx"]).unwrap();
    let err = run(&cli, config_for(&server)).await.unwrap_err();

    assert!(format!("{err:#}").contains("No page for 'qwzx'"));
}
