//! End-to-end generation flows: SessionController driving the HTTP
//! collaborators against a mock service.

use std::time::Duration;

use neurograph_core::{
    CoreError, Edge, FailureKind, FilterMode, GenerationOutcome, Node, SessionPhase, SourceError, TextInput,
    UploadedFile,
};
use neurograph_e2e_tests::utils::{chunked_run, controller_for, event_stream, mount_generation, GENERATION_TIMEOUT_MS};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::time::timeout;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_query_to_filtered_graph() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/wikipedia-search"))
        .and(body_json(json!({"query": "Marie Curie"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "Marie Curie was a physicist in Paris. She married Pierre Curie."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payloads = chunked_run(
        2,
        json!([
            {"id": "Marie Curie", "type": "Person"},
            {"id": "Pierre Curie", "type": "Person"},
            {"id": "Paris", "type": "City"},
            {"id": "Marie Curie", "type": "Scientist"}
        ]),
        json!([
            {"source": "Marie Curie", "target": "Paris", "type": "WORKED_IN"},
            {"source": "Marie Curie", "target": "Pierre Curie", "type": "MARRIED_TO"},
            {"source": "Pierre Curie", "target": "Sorbonne", "type": "TAUGHT_AT"}
        ]),
    );
    Mock::given(method("POST"))
        .and(path("/api/generate-graph"))
        .and(body_json(json!({
            "text": "Marie Curie was a physicist in Paris. She married Pierre Curie."
        })))
        .respond_with(ResponseTemplate::new(200).set_body_raw(event_stream(&payloads), "text/event-stream"))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller_for(&server);
    let outcome = timeout(
        Duration::from_millis(GENERATION_TIMEOUT_MS),
        controller.generate(TextInput::Query("Marie Curie".into())),
    )
    .await
    .expect("generation timed out")
    .expect("generation dispatched");
    assert_eq!(outcome, GenerationOutcome::Ready);

    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Ready);
    assert_eq!(snapshot.progress.percent, 100.0);
    assert_eq!(snapshot.progress.total, 2);

    // Duplicate node and dangling edge are gone
    let view = snapshot.view.expect("view");
    assert_eq!(view.graph().nodes().len(), 3);
    assert_eq!(view.graph().nodes()[0], Node::new("Marie Curie", "Person"));
    assert_eq!(view.graph().edges().len(), 2);

    controller.set_node_mode(FilterMode::Custom).unwrap();
    controller
        .propose_nodes(vec!["Marie Curie".into(), "Paris".into()])
        .unwrap();
    controller.commit_selection().unwrap();

    let visible = controller.visible_graph().unwrap();
    assert_eq!(visible.edges, vec![Edge::new("Marie Curie", "Paris", "WORKED_IN")]);
}

#[tokio::test]
async fn test_service_error_record_fails_the_session() {
    let server = MockServer::start().await;
    mount_generation(
        &server,
        event_stream(&[
            json!({"progress": 10, "status": "Processing chunk 1 of 3", "current": 1, "total": 3}),
            json!({"error": "Error processing chunk 2: model unavailable"}),
        ]),
    )
    .await;

    let controller = controller_for(&server);
    let outcome = controller.generate(TextInput::Custom("text".into())).await.unwrap();

    let GenerationOutcome::Failed(failure) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(failure.kind, FailureKind::Application);
    assert_eq!(failure.message, "Error processing chunk 2: model unavailable");
    assert_eq!(controller.snapshot().phase, SessionPhase::Failed);
}

#[tokio::test]
async fn test_truncated_stream_is_an_incomplete_generation() {
    let server = MockServer::start().await;
    mount_generation(
        &server,
        event_stream(&[json!({"progress": 45, "status": "Processing chunk 1 of 2", "current": 1, "total": 2})]),
    )
    .await;

    let controller = controller_for(&server);
    let outcome = controller.generate(TextInput::Custom("text".into())).await.unwrap();

    assert!(matches!(outcome, GenerationOutcome::Failed(ref f) if f.kind == FailureKind::Aborted));
    let snapshot = controller.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Failed);
    assert!(snapshot.view.is_none());
}

#[tokio::test]
async fn test_http_error_with_detail_is_shown_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/generate-graph"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"detail": "No graph generated"})))
        .mount(&server)
        .await;

    let controller = controller_for(&server);
    let outcome = controller.generate(TextInput::Custom("text".into())).await.unwrap();

    let failure = controller.snapshot().failure.expect("failure recorded");
    assert_eq!(outcome, GenerationOutcome::Failed(failure.clone()));
    assert_eq!(failure.kind, FailureKind::Application);
    assert_eq!(failure.message, "No graph generated");
}

#[tokio::test]
async fn test_unreachable_service_is_a_transport_failure() {
    let server = MockServer::start().await;
    let controller = controller_for(&server);
    // Nothing listens on the port once the server is gone
    drop(server);

    let outcome = controller.generate(TextInput::Custom("text".into())).await.unwrap();
    let GenerationOutcome::Failed(failure) = outcome else {
        panic!("expected failure");
    };
    assert_eq!(failure.kind, FailureKind::Transport);
    assert_eq!(failure.message, "Could not reach the graph generation service");
}

#[tokio::test]
async fn test_unsupported_upload_leaves_session_idle() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload-file"))
        .respond_with(ResponseTemplate::new(415).set_body_json(json!({"detail": "Unsupported file type"})))
        .mount(&server)
        .await;

    let controller = controller_for(&server);
    let err = controller
        .generate(TextInput::File(UploadedFile::new("image.png", vec![0x89, 0x50, 0x4e, 0x47])))
        .await
        .unwrap_err();

    assert_eq!(err, CoreError::Source(SourceError::Unsupported("Unsupported file type".into())));
    assert_eq!(controller.snapshot().phase, SessionPhase::Idle);
}

#[tokio::test]
async fn test_remote_refilter_round_trip() {
    let server = MockServer::start().await;
    mount_generation(
        &server,
        event_stream(&chunked_run(
            1,
            json!([{"id": "A", "type": "T"}, {"id": "B", "type": "T"}, {"id": "C", "type": "T"}]),
            json!([{"source": "A", "target": "B", "type": "R"}, {"source": "B", "target": "C", "type": "R"}]),
        )),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/api/filter-graph"))
        .and(body_json(json!({
            "text": "A relates to B and C",
            "selected_nodes": ["A", "B"],
            "selected_edges": [{"source": "A", "target": "B", "type": "R"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "nodes": [{"id": "A", "type": "T"}, {"id": "B", "type": "T"}],
            "edges": [{"source": "A", "target": "B", "type": "R"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let controller = controller_for(&server);
    controller
        .generate(TextInput::Custom("A relates to B and C".into()))
        .await
        .unwrap();
    controller.set_node_mode(FilterMode::Custom).unwrap();
    controller.propose_nodes(vec!["A".into(), "B".into()]).unwrap();
    controller.commit_selection().unwrap();

    let graph = controller.refilter_remote().await.unwrap();
    assert_eq!(graph, controller.visible_graph().unwrap());
}
