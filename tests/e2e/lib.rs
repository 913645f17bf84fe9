// NeuroGraph E2E Tests
//
// SessionController and the HTTP collaborators against a mock service that
// speaks the generation wire contract.

/// Shared test infrastructure for E2E tests
pub mod utils {
    use std::sync::Arc;

    use neurograph_client::{ClientConfig, HttpGenerationClient, HttpTextSource};
    use neurograph_core::SessionController;
    use serde_json::{json, Value};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Upper bound for any single generation in these tests
    pub const GENERATION_TIMEOUT_MS: u64 = 5000;

    /// Client configuration pointing at `server`
    pub fn config_for(server: &MockServer) -> ClientConfig {
        ClientConfig {
            service_url: server.uri(),
            connect_timeout_secs: 2,
            request_timeout_secs: 5,
            ..ClientConfig::default()
        }
    }

    /// Controller wired to the HTTP collaborators
    pub fn controller_for(server: &MockServer) -> SessionController {
        let config = config_for(server);
        let service = HttpGenerationClient::new(config.clone()).expect("generation client");
        let source = HttpTextSource::new(config).expect("text source");
        SessionController::new(Arc::new(source), Arc::new(service))
    }

    /// Event stream body as the service writes it: one `data: ` record per
    /// payload, separated by blank lines
    pub fn event_stream(payloads: &[Value]) -> String {
        payloads
            .iter()
            .map(|payload| format!("data: {payload}\n\n"))
            .collect()
    }

    /// Progress payloads for a run split into `chunks` pieces, then completion
    pub fn chunked_run(chunks: u64, nodes: Value, edges: Value) -> Vec<Value> {
        let mut payloads = vec![json!({"progress": 0, "status": "Starting...", "current": 0, "total": chunks})];
        for current in 1..=chunks {
            payloads.push(json!({
                "progress": (current * 90 / chunks),
                "status": format!("Processing chunk {current} of {chunks}"),
                "current": current,
                "total": chunks,
            }));
        }
        payloads.push(json!({"progress": 100, "status": "Complete", "current": chunks, "total": chunks}));
        payloads.push(json!({"done": true, "nodes": nodes, "edges": edges}));
        payloads
    }

    /// Serve `body` as the response of the streaming generation endpoint
    pub async fn mount_generation(server: &MockServer, body: String) {
        Mock::given(method("POST"))
            .and(path("/api/generate-graph"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
            .mount(server)
            .await;
    }
}
