mod common;

use assert_matches::assert_matches;
use common::{Frame, RecordingRenderer};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use swipestyle_cli::config::ApiConfig;
use swipestyle_cli::protocol::{ShoppingRequest, StepReply, StepRequest};
use swipestyle_cli::{
    ApiClient, ApiError, Backend, FlowController, FlowSettings, FlowState, LinkStatus, Locale,
};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    let config = ApiConfig {
        base_url: server.uri(),
        request_timeout_secs: 5,
        ..ApiConfig::default()
    };
    ApiClient::new(&config).unwrap()
}

#[tokio::test]
async fn detect_posts_query_and_language() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect_category"))
        .and(body_json(json!({ "query": "oyun laptopu", "language": "tr" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "category": "Laptop" })))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client_for(&server)
        .detect_category("oyun laptopu", Locale::Tr)
        .await
        .unwrap();
    assert_eq!(reply.category.as_deref(), Some("Laptop"));
}

#[tokio::test]
async fn ask_sends_full_session_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_json(json!({
            "step": 1,
            "category": "Mouse",
            "answers": ["Siyah"],
            "language": "en"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "question": "Wireless?",
            "options": ["Yes", "No"],
            "emoji": "📶"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let request = StepRequest {
        step: 1,
        category: "Mouse".to_string(),
        answers: vec!["Siyah".to_string()],
        language: Locale::En,
    };
    let reply = client_for(&server).ask(&request).await.unwrap();
    assert_matches!(reply, StepReply::Question(view) => {
        assert_eq!(view.question, "Wireless?");
        assert_eq!(view.emoji, "📶");
    });
}

#[tokio::test]
async fn non_success_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let request = StepRequest {
        step: 0,
        category: "Laptop".to_string(),
        answers: Vec::new(),
        language: Locale::Tr,
    };
    let err = client_for(&server).ask(&request).await.unwrap_err();
    assert_matches!(err, ApiError::Status { status: 503, body } => {
        assert_eq!(body, "maintenance");
    });
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect_category"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .detect_category("laptop", Locale::Tr)
        .await
        .unwrap_err();
    assert_matches!(err, ApiError::Decode(_));
}

#[tokio::test]
async fn categories_are_requested_per_language() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/categories"))
        .and(query_param("language", "en"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Headphones": { "specs": ["Budget", "Type"], "emoji": "🎧" },
            "Laptop": { "specs": ["Budget"] }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let categories = client_for(&server).categories(Locale::En).await.unwrap();
    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Headphones", "Laptop"]);
    assert_eq!(categories[0].specs, vec!["Budget", "Type"]);
}

#[tokio::test]
async fn autocomplete_passes_prefix_and_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/autocomplete"))
        .and(query_param("q", "kulak"))
        .and(query_param("limit", "8"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "suggestions": [
                { "text": "Kulaklık", "icon": "🎧", "category": "Headphones" },
                { "text": "Kulak içi kulaklık" }
            ]
        })))
        .mount(&server)
        .await;

    let suggestions = client_for(&server)
        .autocomplete("kulak", Locale::Tr, 8)
        .await
        .unwrap();
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].category, "Headphones");
    assert_eq!(suggestions[1].text, "Kulak içi kulaklık");
}

#[tokio::test]
async fn shopping_error_field_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/shopping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "quota exceeded" })))
        .mount(&server)
        .await;

    let request = ShoppingRequest {
        query: "kulaklık".to_string(),
        country: "TR".to_string(),
        language: Locale::Tr,
    };
    let err = client_for(&server).shopping(&request).await.unwrap_err();
    assert_matches!(err, ApiError::Rejected(message) => assert_eq!(message, "quota exceeded"));
}

#[tokio::test]
async fn shopping_lists_products() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/shopping"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "products": [
                { "title": "Sony WH-1000XM5", "price": "12.499 TL", "link": "https://www.teknosa.com/sony-wh" }
            ]
        })))
        .mount(&server)
        .await;

    let request = ShoppingRequest {
        query: "sony kulaklık".to_string(),
        country: "TR".to_string(),
        language: Locale::Tr,
    };
    let products = client_for(&server).shopping(&request).await.unwrap();
    assert_eq!(products.len(), 1);
}

#[tokio::test]
async fn unreachable_server_is_a_transport_error() {
    let config = ApiConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        request_timeout_secs: 2,
        ..ApiConfig::default()
    };
    let client = ApiClient::new(&config).unwrap();
    let err = client.detect_category("laptop", Locale::Tr).await.unwrap_err();
    assert_matches!(err, ApiError::Transport(_));
}

#[tokio::test]
async fn full_session_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/detect_category"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "category": "Mouse" })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_json(json!({ "step": 0, "category": "Mouse", "answers": [], "language": "tr" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "question": "Renk?",
            "options": ["Siyah", "Beyaz"]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ask"))
        .and(body_json(json!({ "step": 1, "category": "Mouse", "answers": ["Siyah"], "language": "tr" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "recommendations": [{
                "title": "Logitech G502",
                "price": "1.299 TL",
                "link": "https://www.hepsiburada.com/logitech-g502-p-1",
                "match_score": 92
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend: Arc<dyn Backend> = Arc::new(client_for(&server));
    let settings = FlowSettings {
        step_timeout: Duration::from_secs(10),
        pacing: Duration::ZERO,
    };
    let (mut flow, mut events) =
        FlowController::new(backend, RecordingRenderer::default(), settings, Locale::Tr);

    flow.submit_query("oyun faresi").unwrap();
    while flow.current_question().is_none() {
        let event = events.recv().await.unwrap();
        assert!(flow.handle_event(event));
    }
    flow.answer_step("Siyah").unwrap();
    let event = events.recv().await.unwrap();
    assert!(flow.handle_event(event));

    assert_eq!(flow.state(), &FlowState::Recommending);
    let Some(Frame::Recommendations(items)) = flow.renderer().last() else {
        panic!("expected recommendations frame");
    };
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].link.status, LinkStatus::Valid);
}
