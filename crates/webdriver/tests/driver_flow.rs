//! Login flow against a mocked WebDriver server.

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use bidstream_webdriver::{WebDriverError, WebDriverLogin, WebDriverOptions};

const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

fn element_response(element_id: &str) -> ResponseTemplate {
    let mut element = serde_json::Map::new();
    element.insert(ELEMENT_KEY.to_string(), serde_json::Value::String(element_id.to_string()));
    ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": element }))
}

fn ok_response() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": null }))
}

async fn mount_driver(server: &MockServer, final_url: &str) {
    Mock::given(method("POST"))
        .and(path("/session"))
        .and(body_string_contains("goog:chromeOptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({ "value": { "sessionId": "sess1", "capabilities": {} } }),
        ))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/sess1/timeouts"))
        .respond_with(ok_response())
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/sess1/url"))
        .respond_with(ok_response())
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/sess1/element"))
        .and(body_string_contains("login_handle"))
        .respond_with(element_response("el-login"))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/sess1/element"))
        .and(body_string_contains("password"))
        .respond_with(element_response("el-password"))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/sess1/element"))
        .and(body_string_contains("btn_submit"))
        .respond_with(element_response("el-submit"))
        .mount(server)
        .await;
    for element in ["el-login", "el-password"] {
        Mock::given(method("POST"))
            .and(path(format!("/session/sess1/element/{element}/value")))
            .respond_with(ok_response())
            .expect(1)
            .mount(server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path("/session/sess1/element/el-submit/click"))
        .respond_with(ok_response())
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/session/sess1/url"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": final_url })),
        )
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/session/sess1"))
        .respond_with(ok_response())
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn fills_form_and_returns_final_url() {
    let server = MockServer::start().await;
    mount_driver(&server, "https://cb.test/done?code=C1&state=S1").await;

    let provider =
        WebDriverLogin::new(server.uri(), WebDriverOptions::default()).expect("provider");
    let final_url = provider
        .run_login_flow("https://login.test/form", "user@example.com", "hunter2")
        .await
        .expect("flow");

    assert_eq!(final_url, "https://cb.test/done?code=C1&state=S1");
}

#[tokio::test]
async fn session_is_deleted_when_an_element_is_missing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            serde_json::json!({ "value": { "sessionId": "sess1", "capabilities": {} } }),
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/sess1/timeouts"))
        .respond_with(ok_response())
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/sess1/url"))
        .respond_with(ok_response())
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/sess1/element"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "value": { "error": "no such element", "message": "selector matched nothing" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/session/sess1"))
        .respond_with(ok_response())
        .expect(1)
        .mount(&server)
        .await;

    let provider =
        WebDriverLogin::new(server.uri(), WebDriverOptions::default()).expect("provider");
    let err = provider
        .run_login_flow("https://login.test/form", "user", "pass")
        .await
        .expect_err("flow must fail");

    assert!(matches!(err, WebDriverError::Protocol { .. }));
    assert!(err.to_string().contains("no such element"));
}

#[tokio::test]
async fn driver_side_session_rejection_surfaces_as_protocol_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "value": { "error": "session not created", "message": "chrome failed to start" }
        })))
        .mount(&server)
        .await;

    let provider =
        WebDriverLogin::new(server.uri(), WebDriverOptions::default()).expect("provider");
    let err = provider
        .run_login_flow("https://login.test/form", "user", "pass")
        .await
        .expect_err("connect must fail");

    assert!(err.to_string().contains("chrome failed to start"));
}
