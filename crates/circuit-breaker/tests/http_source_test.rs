//! HTTP decision source against a mock circuit-breaker API

use serde_json::json;
use venuewatch_circuit_breaker::{
    ApprovalToken, CircuitBreakerDecision, DecisionSource, DecisionSourceError,
    HttpDecisionSource, VenueId,
};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test_log::test(tokio::test)]
async fn test_request_approval_sends_venue_and_parses_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/circuit-breaker/venue/request"))
        .and(body_json(json!({ "venueId": "venue-42" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "approvalToken": "tok-42",
            "approval": "pending"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let source = HttpDecisionSource::new(&server.uri());
    let response = source
        .request_approval(&VenueId::new("venue-42"))
        .await
        .unwrap();

    assert_eq!(response.approval_token.as_str(), "tok-42");
    assert_eq!(response.approval, CircuitBreakerDecision::Pending);
}

#[test_log::test(tokio::test)]
async fn test_request_approval_rejects_empty_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/circuit-breaker/venue/request"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "approvalToken": "",
            "approval": "yes"
        })))
        .mount(&server)
        .await;

    let source = HttpDecisionSource::new(&server.uri());
    let err = source
        .request_approval(&VenueId::new("venue-42"))
        .await
        .unwrap_err();

    assert!(err.is_malformed());
}

#[test_log::test(tokio::test)]
async fn test_resolution_maps_wire_values() {
    let server = MockServer::start().await;
    for (token, approval) in [("tok-yes", "yes"), ("tok-no", "no"), ("tok-wait", "pending")] {
        Mock::given(method("GET"))
            .and(path(format!("/circuit-breaker/venue/resolution/{token}")))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "approval": approval })),
            )
            .mount(&server)
            .await;
    }

    let source = HttpDecisionSource::new(&server.uri());

    assert_eq!(
        source.resolution(&ApprovalToken::new("tok-yes")).await.unwrap(),
        CircuitBreakerDecision::Approved
    );
    assert_eq!(
        source.resolution(&ApprovalToken::new("tok-no")).await.unwrap(),
        CircuitBreakerDecision::Rejected
    );
    assert_eq!(
        source.resolution(&ApprovalToken::new("tok-wait")).await.unwrap(),
        CircuitBreakerDecision::Pending
    );
}

#[test_log::test(tokio::test)]
async fn test_resolution_unknown_value_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/circuit-breaker/venue/resolution/tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "approval": "maybe" })))
        .mount(&server)
        .await;

    let source = HttpDecisionSource::new(&server.uri());
    let err = source
        .resolution(&ApprovalToken::new("tok-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, DecisionSourceError::Malformed(_)));
}

#[test_log::test(tokio::test)]
async fn test_resolution_non_json_body_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/circuit-breaker/venue/resolution/tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let source = HttpDecisionSource::new(&server.uri());
    let err = source
        .resolution(&ApprovalToken::new("tok-1"))
        .await
        .unwrap_err();

    assert!(err.is_malformed());
}

#[test_log::test(tokio::test)]
async fn test_server_error_is_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/circuit-breaker/venue/resolution/tok-1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let source = HttpDecisionSource::new(&server.uri());
    let err = source
        .resolution(&ApprovalToken::new("tok-1"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        DecisionSourceError::Status {
            status: 503,
            message: "maintenance".to_string()
        }
    );
}

#[test_log::test(tokio::test)]
async fn test_not_found_resolution_is_unknown_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/circuit-breaker/venue/resolution/tok-gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let source = HttpDecisionSource::new(&server.uri());
    let err = source
        .resolution(&ApprovalToken::new("tok-gone"))
        .await
        .unwrap_err();

    assert_eq!(err, DecisionSourceError::UnknownToken("tok-gone".to_string()));
}

#[test_log::test(tokio::test)]
async fn test_unreachable_endpoint_is_transport_error() {
    let source = HttpDecisionSource::new("http://127.0.0.1:1");
    let err = source
        .resolution(&ApprovalToken::new("tok-1"))
        .await
        .unwrap_err();

    assert!(matches!(err, DecisionSourceError::Transport(_)));
}
