use std::rc::Rc;

use futures::executor::block_on;
use serde_json::json;

use super::*;
use crate::net::testing::MockTransport;
use crate::net::transport::Method;
use crate::util::storage::MemoryStorage;

fn session_with_tokens() -> Rc<SessionStore> {
    let session = Rc::new(SessionStore::new(Rc::new(MemoryStorage::new())));
    session.set_access_token("expired-token");
    session.set_refresh_token("refresh-1");
    session.set_user_id(7);
    session
}

fn client(session: &Rc<SessionStore>, transport: Rc<MockTransport>) -> ApiClient {
    ApiClient::new(ApiConfig::same_origin(), Rc::clone(session), transport)
}

fn get(route: &'static str) -> ApiRequest {
    ApiRequest::new(Method::Get, route, route.to_owned())
}

/// Answers protected routes with 401 until the fresh token shows up, and
/// the refresh endpoint with a new token. Models an expired session that
/// a silent renewal fixes.
fn expiring_backend(request: &ApiRequest) -> Result<ApiResponse, ApiError> {
    if request.route == routes::REFRESH {
        return Ok(ApiResponse::new(
            200,
            json!({"access_token": "fresh-token"}).to_string(),
        ));
    }
    if request.header("authorization") == Some("Bearer fresh-token") {
        Ok(ApiResponse::new(200, "[]"))
    } else {
        Ok(ApiResponse::new(401, r#"{"detail":"token expired"}"#))
    }
}

#[test]
fn attaches_bearer_token_to_requests() {
    let session = session_with_tokens();
    let transport = Rc::new(MockTransport::always(200, "[]"));
    let api = client(&session, transport.clone());

    block_on(api.send(get(routes::KNOWLEDGE_LIST))).expect("send");

    let sent = transport.requests();
    assert_eq!(sent[0].header("authorization"), Some("Bearer expired-token"));
}

#[test]
fn explicit_authorization_header_wins() {
    let session = session_with_tokens();
    let transport = Rc::new(MockTransport::always(200, "[]"));
    let api = client(&session, transport.clone());

    let mut request = get(routes::KNOWLEDGE_LIST);
    request.set_header("Authorization", "Bearer caller-supplied");
    block_on(api.send(request)).expect("send");

    assert_eq!(
        transport.requests()[0].header("authorization"),
        Some("Bearer caller-supplied")
    );
}

#[test]
fn signed_out_requests_go_bare() {
    let session = Rc::new(SessionStore::new(Rc::new(MemoryStorage::new())));
    let transport = Rc::new(MockTransport::always(200, "[]"));
    let api = client(&session, transport.clone());

    block_on(api.send(get(routes::KNOWLEDGE_LIST))).expect("send");

    assert_eq!(transport.requests()[0].header("authorization"), None);
}

#[test]
fn non_401_responses_pass_through() {
    let session = session_with_tokens();
    let transport = Rc::new(MockTransport::always(500, "oops"));
    let api = client(&session, transport.clone());

    let response = block_on(api.send(get(routes::KNOWLEDGE_LIST))).expect("send");

    assert_eq!(response.status, 500);
    assert_eq!(response.body, "oops");
    assert_eq!(transport.calls_to(routes::REFRESH), 0);
    assert_eq!(transport.calls_to(routes::KNOWLEDGE_LIST), 1);
}

#[test]
fn exempt_route_401_never_triggers_refresh() {
    let session = session_with_tokens();
    let transport = Rc::new(MockTransport::always(401, r#"{"detail":"bad credentials"}"#));
    let api = client(&session, transport.clone());

    let request = ApiRequest::new(Method::Post, routes::LOGIN, routes::LOGIN.to_owned())
        .with_body(json!({"email": "a@b.c", "password": "nope"}));
    let response = block_on(api.send(request)).expect("send");

    assert_eq!(response.status, 401);
    assert_eq!(transport.calls_to(routes::REFRESH), 0);
    // Session untouched: an exempt 401 says nothing about the session.
    assert_eq!(session.access_token(), Some("expired-token".to_owned()));
}

#[test]
fn already_retried_request_is_returned_unchanged() {
    let session = session_with_tokens();
    let transport = Rc::new(MockTransport::always(401, ""));
    let api = client(&session, transport.clone());

    let mut request = get(routes::KNOWLEDGE_LIST);
    request.set_header(AUTH_RETRY_HEADER, "1");
    let response = block_on(api.send(request)).expect("send");

    assert_eq!(response.status, 401);
    assert_eq!(transport.calls_to(routes::REFRESH), 0);
    assert_eq!(transport.calls_to(routes::KNOWLEDGE_LIST), 1);
}

#[test]
fn expired_token_is_renewed_and_the_request_retried_once() {
    let session = session_with_tokens();
    let transport = Rc::new(MockTransport::new(expiring_backend));
    let api = client(&session, transport.clone());

    let response = block_on(api.send(get(routes::KNOWLEDGE_LIST))).expect("send");

    assert_eq!(response.status, 200);
    assert_eq!(transport.calls_to(routes::REFRESH), 1);
    assert_eq!(transport.calls_to(routes::KNOWLEDGE_LIST), 2);

    let sent = transport.requests();
    let retried = sent
        .iter()
        .filter(|r| r.route == routes::KNOWLEDGE_LIST)
        .nth(1)
        .expect("retried request");
    assert_eq!(retried.header("authorization"), Some("Bearer fresh-token"));
    assert_eq!(retried.header(AUTH_RETRY_HEADER), Some("1"));

    assert_eq!(session.access_token(), Some("fresh-token".to_owned()));
}

#[test]
fn a_second_401_after_retry_is_final() {
    let session = session_with_tokens();
    let transport = Rc::new(MockTransport::new(|request: &ApiRequest| {
        if request.route == routes::REFRESH {
            Ok(ApiResponse::new(
                200,
                r#"{"access_token":"fresh-token"}"#,
            ))
        } else {
            // Still unauthorized even with the fresh token.
            Ok(ApiResponse::new(401, r#"{"detail":"forbidden"}"#))
        }
    }));
    let api = client(&session, transport.clone());

    let response = block_on(api.send(get(routes::KNOWLEDGE_LIST))).expect("send");

    assert_eq!(response.status, 401);
    assert_eq!(transport.calls_to(routes::REFRESH), 1);
    assert_eq!(transport.calls_to(routes::KNOWLEDGE_LIST), 2);
}

#[test]
fn failed_refresh_surfaces_the_original_401() {
    let session = session_with_tokens();
    let transport = Rc::new(MockTransport::always(401, r#"{"detail":"token expired"}"#));
    let api = client(&session, transport.clone());

    let response = block_on(api.send(get(routes::KNOWLEDGE_LIST))).expect("send");

    assert_eq!(response.status, 401);
    assert_eq!(transport.calls_to(routes::KNOWLEDGE_LIST), 1);
    assert_eq!(transport.calls_to(routes::REFRESH), 1);
    // Unrecoverable expiry: the session has been cleared.
    assert_eq!(session.access_token(), None);
}

#[test]
fn concurrent_401s_share_one_refresh_and_both_retry() {
    let session = session_with_tokens();
    let transport = Rc::new(MockTransport::new(expiring_backend));
    let api = client(&session, transport.clone());

    let (list, topics) = block_on(futures::future::join(
        api.send(get(routes::KNOWLEDGE_LIST)),
        api.send(get(routes::TOPIC)),
    ));

    assert_eq!(list.expect("list").status, 200);
    assert_eq!(topics.expect("topics").status, 200);
    assert_eq!(transport.calls_to(routes::REFRESH), 1);
    assert_eq!(transport.calls_to(routes::KNOWLEDGE_LIST), 2);
    assert_eq!(transport.calls_to(routes::TOPIC), 2);
}
