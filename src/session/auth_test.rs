use super::*;
use crate::config::StorefrontConfig;
use crate::net::test_helpers::ScriptedTransport;
use crate::routes::Route;
use crate::session::events::InvalidationReason;
use crate::session::store::MemoryTokenStore;
use serde_json::json;

struct Harness {
    transport: Arc<ScriptedTransport>,
    state: Arc<SessionState>,
    auth: AuthSession,
}

fn harness(token: Option<&str>) -> Harness {
    let store = match token {
        Some(token) => MemoryTokenStore::with_value("csrf_token", token),
        None => MemoryTokenStore::new(),
    };
    let config = StorefrontConfig::default();
    let state = Arc::new(SessionState::new(Arc::new(store), "csrf_token").unwrap());
    let transport = Arc::new(ScriptedTransport::new());
    let gateway = Arc::new(Gateway::new(transport.clone(), state.clone(), &config));
    let auth = AuthSession::new(gateway, config.endpoints.auth.clone());
    Harness { transport, state, auth }
}

fn credentials() -> LoginRequest {
    LoginRequest { username: "anna".into(), password: "secret".into() }
}

fn registration(password: &str, repeat_password: &str) -> RegisterRequest {
    RegisterRequest {
        username: "anna".into(),
        email: "anna@example.test".into(),
        password: password.into(),
        repeat_password: repeat_password.into(),
    }
}

// =============================================================================
// into_result
// =============================================================================

#[test]
fn into_result_prefers_fields_over_message() {
    let resp: ApiResponse<Value> = serde_json::from_value(json!({
        "success": false,
        "error": {"message": "Validation error", "fields": {"username": "required"}}
    }))
    .unwrap();
    let err = into_result(resp).unwrap_err();
    assert_eq!(err.field_errors().unwrap(), &FieldErrors::from([("username".into(), "required".into())]));
}

#[test]
fn into_result_empty_fields_is_general() {
    let resp: ApiResponse<Value> =
        serde_json::from_value(json!({"success": false, "error": {"message": "Account locked", "fields": {}}}))
            .unwrap();
    assert!(matches!(into_result(resp), Err(AuthError::General(m)) if m == "Account locked"));
}

#[test]
fn into_result_missing_error_is_general_empty() {
    let resp: ApiResponse<Value> = serde_json::from_value(json!({"success": false})).unwrap();
    assert!(matches!(into_result(resp), Err(AuthError::General(m)) if m.is_empty()));
}

#[test]
fn gateway_errors_map_to_auth_errors() {
    assert!(matches!(AuthError::from(GatewayError::Unauthorized), AuthError::Unauthorized));
    assert!(matches!(AuthError::from(GatewayError::ForgeryCheckFailed), AuthError::ForgeryCheckFailed));
    assert!(matches!(AuthError::from(GatewayError::Server { status: 503 }), AuthError::Server { status: 503 }));
    let transport = crate::net::transport::TransportError::Request("refused".into());
    assert!(matches!(AuthError::from(GatewayError::Transport(transport)), AuthError::Network(_)));
    assert!(AuthError::Unauthorized.requires_reauth());
    assert!(!AuthError::General("x".into()).requires_reauth());
}

#[test]
fn fields_error_display_lists_fields() {
    let err = AuthError::field("repeat_password", PASSWORDS_DO_NOT_MATCH);
    assert_eq!(err.to_string(), "validation failed: repeat_password: Passwords do not match");
}

// =============================================================================
// login
// =============================================================================

#[tokio::test]
async fn login_success_stores_token_and_raises_flag() {
    let h = harness(None);
    let mut events = h.auth.events();
    h.transport.respond(200, json!({"success": true, "data": {"csrf_token": "abc"}}));

    h.auth.login(&credentials()).await.unwrap();

    assert_eq!(h.state.token().unwrap().as_deref(), Some("abc"));
    assert!(h.auth.is_authenticated());
    assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedIn);

    let req = &h.transport.requests()[0];
    assert!(req.url.ends_with("/api/v1/auth/login/"));
    assert!(req.headers.get("x-csrf-token").is_none());
    let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
    assert_eq!(body, json!({"username": "anna", "password": "secret"}));
}

#[tokio::test]
async fn login_does_not_send_existing_token() {
    let h = harness(Some("old"));
    h.transport.respond(200, json!({"success": true, "data": {"csrf_token": "new"}}));

    h.auth.login(&credentials()).await.unwrap();

    assert!(h.transport.requests()[0].headers.get("x-csrf-token").is_none());
    assert_eq!(h.state.token().unwrap().as_deref(), Some("new"));
}

#[tokio::test]
async fn login_success_without_token_still_authenticates() {
    let h = harness(None);
    h.transport.respond(200, json!({"success": true, "data": {}}));

    h.auth.login(&credentials()).await.unwrap();

    assert!(h.auth.is_authenticated());
    assert!(h.state.token().unwrap().is_none());
}

#[tokio::test]
async fn login_field_errors_leave_flag() {
    let h = harness(None);
    h.transport.respond(
        400,
        json!({"success": false, "error": {"message": "Validation", "fields": {"password": "too short"}}}),
    );

    let err = h.auth.login(&credentials()).await.unwrap_err();

    assert_eq!(err.field_errors().unwrap()["password"], "too short");
    assert!(!h.auth.is_authenticated());
}

#[tokio::test]
async fn login_general_error_carries_message() {
    let h = harness(None);
    h.transport.respond(400, json!({"success": false, "error": {"message": "Invalid credentials"}}));

    let err = h.auth.login(&credentials()).await.unwrap_err();
    assert!(matches!(err, AuthError::General(ref m) if m == "Invalid credentials"));
    assert!(!h.auth.is_authenticated());
}

#[tokio::test]
async fn login_network_failure_is_network_error() {
    let h = harness(None);
    h.transport.fail("connection refused");

    let err = h.auth.login(&credentials()).await.unwrap_err();
    assert!(matches!(err, AuthError::Network(_)));
}

// =============================================================================
// register
// =============================================================================

#[tokio::test]
async fn register_mismatch_short_circuits() {
    let h = harness(None);

    let err = h.auth.register(&registration("one", "two")).await.unwrap_err();

    assert_eq!(err.field_errors().unwrap()[REPEAT_PASSWORD_FIELD], PASSWORDS_DO_NOT_MATCH);
    assert_eq!(h.transport.request_count(), 0);
}

#[tokio::test]
async fn register_success_does_not_authenticate() {
    let h = harness(None);
    h.transport.respond(201, json!({"success": true, "data": {"id": 9}}));

    h.auth.register(&registration("pw", "pw")).await.unwrap();

    assert!(!h.auth.is_authenticated());
    let req = &h.transport.requests()[0];
    assert!(req.url.ends_with("/api/v1/auth/register/"));
    assert!(req.headers.get("x-csrf-token").is_none());
}

#[tokio::test]
async fn register_returns_backend_fields() {
    let h = harness(None);
    h.transport.respond(
        400,
        json!({"success": false, "error": {"message": "x", "fields": {"email": "already used", "username": "taken"}}}),
    );

    let err = h.auth.register(&registration("pw", "pw")).await.unwrap_err();
    let fields = err.field_errors().unwrap();
    assert_eq!(fields.len(), 2);
    assert_eq!(fields["email"], "already used");
}

// =============================================================================
// logout
// =============================================================================

#[tokio::test]
async fn logout_sends_token_and_clears() {
    let h = harness(Some("abc"));
    let mut events = h.auth.events();
    h.transport.respond(200, json!({"success": true}));

    h.auth.logout().await.unwrap();

    assert_eq!(h.transport.requests()[0].headers.get("x-csrf-token").unwrap(), "abc");
    assert!(h.state.token().unwrap().is_none());
    assert!(!h.auth.is_authenticated());
    assert_eq!(events.recv().await.unwrap(), SessionEvent::LoggedOut);
}

#[tokio::test]
async fn logout_clears_even_when_network_fails() {
    let h = harness(Some("abc"));
    h.transport.fail("connection reset");

    let err = h.auth.logout().await.unwrap_err();

    assert!(matches!(err, AuthError::Network(_)));
    assert!(h.state.token().unwrap().is_none());
    assert!(!h.auth.is_authenticated());
}

#[tokio::test]
async fn logout_clears_even_when_backend_refuses() {
    let h = harness(Some("abc"));
    h.transport.respond(400, json!({"success": false, "error": {"message": "already logged out"}}));

    assert!(h.auth.logout().await.is_err());
    assert!(h.state.token().unwrap().is_none());
    assert!(!h.auth.is_authenticated());
}

// =============================================================================
// other flows
// =============================================================================

#[tokio::test]
async fn refresh_stores_rotated_token() {
    let h = harness(Some("old"));
    h.transport.respond(200, json!({"success": true, "data": {"csrf_token": "new"}}));

    h.auth.refresh().await.unwrap();

    assert_eq!(h.transport.requests()[0].headers.get("x-csrf-token").unwrap(), "old");
    assert_eq!(h.state.token().unwrap().as_deref(), Some("new"));
    assert!(h.auth.is_authenticated());
}

#[tokio::test]
async fn refresh_unauthorized_drops_session() {
    let h = harness(Some("old"));
    let mut events = h.auth.events();
    h.transport.respond(401, json!({"success": false}));

    let err = h.auth.refresh().await.unwrap_err();

    assert!(err.requires_reauth());
    assert!(!h.auth.is_authenticated());
    assert_eq!(
        events.recv().await.unwrap(),
        SessionEvent::Redirect { to: Route::Auth, reason: InvalidationReason::Unauthorized }
    );
}

#[tokio::test]
async fn confirm_registration_posts_token() {
    let h = harness(None);
    h.transport.respond(200, json!({"success": true}));

    h.auth.confirm_registration("confirm-123").await.unwrap();

    let req = &h.transport.requests()[0];
    assert!(req.url.ends_with("/api/v1/auth/register-confirm/"));
    assert_eq!(req.body.as_deref(), Some(r#"{"token":"confirm-123"}"#));
}

#[tokio::test]
async fn forgot_password_posts_email() {
    let h = harness(None);
    h.transport.respond(200, json!({"success": true}));

    h.auth.forgot_password("anna@example.test").await.unwrap();

    let req = &h.transport.requests()[0];
    assert!(req.url.ends_with("/api/v1/auth/forgot/"));
    assert_eq!(req.body.as_deref(), Some(r#"{"email":"anna@example.test"}"#));
}

#[tokio::test]
async fn reset_password_mismatch_short_circuits() {
    let h = harness(None);
    let data = ResetPasswordRequest { token: "t".into(), password: "a".into(), repeat_password: "b".into() };

    let err = h.auth.reset_password(&data).await.unwrap_err();

    assert!(err.field_errors().unwrap().contains_key(REPEAT_PASSWORD_FIELD));
    assert_eq!(h.transport.request_count(), 0);
}

#[tokio::test]
async fn reset_password_reports_general_error() {
    let h = harness(None);
    h.transport.respond(400, json!({"success": false, "error": {"message": "Token expired"}}));
    let data = ResetPasswordRequest { token: "t".into(), password: "a".into(), repeat_password: "a".into() };

    let err = h.auth.reset_password(&data).await.unwrap_err();
    assert_eq!(err.to_string(), "Token expired");
}

#[tokio::test]
async fn watch_tracks_login_and_logout() {
    let h = harness(None);
    let rx = h.auth.watch();
    h.transport.respond(200, json!({"success": true, "data": {"csrf_token": "abc"}}));
    h.transport.respond(200, json!({"success": true}));

    h.auth.login(&credentials()).await.unwrap();
    assert!(*rx.borrow());
    h.auth.logout().await.unwrap();
    assert!(!*rx.borrow());
}
