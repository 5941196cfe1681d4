use agrodrone_auth::{AuthClient, AuthError, AuthEvent};
use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn session_body(access_token: &str) -> serde_json::Value {
    json!({
        "access_token": access_token,
        "token_type": "bearer",
        "expires_in": 3600,
        "refresh_token": "test_refresh_token",
        "user": {
            "id": "test_user_id",
            "email": "test@example.com"
        }
    })
}

#[tokio::test]
async fn test_sign_up() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/signup"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("test_access_token")))
        .mount(&mock_server)
        .await;

    let auth_client = AuthClient::new(&mock_server.uri(), "test_anon_key", Client::new());

    let result = auth_client.sign_up("test@example.com", "password123").await;

    assert!(result.is_ok());
    if let Ok(session) = result {
        assert_eq!(session.access_token, "test_access_token");
        assert_eq!(session.user.id, "test_user_id");
        assert_eq!(session.user.email, Some("test@example.com".to_string()));
    }
}

#[tokio::test]
async fn test_sign_in_with_password() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("test_access_token")))
        .mount(&mock_server)
        .await;

    let auth_client = AuthClient::new(&mock_server.uri(), "test_anon_key", Client::new());

    let result = auth_client
        .sign_in_with_password("test@example.com", "password123")
        .await;

    assert!(result.is_ok());
    assert_eq!(
        auth_client.current_identity().map(|u| u.id),
        Some("test_user_id".to_string())
    );
}

#[tokio::test]
async fn test_sign_in_emits_signed_in_event() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("test_access_token")))
        .mount(&mock_server)
        .await;

    let auth_client = AuthClient::new(&mock_server.uri(), "test_anon_key", Client::new());
    let mut events = auth_client.on_auth_state_change();

    auth_client
        .sign_in_with_password("test@example.com", "password123")
        .await
        .unwrap();

    match events.recv().await.unwrap() {
        AuthEvent::SignedIn(identity) => assert_eq!(identity.id, "test_user_id"),
        other => panic!("expected SignedIn, got {:?}", other),
    }
}

#[tokio::test]
async fn test_bad_credentials_surface_provider_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"error": "invalid_grant", "error_description": "Invalid login credentials"})),
        )
        .mount(&mock_server)
        .await;

    let auth_client = AuthClient::new(&mock_server.uri(), "test_anon_key", Client::new());

    let err = auth_client
        .sign_in_with_password("test@example.com", "wrong")
        .await
        .unwrap_err();
    match err {
        AuthError::Api(message) => assert!(message.contains("Invalid login credentials")),
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_password_recovery() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/recover"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let auth_client = AuthClient::new(&mock_server.uri(), "test_anon_key", Client::new());

    assert!(auth_client
        .reset_password_for_email("test@example.com")
        .await
        .is_ok());
}

#[tokio::test]
async fn test_sign_out_clears_session_and_emits_event() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(session_body("test_access_token")))
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let auth_client = AuthClient::new(&mock_server.uri(), "test_anon_key", Client::new());
    auth_client
        .sign_in_with_password("test@example.com", "password123")
        .await
        .unwrap();
    let mut events = auth_client.on_auth_state_change();

    auth_client.sign_out().await.unwrap();

    assert!(auth_client.current_session().is_none());
    assert!(matches!(events.recv().await.unwrap(), AuthEvent::SignedOut));
}

#[tokio::test]
async fn test_sign_out_without_session_is_missing_session() {
    let auth_client = AuthClient::new("http://localhost:9", "test_anon_key", Client::new());
    assert!(matches!(
        auth_client.sign_out().await,
        Err(AuthError::MissingSession)
    ));
}
