use ph_shoes_client::auth::TokenRequestOptions;
use ph_shoes_client::error::Error;
use ph_shoes_client::PhShoes;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> PhShoes {
    let uri = server.uri();
    PhShoes::new(&uri, &uri, &uri)
}

#[tokio::test]
async fn login_accepts_any_token_spelling_and_persists_it() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "legacy-spelling-token"
        })))
        .mount(&mock_server)
        .await;

    let shoes = client_for(&mock_server);
    let result = shoes.accounts().login("test@example.com", "password123").await;

    assert!(result.is_ok());
    assert_eq!(shoes.tokens().get().as_deref(), Some("legacy-spelling-token"));
}

#[tokio::test]
async fn login_without_a_token_in_the_response_is_an_auth_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "welcome"
        })))
        .mount(&mock_server)
        .await;

    let shoes = client_for(&mock_server);
    let err = shoes
        .accounts()
        .login("test@example.com", "password123")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Auth(_)));
    assert_eq!(err.user_message(), "No access token returned by server.");
    assert!(shoes.tokens().get().is_none());
}

#[tokio::test]
async fn logout_clears_the_token_even_when_the_backend_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let shoes = client_for(&mock_server);
    shoes.tokens().save("stale-token");

    let result = shoes.accounts().logout().await;

    assert!(result.is_err());
    assert!(shoes.tokens().get().is_none());
}

#[tokio::test]
async fn unsubscribe_sends_the_token_in_query_and_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/user-accounts/unsubscribe"))
        .and(query_param("token", "sup-token"))
        .and(header("X-Unsubscribe-Token", "sup-token"))
        .and(header("List-Unsubscribe-Post", "List-Unsubscribe=One-Click"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "unsubscribeToken": "rotated-token"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let shoes = client_for(&mock_server);
    let rotated = shoes
        .accounts()
        .unsubscribe(
            Some("sup-token"),
            TokenRequestOptions {
                allow_unauthenticated: true,
                use_auth_token_fallback: false,
            },
        )
        .await
        .unwrap();

    assert_eq!(rotated.as_deref(), Some("rotated-token"));
}

#[tokio::test]
async fn unsubscribe_without_any_token_fails_before_any_request() {
    let mock_server = MockServer::start().await;
    let shoes = client_for(&mock_server);

    let err = shoes
        .accounts()
        .unsubscribe(None, TokenRequestOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::MissingToken(_)));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unsubscribe_falls_back_to_the_stored_auth_token() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/user-accounts/unsubscribe"))
        .and(query_param("token", "bearer-as-suppression"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let shoes = client_for(&mock_server);
    shoes.tokens().save("bearer-as-suppression");

    let result = shoes
        .accounts()
        .unsubscribe(
            None,
            TokenRequestOptions {
                allow_unauthenticated: false,
                use_auth_token_fallback: true,
            },
        )
        .await;

    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn resubscribing_an_unsuppressed_address_is_a_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/user-accounts/subscribe"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": "suppression.notFound"
        })))
        .mount(&mock_server)
        .await;

    let shoes = client_for(&mock_server);
    let result = shoes
        .accounts()
        .subscribe(
            Some("sup-token"),
            TokenRequestOptions {
                allow_unauthenticated: true,
                use_auth_token_fallback: false,
            },
        )
        .await;

    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn unsubscribe_swallows_transport_failures_via_the_redirect_fallback() {
    // Nothing listens on this port, so both the POST and the fallback GET
    // fail in transit; the caller still gets a success.
    let shoes = PhShoes::new(
        "http://127.0.0.1:9",
        "http://127.0.0.1:9",
        "http://127.0.0.1:9",
    );

    let result = shoes
        .accounts()
        .unsubscribe(
            Some("sup-token"),
            TokenRequestOptions {
                allow_unauthenticated: true,
                use_auth_token_fallback: false,
            },
        )
        .await;

    assert!(matches!(result, Ok(None)));
}

#[tokio::test]
async fn settings_rejection_maps_to_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/user-accounts/settings"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "error.token.expired"
        })))
        .mount(&mock_server)
        .await;

    let shoes = client_for(&mock_server);
    shoes.tokens().save("dead-token");

    let err = shoes.accounts().email_preferences().await.unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
    assert_eq!(
        err.user_message(),
        "We could not find your account. Please refresh or sign in again."
    );
}

#[tokio::test]
async fn email_preferences_digs_the_flag_and_token_out_of_the_settings() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/user-accounts/settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Notification_Email_Preferences": {
                "Email_Notifications": false,
                "unsubscribeToken": "tok-123"
            }
        })))
        .mount(&mock_server)
        .await;

    let shoes = client_for(&mock_server);
    shoes.tokens().save("some-token");

    let prefs = shoes.accounts().email_preferences().await.unwrap();
    assert!(!prefs.email_subscribed);
    assert_eq!(prefs.unsubscribe_token.as_deref(), Some("tok-123"));
}

#[tokio::test]
async fn validation_errors_flatten_into_field_messages() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v1/user-accounts"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "status": 400,
            "errors": {
                "email": ["Email address is not valid."]
            }
        })))
        .mount(&mock_server)
        .await;

    let shoes = client_for(&mock_server);
    let err = shoes
        .accounts()
        .register(&ph_shoes_client::auth::RegisterRequest {
            email: "nope".to_string(),
            password: "password123".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Email address is not valid.");
    assert_eq!(
        err.field_errors().get("email").map(String::as_str),
        Some("Email address is not valid.")
    );
}

#[tokio::test]
async fn machine_codes_never_reach_the_user() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/user-accounts/subscription-status"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": "error.suppression.lookup_failed"
        })))
        .mount(&mock_server)
        .await;

    let shoes = client_for(&mock_server);
    let err = shoes
        .accounts()
        .subscription_status("test@example.com")
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "Something went wrong. Please try again.");
}

#[tokio::test]
async fn subscription_status_accepts_both_suppressed_spellings() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/user-accounts/subscription-status"))
        .and(query_param("email", "test@example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "email": "test@example.com",
            "isSuppressed": true
        })))
        .mount(&mock_server)
        .await;

    let shoes = client_for(&mock_server);
    let status = shoes
        .accounts()
        .subscription_status("  test@example.com  ")
        .await
        .unwrap();

    assert!(status.suppressed);
    assert_eq!(status.email, "test@example.com");
}
