mod common;

use std::sync::Arc;

use auth::PasswordScheme;
use common::location;
use common::LogCapture;
use common::FailingDeleteStore;
use common::ScriptedIdentityProvider;
use common::TestApp;
use common::GOOGLE_CODE_PREFIX;
use reqwest::header;
use reqwest::StatusCode;
use secrets_service::domain::user::models::Credentials;
use secrets_service::domain::user::models::Provider;
use secrets_service::domain::user::ports::IdentityProvider;
use secrets_service::domain::user::ports::UserServicePort;
use secrets_service::domain::user::service::UserService;
use secrets_service::repositories::InMemoryUserRepository;

fn assert_redirect(response: &reqwest::Response, to: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(response), to);
}

fn assert_no_cache(response: &reqwest::Response) {
    let headers = response.headers();
    assert_eq!(
        headers[header::CACHE_CONTROL],
        "private, no-cache, no-store, must-revalidate"
    );
    assert_eq!(headers[header::EXPIRES], "-1");
    assert_eq!(headers[header::PRAGMA], "no-cache");
}

#[tokio::test]
async fn test_public_pages_render() {
    let app = TestApp::spawn().await;

    for path in ["/", "/register", "/login"] {
        let response = app.get(path).send().await.expect("Failed to execute request");
        assert_eq!(response.status(), StatusCode::OK, "GET {}", path);

        let body = response.text().await.unwrap();
        assert!(body.contains("<html"), "GET {}", path);
    }
}

#[tokio::test]
async fn test_unknown_path_renders_not_found_page() {
    let app = TestApp::spawn().await;

    let response = app.get("/nope").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.text().await.unwrap().contains("404"));
}

#[tokio::test]
async fn test_register_secrets_logout_flow() {
    let app = TestApp::spawn().await;

    let response = app.register("a@b.com", "hunter2").await;
    assert_redirect(&response, "/secrets");

    let response = app.get("/secrets").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_no_cache(&response);
    assert!(response.text().await.unwrap().contains("Log Out"));

    let response = app.logout().await;
    assert_redirect(&response, "/");

    let response = app.get("/secrets").send().await.unwrap();
    assert_redirect(&response, "/login");
}

#[tokio::test]
async fn test_secrets_requires_session() {
    let app = TestApp::spawn().await;

    let response = app.get("/secrets").send().await.unwrap();
    assert_redirect(&response, "/login");
    assert_no_cache(&response);
}

#[tokio::test]
async fn test_old_cookie_rejected_after_logout() {
    let app = TestApp::spawn().await;

    app.register("a@b.com", "hunter2").await;
    let cookie = app.cookie_header().expect("No session cookie issued");

    app.logout().await;

    let response = TestApp::anonymous_client()
        .get(app.url("/secrets"))
        .header(header::COOKIE, cookie)
        .send()
        .await
        .unwrap();

    assert_redirect(&response, "/login");
    assert_no_cache(&response);
}

#[tokio::test]
async fn test_logout_store_failure_renders_error_page() {
    // Login cycles the session id, which spends the one allowed delete.
    let app = TestApp::spawn_with_store(PasswordScheme::Argon2, FailingDeleteStore::new(1)).await;

    let response = app.register("a@b.com", "hunter2").await;
    assert_redirect(&response, "/secrets");

    let response = app.logout().await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_login_issues_fresh_session_id() {
    let app = TestApp::spawn().await;

    app.get("/auth/google").send().await.unwrap();
    let before = app.cookie_header().expect("No session cookie issued");

    let response = app.google_sign_in("1234567890").await;
    assert_redirect(&response, "/secrets");
    let after = app.cookie_header().expect("No session cookie issued");

    assert_ne!(before, after);
}

#[tokio::test]
async fn test_request_log_omits_query_string() {
    let logs = LogCapture::default();
    let _guard = tracing::subscriber::set_default(logs.subscriber());
    let app = TestApp::spawn().await;

    let response = app.google_sign_in("1234567890").await;
    assert_redirect(&response, "/secrets");

    let output = logs.contents();
    assert!(output.contains("path=/auth/google/secrets"));
    assert!(!output.contains(GOOGLE_CODE_PREFIX));
    assert!(!output.contains("state=state-"));
}

#[tokio::test]
async fn test_session_cookie_is_http_only() {
    let app = TestApp::spawn().await;

    let response = app.register("a@b.com", "hunter2").await;
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("No session cookie issued")
        .to_str()
        .unwrap();

    assert!(set_cookie.starts_with("secrets.sid="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
}

#[tokio::test]
async fn test_login_after_register() {
    let app = TestApp::spawn().await;

    app.register("a@b.com", "hunter2").await;
    app.logout().await;

    let response = app.login("a@b.com", "hunter2").await;
    assert_redirect(&response, "/secrets");

    let response = app.get("/secrets").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_login_failures_redirect_to_login() {
    let app = TestApp::spawn().await;
    app.register("a@b.com", "hunter2").await;
    app.logout().await;

    let wrong_password = app.login("a@b.com", "hunter3").await;
    assert_redirect(&wrong_password, "/login");

    let unknown_user = app.login("nobody@b.com", "hunter2").await;
    assert_redirect(&unknown_user, "/login");

    let response = app.get("/secrets").send().await.unwrap();
    assert_redirect(&response, "/login");
}

#[tokio::test]
async fn test_duplicate_registration_redirects_to_register() {
    let app = TestApp::spawn().await;

    app.register("a@b.com", "hunter2").await;
    app.logout().await;

    let response = app.register("a@b.com", "other").await;
    assert_redirect(&response, "/register");
    assert_eq!(app.repository.len().await, 1);

    // The first password still works.
    let response = app.login("a@b.com", "hunter2").await;
    assert_redirect(&response, "/secrets");
}

#[tokio::test]
async fn test_invalid_registration_redirects_to_register() {
    let app = TestApp::spawn().await;

    let not_an_email = app.register("plainname", "hunter2").await;
    assert_redirect(&not_an_email, "/register");

    let empty_password = app.register("a@b.com", "").await;
    assert_redirect(&empty_password, "/register");

    assert!(app.repository.is_empty().await);
}

#[tokio::test]
async fn test_plaintext_scheme_stores_password_verbatim() {
    let app = TestApp::spawn_with(PasswordScheme::Plaintext).await;

    app.register("a@b.com", "hunter2").await;

    let user = app.stored_user("a@b.com").await;
    assert_eq!(user.password.as_deref(), Some("hunter2"));
    assert_eq!(user.provider, Provider::Local);
    assert_eq!(user.email.unwrap().as_str(), "a@b.com");
}

#[tokio::test]
async fn test_md5_scheme_identical_passwords_identical_digests() {
    let app = TestApp::spawn_with(PasswordScheme::Md5).await;

    app.register("a@b.com", "hunter2").await;
    app.logout().await;
    app.register("c@d.com", "hunter2").await;

    let first = app.stored_user("a@b.com").await;
    let second = app.stored_user("c@d.com").await;

    assert_eq!(
        first.password.as_deref(),
        Some("2ab96390c7dbe3439de74d0c9b0b1767")
    );
    assert_eq!(first.password, second.password);
}

#[tokio::test]
async fn test_encrypted_scheme_never_stores_plaintext() {
    let app = TestApp::spawn_with(PasswordScheme::Encrypted).await;

    app.register("a@b.com", "hunter2").await;
    app.logout().await;

    let user = app.stored_user("a@b.com").await;
    assert_ne!(user.password.as_deref(), Some("hunter2"));

    let response = app.login("a@b.com", "hunter2").await;
    assert_redirect(&response, "/secrets");
}

#[tokio::test]
async fn test_argon2_scheme_round_trip() {
    let app = TestApp::spawn().await;

    app.register("a@b.com", "hunter2").await;
    app.logout().await;

    let user = app.stored_user("a@b.com").await;
    assert!(user.password.unwrap().starts_with("$argon2id$"));

    let response = app.login("a@b.com", "hunter2").await;
    assert_redirect(&response, "/secrets");
}

#[tokio::test]
async fn test_google_begin_redirects_to_provider() {
    let app = TestApp::spawn().await;

    let response = app.get("/auth/google").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("https://accounts.example.test/"));
}

#[tokio::test]
async fn test_google_first_and_second_login_share_one_record() {
    let app = TestApp::spawn().await;

    let response = app.google_sign_in("1234567890").await;
    assert_redirect(&response, "/secrets");

    let response = app.get("/secrets").send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let first = app.stored_user("1234567890").await;
    assert_eq!(first.provider, Provider::Google);
    assert!(first.password.is_none());
    assert_eq!(first.email.unwrap().as_str(), "1234567890@example.com");

    app.logout().await;

    let response = app.google_sign_in("1234567890").await;
    assert_redirect(&response, "/secrets");

    let second = app.stored_user("1234567890").await;
    assert_eq!(first.id, second.id);
    assert_eq!(app.repository.len().await, 1);
}

#[tokio::test]
async fn test_google_state_mismatch_redirects_to_login() {
    let app = TestApp::spawn().await;

    app.get("/auth/google").send().await.unwrap();

    let response = app
        .get(&format!(
            "/auth/google/secrets?code={}1234567890&state=forged",
            GOOGLE_CODE_PREFIX
        ))
        .send()
        .await
        .unwrap();

    assert_redirect(&response, "/login");
    assert!(app.repository.is_empty().await);
}

#[tokio::test]
async fn test_google_callback_without_pending_request() {
    let app = TestApp::spawn().await;

    let response = app
        .get(&format!(
            "/auth/google/secrets?code={}1234567890&state=state-0",
            GOOGLE_CODE_PREFIX
        ))
        .send()
        .await
        .unwrap();

    assert_redirect(&response, "/login");
}

#[tokio::test]
async fn test_google_provider_error_redirects_to_login() {
    let app = TestApp::spawn().await;

    app.get("/auth/google").send().await.unwrap();

    let response = app
        .get("/auth/google/secrets?error=access_denied&state=state-0")
        .send()
        .await
        .unwrap();

    assert_redirect(&response, "/login");
}

#[tokio::test]
async fn test_google_state_is_single_use() {
    let app = TestApp::spawn().await;

    let begin = app.get("/auth/google").send().await.unwrap();
    let authorize_url = location(&begin).to_string();
    let state = reqwest::Url::parse(&authorize_url)
        .unwrap()
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .unwrap();
    let callback = format!(
        "/auth/google/secrets?code={}1234567890&state={}",
        GOOGLE_CODE_PREFIX, state
    );

    let response = app.get(&callback).send().await.unwrap();
    assert_redirect(&response, "/secrets");
    app.logout().await;

    let replay = app.get(&callback).send().await.unwrap();
    assert_redirect(&replay, "/login");
}

#[tokio::test]
async fn test_google_bad_code_redirects_to_login() {
    let app = TestApp::spawn().await;

    let begin = app.get("/auth/google").send().await.unwrap();
    let state = reqwest::Url::parse(location(&begin))
        .unwrap()
        .query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .unwrap();

    let response = app
        .get(&format!("/auth/google/secrets?code=garbage&state={}", state))
        .send()
        .await
        .unwrap();

    assert_redirect(&response, "/login");
    assert!(app.repository.is_empty().await);
}

#[tokio::test]
async fn test_local_login_cannot_use_google_account() {
    let app = TestApp::spawn().await;

    app.google_sign_in("1234567890").await;
    app.logout().await;

    let response = app.login("1234567890", "").await;
    assert_redirect(&response, "/login");
}

#[tokio::test]
async fn test_concurrent_first_federated_logins_create_one_record() {
    let repository = Arc::new(InMemoryUserRepository::new());
    let identity_provider = Arc::new(ScriptedIdentityProvider::default());
    let pkce_verifier = identity_provider
        .authorization_request()
        .unwrap()
        .pkce_verifier;
    let service = Arc::new(UserService::new(
        Arc::clone(&repository),
        identity_provider,
        Arc::new(auth::Authenticator::default()),
    ));

    let logins = (0..16).map(|_| {
        let service = Arc::clone(&service);
        let credentials = Credentials::Google {
            code: format!("{}1234567890", GOOGLE_CODE_PREFIX),
            pkce_verifier: pkce_verifier.clone(),
        };
        tokio::spawn(async move { service.authenticate(credentials).await })
    });

    let users: Vec<_> = futures::future::join_all(logins)
        .await
        .into_iter()
        .map(|joined| joined.unwrap().unwrap())
        .collect();

    assert_eq!(repository.len().await, 1);
    assert!(users.iter().all(|user| user.id == users[0].id));
}
