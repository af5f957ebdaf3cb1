//! Signup, Google sign-in and gallery views against a mock API server.

use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use animoji_core::api::{ApiClient, ApiError};
use animoji_core::auth::{MemoryStore, NavigationMode, RecordingNavigator, Route, SessionManager};
use animoji_core::validation::ValidationError;
use animoji_core::views::{
    GalleryView, GoogleLoginView, RecordingNotifier, SignupView, ViewContext, ViewError,
};

fn jwt(username: &str) -> String {
    let payload = URL_SAFE_NO_PAD.encode(json!({ "username": username }).to_string());
    format!("eyJhbGciOiJIUzI1NiJ9.{}.sig", payload)
}

fn image_json(id: &str, prompt: &str, likes: i64) -> Value {
    json!({
        "id": id,
        "prompt": prompt,
        "url": format!("https://picsum.photos/seed/{}/400/400", id),
        "likes": likes,
        "created_at": "2024-11-02T10:15:00Z",
        "is_suggested": false,
        "suggested_animal": null,
        "original_input": prompt,
    })
}

struct Harness {
    ctx: ViewContext,
    session: Arc<SessionManager>,
    navigator: Arc<RecordingNavigator>,
    notifier: Arc<RecordingNotifier>,
}

fn harness(server: &MockServer) -> Harness {
    let navigator = Arc::new(RecordingNavigator::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let session = Arc::new(SessionManager::new(MemoryStore::new(), navigator.clone()));
    let api = ApiClient::new(&server.uri())
        .expect("client")
        .with_initial_backoff(Duration::from_millis(1));
    let ctx = ViewContext::new(session.clone(), api, navigator.clone(), notifier.clone());
    Harness {
        ctx,
        session,
        navigator,
        notifier,
    }
}

// ── Signup ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn signup_logs_in_and_goes_home() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .and(body_partial_json(json!({"username": "fox"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 2, "username": "fox", "token": jwt("fox"),
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    let view = SignupView::new(h.ctx.clone());
    let name = view.submit("fox", "secret1", "secret1").await.expect("signup");

    assert_eq!(name, "fox");
    assert!(h.session.is_authenticated());
    assert_eq!(h.navigator.last(), Some((Route::Home, NavigationMode::Soft)));
    assert_eq!(
        h.notifier.last().map(|n| n.message),
        Some("Successfully signed up!".to_string())
    );
}

#[tokio::test]
async fn signup_with_taken_username() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .respond_with(
            ResponseTemplate::new(409).set_body_json(json!({"detail": "Username is already taken"})),
        )
        .mount(&server)
        .await;

    let h = harness(&server);
    let view = SignupView::new(h.ctx.clone());
    let err = view.submit("fox", "secret1", "secret1").await.expect_err("conflict");

    assert!(matches!(err, ViewError::Validation(ValidationError::UsernameTaken)));
    assert_eq!(h.notifier.errors(), vec!["Username is already taken".to_string()]);
    assert!(!h.session.is_authenticated());
    assert!(h.navigator.history().is_empty());
}

#[tokio::test]
async fn signup_password_mismatch_is_local() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server);
    let view = SignupView::new(h.ctx.clone());
    let err = view.submit("fox", "secret1", "secret2").await.expect_err("mismatch");
    assert!(matches!(err, ViewError::Validation(ValidationError::PasswordMismatch)));
    assert_eq!(h.notifier.errors(), vec!["Passwords do not match".to_string()]);
}

#[tokio::test]
async fn username_availability() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/check-username"))
        .and(query_param("username", "taken"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"detail": "Username is already taken"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/check-username"))
        .and(query_param("username", "free"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"available": true})))
        .mount(&server)
        .await;

    let h = harness(&server);
    let view = SignupView::new(h.ctx.clone());
    assert!(view.check_username("free").await.expect("check"));
    assert!(!view.check_username("taken").await.expect("check"));
    assert!(!view.check_username("  ").await.expect("blank is never available"));
    assert_eq!(h.notifier.errors(), vec!["Username is already taken".to_string()]);
}

#[tokio::test]
async fn blank_username_is_reported_before_checking() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/check-username"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server);
    let view = SignupView::new(h.ctx.clone());
    let err = view.validate_username("   ").expect_err("blank");

    assert!(matches!(err, ViewError::Validation(ValidationError::MissingCredentials)));
    assert_eq!(h.notifier.errors(), vec!["Username and password required".to_string()]);
    assert!(view.validate_username("fox").is_ok());
}

// ── Google ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn google_login_hard_reloads_home() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/google"))
        .and(body_partial_json(json!({"token": "google-id-token"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": jwt("owl"), "token_type": "bearer",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    let view = GoogleLoginView::new(h.ctx.clone());
    assert_eq!(view.submit("google-id-token").await.expect("google"), "owl");
    assert_eq!(h.session.username().as_deref(), Some("owl"));
    assert_eq!(h.navigator.history(), vec![(Route::Home, NavigationMode::Hard)]);
}

#[tokio::test]
async fn google_failure_does_not_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/google"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid Google token"})))
        .mount(&server)
        .await;

    let h = harness(&server);
    let view = GoogleLoginView::new(h.ctx.clone());
    assert!(view.submit("bad").await.is_err());
    assert!(view.submit("").await.is_err());

    assert!(!h.session.is_authenticated());
    assert!(h.navigator.history().is_empty());
    assert_eq!(
        h.notifier.errors(),
        vec![
            "Invalid Google token".to_string(),
            "Google login failed: No credential received".to_string(),
        ]
    );
}

// ── Gallery ────────────────────────────────────────────────────────────

#[tokio::test]
async fn gallery_requires_session() {
    let server = MockServer::start().await;
    let h = harness(&server);
    let mut gallery = GalleryView::new(h.ctx.clone());

    assert!(!gallery.open().await.expect("open"));
    assert_eq!(h.navigator.history(), vec![(Route::Login, NavigationMode::Soft)]);
}

#[tokio::test]
async fn gallery_lists_with_bearer_token() {
    let server = MockServer::start().await;
    let token = jwt("test");
    Mock::given(method("GET"))
        .and(path("/images"))
        .and(header("Authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            image_json("b", "cat", 2),
            image_json("a", "dog", 0),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    h.session.login(&token).expect("token");
    let mut gallery = GalleryView::new(h.ctx.clone());

    assert!(gallery.open().await.expect("open"));
    assert_eq!(gallery.images().len(), 2);
    assert_eq!(gallery.images()[0].prompt, "cat");
}

#[tokio::test]
async fn generate_saves_and_reloads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/images/generate"))
        .and(body_partial_json(json!({"prompt": "fox"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(image_json("n1", "fox", 0)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/images"))
        .and(body_partial_json(json!({"id": "n1", "original_input": "Fox", "likes": 0})))
        .respond_with(ResponseTemplate::new(200).set_body_json(image_json("n1", "fox", 0)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([image_json("n1", "fox", 0)])))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness(&server);
    h.session.login(&jwt("test")).expect("token");
    let mut gallery = GalleryView::new(h.ctx.clone());

    let saved = gallery.generate(" Fox ").await.expect("generate");
    assert_eq!(saved.id, "n1");
    assert_eq!(gallery.images().len(), 1);
}

#[tokio::test]
async fn generate_rejects_unknown_animal() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/images/generate"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let h = harness(&server);
    h.session.login(&jwt("test")).expect("token");
    let mut gallery = GalleryView::new(h.ctx.clone());

    let err = gallery.generate("dragon").await.expect_err("unknown animal");
    assert!(matches!(err, ViewError::Validation(ValidationError::UnknownAnimal(_))));
    assert_eq!(
        h.notifier.errors(),
        vec!["Please enter a valid animal name from the available list.".to_string()]
    );
}

#[tokio::test]
async fn like_and_delete() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([image_json("a", "dog", 1)])))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/images/a/like"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "likes": 2})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/images/a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let h = harness(&server);
    h.session.login(&jwt("test")).expect("token");
    let mut gallery = GalleryView::new(h.ctx.clone());
    gallery.refresh().await.expect("refresh");

    assert_eq!(gallery.like("a").await.expect("like"), 2);
    assert_eq!(gallery.find("a").map(|i| i.likes), Some(2));

    gallery.delete("a").await.expect("delete");
    assert!(gallery.images().is_empty());
}

#[tokio::test]
async fn like_missing_image_reports_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/images/zzz/like"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Image not found"})))
        .mount(&server)
        .await;

    let h = harness(&server);
    h.session.login(&jwt("test")).expect("token");
    let mut gallery = GalleryView::new(h.ctx.clone());

    let err = gallery.like("zzz").await.expect_err("missing");
    assert!(matches!(err, ViewError::Api(ApiError::NotFound(_))));
    assert_eq!(h.notifier.errors(), vec!["Image not found".to_string()]);
    assert!(h.session.is_authenticated());
}

#[tokio::test]
async fn rejected_token_ends_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "Token expired"})))
        .mount(&server)
        .await;

    let h = harness(&server);
    h.session.login(&jwt("test")).expect("token");
    let mut gallery = GalleryView::new(h.ctx.clone());

    assert!(gallery.open().await.is_err());
    assert!(!h.session.is_authenticated());
    assert_eq!(h.navigator.hard_count(Route::Login), 1);
}

#[tokio::test]
async fn rate_limited_requests_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([image_json("a", "dog", 0)])))
        .mount(&server)
        .await;

    let h = harness(&server);
    h.session.login(&jwt("test")).expect("token");
    let mut gallery = GalleryView::new(h.ctx.clone());
    assert_eq!(gallery.refresh().await.expect("refresh").len(), 1);
}

#[tokio::test]
async fn download_writes_image_file() {
    let server = MockServer::start().await;
    let image_url = format!("{}/files/a.jpg", server.uri());
    let mut listed = image_json("a", "dog", 0);
    listed["url"] = json!(image_url);

    Mock::given(method("GET"))
        .and(path("/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([listed])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/a.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0xFF, 0xD8, 0xFF]))
        .mount(&server)
        .await;

    let h = harness(&server);
    h.session.login(&jwt("test")).expect("token");
    let mut gallery = GalleryView::new(h.ctx.clone());
    gallery.refresh().await.expect("refresh");

    let dir = tempfile::tempdir().expect("tempdir");
    let written = gallery.download("a", dir.path()).await.expect("download");
    assert_eq!(std::fs::read(&written).expect("read"), vec![0xFF, 0xD8, 0xFF]);

    let err = gallery.download("missing", dir.path()).await.expect_err("unknown id");
    assert!(matches!(err, ViewError::UnknownImage(_)));
}

#[tokio::test]
async fn gallery_logout_clears_images() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/images"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([image_json("a", "dog", 0)])))
        .mount(&server)
        .await;

    let h = harness(&server);
    h.session.login(&jwt("test")).expect("token");
    let mut gallery = GalleryView::new(h.ctx.clone());
    gallery.refresh().await.expect("refresh");

    gallery.logout();
    assert!(gallery.images().is_empty());
    assert!(!h.session.is_authenticated());
    assert_eq!(h.navigator.history(), vec![(Route::Login, NavigationMode::Hard)]);
}
