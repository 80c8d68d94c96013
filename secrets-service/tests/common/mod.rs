#![allow(dead_code)]

use std::collections::HashSet;
use std::io;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use auth::Authenticator;
use auth::PasswordScheme;
use reqwest::cookie::CookieStore;
use reqwest::cookie::Jar;
use reqwest::header::HeaderValue;
use reqwest::redirect::Policy;
use reqwest::Url;
use secrets_service::config::SessionConfig;
use secrets_service::domain::user::models::AuthorizationRequest;
use secrets_service::domain::user::models::ProviderProfile;
use secrets_service::domain::user::models::User;
use secrets_service::domain::user::models::Username;
use secrets_service::domain::user::ports::IdentityProvider;
use secrets_service::domain::user::ports::UserRepository;
use secrets_service::domain::user::ports::UserServicePort;
use secrets_service::domain::user::service::UserService;
use secrets_service::inbound::http::router::create_router;
use secrets_service::inbound::http::session::SessionSettings;
use secrets_service::repositories::InMemoryUserRepository;
use secrets_service::user::errors::FederationError;
use tower_sessions::session::Id;
use tower_sessions::session::Record;
use tower_sessions::session_store;
use tower_sessions::MemoryStore;
use tower_sessions::SessionStore;

pub const TEST_ENCRYPTION_KEY: &str =
    "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

/// Authorization codes of this shape exchange to the subject after the prefix.
pub const GOOGLE_CODE_PREFIX: &str = "code-for-";

pub type TestUserService = UserService<InMemoryUserRepository, ScriptedIdentityProvider>;

/// Test application that spawns a real server
pub struct TestApp {
    pub address: String,
    pub repository: Arc<InMemoryUserRepository>,
    pub user_service: Arc<TestUserService>,
    pub client: reqwest::Client,
    pub jar: Arc<Jar>,
}

impl TestApp {
    /// Spawn the application with the default password scheme
    pub async fn spawn() -> Self {
        Self::spawn_with(PasswordScheme::Argon2).await
    }

    /// Spawn the application in a background task with the given scheme
    pub async fn spawn_with(scheme: PasswordScheme) -> Self {
        Self::spawn_with_store(scheme, MemoryStore::default()).await
    }

    /// Spawn the application backed by a custom session store
    pub async fn spawn_with_store<S>(scheme: PasswordScheme, session_store: S) -> Self
    where
        S: SessionStore + Clone,
    {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind random port");
        let port = listener.local_addr().unwrap().port();
        let address = format!("http://127.0.0.1:{}", port);

        let repository = Arc::new(InMemoryUserRepository::new());
        let identity_provider = Arc::new(ScriptedIdentityProvider::default());
        let authenticator = Arc::new(
            Authenticator::for_scheme(scheme, Some(TEST_ENCRYPTION_KEY))
                .expect("Failed to build authenticator"),
        );
        let user_service = Arc::new(UserService::new(
            Arc::clone(&repository),
            identity_provider,
            authenticator,
        ));

        let session_settings = SessionSettings::from_config(&SessionConfig {
            secret: "test-session-secret-".repeat(4),
            secure_cookie: false,
            inactivity_days: 7,
        })
        .expect("Failed to build session settings");

        let service: Arc<dyn UserServicePort> = user_service.clone();
        let router = create_router(service, session_store, &session_settings);

        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("Server error");
        });

        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .redirect(Policy::none())
            .build()
            .expect("Failed to create reqwest client");

        Self {
            address,
            repository,
            user_service,
            client,
            jar,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// Helper to make GET request
    pub fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.get(self.url(path))
    }

    /// Helper to make POST request
    pub fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client.post(self.url(path))
    }

    /// Submit the registration form
    pub async fn register(&self, username: &str, password: &str) -> reqwest::Response {
        self.post("/register")
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Submit the login form
    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.post("/login")
            .form(&[("username", username), ("password", password)])
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn logout(&self) -> reqwest::Response {
        self.post("/secrets")
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Run the Google flow end to end for `subject`
    pub async fn google_sign_in(&self, subject: &str) -> reqwest::Response {
        let begin = self
            .get("/auth/google")
            .send()
            .await
            .expect("Failed to execute request");
        let state = state_param(location(&begin));

        self.get(&format!(
            "/auth/google/secrets?code={}{}&state={}",
            GOOGLE_CODE_PREFIX, subject, state
        ))
        .send()
        .await
        .expect("Failed to execute request")
    }

    /// Cookie header the client would currently send
    pub fn cookie_header(&self) -> Option<HeaderValue> {
        let url = Url::parse(&self.address).expect("Invalid address");
        self.jar.cookies(&url)
    }

    /// A client sharing nothing with the app's own client
    pub fn anonymous_client() -> reqwest::Client {
        reqwest::Client::builder()
            .redirect(Policy::none())
            .build()
            .expect("Failed to create reqwest client")
    }

    pub async fn stored_user(&self, username: &str) -> User {
        let username = Username::new(username.to_string()).unwrap();
        self.repository
            .find_by_username(&username)
            .await
            .expect("Repository error")
            .expect("User not stored")
    }
}

/// `Location` header of a redirect response
pub fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .expect("Missing Location header")
        .to_str()
        .expect("Invalid Location header")
}

fn state_param(url: &str) -> String {
    let url = Url::parse(url).expect("Invalid authorization URL");
    url.query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
        .expect("Missing state parameter")
}

/// Identity provider that never leaves the process.
///
/// Issues numbered states and verifiers, and only accepts verifiers it issued.
#[derive(Default)]
pub struct ScriptedIdentityProvider {
    issued: Mutex<HashSet<String>>,
}

#[async_trait]
impl IdentityProvider for ScriptedIdentityProvider {
    fn authorization_request(&self) -> Result<AuthorizationRequest, FederationError> {
        let mut issued = self.issued.lock().unwrap();
        let n = issued.len();
        let csrf_state = format!("state-{}", n);
        let pkce_verifier = format!("verifier-{}", n);
        issued.insert(pkce_verifier.clone());

        Ok(AuthorizationRequest {
            url: format!(
                "https://accounts.example.test/o/oauth2/auth?response_type=code&state={}",
                csrf_state
            ),
            csrf_state,
            pkce_verifier,
        })
    }

    async fn exchange_code(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<ProviderProfile, FederationError> {
        if !self.issued.lock().unwrap().contains(pkce_verifier) {
            return Err(FederationError::TokenExchange(
                "unknown code verifier".to_string(),
            ));
        }

        let subject = code
            .strip_prefix(GOOGLE_CODE_PREFIX)
            .ok_or_else(|| FederationError::TokenExchange("invalid_grant".to_string()))?;

        Ok(ProviderProfile {
            subject: subject.to_string(),
            email: Some(format!("{}@example.com", subject)),
        })
    }
}

/// Session store whose deletes succeed `allowed_deletes` times, then fail.
#[derive(Debug, Clone)]
pub struct FailingDeleteStore {
    inner: MemoryStore,
    deletes: Arc<AtomicUsize>,
    allowed_deletes: usize,
}

impl FailingDeleteStore {
    pub fn new(allowed_deletes: usize) -> Self {
        Self {
            inner: MemoryStore::default(),
            deletes: Arc::new(AtomicUsize::new(0)),
            allowed_deletes,
        }
    }
}

#[async_trait]
impl SessionStore for FailingDeleteStore {
    async fn create(&self, record: &mut Record) -> session_store::Result<()> {
        self.inner.create(record).await
    }

    async fn save(&self, record: &Record) -> session_store::Result<()> {
        self.inner.save(record).await
    }

    async fn load(&self, session_id: &Id) -> session_store::Result<Option<Record>> {
        self.inner.load(session_id).await
    }

    async fn delete(&self, session_id: &Id) -> session_store::Result<()> {
        if self.deletes.fetch_add(1, Ordering::SeqCst) >= self.allowed_deletes {
            return Err(session_store::Error::Backend(
                "session backend unavailable".to_string(),
            ));
        }
        self.inner.delete(session_id).await
    }
}

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        let capture = self.clone();
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || capture.clone())
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
