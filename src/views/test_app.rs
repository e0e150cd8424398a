//! Exposes [TestApp] and [TestAppBuilder] to ease the setup of the
//! test axum server, its document directory and its credentials file.

use std::path::PathBuf;

use axum::http::StatusCode;
use axum::http::header;
use axum_test::TestRequest;
use axum_test::TestServer;
use axum_test::TestServerConfig;
use common::tracing::Stream;
use common::tracing::TracingConfig;
use common::tracing::create_tracing_subscriber;
use tempfile::TempDir;

use crate::models::credentials::PasswordHash;

use super::AppState;
use super::ServerConfig;
use super::StorageConfig;
use super::router;

/// Keeps the test suite fast, production hashes use far more
const TEST_HASH_ITERATIONS: u32 = 1_000;

/// A builder interface for [TestApp]
///
/// Every app gets its own temporary directory holding the documents and a
/// credentials file. By default the credentials file knows a single user,
/// `admin` with password `testing`, and no document exists.
pub(crate) struct TestAppBuilder {
    documents: Vec<(String, String)>,
    users: Option<Vec<(String, String)>>,
    secure_cookies: bool,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            documents: vec![],
            users: Some(vec![("admin".to_owned(), "testing".to_owned())]),
            secure_cookies: false,
        }
    }

    pub fn document(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.documents.push((name.into(), content.into()));
        self
    }

    pub fn user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.users
            .get_or_insert_with(Vec::new)
            .push((username.into(), password.into()));
        self
    }

    pub fn without_credentials_file(mut self) -> Self {
        self.users = None;
        self
    }

    pub fn secure_cookies(mut self, secure_cookies: bool) -> Self {
        self.secure_cookies = secure_cookies;
        self
    }

    pub fn default_app() -> TestApp {
        TestAppBuilder::new().build()
    }

    pub fn build(self) -> TestApp {
        // Setup tracing
        let tracing_config = TracingConfig {
            stream: Stream::Stdout,
                plain: true,
        };
        let sub = create_tracing_subscriber(
            tracing_config,
            tracing_subscriber::filter::LevelFilter::TRACE,
        );
        let tracing_guard = tracing::subscriber::set_default(sub);

        // Fill the storage
        let dir = tempfile::tempdir().expect("temporary directory should be created");
        let data_path = dir.path().join("data");
        std::fs::create_dir(&data_path).expect("data directory should be created");
        for (name, content) in &self.documents {
            std::fs::write(data_path.join(name), content).expect("document should be written");
        }
        let users_path = dir.path().join("users_db.yml");
        if let Some(users) = &self.users {
            let entries: String = users
                .iter()
                .map(|(username, password)| {
                    let hash = PasswordHash::generate(password, TEST_HASH_ITERATIONS);
                    format!("{username}: {hash}\n")
                })
                .collect();
            std::fs::write(&users_path, entries).expect("credentials file should be written");
        }

        // Generate test server config
        let config = ServerConfig {
            port: 0,
            address: String::default(),
            storage: StorageConfig {
                data_path,
                users_path,
            },
            secure_cookies: self.secure_cookies,
        };
        let app_state = AppState::new(config);

        // Run server
        let server_config = TestServerConfig {
            save_cookies: true,
            ..TestServerConfig::default()
        };
        let server = TestServer::new_with_config(router(app_state.clone()), server_config)
            .expect("test server should build properly");

        TestApp {
            server,
            app_state,
            _dir: dir,
            tracing_guard,
        }
    }
}

/// Wraps an underlying, fully configured, axum service
///
/// The session cookie is saved between requests, so a [TestApp] behaves
/// like a single browser.
pub(crate) struct TestApp {
    server: TestServer,
    app_state: AppState,
    _dir: TempDir,
    #[expect(unused)] // included here to extend its lifetime, not meant to be used in any way
    tracing_guard: tracing::subscriber::DefaultGuard,
}

impl TestApp {
    pub fn data_path(&self) -> PathBuf {
        self.app_state.config.storage.data_path.clone()
    }

    /// Content of a document straight from the disk
    pub fn read_document(&self, name: &str) -> Option<String> {
        std::fs::read_to_string(self.data_path().join(name)).ok()
    }

    /// Number of sessions held by the server
    pub fn session_count(&self) -> usize {
        self.app_state.sessions.count()
    }

    pub async fn fetch(&self, req: TestRequest) -> TestResponse {
        tracing::trace!(request = ?req);
        let response = req.await;
        TestResponse::new(response)
    }

    pub fn get(&self, path: &str) -> TestRequest {
        self.server.get(path)
    }

    pub fn post(&self, path: &str) -> TestRequest {
        self.server.post(path)
    }

    pub async fn sign_in(&self, username: &str, password: &str) {
        let request = self
            .post("/users/login")
            .form(&[("username", username), ("password", password)]);
        self.fetch(request).await.assert_status(StatusCode::FOUND);
    }
}

pub struct TestResponse {
    inner: axum_test::TestResponse,
}

impl TestResponse {
    #[tracing::instrument(name = "Response", level = "debug", skip(inner), fields(status = ?inner.status_code()))]
    fn new(inner: axum_test::TestResponse) -> Self {
        tracing::trace!(response = ?inner);
        Self { inner }
    }

    #[track_caller]
    pub fn assert_status(self, expected_status: StatusCode) -> Self {
        let actual_status = self.inner.status_code();
        if actual_status != expected_status {
            let body = self.inner.text();
            pretty_assertions::assert_eq!(
                actual_status,
                expected_status,
                "unexpected status code body={body}"
            );
            unreachable!("should have already panicked")
        } else {
            self
        }
    }

    pub fn bytes(self) -> Vec<u8> {
        self.inner.into_bytes().into()
    }

    pub fn text(self) -> String {
        self.inner.text()
    }

    #[track_caller]
    fn header(&self, name: header::HeaderName) -> Option<String> {
        self.inner.headers().get(&name).map(|value| {
            value
                .to_str()
                .unwrap_or_else(|_| panic!("{name} header should be valid UTF-8"))
                .to_owned()
        })
    }

    #[track_caller]
    pub fn content_type(&self) -> String {
        self.header(header::CONTENT_TYPE)
            .expect("Content-Type header should be set")
    }

    #[track_caller]
    pub fn location(&self) -> String {
        self.header(header::LOCATION)
            .expect("Location header should be set")
    }

    pub fn maybe_set_cookie(&self) -> Option<String> {
        self.header(header::SET_COOKIE)
    }

    #[track_caller]
    pub fn set_cookie(&self) -> String {
        self.maybe_set_cookie()
            .expect("Set-Cookie header should be set")
    }
}
