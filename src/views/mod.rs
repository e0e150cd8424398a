mod documents;
pub mod session;
pub mod templates;
mod users;

#[cfg(test)]
mod test_app;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::ServiceExt;
use axum::extract::DefaultBodyLimit;
use axum::extract::FromRef;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::routing::post;
use thiserror::Error;
use tower::Layer as _;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::normalize_path::NormalizePath;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing::warn;

use crate::error::CmsError;
use crate::models::CredentialStore;
use crate::models::DocumentStore;
use session::SessionStore;
use session::require_signed_in;
use session::session_middleware;

/// Maximum size of a request body (document content included)
const REQUEST_BODY_LIMIT: usize = 1024 * 1024;

fn service_router() -> Router<AppState> {
    // `/new` and `/users/*` are matched before the `/{filename}` catch-all
    Router::new()
        .route("/", get(documents::index))
        .route(
            "/new",
            get(documents::new_form)
                .post(documents::create)
                .route_layer(from_fn(require_signed_in)),
        )
        .route("/users/login", get(users::login_form).post(users::login))
        .route("/users/logout", post(users::logout))
        .route(
            "/{filename}",
            get(documents::show)
                .merge(post(documents::update).route_layer(from_fn(require_signed_in))),
        )
        .route(
            "/{filename}/edit",
            get(documents::edit_form).route_layer(from_fn(require_signed_in)),
        )
        .route(
            "/{filename}/delete",
            post(documents::delete).route_layer(from_fn(require_signed_in)),
        )
}

/// The routes with every layer but path normalization, ready to serve
fn router(app_state: AppState) -> Router {
    service_router()
        .layer(from_fn_with_state(app_state.clone(), session_middleware))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(REQUEST_BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

#[derive(Debug, Error)]
pub enum AuthenticationError {
    #[error("You must be signed in to do that.")]
    SignInRequired,
    #[error("Invalid Credentials")]
    InvalidCredentials,
}

impl CmsError for AuthenticationError {
    fn get_status(&self) -> StatusCode {
        match self {
            Self::SignInRequired => StatusCode::FOUND,
            Self::InvalidCredentials => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn get_type(&self) -> &str {
        match self {
            Self::SignInRequired => "flatcms:authentication:SignInRequired",
            Self::InvalidCredentials => "flatcms:authentication:InvalidCredentials",
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_path: PathBuf,
    pub users_path: PathBuf,
}

#[derive(Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub address: String,
    pub storage: StorageConfig,
    pub secure_cookies: bool,
}

/// The state of the whole service, available to all handlers
///
/// If only the documents are needed, use `State<Arc<DocumentStore>>`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub documents: Arc<DocumentStore>,
    pub credentials: Arc<CredentialStore>,
    pub sessions: Arc<SessionStore>,
}

impl FromRef<AppState> for Arc<DocumentStore> {
    fn from_ref(input: &AppState) -> Self {
        input.documents.clone()
    }
}

impl FromRef<AppState> for Arc<CredentialStore> {
    fn from_ref(input: &AppState) -> Self {
        input.credentials.clone()
    }
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let StorageConfig {
            data_path,
            users_path,
        } = config.storage.clone();
        Self {
            documents: Arc::new(DocumentStore::new(data_path)),
            credentials: Arc::new(CredentialStore::new(users_path)),
            sessions: Arc::new(SessionStore::default()),
            config: Arc::new(config),
        }
    }
}

pub struct Server {
    app_state: AppState,
    router: NormalizePath<Router>,
}

impl Server {
    #[tracing::instrument(skip_all, level = "info", name = "server initialization")]
    pub fn new(config: ServerConfig) -> Self {
        info!("Building server...");
        let app_state = AppState::new(config);
        let router = tracing::debug_span!("router initialization")
            .in_scope(|| router(app_state.clone()));
        let normalizing_router = NormalizePathLayer::trim_trailing_slash().layer(router);
        Self {
            app_state,
            router: normalizing_router,
        }
    }

    pub async fn start(self) -> std::io::Result<()> {
        let Self { app_state, router } = self;
        let ServerConfig {
            address,
            port,
            storage,
            secure_cookies,
        } = app_state.config.as_ref();

        if !storage.users_path.is_file() {
            warn!(
                path = %storage.users_path.display(),
                "credentials file not found, nobody can sign in"
            );
        }
        if !*secure_cookies {
            warn!("session cookies are sent over plain HTTP");
        }

        info!(
            data_path = %storage.data_path.display(),
            "Running server on {address}:{port}..."
        );
        let service = ServiceExt::<axum::extract::Request>::into_make_service(router);
        let listener = tokio::net::TcpListener::bind((address.as_str(), *port)).await?;
        axum::serve(listener, service).await
    }
}
