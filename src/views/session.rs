//! Server-side visitor sessions
//!
//! A session only exists once something is written to it: a sign in or a
//! flash message. It is identified by an opaque UUID stored in the
//! [SESSION_COOKIE] cookie. Its payload never leaves the server: it holds
//! the signed-in username and a one-shot flash message. Signing in moves the
//! payload under a fresh id.
//!
//! Handlers receive a [Session] handle through [SessionExt]. Responses can
//! also carry a [Flash] extension (see [FlashRedirect]), which the
//! [session_middleware] stores in the session once the handler returns.

use std::sync::Arc;

use axum::extract::Request;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header;
use axum::middleware::Next;
use axum::response::IntoResponse;
use axum::response::Response;
use axum_extra::extract::cookie::Cookie;
use axum_extra::extract::cookie::CookieJar;
use axum_extra::extract::cookie::SameSite;
use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use super::AppState;
use super::AuthenticationError;
use crate::error::Result;

pub const SESSION_COOKIE: &str = "flatcms.session";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionData {
    pub login: Option<String>,
    pub message: Option<String>,
}

/// All live sessions, by id
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<Uuid, SessionData>,
}

impl SessionStore {
    fn create(&self, data: SessionData) -> Uuid {
        let id = Uuid::new_v4();
        self.sessions.insert(id, data);
        id
    }

    fn contains(&self, id: &Uuid) -> bool {
        self.sessions.contains_key(id)
    }

    #[cfg(test)]
    pub fn get(&self, id: &Uuid) -> Option<SessionData> {
        self.sessions.get(id).map(|data| data.clone())
    }

    #[cfg(test)]
    pub fn count(&self) -> usize {
        self.sessions.len()
    }
}

/// Handle on the session of the current visitor
///
/// Reads never create a session. The id is `None` until the first write.
#[derive(Debug, Clone)]
pub struct Session {
    id: Arc<Mutex<Option<Uuid>>>,
    store: Arc<SessionStore>,
}

pub type SessionExt = axum::extract::Extension<Session>;

impl Session {
    fn new(id: Option<Uuid>, store: Arc<SessionStore>) -> Self {
        Self {
            id: Arc::new(Mutex::new(id)),
            store,
        }
    }

    fn id(&self) -> Option<Uuid> {
        *self.id.lock()
    }

    pub fn login(&self) -> Option<String> {
        let id = self.id()?;
        self.store
            .sessions
            .get(&id)
            .and_then(|data| data.login.clone())
    }

    /// The signed-in username, or [AuthenticationError::SignInRequired]
    pub fn require_signed_in(&self) -> Result<String, AuthenticationError> {
        self.login().ok_or(AuthenticationError::SignInRequired)
    }

    /// Signs in under a new session id, the previous one is forgotten
    pub fn sign_in(&self, username: String) {
        let mut id = self.id.lock();
        let data = id
            .and_then(|previous| self.store.sessions.remove(&previous))
            .map(|(_, data)| data)
            .unwrap_or_default();
        *id = Some(self.store.create(SessionData {
            login: Some(username),
            ..data
        }));
    }

    pub fn sign_out(&self) {
        let id = self.id();
        if let Some(mut data) = id.and_then(|id| self.store.sessions.get_mut(&id)) {
            data.login = None;
        }
    }

    pub fn flash(&self, message: impl Into<String>) {
        let message = message.into();
        let mut current = self.id.lock();
        let id = *current.get_or_insert_with(|| self.store.create(SessionData::default()));
        self.store.sessions.entry(id).or_default().message = Some(message);
    }

    /// Reads the flash message and clears it
    pub fn take_message(&self) -> Option<String> {
        let id = self.id()?;
        self.store
            .sessions
            .get_mut(&id)
            .and_then(|mut data| data.message.take())
    }
}

/// Flash message attached to a response, saved in the session by [session_middleware]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash(pub String);

/// `302 Found` to the index, with a flash message for the next page
#[derive(Debug)]
pub struct FlashRedirect {
    message: String,
}

impl FlashRedirect {
    pub fn home(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for FlashRedirect {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response();
        response.extensions_mut().insert(Flash(self.message));
        response
    }
}

pub(super) async fn session_middleware(
    State(AppState {
        sessions, config, ..
    }): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> (CookieJar, Response) {
    let known_id = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
        .filter(|id| sessions.contains(id));
    let session = Session::new(known_id, sessions);
    req.extensions_mut().insert(session.clone());
    let mut response = next.run(req).await;
    if let Some(Flash(message)) = response.extensions_mut().remove::<Flash>() {
        session.flash(message);
    }

    let jar = match session.id() {
        Some(id) if known_id != Some(id) => {
            tracing::debug!(session = %id, "new session");
            let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(config.secure_cookies);
            jar.add(cookie)
        }
        _ => jar,
    };
    (jar, response)
}

/// Guard for the routes that modify documents
pub(super) async fn require_signed_in(
    axum::extract::Extension(session): SessionExt,
    req: Request,
    next: Next,
) -> Result<Response> {
    let login = session.require_signed_in()?;
    tracing::debug!(login, "signed in");
    Ok(next.run(req).await)
}
