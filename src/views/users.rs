use std::sync::Arc;

use axum::Extension;
use axum::Form;
use axum::extract::State;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Deserialize;

use crate::error::CmsError as _;
use crate::error::Result;
use crate::models::CredentialStore;
use crate::views::AuthenticationError;
use crate::views::session::FlashRedirect;
use crate::views::session::SessionExt;
use crate::views::templates;

pub(in crate::views) async fn login_form(Extension(session): SessionExt) -> Html<String> {
    let flash = session.take_message();
    Html(templates::login("", flash.as_deref()))
}

#[derive(Deserialize)]
pub(in crate::views) struct LoginForm {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

pub(in crate::views) async fn login(
    State(credentials): State<Arc<CredentialStore>>,
    Extension(session): SessionExt,
    Form(LoginForm { username, password }): Form<LoginForm>,
) -> Result<Response> {
    if credentials.verify(&username, &password).await? {
        tracing::info!(username, "signed in");
        session.sign_in(username);
        return Ok(FlashRedirect::home("Welcome!").into_response());
    }

    tracing::warn!(username, "sign in refused");
    let error = AuthenticationError::InvalidCredentials;
    let page = templates::login(&username, Some(&error.to_string()));
    Ok((error.get_status(), Html(page)).into_response())
}

pub(in crate::views) async fn logout(Extension(session): SessionExt) -> FlashRedirect {
    if let Some(username) = session.login() {
        tracing::info!(username, "signed out");
    }
    session.sign_out();
    FlashRedirect::home("You have successfully logged out.")
}
