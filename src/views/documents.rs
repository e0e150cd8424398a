use std::sync::Arc;

use axum::Extension;
use axum::Form;
use axum::extract::Path;
use axum::extract::State;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Deserialize;

use crate::error::Result;
use crate::models::DocumentStore;
use crate::render::Rendered;
use crate::render::render;
use crate::views::session::FlashRedirect;
use crate::views::session::SessionExt;
use crate::views::templates;

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

pub(in crate::views) async fn index(
    State(documents): State<Arc<DocumentStore>>,
    Extension(session): SessionExt,
) -> Result<Html<String>> {
    let documents = documents.list().await?;
    let login = session.login();
    let flash = session.take_message();
    Ok(Html(templates::index(
        &documents,
        login.as_deref(),
        flash.as_deref(),
    )))
}

pub(in crate::views) async fn show(
    State(documents): State<Arc<DocumentStore>>,
    Extension(session): SessionExt,
    Path(filename): Path<String>,
) -> Result<Response> {
    let document = documents.find(&filename).await?;
    let response = match render(&document)? {
        Rendered::Html(html) => {
            let flash = session.take_message();
            Html(templates::document(&document.name, &html, flash.as_deref())).into_response()
        }
        Rendered::PlainText(content) => {
            ([(header::CONTENT_TYPE, PLAIN_TEXT)], content).into_response()
        }
    };
    Ok(response)
}

pub(in crate::views) async fn new_form(Extension(session): SessionExt) -> Html<String> {
    let flash = session.take_message();
    Html(templates::new_document("", flash.as_deref()))
}

#[derive(Debug, Deserialize)]
pub(in crate::views) struct NewDocumentForm {
    #[serde(default)]
    filename: String,
}

pub(in crate::views) async fn create(
    State(documents): State<Arc<DocumentStore>>,
    Form(NewDocumentForm { filename }): Form<NewDocumentForm>,
) -> Result<Response> {
    match documents.create(&filename).await {
        Ok(document) => {
            tracing::info!(name = document.name, "document created");
            let message = format!("'{}' has been created.", document.name);
            Ok(FlashRedirect::home(message).into_response())
        }
        Err(err) if err.is_validation() => {
            tracing::debug!(filename, error = %err, "rejected document name");
            let page = templates::new_document(&filename, Some(&err.to_string()));
            Ok((StatusCode::UNPROCESSABLE_ENTITY, Html(page)).into_response())
        }
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Deserialize)]
pub(in crate::views) struct UpdateDocumentForm {
    #[serde(default)]
    content: String,
}

pub(in crate::views) async fn update(
    State(documents): State<Arc<DocumentStore>>,
    Path(filename): Path<String>,
    Form(UpdateDocumentForm { content }): Form<UpdateDocumentForm>,
) -> Result<FlashRedirect> {
    documents.update(&filename, content.as_bytes()).await?;
    tracing::info!(name = filename, "document updated");
    Ok(FlashRedirect::home(format!("'{filename}' has been updated.")))
}

pub(in crate::views) async fn edit_form(
    State(documents): State<Arc<DocumentStore>>,
    Extension(session): SessionExt,
    Path(filename): Path<String>,
) -> Result<Html<String>> {
    let document = documents.find(&filename).await?;
    let flash = session.take_message();
    Ok(Html(templates::edit_document(
        &document.name,
        &document.content_lossy(),
        flash.as_deref(),
    )))
}

pub(in crate::views) async fn delete(
    State(documents): State<Arc<DocumentStore>>,
    Path(filename): Path<String>,
) -> Result<FlashRedirect> {
    documents.delete(&filename).await?;
    tracing::info!(name = filename, "document deleted");
    Ok(FlashRedirect::home(format!("'{filename}' has been deleted.")))
}
