use axum::http::StatusCode;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use thiserror::Error;

use crate::error::CmsError;
use crate::models::Document;
use crate::models::DocumentKind;

/// Displayable form of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// HTML fragment, to be embedded in a page
    Html(String),
    /// Raw bytes, served as `text/plain`
    PlainText(Vec<u8>),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("'{name}' cannot be displayed.")]
    UnsupportedKind { name: String },
}

impl CmsError for RenderError {
    fn get_status(&self) -> StatusCode {
        StatusCode::FOUND
    }

    fn get_type(&self) -> &str {
        "flatcms:render:UnsupportedKind"
    }
}

impl DocumentKind {
    pub fn render(self, content: &[u8]) -> Rendered {
        match self {
            DocumentKind::Markdown => {
                Rendered::Html(markdown_to_html(&String::from_utf8_lossy(content)))
            }
            DocumentKind::PlainText => Rendered::PlainText(content.to_vec()),
        }
    }
}

pub fn render(document: &Document) -> Result<Rendered, RenderError> {
    let kind = document.kind().ok_or_else(|| RenderError::UnsupportedKind {
        name: document.name.clone(),
    })?;
    Ok(kind.render(&document.content))
}

fn markdown_to_html(text: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
    let parser = Parser::new_ext(text, options);
    let mut html = String::with_capacity(text.len() * 3 / 2);
    pulldown_cmark::html::push_html(&mut html, parser);
    html
}
