use axum::http::StatusCode;
use axum::response::Html;
use axum::response::IntoResponse;
use axum::response::Response;
use colored::Colorize;
use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt::Display;
use std::fmt::Formatter;
use std::result::Result as StdResult;
use tracing::error;

use crate::views::session::FlashRedirect;
use crate::views::templates;

pub type Result<T, E = InternalError> = StdResult<T, E>;

const SERVER_ERROR_MESSAGE: &str = "Something went wrong on our side.";

/// Trait for all errors that can be returned by the handlers
///
/// The status decides how the error reaches the visitor:
/// - `302 Found` redirects to the index with the error message as flash,
/// - `422 Unprocessable Entity` is meant to be rendered inline by the handler,
/// - anything else is logged and rendered as an error page.
pub trait CmsError: Error + Send + Sync {
    fn get_status(&self) -> StatusCode;

    fn get_type(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq)]
pub struct InternalError {
    pub status: StatusCode,
    pub error_type: String,
    pub message: String,
}

impl Error for InternalError {}

impl Display for InternalError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl<T: CmsError> From<T> for InternalError {
    fn from(err: T) -> Self {
        InternalError {
            status: err.get_status(),
            error_type: err.get_type().to_owned(),
            message: err.to_string(),
        }
    }
}

impl IntoResponse for InternalError {
    fn into_response(self) -> Response {
        if self.status == StatusCode::FOUND {
            tracing::debug!(
                error_type = %self.error_type,
                message = %self.message,
                "redirecting with flash"
            );
            return FlashRedirect::home(self.message).into_response();
        }
        error!(
            "[{}] {}: {}",
            self.error_type.bold(),
            self.message,
            Backtrace::capture() // won't log unless RUST_BACKTRACE=1
        );
        // server-side details (paths, sources) stay in the logs
        let message = if self.status.is_server_error() {
            SERVER_ERROR_MESSAGE
        } else {
            &self.message
        };
        let page = templates::error_page(self.status, message);
        (self.status, Html(page)).into_response()
    }
}

impl CmsError for std::io::Error {
    fn get_status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn get_type(&self) -> &str {
        "flatcms:IoError"
    }
}

impl CmsError for serde_yaml::Error {
    fn get_status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn get_type(&self) -> &str {
        "flatcms:SerdeYamlError"
    }
}

impl CmsError for tokio::task::JoinError {
    fn get_status(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }

    fn get_type(&self) -> &str {
        "flatcms:JoinError"
    }
}
