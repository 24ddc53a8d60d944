//! Unified error handling with Sentry integration.
//!
//! Route handlers return [`Result<T>`]. Server-side failures are captured to
//! Sentry before the response is rendered; clients only ever see a generic
//! message for them.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::filters;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Catalog API operation failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Catalog(CatalogError::NotFound(_)) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Catalog(CatalogError::RateLimited(_)) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Catalog(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client.
    fn public_message(&self) -> String {
        match self {
            Self::Catalog(CatalogError::NotFound(_)) | Self::NotFound(_) => {
                "The page you are looking for does not exist.".to_string()
            }
            Self::Catalog(CatalogError::RateLimited(_)) => {
                "The catalog is busy right now. Please try again shortly.".to_string()
            }
            Self::Catalog(_) => "The product catalog is unavailable right now.".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            Self::BadRequest(msg) => msg.clone(),
        }
    }
}

/// Error page template.
#[derive(Template, WebTemplate)]
#[template(path = "errors/error.html")]
pub struct ErrorTemplate {
    pub status: u16,
    pub title: &'static str,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }

        let title = if status == StatusCode::NOT_FOUND {
            "Page not found"
        } else if status.is_client_error() {
            "Bad request"
        } else {
            "Something went wrong"
        };

        let page = ErrorTemplate {
            status: status.as_u16(),
            title,
            message: self.public_message(),
        };

        (status, page).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Associate subsequent Sentry events with a browser.
pub fn set_sentry_user(id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(id.to_string()),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
