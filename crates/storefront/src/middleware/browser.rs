//! Browser identity extractor.
//!
//! Every visitor is identified by a [`BrowserId`] kept in their session. The
//! first request from a new browser mints one; later requests reuse it.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::{AppError, set_sentry_user};
use crate::models::{BrowserId, session_keys};

impl<S> FromRequestParts<S> for BrowserId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(|| AppError::Internal("session layer is not installed".to_string()))?;

        let existing = session
            .get::<BrowserId>(session_keys::BROWSER_ID)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to read browser id from session");
                None
            });

        let browser = match existing {
            Some(id) => id,
            None => {
                let id = BrowserId::generate();
                session
                    .insert(session_keys::BROWSER_ID, id)
                    .await
                    .map_err(|e| AppError::Internal(format!("failed to store browser id: {e}")))?;
                tracing::debug!(browser_id = %id, "New browser session");
                id
            }
        };

        set_sentry_user(&browser);
        Ok(browser)
    }
}
