//! Bin HTTP handlers.

use crate::{call_store, error::HttpError, models::bin::NewBinRequest, AppError, AppState, Bin};
use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    Form, Json,
};
use pastebin_core::text::escape_html;

/// List active bins, oldest first.
pub async fn get_bins(State(state): State<AppState>) -> Result<Json<Vec<Bin>>, HttpError> {
    tracing::info!("Received request to getBins");
    let bins = call_store(&state, |store| store.list_active()).await?;
    Ok(Json(bins))
}

/// Accept a form-encoded `title` and `content` and store them as a new bin.
///
/// Content is HTML-escaped before validation unless escaping is disabled.
pub async fn new_bin(
    State(state): State<AppState>,
    form: Result<Form<NewBinRequest>, FormRejection>,
) -> Result<&'static str, HttpError> {
    tracing::info!("Received request to newBin");
    let Form(NewBinRequest { title, content }) =
        form.map_err(|rejection| form_rejection_error(rejection, state.config.max_request_bytes))?;
    let content = if state.config.disable_html_escape {
        content
    } else {
        escape_html(&content)
    };
    call_store(&state, move |store| store.insert(&title, &content)).await?;
    Ok("Success")
}

fn form_rejection_error(rejection: FormRejection, max_request_bytes: usize) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::info!("Request size exceeded");
        return AppError::RequestTooLarge {
            limit: max_request_bytes,
        };
    }
    AppError::BadRequest(rejection.body_text())
}
