use std::sync::Arc;

use axum::{extract::State, response::Html};
use safelens_core::AppError;
use safelens_infra::SessionId;

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::templates::{ResultsView, RESULTS_TEMPLATE};

/// Results page
///
/// Shows the latest analysis of this session. Without one the user is sent
/// back to the upload form.
#[tracing::instrument(skip(state), fields(session_id = %session, operation = "pdf_results"))]
pub async fn pdf_results(
    State(state): State<Arc<AppState>>,
    session: SessionId,
) -> Result<Html<String>, HttpAppError> {
    let record = state
        .sessions
        .result(&session)
        .await
        .ok_or(AppError::NoResult)?;

    let view = ResultsView::from(&record);
    Ok(Html(state.templates.render(RESULTS_TEMPLATE, &view)?))
}
