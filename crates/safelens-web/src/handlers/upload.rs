use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::Utc;
use safelens_core::{
    sanitize_filename, AnalysisRecord, AppError, ErrorMetadata, FlowError, FlowEvent,
    UploadFlow, DEFAULT_INSTRUCTIONS,
};
use safelens_infra::{generate_csrf_token, verify_csrf_token, SessionId};
use safelens_vision::ImageSource;
use tracing::Instrument;

use crate::error::HttpAppError;
use crate::state::AppState;
use crate::templates::{IndexView, INDEX_TEMPLATE};
use crate::utils::upload::{extract_upload_form, UploadForm};

/// Upload form
///
/// Renders an empty form with a fresh CSRF token. A message left by a failed
/// submission is shown once.
#[tracing::instrument(skip(state), fields(session_id = %session, operation = "upload_form"))]
pub async fn upload_form(
    State(state): State<Arc<AppState>>,
    session: SessionId,
) -> Result<Html<String>, HttpAppError> {
    let flash = state.sessions.take_flash(&session).await;

    let view = IndexView::new(
        generate_csrf_token(state.session_settings.signer(), &session),
        DEFAULT_INSTRUCTIONS.to_string(),
        state.config.upload.max_file_size_bytes,
    )
    .with_flash(flash);

    Ok(Html(state.templates.render(INDEX_TEMPLATE, &view)?))
}

/// Upload submission handler
///
/// Validates the form, stores the image in a temporary file and asks the
/// classifier about it. Storage and classification run on their own task so a
/// client that disconnects cannot interrupt cleanup.
///
/// # Returns
/// - `303` to `/pdf_results` once the result is stored for the session
/// - `303` to `/` when the vision service failed (with a message for the form)
/// - `400` with the form re-rendered when validation fails
///
/// # Errors
/// - `AppError::CsrfRejected` - missing or invalid form token
/// - `AppError::Storage` - the temporary file could not be written
/// - `AppError::Internal` - the upload task failed unexpectedly
#[tracing::instrument(skip(state, multipart), fields(session_id = %session, operation = "submit_upload"))]
pub async fn submit_upload(
    State(state): State<Arc<AppState>>,
    session: SessionId,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, HttpAppError> {
    let multipart = multipart.map_err(|rejection| {
        AppError::Validation(format!(
            "Expected a multipart form: {}",
            rejection.body_text()
        ))
    })?;

    let UploadForm {
        submission,
        csrf_token,
    } = extract_upload_form(multipart).await?;

    let signer = state.session_settings.signer();
    let token_valid = csrf_token
        .as_deref()
        .is_some_and(|token| verify_csrf_token(signer, token, &session));
    if !token_valid {
        return Err(AppError::CsrfRejected.into());
    }

    let mut flow = UploadFlow::resume(state.sessions.flow_state(&session).await);
    flow.advance(FlowEvent::Submitted)?;

    if let Err(errors) = state.validator.validate(&submission) {
        flow.advance(FlowEvent::ValidationFailed)?;
        tracing::debug!(
            errors = ?errors,
            "Upload rejected by validation"
        );

        let view = IndexView::new(
            generate_csrf_token(signer, &session),
            submission.instructions,
            state.config.upload.max_file_size_bytes,
        )
        .with_errors(&errors);
        let html = state.templates.render(INDEX_TEMPLATE, &view)?;

        return Ok((StatusCode::BAD_REQUEST, Html(html)).into_response());
    }

    flow.advance(FlowEvent::Validated)?;

    let original_filename = sanitize_filename(submission.filename.as_deref().unwrap_or_default());
    let task = tokio::spawn(
        process_upload(
            state.clone(),
            session,
            flow,
            submission.data,
            submission.instructions,
            original_filename,
        )
        .in_current_span(),
    );

    let outcome = task
        .await
        .map_err(|e| AppError::Internal(format!("Upload task failed: {}", e)))?;

    match outcome {
        Ok(()) => Ok(Redirect::to("/pdf_results").into_response()),
        // The message is waiting in the session; the form shows it
        Err(AppError::ExternalService { .. }) => Ok(Redirect::to("/").into_response()),
        Err(e) => Err(e.into()),
    }
}

fn flow_error(err: FlowError) -> AppError {
    AppError::Internal(err.to_string())
}

/// Store, classify, clean up and record the outcome for the session.
///
/// The temporary file is removed before the outcome is looked at, so it is
/// gone on success and on failure alike.
async fn process_upload(
    state: Arc<AppState>,
    session: SessionId,
    mut flow: UploadFlow,
    data: Vec<u8>,
    instructions: String,
    original_filename: String,
) -> Result<(), AppError> {
    let mut temp = match state.temp_files.create(&data).await {
        Ok(temp) => temp,
        Err(e) => {
            flow.advance(FlowEvent::StorageFailed).map_err(flow_error)?;
            tracing::error!(error = %e, "Failed to store upload");
            return Err(AppError::Storage(e.to_string()));
        }
    };
    let size = data.len();
    drop(data);

    flow.advance(FlowEvent::Stored).map_err(flow_error)?;
    tracing::debug!(
        temp_file = %temp.path().display(),
        bytes = size,
        "Upload stored"
    );

    let outcome = state
        .classifier
        .classify(ImageSource::Path(temp.path().to_path_buf()))
        .await;

    if let Err(e) = temp.remove().await {
        tracing::warn!(
            error = %e,
            temp_file = %temp.path().display(),
            "Failed to remove temporary file"
        );
    }

    match outcome {
        Ok(result) => {
            flow.advance(FlowEvent::Classified).map_err(flow_error)?;
            let (category, likelihood) = result.most_likely();
            tracing::info!(
                flagged = result.is_flagged(),
                most_likely = %category,
                likelihood = %likelihood,
                "Image classified"
            );

            state
                .sessions
                .record_result(
                    session,
                    AnalysisRecord {
                        result,
                        instructions,
                        original_filename,
                        analyzed_at: Utc::now(),
                    },
                )
                .await;
            Ok(())
        }
        Err(e) => {
            flow.advance(FlowEvent::ServiceFailed).map_err(flow_error)?;
            let err = AppError::ExternalService {
                transient: e.is_transient(),
                message: e.to_string(),
            };
            tracing::warn!(
                error = %e,
                transient = e.is_transient(),
                classifier = state.classifier.name(),
                "Classification failed"
            );

            state
                .sessions
                .record_failure(session, err.client_message())
                .await;
            Err(err)
        }
    }
}
