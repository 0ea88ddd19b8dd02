//! Exercise route handlers (gated).
//!
//! Create and edit accept multipart form data: text fields plus up to three
//! demo video files (mp4/webm/ogg), written under the media directory and
//! served back at `/media/...`.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rand::RngCore;

use dailyrep_core::ExerciseId;

use crate::db::exercises::{ExerciseRepository, VideoPaths};

/// Request-body cap for the upload routes. A single submission may carry
/// three full-length demo videos, well past axum's stock 2 MB limit.
pub const UPLOAD_BODY_LIMIT: usize = 256 * 1024 * 1024;
use crate::error::AppError;
use crate::models::Exercise;
use crate::routes::auth::MessageQuery;
use crate::state::AppState;

/// Exercise list template.
#[derive(Template, WebTemplate)]
#[template(path = "exercises/index.html")]
pub struct ExercisesTemplate {
    pub exercises: Vec<Exercise>,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// New exercise form template.
#[derive(Template, WebTemplate)]
#[template(path = "exercises/new.html")]
pub struct NewExerciseTemplate {
    pub error: Option<String>,
}

/// Edit exercise form template.
#[derive(Template, WebTemplate)]
#[template(path = "exercises/edit.html")]
pub struct EditExerciseTemplate {
    pub exercise: Exercise,
    pub error: Option<String>,
}

/// Parsed multipart exercise form.
#[derive(Debug, Default)]
struct ExerciseForm {
    name: String,
    description: String,
    videos: VideoPaths,
}

/// List all exercises.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let exercises = ExerciseRepository::new(state.pool()).list().await?;

    Ok(ExercisesTemplate {
        exercises,
        error: query.error,
        success: query.success,
    }
    .into_response())
}

/// Display the new exercise form.
pub async fn new_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    NewExerciseTemplate { error: query.error }
}

/// Handle exercise creation.
pub async fn create(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = read_form(&state, multipart).await?;
    if form.name.is_empty() {
        return Ok(Redirect::to("/exercises/new?error=Name+is+required").into_response());
    }

    ExerciseRepository::new(state.pool())
        .create(&form.name, &form.description, &form.videos)
        .await?;

    Ok(Redirect::to("/exercises?success=Exercise+created").into_response())
}

/// Display the edit form for an exercise.
pub async fn edit_page(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<MessageQuery>,
) -> Result<Response, AppError> {
    let exercise = ExerciseRepository::new(state.pool())
        .get(ExerciseId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("exercise {id}")))?;

    Ok(EditExerciseTemplate {
        exercise,
        error: query.error,
    }
    .into_response())
}

/// Handle exercise update; videos not re-uploaded keep their stored paths.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = read_form(&state, multipart).await?;
    if form.name.is_empty() {
        return Ok(
            Redirect::to(&format!("/exercises/{id}/edit?error=Name+is+required")).into_response(),
        );
    }

    ExerciseRepository::new(state.pool())
        .update(ExerciseId::new(id), &form.name, &form.description, &form.videos)
        .await?;

    Ok(Redirect::to("/exercises?success=Exercise+updated").into_response())
}

/// Handle exercise deletion.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    ExerciseRepository::new(state.pool())
        .delete(ExerciseId::new(id))
        .await?;

    Ok(Redirect::to("/exercises?success=Exercise+deleted").into_response())
}

/// Drain the multipart stream into text fields and stored video files.
async fn read_form(state: &AppState, mut multipart: Multipart) -> Result<ExerciseForm, AppError> {
    let mut form = ExerciseForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart data: {e}")))?
    {
        let Some(name) = field.name().map(ToOwned::to_owned) else {
            continue;
        };

        match name.as_str() {
            "name" => {
                form.name = read_text(field).await?.trim().to_owned();
            }
            "description" => {
                form.description = read_text(field).await?.trim().to_owned();
            }
            "video_mp4" => form.videos.mp4 = save_video(state, field, "mp4").await?,
            "video_webm" => form.videos.webm = save_video(state, field, "webm").await?,
            "video_ogg" => form.videos.ogg = save_video(state, field, "ogv").await?,
            other => {
                tracing::debug!(field = %other, "Ignoring unknown form field");
            }
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid form field: {e}")))
}

/// Write an uploaded video under `<media_dir>/videos/` and return its
/// relative path, or `None` for an empty file input.
async fn save_video(
    state: &AppState,
    field: axum::extract::multipart::Field<'_>,
    extension: &str,
) -> Result<Option<String>, AppError> {
    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid video upload: {e}")))?;

    // Browsers submit empty parts for untouched file inputs.
    if data.is_empty() {
        return Ok(None);
    }

    let mut suffix = [0u8; 8];
    rand::rng().fill_bytes(&mut suffix);
    let relative = format!("videos/{}.{extension}", hex::encode(suffix));

    let target = state.config().media_dir.join(&relative);
    if let Some(parent) = target.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AppError::Internal(format!("media directory unavailable: {e}")))?;
    }
    tokio::fs::write(&target, &data)
        .await
        .map_err(|e| AppError::Internal(format!("failed to store video: {e}")))?;

    tracing::info!(path = %target.display(), bytes = data.len(), "Video stored");
    Ok(Some(relative))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{
        Router,
        body::Body,
        extract::{DefaultBodyLimit, Multipart},
        http::{Request, StatusCode, header},
        routing::post,
    };
    use tower::ServiceExt;

    use super::UPLOAD_BODY_LIMIT;

    const BOUNDARY: &str = "dailyrep-test-boundary";

    /// Drains a multipart body the way the upload handlers do.
    async fn sink(mut multipart: Multipart) -> StatusCode {
        loop {
            match multipart.next_field().await {
                Ok(Some(field)) => {
                    if field.bytes().await.is_err() {
                        return StatusCode::PAYLOAD_TOO_LARGE;
                    }
                }
                Ok(None) => return StatusCode::OK,
                Err(_) => return StatusCode::PAYLOAD_TOO_LARGE,
            }
        }
    }

    fn video_upload_request(bytes: usize) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\n\
                 Content-Disposition: form-data; name=\"video_mp4\"; filename=\"clip.mp4\"\r\n\
                 Content-Type: video/mp4\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(&vec![0u8; bytes]);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/exercises")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_upload_limit_admits_video_sized_bodies() {
        let router = Router::new()
            .route("/exercises", post(sink))
            .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT));

        // Well past the 2 MB default cap a bare router would apply.
        let response = router
            .oneshot(video_upload_request(8 * 1024 * 1024))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_over_the_cap_is_rejected() {
        let router = Router::new()
            .route("/exercises", post(sink))
            .layer(DefaultBodyLimit::max(16 * 1024));

        let response = router
            .oneshot(video_upload_request(1024 * 1024))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
