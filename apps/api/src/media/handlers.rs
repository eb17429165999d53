use axum::{
    extract::{Multipart, State},
    Extension, Json,
};
use bytes::Bytes;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::auth::Identity;
use crate::errors::AppError;
use crate::state::AppState;
use crate::store::{paths, WriteBatch};

/// Largest accepted video pitch.
pub const MAX_VIDEO_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub url: String,
    pub key: String,
}

struct VideoPart {
    content_type: String,
    file_name: Option<String>,
    data: Bytes,
}

/// POST /api/upload/video
///
/// Multipart form with a `video` file part and an optional `userId` text part.
/// The URL is merged into the caller's profile as `videoUrl`.
pub async fn handle_upload_video(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut video: Option<VideoPart> = None;
    let mut claimed_user: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart body: {e}")))?
    {
        match field.name() {
            Some("video") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let file_name = field.file_name().map(String::from);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read video: {e}")))?;
                video = Some(VideoPart {
                    content_type,
                    file_name,
                    data,
                });
            }
            Some("userId") => {
                claimed_user = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::Validation(format!("Invalid userId: {e}")))?,
                );
            }
            _ => {}
        }
    }

    identity.ensure_matches(claimed_user.as_deref())?;

    let video = video.ok_or_else(|| AppError::Validation("A 'video' file is required".into()))?;
    validate_video(&video)?;

    let key = format!(
        "videos/{}/{}.{}",
        identity.user_id,
        Uuid::new_v4(),
        extension_for(&video.content_type, video.file_name.as_deref())
    );
    let url = state
        .media
        .put(&key, &video.content_type, video.data)
        .await?;

    let mut fields = Map::new();
    fields.insert("videoUrl".into(), Value::String(url.clone()));
    fields.insert("updatedAt".into(), json!(Utc::now()));
    let mut batch = WriteBatch::new();
    batch.merge(paths::user(&identity.user_id), fields);
    state.store.commit(batch).await?;

    Ok(Json(UploadResponse {
        message: "Video uploaded".to_string(),
        url,
        key,
    }))
}

fn validate_video(video: &VideoPart) -> Result<(), AppError> {
    if !video.content_type.starts_with("video/") {
        return Err(AppError::Validation(format!(
            "Expected a video upload, got '{}'",
            video.content_type
        )));
    }
    if video.data.is_empty() {
        return Err(AppError::Validation("Video is empty".into()));
    }
    if video.data.len() > MAX_VIDEO_BYTES {
        return Err(AppError::Validation(format!(
            "Video exceeds {} MiB",
            MAX_VIDEO_BYTES / (1024 * 1024)
        )));
    }
    Ok(())
}

fn extension_for(content_type: &str, file_name: Option<&str>) -> String {
    let from_name = file_name
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()));
    from_name.unwrap_or_else(|| match content_type {
        "video/mp4" => "mp4".to_string(),
        "video/quicktime" => "mov".to_string(),
        _ => "webm".to_string(),
    })
}
