//! services/api/src/web/upload.rs
//!
//! Pulls the `audio` part out of a multipart form.

use axum::extract::multipart::{Multipart, MultipartError};
use nutrifit_core::AudioUpload;

/// Name of the multipart field carrying the recording.
pub const AUDIO_FIELD: &str = "audio";

const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Reads the first `audio` field. Returns `Ok(None)` when the form has none.
///
/// The file name and content type are passed through as declared; an empty file
/// name is left for the analysis service to reject.
pub async fn read_audio_upload(
    multipart: &mut Multipart,
) -> Result<Option<AudioUpload>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let mime_type = field
            .content_type()
            .unwrap_or(FALLBACK_MIME_TYPE)
            .to_string();
        let data = field.bytes().await?;

        return Ok(Some(AudioUpload {
            file_name,
            mime_type,
            data,
        }));
    }
    Ok(None)
}
