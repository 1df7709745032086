use axum::body::Bytes;
use axum::extract::Multipart;
use tracing::{debug, warn};

use crate::responses::ApiError;

pub const MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Reads the only file part of a multipart form. Non-file fields are ignored.
/// Zero or several file parts are rejected.
pub async fn single_file(mut multipart: Multipart) -> Result<Bytes, ApiError> {
    let mut files = Vec::with_capacity(1);

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!("could not read multipart form: {e}");
        ApiError::bad_request(format!("invalid multipart form: {e}"))
    })? {
        if field.file_name().is_none() {
            continue;
        }

        let name = field.file_name().map(str::to_owned).unwrap_or_default();
        let bytes = field.bytes().await.map_err(|e| {
            warn!("could not read uploaded file '{name}': {e}");
            ApiError::bad_request(format!("could not read uploaded file: {e}"))
        })?;
        debug!("received file '{name}' ({} bytes)", bytes.len());
        files.push(bytes);
    }

    match files.len() {
        1 => Ok(files.remove(0)),
        n => {
            warn!("expected exactly one file, got {n}");
            Err(ApiError::bad_request("exactly one file is required"))
        }
    }
}
