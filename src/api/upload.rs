use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::extract::AdminUser;
use super::AppState;
use crate::{EcommerceError, Result};

pub const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

pub async fn upload_image(
    State(s): State<AppState>,
    _admin: AdminUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let bad_form = |e: axum::extract::multipart::MultipartError| EcommerceError::validation(e.body_text());
    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        if field.name() != Some(UPLOAD_FIELD) { continue; }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(bad_form)?;
        let url = s.services.uploads.store(&file_name, &bytes).await?;
        return Ok((StatusCode::CREATED, Json(UploadResponse { url })));
    }
    Err(EcommerceError::validation(format!("multipart field '{UPLOAD_FIELD}' is required")))
}
