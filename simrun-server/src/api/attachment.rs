//! File download responses

use axum::{
    body::Body,
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use std::path::Path;
use tokio_util::io::ReaderStream;

use crate::api::error::{ApiError, ApiResult};

/// Build an attachment response that streams a file from disk
pub async fn send_file(path: &Path) -> ApiResult<Response> {
    let read_err =
        |e: std::io::Error| ApiError::InternalError(format!("Failed to read {}: {}", path.display(), e));

    let file = tokio::fs::File::open(path).await.map_err(read_err)?;
    let length = file.metadata().await.map_err(read_err)?.len();

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());

    tracing::info!("Downloading {} from {}", file_name, path.display());

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        file_name.replace(['"', '\\'], "_")
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    Ok((
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type(path))),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CONTENT_LENGTH, HeaderValue::from(length)),
        ],
        Body::from_stream(ReaderStream::new(file)),
    )
        .into_response())
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("csv") => "text/csv",
        Some(ext) if ext.eq_ignore_ascii_case("txt") => "text/plain; charset=utf-8",
        Some(ext) if ext.eq_ignore_ascii_case("json") => "application/json",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_send_file_streams_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("b.csv");
        let content = "hour,price\n".to_string() + &"1,42.0\n".repeat(20_000);
        std::fs::write(&path, &content).unwrap();

        let response = send_file(&path).await.unwrap();

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "text/csv");
        assert_eq!(headers[header::CONTENT_DISPOSITION], "attachment; filename=\"b.csv\"");
        assert_eq!(headers[header::CONTENT_LENGTH], content.len().to_string().as_str());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(body, content.as_bytes());
    }

    #[tokio::test]
    async fn test_send_file_missing_is_internal_error() {
        let dir = TempDir::new().unwrap();
        let result = send_file(&dir.path().join("gone.csv")).await;
        assert!(matches!(result, Err(ApiError::InternalError(_))));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type(Path::new("out/b.csv")), "text/csv");
        assert_eq!(content_type(Path::new("out/b.CSV")), "text/csv");
        assert_eq!(content_type(Path::new("out/b.parquet")), "application/octet-stream");
        assert_eq!(content_type(Path::new("out/b")), "application/octet-stream");
    }
}
