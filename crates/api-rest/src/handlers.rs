//! Request handlers.

use crate::error::{ApiError, NO_FILE_PART};
use crate::openapi::UploadForm;
use crate::{AppState, FILE_FIELD};
use api_shared::{ApiResponse, ErrorResBody, HealthRes, HealthService, UploadRes, UploadResBody};
use axum::{
    body::Bytes,
    extract::{
        multipart::{Multipart, MultipartRejection},
        rejection::PathRejection,
        Path as AxumPath, State,
    },
    http::header,
    response::{IntoResponse, Json, Response},
};

/// Blobs never change once written, so clients may cache them forever.
const IMMUTABLE_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
pub(crate) async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/upload",
    request_body(content = UploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Stored (or already present)", body = UploadResBody),
        (status = 400, description = "No file part, blank filename, empty file or unsafe extension", body = ErrorResBody),
        (status = 413, description = "Request body over the configured limit", body = ErrorResBody),
        (status = 500, description = "Storage failure", body = ErrorResBody)
    )
)]
/// Store an uploaded file under its content-derived name
///
/// Reads the multipart field `file`, hashes its bytes and writes them if no blob with that
/// name exists yet. Uploading identical content again returns the same name without writing.
///
/// # Returns
/// * `Ok(Json<ApiResponse<UploadRes>>)` - `{success: true, url: <stored filename>}`
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the body is not multipart or has no `file` part,
/// - the part has an empty filename, empty content or an unsafe extension.
///
/// Returns `500 Internal Server Error` if the blob cannot be written.
#[axum::debug_handler]
pub(crate) async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ApiResponse<UploadRes>>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::debug!(error = %e, "upload is not a multipart request");
        ApiError::BadRequest(NO_FILE_PART.into())
    })?;

    let (filename, bytes) = read_file_field(&mut multipart).await?;

    let store = state.store.clone();
    let outcome = tokio::task::spawn_blocking(move || store.put(&bytes, &filename)).await??;

    tracing::info!(
        url = %outcome.stored_filename,
        created = outcome.created,
        size = outcome.size_bytes,
        "upload accepted"
    );

    Ok(Json(ApiResponse::success(UploadRes {
        url: outcome.stored_filename.to_string(),
    })))
}

#[utoipa::path(
    get,
    path = "/files/{filename}",
    params(
        ("filename" = String, Path, description = "Stored filename returned by an upload")
    ),
    responses(
        (status = 200, description = "Raw file bytes; Content-Type follows the stored extension"),
        (status = 400, description = "Unsafe file name", body = ErrorResBody),
        (status = 404, description = "File not found", body = ErrorResBody),
        (status = 500, description = "Storage failure", body = ErrorResBody)
    )
)]
/// Serve a stored file by name
///
/// The content type is inferred from the stored extension. Responses are marked immutable and
/// carry the content identifier as their `ETag`.
///
/// # Errors
/// Returns `400 Bad Request` for names containing separators, `..` or a leading dot, and
/// `404 Not Found` for names that were never stored.
#[axum::debug_handler]
pub(crate) async fn get_file(
    State(state): State<AppState>,
    filename: Result<AxumPath<String>, PathRejection>,
) -> Result<Response, ApiError> {
    let AxumPath(filename) = filename.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let store = state.store.clone();
    let blob = tokio::task::spawn_blocking(move || store.fetch(&filename)).await??;

    let headers = [
        (header::CONTENT_TYPE, blob.media_type()),
        (header::CACHE_CONTROL, IMMUTABLE_CACHE_CONTROL.to_string()),
        (header::ETAG, format!("\"{}\"", blob.name.content_id())),
    ];

    Ok((headers, blob.bytes).into_response())
}

/// Fallback for unknown routes, so even those answer with the JSON envelope.
pub(crate) async fn not_found() -> ApiError {
    ApiError::RouteNotFound
}

/// Pulls the first `file` part out of a multipart body.
///
/// Other parts are skipped. A `file` part without a filename yields an empty name, which the
/// store rejects as a missing filename.
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_owned();
        let bytes = field.bytes().await?;
        return Ok((filename, bytes));
    }

    Err(ApiError::BadRequest(NO_FILE_PART.into()))
}

#[cfg(test)]
mod tests {
    use crate::{router, AppState};
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use oss_core::CoreConfig;
    use std::sync::Arc;
    use tempfile::TempDir;
    use tower::ServiceExt;

    const ABC_TXT: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad.txt";
    const BOUNDARY: &str = "oss-test-boundary";

    fn test_app(temp: &TempDir, max_upload_bytes: usize) -> (Router, AppState) {
        let cfg = CoreConfig::new(
            temp.path().join("uploads"),
            "127.0.0.1:0".parse().unwrap(),
            max_upload_bytes,
        )
        .unwrap();
        let state = AppState::from_config(Arc::new(cfg)).unwrap();
        (router(state.clone()), state)
    }

    fn multipart_request(
        uri: &str,
        field: &str,
        filename: Option<&str>,
        content: &[u8],
    ) -> Request<Body> {
        let disposition = match filename {
            Some(filename) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, filename
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", field),
        };

        let mut body = Vec::new();
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(content);
        body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    async fn upload(app: &Router, filename: &str, content: &[u8]) -> serde_json::Value {
        let resp = app
            .clone()
            .oneshot(multipart_request("/upload", "file", Some(filename), content))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        json_body(resp).await
    }

    #[tokio::test]
    async fn test_upload_returns_content_derived_name() {
        let temp = TempDir::new().unwrap();
        let (app, _) = test_app(&temp, 1024 * 1024);

        let body = upload(&app, "a.txt", b"abc").await;

        assert_eq!(body, serde_json::json!({"success": true, "url": ABC_TXT}));
    }

    #[tokio::test]
    async fn test_upload_twice_is_deduplicated() {
        let temp = TempDir::new().unwrap();
        let (app, state) = test_app(&temp, 1024 * 1024);

        let first = upload(&app, "a.txt", b"abc").await;
        let second = upload(&app, "b.txt", b"abc").await;

        assert_eq!(first["url"], second["url"]);
        assert_eq!(state.store().list().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_fetch_returns_exact_bytes_with_headers() {
        let temp = TempDir::new().unwrap();
        let (app, _) = test_app(&temp, 1024 * 1024);
        upload(&app, "a.txt", b"abc").await;

        let resp = app
            .oneshot(get_request(&format!("/files/{}", ABC_TXT)))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers().clone();
        assert!(headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        assert_eq!(
            headers[header::ETAG].to_str().unwrap(),
            format!("\"{}\"", &ABC_TXT[..64])
        );
        assert!(headers[header::CACHE_CONTROL]
            .to_str()
            .unwrap()
            .contains("immutable"));

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"abc");
    }

    #[tokio::test]
    async fn test_binary_round_trip() {
        let temp = TempDir::new().unwrap();
        let (app, _) = test_app(&temp, 1024 * 1024);
        let data: Vec<u8> = (0..=255).cycle().take(4096).collect();

        let body = upload(&app, "blob.bin", &data).await;
        let url = body["url"].as_str().unwrap().to_string();

        let resp = app
            .oneshot(get_request(&format!("/files/{}", url)))
            .await
            .unwrap();
        let fetched = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(fetched.to_vec(), data);
    }

    #[tokio::test]
    async fn test_fetch_unknown_is_json_404() {
        let temp = TempDir::new().unwrap();
        let (app, _) = test_app(&temp, 1024 * 1024);

        let resp = app
            .oneshot(get_request(&format!("/files/{}", ABC_TXT)))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json_body(resp).await,
            serde_json::json!({"success": false, "error": "File not found"})
        );
    }

    #[tokio::test]
    async fn test_fetch_traversal_is_rejected() {
        let temp = TempDir::new().unwrap();
        let (app, _) = test_app(&temp, 1024 * 1024);
        std::fs::write(temp.path().join("secret.txt"), b"top secret").unwrap();

        for uri in [
            "/files/..%2Fsecret.txt",
            "/files/..%5Csecret.txt",
            "/files/%2Fetc%2Fpasswd",
            "/files/.upload-abc.tmp",
        ] {
            let resp = app.clone().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", uri);
            let body = json_body(resp).await;
            assert_eq!(body["success"], false);
        }
    }

    #[tokio::test]
    async fn test_upload_without_file_part() {
        let temp = TempDir::new().unwrap();
        let (app, _) = test_app(&temp, 1024 * 1024);

        let resp = app
            .oneshot(multipart_request("/upload", "other", Some("a.txt"), b"abc"))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(resp).await,
            serde_json::json!({"success": false, "error": "No file part"})
        );
    }

    #[tokio::test]
    async fn test_upload_non_multipart_body() {
        let temp = TempDir::new().unwrap();
        let (app, _) = test_app(&temp, 1024 * 1024);

        let req = Request::builder()
            .method("POST")
            .uri("/upload")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(resp).await["error"], "No file part");
    }

    #[tokio::test]
    async fn test_upload_with_empty_filename() {
        let temp = TempDir::new().unwrap();
        let (app, _) = test_app(&temp, 1024 * 1024);

        for filename in [Some(""), None] {
            let resp = app
                .clone()
                .oneshot(multipart_request("/upload", "file", filename, b"abc"))
                .await
                .unwrap();

            assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json_body(resp).await["error"], "No selected file");
        }
    }

    #[tokio::test]
    async fn test_upload_rejects_empty_and_unsafe_input() {
        let temp = TempDir::new().unwrap();
        let (app, state) = test_app(&temp, 1024 * 1024);

        for (filename, content) in [
            ("empty.txt", &b""[..]),
            ("../../escape.txt", &b"abc"[..]),
            ("bad.ex t", &b"abc"[..]),
        ] {
            let resp = app
                .clone()
                .oneshot(multipart_request("/upload", "file", Some(filename), content))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "{}", filename);
            assert_eq!(json_body(resp).await["success"], false);
        }

        assert!(state.store().list().unwrap().is_empty());
        assert!(!temp.path().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn test_upload_over_limit_is_413() {
        let temp = TempDir::new().unwrap();
        let (app, state) = test_app(&temp, 1024);

        let resp = app
            .oneshot(multipart_request(
                "/upload",
                "file",
                Some("big.bin"),
                &vec![1u8; 4096],
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(json_body(resp).await["success"], false);
        assert!(state.store().list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_legacy_image_routes() {
        let temp = TempDir::new().unwrap();
        let (app, _) = test_app(&temp, 1024 * 1024);
        let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

        let resp = app
            .clone()
            .oneshot(multipart_request(
                "/api/v1/images/upload",
                "file",
                Some("logo.png"),
                &png,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let url = json_body(resp).await["url"].as_str().unwrap().to_string();
        assert!(url.ends_with(".png"));

        let resp = app
            .oneshot(get_request(&format!("/api/v1/images/{}", url)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "image/png");
    }

    #[tokio::test]
    async fn test_concurrent_uploads_store_one_blob() {
        let temp = TempDir::new().unwrap();
        let (app, state) = test_app(&temp, 1024 * 1024);
        let content = vec![42u8; 64 * 1024];

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let app = app.clone();
                let req = multipart_request("/upload", "file", Some(&format!("{}.dat", i)), &content);
                tokio::spawn(async move { app.oneshot(req).await.unwrap() })
            })
            .collect();

        let mut urls = Vec::new();
        for task in tasks {
            let resp = task.await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            urls.push(json_body(resp).await["url"].clone());
        }

        assert!(urls.windows(2).all(|w| w[0] == w[1]));
        let blobs = state.store().list().unwrap();
        assert_eq!(blobs.len(), 1);
        assert_eq!(blobs[0].size_bytes, content.len() as u64);
        let entries = std::fs::read_dir(state.store().root()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_health_and_unknown_route() {
        let temp = TempDir::new().unwrap();
        let (app, _) = test_app(&temp, 1024);

        let resp = app.clone().oneshot(get_request("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["ok"], true);

        let resp = app.oneshot(get_request("/nope/at/all")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(resp).await["success"], false);
    }
}
