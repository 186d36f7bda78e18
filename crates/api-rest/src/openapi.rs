use crate::handlers;
use api_shared::{ErrorResBody, HealthRes, UploadRes, UploadResBody};
use utoipa::{OpenApi, ToSchema};

/// Multipart form accepted by the upload endpoints.
#[derive(ToSchema)]
#[allow(dead_code)]
pub(crate) struct UploadForm {
    /// File contents; the part's filename supplies the stored extension
    #[schema(value_type = String, format = Binary)]
    file: Vec<u8>,
}

#[derive(OpenApi)]
#[openapi(
    paths(handlers::health, handlers::upload, handlers::get_file),
    components(schemas(HealthRes, UploadRes, UploadResBody, ErrorResBody, UploadForm))
)]
pub struct ApiDoc;
