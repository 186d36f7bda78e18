//! The JSON envelope every OSS reply is wrapped in.
//!
//! Handlers build a typed [`ApiResponse`]; the `success` flag and the flat field layout only
//! appear when it is serialized:
//!
//! ```text
//! ApiResponse::Success(UploadRes { url })  ->  {"success": true,  "url": "<stored filename>"}
//! ApiResponse::Failure { error }           ->  {"success": false, "error": "<reason>"}
//! ```

use serde::{Deserialize, Serialize, Serializer};
use utoipa::ToSchema;

/// Tagged result carried by every JSON response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiResponse<T> {
    /// Operation succeeded; the payload's fields are flattened next to `success`.
    Success(T),
    /// Operation failed for the given client-facing reason.
    Failure { error: String },
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self::Success(data)
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Failure {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl<T: Serialize> Serialize for ApiResponse<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct Envelope<'a, T> {
            success: bool,
            #[serde(flatten)]
            data: Option<&'a T>,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<&'a str>,
        }

        let envelope = match self {
            Self::Success(data) => Envelope {
                success: true,
                data: Some(data),
                error: None,
            },
            Self::Failure { error } => Envelope {
                success: false,
                data: None,
                error: Some(error.as_str()),
            },
        };
        envelope.serialize(serializer)
    }
}

/// Payload of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadRes {
    /// Stored filename; fetch it back from `/files/{url}`
    pub url: String,
}

/// OpenAPI shape of `ApiResponse::<UploadRes>::Success`.
#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResBody {
    #[schema(example = true)]
    pub success: bool,
    #[schema(example = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad.txt")]
    pub url: String,
}

/// OpenAPI shape of `ApiResponse::Failure`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResBody {
    #[schema(example = false)]
    pub success: bool,
    #[schema(example = "File not found")]
    pub error: String,
}
