//! JSON request/response boundary.
//!
//! Every request is a JSON envelope:
//!
//! ```text
//! { "action": "get-file", "version": 1, "params": { "application": "tf2", "path": "..." } }
//! ```
//!
//! and every response, successful or not, is
//!
//! ```text
//! { "success": true,  "result": { ... } }
//! { "success": false, "error": "invalid param path", "code": "unknown_path" }
//! ```
//!
//! [`handle`] is the only place resolver failures become client-facing
//! errors. Internal detail (archive paths, codec messages) is logged and
//! never returned.

use std::fmt;

use base64::Engine;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::archive::ArchiveCodec;
use crate::collection::CollectionSummary;
use crate::index::ContentIndex;
use crate::resolver::{ContentResolver, ResolveError};

/// Errors reported to API clients.
///
/// The `Display` text of each variant is the stable client-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("invalid param application")]
    UnknownCollection,

    #[error("invalid param path")]
    UnknownPath,

    #[error("invalid param extension")]
    InvalidExtension,

    #[error("file is currently unreadable")]
    ReadFailure,

    #[error("no params provided")]
    NoParams,

    #[error("bad request")]
    BadRequest,

    #[error("Not found")]
    NotFound,

    #[error("unexpected error, contact support")]
    Internal,
}

impl ApiError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::UnknownCollection => "unknown_collection",
            ApiError::UnknownPath => "unknown_path",
            ApiError::InvalidExtension => "invalid_extension",
            ApiError::ReadFailure => "read_failure",
            ApiError::NoParams => "no_params",
            ApiError::BadRequest => "bad_request",
            ApiError::NotFound => "not_found",
            ApiError::Internal => "internal_error",
        }
    }
}

impl From<&ResolveError> for ApiError {
    fn from(err: &ResolveError) -> Self {
        match err {
            ResolveError::UnknownCollection(_) => ApiError::UnknownCollection,
            ResolveError::UnknownPath { .. } => ApiError::UnknownPath,
            ResolveError::InvalidExtension => ApiError::InvalidExtension,
            ResolveError::ReadFailure { .. } => ApiError::ReadFailure,
        }
    }
}

/// Wire shape of a request before validation.
#[derive(Debug, Deserialize)]
struct RawRequest {
    action: String,
    version: i64,
    #[serde(default)]
    params: Option<Map<String, Value>>,
}

/// A validated API request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    /// `get-application-list`
    ListCollections,
    /// `get-file-list`
    ListFiles { application: String },
    /// `get-file`
    GetFile { application: String, path: String },
    /// `concat-files`
    ConcatFiles {
        application: String,
        extension: String,
    },
}

impl ApiRequest {
    /// Parse and validate a JSON request body.
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        let raw: RawRequest = serde_json::from_slice(body).map_err(|e| {
            debug!(error = %e, "Malformed request body");
            ApiError::BadRequest
        })?;
        debug!(action = %raw.action, version = raw.version, "Request received");

        let params = raw.params.as_ref();
        match raw.action.as_str() {
            "get-application-list" => Ok(ApiRequest::ListCollections),
            "get-file-list" => {
                let params = params.ok_or(ApiError::NoParams)?;
                Ok(ApiRequest::ListFiles {
                    application: string_param(params, "application", ApiError::UnknownCollection)?,
                })
            }
            "get-file" => {
                let params = params.ok_or(ApiError::NoParams)?;
                Ok(ApiRequest::GetFile {
                    application: string_param(params, "application", ApiError::UnknownCollection)?,
                    path: string_param(params, "path", ApiError::UnknownPath)?,
                })
            }
            "concat-files" => {
                let params = params.ok_or(ApiError::NoParams)?;
                Ok(ApiRequest::ConcatFiles {
                    application: string_param(params, "application", ApiError::UnknownCollection)?,
                    extension: string_param(params, "extension", ApiError::InvalidExtension)?,
                })
            }
            _ => Err(ApiError::NotFound),
        }
    }

    /// Wire name of the action.
    pub fn action(&self) -> &'static str {
        match self {
            ApiRequest::ListCollections => "get-application-list",
            ApiRequest::ListFiles { .. } => "get-file-list",
            ApiRequest::GetFile { .. } => "get-file",
            ApiRequest::ConcatFiles { .. } => "concat-files",
        }
    }
}

fn string_param(params: &Map<String, Value>, key: &str, err: ApiError) -> Result<String, ApiError> {
    params
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(err)
}

/// Collection listing, serialized as an `alias → display name` object in
/// configured order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applications(pub Vec<CollectionSummary>);

impl Serialize for Applications {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for summary in &self.0 {
            map.serialize_entry(&summary.alias, &summary.display_name)?;
        }
        map.end()
    }
}

/// Payload of a successful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ApiResult {
    Applications { applications: Applications },
    Files { files: Vec<String> },
    Content { content: String },
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<ApiResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
}

impl ApiResponse {
    /// Successful response.
    pub fn success(result: ApiResult) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            code: None,
        }
    }

    /// Failed response.
    pub fn failure(err: ApiError) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(err.to_string()),
            code: Some(err.code()),
        }
    }

    /// Whether this is a success envelope.
    pub fn is_success(&self) -> bool {
        self.success
    }

    /// Payload of a success envelope.
    pub fn result(&self) -> Option<&ApiResult> {
        self.result.as_ref()
    }

    /// Error code of a failure envelope.
    pub fn code(&self) -> Option<&'static str> {
        self.code
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Vec<u8> {
        match serde_json::to_vec(self) {
            Ok(body) => body,
            Err(e) => {
                warn!(error = %e, "Failed to serialize response");
                INTERNAL_ERROR_BODY.as_bytes().to_vec()
            }
        }
    }
}

impl fmt::Display for ApiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.to_json()))
    }
}

/// Fallback body when a response cannot be serialized.
pub const INTERNAL_ERROR_BODY: &str =
    r#"{"success":false,"error":"unexpected error, contact support","code":"internal_error"}"#;

/// Execute a validated request.
pub fn dispatch(index: &ContentIndex, codec: &dyn ArchiveCodec, request: ApiRequest) -> ApiResponse {
    let resolver = ContentResolver::new(index, codec);

    let result = match request {
        ApiRequest::ListCollections => Ok(ApiResult::Applications {
            applications: Applications(resolver.list_collections()),
        }),
        ApiRequest::ListFiles { application } => resolver
            .list_files(&application)
            .map(|files| ApiResult::Files {
                files: files.to_vec(),
            }),
        ApiRequest::GetFile { application, path } => {
            resolver
                .resolve(&application, &path)
                .map(|data| ApiResult::Content {
                    content: base64::engine::general_purpose::STANDARD.encode(data),
                })
        }
        ApiRequest::ConcatFiles {
            application,
            extension,
        } => resolver
            .concat_by_extension(&application, &extension)
            .map(|content| ApiResult::Content { content }),
    };

    match result {
        Ok(result) => ApiResponse::success(result),
        Err(e) => {
            match &e {
                ResolveError::ReadFailure { .. } => warn!(error = %e, "Indexed file could not be read"),
                _ => debug!(error = %e, "Request rejected"),
            }
            ApiResponse::failure(ApiError::from(&e))
        }
    }
}

/// Parse a raw request body and execute it.
///
/// The parsed action is recorded on the current span's `action` field.
pub fn handle(index: &ContentIndex, codec: &dyn ArchiveCodec, body: &[u8]) -> ApiResponse {
    match ApiRequest::parse(body) {
        Ok(request) => {
            tracing::Span::current().record("action", request.action());
            dispatch(index, codec, request)
        }
        Err(e) => ApiResponse::failure(e),
    }
}
