//! Wire types shared by the server and its clients.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 envelopes
// ---------------------------------------------------------------------------

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    /// `None` for notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<serde_json::Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    pub fn new(
        id: impl Into<serde_json::Value>,
        method: impl Into<String>,
        params: Option<serde_json::Value>,
    ) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id: Some(id.into()),
            method: method.into(),
            params,
        }
    }
}

impl JsonRpcResponse {
    pub fn success(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: serde_json::Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.into(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

impl JsonRpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// Error codes returned in `JsonRpcError::code`.
///
/// Application codes are small positive numbers; the negative ones are the
/// reserved JSON-RPC 2.0 codes.
pub mod rpc_codes {
    pub const TASK_ID_IS_NOT_SET: i32 = 1;
    pub const ANSWER_IS_NOT_SET: i32 = 2;
    pub const CHECK_ERROR: i32 = 3;
    pub const CREATE_ERROR: i32 = 4;
    pub const HAS_ERROR: i32 = 5;

    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

// ---------------------------------------------------------------------------
// Method params / results
// ---------------------------------------------------------------------------

/// Fields present in every method result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonResult {
    /// Time taken to serve the request, in milliseconds
    pub time_spent: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingResult {
    #[serde(flatten)]
    pub common: CommonResult,
    pub ok: bool,
}

/// Result of `createCaptcha`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCaptchaResult {
    #[serde(flatten)]
    pub common: CommonResult,

    /// Task id the answer is registered under
    pub task_id: String,

    /// Always "PNG"
    pub image_format: String,

    /// True when the image is returned inline instead of being stored
    pub is_image_data_returned: bool,

    /// Base64-encoded image bytes, inline mode only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data_b64: Option<String>,

    /// Unix timestamp after which the answer is swept
    pub expires_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckCaptchaParams {
    #[serde(default)]
    pub task_id: String,
    /// Guessed number of rings
    #[serde(default)]
    pub value: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckCaptchaResult {
    #[serde(flatten)]
    pub common: CommonResult,
    pub task_id: String,
    pub is_success: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HasCaptchaParams {
    #[serde(default)]
    pub task_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HasCaptchaResult {
    #[serde(flatten)]
    pub common: CommonResult,
    pub task_id: String,
    pub is_found: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowDiagnosticDataResult {
    #[serde(flatten)]
    pub common: CommonResult,
    pub total_requests_count: u64,
    pub successful_requests_count: u64,
    /// Answers held by the registry, expired ones included until swept
    pub live_records_count: usize,
}
