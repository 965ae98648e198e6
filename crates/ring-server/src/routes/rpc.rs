//! JSON-RPC 2.0 endpoint: POST /rpc

use std::time::Instant;

use axum::{Json, body::Bytes, extract::State};
use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use ring_common::constants::{image_format, methods};
use ring_common::types::rpc_codes;
use ring_common::{
    CheckCaptchaParams, CheckCaptchaResult, CommonResult, CreateCaptchaResult, HasCaptchaParams,
    HasCaptchaResult, JSONRPC_VERSION, JsonRpcError, JsonRpcRequest, JsonRpcResponse, PingResult,
    RingError, ShowDiagnosticDataResult,
};

use crate::captcha::CaptchaImageData;
use crate::state::AppState;

type MethodResult = Result<Value, JsonRpcError>;

/// Handle one JSON-RPC call
pub async fn rpc_handler(State(state): State<AppState>, body: Bytes) -> Json<JsonRpcResponse> {
    let started = Instant::now();
    state.stats.record_request();

    let response = dispatch(&state, &body, started).await;
    if response.error.is_none() {
        state.stats.record_success();
    }

    Json(response)
}

async fn dispatch(state: &AppState, body: &[u8], started: Instant) -> JsonRpcResponse {
    let value: Value = match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            return JsonRpcResponse::error(
                Value::Null,
                JsonRpcError::new(rpc_codes::PARSE_ERROR, format!("Parse error: {e}")),
            );
        }
    };

    let request: JsonRpcRequest = match serde_json::from_value(value) {
        Ok(r) => r,
        Err(e) => {
            return JsonRpcResponse::error(
                Value::Null,
                JsonRpcError::new(rpc_codes::INVALID_REQUEST, format!("Invalid request: {e}")),
            );
        }
    };

    let id = request.id.clone().unwrap_or(Value::Null);
    if request.jsonrpc != JSONRPC_VERSION {
        return JsonRpcResponse::error(
            id,
            JsonRpcError::new(
                rpc_codes::INVALID_REQUEST,
                format!("Unsupported jsonrpc version: {}", request.jsonrpc),
            ),
        );
    }

    let result = match request.method.as_str() {
        methods::PING => ping(started),
        methods::CREATE_CAPTCHA => create_captcha(state, started).await,
        methods::CHECK_CAPTCHA => check_captcha(state, request.params, started),
        methods::HAS_CAPTCHA => has_captcha(state, request.params, started),
        methods::SHOW_DIAGNOSTIC_DATA => show_diagnostic_data(state, started),
        other => Err(JsonRpcError::new(
            rpc_codes::METHOD_NOT_FOUND,
            format!("Method not found: {other}"),
        )),
    };

    match result {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(err) => {
            tracing::debug!(method = %request.method, code = err.code, "RPC call failed");
            JsonRpcResponse::error(id, err)
        }
    }
}

fn common(started: Instant) -> CommonResult {
    CommonResult {
        time_spent: started.elapsed().as_millis() as i64,
    }
}

fn to_value<T: Serialize>(result: &T) -> MethodResult {
    serde_json::to_value(result)
        .map_err(|e| JsonRpcError::new(rpc_codes::INTERNAL_ERROR, format!("Serialization error: {e}")))
}

/// Missing params behave like an empty object, so defaults apply
fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, JsonRpcError> {
    let params = params.unwrap_or_else(|| Value::Object(Default::default()));
    serde_json::from_value(params)
        .map_err(|e| JsonRpcError::new(rpc_codes::INVALID_PARAMS, format!("Invalid params: {e}")))
}

/// Map a service error to an RPC error, `fallback` being the method's own code
fn service_error(fallback: i32, err: &RingError) -> JsonRpcError {
    let code = match err {
        RingError::IdNotSet => rpc_codes::TASK_ID_IS_NOT_SET,
        RingError::AnswerNotSet => rpc_codes::ANSWER_IS_NOT_SET,
        _ => fallback,
    };

    if !err.is_client_error() {
        tracing::warn!(
            error = %err,
            code = code,
            retryable = err.is_retryable(),
            "Captcha service error"
        );
    }

    JsonRpcError::new(code, err.to_string())
}

fn ping(started: Instant) -> MethodResult {
    to_value(&PingResult {
        common: common(started),
        ok: true,
    })
}

async fn create_captcha(state: &AppState, started: Instant) -> MethodResult {
    let manager = state.manager.clone();
    let limit = state.config.captcha.compose_timeout();

    let outcome = tokio::time::timeout(
        limit,
        tokio::task::spawn_blocking(move || manager.create_captcha()),
    )
    .await;

    let created = match outcome {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => Err(RingError::Internal(join_err.to_string())),
        Err(_) => Err(RingError::Timeout(format!(
            "captcha synthesis exceeded {}s",
            limit.as_secs()
        ))),
    }
    .map_err(|e| service_error(rpc_codes::CREATE_ERROR, &e))?;

    let (is_image_data_returned, image_data_b64) = match &created.image {
        CaptchaImageData::Inline(png) => (true, Some(STANDARD.encode(png))),
        CaptchaImageData::Stored(_) => (false, None),
    };

    tracing::info!(task_id = %created.task_id, "🎯 Captcha issued");

    to_value(&CreateCaptchaResult {
        common: common(started),
        task_id: created.task_id,
        image_format: image_format::FORMAT_NAME.to_string(),
        is_image_data_returned,
        image_data_b64,
        expires_at: created.expires_at,
    })
}

fn check_captcha(state: &AppState, params: Option<Value>, started: Instant) -> MethodResult {
    let params: CheckCaptchaParams = parse_params(params)?;

    let is_success = state
        .manager
        .check_answer(&params.task_id, params.value)
        .map_err(|e| service_error(rpc_codes::CHECK_ERROR, &e))?;

    to_value(&CheckCaptchaResult {
        common: common(started),
        task_id: params.task_id,
        is_success,
    })
}

fn has_captcha(state: &AppState, params: Option<Value>, started: Instant) -> MethodResult {
    let params: HasCaptchaParams = parse_params(params)?;

    let is_found = state
        .manager
        .has_answer(&params.task_id)
        .map_err(|e| service_error(rpc_codes::HAS_ERROR, &e))?;

    to_value(&HasCaptchaResult {
        common: common(started),
        task_id: params.task_id,
        is_found,
    })
}

fn show_diagnostic_data(state: &AppState, started: Instant) -> MethodResult {
    to_value(&ShowDiagnosticDataResult {
        common: common(started),
        total_requests_count: state.stats.total(),
        successful_requests_count: state.stats.successful(),
        live_records_count: state.manager.registry_len(),
    })
}
