use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::post,
    Router,
};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::application_service::account_service::AccountServiceError;
use crate::domain::account::AccountError;
use crate::domain::pub_key::PubKeyError;

use super::AppState;

#[derive(Deserialize)]
pub struct ValidatePubKeyRequest {
    pub type_url: String,
    pub key_base64: String,
}

#[derive(Serialize)]
pub struct ValidatePubKeyResponse {
    pub pub_key_type: String,
    pub key_base64: String,
}

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub type_url: String,
    pub key_base64: String,
    pub message_base64: String,
    pub signature_base64: String,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub verified: bool,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pubkeys/validate", post(validate_pub_key))
        .route("/accounts/verify", post(verify_signature))
}

fn decode_base64(field: &str, value: &str) -> Result<Vec<u8>, (StatusCode, String)> {
    BASE64_STANDARD
        .decode(value)
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("invalid {field}: {e}")))
}

fn error_response(e: AccountServiceError) -> (StatusCode, String) {
    let status = match &e {
        AccountServiceError::Account(AccountError::PubKey(PubKeyError::InvalidPublicKey(_))) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        AccountServiceError::Account(AccountError::SignatureVerificationFailed) => {
            StatusCode::UNAUTHORIZED
        }
        AccountServiceError::Account(AccountError::PubKey(_))
        | AccountServiceError::Account(AccountError::MissingPubKey) => StatusCode::BAD_REQUEST,
        AccountServiceError::Account(AccountError::AlreadyInitialized)
        | AccountServiceError::Account(AccountError::NotInitialized) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, e.to_string())
}

async fn validate_pub_key(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ValidatePubKeyRequest>,
) -> Result<Json<ValidatePubKeyResponse>, (StatusCode, String)> {
    let key_bytes = decode_base64("key_base64", &req.key_base64)?;

    let info = state
        .account_service
        .validate(&req.type_url, &key_bytes)
        .map_err(error_response)?;

    Ok(Json(ValidatePubKeyResponse {
        pub_key_type: info.pub_key_type,
        key_base64: BASE64_STANDARD.encode(&info.key_bytes),
    }))
}

async fn verify_signature(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, (StatusCode, String)> {
    let key_bytes = decode_base64("key_base64", &req.key_base64)?;
    let message = decode_base64("message_base64", &req.message_base64)?;
    let signature = decode_base64("signature_base64", &req.signature_base64)?;

    state
        .account_service
        .verify(&req.type_url, &key_bytes, &message, &signature)
        .map_err(error_response)?;

    Ok(Json(VerifyResponse { verified: true }))
}
