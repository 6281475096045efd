//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

use payments_types::{
    CardNumber, ErrorResponse, PayRequest, PaymentError, PaymentRepository, PaymentRequest,
    PaymentResponse, TransactionResponse,
};

use crate::PaymentService;

/// Header carrying the caller's idempotency key. Wins over the body field.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

/// Application state shared across handlers.
pub struct AppState<R: PaymentRepository> {
    pub service: PaymentService<R>,
}

/// Error returned by handlers; maps onto status codes and [`ErrorResponse`].
pub enum ApiError {
    Payment(PaymentError),
    NotFound(String),
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError::Payment(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::NotFound(reason) => {
                let body = ErrorResponse {
                    bank: None,
                    error: "NOT_FOUND".to_string(),
                    reason,
                    code: StatusCode::NOT_FOUND.as_u16(),
                    balance: None,
                };
                return (StatusCode::NOT_FOUND, Json(body)).into_response();
            }
            ApiError::Payment(err) => err,
        };

        let status = match &err {
            PaymentError::InvalidRequest(_) | PaymentError::UnsupportedBank { .. } => {
                StatusCode::BAD_REQUEST
            }
            PaymentError::AccountNotFound { .. } => StatusCode::NOT_FOUND,
            PaymentError::DuplicateRequest { .. } => StatusCode::CONFLICT,
            PaymentError::InsufficientFunds { .. }
            | PaymentError::BankValidationFailed { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            PaymentError::BankUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            PaymentError::ProcessingTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            PaymentError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let bank = match &err {
            PaymentError::InsufficientFunds { bank, .. }
            | PaymentError::UnsupportedBank { bank }
            | PaymentError::BankValidationFailed { bank, .. } => Some(bank.clone()),
            PaymentError::BankUnavailable { bank } => Some(bank.name().to_string()),
            _ => None,
        };

        let balance = match &err {
            PaymentError::ProcessingTimeout { balance, .. } => Some(*balance),
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!(error = %err, "Request failed");
        }

        let reason = match &err {
            // Store details stay in the logs
            PaymentError::Store(_) => "Internal storage error".to_string(),
            PaymentError::BankValidationFailed { reason, .. } => reason.clone(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            bank,
            error: err.kind().to_string(),
            reason,
            code: status.as_u16(),
            balance,
        };

        (status, Json(body)).into_response()
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// Authorize a card payment.
#[tracing::instrument(skip(state, headers, req), fields(bank = %req.bank, amount = req.amount))]
pub async fn pay<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    headers: HeaderMap,
    Json(req): Json<PayRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let header_key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .map(|v| {
            v.to_str().map(str::to_string).map_err(|_| {
                PaymentError::InvalidRequest("Idempotency-Key header is not valid ASCII".into())
            })
        })
        .transpose()?;

    let idempotency_key = header_key.or(req.idempotency_key).ok_or_else(|| {
        PaymentError::InvalidRequest(
            "An idempotency key is required (Idempotency-Key header or idempotencyKey field)"
                .into(),
        )
    })?;

    let card = CardNumber::new(req.card_number)?;
    let request = PaymentRequest::new(card, req.bank, req.amount, idempotency_key);

    let authorization = state.service.authorize(request).await?;
    Ok(Json(PaymentResponse::from(authorization)))
}

/// Get the ledger entry recorded for an idempotency key.
#[tracing::instrument(skip(state))]
pub async fn get_transaction<R: PaymentRepository>(
    State(state): State<Arc<AppState<R>>>,
    Path(idempotency_key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state
        .service
        .find_transaction(&idempotency_key)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!(
                "No transaction for idempotency key {}",
                idempotency_key
            ))
        })?;

    Ok(Json(TransactionResponse::from(entry)))
}
