//! HTTP Handlers

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::{Deserialize, Serialize};

use cart_checkout::{CheckoutError, CheckoutStatus, CustomerInfo, OrderTotals, Redirect, ValidationErrors};
use cart_core::{
    compute_offer_totals, CartLine, CartLineInput, CartStore, CartSummary, Course, IncludedCourse,
    OfferChoice, OfferTotals,
};
use cart_payments::{PaymentError, PaymentStatus, SIGNATURE_HEADER};

use crate::state::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub callbacks_configured: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<ValidationErrors>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            fields: None,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub summary: CartSummary,
    pub totals: OrderTotals,
}

#[derive(Debug, Deserialize)]
pub struct AddCourseRequest {
    pub course: Course,
    #[serde(default)]
    pub choice: OfferChoice,
}

#[derive(Debug, Deserialize)]
pub struct UpdateQuantityRequest {
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferTotalsRequest {
    pub included_courses: Vec<IncludedCourse>,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub errors: ValidationErrors,
}

#[derive(Debug, Deserialize)]
pub struct ReturnQuery {
    pub transaction_ref: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationResponse {
    pub transaction_ref: String,
    pub status: PaymentStatus,
    pub cart_cleared: bool,
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        callbacks_configured: state.callbacks.is_some(),
    })
}

pub async fn get_cart(State(state): State<AppState>) -> Json<CartResponse> {
    let cart = state.cart.read().await;
    Json(cart_response(&state, &cart))
}

pub async fn add_item(State(state): State<AppState>, Json(line): Json<CartLineInput>) -> Json<CartResponse> {
    let mut cart = state.cart.write().await;
    cart.add_item(line);
    Json(cart_response(&state, &cart))
}

/// Add a course, or its whole bundle when requested and available
pub async fn add_course(State(state): State<AppState>, Json(payload): Json<AddCourseRequest>) -> Json<CartResponse> {
    let mut cart = state.cart.write().await;
    cart.add_course(&payload.course, payload.choice);
    Json(cart_response(&state, &cart))
}

pub async fn update_quantity(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Json<CartResponse> {
    let mut cart = state.cart.write().await;
    cart.update_quantity(&course_id, payload.quantity);
    Json(cart_response(&state, &cart))
}

pub async fn remove_item(State(state): State<AppState>, Path(course_id): Path<String>) -> Json<CartResponse> {
    let mut cart = state.cart.write().await;
    cart.remove_item(&course_id);
    Json(cart_response(&state, &cart))
}

pub async fn clear_cart(State(state): State<AppState>) -> Json<CartResponse> {
    let mut cart = state.cart.write().await;
    cart.clear();
    Json(cart_response(&state, &cart))
}

pub async fn offer_totals(Json(payload): Json<OfferTotalsRequest>) -> Json<OfferTotals> {
    Json(compute_offer_totals(&payload.included_courses))
}

pub async fn validate_customer(
    State(state): State<AppState>,
    Json(customer): Json<CustomerInfo>,
) -> Json<ValidateResponse> {
    let errors = state.checkout.validate(&customer);
    Json(ValidateResponse {
        valid: errors.is_empty(),
        errors,
    })
}

/// Submit the order and hand back the hosted payment page
pub async fn submit_checkout(
    State(state): State<AppState>,
    Json(customer): Json<CustomerInfo>,
) -> Result<Json<Redirect>, ApiError> {
    let snapshot = state.cart.read().await.snapshot();

    let redirect = state
        .checkout
        .submit_order(&customer, &snapshot)
        .await
        .map_err(checkout_error)?;

    Ok(Json(redirect))
}

pub async fn checkout_status(State(state): State<AppState>) -> Json<CheckoutStatus> {
    Json(state.checkout.status())
}

/// Landing page after the hosted payment page
pub async fn payment_return(
    State(state): State<AppState>,
    Query(query): Query<ReturnQuery>,
) -> Result<Json<ConfirmationResponse>, ApiError> {
    confirm(&state, query.transaction_ref).await.map(Json)
}

/// Signed notification from the gateway
pub async fn payment_callback(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<ConfirmationResponse>, ApiError> {
    let verifier = state.callbacks.as_ref().ok_or_else(|| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ErrorResponse::new("Payment callbacks not configured", "CALLBACKS_DISABLED")),
        )
    })?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Missing callback signature", "MISSING_SIGNATURE")),
            )
        })?;

    let callback = verifier.verify(&body, signature).map_err(|e| {
        tracing::warn!(code = e.code(), error = %e, "Rejected payment callback");
        (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.user_message(), e.code())))
    })?;

    tracing::info!(
        transaction_ref = %callback.transaction_ref,
        status = %callback.status,
        "Payment callback received"
    );

    confirm(&state, callback.transaction_ref).await.map(Json)
}

// ============================================================================
// Helpers
// ============================================================================

fn cart_response(state: &AppState, cart: &CartStore) -> CartResponse {
    CartResponse {
        lines: cart.lines().to_vec(),
        summary: cart.summary(),
        totals: state.checkout.compute_totals(cart.cart()),
    }
}

/// Re-check the transaction with the gateway, then apply it to the cart
async fn confirm(state: &AppState, transaction_ref: String) -> Result<ConfirmationResponse, ApiError> {
    let transaction = state
        .checkout
        .fetch_transaction(&transaction_ref)
        .await
        .map_err(checkout_error)?;

    let mut cart = state.cart.write().await;
    let cart_cleared = state.checkout.complete_order(&transaction, &mut cart);

    Ok(ConfirmationResponse {
        transaction_ref,
        status: transaction.status,
        cart_cleared,
    })
}

fn checkout_error(error: CheckoutError) -> ApiError {
    let status = match &error {
        CheckoutError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CheckoutError::EmptyCart => StatusCode::BAD_REQUEST,
        CheckoutError::AlreadySubmitting => StatusCode::CONFLICT,
        CheckoutError::Gateway(_) | CheckoutError::Transport(_) => StatusCode::BAD_GATEWAY,
        // Raised while building the request, before any network call
        CheckoutError::Payment(PaymentError::InvalidRequest(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        CheckoutError::Payment(PaymentError::Config(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        CheckoutError::Payment(_) => StatusCode::BAD_GATEWAY,
        CheckoutError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let fields = match &error {
        CheckoutError::Validation(errors) => Some(errors.clone()),
        _ => None,
    };

    (
        status,
        Json(ErrorResponse {
            error: error.user_message(),
            code: error.code().into(),
            fields,
        }),
    )
}
