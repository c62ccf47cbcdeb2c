//! Payment routes.
//!
//! POST /payments                 - initiate a payment for a PENDING booking
//! POST /payments/confirm         - provider webhook (settlement callback)
//! GET  /payments/simulate        - force a settlement result (dev/testing)
//! GET  /payments/{id}            - retrieve a payment
//! GET  /payments/booking/{id}    - latest payment for a booking
//! GET  /payments/user/{id}       - list a user's payments

use axum::extract::{Path, Query};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    ApiResponse, InitiatePaymentRequest, Payment, PaymentConfirmRequest,
    PaymentInitiatedResponse, PaymentStatus, SimulatePaymentQuery,
};
use crate::payment;
use crate::AppState;

/// Build the payments router.
pub fn router() -> Router {
    Router::new()
        .route("/payments", post(initiate_payment))
        .route("/payments/confirm", post(confirm_payment))
        .route("/payments/simulate", get(simulate_payment))
        .route("/payments/{id}", get(get_payment))
        .route("/payments/booking/{booking_id}", get(get_by_booking))
        .route("/payments/user/{user_id}", get(get_by_user))
}

/// Initiate a payment. Full-waiver coupons settle instantly; everything else
/// waits for the provider callback (or a simulated one).
async fn initiate_payment(
    Extension(state): Extension<AppState>,
    Json(req): Json<InitiatePaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentInitiatedResponse>>)> {
    let payment = payment::initiate(&state, &req).await?;

    let message = if payment.status == PaymentStatus::Success {
        "Payment completed instantly using coupon".to_string()
    } else {
        "Payment initiated; complete it via your UPI app".to_string()
    };
    let response = PaymentInitiatedResponse {
        payment_id: payment.payment_id,
        booking_id: payment.booking_id,
        amount: payment.amount,
        currency: payment.currency,
        status: payment.status,
    };
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: response,
            message,
        }),
    ))
}

/// Provider settlement webhook.
async fn confirm_payment(
    Extension(state): Extension<AppState>,
    Json(req): Json<PaymentConfirmRequest>,
) -> Result<Json<ApiResponse<Payment>>> {
    let payment = payment::on_provider_result(&state.db, &req).await?;
    Ok(Json(ApiResponse {
        data: payment,
        message: "Settlement applied".to_string(),
    }))
}

/// Simulate a provider settlement. Defaults to SUCCESS; pass
/// `status=FAILED` to exercise the failure path.
async fn simulate_payment(
    Extension(state): Extension<AppState>,
    Query(query): Query<SimulatePaymentQuery>,
) -> Result<Json<ApiResponse<Payment>>> {
    let req = PaymentConfirmRequest {
        payment_record_id: query.payment_record_id,
        provider_payment_id: format!("SIM-{}", query.payment_record_id),
        status: query.status.unwrap_or(PaymentStatus::Success),
    };
    let payment = payment::on_provider_result(&state.db, &req).await?;
    Ok(Json(ApiResponse {
        data: payment,
        message: "Simulated settlement applied".to_string(),
    }))
}

/// Retrieve a payment by ID.
async fn get_payment(
    Extension(state): Extension<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Payment>>> {
    let payment = payment::get(&state.db, id).await?;
    Ok(Json(ApiResponse {
        data: payment,
        message: "Payment retrieved".to_string(),
    }))
}

/// Latest payment attempt for a booking.
async fn get_by_booking(
    Extension(state): Extension<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Payment>>> {
    let payment = payment::get_by_booking(&state.db, booking_id).await?;
    Ok(Json(ApiResponse {
        data: payment,
        message: "Payment retrieved".to_string(),
    }))
}

/// List all payments for a user, newest first.
async fn get_by_user(
    Extension(state): Extension<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<Payment>>>> {
    let payments = payment::list_for_user(&state.db, user_id).await?;
    Ok(Json(ApiResponse {
        data: payments,
        message: "Payments retrieved".to_string(),
    }))
}
