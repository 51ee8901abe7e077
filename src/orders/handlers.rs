// HTTP handlers for order endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::orders::{
    CreateOrderRequest, Order, OrderError, StatusUpdateResponse, UpdateStatusRequest,
};
use crate::AppState;

/// Handler for POST /api/orders
pub async fn create_order_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), OrderError> {
    let order = state.order_service.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// Handler for GET /api/orders/:id
pub async fn get_order_handler(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, OrderError> {
    let order = state.order_service.get_order(order_id).await?;
    Ok(Json(order))
}

/// Handler for PATCH /api/orders/:id/status
///
/// Confirming an order consumes its ingredients; the deduction report is part of
/// the response.
pub async fn update_order_status_handler(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<StatusUpdateResponse>, OrderError> {
    let response = state
        .status_controller
        .update_status(order_id, request.status)
        .await?;
    Ok(Json(response))
}
