// storefront_server/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use storefront::{CreateOrderRequest, OrderRef};
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::OptionalPrincipal;

#[derive(Deserialize, Debug)]
pub struct ListOrdersQuery {
  pub status: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct UpdateStatusPayload {
  pub status: String,
}

#[instrument(
  name = "handler::create_order",
  skip(app_state, principal, payload),
  fields(user_id = principal.id(), product_id = payload.product_id.as_deref())
)]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  principal: OptionalPrincipal,
  payload: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .lifecycle
    .create_order(principal.get(), payload.into_inner())
    .await?;
  info!(order_id = %order.order_id, "Order placed.");
  Ok(HttpResponse::Created().json(order))
}

#[instrument(name = "handler::list_user_orders", skip(app_state, principal, path), fields(caller = principal.id(), target_user = %path.as_str()))]
pub async fn list_user_orders_handler(
  app_state: web::Data<AppState>,
  principal: OptionalPrincipal,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let orders = app_state
    .lifecycle
    .list_orders_for_user(principal.get(), path.as_str())
    .await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::list_all_orders", skip(app_state, principal, query), fields(caller = principal.id()))]
pub async fn list_all_orders_handler(
  app_state: web::Data<AppState>,
  principal: OptionalPrincipal,
  query: web::Query<ListOrdersQuery>,
) -> Result<HttpResponse, AppError> {
  let orders = app_state
    .lifecycle
    .list_all_orders(principal.get(), query.status.as_deref())
    .await?;
  info!(count = orders.len(), "Listed orders.");
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::get_order", skip(app_state, principal, path), fields(caller = principal.id(), order_ref = %path.as_str()))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  principal: OptionalPrincipal,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .lifecycle
    .get_order(principal.get(), &OrderRef::parse(&path))
    .await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(
  name = "handler::update_order_status",
  skip(app_state, principal, path, payload),
  fields(caller = principal.id(), order_ref = %path.as_str(), status = %payload.status)
)]
pub async fn update_status_handler(
  app_state: web::Data<AppState>,
  principal: OptionalPrincipal,
  path: web::Path<String>,
  payload: web::Json<UpdateStatusPayload>,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .lifecycle
    .update_status(principal.get(), &OrderRef::parse(&path), &payload.status)
    .await?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::cancel_order", skip(app_state, principal, path), fields(caller = principal.id(), order_ref = %path.as_str()))]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  principal: OptionalPrincipal,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order = app_state
    .lifecycle
    .cancel_own_order(principal.get(), &OrderRef::parse(&path))
    .await?;
  Ok(HttpResponse::Ok().json(order))
}
