// storefront_server/src/web/routes.rs

use actix_web::{web, HttpRequest, HttpResponse};

use crate::errors::AppError;
use crate::state::AppState;
use crate::web::handlers::order_handlers;

async fn health_check_handler(app_state: web::Data<AppState>) -> HttpResponse {
  HttpResponse::Ok().json(serde_json::json!({
    "status": "ok",
    "storage": app_state.config.storage_backend.as_str(),
  }))
}

/// Body and query decoding failures answer with the same JSON error shape as
/// every other failure.
pub fn json_config() -> web::JsonConfig {
  web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| AppError::BadRequest(err.to_string()).into())
}

pub fn query_config() -> web::QueryConfig {
  web::QueryConfig::default().error_handler(|err, _req: &HttpRequest| AppError::BadRequest(err.to_string()).into())
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(health_check_handler))
      .service(
        web::scope("/orders")
          .route("", web::post().to(order_handlers::create_order_handler))
          .route("", web::get().to(order_handlers::list_all_orders_handler))
          .route("/user/{user_id}", web::get().to(order_handlers::list_user_orders_handler))
          .route("/{order_ref}", web::get().to(order_handlers::get_order_handler))
          .route("/{order_ref}/status", web::put().to(order_handlers::update_status_handler))
          .route("/{order_ref}/cancel", web::put().to(order_handlers::cancel_order_handler)),
      ),
  );
}
