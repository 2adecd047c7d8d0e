// storefront_server/src/web/extractors.rs

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use storefront::{Principal, Role};
use tracing::warn;

use crate::errors::AppError;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const USER_EMAIL_HEADER: &str = "X-User-Email";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// The caller as asserted by the identity headers of the trusted gateway.
///
/// A request without `X-User-Id` yields `None` rather than an error: whether
/// an anonymous caller may proceed is the access gate's decision. Headers that
/// are present but unreadable, or an unknown role, reject the request.
#[derive(Debug, Clone)]
pub struct OptionalPrincipal(pub Option<Principal>);

impl OptionalPrincipal {
  pub fn get(&self) -> Option<&Principal> {
    self.0.as_ref()
  }

  pub fn id(&self) -> Option<&str> {
    self.0.as_ref().map(|p| p.id.as_str())
  }

  fn from_headers(req: &HttpRequest) -> Result<Self, AppError> {
    let header = |name: &str| -> Result<Option<String>, AppError> {
      match req.headers().get(name) {
        None => Ok(None),
        Some(value) => value
          .to_str()
          .map(|v| Some(v.trim().to_string()).filter(|v| !v.is_empty()))
          .map_err(|_| AppError::Auth(format!("{} header is not valid text", name))),
      }
    };

    let Some(user_id) = header(USER_ID_HEADER)? else {
      return Ok(OptionalPrincipal(None));
    };
    let role = match header(USER_ROLE_HEADER)? {
      Some(raw) => raw.parse::<Role>().map_err(|e| AppError::Auth(e.to_string()))?,
      None => Role::User,
    };
    Ok(OptionalPrincipal(Some(Principal {
      id: user_id,
      email: header(USER_EMAIL_HEADER)?,
      role,
    })))
  }
}

impl FromRequest for OptionalPrincipal {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let result = Self::from_headers(req);
    if let Err(e) = &result {
      warn!(error = %e, "Rejected identity headers.");
    }
    ready(result)
  }
}
