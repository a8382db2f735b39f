//! Who may call what when `auth.require_token` is switched on.

use crate::error::ApiError;
use actix_web::{HttpMessage, HttpRequest};
use application::auth::UserClaims;
use domain::value::UserId;

#[derive(Debug, Clone, Copy)]
pub enum Access {
    /// list or fetch users
    Read,
    /// modify or delete the given user
    Manage(UserId),
    /// set the isAdmin flag
    GrantAdmin,
}

/// Claims attached by `JwtVerifier`, if the request carried a valid token.
pub fn caller(req: &HttpRequest) -> Option<UserClaims> {
    req.extensions().get::<UserClaims>().cloned()
}

pub fn authorize(
    require_token: bool,
    caller: Option<&UserClaims>,
    access: Access,
) -> Result<(), ApiError> {
    if !require_token {
        return Ok(());
    }
    let caller =
        caller.ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?;
    match access {
        Access::Read => Ok(()),
        Access::Manage(id) if caller.is_admin || caller.user_id == id.value() => Ok(()),
        Access::GrantAdmin if caller.is_admin => Ok(()),
        Access::Manage(id) => Err(ApiError::Forbidden(format!(
            "user {} may not modify user {}",
            caller.user_id, id
        ))),
        Access::GrantAdmin => Err(ApiError::Forbidden(
            "only admins may set isAdmin".to_string(),
        )),
    }
}
