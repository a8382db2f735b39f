use crate::error::ApiError;
use crate::{consts, AppState};
use actix_service::{forward_ready, Service, Transform};
use actix_web::{
    dev::{ServiceRequest, ServiceResponse},
    web, Error, HttpMessage, HttpRequest,
};
use application::auth::UserClaims;
use application::error::AppError;
use futures::future::{ok, LocalBoxFuture, Ready};
use log::debug;
use std::rc::Rc;

// There are two steps in middleware processing.
// 1. Middleware initialization, middleware factory gets called with
//    next service in chain as parameter.
// 2. Middleware's call method gets called with normal request.
//
// A request without a bearer token passes through untouched; whether it is
// allowed is decided per route by `policy::authorize`. A token that fails
// verification, or whose user is gone, is rejected right here.
pub struct JwtVerifier {}

impl<S, B> Transform<S, ServiceRequest> for JwtVerifier
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtVerifyMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(JwtVerifyMiddleware {
            service: Rc::new(service),
        })
    }
}

pub struct JwtVerifyMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for JwtVerifyMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        Box::pin(async move {
            let state = req
                .app_data::<web::Data<AppState>>()
                .cloned()
                .ok_or_else(|| ApiError::Internal("missing application state".to_string()))?;
            if let Some(claims) = claims_from_request(req.request(), &state).await? {
                req.extensions_mut().insert(claims);
            }
            service.call(req).await
        })
    }
}

/// Resolves the bearer token against the stored user, so the claims carry the
/// current admin flag. `Ok(None)` when no token was sent.
pub async fn claims_from_request(
    req: &HttpRequest,
    state: &AppState,
) -> Result<Option<UserClaims>, ApiError> {
    let Some(token) = token_from_header(req) else {
        return Ok(None);
    };
    match state.auth_service.authenticate(&token).await {
        Ok(claims) => Ok(Some(claims)),
        Err(AppError::AuthError(e)) => {
            debug!("rejected token on {}: {}", req.path(), e);
            Err(ApiError::Unauthorized("invalid or expired token".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

fn token_from_header(req: &HttpRequest) -> Option<String> {
    let auth_str = req
        .headers()
        .get(consts::AUTHORIZATION_HEADER)?
        .to_str()
        .ok()?;
    auth_str
        .strip_prefix(consts::BEARER_PREFIX)
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_token_from_header() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer abc.def.ghi"))
            .to_http_request();
        assert_eq!(token_from_header(&req).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_token_from_header_ignores_other_schemes() {
        let basic = TestRequest::default()
            .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
            .to_http_request();
        assert!(token_from_header(&basic).is_none());

        let empty = TestRequest::default()
            .insert_header(("Authorization", "Bearer "))
            .to_http_request();
        assert!(token_from_header(&empty).is_none());
        assert!(token_from_header(&TestRequest::default().to_http_request()).is_none());
    }
}
