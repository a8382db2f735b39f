use crate::error::ApiError;
use crate::middleware::other::get_client_ip;
use crate::AppState;
use actix_web::{web, HttpRequest, HttpResponse};
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Rate limiter for login attempts by IP
pub struct RateLimiter {
    attempts: HashMap<String, Vec<Instant>>,
    max_attempts: usize,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_attempts: usize, window_secs: u64) -> Self {
        Self {
            attempts: HashMap::new(),
            max_attempts,
            window: Duration::from_secs(window_secs),
        }
    }

    pub fn is_allowed(&mut self, ip: &str) -> bool {
        self.is_allowed_at(ip, Instant::now())
    }

    fn is_allowed_at(&mut self, ip: &str, now: Instant) -> bool {
        let window = self.window;
        let attempts = self.attempts.entry(ip.to_string()).or_default();

        // Remove expired attempts
        attempts.retain(|t| now.duration_since(*t) < window);

        if attempts.len() >= self.max_attempts {
            false
        } else {
            attempts.push(now);
            true
        }
    }

    /// Drops clients whose attempts have all expired.
    pub fn cleanup(&mut self) {
        let now = Instant::now();
        let window = self.window;
        self.attempts.retain(|_, attempts| {
            attempts.retain(|t| now.duration_since(*t) < window);
            !attempts.is_empty()
        });
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

pub async fn login(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let client_ip = get_client_ip(&req, state.app_cfg.server.trust_proxy_headers);

    // Check rate limit
    {
        let mut limiter = state.login_limiter.lock();
        if !limiter.is_allowed(&client_ip) {
            warn!("too many login attempts from {}", client_ip);
            return Err(ApiError::TooManyRequests(
                "Too many login attempts. Please try again later.".to_string(),
            ));
        }
        limiter.cleanup();
    }

    let issued = state.auth_service.login(&body.login, &body.password).await?;
    Ok(HttpResponse::Ok().json(LoginResponse {
        token: issued.token,
        token_type: "Bearer".to_string(),
        expires_in: issued.expires_in,
    }))
}
