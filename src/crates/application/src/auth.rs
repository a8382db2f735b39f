use std::sync::Arc;

use crate::error::AppError;
use domain::user::{User, UserRepository};
use domain::value::UserId;
use log::debug;

pub trait PasswordHasher: Send + Sync {
    fn hash(&self, plain: &str) -> Result<String, AppError>;
    fn verify(&self, pwd: &str, hashed_pwd: &str) -> Result<(), AppError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserClaims {
    pub user_id: i32,
    pub login: String,
    pub is_admin: bool,
}

impl From<&User> for UserClaims {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id.value(),
            login: user.login.clone(),
            is_admin: user.is_admin,
        }
    }
}

pub trait TokenService: Send + Sync {
    fn issue(&self, claims: &UserClaims) -> Result<String, AppError>;
    fn verify(&self, token: &str) -> Result<UserClaims, AppError>;
    /// Lifetime of issued tokens, in seconds.
    fn expires_in(&self) -> i64;
}

/// Token handed back by a successful login
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: i64,
}

#[derive(Clone)]
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    token_svc: Arc<dyn TokenService>,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        token_svc: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            user_repo,
            hasher,
            token_svc,
        }
    }

    /// Login with login and password, returns JWT token.
    /// Unknown login and wrong password produce the same error.
    pub async fn login(&self, login: &str, pwd: &str) -> Result<IssuedToken, AppError> {
        let user = match self.user_repo.find_by_login(login.trim()).await? {
            Some(user) => user,
            None => {
                debug!("login rejected: unknown login {}", login);
                return Err(invalid_credentials());
            }
        };
        if self.hasher.verify(pwd, &user.password).is_err() {
            debug!("login rejected: bad password for {}", user.login);
            return Err(invalid_credentials());
        }
        let token = self.token_svc.issue(&UserClaims::from(&user))?;
        Ok(IssuedToken {
            token,
            expires_in: self.token_svc.expires_in(),
        })
    }

    pub fn verify(&self, token: &str) -> Result<UserClaims, AppError> {
        self.token_svc.verify(token)
    }

    /// Verifies the token and reloads its user, so the claims reflect the
    /// stored admin flag rather than the one the token was issued with.
    pub async fn authenticate(&self, token: &str) -> Result<UserClaims, AppError> {
        let claims = self.verify(token)?;
        match self.user_repo.find_by_id(UserId::from(claims.user_id)).await? {
            Some(user) => Ok(UserClaims::from(&user)),
            None => {
                debug!("token rejected: user {} no longer exists", claims.user_id);
                Err(AppError::AuthError("user no longer exists".to_string()))
            }
        }
    }
}

fn invalid_credentials() -> AppError {
    AppError::AuthError("invalid login or password".to_string())
}
