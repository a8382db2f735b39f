use application::auth::{PasswordHasher, TokenService, UserClaims};
use application::error::AppError;
use bcrypt::hash as bcrypt_hash;
use bcrypt::verify as bcrypt_verify;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub trait AuthConfig {
    fn jwt_secret(&self) -> &str;
    fn jwt_expire_secs(&self) -> i64;
    fn salt_cost(&self) -> u32;
}

#[derive(Debug, Clone)]
pub struct BcryptPasswordHasher {
    salt_cost: u32,
}

impl BcryptPasswordHasher {
    pub fn new(salt_cost: u32) -> Self {
        Self { salt_cost }
    }

    pub fn from_config(cfg: &impl AuthConfig) -> Self {
        Self::new(cfg.salt_cost())
    }
}

impl PasswordHasher for BcryptPasswordHasher {
    fn hash(&self, plain: &str) -> Result<String, AppError> {
        bcrypt_hash(plain, self.salt_cost).map_err(|e| AppError::UnknownError(e.to_string()))
    }

    fn verify(&self, pwd: &str, hashed_pwd: &str) -> Result<(), AppError> {
        if bcrypt_verify(pwd, hashed_pwd).unwrap_or(false) {
            Ok(())
        } else {
            Err(AppError::AuthError("invalid password".to_string()))
        }
    }
}

#[derive(Debug, Clone)]
pub struct JwtTokenService {
    jwt_secret: String,
    exp_secs: i64,
}

impl JwtTokenService {
    pub fn new(jwt_secret: &str, exp_secs: i64) -> Self {
        Self {
            jwt_secret: jwt_secret.to_string(),
            exp_secs,
        }
    }

    pub fn from_config(cfg: &impl AuthConfig) -> Self {
        Self::new(cfg.jwt_secret(), cfg.jwt_expire_secs())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    pub sub: String, // login
    pub uid: i32,
    pub adm: bool,
    pub exp: i64,
    pub iat: i64,
}

impl JwtClaims {
    fn new(claims: &UserClaims, exp_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: claims.login.clone(),
            uid: claims.user_id,
            adm: claims.is_admin,
            exp: now + exp_secs,
            iat: now,
        }
    }
}

impl From<JwtClaims> for UserClaims {
    fn from(claims: JwtClaims) -> Self {
        Self {
            user_id: claims.uid,
            login: claims.sub,
            is_admin: claims.adm,
        }
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, claims: &UserClaims) -> Result<String, AppError> {
        let claims = JwtClaims::new(claims, self.exp_secs);
        let key = EncodingKey::from_secret(self.jwt_secret.as_bytes());
        encode(&Header::new(Algorithm::HS256), &claims, &key)
            .map_err(|e| AppError::UnknownError(e.to_string()))
    }

    fn verify(&self, token: &str) -> Result<UserClaims, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        let token_data = decode::<JwtClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map_err(|e| AppError::AuthError(e.to_string()))?;

        Ok(token_data.claims.into())
    }

    fn expires_in(&self) -> i64 {
        self.exp_secs
    }
}
