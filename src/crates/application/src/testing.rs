//! In-memory doubles for service tests.

use crate::auth::{PasswordHasher, TokenService, UserClaims};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use domain::user::{NewUser, User, UserError, UserRepository};
use domain::value::UserId;
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn count(&self) -> Result<u64, UserError> {
        Ok(self.users.lock().unwrap().len() as u64)
    }

    async fn find_all(&self) -> Result<Vec<User>, UserError> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_login<'a>(&'a self, login: &'a str) -> Result<Option<User>, UserError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.login == login).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, UserError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.login == user.login) {
            return Err(UserError::LoginTaken(user.login));
        }
        let next_id = users.iter().map(|u| u.id.value()).max().unwrap_or(0) + 1;
        let now = Utc::now().naive_utc();
        let created = User {
            id: UserId::from(next_id),
            login: user.login,
            password: user.password,
            first_name: user.first_name,
            last_name: user.last_name,
            is_admin: user.is_admin,
            created_at: now,
            updated_at: now,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn update(&self, user: &User) -> Result<User, UserError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.login == user.login && u.id != user.id) {
            return Err(UserError::LoginTaken(user.login.clone()));
        }
        let slot = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| UserError::NotFound(user.id.to_string()))?;
        *slot = user.clone();
        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<(), UserError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(UserError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

pub struct FakeHasher;

impl PasswordHasher for FakeHasher {
    fn hash(&self, plain: &str) -> Result<String, AppError> {
        Ok(format!("hashed:{}", plain))
    }

    fn verify(&self, pwd: &str, hashed_pwd: &str) -> Result<(), AppError> {
        if hashed_pwd == format!("hashed:{}", pwd) {
            Ok(())
        } else {
            Err(AppError::AuthError("invalid password".to_string()))
        }
    }
}

pub struct FakeTokenService;

impl TokenService for FakeTokenService {
    fn issue(&self, claims: &UserClaims) -> Result<String, AppError> {
        Ok(format!("{}|{}|{}", claims.user_id, claims.login, claims.is_admin))
    }

    fn verify(&self, token: &str) -> Result<UserClaims, AppError> {
        let parts: Vec<&str> = token.split('|').collect();
        match parts.as_slice() {
            [id, login, admin] => Ok(UserClaims {
                user_id: id.parse().map_err(|_| AppError::AuthError("bad token".into()))?,
                login: login.to_string(),
                is_admin: *admin == "true",
            }),
            _ => Err(AppError::AuthError("bad token".to_string())),
        }
    }

    fn expires_in(&self) -> i64 {
        3600
    }
}
