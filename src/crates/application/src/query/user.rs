use crate::error::AppError;
use domain::user::{User, UserRepository};
use domain::value::UserId;
use std::sync::Arc;

#[derive(Clone)]
pub struct UserQueryService {
    user_repo: Arc<dyn UserRepository>,
}

impl UserQueryService {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.user_repo.find_all().await?)
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, AppError> {
        self.user_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::AggregateNotFound("User".to_string(), id.to_string()))
    }
}
