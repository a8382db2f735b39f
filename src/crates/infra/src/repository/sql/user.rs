use super::db_data::user::{ActiveModel, Column, Entity};
use async_trait::async_trait;
use chrono::Utc;
use domain::user::{NewUser, User, UserError};
use domain::value::UserId;
use sea_orm::*;

#[derive(Clone)]
pub struct UserRepositoryImpl {
    db: DatabaseConnection,
}

impl UserRepositoryImpl {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn db_err(e: DbErr) -> UserError {
    UserError::DbErr(e.to_string())
}

/// 唯一约束冲突转换为 LoginTaken，兜底并发注册
fn write_err(e: DbErr, login: &str) -> UserError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => UserError::LoginTaken(login.to_string()),
        _ => db_err(e),
    }
}

#[async_trait]
impl domain::user::UserRepository for UserRepositoryImpl {
    async fn count(&self) -> Result<u64, UserError> {
        Entity::find().count(&self.db).await.map_err(db_err)
    }

    async fn find_all(&self) -> Result<Vec<User>, UserError> {
        let models = Entity::find()
            .order_by_asc(Column::Id)
            .all(&self.db)
            .await
            .map_err(db_err)?;
        Ok(models.into_iter().map(User::from).collect())
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserError> {
        let result = Entity::find_by_id(id.value())
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.map(User::from))
    }

    async fn find_by_login<'a>(&'a self, login: &'a str) -> Result<Option<User>, UserError> {
        let result = Entity::find()
            .filter(Column::Login.eq(login))
            .one(&self.db)
            .await
            .map_err(db_err)?;
        Ok(result.map(User::from))
    }

    async fn insert(&self, new_user: NewUser) -> Result<User, UserError> {
        let now = Utc::now().naive_utc();
        let active_model = ActiveModel {
            id: NotSet,
            login: Set(new_user.login.clone()),
            password: Set(new_user.password),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            is_admin: Set(new_user.is_admin),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let model = active_model
            .insert(&self.db)
            .await
            .map_err(|e| write_err(e, &new_user.login))?;
        Ok(model.into())
    }

    async fn update(&self, agg: &User) -> Result<User, UserError> {
        let active_model = ActiveModel {
            id: Unchanged(agg.id.value()),
            login: Set(agg.login.clone()),
            password: Set(agg.password.clone()),
            first_name: Set(agg.first_name.clone()),
            last_name: Set(agg.last_name.clone()),
            is_admin: Set(agg.is_admin),
            created_at: Unchanged(agg.created_at),
            updated_at: Set(agg.updated_at),
        };
        let model = active_model.update(&self.db).await.map_err(|e| match e {
            DbErr::RecordNotUpdated => UserError::NotFound(agg.id.to_string()),
            other => write_err(other, &agg.login),
        })?;
        Ok(model.into())
    }

    async fn delete(&self, id: UserId) -> Result<(), UserError> {
        let result = Entity::delete_by_id(id.value())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(UserError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
