use crate::auth::PasswordHasher;
use crate::error::AppError;
use domain::user::{NewUser, User, UserChanges, UserError, UserRepository};
use domain::value::UserId;
use log::info;
use std::sync::Arc;

/// 注册用户命令
pub struct RegisterUserCmd {
    pub login: String,
    pub password: String, // 明文密码，保存前哈希
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
}

/// 更新用户命令，None 表示不修改
#[derive(Default)]
pub struct UpdateUserCmd {
    pub login: Option<String>,
    pub password: Option<String>, // 明文密码
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: Option<bool>,
}

/// 用户应用服务
#[derive(Clone)]
pub struct UserAppService {
    user_repo: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
}

impl UserAppService {
    pub fn new(user_repo: Arc<dyn UserRepository>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self { user_repo, hasher }
    }

    /// 注册新用户
    pub async fn register(&self, cmd: RegisterUserCmd) -> Result<User, AppError> {
        if cmd.password.trim().is_empty() {
            return Err(AppError::InvalidInput("password must not be empty".to_string()));
        }
        // 先检查 login，唯一约束兜底并发注册
        if self
            .user_repo
            .find_by_login(cmd.login.trim())
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(format!(
                "login '{}' already exists",
                cmd.login.trim()
            )));
        }

        let hashed_pwd = self.hasher.hash(&cmd.password)?;
        let new_user = NewUser::new(
            &cmd.login,
            &hashed_pwd,
            &cmd.first_name,
            &cmd.last_name,
            cmd.is_admin,
        )?;
        let user = self.user_repo.insert(new_user).await.map_err(conflict)?;
        info!("registered user {} ({})", user.id, user.login);
        Ok(user)
    }

    /// 部分更新用户
    pub async fn update_user(&self, id: UserId, cmd: UpdateUserCmd) -> Result<User, AppError> {
        let mut user = self
            .user_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::AggregateNotFound("User".to_string(), id.to_string()))?;

        if let Some(login) = &cmd.login {
            if let Some(other) = self.user_repo.find_by_login(login.trim()).await? {
                if other.id != id {
                    return Err(AppError::Conflict(format!(
                        "login '{}' already exists",
                        login.trim()
                    )));
                }
            }
        }

        let password = match cmd.password {
            Some(plain) if plain.trim().is_empty() => {
                return Err(AppError::InvalidInput("password must not be empty".to_string()))
            }
            Some(plain) => Some(self.hasher.hash(&plain)?),
            None => None,
        };

        let changes = UserChanges {
            login: cmd.login,
            password,
            first_name: cmd.first_name,
            last_name: cmd.last_name,
            is_admin: cmd.is_admin,
        };
        if changes.is_empty() {
            return Ok(user);
        }
        user.apply(changes)?;
        let user = self.user_repo.update(&user).await.map_err(conflict)?;
        info!("updated user {}", user.id);
        Ok(user)
    }

    /// 删除用户
    pub async fn delete_user(&self, id: UserId) -> Result<(), AppError> {
        self.user_repo.delete(id).await.map_err(|e| match e {
            UserError::NotFound(_) => AppError::AggregateNotFound("User".to_string(), id.to_string()),
            other => other.into(),
        })?;
        info!("deleted user {}", id);
        Ok(())
    }

    /// Creates the first admin account. Returns `Ok(None)` when users already exist.
    pub async fn bootstrap_admin(&self, login: &str, pwd: &str) -> Result<Option<User>, AppError> {
        if self.user_repo.count().await? > 0 {
            return Ok(None);
        }
        let admin = self
            .register(RegisterUserCmd {
                login: login.to_string(),
                password: pwd.to_string(),
                first_name: "Admin".to_string(),
                last_name: "Admin".to_string(),
                is_admin: true,
            })
            .await?;
        Ok(Some(admin))
    }
}

fn conflict(e: UserError) -> AppError {
    match e {
        UserError::LoginTaken(login) => AppError::Conflict(format!("login '{}' already exists", login)),
        other => other.into(),
    }
}
