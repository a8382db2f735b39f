use super::value::UserId;
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use thiserror::Error;

/// 用户领域错误
///
/// 仓储与聚合根可能产生的错误。
#[derive(Error, Debug)]
pub enum UserError {
    #[error("user not found: {0}")]
    NotFound(String),
    #[error("login already taken: {0}")]
    LoginTaken(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("{0}")]
    DbErr(String),
}

/// 用户聚合根
///
/// 系统中唯一持久化的实体。`login` 是认证标识，全局唯一；
/// `password` 只保存 bcrypt 哈希。
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,                  // 数据库生成的主键
    pub login: String,               // 登录名，唯一
    pub password: String,            // 加密后的密码 (bcrypt)
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,              // 是否为管理员
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// 待插入的用户，id 由数据库分配
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub password: String, // 已经哈希过的密码
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
}

impl NewUser {
    pub fn new(
        login: &str,
        hashed_password: &str,
        first_name: &str,
        last_name: &str,
        is_admin: bool,
    ) -> Result<Self, UserError> {
        require_non_empty("login", login)?;
        require_non_empty("password", hashed_password)?;
        require_non_empty("firstName", first_name)?;
        require_non_empty("lastName", last_name)?;
        Ok(Self {
            login: login.trim().to_string(),
            password: hashed_password.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            is_admin,
        })
    }
}

/// 部分更新，None 表示不修改
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub login: Option<String>,
    pub password: Option<String>, // 已经哈希过的密码
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: Option<bool>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.login.is_none()
            && self.password.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.is_admin.is_none()
    }
}

impl User {
    /// Applies the supplied fields and bumps `updated_at`.
    /// Fields left as `None` keep their previous value.
    pub fn apply(&mut self, changes: UserChanges) -> Result<&mut Self, UserError> {
        if changes.is_empty() {
            return Ok(self);
        }
        if let Some(login) = changes.login {
            require_non_empty("login", &login)?;
            self.login = login.trim().to_string();
        }
        if let Some(password) = changes.password {
            require_non_empty("password", &password)?;
            self.password = password;
        }
        if let Some(first_name) = changes.first_name {
            require_non_empty("firstName", &first_name)?;
            self.first_name = first_name;
        }
        if let Some(last_name) = changes.last_name {
            require_non_empty("lastName", &last_name)?;
            self.last_name = last_name;
        }
        if let Some(is_admin) = changes.is_admin {
            self.is_admin = is_admin;
        }
        self.updated_at = Utc::now().naive_utc();
        Ok(self)
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<(), UserError> {
    if value.trim().is_empty() {
        return Err(UserError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(())
}

/// 用户仓储接口
///
/// 由基础设施层实现，领域与应用层只依赖这个 trait。
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// 获取用户总数
    async fn count(&self) -> Result<u64, UserError>;

    /// 按 id 升序返回全部用户
    async fn find_all(&self) -> Result<Vec<User>, UserError>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserError>;

    async fn find_by_login<'a>(&'a self, login: &'a str) -> Result<Option<User>, UserError>;

    /// 插入新用户，login 冲突时返回 `UserError::LoginTaken`
    async fn insert(&self, user: NewUser) -> Result<User, UserError>;

    /// 保存已有用户的全部字段
    async fn update(&self, user: &User) -> Result<User, UserError>;

    /// 删除用户，不存在时返回 `UserError::NotFound`
    async fn delete(&self, id: UserId) -> Result<(), UserError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    fn sample_user() -> User {
        let epoch = DateTime::<Utc>::from_timestamp(0, 0).unwrap().naive_utc();
        User {
            id: UserId::from(1),
            login: "kiryl@example.com".to_string(),
            password: "$2b$04$hash".to_string(),
            first_name: "Kiryl".to_string(),
            last_name: "Sachuk".to_string(),
            is_admin: false,
            created_at: epoch,
            updated_at: epoch,
        }
    }

    #[test]
    fn test_apply_changes_only_supplied_fields() {
        let mut user = sample_user();
        let before = user.clone();
        user.apply(UserChanges {
            last_name: Some("Ivanov".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(user.last_name, "Ivanov");
        assert_eq!(user.login, before.login);
        assert_eq!(user.first_name, before.first_name);
        assert_eq!(user.password, before.password);
        assert_eq!(user.is_admin, before.is_admin);
        assert_eq!(user.created_at, before.created_at);
        assert!(user.updated_at > before.updated_at);
    }

    #[test]
    fn test_apply_empty_changes_is_noop() {
        let mut user = sample_user();
        let before = user.clone();
        user.apply(UserChanges::default()).unwrap();
        assert_eq!(user, before);
    }

    #[test]
    fn test_apply_rejects_blank_values() {
        let mut user = sample_user();
        let result = user.apply(UserChanges {
            first_name: Some("   ".to_string()),
            ..Default::default()
        });
        assert!(matches!(result, Err(UserError::InvalidInput(_))));
    }

    #[test]
    fn test_new_user_requires_fields() {
        assert!(NewUser::new("", "hash", "a", "b", false).is_err());
        assert!(NewUser::new("login", "", "a", "b", false).is_err());
        assert!(NewUser::new("login", "hash", "", "b", false).is_err());
        assert!(NewUser::new("login", "hash", "a", "", false).is_err());

        let user = NewUser::new(" login ", "hash", "a", "b", true).unwrap();
        assert_eq!(user.login, "login");
        assert!(user.is_admin);
    }
}
