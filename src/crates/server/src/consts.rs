pub const URL_PATH_USERS: &str = "/api/users";
pub const URL_PATH_HEALTH: &str = "/health";

pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const BEARER_PREFIX: &str = "Bearer ";

/// 初始管理员随机密码长度
pub const GENERATED_PASSWORD_LEN: usize = 16;
