use crate::auth::AuthConfig;
use config::{Config, Environment, File};
use dotenvy::dotenv;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// 数据库连接的旧版环境变量及其对应的配置键
const LEGACY_DATABASE_ENV: [(&str, &str); 6] = [
    ("DATABASE", "database.name"),
    ("DB_USER", "database.user"),
    ("PASSWORD", "database.password"),
    ("HOST", "database.host"),
    ("DB_PORT", "database.port"),
    ("DIALECT", "database.dialect"),
];

/// 开发用的默认签名密钥，开启 require_token 时不允许使用
const DEFAULT_JWT_SECRET: &str = "secret";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("unsupported database dialect: {0}")]
    UnsupportedDialect(String),
    #[error("missing database setting: {0}")]
    Missing(&'static str),
    #[error("invalid database setting: {0}")]
    Invalid(&'static str),
    #[error("invalid database url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    server: RawServerConfig,
    database: RawDatabaseConfig,
    auth: RawAuthConfig,
    log: RawLogConfig,
}

/// 服务器配置（原始配置）
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawServerConfig {
    /// 监听地址
    host: String,
    /// 监听端口
    port: u16,
    /// 仅在反向代理之后开启，否则客户端可以伪造 X-Forwarded-For
    trust_proxy_headers: bool,
}

impl Default for RawServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            trust_proxy_headers: false,
        }
    }
}

/// 数据库配置（原始配置）
///
/// `url` 非空时直接使用，否则由 dialect/host/name 等拼出连接串。
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawDatabaseConfig {
    url: String,
    dialect: String,
    name: String,
    user: String,
    password: String,
    host: String,
    port: Option<u16>,
    max_connections: u32,
    min_connections: u32,
    connect_timeout_secs: u64,
    sqlx_logging: bool,
}

impl Default for RawDatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            dialect: "postgres".to_string(),
            name: String::new(),
            user: String::new(),
            password: String::new(),
            host: String::new(),
            port: None,
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 3,
            sqlx_logging: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawAuthConfig {
    jwt_secret_key: String,
    jwt_expire_secs: i64,
    salt_cost: u32,
    require_token: bool,
    login_max_attempts: usize,
    login_window_secs: u64,
    admin_login: String,
    admin_password: String,
}

impl Default for RawAuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_key: DEFAULT_JWT_SECRET.to_string(),
            jwt_expire_secs: 3600,
            salt_cost: 10,
            require_token: false,
            login_max_attempts: 5,
            login_window_secs: 60,
            admin_login: String::new(),
            admin_password: String::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawLogConfig {
    level: String,
    file: String,
}

impl Default for RawLogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: "app.log".to_string(),
        }
    }
}

/// 服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub trust_proxy_headers: bool,
}

/// 数据库连接配置，url 已解析完成
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub sqlx_logging: bool,
}

impl DatabaseConfig {
    pub fn new(url: &str) -> Self {
        let raw = RawDatabaseConfig::default();
        Self {
            url: url.to_string(),
            max_connections: raw.max_connections,
            min_connections: raw.min_connections,
            connect_timeout_secs: raw.connect_timeout_secs,
            sqlx_logging: raw.sqlx_logging,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret_key: String,
    pub jwt_expire_secs: i64,
    pub salt_cost: u32,
    /// 为 true 时读写用户接口都需要 Bearer token
    pub require_token: bool,
    pub login_max_attempts: usize,
    pub login_window_secs: u64,
    /// 空表对应的初始管理员，login 为空时不创建
    pub admin_login: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
    pub file: String,
}

#[derive(Debug, Clone)]
pub struct AppConfigImpl {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthSettings,
    pub log: LogConfig,
}

impl AppConfigImpl {
    fn new(data: RawConfig) -> Result<Self, ConfigError> {
        let url = resolve_database_url(&data.database)?;
        if data.auth.require_token
            && (data.auth.jwt_secret_key.is_empty()
                || data.auth.jwt_secret_key == DEFAULT_JWT_SECRET)
        {
            return Err(ConfigError::Invalid("auth.jwt_secret_key"));
        }
        Ok(AppConfigImpl {
            server: ServerConfig {
                host: data.server.host,
                port: data.server.port,
                trust_proxy_headers: data.server.trust_proxy_headers,
            },
            database: DatabaseConfig {
                url,
                max_connections: data.database.max_connections,
                min_connections: data.database.min_connections,
                connect_timeout_secs: data.database.connect_timeout_secs,
                sqlx_logging: data.database.sqlx_logging,
            },
            auth: AuthSettings {
                jwt_secret_key: data.auth.jwt_secret_key,
                jwt_expire_secs: data.auth.jwt_expire_secs,
                salt_cost: data.auth.salt_cost,
                require_token: data.auth.require_token,
                login_max_attempts: data.auth.login_max_attempts,
                login_window_secs: data.auth.login_window_secs,
                admin_login: non_empty(data.auth.admin_login),
                admin_password: non_empty(data.auth.admin_password),
            },
            log: LogConfig {
                level: data.log.level,
                file: data.log.file,
            },
        })
    }

    /// 加载顺序：config 文件 < APP_* 环境变量 < 旧版数据库环境变量
    pub fn load() -> Result<AppConfigImpl, ConfigError> {
        dotenv().ok();

        let mut builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("APP").separator("__"));
        for (var, key) in LEGACY_DATABASE_ENV {
            builder = builder.set_override_option(key, std::env::var(var).ok())?;
        }

        Self::load_from(builder.build()?)
    }

    pub fn load_from(config: Config) -> Result<AppConfigImpl, ConfigError> {
        let raw: RawConfig = config.try_deserialize()?; // serde 自动填充默认值
        AppConfigImpl::new(raw)
    }

    pub fn server(&self) -> ServerConfig {
        self.server.clone()
    }

    pub fn database(&self) -> &DatabaseConfig {
        &self.database
    }

    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    pub fn require_token(&self) -> bool {
        self.auth.require_token
    }
}

impl AuthConfig for AppConfigImpl {
    fn jwt_secret(&self) -> &str {
        &self.auth.jwt_secret_key
    }

    fn jwt_expire_secs(&self) -> i64 {
        self.auth.jwt_expire_secs
    }

    fn salt_cost(&self) -> u32 {
        self.auth.salt_cost
    }
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn resolve_database_url(raw: &RawDatabaseConfig) -> Result<String, ConfigError> {
    if !raw.url.is_empty() {
        return Ok(raw.url.clone());
    }

    let scheme = match raw.dialect.to_ascii_lowercase().as_str() {
        "postgres" | "postgresql" => "postgres",
        "mysql" | "mariadb" => "mysql",
        "sqlite" => return Ok(sqlite_url(&raw.name)),
        other => return Err(ConfigError::UnsupportedDialect(other.to_string())),
    };
    if raw.host.is_empty() {
        return Err(ConfigError::Missing("database.host"));
    }
    if raw.name.is_empty() {
        return Err(ConfigError::Missing("database.name"));
    }

    let mut url = Url::parse(&format!("{}://{}", scheme, raw.host))?;
    if raw.port.is_some() {
        url.set_port(raw.port)
            .map_err(|_| ConfigError::Invalid("database.port"))?;
    }
    if !raw.user.is_empty() {
        url.set_username(&raw.user)
            .map_err(|_| ConfigError::Invalid("database.user"))?;
    }
    if !raw.password.is_empty() {
        url.set_password(Some(&raw.password))
            .map_err(|_| ConfigError::Invalid("database.password"))?;
    }
    url.set_path(&format!("/{}", raw.name));
    Ok(url.to_string())
}

fn sqlite_url(name: &str) -> String {
    if name.is_empty() || name == ":memory:" {
        "sqlite::memory:".to_string()
    } else {
        format!("sqlite://{}?mode=rwc", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_db(dialect: &str) -> RawDatabaseConfig {
        RawDatabaseConfig {
            dialect: dialect.to_string(),
            name: "accounts".to_string(),
            user: "app".to_string(),
            password: "p@ss".to_string(),
            host: "db".to_string(),
            port: Some(5432),
            ..Default::default()
        }
    }

    #[test]
    fn test_postgres_url_from_parts() {
        let url = resolve_database_url(&raw_db("postgres")).unwrap();
        assert_eq!(url, "postgres://app:p%40ss@db:5432/accounts");
    }

    #[test]
    fn test_mysql_url_without_port() {
        let mut raw = raw_db("mariadb");
        raw.port = None;
        let url = resolve_database_url(&raw).unwrap();
        assert_eq!(url, "mysql://app:p%40ss@db/accounts");
    }

    #[test]
    fn test_sqlite_url() {
        let mut raw = raw_db("sqlite");
        raw.name = "users.db".to_string();
        assert_eq!(resolve_database_url(&raw).unwrap(), "sqlite://users.db?mode=rwc");
        raw.name = String::new();
        assert_eq!(resolve_database_url(&raw).unwrap(), "sqlite::memory:");
    }

    #[test]
    fn test_explicit_url_wins() {
        let mut raw = raw_db("mssql");
        raw.url = "postgres://localhost/other".to_string();
        assert_eq!(resolve_database_url(&raw).unwrap(), "postgres://localhost/other");
    }

    #[test]
    fn test_unknown_dialect_and_missing_host() {
        assert!(matches!(
            resolve_database_url(&raw_db("mssql")),
            Err(ConfigError::UnsupportedDialect(d)) if d == "mssql"
        ));
        let mut raw = raw_db("postgres");
        raw.host = String::new();
        assert!(matches!(
            resolve_database_url(&raw),
            Err(ConfigError::Missing("database.host"))
        ));
    }

    #[test]
    fn test_load_from_overrides_and_defaults() {
        let config = Config::builder()
            .set_override("database.dialect", "sqlite")
            .unwrap()
            .set_override("auth.require_token", true)
            .unwrap()
            .set_override("auth.jwt_secret_key", "k3y")
            .unwrap()
            .set_override("server.port", 8080)
            .unwrap()
            .build()
            .unwrap();
        let cfg = AppConfigImpl::load_from(config).unwrap();

        assert_eq!(cfg.database_url(), "sqlite::memory:");
        assert!(cfg.require_token());
        assert_eq!(cfg.server().port, 8080);
        assert_eq!(cfg.server().host, "0.0.0.0");
        assert!(!cfg.server().trust_proxy_headers);
        assert_eq!(cfg.jwt_expire_secs(), 3600);
        assert_eq!(cfg.salt_cost(), 10);
        assert!(cfg.auth.admin_login.is_none());
        assert_eq!(cfg.log.file, "app.log");
    }

    #[test]
    fn test_require_token_needs_real_secret() {
        for secret in [None, Some(""), Some(DEFAULT_JWT_SECRET)] {
            let mut builder = Config::builder()
                .set_override("database.dialect", "sqlite")
                .unwrap()
                .set_override("auth.require_token", true)
                .unwrap();
            if let Some(secret) = secret {
                builder = builder.set_override("auth.jwt_secret_key", secret).unwrap();
            }
            let result = AppConfigImpl::load_from(builder.build().unwrap());
            assert!(
                matches!(result, Err(ConfigError::Invalid("auth.jwt_secret_key"))),
                "{:?}",
                secret
            );
        }

        // 不要求 token 时默认密钥仍可用于本地开发
        let open = Config::builder()
            .set_override("database.dialect", "sqlite")
            .unwrap()
            .build()
            .unwrap();
        assert!(AppConfigImpl::load_from(open).is_ok());
    }
}
