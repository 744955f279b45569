use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortenerError {
    InvalidInput(String),
    /// 携带已存在记录的规范短码，调用方应视为成功
    AlreadyExists(String),
    NotFound(String),
    /// 短码已被另一个 URL 占用
    AliasCollision(String),
    BackendUnavailable(String),
    Serialization(String),
    Config(String),
}

impl ShortenerError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ShortenerError::InvalidInput(_) => "E001",
            ShortenerError::AlreadyExists(_) => "E002",
            ShortenerError::NotFound(_) => "E003",
            ShortenerError::AliasCollision(_) => "E004",
            ShortenerError::BackendUnavailable(_) => "E005",
            ShortenerError::Serialization(_) => "E006",
            ShortenerError::Config(_) => "E007",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ShortenerError::InvalidInput(_) => "Invalid Input",
            ShortenerError::AlreadyExists(_) => "Already Exists",
            ShortenerError::NotFound(_) => "Resource Not Found",
            ShortenerError::AliasCollision(_) => "Alias Collision",
            ShortenerError::BackendUnavailable(_) => "Backend Unavailable",
            ShortenerError::Serialization(_) => "Serialization Error",
            ShortenerError::Config(_) => "Configuration Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ShortenerError::InvalidInput(msg) => msg,
            ShortenerError::AlreadyExists(alias) => alias,
            ShortenerError::NotFound(msg) => msg,
            ShortenerError::AliasCollision(alias) => alias,
            ShortenerError::BackendUnavailable(msg) => msg,
            ShortenerError::Serialization(msg) => msg,
            ShortenerError::Config(msg) => msg,
        }
    }

    /// `AlreadyExists` 时返回规范短码
    pub fn existing_alias(&self) -> Option<&str> {
        match self {
            ShortenerError::AlreadyExists(alias) => Some(alias),
            _ => None,
        }
    }

    /// 格式化为彩色输出（用于终端）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ShortenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ShortenerError {}

// 便捷的构造函数
impl ShortenerError {
    pub fn invalid_input<T: Into<String>>(msg: T) -> Self {
        ShortenerError::InvalidInput(msg.into())
    }

    pub fn already_exists<T: Into<String>>(alias: T) -> Self {
        ShortenerError::AlreadyExists(alias.into())
    }

    pub fn not_found<T: Into<String>>(msg: T) -> Self {
        ShortenerError::NotFound(msg.into())
    }

    pub fn alias_collision<T: Into<String>>(alias: T) -> Self {
        ShortenerError::AliasCollision(alias.into())
    }

    pub fn backend_unavailable<T: Into<String>>(msg: T) -> Self {
        ShortenerError::BackendUnavailable(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Serialization(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        ShortenerError::Config(msg.into())
    }
}

impl From<sea_orm::DbErr> for ShortenerError {
    fn from(err: sea_orm::DbErr) -> Self {
        ShortenerError::BackendUnavailable(err.to_string())
    }
}

impl From<std::io::Error> for ShortenerError {
    fn from(err: std::io::Error) -> Self {
        ShortenerError::BackendUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for ShortenerError {
    fn from(err: serde_json::Error) -> Self {
        ShortenerError::Serialization(err.to_string())
    }
}

impl From<url::ParseError> for ShortenerError {
    fn from(err: url::ParseError) -> Self {
        ShortenerError::InvalidInput(err.to_string())
    }
}

impl From<config::ConfigError> for ShortenerError {
    fn from(err: config::ConfigError) -> Self {
        ShortenerError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShortenerError>;
