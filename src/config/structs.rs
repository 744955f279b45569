use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter, EnumString};

/// 存储后端类型
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, EnumIter, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StorageBackend {
    /// 纯内存，进程退出即丢失
    #[default]
    Memory,
    /// 内存索引 + 追加写日志
    Journal,
    /// 关系型数据库（SQLite / MySQL / PostgreSQL）
    Database,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_ref())
    }
}

/// 静态配置（从 TOML + 环境变量加载，启动时使用）
///
/// - storage: 存储后端选择及连接参数
/// - alias: 短码生成参数
/// - deletion: 后台删除队列参数
/// - logging: 日志配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub alias: AliasConfig,
    #[serde(default)]
    pub deletion: DeletionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > TOML > 默认值
    /// ENV 前缀：SHORTENER，分隔符：__
    /// 示例：SHORTENER__STORAGE__BACKEND=journal
    pub fn load_from(path: Option<&str>) -> crate::errors::Result<Self> {
        use config::{Config, Environment, File};

        // 显式指定的文件必须存在，默认文件可选
        let (path, required) = match path {
            Some(p) => (p, true),
            None => ("config.toml", false),
        };

        let settings = Config::builder()
            .add_source(File::with_name(path).required(required))
            .add_source(
                Environment::with_prefix("SHORTENER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: StaticConfig = settings.try_deserialize()?;
        super::validators::validate(&config)?;
        Ok(config)
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> crate::errors::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::errors::ShortenerError::serialization(e.to_string()))?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    /// journal 后端的日志文件路径
    #[serde(default = "default_journal_path")]
    pub journal_path: String,
    /// 每次追加后是否 fsync
    #[serde(default = "default_journal_fsync")]
    pub journal_fsync: bool,
    /// database 后端的连接串
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
    /// 健康检查中存储 ping 的超时秒数
    #[serde(default = "default_ping_timeout_secs")]
    pub ping_timeout_secs: u64,
}

/// 短码生成配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AliasConfig {
    #[serde(default = "default_alias_length")]
    pub length: usize,
    /// 短码冲突时加盐重试的最大次数（含首次）
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// 后台删除队列配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletionConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// text 或 json
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

// ============================================================
// Default value functions
// ============================================================

fn default_journal_path() -> String {
    "data/shortener.jsonl".to_string()
}

fn default_journal_fsync() -> bool {
    true
}

fn default_database_url() -> String {
    "sqlite://shortener.db?mode=rwc".to_string()
}

fn default_pool_size() -> u32 {
    10
}

fn default_ping_timeout_secs() -> u64 {
    5
}

fn default_alias_length() -> usize {
    6
}

fn default_max_attempts() -> u32 {
    5
}

fn default_workers() -> usize {
    2
}

fn default_queue_depth() -> usize {
    1000
}

fn default_chunk_size() -> usize {
    500
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

// ============================================================
// Default implementations
// ============================================================

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            journal_path: default_journal_path(),
            journal_fsync: default_journal_fsync(),
            database_url: default_database_url(),
            pool_size: default_pool_size(),
            ping_timeout_secs: default_ping_timeout_secs(),
        }
    }
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            length: default_alias_length(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for DeletionConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_depth: default_queue_depth(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}
