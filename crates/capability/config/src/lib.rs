//! 仿真器运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 仿真器运行配置。
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// 设备/命令夹具文件路径（JSON）
    pub fixture_path: Option<String>,
    /// 设备监听地址
    pub bind_host: String,
    /// 设备端口为 0 时使用的端口
    pub default_port: u16,
    /// TCP 单次读取缓冲区大小
    pub read_buffer_bytes: usize,
    /// 启动后自动拉起夹具中的全部设备
    pub autostart: bool,
    /// 事件通道容量
    pub event_channel_capacity: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixture_path: None,
            bind_host: "0.0.0.0".to_string(),
            default_port: 502,
            read_buffer_bytes: 4096,
            autostart: true,
            event_channel_capacity: 1024,
        }
    }
}

impl SimConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let fixture_path = read_optional("DEVSIM_FIXTURE_PATH");
        let bind_host = env::var("DEVSIM_BIND_HOST").unwrap_or(defaults.bind_host);
        let default_port = read_u16_with_default("DEVSIM_DEFAULT_PORT", defaults.default_port)?;
        let read_buffer_bytes =
            read_usize_with_default("DEVSIM_READ_BUFFER_BYTES", defaults.read_buffer_bytes)?;
        if read_buffer_bytes == 0 {
            return Err(ConfigError::Invalid(
                "DEVSIM_READ_BUFFER_BYTES".to_string(),
                "0".to_string(),
            ));
        }
        let autostart = read_bool_with_default("DEVSIM_AUTOSTART", defaults.autostart);
        let event_channel_capacity = read_usize_with_default(
            "DEVSIM_EVENT_CHANNEL_CAPACITY",
            defaults.event_channel_capacity,
        )?
        .max(1);

        Ok(Self {
            fixture_path,
            bind_host,
            default_port,
            read_buffer_bytes,
            autostart,
            event_channel_capacity,
        })
    }

    /// 夹具路径（进程入口必填）。
    pub fn require_fixture_path(&self) -> Result<&str, ConfigError> {
        self.fixture_path
            .as_deref()
            .ok_or_else(|| ConfigError::Missing("DEVSIM_FIXTURE_PATH".to_string()))
    }
}

fn read_u16_with_default(key: &str, default: u16) -> Result<u16, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<u16>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_usize_with_default(key: &str, default: usize) -> Result<usize, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    value
        .parse::<usize>()
        .map_err(|_| ConfigError::Invalid(key.to_string(), value))
}

fn read_optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Some(value),
        _ => None,
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}
