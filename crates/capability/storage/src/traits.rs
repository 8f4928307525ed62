//! 配置存储接口 Trait 定义
//!
//! - DeviceStore：设备配置读取
//! - CommandStore：命令模板读取
//!
//! 设计原则：
//! - 引擎只读，写入由外部协作方完成
//! - 所有接口返回 StorageError
//! - 使用 async_trait 支持动态分发

use crate::error::StorageError;
use async_trait::async_trait;
use domain::{CommandTemplate, DeviceConfig};

/// 设备配置存储接口
#[async_trait]
pub trait DeviceStore: Send + Sync {
    /// 列出所有设备
    async fn list_devices(&self) -> Result<Vec<DeviceConfig>, StorageError>;

    /// 查找指定设备
    async fn find_device(&self, device_id: &str) -> Result<Option<DeviceConfig>, StorageError>;
}

/// 命令模板存储接口
#[async_trait]
pub trait CommandStore: Send + Sync {
    /// 按声明顺序列出设备的全部命令模板
    async fn list_commands(&self, device_id: &str) -> Result<Vec<CommandTemplate>, StorageError>;
}
