//! 设备配置内存存储实现
//!
//! 供测试与夹具加载使用，外部协作方可随时增删改。

use crate::error::StorageError;
use crate::traits::DeviceStore;
use domain::DeviceConfig;
use std::collections::HashMap;
use std::sync::RwLock;

/// 设备配置内存存储
///
/// 使用 RwLock + HashMap 提供线程安全的内存存储。
pub struct InMemoryDeviceStore {
    devices: RwLock<HashMap<String, DeviceConfig>>,
}

impl InMemoryDeviceStore {
    /// 创建新的设备存储
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
        }
    }

    /// 使用给定设备列表初始化
    pub fn with_devices(devices: impl IntoIterator<Item = DeviceConfig>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.devices.write() {
            for device in devices {
                map.insert(device.id.clone(), device);
            }
        }
        store
    }

    /// 新增或替换设备配置
    pub fn upsert_device(&self, device: DeviceConfig) -> Result<(), StorageError> {
        let mut map = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        map.insert(device.id.clone(), device);
        Ok(())
    }

    /// 删除设备配置
    pub fn remove_device(&self, device_id: &str) -> Result<bool, StorageError> {
        let mut map = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.remove(device_id).is_some())
    }
}

impl Default for InMemoryDeviceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DeviceStore for InMemoryDeviceStore {
    async fn list_devices(&self) -> Result<Vec<DeviceConfig>, StorageError> {
        let map = self
            .devices
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        let mut items: Vec<DeviceConfig> = map.values().cloned().collect();
        items.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(items)
    }

    async fn find_device(&self, device_id: &str) -> Result<Option<DeviceConfig>, StorageError> {
        let map = self
            .devices
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.get(device_id).cloned())
    }
}
