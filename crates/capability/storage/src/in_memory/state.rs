//! 设备状态内存存储
//!
//! 记录按 (deviceId, storeKey) 保存，内部再按 uniqueKey 区分。
//! 数据只存在于进程生命周期内，不做跨重启持久化。

use crate::error::StorageError;
use domain::{ParamValues, StoredRecord};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

type DeviceRecords = HashMap<String, StoredRecord>;

pub struct StateStore {
    devices: RwLock<HashMap<String, DeviceRecords>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
        }
    }

    /// SET：覆盖 uniqueKey 对应的参数组，同一 storeKey 下的其它 uniqueKey 保持不变。
    pub fn merge(
        &self,
        device_id: &str,
        store_key: &str,
        unique_key: &str,
        values: ParamValues,
    ) -> Result<(), StorageError> {
        let mut devices = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        debug!(
            target: "devsim.storage",
            device_id,
            store_key,
            unique_key,
            values = ?values,
            "state_merge"
        );
        devices
            .entry(device_id.to_string())
            .or_default()
            .entry(store_key.to_string())
            .or_default()
            .upsert(unique_key, values);
        Ok(())
    }

    /// GET：读取记录快照，不存在时返回空记录。
    pub fn record(&self, device_id: &str, store_key: &str) -> Result<StoredRecord, StorageError> {
        let devices = self
            .devices
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(devices
            .get(device_id)
            .and_then(|records| records.get(store_key))
            .cloned()
            .unwrap_or_default())
    }

    /// 清除设备的全部记录，返回清除的 storeKey 数量。
    pub fn clear_device(&self, device_id: &str) -> Result<usize, StorageError> {
        let mut devices = self
            .devices
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(devices.remove(device_id).map(|r| r.len()).unwrap_or(0))
    }

    /// 设备当前的 storeKey 数量（用于测试）
    pub fn len(&self, device_id: &str) -> usize {
        self.devices
            .read()
            .map(|d| d.get(device_id).map(|r| r.len()).unwrap_or(0))
            .unwrap_or(0)
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}
