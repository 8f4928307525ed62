//! JSON 夹具文件加载
//!
//! 文件格式：
//!
//! ```json
//! { "devices": [ { "id": "...", "deviceName": "...", "protocol": "TCPServer", "devicePort": 15020 } ],
//!   "commands": [ { "id": "...", "deviceId": "...", "commandType": "GET", ... } ] }
//! ```

use crate::error::StorageError;
use crate::in_memory::{InMemoryCommandStore, InMemoryDeviceStore};
use domain::{CommandTemplate, DeviceConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
    #[serde(default)]
    pub commands: Vec<CommandTemplate>,
}

impl Fixture {
    pub fn from_json(json: &str) -> Result<Self, StorageError> {
        let fixture: Fixture = serde_json::from_str(json)?;
        for command in &fixture.commands {
            if !fixture.devices.iter().any(|d| d.id == command.device_id) {
                return Err(StorageError::new(format!(
                    "command {} references unknown device {}",
                    command.id, command.device_id
                )));
            }
        }
        Ok(fixture)
    }

    /// 拆分为设备存储与命令存储
    pub fn into_stores(self) -> (InMemoryDeviceStore, InMemoryCommandStore) {
        (
            InMemoryDeviceStore::with_devices(self.devices),
            InMemoryCommandStore::with_commands(self.commands),
        )
    }
}

/// 从文件加载夹具
pub fn load_fixture(path: impl AsRef<Path>) -> Result<Fixture, StorageError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .map_err(|err| StorageError::new(format!("read {}: {}", path.display(), err)))?;
    Fixture::from_json(&json)
}
