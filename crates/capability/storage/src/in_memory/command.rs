//! 命令模板内存存储实现
//!
//! 每个设备的模板按插入顺序保存，该顺序即匹配优先级。

use crate::error::StorageError;
use crate::traits::CommandStore;
use domain::CommandTemplate;
use std::collections::HashMap;
use std::sync::RwLock;

pub struct InMemoryCommandStore {
    commands: RwLock<HashMap<String, Vec<CommandTemplate>>>,
}

impl InMemoryCommandStore {
    pub fn new() -> Self {
        Self {
            commands: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_commands(commands: impl IntoIterator<Item = CommandTemplate>) -> Self {
        let store = Self::new();
        if let Ok(mut map) = store.commands.write() {
            for command in commands {
                map.entry(command.device_id.clone())
                    .or_default()
                    .push(command);
            }
        }
        store
    }

    /// 新增模板（追加到末尾）或按 id 原位替换
    pub fn upsert_command(&self, command: CommandTemplate) -> Result<(), StorageError> {
        let mut map = self
            .commands
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let list = map.entry(command.device_id.clone()).or_default();
        match list.iter_mut().find(|item| item.id == command.id) {
            Some(existing) => *existing = command,
            None => list.push(command),
        }
        Ok(())
    }

    pub fn remove_command(&self, device_id: &str, command_id: &str) -> Result<bool, StorageError> {
        let mut map = self
            .commands
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        let Some(list) = map.get_mut(device_id) else {
            return Ok(false);
        };
        let before = list.len();
        list.retain(|item| item.id != command_id);
        Ok(list.len() != before)
    }
}

impl Default for InMemoryCommandStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CommandStore for InMemoryCommandStore {
    async fn list_commands(&self, device_id: &str) -> Result<Vec<CommandTemplate>, StorageError> {
        let map = self
            .commands
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(map.get(device_id).cloned().unwrap_or_default())
    }
}
