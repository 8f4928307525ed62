//! 预编译命令缓存
//!
//! 按 (deviceId, 模板 id) 缓存，模板内容变化时重新编译。

use crate::command::CompiledCommand;
use domain::CommandTemplate;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

type DeviceCommands = HashMap<String, Arc<CompiledCommand>>;

#[derive(Default)]
pub struct TemplateCache {
    devices: RwLock<HashMap<String, DeviceCommands>>,
}

impl TemplateCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn cached(&self, template: &CommandTemplate) -> Option<Arc<CompiledCommand>> {
        let devices = self.devices.read().ok()?;
        devices
            .get(&template.device_id)?
            .get(&template.id)
            .filter(|compiled| compiled.template() == template)
            .cloned()
    }

    /// 按输入顺序返回编译结果，未变化的模板直接复用。
    pub fn compile_all(&self, templates: Vec<CommandTemplate>) -> Vec<Arc<CompiledCommand>> {
        let mut compiled = Vec::with_capacity(templates.len());
        for template in templates {
            if let Some(hit) = self.cached(&template) {
                compiled.push(hit);
                continue;
            }
            debug!(
                target: "devsim.protocol",
                device_id = %template.device_id,
                command_id = %template.id,
                "compile command template"
            );
            let fresh = Arc::new(CompiledCommand::compile(template));
            if let Ok(mut devices) = self.devices.write() {
                let template = fresh.template();
                devices
                    .entry(template.device_id.clone())
                    .or_default()
                    .insert(template.id.clone(), Arc::clone(&fresh));
            }
            compiled.push(fresh);
        }
        compiled
    }

    pub fn evict_device(&self, device_id: &str) {
        if let Ok(mut devices) = self.devices.write() {
            devices.remove(device_id);
        }
    }

    pub fn len(&self) -> usize {
        self.devices
            .read()
            .map(|d| d.values().map(HashMap::len).sum())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{CommandType, StreamType};

    fn template(req: &str) -> CommandTemplate {
        CommandTemplate::new("c1", "d1", CommandType::Get, StreamType::Ascii, req)
    }

    #[test]
    fn reuses_unchanged_and_recompiles_changed() {
        let cache = TemplateCache::new();
        let first = cache.compile_all(vec![template("A")]);
        let again = cache.compile_all(vec![template("A")]);
        assert!(Arc::ptr_eq(&first[0], &again[0]));

        let changed = cache.compile_all(vec![template("B")]);
        assert!(!Arc::ptr_eq(&first[0], &changed[0]));
        assert_eq!(cache.len(), 1);

        cache.evict_device("d1");
        assert!(cache.is_empty());
    }
}
