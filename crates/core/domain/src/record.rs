//! 设备状态记录。
//!
//! 一条记录对应 (deviceId, storeKey)，内部按 uniqueKey 区分多组参数值。

use std::collections::HashMap;

/// 无唯一参数时使用的 uniqueKey。
pub const DEFAULT_UNIQUE_KEY: &str = "_data";

/// 参数键到参数值的映射。
pub type ParamValues = HashMap<String, String>;

/// 由唯一参数值拼接 uniqueKey，为空时回落到 `_data`。
pub fn unique_key<'a, I>(values: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let joined = values.into_iter().collect::<Vec<_>>().join("_");
    if joined.is_empty() {
        DEFAULT_UNIQUE_KEY.to_string()
    } else {
        joined
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredRecord {
    entries: HashMap<String, ParamValues>,
}

impl StoredRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// 覆盖写入某个 uniqueKey 的参数组，保留其它 uniqueKey。
    pub fn upsert(&mut self, unique_key: impl Into<String>, values: ParamValues) {
        self.entries.insert(unique_key.into(), values);
    }

    pub fn entry(&self, unique_key: &str) -> Option<&ParamValues> {
        self.entries.get(unique_key)
    }

    /// 循环块第 `index` 次迭代对应的参数组：先按十进制查找，再按两位小写十六进制查找。
    pub fn indexed(&self, index: usize) -> Option<&ParamValues> {
        self.entries
            .get(&index.to_string())
            .or_else(|| self.entries.get(&format!("{index:02x}")))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
