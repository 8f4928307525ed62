//! 命令模板与参数定义。
//!
//! 模板语法：
//!
//! | 标记 | 含义 |
//! |---|---|
//! | `[$name\|len]` | 参数标签，`len` 为正整数（定长）或 `?`（变长） |
//! | `[SE:literal]` | 变长标签的结束分隔符，仅用于请求码流 |
//! | `[NP<n>]` / `[NP\|<n>]` | 应答循环块，重复 n 次 |

use serde::{Deserialize, Serialize};

/// 命令类型：GET 读取状态并应答，SET 写入状态不应答。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandType {
    #[serde(rename = "GET")]
    Get,
    #[serde(rename = "SET")]
    Set,
}

/// 码流类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamType {
    #[serde(rename = "ASCII")]
    Ascii,
    #[serde(rename = "HEX")]
    Hex,
}

impl StreamType {
    /// 每个字节在渲染文本中占用的字符数。
    pub fn chars_per_byte(self) -> usize {
        match self {
            Self::Ascii => 1,
            Self::Hex => 2,
        }
    }
}

/// 命令参数定义。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "paramKey")]
    pub key: String,
    #[serde(rename = "paramName", default)]
    pub name: String,
    /// 标签文本，例如 `[$temp|2]`
    #[serde(rename = "paramLabel")]
    pub label: String,
    /// 声明长度（字节），标签自身未携带长度时使用
    #[serde(rename = "paramLength", default)]
    pub length: usize,
    /// 静态兜底值
    #[serde(rename = "paramValue", default)]
    pub value: Option<String>,
    #[serde(rename = "isUnique", default)]
    pub is_unique: bool,
}

impl ParamSpec {
    pub fn new(key: impl Into<String>, label: impl Into<String>, length: usize) -> Self {
        Self {
            key: key.into(),
            name: String::new(),
            label: label.into(),
            length,
            value: None,
            is_unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.is_unique = true;
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// 非空静态值。
    pub fn static_value(&self) -> Option<&str> {
        self.value.as_deref().filter(|v| !v.is_empty())
    }
}

/// 命令模板：一对请求/应答码流及参数表。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandTemplate {
    #[serde(alias = "_id")]
    pub id: String,
    pub device_id: String,
    #[serde(rename = "commandName", default)]
    pub name: String,
    pub command_type: CommandType,
    pub stream_type: StreamType,
    pub req_stream: String,
    #[serde(default)]
    pub res_stream: String,
    #[serde(default)]
    pub store_key: String,
    #[serde(default)]
    pub params: Vec<ParamSpec>,
}

impl CommandTemplate {
    pub fn new(
        id: impl Into<String>,
        device_id: impl Into<String>,
        command_type: CommandType,
        stream_type: StreamType,
        req_stream: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            device_id: device_id.into(),
            name: String::new(),
            command_type,
            stream_type,
            req_stream: req_stream.into(),
            res_stream: String::new(),
            store_key: String::new(),
            params: Vec::new(),
        }
    }

    pub fn with_response(mut self, res_stream: impl Into<String>) -> Self {
        self.res_stream = res_stream.into();
        self
    }

    pub fn with_store_key(mut self, store_key: impl Into<String>) -> Self {
        self.store_key = store_key.into();
        self
    }

    pub fn with_param(mut self, param: ParamSpec) -> Self {
        self.params.push(param);
        self
    }
}
