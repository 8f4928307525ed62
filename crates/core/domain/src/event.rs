//! 设备事件：推送给通知边界的连接、断开、收发记录。

use crate::now_epoch_ms;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceEventKind {
    #[serde(rename = "device:connect")]
    Connect,
    #[serde(rename = "device:disconnect")]
    Disconnect,
    #[serde(rename = "device:send")]
    Send,
    #[serde(rename = "device:receive")]
    Receive,
}

/// 设备事件。
///
/// `address` 为 `ip:port`（已去除 IPv4 映射前缀），`stream` 为 `<hex> - <文本>`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceEvent {
    pub device_id: String,
    #[serde(rename = "event")]
    pub kind: DeviceEventKind,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub stream: Option<String>,
    pub timestamp_ms: i64,
}

impl DeviceEvent {
    fn build(
        device_id: &str,
        kind: DeviceEventKind,
        address: String,
        stream: Option<String>,
    ) -> Self {
        Self {
            device_id: device_id.to_string(),
            kind,
            address,
            stream,
            timestamp_ms: now_epoch_ms(),
        }
    }

    pub fn connect(device_id: &str, address: impl Into<String>) -> Self {
        Self::build(device_id, DeviceEventKind::Connect, address.into(), None)
    }

    pub fn disconnect(device_id: &str, address: impl Into<String>) -> Self {
        Self::build(device_id, DeviceEventKind::Disconnect, address.into(), None)
    }

    pub fn send(device_id: &str, address: impl Into<String>, stream: impl Into<String>) -> Self {
        Self::build(
            device_id,
            DeviceEventKind::Send,
            address.into(),
            Some(stream.into()),
        )
    }

    pub fn receive(
        device_id: &str,
        address: impl Into<String>,
        stream: impl Into<String>,
    ) -> Self {
        Self::build(
            device_id,
            DeviceEventKind::Receive,
            address.into(),
            Some(stream.into()),
        )
    }
}
