//! 设备配置。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 设备声明的传输协议。
///
/// 仅 `TcpServer` 与 `UdpServer` 具备运行时行为，其余取值只作为配置被接受。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    #[serde(rename = "TCPServer")]
    TcpServer,
    #[serde(rename = "UDPServer")]
    UdpServer,
    #[serde(rename = "TCPClient")]
    TcpClient,
    #[serde(rename = "UDPClient")]
    UdpClient,
    Modbus,
    Telnet,
    #[serde(rename = "HTTP")]
    Http,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TcpServer => "TCPServer",
            Self::UdpServer => "UDPServer",
            Self::TcpClient => "TCPClient",
            Self::UdpClient => "UDPClient",
            Self::Modbus => "Modbus",
            Self::Telnet => "Telnet",
            Self::Http => "HTTP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未知协议名。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProtocol(pub String);

impl fmt::Display for UnknownProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown protocol: {}", self.0)
    }
}

impl std::error::Error for UnknownProtocol {}

impl FromStr for Protocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TCPServer" => Ok(Self::TcpServer),
            "UDPServer" => Ok(Self::UdpServer),
            "TCPClient" => Ok(Self::TcpClient),
            "UDPClient" => Ok(Self::UdpClient),
            "Modbus" => Ok(Self::Modbus),
            "Telnet" => Ok(Self::Telnet),
            "HTTP" => Ok(Self::Http),
            other => Err(UnknownProtocol(other.to_string())),
        }
    }
}

/// 设备配置（对引擎只读）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceConfig {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(rename = "deviceName", alias = "name")]
    pub name: String,
    #[serde(rename = "deviceType", alias = "type", default)]
    pub device_type: String,
    pub protocol: Protocol,
    /// 监听端口；0 表示使用运行配置中的默认端口
    #[serde(rename = "devicePort", alias = "port", default)]
    pub port: u16,
}

impl DeviceConfig {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        protocol: Protocol,
        port: u16,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            device_type: String::new(),
            protocol,
            port,
        }
    }
}
