//! 引擎错误类型定义

use api_contract::PayloadError;
use devsim_storage::StorageError;
use domain::Protocol;

/// 引擎操作错误。
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("device config not found: {0}")]
    ConfigNotFound(String),

    #[error("device {device_id} uses unsupported protocol {protocol}")]
    UnsupportedProtocol { device_id: String, protocol: Protocol },

    #[error("device {device_id} port {port} already in use")]
    PortInUse { device_id: String, port: u16 },

    #[error("device {device_id} failed to start: {reason}")]
    StartFailed { device_id: String, reason: String },

    #[error("device not running: {0}")]
    DeviceNotRunning(String),

    #[error("device has no connected peers: {0}")]
    NoConnectedPeers(String),

    #[error("invalid payload encoding: {0}")]
    InvalidPayloadEncoding(#[from] PayloadError),

    #[error("storage error: {0}")]
    Storage(String),
}

impl EngineError {
    /// 稳定错误码，供请求层映射。
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigNotFound(_) => "DEVICE.NOT_FOUND",
            Self::UnsupportedProtocol { .. } => "DEVICE.UNSUPPORTED_PROTOCOL",
            Self::PortInUse { .. } => "DEVICE.PORT_IN_USE",
            Self::StartFailed { .. } => "DEVICE.START_FAILED",
            Self::DeviceNotRunning(_) => "DEVICE.NOT_RUNNING",
            Self::NoConnectedPeers(_) => "DEVICE.NO_PEERS",
            Self::InvalidPayloadEncoding(_) => "PAYLOAD.INVALID_ENCODING",
            Self::Storage(_) => "INTERNAL.STORAGE",
        }
    }
}

impl From<StorageError> for EngineError {
    fn from(err: StorageError) -> Self {
        Self::Storage(err.to_string())
    }
}
