//! 仿真器领域模型：设备配置、命令模板、设备状态记录与事件。

pub mod codec;
pub mod command;
pub mod device;
pub mod event;
pub mod record;

pub use command::{CommandTemplate, CommandType, ParamSpec, StreamType};
pub use device::{DeviceConfig, Protocol, UnknownProtocol};
pub use event::{DeviceEvent, DeviceEventKind};
pub use record::{DEFAULT_UNIQUE_KEY, ParamValues, StoredRecord, unique_key};

/// 获取当前时间戳（毫秒）
pub fn now_epoch_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}
