//! 内存存储实现模块
//!
//! 包含以下实现：
//! - DeviceStore: InMemoryDeviceStore
//! - CommandStore: InMemoryCommandStore
//! - 设备状态：StateStore

pub mod command;
pub mod device;
pub mod state;

pub use command::*;
pub use device::*;
pub use state::*;
