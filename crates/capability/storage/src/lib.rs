//! # devsim Storage 模块
//!
//! 为仿真引擎提供两类存储：
//!
//! 1. **配置存储**（只读视角）：设备配置与命令模板由外部协作方维护，
//!    引擎通过 [`DeviceStore`] / [`CommandStore`] 异步接口读取。
//! 2. **设备状态存储**（[`StateStore`]）：SET 命令写入、GET 命令读取的参数值，
//!    按 (deviceId, storeKey, uniqueKey) 寻址，仅存在于进程内存中。
//!
//! ## 模块说明
//!
//! - [`traits`]：配置存储接口定义
//! - [`error`]：存储错误类型定义
//! - [`in_memory`]：内存实现（配置存储 + 状态存储）
//! - [`fixture`]：JSON 夹具文件加载
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use devsim_storage::{CommandStore, load_fixture};
//!
//! let (devices, commands) = load_fixture("fixtures/devices.json")?.into_stores();
//! let templates = commands.list_commands("dev-1").await?;
//! ```

pub mod error;
pub mod fixture;
pub mod in_memory;
pub mod traits;

pub use error::*;
pub use fixture::{Fixture, load_fixture};
pub use in_memory::{InMemoryCommandStore, InMemoryDeviceStore, StateStore};
pub use traits::*;
