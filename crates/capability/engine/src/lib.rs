//! # 设备仿真引擎
//!
//! 管理设备实例的生命周期，把监听器收到的报文接入命令匹配与状态读写，
//! 并把连接、断开、收发事件推送给 [`EventNotifier`]。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let (notifier, mut events) = ChannelNotifier::channel(1024);
//! let engine = Engine::new(EngineOptions::default(), devices, commands, Arc::new(notifier));
//! let report = engine.start("dev-1").await?;
//! engine.send("dev-1", &SendRequest::hex("010300000001")).await?;
//! engine.stop("dev-1").await;
//! ```

mod engine;
mod error;
mod notify;
mod peers;
mod pipeline;

pub use engine::{Engine, EngineOptions, InstanceStatus, StartReport};
pub use error::EngineError;
pub use notify::{ChannelNotifier, EventNotifier, NoopNotifier, TracingNotifier};
