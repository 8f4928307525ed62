//! 事件通知边界
//!
//! 引擎只负责产生 [`DeviceEvent`]，推送方式由实现决定。

use async_trait::async_trait;
use domain::DeviceEvent;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// 设备事件通知器。
#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn notify(&self, event: DeviceEvent);
}

/// 空通知器（用于占位）。
#[derive(Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl EventNotifier for NoopNotifier {
    async fn notify(&self, _event: DeviceEvent) {}
}

/// 以日志形式输出事件。
#[derive(Debug, Default)]
pub struct TracingNotifier;

#[async_trait]
impl EventNotifier for TracingNotifier {
    async fn notify(&self, event: DeviceEvent) {
        info!(
            target: "devsim.engine",
            device_id = %event.device_id,
            event = ?event.kind,
            address = %event.address,
            stream = event.stream.as_deref().unwrap_or(""),
            "device event"
        );
    }
}

/// 通过有界通道转发事件；通道满或已关闭时丢弃并告警，不阻塞收发链路。
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::Sender<DeviceEvent>,
}

impl ChannelNotifier {
    pub fn new(tx: mpsc::Sender<DeviceEvent>) -> Self {
        Self { tx }
    }

    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<DeviceEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl EventNotifier for ChannelNotifier {
    async fn notify(&self, event: DeviceEvent) {
        if let Err(err) = self.tx.try_send(event) {
            warn!(target: "devsim.engine", error = %err, "device event dropped");
        }
    }
}
