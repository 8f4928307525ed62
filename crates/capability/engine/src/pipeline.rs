//! 设备实例的收发链路
//!
//! 收到一帧：登记对端 → 推送 receive 事件 → 匹配命令 →
//! SET 写入状态 / GET 读取状态合成应答并回发给来源对端。

use crate::engine::EngineInner;
use async_trait::async_trait;
use devsim_protocol::{LinkHandler, Peer, match_frame};
use devsim_telemetry::{
    record_frame_matched, record_frame_received, record_frame_unmatched, record_param_skipped,
    record_peer_connected, record_reply_sent, record_send_failure,
};
use domain::codec::stream_text;
use domain::{CommandType, DeviceEvent};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub(crate) struct DeviceLink {
    device_id: String,
    inner: Arc<EngineInner>,
}

impl DeviceLink {
    pub fn new(device_id: &str, inner: Arc<EngineInner>) -> Self {
        Self {
            device_id: device_id.to_string(),
            inner,
        }
    }

    async fn dispatch(&self, peer: &Peer, bytes: &[u8]) {
        let templates = match self.inner.commands.list_commands(&self.device_id).await {
            Ok(templates) => templates,
            Err(err) => {
                warn!(target: "devsim.engine", device_id = %self.device_id, error = %err, "load commands failed");
                return;
            }
        };
        let compiled = self.inner.cache.compile_all(templates);

        let Some((command, outcome)) = match_frame(&compiled, bytes) else {
            record_frame_unmatched();
            debug!(target: "devsim.engine", device_id = %self.device_id, peer = %peer.address(), "no command matched");
            return;
        };
        record_frame_matched();
        for _ in &outcome.skipped {
            record_param_skipped();
        }

        let template = command.template();
        debug!(
            target: "devsim.engine",
            device_id = %self.device_id,
            command_id = %template.id,
            unique_key = %outcome.unique_key,
            "command matched"
        );

        match template.command_type {
            CommandType::Set => {
                let values = command.set_values(&outcome);
                if let Err(err) = self.inner.state.merge(
                    &self.device_id,
                    &template.store_key,
                    &outcome.unique_key,
                    values,
                ) {
                    warn!(target: "devsim.engine", device_id = %self.device_id, error = %err, "state merge failed");
                }
            }
            CommandType::Get => {
                let record = match self.inner.state.record(&self.device_id, &template.store_key) {
                    Ok(record) => record,
                    Err(err) => {
                        warn!(target: "devsim.engine", device_id = %self.device_id, error = %err, "state read failed");
                        return;
                    }
                };
                match command.respond(&outcome, &record) {
                    Ok(Some(reply)) => self.reply(peer, &reply).await,
                    Ok(None) => {}
                    Err(err) => {
                        warn!(
                            target: "devsim.engine",
                            device_id = %self.device_id,
                            command_id = %template.id,
                            error = %err,
                            "response dropped"
                        );
                    }
                }
            }
        }
    }

    /// 只回发给请求来源对端。
    async fn reply(&self, peer: &Peer, bytes: &[u8]) {
        match peer.send(bytes).await {
            Ok(()) => {
                record_reply_sent(bytes.len());
                self.inner
                    .notifier
                    .notify(DeviceEvent::send(&self.device_id, peer.address(), stream_text(bytes)))
                    .await;
            }
            Err(err) => {
                record_send_failure();
                warn!(target: "devsim.engine", device_id = %self.device_id, peer = %peer.address(), error = %err, "reply failed");
            }
        }
    }
}

#[async_trait]
impl LinkHandler for DeviceLink {
    async fn connected(&self, peer: &Peer) {
        if self.inner.peers.insert(&self.device_id, peer) {
            record_peer_connected();
        }
        info!(target: "devsim.engine", device_id = %self.device_id, peer = %peer.address(), "peer connected");
        self.inner
            .notifier
            .notify(DeviceEvent::connect(&self.device_id, peer.address()))
            .await;
    }

    async fn received(&self, peer: &Peer, bytes: &[u8]) {
        // UDP 对端在首个数据报到达时登记
        if self.inner.peers.insert(&self.device_id, peer) {
            record_peer_connected();
        }
        record_frame_received();
        self.inner
            .notifier
            .notify(DeviceEvent::receive(&self.device_id, peer.address(), stream_text(bytes)))
            .await;
        self.dispatch(peer, bytes).await;
    }

    async fn closed(&self, peer: &Peer) {
        self.inner.peers.remove(&self.device_id, peer.socket_addr());
        info!(target: "devsim.engine", device_id = %self.device_id, peer = %peer.address(), "peer disconnected");
        self.inner
            .notifier
            .notify(DeviceEvent::disconnect(&self.device_id, peer.address()))
            .await;
    }
}
