//! 日志初始化、实例 ID 生成与仿真运行指标。

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

/// 运行指标快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_received: u64,
    pub frames_matched: u64,
    pub frames_unmatched: u64,
    pub replies_sent: u64,
    pub bytes_sent: u64,
    pub send_failures: u64,
    pub params_skipped: u64,
    pub peers_connected: u64,
    pub instances_started: u64,
    pub instances_stopped: u64,
    pub start_failures: u64,
}

/// 运行指标。
pub struct TelemetryMetrics {
    frames_received: AtomicU64,
    frames_matched: AtomicU64,
    frames_unmatched: AtomicU64,
    replies_sent: AtomicU64,
    bytes_sent: AtomicU64,
    send_failures: AtomicU64,
    params_skipped: AtomicU64,
    peers_connected: AtomicU64,
    instances_started: AtomicU64,
    instances_stopped: AtomicU64,
    start_failures: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            frames_received: AtomicU64::new(0),
            frames_matched: AtomicU64::new(0),
            frames_unmatched: AtomicU64::new(0),
            replies_sent: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            send_failures: AtomicU64::new(0),
            params_skipped: AtomicU64::new(0),
            peers_connected: AtomicU64::new(0),
            instances_started: AtomicU64::new(0),
            instances_stopped: AtomicU64::new(0),
            start_failures: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_matched: self.frames_matched.load(Ordering::Relaxed),
            frames_unmatched: self.frames_unmatched.load(Ordering::Relaxed),
            replies_sent: self.replies_sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            params_skipped: self.params_skipped.load(Ordering::Relaxed),
            peers_connected: self.peers_connected.load(Ordering::Relaxed),
            instances_started: self.instances_started.load(Ordering::Relaxed),
            instances_stopped: self.instances_stopped.load(Ordering::Relaxed),
            start_failures: self.start_failures.load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的设备实例运行 ID。
pub fn new_instance_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// 记录收到的报文帧。
pub fn record_frame_received() {
    metrics().frames_received.fetch_add(1, Ordering::Relaxed);
}

/// 记录命中模板的报文帧。
pub fn record_frame_matched() {
    metrics().frames_matched.fetch_add(1, Ordering::Relaxed);
}

/// 记录未命中任何模板的报文帧。
pub fn record_frame_unmatched() {
    metrics().frames_unmatched.fetch_add(1, Ordering::Relaxed);
}

/// 记录应答发送成功（含字节数）。
pub fn record_reply_sent(bytes: usize) {
    let metrics = metrics();
    metrics.replies_sent.fetch_add(1, Ordering::Relaxed);
    metrics
        .bytes_sent
        .fetch_add(u64::try_from(bytes).unwrap_or(u64::MAX), Ordering::Relaxed);
}

/// 记录发送失败次数。
pub fn record_send_failure() {
    metrics().send_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录参数提取跳过次数。
pub fn record_param_skipped() {
    metrics().params_skipped.fetch_add(1, Ordering::Relaxed);
}

/// 记录新接入的对端。
pub fn record_peer_connected() {
    metrics().peers_connected.fetch_add(1, Ordering::Relaxed);
}

/// 记录实例启动成功。
pub fn record_instance_started() {
    metrics().instances_started.fetch_add(1, Ordering::Relaxed);
}

/// 记录实例停止。
pub fn record_instance_stopped() {
    metrics().instances_stopped.fetch_add(1, Ordering::Relaxed);
}

/// 记录实例启动失败。
pub fn record_start_failure() {
    metrics().start_failures.fetch_add(1, Ordering::Relaxed);
}
