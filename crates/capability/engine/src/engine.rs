//! 设备实例管理
//!
//! [`Engine`] 聚合实例表、状态存储、对端表与模板缓存，内部以 `Arc` 共享，
//! 克隆后交给各监听任务使用。同一设备的 start/stop 通过设备级锁串行执行，
//! 不同设备互不阻塞。

use crate::error::EngineError;
use crate::notify::EventNotifier;
use crate::peers::PeerRegistry;
use crate::pipeline::DeviceLink;
use api_contract::SendRequest;
use devsim_protocol::{
    LinkHandler, ListenerHandle, ProtocolError, TcpServer, TcpServerConfig, TemplateCache,
    UdpServer, UdpServerConfig,
};
use devsim_storage::{CommandStore, DeviceStore, StateStore};
use devsim_telemetry::{
    new_instance_id, record_instance_started, record_instance_stopped, record_send_failure,
    record_start_failure,
};
use domain::codec::stream_text;
use domain::{DeviceEvent, Protocol, StoredRecord};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tokio::task::JoinSet;
use tracing::{Instrument, info, info_span, warn};

/// 引擎运行参数。
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// 监听地址
    pub bind_host: String,
    /// 设备端口为 0 时使用的端口
    pub default_port: u16,
    /// TCP 单次读取缓冲区大小
    pub read_buffer_bytes: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            default_port: 502,
            read_buffer_bytes: 4096,
        }
    }
}

/// 设备实例状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Stopped,
    Starting,
    Running,
    /// 最近一次启动失败
    Failed,
}

/// 启动结果。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartReport {
    pub device_id: String,
    pub protocol: Protocol,
    pub port: u16,
    pub instance_id: String,
}

struct RuntimeInstance {
    instance_id: String,
    status: InstanceStatus,
    listener: Option<ListenerHandle>,
}

pub(crate) struct EngineInner {
    options: EngineOptions,
    devices: Arc<dyn DeviceStore>,
    pub(crate) commands: Arc<dyn CommandStore>,
    pub(crate) notifier: Arc<dyn EventNotifier>,
    pub(crate) state: StateStore,
    pub(crate) peers: PeerRegistry,
    pub(crate) cache: TemplateCache,
    instances: RwLock<HashMap<String, RuntimeInstance>>,
    failed: RwLock<HashSet<String>>,
    lifecycle: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl EngineInner {
    fn lifecycle_lock(&self, device_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(device_id.to_string()).or_default())
    }

    fn set_failed(&self, device_id: &str, failed: bool) {
        let mut set = self.failed.write().unwrap_or_else(PoisonError::into_inner);
        if failed {
            set.insert(device_id.to_string());
        } else {
            set.remove(device_id);
        }
    }

    fn take_instance(&self, device_id: &str) -> Option<RuntimeInstance> {
        self.instances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(device_id)
    }

    fn is_running(&self, device_id: &str) -> bool {
        self.instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(device_id)
            .is_some_and(|instance| instance.status == InstanceStatus::Running)
    }
}

/// 设备仿真引擎。
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    pub fn new(
        options: EngineOptions,
        devices: Arc<dyn DeviceStore>,
        commands: Arc<dyn CommandStore>,
        notifier: Arc<dyn EventNotifier>,
    ) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                options,
                devices,
                commands,
                notifier,
                state: StateStore::new(),
                peers: PeerRegistry::default(),
                cache: TemplateCache::new(),
                instances: RwLock::new(HashMap::new()),
                failed: RwLock::new(HashSet::new()),
                lifecycle: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// 启动设备实例；已在运行时先完整停止再重新绑定。
    pub async fn start(&self, device_id: &str) -> Result<StartReport, EngineError> {
        let lock = self.inner.lifecycle_lock(device_id);
        let _guard = lock.lock().await;

        let device = self
            .inner
            .devices
            .find_device(device_id)
            .await?
            .ok_or_else(|| EngineError::ConfigNotFound(device_id.to_string()))?;

        self.stop_locked(device_id).await;

        let port = if device.port == 0 {
            self.inner.options.default_port
        } else {
            device.port
        };
        if !matches!(device.protocol, Protocol::TcpServer | Protocol::UdpServer) {
            record_start_failure();
            self.inner.set_failed(device_id, true);
            warn!(
                target: "devsim.engine",
                device_id,
                protocol = %device.protocol,
                "unsupported protocol"
            );
            return Err(EngineError::UnsupportedProtocol {
                device_id: device_id.to_string(),
                protocol: device.protocol,
            });
        }

        let instance_id = new_instance_id();
        self.inner
            .instances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                device_id.to_string(),
                RuntimeInstance {
                    instance_id: instance_id.clone(),
                    status: InstanceStatus::Starting,
                    listener: None,
                },
            );

        let span = info_span!(
            "device_instance",
            device_id,
            instance_id = %instance_id,
            protocol = %device.protocol,
            port
        );
        let handler: Arc<dyn LinkHandler> = Arc::new(DeviceLink::new(device_id, Arc::clone(&self.inner)));
        let bound = self.bind(device.protocol, port, handler).instrument(span).await;

        let listener = match bound {
            Ok(listener) => listener,
            Err(err) => {
                self.inner.take_instance(device_id);
                self.inner.set_failed(device_id, true);
                record_start_failure();
                warn!(target: "devsim.engine", device_id, port, error = %err, "device start failed");
                return Err(match err {
                    ProtocolError::AddrInUse(_) => EngineError::PortInUse {
                        device_id: device_id.to_string(),
                        port,
                    },
                    other => EngineError::StartFailed {
                        device_id: device_id.to_string(),
                        reason: other.to_string(),
                    },
                });
            }
        };

        let bound_port = listener.local_addr().port();
        if let Some(instance) = self
            .inner
            .instances
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(device_id)
        {
            instance.status = InstanceStatus::Running;
            instance.listener = Some(listener);
        }
        self.inner.set_failed(device_id, false);
        record_instance_started();
        info!(
            target: "devsim.engine",
            device_id,
            instance_id = %instance_id,
            protocol = %device.protocol,
            port = bound_port,
            "device started"
        );

        Ok(StartReport {
            device_id: device_id.to_string(),
            protocol: device.protocol,
            port: bound_port,
            instance_id,
        })
    }

    async fn bind(
        &self,
        protocol: Protocol,
        port: u16,
        handler: Arc<dyn LinkHandler>,
    ) -> Result<ListenerHandle, ProtocolError> {
        let bind_host = self.inner.options.bind_host.clone();
        match protocol {
            Protocol::UdpServer => UdpServer::new(UdpServerConfig { bind_host, port }).bind(handler).await,
            _ => {
                TcpServer::new(TcpServerConfig {
                    bind_host,
                    port,
                    read_buffer_bytes: self.inner.options.read_buffer_bytes,
                })
                .bind(handler)
                .await
            }
        }
    }

    /// 停止设备实例，返回是否有实例被停止。返回时端口已释放。
    pub async fn stop(&self, device_id: &str) -> bool {
        let lock = self.inner.lifecycle_lock(device_id);
        let _guard = lock.lock().await;
        self.stop_locked(device_id).await
    }

    async fn stop_locked(&self, device_id: &str) -> bool {
        let Some(instance) = self.inner.take_instance(device_id) else {
            return false;
        };
        if let Some(listener) = instance.listener {
            listener.shutdown().await;
        }
        let peers = self.inner.peers.clear(device_id);
        let records = self.inner.state.clear_device(device_id).unwrap_or_default();
        self.inner.cache.evict_device(device_id);
        self.inner.set_failed(device_id, false);
        record_instance_stopped();
        info!(
            target: "devsim.engine",
            device_id,
            instance_id = %instance.instance_id,
            peers,
            records,
            "device stopped"
        );
        true
    }

    /// 校验载荷后发往设备的全部对端，返回成功写出的对端数。
    pub async fn send(&self, device_id: &str, request: &SendRequest) -> Result<usize, EngineError> {
        let bytes = request.to_bytes()?;
        self.send_raw(device_id, &bytes).await
    }

    pub async fn send_raw(&self, device_id: &str, bytes: &[u8]) -> Result<usize, EngineError> {
        if self.inner.devices.find_device(device_id).await?.is_none() {
            return Err(EngineError::ConfigNotFound(device_id.to_string()));
        }
        if !self.inner.is_running(device_id) {
            return Err(EngineError::DeviceNotRunning(device_id.to_string()));
        }
        let peers = self.inner.peers.list(device_id);
        if peers.is_empty() {
            return Err(EngineError::NoConnectedPeers(device_id.to_string()));
        }

        // 各对端并发写出，单个对端阻塞不拖住其余对端
        let mut writes = JoinSet::new();
        for peer in peers {
            let bytes = bytes.to_vec();
            writes.spawn(async move {
                let result = peer.send(&bytes).await;
                (peer, result)
            });
        }

        let mut delivered = 0;
        while let Some(joined) = writes.join_next().await {
            match joined {
                Ok((peer, Ok(()))) => {
                    delivered += 1;
                    self.inner
                        .notifier
                        .notify(DeviceEvent::send(device_id, peer.address(), stream_text(bytes)))
                        .await;
                }
                Ok((peer, Err(err))) => {
                    record_send_failure();
                    warn!(
                        target: "devsim.engine",
                        device_id,
                        peer = %peer.address(),
                        error = %err,
                        "send failed"
                    );
                }
                Err(err) => {
                    record_send_failure();
                    warn!(target: "devsim.engine", device_id, error = %err, "send task failed");
                }
            }
        }
        Ok(delivered)
    }

    pub fn status(&self, device_id: &str) -> InstanceStatus {
        if let Some(instance) = self
            .inner
            .instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(device_id)
        {
            return instance.status;
        }
        let failed = self
            .inner
            .failed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(device_id);
        if failed {
            InstanceStatus::Failed
        } else {
            InstanceStatus::Stopped
        }
    }

    /// 运行中的设备 ID（已排序）
    pub fn running_devices(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .inner
            .instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, instance)| instance.status == InstanceStatus::Running)
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// 设备当前对端地址（登记顺序）
    pub fn peers(&self, device_id: &str) -> Vec<String> {
        self.inner
            .peers
            .list(device_id)
            .iter()
            .map(|peer| peer.address())
            .collect()
    }

    pub fn stored_record(&self, device_id: &str, store_key: &str) -> Result<StoredRecord, EngineError> {
        Ok(self.inner.state.record(device_id, store_key)?)
    }

    /// 停止全部实例
    pub async fn shutdown(&self) {
        let ids: Vec<String> = self
            .inner
            .instances
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        for device_id in ids {
            self.stop(&device_id).await;
        }
    }
}
