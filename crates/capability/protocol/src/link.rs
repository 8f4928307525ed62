//! 监听器与上层之间的连接接口
//!
//! - [`LinkHandler`]：连接建立、收到数据、连接关闭三个回调
//! - [`Peer`]：一个远端地址及其回写通道（TCP 写半部或共享 UDP 套接字）
//! - [`ListenerHandle`]：运行中的监听任务，`shutdown` 返回时端口已释放

use crate::codec::peer_address;
use crate::error::ProtocolError;
use async_trait::async_trait;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::UdpSocket;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// 单次写出的最长等待时间，超时视为该对端写失败
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// 连接事件回调
#[async_trait]
pub trait LinkHandler: Send + Sync {
    /// TCP 连接建立（UDP 无此回调）
    async fn connected(&self, peer: &Peer);

    /// 收到一帧数据（TCP 每次读取 / UDP 每个数据报）
    async fn received(&self, peer: &Peer, bytes: &[u8]);

    /// TCP 连接关闭
    async fn closed(&self, peer: &Peer);
}

#[derive(Clone)]
enum PeerLink {
    Tcp(Arc<Mutex<OwnedWriteHalf>>),
    Udp(Arc<UdpSocket>),
}

/// 远端对端。
#[derive(Clone)]
pub struct Peer {
    addr: SocketAddr,
    link: PeerLink,
}

impl Peer {
    pub fn tcp(addr: SocketAddr, writer: OwnedWriteHalf) -> Self {
        Self {
            addr,
            link: PeerLink::Tcp(Arc::new(Mutex::new(writer))),
        }
    }

    pub fn udp(addr: SocketAddr, socket: Arc<UdpSocket>) -> Self {
        Self {
            addr,
            link: PeerLink::Udp(socket),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        self.addr
    }

    /// `ip:port` 形式的地址
    pub fn address(&self) -> String {
        peer_address(&self.addr)
    }

    /// 写出完整数据：TCP 走该连接，UDP 经共享套接字发往该对端。
    ///
    /// 对端不读数据时写出会挂起，超过 [`WRITE_TIMEOUT`] 返回
    /// [`ProtocolError::WriteTimeout`]。
    pub async fn send(&self, bytes: &[u8]) -> Result<(), ProtocolError> {
        self.send_within(bytes, WRITE_TIMEOUT).await
    }

    /// 同 [`Peer::send`]，超时时间由调用方指定。
    pub async fn send_within(&self, bytes: &[u8], limit: Duration) -> Result<(), ProtocolError> {
        let write = async {
            match &self.link {
                PeerLink::Tcp(writer) => {
                    let mut writer = writer.lock().await;
                    writer.write_all(bytes).await?;
                    writer.flush().await?;
                }
                PeerLink::Udp(socket) => {
                    socket.send_to(bytes, self.addr).await?;
                }
            }
            Ok::<(), std::io::Error>(())
        };
        match tokio::time::timeout(limit, write).await {
            Ok(result) => result.map_err(ProtocolError::from),
            Err(_) => Err(ProtocolError::WriteTimeout {
                peer: self.address(),
                after: limit,
            }),
        }
    }

    /// 关闭 TCP 写方向，UDP 无操作。写半部被占用超过 [`WRITE_TIMEOUT`] 时放弃。
    pub async fn shutdown(&self) {
        if let PeerLink::Tcp(writer) = &self.link {
            let close = async { writer.lock().await.shutdown().await };
            let err = match tokio::time::timeout(WRITE_TIMEOUT, close).await {
                Ok(Ok(())) => return,
                Ok(Err(err)) => err.to_string(),
                Err(_) => "timed out".to_string(),
            };
            warn!(
                target: "devsim.protocol",
                peer = %self.address(),
                error = %err,
                "tcp shutdown failed"
            );
        }
    }
}

impl fmt::Debug for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let transport = match self.link {
            PeerLink::Tcp(_) => "tcp",
            PeerLink::Udp(_) => "udp",
        };
        f.debug_struct("Peer")
            .field("addr", &self.addr)
            .field("transport", &transport)
            .finish()
    }
}

/// 运行中的监听任务句柄。
pub struct ListenerHandle {
    local_addr: SocketAddr,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    pub(crate) fn new(local_addr: SocketAddr, cancel: CancellationToken, task: JoinHandle<()>) -> Self {
        Self {
            local_addr,
            cancel,
            task,
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// 取消监听并等待任务退出；返回时所有连接已关闭、端口已释放。
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(err) = self.task.await {
            warn!(
                target: "devsim.protocol",
                local_addr = %self.local_addr,
                error = %err,
                "listener task ended abnormally"
            );
        }
    }
}
