//! TCP 服务器实现
//!
//! 监听 TCP 端口，每个连接一个任务；每次读取到的数据作为一帧交给 [`LinkHandler`]。
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! let config = TcpServerConfig {
//!     bind_host: "0.0.0.0".to_string(),
//!     port: 15020,
//!     read_buffer_bytes: 4096,
//! };
//! let handle = TcpServer::new(config).bind(handler).await?;
//! // ...
//! handle.shutdown().await;
//! ```

use crate::codec::peer_address;
use crate::error::ProtocolError;
use crate::link::{LinkHandler, ListenerHandle, Peer};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, warn};

/// TCP 服务器配置
#[derive(Debug, Clone)]
pub struct TcpServerConfig {
    /// 监听地址
    pub bind_host: String,
    /// 监听端口
    pub port: u16,
    /// 单次读取缓冲区大小
    pub read_buffer_bytes: usize,
}

pub struct TcpServer {
    config: TcpServerConfig,
}

impl TcpServer {
    pub fn new(config: TcpServerConfig) -> Self {
        Self { config }
    }

    /// 绑定端口并启动接入任务。绑定失败直接返回错误。
    pub async fn bind(self, handler: Arc<dyn LinkHandler>) -> Result<ListenerHandle, ProtocolError> {
        let addr = format!("{}:{}", self.config.bind_host, self.config.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ProtocolError::bind(addr.clone(), source))?;
        let local_addr = listener.local_addr()?;

        info!(target: "devsim.protocol", %local_addr, "tcp server listening");

        let cancel = CancellationToken::new();
        let buffer = self.config.read_buffer_bytes.max(1);
        let task = tokio::spawn(
            accept_loop(listener, handler, cancel.clone(), buffer).in_current_span(),
        );
        Ok(ListenerHandle::new(local_addr, cancel, task))
    }
}

async fn accept_loop(
    listener: TcpListener,
    handler: Arc<dyn LinkHandler>,
    cancel: CancellationToken,
    buffer: usize,
) {
    let mut connections = JoinSet::new();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer_addr)) => {
                    info!(target: "devsim.protocol", peer = %peer_address(&peer_addr), "new connection");
                    connections.spawn(
                        handle_connection(
                            stream,
                            peer_addr,
                            Arc::clone(&handler),
                            cancel.clone(),
                            buffer,
                        )
                        .in_current_span(),
                    );
                }
                Err(e) => {
                    error!(target: "devsim.protocol", error = %e, "failed to accept connection");
                }
            },
            Some(joined) = connections.join_next(), if !connections.is_empty() => {
                if let Err(e) = joined {
                    warn!(target: "devsim.protocol", error = %e, "connection task failed");
                }
            }
        }
    }

    // 先释放监听端口，再等待各连接发出断开通知
    drop(listener);
    while let Some(joined) = connections.join_next().await {
        if let Err(e) = joined {
            warn!(target: "devsim.protocol", error = %e, "connection task failed");
        }
    }
}

fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionAborted
    )
}

/// 处理单个连接
async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    handler: Arc<dyn LinkHandler>,
    cancel: CancellationToken,
    buffer: usize,
) {
    let (mut reader, writer) = stream.into_split();
    let peer = Peer::tcp(peer_addr, writer);
    handler.connected(&peer).await;

    let mut buf = vec![0u8; buffer];
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            read = reader.read(&mut buf) => match read {
                Ok(0) => {
                    info!(target: "devsim.protocol", peer = %peer.address(), "connection closed by peer");
                    break;
                }
                Ok(n) => {
                    debug!(target: "devsim.protocol", peer = %peer.address(), bytes = n, "received tcp data");
                    // 应答写出可能阻塞，停止时不再等待
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = handler.received(&peer, &buf[..n]) => {}
                    }
                }
                Err(e) if is_transient(&e) => {
                    warn!(target: "devsim.protocol", peer = %peer.address(), error = %e, "connection dropped");
                    break;
                }
                Err(e) => {
                    error!(target: "devsim.protocol", peer = %peer.address(), error = %e, "connection read failed");
                    break;
                }
            }
        }
    }

    peer.shutdown().await;
    handler.closed(&peer).await;
}
