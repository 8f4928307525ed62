//! UDP 服务器实现
//!
//! 单个套接字接收所有数据报，每个数据报按来源地址构造 [`Peer`]，
//! 应答经同一套接字发回该来源地址。

use crate::codec::peer_address;
use crate::error::ProtocolError;
use crate::link::{LinkHandler, ListenerHandle, Peer};
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, warn};

/// 单个数据报的最大长度
const MAX_DATAGRAM: usize = 65_535;

/// UDP 服务器配置
#[derive(Debug, Clone)]
pub struct UdpServerConfig {
    pub bind_host: String,
    pub port: u16,
}

pub struct UdpServer {
    config: UdpServerConfig,
}

impl UdpServer {
    pub fn new(config: UdpServerConfig) -> Self {
        Self { config }
    }

    pub async fn bind(self, handler: Arc<dyn LinkHandler>) -> Result<ListenerHandle, ProtocolError> {
        let addr = format!("{}:{}", self.config.bind_host, self.config.port);
        let socket = UdpSocket::bind(&addr)
            .await
            .map_err(|source| ProtocolError::bind(addr.clone(), source))?;
        let local_addr = socket.local_addr()?;

        info!(target: "devsim.protocol", %local_addr, "udp server listening");

        let cancel = CancellationToken::new();
        let task = tokio::spawn(
            recv_loop(Arc::new(socket), handler, cancel.clone()).in_current_span(),
        );
        Ok(ListenerHandle::new(local_addr, cancel, task))
    }
}

async fn recv_loop(socket: Arc<UdpSocket>, handler: Arc<dyn LinkHandler>, cancel: CancellationToken) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            received = socket.recv_from(&mut buf) => match received {
                Ok((n, from)) => {
                    debug!(target: "devsim.protocol", peer = %peer_address(&from), bytes = n, "received udp datagram");
                    let peer = Peer::udp(from, Arc::clone(&socket));
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        _ = handler.received(&peer, &buf[..n]) => {}
                    }
                }
                // 对端不可达等错误只影响单个数据报
                Err(e) => {
                    warn!(target: "devsim.protocol", error = %e, "udp receive failed");
                }
            }
        }
    }
}
