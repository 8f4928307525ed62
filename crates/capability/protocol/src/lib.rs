//! # 协议仿真能力模块
//!
//! 以 Server 身份模拟设备，支持：
//! - **TCP Server**：每个连接独立任务，每次读取作为一帧
//! - **UDP Server**：单套接字，每个数据报作为一帧，按来源地址回包
//!
//! ## 架构设计
//!
//! ```text
//! TcpServer / UdpServer
//!       │  connected / received / closed
//!       ▼
//! LinkHandler（由引擎实现）
//!       │
//!       ▼
//! TemplateCache → CompiledCommand
//!       │
//!       ├── RequestPattern   匹配 + 参数提取
//!       └── ResponseTemplate 应答合成（含 [NP<n>] 循环块）
//!       │
//!       ▼
//! encode_reply → Peer::send
//! ```
//!
//! ## 模板语法
//!
//! | 标记 | 含义 |
//! |---|---|
//! | `[$name\|len]` | 参数标签，`len` 为字节数或 `?` |
//! | `[SE:literal]` | 变长标签的结束分隔符（请求码流） |
//! | `[NP<n>]` / `[NP\|<n>]` | 应答循环块（应答码流） |

mod cache;
mod codec;
mod command;
mod error;
mod link;
mod matcher;
mod response;
mod tcp_server;
pub mod template;
mod udp_server;

pub use cache::TemplateCache;
pub use codec::{encode_reply, peer_address, render_payload};
pub use command::{CompiledCommand, MatchOutcome, match_frame};
pub use error::ProtocolError;
pub use link::{LinkHandler, ListenerHandle, Peer, WRITE_TIMEOUT};
pub use matcher::{Extraction, RequestPattern};
pub use response::{ResponseTemplate, Substitution};
pub use tcp_server::{TcpServer, TcpServerConfig};
pub use udp_server::{UdpServer, UdpServerConfig};
