//! 协议错误类型定义

/// 协议通信错误
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// 端口已被占用
    #[error("address already in use: {0}")]
    AddrInUse(String),

    /// 绑定失败
    #[error("bind {addr} failed: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// 对端长时间不收数据，写出超时
    #[error("write to {peer} timed out after {after:?}")]
    WriteTimeout {
        peer: String,
        after: std::time::Duration,
    },

    /// IO 错误
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 模板错误
    #[error("template error: {0}")]
    Template(String),

    /// 应答码流编码错误
    #[error("encode error: {0}")]
    Encode(String),
}

impl ProtocolError {
    /// 绑定失败：端口占用单独区分。
    pub fn bind(addr: String, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::AddrInUse {
            Self::AddrInUse(addr)
        } else {
            Self::Bind { addr, source }
        }
    }
}
