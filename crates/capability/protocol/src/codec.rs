//! 报文渲染与应答编码

use crate::error::ProtocolError;
use domain::StreamType;
use domain::codec::{decode_hex, encode_hex, unescape_crlf};
use std::net::SocketAddr;

/// 按码流类型把原始字节渲染为匹配用的字符序列：HEX 为小写十六进制，ASCII 为文本。
pub fn render_payload(bytes: &[u8], stream_type: StreamType) -> Vec<char> {
    match stream_type {
        StreamType::Hex => encode_hex(bytes).chars().collect(),
        StreamType::Ascii => String::from_utf8_lossy(bytes).chars().collect(),
    }
}

/// 把合成后的应答文本编码为字节。
pub fn encode_reply(text: &str, stream_type: StreamType) -> Result<Vec<u8>, ProtocolError> {
    match stream_type {
        StreamType::Ascii => Ok(unescape_crlf(text).into_bytes()),
        StreamType::Hex => {
            let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            decode_hex(&compact).map_err(|err| ProtocolError::Encode(err.to_string()))
        }
    }
}

/// 对端地址展示：`ip:port`，IPv4 映射地址还原为 IPv4。
pub fn peer_address(addr: &SocketAddr) -> String {
    format!("{}:{}", addr.ip().to_canonical(), addr.port())
}
