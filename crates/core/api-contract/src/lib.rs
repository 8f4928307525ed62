//! 稳定的请求契约：设备码流下发。

use domain::StreamType;
use domain::codec::{decode_hex, unescape_crlf};
use serde::{Deserialize, Serialize};

/// 下发载荷校验错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("payload is empty")]
    Empty,
    #[error("payload is not a hex string")]
    NotHex,
    #[error("hex payload has odd length {0}")]
    OddLength(usize),
}

/// 设备下发请求体。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    pub payload: String,
    #[serde(rename = "type")]
    pub payload_type: StreamType,
}

impl SendRequest {
    pub fn ascii(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            payload_type: StreamType::Ascii,
        }
    }

    pub fn hex(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            payload_type: StreamType::Hex,
        }
    }

    /// 校验并转换为待发送字节。
    ///
    /// HEX 载荷必须满足 `^[0-9a-fA-F]+$` 且长度为偶数；ASCII 载荷中的 `\r\n` 转义为 CRLF。
    pub fn to_bytes(&self) -> Result<Vec<u8>, PayloadError> {
        match self.payload_type {
            StreamType::Ascii => Ok(unescape_crlf(&self.payload).into_bytes()),
            StreamType::Hex => {
                if self.payload.is_empty() {
                    return Err(PayloadError::Empty);
                }
                if !self.payload.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(PayloadError::NotHex);
                }
                decode_hex(&self.payload).map_err(|_| PayloadError::OddLength(self.payload.len()))
            }
        }
    }
}
