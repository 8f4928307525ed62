//! 码流编码辅助：十六进制与 ASCII 转义。

/// 十六进制解码错误。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HexError {
    /// 非十六进制字符（位置，字符）
    #[error("invalid hex char {1:?} at {0}")]
    InvalidChar(usize, char),
    /// 长度为奇数
    #[error("odd hex length {0}")]
    OddLength(usize),
}

/// 小写十六进制编码。
pub fn encode_hex(bytes: &[u8]) -> String {
    const DIGITS: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        out.push(char::from(DIGITS[usize::from(byte >> 4)]));
        out.push(char::from(DIGITS[usize::from(byte & 0x0f)]));
    }
    out
}

/// 十六进制解码（大小写均可）。
pub fn decode_hex(text: &str) -> Result<Vec<u8>, HexError> {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() % 2 != 0 {
        return Err(HexError::OddLength(chars.len()));
    }
    let mut out = Vec::with_capacity(chars.len() / 2);
    for (idx, pair) in chars.chunks(2).enumerate() {
        let hi = nibble(pair[0]).ok_or(HexError::InvalidChar(idx * 2, pair[0]))?;
        let lo = nibble(pair[1]).ok_or(HexError::InvalidChar(idx * 2 + 1, pair[1]))?;
        out.push((hi << 4) | lo);
    }
    Ok(out)
}

fn nibble(ch: char) -> Option<u8> {
    ch.to_digit(16).and_then(|d| u8::try_from(d).ok())
}

/// 将文本中的转义序列 `\r\n` 替换为真实的 CRLF。
pub fn unescape_crlf(text: &str) -> String {
    text.replace("\\r\\n", "\r\n")
}

/// 事件中的码流展示：`<hex> - <文本>`。
pub fn stream_text(bytes: &[u8]) -> String {
    format!("{} - {}", encode_hex(bytes), String::from_utf8_lossy(bytes))
}
