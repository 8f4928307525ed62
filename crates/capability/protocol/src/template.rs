//! 码流模板词法分析
//!
//! 模板在使用前切分为有序的 {字面量, 标记} 序列：
//!
//! - `[$name|len]`：参数标签，请求与应答模板均识别
//! - `[SE:literal]`：变长标签的分隔符，仅请求模板识别
//! - `[NP<n>]` / `[NP|<n>]`：应答循环块，仅应答模板识别
//!
//! 未闭合或不认识的 `[` 按字面量处理。

/// 标签声明的长度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelLength {
    /// 定长（字节）
    Fixed(usize),
    /// 变长，由其后的 `[SE:..]` 分隔符界定
    Variable,
    /// 标签未声明长度，使用参数定义中的长度
    Unspecified,
}

/// 参数标签。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// 原始标签文本，用于与参数定义关联
    pub raw: String,
    pub name: String,
    pub length: LabelLength,
}

impl Label {
    fn parse(raw: &str) -> Self {
        let inner = raw
            .strip_prefix("[$")
            .and_then(|s| s.strip_suffix(']'))
            .unwrap_or_default();
        let mut parts = inner.split('|');
        let name = parts.next().unwrap_or_default().to_string();
        let length = match parts.next().map(str::trim) {
            Some("?") => LabelLength::Variable,
            Some(len) => len
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .map_or(LabelLength::Unspecified, LabelLength::Fixed),
            None => LabelLength::Unspecified,
        };
        Self {
            raw: raw.to_string(),
            name,
            length,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Literal(String),
    Label(Label),
    Separator(String),
    Repeat { raw: String, count: Option<usize> },
}

/// 模板用途，决定识别哪些标记。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Request,
    Response,
}

#[derive(Clone, Copy)]
enum Marker {
    Label,
    Separator,
    Repeat,
}

fn marker_at(tail: &str, dialect: Dialect) -> Option<Marker> {
    if tail.starts_with("[$") {
        return Some(Marker::Label);
    }
    match dialect {
        Dialect::Request if tail.starts_with("[SE:") => Some(Marker::Separator),
        Dialect::Response if tail.starts_with("[NP") => Some(Marker::Repeat),
        _ => None,
    }
}

fn parse_repeat_count(raw: &str) -> Option<usize> {
    raw.strip_prefix("[NP")
        .and_then(|s| s.strip_suffix(']'))
        .map(|s| s.strip_prefix('|').unwrap_or(s))
        .and_then(|s| s.trim().parse::<usize>().ok())
        .filter(|n| *n > 0)
}

/// 切分模板。
pub fn tokenize(text: &str, dialect: Dialect) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut rest = text;

    while let Some(open) = rest.find('[') {
        let (before, tail) = rest.split_at(open);
        literal.push_str(before);
        match (marker_at(tail, dialect), tail.find(']')) {
            (Some(marker), Some(close)) => {
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                let raw = &tail[..=close];
                tokens.push(match marker {
                    Marker::Label => Token::Label(Label::parse(raw)),
                    Marker::Separator => Token::Separator(raw[4..raw.len() - 1].to_string()),
                    Marker::Repeat => Token::Repeat {
                        raw: raw.to_string(),
                        count: parse_repeat_count(raw),
                    },
                });
                rest = &tail[close + 1..];
            }
            _ => {
                literal.push('[');
                rest = &tail[1..];
            }
        }
    }
    literal.push_str(rest);
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}
