//! 请求码流匹配与参数提取
//!
//! 匹配：标签与分隔符视为"至少一个任意字符"的通配，字面量精确比较，首尾锚定。
//! 提取：沿模板标记顺序在渲染后的报文上单次游走，按标签长度切片取值。
//! 某个标签无法定位时只跳过该参数，游走在下一个字面量处重新同步。

use crate::template::{Dialect, Label, LabelLength, Token, tokenize};
use domain::{ParamSpec, StreamType};
use std::collections::HashMap;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
enum ReqToken {
    Literal(Vec<char>),
    Label(Label),
    Separator(Vec<char>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pat {
    Char(char),
    Any,
    Star,
}

/// 预编译的请求模板。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPattern {
    stream_type: StreamType,
    tokens: Vec<ReqToken>,
    glob: Vec<Pat>,
}

/// 单次提取结果（按标签原文索引）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    pub values: HashMap<String, String>,
    /// 出现在模板中但未能取值的标签
    pub skipped: Vec<String>,
}

fn normalize(text: &str, stream_type: StreamType) -> Vec<char> {
    match stream_type {
        StreamType::Ascii => text.chars().collect(),
        StreamType::Hex => text
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_lowercase())
            .collect(),
    }
}

impl RequestPattern {
    pub fn compile(req_stream: &str, stream_type: StreamType) -> Self {
        let tokens: Vec<ReqToken> = tokenize(req_stream, Dialect::Request)
            .into_iter()
            .filter_map(|token| match token {
                Token::Literal(text) => Some(ReqToken::Literal(normalize(&text, stream_type))),
                Token::Label(label) => Some(ReqToken::Label(label)),
                Token::Separator(text) => Some(ReqToken::Separator(normalize(&text, stream_type))),
                Token::Repeat { .. } => None,
            })
            .collect();

        let mut glob = Vec::new();
        for token in &tokens {
            match token {
                ReqToken::Literal(chars) => glob.extend(chars.iter().map(|c| Pat::Char(*c))),
                ReqToken::Label(_) | ReqToken::Separator(_) => {
                    glob.push(Pat::Any);
                    glob.push(Pat::Star);
                }
            }
        }

        Self {
            stream_type,
            tokens,
            glob,
        }
    }

    pub fn stream_type(&self) -> StreamType {
        self.stream_type
    }

    /// 整串锚定匹配。
    pub fn is_match(&self, payload: &[char]) -> bool {
        glob_match(&self.glob, payload)
    }

    /// 沿标记顺序提取标签值。
    pub fn extract(&self, payload: &[char], params: &[ParamSpec]) -> Extraction {
        let per_byte = self.stream_type.chars_per_byte();
        let mut extraction = Extraction::default();
        let mut cursor = Some(0usize);
        let mut floor = 0usize;

        for (idx, token) in self.tokens.iter().enumerate() {
            match token {
                ReqToken::Literal(lit) => {
                    cursor = match cursor {
                        Some(pos) => Some((pos + lit.len()).min(payload.len())),
                        None => find(payload, lit, floor, 1).map(|pos| pos + lit.len()),
                    };
                }
                ReqToken::Separator(sep) => {
                    cursor = match cursor {
                        Some(pos) if payload[pos..].starts_with(sep) => Some(pos + sep.len()),
                        Some(pos) => find(payload, sep, pos, 1).map(|at| at + sep.len()),
                        None => find(payload, sep, floor, 1).map(|at| at + sep.len()),
                    };
                }
                ReqToken::Label(label) => {
                    let Some(start) = cursor else {
                        warn!(
                            target: "devsim.protocol",
                            label = %label.raw,
                            "label position unknown, parameter skipped"
                        );
                        extraction.skipped.push(label.raw.clone());
                        continue;
                    };
                    floor = start;
                    match self.label_span(idx, label, start, payload, params, per_byte) {
                        Some(chars) => {
                            let end = start.saturating_add(chars).min(payload.len());
                            extraction
                                .values
                                .insert(label.raw.clone(), payload[start..end].iter().collect());
                            cursor = Some(end);
                        }
                        None => {
                            extraction.skipped.push(label.raw.clone());
                            cursor = None;
                        }
                    }
                }
            }
        }
        extraction
    }

    /// 标签值在渲染文本中占用的字符数。
    fn label_span(
        &self,
        idx: usize,
        label: &Label,
        start: usize,
        payload: &[char],
        params: &[ParamSpec],
        per_byte: usize,
    ) -> Option<usize> {
        let bytes = match label.length {
            LabelLength::Fixed(n) => n,
            LabelLength::Unspecified => {
                let declared = params
                    .iter()
                    .find(|p| p.label == label.raw)
                    .map(|p| p.length)
                    .filter(|n| *n > 0);
                if declared.is_none() {
                    warn!(
                        target: "devsim.protocol",
                        label = %label.raw,
                        "label has no length, parameter skipped"
                    );
                }
                declared?
            }
            LabelLength::Variable => {
                let Some(sep) = self.tokens[idx + 1..].iter().find_map(|t| match t {
                    ReqToken::Separator(sep) => Some(sep),
                    _ => None,
                }) else {
                    warn!(
                        target: "devsim.protocol",
                        label = %label.raw,
                        "no SE marker after variable label, parameter skipped"
                    );
                    return None;
                };
                let Some(at) = find(payload, sep, start, per_byte) else {
                    let separator: String = sep.iter().collect();
                    warn!(
                        target: "devsim.protocol",
                        label = %label.raw,
                        separator = %separator,
                        "separator not found in payload, parameter skipped"
                    );
                    return None;
                };
                (at - start) / per_byte
            }
        };
        let chars = bytes.checked_mul(per_byte);
        if chars.is_none() {
            warn!(
                target: "devsim.protocol",
                label = %label.raw,
                length = bytes,
                "label length overflows, parameter skipped"
            );
        }
        chars
    }
}

/// 在 `from` 之后按 `step` 对齐查找子序列。
fn find(haystack: &[char], needle: &[char], from: usize, step: usize) -> Option<usize> {
    if needle.is_empty() {
        return (from <= haystack.len()).then_some(from);
    }
    let last = haystack.len().checked_sub(needle.len())?;
    (from..=last)
        .step_by(step.max(1))
        .find(|&pos| haystack[pos..pos + needle.len()] == *needle)
}

/// 通配匹配：`Any` 匹配单个字符，`Star` 匹配任意长度（含零）。
fn glob_match(pattern: &[Pat], text: &[char]) -> bool {
    let (mut p, mut t) = (0usize, 0usize);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match pattern.get(p) {
            Some(Pat::Char(c)) if *c == text[t] => {
                p += 1;
                t += 1;
            }
            Some(Pat::Any) => {
                p += 1;
                t += 1;
            }
            Some(Pat::Star) => {
                backtrack = Some((p + 1, t));
                p += 1;
            }
            _ => match backtrack {
                Some((star_p, star_t)) => {
                    p = star_p;
                    t = star_t + 1;
                    backtrack = Some((star_p, star_t + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|pat| *pat == Pat::Star)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    #[test]
    fn wildcard_needs_at_least_one_char() {
        let pattern = RequestPattern::compile("AB[$x|1]CD", StreamType::Ascii);
        assert!(pattern.is_match(&chars("ABzCD")));
        assert!(pattern.is_match(&chars("ABzzzCD")));
        assert!(!pattern.is_match(&chars("ABCD")));
        assert!(!pattern.is_match(&chars("ABzCDx")));
    }

    #[test]
    fn literal_regex_chars_are_plain() {
        let pattern = RequestPattern::compile("A.B*[$x|1]", StreamType::Ascii);
        assert!(pattern.is_match(&chars("A.B*1")));
        assert!(!pattern.is_match(&chars("AxBB1")));
    }

    #[test]
    fn hex_template_is_normalized() {
        let pattern = RequestPattern::compile("01 03 [$r|2]", StreamType::Hex);
        assert!(pattern.is_match(&chars("0103000a")));
    }

    #[test]
    fn unspecified_length_uses_declared_length() {
        let pattern = RequestPattern::compile("T[$t]!", StreamType::Ascii);
        let params = vec![ParamSpec::new("t", "[$t]", 3)];
        let extraction = pattern.extract(&chars("T123!"), &params);
        assert_eq!(extraction.values.get("[$t]").map(String::as_str), Some("123"));
    }

    #[test]
    fn resyncs_after_missing_separator() {
        let pattern = RequestPattern::compile("A[$x|?][SE:;]B[$y|2]", StreamType::Ascii);
        let extraction = pattern.extract(&chars("A12B34"), &[]);
        assert_eq!(extraction.skipped, vec!["[$x|?]".to_string()]);
        assert_eq!(extraction.values.get("[$y|2]").map(String::as_str), Some("34"));
    }

    #[test]
    fn hex_separator_search_is_byte_aligned() {
        // "1ff0" 中奇数偏移处的 "ff" 不能当作分隔符
        let pattern = RequestPattern::compile("aa[$x|?][SE:ff]", StreamType::Hex);
        let extraction = pattern.extract(&chars("aa1ff0ff"), &[]);
        assert_eq!(extraction.values.get("[$x|?]").map(String::as_str), Some("1ff0"));
    }

    #[test]
    fn oversized_label_length_is_skipped() {
        // 按字节换算成字符数时溢出
        let pattern = RequestPattern::compile("aa[$x|9223372036854775808]bb[$y|1]", StreamType::Hex);
        assert!(pattern.is_match(&chars("aa01bb07")));
        let extraction = pattern.extract(&chars("aa01bb07"), &[]);
        assert_eq!(extraction.skipped, vec!["[$x|9223372036854775808]".to_string()]);
        assert_eq!(extraction.values.get("[$y|1]").map(String::as_str), Some("07"));
    }
}
