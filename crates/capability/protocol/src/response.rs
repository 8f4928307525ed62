//! 应答码流合成（仅 GET）
//!
//! 无循环块时逐个替换标签；带 `[NP<n>]` 时拆成前缀、循环体、后缀三段，
//! 循环体第 i 次迭代从记录的第 i 组参数取值，前缀/后缀按 uniqueKey 取值。

use crate::error::ProtocolError;
use crate::template::{Dialect, Token, tokenize};
use domain::{ParamSpec, ParamValues, StoredRecord, StreamType};
use std::collections::HashMap;
use tracing::warn;

/// 预编译的应答模板。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseTemplate {
    stream_type: StreamType,
    tokens: Vec<Token>,
}

/// 标签取值的上下文。
pub struct Substitution<'a> {
    pub params: &'a [ParamSpec],
    /// 本次请求提取到的值（参数键 → 值）
    pub extracted: &'a HashMap<String, String>,
    pub unique_key: &'a str,
    pub record: &'a StoredRecord,
}

impl<'a> Substitution<'a> {
    /// 取值顺序：状态记录 → 本次请求提取值 → 静态值 → 空串。空串视为缺失。
    fn resolve(&self, raw: &str, scope: Option<&ParamValues>) -> String {
        let Some(param) = self.params.iter().find(|p| p.label == raw) else {
            warn!(
                target: "devsim.protocol",
                label = raw,
                "response label has no parameter, left verbatim"
            );
            return raw.to_string();
        };
        let non_empty = |value: Option<&String>| value.filter(|v| !v.is_empty()).cloned();
        non_empty(scope.and_then(|values| values.get(&param.key)))
            .or_else(|| non_empty(self.extracted.get(&param.key)))
            .or_else(|| param.static_value().map(str::to_string))
            .unwrap_or_default()
    }

    fn render(&self, tokens: &[Token], scope: Option<&ParamValues>, out: &mut String) {
        for token in tokens {
            match token {
                Token::Literal(text) | Token::Separator(text) => out.push_str(text),
                Token::Label(label) => out.push_str(&self.resolve(&label.raw, scope)),
                Token::Repeat { raw, .. } => out.push_str(raw),
            }
        }
    }
}

impl ResponseTemplate {
    pub fn compile(res_stream: &str, stream_type: StreamType) -> Self {
        Self {
            stream_type,
            tokens: tokenize(res_stream, Dialect::Response),
        }
    }

    pub fn stream_type(&self) -> StreamType {
        self.stream_type
    }

    /// 空模板不产生应答。
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn synthesize(&self, ctx: &Substitution<'_>) -> Result<String, ProtocolError> {
        let keyed = ctx.record.entry(ctx.unique_key);
        let mut out = String::new();

        let Some(marker) = self
            .tokens
            .iter()
            .position(|t| matches!(t, Token::Repeat { .. }))
        else {
            ctx.render(&self.tokens, keyed, &mut out);
            return Ok(out);
        };

        let count = match &self.tokens[marker] {
            Token::Repeat {
                count: Some(n), ..
            } => *n,
            Token::Repeat { raw, .. } => {
                return Err(ProtocolError::Template(format!(
                    "repeat marker {raw} needs a positive count"
                )));
            }
            _ => 0,
        };

        let body_end = self
            .tokens
            .iter()
            .rposition(|t| matches!(t, Token::Label(_)))
            .filter(|last| *last > marker)
            .map_or(marker + 1, |last| last + 1);
        let (prefix, rest) = self.tokens.split_at(marker);
        let (body, suffix) = rest[1..].split_at(body_end - marker - 1);

        ctx.render(prefix, keyed, &mut out);
        for index in 0..count {
            ctx.render(body, ctx.record.indexed(index), &mut out);
        }
        ctx.render(suffix, keyed, &mut out);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::DEFAULT_UNIQUE_KEY;

    fn values(pairs: &[(&str, &str)]) -> ParamValues {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn repeat_block_wraps_prefix_and_suffix() {
        let template = ResponseTemplate::compile("<[$n|1]>[NP|2],[$a|1];", StreamType::Ascii);
        let params = vec![
            ParamSpec::new("n", "[$n|1]", 1).with_value("9"),
            ParamSpec::new("a", "[$a|1]", 1),
        ];
        let mut record = StoredRecord::new();
        record.upsert("0", values(&[("a", "x")]));
        record.upsert("01", values(&[("a", "y")]));
        let extracted = HashMap::new();
        let ctx = Substitution {
            params: &params,
            extracted: &extracted,
            unique_key: DEFAULT_UNIQUE_KEY,
            record: &record,
        };
        assert_eq!(template.synthesize(&ctx).unwrap(), "<9>,x,y;");
    }

    #[test]
    fn repeat_without_count_is_rejected() {
        let template = ResponseTemplate::compile("[NP][$a|1]", StreamType::Ascii);
        let record = StoredRecord::new();
        let extracted = HashMap::new();
        let ctx = Substitution {
            params: &[],
            extracted: &extracted,
            unique_key: DEFAULT_UNIQUE_KEY,
            record: &record,
        };
        assert!(matches!(
            template.synthesize(&ctx),
            Err(ProtocolError::Template(_))
        ));
    }

    #[test]
    fn unknown_label_is_kept() {
        let template = ResponseTemplate::compile("V=[$v|2]", StreamType::Ascii);
        let record = StoredRecord::new();
        let extracted = HashMap::new();
        let ctx = Substitution {
            params: &[],
            extracted: &extracted,
            unique_key: DEFAULT_UNIQUE_KEY,
            record: &record,
        };
        assert_eq!(template.synthesize(&ctx).unwrap(), "V=[$v|2]");
    }

    #[test]
    fn empty_stored_value_falls_back() {
        let template = ResponseTemplate::compile("[$v|2]", StreamType::Ascii);
        let params = vec![ParamSpec::new("v", "[$v|2]", 2).with_value("00")];
        let mut record = StoredRecord::new();
        record.upsert(DEFAULT_UNIQUE_KEY, values(&[("v", "")]));
        let extracted = HashMap::new();
        let ctx = Substitution {
            params: &params,
            extracted: &extracted,
            unique_key: DEFAULT_UNIQUE_KEY,
            record: &record,
        };
        assert_eq!(template.synthesize(&ctx).unwrap(), "00");
    }
}
