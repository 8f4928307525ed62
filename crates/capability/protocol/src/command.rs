//! 预编译命令：请求匹配、参数提取、SET 取值与 GET 应答合成

use crate::codec::{encode_reply, render_payload};
use crate::error::ProtocolError;
use crate::matcher::RequestPattern;
use crate::response::{ResponseTemplate, Substitution};
use domain::{CommandTemplate, ParamValues, StoredRecord, StreamType, unique_key};
use std::collections::HashMap;
use std::sync::Arc;

/// 一次成功匹配的结果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    /// 参数键 → 提取值
    pub extracted: HashMap<String, String>,
    pub unique_key: String,
    /// 标签出现在请求模板中但未能取值的参数键
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCommand {
    template: CommandTemplate,
    request: RequestPattern,
    response: ResponseTemplate,
}

impl CompiledCommand {
    pub fn compile(template: CommandTemplate) -> Self {
        let request = RequestPattern::compile(&template.req_stream, template.stream_type);
        let response = ResponseTemplate::compile(&template.res_stream, template.stream_type);
        Self {
            template,
            request,
            response,
        }
    }

    pub fn template(&self) -> &CommandTemplate {
        &self.template
    }

    pub fn stream_type(&self) -> StreamType {
        self.template.stream_type
    }

    pub fn is_match(&self, payload: &[char]) -> bool {
        self.request.is_match(payload)
    }

    /// 提取参数并计算 uniqueKey。
    pub fn extract(&self, payload: &[char]) -> MatchOutcome {
        let extraction = self.request.extract(payload, &self.template.params);
        let mut outcome = MatchOutcome::default();

        for param in &self.template.params {
            if let Some(value) = extraction.values.get(&param.label) {
                outcome.extracted.insert(param.key.clone(), value.clone());
            } else if extraction.skipped.contains(&param.label) {
                outcome.skipped.push(param.key.clone());
            }
        }

        outcome.unique_key = unique_key(
            self.template
                .params
                .iter()
                .filter(|p| p.is_unique)
                .map(|p| {
                    outcome
                        .extracted
                        .get(&p.key)
                        .map(String::as_str)
                        .or_else(|| p.static_value())
                        .unwrap_or("")
                }),
        );
        outcome
    }

    /// SET 写入的参数组：提取值优先，其次静态值。
    pub fn set_values(&self, outcome: &MatchOutcome) -> ParamValues {
        self.template
            .params
            .iter()
            .filter_map(|p| {
                outcome
                    .extracted
                    .get(&p.key)
                    .cloned()
                    .or_else(|| p.static_value().map(str::to_string))
                    .map(|value| (p.key.clone(), value))
            })
            .collect()
    }

    /// GET 应答字节，应答模板为空时返回 `None`。
    pub fn respond(
        &self,
        outcome: &MatchOutcome,
        record: &StoredRecord,
    ) -> Result<Option<Vec<u8>>, ProtocolError> {
        if self.response.is_empty() {
            return Ok(None);
        }
        let text = self.response.synthesize(&Substitution {
            params: &self.template.params,
            extracted: &outcome.extracted,
            unique_key: &outcome.unique_key,
            record,
        })?;
        let bytes = encode_reply(&text, self.response.stream_type())?;
        Ok((!bytes.is_empty()).then_some(bytes))
    }
}

/// 按声明顺序匹配，第一个命中的命令胜出。
///
/// 报文按码流类型惰性渲染，同一类型只渲染一次。
pub fn match_frame(
    commands: &[Arc<CompiledCommand>],
    bytes: &[u8],
) -> Option<(Arc<CompiledCommand>, MatchOutcome)> {
    let mut ascii: Option<Vec<char>> = None;
    let mut hex: Option<Vec<char>> = None;

    for command in commands {
        let stream_type = command.stream_type();
        let rendered = match stream_type {
            StreamType::Ascii => &mut ascii,
            StreamType::Hex => &mut hex,
        };
        let payload = rendered.get_or_insert_with(|| render_payload(bytes, stream_type));
        if command.is_match(payload) {
            let outcome = command.extract(payload);
            return Some((Arc::clone(command), outcome));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{CommandType, DEFAULT_UNIQUE_KEY, ParamSpec};

    #[test]
    fn unique_key_joins_unique_params() {
        let command = CompiledCommand::compile(
            CommandTemplate::new("c1", "d1", CommandType::Set, StreamType::Ascii, "S[$a|1][$b|1]")
                .with_param(ParamSpec::new("a", "[$a|1]", 1).unique())
                .with_param(ParamSpec::new("b", "[$b|1]", 1).unique())
                .with_param(ParamSpec::new("c", "[$c|1]", 1).unique().with_value("z")),
        );
        let payload: Vec<char> = "S12".chars().collect();
        assert!(command.is_match(&payload));
        assert_eq!(command.extract(&payload).unique_key, "1_2_z");
    }

    #[test]
    fn set_values_prefer_extracted() {
        let command = CompiledCommand::compile(
            CommandTemplate::new("c1", "d1", CommandType::Set, StreamType::Ascii, "T[$t|2]")
                .with_param(ParamSpec::new("t", "[$t|2]", 2).with_value("00"))
                .with_param(ParamSpec::new("unit", "[$u|1]", 1).with_value("C"))
                .with_param(ParamSpec::new("none", "[$n|1]", 1)),
        );
        let payload: Vec<char> = "T25".chars().collect();
        let outcome = command.extract(&payload);
        assert_eq!(outcome.unique_key, DEFAULT_UNIQUE_KEY);

        let values = command.set_values(&outcome);
        assert_eq!(values.get("t").map(String::as_str), Some("25"));
        assert_eq!(values.get("unit").map(String::as_str), Some("C"));
        assert!(!values.contains_key("none"));
    }

    #[test]
    fn first_declared_match_wins() {
        let commands = vec![
            Arc::new(CompiledCommand::compile(CommandTemplate::new(
                "wide",
                "d1",
                CommandType::Get,
                StreamType::Hex,
                "01[$x|1]",
            ))),
            Arc::new(CompiledCommand::compile(CommandTemplate::new(
                "exact",
                "d1",
                CommandType::Get,
                StreamType::Hex,
                "0102",
            ))),
        ];
        let (command, _) = match_frame(&commands, &[0x01, 0x02]).expect("match");
        assert_eq!(command.template().id, "wide");
        assert!(match_frame(&commands, &[0x02]).is_none());
    }
}
