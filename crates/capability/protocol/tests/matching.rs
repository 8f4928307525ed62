use devsim_protocol::{CompiledCommand, TemplateCache, match_frame, render_payload};
use domain::{CommandTemplate, CommandType, DEFAULT_UNIQUE_KEY, ParamSpec, StoredRecord, StreamType};
use std::collections::HashMap;
use std::sync::Arc;

fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn fixed_length_scales_with_stream_type() {
    let hex = CompiledCommand::compile(
        CommandTemplate::new("h", "d1", CommandType::Get, StreamType::Hex, "0103[$reg|2]")
            .with_param(ParamSpec::new("reg", "[$reg|2]", 2)),
    );
    let payload = render_payload(&[0x01, 0x03, 0x00, 0x0a, 0xff], StreamType::Hex);
    assert!(hex.is_match(&payload));
    let outcome = hex.extract(&payload);
    assert_eq!(outcome.extracted.get("reg").map(String::as_str), Some("000a"));

    let ascii = CompiledCommand::compile(
        CommandTemplate::new("a", "d1", CommandType::Get, StreamType::Ascii, "RD[$reg|2]")
            .with_param(ParamSpec::new("reg", "[$reg|2]", 2)),
    );
    let payload = render_payload(b"RD07x", StreamType::Ascii);
    let outcome = ascii.extract(&payload);
    assert_eq!(outcome.extracted.get("reg").map(String::as_str), Some("07"));
}

#[test]
fn substituted_value_is_extracted_back() {
    let req = "#SET,[$temp|4],END";
    let command = CompiledCommand::compile(
        CommandTemplate::new("c", "d1", CommandType::Set, StreamType::Ascii, req)
            .with_param(ParamSpec::new("temp", "[$temp|4]", 4)),
    );
    let frame = req.replace("[$temp|4]", "21.5");
    let (_, outcome) = match_frame(&[Arc::new(command)], frame.as_bytes()).expect("match");
    assert_eq!(outcome.extracted.get("temp").map(String::as_str), Some("21.5"));
}

#[test]
fn variable_length_stops_at_separator() {
    let command = CompiledCommand::compile(
        CommandTemplate::new("v", "d1", CommandType::Get, StreamType::Hex, "A[$x|?][SE:FF]B")
            .with_param(ParamSpec::new("x", "[$x|?]", 0)),
    );
    let (_, outcome) =
        match_frame(&[Arc::new(command)], &[0xa1, 0x12, 0x2f, 0xfb]).expect("match");
    assert_eq!(outcome.extracted.get("x").map(String::as_str), Some("1122"));
    assert!(outcome.skipped.is_empty());
}

#[test]
fn no_unique_params_uses_default_key() {
    let command = CompiledCommand::compile(
        CommandTemplate::new("c", "d1", CommandType::Set, StreamType::Ascii, "S[$v|1]")
            .with_param(ParamSpec::new("v", "[$v|1]", 1)),
    );
    let payload = render_payload(b"S1", StreamType::Ascii);
    assert_eq!(command.extract(&payload).unique_key, DEFAULT_UNIQUE_KEY);
}

#[test]
fn set_then_get_substitutes_stored_value() {
    let set = CompiledCommand::compile(
        CommandTemplate::new("set", "d1", CommandType::Set, StreamType::Ascii, "SET [$id|2] [$temp|2]")
            .with_store_key("env")
            .with_param(ParamSpec::new("id", "[$id|2]", 2).unique())
            .with_param(ParamSpec::new("temp", "[$temp|2]", 2)),
    );
    let get = CompiledCommand::compile(
        CommandTemplate::new("get", "d1", CommandType::Get, StreamType::Ascii, "GET [$id|2]")
            .with_store_key("env")
            .with_response("TEMP=[$temp|2]\\r\\n")
            .with_param(ParamSpec::new("id", "[$id|2]", 2).unique())
            .with_param(ParamSpec::new("temp", "[$temp|2]", 2).with_value("00")),
    );
    let commands = vec![Arc::new(set), Arc::new(get)];

    let (matched, outcome) = match_frame(&commands, b"SET k1 25").expect("set match");
    assert_eq!(matched.template().id, "set");
    assert_eq!(outcome.unique_key, "k1");
    let mut record = StoredRecord::new();
    record.upsert(outcome.unique_key.clone(), matched.set_values(&outcome));

    let (matched, outcome) = match_frame(&commands, b"GET k1").expect("get match");
    assert_eq!(matched.template().id, "get");
    let reply = matched.respond(&outcome, &record).expect("respond");
    assert_eq!(reply.as_deref(), Some(&b"TEMP=25\r\n"[..]));

    // 未写入过的 uniqueKey 回落到静态值
    let (matched, outcome) = match_frame(&commands, b"GET k2").expect("get match");
    let reply = matched.respond(&outcome, &record).expect("respond");
    assert_eq!(reply.as_deref(), Some(&b"TEMP=00\r\n"[..]));
}

#[test]
fn repeat_block_reads_indexed_entries() {
    let command = CompiledCommand::compile(
        CommandTemplate::new("np", "d1", CommandType::Get, StreamType::Ascii, "LIST")
            .with_response("[NP3][$a|1]")
            .with_param(ParamSpec::new("a", "[$a|1]", 1)),
    );
    let mut record = StoredRecord::new();
    record.upsert("0", values(&[("a", "1")]));
    record.upsert("1", values(&[("a", "2")]));
    record.upsert("2", values(&[("a", "3")]));

    let payload = render_payload(b"LIST", StreamType::Ascii);
    let outcome = command.extract(&payload);
    let reply = command.respond(&outcome, &record).expect("respond");
    assert_eq!(reply.as_deref(), Some(&b"123"[..]));
}

#[test]
fn hex_reply_is_decoded_and_invalid_hex_fails() {
    let command = CompiledCommand::compile(
        CommandTemplate::new("h", "d1", CommandType::Get, StreamType::Hex, "0103")
            .with_response("01 03 02 [$v|2]")
            .with_param(ParamSpec::new("v", "[$v|2]", 2).with_value("0019")),
    );
    let outcome = command.extract(&render_payload(&[0x01, 0x03], StreamType::Hex));
    let reply = command.respond(&outcome, &StoredRecord::new()).expect("respond");
    assert_eq!(reply, Some(vec![0x01, 0x03, 0x02, 0x00, 0x19]));

    let broken = CompiledCommand::compile(
        CommandTemplate::new("b", "d1", CommandType::Get, StreamType::Hex, "0103").with_response("zz"),
    );
    assert!(broken.respond(&outcome, &StoredRecord::new()).is_err());
}

#[test]
fn empty_response_yields_no_reply() {
    let command = CompiledCommand::compile(CommandTemplate::new(
        "g",
        "d1",
        CommandType::Get,
        StreamType::Ascii,
        "PING",
    ));
    let outcome = command.extract(&render_payload(b"PING", StreamType::Ascii));
    assert_eq!(command.respond(&outcome, &StoredRecord::new()).expect("respond"), None);
}

#[test]
fn cache_keeps_declaration_order() {
    let cache = TemplateCache::new();
    let compiled = cache.compile_all(vec![
        CommandTemplate::new("b", "d1", CommandType::Get, StreamType::Ascii, "B"),
        CommandTemplate::new("a", "d1", CommandType::Get, StreamType::Ascii, "A"),
    ]);
    let ids: Vec<&str> = compiled.iter().map(|c| c.template().id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
}
