use domain::{
    CommandTemplate, CommandType, DeviceConfig, DeviceEvent, Protocol, StoredRecord, StreamType,
    unique_key,
};
use serde_json::Value;
use std::collections::HashMap;

#[test]
fn device_config_accepts_document_fields() {
    let payload = r#"{
        "_id": "dev-1",
        "deviceName": "meter",
        "deviceType": "TYPE-A",
        "protocol": "TCPServer",
        "devicePort": 15020
    }"#;
    let device: DeviceConfig = serde_json::from_str(payload).expect("parse");
    assert_eq!(device.id, "dev-1");
    assert_eq!(device.name, "meter");
    assert_eq!(device.protocol, Protocol::TcpServer);
    assert_eq!(device.port, 15020);
}

#[test]
fn protocol_names_round_trip() {
    for name in [
        "TCPServer",
        "UDPServer",
        "TCPClient",
        "UDPClient",
        "Modbus",
        "Telnet",
        "HTTP",
    ] {
        let protocol: Protocol = name.parse().expect("known protocol");
        assert_eq!(protocol.as_str(), name);
    }
    assert!("Serial".parse::<Protocol>().is_err());
}

#[test]
fn command_template_defaults_optional_fields() {
    let payload = r#"{
        "id": "cmd-1",
        "deviceId": "dev-1",
        "commandType": "SET",
        "streamType": "HEX",
        "reqStream": "0106[$v|2]",
        "params": [
            { "paramKey": "v", "paramLabel": "[$v|2]", "paramLength": 2, "isUnique": true }
        ]
    }"#;
    let command: CommandTemplate = serde_json::from_str(payload).expect("parse");
    assert_eq!(command.command_type, CommandType::Set);
    assert_eq!(command.stream_type, StreamType::Hex);
    assert_eq!(command.res_stream, "");
    assert_eq!(command.store_key, "");
    assert!(command.params[0].is_unique);
    assert!(command.params[0].static_value().is_none());
}

#[test]
fn unique_key_defaults_to_data() {
    assert_eq!(unique_key(Vec::<&str>::new()), "_data");
    assert_eq!(unique_key(["01", "a"]), "01_a");
}

#[test]
fn stored_record_indexed_lookup_tries_hex() {
    let mut record = StoredRecord::new();
    record.upsert("0", HashMap::from([("a".to_string(), "x".to_string())]));
    record.upsert("0b", HashMap::from([("a".to_string(), "y".to_string())]));

    assert_eq!(record.indexed(0).and_then(|v| v.get("a")).map(String::as_str), Some("x"));
    assert_eq!(record.indexed(11).and_then(|v| v.get("a")).map(String::as_str), Some("y"));
    assert!(record.indexed(1).is_none());
}

#[test]
fn device_event_is_camel_case() {
    let event = DeviceEvent::receive("dev-1", "127.0.0.1:5000", "4142 - AB");
    let value = serde_json::to_value(event).expect("serialize");
    assert_eq!(value.get("event"), Some(&Value::from("device:receive")));
    assert!(value.get("deviceId").is_some());
    assert!(value.get("timestampMs").is_some());

    let connect = serde_json::to_value(DeviceEvent::connect("dev-1", "127.0.0.1:5000"))
        .expect("serialize");
    assert!(connect.get("stream").is_none());
}
