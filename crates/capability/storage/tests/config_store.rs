use devsim_storage::{
    CommandStore, DeviceStore, Fixture, InMemoryCommandStore, InMemoryDeviceStore, load_fixture,
};
use domain::{CommandTemplate, CommandType, DeviceConfig, Protocol, StreamType};

fn command(id: &str, req: &str) -> CommandTemplate {
    CommandTemplate::new(id, "dev-1", CommandType::Get, StreamType::Ascii, req)
}

#[tokio::test]
async fn commands_keep_declaration_order() {
    let store = InMemoryCommandStore::with_commands([command("c1", "A"), command("c2", "B")]);
    store.upsert_command(command("c3", "C")).expect("insert");
    store.upsert_command(command("c1", "A2")).expect("replace");

    let items = store.list_commands("dev-1").await.expect("list");
    let ids: Vec<&str> = items.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c1", "c2", "c3"]);
    assert_eq!(items[0].req_stream, "A2");

    assert!(store.remove_command("dev-1", "c2").expect("remove"));
    assert!(!store.remove_command("dev-2", "c2").expect("remove"));
    assert!(store.list_commands("dev-2").await.expect("list").is_empty());
}

#[tokio::test]
async fn device_store_find_and_remove() {
    let store = InMemoryDeviceStore::new();
    store
        .upsert_device(DeviceConfig::new("dev-1", "meter", Protocol::UdpServer, 0))
        .expect("upsert");

    let device = store.find_device("dev-1").await.expect("find").expect("device");
    assert_eq!(device.protocol, Protocol::UdpServer);
    assert_eq!(store.list_devices().await.expect("list").len(), 1);

    assert!(store.remove_device("dev-1").expect("remove"));
    assert!(store.find_device("dev-1").await.expect("find").is_none());
}

#[tokio::test]
async fn fixture_builds_stores() {
    let json = r#"{
        "devices": [
            { "id": "dev-1", "deviceName": "meter", "protocol": "TCPServer", "devicePort": 15020 }
        ],
        "commands": [
            { "id": "c1", "deviceId": "dev-1", "commandType": "GET", "streamType": "ASCII",
              "reqStream": "READ", "resStream": "OK" }
        ]
    }"#;
    let (devices, commands) = Fixture::from_json(json).expect("fixture").into_stores();
    assert!(devices.find_device("dev-1").await.expect("find").is_some());
    assert_eq!(commands.list_commands("dev-1").await.expect("list").len(), 1);
}

#[test]
fn fixture_rejects_orphan_commands() {
    let json = r#"{
        "devices": [],
        "commands": [
            { "id": "c1", "deviceId": "ghost", "commandType": "GET", "streamType": "ASCII",
              "reqStream": "READ" }
        ]
    }"#;
    let err = Fixture::from_json(json).expect_err("orphan");
    assert!(err.to_string().contains("ghost"));
}

#[test]
fn missing_fixture_names_the_path() {
    let err = load_fixture("fixtures/missing.json").expect_err("missing file");
    assert!(err.to_string().starts_with("read fixtures/missing.json:"));
}
