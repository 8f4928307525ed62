use devsim_config::{ConfigError, SimConfig};

// 环境变量为进程级共享状态，相关断言放在同一个测试内顺序执行。
#[test]
fn load_config_from_env() {
    // Rust 2024 中 set_var 需要显式标注 unsafe（测试进程内可控）。
    unsafe {
        std::env::set_var("DEVSIM_FIXTURE_PATH", "fixtures/devices.json");
        std::env::set_var("DEVSIM_BIND_HOST", "127.0.0.1");
        std::env::set_var("DEVSIM_DEFAULT_PORT", "1502");
        std::env::set_var("DEVSIM_AUTOSTART", "off");
    }

    let config = SimConfig::from_env().expect("config");
    assert_eq!(config.require_fixture_path().expect("path"), "fixtures/devices.json");
    assert_eq!(config.bind_host, "127.0.0.1");
    assert_eq!(config.default_port, 1502);
    assert_eq!(config.read_buffer_bytes, 4096);
    assert!(!config.autostart);

    unsafe {
        std::env::set_var("DEVSIM_DEFAULT_PORT", "70000");
    }
    let err = SimConfig::from_env().expect_err("port out of range");
    assert!(matches!(err, ConfigError::Invalid(key, _) if key == "DEVSIM_DEFAULT_PORT"));

    unsafe {
        std::env::remove_var("DEVSIM_DEFAULT_PORT");
        std::env::remove_var("DEVSIM_FIXTURE_PATH");
    }
    let config = SimConfig::from_env().expect("config");
    assert!(config.require_fixture_path().is_err());
}
