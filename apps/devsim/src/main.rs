//! 设备协议仿真器进程：加载夹具、拉起设备实例、输出设备事件。

use devsim_config::SimConfig;
use devsim_engine::{ChannelNotifier, Engine, EngineOptions};
use devsim_storage::{DeviceStore, load_fixture};
use devsim_telemetry::{init_tracing, metrics};
use domain::DeviceEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 加载本地 .env（如存在），便于直接 cargo run 启动
    dotenvy::dotenv().ok();
    // 从环境变量加载运行配置
    let config = SimConfig::from_env()?;
    // 初始化结构化日志
    init_tracing();

    // 设备与命令模板来自 JSON 夹具
    let fixture_path = config.require_fixture_path()?;
    let (devices, commands) = load_fixture(fixture_path)?.into_stores();
    let devices = Arc::new(devices);
    info!(fixture = fixture_path, "fixture loaded");

    let (notifier, events) = ChannelNotifier::channel(config.event_channel_capacity);
    let engine = Engine::new(
        engine_options(&config),
        devices.clone(),
        Arc::new(commands),
        Arc::new(notifier),
    );
    let printer = tokio::spawn(print_events(events));

    if config.autostart {
        for device in devices.list_devices().await? {
            match engine.start(&device.id).await {
                Ok(report) => info!(
                    device_id = %report.device_id,
                    protocol = %report.protocol,
                    port = report.port,
                    instance_id = %report.instance_id,
                    "device ready"
                ),
                Err(err) => warn!(
                    device_id = %device.id,
                    code = err.code(),
                    error = %err,
                    "device start failed"
                ),
            }
        }
    }

    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    engine.shutdown().await;
    drop(engine);
    printer.abort();
    info!(metrics = ?metrics().snapshot(), "devsim stopped");
    Ok(())
}

fn engine_options(config: &SimConfig) -> EngineOptions {
    EngineOptions {
        bind_host: config.bind_host.clone(),
        default_port: config.default_port,
        read_buffer_bytes: config.read_buffer_bytes,
    }
}

/// 每个事件输出一行 JSON
async fn print_events(mut events: mpsc::Receiver<DeviceEvent>) {
    while let Some(event) = events.recv().await {
        match serde_json::to_string(&event) {
            Ok(line) => info!(target: "devsim.events", "{line}"),
            Err(err) => warn!(error = %err, "event encode failed"),
        }
    }
}
