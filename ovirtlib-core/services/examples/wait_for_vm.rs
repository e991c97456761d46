//! 条件等待示例
//!
//! 使用内存后端模拟平台上异步创建的虚拟机，演示：
//! 1. 等待虚拟机出现
//! 2. 等待其所有磁盘挂载激活
//! 3. 查询所在主机
//!
//! 运行: `RUST_LOG=debug cargo run -p ovirtlib-services --example wait_for_vm`

use std::sync::Arc;
use std::time::Duration;

use ovirtlib_services::mock::MockBackend;
use ovirtlib_services::{
    CollectionService, Connection, ListParams, SamplerConfig, Vms, Wait, WaitFor, WaitMethod,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let backend = Arc::new(MockBackend::new());
    let connection = Connection::from_arc(backend.clone());
    backend.insert("hosts", json!({"id": "host-1", "name": "node-1", "status": "up"}));

    // 模拟平台 2 秒后创建完成
    let creator = Arc::clone(&backend);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(2)).await;
        creator.insert(
            "vms",
            json!({
                "id": "vm-1",
                "name": "web-01",
                "status": "up",
                "host": {"id": "host-1"},
                "disk_attachments": {"href": "/ovirt-engine/api/vms/vm-1/diskattachments"},
            }),
        );
        creator.set_collection(
            "vms/vm-1/diskattachments",
            vec![json!({"id": "disk-1", "active": true, "bootable": true})],
        );
    });

    let config = SamplerConfig::from_env()?;
    let vms = Vms::new(connection);

    // 1. 等待虚拟机出现
    let params = ListParams::new().search("name=web-01");
    let Some(found) = vms.get(&params, Some(Wait::with_config(true, &config))).await? else {
        anyhow::bail!("虚拟机 web-01 未出现");
    };
    let vm = &found[0];
    println!("虚拟机: {} ({:?})", vm.entity().name, vm.entity().status);

    // 2. 等待所有磁盘挂载激活
    let disks = vm.disks()?;
    let wait = Wait::with_config(WaitFor::field_with("active", WaitMethod::All)?, &config);
    match disks.get(&ListParams::new(), Some(wait)).await? {
        Some(attachments) => println!("磁盘挂载已激活: {} 个", attachments.len()),
        None => println!("磁盘挂载未全部激活"),
    }

    // 3. 查询所在主机
    if let Some(host) = vm.get_host().await? {
        println!("所在主机: {}", host.entity().name);
    }

    Ok(())
}
