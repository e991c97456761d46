//! ovirtlib 服务封装
//!
//! 在 oVirt SDK 连接之上提供集合/实体包装：查询结果同时携带数据快照和
//! 能够操作该实体的服务句柄，并支持轮询等待平台上的异步状态变化。
//!
//! # 功能
//!
//! - **集合查询** (`CollectionService`): 列表、按 ID 获取、名称投影
//! - **条件等待** (`Wait` / `WaitFor`): 等待列表非空/为空、谓词成立、字段满足 any/all
//! - **链接解析** (`CollectionEntity::follow_link`): 沿关联链接获取其它实体
//! - **虚拟机** (`Vms`): 排除托管引擎、磁盘挂载、网卡、所在主机
//! - **主机** (`Hosts`) 与 **磁盘** (`Disks`)
//!
//! # 示例
//!
//! ```ignore
//! use std::time::Duration;
//! use ovirtlib_services::{CollectionService, ListParams, Vms, Wait, WaitFor, WaitMethod};
//!
//! let vms = Vms::new(connection);
//!
//! // 等待虚拟机出现
//! let params = ListParams::new().search("name=web-01");
//! let found = vms
//!     .get(&params, Some(Wait::new(true).with_timeout(Duration::from_secs(30))))
//!     .await?;
//!
//! // 等待所有磁盘挂载处于激活状态
//! if let Some(vm) = found.and_then(|vms| vms.into_iter().next()) {
//!     let disks = vm.disks()?;
//!     let wait = Wait::new(WaitFor::field_with("active", WaitMethod::All)?);
//!     disks.get(&ListParams::new(), Some(wait)).await?;
//! }
//! ```

pub mod api;
pub mod collection;
pub mod condition;
pub mod connection;
pub mod defaults;
pub mod error;
pub mod mock;
pub mod models;

pub use collection::{CollectionEntity, CollectionService};
pub use condition::{FieldCondition, Predicate, Wait, WaitFor, WaitMethod};
pub use connection::{Backend, Connection, ListParams, Service};
pub use error::{OvirtError, Result};

// 导出资源集合
pub use api::{
    disks::{DiskEntity, Disks},
    hosts::{HostEntity, Hosts},
    vms::{VmDiskEntity, VmDisks, VmEntity, VmNicEntity, VmNics, Vms},
};

// 导出数据模型
pub use models::{
    Disk, DiskAttachment, DiskStatus, Host, HostStatus, Link, Mac, Nic, Ref, Snapshot, Vm,
    VmStatus,
};

pub use ovirtlib_sampler::{SamplerConfig, SamplerError, TimeoutingSampler};
