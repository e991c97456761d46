//! 虚拟机集合
//!
//! 除通用的集合操作外，提供：
//! - 排除托管引擎虚拟机的查询
//! - 虚拟机到磁盘挂载、网卡、所在主机的导航

use tracing::{debug, info};

use crate::api::hosts::{HostEntity, Hosts};
use crate::collection::{CollectionEntity, CollectionService};
use crate::connection::{Connection, ListParams, Service};
use crate::defaults::HOSTED_ENGINE_VM_NAME;
use crate::error::Result;
use crate::models::{DiskAttachment, Nic, Snapshot, Vm};

/// 虚拟机实体
pub type VmEntity = CollectionEntity<Vm>;

/// 虚拟机网卡实体
pub type VmNicEntity = CollectionEntity<Nic>;

/// 虚拟机磁盘挂载实体
pub type VmDiskEntity = CollectionEntity<DiskAttachment>;

/// 虚拟机集合
#[derive(Debug, Clone)]
pub struct Vms {
    connection: Connection,
}

impl Vms {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    /// 除托管引擎外的所有虚拟机
    ///
    /// `he_name` 为 `None` 时使用 [`HOSTED_ENGINE_VM_NAME`]。
    pub async fn get_vms(&self, he_name: Option<&str>) -> Result<Vec<VmEntity>> {
        let he_name = he_name.unwrap_or(HOSTED_ENGINE_VM_NAME);
        let mut vms = self
            .list(&ListParams::new().search(format!("name!={}", he_name)))
            .await?;
        vms.retain(|vm| vm.entity().name != he_name);
        Ok(vms)
    }

    /// 托管引擎虚拟机
    pub async fn get_hosted_engine_vm(&self, he_name: Option<&str>) -> Result<Option<VmEntity>> {
        let he_name = he_name.unwrap_or(HOSTED_ENGINE_VM_NAME);
        let vms = self
            .list(&ListParams::new().search(format!("name={}", he_name)))
            .await?;
        Ok(vms.into_iter().next())
    }

    /// 托管引擎虚拟机所在的主机
    pub async fn get_hosted_engine_host(&self, he_name: Option<&str>) -> Result<Option<HostEntity>> {
        match self.get_hosted_engine_vm(he_name).await? {
            Some(vm) => vm.get_host().await,
            None => {
                debug!("未找到托管引擎虚拟机");
                Ok(None)
            }
        }
    }
}

impl CollectionService for Vms {
    type Entity = Vm;

    fn connection(&self) -> &Connection {
        &self.connection
    }

    fn service(&self) -> Service {
        self.connection.system_service().vms_service()
    }

    fn entity_service(&self, id: &str) -> Service {
        self.service().vm_service(id)
    }
}

impl CollectionEntity<Vm> {
    /// 虚拟机的磁盘挂载
    ///
    /// 沿 `disk_attachments` 链接解析，每个挂载绑定到本虚拟机的挂载服务。
    /// 挂载服务由虚拟机 ID 推导，只有数据的虚拟机实体同样可用。
    /// 快照中没有该链接时返回空列表。
    pub async fn get_disk_attachments(&self) -> Result<Vec<VmDiskEntity>> {
        let Some(link) = self.entity().disk_attachments.clone() else {
            debug!("虚拟机 {} 没有磁盘挂载链接", self.entity().name);
            return Ok(Vec::new());
        };
        let vm_service = Vms::new(self.connection().clone()).entity_service(self.id());
        self.follow_link_in(&link, &VmDisks::new(vm_service)).await
    }

    /// 虚拟机所在的主机，未运行的虚拟机返回 `None`
    pub async fn get_host(&self) -> Result<Option<HostEntity>> {
        let Some(host) = self.entity().host.as_ref() else {
            return Ok(None);
        };
        info!("查询虚拟机 {} 所在主机: {}", self.entity().name, host.id);
        Hosts::new(self.connection().clone())
            .get_entity_by_id(&host.id)
            .await
            .map(Some)
    }

    /// 虚拟机网卡集合
    pub fn nics(&self) -> Result<VmNics> {
        Ok(VmNics::new(self.bound_service()?.clone()))
    }

    /// 虚拟机磁盘挂载集合
    pub fn disks(&self) -> Result<VmDisks> {
        Ok(VmDisks::new(self.bound_service()?.clone()))
    }
}

/// 虚拟机网卡集合
#[derive(Debug, Clone)]
pub struct VmNics {
    vm_service: Service,
}

impl VmNics {
    pub fn new(vm_service: Service) -> Self {
        Self { vm_service }
    }
}

impl CollectionService for VmNics {
    type Entity = Nic;

    fn connection(&self) -> &Connection {
        self.vm_service.connection()
    }

    fn service(&self) -> Service {
        self.vm_service.nics_service()
    }

    fn entity_service(&self, id: &str) -> Service {
        self.service().nic_service(id)
    }
}

/// 虚拟机磁盘挂载集合
#[derive(Debug, Clone)]
pub struct VmDisks {
    vm_service: Service,
}

impl VmDisks {
    pub fn new(vm_service: Service) -> Self {
        Self { vm_service }
    }
}

impl CollectionService for VmDisks {
    type Entity = DiskAttachment;

    fn connection(&self) -> &Connection {
        self.vm_service.connection()
    }

    fn service(&self) -> Service {
        self.vm_service.disk_attachments_service()
    }

    fn entity_service(&self, id: &str) -> Service {
        self.service().attachment_service(id)
    }
}

impl CollectionEntity<DiskAttachment> {
    /// 挂载对应的磁盘 ID
    pub fn disk_id(&self) -> &str {
        self.entity()
            .disk
            .as_ref()
            .map(|disk| disk.id.as_str())
            .unwrap_or_else(|| self.entity().id())
    }
}
