//! 主机集合

use tracing::info;

use crate::api::vms::{VmEntity, Vms};
use crate::collection::{CollectionEntity, CollectionService};
use crate::connection::{Connection, ListParams, Service};
use crate::error::Result;
use crate::models::Host;

/// 主机实体
pub type HostEntity = CollectionEntity<Host>;

/// 主机集合
#[derive(Debug, Clone)]
pub struct Hosts {
    connection: Connection,
}

impl Hosts {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

impl CollectionService for Hosts {
    type Entity = Host;

    fn connection(&self) -> &Connection {
        &self.connection
    }

    fn service(&self) -> Service {
        self.connection.system_service().hosts_service()
    }

    fn entity_service(&self, id: &str) -> Service {
        self.service().host_service(id)
    }
}

impl CollectionEntity<Host> {
    /// 运行在该主机上的虚拟机
    pub async fn get_vms(&self) -> Result<Vec<VmEntity>> {
        info!("查询主机 {} 上的虚拟机", self.entity().name);
        Vms::new(self.connection().clone())
            .list(&ListParams::new().search(format!("host={}", self.entity().name)))
            .await
    }
}
