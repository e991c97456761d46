//! 磁盘集合

use crate::collection::{CollectionEntity, CollectionService};
use crate::connection::{Connection, Service};
use crate::models::Disk;

/// 磁盘实体
pub type DiskEntity = CollectionEntity<Disk>;

/// 磁盘集合
#[derive(Debug, Clone)]
pub struct Disks {
    connection: Connection,
}

impl Disks {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }
}

impl CollectionService for Disks {
    type Entity = Disk;

    fn connection(&self) -> &Connection {
        &self.connection
    }

    fn service(&self) -> Service {
        self.connection.system_service().disks_service()
    }

    fn entity_service(&self, id: &str) -> Service {
        self.service().disk_service(id)
    }
}
