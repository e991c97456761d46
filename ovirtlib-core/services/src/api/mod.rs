//! oVirt 资源集合
//!
//! - 虚拟机 (`Vms`)，以及虚拟机下的网卡 (`VmNics`)、磁盘挂载 (`VmDisks`)
//! - 主机 (`Hosts`)
//! - 磁盘 (`Disks`)

pub mod vms;
pub mod hosts;
pub mod disks;

pub use vms::{Vms, VmEntity, VmNics, VmNicEntity, VmDisks, VmDiskEntity};
pub use hosts::{Hosts, HostEntity};
pub use disks::{Disks, DiskEntity};
