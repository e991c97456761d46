//! oVirt 资源快照模型
//!
//! 快照只包含查询时刻的数据，不持有服务句柄。
//! 未出现在响应中的可选字段反序列化为 `None`。

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{OvirtError, Result};

/// 资源快照
pub trait Snapshot: Serialize + DeserializeOwned + Clone + Debug + Send + Sync + 'static {
    /// 资源类型名，用于日志和错误信息
    const KIND: &'static str;

    /// 资源 ID
    fn id(&self) -> &str;

    /// 显示名称
    fn name(&self) -> Option<&str>;

    /// 按字段路径读取值，路径以 `.` 分隔，如 `host.id`
    ///
    /// 中间字段为 null 时返回 null；字段不存在时返回 [`OvirtError::UnknownField`]。
    fn lookup(&self, path: &str) -> Result<Value> {
        let root = serde_json::to_value(self)?;
        let mut current = &root;
        for segment in path.split('.') {
            if current.is_null() {
                return Ok(Value::Null);
            }
            current = current.get(segment).ok_or_else(|| OvirtError::UnknownField {
                kind: Self::KIND,
                field: path.to_string(),
            })?;
        }
        Ok(current.clone())
    }

    /// 按字段路径读取布尔值
    ///
    /// null 为 `None`，其它非布尔值按真值规则转换。
    fn flag(&self, path: &str) -> Result<Option<bool>> {
        let value = self.lookup(path)?;
        Ok(match value {
            Value::Null => None,
            value => Some(truthy(&value)),
        })
    }
}

/// JSON 值的真值规则：null、false、0、空字符串、空数组、空对象为假
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// 对其它资源的引用（外键）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ref {
    pub id: String,

    pub href: Option<String>,
}

/// 关联链接
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Self { href: href.into() }
    }
}

// ============================================
// 状态枚举
// ============================================

/// 虚拟机状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmStatus {
    Up,
    Down,
    PoweringUp,
    PoweringDown,
    Paused,
    Suspended,
    WaitForLaunch,
    RebootInProgress,
    MigratingFrom,
    MigratingTo,
    ImageLocked,
    NotResponding,
    #[serde(other)]
    Unknown,
}

/// 主机状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostStatus {
    Up,
    Down,
    Maintenance,
    PreparingForMaintenance,
    Installing,
    InstallFailed,
    Connecting,
    NonOperational,
    NonResponsive,
    #[serde(other)]
    Unknown,
}

/// 磁盘状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiskStatus {
    Ok,
    Locked,
    Illegal,
    #[serde(other)]
    Unknown,
}

// ============================================
// 资源快照
// ============================================

/// 虚拟机
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vm {
    pub id: String,

    pub name: String,

    pub description: Option<String>,

    pub status: Option<VmStatus>,

    /// 运行所在主机
    pub host: Option<Ref>,

    pub cluster: Option<Ref>,

    /// 内存大小（字节）
    pub memory: Option<u64>,

    pub stateless: Option<bool>,

    /// 磁盘挂载链接
    pub disk_attachments: Option<Link>,

    /// 网卡链接
    pub nics: Option<Link>,
}

impl Snapshot for Vm {
    const KIND: &'static str = "vm";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// 主机
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Host {
    pub id: String,

    pub name: String,

    pub address: Option<String>,

    pub status: Option<HostStatus>,

    pub cluster: Option<Ref>,
}

impl Snapshot for Host {
    const KIND: &'static str = "host";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

/// 磁盘
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Disk {
    pub id: String,

    pub name: Option<String>,

    pub alias: Option<String>,

    pub status: Option<DiskStatus>,

    /// 置备大小（字节）
    pub provisioned_size: Option<u64>,

    pub format: Option<String>,

    pub shareable: Option<bool>,
}

impl Snapshot for Disk {
    const KIND: &'static str = "disk";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref().or(self.alias.as_deref())
    }
}

/// 虚拟机磁盘挂载，ID 与被挂载磁盘的 ID 相同
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskAttachment {
    pub id: String,

    pub active: Option<bool>,

    pub bootable: Option<bool>,

    /// 总线类型，如 `virtio_scsi`
    pub interface: Option<String>,

    /// 客户机内的设备名，如 `/dev/vda`
    pub logical_name: Option<String>,

    pub disk: Option<Ref>,

    pub vm: Option<Ref>,
}

impl Snapshot for DiskAttachment {
    const KIND: &'static str = "disk_attachment";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> Option<&str> {
        self.logical_name.as_deref()
    }
}

/// MAC 地址
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mac {
    pub address: String,
}

/// 虚拟机网卡
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nic {
    pub id: String,

    pub name: String,

    pub interface: Option<String>,

    pub plugged: Option<bool>,

    pub linked: Option<bool>,

    pub mac: Option<Mac>,

    pub vm: Option<Ref>,
}

impl Snapshot for Nic {
    const KIND: &'static str = "nic";

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vm() -> Vm {
        serde_json::from_value(json!({
            "id": "vm-1",
            "name": "web-01",
            "status": "powering_up",
            "stateless": true,
            "host": { "id": "host-1" },
        }))
        .unwrap()
    }

    #[test]
    fn test_vm_deserialize() {
        let vm = vm();
        assert_eq!(vm.status, Some(VmStatus::PoweringUp));
        assert_eq!(vm.host.as_ref().map(|h| h.id.as_str()), Some("host-1"));
        assert!(vm.cluster.is_none());
        assert!(vm.disk_attachments.is_none());
    }

    #[test]
    fn test_unknown_status() {
        let disk: Disk = serde_json::from_value(json!({
            "id": "disk-1",
            "status": "migrating",
        }))
        .unwrap();
        assert_eq!(disk.status, Some(DiskStatus::Unknown));
    }

    #[test]
    fn test_lookup() {
        let vm = vm();
        assert_eq!(vm.lookup("name").unwrap(), json!("web-01"));
        assert_eq!(vm.lookup("host.id").unwrap(), json!("host-1"));
        assert_eq!(vm.lookup("cluster.id").unwrap(), Value::Null);
        assert!(matches!(
            vm.lookup("cpu_shares"),
            Err(OvirtError::UnknownField { kind: "vm", .. })
        ));
    }

    #[test]
    fn test_flag() {
        let vm = vm();
        assert_eq!(vm.flag("stateless").unwrap(), Some(true));
        assert_eq!(vm.flag("memory").unwrap(), None);
        assert_eq!(vm.flag("status").unwrap(), Some(true));
    }

    #[test]
    fn test_truthy() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!("")));
        assert!(!truthy(&json!([])));
        assert!(truthy(&json!(1.5)));
        assert!(truthy(&json!({"id": "x"})));
    }
}
