//! SDK 连接与服务句柄
//!
//! [`Backend`] 是外部 SDK 连接的边界：认证、会话和传输协议都由实现方负责，
//! 本库只使用 `list` / `get` / `follow_link` 三个操作。
//! [`Service`] 是指向某个集合或单个实体的服务句柄，按路径逐级派生。

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::models::Link;

/// SDK 连接后端
#[async_trait]
pub trait Backend: Send + Sync {
    /// 列出集合中的资源
    async fn list(&self, path: &str, params: &ListParams) -> Result<Vec<Value>>;

    /// 获取单个资源
    async fn get(&self, path: &str) -> Result<Value>;

    /// 解析关联链接，返回单个对象或对象数组
    async fn follow_link(&self, href: &str) -> Result<Value>;
}

/// 列表查询参数
///
/// 原样传递给 SDK，不解释、不限制查询语法。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListParams {
    params: BTreeMap<String, String>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// 服务端搜索条件，如 `name!=HostedEngine`
    pub fn search(self, query: impl Into<String>) -> Self {
        self.param("search", query)
    }

    /// 最大返回条数
    pub fn max(self, max: u32) -> Self {
        self.param("max", max.to_string())
    }

    pub fn case_sensitive(self, case_sensitive: bool) -> Self {
        self.param("case_sensitive", case_sensitive.to_string())
    }

    /// 需要一并展开的关联链接
    pub fn follow(self, links: impl Into<String>) -> Self {
        self.param("follow", links)
    }

    /// 任意查询参数
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// oVirt 连接
///
/// 持有外部 SDK 后端的共享引用，克隆开销很小。
#[derive(Clone)]
pub struct Connection {
    backend: Arc<dyn Backend>,
}

impl Connection {
    pub fn new<B: Backend + 'static>(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn from_arc(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// 根服务
    pub fn system_service(&self) -> Service {
        Service {
            connection: self.clone(),
            path: String::new(),
            id: None,
        }
    }

    /// 解析关联链接
    ///
    /// 单个对象会被规范化为只有一个元素的列表。
    pub async fn follow_link<T: DeserializeOwned>(&self, link: &Link) -> Result<Vec<T>> {
        debug!("解析链接: {}", link.href);
        let value = self.backend.follow_link(&link.href).await?;
        let values = match value {
            Value::Array(values) => values,
            Value::Null => Vec::new(),
            value => vec![value],
        };

        values
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(Into::into))
            .collect()
    }

    pub(crate) fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").finish_non_exhaustive()
    }
}

/// 服务句柄
///
/// 集合服务的 `id` 为空；单个实体的服务句柄携带该实体的 ID。
#[derive(Debug, Clone)]
pub struct Service {
    connection: Connection,
    path: String,
    id: Option<String>,
}

impl Service {
    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// 服务路径，如 `vms/123/nics`
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 实体 ID，集合服务返回 `None`
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// 列出集合中的资源
    pub async fn list<T: DeserializeOwned>(&self, params: &ListParams) -> Result<Vec<T>> {
        debug!("SDK 列表请求: {} {:?}", self.path, params);
        let values = self.connection.backend().list(&self.path, params).await?;
        values
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(Into::into))
            .collect()
    }

    /// 获取单个资源
    pub async fn get<T: DeserializeOwned>(&self) -> Result<T> {
        debug!("SDK 获取请求: {}", self.path);
        let value = self.connection.backend().get(&self.path).await?;
        Ok(serde_json::from_value(value)?)
    }

    fn collection(&self, segment: &str) -> Service {
        Service {
            connection: self.connection.clone(),
            path: join_path(&self.path, segment),
            id: None,
        }
    }

    fn entity(&self, id: &str) -> Service {
        Service {
            connection: self.connection.clone(),
            path: join_path(&self.path, id),
            id: Some(id.to_string()),
        }
    }

    // ============================================
    // 集合服务
    // ============================================

    pub fn vms_service(&self) -> Service {
        self.collection("vms")
    }

    pub fn hosts_service(&self) -> Service {
        self.collection("hosts")
    }

    pub fn disks_service(&self) -> Service {
        self.collection("disks")
    }

    pub fn nics_service(&self) -> Service {
        self.collection("nics")
    }

    pub fn disk_attachments_service(&self) -> Service {
        self.collection("diskattachments")
    }

    // ============================================
    // 单个实体服务
    // ============================================

    pub fn vm_service(&self, id: &str) -> Service {
        self.entity(id)
    }

    pub fn host_service(&self, id: &str) -> Service {
        self.entity(id)
    }

    pub fn disk_service(&self, id: &str) -> Service {
        self.entity(id)
    }

    pub fn nic_service(&self, id: &str) -> Service {
        self.entity(id)
    }

    pub fn attachment_service(&self, id: &str) -> Service {
        self.entity(id)
    }
}

fn join_path(base: &str, segment: &str) -> String {
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{}/{}", base, segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;

    #[test]
    fn test_list_params_pass_through() {
        let params = ListParams::new()
            .search("name=web* and status=up")
            .max(10)
            .param("all_content", "true");

        assert_eq!(params.get("search"), Some("name=web* and status=up"));
        assert_eq!(params.get("max"), Some("10"));
        assert_eq!(params.get("all_content"), Some("true"));
        assert_eq!(params.iter().count(), 3);
    }

    #[test]
    fn test_service_paths() {
        let connection = Connection::new(MockBackend::new());
        let system = connection.system_service();

        let vms = system.vms_service();
        assert_eq!(vms.path(), "vms");
        assert_eq!(vms.id(), None);

        let vm = vms.vm_service("vm-1");
        assert_eq!(vm.path(), "vms/vm-1");
        assert_eq!(vm.id(), Some("vm-1"));

        let nic = vm.nics_service().nic_service("nic-1");
        assert_eq!(nic.path(), "vms/vm-1/nics/nic-1");
        assert_eq!(nic.id(), Some("nic-1"));

        let attachments = vm.disk_attachments_service();
        assert_eq!(attachments.path(), "vms/vm-1/diskattachments");
    }
}
