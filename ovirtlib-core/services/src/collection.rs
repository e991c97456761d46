//! 集合与实体包装
//!
//! [`CollectionService`] 表示某类资源的可查询集合，每次查询都重新访问平台；
//! [`CollectionEntity`] 把一次查询得到的快照与能够操作该实体的服务句柄绑定在一起。

use async_trait::async_trait;
use ovirtlib_sampler::{SamplerError, TimeoutingSampler};
use tracing::{debug, error, info};

use crate::condition::Wait;
use crate::connection::{Connection, ListParams, Service};
use crate::error::{OvirtError, Result};
use crate::models::{Link, Snapshot};

/// 资源集合
///
/// 每种资源类型实现 `service` 与 `entity_service`，其余操作由默认实现提供。
#[async_trait]
pub trait CollectionService: Send + Sync {
    /// 集合中单个实体的快照类型
    type Entity: Snapshot;

    fn connection(&self) -> &Connection;

    /// 集合服务，如 `vms_service()`
    fn service(&self) -> Service;

    /// 集合中单个实体的服务
    fn entity_service(&self, id: &str) -> Service;

    /// 按 ID 获取实体
    async fn get_entity_by_id(&self, id: &str) -> Result<CollectionEntity<Self::Entity>> {
        let service = self.entity_service(id);
        let entity = service.get::<Self::Entity>().await?;
        Ok(CollectionEntity::new(
            self.connection().clone(),
            entity,
            Some(service),
        ))
    }

    /// 列出集合中的实体
    ///
    /// 查询参数原样传递给 SDK；每个快照都绑定自己的服务句柄。
    async fn list(&self, params: &ListParams) -> Result<Vec<CollectionEntity<Self::Entity>>> {
        let snapshots = self.service().list::<Self::Entity>(params).await?;
        debug!("查询 {} 列表: {} 个", <Self::Entity as Snapshot>::KIND, snapshots.len());

        Ok(snapshots
            .into_iter()
            .map(|entity| {
                let service = self.entity_service(entity.id());
                CollectionEntity::new(self.connection().clone(), entity, Some(service))
            })
            .collect())
    }

    /// 查询实体，可选地等待条件满足
    ///
    /// 不指定 `wait` 时与 [`list`](Self::list) 相同；否则见 [`run_sampler`](Self::run_sampler)。
    async fn get(
        &self,
        params: &ListParams,
        wait: Option<Wait<Self::Entity>>,
    ) -> Result<Option<Vec<CollectionEntity<Self::Entity>>>> {
        match wait {
            Some(wait) => self.run_sampler(params, wait).await,
            None => self.list(params).await.map(Some),
        }
    }

    /// 轮询 `list` 直到条件满足
    ///
    /// 返回满足条件的结果；超时返回 `None` 并记录错误日志。
    async fn run_sampler(
        &self,
        params: &ListParams,
        wait: Wait<Self::Entity>,
    ) -> Result<Option<Vec<CollectionEntity<Self::Entity>>>> {
        let mut sampler = TimeoutingSampler::new(wait.timeout, wait.interval, || self.list(params));

        loop {
            match sampler.next_sample().await {
                Ok(sample) => {
                    if let Some(matched) = wait.wait_for.matches(sample?)? {
                        info!(
                            "{} 等待条件满足: wait_for={}, 第 {} 次采样",
                            <Self::Entity as Snapshot>::KIND,
                            wait.wait_for,
                            sampler.attempts()
                        );
                        return Ok(Some(matched));
                    }
                    debug!("{} 等待条件未满足: wait_for={}", <Self::Entity as Snapshot>::KIND, wait.wait_for);
                }
                Err(SamplerError::Timeout { timeout, attempts }) => {
                    error!(
                        "等待超时: {} wait_for={} 未满足 (超时 {:?}, 共 {} 次采样)",
                        <Self::Entity as Snapshot>::KIND,
                        wait.wait_for,
                        timeout,
                        attempts
                    );
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// 所有实体的显示名称，没有名称的实体被跳过
    async fn get_names(&self, params: &ListParams) -> Result<Vec<String>> {
        Ok(self
            .list(params)
            .await?
            .into_iter()
            .filter_map(|entity| entity.entity().name().map(str::to_string))
            .collect())
    }
}

/// 集合实体
///
/// 快照与服务句柄始终指向同一个远端实体。通过链接得到、
/// 又未指定目标集合的实体只有数据，没有服务句柄。
#[derive(Debug, Clone)]
pub struct CollectionEntity<T> {
    connection: Connection,
    entity: T,
    service: Option<Service>,
}

impl<T: Snapshot> CollectionEntity<T> {
    pub fn new(connection: Connection, entity: T, service: Option<Service>) -> Self {
        Self {
            connection,
            entity,
            service,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// 快照
    pub fn entity(&self) -> &T {
        &self.entity
    }

    pub fn set_entity(&mut self, entity: T) {
        self.entity = entity;
    }

    pub fn into_entity(self) -> T {
        self.entity
    }

    /// 服务句柄
    pub fn service(&self) -> Option<&Service> {
        self.service.as_ref()
    }

    pub fn set_service(&mut self, service: Option<Service>) {
        self.service = service;
    }

    pub fn id(&self) -> &str {
        self.entity.id()
    }

    /// 服务句柄，数据实体返回 [`OvirtError::Unbound`]
    pub fn bound_service(&self) -> Result<&Service> {
        self.service
            .as_ref()
            .ok_or_else(|| OvirtError::Unbound(format!("{} {}", T::KIND, self.entity.id())))
    }

    /// 重新获取快照，整体替换
    pub async fn get(&mut self) -> Result<&mut Self> {
        let entity = self.bound_service()?.get::<T>().await?;
        self.entity = entity;
        Ok(self)
    }

    /// 解析链接，得到只有数据的实体
    pub async fn follow_link<U: Snapshot>(&self, link: &Link) -> Result<Vec<CollectionEntity<U>>> {
        let entities = self.connection.follow_link::<U>(link).await?;
        debug!("{} {} 链接 {} 解析到 {} 个 {}", T::KIND, self.id(), link.href, entities.len(), U::KIND);

        Ok(entities
            .into_iter()
            .map(|entity| CollectionEntity::new(self.connection.clone(), entity, None))
            .collect())
    }

    /// 解析链接，每个实体绑定到目标集合中对应的服务句柄
    pub async fn follow_link_in<C>(
        &self,
        link: &Link,
        collection: &C,
    ) -> Result<Vec<CollectionEntity<C::Entity>>>
    where
        C: CollectionService + ?Sized,
    {
        let mut entities = self.follow_link::<C::Entity>(link).await?;
        for entity in &mut entities {
            entity.service = Some(collection.entity_service(entity.entity.id()));
        }
        Ok(entities)
    }
}
