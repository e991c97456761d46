//! 内存 SDK 后端，用于测试和演示
//!
//! 按路径保存资源集合，支持：
//! - 简单的服务端搜索：`field=value`、`field!=value`，值支持 `*` 通配，多个条件用 `and` 连接
//! - `max` 参数截断
//! - 预设的多轮列表结果，用于模拟平台的异步状态变化
//! - 按路径统计列表调用次数

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::connection::{Backend, ListParams};
use crate::error::{OvirtError, Result};

/// 链接前缀，解析链接时去掉
const API_PREFIX: &str = "/ovirt-engine/api/";

#[derive(Default)]
struct MockState {
    collections: BTreeMap<String, Vec<Value>>,
    scripted: HashMap<String, VecDeque<Vec<Value>>>,
    list_calls: HashMap<String, usize>,
}

/// 内存 SDK 后端
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 添加或替换（按 `id`）集合中的资源
    pub fn insert(&self, path: &str, value: Value) {
        let mut state = self.state();
        let items = state.collections.entry(path.to_string()).or_default();
        match items.iter_mut().find(|item| item["id"] == value["id"]) {
            Some(item) => *item = value,
            None => items.push(value),
        }
    }

    /// 整体设置集合内容
    pub fn set_collection(&self, path: &str, values: Vec<Value>) {
        self.state().collections.insert(path.to_string(), values);
    }

    /// 删除集合中的资源
    pub fn remove(&self, path: &str, id: &str) -> bool {
        let mut state = self.state();
        match state.collections.get_mut(path) {
            Some(items) => {
                let before = items.len();
                items.retain(|item| item["id"] != id);
                items.len() != before
            }
            None => false,
        }
    }

    /// 预设接下来若干次列表调用的结果，用完后回到集合内容
    pub fn script_list(&self, path: &str, rounds: Vec<Vec<Value>>) {
        self.state()
            .scripted
            .entry(path.to_string())
            .or_default()
            .extend(rounds);
    }

    /// 路径上的列表调用次数
    pub fn list_calls(&self, path: &str) -> usize {
        self.state().list_calls.get(path).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn list(&self, path: &str, params: &ListParams) -> Result<Vec<Value>> {
        let items = {
            let mut state = self.state();
            *state.list_calls.entry(path.to_string()).or_default() += 1;
            match state.scripted.get_mut(path).and_then(VecDeque::pop_front) {
                Some(round) => round,
                None => state.collections.get(path).cloned().unwrap_or_default(),
            }
        };

        let case_sensitive = params.get("case_sensitive") == Some("true");
        let terms = match params.get("search") {
            Some(query) => parse_search(query)?,
            None => Vec::new(),
        };

        let mut matched: Vec<Value> = items
            .into_iter()
            .filter(|item| terms.iter().all(|term| term.matches(item, case_sensitive)))
            .collect();

        if let Some(max) = params.get("max") {
            let max: usize = max
                .parse()
                .map_err(|_| OvirtError::ApiError(400, format!("无效的 max 参数: {}", max)))?;
            matched.truncate(max);
        }

        debug!("mock 列表: {} -> {} 个", path, matched.len());
        Ok(matched)
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let (parent, id) = path
            .rsplit_once('/')
            .ok_or_else(|| OvirtError::NotFound(path.to_string()))?;

        self.state()
            .collections
            .get(parent)
            .and_then(|items| items.iter().find(|item| item["id"] == id))
            .cloned()
            .ok_or_else(|| OvirtError::NotFound(path.to_string()))
    }

    async fn follow_link(&self, href: &str) -> Result<Value> {
        let path = href.strip_prefix(API_PREFIX).unwrap_or(href).trim_matches('/');

        let collection = self.state().collections.get(path).cloned();
        match collection {
            Some(items) => Ok(Value::Array(items)),
            None => self.get(path).await,
        }
    }
}

#[derive(Debug)]
struct SearchTerm {
    field: String,
    pattern: String,
    negate: bool,
}

impl SearchTerm {
    fn matches(&self, item: &Value, case_sensitive: bool) -> bool {
        let found = match item.get(&self.field) {
            None | Some(Value::Null) => false,
            Some(Value::Object(object)) => ["name", "id"].iter().any(|key| {
                object
                    .get(*key)
                    .and_then(Value::as_str)
                    .is_some_and(|text| glob_match(&self.pattern, text, case_sensitive))
            }),
            Some(Value::String(text)) => glob_match(&self.pattern, text, case_sensitive),
            Some(value) => glob_match(&self.pattern, &value.to_string(), case_sensitive),
        };
        found != self.negate
    }
}

fn parse_search(query: &str) -> Result<Vec<SearchTerm>> {
    query
        .split_whitespace()
        .filter(|token| !token.eq_ignore_ascii_case("and"))
        .map(|token| {
            let (field, pattern, negate) = if let Some((field, pattern)) = token.split_once("!=") {
                (field, pattern, true)
            } else if let Some((field, pattern)) = token.split_once('=') {
                (field, pattern, false)
            } else {
                warn!("mock 不支持的搜索条件: {}", token);
                return Err(OvirtError::ApiError(400, format!("无法解析搜索条件: {}", query)));
            };
            Ok(SearchTerm {
                field: field.to_string(),
                pattern: pattern.to_string(),
                negate,
            })
        })
        .collect()
}

fn glob_match(pattern: &str, text: &str, case_sensitive: bool) -> bool {
    let (pattern, text) = if case_sensitive {
        (pattern.to_string(), text.to_string())
    } else {
        (pattern.to_lowercase(), text.to_lowercase())
    };

    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let mut rest = text.as_str();
    for (i, part) in parts.iter().enumerate() {
        if i == 0 {
            match rest.strip_prefix(part) {
                Some(remaining) => rest = remaining,
                None => return false,
            }
        } else if i == parts.len() - 1 {
            return rest.ends_with(part);
        } else {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_glob_match() {
        assert!(glob_match("web-01", "WEB-01", false));
        assert!(!glob_match("web-01", "WEB-01", true));
        assert!(glob_match("web*", "web-01", false));
        assert!(glob_match("*01", "web-01", false));
        assert!(glob_match("w*-*1", "web-01", false));
        assert!(!glob_match("db*", "web-01", false));
    }

    #[tokio::test]
    async fn test_search_and_max() {
        let backend = MockBackend::new();
        backend.set_collection(
            "vms",
            vec![
                json!({"id": "1", "name": "web-01", "status": "up"}),
                json!({"id": "2", "name": "web-02", "status": "down"}),
                json!({"id": "3", "name": "HostedEngine", "status": "up"}),
            ],
        );

        let params = ListParams::new().search("name=web* and status=up");
        let vms = backend.list("vms", &params).await.unwrap();
        assert_eq!(vms.len(), 1);
        assert_eq!(vms[0]["id"], "1");

        let params = ListParams::new().search("name!=HostedEngine").max(1);
        let vms = backend.list("vms", &params).await.unwrap();
        assert_eq!(vms.len(), 1);
        assert_eq!(vms[0]["name"], "web-01");

        let params = ListParams::new().search("name ~ web");
        assert!(backend.list("vms", &params).await.is_err());
        assert_eq!(backend.list_calls("vms"), 3);
    }

    #[tokio::test]
    async fn test_scripted_rounds() {
        let backend = MockBackend::new();
        backend.insert("vms", json!({"id": "1", "name": "web-01"}));
        backend.script_list("vms", vec![vec![], vec![json!({"id": "9", "name": "tmp"})]]);

        let params = ListParams::new();
        assert!(backend.list("vms", &params).await.unwrap().is_empty());
        assert_eq!(backend.list("vms", &params).await.unwrap()[0]["id"], "9");
        assert_eq!(backend.list("vms", &params).await.unwrap()[0]["id"], "1");
    }

    #[tokio::test]
    async fn test_get_and_follow_link() {
        let backend = MockBackend::new();
        backend.insert("vms", json!({"id": "1", "name": "web-01"}));
        backend.insert("vms/1/nics", json!({"id": "n1", "name": "nic1"}));

        assert_eq!(backend.get("vms/1").await.unwrap()["name"], "web-01");
        assert!(matches!(
            backend.get("vms/2").await,
            Err(OvirtError::NotFound(_))
        ));

        let nics = backend
            .follow_link("/ovirt-engine/api/vms/1/nics")
            .await
            .unwrap();
        assert!(nics.is_array());

        let vm = backend.follow_link("/ovirt-engine/api/vms/1").await.unwrap();
        assert!(vm.is_object());

        assert!(backend.remove("vms", "1"));
        assert!(!backend.remove("vms", "1"));
    }
}
