//! 等待条件
//!
//! 描述集合查询需要满足的条件：
//! - [`WaitFor::Present`]: 列表非空
//! - [`WaitFor::Absent`]: 列表为空
//! - [`WaitFor::Predicate`]: 对整个结果集求值的函数
//! - [`WaitFor::Field`]: 对每个实体的字段求值，再按 [`WaitMethod`] 聚合

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use ovirtlib_sampler::SamplerConfig;
use serde_json::Value;

use crate::collection::CollectionEntity;
use crate::error::{OvirtError, Result};
use crate::models::{truthy, Snapshot};

/// 结果集谓词
pub type Predicate<T> = Arc<dyn Fn(&[CollectionEntity<T>]) -> bool + Send + Sync>;

/// 字段条件的聚合方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitMethod {
    /// 任一实体满足即可，返回满足条件的子集
    #[default]
    Any,
    /// 所有实体都满足，返回完整结果集
    All,
}

impl FromStr for WaitMethod {
    type Err = OvirtError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "any" => Ok(WaitMethod::Any),
            "all" => Ok(WaitMethod::All),
            _ => Err(OvirtError::InvalidWaitMethod(s.to_string())),
        }
    }
}

impl fmt::Display for WaitMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitMethod::Any => write!(f, "any"),
            WaitMethod::All => write!(f, "all"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CompareOp {
    Eq,
    Ne,
}

/// 字段条件
///
/// 支持两种写法：
/// - `path`: 字段值的真值，如 `stateless`、`host.id`
/// - `path == literal` / `path != literal`: 与字面量比较，如 `status == ok`
///
/// 字面量可以是 `true` / `false` / `null`、数字、带引号或不带引号的字符串。
#[derive(Debug, Clone, PartialEq)]
pub struct FieldCondition {
    source: String,
    path: String,
    compare: Option<(CompareOp, Value)>,
}

impl FieldCondition {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 对单个快照求值
    pub fn evaluate<T: Snapshot>(&self, snapshot: &T) -> Result<bool> {
        let value = snapshot.lookup(&self.path)?;
        Ok(match &self.compare {
            None => truthy(&value),
            Some((CompareOp::Eq, literal)) => values_equal(&value, literal),
            Some((CompareOp::Ne, literal)) => !values_equal(&value, literal),
        })
    }
}

impl FromStr for FieldCondition {
    type Err = OvirtError;

    fn from_str(s: &str) -> Result<Self> {
        let source = s.trim();
        let invalid = || OvirtError::InvalidCondition(s.to_string());

        let (path, compare) = if let Some((left, right)) = source.split_once("!=") {
            (left.trim(), Some((CompareOp::Ne, parse_literal(right.trim()).ok_or_else(invalid)?)))
        } else if let Some((left, right)) = source.split_once("==") {
            (left.trim(), Some((CompareOp::Eq, parse_literal(right.trim()).ok_or_else(invalid)?)))
        } else {
            (source, None)
        };

        if !valid_path(path) {
            return Err(invalid());
        }

        Ok(Self {
            source: source.to_string(),
            path: path.to_string(),
            compare,
        })
    }
}

impl fmt::Display for FieldCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn valid_path(path: &str) -> bool {
    !path.is_empty()
        && path.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

fn parse_literal(s: &str) -> Option<Value> {
    if s.is_empty() {
        return None;
    }
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return Some(Value::String(s[1..s.len() - 1].to_string()));
        }
    }
    Some(match s {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        "null" => Value::Null,
        _ => {
            if let Ok(n) = s.parse::<i64>() {
                Value::from(n)
            } else if let Ok(n) = s.parse::<u64>() {
                Value::from(n)
            } else if let Ok(f) = s.parse::<f64>() {
                Value::from(f)
            } else {
                Value::String(s.to_string())
            }
        }
    })
}

fn values_equal(value: &Value, literal: &Value) -> bool {
    match (value, literal) {
        // 整数按整数比较，避免大于 2^53 的值在 f64 下丢失精度
        (Value::Number(a), Value::Number(b)) => match (a.as_u64(), b.as_u64()) {
            (Some(a), Some(b)) => a == b,
            _ => match (a.as_i64(), b.as_i64()) {
                (Some(a), Some(b)) => a == b,
                _ => a.as_f64() == b.as_f64(),
            },
        },
        _ => value == literal,
    }
}

/// 等待条件
pub enum WaitFor<T> {
    /// 列表非空
    Present,
    /// 列表为空
    Absent,
    /// 结果集谓词为真
    Predicate(Predicate<T>),
    /// 字段条件按聚合方式满足
    Field {
        condition: FieldCondition,
        method: WaitMethod,
    },
}

impl<T: Snapshot> WaitFor<T> {
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&[CollectionEntity<T>]) -> bool + Send + Sync + 'static,
    {
        WaitFor::Predicate(Arc::new(f))
    }

    /// 字段条件，聚合方式为 `any`
    pub fn field(condition: &str) -> Result<Self> {
        Self::field_with(condition, WaitMethod::Any)
    }

    pub fn field_with(condition: &str, method: WaitMethod) -> Result<Self> {
        Ok(WaitFor::Field {
            condition: condition.parse()?,
            method,
        })
    }

    /// 处理一轮采样结果
    ///
    /// 满足条件时返回 `Some`：`Absent` 返回空列表，字段条件 `any` 返回满足条件的子集，
    /// 其余返回完整结果集。不满足时返回 `None`。
    pub fn matches(
        &self,
        sample: Vec<CollectionEntity<T>>,
    ) -> Result<Option<Vec<CollectionEntity<T>>>> {
        match self {
            WaitFor::Present => Ok((!sample.is_empty()).then_some(sample)),
            WaitFor::Absent => Ok(sample.is_empty().then_some(sample)),
            WaitFor::Predicate(predicate) => Ok((**predicate)(sample.as_slice()).then_some(sample)),
            WaitFor::Field { condition, method } => {
                if sample.is_empty() {
                    return Ok(None);
                }

                let mut results = Vec::with_capacity(sample.len());
                for entity in &sample {
                    results.push(condition.evaluate(entity.entity())?);
                }

                match method {
                    WaitMethod::Any => {
                        let matched: Vec<_> = sample
                            .into_iter()
                            .zip(results)
                            .filter_map(|(entity, ok)| ok.then_some(entity))
                            .collect();
                        Ok((!matched.is_empty()).then_some(matched))
                    }
                    WaitMethod::All => Ok(results.iter().all(|ok| *ok).then_some(sample)),
                }
            }
        }
    }
}

impl<T> From<bool> for WaitFor<T> {
    fn from(present: bool) -> Self {
        if present {
            WaitFor::Present
        } else {
            WaitFor::Absent
        }
    }
}

impl<T> Clone for WaitFor<T> {
    fn clone(&self) -> Self {
        match self {
            WaitFor::Present => WaitFor::Present,
            WaitFor::Absent => WaitFor::Absent,
            WaitFor::Predicate(predicate) => WaitFor::Predicate(Arc::clone(predicate)),
            WaitFor::Field { condition, method } => WaitFor::Field {
                condition: condition.clone(),
                method: *method,
            },
        }
    }
}

impl<T> fmt::Display for WaitFor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitFor::Present => write!(f, "true"),
            WaitFor::Absent => write!(f, "false"),
            WaitFor::Predicate(_) => write!(f, "<predicate>"),
            WaitFor::Field { condition, method } => write!(f, "{} ({})", condition, method),
        }
    }
}

impl<T> fmt::Debug for WaitFor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WaitFor({})", self)
    }
}

/// 条件等待参数
#[derive(Debug, Clone)]
pub struct Wait<T> {
    pub wait_for: WaitFor<T>,

    /// 总超时
    pub timeout: Duration,

    /// 采样间隔
    pub interval: Duration,
}

impl<T> Wait<T> {
    /// 使用默认超时（5 秒）和间隔（1 秒）
    pub fn new(wait_for: impl Into<WaitFor<T>>) -> Self {
        Self::with_config(wait_for, &SamplerConfig::default())
    }

    pub fn with_config(wait_for: impl Into<WaitFor<T>>, config: &SamplerConfig) -> Self {
        Self {
            wait_for: wait_for.into(),
            timeout: config.timeout(),
            interval: config.interval(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}
