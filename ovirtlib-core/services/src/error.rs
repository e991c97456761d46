//! ovirtlib 错误定义

use ovirtlib_sampler::SamplerError;
use thiserror::Error;

/// ovirtlib 错误类型
///
/// SDK 连接返回的错误原样向上传递，不做转换。
#[derive(Error, Debug)]
pub enum OvirtError {
    #[error("SDK 错误: {0}")]
    Sdk(String),

    #[error("API 错误 [{0}]: {1}")]
    ApiError(u16, String),

    #[error("资源不存在: {0}")]
    NotFound(String),

    #[error("解析错误: {0}")]
    ParseError(String),

    #[error("{kind} 不存在字段: {field}")]
    UnknownField { kind: &'static str, field: String },

    #[error("无效的等待条件: {0}")]
    InvalidCondition(String),

    #[error("无效的等待方式: {0} (可选: any, all)")]
    InvalidWaitMethod(String),

    #[error("实体未绑定服务: {0}")]
    Unbound(String),

    #[error(transparent)]
    Sampler(#[from] SamplerError),
}

/// ovirtlib 结果类型
pub type Result<T> = std::result::Result<T, OvirtError>;

impl From<serde_json::Error> for OvirtError {
    fn from(e: serde_json::Error) -> Self {
        OvirtError::ParseError(e.to_string())
    }
}
