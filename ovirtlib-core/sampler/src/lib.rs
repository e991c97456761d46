//! ovirtlib 采样器
//!
//! 在给定的总超时时间内，按固定间隔反复调用一个生产函数，
//! 以惰性序列的形式逐个返回结果。超时后返回独立的
//! [`SamplerError::Timeout`]，调用方据此区分"正常结束"与"等待超时"。
//!
//! # 示例
//!
//! ```ignore
//! use std::time::Duration;
//! use ovirtlib_sampler::{TimeoutingSampler, SamplerError};
//!
//! let mut sampler = TimeoutingSampler::new(
//!     Duration::from_secs(10),
//!     Duration::from_secs(1),
//!     || async { check_vm_up().await },
//! );
//!
//! loop {
//!     match sampler.next_sample().await {
//!         Ok(true) => break,
//!         Ok(false) => continue,
//!         Err(SamplerError::Timeout { .. }) => return Err(..),
//!         Err(e) => return Err(e.into()),
//!     }
//! }
//! ```

pub mod config;
pub mod sampler;

pub use config::SamplerConfig;
pub use sampler::TimeoutingSampler;

use std::time::Duration;
use thiserror::Error;

/// 采样器错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SamplerError {
    #[error("采样超时: {timeout:?} 内共尝试 {attempts} 次")]
    Timeout {
        /// 配置的总超时
        timeout: Duration,
        /// 超时前已执行的采样次数
        attempts: u32,
    },

    #[error("配置错误: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SamplerError>;
