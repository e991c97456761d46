//! 采样器配置

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::{Result, SamplerError};

/// 等待超时环境变量（秒）
pub const ENV_WAIT_TIMEOUT: &str = "OVIRTLIB_WAIT_TIMEOUT";

/// 采样间隔环境变量（秒）
pub const ENV_WAIT_INTERVAL: &str = "OVIRTLIB_WAIT_INTERVAL";

/// 采样器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// 总超时（秒），默认 5
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// 采样间隔（秒），默认 1
    #[serde(default = "default_interval")]
    pub interval: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            interval: default_interval(),
        }
    }
}

impl SamplerConfig {
    pub fn new(timeout: u64, interval: u64) -> Self {
        Self { timeout, interval }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval)
    }

    /// 默认配置 + 环境变量覆盖
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_vars()?;
        config.validate()?;
        Ok(config)
    }

    /// 从环境变量覆盖配置
    pub fn apply_env_vars(&mut self) -> Result<()> {
        if let Ok(timeout) = env::var(ENV_WAIT_TIMEOUT) {
            self.timeout = timeout.trim().parse().map_err(|_| {
                SamplerError::Config(format!("无效的 {} 值: {}", ENV_WAIT_TIMEOUT, timeout))
            })?;
        }
        if let Ok(interval) = env::var(ENV_WAIT_INTERVAL) {
            self.interval = interval.trim().parse().map_err(|_| {
                SamplerError::Config(format!("无效的 {} 值: {}", ENV_WAIT_INTERVAL, interval))
            })?;
        }
        Ok(())
    }

    /// 验证配置
    ///
    /// 间隔大于超时时只会采样一次，视为配置错误；超时为 0 时允许任意间隔。
    pub fn validate(&self) -> Result<()> {
        if self.timeout > 0 && self.interval > self.timeout {
            return Err(SamplerError::Config(format!(
                "采样间隔 {}s 大于总超时 {}s",
                self.interval, self.timeout
            )));
        }
        Ok(())
    }
}

// 默认值函数
fn default_timeout() -> u64 {
    5
}

fn default_interval() -> u64 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = SamplerConfig::default();
        assert_eq!(config.timeout, 5);
        assert_eq!(config.interval, 1);
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: SamplerConfig = serde_json::from_str(r#"{"timeout": 30}"#).unwrap();
        assert_eq!(config.timeout, 30);
        assert_eq!(config.interval, 1);
    }

    #[test]
    fn test_validate() {
        assert!(SamplerConfig::new(10, 2).validate().is_ok());
        assert!(SamplerConfig::new(0, 2).validate().is_ok());
        assert!(SamplerConfig::new(2, 10).validate().is_err());
    }

    #[test]
    fn test_env_override() {
        env::set_var(ENV_WAIT_TIMEOUT, "42");
        env::set_var(ENV_WAIT_INTERVAL, "3");
        let mut config = SamplerConfig::default();
        config.apply_env_vars().unwrap();
        assert_eq!(config, SamplerConfig::new(42, 3));

        env::set_var(ENV_WAIT_TIMEOUT, "soon");
        assert!(config.apply_env_vars().is_err());

        env::remove_var(ENV_WAIT_TIMEOUT);
        env::remove_var(ENV_WAIT_INTERVAL);
    }
}
