//! 带超时的周期采样器

use std::future::Future;
use std::time::Duration;

use futures_util::stream::{self, Stream};
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::config::SamplerConfig;
use crate::{Result, SamplerError};

/// 带超时的周期采样器
///
/// 第一次采样立即执行；之后每次采样前先休眠 `interval`。
/// 若"已耗时 + 下一次间隔"超过 `timeout`，返回 [`SamplerError::Timeout`]。
/// 超时为 0 时只采样一次；间隔为 0 时通过让出执行权保证前进。
pub struct TimeoutingSampler<F> {
    /// 生产函数，参数通过闭包捕获
    func: F,

    /// 总超时
    timeout: Duration,

    /// 采样间隔
    interval: Duration,

    /// 第一次采样的时间点
    started: Option<Instant>,

    /// 已执行的采样次数
    attempts: u32,
}

impl<F, Fut, T> TimeoutingSampler<F>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = T>,
{
    /// 创建新的采样器
    pub fn new(timeout: Duration, interval: Duration, func: F) -> Self {
        Self {
            func,
            timeout,
            interval,
            started: None,
            attempts: 0,
        }
    }

    /// 使用配置创建采样器
    pub fn from_config(config: &SamplerConfig, func: F) -> Self {
        Self::new(config.timeout(), config.interval(), func)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// 已执行的采样次数
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// 自第一次采样以来的耗时
    pub fn elapsed(&self) -> Duration {
        self.started
            .map(|started| Instant::now().saturating_duration_since(started))
            .unwrap_or_default()
    }

    /// 获取下一个采样结果
    ///
    /// 超时后每次调用都返回 [`SamplerError::Timeout`]。
    pub async fn next_sample(&mut self) -> Result<T> {
        match self.started {
            None => {
                self.started = Some(Instant::now());
            }
            Some(_) => {
                let elapsed = self.elapsed();
                if self.timeout.is_zero() || elapsed.saturating_add(self.interval) > self.timeout {
                    debug!(
                        "采样超时: 已耗时 {:?}, 超时 {:?}, 共 {} 次",
                        elapsed, self.timeout, self.attempts
                    );
                    return Err(SamplerError::Timeout {
                        timeout: self.timeout,
                        attempts: self.attempts,
                    });
                }

                if self.interval.is_zero() {
                    tokio::task::yield_now().await;
                } else {
                    tokio::time::sleep(self.interval).await;
                }
            }
        }

        self.attempts += 1;
        trace!("第 {} 次采样", self.attempts);
        Ok((self.func)().await)
    }

    /// 转换为异步流
    ///
    /// 流在产出超时错误后结束。
    pub fn into_stream(self) -> impl Stream<Item = Result<T>> {
        stream::unfold(Some(self), |state| async move {
            let Some(mut sampler) = state else {
                return None;
            };
            let item = sampler.next_sample().await;
            let next = if item.is_ok() { Some(sampler) } else { None };
            Some((item, next))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_first_sample_is_immediate() {
        let start = Instant::now();
        let mut sampler = TimeoutingSampler::new(
            Duration::from_secs(5),
            Duration::from_secs(1),
            || async { 7 },
        );

        assert_eq!(sampler.next_sample().await, Ok(7));
        assert_eq!(sampler.attempts(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_single_attempt() {
        let mut sampler =
            TimeoutingSampler::new(Duration::ZERO, Duration::from_secs(1), || async { () });

        assert!(sampler.next_sample().await.is_ok());
        assert_eq!(
            sampler.next_sample().await,
            Err(SamplerError::Timeout {
                timeout: Duration::ZERO,
                attempts: 1
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_interval_times_out() {
        let mut sampler =
            TimeoutingSampler::new(Duration::from_secs(5), Duration::MAX, || async { 1 });

        assert_eq!(sampler.next_sample().await, Ok(1));
        assert_eq!(
            sampler.next_sample().await,
            Err(SamplerError::Timeout {
                timeout: Duration::from_secs(5),
                attempts: 1
            })
        );
    }
}
