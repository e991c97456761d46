//! 采样器测试

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use ovirtlib_sampler::*;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_timeout_after_interval_spaced_attempts() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let start = Instant::now();

    let mut sampler = TimeoutingSampler::new(
        Duration::from_secs(2),
        Duration::from_secs(1),
        move || {
            let counter = Arc::clone(&counter);
            async move { counter.fetch_add(1, Ordering::SeqCst) + 1 }
        },
    );

    // t=0, t=1, t=2
    assert_eq!(sampler.next_sample().await, Ok(1));
    assert_eq!(sampler.next_sample().await, Ok(2));
    assert_eq!(sampler.next_sample().await, Ok(3));

    let err = sampler.next_sample().await.unwrap_err();
    assert_eq!(
        err,
        SamplerError::Timeout {
            timeout: Duration::from_secs(2),
            attempts: 3
        }
    );
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(start.elapsed(), Duration::from_secs(2));

    // 超时后保持超时
    assert!(matches!(
        sampler.next_sample().await,
        Err(SamplerError::Timeout { .. })
    ));
}

#[tokio::test(start_paused = true)]
async fn test_stream_ends_after_timeout() {
    let sampler = TimeoutingSampler::new(
        Duration::from_secs(3),
        Duration::from_secs(1),
        || async { "sample" },
    );

    let items: Vec<_> = sampler.into_stream().collect().await;

    assert_eq!(items.len(), 5);
    assert!(items[..4].iter().all(|item| item == &Ok("sample")));
    assert!(matches!(items[4], Err(SamplerError::Timeout { attempts: 4, .. })));
}

#[tokio::test(start_paused = true)]
async fn test_consumer_stops_early() {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&calls);
    let stream = TimeoutingSampler::new(
        Duration::from_secs(60),
        Duration::from_secs(1),
        move || {
            let counter = Arc::clone(&counter);
            async move { counter.fetch_add(1, Ordering::SeqCst) }
        },
    )
    .into_stream();
    tokio::pin!(stream);

    while let Some(Ok(value)) = stream.next().await {
        if value == 2 {
            break;
        }
    }

    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_zero_interval_makes_progress() {
    let mut sampler = TimeoutingSampler::new(
        Duration::from_millis(50),
        Duration::ZERO,
        || async { false },
    );

    let result = loop {
        match sampler.next_sample().await {
            Ok(_) => continue,
            Err(e) => break e,
        }
    };

    assert!(matches!(result, SamplerError::Timeout { .. }));
    assert!(sampler.attempts() > 1);
}

#[tokio::test(start_paused = true)]
async fn test_from_config() {
    let config = SamplerConfig::new(4, 2);
    let mut sampler = TimeoutingSampler::from_config(&config, || async { 0u8 });

    assert_eq!(sampler.timeout(), Duration::from_secs(4));
    assert_eq!(sampler.interval(), Duration::from_secs(2));

    let mut samples = 0;
    while sampler.next_sample().await.is_ok() {
        samples += 1;
    }
    assert_eq!(samples, 3);
    assert_eq!(sampler.elapsed(), Duration::from_secs(4));
}
