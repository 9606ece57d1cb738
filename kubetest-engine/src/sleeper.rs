use std::time::Duration;

use async_trait::async_trait;

/// Injectable sleep so `Waiter`'s retry-bound invariant (at most `floor(timeout/2)` list calls)
/// is exactly testable without a real timer. Mirrors the teacher's `Clockable` injection pattern
/// in `sk-core::k8s::lease`, narrowed to the one operation the Waiter needs.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RealSleeper;

#[async_trait]
impl Sleeper for RealSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSleeper;

#[async_trait]
impl Sleeper for NoopSleeper {
    async fn sleep(&self, _duration: Duration) {}
}
