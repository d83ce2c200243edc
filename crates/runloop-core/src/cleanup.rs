//! Per-run resource release.

use std::sync::Arc;

use async_trait::async_trait;

/// Resource handle released once at the end of every run.
///
/// Implementations log their own failures; a run never fails because
/// cleanup did. Calling `cleanup` repeatedly must be safe.
#[async_trait]
pub trait Cleanup: Send + Sync {
    async fn cleanup(&self);
}

/// Cleanup handle with nothing to release.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCleanup;

#[async_trait]
impl Cleanup for NoopCleanup {
    async fn cleanup(&self) {}
}

#[async_trait]
impl<C: Cleanup + ?Sized> Cleanup for Arc<C> {
    async fn cleanup(&self) {
        (**self).cleanup().await
    }
}
