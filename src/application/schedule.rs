//! Cancellable background tasks.
//!
//! A [`ScheduledTask`] owns a spawned future and a cancellation token. The
//! task is cancelled when `cancel` is called or when the handle is dropped,
//! so an owner going away never leaves a timer running.

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct ScheduledTask {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ScheduledTask {
    /// Spawn `body` with a token it must observe to stop early.
    pub fn spawn<F, Fut>(body: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let handle = tokio::spawn(body(token.clone()));
        Self {
            token,
            handle: Some(handle),
        }
    }

    /// Run `tick` every `period`, first run one period from now.
    pub fn every<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::spawn(move |token| async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            interval.tick().await; // Skip the first immediate tick

            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = interval.tick() => {
                        tokio::select! {
                            () = token.cancelled() => break,
                            () = tick() => {}
                        }
                    }
                }
            }
        })
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Wait for the task body to return.
    pub async fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
