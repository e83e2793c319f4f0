//! Per-view refresh scheduling.
//!
//! A `Poller` is one activation of a view: it fires the refresh callback
//! immediately and then once per period until stopped. Refreshes are spawned
//! rather than awaited, so a slow cycle may overlap the next one; whichever
//! update lands last wins.
//!
//! Stopping cancels the session's `CancelToken`. In-flight requests are not
//! aborted, but every update they produce goes through a `Reporter`, which
//! refuses to send once the token is cancelled, and `App::apply` checks the
//! token again before touching state.

use crate::app::{Envelope, Update};
use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    sync::mpsc::UnboundedSender,
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

/// Shared "still active" flag for one view session.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sends updates back to the UI task on behalf of one session.
#[derive(Clone, Debug)]
pub struct Reporter {
    token: CancelToken,
    tx: UnboundedSender<Envelope>,
}

impl Reporter {
    pub fn new(token: CancelToken, tx: UnboundedSender<Envelope>) -> Self {
        Self { token, tx }
    }

    pub fn is_active(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Returns false if the update was dropped.
    pub fn send(&self, update: Update) -> bool {
        if self.token.is_cancelled() {
            tracing::debug!("session closed, dropping update");
            return false;
        }
        self.tx
            .send(Envelope {
                token: self.token.clone(),
                update,
            })
            .is_ok()
    }
}

pub struct Poller {
    token: CancelToken,
    tx: UnboundedSender<Envelope>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Start a session. With `period = None` the refresh runs once.
    pub fn start<F, Fut>(period: Option<Duration>, tx: UnboundedSender<Envelope>, refresh: F) -> Self
    where
        F: Fn(Reporter) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancelToken::new();
        let reporter = Reporter::new(token.clone(), tx.clone());

        let handle = match period {
            None => tokio::spawn(refresh(reporter)),
            Some(period) => tokio::spawn(async move {
                let mut ticker = time::interval(period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if !reporter.is_active() {
                        break;
                    }
                    tokio::spawn(refresh(reporter.clone()));
                }
            }),
        };

        Self {
            token,
            tx,
            handle: Some(handle),
        }
    }

    /// A reporter bound to this session, for one-off tasks such as a search.
    pub fn reporter(&self) -> Reporter {
        Reporter::new(self.token.clone(), self.tx.clone())
    }

    pub fn token(&self) -> &CancelToken {
        &self.token
    }

    pub fn stop(&mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}
