//! Action state machine
//!
//! One [`ActionMachine`] models the lifecycle of one simulated on-chain action:
//!
//! ```text
//! idle -> processing -> awaiting -> confirming (xN) -> completed
//!   any state -> error (forced)     any state -> idle (reset)
//! ```
//!
//! `processing -> awaiting` is driven by a one-shot delay task, the
//! confirmation counter by a single recurring interval task. The task handles
//! sit behind a plain mutex so they can be aborted from `Drop`, and every task
//! carries the attempt epoch it was spawned for, so a tick that loses the race
//! against `reset`/`start` is discarded instead of touching the newer attempt.

use crate::config::ActionConfig;
use crate::error::{FlowError, FlowResult};
use crate::reference::generate_reference_id;
use chainviz_types::{ActionKind, ActionParams, ActionState, ActionStatus};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::sync::{oneshot, watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep, Instant};
use tracing::{debug, info, instrument, warn};

struct Inner {
    state: ActionState,
    /// Bumped whenever pending timers are invalidated
    epoch: u64,
    updates: watch::Sender<ActionState>,
}

impl Inner {

    fn publish(&mut self) {
        self.state.touch();
        self.updates.send_replace(self.state.clone());
    }
}

#[derive(Default)]
struct Timers {
    delay: Option<JoinHandle<()>>,
    confirmation: Option<JoinHandle<()>>,
}

impl Timers {
    fn abort_confirmation(&mut self) {
        if let Some(handle) = self.confirmation.take() {
            handle.abort();
        }
    }

    fn abort_all(&mut self) {
        if let Some(handle) = self.delay.take() {
            handle.abort();
        }
        self.abort_confirmation();
    }
}

/// Deferred reference id returned by [`ActionMachine::submit`]
///
/// Resolves once the simulated delay elapses, or to
/// [`FlowError::Superseded`] if the attempt is reset or restarted first.
#[derive(Debug)]
pub struct PendingReference {
    receiver: oneshot::Receiver<String>,
}

impl Future for PendingReference {
    type Output = FlowResult<String>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.map_err(|_| FlowError::Superseded))
    }
}

/// State container for one simulated action
pub struct ActionMachine {
    config: ActionConfig,
    inner: Arc<Mutex<Inner>>,
    timers: std::sync::Mutex<Timers>,
    updates: watch::Receiver<ActionState>,
}

impl std::fmt::Debug for ActionMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionMachine")
            .field("config", &self.config)
            .field("state", &*self.updates.borrow())
            .finish()
    }
}

impl ActionMachine {
    /// Create an idle machine
    pub fn new(kind: ActionKind, config: ActionConfig) -> FlowResult<Self> {
        config.validate()?;

        let state = ActionState::new(kind, config.required_confirmations);
        let (sender, receiver) = watch::channel(state.clone());

        Ok(Self {
            config,
            inner: Arc::new(Mutex::new(Inner {
                state,
                epoch: 0,
                updates: sender,
            })),
            timers: std::sync::Mutex::new(Timers::default()),
            updates: receiver,
        })
    }

    /// Create an idle machine with the preset for `kind`
    pub fn for_kind(kind: ActionKind) -> FlowResult<Self> {
        Self::new(kind, ActionConfig::for_kind(kind))
    }

    pub fn kind(&self) -> ActionKind {
        self.updates.borrow().kind
    }

    pub fn config(&self) -> &ActionConfig {
        &self.config
    }

    /// Read-only copy of the latest state
    pub fn snapshot(&self) -> ActionState {
        self.updates.borrow().clone()
    }

    /// Receiver that observes every emitted state
    pub fn subscribe(&self) -> watch::Receiver<ActionState> {
        self.updates.clone()
    }

    fn timers(&self) -> MutexGuard<'_, Timers> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Abort both timers and invalidate any tick already past its await
    fn cancel_timers(&self, inner: &mut Inner) {
        self.timers().abort_all();
        inner.epoch = inner.epoch.wrapping_add(1);
    }

    /// Enter `processing` and schedule the simulated network delay
    ///
    /// Anything already in flight on this machine is cancelled first.
    #[instrument(skip(self, params), fields(kind = %self.kind()))]
    pub async fn submit(&self, params: ActionParams) -> PendingReference {
        let (sender, receiver) = oneshot::channel();
        let mut inner = self.inner.lock().await;

        if inner.state.status.is_in_flight() {
            debug!(status = %inner.state.status, "Restarting in-flight action");
        }
        self.cancel_timers(&mut inner);
        let epoch = inner.epoch;

        inner.state.clear();
        inner.state.params = params;
        inner.state.status = ActionStatus::Processing;
        inner.publish();

        let shared = Arc::clone(&self.inner);
        let delay = self.config.processing_delay;
        let delay_task = tokio::spawn(async move {
            sleep(delay).await;

            let mut inner = shared.lock().await;
            if inner.epoch != epoch {
                return;
            }

            let reference_id = generate_reference_id();
            inner.state.reference_id = Some(reference_id.clone());
            inner.state.status = ActionStatus::Awaiting;
            inner.publish();

            info!(
                kind = %inner.state.kind,
                reference_id = %reference_id,
                "Simulated submission accepted"
            );
            // Caller may have stopped waiting; the state already carries the id.
            let _ = sender.send(reference_id);
        });
        self.timers().delay = Some(delay_task);

        PendingReference { receiver }
    }

    /// Start an action and wait for its reference id
    pub async fn start(&self, params: ActionParams) -> FlowResult<String> {
        self.submit(params).await.await
    }

    /// Move `awaiting -> confirming` and start the confirmation ticker
    #[instrument(skip(self, reference_id), fields(kind = %self.kind()))]
    pub async fn confirm(&self, reference_id: impl Into<String>) -> FlowResult<()> {
        let reference_id = reference_id.into();
        let mut inner = self.inner.lock().await;

        let status = inner.state.status;
        if status != ActionStatus::Awaiting {
            return Err(FlowError::InvalidTransition {
                kind: inner.state.kind,
                status,
                operation: "confirm",
            });
        }

        if inner.state.reference_id.as_deref() != Some(reference_id.as_str()) {
            warn!(
                issued = ?inner.state.reference_id,
                confirmed = %reference_id,
                "Confirming with a reference id different from the one issued"
            );
        }
        self.timers().abort_confirmation();

        inner.state.reference_id = Some(reference_id);
        inner.state.confirmations = 0;

        if !self.config.confirmation_phase {
            inner.state.confirmations = inner.state.required_confirmations;
            inner.state.status = ActionStatus::Completed;
            inner.publish();
            info!("Action completed without confirmation phase");
            return Ok(());
        }

        inner.state.status = ActionStatus::Confirming;
        inner.publish();

        let epoch = inner.epoch;
        let shared = Arc::clone(&self.inner);
        let period = self.config.confirmation_interval;
        let confirmation_task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;

                let mut inner = shared.lock().await;
                if inner.epoch != epoch || inner.state.status != ActionStatus::Confirming {
                    break;
                }

                inner.state.confirmations += 1;
                debug!(
                    kind = %inner.state.kind,
                    confirmations = inner.state.confirmations,
                    required = inner.state.required_confirmations,
                    "Confirmation tick"
                );

                if inner.state.confirmations >= inner.state.required_confirmations {
                    inner.state.status = ActionStatus::Completed;
                    inner.publish();
                    info!(
                        kind = %inner.state.kind,
                        reference_id = ?inner.state.reference_id,
                        "Action completed"
                    );
                    break;
                }
                inner.publish();
            }
        });
        self.timers().confirmation = Some(confirmation_task);

        Ok(())
    }

    /// Force `error` or `idle`, cancelling any running timer
    ///
    /// Forcing `idle` is the same as [`reset`](Self::reset). A forced `error`
    /// stays until the action is reset or started again. Every other status
    /// is only reachable through the timers and is rejected.
    #[instrument(skip(self), fields(kind = %self.kind()))]
    pub async fn update_status(&self, status: ActionStatus) -> FlowResult<()> {
        match status {
            ActionStatus::Idle => {
                self.reset().await;
                Ok(())
            }
            ActionStatus::Error => {
                let mut inner = self.inner.lock().await;
                if inner.state.status == ActionStatus::Error {
                    return Ok(());
                }

                self.cancel_timers(&mut inner);
                let previous = inner.state.status;
                inner.state.status = ActionStatus::Error;
                inner.publish();
                warn!(from = %previous, "Action forced into error");
                Ok(())
            }
            _ => {
                let current = self.updates.borrow().status;
                warn!(requested = %status, %current, "Refusing to force a timer-driven status");
                Err(FlowError::InvalidTransition {
                    kind: self.kind(),
                    status: current,
                    operation: "update_status",
                })
            }
        }
    }

    /// Cancel pending timers and return to `idle`
    #[instrument(skip(self), fields(kind = %self.kind()))]
    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        self.cancel_timers(&mut inner);
        inner.state.clear();
        inner.publish();
        debug!("Action reset");
    }
}

impl Drop for ActionMachine {
    fn drop(&mut self) {
        self.timers
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .abort_all();
    }
}
