//! Session runtime: owns the machine, runs the dispatch loop, executes
//! effects.
//!
//! This is the effectful boundary: the reducer stays pure and returns
//! effect requests; this module executes them and feeds their outcomes
//! back in as new dispatches.
//!
//! ## Inbox Pattern
//!
//! - Façade calls and effect handlers send `Dispatch`es to `inbox_tx`
//! - One loop task drains `inbox_rx` and steps the machine, so no two
//!   reducer invocations ever overlap
//! - Save and clear are awaited before the transition publishes; an
//!   observed state change implies its persistence attempt has finished
//! - Load and refresh run on spawned tasks and come back through the
//!   inbox as epoch-stamped completions
//!
//! Structure:
//! - `mod.rs`: Core runtime (loop, effect dispatch) and the `AuthSession`
//!   façade
//! - `inbox.rs`: Inbox channel types
//! - `handlers.rs`: Effect handler implementations (I/O)

mod handlers;
mod inbox;

use std::future::Future;
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures_util::future::BoxFuture;
use inbox::{DispatchReceiver, DispatchSender};
use tokio::sync::{mpsc, watch};

use crate::machine::{self, Action, AuthMachine, AuthState, Dispatch, Effect, UserFn};
use crate::policy::{Credential, Policy};
use crate::storage::Storage;

/// Caller-supplied credential refresh exchange.
///
/// Invoked with the currently-held (possibly expired) credential.
/// `Ok(None)` means the exchange completed without producing a
/// credential; both that and `Err` resolve the session to signed-out.
pub type RefreshFn<C> = Arc<dyn Fn(C) -> BoxFuture<'static, Result<Option<C>>> + Send + Sync>;

/// Receives every error the session swallows (storage, refresh).
/// Invoked exactly once per failure.
pub type ErrorSink = Arc<dyn Fn(&anyhow::Error) + Send + Sync>;

/// Supplies the current time to the reducer. Injectable for tests.
pub type ClockFn = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Collaborators for a session, assembled before [`AuthSession::spawn`].
pub struct SessionOptions<C: Credential, U = ()> {
    policy: Policy<C>,
    storage: Arc<dyn Storage<C>>,
    refresh: Option<RefreshFn<C>>,
    derive_user: Option<UserFn<C, U>>,
    on_error: Option<ErrorSink>,
    clock: Option<ClockFn>,
}

impl<C: Credential, U> SessionOptions<C, U> {
    pub fn new(storage: Arc<dyn Storage<C>>) -> Self {
        Self {
            policy: Policy::new(),
            storage,
            refresh: None,
            derive_user: None,
            on_error: None,
            clock: None,
        }
    }

    pub fn with_policy(mut self, policy: Policy<C>) -> Self {
        self.policy = policy;
        self
    }

    /// Enables the refresh branch of the sign-in pipeline.
    pub fn with_refresh(mut self, refresh: RefreshFn<C>) -> Self {
        self.refresh = Some(refresh);
        self
    }

    /// Derives an application user from each accepted credential.
    pub fn with_user<F>(mut self, f: F) -> Self
    where
        F: Fn(&C) -> Option<U> + Send + Sync + 'static,
    {
        self.derive_user = Some(Arc::new(f));
        self
    }

    /// Replaces the default error sink (a `tracing` warning).
    pub fn with_error_sink<F>(mut self, f: F) -> Self
    where
        F: Fn(&anyhow::Error) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Replaces the wall clock. Tests pin this to a fixed instant.
    pub fn with_clock<F>(mut self, f: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Some(Arc::new(f));
        self
    }
}

fn default_error_sink() -> ErrorSink {
    Arc::new(|e: &anyhow::Error| tracing::warn!("auth effect failed: {e:#}"))
}

/// The loop half of a session: owns the machine and executes effects.
struct SessionRuntime<C: Credential, U> {
    machine: AuthMachine<C, U>,
    inbox_tx: DispatchSender<C>,
    inbox_rx: DispatchReceiver<C>,
    state_tx: watch::Sender<AuthState<C, U>>,
    storage: Arc<dyn Storage<C>>,
    refresh: Option<RefreshFn<C>>,
    on_error: ErrorSink,
    clock: ClockFn,
}

impl<C: Credential, U: Clone + Send + Sync + 'static> SessionRuntime<C, U> {
    /// Runs until every session handle has been dropped.
    ///
    /// In-flight effects run to completion; outcomes arriving after the
    /// loop ends are discarded with the channel.
    async fn run(mut self) {
        loop {
            tokio::select! {
                maybe = self.inbox_rx.recv() => match maybe {
                    Some(dispatch) => self.step(dispatch).await,
                    None => break,
                },
                () = self.state_tx.closed() => break,
            }
        }
    }

    async fn step(&mut self, dispatch: Dispatch<C>) {
        let now = (self.clock)();
        let before = self.machine.epoch();
        let effects = machine::reduce(&mut self.machine, dispatch, now);

        for effect in effects {
            self.execute_effect(effect).await;
        }

        // The epoch moves on every applied transition; dropped dispatches
        // publish nothing.
        if self.machine.epoch() != before {
            self.state_tx.send_replace(self.machine.state().clone());
        }
    }

    /// Spawns an async effect handler, feeding its completion dispatch
    /// (if any) back into the inbox.
    fn spawn_effect<F, Fut>(&self, f: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Option<Dispatch<C>>> + Send + 'static,
    {
        let tx = self.inbox_tx.clone();
        tokio::spawn(async move {
            if let Some(dispatch) = f().await {
                let _ = tx.send(dispatch);
            }
        });
    }

    /// Executes a single effect.
    ///
    /// Save and clear are awaited here so the write attempt lands before
    /// the transition that requested it becomes visible. Load and refresh
    /// are spawned; their outcomes return through the inbox.
    async fn execute_effect(&self, effect: Effect<C>) {
        match effect {
            Effect::SaveAuthState { credential } => {
                handlers::save_auth_state(
                    Arc::clone(&self.storage),
                    credential,
                    Arc::clone(&self.on_error),
                )
                .await;
            }
            Effect::ClearAuthState => {
                handlers::clear_auth_state(Arc::clone(&self.storage), Arc::clone(&self.on_error))
                    .await;
            }
            Effect::LoadAuthState { epoch } => {
                let storage = Arc::clone(&self.storage);
                let on_error = Arc::clone(&self.on_error);
                self.spawn_effect(move || handlers::load_auth_state(storage, on_error, epoch));
            }
            Effect::RefreshAuthState { credential, epoch } => {
                // The reducer only requests refresh when a refresh fn is
                // configured.
                let Some(refresh) = self.refresh.clone() else {
                    return;
                };
                let on_error = Arc::clone(&self.on_error);
                self.spawn_effect(move || {
                    handlers::refresh_auth_state(refresh, credential, epoch, on_error)
                });
            }
        }
    }
}

/// Cloneable handle to a running authentication session.
///
/// All handles observe the same state; dropping the last one ends the
/// session loop.
pub struct AuthSession<C: Credential, U = ()> {
    tx: DispatchSender<C>,
    state_rx: watch::Receiver<AuthState<C, U>>,
}

impl<C: Credential, U> Clone for AuthSession<C, U> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            state_rx: self.state_rx.clone(),
        }
    }
}

impl<C: Credential, U: Clone + Send + Sync + 'static> AuthSession<C, U> {
    /// Spawns the session loop and triggers the initial credential load.
    ///
    /// The load happens exactly once per session, before any caller
    /// dispatch is processed.
    pub fn spawn(options: SessionOptions<C, U>) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(AuthState::Loading);

        let machine = AuthMachine::new(
            options.policy,
            options.derive_user,
            options.refresh.is_some(),
        );
        let runtime = SessionRuntime {
            machine,
            inbox_tx: inbox_tx.clone(),
            inbox_rx,
            state_tx,
            storage: options.storage,
            refresh: options.refresh,
            on_error: options.on_error.unwrap_or_else(default_error_sink),
            clock: options.clock.unwrap_or_else(|| Arc::new(Utc::now)),
        };

        let _ = inbox_tx.send(Dispatch::api(Action::LoadAuthState));
        tokio::spawn(runtime.run());

        Self {
            tx: inbox_tx,
            state_rx,
        }
    }

    /// Presents a credential for sign-in.
    ///
    /// The reducer decides whether it is refreshed, rejected, or accepted;
    /// observe the outcome through [`AuthSession::settled`].
    pub fn sign_in(&self, credential: C) {
        let _ = self.tx.send(Dispatch::api(Action::SignIn(credential)));
    }

    /// Ends the session and erases the persisted credential. Idempotent.
    pub fn sign_out(&self) {
        let _ = self.tx.send(Dispatch::api(Action::SignOut));
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> AuthState<C, U> {
        self.state_rx.borrow().clone()
    }

    pub fn is_signed_in(&self) -> bool {
        self.state_rx.borrow().is_signed_in()
    }

    pub fn is_signed_out(&self) -> bool {
        self.state_rx.borrow().is_signed_out()
    }

    pub fn is_loading(&self) -> bool {
        self.state_rx.borrow().is_loading()
    }

    /// Returns the current credential, while signed in.
    pub fn credential(&self) -> Option<C> {
        self.state_rx.borrow().credential().cloned()
    }

    /// Waits for the next applied transition and returns the new state.
    pub async fn changed(&mut self) -> AuthState<C, U> {
        // An error means the loop ended; the last published state stands.
        let _ = self.state_rx.changed().await;
        self.state_rx.borrow_and_update().clone()
    }

    /// Waits until the state leaves `Loading` and returns it.
    pub async fn settled(&mut self) -> AuthState<C, U> {
        loop {
            let state = self.state_rx.borrow_and_update().clone();
            if state.is_settled() {
                return state;
            }
            if self.state_rx.changed().await.is_err() {
                return self.state_rx.borrow().clone();
            }
        }
    }
}
