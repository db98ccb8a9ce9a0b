//! Effect handlers.
//!
//! Save and clear are awaited by the loop; load and refresh are spawned
//! and return the completion dispatch to feed back into the inbox. Sync
//! storage work runs on the blocking pool.
//!
//! Failures never propagate: they go to the error sink, and completions
//! keep the machine moving toward a settled state.

use std::sync::Arc;

use crate::machine::{Action, Dispatch};
use crate::policy::Credential;
use crate::storage::Storage;

use super::{ErrorSink, RefreshFn};

/// Persists an accepted credential.
pub(super) async fn save_auth_state<C>(
    storage: Arc<dyn Storage<C>>,
    credential: C,
    on_error: ErrorSink,
) where
    C: Credential,
{
    let sink = Arc::clone(&on_error);
    let joined = tokio::task::spawn_blocking(move || {
        if let Err(e) = storage.save(&credential) {
            sink(&e.context("persist credential"));
        }
    })
    .await;
    if let Err(e) = joined {
        on_error(&anyhow::Error::from(e).context("persist credential"));
    }
}

/// Erases the persisted credential.
pub(super) async fn clear_auth_state<C>(storage: Arc<dyn Storage<C>>, on_error: ErrorSink)
where
    C: Credential,
{
    let sink = Arc::clone(&on_error);
    let joined = tokio::task::spawn_blocking(move || {
        if let Err(e) = storage.clear() {
            sink(&e.context("clear persisted credential"));
        }
    })
    .await;
    if let Err(e) = joined {
        on_error(&anyhow::Error::from(e).context("clear persisted credential"));
    }
}

/// Reads the persisted credential and reports what it found.
///
/// An unreadable store is treated as no credential, so startup always
/// settles.
pub(super) async fn load_auth_state<C>(
    storage: Arc<dyn Storage<C>>,
    on_error: ErrorSink,
    epoch: u64,
) -> Option<Dispatch<C>>
where
    C: Credential,
{
    let sink = Arc::clone(&on_error);
    tokio::task::spawn_blocking(move || match storage.load() {
        Ok(Some(credential)) => Some(Dispatch::completion(Action::SignIn(credential), epoch)),
        Ok(None) => Some(Dispatch::completion(Action::NoTokenFound, epoch)),
        Err(e) => {
            sink(&e.context("load persisted credential"));
            Some(Dispatch::completion(Action::NoTokenFound, epoch))
        }
    })
    .await
    .unwrap_or_else(|e| {
        on_error(&anyhow::Error::from(e).context("load persisted credential"));
        Some(Dispatch::completion(Action::NoTokenFound, epoch))
    })
}

/// Runs the caller-supplied refresh exchange.
///
/// A failed or empty exchange signs the session out; the completion is
/// epoch-stamped either way, so a stale failure cannot sign out a newer
/// session.
pub(super) async fn refresh_auth_state<C>(
    refresh: RefreshFn<C>,
    credential: C,
    epoch: u64,
    on_error: ErrorSink,
) -> Option<Dispatch<C>>
where
    C: Credential,
{
    match refresh(credential).await {
        Ok(Some(fresh)) => Some(Dispatch::completion(Action::SignIn(fresh), epoch)),
        Ok(None) => {
            on_error(&anyhow::anyhow!("refresh completed without a credential"));
            Some(Dispatch::completion(Action::SignOut, epoch))
        }
        Err(e) => {
            on_error(&e.context("refresh credential"));
            Some(Dispatch::completion(Action::SignOut, epoch))
        }
    }
}
