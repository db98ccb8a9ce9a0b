//! Effect request types.
//!
//! Effects are requests returned by the reducer for the runtime to
//! execute. They are emitted synchronously during a transition and run
//! asynchronously after it; their outcomes come back as new dispatches,
//! never as values the reducer inspects.

/// Effects returned by the reducer for the runtime to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect<C> {
    /// Persist the accepted credential.
    SaveAuthState { credential: C },

    /// Erase any persisted credential.
    ClearAuthState,

    /// Read the persisted credential and feed the outcome back in.
    LoadAuthState { epoch: u64 },

    /// Exchange an expiring credential for a fresh one.
    RefreshAuthState { credential: C, epoch: u64 },
}
