//! Actions and the dispatch envelope.

/// State-machine inputs.
///
/// Actions are the only way to move the state, and the session loop
/// processes them strictly one at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum Action<C> {
    /// Present a credential for refresh, rejection, or acceptance.
    SignIn(C),

    /// End the session and erase the persisted credential.
    SignOut,

    /// Begin restoring a persisted credential.
    LoadAuthState,

    /// Storage reported no persisted credential.
    NoTokenFound,
}

/// Where a dispatch came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// A façade call (`sign_in`, `sign_out`, the initial load).
    Api,
    /// The outcome of an effect, stamped with the epoch its request carried.
    Completion { epoch: u64 },
}

/// An action plus its origin: the unit the session loop processes.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch<C> {
    pub action: Action<C>,
    pub origin: Origin,
}

impl<C> Dispatch<C> {
    pub fn api(action: Action<C>) -> Self {
        Self {
            action,
            origin: Origin::Api,
        }
    }

    pub fn completion(action: Action<C>, epoch: u64) -> Self {
        Self {
            action,
            origin: Origin::Completion { epoch },
        }
    }
}
