//! Authentication state machine.
//!
//! All state transitions happen here. The session loop calls
//! [`reduce`] with one dispatch at a time and executes the returned
//! effects; nothing else touches the state.
//!
//! Every applied transition advances the machine's epoch. Load and
//! refresh effect requests are stamped with it, and completions carrying
//! a stamp that no longer matches are dropped: a newer action always
//! wins over a slow effect.

pub mod action;
pub mod effect;
pub mod state;

pub use action::{Action, Dispatch, Origin};
pub use effect::Effect;
pub use state::AuthState;

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::policy::{Credential, Policy};

/// Derives the application user from a credential on successful sign-in.
pub type UserFn<C, U> = Arc<dyn Fn(&C) -> Option<U> + Send + Sync>;

/// The owned authentication state plus the rules that govern it.
pub struct AuthMachine<C: Credential, U = ()> {
    state: AuthState<C, U>,
    epoch: u64,
    policy: Policy<C>,
    derive_user: Option<UserFn<C, U>>,
    refresh_configured: bool,
}

impl<C: Credential, U> AuthMachine<C, U> {
    /// Creates a machine in the `Loading` state.
    ///
    /// `refresh_configured` mirrors whether the runtime holds a refresh
    /// function; without one the refresh branch is never taken.
    pub fn new(
        policy: Policy<C>,
        derive_user: Option<UserFn<C, U>>,
        refresh_configured: bool,
    ) -> Self {
        Self {
            state: AuthState::Loading,
            epoch: 0,
            policy,
            derive_user,
            refresh_configured,
        }
    }

    pub fn state(&self) -> &AuthState<C, U> {
        &self.state
    }

    /// The generation of the most recent applied transition.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }
}

/// The reducer.
///
/// Applies one dispatch, replaces the state, and returns the effects the
/// runtime must execute. Pure apart from the fields of `machine` itself:
/// no I/O, no suspension, no clock reads (`now` is supplied).
pub fn reduce<C: Credential, U>(
    machine: &mut AuthMachine<C, U>,
    dispatch: Dispatch<C>,
    now: DateTime<Utc>,
) -> Vec<Effect<C>> {
    if let Origin::Completion { epoch } = dispatch.origin
        && epoch != machine.epoch
    {
        tracing::debug!(
            stamped = epoch,
            current = machine.epoch,
            "dropping stale effect completion"
        );
        return vec![];
    }

    machine.epoch = machine.epoch.wrapping_add(1);

    match dispatch.action {
        Action::SignIn(credential) => handle_sign_in(machine, credential, now),
        Action::SignOut => {
            machine.state = AuthState::SignedOut;
            vec![Effect::ClearAuthState]
        }
        Action::LoadAuthState => {
            machine.state = AuthState::Loading;
            vec![Effect::LoadAuthState {
                epoch: machine.epoch,
            }]
        }
        Action::NoTokenFound => {
            machine.state = AuthState::SignedOut;
            vec![]
        }
    }
}

/// Sign-in branches, in priority order: refresh, reject, accept.
fn handle_sign_in<C: Credential, U>(
    machine: &mut AuthMachine<C, U>,
    credential: C,
    now: DateTime<Utc>,
) -> Vec<Effect<C>> {
    if machine.refresh_configured && machine.policy.should_refresh(&credential, now) {
        machine.state = AuthState::Loading;
        return vec![Effect::RefreshAuthState {
            credential,
            epoch: machine.epoch,
        }];
    }

    if !machine.policy.is_valid(&credential, now) {
        machine.state = AuthState::SignedOut;
        return vec![Effect::ClearAuthState];
    }

    let user = machine.derive_user.as_ref().and_then(|derive| derive(&credential));
    machine.state = AuthState::SignedIn {
        credential: credential.clone(),
        user,
    };
    vec![Effect::SaveAuthState { credential }]
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Creds {
        name: &'static str,
        expired: bool,
        refreshable: bool,
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    impl Credential for Creds {
        fn expires_at(&self) -> Option<DateTime<Utc>> {
            let offset = if self.expired {
                -Duration::hours(1)
            } else {
                Duration::hours(1)
            };
            Some(now() + offset)
        }

        fn refresh_expires_at(&self) -> Option<DateTime<Utc>> {
            self.refreshable.then(|| now() + Duration::days(7))
        }
    }

    fn fresh() -> Creds {
        Creds {
            name: "fresh",
            expired: false,
            refreshable: true,
        }
    }

    fn expired_refreshable() -> Creds {
        Creds {
            name: "stale",
            expired: true,
            refreshable: true,
        }
    }

    fn expired_dead() -> Creds {
        Creds {
            name: "dead",
            expired: true,
            refreshable: false,
        }
    }

    fn machine() -> AuthMachine<Creds> {
        AuthMachine::new(Policy::new(), None, false)
    }

    fn machine_with_refresh() -> AuthMachine<Creds> {
        AuthMachine::new(Policy::new(), None, true)
    }

    #[test]
    fn test_sign_in_accepts_fresh_credential() {
        let mut m = machine();
        let effects = reduce(&mut m, Dispatch::api(Action::SignIn(fresh())), now());

        assert!(m.state().is_signed_in());
        assert_eq!(m.state().credential(), Some(&fresh()));
        assert_eq!(effects, vec![Effect::SaveAuthState { credential: fresh() }]);
    }

    #[test]
    fn test_sign_in_refreshes_expiring_credential() {
        let mut m = machine_with_refresh();
        let effects = reduce(
            &mut m,
            Dispatch::api(Action::SignIn(expired_refreshable())),
            now(),
        );

        assert!(m.state().is_loading());
        assert_eq!(
            effects,
            vec![Effect::RefreshAuthState {
                credential: expired_refreshable(),
                epoch: m.epoch(),
            }]
        );
    }

    /// Without a refresh function the expiring credential falls through to
    /// the validity check, which is permissive by default.
    #[test]
    fn test_sign_in_without_refresh_fn_never_requests_refresh() {
        let mut m = machine();
        let effects = reduce(
            &mut m,
            Dispatch::api(Action::SignIn(expired_refreshable())),
            now(),
        );

        assert!(m.state().is_signed_in());
        assert_eq!(
            effects,
            vec![Effect::SaveAuthState {
                credential: expired_refreshable(),
            }]
        );
    }

    #[test]
    fn test_sign_in_rejects_invalid_credential() {
        let policy = Policy::new()
            .with_validate(|c: &Creds, at| c.expires_at().is_some_and(|exp| at < exp));
        let mut m: AuthMachine<Creds> = AuthMachine::new(policy, None, false);
        let effects = reduce(&mut m, Dispatch::api(Action::SignIn(expired_dead())), now());

        assert!(m.state().is_signed_out());
        assert_eq!(effects, vec![Effect::ClearAuthState]);
    }

    #[test]
    fn test_refresh_takes_priority_over_validity() {
        let policy = Policy::new().with_validate(|_: &Creds, _| false);
        let mut m: AuthMachine<Creds> = AuthMachine::new(policy, None, true);
        let effects = reduce(
            &mut m,
            Dispatch::api(Action::SignIn(expired_refreshable())),
            now(),
        );

        assert!(m.state().is_loading());
        assert!(matches!(effects[0], Effect::RefreshAuthState { .. }));
    }

    #[test]
    fn test_sign_out_is_idempotent() {
        let mut m = machine();
        reduce(&mut m, Dispatch::api(Action::SignIn(fresh())), now());

        let effects = reduce(&mut m, Dispatch::api(Action::SignOut), now());
        assert!(m.state().is_signed_out());
        assert_eq!(effects, vec![Effect::ClearAuthState]);

        let effects = reduce(&mut m, Dispatch::api(Action::SignOut), now());
        assert!(m.state().is_signed_out());
        assert_eq!(effects, vec![Effect::ClearAuthState]);
    }

    #[test]
    fn test_load_requests_load_effect() {
        let mut m = machine();
        let effects = reduce(&mut m, Dispatch::api(Action::LoadAuthState), now());

        assert!(m.state().is_loading());
        assert_eq!(effects, vec![Effect::LoadAuthState { epoch: m.epoch() }]);
    }

    #[test]
    fn test_no_token_found_settles_signed_out() {
        let mut m = machine();
        reduce(&mut m, Dispatch::api(Action::LoadAuthState), now());
        let epoch = m.epoch();

        let effects = reduce(&mut m, Dispatch::completion(Action::NoTokenFound, epoch), now());
        assert!(m.state().is_signed_out());
        assert!(effects.is_empty());
    }

    #[test]
    fn test_stale_completion_is_dropped() {
        let mut m = machine_with_refresh();
        reduce(
            &mut m,
            Dispatch::api(Action::SignIn(expired_refreshable())),
            now(),
        );
        let refresh_epoch = m.epoch();

        // A manual sign-out supersedes the in-flight refresh.
        reduce(&mut m, Dispatch::api(Action::SignOut), now());
        assert!(m.state().is_signed_out());

        let effects = reduce(
            &mut m,
            Dispatch::completion(Action::SignIn(fresh()), refresh_epoch),
            now(),
        );
        assert!(
            m.state().is_signed_out(),
            "stale completion must not change state"
        );
        assert!(effects.is_empty());
    }

    #[test]
    fn test_current_completion_is_applied() {
        let mut m = machine_with_refresh();
        reduce(
            &mut m,
            Dispatch::api(Action::SignIn(expired_refreshable())),
            now(),
        );
        let refresh_epoch = m.epoch();

        let effects = reduce(
            &mut m,
            Dispatch::completion(Action::SignIn(fresh()), refresh_epoch),
            now(),
        );
        assert!(m.state().is_signed_in());
        assert_eq!(effects, vec![Effect::SaveAuthState { credential: fresh() }]);
    }

    #[test]
    fn test_derive_user_populates_signed_in_state() {
        let derive: UserFn<Creds, String> = Arc::new(|c| Some(c.name.to_string()));
        let mut m: AuthMachine<Creds, String> =
            AuthMachine::new(Policy::new(), Some(derive), false);

        reduce(&mut m, Dispatch::api(Action::SignIn(fresh())), now());
        assert_eq!(m.state().user(), Some(&"fresh".to_string()));
    }

    #[test]
    fn test_epoch_advances_on_every_applied_transition() {
        let mut m = machine();
        assert_eq!(m.epoch(), 0);

        reduce(&mut m, Dispatch::api(Action::LoadAuthState), now());
        assert_eq!(m.epoch(), 1);

        reduce(&mut m, Dispatch::api(Action::SignOut), now());
        assert_eq!(m.epoch(), 2);

        // Dropped dispatches do not advance the epoch.
        reduce(&mut m, Dispatch::completion(Action::NoTokenFound, 1), now());
        assert_eq!(m.epoch(), 2);
    }
}
