//! Authentication state.

/// The authentication phase of a session.
///
/// Exactly one value exists per session, owned by the session loop, and
/// every transition replaces it wholesale. A credential (and derived user)
/// exist only while signed in; the shape makes any other combination
/// unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState<C, U = ()> {
    /// Transitional: the initial load or a refresh is in flight.
    Loading,
    /// A credential was accepted.
    SignedIn { credential: C, user: Option<U> },
    /// No usable credential.
    SignedOut,
}

impl<C, U> AuthState<C, U> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn { .. })
    }

    pub fn is_signed_out(&self) -> bool {
        matches!(self, Self::SignedOut)
    }

    /// Any state other than `Loading`.
    pub fn is_settled(&self) -> bool {
        !self.is_loading()
    }

    /// The held credential, while signed in.
    pub fn credential(&self) -> Option<&C> {
        match self {
            Self::SignedIn { credential, .. } => Some(credential),
            Self::Loading | Self::SignedOut => None,
        }
    }

    /// The derived user, while signed in and when derivation produced one.
    pub fn user(&self) -> Option<&U> {
        match self {
            Self::SignedIn { user, .. } => user.as_ref(),
            Self::Loading | Self::SignedOut => None,
        }
    }
}
