//! Credential validity rules.
//!
//! Pure predicates over a credential and an explicit `now`. The session
//! supplies the clock, so every decision is reproducible in tests.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

/// A credential's time-related self-description.
///
/// `None` from `expires_at` means the expiry cannot be determined; the
/// default rules treat that as already expired (fail-safe).
pub trait Credential: Clone + Send + Sync + 'static {
    /// Expiry of the primary (access) component, if it can be determined.
    fn expires_at(&self) -> Option<DateTime<Utc>>;

    /// Expiry of the secondary (refresh) component, if it can be determined.
    fn refresh_expires_at(&self) -> Option<DateTime<Utc>> {
        None
    }

    /// Whether a secondary component exists at all.
    ///
    /// Types whose secondary carries no readable expiry should override
    /// this; the default assumes a secondary exists only when its expiry
    /// is known.
    fn has_refresh(&self) -> bool {
        self.refresh_expires_at().is_some()
    }
}

/// Signature shared by the pluggable validity and refresh-eligibility
/// predicates.
pub type PolicyFn<C> = Arc<dyn Fn(&C, DateTime<Utc>) -> bool + Send + Sync>;

/// Returns true when the primary expiry is unknown or has passed.
///
/// `leeway` shifts the comparison earlier, so a credential counts as
/// expired shortly before it actually is.
pub fn is_expired<C: Credential>(credential: &C, leeway: Duration, now: DateTime<Utc>) -> bool {
    match credential.expires_at() {
        Some(expires) => now >= expires - leeway,
        None => true,
    }
}

/// Returns true when a refresh attempt is worthwhile: a secondary
/// component exists and is not known to be expired.
///
/// An unknown secondary expiry does not disqualify the attempt; the
/// exchange itself is the test.
pub fn refresh_usable<C: Credential>(credential: &C, now: DateTime<Utc>) -> bool {
    credential.has_refresh()
        && credential
            .refresh_expires_at()
            .is_none_or(|expires| now < expires)
}

/// Decides whether a credential is usable, and whether it should be
/// refreshed or discarded instead of accepted.
///
/// Defaults: every credential is valid, and refresh is eligible when the
/// primary component is expired while the secondary is still usable.
#[derive(Clone)]
pub struct Policy<C> {
    leeway: Duration,
    validate: Option<PolicyFn<C>>,
    refresh_eligible: Option<PolicyFn<C>>,
}

impl<C: Credential> Policy<C> {
    pub fn new() -> Self {
        Self {
            leeway: Duration::zero(),
            validate: None,
            refresh_eligible: None,
        }
    }

    /// Treats the primary component as expiring `leeway` early.
    pub fn with_leeway(mut self, leeway: Duration) -> Self {
        self.leeway = leeway;
        self
    }

    /// Replaces the permissive default validity check.
    pub fn with_validate<F>(mut self, f: F) -> Self
    where
        F: Fn(&C, DateTime<Utc>) -> bool + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(f));
        self
    }

    /// Replaces the default refresh-eligibility rule.
    pub fn with_refresh_eligible<F>(mut self, f: F) -> Self
    where
        F: Fn(&C, DateTime<Utc>) -> bool + Send + Sync + 'static,
    {
        self.refresh_eligible = Some(Arc::new(f));
        self
    }

    /// Whether the credential may be accepted for sign-in.
    pub fn is_valid(&self, credential: &C, now: DateTime<Utc>) -> bool {
        self.validate.as_ref().is_none_or(|f| f(credential, now))
    }

    /// Whether the credential should be exchanged before acceptance.
    pub fn should_refresh(&self, credential: &C, now: DateTime<Utc>) -> bool {
        if let Some(f) = &self.refresh_eligible {
            return f(credential, now);
        }
        is_expired(credential, self.leeway, now) && refresh_usable(credential, now)
    }
}

impl<C: Credential> Default for Policy<C> {
    fn default() -> Self {
        Self::new()
    }
}
