use crate::entities::identity::AuthUser;

pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<AuthUser>;
}

/// Profile-completeness precondition for scan features.
pub trait ProfileGuard: Send + Sync {
    fn is_profile_complete(&self) -> bool;

    /// Returns `false` (and surfaces its own prompt) when the profile is incomplete.
    fn ensure_profile_complete(&self, action_label: &str) -> bool;
}
