use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::{
    entities::identity::AuthUser,
    repositories::session::{AuthProvider, ProfileGuard},
    settings::AppConfig,
};

/// Auth provider holding a single, locally configured identity.
#[derive(Debug, Default)]
pub struct StaticAuthProvider {
    user: RwLock<Option<AuthUser>>,
}

impl StaticAuthProvider {
    pub fn new(user: Option<AuthUser>) -> Self {
        StaticAuthProvider {
            user: RwLock::new(user),
        }
    }

    pub fn sign_in(&self, user: AuthUser) {
        *self.user.write() = Some(user);
    }

    pub fn sign_out(&self) {
        *self.user.write() = None;
    }
}

impl From<&AppConfig> for StaticAuthProvider {
    fn from(config: &AppConfig) -> Self {
        StaticAuthProvider::new(Some(AuthUser {
            uid: config.user_id.clone(),
            display_name: config.display_name.clone(),
            email: config.email.clone(),
        }))
    }
}

impl AuthProvider for StaticAuthProvider {
    fn current_user(&self) -> Option<AuthUser> {
        self.user.read().clone()
    }
}

/// Profile gate backed by a flag. When the profile is incomplete,
/// the blocked action is logged in place of a prompt.
#[derive(Debug)]
pub struct StaticProfileGuard {
    complete: AtomicBool,
}

impl StaticProfileGuard {
    pub fn new(complete: bool) -> Self {
        StaticProfileGuard {
            complete: AtomicBool::new(complete),
        }
    }

    pub fn set_complete(&self, complete: bool) {
        self.complete.store(complete, Ordering::SeqCst);
    }
}

impl ProfileGuard for StaticProfileGuard {
    fn is_profile_complete(&self) -> bool {
        self.complete.load(Ordering::SeqCst)
    }

    fn ensure_profile_complete(&self, action_label: &str) -> bool {
        let complete = self.is_profile_complete();
        if !complete {
            tracing::warn!("Complete your profile to {}", action_label);
        }
        complete
    }
}
