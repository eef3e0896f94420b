//! Profile deactivation.
//!
//! Puts back every value the session recorded and forgets it. Variables the
//! session never touched are left exactly as they are, so deactivating with
//! nothing active changes nothing.

use crate::env::Environment;
use crate::error::{ProfileError, Result};
use crate::settings::Settings;
use crate::state::SessionState;

/// What a deactivation put back
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Restoration {
    /// Variables written back (or unset, if they were unset before)
    pub restored: Vec<String>,
    /// Whether the saved prompt renderer was reinstalled
    pub prompt_restored: bool,
    /// Whether a profile was active beforehand
    pub was_active: bool,
}

impl Restoration {
    pub fn is_noop(&self) -> bool {
        self.restored.is_empty() && !self.prompt_restored && !self.was_active
    }
}

/// Restore the pre-activation environment.
///
/// With `non_destructive == false` the `deactivate` command is removed from
/// the session afterwards; only a new activation brings it back.
pub fn deactivate<E: Environment>(
    env: &mut E,
    session: &mut SessionState,
    settings: &Settings,
    non_destructive: bool,
) -> Result<Restoration> {
    if !session.deactivate_available() {
        return Err(ProfileError::DeactivateUnavailable);
    }

    let restoration = restore(env, session, settings);
    if !non_destructive {
        session.unregister_deactivate();
        tracing::debug!("deactivate removed from session");
    }
    Ok(restoration)
}

pub(crate) fn restore<E: Environment>(
    env: &mut E,
    session: &mut SessionState,
    settings: &Settings,
) -> Restoration {
    let was_active = session.is_active();

    let mut restored = Vec::new();
    for (name, prior) in session.take_saved() {
        match prior {
            Some(value) => env.set_var(&name, &value),
            None => env.remove_var(&name),
        }
        tracing::debug!(var = %name, "restored");
        restored.push(name);
    }

    let prompt_restored = match session.take_prior_prompt() {
        Some(renderer) => {
            env.set_prompt(renderer);
            true
        }
        None => false,
    };

    for marker in [&settings.profile_dir_var, &settings.profile_prompt_var] {
        if env.is_set(marker) {
            env.remove_var(marker);
        }
    }
    session.clear_active();

    Restoration {
        restored,
        prompt_restored,
        was_active,
    }
}
