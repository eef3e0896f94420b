//! Names of the environment variables envprof reads and writes.

use crate::env::Environment;

/// Overrides the name of the runtime-home variable
pub const HOME_VAR_OVERRIDE: &str = "ENVPROF_HOME_VAR";

/// Variable names used during activation and deactivation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Search path the profile directory is prepended to
    pub path_var: String,
    /// Ambient runtime-home override, saved and cleared on activation
    pub home_var: String,
    /// Profile identity marker (resolved directory)
    pub profile_dir_var: String,
    /// Profile display marker (resolved prompt)
    pub profile_prompt_var: String,
    /// When set, the prompt is left alone
    pub disable_prompt_var: String,
    /// Holds the serialized session record between CLI invocations
    pub session_var: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            path_var: "PATH".to_string(),
            home_var: "RUNTIME_HOME".to_string(),
            profile_dir_var: "ENVPROF_PROFILE_DIR".to_string(),
            profile_prompt_var: "ENVPROF_PROFILE_PROMPT".to_string(),
            disable_prompt_var: "ENVPROF_DISABLE_PROMPT".to_string(),
            session_var: "ENVPROF_SESSION".to_string(),
        }
    }
}

impl Settings {
    /// Defaults, with the runtime-home variable name taken from
    /// `ENVPROF_HOME_VAR` when it is set and non-empty
    pub fn from_env(env: &impl Environment) -> Self {
        let mut settings = Self::default();
        if let Some(name) = env.var(HOME_VAR_OVERRIDE).filter(|n| !n.trim().is_empty()) {
            settings.home_var = name.trim().to_string();
        }
        settings
    }
}
