//! Profile activation.
//!
//! Activation layers one profile's overrides onto the session environment:
//! identity markers, a decorated prompt, no runtime-home override, and the
//! profile directory at the front of the search path. Every value it replaces
//! is saved in the [`SessionState`] first.

use chrono::Utc;
use std::path::{Path, PathBuf, is_separator};

use crate::config::{ConfigMap, read_config};
use crate::deactivate::{Restoration, restore};
use crate::env::Environment;
use crate::error::Warning;
use crate::prompt::{ParenPrefix, PromptProvider};
use crate::settings::Settings;
use crate::state::SessionState;

/// Native separator of path-list variables
pub const PATH_LIST_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// Config key that overrides the displayed prompt
pub const PROMPT_KEY: &str = "prompt";

/// Outcome of an activation
#[derive(Debug, Clone)]
pub struct Activation {
    /// Resolved profile directory
    pub dir: String,
    /// Resolved display prompt
    pub prompt: String,
    /// Contents of the profile's config file
    pub config: ConfigMap,
    /// Whether the prompt renderer was replaced
    pub decorated: bool,
    /// What the implicit pre-clear put back
    pub cleared: Restoration,
    pub warnings: Vec<Warning>,
}

/// Applies profiles to a session
#[derive(Debug)]
pub struct Activator {
    install_dir: Option<PathBuf>,
    settings: Settings,
    provider: Box<dyn PromptProvider>,
}

impl Activator {
    /// `install_dir` is where the activator itself is installed; without an
    /// explicit directory, the profile is its parent.
    pub fn new(install_dir: Option<PathBuf>, settings: Settings) -> Self {
        Self {
            install_dir,
            settings,
            provider: Box::new(ParenPrefix::default()),
        }
    }

    pub fn with_provider(mut self, provider: impl PromptProvider + 'static) -> Self {
        self.provider = Box::new(provider);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Activate a profile.
    ///
    /// Any profile already active is cleared first, so repeated calls never
    /// stack overrides. Problems are returned as warnings; activation always
    /// completes.
    pub fn activate<E: Environment>(
        &self,
        env: &mut E,
        session: &mut SessionState,
        explicit_dir: Option<&str>,
        explicit_prompt: Option<&str>,
    ) -> Activation {
        let mut warnings = Vec::new();

        let dir = self.resolve_dir(explicit_dir, &mut warnings);
        if !Path::new(&dir).is_dir() {
            warnings.push(Warning::DirectoryNotFound(PathBuf::from(&dir)));
        }

        let config = read_config(Path::new(&dir));
        let prompt = resolve_prompt(explicit_prompt, &config, &dir);
        tracing::debug!(dir = %dir, prompt = %prompt, "activating profile");

        session.register_deactivate();
        let cleared = restore(env, session, &self.settings);

        let settings = &self.settings;
        env.set_var(&settings.profile_dir_var, &dir);
        env.set_var(&settings.profile_prompt_var, &prompt);

        let decorated = !env.is_set(&settings.disable_prompt_var);
        if decorated {
            let previous = env.prompt();
            session.save_prompt(previous.clone(), &prompt);
            env.set_prompt(self.provider.compose(&prompt, previous));
        } else {
            tracing::debug!(var = %settings.disable_prompt_var, "prompt decoration disabled");
        }

        // A value that cannot be read cannot be restored either, so it is
        // left in place rather than overwritten.
        if env.is_unreadable(&settings.home_var) {
            warnings.push(Warning::UnreadableVariable(settings.home_var.clone()));
        } else if let Some(home) = env.var(&settings.home_var) {
            session.save_var(&settings.home_var, Some(home));
            env.remove_var(&settings.home_var);
            tracing::debug!(var = %settings.home_var, "cleared runtime home override");
        }

        if env.is_unreadable(&settings.path_var) {
            warnings.push(Warning::UnreadableVariable(settings.path_var.clone()));
        } else {
            let old_path = env.var(&settings.path_var);
            let new_path = match old_path.as_deref() {
                Some(path) if !path.is_empty() => format!("{dir}{PATH_LIST_SEPARATOR}{path}"),
                _ => dir.clone(),
            };
            session.save_var(&settings.path_var, old_path);
            env.set_var(&settings.path_var, &new_path);
        }

        session.mark_active(Utc::now());
        for warning in &warnings {
            tracing::debug!("{warning}");
        }

        Activation {
            dir,
            prompt,
            config,
            decorated,
            cleared,
            warnings,
        }
    }

    fn resolve_dir(&self, explicit_dir: Option<&str>, warnings: &mut Vec<Warning>) -> String {
        if let Some(dir) = explicit_dir.filter(|d| !d.is_empty()) {
            return trim_trailing_separators(dir).to_string();
        }

        let Some(install_dir) = &self.install_dir else {
            warnings.push(Warning::NoInstallLocation);
            return ".".to_string();
        };

        let install = install_dir.to_string_lossy();
        let install = trim_trailing_separators(&install);
        match Path::new(install).parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => trim_trailing_separators(&parent.to_string_lossy()).to_string(),
            None => {
                warnings.push(Warning::NoParentDirectory(PathBuf::from(install)));
                install.to_string()
            }
        }
    }
}

/// Explicit argument, then config `prompt`, then the directory's leaf name
fn resolve_prompt(explicit: Option<&str>, config: &ConfigMap, dir: &str) -> String {
    if let Some(prompt) = explicit.filter(|p| !p.is_empty()) {
        return prompt.to_string();
    }
    if let Some(prompt) = config.get(PROMPT_KEY) {
        return prompt.clone();
    }
    leaf_name(dir)
}

/// Final path segment, or the whole path when it has none (e.g. `/`)
pub fn leaf_name(dir: &str) -> String {
    Path::new(dir)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| dir.to_string())
}

/// Drop trailing separators, keeping a bare root intact
pub fn trim_trailing_separators(path: &str) -> &str {
    let trimmed = path.trim_end_matches(is_separator);
    if trimmed.is_empty() && !path.is_empty() {
        &path[..1]
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deactivate::deactivate;
    use crate::env::MapEnv;
    use crate::prompt::{SharedRenderer, StaticPrompt};
    use crate::test_utils::{base_env, setup_profile_dir};
    use std::rc::Rc;
    use tempfile::TempDir;

    fn activator() -> Activator {
        Activator::new(None, Settings::default())
    }

    fn path_entries(env: &MapEnv) -> Vec<String> {
        env.var("PATH")
            .unwrap_or_default()
            .split(PATH_LIST_SEPARATOR)
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_activate_sets_markers_and_path() {
        let temp_dir = TempDir::new().unwrap();
        let dir = setup_profile_dir(&temp_dir, "myenv", None);
        let mut env = base_env();
        let mut session = SessionState::new();

        let activation = activator().activate(&mut env, &mut session, Some(&dir), None);

        assert!(activation.warnings.is_empty());
        assert_eq!(activation.prompt, "myenv");
        assert_eq!(env.var("ENVPROF_PROFILE_DIR").as_deref(), Some(dir.as_str()));
        assert_eq!(env.var("ENVPROF_PROFILE_PROMPT").as_deref(), Some("myenv"));
        assert_eq!(path_entries(&env)[0], dir);
        assert!(session.is_active());
        assert_eq!(session.prompt_prefix(), Some("myenv"));
    }

    #[test]
    fn test_activate_then_deactivate_restores_everything() {
        let temp_dir = TempDir::new().unwrap();
        let dir = setup_profile_dir(&temp_dir, "myenv", Some("prompt = \"custom\"\n"));
        let original: SharedRenderer = Rc::new(StaticPrompt::new("$ "));
        let mut env = base_env().with_prompt(Rc::clone(&original));
        env.set_var("RUNTIME_HOME", "/opt/runtime");
        let before = env.vars().clone();
        let mut session = SessionState::new();
        let settings = Settings::default();

        activator().activate(&mut env, &mut session, Some(&dir), None);
        assert!(!env.is_set("RUNTIME_HOME"));
        assert_eq!(env.prompt().render(), "(custom) $ ");

        deactivate(&mut env, &mut session, &settings, false).unwrap();
        assert_eq!(env.vars(), &before);
        assert!(Rc::ptr_eq(&env.prompt(), &original));
        assert!(!env.is_set("ENVPROF_PROFILE_DIR"));
        assert!(!env.is_set("ENVPROF_PROFILE_PROMPT"));
        assert!(!session.is_active());
    }

    #[test]
    fn test_restores_unset_and_empty_home_distinctly() {
        let settings = Settings::default();

        let mut unset_env = base_env();
        let mut session = SessionState::new();
        activator().activate(&mut unset_env, &mut session, Some("/opt/a"), None);
        assert_eq!(session.saved("RUNTIME_HOME"), None);
        deactivate(&mut unset_env, &mut session, &settings, true).unwrap();
        assert!(!unset_env.is_set("RUNTIME_HOME"));

        let mut empty_env = base_env();
        empty_env.set_var("RUNTIME_HOME", "");
        let mut session = SessionState::new();
        activator().activate(&mut empty_env, &mut session, Some("/opt/a"), None);
        assert_eq!(session.saved("RUNTIME_HOME"), Some(Some("")));
        deactivate(&mut empty_env, &mut session, &settings, true).unwrap();
        assert_eq!(empty_env.var("RUNTIME_HOME").as_deref(), Some(""));
    }

    #[test]
    fn test_activate_twice_keeps_single_path_entry() {
        let temp_dir = TempDir::new().unwrap();
        let dir = setup_profile_dir(&temp_dir, "myenv", None);
        let mut env = base_env();
        let mut session = SessionState::new();
        let activator = activator();

        activator.activate(&mut env, &mut session, Some(&dir), None);
        let second = activator.activate(&mut env, &mut session, Some(&dir), None);

        let entries = path_entries(&env);
        assert_eq!(entries.iter().filter(|e| **e == dir).count(), 1);
        assert_eq!(entries[1..], ["/usr/local/bin", "/usr/bin"]);
        assert!(second.cleared.was_active);
        assert_eq!(env.prompt().render(), "(myenv) ");
    }

    #[test]
    fn test_switching_profiles_restores_first_prompt() {
        let original: SharedRenderer = Rc::new(StaticPrompt::new("> "));
        let mut env = base_env().with_prompt(Rc::clone(&original));
        let mut session = SessionState::new();
        let activator = activator();

        activator.activate(&mut env, &mut session, Some("/opt/first"), None);
        activator.activate(&mut env, &mut session, Some("/opt/second"), None);
        assert_eq!(env.prompt().render(), "(second) > ");

        deactivate(&mut env, &mut session, activator.settings(), true).unwrap();
        assert!(Rc::ptr_eq(&env.prompt(), &original));
        assert_eq!(env.var("PATH").as_deref(), Some("/usr/local/bin:/usr/bin"));
    }

    #[test]
    fn test_prompt_priority() {
        let temp_dir = TempDir::new().unwrap();
        let dir = setup_profile_dir(&temp_dir, "myenv", Some("prompt = \"custom\"\n"));
        let activator = activator();

        let mut session = SessionState::new();
        let activation =
            activator.activate(&mut base_env(), &mut session, Some(&dir), Some("cli-prompt"));
        assert_eq!(activation.prompt, "cli-prompt");

        let mut session = SessionState::new();
        let activation = activator.activate(&mut base_env(), &mut session, Some(&dir), None);
        assert_eq!(activation.prompt, "custom");

        std::fs::remove_file(Path::new(&dir).join(crate::config::CONFIG_FILE_NAME)).unwrap();
        let mut session = SessionState::new();
        let activation = activator.activate(&mut base_env(), &mut session, Some(&dir), None);
        assert_eq!(activation.prompt, "myenv");
    }

    #[test]
    fn test_disable_prompt_leaves_renderer() {
        let original: SharedRenderer = Rc::new(StaticPrompt::new("$ "));
        let mut env = base_env().with_prompt(Rc::clone(&original));
        env.set_var("ENVPROF_DISABLE_PROMPT", "1");
        let mut session = SessionState::new();

        let activation = activator().activate(&mut env, &mut session, Some("/opt/a"), None);
        assert!(!activation.decorated);
        assert!(Rc::ptr_eq(&env.prompt(), &original));
        assert!(!session.has_prior_prompt());
        assert_eq!(session.prompt_prefix(), None);
    }

    #[test]
    fn test_custom_provider_is_used() {
        let mut env = base_env().with_prompt(Rc::new(StaticPrompt::new("$ ")));
        let mut session = SessionState::new();
        let activator = activator().with_provider(ParenPrefix::new(true));

        activator.activate(&mut env, &mut session, Some("/opt/work"), None);
        let rendered = env.prompt().render();
        assert!(rendered.contains("\u{1b}["));
        assert!(rendered.ends_with(" $ "));
    }

    #[test]
    fn test_activate_reregisters_deactivate() {
        let mut env = base_env();
        let mut session = SessionState::new();
        let activator = activator();

        activator.activate(&mut env, &mut session, Some("/opt/a"), None);
        deactivate(&mut env, &mut session, activator.settings(), false).unwrap();
        assert!(!session.deactivate_available());

        activator.activate(&mut env, &mut session, Some("/opt/a"), None);
        assert!(session.deactivate_available());
    }

    #[test]
    fn test_missing_directory_warns_but_activates() {
        let mut env = base_env();
        let mut session = SessionState::new();

        let activation =
            activator().activate(&mut env, &mut session, Some("/nonexistent/envprof/x"), None);
        assert!(matches!(
            activation.warnings.as_slice(),
            [Warning::DirectoryNotFound(_)]
        ));
        assert!(session.is_active());
        assert_eq!(activation.prompt, "x");
    }

    #[test]
    fn test_dir_derived_from_install_location() {
        let temp_dir = TempDir::new().unwrap();
        let dir = setup_profile_dir(&temp_dir, "venv", None);
        let install = PathBuf::from(format!("{dir}/bin/"));
        let activator = Activator::new(Some(install), Settings::default());

        let activation = activator.activate(&mut base_env(), &mut SessionState::new(), None, None);
        assert_eq!(activation.dir, dir);
        assert_eq!(activation.prompt, "venv");
    }

    #[test]
    fn test_empty_path_becomes_dir() {
        let mut env = MapEnv::new();
        let mut session = SessionState::new();
        activator().activate(&mut env, &mut session, Some("/opt/a"), None);
        assert_eq!(env.var("PATH").as_deref(), Some("/opt/a"));
        assert_eq!(session.saved("PATH"), Some(None));
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_path_left_untouched() {
        use std::ffi::OsString;
        use std::os::unix::ffi::OsStringExt;

        let mut env = MapEnv::from_os_vars([
            (OsString::from("PATH"), OsString::from_vec(b"/usr/bin:/opt/caf\xe9/bin".to_vec())),
            (OsString::from("RUNTIME_HOME"), OsString::from_vec(b"/opt/\xff".to_vec())),
        ]);
        let mut session = SessionState::new();
        let activation = activator().activate(&mut env, &mut session, Some("/opt/a"), None);

        assert!(activation.warnings.contains(&Warning::UnreadableVariable("PATH".to_string())));
        assert!(
            activation
                .warnings
                .contains(&Warning::UnreadableVariable("RUNTIME_HOME".to_string()))
        );
        assert!(env.is_unreadable("PATH"));
        assert!(env.is_unreadable("RUNTIME_HOME"));
        assert_eq!(session.saved("PATH"), None);
        assert_eq!(session.saved("RUNTIME_HOME"), None);
        assert!(session.is_active());
    }

    #[test]
    fn test_case_insensitive_path_prepended() {
        let mut env = MapEnv::from_vars([("Path", "C:\\Windows")]).ignore_case(true);
        let mut session = SessionState::new();
        activator().activate(&mut env, &mut session, Some("C:\\venv"), None);

        assert_eq!(
            env.vars().get("Path").map(String::as_str),
            Some(format!("C:\\venv{PATH_LIST_SEPARATOR}C:\\Windows").as_str())
        );
        assert!(!env.vars().contains_key("PATH"));
        assert_eq!(session.saved("PATH"), Some(Some("C:\\Windows")));
    }

    #[test]
    fn test_trim_trailing_separators() {
        assert_eq!(trim_trailing_separators("/opt/env///"), "/opt/env");
        assert_eq!(trim_trailing_separators("/opt/env"), "/opt/env");
        assert_eq!(trim_trailing_separators("/"), "/");
    }

    #[test]
    fn test_leaf_name() {
        assert_eq!(leaf_name("/opt/envs/myenv"), "myenv");
        assert_eq!(leaf_name("/"), "/");
    }
}
