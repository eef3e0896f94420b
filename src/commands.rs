//! High-level command orchestration for the CLI.
//!
//! This module contains the handler functions for each CLI command (`activate`,
//! `deactivate`, `status`, `config`). It serves as the coordination layer,
//! interacting with:
//! - `crate::activate` / `crate::deactivate` for the profile transition.
//! - `crate::state` for the session carried in the shell environment.
//! - `crate::shell` for turning a transition into a script.
//! - `crate::ui` for user-facing output.
//!
//! The script builders take the environment as a [`MapEnv`] so they can be
//! exercised without touching the real process environment.

use anstyle::AnsiColor;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::activate::{Activation, Activator};
use crate::config::{CONFIG_FILE_NAME, read_config};
use crate::deactivate::{Restoration, deactivate};
use crate::env::{Environment, MapEnv};
use crate::paths::Paths;
use crate::settings::Settings;
use crate::shell::{Script, Shell, env_changes};
use crate::state::{SessionRecord, SessionState};
use crate::ui::Ui;

/// Print the activation script for the current shell
pub fn activate(
    paths: &Paths,
    ui: &Ui,
    shell: Option<Shell>,
    dir: Option<&str>,
    prompt: Option<&str>,
) -> Result<()> {
    let mut env = MapEnv::from_process();
    let shell = shell.unwrap_or_else(|| Shell::detect(&env));

    let (script, activation) = activation_script(&mut env, paths, ui, shell, dir, prompt)?;
    for warning in &activation.warnings {
        ui.warn(warning.to_string());
    }

    ui.script(script);
    Ok(())
}

/// Print the deactivation script for the current shell
pub fn deactivate_profile(
    ui: &Ui,
    shell: Option<Shell>,
    non_destructive: bool,
) -> Result<()> {
    let mut env = MapEnv::from_process();
    let shell = shell.unwrap_or_else(|| Shell::detect(&env));

    let (script, restoration) = deactivation_script(&mut env, ui, shell, non_destructive)?;
    if !restoration.was_active {
        ui.info("No profile is active");
    }

    ui.script(script);
    Ok(())
}

/// Activate on `env` and describe the change as a script
pub fn activation_script(
    env: &mut MapEnv,
    paths: &Paths,
    ui: &Ui,
    shell: Shell,
    dir: Option<&str>,
    prompt: Option<&str>,
) -> Result<(Script, Activation)> {
    let settings = Settings::from_env(&*env);
    let before = env.clone();
    let mut session = load_session(env, &settings, ui);

    let activator = Activator::new(paths.install_dir.clone(), settings.clone());
    let activation = activator.activate(env, &mut session, dir, prompt);
    SessionRecord::write(&session, env, &settings.session_var)
        .context("Failed to store session")?;

    let mut script = Script::new(shell);
    if activation.cleared.prompt_restored {
        script.restore_prompt();
    }
    script.apply(&env_changes(&before, env), &settings.path_var);
    if activation.decorated {
        script.decorate_prompt(&activation.prompt);
    }
    script.define_deactivate(&paths.exe_command());

    Ok((script, activation))
}

/// Deactivate on `env` and describe the change as a script
pub fn deactivation_script(
    env: &mut MapEnv,
    ui: &Ui,
    shell: Shell,
    non_destructive: bool,
) -> Result<(Script, Restoration)> {
    let settings = Settings::from_env(&*env);
    let before = env.clone();
    let mut session = load_session(env, &settings, ui);

    let restoration = deactivate(env, &mut session, &settings, non_destructive)?;
    SessionRecord::write(&session, env, &settings.session_var)
        .context("Failed to store session")?;

    let mut script = Script::new(shell);
    if restoration.prompt_restored {
        script.restore_prompt();
    }
    script.apply(&env_changes(&before, env), &settings.path_var);
    if !non_destructive {
        script.remove_deactivate();
    }

    Ok((script, restoration))
}

/// Load the session carried in the environment.
///
/// A corrupt record must not block activation: it is reported and a fresh
/// session is used instead.
fn load_session(env: &MapEnv, settings: &Settings, ui: &Ui) -> SessionState {
    match SessionRecord::read(env, &settings.session_var) {
        Ok(Some(record)) => SessionState::from_record(record, env.prompt()),
        Ok(None) => SessionState::new(),
        Err(e) => {
            ui.warn(format!("Ignoring {}: {}", settings.session_var, e));
            SessionState::new()
        }
    }
}

/// Show the active profile and what it overrides
pub fn status(ui: &Ui) -> Result<()> {
    let env = MapEnv::from_process();
    let settings = Settings::from_env(&env);
    let session = load_session(&env, &settings, ui);

    ui.section("Profile Status");
    ui.newline();

    let mut table = ui.simple_table();
    match env.var(&settings.profile_dir_var) {
        Some(dir) => {
            table.add_row(vec![ui.cell("Profile:"), ui.header_cell(dir)]);
            if let Some(prompt) = env.var(&settings.profile_prompt_var) {
                table.add_row(vec![ui.cell("Prompt:"), ui.cell(prompt)]);
            }
            if let Some(at) = session.activated_at() {
                table.add_row(vec![
                    ui.cell("Active since:"),
                    ui.cell(at.format("%Y-%m-%d %H:%M:%S").to_string()),
                ]);
            }
        }
        None => {
            table.add_row(vec![ui.cell("Profile:"), ui.cell("(none)")]);
        }
    }

    let deactivate_cell = if session.deactivate_available() {
        ui.colored_cell("available", AnsiColor::Green)
    } else {
        ui.colored_cell("removed", AnsiColor::Yellow)
    };
    table.add_row(vec![ui.cell("Deactivate:"), deactivate_cell]);
    ui.println(table.to_string());

    if session.saved_vars().next().is_some() {
        ui.newline();
        ui.section("Saved Variables");
        ui.newline();

        let mut saved = ui.simple_table();
        saved.set_header(vec![ui.header_cell("Variable"), ui.header_cell("Prior value")]);
        for (name, prior) in session.saved_vars() {
            let prior_cell = match prior {
                Some(value) => ui.cell(value),
                None => ui.colored_cell("(unset)", AnsiColor::BrightBlack),
            };
            saved.add_row(vec![ui.cell(name), prior_cell]);
        }
        ui.println(saved.to_string());
    }

    Ok(())
}

/// Show the parsed configuration of a profile directory
pub fn show_config(paths: &Paths, ui: &Ui, dir: Option<&str>) -> Result<()> {
    let dir = match dir {
        Some(dir) => PathBuf::from(dir),
        None => paths
            .install_dir
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .context("No directory given and the install location is unknown")?,
    };

    let file = dir.join(CONFIG_FILE_NAME);
    if !file.is_file() {
        ui.warn(format!("No {} in {}", CONFIG_FILE_NAME, dir.display()));
        return Ok(());
    }

    let config = read_config(&dir);
    ui.section(format!("Config: {}", file.display()));
    ui.newline();

    if config.is_empty() {
        ui.println("(no valid entries)");
        return Ok(());
    }

    let mut table = ui.simple_table();
    table.set_header(vec![ui.header_cell("Key"), ui.header_cell("Value")]);
    for (key, value) in &config {
        table.add_row(vec![ui.cell(key), ui.cell(value)]);
    }
    ui.println(table.to_string());

    Ok(())
}
