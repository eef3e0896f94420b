//! Shell integration.
//!
//! A child process cannot change its parent shell's environment. envprof
//! computes a transition in memory and prints it as a script that the shell
//! evaluates:
//!
//! ```text
//! eval "$(envprof activate ./venv)"              # bash, zsh
//! envprof activate ./venv --shell fish | source  # fish
//! envprof activate ./venv --shell powershell | Out-String | Invoke-Expression
//! ```

use std::fmt;
use std::str::FromStr;

use crate::activate::PATH_LIST_SEPARATOR;
use crate::env::{Environment, MapEnv};

/// Shells envprof can write scripts for
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shell {
    #[default]
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

impl FromStr for Shell {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "bash" | "sh" => Ok(Self::Bash),
            "zsh" => Ok(Self::Zsh),
            "fish" => Ok(Self::Fish),
            "powershell" | "pwsh" => Ok(Self::PowerShell),
            _ => Err(format!("unsupported shell: {}", s)),
        }
    }
}

impl fmt::Display for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bash => "bash",
            Self::Zsh => "zsh",
            Self::Fish => "fish",
            Self::PowerShell => "powershell",
        })
    }
}

impl Shell {
    /// Guess the shell from `$SHELL`, falling back to PowerShell when only
    /// `PSModulePath` is present, then to bash
    pub fn detect(env: &impl Environment) -> Self {
        if let Some(shell) = env.var("SHELL") {
            let name = shell.rsplit(['/', '\\']).next().unwrap_or_default();
            let name = name.trim_end_matches(".exe");
            if let Ok(shell) = name.parse() {
                return shell;
            }
        } else if env.is_set("PSModulePath") {
            return Self::PowerShell;
        }
        Self::Bash
    }

    /// Quote `value` as a single literal word
    pub fn quote(self, value: &str) -> String {
        match self {
            Self::Bash | Self::Zsh => format!("'{}'", value.replace('\'', r"'\''")),
            Self::Fish => format!("'{}'", value.replace('\\', r"\\").replace('\'', r"\'")),
            Self::PowerShell => format!("'{}'", value.replace('\'', "''")),
        }
    }

    /// fish stores the search path as a list, one element per entry. Empty
    /// entries are kept since they mean the current directory.
    fn set_var(self, name: &str, value: &str, is_search_path: bool) -> String {
        match self {
            Self::Bash | Self::Zsh => format!("export {}={}", name, self.quote(value)),
            Self::Fish if is_search_path => {
                let entries: Vec<String> = value
                    .split(PATH_LIST_SEPARATOR)
                    .map(|entry| self.quote(entry))
                    .collect();
                format!("set -gx {} {}", name, entries.join(" "))
            }
            Self::Fish => format!("set -gx {} {}", name, self.quote(value)),
            Self::PowerShell => format!("$Env:{} = {}", name, self.quote(value)),
        }
    }

    fn unset_var(self, name: &str) -> String {
        match self {
            Self::Bash | Self::Zsh => format!("unset {}", name),
            Self::Fish => format!("set -e {}", name),
            Self::PowerShell => format!("Remove-Item -Path Env:{} -ErrorAction SilentlyContinue", name),
        }
    }

    fn decorate_prompt(self, prefix: &str) -> Vec<String> {
        let tag = format!("({}) ", prefix);
        match self {
            Self::Bash | Self::Zsh => vec![
                "_ENVPROF_OLD_PS1=\"${PS1-}\"".to_string(),
                format!("PS1={}\"${{PS1-}}\"", self.quote(&tag)),
            ],
            Self::Fish => vec![
                "functions -q _envprof_old_fish_prompt; or functions -c fish_prompt _envprof_old_fish_prompt".to_string(),
                format!(
                    "function fish_prompt; printf '%s' {}; _envprof_old_fish_prompt; end",
                    self.quote(&tag)
                ),
            ],
            Self::PowerShell => vec![
                "if (-not (Test-Path -Path Function:_ENVPROF_OLD_PROMPT)) { function global:_ENVPROF_OLD_PROMPT { \"\" }; Copy-Item -Path Function:prompt -Destination Function:_ENVPROF_OLD_PROMPT }".to_string(),
                format!(
                    "New-Variable -Name _ENVPROF_PROMPT_PREFIX -Scope Global -Option ReadOnly -Force -Value {}",
                    self.quote(prefix)
                ),
                "function global:prompt { Write-Host -NoNewline -ForegroundColor Green \"($_ENVPROF_PROMPT_PREFIX) \"; _ENVPROF_OLD_PROMPT }".to_string(),
            ],
        }
    }

    fn restore_prompt(self) -> Vec<String> {
        match self {
            Self::Bash | Self::Zsh => vec![
                "if [ -n \"${_ENVPROF_OLD_PS1+x}\" ]; then PS1=\"$_ENVPROF_OLD_PS1\"; unset _ENVPROF_OLD_PS1; fi".to_string(),
            ],
            Self::Fish => vec![
                "if functions -q _envprof_old_fish_prompt; functions -e fish_prompt; functions -c _envprof_old_fish_prompt fish_prompt; functions -e _envprof_old_fish_prompt; end".to_string(),
            ],
            Self::PowerShell => vec![
                "if (Test-Path -Path Function:_ENVPROF_OLD_PROMPT) { Copy-Item -Path Function:_ENVPROF_OLD_PROMPT -Destination Function:prompt; Remove-Item -Path Function:_ENVPROF_OLD_PROMPT }".to_string(),
                "Remove-Variable -Name _ENVPROF_PROMPT_PREFIX -Scope Global -Force -ErrorAction SilentlyContinue".to_string(),
            ],
        }
    }

    fn define_deactivate(self, exe: &str) -> String {
        let exe = self.quote(exe);
        match self {
            Self::Bash | Self::Zsh => format!(
                "deactivate() {{ eval \"$({} deactivate --shell {} \"$@\")\"; }}",
                exe, self
            ),
            Self::Fish => format!(
                "function deactivate; {} deactivate --shell fish $argv | source; end",
                exe
            ),
            Self::PowerShell => format!(
                "function global:deactivate {{ & {} deactivate --shell powershell @args | Out-String | Invoke-Expression }}",
                exe
            ),
        }
    }

    fn remove_deactivate(self) -> String {
        match self {
            Self::Bash | Self::Zsh => "unset -f deactivate 2>/dev/null || true".to_string(),
            Self::Fish => "functions -e deactivate".to_string(),
            Self::PowerShell => {
                "Remove-Item -Path Function:deactivate -ErrorAction SilentlyContinue".to_string()
            }
        }
    }

    fn rehash(self) -> Option<&'static str> {
        match self {
            Self::Bash | Self::Zsh => Some("hash -r 2>/dev/null || true"),
            Self::Fish | Self::PowerShell => None,
        }
    }
}

/// A single variable update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvChange {
    Set { name: String, value: String },
    Unset { name: String },
}

/// Variables that differ between two environments, in name order
pub fn env_changes(before: &MapEnv, after: &MapEnv) -> Vec<EnvChange> {
    let mut changes: Vec<EnvChange> = after
        .vars()
        .iter()
        .filter(|(name, value)| before.vars().get(*name) != Some(*value))
        .map(|(name, value)| EnvChange::Set {
            name: name.clone(),
            value: value.clone(),
        })
        .chain(
            before
                .vars()
                .keys()
                .filter(|name| !after.vars().contains_key(*name))
                .map(|name| EnvChange::Unset { name: name.clone() }),
        )
        .collect();
    changes.sort_by(|a, b| change_name(a).cmp(change_name(b)));
    changes
}

fn change_name(change: &EnvChange) -> &str {
    match change {
        EnvChange::Set { name, .. } | EnvChange::Unset { name } => name,
    }
}

/// Accumulates the lines of a script for one shell
#[derive(Debug)]
pub struct Script {
    shell: Shell,
    lines: Vec<String>,
}

impl Script {
    pub fn new(shell: Shell) -> Self {
        Self {
            shell,
            lines: Vec::new(),
        }
    }

    pub fn restore_prompt(&mut self) -> &mut Self {
        self.lines.extend(self.shell.restore_prompt());
        self
    }

    pub fn decorate_prompt(&mut self, prefix: &str) -> &mut Self {
        self.lines.extend(self.shell.decorate_prompt(prefix));
        self
    }

    /// Apply variable changes, rehashing the command table when the search
    /// path moved
    pub fn apply(&mut self, changes: &[EnvChange], path_var: &str) -> &mut Self {
        let mut path_changed = false;
        for change in changes {
            let is_search_path = change_name(change) == path_var;
            let line = match change {
                EnvChange::Set { name, value } => self.shell.set_var(name, value, is_search_path),
                EnvChange::Unset { name } => self.shell.unset_var(name),
            };
            path_changed |= is_search_path;
            self.lines.push(line);
        }
        if path_changed {
            self.lines.extend(self.shell.rehash().map(str::to_string));
        }
        self
    }

    pub fn define_deactivate(&mut self, exe: &str) -> &mut Self {
        self.lines.push(self.shell.define_deactivate(exe));
        self
    }

    pub fn remove_deactivate(&mut self) -> &mut Self {
        self.lines.push(self.shell.remove_deactivate());
        self
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
