//! Environment abstraction.
//!
//! Activation only ever touches a variable table and the live prompt renderer.
//! [`Environment`] hides where those live. [`MapEnv`] keeps them in memory;
//! the CLI fills one from the process environment and turns the difference
//! into a script.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::rc::Rc;

use crate::prompt::{SharedRenderer, StaticPrompt};

/// Variable table plus prompt renderer of one session
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;
    fn set_var(&mut self, name: &str, value: &str);
    fn remove_var(&mut self, name: &str);
    fn prompt(&self) -> SharedRenderer;
    fn set_prompt(&mut self, renderer: SharedRenderer);

    fn is_set(&self, name: &str) -> bool {
        self.var(name).is_some()
    }

    /// Set, but with a value that cannot be represented as a `String`
    fn is_unreadable(&self, _name: &str) -> bool {
        false
    }
}

/// In-memory environment
#[derive(Debug, Clone)]
pub struct MapEnv {
    vars: BTreeMap<String, String>,
    /// Names whose values were not valid UTF-8
    unreadable: BTreeSet<String>,
    /// Match names ignoring ASCII case, as Windows does
    ignore_case: bool,
    prompt: SharedRenderer,
}

impl Default for MapEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl MapEnv {
    pub fn new() -> Self {
        Self {
            vars: BTreeMap::new(),
            unreadable: BTreeSet::new(),
            ignore_case: false,
            prompt: Rc::new(StaticPrompt::new("")),
        }
    }

    /// Build from `(name, value)` pairs
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            ..Self::new()
        }
    }

    /// Build from raw OS pairs.
    ///
    /// A value that is not valid UTF-8 is remembered as unreadable rather
    /// than dropped, so callers can tell it apart from an unset variable.
    /// Names that are not valid UTF-8 cannot be addressed and are skipped.
    pub fn from_os_vars<I>(vars: I) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let mut env = Self::new();
        for (name, value) in vars {
            let Ok(name) = name.into_string() else {
                continue;
            };
            match value.into_string() {
                Ok(value) => {
                    env.vars.insert(name, value);
                }
                Err(_) => {
                    tracing::debug!(var = %name, "value is not valid UTF-8");
                    env.unreadable.insert(name);
                }
            }
        }
        env
    }

    /// Snapshot the current process environment
    pub fn from_process() -> Self {
        Self::from_os_vars(std::env::vars_os()).ignore_case(cfg!(windows))
    }

    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        self
    }

    pub fn with_prompt(mut self, renderer: SharedRenderer) -> Self {
        self.prompt = renderer;
        self
    }

    pub fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    /// The stored spelling of `name`, if present
    fn key_of<'a>(&self, mut keys: impl Iterator<Item = &'a String>, name: &str) -> Option<String> {
        if self.ignore_case {
            keys.find(|k| k.eq_ignore_ascii_case(name)).cloned()
        } else {
            keys.find(|k| k.as_str() == name).cloned()
        }
    }

    fn clear_unreadable(&mut self, name: &str) {
        if let Some(key) = self.key_of(self.unreadable.iter(), name) {
            self.unreadable.remove(&key);
        }
    }
}

impl Environment for MapEnv {
    fn var(&self, name: &str) -> Option<String> {
        if !self.ignore_case {
            return self.vars.get(name).cloned();
        }
        self.key_of(self.vars.keys(), name)
            .and_then(|key| self.vars.get(&key).cloned())
    }

    fn set_var(&mut self, name: &str, value: &str) {
        self.clear_unreadable(name);
        let key = self
            .key_of(self.vars.keys(), name)
            .unwrap_or_else(|| name.to_string());
        self.vars.insert(key, value.to_string());
    }

    fn remove_var(&mut self, name: &str) {
        self.clear_unreadable(name);
        if let Some(key) = self.key_of(self.vars.keys(), name) {
            self.vars.remove(&key);
        }
    }

    fn prompt(&self) -> SharedRenderer {
        Rc::clone(&self.prompt)
    }

    fn set_prompt(&mut self, renderer: SharedRenderer) {
        self.prompt = renderer;
    }

    fn is_unreadable(&self, name: &str) -> bool {
        self.key_of(self.unreadable.iter(), name).is_some()
    }
}
