//! Session state: what activation overrode and how to undo it.
//!
//! A [`SessionState`] lives for one shell session. The CLI cannot keep it in
//! memory between invocations, so it travels as a JSON [`SessionRecord`] in a
//! variable of the shell's own environment and dies with the shell.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::env::Environment;
use crate::error::Result;
use crate::prompt::SharedRenderer;

/// Overrides recorded by the active profile
#[derive(Debug)]
pub struct SessionState {
    /// Variable name -> prior value; `None` means the variable was unset
    saved: BTreeMap<String, Option<String>>,
    prior_prompt: Option<SharedRenderer>,
    prompt_prefix: Option<String>,
    active: bool,
    activated_at: Option<DateTime<Utc>>,
    deactivate_registered: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// A fresh session: nothing saved, `deactivate` callable as a no-op
    pub fn new() -> Self {
        Self {
            saved: BTreeMap::new(),
            prior_prompt: None,
            prompt_prefix: None,
            active: false,
            activated_at: None,
            deactivate_registered: true,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn activated_at(&self) -> Option<DateTime<Utc>> {
        self.activated_at
    }

    /// Prefix shown by the decorated prompt
    pub fn prompt_prefix(&self) -> Option<&str> {
        self.prompt_prefix.as_deref()
    }

    pub fn has_prior_prompt(&self) -> bool {
        self.prior_prompt.is_some()
    }

    /// Recorded slot for `name`: `None` if nothing was saved,
    /// `Some(None)` if the variable was unset before activation
    pub fn saved(&self, name: &str) -> Option<Option<&str>> {
        self.saved.get(name).map(|prior| prior.as_deref())
    }

    pub fn saved_vars(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.saved.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn deactivate_available(&self) -> bool {
        self.deactivate_registered
    }

    /// True when the session holds nothing worth carrying forward
    pub fn is_pristine(&self) -> bool {
        !self.active
            && self.saved.is_empty()
            && self.prior_prompt.is_none()
            && self.prompt_prefix.is_none()
            && self.deactivate_registered
    }

    pub(crate) fn save_var(&mut self, name: &str, prior: Option<String>) {
        self.saved.insert(name.to_string(), prior);
    }

    pub(crate) fn take_saved(&mut self) -> BTreeMap<String, Option<String>> {
        std::mem::take(&mut self.saved)
    }

    pub(crate) fn save_prompt(&mut self, previous: SharedRenderer, prefix: &str) {
        self.prior_prompt = Some(previous);
        self.prompt_prefix = Some(prefix.to_string());
    }

    pub(crate) fn take_prior_prompt(&mut self) -> Option<SharedRenderer> {
        self.prompt_prefix = None;
        self.prior_prompt.take()
    }

    pub(crate) fn mark_active(&mut self, at: DateTime<Utc>) {
        self.active = true;
        self.activated_at = Some(at);
    }

    pub(crate) fn clear_active(&mut self) {
        self.active = false;
        self.activated_at = None;
    }

    pub(crate) fn register_deactivate(&mut self) {
        self.deactivate_registered = true;
    }

    pub(crate) fn unregister_deactivate(&mut self) {
        self.deactivate_registered = false;
    }

    /// Snapshot for serialization
    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            saved: self.saved.clone(),
            active: self.active,
            prompt_prefix: self.prompt_prefix.clone(),
            prompt_saved: self.prior_prompt.is_some(),
            activated_at: self.activated_at,
            deactivate_registered: self.deactivate_registered,
        }
    }

    /// Rebuild a session from a record.
    ///
    /// Renderers cannot be serialized; when the record says a prompt was
    /// saved, `saved_prompt` stands in for it.
    pub fn from_record(record: SessionRecord, saved_prompt: SharedRenderer) -> Self {
        Self {
            saved: record.saved,
            prior_prompt: record.prompt_saved.then_some(saved_prompt),
            prompt_prefix: record.prompt_prefix,
            active: record.active,
            activated_at: record.activated_at,
            deactivate_registered: record.deactivate_registered,
        }
    }
}

/// Serializable form of [`SessionState`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    #[serde(default)]
    pub saved: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_prefix: Option<String>,
    #[serde(default)]
    pub prompt_saved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_at: Option<DateTime<Utc>>,
    #[serde(default = "default_registered")]
    pub deactivate_registered: bool,
}

fn default_registered() -> bool {
    true
}

impl SessionRecord {
    /// Read the record stored in `var`, if any
    pub fn read(env: &impl Environment, var: &str) -> Result<Option<Self>> {
        match env.var(var) {
            Some(content) if !content.trim().is_empty() => Ok(Some(serde_json::from_str(&content)?)),
            _ => Ok(None),
        }
    }

    /// Store the session in `var`, or remove the variable when there is
    /// nothing to remember
    pub fn write(session: &SessionState, env: &mut impl Environment, var: &str) -> Result<()> {
        if session.is_pristine() {
            env.remove_var(var);
            return Ok(());
        }
        let content = serde_json::to_string(&session.to_record())?;
        env.set_var(var, &content);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MapEnv;
    use crate::prompt::StaticPrompt;
    use std::rc::Rc;

    const VAR: &str = "ENVPROF_SESSION";

    #[test]
    fn test_session_default() {
        let session = SessionState::new();
        assert!(!session.is_active());
        assert!(session.deactivate_available());
        assert!(session.is_pristine());
        assert_eq!(session.saved_vars().count(), 0);
    }

    #[test]
    fn test_saved_distinguishes_unset_from_empty() {
        let mut session = SessionState::new();
        session.save_var("UNSET", None);
        session.save_var("EMPTY", Some(String::new()));

        assert_eq!(session.saved("UNSET"), Some(None));
        assert_eq!(session.saved("EMPTY"), Some(Some("")));
        assert_eq!(session.saved("OTHER"), None);
    }

    #[test]
    fn test_record_read_missing() {
        let env = MapEnv::new();
        assert!(SessionRecord::read(&env, VAR).unwrap().is_none());
    }

    #[test]
    fn test_record_read_corrupt() {
        let env = MapEnv::from_vars([(VAR, "{broken")]);
        assert!(SessionRecord::read(&env, VAR).is_err());
    }

    #[test]
    fn test_record_through_environment() {
        let mut session = SessionState::new();
        session.save_var("PATH", Some("/usr/bin".to_string()));
        session.save_var("RUNTIME_HOME", None);
        session.save_prompt(Rc::new(StaticPrompt::new("$ ")), "work");
        session.mark_active(Utc::now());

        let mut env = MapEnv::new();
        SessionRecord::write(&session, &mut env, VAR).unwrap();
        let record = SessionRecord::read(&env, VAR).unwrap().unwrap();
        assert_eq!(record, session.to_record());

        let restored = SessionState::from_record(record, Rc::new(StaticPrompt::new("")));
        assert!(restored.is_active());
        assert!(restored.has_prior_prompt());
        assert_eq!(restored.prompt_prefix(), Some("work"));
        assert_eq!(restored.saved("PATH"), Some(Some("/usr/bin")));
        assert_eq!(restored.saved("RUNTIME_HOME"), Some(None));
    }

    #[test]
    fn test_write_pristine_removes_variable() {
        let mut env = MapEnv::from_vars([(VAR, "{}")]);
        SessionRecord::write(&SessionState::new(), &mut env, VAR).unwrap();
        assert!(!env.is_set(VAR));
    }

    #[test]
    fn test_record_missing_fields_use_defaults() {
        let record: SessionRecord = serde_json::from_str("{}").unwrap();
        assert!(record.deactivate_registered);
        assert!(!record.active);
        assert!(record.saved.is_empty());
    }
}
