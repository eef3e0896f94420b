//! Prompt renderers.
//!
//! The live prompt is a shared [`PromptRenderer`]. Activation asks a
//! [`PromptProvider`] to wrap the current renderer in a decorated one and keeps
//! the original in the session so deactivation can put it back untouched.

use std::fmt;
use std::rc::Rc;

use anstyle::{AnsiColor, Color, Style};

/// Something that can produce the text of a shell prompt
pub trait PromptRenderer: fmt::Debug {
    fn render(&self) -> String;
}

/// Shared handle to a renderer; identity is compared with `Rc::ptr_eq`
pub type SharedRenderer = Rc<dyn PromptRenderer>;

/// Builds the decorated renderer installed on activation
pub trait PromptProvider: fmt::Debug {
    fn compose(&self, prefix: &str, previous: SharedRenderer) -> SharedRenderer;
}

/// A renderer that always returns the same text
#[derive(Debug, Clone)]
pub struct StaticPrompt(pub String);

impl StaticPrompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }
}

impl PromptRenderer for StaticPrompt {
    fn render(&self) -> String {
        self.0.clone()
    }
}

/// Renders `(prefix) ` in front of the wrapped renderer's output
#[derive(Debug)]
pub struct DecoratedPrompt {
    prefix: String,
    color: bool,
    inner: SharedRenderer,
}

impl PromptRenderer for DecoratedPrompt {
    fn render(&self) -> String {
        let tag = if self.color {
            let st = Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green)));
            format!("{st}({}){st:#}", self.prefix)
        } else {
            format!("({})", self.prefix)
        };
        format!("{} {}", tag, self.inner.render())
    }
}

/// Default provider: parenthesised prefix, green when colour is enabled
#[derive(Debug, Clone, Copy, Default)]
pub struct ParenPrefix {
    pub color: bool,
}

impl ParenPrefix {
    pub fn new(color: bool) -> Self {
        Self { color }
    }
}

impl PromptProvider for ParenPrefix {
    fn compose(&self, prefix: &str, previous: SharedRenderer) -> SharedRenderer {
        Rc::new(DecoratedPrompt {
            prefix: prefix.to_string(),
            color: self.color,
            inner: previous,
        })
    }
}
