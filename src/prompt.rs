//! User interaction for variable input and destructive-action confirmation.

use crate::error::Result;
use dialoguer::{Confirm, Input};

/// Source of interactive answers. Generation code only talks to this trait so
/// tests can script the answers.
pub trait Prompter {
    /// Shows a variable's summary before its value is asked for.
    fn summary(&self, text: &str);

    /// Asks for a text value labelled `label`.
    ///
    /// When `allow_empty` is false the implementation keeps asking until a
    /// non-empty value is entered.
    fn input(&self, label: &str, allow_empty: bool) -> Result<String>;

    /// Asks a yes/no question. Returns `true` right away when `skip` is set.
    fn confirm(&self, skip: bool, prompt: String) -> Result<bool>;
}

/// Terminal prompter backed by `dialoguer`.
#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl DialoguerPrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for DialoguerPrompter {
    fn summary(&self, text: &str) {
        println!("{text}");
    }

    fn input(&self, label: &str, allow_empty: bool) -> Result<String> {
        let value: String =
            Input::new().with_prompt(label).allow_empty(allow_empty).interact_text()?;
        Ok(value)
    }

    fn confirm(&self, skip: bool, prompt: String) -> Result<bool> {
        if skip {
            return Ok(true);
        }
        Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
    }
}
