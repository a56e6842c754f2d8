//! Interactive prompts.
//!
//! Commands ask questions through a [`Prompter`]; the terminal
//! implementation uses dialoguer and tests replay scripted answers.

use anyhow::{anyhow, Result};
use dialoguer::{Confirm, Input, Select};
use std::collections::VecDeque;
use std::sync::Mutex;

pub trait Prompter: Send + Sync {
    /// Ask a yes/no question
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;

    /// Ask for free text, offering `default` when the user just presses enter
    fn input(&self, prompt: &str, default: &str) -> Result<String>;

    /// Pick one of `items`, returning its index
    fn select(&self, prompt: &str, items: &[&str], default: usize) -> Result<usize>;
}

/// Prompts on the controlling terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        let answer = Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(answer)
    }

    fn input(&self, prompt: &str, default: &str) -> Result<String> {
        let answer: String = Input::new()
            .with_prompt(prompt)
            .default(default.to_string())
            .show_default(true)
            .interact_text()?;
        Ok(answer)
    }

    fn select(&self, prompt: &str, items: &[&str], default: usize) -> Result<usize> {
        let selection = Select::new()
            .with_prompt(prompt)
            .items(items)
            .default(default)
            .interact()?;
        Ok(selection)
    }
}

/// A pre-recorded answer for [`ScriptedPrompter`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    Confirm(bool),
    Input(String),
    Select(usize),
    /// Accept whatever default the prompt offers
    Default,
}

/// Replays queued answers in order and records every prompt it was asked.
///
/// Asking more questions than were scripted, or a question of the wrong
/// kind, is an error.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<Answer>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            asked: Mutex::new(Vec::new()),
        }
    }

    /// Prompts asked so far, in order
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }

    /// Number of scripted answers not yet consumed
    pub fn remaining(&self) -> usize {
        self.answers.lock().unwrap().len()
    }

    fn next(&self, prompt: &str) -> Result<Answer> {
        self.asked.lock().unwrap().push(prompt.to_string());
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow!("no scripted answer for prompt: {}", prompt))
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        match self.next(prompt)? {
            Answer::Confirm(value) => Ok(value),
            Answer::Default => Ok(default),
            other => Err(anyhow!("expected a confirm answer, got {:?}", other)),
        }
    }

    fn input(&self, prompt: &str, default: &str) -> Result<String> {
        match self.next(prompt)? {
            Answer::Input(value) => Ok(value),
            Answer::Default => Ok(default.to_string()),
            other => Err(anyhow!("expected an input answer, got {:?}", other)),
        }
    }

    fn select(&self, prompt: &str, items: &[&str], default: usize) -> Result<usize> {
        match self.next(prompt)? {
            Answer::Select(index) if index < items.len() => Ok(index),
            Answer::Select(index) => Err(anyhow!("selection {} out of range", index)),
            Answer::Default => Ok(default),
            other => Err(anyhow!("expected a select answer, got {:?}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_answers_in_order() {
        let prompter = ScriptedPrompter::new([
            Answer::Confirm(true),
            Answer::Input("v2".to_string()),
            Answer::Select(1),
        ]);

        assert!(prompter.confirm("Continue?", false).unwrap());
        assert_eq!(prompter.input("Suffix", "take2").unwrap(), "v2");
        assert_eq!(prompter.select("Pick", &["a", "b"], 0).unwrap(), 1);
        assert_eq!(prompter.asked(), vec!["Continue?", "Suffix", "Pick"]);
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn test_default_answer_uses_prompt_default() {
        let prompter = ScriptedPrompter::new([Answer::Default, Answer::Default]);
        assert!(prompter.confirm("Continue?", true).unwrap());
        assert_eq!(prompter.input("Suffix", "take2").unwrap(), "take2");
    }

    #[test]
    fn test_exhausted_script_is_error() {
        let prompter = ScriptedPrompter::new([]);
        assert!(prompter.confirm("Continue?", true).is_err());
    }

    #[test]
    fn test_wrong_answer_kind_is_error() {
        let prompter = ScriptedPrompter::new([Answer::Input("x".to_string())]);
        assert!(prompter.confirm("Continue?", true).is_err());
    }
}
