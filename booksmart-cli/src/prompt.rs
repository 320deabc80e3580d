//! Terminal input.
//!
//! Menus read every value through the [`Prompt`] trait so they can be driven
//! by a script in tests. [`TerminalPrompt`] is the `dialoguer` implementation.

use anyhow::Result;
use booksmart_core::Secret;
use dialoguer::{Confirm, Input, Password};

/// Source of typed values typed by the user.
pub trait Prompt {
    /// A line of text; may be empty.
    fn text(&mut self, label: &str) -> Result<String>;

    /// An integer. Non-numeric input is re-asked.
    fn int(&mut self, label: &str) -> Result<i64>;

    /// A masked password.
    fn password(&mut self, label: &str) -> Result<Secret>;

    /// A yes/no answer.
    fn confirm(&mut self, label: &str) -> Result<bool>;
}

/// Reads from the controlling terminal.
///
/// `dialoguer` blocks, so each read runs inside
/// [`tokio::task::block_in_place`] to keep the refresh loop scheduled.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl Prompt for TerminalPrompt {
    fn text(&mut self, label: &str) -> Result<String> {
        let value = tokio::task::block_in_place(|| {
            Input::<String>::new()
                .with_prompt(label)
                .allow_empty(true)
                .interact_text()
        })?;
        Ok(value.trim().to_string())
    }

    fn int(&mut self, label: &str) -> Result<i64> {
        let value =
            tokio::task::block_in_place(|| Input::<i64>::new().with_prompt(label).interact_text())?;
        Ok(value)
    }

    fn password(&mut self, label: &str) -> Result<Secret> {
        let value = tokio::task::block_in_place(|| Password::new().with_prompt(label).interact())?;
        Ok(Secret::new(value.trim()))
    }

    fn confirm(&mut self, label: &str) -> Result<bool> {
        let value = tokio::task::block_in_place(|| {
            Confirm::new().with_prompt(label).default(false).interact()
        })?;
        Ok(value)
    }
}

/// Answers read from a fixed script, for tests.
#[cfg(test)]
pub mod scripted {
    use super::*;
    use anyhow::{Context, anyhow};
    use std::collections::VecDeque;

    #[derive(Debug, Default)]
    pub struct ScriptedPrompt {
        answers: VecDeque<String>,
        /// Labels asked so far.
        pub asked: Vec<String>,
    }

    impl ScriptedPrompt {
        pub fn new<I, S>(answers: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                answers: answers.into_iter().map(Into::into).collect(),
                asked: Vec::new(),
            }
        }

        fn next(&mut self, label: &str) -> Result<String> {
            self.asked.push(label.to_string());
            self.answers
                .pop_front()
                .ok_or_else(|| anyhow!("script exhausted at prompt {:?}", label))
        }
    }

    impl Prompt for ScriptedPrompt {
        fn text(&mut self, label: &str) -> Result<String> {
            self.next(label)
        }

        fn int(&mut self, label: &str) -> Result<i64> {
            let answer = self.next(label)?;
            answer
                .parse()
                .with_context(|| format!("scripted answer {:?} is not a number", answer))
        }

        fn password(&mut self, label: &str) -> Result<Secret> {
            Ok(Secret::new(self.next(label)?))
        }

        fn confirm(&mut self, label: &str) -> Result<bool> {
            Ok(matches!(self.next(label)?.as_str(), "y" | "yes"))
        }
    }

    #[test]
    fn test_scripted_prompt_replays_answers() {
        let mut prompt = ScriptedPrompt::new(["2", "y", "Dune"]);
        assert_eq!(prompt.int("Menu item").unwrap(), 2);
        assert!(prompt.confirm("With params?").unwrap());
        assert_eq!(prompt.text("Title").unwrap(), "Dune");
        assert!(prompt.text("Author").is_err());
        assert_eq!(prompt.asked, vec!["Menu item", "With params?", "Title", "Author"]);
    }
}
