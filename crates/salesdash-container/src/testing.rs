//! Recording fake for [`CommandRunner`]

use crate::error::Result;
use crate::process::{CommandOutput, CommandRunner, CommandSpec};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

struct Rule {
    pattern: String,
    responses: VecDeque<CommandOutput>,
}

/// Records every command and answers from scripted rules
///
/// A rule matches when its pattern is a substring of the rendered command
/// line; the first matching rule wins. A rule with several responses hands
/// them out in order and then keeps repeating the last one. Commands that
/// match no rule succeed with empty output.
#[derive(Default)]
pub struct RecordingRunner {
    rules: Mutex<Vec<Rule>>,
    delays: Mutex<Vec<(String, Duration)>>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, pattern: impl Into<String>, output: CommandOutput) -> Self {
        self.on_sequence(pattern, vec![output])
    }

    pub fn on_sequence(self, pattern: impl Into<String>, outputs: Vec<CommandOutput>) -> Self {
        self.rules.lock().unwrap().push(Rule {
            pattern: pattern.into(),
            responses: outputs.into(),
        });
        self
    }

    /// Hold matching commands for `delay` after they are recorded
    pub fn delay(self, pattern: impl Into<String>, delay: Duration) -> Self {
        self.delays.lock().unwrap().push((pattern.into(), delay));
        self
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().unwrap().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.calls().iter().map(ToString::to_string).collect()
    }

    pub fn count_matching(&self, pattern: &str) -> usize {
        self.command_lines()
            .iter()
            .filter(|line| line.contains(pattern))
            .count()
    }

    /// Index of the first recorded command containing `pattern`
    pub fn position(&self, pattern: &str) -> Option<usize> {
        self.command_lines()
            .iter()
            .position(|line| line.contains(pattern))
    }
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.calls.lock().unwrap().push(spec.clone());

        let line = spec.to_string();
        let delay = self
            .delays
            .lock()
            .unwrap()
            .iter()
            .find(|(pattern, _)| line.contains(pattern))
            .map(|(_, delay)| *delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut rules = self.rules.lock().unwrap();
        let response = rules
            .iter_mut()
            .find(|rule| line.contains(&rule.pattern))
            .and_then(|rule| {
                if rule.responses.len() > 1 {
                    rule.responses.pop_front()
                } else {
                    rule.responses.front().cloned()
                }
            });

        Ok(response.unwrap_or_else(|| CommandOutput::success("")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sequence_repeats_last_response() {
        let runner = RecordingRunner::new().on_sequence(
            "pg_isready",
            vec![CommandOutput::failure(2, "no response"), CommandOutput::success("ok")],
        );
        let spec = CommandSpec::new("docker").args(["exec", "db", "pg_isready"]);

        assert!(!runner.run(&spec).await.unwrap().is_success());
        assert!(runner.run(&spec).await.unwrap().is_success());
        assert!(runner.run(&spec).await.unwrap().is_success());
        assert_eq!(runner.count_matching("pg_isready"), 3);
    }

    #[tokio::test]
    async fn test_unmatched_command_succeeds() {
        let runner = RecordingRunner::new();
        let spec = CommandSpec::new("docker").arg("ps");

        assert!(runner.run(&spec).await.unwrap().is_success());
        assert_eq!(runner.position("docker ps"), Some(0));
    }
}
