use crate::{
    dispatcher::{UpdaterBackend, UpgradeCommand, UserAction},
    errors::{DispatchError, ScriptError},
    event::UpgradeEvent,
    orchestrator::Orchestrator,
    step::StepView,
};
use std::io::BufRead;

/// One line of a scenario script, in the same JSON shape the backend emits events in.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ScriptLine {
    Event(UpgradeEvent),
    Action {
        action: UserAction,
    },
    Blocked {
        blocked: bool,
    },
    ManualInstall {
        #[serde(rename = "manualInstallRequired")]
        manual_install_required: bool,
    },
}

/// What happened when a script line was played.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Changed(StepView),
    Unchanged,
    Dispatched(UserAction, UpgradeCommand),
    Refused(UserAction),
    Override(&'static str, bool),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Script {
    lines: Vec<(usize, ScriptLine)>,
}

impl Script {
    /// Parses a script, skipping blank lines and `#` comments.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, ScriptError> {
        let mut lines = Vec::new();

        for (number, line) in reader.lines().enumerate() {
            let line = line.map_err(ScriptError::Read)?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            lines.push((number + 1, parse_line(number + 1, line)?));
        }

        Ok(Self { lines })
    }

    pub fn lines(&self) -> &[(usize, ScriptLine)] { &self.lines }

    pub fn is_empty(&self) -> bool { self.lines.is_empty() }

    /// Feeds every line to the orchestrator, reporting the outcome of each by line number.
    pub fn play<B: UpdaterBackend>(
        &self,
        orchestrator: &Orchestrator<B>,
        mut report: impl FnMut(usize, Outcome),
    ) -> Result<(), DispatchError> {
        for (number, line) in &self.lines {
            let outcome = match line.clone() {
                ScriptLine::Event(event) => match orchestrator.handle_event(event) {
                    Some(view) => Outcome::Changed(view),
                    None => Outcome::Unchanged,
                },
                ScriptLine::Action { action } => match orchestrator.dispatch(action)? {
                    Some(command) => Outcome::Dispatched(action, command),
                    None => Outcome::Refused(action),
                },
                ScriptLine::Blocked { blocked } => {
                    orchestrator.policy().set_blocked(blocked);
                    Outcome::Override("blocked", blocked)
                }
                ScriptLine::ManualInstall { manual_install_required } => {
                    orchestrator.policy().set_manual_install_required(manual_install_required);
                    Outcome::Override("manual install required", manual_install_required)
                }
            };

            report(*number, outcome);
        }

        Ok(())
    }
}

pub fn parse_line(number: usize, line: &str) -> Result<ScriptLine, ScriptError> {
    serde_json::from_str(line).map_err(|source| ScriptError::Parse { line: number, source })
}
