//! Scripted executor for workflow tests.
//!
//! Workflow tests script the sequence of expected commands up front; each
//! expectation pairs a substring the rendered command must contain with the
//! canned reply to return. Commands are consumed in order, and every call is
//! recorded so tests can assert on what ran.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use certgate_exec::CommandExecutor;
use certgate_exec::CommandOutcome;
use certgate_exec::EasyRsaRequest;
use certgate_exec::ExecError;
use certgate_exec::Result;
use certgate_exec::ShellOutput;
use tokio_util::sync::CancellationToken;

enum ScriptedReply {
    Shell(ShellOutput),
    Outcome(CommandOutcome),
    Cancelled,
}

pub struct ScriptedExecutor {
    replies: Mutex<VecDeque<(String, ScriptedReply)>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Expects a `run_shell` call whose command contains `matcher`.
    pub fn expect_shell(self, matcher: &str, output: ShellOutput) -> Self {
        self.push(matcher, ScriptedReply::Shell(output))
    }

    /// Expects an `execute_easyrsa` call whose rendered command contains
    /// `matcher`.
    pub fn expect_easyrsa(self, matcher: &str, outcome: CommandOutcome) -> Self {
        self.push(matcher, ScriptedReply::Outcome(outcome))
    }

    /// Expects a call whose command contains `matcher` and cancels it.
    pub fn expect_cancelled(self, matcher: &str) -> Self {
        self.push(matcher, ScriptedReply::Cancelled)
    }

    /// Every command rendered so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn push(self, matcher: &str, reply: ScriptedReply) -> Self {
        self.replies.lock().unwrap().push_back((matcher.to_owned(), reply));
        self
    }

    fn next_reply(&self, rendered: &str) -> ScriptedReply {
        let (matcher, reply) = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected command: {rendered}"));
        assert!(
            rendered.contains(&matcher),
            "expected command containing {matcher:?}, got {rendered:?}"
        );
        reply
    }
}

#[async_trait]
impl CommandExecutor for ScriptedExecutor {
    async fn run_shell(&self, command: &str, _cancel: &CancellationToken) -> Result<ShellOutput> {
        self.calls.lock().unwrap().push(command.to_owned());
        match self.next_reply(command) {
            ScriptedReply::Shell(output) => Ok(output),
            ScriptedReply::Cancelled => Err(ExecError::Cancelled),
            ScriptedReply::Outcome(_) => panic!("scripted easyrsa reply for run_shell: {command}"),
        }
    }

    async fn execute_easyrsa(
        &self,
        request: &EasyRsaRequest,
        _cancel: &CancellationToken,
    ) -> Result<CommandOutcome> {
        let rendered = request.to_command();
        self.calls.lock().unwrap().push(rendered.clone());
        match self.next_reply(&rendered) {
            ScriptedReply::Outcome(outcome) => Ok(outcome),
            ScriptedReply::Cancelled => Err(ExecError::Cancelled),
            ScriptedReply::Shell(_) => {
                panic!("scripted shell reply for execute_easyrsa: {rendered}")
            }
        }
    }
}

pub fn shell_ok(stdout: &str) -> ShellOutput {
    ShellOutput {
        stdout: stdout.to_owned(),
        stderr: String::new(),
        exit_code: 0,
    }
}

pub fn shell_fail(exit_code: i32, stderr: &str) -> ShellOutput {
    ShellOutput {
        stdout: String::new(),
        stderr: stderr.to_owned(),
        exit_code,
    }
}

pub fn outcome_ok(stdout: &str) -> CommandOutcome {
    CommandOutcome {
        success: true,
        output: stdout.to_owned(),
        exit_code: 0,
        error: String::new(),
    }
}

pub fn outcome_fail(exit_code: i32, stdout: &str, stderr: &str) -> CommandOutcome {
    CommandOutcome {
        success: false,
        output: stdout.to_owned(),
        exit_code,
        error: stderr.to_owned(),
    }
}
