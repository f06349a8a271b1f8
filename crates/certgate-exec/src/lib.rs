//! Cancellable shell execution and EasyRSA invocation.
//!
//! certgate never links a CA library; every issuance and revocation is an
//! invocation of the external `easyrsa` tool (and `openssl` for cross-checks)
//! through a shell. This crate owns that boundary:
//!
//! - [`ShellRunner`] spawns `bash -c <command>` as its own process group,
//!   captures both output streams fully, and guarantees that cancellation
//!   tears down the whole process tree rather than orphaning children.
//! - [`EasyRsaInvoker`] renders declarative [`EasyRsaRequest`]s into the
//!   `cd <root> && ./easyrsa ...` command lines the tool expects and folds
//!   infrastructure failures into a [`CommandOutcome`] callers can inspect.
//! - [`CommandExecutor`] is the seam the lifecycle engine programs against,
//!   so workflow logic can be tested with a scripted executor instead of a
//!   real PKI.
//!
//! Cancellation is the one failure this crate never converts into data: a
//! cancelled command is always surfaced as [`ExecError::Cancelled`] so the
//! caller's shutdown path stays intact.

mod easyrsa;
mod error;
mod runner;

pub use easyrsa::CommandExecutor;
pub use easyrsa::CommandOutcome;
pub use easyrsa::EasyRsaInvoker;
pub use easyrsa::EasyRsaRequest;
pub use easyrsa::ORCHESTRATOR_FAILURE_EXIT_CODE;
pub use error::ExecError;
pub use error::Result;
pub use runner::ShellOutput;
pub use runner::ShellRunner;
