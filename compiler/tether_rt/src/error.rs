use tether_synth::FuncSlot;
use thiserror::Error;

/// Failure executing or dispatching a synthesized plan.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// No arm of the entry point accepts the caller. The generated tables
    /// are out of sync with the compiled call sites; callers must not
    /// recover from this.
    #[error("no implementation of `{entry}` matches the call at {file}:{line}")]
    UnresolvedDispatch {
        entry: String,
        file: String,
        line: u32,
    },
    #[error("no entry point named `{0}`")]
    UnknownEntryPoint(String),
    #[error("entry point `{entry}` names missing implementation `{implementation}`")]
    UnknownImplementation {
        entry: String,
        implementation: String,
    },
    #[error("plan needs a {0} but none was supplied")]
    MissingArgument(FuncSlot),
    #[error("plan delivers through a scheduler but none was supplied")]
    MissingScheduler,
    #[error("binding `{implementation}` was invoked without a source object")]
    MissingSourceRoot { implementation: String },
    #[error("plan cannot be executed here: {0}")]
    InvalidPlan(&'static str),
}
