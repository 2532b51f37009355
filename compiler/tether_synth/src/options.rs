//! Per-target synthesis options.

use crate::error::OptionsError;

/// How generated entry points recognise their caller.
///
/// Chosen once per compilation target: a target either can capture the
/// caller's argument-expression text or it cannot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum DispatchStrategy {
    /// Compare the captured argument-expression text of every argument.
    #[default]
    ArgumentText,
    /// Compare the caller's line and the last two components of its file path.
    Positional,
}

/// Options for one synthesis pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynthOptions {
    pub dispatch: DispatchStrategy,
    /// Run the post-synthesis consistency checks.
    pub validate: bool,
}

impl Default for SynthOptions {
    fn default() -> Self {
        SynthOptions {
            dispatch: DispatchStrategy::default(),
            validate: cfg!(debug_assertions),
        }
    }
}

impl SynthOptions {
    pub const DISPATCH_VAR: &'static str = "TETHER_DISPATCH";
    pub const VALIDATE_VAR: &'static str = "TETHER_VALIDATE";

    #[must_use]
    pub fn with_dispatch(mut self, dispatch: DispatchStrategy) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Defaults overridden by `TETHER_DISPATCH` and `TETHER_VALIDATE`.
    pub fn from_env() -> Result<Self, OptionsError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, OptionsError> {
        let mut options = SynthOptions::default();

        if let Some(value) = lookup(Self::DISPATCH_VAR) {
            options.dispatch = match value.trim().to_ascii_lowercase().as_str() {
                "text" | "argument-text" => DispatchStrategy::ArgumentText,
                "positional" | "line" => DispatchStrategy::Positional,
                _ => {
                    return Err(OptionsError::UnknownValue {
                        variable: Self::DISPATCH_VAR,
                        value,
                        expected: "text, positional",
                    })
                }
            };
        }

        if let Some(value) = lookup(Self::VALIDATE_VAR) {
            options.validate = match value.trim() {
                "1" | "true" => true,
                "0" | "false" => false,
                _ => {
                    return Err(OptionsError::UnknownValue {
                        variable: Self::VALIDATE_VAR,
                        value,
                        expected: "0, 1",
                    })
                }
            };
        }

        Ok(options)
    }
}
