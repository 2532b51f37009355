//! Errors raised by the synthesis pass.
//!
//! Synthesis is a pure batch transform, so there are no transient failures
//! and nothing is retried. A malformed call site means the extraction stage
//! handed over something it should never produce; the whole pass aborts.

use tether_ir::{CallKind, SourceLocation};
use thiserror::Error;

/// Why a call site was rejected before plan construction.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MalformedReason {
    #[error("no property paths")]
    NoPaths,
    #[error("expected {expected} property path(s), found {found}")]
    Arity { expected: &'static str, found: usize },
    #[error("{found} argument text(s) recorded for {paths} path(s)")]
    ArgumentTextCount { paths: usize, found: usize },
    #[error("path {index} is rooted at `{root}`, expected `{expected}`")]
    RootMismatch {
        index: usize,
        root: String,
        expected: String,
    },
    #[error("before-change observation is not available for this call kind")]
    BeforeChangeNotAllowed,
    #[error("path {index} has {len} segments; observable properties must be direct")]
    NestedObservable { index: usize, len: usize },
    #[error("a converter was supplied to a call kind that does not convert")]
    ConversionNotAllowed,
    #[error("a selector was supplied to a two-way binding")]
    SelectorNotAllowed,
    #[error("call kind `{found}` passed to the `{expected}` generator")]
    KindMismatch { expected: CallKind, found: CallKind },
}

/// Failure of a synthesis pass.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SynthError {
    #[error("malformed `{kind}` call site at {location}: {reason}")]
    MalformedCallSite {
        kind: CallKind,
        location: SourceLocation,
        reason: MalformedReason,
    },
}

/// Bad synthesis configuration.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum OptionsError {
    #[error("unknown value `{value}` for {variable} (expected one of: {expected})")]
    UnknownValue {
        variable: &'static str,
        value: String,
        expected: &'static str,
    },
}
