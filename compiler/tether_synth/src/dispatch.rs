//! Dispatch tables.
//!
//! Each [`TypeSignatureGroup`] becomes one externally callable
//! [`EntryPoint`]. Its body is an ordered list of [`DispatchArm`]s, one per
//! member in group order; the first arm whose [`MatchRule`] accepts the
//! caller wins and its implementation is invoked with every extra argument
//! forwarded unchanged.
//!
//! The rule kind is chosen once per target ([`DispatchStrategy`]):
//!
//! - [`MatchRule::ExactText`]: the caller's captured argument-expression
//!   texts equal the recorded texts, argument by argument.
//! - [`MatchRule::Positional`]: the caller's line equals the recorded line
//!   and the caller's file path ends with the recorded last two path
//!   components, compared case-insensitively.
//!
//! No match is a fatal consistency error: the tables are out of sync with
//! the compiled call sites. There is no slower fallback.

use tether_ir::{CallKind, CallSite, CallSiteFlags, TypeRef};

use crate::group::{SignatureKey, TypeSignatureGroup};
use crate::options::DispatchStrategy;

/// What the calling context knows about itself.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CallerInfo {
    /// Captured argument-expression texts, or `None` when the capture
    /// mechanism is unavailable.
    pub argument_texts: Option<Vec<String>>,
    pub file: String,
    pub line: u32,
}

impl CallerInfo {
    pub fn with_texts<I, S>(texts: I, file: impl Into<String>, line: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CallerInfo {
            argument_texts: Some(texts.into_iter().map(Into::into).collect()),
            file: file.into(),
            line,
        }
    }

    pub fn positional(file: impl Into<String>, line: u32) -> Self {
        CallerInfo {
            argument_texts: None,
            file: file.into(),
            line,
        }
    }
}

/// How one arm recognises its call site.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum MatchRule {
    ExactText(Vec<String>),
    Positional { line: u32, path_suffix: String },
}

impl MatchRule {
    pub fn for_call_site(site: &CallSite, strategy: DispatchStrategy) -> Self {
        match strategy {
            DispatchStrategy::ArgumentText => MatchRule::ExactText(site.argument_texts.clone()),
            DispatchStrategy::Positional => MatchRule::Positional {
                line: site.location.line,
                path_suffix: site.location.path_suffix(),
            },
        }
    }

    pub fn matches(&self, caller: &CallerInfo) -> bool {
        match self {
            MatchRule::ExactText(expected) => caller
                .argument_texts
                .as_ref()
                .is_some_and(|texts| texts == expected),
            MatchRule::Positional { line, path_suffix } => {
                caller.line == *line && ends_with_path(&caller.file, path_suffix)
            }
        }
    }
}

/// Case-insensitive, separator-agnostic "file ends with these components".
fn ends_with_path(file: &str, suffix: &str) -> bool {
    let file = file.replace('\\', "/").to_lowercase();
    let suffix = suffix.replace('\\', "/").to_lowercase();
    if suffix.is_empty() || !file.ends_with(&suffix) {
        return false;
    }
    let boundary = file.len() - suffix.len();
    boundary == 0 || file.as_bytes()[boundary - 1] == b'/'
}

/// One arm of an entry point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchArm {
    pub rule: MatchRule,
    /// Name of the synthesized implementation this arm invokes.
    pub implementation: String,
}

/// Role of one entry-point parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamKind {
    /// The object the call is made on.
    Receiver(TypeRef),
    /// The object a binding reads from.
    SourceRoot(TypeRef),
    /// A property-expression argument.
    PropertyExpression { root: TypeRef, leaf: TypeRef },
    Selector { inputs: Vec<TypeRef>, output: TypeRef },
    Converter { from: TypeRef, to: TypeRef },
    BackConverter { from: TypeRef, to: TypeRef },
    Scheduler,
    /// Captured text of property-expression argument `index`.
    CallerArgumentExpression { index: usize },
    CallerFilePath,
    CallerLineNumber,
}

/// One entry-point parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParamKind,
}

impl Parameter {
    fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Parameter {
            name: name.into(),
            kind,
        }
    }
}

/// One externally callable, statically typed entry point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    pub kind: CallKind,
    pub signature: SignatureKey,
    pub parameters: Vec<Parameter>,
    pub arms: Vec<DispatchArm>,
}

impl EntryPoint {
    /// First arm accepting `caller`, in group order.
    pub fn resolve(&self, caller: &CallerInfo) -> Option<&DispatchArm> {
        self.arms.iter().find(|arm| arm.rule.matches(caller))
    }
}

/// Build the entry point for `group`. `implementations[i]` names the
/// synthesized implementation of `group.members[i]`.
pub fn build_entry_point(
    name: String,
    group: &TypeSignatureGroup,
    implementations: &[String],
    strategy: DispatchStrategy,
) -> EntryPoint {
    debug_assert_eq!(group.members.len(), implementations.len());

    let arms = group
        .members
        .iter()
        .zip(implementations)
        .map(|(site, implementation)| DispatchArm {
            rule: MatchRule::for_call_site(site, strategy),
            implementation: implementation.clone(),
        })
        .collect();

    EntryPoint {
        name,
        kind: group.representative().kind,
        signature: group.key.clone(),
        parameters: parameters_for(group.representative(), strategy),
        arms,
    }
}

/// Parameter list derived from a group's representative call site.
pub fn parameters_for(site: &CallSite, strategy: DispatchStrategy) -> Vec<Parameter> {
    let mut params = vec![Parameter::new(
        "receiver",
        ParamKind::Receiver(site.owner_type.clone()),
    )];

    if site.kind.is_binding() {
        params.push(Parameter::new(
            "source",
            ParamKind::SourceRoot(site.paths[0].root_type().clone()),
        ));
    }

    for (i, path) in site.paths.iter().enumerate() {
        params.push(Parameter::new(
            format!("property{}", i + 1),
            ParamKind::PropertyExpression {
                root: path.root_type().clone(),
                leaf: path.leaf_type().clone(),
            },
        ));
    }

    if site.has(CallSiteFlags::HAS_SELECTOR) {
        let inputs = if site.kind.is_binding() {
            vec![site.paths[0].leaf_type().clone()]
        } else {
            site.paths.iter().map(|p| p.leaf_type().clone()).collect()
        };
        params.push(Parameter::new(
            "selector",
            ParamKind::Selector {
                inputs,
                output: site.result_type.clone(),
            },
        ));
    }

    if site.has(CallSiteFlags::HAS_CONVERSION) && site.kind.is_binding() {
        let source = site.paths[0].leaf_type().clone();
        let target = site.paths[1].leaf_type().clone();
        params.push(Parameter::new(
            "converter",
            ParamKind::Converter {
                from: source.clone(),
                to: target.clone(),
            },
        ));
        if site.kind.is_bidirectional() {
            params.push(Parameter::new(
                "back_converter",
                ParamKind::BackConverter {
                    from: target,
                    to: source,
                },
            ));
        }
    }

    if site.has(CallSiteFlags::HAS_SCHEDULER) {
        params.push(Parameter::new("scheduler", ParamKind::Scheduler));
    }

    match strategy {
        DispatchStrategy::ArgumentText => {
            for index in 0..site.paths.len() {
                params.push(Parameter::new(
                    format!("property{}_expression", index + 1),
                    ParamKind::CallerArgumentExpression { index },
                ));
            }
        }
        DispatchStrategy::Positional => {
            params.push(Parameter::new("caller_file", ParamKind::CallerFilePath));
            params.push(Parameter::new("caller_line", ParamKind::CallerLineNumber));
        }
    }

    params
}
