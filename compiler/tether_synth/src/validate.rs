//! Consistency checks over a generated unit.
//!
//! - Every member of an entry point shares the entry point's signature.
//! - Every arm points at an implementation that exists.
//! - Entry-point and implementation names are unique.
//!
//! Name collisions come from the identifier hash and only cost liveness
//! (a duplicate generated name), so they are reported, not fatal. The
//! structural checks should never fire; they additionally trip a
//! `debug_assert!` so a broken synthesizer fails loudly in tests.

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::group::SignatureKey;
use crate::unit::GeneratedUnit;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum UnitProblem {
    #[error("entry point name `{0}` is generated more than once")]
    DuplicateEntryName(String),
    #[error("implementation name `{0}` is generated more than once")]
    DuplicateImplementationName(String),
    #[error("entry point `{entry}` dispatches to missing implementation `{implementation}`")]
    DanglingArm {
        entry: String,
        implementation: String,
    },
    #[error("entry point `{entry}` serves `{implementation}`, whose signature differs")]
    MixedSignature {
        entry: String,
        implementation: String,
    },
}

impl UnitProblem {
    fn is_structural(&self) -> bool {
        matches!(
            self,
            UnitProblem::DanglingArm { .. } | UnitProblem::MixedSignature { .. }
        )
    }
}

pub fn check_unit(unit: &GeneratedUnit) -> Vec<UnitProblem> {
    let mut problems = Vec::new();

    let mut seen = FxHashSet::default();
    for entry in &unit.entry_points {
        if !seen.insert(entry.name.as_str()) {
            problems.push(UnitProblem::DuplicateEntryName(entry.name.clone()));
        }
    }

    let mut seen = FxHashSet::default();
    for imp in &unit.implementations {
        if !seen.insert(imp.name.as_str()) {
            problems.push(UnitProblem::DuplicateImplementationName(imp.name.clone()));
        }
    }

    for entry in &unit.entry_points {
        for arm in &entry.arms {
            match unit.implementation(&arm.implementation) {
                None => problems.push(UnitProblem::DanglingArm {
                    entry: entry.name.clone(),
                    implementation: arm.implementation.clone(),
                }),
                Some(imp) if SignatureKey::of(&imp.call_site) != entry.signature => {
                    problems.push(UnitProblem::MixedSignature {
                        entry: entry.name.clone(),
                        implementation: imp.name.clone(),
                    });
                }
                Some(_) => {}
            }
        }
    }

    debug_assert!(
        !problems.iter().any(UnitProblem::is_structural),
        "structurally inconsistent unit: {problems:?}"
    );
    problems
}
