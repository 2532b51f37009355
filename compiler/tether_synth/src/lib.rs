//! Pipeline synthesis for the Tether binding compiler.
//!
//! This crate turns resolved call sites ([`tether_ir::CallSite`]) into
//! statically dispatched reactive plans, eliminating runtime reflection for
//! property observation.
//!
//! # Pipeline Position
//!
//! ```text
//! Extraction → tether_ir → **Synthesize** → emission / tether_rt
//! ```
//!
//! # What Happens During Synthesis
//!
//! 1. **Preconditions** (`well_formed`): malformed call sites abort the pass.
//! 2. **Grouping** (`group`): call sites sharing a signature share an entry point.
//! 3. **Pipeline synthesis** (`synth`): watch / chain-switch / combine-latest /
//!    selector / duplicate filter per call site.
//! 4. **Binding composition** (`compose`): skip-echo, conversion, scheduling,
//!    tagging, observed-change wrapping, observable flattening.
//! 5. **Dispatch tables** (`dispatch`): exact-text or positional arms per entry point.
//! 6. **Validation** (`validate`): optional consistency checks over the unit.
//!
//! Synthesis is single-threaded, synchronous and pure: identical input
//! always yields an identical [`GeneratedUnit`].

mod compose;
mod dispatch;
mod error;
mod group;
mod options;
mod plan;
mod synth;
mod unit;
mod validate;
mod well_formed;

#[cfg(test)]
mod test_helpers;

use std::sync::Once;

pub use compose::{compose_binding, compose_when_any, compose_when_any_observable};
pub use dispatch::{
    build_entry_point, parameters_for, CallerInfo, DispatchArm, EntryPoint, MatchRule, ParamKind,
    Parameter,
};
pub use error::{MalformedReason, OptionsError, SynthError};
pub use group::{group_call_sites, SignatureKey, TypeSignatureGroup};
pub use options::{DispatchStrategy, SynthOptions};
pub use plan::{
    BindingMode, BindingOrigin, BindingPlan, FuncSlot, ImplPlan, PipelinePlan, Stage,
};
pub use synth::{synthesize_observation, synthesize_path};
pub use unit::{
    entry_point_name, generate, generate_all, implementation_name, plan_call_site,
    GeneratedUnit, Implementation,
};
pub use validate::{check_unit, UnitProblem};
pub use well_formed::check_call_site;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for debug output.
///
/// Call this once at startup. Safe to call multiple times.
/// Enable with `RUST_LOG=tether_synth=debug` or `RUST_LOG=tether_rt=trace`.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        // Only initialize if RUST_LOG is set
        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
