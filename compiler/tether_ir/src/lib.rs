//! Input model for the Tether binding compiler.
//!
//! Everything in this crate is produced once per compilation pass by the
//! call-site extraction stage and then consumed immutably by `tether_synth`.
//!
//! # Contents
//!
//! - [`PropertyPath`] / [`PropertyPathSegment`]: root-first chain of typed
//!   property accesses. Never empty.
//! - [`CallSite`]: one resolved observation or binding invocation found in
//!   application source, with its [`CallKind`], [`CallSiteFlags`] and
//!   [`SourceLocation`].
//! - [`CapabilityTable`]: owner type → [`TypeCapability`] side table.
//! - [`stable_hash`]: deterministic identifier hashing for generated names.
//!
//! # Pipeline Position
//!
//! ```text
//! Extraction → **tether_ir records** → tether_synth → emission
//! ```

mod call_site;
mod capability;
mod path;
pub mod stable_hash;
mod types;

pub use call_site::{CallKind, CallSite, CallSiteFlags, SourceLocation};
pub use capability::{CapabilityTable, CapabilityTableBuilder, TypeCapability};
pub use path::{PathError, PropertyPath, PropertyPathSegment};
pub use stable_hash::{stable_hash, StableHasher};
pub use types::{NotificationMode, TypeRef};
