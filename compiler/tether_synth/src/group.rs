//! Type-signature grouping.
//!
//! Call sites of one kind are partitioned into equivalence classes that can
//! share one externally callable entry point. The key covers everything
//! that shapes the entry point's parameter list: owner type, result type,
//! path arity, the root and leaf type of every path in order, and the flag
//! bits. Source location is deliberately absent, so call sites that differ
//! only in where they appear end up in the same group.
//!
//! Groups come out in first-seen order and members keep discovery order,
//! which makes the generated unit a pure function of the input order.

use std::fmt::Write as _;

use rustc_hash::FxHashMap;
use tether_ir::{CallSite, CallSiteFlags, TypeRef};

/// Composite grouping key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SignatureKey {
    pub owner_type: TypeRef,
    pub result_type: TypeRef,
    pub arity: usize,
    pub root_types: Vec<TypeRef>,
    pub leaf_types: Vec<TypeRef>,
    pub flags: CallSiteFlags,
}

impl SignatureKey {
    pub fn of(site: &CallSite) -> Self {
        SignatureKey {
            owner_type: site.owner_type.clone(),
            result_type: site.result_type.clone(),
            arity: site.paths.len(),
            root_types: site.paths.iter().map(|p| p.root_type().clone()).collect(),
            leaf_types: site.paths.iter().map(|p| p.leaf_type().clone()).collect(),
            flags: site.flags,
        }
    }

    /// Canonical text form, used as the hash discriminator for entry names.
    pub fn describe(&self) -> String {
        let mut out = format!("{}->{}/{}", self.owner_type, self.result_type, self.arity);
        for (root, leaf) in self.root_types.iter().zip(&self.leaf_types) {
            let _ = write!(out, "|{root}:{leaf}");
        }
        let _ = write!(out, "#{:02x}", self.flags.bits());
        out
    }
}

/// Call sites sharing one [`SignatureKey`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeSignatureGroup {
    pub key: SignatureKey,
    pub members: Vec<CallSite>,
}

impl TypeSignatureGroup {
    /// The first member; its shape defines the entry point's parameters.
    pub fn representative(&self) -> &CallSite {
        &self.members[0]
    }
}

/// Partition `sites` by [`SignatureKey`], preserving first-seen order.
pub fn group_call_sites(sites: &[CallSite]) -> Vec<TypeSignatureGroup> {
    let mut index: FxHashMap<SignatureKey, usize> = FxHashMap::default();
    let mut groups: Vec<TypeSignatureGroup> = Vec::new();

    for site in sites {
        let key = SignatureKey::of(site);
        if let Some(&slot) = index.get(&key) {
            groups[slot].members.push(site.clone());
        } else {
            index.insert(key.clone(), groups.len());
            groups.push(TypeSignatureGroup {
                key,
                members: vec![site.clone()],
            });
        }
    }

    tracing::debug!(
        sites = sites.len(),
        groups = groups.len(),
        "grouped call sites by signature"
    );
    groups
}
