//! Mutation passes over the source graph.
//!
//! A fixed, ordered pipeline. Each pass either adds references to model a
//! language semantic the compiler index omits, or marks declarations
//! retained. Retain marks are never removed, so the retained set grows
//! monotonically across passes. The order below is authoritative; later
//! passes depend on the graph shape established earlier.

mod accessibility;
mod assign_only;
mod comment_commands;
mod entry_points;
mod let_shorthand;
mod override_chain;
mod protocol_conformance;
mod redundant_conformance;
mod synthesized;
mod unused_imports;
mod unused_params;

pub use accessibility::AccessibilityCascade;
pub use assign_only::AssignOnlyPropertyMarker;
pub use comment_commands::CommentCommandRetainer;
pub use entry_points::EntryPointRetainer;
pub use let_shorthand::LetShorthandLinker;
pub use override_chain::OverrideChainExpander;
pub use protocol_conformance::ProtocolConformanceExpander;
pub use redundant_conformance::RedundantConformanceMarker;
pub use synthesized::SynthesizedMemberRetainer;
pub use unused_imports::UnusedImportMarker;
pub use unused_params::UnusedParameterMarker;

use std::collections::{BTreeSet, HashMap};

use crate::config::Config;
use crate::error::ScanError;
use crate::graph::{Location, SourceGraph};

/// A single mutation pass with one responsibility.
pub trait Mutator {
    fn name(&self) -> &'static str;

    fn mutate(&self, graph: &mut SourceGraph) -> Result<(), ScanError>;
}

/// Build the ordered pass pipeline that runs before reachability.
pub fn pre_reachability_passes(
    config: &Config,
    unused_parameters: HashMap<Location, BTreeSet<String>>,
) -> Vec<Box<dyn Mutator>> {
    vec![
        Box::new(AccessibilityCascade::new(config.retain_public)),
        Box::new(ProtocolConformanceExpander::new()),
        Box::new(OverrideChainExpander::new()),
        Box::new(SynthesizedMemberRetainer::new(
            config.external_encodable_protocols.clone(),
        )),
        Box::new(EntryPointRetainer::new(config.retain_objc_accessible)),
        Box::new(CommentCommandRetainer::new(config.ignore_comment_commands)),
        Box::new(AssignOnlyPropertyMarker::new(
            config.retain_assign_only_properties,
        )),
        Box::new(UnusedParameterMarker::new(
            unused_parameters,
            config.retain_objc_accessible,
            config.retain_unused_protocol_func_params,
            config.ignore_comment_commands,
        )),
        Box::new(LetShorthandLinker::new()),
    ]
}

/// Passes that classify against the live set, run after reachability.
pub fn post_reachability_passes(_config: &Config) -> Vec<Box<dyn Mutator>> {
    vec![
        Box::new(UnusedImportMarker::new()),
        Box::new(RedundantConformanceMarker::new()),
    ]
}
