//! Override chain expander.
//!
//! The index records an override as a related reference from the override
//! to its base. Calls can be dispatched through either form, so this pass
//! mirrors the edge: calling the base keeps a final override alive, and
//! calling the override keeps its base alive.

use super::Mutator;
use crate::error::ScanError;
use crate::graph::{DeclarationId, DeclarationKind, Reference, SourceGraph};

pub struct OverrideChainExpander;

impl OverrideChainExpander {
    pub fn new() -> Self {
        Self
    }

    fn is_overridable(kind: DeclarationKind) -> bool {
        kind.is_function() || kind.is_variable() || kind == DeclarationKind::Subscript
    }
}

impl Mutator for OverrideChainExpander {
    fn name(&self) -> &'static str {
        "override-chain-expander"
    }

    fn mutate(&self, graph: &mut SourceGraph) -> Result<(), ScanError> {
        let mut mirrored: Vec<(DeclarationId, DeclarationId)> = Vec::new();

        for decl in graph.declarations() {
            if !Self::is_overridable(decl.kind) || !decl.has_modifier("override") {
                continue;
            }
            for (base, reference) in graph.references_from(decl.id) {
                if reference.is_related
                    && Self::is_overridable(graph.declaration(base).kind)
                    && graph.declaration(base).name == decl.name
                {
                    mirrored.push((base, decl.id));
                }
            }
        }

        mirrored.sort();
        mirrored.dedup();
        for (base, override_decl) in mirrored {
            let usr = graph.declaration(override_decl).primary_usr().to_string();
            let kind = graph.declaration(override_decl).kind;
            let location = graph.declaration(base).location.clone();
            graph.add_reference(base, Reference::new(kind, usr, location).related());
        }

        Ok(())
    }
}

impl Default for OverrideChainExpander {
    fn default() -> Self {
        Self::new()
    }
}
