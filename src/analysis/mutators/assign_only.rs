//! Assign-only property marker.
//!
//! A property whose every incoming reference is a write holds state
//! nobody reads. Such properties stay live through the writes, so they
//! are classified here rather than by reachability.

use super::Mutator;
use crate::error::ScanError;
use crate::graph::{DeclarationId, DeclarationKind, SourceGraph};

pub struct AssignOnlyPropertyMarker {
    retain_assign_only: bool,
}

impl AssignOnlyPropertyMarker {
    pub fn new(retain_assign_only: bool) -> Self {
        Self { retain_assign_only }
    }
}

impl Mutator for AssignOnlyPropertyMarker {
    fn name(&self) -> &'static str {
        "assign-only-property-marker"
    }

    fn mutate(&self, graph: &mut SourceGraph) -> Result<(), ScanError> {
        if self.retain_assign_only {
            return Ok(());
        }

        let marked: Vec<DeclarationId> = graph
            .declarations()
            .filter(|decl| {
                matches!(
                    decl.kind,
                    DeclarationKind::VarInstance
                        | DeclarationKind::VarClass
                        | DeclarationKind::VarStatic
                        | DeclarationKind::VarGlobal
                )
            })
            .filter(|decl| {
                let references = graph.references_to(decl.id);
                !references.is_empty() && references.iter().all(|(_, r)| r.is_write)
            })
            .map(|decl| decl.id)
            .collect();

        for id in marked {
            graph.mark_assign_only(id);
        }

        Ok(())
    }
}
