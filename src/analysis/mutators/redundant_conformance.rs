//! Redundant conformance marker.
//!
//! A conformance is redundant when the protocol contributes nothing the
//! concrete type would not have anyway: no live declaration uses the
//! protocol as an abstraction, and no protocol member is referenced by
//! live code.

use tracing::debug;

use super::Mutator;
use crate::error::ScanError;
use crate::graph::{DeclarationId, SourceGraph};

pub struct RedundantConformanceMarker;

impl RedundantConformanceMarker {
    pub fn new() -> Self {
        Self
    }

    fn has_live_plain_use(&self, graph: &SourceGraph, id: DeclarationId) -> bool {
        graph
            .references_to(id)
            .iter()
            .any(|(parent, reference)| !reference.is_related && graph.is_live(*parent))
    }
}

impl Mutator for RedundantConformanceMarker {
    fn name(&self) -> &'static str {
        "redundant-conformance-marker"
    }

    fn mutate(&self, graph: &mut SourceGraph) -> Result<(), ScanError> {
        let mut pairs: Vec<(DeclarationId, DeclarationId)> = graph.conformance_pairs().collect();
        pairs.sort();

        for (conformer, protocol) in pairs {
            // A dead conformer is reported whole; its conformances with it.
            if !graph.is_live(conformer) {
                continue;
            }

            let used_as_abstraction = self.has_live_plain_use(graph, protocol);
            let member_used = graph
                .declaration(protocol)
                .children
                .iter()
                .any(|&member| self.has_live_plain_use(graph, member));

            if !used_as_abstraction && !member_used {
                debug!(
                    "Redundant conformance of {} to {}",
                    graph.declaration(conformer).display(),
                    graph.declaration(protocol).display()
                );
                graph.mark_redundant_conformance(conformer, protocol);
            }
        }

        Ok(())
    }
}

impl Default for RedundantConformanceMarker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Declaration, DeclarationKind, Location, Reference};
    use std::collections::BTreeSet;

    fn fixture(
        with_abstraction_use: bool,
        conformer_live: bool,
    ) -> (SourceGraph, DeclarationId, DeclarationId) {
        let mut graph = SourceGraph::new();
        let protocol = graph.add_declaration(Declaration::new(
            DeclarationId(0),
            DeclarationKind::Protocol,
            BTreeSet::from(["s:PP".to_string()]),
            Some("P".to_string()),
            Location::new("A.swift", 1, 10),
        ));
        let conformer = graph.add_declaration(Declaration::new(
            DeclarationId(0),
            DeclarationKind::Struct,
            BTreeSet::from(["s:SV".to_string()]),
            Some("S".to_string()),
            Location::new("A.swift", 5, 8),
        ));
        let user = graph.add_declaration(Declaration::new(
            DeclarationId(0),
            DeclarationKind::FunctionFree,
            BTreeSet::from(["s:useyyF".to_string()]),
            Some("use()".to_string()),
            Location::new("A.swift", 10, 6),
        ));
        graph.record_conformance(conformer, protocol);
        if conformer_live {
            graph.mark_live(conformer);
        }
        graph.mark_live(user);
        graph.mark_live(protocol);

        if with_abstraction_use {
            graph.add_reference(
                user,
                Reference::new(DeclarationKind::Protocol, "s:PP", Location::new("A.swift", 11, 12)),
            );
        }

        (graph, conformer, protocol)
    }

    #[test]
    fn test_unused_abstraction_is_redundant() {
        let (mut graph, conformer, protocol) = fixture(false, true);
        RedundantConformanceMarker::new().mutate(&mut graph).unwrap();
        assert_eq!(graph.redundant_conformance_pairs(), &[(conformer, protocol)]);
    }

    #[test]
    fn test_used_abstraction_is_not_redundant() {
        let (mut graph, _, _) = fixture(true, true);
        RedundantConformanceMarker::new().mutate(&mut graph).unwrap();
        assert!(graph.redundant_conformance_pairs().is_empty());
    }

    #[test]
    fn test_dead_conformer_is_skipped() {
        let (mut graph, _, _) = fixture(false, false);
        RedundantConformanceMarker::new().mutate(&mut graph).unwrap();
        assert!(graph.redundant_conformance_pairs().is_empty());
    }
}
