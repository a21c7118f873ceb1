// Reference reconciler - phase two attachment of parentless references

use rayon::prelude::*;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

use super::{DeclarationId, Location, Reference, SourceGraph};

/// Associates references whose parent declaration was unknown at ingest
/// time, first by referencer symbol-id, then by location heuristics.
pub struct ReferenceReconciler;

impl ReferenceReconciler {
    pub fn new() -> Self {
        Self
    }

    pub fn reconcile(&self, graph: &mut SourceGraph) {
        self.attach_latent(graph);
        self.attach_dangling(graph);
    }

    /// Latent subpass: each bucket is keyed by the symbol-id of its
    /// referencer; attach every reference once that declaration exists.
    fn attach_latent(&self, graph: &mut SourceGraph) {
        let buckets = graph.take_pending_buckets();
        let mut sorted: Vec<_> = buckets.into_iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        let mut attached = 0usize;
        for (referencer_usr, references) in sorted {
            match graph.declaration_by_usr(&referencer_usr) {
                Some(parent) => {
                    for reference in references {
                        graph.add_reference(parent, reference);
                        attached += 1;
                    }
                }
                None => {
                    debug!(
                        "Dropping {} reference(s) owned by unknown symbol {}",
                        references.len(),
                        referencer_usr
                    );
                }
            }
        }
        info!("Attached {} latent references", attached);
    }

    /// Dangling subpass: attach by exact location, falling back to line
    /// number, over explicit (non-implicit) declarations.
    fn attach_dangling(&self, graph: &mut SourceGraph) {
        let dangling = graph.take_pending_dangling();
        if dangling.is_empty() {
            return;
        }

        let mut by_location: HashMap<&Location, Vec<DeclarationId>> = HashMap::new();
        let mut by_line: HashMap<(&PathBuf, u32), Vec<DeclarationId>> = HashMap::new();
        for decl in graph.declarations() {
            if decl.is_implicit {
                continue;
            }
            by_location.entry(&decl.location).or_default().push(decl.id);
            by_line
                .entry((&decl.location.file, decl.location.line))
                .or_default()
                .push(decl.id);
        }

        let assignments: Vec<(DeclarationId, Reference)> = dangling
            .into_par_iter()
            .filter_map(|reference| {
                let candidates = by_location
                    .get(&reference.location)
                    .or_else(|| by_line.get(&(&reference.location.file, reference.location.line)))?;
                let parent = self.choose(graph, candidates)?;
                Some((parent, reference))
            })
            .collect();

        info!("Attached {} dangling references", assignments.len());
        for (parent, reference) in assignments {
            graph.add_reference(parent, reference);
        }
    }

    /// Among candidates, prefer one whose parent is unset; break remaining
    /// ties with a deterministic total order that ranks properties and
    /// subscripts above their accessors.
    fn choose(&self, graph: &SourceGraph, candidates: &[DeclarationId]) -> Option<DeclarationId> {
        if candidates.is_empty() {
            return None;
        }

        let parentless: Vec<DeclarationId> = candidates
            .iter()
            .copied()
            .filter(|&id| graph.declaration(id).parent.is_none())
            .collect();
        let pool = if parentless.is_empty() {
            candidates
        } else {
            parentless.as_slice()
        };

        pool.iter().copied().min_by_key(|&id| {
            let decl = graph.declaration(id);
            (
                decl.kind.reconciliation_rank(),
                decl.location.clone(),
                decl.name.clone(),
                decl.kind,
            )
        })
    }
}

impl Default for ReferenceReconciler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Declaration, DeclarationKind};
    use std::collections::BTreeSet;

    fn add(
        graph: &mut SourceGraph,
        kind: DeclarationKind,
        usr: &str,
        name: &str,
        location: Location,
    ) -> DeclarationId {
        graph.add_declaration(Declaration::new(
            DeclarationId(0),
            kind,
            BTreeSet::from([usr.to_string()]),
            Some(name.to_string()),
            location,
        ))
    }

    #[test]
    fn test_latent_references_attach_by_symbol_id() {
        let mut graph = SourceGraph::new();
        let caller = add(
            &mut graph,
            DeclarationKind::FunctionFree,
            "s:caller",
            "caller()",
            Location::new("A.swift", 1, 6),
        );
        let callee = add(
            &mut graph,
            DeclarationKind::FunctionFree,
            "s:callee",
            "callee()",
            Location::new("A.swift", 5, 6),
        );

        graph.stash_reference_bucket(
            "s:caller".to_string(),
            vec![Reference::new(
                DeclarationKind::FunctionFree,
                "s:callee",
                Location::new("A.swift", 2, 5),
            )],
        );

        ReferenceReconciler::new().reconcile(&mut graph);

        let outgoing = graph.references_from(caller);
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].0, callee);
    }

    #[test]
    fn test_dangling_attaches_by_exact_location() {
        let mut graph = SourceGraph::new();
        let class = add(
            &mut graph,
            DeclarationKind::Class,
            "s:AAC",
            "A",
            Location::new("A.swift", 3, 7),
        );
        add(
            &mut graph,
            DeclarationKind::Class,
            "s:BBC",
            "B",
            Location::new("A.swift", 9, 7),
        );

        graph.stash_dangling(Reference::new(
            DeclarationKind::Protocol,
            "s:PP",
            Location::new("A.swift", 3, 7),
        ));

        ReferenceReconciler::new().reconcile(&mut graph);
        assert_eq!(graph.references_to_usr("s:PP")[0].0, class);
    }

    #[test]
    fn test_dangling_prefers_property_over_accessor_on_same_line() {
        let mut graph = SourceGraph::new();
        let property = add(
            &mut graph,
            DeclarationKind::VarInstance,
            "s:prop",
            "count",
            Location::new("A.swift", 4, 9),
        );
        add(
            &mut graph,
            DeclarationKind::AccessorGetter,
            "s:prop:getter",
            "count",
            Location::new("A.swift", 4, 9),
        );

        graph.stash_dangling(Reference::new(
            DeclarationKind::Struct,
            "s:IntV",
            Location::new("A.swift", 4, 22),
        ));

        ReferenceReconciler::new().reconcile(&mut graph);
        assert_eq!(graph.references_to_usr("s:IntV")[0].0, property);
    }

    #[test]
    fn test_dangling_prefers_parentless_candidate() {
        let mut graph = SourceGraph::new();
        let class = add(
            &mut graph,
            DeclarationKind::Class,
            "s:AAC",
            "A",
            Location::new("A.swift", 1, 7),
        );
        let method = add(
            &mut graph,
            DeclarationKind::MethodInstance,
            "s:AAC1myyF",
            "m()",
            Location::new("A.swift", 1, 20),
        );
        graph.set_parent(method, class);

        graph.stash_dangling(Reference::new(
            DeclarationKind::Protocol,
            "s:PP",
            Location::new("A.swift", 1, 11),
        ));

        ReferenceReconciler::new().reconcile(&mut graph);
        assert_eq!(graph.references_to_usr("s:PP")[0].0, class);
    }

    #[test]
    fn test_unmatched_dangling_is_freed() {
        let mut graph = SourceGraph::new();
        graph.stash_dangling(Reference::new(
            DeclarationKind::Class,
            "s:missing",
            Location::new("Nowhere.swift", 1, 1),
        ));

        ReferenceReconciler::new().reconcile(&mut graph);
        assert!(graph.references_to_usr("s:missing").is_empty());
    }
}
