// Transitive reachability - closure from the retained set

use petgraph::visit::Dfs;
use std::collections::HashSet;
use tracing::info;

use crate::graph::{DeclarationId, SourceGraph};

/// Computes the live set: every declaration reachable from the retained
/// set over outgoing references (plain and related), plus the ancestors of
/// live declarations, which must stay as containers.
pub struct ReachabilityAnalyzer;

impl ReachabilityAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn mark_live(&self, graph: &mut SourceGraph) {
        let mut live: HashSet<DeclarationId> = graph.retained_ids().collect();
        let mut frontier: Vec<DeclarationId> = live.iter().copied().collect();
        let inner = graph.inner();

        // Ancestors of a live declaration become live themselves, and a
        // live ancestor's own references count (its source line survives),
        // so the traversal loops until no frontier remains.
        while !frontier.is_empty() {
            let mut discovered: HashSet<DeclarationId> = HashSet::new();

            for id in frontier.drain(..) {
                let Some(start) = graph.node_index(id) else {
                    continue;
                };
                let mut dfs = Dfs::new(inner, start);
                while let Some(node) = dfs.next(inner) {
                    if let Some(&reached) = inner.node_weight(node) {
                        if !live.contains(&reached) {
                            discovered.insert(reached);
                        }
                    }
                }
            }

            for id in discovered.iter().copied().collect::<Vec<_>>() {
                let mut ancestor = graph.declaration(id).parent;
                while let Some(current) = ancestor {
                    if live.contains(&current) || discovered.contains(&current) {
                        break;
                    }
                    discovered.insert(current);
                    ancestor = graph.declaration(current).parent;
                }
            }

            // Ancestors found above have not been traversed yet; feed the
            // whole batch back as the next frontier.
            frontier.extend(discovered.iter().copied());
            live.extend(discovered);
        }

        info!("{} of {} declarations are live", live.len(), graph.declaration_count());
        for id in live {
            graph.mark_live(id);
        }
    }
}

impl Default for ReachabilityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Declaration, DeclarationKind, Location, Reference};
    use std::collections::BTreeSet;

    fn add(graph: &mut SourceGraph, usr: &str, line: u32) -> DeclarationId {
        graph.add_declaration(Declaration::new(
            DeclarationId(0),
            DeclarationKind::FunctionFree,
            BTreeSet::from([usr.to_string()]),
            Some(usr.to_string()),
            Location::new("A.swift", line, 6),
        ))
    }

    fn call(graph: &mut SourceGraph, from: DeclarationId, to_usr: &str, line: u32) {
        graph.add_reference(
            from,
            Reference::new(
                DeclarationKind::FunctionFree,
                to_usr,
                Location::new("A.swift", line, 5),
            ),
        );
    }

    #[test]
    fn test_transitive_closure_from_retained_set() {
        let mut graph = SourceGraph::new();
        let root = add(&mut graph, "s:root", 1);
        let reached = add(&mut graph, "s:reached", 5);
        let transitively = add(&mut graph, "s:transitively", 9);
        let dead = add(&mut graph, "s:dead", 13);

        call(&mut graph, root, "s:reached", 2);
        call(&mut graph, reached, "s:transitively", 6);

        graph.retain(root);
        ReachabilityAnalyzer::new().mark_live(&mut graph);

        assert!(graph.is_live(root));
        assert!(graph.is_live(reached));
        assert!(graph.is_live(transitively));
        assert!(!graph.is_live(dead));
    }

    #[test]
    fn test_ancestors_of_live_declarations_are_live() {
        let mut graph = SourceGraph::new();
        let root = add(&mut graph, "s:root", 1);
        let class = graph.add_declaration(Declaration::new(
            DeclarationId(0),
            DeclarationKind::Class,
            BTreeSet::from(["s:AAC".to_string()]),
            Some("A".to_string()),
            Location::new("A.swift", 5, 7),
        ));
        let method = add(&mut graph, "s:AAC4usedyyF", 6);
        graph.set_parent(method, class);

        call(&mut graph, root, "s:AAC4usedyyF", 2);
        graph.retain(root);
        ReachabilityAnalyzer::new().mark_live(&mut graph);

        assert!(graph.is_live(method));
        assert!(graph.is_live(class));
    }

    #[test]
    fn test_live_ancestor_references_are_traversed() {
        // Using S.f keeps S alive, and S's conformance clause keeps P alive.
        let mut graph = SourceGraph::new();
        let root = add(&mut graph, "s:root", 1);
        let conformer = graph.add_declaration(Declaration::new(
            DeclarationId(0),
            DeclarationKind::Struct,
            BTreeSet::from(["s:SV".to_string()]),
            Some("S".to_string()),
            Location::new("A.swift", 5, 8),
        ));
        let method = add(&mut graph, "s:SV1fyyF", 6);
        graph.set_parent(method, conformer);
        let protocol = graph.add_declaration(Declaration::new(
            DeclarationId(0),
            DeclarationKind::Protocol,
            BTreeSet::from(["s:PP".to_string()]),
            Some("P".to_string()),
            Location::new("A.swift", 10, 10),
        ));

        call(&mut graph, root, "s:SV1fyyF", 2);
        graph.add_reference(
            conformer,
            Reference::new(DeclarationKind::Protocol, "s:PP", Location::new("A.swift", 5, 11))
                .related(),
        );

        graph.retain(root);
        ReachabilityAnalyzer::new().mark_live(&mut graph);
        assert!(graph.is_live(protocol));
    }

    #[test]
    fn test_children_of_live_containers_stay_dead() {
        let mut graph = SourceGraph::new();
        let root = add(&mut graph, "s:root", 1);
        let class = graph.add_declaration(Declaration::new(
            DeclarationId(0),
            DeclarationKind::Class,
            BTreeSet::from(["s:AAC".to_string()]),
            Some("A".to_string()),
            Location::new("A.swift", 5, 7),
        ));
        let used = add(&mut graph, "s:AAC4usedyyF", 6);
        let unused = add(&mut graph, "s:AAC6unusedyyF", 7);
        graph.set_parent(used, class);
        graph.set_parent(unused, class);

        call(&mut graph, root, "s:AAC4usedyyF", 2);
        graph.retain(root);
        ReachabilityAnalyzer::new().mark_live(&mut graph);

        assert!(graph.is_live(used));
        assert!(!graph.is_live(unused));
    }
}
