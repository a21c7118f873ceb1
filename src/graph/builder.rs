// Graph committer - single-threaded reduction of per-file indexing states

use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

use super::{Declaration, DeclarationId, SourceGraph, SourceFile};
use crate::index::IndexingState;

/// Commits per-file indexing states into the shared source graph and
/// establishes the declaration hierarchy.
///
/// Workers accumulate mutations into their per-file state; this committer
/// drains them on the calling thread, which is observationally equivalent
/// to locking without contention on the hot path.
pub struct GraphCommitter;

impl GraphCommitter {
    pub fn new() -> Self {
        Self
    }

    pub fn commit(&self, mut states: Vec<IndexingState>, graph: &mut SourceGraph) {
        // Commit order must not depend on worker completion order.
        states.sort_by(|a, b| a.file.cmp(&b.file));

        let parameter_usrs: HashSet<String> = states
            .iter()
            .flat_map(|s| s.parameter_usrs.iter().cloned())
            .collect();

        let mut parent_usrs: Vec<(DeclarationId, String)> = Vec::new();
        let mut related: Vec<(DeclarationId, Vec<crate::graph::Reference>)> = Vec::new();

        for state in &mut states {
            let mut file = SourceFile::new(state.file.clone());
            file.modules = state.modules.clone();
            graph.register_file(file);

            for raw in Self::drop_parameter_orphans(
                std::mem::take(&mut state.declarations),
                &parameter_usrs,
            ) {
                let decl = Declaration {
                    is_implicit: raw.is_implicit,
                    is_objc_accessible: raw.is_objc_accessible,
                    ..Declaration::new(
                        DeclarationId(0),
                        raw.kind,
                        raw.usrs,
                        raw.name,
                        raw.location,
                    )
                };
                let id = graph.add_declaration(decl);

                if raw.retain_at_ingest {
                    graph.retain(id);
                }
                if let Some(parent_usr) = raw.parent_usr {
                    parent_usrs.push((id, parent_usr));
                }
                if !raw.related.is_empty() {
                    related.push((id, raw.related));
                }
            }

            for (referencer_usr, bucket) in state.reference_buckets.drain() {
                graph.stash_reference_bucket(referencer_usr, bucket);
            }
            for reference in state.dangling.drain(..) {
                graph.stash_dangling(reference);
            }
        }

        // Hierarchy: resolve recorded parent symbol-ids now that every file
        // is committed. Unresolvable parents leave the children top-level.
        let mut adopted = 0usize;
        for (child, parent_usr) in parent_usrs {
            if let Some(parent) = graph.declaration_by_usr(&parent_usr) {
                if parent != child {
                    graph.set_parent(child, parent);
                    adopted += 1;
                }
            } else {
                debug!(
                    "Orphan declaration {} stays top-level (parent {} unknown)",
                    graph.declaration(child).display(),
                    parent_usr
                );
            }
        }

        // Override bases recorded at ingest become related references once
        // their targets are resolvable.
        for (id, references) in related {
            for reference in references {
                graph.add_reference(id, reference);
            }
        }

        info!(
            "Committed {} declarations ({} with parents)",
            graph.declaration_count(),
            adopted
        );
    }

    /// Children whose recorded parent is a parameter are synthesized
    /// accessors of that parameter and are dropped, transitively.
    fn drop_parameter_orphans(
        declarations: Vec<crate::index::RawDeclaration>,
        parameter_usrs: &HashSet<String>,
    ) -> Vec<crate::index::RawDeclaration> {
        let mut dropped_usrs: BTreeSet<String> = BTreeSet::new();
        let mut keep: Vec<bool> = vec![true; declarations.len()];

        loop {
            let mut changed = false;
            for (index, raw) in declarations.iter().enumerate() {
                if !keep[index] {
                    continue;
                }
                let Some(parent_usr) = &raw.parent_usr else {
                    continue;
                };
                if parameter_usrs.contains(parent_usr) || dropped_usrs.contains(parent_usr) {
                    keep[index] = false;
                    dropped_usrs.extend(raw.usrs.iter().cloned());
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        declarations
            .into_iter()
            .zip(keep)
            .filter_map(|(raw, kept)| kept.then_some(raw))
            .collect()
    }
}

impl Default for GraphCommitter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::graph::{DeclarationKind, Location};
    use crate::index::{CompilationUnit, IndexSymbol, Ingestor, Occurrence, RelationRole};
    use std::path::Path;

    fn commit(occurrences: Vec<Occurrence>) -> SourceGraph {
        let config = Config::default();
        let ingestor = Ingestor::new(&config);
        let unit = CompilationUnit::new("A.swift", "App").with_occurrences(occurrences);
        let state = ingestor
            .ingest_file(Path::new("A.swift"), &[&unit])
            .unwrap();
        let mut graph = SourceGraph::new();
        GraphCommitter::new().commit(vec![state], &mut graph);
        graph
    }

    #[test]
    fn test_child_of_establishes_hierarchy() {
        let graph = commit(vec![
            Occurrence::definition(
                IndexSymbol::named(DeclarationKind::Class, "s:AAC", "A"),
                Location::new("A.swift", 1, 7),
            ),
            Occurrence::definition(
                IndexSymbol::named(DeclarationKind::MethodInstance, "s:AAC1myyF", "m()"),
                Location::new("A.swift", 2, 10),
            )
            .with_relation(
                RelationRole::ChildOf,
                IndexSymbol::named(DeclarationKind::Class, "s:AAC", "A"),
            ),
        ]);

        let class = graph.declaration_by_usr("s:AAC").unwrap();
        let method = graph.declaration_by_usr("s:AAC1myyF").unwrap();
        assert_eq!(graph.declaration(method).parent, Some(class));
        assert_eq!(graph.declaration(class).children, vec![method]);
    }

    #[test]
    fn test_parameter_children_are_dropped() {
        let graph = commit(vec![
            Occurrence::definition(
                IndexSymbol::named(DeclarationKind::VarParameter, "s:param", "x"),
                Location::new("A.swift", 3, 12),
            ),
            Occurrence::definition(
                IndexSymbol::new(DeclarationKind::AccessorGetter, "s:param:getter"),
                Location::new("A.swift", 3, 12),
            )
            .with_relation(
                RelationRole::ChildOf,
                IndexSymbol::new(DeclarationKind::VarParameter, "s:param"),
            ),
        ]);

        assert_eq!(graph.declaration_count(), 0);
    }

    #[test]
    fn test_unknown_parent_stays_top_level() {
        let graph = commit(vec![Occurrence::definition(
            IndexSymbol::named(DeclarationKind::MethodInstance, "s:orphan", "m()"),
            Location::new("A.swift", 5, 5),
        )
        .with_relation(
            RelationRole::ChildOf,
            IndexSymbol::new(DeclarationKind::Class, "s:missing"),
        )]);

        let orphan = graph.declaration_by_usr("s:orphan").unwrap();
        assert_eq!(graph.declaration(orphan).parent, None);
    }

    #[test]
    fn test_cross_unit_duplicate_definitions_merge() {
        let config = Config::default();
        let ingestor = Ingestor::new(&config);
        let occurrence = Occurrence::definition(
            IndexSymbol::named(DeclarationKind::Struct, "s:SV", "S"),
            Location::new("A.swift", 1, 8),
        );
        let unit_a = CompilationUnit::new("A.swift", "App")
            .with_occurrences(vec![occurrence.clone()]);
        let unit_b = CompilationUnit::new("A.swift", "App").with_occurrences(vec![occurrence]);

        let state = ingestor
            .ingest_file(Path::new("A.swift"), &[&unit_a, &unit_b])
            .unwrap();
        let mut graph = SourceGraph::new();
        GraphCommitter::new().commit(vec![state], &mut graph);

        assert_eq!(graph.declaration_count(), 1);
    }
}
