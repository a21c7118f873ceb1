// Result collector - the frozen graph's verdict, classified and ordered

use std::collections::HashSet;
use tracing::info;

use super::{ResultCategory, ScanResult};
use crate::graph::{DeclarationKind, SourceGraph};

/// Enumerates declarations that remain neither retained nor structurally
/// required, classifies each finding, and emits the ordered result set.
pub struct ResultCollector;

impl ResultCollector {
    pub fn new() -> Self {
        Self
    }

    pub fn collect(&self, graph: &SourceGraph) -> Vec<ScanResult> {
        let mut results: Vec<ScanResult> = Vec::new();

        for decl in graph.declarations() {
            if decl.is_implicit || graph.is_live(decl.id) || decl.is_structurally_required() {
                continue;
            }

            if decl.kind == DeclarationKind::VarParameter {
                // A dead function is reported whole; its parameters only
                // matter while the function itself survives.
                let parent_live = decl.parent.is_some_and(|p| graph.is_live(p));
                if parent_live {
                    results.push(ScanResult::for_declaration(decl, ResultCategory::UnusedParameter));
                }
                continue;
            }

            results.push(ScanResult::for_declaration(
                decl,
                ResultCategory::UnusedDeclaration,
            ));
        }

        for id in graph.redundant_public_ids() {
            if graph.is_live(id) {
                results.push(ScanResult::for_declaration(
                    graph.declaration(id),
                    ResultCategory::RedundantPublicAccessibility,
                ));
            }
        }

        for id in graph.assign_only_ids() {
            if graph.is_live(id) && !graph.is_retained(id) {
                results.push(ScanResult::for_declaration(
                    graph.declaration(id),
                    ResultCategory::AssignOnlyProperty,
                ));
            }
        }

        for &(conformer, protocol) in graph.redundant_conformance_pairs() {
            let conformer_decl = graph.declaration(conformer);
            let protocol_decl = graph.declaration(protocol);
            results.push(ScanResult {
                usr: format!(
                    "conformance:{}:{}",
                    conformer_decl.primary_usr(),
                    protocol_decl.primary_usr()
                ),
                kind: protocol_decl.kind,
                name: protocol_decl.name.clone(),
                location: conformer_decl.location.clone(),
                category: ResultCategory::RedundantConformance,
                message: format!(
                    "Conformance of '{}' to '{}' contributes no used members",
                    conformer_decl.name_or_usr(),
                    protocol_decl.name_or_usr()
                ),
            });
        }

        for (file, import) in graph.unused_imports() {
            results.push(ScanResult {
                usr: format!("import:{}:{}", file.display(), import.module),
                kind: DeclarationKind::Module,
                name: Some(import.module.clone()),
                location: import.location.clone(),
                category: ResultCategory::UnusedImport,
                message: format!("Import '{}' is never used", import.module),
            });
        }

        results.sort_by(|a, b| {
            (&a.location.file, a.location.line, a.location.column, a.category.code())
                .cmp(&(&b.location.file, b.location.line, b.location.column, b.category.code()))
        });

        let mut seen: HashSet<String> = HashSet::new();
        results.retain(|result| seen.insert(result.usr.clone()));

        info!("Collected {} results", results.len());
        results
    }
}

impl Default for ResultCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Declaration, DeclarationId, Location};
    use std::collections::BTreeSet;

    fn add(graph: &mut SourceGraph, usr: &str, file: &str, line: u32) -> DeclarationId {
        graph.add_declaration(Declaration::new(
            DeclarationId(0),
            DeclarationKind::FunctionFree,
            BTreeSet::from([usr.to_string()]),
            Some(usr.to_string()),
            Location::new(file, line, 6),
        ))
    }

    #[test]
    fn test_dead_declarations_are_reported_in_order() {
        let mut graph = SourceGraph::new();
        add(&mut graph, "s:late", "B.swift", 9);
        add(&mut graph, "s:early", "A.swift", 2);
        add(&mut graph, "s:mid", "A.swift", 7);

        let results = ResultCollector::new().collect(&graph);
        let usrs: Vec<&str> = results.iter().map(|r| r.usr.as_str()).collect();
        assert_eq!(usrs, vec!["s:early", "s:mid", "s:late"]);
        assert!(results
            .iter()
            .all(|r| r.category == ResultCategory::UnusedDeclaration));
    }

    #[test]
    fn test_live_declarations_are_not_reported() {
        let mut graph = SourceGraph::new();
        let live = add(&mut graph, "s:live", "A.swift", 1);
        add(&mut graph, "s:dead", "A.swift", 5);
        graph.mark_live(live);

        let results = ResultCollector::new().collect(&graph);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].usr, "s:dead");
    }

    #[test]
    fn test_implicit_declarations_are_never_reported() {
        let mut graph = SourceGraph::new();
        let mut decl = Declaration::new(
            DeclarationId(0),
            DeclarationKind::Constructor,
            BTreeSet::from(["s:init".to_string()]),
            Some("init(from:)".to_string()),
            Location::new("A.swift", 1, 1),
        );
        decl.is_implicit = true;
        graph.add_declaration(decl);

        assert!(ResultCollector::new().collect(&graph).is_empty());
    }

    #[test]
    fn test_structurally_required_declarations_are_skipped() {
        let mut graph = SourceGraph::new();
        graph.add_declaration(Declaration::new(
            DeclarationId(0),
            DeclarationKind::Destructor,
            BTreeSet::from(["s:deinit".to_string()]),
            Some("deinit".to_string()),
            Location::new("A.swift", 3, 5),
        ));

        assert!(ResultCollector::new().collect(&graph).is_empty());
    }

    #[test]
    fn test_parameter_of_dead_function_is_not_reported() {
        let mut graph = SourceGraph::new();
        let function = add(&mut graph, "s:deadFunc", "A.swift", 1);
        let parameter = graph.add_declaration(Declaration::new(
            DeclarationId(0),
            DeclarationKind::VarParameter,
            BTreeSet::from(["param:A.swift:1:6:b".to_string()]),
            Some("b".to_string()),
            Location::new("A.swift", 1, 6),
        ));
        graph.set_parent(parameter, function);

        let results = ResultCollector::new().collect(&graph);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].usr, "s:deadFunc");
    }
}
