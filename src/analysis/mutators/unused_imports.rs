//! Unused import marker.
//!
//! An import is unused when no live declaration of the importing file
//! references a declaration of the imported module, nor the module
//! itself. Only modules covered by the scan are judged; imports of
//! modules the index never saw cannot be proven unused.

use std::collections::BTreeSet;
use tracing::debug;

use super::Mutator;
use crate::error::ScanError;
use crate::graph::{DeclarationKind, SourceGraph};

pub struct UnusedImportMarker;

impl UnusedImportMarker {
    pub fn new() -> Self {
        Self
    }
}

impl Mutator for UnusedImportMarker {
    fn name(&self) -> &'static str {
        "unused-import-marker"
    }

    fn mutate(&self, graph: &mut SourceGraph) -> Result<(), ScanError> {
        let known_modules: BTreeSet<String> = graph
            .files()
            .flat_map(|file| file.modules.iter().cloned())
            .collect();

        let mut files: Vec<_> = graph
            .files()
            .filter(|file| !file.imports.is_empty())
            .map(|file| (file.path.clone(), file.imports.clone()))
            .collect();
        files.sort_by(|a, b| a.0.cmp(&b.0));

        for (path, imports) in files {
            let mut used_modules: BTreeSet<String> = BTreeSet::new();

            for decl in graph.declarations() {
                if decl.location.file != path || !graph.is_live(decl.id) {
                    continue;
                }
                for (target, _) in graph.references_from(decl.id) {
                    used_modules.extend(graph.modules_of(target));
                }
            }
            // Direct module references (e.g. qualified names) count too.
            for (parent, reference) in graph.all_references() {
                if reference.kind == DeclarationKind::Module
                    && graph.declaration(parent).location.file == path
                {
                    if let Some(name) = &reference.name {
                        used_modules.insert(name.clone());
                    }
                }
            }

            for import in imports {
                if !known_modules.contains(&import.module) {
                    continue;
                }
                if !used_modules.contains(&import.module) {
                    debug!("Unused import '{}' in {}", import.module, path.display());
                    graph.mark_unused_import(path.clone(), import);
                }
            }
        }

        Ok(())
    }
}

impl Default for UnusedImportMarker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{
        Declaration, DeclarationId, ImportStatement, Location, Reference, SourceFile,
    };
    use std::collections::BTreeSet as Set;

    fn two_module_fixture(add_use: bool) -> SourceGraph {
        let mut graph = SourceGraph::new();

        let mut app_file = SourceFile::new("App.swift");
        app_file.modules.insert("App".to_string());
        app_file.imports.push(ImportStatement {
            module: "Kit".to_string(),
            location: Location::new("App.swift", 1, 1),
        });
        graph.register_file(app_file);

        let mut kit_file = SourceFile::new("Kit.swift");
        kit_file.modules.insert("Kit".to_string());
        graph.register_file(kit_file);

        let helper = graph.add_declaration(Declaration::new(
            DeclarationId(0),
            DeclarationKind::FunctionFree,
            Set::from(["s:3Kit6helperyyF".to_string()]),
            Some("helper()".to_string()),
            Location::new("Kit.swift", 3, 6),
        ));
        let main = graph.add_declaration(Declaration::new(
            DeclarationId(0),
            DeclarationKind::FunctionFree,
            Set::from(["s:3App4mainyyF".to_string()]),
            Some("main()".to_string()),
            Location::new("App.swift", 3, 6),
        ));

        if add_use {
            graph.add_reference(
                main,
                Reference::new(
                    DeclarationKind::FunctionFree,
                    "s:3Kit6helperyyF",
                    Location::new("App.swift", 4, 5),
                ),
            );
        }

        graph.mark_live(main);
        graph.mark_live(helper);
        graph
    }

    #[test]
    fn test_used_import_is_not_marked() {
        let mut graph = two_module_fixture(true);
        UnusedImportMarker::new().mutate(&mut graph).unwrap();
        assert!(graph.unused_imports().is_empty());
    }

    #[test]
    fn test_unused_import_is_marked() {
        let mut graph = two_module_fixture(false);
        UnusedImportMarker::new().mutate(&mut graph).unwrap();
        assert_eq!(graph.unused_imports().len(), 1);
        assert_eq!(graph.unused_imports()[0].1.module, "Kit");
    }

    #[test]
    fn test_unknown_module_import_is_not_judged() {
        let mut graph = SourceGraph::new();
        let mut file = SourceFile::new("App.swift");
        file.modules.insert("App".to_string());
        file.imports.push(ImportStatement {
            module: "Foundation".to_string(),
            location: Location::new("App.swift", 1, 1),
        });
        graph.register_file(file);

        UnusedImportMarker::new().mutate(&mut graph).unwrap();
        assert!(graph.unused_imports().is_empty());
    }
}
