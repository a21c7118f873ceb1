//! Entry point retainer.
//!
//! Declarations the program starts from, or that a runtime invokes
//! reflectively, have no in-source call sites; they seed the retained set.

use tracing::debug;

use super::Mutator;
use crate::error::ScanError;
use crate::graph::{Declaration, DeclarationId, DeclarationKind, SourceGraph};

/// Attributes that make a type the program entry point.
const MAIN_ATTRIBUTES: &[&str] = &["main", "UIApplicationMain", "NSApplicationMain"];

/// Attributes that export a symbol past the compiler's visibility.
const EXPORT_ATTRIBUTES: &[&str] = &["cdecl", "_cdecl", "_silgen_name", "usableFromInline"];

/// Interface-builder attributes; the runtime wires these from archives.
const INTERFACE_BUILDER_ATTRIBUTES: &[&str] = &[
    "IBAction",
    "IBOutlet",
    "IBInspectable",
    "IBDesignable",
    "IBSegueAction",
    "GKInspectable",
];

/// Base classes whose subclasses the test runner discovers at runtime.
const TEST_BASE_CLASSES: &[&str] = &["XCTestCase", "QuickSpec"];

pub struct EntryPointRetainer {
    retain_objc_exposed: bool,
}

impl EntryPointRetainer {
    pub fn new(retain_objc_exposed: bool) -> Self {
        Self { retain_objc_exposed }
    }

    fn is_main_function(decl: &Declaration) -> bool {
        decl.kind == DeclarationKind::FunctionFree
            && decl
                .name
                .as_deref()
                .is_some_and(|name| name == "main()" || name.starts_with("main("))
    }

    fn has_any_attribute(decl: &Declaration, attributes: &[&str]) -> bool {
        attributes.iter().any(|a| decl.has_attribute(a))
    }

    /// Walk the inheritance chain looking for a test base class. The base
    /// usually lives outside the scanned sources, so unresolved related
    /// reference names count too.
    fn inherits_test_base(&self, graph: &SourceGraph, id: DeclarationId) -> bool {
        let mut worklist = vec![id];
        let mut visited = vec![];
        while let Some(current) = worklist.pop() {
            if visited.contains(&current) {
                continue;
            }
            visited.push(current);

            for (_, reference) in graph
                .all_references()
                .filter(|(p, r)| *p == current && r.is_related)
            {
                if reference
                    .name
                    .as_deref()
                    .is_some_and(|name| TEST_BASE_CLASSES.contains(&name))
                {
                    return true;
                }
                if let Some(target) = graph.declaration_by_usr(&reference.usr) {
                    if graph.declaration(target).kind == DeclarationKind::Class {
                        worklist.push(target);
                    }
                }
            }
        }
        false
    }

    fn is_test_method(&self, graph: &SourceGraph, decl: &Declaration) -> bool {
        if decl.kind != DeclarationKind::MethodInstance {
            return false;
        }
        if !decl.name.as_deref().is_some_and(|name| name.starts_with("test")) {
            return false;
        }
        decl.parent
            .is_some_and(|parent| self.inherits_test_base(graph, parent))
    }
}

impl Mutator for EntryPointRetainer {
    fn name(&self) -> &'static str {
        "entry-point-retainer"
    }

    fn mutate(&self, graph: &mut SourceGraph) -> Result<(), ScanError> {
        let mut retained: Vec<(DeclarationId, bool)> = Vec::new();

        for decl in graph.declarations() {
            if Self::is_main_function(decl) {
                retained.push((decl.id, false));
            } else if Self::has_any_attribute(decl, MAIN_ATTRIBUTES) {
                // The runtime calls through the type's static main().
                retained.push((decl.id, true));
            } else if Self::has_any_attribute(decl, EXPORT_ATTRIBUTES)
                || Self::has_any_attribute(decl, INTERFACE_BUILDER_ATTRIBUTES)
            {
                retained.push((decl.id, false));
            } else if self.retain_objc_exposed
                && (decl.has_attribute("objc") || decl.has_attribute("objcMembers"))
            {
                retained.push((decl.id, decl.has_attribute("objcMembers")));
            } else if self.is_test_method(graph, decl) {
                retained.push((decl.id, false));
            } else if decl.kind == DeclarationKind::Class
                && self.inherits_test_base(graph, decl.id)
            {
                retained.push((decl.id, false));
            }
        }

        for (id, with_descendants) in retained {
            debug!("Entry point: {}", graph.declaration(id).display());
            if with_descendants {
                graph.retain_with_descendants(id);
            } else {
                graph.retain(id);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Location, Reference};
    use std::collections::BTreeSet;

    fn add(
        graph: &mut SourceGraph,
        kind: DeclarationKind,
        usr: &str,
        name: &str,
        line: u32,
    ) -> DeclarationId {
        graph.add_declaration(Declaration::new(
            DeclarationId(0),
            kind,
            BTreeSet::from([usr.to_string()]),
            Some(name.to_string()),
            Location::new("A.swift", line, 1),
        ))
    }

    #[test]
    fn test_main_function_is_retained() {
        let mut graph = SourceGraph::new();
        let main = add(&mut graph, DeclarationKind::FunctionFree, "s:main", "main()", 1);
        let helper = add(&mut graph, DeclarationKind::FunctionFree, "s:help", "helper()", 5);

        EntryPointRetainer::new(false).mutate(&mut graph).unwrap();
        assert!(graph.is_retained(main));
        assert!(!graph.is_retained(helper));
    }

    #[test]
    fn test_main_attribute_retains_type_with_descendants() {
        let mut graph = SourceGraph::new();
        let app = {
            let mut decl = Declaration::new(
                DeclarationId(0),
                DeclarationKind::Struct,
                BTreeSet::from(["s:AppV".to_string()]),
                Some("App".to_string()),
                Location::new("A.swift", 1, 8),
            );
            decl.attributes.insert("main".to_string());
            graph.add_declaration(decl)
        };
        let body = add(&mut graph, DeclarationKind::VarInstance, "s:AppV4body", "body", 2);
        graph.set_parent(body, app);

        EntryPointRetainer::new(false).mutate(&mut graph).unwrap();
        assert!(graph.is_retained(app));
        assert!(graph.is_retained(body));
    }

    #[test]
    fn test_xctest_subclass_methods_are_retained() {
        let mut graph = SourceGraph::new();
        let suite = add(&mut graph, DeclarationKind::Class, "s:SuiteC", "SuiteTests", 1);
        let test = add(
            &mut graph,
            DeclarationKind::MethodInstance,
            "s:SuiteC8testFooyyF",
            "testFoo()",
            2,
        );
        let helper = add(
            &mut graph,
            DeclarationKind::MethodInstance,
            "s:SuiteC6helperyyF",
            "helper()",
            3,
        );
        graph.set_parent(test, suite);
        graph.set_parent(helper, suite);

        graph.add_reference(
            suite,
            Reference::new(
                DeclarationKind::Class,
                "c:objc(cs)XCTestCase",
                Location::new("A.swift", 1, 20),
            )
            .with_name("XCTestCase")
            .related(),
        );

        EntryPointRetainer::new(false).mutate(&mut graph).unwrap();
        assert!(graph.is_retained(suite));
        assert!(graph.is_retained(test));
        assert!(!graph.is_retained(helper));
    }

    #[test]
    fn test_objc_exposure_respects_configuration() {
        let mut graph = SourceGraph::new();
        let exposed = {
            let mut decl = Declaration::new(
                DeclarationId(0),
                DeclarationKind::MethodInstance,
                BTreeSet::from(["s:sel".to_string()]),
                Some("onTap()".to_string()),
                Location::new("A.swift", 4, 10),
            );
            decl.attributes.insert("objc".to_string());
            graph.add_declaration(decl)
        };

        EntryPointRetainer::new(false).mutate(&mut graph).unwrap();
        assert!(!graph.is_retained(exposed));

        EntryPointRetainer::new(true).mutate(&mut graph).unwrap();
        assert!(graph.is_retained(exposed));
    }
}
