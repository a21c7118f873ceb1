//! Accessibility cascade.
//!
//! Effective accessibility of a declaration is the minimum of its declared
//! accessibility and that of every enclosing declaration. With
//! `retain_public` set, public and open declarations are retained; without
//! it, explicit public declarations never referenced outside their own
//! modules are recorded as redundant-public candidates.

use std::collections::BTreeSet;
use tracing::debug;

use super::Mutator;
use crate::error::ScanError;
use crate::graph::{Accessibility, DeclarationId, SourceGraph};

pub struct AccessibilityCascade {
    retain_public: bool,
}

impl AccessibilityCascade {
    pub fn new(retain_public: bool) -> Self {
        Self { retain_public }
    }

    fn effective(&self, graph: &SourceGraph, id: DeclarationId) -> Accessibility {
        let mut value = graph.declaration(id).accessibility.value;
        let mut current = graph.declaration(id).parent;
        while let Some(ancestor) = current {
            value = value.min(graph.declaration(ancestor).accessibility.value);
            current = graph.declaration(ancestor).parent;
        }
        value
    }

    /// Whether every reference to the declaration originates in a file of
    /// the declaration's own modules.
    fn only_used_inside_own_modules(&self, graph: &SourceGraph, id: DeclarationId) -> bool {
        let own_modules: BTreeSet<String> = graph.modules_of(id);
        graph.references_to(id).iter().all(|(parent, _)| {
            graph
                .modules_of(*parent)
                .iter()
                .all(|module| own_modules.contains(module))
        })
    }
}

impl Mutator for AccessibilityCascade {
    fn name(&self) -> &'static str {
        "accessibility-cascade"
    }

    fn mutate(&self, graph: &mut SourceGraph) -> Result<(), ScanError> {
        let ids: Vec<DeclarationId> = graph.declaration_ids().collect();

        for id in ids {
            let effective = self.effective(graph, id);
            graph.set_effective_accessibility(id, effective);

            if !effective.is_accessible_outside_module() {
                continue;
            }

            if self.retain_public {
                graph.retain(id);
            } else if graph.declaration(id).accessibility.is_explicit
                && graph.is_referenced(id)
                && self.only_used_inside_own_modules(graph, id)
            {
                debug!(
                    "Redundant public accessibility: {}",
                    graph.declaration(id).display()
                );
                graph.mark_redundant_public(id);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Declaration, DeclarationKind, Location};
    use std::collections::BTreeSet as Set;

    fn add_class(graph: &mut SourceGraph, usr: &str, accessibility: Accessibility) -> DeclarationId {
        let mut decl = Declaration::new(
            DeclarationId(0),
            DeclarationKind::Class,
            Set::from([usr.to_string()]),
            Some(usr.to_string()),
            Location::new("A.swift", 1, 7),
        );
        decl.accessibility.value = accessibility;
        decl.accessibility.is_explicit = true;
        graph.add_declaration(decl)
    }

    #[test]
    fn test_effective_accessibility_is_min_of_chain() {
        let mut graph = SourceGraph::new();
        let outer = add_class(&mut graph, "s:outer", Accessibility::Internal);
        let inner = graph.add_declaration({
            let mut decl = Declaration::new(
                DeclarationId(0),
                DeclarationKind::MethodInstance,
                Set::from(["s:inner".to_string()]),
                Some("inner()".to_string()),
                Location::new("A.swift", 2, 10),
            );
            decl.accessibility.value = Accessibility::Public;
            decl
        });
        graph.set_parent(inner, outer);

        AccessibilityCascade::new(false).mutate(&mut graph).unwrap();
        assert_eq!(graph.effective_accessibility(inner), Accessibility::Internal);
    }

    #[test]
    fn test_retain_public_marks_public_declarations() {
        let mut graph = SourceGraph::new();
        let public = add_class(&mut graph, "s:pub", Accessibility::Public);
        let internal = add_class(&mut graph, "s:int", Accessibility::Internal);

        AccessibilityCascade::new(true).mutate(&mut graph).unwrap();
        assert!(graph.is_retained(public));
        assert!(!graph.is_retained(internal));
    }
}
