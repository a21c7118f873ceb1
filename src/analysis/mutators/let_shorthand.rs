//! Let-shorthand linker.
//!
//! `if let foo { ... }` binds a shadow of a property named `foo` without
//! the index recording a reference to it. Declarations carrying shorthand
//! identifiers get a reference to the container property, which is also
//! marked so later passes know its shadow bindings count as uses.

use tracing::debug;

use super::Mutator;
use crate::error::ScanError;
use crate::graph::{DeclarationId, Reference, SourceGraph};

pub struct LetShorthandLinker;

impl LetShorthandLinker {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a shorthand identifier to the property it shadows: nearest
    /// enclosing scope first, then top-level variables of the same file.
    fn resolve_container(
        &self,
        graph: &SourceGraph,
        binder: DeclarationId,
        name: &str,
    ) -> Option<DeclarationId> {
        let mut scope = graph.declaration(binder).parent;
        while let Some(current) = scope {
            let found = graph
                .declaration(current)
                .children
                .iter()
                .copied()
                .find(|&child| {
                    let decl = graph.declaration(child);
                    decl.kind.is_variable() && decl.name.as_deref() == Some(name)
                });
            if found.is_some() {
                return found;
            }
            scope = graph.declaration(current).parent;
        }

        let file = &graph.declaration(binder).location.file;
        graph
            .declarations()
            .find(|decl| {
                decl.parent.is_none()
                    && decl.kind.is_variable()
                    && decl.location.file == *file
                    && decl.name.as_deref() == Some(name)
            })
            .map(|decl| decl.id)
    }
}

impl Mutator for LetShorthandLinker {
    fn name(&self) -> &'static str {
        "let-shorthand-linker"
    }

    fn mutate(&self, graph: &mut SourceGraph) -> Result<(), ScanError> {
        let binders: Vec<(DeclarationId, Vec<String>)> = graph
            .declarations()
            .filter(|decl| !decl.let_shorthand_identifiers.is_empty())
            .map(|decl| {
                let mut names: Vec<String> =
                    decl.let_shorthand_identifiers.iter().cloned().collect();
                names.sort();
                (decl.id, names)
            })
            .collect();

        for (binder, names) in binders {
            for name in names {
                let Some(container) = self.resolve_container(graph, binder, &name) else {
                    debug!("No container property found for shorthand '{}'", name);
                    continue;
                };
                graph.mark_let_shorthand_container(container);
                let usr = graph.declaration(container).primary_usr().to_string();
                let kind = graph.declaration(container).kind;
                let location = graph.declaration(binder).location.clone();
                graph.add_reference(
                    binder,
                    Reference::new(kind, usr, location).with_name(name),
                );
            }
        }

        Ok(())
    }
}

impl Default for LetShorthandLinker {
    fn default() -> Self {
        Self::new()
    }
}
