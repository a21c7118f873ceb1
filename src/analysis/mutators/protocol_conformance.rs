//! Protocol conformance expander.
//!
//! The index records a conformance as a structural reference from the
//! conforming type to the protocol, but nothing links a protocol member to
//! the declaration that fulfills it. This pass records conformances and
//! synthesizes related references from each protocol member to its
//! concrete implementation, so that usage through the abstraction retains
//! the concrete declaration. Default implementations provided by protocol
//! extensions are linked the same way.

use tracing::debug;

use super::Mutator;
use crate::error::ScanError;
use crate::graph::{DeclarationId, DeclarationKind, Reference, SourceGraph};

pub struct ProtocolConformanceExpander;

impl ProtocolConformanceExpander {
    pub fn new() -> Self {
        Self
    }

    fn discover_conformances(&self, graph: &mut SourceGraph) {
        let mut pairs: Vec<(DeclarationId, DeclarationId)> = Vec::new();
        for decl in graph.declarations() {
            if !decl.kind.is_conformable() {
                continue;
            }
            for (target, reference) in graph.references_from(decl.id) {
                if reference.is_related && graph.declaration(target).kind == DeclarationKind::Protocol
                {
                    pairs.push((decl.id, target));
                }
            }
        }
        pairs.sort();
        pairs.dedup();
        for (conformer, protocol) in pairs {
            debug!(
                "Conformance: {} adopts {}",
                graph.declaration(conformer).display(),
                graph.declaration(protocol).display()
            );
            graph.record_conformance(conformer, protocol);
        }
    }

    /// Find the member of `conformer` that fulfills the protocol member.
    fn implementation_of(
        &self,
        graph: &SourceGraph,
        conformer: DeclarationId,
        member: DeclarationId,
    ) -> Option<DeclarationId> {
        let requirement = graph.declaration(member);
        graph
            .declaration(conformer)
            .children
            .iter()
            .copied()
            .find(|&child| {
                let candidate = graph.declaration(child);
                candidate.name == requirement.name
                    && kinds_fulfill(requirement.kind, candidate.kind)
            })
    }

    /// Protocol extensions of `protocol` that declare a member with the
    /// requirement's name provide its default implementation.
    fn default_implementation_of(
        &self,
        graph: &SourceGraph,
        protocol: DeclarationId,
        member: DeclarationId,
    ) -> Option<DeclarationId> {
        let protocol_name = graph.declaration(protocol).name.clone()?;
        let requirement = graph.declaration(member);
        graph
            .declarations()
            .filter(|d| {
                d.kind == DeclarationKind::ExtensionProtocol
                    && d.name.as_deref() == Some(protocol_name.as_str())
            })
            .flat_map(|extension| extension.children.iter().copied())
            .find(|&child| {
                let candidate = graph.declaration(child);
                candidate.name == requirement.name
                    && kinds_fulfill(requirement.kind, candidate.kind)
            })
    }

    fn link(&self, graph: &mut SourceGraph, member: DeclarationId, implementation: DeclarationId) {
        let usr = graph.declaration(implementation).primary_usr().to_string();
        let kind = graph.declaration(implementation).kind;
        let location = graph.declaration(member).location.clone();
        let reference = Reference::new(kind, usr, location).related();
        let reference = match graph.declaration(implementation).name.clone() {
            Some(name) => reference.with_name(name),
            None => reference,
        };
        graph.add_reference(member, reference);
    }
}

impl Mutator for ProtocolConformanceExpander {
    fn name(&self) -> &'static str {
        "protocol-conformance-expander"
    }

    fn mutate(&self, graph: &mut SourceGraph) -> Result<(), ScanError> {
        self.discover_conformances(graph);

        let pairs: Vec<(DeclarationId, DeclarationId)> = graph.conformance_pairs().collect();
        let mut links: Vec<(DeclarationId, DeclarationId)> = Vec::new();

        for (conformer, protocol) in pairs {
            let members: Vec<DeclarationId> = graph.declaration(protocol).children.clone();
            for member in members {
                if let Some(implementation) = self.implementation_of(graph, conformer, member) {
                    links.push((member, implementation));
                } else if let Some(default) =
                    self.default_implementation_of(graph, protocol, member)
                {
                    links.push((member, default));
                }
            }
        }

        links.sort();
        links.dedup();
        for (member, implementation) in links {
            self.link(graph, member, implementation);
        }

        Ok(())
    }
}

impl Default for ProtocolConformanceExpander {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether a concrete member of the given kind can fulfill a protocol
/// requirement of the given kind.
fn kinds_fulfill(requirement: DeclarationKind, candidate: DeclarationKind) -> bool {
    use DeclarationKind::*;
    match requirement {
        MethodInstance | MethodClass | MethodStatic => {
            matches!(candidate, MethodInstance | MethodClass | MethodStatic)
        }
        VarInstance | VarClass | VarStatic => {
            matches!(candidate, VarInstance | VarClass | VarStatic)
        }
        Subscript => candidate == Subscript,
        Constructor => candidate == Constructor,
        AssociatedType => matches!(candidate, TypeAlias | AssociatedType | Enum | Struct | Class),
        OperatorInfix | OperatorPrefix | OperatorPostfix => {
            matches!(
                candidate,
                OperatorInfix | OperatorPrefix | OperatorPostfix | MethodStatic
            )
        }
        _ => requirement == candidate,
    }
}
