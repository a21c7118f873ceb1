//! Synthesized member retainer.
//!
//! Conformance to Codable, Hashable, CaseIterable, RawRepresentable, and
//! the Encodable/Decodable halves makes the compiler synthesize members
//! (init(from:), encode(to:), hash(into:), allCases, rawValue) that read
//! stored properties and enum cases without any index reference. Those
//! members and the declarations they read must not be reported.

use std::collections::BTreeSet;
use tracing::debug;

use super::Mutator;
use crate::error::ScanError;
use crate::graph::{DeclarationId, DeclarationKind, SourceGraph};

const SYNTHESIZING_PROTOCOLS: &[&str] = &[
    "Codable",
    "Encodable",
    "Decodable",
    "Hashable",
    "CaseIterable",
    "RawRepresentable",
];

const SYNTHESIZED_MEMBER_NAMES: &[&str] = &[
    "init(from:)",
    "encode(to:)",
    "hash(into:)",
    "allCases",
    "rawValue",
    "hashValue",
];

pub struct SynthesizedMemberRetainer {
    protocol_names: BTreeSet<String>,
}

impl SynthesizedMemberRetainer {
    pub fn new(external_encodable_protocols: Vec<String>) -> Self {
        let mut protocol_names: BTreeSet<String> = SYNTHESIZING_PROTOCOLS
            .iter()
            .map(|name| name.to_string())
            .collect();
        protocol_names.extend(external_encodable_protocols);
        Self { protocol_names }
    }

    /// Conformances to synthesizing protocols are matched by name, since
    /// the protocols themselves usually live outside the scanned sources.
    fn synthesizing_conformers(&self, graph: &SourceGraph) -> Vec<DeclarationId> {
        let mut conformers: Vec<DeclarationId> = graph
            .all_references()
            .filter(|(_, reference)| {
                reference.is_related
                    && reference
                        .name
                        .as_deref()
                        .is_some_and(|name| self.protocol_names.contains(name))
            })
            .map(|(parent, _)| parent)
            .filter(|&parent| graph.declaration(parent).kind.is_conformable())
            .collect();
        conformers.sort();
        conformers.dedup();
        conformers
    }
}

impl Mutator for SynthesizedMemberRetainer {
    fn name(&self) -> &'static str {
        "synthesized-member-retainer"
    }

    fn mutate(&self, graph: &mut SourceGraph) -> Result<(), ScanError> {
        for conformer in self.synthesizing_conformers(graph) {
            debug!(
                "Synthesizing conformance on {}",
                graph.declaration(conformer).display()
            );

            let children = graph.declaration(conformer).children.clone();
            for child in children {
                let decl = graph.declaration(child);
                let retain = match decl.kind {
                    // Stored properties and enum cases feed the synthesis.
                    DeclarationKind::VarInstance | DeclarationKind::EnumCase => true,
                    _ => decl
                        .name
                        .as_deref()
                        .is_some_and(|name| SYNTHESIZED_MEMBER_NAMES.contains(&name)),
                };
                if retain {
                    graph.retain(child);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Declaration, Location, Reference};
    use std::collections::BTreeSet as Set;

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
            Set::from([usr.to_string()]),
            Some(name.to_string()),
            Location::new("A.swift", line, 1),
        ))
    }

    #[test]
    fn test_codable_enum_cases_are_retained() {
        let mut graph = SourceGraph::new();
        let enum_decl = add(&mut graph, DeclarationKind::Enum, "s:EO", "E", 1);
        let case_a = add(&mut graph, DeclarationKind::EnumCase, "s:EO1a", "a", 2);
        let case_b = add(&mut graph, DeclarationKind::EnumCase, "s:EO1b", "b", 3);
        graph.set_parent(case_a, enum_decl);
        graph.set_parent(case_b, enum_decl);

        // `enum E: Codable` - Codable is not declared in the scanned
        // sources, so the related reference stays unresolved.
        graph.add_reference(
            enum_decl,
            Reference::new(
                DeclarationKind::Protocol,
                "s:s7CodableP",
                Location::new("A.swift", 1, 9),
            )
            .with_name("Codable")
            .related(),
        );

        SynthesizedMemberRetainer::new(vec![])
            .mutate(&mut graph)
            .unwrap();

        assert!(graph.is_retained(case_a));
        assert!(graph.is_retained(case_b));
    }

    #[test]
    fn test_explicit_encode_member_is_retained() {
        let mut graph = SourceGraph::new();
        let struct_decl = add(&mut graph, DeclarationKind::Struct, "s:SV", "S", 1);
        let encode = add(
            &mut graph,
            DeclarationKind::MethodInstance,
            "s:SV6encodeyyF",
            "encode(to:)",
            4,
        );
        graph.set_parent(encode, struct_decl);
        graph.add_reference(
            struct_decl,
            Reference::new(
                DeclarationKind::Protocol,
                "s:s9EncodableP",
                Location::new("A.swift", 1, 10),
            )
            .with_name("Encodable")
            .related(),
        );

        SynthesizedMemberRetainer::new(vec![])
            .mutate(&mut graph)
            .unwrap();
        assert!(graph.is_retained(encode));
    }

    #[test]
    fn test_external_encodable_protocols_extend_the_set() {
        let mut graph = SourceGraph::new();
        let struct_decl = add(&mut graph, DeclarationKind::Struct, "s:SV", "S", 1);
        let property = add(&mut graph, DeclarationKind::VarInstance, "s:SV4name", "name", 2);
        graph.set_parent(property, struct_decl);
        graph.add_reference(
            struct_decl,
            Reference::new(
                DeclarationKind::Protocol,
                "s:custom",
                Location::new("A.swift", 1, 10),
            )
            .with_name("AnyEncodable")
            .related(),
        );

        let retainer = SynthesizedMemberRetainer::new(vec!["AnyEncodable".to_string()]);
        retainer.mutate(&mut graph).unwrap();
        assert!(graph.is_retained(property));

        let mut plain = SourceGraph::new();
        let other = add(&mut plain, DeclarationKind::Struct, "s:OV", "O", 1);
        let other_property = add(&mut plain, DeclarationKind::VarInstance, "s:OV4name", "name", 2);
        plain.set_parent(other_property, other);
        SynthesizedMemberRetainer::new(vec![])
            .mutate(&mut plain)
            .unwrap();
        assert!(!plain.is_retained(other_property));
    }
}
