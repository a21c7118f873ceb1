//! Syntax enrichment - phase two of the pipeline.
//!
//! The core does not parse source itself; an external syntax visitor
//! yields one report per file, and the enricher writes its records into
//! the graph's declarations. After references are reconciled, roles are
//! assigned by checking reference locations against the declarations'
//! type-footprint location sets.

mod commands;

pub use commands::{parse_comment_command, parse_comment_commands};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::ScanError;
use crate::graph::{
    Accessibility, DeclarationKind, ImportStatement, Location, ReferenceRole, SourceGraph,
    TypeFootprint,
};

/// Enrichment record for one declaration location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclarationSyntax {
    pub location: Location,
    /// Explicit accessibility keyword, if one was written.
    pub accessibility: Option<Accessibility>,
    pub attributes: HashSet<String>,
    pub modifiers: HashSet<String>,
    /// Raw comment lines attached to the declaration.
    pub comments: Vec<String>,
    /// Declared type string for variables.
    pub declared_type: Option<String>,
    pub footprint: TypeFootprint,
    pub let_shorthand_identifiers: HashSet<String>,
    pub has_capital_self_function_call: bool,
    pub has_generic_function_returned_metatype_parameters: bool,
}

/// Parameters of one function that are never read inside its body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnusedParameters {
    pub function: Location,
    pub names: BTreeSet<String>,
}

/// Everything the syntax visitor yields for one file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSyntaxReport {
    pub file: PathBuf,
    /// Leading file-level comment lines (a file-wide ignore-all lives here).
    pub header_comments: Vec<String>,
    pub imports: Vec<ImportStatement>,
    pub declarations: Vec<DeclarationSyntax>,
    pub unused_parameters: Vec<UnusedParameters>,
    /// Declarations the parser failed on; treated as live to avoid false
    /// positives.
    pub failed_locations: Vec<Location>,
}

impl FileSyntaxReport {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            ..Self::default()
        }
    }
}

/// Source of per-file syntax reports.
pub trait SyntaxProvider: Sync {
    fn file_report(&self, path: &Path) -> Result<FileSyntaxReport, ScanError>;
}

/// In-memory syntax provider, also loadable from a JSON file. Files
/// without a report yield an empty one.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SyntaxTable {
    reports: Vec<FileSyntaxReport>,
}

impl SyntaxTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, report: FileSyntaxReport) {
        self.reports.push(report);
    }

    pub fn load(path: &Path) -> Result<Self, ScanError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ScanError::syntax(path, e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| ScanError::syntax(path, e.to_string()))
    }
}

impl SyntaxProvider for SyntaxTable {
    fn file_report(&self, path: &Path) -> Result<FileSyntaxReport, ScanError> {
        Ok(self
            .reports
            .iter()
            .find(|r| r.file == path)
            .cloned()
            .unwrap_or_else(|| FileSyntaxReport::new(path)))
    }
}

/// Writes syntax reports into the graph.
pub struct SyntaxEnricher;

impl SyntaxEnricher {
    pub fn new() -> Self {
        Self
    }

    pub fn enrich(
        &self,
        graph: &mut SourceGraph,
        provider: &dyn SyntaxProvider,
    ) -> Result<(), ScanError> {
        let mut files: Vec<PathBuf> = graph.files().map(|f| f.path.clone()).collect();
        files.sort();

        for path in files {
            let report = provider.file_report(&path)?;
            self.enrich_file(graph, &report);
        }
        Ok(())
    }

    fn enrich_file(&self, graph: &mut SourceGraph, report: &FileSyntaxReport) {
        let file_commands = parse_comment_commands(&report.header_comments);
        graph.set_file_commands(report.file.clone(), file_commands);
        graph.set_file_imports(&report.file, report.imports.clone());

        for syntax in &report.declarations {
            let Some(id) = graph.declaration_at(&syntax.location) else {
                debug!("No declaration at {} to enrich", syntax.location);
                continue;
            };
            let decl = graph.declaration_mut(id);
            if let Some(value) = syntax.accessibility {
                decl.accessibility.value = value;
                decl.accessibility.is_explicit = true;
            }
            decl.attributes.extend(syntax.attributes.iter().cloned());
            decl.modifiers.extend(syntax.modifiers.iter().cloned());
            decl.commands.extend(parse_comment_commands(&syntax.comments));
            if decl.declared_type.is_none() {
                decl.declared_type = syntax.declared_type.clone();
            }
            decl.footprint = syntax.footprint.clone();
            decl.let_shorthand_identifiers
                .extend(syntax.let_shorthand_identifiers.iter().cloned());
            decl.has_capital_self_function_call |= syntax.has_capital_self_function_call;
            decl.has_generic_function_returned_metatype_parameters |=
                syntax.has_generic_function_returned_metatype_parameters;
        }

        // A declaration the parser failed on has an unknown verdict, which
        // is treated as live.
        for location in &report.failed_locations {
            if let Some(id) = graph.declaration_at(location) {
                warn!("Parser failed at {}; treating declaration as live", location);
                graph.retain_with_descendants(id);
            }
        }
    }

    /// Assign each reference a role from its parent's type footprint.
    /// Runs after reconciliation so every reference has a parent.
    pub fn assign_roles(&self, graph: &mut SourceGraph) {
        graph.for_each_edge_mut(|source_kind, target_kind, footprint, reference| {
            let role = footprint_role(footprint, &reference.location);
            if role == ReferenceRole::InheritedClassType {
                // The inherited footprint disambiguates by the kinds at
                // both ends.
                if source_kind == DeclarationKind::Class && target_kind == DeclarationKind::Class {
                    reference.role = ReferenceRole::InheritedClassType;
                } else if source_kind == DeclarationKind::Protocol
                    && target_kind == DeclarationKind::Protocol
                {
                    reference.role = ReferenceRole::RefinedProtocolType;
                }
            } else {
                reference.role = role;
            }
        });
    }
}

impl Default for SyntaxEnricher {
    fn default() -> Self {
        Self::new()
    }
}

/// Role implied by the footprint set a location falls in. The inherited
/// set maps to `InheritedClassType` pending kind disambiguation.
fn footprint_role(footprint: &TypeFootprint, location: &Location) -> ReferenceRole {
    if footprint.inherited.contains(location) {
        ReferenceRole::InheritedClassType
    } else if footprint.variable_type.contains(location) {
        ReferenceRole::VarType
    } else if footprint.return_type.contains(location) {
        ReferenceRole::ReturnType
    } else if footprint.parameter_type.contains(location) {
        ReferenceRole::ParameterType
    } else if footprint.generic_parameter.contains(location) {
        ReferenceRole::GenericParameterType
    } else if footprint.generic_conformance.contains(location) {
        ReferenceRole::GenericRequirementType
    } else if footprint.variable_init_call.contains(location) {
        ReferenceRole::VariableInitFunctionCall
    } else if footprint.metatype_argument.contains(location) {
        ReferenceRole::FunctionCallMetatypeArgument
    } else {
        ReferenceRole::Unknown
    }
}

/// Groups unused-parameter reports by function location for the
/// parameter marker pass.
pub fn unused_parameters_by_function(
    reports: &[FileSyntaxReport],
) -> HashMap<Location, BTreeSet<String>> {
    let mut map: HashMap<Location, BTreeSet<String>> = HashMap::new();
    for report in reports {
        for unused in &report.unused_parameters {
            map.entry(unused.function.clone())
                .or_default()
                .extend(unused.names.iter().cloned());
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{CommentCommand, Declaration, DeclarationId};

    #[test]
    fn test_footprint_role_assignment() {
        let mut footprint = TypeFootprint::default();
        let loc = Location::new("A.swift", 3, 17);
        footprint.return_type.insert(loc.clone());
        assert_eq!(footprint_role(&footprint, &loc), ReferenceRole::ReturnType);
        assert_eq!(
            footprint_role(&footprint, &Location::new("A.swift", 4, 1)),
            ReferenceRole::Unknown
        );
    }

    #[test]
    fn test_enrich_writes_accessibility_and_commands() {
        let mut graph = SourceGraph::new();
        let location = Location::new("A.swift", 1, 7);
        let id = graph.add_declaration(Declaration::new(
            DeclarationId(0),
            DeclarationKind::Class,
            BTreeSet::from(["s:AAC".to_string()]),
            Some("A".to_string()),
            location.clone(),
        ));
        graph.register_file(crate::graph::SourceFile::new("A.swift"));

        let mut report = FileSyntaxReport::new("A.swift");
        report.declarations.push(DeclarationSyntax {
            location,
            accessibility: Some(Accessibility::Public),
            comments: vec!["// periphery:ignore".to_string()],
            ..DeclarationSyntax::default()
        });

        let mut table = SyntaxTable::new();
        table.insert(report);
        SyntaxEnricher::new().enrich(&mut graph, &table).unwrap();

        let decl = graph.declaration(id);
        assert_eq!(decl.accessibility.value, Accessibility::Public);
        assert!(decl.accessibility.is_explicit);
        assert!(decl.commands.contains(&CommentCommand::Ignore));
    }

    #[test]
    fn test_parser_failure_retains_declaration() {
        let mut graph = SourceGraph::new();
        let location = Location::new("A.swift", 5, 6);
        let id = graph.add_declaration(Declaration::new(
            DeclarationId(0),
            DeclarationKind::FunctionFree,
            BTreeSet::from(["s:brokenyyF".to_string()]),
            Some("broken()".to_string()),
            location.clone(),
        ));
        graph.register_file(crate::graph::SourceFile::new("A.swift"));

        let mut report = FileSyntaxReport::new("A.swift");
        report.failed_locations.push(location);

        let mut table = SyntaxTable::new();
        table.insert(report);
        SyntaxEnricher::new().enrich(&mut graph, &table).unwrap();

        assert!(graph.is_retained(id));
    }
}
