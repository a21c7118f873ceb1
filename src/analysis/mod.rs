// Analysis module - mutation passes, reachability, and result collection

pub mod mutators;
mod reachability;
mod results;

pub use reachability::ReachabilityAnalyzer;
pub use results::ResultCollector;

use serde::{Deserialize, Serialize};

use crate::graph::{Declaration, DeclarationKind, Location};

/// The kind of uselessness a result describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultCategory {
    /// Declaration is never used
    UnusedDeclaration,

    /// Public accessibility is unnecessary (never used outside its module)
    RedundantPublicAccessibility,

    /// Parameter is never used inside the function body
    UnusedParameter,

    /// Conformance contributes no used members
    RedundantConformance,

    /// Import is never used
    UnusedImport,

    /// Property is assigned but never read
    AssignOnlyProperty,
}

impl ResultCategory {
    pub fn code(&self) -> &'static str {
        match self {
            ResultCategory::UnusedDeclaration => "DS001",
            ResultCategory::RedundantPublicAccessibility => "DS002",
            ResultCategory::UnusedParameter => "DS003",
            ResultCategory::RedundantConformance => "DS004",
            ResultCategory::UnusedImport => "DS005",
            ResultCategory::AssignOnlyProperty => "DS006",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResultCategory::UnusedDeclaration => "unused",
            ResultCategory::RedundantPublicAccessibility => "redundant public accessibility",
            ResultCategory::UnusedParameter => "unused parameter",
            ResultCategory::RedundantConformance => "redundant conformance",
            ResultCategory::UnusedImport => "unused import",
            ResultCategory::AssignOnlyProperty => "assign-only property",
        }
    }
}

impl std::fmt::Display for ResultCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One record of the scan's verdict, handed to the external formatter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub usr: String,
    pub kind: DeclarationKind,
    pub name: Option<String>,
    pub location: Location,
    pub category: ResultCategory,
    pub message: String,
}

impl ScanResult {
    pub fn for_declaration(decl: &Declaration, category: ResultCategory) -> Self {
        let message = match category {
            ResultCategory::UnusedDeclaration => format!(
                "{} '{}' is never used",
                decl.kind.display_name(),
                decl.name_or_usr()
            ),
            ResultCategory::RedundantPublicAccessibility => format!(
                "{} '{}' is never used outside its module",
                decl.kind.display_name(),
                decl.name_or_usr()
            ),
            ResultCategory::UnusedParameter => {
                format!("Parameter '{}' is never used", decl.name_or_usr())
            }
            ResultCategory::AssignOnlyProperty => format!(
                "{} '{}' is assigned but never read",
                decl.kind.display_name(),
                decl.name_or_usr()
            ),
            ResultCategory::RedundantConformance | ResultCategory::UnusedImport => {
                format!("'{}' is never used", decl.name_or_usr())
            }
        };

        Self {
            usr: decl.primary_usr().to_string(),
            kind: decl.kind,
            name: decl.name.clone(),
            location: decl.location.clone(),
            category,
            message,
        }
    }
}
