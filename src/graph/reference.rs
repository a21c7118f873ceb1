// Reference types - some predicates reserved for future use
#![allow(dead_code)]

use serde::{Deserialize, Serialize};

use super::{DeclarationKind, Location};

/// Role a reference plays at its use site.
///
/// Assigned during syntax enrichment by checking whether the reference's
/// location falls inside one of the parent declaration's footprint sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceRole {
    /// Plain expression-level use
    #[default]
    Unknown,
    /// Class inheriting from a class
    InheritedClassType,
    /// Protocol refining another protocol
    RefinedProtocolType,
    /// Variable type annotation
    VarType,
    /// Return type position
    ReturnType,
    /// Parameter type position
    ParameterType,
    /// Generic parameter position
    GenericParameterType,
    /// Generic conformance requirement position
    GenericRequirementType,
    /// Function call in a variable initializer
    VariableInitFunctionCall,
    /// Metatype passed as a function call argument
    FunctionCallMetatypeArgument,
}

/// A directed use edge from a declaration to a symbol.
///
/// The owning declaration is the edge source in the graph; `usr` names the
/// referent, which resolves to a declaration when one is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    /// Kind of the referent, mirroring declaration kinds
    pub kind: DeclarationKind,

    /// Symbol identifier of the referent
    pub usr: String,

    /// Location where the reference occurs
    pub location: Location,

    /// Name used at the reference site, if known
    pub name: Option<String>,

    /// Role the reference plays at its use site
    pub role: ReferenceRole,

    /// Structural relation (inheritance, conformance, override base,
    /// type footprint) rather than an expression-level use
    pub is_related: bool,

    /// Whether the use site assigns to the referent
    pub is_write: bool,
}

impl Reference {
    pub fn new(kind: DeclarationKind, usr: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            usr: usr.into(),
            location,
            name: None,
            role: ReferenceRole::Unknown,
            is_related: false,
            is_write: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn related(mut self) -> Self {
        self.is_related = true;
        self
    }

    pub fn write(mut self) -> Self {
        self.is_write = true;
        self
    }

    /// Whether this reference counts as a read of the referent.
    pub fn is_read(&self) -> bool {
        !self.is_write
    }
}
