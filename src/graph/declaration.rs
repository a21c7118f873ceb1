// Declaration types - some predicates reserved for future use
#![allow(dead_code)]

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;

/// Stable identifier for a declaration inside the source graph.
///
/// Declarations are owned by the graph in contiguous storage; all
/// cross-references between nodes go through these indices, never through
/// owning handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclarationId(pub(crate) u32);

impl DeclarationId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for DeclarationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "decl#{}", self.0)
    }
}

/// Kind of declaration.
///
/// This is a closed enumeration mirroring the compiler's symbol model.
/// Adding a new kind is a compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeclarationKind {
    Module,
    Enum,
    Struct,
    Class,
    Protocol,
    ExtensionClass,
    ExtensionStruct,
    ExtensionProtocol,
    ExtensionEnum,
    TypeAlias,
    AssociatedType,
    GenericTypeParam,
    FunctionFree,
    MethodInstance,
    MethodClass,
    MethodStatic,
    Constructor,
    Destructor,
    OperatorInfix,
    OperatorPrefix,
    OperatorPostfix,
    Subscript,
    AccessorGetter,
    AccessorSetter,
    AccessorDidSet,
    AccessorWillSet,
    AccessorAddress,
    AccessorMutableAddress,
    VarInstance,
    VarClass,
    VarStatic,
    VarGlobal,
    VarLocal,
    VarParameter,
    EnumCase,
}

impl DeclarationKind {
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            DeclarationKind::Enum
                | DeclarationKind::Struct
                | DeclarationKind::Class
                | DeclarationKind::Protocol
                | DeclarationKind::TypeAlias
        )
    }

    pub fn is_extension(&self) -> bool {
        matches!(
            self,
            DeclarationKind::ExtensionClass
                | DeclarationKind::ExtensionStruct
                | DeclarationKind::ExtensionProtocol
                | DeclarationKind::ExtensionEnum
        )
    }

    pub fn is_conformable(&self) -> bool {
        self.is_type() && *self != DeclarationKind::TypeAlias || self.is_extension()
    }

    pub fn is_accessor(&self) -> bool {
        matches!(
            self,
            DeclarationKind::AccessorGetter
                | DeclarationKind::AccessorSetter
                | DeclarationKind::AccessorDidSet
                | DeclarationKind::AccessorWillSet
                | DeclarationKind::AccessorAddress
                | DeclarationKind::AccessorMutableAddress
        )
    }

    pub fn is_variable(&self) -> bool {
        matches!(
            self,
            DeclarationKind::VarInstance
                | DeclarationKind::VarClass
                | DeclarationKind::VarStatic
                | DeclarationKind::VarGlobal
                | DeclarationKind::VarLocal
                | DeclarationKind::VarParameter
        )
    }

    pub fn is_function(&self) -> bool {
        matches!(
            self,
            DeclarationKind::FunctionFree
                | DeclarationKind::MethodInstance
                | DeclarationKind::MethodClass
                | DeclarationKind::MethodStatic
                | DeclarationKind::Constructor
                | DeclarationKind::Destructor
                | DeclarationKind::OperatorInfix
                | DeclarationKind::OperatorPrefix
                | DeclarationKind::OperatorPostfix
        )
    }

    /// Rank used to break ties during dangling-reference reconciliation.
    ///
    /// Properties and subscripts rank above their accessors so that a
    /// property-with-getter on a single line attributes to the property.
    pub fn reconciliation_rank(&self) -> u8 {
        if self.is_accessor() {
            return 3;
        }
        if self.is_variable() || *self == DeclarationKind::Subscript {
            return 2;
        }
        if self.is_function() {
            return 1;
        }
        0
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            DeclarationKind::Module => "module",
            DeclarationKind::Enum => "enum",
            DeclarationKind::Struct => "struct",
            DeclarationKind::Class => "class",
            DeclarationKind::Protocol => "protocol",
            DeclarationKind::ExtensionClass
            | DeclarationKind::ExtensionStruct
            | DeclarationKind::ExtensionProtocol
            | DeclarationKind::ExtensionEnum => "extension",
            DeclarationKind::TypeAlias => "typealias",
            DeclarationKind::AssociatedType => "associatedtype",
            DeclarationKind::GenericTypeParam => "generic type parameter",
            DeclarationKind::FunctionFree => "function",
            DeclarationKind::MethodInstance => "instance method",
            DeclarationKind::MethodClass => "class method",
            DeclarationKind::MethodStatic => "static method",
            DeclarationKind::Constructor => "initializer",
            DeclarationKind::Destructor => "deinitializer",
            DeclarationKind::OperatorInfix
            | DeclarationKind::OperatorPrefix
            | DeclarationKind::OperatorPostfix => "operator",
            DeclarationKind::Subscript => "subscript",
            DeclarationKind::AccessorGetter => "getter",
            DeclarationKind::AccessorSetter => "setter",
            DeclarationKind::AccessorDidSet => "didSet observer",
            DeclarationKind::AccessorWillSet => "willSet observer",
            DeclarationKind::AccessorAddress => "address accessor",
            DeclarationKind::AccessorMutableAddress => "mutable address accessor",
            DeclarationKind::VarInstance => "property",
            DeclarationKind::VarClass => "class property",
            DeclarationKind::VarStatic => "static property",
            DeclarationKind::VarGlobal => "global variable",
            DeclarationKind::VarLocal => "local variable",
            DeclarationKind::VarParameter => "parameter",
            DeclarationKind::EnumCase => "enum case",
        }
    }
}

/// Accessibility levels, ordered from most to least restrictive.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Accessibility {
    Private,
    FilePrivate,
    #[default]
    Internal,
    Package,
    Public,
    Open,
}

impl Accessibility {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "private" => Some(Accessibility::Private),
            "fileprivate" => Some(Accessibility::FilePrivate),
            "internal" => Some(Accessibility::Internal),
            "package" => Some(Accessibility::Package),
            "public" => Some(Accessibility::Public),
            "open" => Some(Accessibility::Open),
            _ => None,
        }
    }

    pub fn is_accessible_outside_module(&self) -> bool {
        matches!(self, Accessibility::Public | Accessibility::Open)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Accessibility::Private => "private",
            Accessibility::FilePrivate => "fileprivate",
            Accessibility::Internal => "internal",
            Accessibility::Package => "package",
            Accessibility::Public => "public",
            Accessibility::Open => "open",
        }
    }
}

impl std::fmt::Display for Accessibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Location in source code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// File path
    pub file: PathBuf,
    /// Line number (1-indexed)
    pub line: u32,
    /// Column number (1-indexed)
    pub column: u32,
}

impl Location {
    pub fn new(file: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

impl Default for Location {
    fn default() -> Self {
        Location::new(PathBuf::new(), 0, 0)
    }
}

/// Source locations where a declaration's type footprint appears.
///
/// Filled in by syntax enrichment and consulted when assigning roles
/// to references attached to the declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeFootprint {
    pub inherited: HashSet<Location>,
    pub variable_type: HashSet<Location>,
    pub return_type: HashSet<Location>,
    pub parameter_type: HashSet<Location>,
    pub generic_parameter: HashSet<Location>,
    pub generic_conformance: HashSet<Location>,
    pub variable_init_call: HashSet<Location>,
    pub metatype_argument: HashSet<Location>,
}

impl TypeFootprint {
    pub fn is_empty(&self) -> bool {
        self.inherited.is_empty()
            && self.variable_type.is_empty()
            && self.return_type.is_empty()
            && self.parameter_type.is_empty()
            && self.generic_parameter.is_empty()
            && self.generic_conformance.is_empty()
            && self.variable_init_call.is_empty()
            && self.metatype_argument.is_empty()
    }
}

/// In-source directive to the analyzer embedded in a comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentCommand {
    /// Retain this declaration and all descendants.
    Ignore,
    /// Retain every declaration in the file.
    IgnoreAll,
    /// Retain the named parameters of this function.
    IgnoreParameters(Vec<String>),
}

/// Accessibility of a declaration together with whether it was written
/// explicitly in source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredAccessibility {
    pub value: Accessibility,
    pub is_explicit: bool,
}

/// A logical program entity owned by the source graph.
///
/// A declaration may aggregate several index records; its symbol identifier
/// set holds every USR the index emitted for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Declaration {
    /// Stable graph identifier
    pub id: DeclarationId,

    /// Kind of declaration
    pub kind: DeclarationKind,

    /// Symbol identifiers from the index; a logical declaration may carry several
    pub usrs: BTreeSet<String>,

    /// Simple name, if the index knows one
    pub name: Option<String>,

    /// Location in source code
    pub location: Location,

    /// Accessibility with its explicitness flag
    pub accessibility: DeclaredAccessibility,

    /// Attributes written on the declaration (e.g. objc, main, IBAction)
    pub attributes: HashSet<String>,

    /// Modifiers written on the declaration (e.g. override, required, final)
    pub modifiers: HashSet<String>,

    /// In-source analyzer commands attached to this declaration
    pub commands: Vec<CommentCommand>,

    /// Declared type string for variables
    pub declared_type: Option<String>,

    /// Locations where this declaration's type footprint appears
    pub footprint: TypeFootprint,

    /// Whether the compiler synthesized this declaration
    pub is_implicit: bool,

    /// Whether the symbol is bridged to the objc runtime
    pub is_objc_accessible: bool,

    /// Whether the body calls a function on capital Self
    pub has_capital_self_function_call: bool,

    /// Whether a generic function returns metatype parameters
    pub has_generic_function_returned_metatype_parameters: bool,

    /// Identifiers bound by shorthand optional unwrapping inside this declaration
    pub let_shorthand_identifiers: HashSet<String>,

    /// Parent declaration, once hierarchy is established
    pub parent: Option<DeclarationId>,

    /// Child declarations
    pub children: Vec<DeclarationId>,
}

impl Declaration {
    pub fn new(
        id: DeclarationId,
        kind: DeclarationKind,
        usrs: BTreeSet<String>,
        name: Option<String>,
        location: Location,
    ) -> Self {
        Self {
            id,
            kind,
            usrs,
            name,
            location,
            accessibility: DeclaredAccessibility::default(),
            attributes: HashSet::new(),
            modifiers: HashSet::new(),
            commands: Vec::new(),
            declared_type: None,
            footprint: TypeFootprint::default(),
            is_implicit: false,
            is_objc_accessible: false,
            has_capital_self_function_call: false,
            has_generic_function_returned_metatype_parameters: false,
            let_shorthand_identifiers: HashSet::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// The first USR in sorted order; stable for a given input.
    pub fn primary_usr(&self) -> &str {
        self.usrs
            .iter()
            .next()
            .map(|s| s.as_str())
            .unwrap_or_default()
    }

    pub fn name_or_usr(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.primary_usr())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains(name)
    }

    pub fn has_modifier(&self, name: &str) -> bool {
        self.modifiers.contains(name)
    }

    pub fn has_command(&self, command: &CommentCommand) -> bool {
        self.commands.contains(command)
    }

    /// Whether removing this declaration would change semantics regardless
    /// of usage: deinitializers and required initializers stay.
    pub fn is_structurally_required(&self) -> bool {
        match self.kind {
            DeclarationKind::Destructor => true,
            DeclarationKind::Constructor => self.has_modifier("required"),
            _ => false,
        }
    }

    /// Get a display string for this declaration
    pub fn display(&self) -> String {
        format!(
            "{} '{}' ({})",
            self.kind.display_name(),
            self.name_or_usr(),
            self.location
        )
    }
}
