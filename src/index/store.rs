//! Index store input model.
//!
//! The core consumes compiler-emitted index records: per compilation unit,
//! an iterator of occurrences carrying a symbol, a location, role flags,
//! and relations to other symbols. A bundle groups the units of one build
//! together with the set of source files the caller expects to be indexed.

use miette::{IntoDiagnostic, Result, WrapErr};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::ScanError;
use crate::graph::{DeclarationKind, Location};

/// Role flags carried by an occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OccurrenceRole {
    Definition,
    Reference,
    Implicit,
    Read,
    Write,
}

/// Role carried by a relation between two symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationRole {
    ChildOf,
    BaseOf,
    OverrideOf,
    CalledBy,
    ExtendedBy,
    ContainedBy,
}

/// A symbol as the index describes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSymbol {
    /// The compiler's stable unique identifier (USR)
    pub usr: String,
    /// Declared name, if the index records one
    #[serde(default)]
    pub name: Option<String>,
    /// Symbol kind, mirroring declaration kinds
    pub kind: DeclarationKind,
}

impl IndexSymbol {
    pub fn new(kind: DeclarationKind, usr: impl Into<String>) -> Self {
        Self {
            usr: usr.into(),
            name: None,
            kind,
        }
    }

    pub fn named(kind: DeclarationKind, usr: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            usr: usr.into(),
            name: Some(name.into()),
            kind,
        }
    }

    /// Symbols bridged through the objc runtime carry `c:`-prefixed USRs.
    pub fn is_objc_accessible(&self) -> bool {
        self.usr.starts_with("c:")
    }
}

/// An edge in the index between the occurrence's symbol and another symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexRelation {
    pub roles: BTreeSet<RelationRole>,
    pub symbol: IndexSymbol,
}

impl IndexRelation {
    pub fn new(role: RelationRole, symbol: IndexSymbol) -> Self {
        Self {
            roles: BTreeSet::from([role]),
            symbol,
        }
    }
}

/// A point in a source file where a symbol is defined, referenced, or
/// implicitly synthesized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Occurrence {
    pub symbol: IndexSymbol,
    pub location: Location,
    pub roles: BTreeSet<OccurrenceRole>,
    #[serde(default)]
    pub relations: Vec<IndexRelation>,
}

impl Occurrence {
    pub fn definition(symbol: IndexSymbol, location: Location) -> Self {
        Self {
            symbol,
            location,
            roles: BTreeSet::from([OccurrenceRole::Definition]),
            relations: Vec::new(),
        }
    }

    pub fn reference(symbol: IndexSymbol, location: Location) -> Self {
        Self {
            symbol,
            location,
            roles: BTreeSet::from([OccurrenceRole::Reference]),
            relations: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: OccurrenceRole) -> Self {
        self.roles.insert(role);
        self
    }

    pub fn with_relation(mut self, role: RelationRole, symbol: IndexSymbol) -> Self {
        self.relations.push(IndexRelation::new(role, symbol));
        self
    }

    pub fn has_role(&self, role: OccurrenceRole) -> bool {
        self.roles.contains(&role)
    }
}

/// One compilation unit: the main file it was compiled from, the module it
/// belongs to, and its record dependencies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilationUnit {
    pub main_file: PathBuf,
    pub module: String,
    #[serde(default)]
    pub occurrences: Vec<Occurrence>,
}

impl CompilationUnit {
    pub fn new(main_file: impl Into<PathBuf>, module: impl Into<String>) -> Self {
        Self {
            main_file: main_file.into(),
            module: module.into(),
            occurrences: Vec::new(),
        }
    }

    pub fn with_occurrences(mut self, occurrences: Vec<Occurrence>) -> Self {
        self.occurrences = occurrences;
        self
    }
}

/// The units of one build, plus the source files the caller expects to be
/// covered. Multiple units per file occur when the same file is compiled
/// into multiple targets.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexBundle {
    #[serde(default)]
    pub source_files: Vec<PathBuf>,
    pub units: Vec<CompilationUnit>,
}

impl IndexBundle {
    pub fn new(units: Vec<CompilationUnit>) -> Self {
        Self {
            source_files: Vec::new(),
            units,
        }
    }

    /// Load a bundle from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to read index bundle: {}", path.display()))?;
        serde_json::from_str(&contents)
            .map_err(|e| ScanError::index_read(path, e.to_string()))
            .into_diagnostic()
    }

    /// The set of files this scan covers, in deterministic order.
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files: BTreeSet<PathBuf> = self.source_files.iter().cloned().collect();
        for unit in &self.units {
            files.insert(unit.main_file.clone());
        }
        files.into_iter().collect()
    }

    pub fn units_for(&self, file: &Path) -> Vec<&CompilationUnit> {
        self.units.iter().filter(|u| u.main_file == file).collect()
    }

    /// Raise unindexed-files and conflicting-units errors before any heavy
    /// work starts.
    pub fn validate(&self) -> std::result::Result<(), ScanError> {
        let mut unindexed: Vec<PathBuf> = self
            .source_files
            .iter()
            .filter(|f| self.units.iter().all(|u| &u.main_file != *f))
            .cloned()
            .collect();
        if !unindexed.is_empty() {
            unindexed.sort();
            return Err(ScanError::UnindexedFiles { files: unindexed });
        }

        let mut modules_by_file: BTreeMap<&Path, BTreeSet<&str>> = BTreeMap::new();
        for unit in &self.units {
            modules_by_file
                .entry(unit.main_file.as_path())
                .or_default()
                .insert(unit.module.as_str());
        }
        for (file, modules) in modules_by_file {
            if modules.len() > 1 {
                return Err(ScanError::ConflictingIndexUnits {
                    file: file.to_path_buf(),
                    modules: modules.into_iter().map(String::from).collect(),
                });
            }
        }

        Ok(())
    }
}
