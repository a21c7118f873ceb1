// Index ingestor - phase one of the pipeline

use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::store::{CompilationUnit, IndexBundle, Occurrence, OccurrenceRole, RelationRole};
use crate::config::Config;
use crate::error::ScanError;
use crate::graph::{DeclarationKind, Location, Reference};

/// A declaration parsed from index records, before graph commit.
///
/// Raw declarations sharing the deduplication key
/// `(kind, name, is_implicit, is_objc_accessible, location)` collapse into
/// one record whose symbol-id set is the union of theirs.
#[derive(Debug, Clone)]
pub struct RawDeclaration {
    pub kind: DeclarationKind,
    pub name: Option<String>,
    pub usrs: BTreeSet<String>,
    pub location: Location,
    pub is_implicit: bool,
    pub is_objc_accessible: bool,
    /// Parent symbol-id recorded by a child-of relation, resolved after
    /// all files are ingested.
    pub parent_usr: Option<String>,
    /// Related references this declaration makes (override bases).
    pub related: Vec<Reference>,
    /// Marked live by ingest policy (implicit, or objc when configured).
    pub retain_at_ingest: bool,
}

type DedupKey = (DeclarationKind, Option<String>, bool, bool, Location);

impl RawDeclaration {
    fn dedup_key(&self) -> DedupKey {
        (
            self.kind,
            self.name.clone(),
            self.is_implicit,
            self.is_objc_accessible,
            self.location.clone(),
        )
    }
}

/// Per-file output of index ingestion.
#[derive(Debug, Default)]
pub struct IndexingState {
    pub file: PathBuf,
    pub modules: BTreeSet<String>,
    pub declarations: Vec<RawDeclaration>,
    /// References grouped by the symbol-id of their eventual parent.
    pub reference_buckets: HashMap<String, Vec<Reference>>,
    /// References with no known parent, reconciled later by location.
    pub dangling: Vec<Reference>,
    /// Symbol-ids of parameter declarations, which are themselves discarded.
    pub parameter_usrs: HashSet<String>,

    dedup: HashMap<DedupKey, usize>,
}

impl IndexingState {
    fn new(file: PathBuf) -> Self {
        Self {
            file,
            ..Self::default()
        }
    }

    fn upsert_declaration(&mut self, raw: RawDeclaration) {
        let key = raw.dedup_key();
        match self.dedup.get(&key) {
            Some(&index) => {
                let existing = &mut self.declarations[index];
                existing.usrs.extend(raw.usrs);
                existing.related.extend(raw.related);
                existing.retain_at_ingest |= raw.retain_at_ingest;
                if existing.parent_usr.is_none() {
                    existing.parent_usr = raw.parent_usr;
                }
            }
            None => {
                self.dedup.insert(key, self.declarations.len());
                self.declarations.push(raw);
            }
        }
    }

    fn bucket(&mut self, referencer_usr: String, reference: Reference) {
        self.reference_buckets
            .entry(referencer_usr)
            .or_default()
            .push(reference);
    }
}

/// Parses compiler index records into per-file indexing states.
pub struct Ingestor<'a> {
    config: &'a Config,
}

impl<'a> Ingestor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Ingest every file of the bundle on a parallel worker pool, one job
    /// per source file. Workers own their state until it is returned; the
    /// first error wins and outstanding workers finish their file.
    pub fn ingest(&self, bundle: &IndexBundle) -> Result<Vec<IndexingState>, ScanError> {
        let files = bundle.files();
        info!("Ingesting index records for {} files...", files.len());

        let results: Vec<Result<IndexingState, ScanError>> = files
            .par_iter()
            .map(|file| self.ingest_file(file, &bundle.units_for(file)))
            .collect();

        let mut states = Vec::with_capacity(results.len());
        for result in results {
            states.push(result?);
        }

        let declaration_count: usize = states.iter().map(|s| s.declarations.len()).sum();
        info!("Parsed {} raw declarations", declaration_count);

        Ok(states)
    }

    /// Ingest one file from its (store, unit) pairs.
    pub fn ingest_file(
        &self,
        file: &Path,
        units: &[&CompilationUnit],
    ) -> Result<IndexingState, ScanError> {
        debug!("Ingesting {}", file.display());
        let mut state = IndexingState::new(file.to_path_buf());

        for unit in units {
            state.modules.insert(unit.module.clone());
            for occurrence in &unit.occurrences {
                self.ingest_occurrence(&mut state, occurrence);
            }
        }

        Ok(state)
    }

    fn ingest_occurrence(&self, state: &mut IndexingState, occurrence: &Occurrence) {
        if occurrence.has_role(OccurrenceRole::Definition) {
            self.ingest_definition(state, occurrence);
        } else if occurrence.has_role(OccurrenceRole::Reference) {
            self.ingest_reference(state, occurrence);
        } else if occurrence.has_role(OccurrenceRole::Implicit) {
            self.ingest_implicit_relation(state, occurrence);
        }
    }

    fn ingest_definition(&self, state: &mut IndexingState, occurrence: &Occurrence) {
        // Parameters are collected for orphan dropping and then discarded;
        // unused parameters are found syntactically instead.
        if occurrence.symbol.kind == DeclarationKind::VarParameter {
            state.parameter_usrs.insert(occurrence.symbol.usr.clone());
            return;
        }

        let is_implicit = occurrence.has_role(OccurrenceRole::Implicit);
        let is_objc_accessible = occurrence.symbol.is_objc_accessible();

        let mut raw = RawDeclaration {
            kind: occurrence.symbol.kind,
            name: occurrence.symbol.name.clone(),
            usrs: BTreeSet::from([occurrence.symbol.usr.clone()]),
            location: occurrence.location.clone(),
            is_implicit,
            is_objc_accessible,
            parent_usr: None,
            related: Vec::new(),
            retain_at_ingest: is_implicit
                || (is_objc_accessible && self.config.retain_objc_accessible),
        };

        for relation in &occurrence.relations {
            for role in &relation.roles {
                match role {
                    RelationRole::ChildOf => {
                        raw.parent_usr = Some(relation.symbol.usr.clone());
                    }
                    RelationRole::OverrideOf => {
                        // The override is a use of its base.
                        let base = Reference::new(
                            relation.symbol.kind,
                            relation.symbol.usr.clone(),
                            occurrence.location.clone(),
                        )
                        .related();
                        let base = match &relation.symbol.name {
                            Some(name) => base.with_name(name.clone()),
                            None => base,
                        };
                        raw.related.push(base);
                    }
                    RelationRole::BaseOf
                    | RelationRole::CalledBy
                    | RelationRole::ExtendedBy
                    | RelationRole::ContainedBy => {
                        // Inverted: the other side of the relation uses this
                        // declaration at this location.
                        let reference =
                            self.plain_reference(occurrence, *role == RelationRole::BaseOf);
                        state.bucket(relation.symbol.usr.clone(), reference);
                    }
                }
            }
        }

        state.upsert_declaration(raw);
    }

    fn ingest_reference(&self, state: &mut IndexingState, occurrence: &Occurrence) {
        let owning_relations: Vec<_> = occurrence
            .relations
            .iter()
            .flat_map(|relation| relation.roles.iter().map(move |role| (relation, role)))
            .filter(|(_, role)| {
                matches!(
                    role,
                    RelationRole::BaseOf
                        | RelationRole::CalledBy
                        | RelationRole::ContainedBy
                        | RelationRole::ExtendedBy
                )
            })
            .collect();

        if owning_relations.is_empty() {
            // Unattributed module references are uninteresting.
            if occurrence.symbol.kind == DeclarationKind::Module {
                return;
            }
            state
                .dangling
                .push(self.plain_reference(occurrence, false));
            return;
        }

        for (relation, role) in owning_relations {
            let reference = self.plain_reference(occurrence, *role == RelationRole::BaseOf);
            state.bucket(relation.symbol.usr.clone(), reference);
        }
    }

    /// Implicit occurrences only model override edges the compiler added.
    /// As with explicit definitions, the override is a use of its base:
    /// the occurrence's symbol owns a related reference to the overridden
    /// symbol, attached once the occurrence's declaration exists.
    fn ingest_implicit_relation(&self, state: &mut IndexingState, occurrence: &Occurrence) {
        for relation in &occurrence.relations {
            if relation.roles.contains(&RelationRole::OverrideOf) {
                let base = Reference::new(
                    relation.symbol.kind,
                    relation.symbol.usr.clone(),
                    occurrence.location.clone(),
                )
                .related();
                let base = match &relation.symbol.name {
                    Some(name) => base.with_name(name.clone()),
                    None => base,
                };
                state.bucket(occurrence.symbol.usr.clone(), base);
            }
        }
    }

    fn plain_reference(&self, occurrence: &Occurrence, is_related: bool) -> Reference {
        let mut reference = Reference::new(
            occurrence.symbol.kind,
            occurrence.symbol.usr.clone(),
            occurrence.location.clone(),
        );
        if let Some(name) = &occurrence.symbol.name {
            reference = reference.with_name(name.clone());
        }
        if is_related {
            reference = reference.related();
        }
        if occurrence.has_role(OccurrenceRole::Write)
            && !occurrence.has_role(OccurrenceRole::Read)
        {
            reference = reference.write();
        }
        reference
    }
}
