// Graph module - the shared declaration/reference store
#![allow(dead_code)]

mod builder;
mod declaration;
mod reconciler;
mod reference;

pub use builder::GraphCommitter;
pub use declaration::{
    Accessibility, CommentCommand, DeclaredAccessibility, Declaration, DeclarationId,
    DeclarationKind, Location, TypeFootprint,
};
pub use reconciler::ReferenceReconciler;
pub use reference::{Reference, ReferenceRole};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// An import statement declared by a source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStatement {
    pub module: String,
    pub location: Location,
}

/// A source file together with the modules it belongs to and the imports
/// it declares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub modules: BTreeSet<String>,
    pub imports: Vec<ImportStatement>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            modules: BTreeSet::new(),
            imports: Vec::new(),
        }
    }
}

/// The process-wide store of declarations and references.
///
/// Declarations live in contiguous storage owned by the graph and are
/// addressed by stable [`DeclarationId`] indices; the cyclic structure
/// (parent/child, conformance/conformer) is expressed through ids, never
/// owning handles. Reference edges are kept both in a petgraph for
/// traversal and in a by-USR table so that references targeting symbols
/// without a known declaration stay observable.
#[derive(Debug, Default)]
pub struct SourceGraph {
    inner: DiGraph<DeclarationId, Reference>,
    node_map: HashMap<DeclarationId, NodeIndex>,
    declarations: Vec<Declaration>,

    usr_index: HashMap<String, DeclarationId>,
    location_index: HashMap<Location, DeclarationId>,

    files: HashMap<PathBuf, SourceFile>,
    file_commands: HashMap<PathBuf, Vec<CommentCommand>>,

    /// All committed references keyed by the USR they target.
    references_by_usr: HashMap<String, Vec<(DeclarationId, Reference)>>,

    /// Reference buckets keyed by referencer USR, awaiting reconciliation.
    pending_buckets: HashMap<String, Vec<Reference>>,

    /// References with no known parent, awaiting location reconciliation.
    pending_dangling: Vec<Reference>,

    /// Declarations marked live by policy. Monotonically non-decreasing.
    retained: HashSet<DeclarationId>,

    /// Declarations reachable from the retained set. Filled by reachability.
    live: HashSet<DeclarationId>,

    /// Effective accessibility, filled by the accessibility cascade.
    effective_accessibility: HashMap<DeclarationId, Accessibility>,

    /// Classification sets filled by passes.
    redundant_public: HashSet<DeclarationId>,
    assign_only: HashSet<DeclarationId>,
    redundant_conformances: Vec<(DeclarationId, DeclarationId)>,
    unused_imports: Vec<(PathBuf, ImportStatement)>,
    let_shorthand_containers: HashSet<DeclarationId>,

    /// Protocol conformances: conforming type to protocols.
    conformances: HashMap<DeclarationId, Vec<DeclarationId>>,
    /// Reverse conformance lookup: protocol to conforming types.
    conformers: HashMap<DeclarationId, Vec<DeclarationId>>,
}

impl SourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration, merging with an existing one when a symbol-id or
    /// the location key `(kind, name, is_implicit, is_objc_accessible,
    /// location)` already maps to a declaration. Merging unions the
    /// symbol-id sets, so each USR maps to at most one declaration.
    pub fn add_declaration(&mut self, mut decl: Declaration) -> DeclarationId {
        if let Some(existing) = self.find_merge_target(&decl) {
            let merged = &mut self.declarations[existing.index()];
            for usr in std::mem::take(&mut decl.usrs) {
                self.usr_index.insert(usr.clone(), existing);
                merged.usrs.insert(usr);
            }
            merged.is_implicit |= decl.is_implicit;
            merged.is_objc_accessible |= decl.is_objc_accessible;
            if merged.name.is_none() {
                merged.name = decl.name;
            }
            return existing;
        }

        let id = DeclarationId(self.declarations.len() as u32);
        decl.id = id;

        let node_idx = self.inner.add_node(id);
        self.node_map.insert(id, node_idx);

        for usr in &decl.usrs {
            self.usr_index.insert(usr.clone(), id);
        }
        self.location_index.entry(decl.location.clone()).or_insert(id);

        self.declarations.push(decl);
        id
    }

    fn find_merge_target(&self, decl: &Declaration) -> Option<DeclarationId> {
        for usr in &decl.usrs {
            if let Some(&id) = self.usr_index.get(usr) {
                return Some(id);
            }
        }
        if let Some(&id) = self.location_index.get(&decl.location) {
            let existing = &self.declarations[id.index()];
            if existing.kind == decl.kind
                && existing.name == decl.name
                && existing.is_implicit == decl.is_implicit
                && existing.is_objc_accessible == decl.is_objc_accessible
            {
                return Some(id);
            }
        }
        None
    }

    /// Attach a reference to its parent declaration.
    ///
    /// The reference is indexed by target USR; when the USR resolves to a
    /// declaration a traversal edge is added as well. Self references are
    /// discarded so a declaration cannot keep itself alive.
    pub fn add_reference(&mut self, parent: DeclarationId, reference: Reference) {
        if let Some(&target) = self.usr_index.get(&reference.usr) {
            if target == parent {
                debug!("Skipping self reference at {}", reference.location);
                return;
            }
            let from = self.node_map[&parent];
            let to = self.node_map[&target];
            self.inner.add_edge(from, to, reference.clone());
        }

        self.references_by_usr
            .entry(reference.usr.clone())
            .or_default()
            .push((parent, reference));
    }

    pub fn declaration(&self, id: DeclarationId) -> &Declaration {
        &self.declarations[id.index()]
    }

    pub fn declaration_mut(&mut self, id: DeclarationId) -> &mut Declaration {
        &mut self.declarations[id.index()]
    }

    pub fn declarations(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    pub fn declaration_ids(&self) -> impl Iterator<Item = DeclarationId> + '_ {
        self.declarations.iter().map(|d| d.id)
    }

    pub fn declaration_count(&self) -> usize {
        self.declarations.len()
    }

    pub fn declaration_by_usr(&self, usr: &str) -> Option<DeclarationId> {
        self.usr_index.get(usr).copied()
    }

    pub fn declaration_at(&self, location: &Location) -> Option<DeclarationId> {
        self.location_index.get(location).copied()
    }

    /// Establish a parent/child link, updating both sides.
    pub fn set_parent(&mut self, child: DeclarationId, parent: DeclarationId) {
        self.declarations[child.index()].parent = Some(parent);
        let children = &mut self.declarations[parent.index()].children;
        if !children.contains(&child) {
            children.push(child);
        }
    }

    /// All references attached to declarations that target the given USR.
    pub fn references_to_usr(&self, usr: &str) -> &[(DeclarationId, Reference)] {
        self.references_by_usr
            .get(usr)
            .map(|refs| refs.as_slice())
            .unwrap_or_default()
    }

    /// Incoming references to any of the declaration's USRs.
    pub fn references_to(&self, id: DeclarationId) -> Vec<&(DeclarationId, Reference)> {
        self.declarations[id.index()]
            .usrs
            .iter()
            .flat_map(|usr| self.references_by_usr.get(usr).into_iter().flatten())
            .collect()
    }

    /// Every committed reference with its parent declaration, including
    /// references whose target USR has no known declaration.
    pub fn all_references(&self) -> impl Iterator<Item = (DeclarationId, &Reference)> {
        self.references_by_usr
            .values()
            .flatten()
            .map(|(parent, reference)| (*parent, reference))
    }

    /// Outgoing references from a declaration, with their resolved targets.
    pub fn references_from(&self, id: DeclarationId) -> Vec<(DeclarationId, &Reference)> {
        let Some(&node_idx) = self.node_map.get(&id) else {
            return Vec::new();
        };
        self.inner
            .edges_directed(node_idx, petgraph::Direction::Outgoing)
            .filter_map(|edge| {
                let target = self.inner.node_weight(edge.target())?;
                Some((*target, edge.weight()))
            })
            .collect()
    }

    pub fn is_referenced(&self, id: DeclarationId) -> bool {
        !self.references_to(id).is_empty()
    }

    /// Mark a declaration as live by policy. Retain marks are never removed.
    pub fn retain(&mut self, id: DeclarationId) {
        if self.retained.insert(id) {
            debug!("Retained: {}", self.declarations[id.index()].display());
        }
    }

    /// Retain a declaration and every descendant.
    pub fn retain_with_descendants(&mut self, id: DeclarationId) {
        let mut worklist = vec![id];
        while let Some(current) = worklist.pop() {
            self.retain(current);
            worklist.extend(self.declarations[current.index()].children.iter().copied());
        }
    }

    pub fn is_retained(&self, id: DeclarationId) -> bool {
        self.retained.contains(&id)
    }

    pub fn retained_ids(&self) -> impl Iterator<Item = DeclarationId> + '_ {
        self.retained.iter().copied()
    }

    pub fn mark_live(&mut self, id: DeclarationId) {
        self.live.insert(id);
    }

    pub fn is_live(&self, id: DeclarationId) -> bool {
        self.live.contains(&id)
    }

    pub fn set_effective_accessibility(&mut self, id: DeclarationId, value: Accessibility) {
        self.effective_accessibility.insert(id, value);
    }

    /// Effective accessibility as computed by the cascade; falls back to
    /// the declared value before the cascade has run.
    pub fn effective_accessibility(&self, id: DeclarationId) -> Accessibility {
        self.effective_accessibility
            .get(&id)
            .copied()
            .unwrap_or(self.declarations[id.index()].accessibility.value)
    }

    pub fn mark_redundant_public(&mut self, id: DeclarationId) {
        self.redundant_public.insert(id);
    }

    pub fn redundant_public_ids(&self) -> impl Iterator<Item = DeclarationId> + '_ {
        self.redundant_public.iter().copied()
    }

    pub fn mark_assign_only(&mut self, id: DeclarationId) {
        self.assign_only.insert(id);
    }

    pub fn is_assign_only(&self, id: DeclarationId) -> bool {
        self.assign_only.contains(&id)
    }

    pub fn assign_only_ids(&self) -> impl Iterator<Item = DeclarationId> + '_ {
        self.assign_only.iter().copied()
    }

    pub fn record_conformance(&mut self, conformer: DeclarationId, protocol: DeclarationId) {
        let protocols = self.conformances.entry(conformer).or_default();
        if !protocols.contains(&protocol) {
            protocols.push(protocol);
        }
        let types = self.conformers.entry(protocol).or_default();
        if !types.contains(&conformer) {
            types.push(conformer);
        }
    }

    pub fn conformances_of(&self, conformer: DeclarationId) -> &[DeclarationId] {
        self.conformances
            .get(&conformer)
            .map(|p| p.as_slice())
            .unwrap_or_default()
    }

    pub fn conformers_of(&self, protocol: DeclarationId) -> &[DeclarationId] {
        self.conformers
            .get(&protocol)
            .map(|t| t.as_slice())
            .unwrap_or_default()
    }

    pub fn conformance_pairs(&self) -> impl Iterator<Item = (DeclarationId, DeclarationId)> + '_ {
        self.conformances
            .iter()
            .flat_map(|(&t, protos)| protos.iter().map(move |&p| (t, p)))
    }

    pub fn mark_redundant_conformance(&mut self, conformer: DeclarationId, protocol: DeclarationId) {
        self.redundant_conformances.push((conformer, protocol));
    }

    pub fn redundant_conformance_pairs(&self) -> &[(DeclarationId, DeclarationId)] {
        &self.redundant_conformances
    }

    pub fn mark_unused_import(&mut self, file: PathBuf, import: ImportStatement) {
        self.unused_imports.push((file, import));
    }

    pub fn unused_imports(&self) -> &[(PathBuf, ImportStatement)] {
        &self.unused_imports
    }

    pub fn mark_let_shorthand_container(&mut self, id: DeclarationId) {
        self.let_shorthand_containers.insert(id);
    }

    pub fn is_let_shorthand_container(&self, id: DeclarationId) -> bool {
        self.let_shorthand_containers.contains(&id)
    }

    pub fn register_file(&mut self, file: SourceFile) {
        self.files.insert(file.path.clone(), file);
    }

    pub fn file(&self, path: &Path) -> Option<&SourceFile> {
        self.files.get(path)
    }

    pub fn set_file_imports(&mut self, path: &Path, imports: Vec<ImportStatement>) {
        if let Some(file) = self.files.get_mut(path) {
            file.imports = imports;
        }
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    /// Modules the declaration's file belongs to.
    pub fn modules_of(&self, id: DeclarationId) -> BTreeSet<String> {
        self.files
            .get(&self.declarations[id.index()].location.file)
            .map(|f| f.modules.clone())
            .unwrap_or_default()
    }

    pub fn set_file_commands(&mut self, path: PathBuf, commands: Vec<CommentCommand>) {
        self.file_commands.insert(path, commands);
    }

    pub fn file_commands(&self, path: &Path) -> &[CommentCommand] {
        self.file_commands
            .get(path)
            .map(|c| c.as_slice())
            .unwrap_or_default()
    }

    pub(crate) fn stash_reference_bucket(&mut self, referencer_usr: String, refs: Vec<Reference>) {
        self.pending_buckets
            .entry(referencer_usr)
            .or_default()
            .extend(refs);
    }

    pub(crate) fn stash_dangling(&mut self, reference: Reference) {
        self.pending_dangling.push(reference);
    }

    pub(crate) fn take_pending_buckets(&mut self) -> HashMap<String, Vec<Reference>> {
        std::mem::take(&mut self.pending_buckets)
    }

    pub(crate) fn take_pending_dangling(&mut self) -> Vec<Reference> {
        std::mem::take(&mut self.pending_dangling)
    }

    pub fn reference_count(&self) -> usize {
        self.references_by_usr.values().map(|v| v.len()).sum()
    }

    /// Visit every traversal edge mutably, with the kinds at both ends and
    /// the source declaration's type footprint.
    pub(crate) fn for_each_edge_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(DeclarationKind, DeclarationKind, &TypeFootprint, &mut Reference),
    {
        let edges: Vec<_> = self.inner.edge_indices().collect();
        for edge in edges {
            let Some((source, target)) = self.inner.edge_endpoints(edge) else {
                continue;
            };
            let source_id = self.inner[source];
            let target_id = self.inner[target];
            let source_kind = self.declarations[source_id.index()].kind;
            let target_kind = self.declarations[target_id.index()].kind;
            let footprint = self.declarations[source_id.index()].footprint.clone();
            if let Some(weight) = self.inner.edge_weight_mut(edge) {
                f(source_kind, target_kind, &footprint, weight);
            }
        }
    }

    /// Get the underlying petgraph for traversal.
    pub(crate) fn inner(&self) -> &DiGraph<DeclarationId, Reference> {
        &self.inner
    }

    pub(crate) fn node_index(&self, id: DeclarationId) -> Option<NodeIndex> {
        self.node_map.get(&id).copied()
    }
}
