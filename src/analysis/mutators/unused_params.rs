//! Unused parameter marker.
//!
//! Parameter declarations are discarded at ingest; the syntax visitor
//! reports which parameter names a function body never reads. This pass
//! attaches one parameter declaration per reported name and retains the
//! ones policy keeps: objc-exposed functions, `ignore-parameters`
//! commands, protocol requirements when configured, overrides, and the
//! wildcard `_`.

use std::collections::{BTreeSet, HashMap};

use super::Mutator;
use crate::error::ScanError;
use crate::graph::{
    CommentCommand, Declaration, DeclarationId, DeclarationKind, Location, SourceGraph,
};

pub struct UnusedParameterMarker {
    unused: HashMap<Location, BTreeSet<String>>,
    retain_objc_accessible: bool,
    retain_protocol_func_params: bool,
    ignore_comment_commands: bool,
}

impl UnusedParameterMarker {
    pub fn new(
        unused: HashMap<Location, BTreeSet<String>>,
        retain_objc_accessible: bool,
        retain_protocol_func_params: bool,
        ignore_comment_commands: bool,
    ) -> Self {
        Self {
            unused,
            retain_objc_accessible,
            retain_protocol_func_params,
            ignore_comment_commands,
        }
    }

    fn ignored_names(&self, function: &Declaration) -> BTreeSet<String> {
        if self.ignore_comment_commands {
            return BTreeSet::new();
        }
        function
            .commands
            .iter()
            .filter_map(|command| match command {
                CommentCommand::IgnoreParameters(names) => Some(names.iter().cloned()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    fn should_retain(
        &self,
        graph: &SourceGraph,
        function: &Declaration,
        name: &str,
        ignored: &BTreeSet<String>,
    ) -> bool {
        if name == "_" || ignored.contains(name) {
            return true;
        }
        if self.retain_objc_accessible && function.is_objc_accessible {
            return true;
        }
        // Overrides cannot change the inherited signature.
        if function.has_modifier("override") {
            return true;
        }
        if self.retain_protocol_func_params {
            let in_protocol = function
                .parent
                .is_some_and(|p| graph.declaration(p).kind == DeclarationKind::Protocol);
            if in_protocol {
                return true;
            }
        }
        false
    }
}

impl Mutator for UnusedParameterMarker {
    fn name(&self) -> &'static str {
        "unused-parameter-marker"
    }

    fn mutate(&self, graph: &mut SourceGraph) -> Result<(), ScanError> {
        let mut reports: Vec<(&Location, &BTreeSet<String>)> = self.unused.iter().collect();
        reports.sort_by(|a, b| a.0.cmp(b.0));

        for (function_location, names) in reports {
            let Some(function_id) = graph.declaration_at(function_location) else {
                continue;
            };
            if !graph.declaration(function_id).kind.is_function() {
                continue;
            }

            let function = graph.declaration(function_id).clone();
            let ignored = self.ignored_names(&function);

            for name in names {
                let usr = format!(
                    "param:{}:{}:{}:{}",
                    function.location.file.display(),
                    function.location.line,
                    function.location.column,
                    name
                );
                let parameter = Declaration::new(
                    DeclarationId(0),
                    DeclarationKind::VarParameter,
                    BTreeSet::from([usr]),
                    Some(name.clone()),
                    function.location.clone(),
                );
                let parameter_id = graph.add_declaration(parameter);
                graph.set_parent(parameter_id, function_id);

                if self.should_retain(graph, &function, name, &ignored) {
                    graph.retain(parameter_id);
                }
            }
        }

        Ok(())
    }
}
