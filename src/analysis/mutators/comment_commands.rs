//! Comment command retainer.
//!
//! A leading file-level `ignore-all` retains every declaration in the
//! file with its full hierarchy; a per-declaration `ignore` retains the
//! declaration and all descendants. `ignore-parameters` is consumed by
//! the unused parameter marker instead.

use std::path::PathBuf;
use tracing::debug;

use super::Mutator;
use crate::error::ScanError;
use crate::graph::{CommentCommand, DeclarationId, SourceGraph};

pub struct CommentCommandRetainer {
    ignore_comment_commands: bool,
}

impl CommentCommandRetainer {
    pub fn new(ignore_comment_commands: bool) -> Self {
        Self {
            ignore_comment_commands,
        }
    }
}

impl Mutator for CommentCommandRetainer {
    fn name(&self) -> &'static str {
        "comment-command-retainer"
    }

    fn mutate(&self, graph: &mut SourceGraph) -> Result<(), ScanError> {
        if self.ignore_comment_commands {
            return Ok(());
        }

        let ignored_files: Vec<PathBuf> = graph
            .files()
            .filter(|file| {
                graph
                    .file_commands(&file.path)
                    .contains(&CommentCommand::IgnoreAll)
            })
            .map(|file| file.path.clone())
            .collect();

        for path in ignored_files {
            debug!("ignore-all: retaining every declaration in {}", path.display());
            let ids: Vec<DeclarationId> = graph
                .declarations()
                .filter(|decl| decl.location.file == path)
                .map(|decl| decl.id)
                .collect();
            for id in ids {
                graph.retain_with_descendants(id);
            }
        }

        let ignored_declarations: Vec<DeclarationId> = graph
            .declarations()
            .filter(|decl| decl.commands.contains(&CommentCommand::Ignore))
            .map(|decl| decl.id)
            .collect();
        for id in ignored_declarations {
            graph.retain_with_descendants(id);
        }

        Ok(())
    }
}
