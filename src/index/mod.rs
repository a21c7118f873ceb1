mod ingestor;
mod store;

pub use ingestor::{IndexingState, Ingestor, RawDeclaration};
pub use store::{
    CompilationUnit, IndexBundle, IndexRelation, IndexSymbol, Occurrence, OccurrenceRole,
    RelationRole,
};
