//! Shared helpers for building synthetic index bundles in tests.

use declsweep::graph::{DeclarationKind, Location};
use declsweep::index::{IndexSymbol, Occurrence, OccurrenceRole, RelationRole};
use declsweep::{Config, Driver, IndexBundle, ScanResult, SyntaxTable};

pub fn loc(file: &str, line: u32, column: u32) -> Location {
    Location::new(file, line, column)
}

pub fn sym(kind: DeclarationKind, usr: &str, name: &str) -> IndexSymbol {
    IndexSymbol::named(kind, usr, name)
}

/// A definition occurrence with an optional parent.
pub fn def(symbol: IndexSymbol, location: Location, parent: Option<IndexSymbol>) -> Occurrence {
    let occurrence = Occurrence::definition(symbol, location);
    match parent {
        Some(parent) => occurrence.with_relation(RelationRole::ChildOf, parent),
        None => occurrence,
    }
}

/// An implicit (compiler-synthesized) definition.
pub fn implicit_def(
    symbol: IndexSymbol,
    location: Location,
    parent: Option<IndexSymbol>,
) -> Occurrence {
    def(symbol, location, parent).with_role(OccurrenceRole::Implicit)
}

/// A call-site reference owned by `caller`.
pub fn call(symbol: IndexSymbol, location: Location, caller: IndexSymbol) -> Occurrence {
    Occurrence::reference(symbol, location).with_relation(RelationRole::CalledBy, caller)
}

/// An expression-level reference contained in `container`.
pub fn use_in(symbol: IndexSymbol, location: Location, container: IndexSymbol) -> Occurrence {
    Occurrence::reference(symbol, location).with_relation(RelationRole::ContainedBy, container)
}

/// An inheritance-clause reference: `symbol` is the base of `conformer`.
pub fn conformance(symbol: IndexSymbol, location: Location, conformer: IndexSymbol) -> Occurrence {
    Occurrence::reference(symbol, location).with_relation(RelationRole::BaseOf, conformer)
}

pub fn run(bundle: &IndexBundle, syntax: &SyntaxTable, config: Config) -> Vec<ScanResult> {
    let mut driver = Driver::new(config);
    driver.scan(bundle, syntax).expect("scan failed")
}

pub fn reported_usrs(results: &[ScanResult]) -> Vec<String> {
    results.iter().map(|r| r.usr.clone()).collect()
}
