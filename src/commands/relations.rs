// src/commands/relations.rs

use std::process::ExitCode;

use crate::facts::Relation;

/// Print the relation schema, one name per line.
pub fn print_relations() -> ExitCode {
    for relation in Relation::all() {
        println!("{}", relation.name());
    }
    ExitCode::SUCCESS
}
