//! Scope resolution and reference renaming

mod mapping;
mod renamer;
mod scope;

pub use mapping::{RenameMapping, TableMapping};
pub use renamer::Renamer;
pub use scope::{
    ColumnBindings, QueryScope, Reference, ScopeId, ScopeResolver, ScopeTable, TableBindings,
    TableSource,
};
