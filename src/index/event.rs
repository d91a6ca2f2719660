//! Index mutations as values
//!
//! Synchronous backends apply these in place; the queued backend ships
//! them to its worker.

use super::backend::IndexName;
use crate::graph::{ElementClass, PropertyValue};

#[derive(Debug, Clone)]
pub enum IndexOp {
    CreateIndex {
        index: IndexName,
    },
    DropIndex {
        index: IndexName,
    },
    Set {
        index: IndexName,
        id: u64,
        key: String,
        value: PropertyValue,
    },
    Remove {
        index: IndexName,
        id: u64,
        key: String,
        value: PropertyValue,
    },
    DeleteDocuments {
        class: ElementClass,
        id: u64,
    },
}
