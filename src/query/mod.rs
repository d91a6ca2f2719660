//! Predicate queries over vertices and edges
//!
//! Two query surfaces share one predicate model:
//! - [`GraphQuery`] evaluates against every element of a class, driven by
//!   a key index when an equality predicate allows it
//! - [`VertexQuery`] evaluates against the edges incident to one vertex
//!
//! Every predicate is re-checked against the row store, so a stale index
//! candidate can never leak into a result.

pub mod graph_query;
pub mod predicate;
pub mod vertex_query;

pub use graph_query::GraphQuery;
pub use predicate::{Comparator, HasContainer};
pub use vertex_query::VertexQuery;

use crate::graph::{ElementClass, GraphResult, PropertyValue, ID_KEY, LABEL_KEY};
use crate::storage::{PropertyStore, LABEL_COLUMN};

/// Value an element exposes for a query key. `id` resolves to the element
/// id and, on edges, `label` to the edge label.
pub(crate) fn property_of(
    store: &dyn PropertyStore,
    class: ElementClass,
    row: u64,
    key: &str,
) -> GraphResult<Option<PropertyValue>> {
    if key == ID_KEY {
        return Ok(i64::try_from(row).ok().map(PropertyValue::Integer));
    }
    if key == LABEL_KEY && class == ElementClass::Edge {
        return Ok(store.read_cell(class, row, LABEL_COLUMN)?);
    }
    Ok(store.read_cell(class, row, key)?)
}

/// Whether a row passes every predicate
pub(crate) fn element_matches(
    store: &dyn PropertyStore,
    class: ElementClass,
    row: u64,
    predicates: &[HasContainer],
) -> GraphResult<bool> {
    for predicate in predicates {
        let value = property_of(store, class, row, &predicate.key)?;
        if !predicate.test(value.as_ref()) {
            return Ok(false);
        }
    }
    Ok(true)
}
