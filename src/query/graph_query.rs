//! Graph-wide predicate queries
//!
//! Planning is first-match, never cost based:
//! 1. an `Equal` predicate on a key-indexed property drives an index lookup
//! 2. otherwise the class is scanned row by row
//!
//! Every predicate, the driving one included, is then applied as a filter
//! and the limit stops production as soon as enough rows have passed.

use super::predicate::{Comparator, HasContainer};
use super::element_matches;
use crate::graph::{Edge, Element, ElementClass, GraphError, GraphResult, PropertyValue, Session, Vertex};
use crate::index::IndexCollection;
use crate::storage::RowCursor;
use tracing::debug;

/// How the candidate rows of a query are produced
#[derive(Debug, Clone, PartialEq)]
enum Plan {
    IndexLookup { key: String, value: PropertyValue },
    Scan,
}

fn choose_plan(indices: &IndexCollection, class: ElementClass, predicates: &[HasContainer]) -> GraphResult<Plan> {
    for predicate in predicates {
        if predicate.comparator == Comparator::Equal
            && !predicate.value.is_null()
            && indices.is_key_indexed(class, &predicate.key)?
        {
            return Ok(Plan::IndexLookup {
                key: predicate.key.clone(),
                value: predicate.value.clone(),
            });
        }
    }
    Ok(Plan::Scan)
}

/// Query builder over all vertices or all edges of a graph
pub struct GraphQuery<'a> {
    session: &'a mut Session,
    predicates: Vec<HasContainer>,
    limit: usize,
}

impl<'a> GraphQuery<'a> {
    pub(crate) fn new(session: &'a mut Session) -> Self {
        Self {
            session,
            predicates: Vec::new(),
            limit: usize::MAX,
        }
    }

    /// `key == value`
    pub fn has(self, key: &str, value: impl Into<PropertyValue>) -> GraphResult<Self> {
        self.has_cmp(key, Comparator::Equal, value)
    }

    pub fn has_cmp(mut self, key: &str, comparator: Comparator, value: impl Into<PropertyValue>) -> GraphResult<Self> {
        self.predicates.push(HasContainer::new(key, comparator, value)?);
        Ok(self)
    }

    /// Half-open range: `start <= key < end`
    pub fn interval(self, key: &str, start: impl Into<PropertyValue>, end: impl Into<PropertyValue>) -> GraphResult<Self> {
        self.has_cmp(key, Comparator::GreaterThanEqual, start)?
            .has_cmp(key, Comparator::LessThan, end)
    }

    pub fn limit(mut self, max: usize) -> GraphResult<Self> {
        if max == 0 {
            return Err(GraphError::ArgumentInvalid("query limit must be positive".into()));
        }
        self.limit = max;
        Ok(self)
    }

    pub fn predicates(&self) -> &[HasContainer] {
        &self.predicates
    }

    pub fn vertices(self) -> GraphResult<Vec<Vertex>> {
        self.run()
    }

    pub fn edges(self) -> GraphResult<Vec<Edge>> {
        self.run()
    }

    fn run<T: Element>(self) -> GraphResult<Vec<T>> {
        let graph = self.session.open_graph()?;
        self.session.wait_for_generation()?;

        let class = T::CLASS;
        let store = graph.store.as_ref();
        let plan = choose_plan(&graph.indices, class, &self.predicates)?;
        debug!(
            "Query over {}: {:?} with {} predicates, limit {}",
            class,
            plan,
            self.predicates.len(),
            self.limit
        );

        let mut candidates: Box<dyn Iterator<Item = GraphResult<u64>> + '_> = match &plan {
            Plan::IndexLookup { key, value } => {
                let ids = graph
                    .indices
                    .get(graph.backend.as_ref(), class, key, value)?
                    .unwrap_or_default();
                Box::new(ids.into_iter().map(Ok))
            }
            Plan::Scan => Box::new(RowCursor::new(store, class).map(|row| row.map_err(GraphError::from))),
        };

        let mut results = Vec::new();
        while results.len() < self.limit {
            let row = match candidates.next() {
                Some(row) => row?,
                None => break,
            };
            if matches!(plan, Plan::IndexLookup { .. }) && !store.has_row(class, row)? {
                continue;
            }
            if element_matches(store, class, row, &self.predicates)? {
                results.push(T::from_raw(graph.id, row));
            }
        }
        Ok(results)
    }
}
