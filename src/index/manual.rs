//! Typed handles to manual indices
//!
//! A manual index is filled only by explicit [`Index::put`] calls. Inside
//! a transaction every call is routed through the session's overlay for
//! this index; outside one it goes straight to the backend.

use crate::graph::{Element, ElementClass, GraphResult, PropertyValue, Session};
use std::marker::PhantomData;

/// Handle to a manual index over elements of type `T`.
///
/// The handle holds no state of its own; every operation runs against the
/// session passed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Index<T: Element> {
    name: String,
    _element: PhantomData<fn() -> T>,
}

impl<T: Element> Index<T> {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            _element: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self) -> ElementClass {
        T::CLASS
    }

    pub fn put(&self, session: &mut Session, key: &str, value: impl Into<PropertyValue>, element: &T) -> GraphResult<()> {
        session.check_element(element)?;
        session.index_put(&self.name, T::CLASS, key, value.into(), element.raw_id())
    }

    /// Elements stored under `key = value`, pending transaction writes included
    pub fn get(&self, session: &mut Session, key: &str, value: impl Into<PropertyValue>) -> GraphResult<Vec<T>> {
        let graph = session.graph_id();
        let ids = session.index_get(&self.name, T::CLASS, key, &value.into())?;
        Ok(ids.into_iter().map(|id| T::from_raw(graph, id)).collect())
    }

    pub fn count(&self, session: &mut Session, key: &str, value: impl Into<PropertyValue>) -> GraphResult<usize> {
        Ok(session.index_get(&self.name, T::CLASS, key, &value.into())?.len())
    }

    pub fn remove(&self, session: &mut Session, key: &str, value: impl Into<PropertyValue>, element: &T) -> GraphResult<()> {
        session.check_element(element)?;
        session.index_remove(&self.name, T::CLASS, key, value.into(), element.raw_id())
    }
}
