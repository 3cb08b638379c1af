//! Conjunctions of predicates.

use std::ops::{Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::comparable::Comparable;
use crate::predicate::Predicate;

/// Zero or more predicates combined with logical AND.
///
/// Predicates are kept in insertion order and evaluated in that order, though
/// the result does not depend on it. An empty expression is vacuously true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expression<T> {
    predicates: Vec<Predicate<T>>,
}

impl<T> Expression<T> {
    pub fn new() -> Self {
        Self {
            predicates: Vec::new(),
        }
    }

    pub fn with_predicates(predicates: impl IntoIterator<Item = Predicate<T>>) -> Self {
        Self {
            predicates: predicates.into_iter().collect(),
        }
    }

    /// Append predicates. Duplicates are kept.
    pub fn add_predicate(&mut self, predicates: impl IntoIterator<Item = Predicate<T>>) {
        self.predicates.extend(predicates);
    }

    pub fn has_predicates(&self) -> bool {
        !self.predicates.is_empty()
    }

    pub fn predicates(&self) -> &[Predicate<T>] {
        &self.predicates
    }

    /// True iff every predicate holds for `comparable`.
    pub fn evaluate<C>(&self, comparable: &C) -> bool
    where
        C: ?Sized,
        T: Comparable<C>,
    {
        self.predicates.iter().all(|p| p.evaluate(comparable))
    }
}

impl<T> Default for Expression<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Predicate<T>> for Expression<T> {
    fn from(predicate: Predicate<T>) -> Self {
        Self::with_predicates([predicate])
    }
}

impl<T> FromIterator<Predicate<T>> for Expression<T> {
    fn from_iter<I: IntoIterator<Item = Predicate<T>>>(iter: I) -> Self {
        Self::with_predicates(iter)
    }
}

/// An [`Expression`] that gates whether a system event handler runs for a
/// given event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SystemEventFilterExpression<T>(Expression<T>);

impl<T> SystemEventFilterExpression<T> {
    pub fn new() -> Self {
        Self(Expression::new())
    }

    pub fn with_predicates(predicates: impl IntoIterator<Item = Predicate<T>>) -> Self {
        Self(Expression::with_predicates(predicates))
    }

    pub fn into_inner(self) -> Expression<T> {
        self.0
    }
}

impl<T> Default for SystemEventFilterExpression<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> From<Expression<T>> for SystemEventFilterExpression<T> {
    fn from(expression: Expression<T>) -> Self {
        Self(expression)
    }
}

impl<T> From<Predicate<T>> for SystemEventFilterExpression<T> {
    fn from(predicate: Predicate<T>) -> Self {
        Self(Expression::from(predicate))
    }
}

impl<T> Deref for SystemEventFilterExpression<T> {
    type Target = Expression<T>;

    fn deref(&self) -> &Expression<T> {
        &self.0
    }
}

impl<T> DerefMut for SystemEventFilterExpression<T> {
    fn deref_mut(&mut self) -> &mut Expression<T> {
        &mut self.0
    }
}
