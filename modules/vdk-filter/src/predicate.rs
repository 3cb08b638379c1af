//! Single-value predicates.

use serde::{Deserialize, Serialize};

use crate::comparable::Comparable;

/// A boolean relation bound to one reference value.
///
/// The set of relations is closed; every variant carries its reference value,
/// so a predicate without one cannot be constructed.
///
/// Serialized as `{ "op": "equal", "value": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "value", rename_all = "snake_case")]
pub enum Predicate<T> {
    /// True when the reference value equals the supplied one.
    Equal(T),
    /// True when the reference value does not equal the supplied one.
    NotEqual(T),
}

impl<T> Predicate<T> {
    pub fn equal(comparable: T) -> Self {
        Predicate::Equal(comparable)
    }

    pub fn not_equal(comparable: T) -> Self {
        Predicate::NotEqual(comparable)
    }

    /// The stored reference value.
    pub fn comparable(&self) -> &T {
        match self {
            Predicate::Equal(c) | Predicate::NotEqual(c) => c,
        }
    }

    /// Evaluate the relation between the stored value and `comparable`.
    pub fn evaluate<C>(&self, comparable: &C) -> bool
    where
        C: ?Sized,
        T: Comparable<C>,
    {
        match self {
            Predicate::Equal(stored) => stored.is_equal(comparable),
            Predicate::NotEqual(stored) => !stored.is_equal(comparable),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_is_reflexive() {
        let p = Predicate::equal(42u32);
        assert!(p.evaluate(&42u32));
    }

    #[test]
    fn equal_rejects_different_value() {
        let p = Predicate::equal("deploy");
        assert!(!p.evaluate(&"delete"));
    }

    #[test]
    fn not_equal_negates_equal() {
        let p = Predicate::not_equal(1);
        assert!(p.evaluate(&2));
        assert!(!p.evaluate(&1));
    }

    #[test]
    fn evaluate_leaves_reference_untouched() {
        let p = Predicate::equal(String::from("a"));
        p.evaluate("b");
        p.evaluate("a");
        assert_eq!(p.comparable(), "a");
    }
}
