//! The equality capability every filtered value needs.

/// A value that can test equality against another value of a compatible kind.
///
/// Implemented for every `T: PartialEq<Rhs>`, so a type picks its equality
/// semantics (structural, case-insensitive, by id, ...) by implementing
/// `PartialEq`. Predicates never look past this method.
pub trait Comparable<Rhs: ?Sized = Self> {
    fn is_equal(&self, other: &Rhs) -> bool;
}

impl<T, Rhs> Comparable<Rhs> for T
where
    T: ?Sized + PartialEq<Rhs>,
    Rhs: ?Sized,
{
    fn is_equal(&self, other: &Rhs) -> bool {
        self == other
    }
}
