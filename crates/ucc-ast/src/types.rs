//! The uC type system: eight singleton type names and resolved type stacks.
//!
//! A resolved type is an ordered list of [`TypeName`]s read outside-in: a
//! pointer to `int` is `[Ptr, Int]`, an array of pointer to `char` is
//! `[Array, Ptr, Char]`, a two-dimensional `int` array is
//! `[Array, Array, Int]`. Pointer and array declarators *prepend* their tag,
//! so aggregate tags always precede the scalar tag.
//!
//! Each singleton carries its admissible-operator sets, queried through the
//! `supports_*` methods. The sets decide which unary, binary, relational,
//! and assignment operators the semantic pass accepts for operands of that
//! type.

use std::fmt;

use crate::operators::{AssignOperator, BinaryOperator, UnaryOperator};

/// The eight uC type singletons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeName {
    /// Signed integer scalar
    Int,
    /// Floating-point scalar
    Float,
    /// Character scalar
    Char,
    /// Result of relational and logical operators
    Bool,
    /// Absence of a value
    Void,
    /// Aggregate tag for array declarators
    Array,
    /// Aggregate tag for pointer declarators
    Ptr,
    /// String literal payload
    String,
}

impl TypeName {
    /// The lowercase name used in IR opcode suffixes and diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Char => "char",
            Self::Bool => "bool",
            Self::Void => "void",
            Self::Array => "array",
            Self::Ptr => "ptr",
            Self::String => "string",
        }
    }

    /// Whether this is an aggregate tag (`Array` or `Ptr`).
    #[must_use]
    pub const fn is_aggregate(self) -> bool { matches!(self, Self::Array | Self::Ptr) }

    /// Whether the unary operator is admissible for operands of this type.
    #[must_use]
    pub fn supports_unary(self, op: UnaryOperator) -> bool {
        use UnaryOperator::{
            AddrOf,
            Deref,
            Minus,
            Not,
            Plus,
            PostDec,
            PostInc,
            PreDec,
            PreInc,
        };

        match self {
            Self::Int => {
                matches!(
                    op,
                    Minus | Plus | PreDec | PreInc | PostDec | PostInc | Deref | AddrOf
                )
            }
            Self::Float => matches!(op, Minus | Plus | Deref | AddrOf),
            Self::Bool => matches!(op, Not | Deref | AddrOf),
            Self::Char | Self::Array | Self::Ptr | Self::Void => matches!(op, Deref | AddrOf),
            Self::String => false,
        }
    }

    /// Whether the binary (arithmetic) operator is admissible for this type.
    ///
    /// Relational and logical operators are a separate set; see
    /// [`Self::supports_rel`].
    #[must_use]
    pub fn supports_binary(self, op: BinaryOperator) -> bool {
        use BinaryOperator::{Add, Div, Mod, Mul, Sub};

        match self {
            Self::Int | Self::Float => matches!(op, Add | Sub | Mul | Div | Mod),
            Self::Char | Self::String => matches!(op, Add),
            Self::Bool | Self::Void | Self::Array | Self::Ptr => false,
        }
    }

    /// Whether the relational or logical operator is admissible for this
    /// type. The result of such an operator is always `bool`.
    #[must_use]
    pub fn supports_rel(self, op: BinaryOperator) -> bool {
        use BinaryOperator::{And, Eq, Ge, Gt, Le, Lt, Ne, Or};

        match self {
            Self::Int | Self::Float => matches!(op, Eq | Ne | Lt | Gt | Le | Ge),
            Self::Char | Self::Bool => matches!(op, Eq | Ne | And | Or),
            Self::Array | Self::Ptr | Self::String => matches!(op, Eq | Ne),
            Self::Void => false,
        }
    }

    /// Whether the assignment operator is admissible for targets of this
    /// type.
    #[must_use]
    pub fn supports_assign(self, op: AssignOperator) -> bool {
        match self {
            Self::Int | Self::Float => true,
            Self::Char => matches!(op, AssignOperator::Assign),
            Self::Bool | Self::Void | Self::Array | Self::Ptr | Self::String => false,
        }
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.as_str()) }
}

/// A resolved type: an ordered stack of type names, outer tags first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Ty {
    /// The type names, outside-in
    pub names: Vec<TypeName>,
}

impl Ty {
    /// Creates a type from a list of names.
    #[must_use]
    pub const fn new(names: Vec<TypeName>) -> Self { Self { names } }

    /// Creates a single-name scalar type.
    #[must_use]
    pub fn scalar(name: TypeName) -> Self { Self { names: vec![name] } }

    /// The outermost name, if any.
    #[must_use]
    pub fn outer(&self) -> Option<TypeName> { self.names.first().copied() }

    /// The innermost name: the scalar element type under any aggregate tags.
    #[must_use]
    pub fn element(&self) -> Option<TypeName> { self.names.last().copied() }

    /// Prepends an aggregate tag, as pointer and array declarators do.
    pub fn prepend(&mut self, name: TypeName) { self.names.insert(0, name); }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for name in &self.names {
            write!(f, "{sep}{name}")?;
            sep = " ";
        }

        Ok(())
    }
}

/// What an identifier resolves to: a variable or a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    /// A declared variable (scalar, array, or pointer)
    Var,
    /// A declared or defined function
    Func,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var => write!(f, "var"),
            Self::Func => write!(f, "func"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::{AssignOperator, BinaryOperator, UnaryOperator};

    #[test]
    fn int_admits_arithmetic_and_relational() {
        assert!(TypeName::Int.supports_binary(BinaryOperator::Mod));
        assert!(TypeName::Int.supports_rel(BinaryOperator::Le));
        assert!(!TypeName::Int.supports_rel(BinaryOperator::And));
    }

    #[test]
    fn char_assignment_is_plain_only() {
        assert!(TypeName::Char.supports_assign(AssignOperator::Assign));
        assert!(!TypeName::Char.supports_assign(AssignOperator::AddAssign));
    }

    #[test]
    fn float_rejects_increment() {
        assert!(TypeName::Float.supports_unary(UnaryOperator::Minus));
        assert!(!TypeName::Float.supports_unary(UnaryOperator::PreInc));
    }

    #[test]
    fn ty_prepend_keeps_aggregate_tags_outermost() {
        let mut ty = Ty::scalar(TypeName::Int);
        ty.prepend(TypeName::Array);
        ty.prepend(TypeName::Array);

        assert_eq!(ty.names, vec![TypeName::Array, TypeName::Array, TypeName::Int]);
        assert_eq!(ty.element(), Some(TypeName::Int));
    }
}
