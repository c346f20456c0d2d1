//! Character-class expressions and their evaluation against a single code
//! point.
//!
//! A class is a small boolean expression tree over code points. Leaves are
//! single code points, inclusive ranges and the built-in classes, which are
//! combined with union, intersection and complement. Evaluation is pure and
//! total: every code point is either a member of a class or it is not.

use std::fmt::Display;

/// Represents a type that can be used as a comparative character set.
pub trait CharacterSetVerifiable {
    fn in_set(&self, value: char) -> bool;

    fn not_in_set(&self, value: char) -> bool {
        !self.in_set(value)
    }
}

impl CharacterSetVerifiable for std::ops::RangeInclusive<char> {
    fn in_set(&self, value: char) -> bool {
        self.contains(&value)
    }
}

impl CharacterSetVerifiable for char {
    fn in_set(&self, value: char) -> bool {
        *self == value
    }
}

/// The built-in classes available through the `\d \w \s \a \c \u \h`
/// escapes.
///
/// All built-ins are confined to ASCII. Any code point outside of the ASCII
/// plane is a member of none of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinClass {
    /// `0-9`
    Digit,
    /// Alphanumerics and `_`.
    Word,
    /// Space, `\t`, `\n`, `\r`, `\v` and `\f`.
    Space,
    /// `a-z` and `A-Z`.
    Alpha,
    /// `a-z`
    Lower,
    /// `A-Z`
    Upper,
    /// `0-9`, `a-f` and `A-F`.
    HexDigit,
}

impl BuiltinClass {
    /// Returns the built-in class denoted by the lowercase escape character
    /// `c`, if any.
    pub fn from_escape(c: char) -> Option<Self> {
        match c {
            'd' => Some(Self::Digit),
            'w' => Some(Self::Word),
            's' => Some(Self::Space),
            'a' => Some(Self::Alpha),
            'c' => Some(Self::Lower),
            'u' => Some(Self::Upper),
            'h' => Some(Self::HexDigit),
            _ => None,
        }
    }

    /// The escape character that denotes this class.
    pub const fn escape(self) -> char {
        match self {
            Self::Digit => 'd',
            Self::Word => 'w',
            Self::Space => 's',
            Self::Alpha => 'a',
            Self::Lower => 'c',
            Self::Upper => 'u',
            Self::HexDigit => 'h',
        }
    }
}

impl CharacterSetVerifiable for BuiltinClass {
    fn in_set(&self, value: char) -> bool {
        match self {
            Self::Digit => value.is_ascii_digit(),
            Self::Word => value.is_ascii_alphanumeric() || value == '_',
            // `char::is_ascii_whitespace` excludes the vertical tab.
            Self::Space => matches!(value, ' ' | '\t' | '\n' | '\r' | '\x0b' | '\x0c'),
            Self::Alpha => value.is_ascii_alphabetic(),
            Self::Lower => value.is_ascii_lowercase(),
            Self::Upper => value.is_ascii_uppercase(),
            Self::HexDigit => value.is_ascii_hexdigit(),
        }
    }
}

impl Display for BuiltinClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\\{}", self.escape())
    }
}

/// A character-class expression.
///
/// Ranges are always ordered (`lo <= hi`) and the tree never holds an empty
/// union; both are guaranteed by the constructors below.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClassExpr {
    Single(char),
    Range(char, char),
    Builtin(BuiltinClass),
    Union(Box<ClassExpr>, Box<ClassExpr>),
    Intersect(Box<ClassExpr>, Box<ClassExpr>),
    Complement(Box<ClassExpr>),
}

impl ClassExpr {
    pub const fn single(value: char) -> Self {
        Self::Single(value)
    }

    /// Returns an inclusive range, or `None` if `lo` is greater than `hi`.
    pub fn range(lo: char, hi: char) -> Option<Self> {
        match lo.cmp(&hi) {
            std::cmp::Ordering::Less => Some(Self::Range(lo, hi)),
            std::cmp::Ordering::Equal => Some(Self::Single(lo)),
            std::cmp::Ordering::Greater => None,
        }
    }

    pub const fn builtin(class: BuiltinClass) -> Self {
        Self::Builtin(class)
    }

    pub fn union(self, other: Self) -> Self {
        Self::Union(Box::new(self), Box::new(other))
    }

    pub fn intersect(self, other: Self) -> Self {
        Self::Intersect(Box::new(self), Box::new(other))
    }

    pub fn complement(self) -> Self {
        Self::Complement(Box::new(self))
    }

    /// Joins a non-empty group of classes into a single union.
    ///
    /// The union is built as a balanced tree so that evaluation depth grows
    /// logarithmically with the number of members.
    pub fn union_of(head: Self, tail: Vec<Self>) -> Self {
        Self::balanced(head, tail, Self::union)
    }

    /// Joins a non-empty group of classes into a single intersection, balanced
    /// the same way as [`ClassExpr::union_of`].
    pub fn intersection_of(head: Self, tail: Vec<Self>) -> Self {
        Self::balanced(head, tail, Self::intersect)
    }

    /// Pairs neighbouring members level by level until only `head` remains.
    fn balanced(head: Self, tail: Vec<Self>, combine: fn(Self, Self) -> Self) -> Self {
        let mut head = head;
        let mut level = tail;

        loop {
            let mut members = level.into_iter();
            head = match members.next() {
                Some(rhs) => combine(head, rhs),
                None => return head,
            };

            let mut paired = Vec::with_capacity((members.len() + 1) / 2);
            while let Some(lhs) = members.next() {
                match members.next() {
                    Some(rhs) => paired.push(combine(lhs, rhs)),
                    None => paired.push(lhs),
                }
            }

            level = paired;
        }
    }
}

impl CharacterSetVerifiable for ClassExpr {
    fn in_set(&self, value: char) -> bool {
        match self {
            Self::Single(c) => c.in_set(value),
            Self::Range(lo, hi) => (*lo..=*hi).in_set(value),
            Self::Builtin(class) => class.in_set(value),
            Self::Union(lhs, rhs) => lhs.in_set(value) || rhs.in_set(value),
            Self::Intersect(lhs, rhs) => lhs.in_set(value) && rhs.in_set(value),
            Self::Complement(inner) => inner.not_in_set(value),
        }
    }
}

impl Display for ClassExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(c) => write!(f, "{:?}", c),
            Self::Range(lo, hi) => write!(f, "{:?}-{:?}", lo, hi),
            Self::Builtin(class) => Display::fmt(class, f),
            Self::Union(lhs, rhs) => write!(f, "({} | {})", lhs, rhs),
            Self::Intersect(lhs, rhs) => write!(f, "({} & {})", lhs, rhs),
            Self::Complement(inner) => write!(f, "!{}", inner),
        }
    }
}
