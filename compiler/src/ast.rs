pub use unire_runtime::{BuiltinClass, ClassExpr};

/// A parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expression {
    pub root: Node,
    /// The number of save-point groups, excluding the implicit whole match.
    pub groups: usize,
}

impl Expression {
    pub fn new(root: Node, groups: usize) -> Self {
        Self { root, groups }
    }
}

/// A node of the abstract syntax tree.
///
/// Quantified and saved nodes always wrap a non-empty subtree. The only
/// empty node is the `Cat` of an empty pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Char(char),
    AnyChar,
    Class(ClassExpr),
    Cat(Vec<Node>),
    Alt(Vec<Node>),
    Star {
        node: Box<Node>,
        greedy: bool,
    },
    Plus {
        node: Box<Node>,
        greedy: bool,
    },
    Opt {
        node: Box<Node>,
        greedy: bool,
    },
    /// Bounded repetition. An absent `max` is unbounded.
    Repeat {
        node: Box<Node>,
        min: u32,
        max: Option<u32>,
        greedy: bool,
    },
    /// A capture group, numbered from 1 in the lexical order of its opening
    /// save point.
    Save {
        group: usize,
        node: Box<Node>,
    },
    AnchorBegin,
    AnchorEnd,
}

impl Node {
    /// Joins a sequence of nodes, collapsing a single element into itself.
    pub fn concatenation(mut nodes: Vec<Node>) -> Self {
        if nodes.len() == 1 {
            nodes.remove(0)
        } else {
            Node::Cat(nodes)
        }
    }

    /// Joins prioritized alternatives, collapsing a single element into
    /// itself.
    pub fn alternation(mut nodes: Vec<Node>) -> Self {
        if nodes.len() == 1 {
            nodes.remove(0)
        } else {
            Node::Alt(nodes)
        }
    }

    /// A capture group awaiting its group number.
    pub fn save(node: Node) -> Self {
        Node::Save {
            group: 0,
            node: Box::new(node),
        }
    }

    /// Numbers every capture group in preorder starting from `next`,
    /// returning the next unassigned group number.
    pub fn number_groups(&mut self, next: usize) -> usize {
        match self {
            Node::Save { group, node } => {
                *group = next;
                node.number_groups(next + 1)
            }
            Node::Cat(nodes) | Node::Alt(nodes) => nodes
                .iter_mut()
                .fold(next, |next, node| node.number_groups(next)),
            Node::Star { node, .. }
            | Node::Plus { node, .. }
            | Node::Opt { node, .. }
            | Node::Repeat { node, .. } => node.number_groups(next),
            Node::Char(_) | Node::AnyChar | Node::Class(_) | Node::AnchorBegin | Node::AnchorEnd => {
                next
            }
        }
    }
}

impl From<char> for Node {
    fn from(src: char) -> Self {
        Node::Char(src)
    }
}

impl From<ClassExpr> for Node {
    fn from(src: ClassExpr) -> Self {
        Node::Class(src)
    }
}

// Quantifiers

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantifier {
    Eager(QuantifierType),
    Lazy(QuantifierType),
}

impl Quantifier {
    /// Wraps `node` in the repetition this quantifier describes.
    pub fn apply(self, node: Node) -> Node {
        let (quantifier_ty, greedy) = match self {
            Quantifier::Eager(ty) => (ty, true),
            Quantifier::Lazy(ty) => (ty, false),
        };
        let node = Box::new(node);

        match quantifier_ty {
            QuantifierType::ZeroOrMore => Node::Star { node, greedy },
            QuantifierType::OneOrMore => Node::Plus { node, greedy },
            QuantifierType::ZeroOrOne => Node::Opt { node, greedy },
            QuantifierType::MatchExactRange(count) => Node::Repeat {
                node,
                min: count,
                max: Some(count),
                greedy,
            },
            QuantifierType::MatchAtLeastRange(min) => Node::Repeat {
                node,
                min,
                max: None,
                greedy,
            },
            QuantifierType::MatchBetweenRange {
                lower_bound,
                upper_bound,
            } => Node::Repeat {
                node,
                min: lower_bound,
                max: Some(upper_bound),
                greedy,
            },
        }
    }
}

/// Represents all variants of quantifier types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantifierType {
    /// `{n}`
    MatchExactRange(u32),
    /// `{n,}`
    MatchAtLeastRange(u32),
    /// `{n,m}`
    MatchBetweenRange { lower_bound: u32, upper_bound: u32 },
    /// Represents a quantifier representing a match of zero or more of the
    /// preceeding field. Represented by the `*` quantifier.
    ZeroOrMore,
    /// Represents a quantifier representing a match of one or more of the
    /// preceeding field. Represented by the `+` quantifier.
    OneOrMore,
    /// Represents an optional quantifier representing a match of zero or one
    /// field. Represented by the `?` quantifier.
    ZeroOrOne,
}
