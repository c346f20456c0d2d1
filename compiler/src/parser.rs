use parcel::parsers::character::{digit, expect_character};
use parcel::prelude::v1::*;
use thiserror::Error;

use crate::ast::{self, BuiltinClass, ClassExpr, Node};

/// An error encountered while parsing a pattern, located by the byte offset
/// into the pattern at which it was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{kind} at offset {position}")]
pub struct ParseError {
    pub position: usize,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub const fn new(position: usize, kind: ParseErrorKind) -> Self {
        Self { position, kind }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unexpected end of pattern")]
    UnexpectedEnd,
    #[error("unbalanced parenthesis")]
    UnbalancedParenthesis,
    #[error("unterminated character class")]
    UnterminatedClass,
    #[error("empty character class")]
    EmptyClass,
    #[error("quantifier has nothing to repeat")]
    NothingToRepeat,
    #[error("invalid repetition bounds")]
    InvalidRepetition,
    #[error("unknown escape sequence `\\{0}`")]
    UnknownEscape(char),
    #[error("save point has no matching save point")]
    UnpairedSavePoint,
    #[error("save points enclose nothing")]
    EmptySaveGroup,
    #[error("empty alternative")]
    EmptyAlternative,
    #[error("empty group")]
    EmptyGroup,
    #[error("unexpected character {0:?}")]
    UnexpectedCharacter(char),
    #[error("invalid range {0:?}-{1:?}")]
    InvalidRange(char, char),
    #[error("nesting exceeds the limit of {0}")]
    NestingTooDeep(u32),
}

/// The value of a successful syntactic parse, which may still carry a
/// semantic error such as an inverted range.
type Parsed<T> = Result<T, ParseError>;

/// Characters that must be escaped to be matched literally.
const METACHARACTERS: [char; 16] = [
    '.', '^', '$', '*', '+', '?', '{', '}', '(', ')', '[', ']', '|', '\\', '&', '@',
];

/// Characters that may not appear unescaped inside a `[...]` class.
const BRACKET_RESERVED: &[char] = &['[', ']', '\\'];

/// Characters that may not appear unescaped inside a `@{...}` class.
const SET_RESERVED: &[char] = &['[', ']', '\\', '|', '&', '!', '(', ')', '}'];

fn is_metacharacter(c: char) -> bool {
    METACHARACTERS.contains(&c)
}

/// The deepest nesting of groups, classes and class complements accepted by
/// [`parse`].
pub const DEFAULT_NEST_LIMIT: u32 = 128;

/// Parses a pattern into its abstract syntax tree, numbering its save-point
/// groups.
pub fn parse(pattern: &str) -> Result<ast::Expression, ParseError> {
    parse_with(pattern, DEFAULT_NEST_LIMIT)
}

/// Parses a pattern, rejecting it with [`ParseErrorKind::NestingTooDeep`] when
/// its groups and classes nest deeper than `nest_limit`.
pub fn parse_with(pattern: &str, nest_limit: u32) -> Result<ast::Expression, ParseError> {
    let input: Vec<(usize, char)> = pattern.char_indices().collect();
    let end = pattern.len();

    // the empty pattern matches the empty string.
    if input.is_empty() {
        return Ok(ast::Expression::new(Node::Cat(vec![]), 0));
    }

    check_nesting(&input, nest_limit)?;

    let mut root = match alternation().parse(&input[..]) {
        Ok(MatchStatus::Match {
            remainder, inner, ..
        }) if remainder.is_empty() => inner,
        Ok(MatchStatus::Match {
            inner: Err(err), ..
        }) => Err(err),
        Ok(MatchStatus::Match { remainder, .. }) => Err(diagnose(remainder, end)),
        Ok(MatchStatus::NoMatch(remainder)) => Err(diagnose(remainder, end)),
        Err(_) => Err(diagnose(&input, end)),
    }?;

    let groups = root.number_groups(1) - 1;
    Ok(ast::Expression::new(root, groups))
}

/// The construct a nesting opener begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Nesting {
    Group,
    Bracket,
    Set,
    SetGroup,
}

/// Walks the pattern once, tracking how deeply the grammar below would
/// recurse, and fails at the first opener that crosses `limit`.
///
/// Unbalanced or misplaced delimiters are left for the grammar to diagnose.
fn check_nesting(input: &[(usize, char)], limit: u32) -> Result<(), ParseError> {
    let limit_exceeded = move |pos| ParseError::new(pos, ParseErrorKind::NestingTooDeep(limit));
    let limit = limit as usize;

    let mut open: Vec<(Nesting, usize)> = vec![];
    let mut depth = 0;
    // complements stack on the operand that follows them.
    let mut complements = 0;
    let mut chars = input.iter().peekable();

    while let Some(&(pos, c)) = chars.next() {
        let within = open.last().map(|&(nesting, _)| nesting);

        let opened = match (within, c) {
            (_, '\\') => {
                chars.next();
                None
            }
            (Some(Nesting::Set | Nesting::SetGroup), '!') => {
                complements += 1;
                if depth + complements > limit {
                    return Err(limit_exceeded(pos));
                }
                continue;
            }
            (None | Some(Nesting::Group), '(') => Some(Nesting::Group),
            (Some(Nesting::Set | Nesting::SetGroup), '(') => Some(Nesting::SetGroup),
            (_, '[') => Some(Nesting::Bracket),
            (None | Some(Nesting::Group), '@') if matches!(chars.peek(), Some((_, '{'))) => {
                chars.next();
                Some(Nesting::Set)
            }
            (Some(Nesting::Group), ')')
            | (Some(Nesting::Bracket), ']')
            | (Some(Nesting::Set), '}')
            | (Some(Nesting::SetGroup), ')') => {
                if let Some((_, weight)) = open.pop() {
                    depth -= weight;
                }
                None
            }
            _ => None,
        };

        if let Some(nesting) = opened {
            let weight = 1 + complements;
            depth += weight;
            if depth > limit {
                return Err(limit_exceeded(pos));
            }
            open.push((nesting, weight));
        }
        complements = 0;
    }

    Ok(())
}

/// A single element of a concatenation prior to save-point pairing.
#[derive(Debug)]
enum Piece {
    SavePoint(usize),
    Node(Node),
}

/// The meaning of a `\x` escape.
#[derive(Debug)]
enum Escape {
    Literal(char),
    Class(ClassExpr),
}

impl From<Escape> for Node {
    fn from(src: Escape) -> Self {
        match src {
            Escape::Literal(c) => Node::Char(c),
            Escape::Class(class) => Node::Class(class),
        }
    }
}

impl From<Escape> for ClassExpr {
    fn from(src: Escape) -> Self {
        match src {
            Escape::Literal(c) => ClassExpr::single(c),
            Escape::Class(class) => class,
        }
    }
}

// Expression

fn alternation<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<Node>> {
    parcel::join(
        concatenation(),
        parcel::zero_or_more(parcel::right(parcel::join(
            expect_character('|'),
            concatenation(),
        ))),
    )
    .map(|(head, tail)| {
        std::iter::once(head)
            .chain(tail)
            .collect::<Parsed<Vec<Node>>>()
            .map(Node::alternation)
    })
}

fn concatenation<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<Node>> {
    parcel::one_or_more(piece()).map(|pieces| {
        pieces
            .into_iter()
            .collect::<Parsed<Vec<Piece>>>()
            .and_then(pair_save_points)
    })
}

/// Folds the save points of a concatenation into capture groups.
///
/// Consecutive save points delimit a group, so `&a&b&` yields the two groups
/// `a` and `b`. A lone save point or a pair enclosing nothing is rejected.
fn pair_save_points(pieces: Vec<Piece>) -> Parsed<Node> {
    let marks: Vec<usize> = pieces
        .iter()
        .filter_map(|piece| match piece {
            Piece::SavePoint(pos) => Some(*pos),
            Piece::Node(_) => None,
        })
        .collect();

    match marks.as_slice() {
        [] => (),
        [pos] => return Err(ParseError::new(*pos, ParseErrorKind::UnpairedSavePoint)),
        _ => (),
    }

    let last_mark = marks.len().saturating_sub(1);
    let mut seen = 0;
    let mut nodes = vec![];
    let mut open: Option<Vec<Node>> = None;

    for piece in pieces {
        match piece {
            Piece::SavePoint(pos) => {
                if let Some(body) = open.take() {
                    if body.is_empty() {
                        return Err(ParseError::new(pos, ParseErrorKind::EmptySaveGroup));
                    }

                    nodes.push(Node::save(Node::concatenation(body)));
                }

                if seen < last_mark {
                    open = Some(vec![]);
                }
                seen += 1;
            }
            Piece::Node(node) => match open.as_mut() {
                Some(body) => body.push(node),
                None => nodes.push(node),
            },
        }
    }

    Ok(Node::concatenation(nodes))
}

fn piece<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<Piece>> {
    parcel::or(
        located('&').map(|pos| Ok(Piece::SavePoint(pos))),
        || factor().map(|factor| factor.map(Piece::Node)),
    )
}

fn factor<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<Node>> {
    parcel::or(anchor().map(|anchor| -> Parsed<Node> { Ok(anchor) }), || {
        parcel::join(atom(), parcel::optional(quantifier())).map(
            |(atom, quantifier)| -> Parsed<Node> {
                let atom = atom?;

                match quantifier {
                    Some(quantifier) => Ok(quantifier?.apply(atom)),
                    None => Ok(atom),
                }
            },
        )
    })
}

fn anchor<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Node> {
    parcel::or(expect_character('^').map(|_| Node::AnchorBegin), || {
        expect_character('$').map(|_| Node::AnchorEnd)
    })
}

fn atom<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<Node>> {
    parcel::or(
        expect_character('.').map(|_| -> Parsed<Node> { Ok(Node::AnyChar) }),
        || {
            parcel::or(escape().map(|escape| escape.map(Node::from)), || {
                parcel::or(class().map(|class| class.map(Node::Class)), || {
                    parcel::or(group(), || literal().map(|c| Ok(Node::Char(c))))
                })
            })
        },
    )
}

fn group<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<Node>> {
    move |input: &'a [(usize, char)]| {
        parcel::right(parcel::join(
            expect_character('('),
            parcel::left(parcel::join(alternation(), expect_character(')'))),
        ))
        .parse(input)
    }
}

fn literal<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], char> {
    any_code_point().predicate(|c| !is_metacharacter(*c))
}

fn escape<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<Escape>> {
    move |input: &'a [(usize, char)]| match input.get(0..2) {
        Some(&[(escape_pos, '\\'), (to_escape_pos, to_escape)]) => Ok(MatchStatus::Match {
            span: escape_pos..to_escape_pos + to_escape.len_utf8(),
            remainder: &input[2..],
            inner: escaped_equivalent(to_escape).ok_or(ParseError::new(
                escape_pos,
                ParseErrorKind::UnknownEscape(to_escape),
            )),
        }),
        _ => Ok(MatchStatus::NoMatch(input)),
    }
}

fn escaped_equivalent(c: char) -> Option<Escape> {
    match c {
        'n' => Some(Escape::Literal('\n')),
        't' => Some(Escape::Literal('\t')),
        'r' => Some(Escape::Literal('\r')),
        'f' => Some(Escape::Literal('\x0c')),
        'v' => Some(Escape::Literal('\x0b')),
        '0' => Some(Escape::Literal('\0')),
        '-' | '!' => Some(Escape::Literal(c)),
        c if is_metacharacter(c) => Some(Escape::Literal(c)),
        c if c.is_ascii_uppercase() => BuiltinClass::from_escape(c.to_ascii_lowercase())
            .map(|class| Escape::Class(ClassExpr::builtin(class).complement())),
        c => BuiltinClass::from_escape(c).map(|class| Escape::Class(ClassExpr::builtin(class))),
    }
}

// Character Classes

fn class<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<ClassExpr>> {
    parcel::or(bracket_class(), || set_class())
}

/// `[...]`: an optionally negated union of code points, ranges, escapes and
/// nested bracket classes.
fn bracket_class<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<ClassExpr>> {
    move |input: &'a [(usize, char)]| {
        parcel::join(
            parcel::join(located('['), expect_character('^').optional()),
            parcel::left(parcel::join(
                parcel::one_or_more(bracket_item()),
                expect_character(']'),
            )),
        )
        .map(|((pos, negation), items)| -> Parsed<ClassExpr> {
            let mut items = items
                .into_iter()
                .collect::<Parsed<Vec<ClassExpr>>>()?
                .into_iter();

            let class = match items.next() {
                Some(head) => ClassExpr::union_of(head, items.collect()),
                None => return Err(ParseError::new(pos, ParseErrorKind::EmptyClass)),
            };

            match negation {
                Some(_) => Ok(class.complement()),
                None => Ok(class),
            }
        })
        .parse(input)
    }
}

fn bracket_item<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<ClassExpr>> {
    parcel::or(bracket_class(), || {
        parcel::or(class_range(BRACKET_RESERVED), || {
            parcel::or(escape().map(|escape| escape.map(ClassExpr::from)), || {
                class_literal(BRACKET_RESERVED).map(|c| Ok(ClassExpr::single(c)))
            })
        })
    })
}

/// `@{...}`: the full class algebra. `!` binds tightest, then juxtaposition
/// (union), then `&` (intersection) and finally `|` (union).
fn set_class<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<ClassExpr>> {
    parcel::right(parcel::join(
        parcel::join(expect_character('@'), expect_character('{')),
        parcel::left(parcel::join(set_or(), expect_character('}'))),
    ))
}

fn set_or<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<ClassExpr>> {
    parcel::join(
        set_and(),
        parcel::zero_or_more(parcel::right(parcel::join(
            expect_character('|'),
            set_and(),
        ))),
    )
    .map(|(head, tail)| -> Parsed<ClassExpr> {
        let head = head?;
        let tail = tail.into_iter().collect::<Parsed<Vec<ClassExpr>>>()?;

        Ok(ClassExpr::union_of(head, tail))
    })
}

fn set_and<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<ClassExpr>> {
    parcel::join(
        set_sequence(),
        parcel::zero_or_more(parcel::right(parcel::join(
            expect_character('&'),
            set_sequence(),
        ))),
    )
    .map(|(head, tail)| -> Parsed<ClassExpr> {
        let head = head?;
        let tail = tail.into_iter().collect::<Parsed<Vec<ClassExpr>>>()?;

        Ok(ClassExpr::intersection_of(head, tail))
    })
}

fn set_sequence<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<ClassExpr>> {
    parcel::join(set_unary(), parcel::zero_or_more(set_unary())).map(
        |(head, tail)| -> Parsed<ClassExpr> {
            let head = head?;
            let tail = tail.into_iter().collect::<Parsed<Vec<ClassExpr>>>()?;

            Ok(ClassExpr::union_of(head, tail))
        },
    )
}

fn set_unary<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<ClassExpr>> {
    move |input: &'a [(usize, char)]| parcel::or(set_complement(), || set_atom()).parse(input)
}

fn set_complement<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<ClassExpr>> {
    parcel::right(parcel::join(expect_character('!'), set_unary()))
        .map(|class| class.map(ClassExpr::complement))
}

fn set_atom<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<ClassExpr>> {
    parcel::or(set_parenthesized(), || {
        parcel::or(bracket_class(), || {
            parcel::or(class_range(SET_RESERVED), || {
                parcel::or(escape().map(|escape| escape.map(ClassExpr::from)), || {
                    class_literal(SET_RESERVED).map(|c| Ok(ClassExpr::single(c)))
                })
            })
        })
    })
}

fn set_parenthesized<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<ClassExpr>> {
    move |input: &'a [(usize, char)]| {
        parcel::right(parcel::join(
            expect_character('('),
            parcel::left(parcel::join(set_or(), expect_character(')'))),
        ))
        .parse(input)
    }
}

fn class_range<'a>(
    reserved: &'static [char],
) -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<ClassExpr>> {
    parcel::join(
        class_code_point(reserved),
        parcel::right(parcel::join(
            expect_character('-'),
            class_code_point(reserved),
        )),
    )
    .map(|((lower_pos, lower_bound), (_, upper_bound))| {
        ClassExpr::range(lower_bound, upper_bound).ok_or(ParseError::new(
            lower_pos,
            ParseErrorKind::InvalidRange(lower_bound, upper_bound),
        ))
    })
}

/// A single code point usable as a range bound, either unescaped or as a
/// literal escape, paired with its position.
fn class_code_point<'a>(
    reserved: &'static [char],
) -> impl parcel::Parser<'a, &'a [(usize, char)], (usize, char)> {
    move |input: &'a [(usize, char)]| match input {
        [(pos, '\\'), (to_escape_pos, to_escape), ..] => match escaped_equivalent(*to_escape) {
            Some(Escape::Literal(c)) => Ok(MatchStatus::Match {
                span: *pos..*to_escape_pos + to_escape.len_utf8(),
                remainder: &input[2..],
                inner: (*pos, c),
            }),
            _ => Ok(MatchStatus::NoMatch(input)),
        },
        [(pos, c), ..] if !reserved.contains(c) => Ok(MatchStatus::Match {
            span: *pos..*pos + c.len_utf8(),
            remainder: &input[1..],
            inner: (*pos, *c),
        }),
        _ => Ok(MatchStatus::NoMatch(input)),
    }
}

fn class_literal<'a>(
    reserved: &'static [char],
) -> impl parcel::Parser<'a, &'a [(usize, char)], char> {
    any_code_point().predicate(move |c| !reserved.contains(c))
}

// Quantifiers

/// Represents all variants of regex quantifiers with an optionally lazy modifier.
fn quantifier<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<ast::Quantifier>> {
    parcel::join(quantifier_type(), parcel::optional(expect_character('?'))).map(
        |(quantifier_ty, lazy_modifier)| {
            quantifier_ty.map(|quantifier_ty| match lazy_modifier {
                Some(_) => ast::Quantifier::Lazy(quantifier_ty),
                None => ast::Quantifier::Eager(quantifier_ty),
            })
        },
    )
}

fn quantifier_type<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<ast::QuantifierType>>
{
    parcel::or(
        expect_character('*').map(|_| Ok(ast::QuantifierType::ZeroOrMore)),
        || {
            parcel::or(
                expect_character('+').map(|_| Ok(ast::QuantifierType::OneOrMore)),
                || {
                    parcel::or(
                        expect_character('?').map(|_| Ok(ast::QuantifierType::ZeroOrOne)),
                        || range_quantifier(),
                    )
                },
            )
        },
    )
}

/// `{n}`, `{n,}` and `{n,m}`, ignoring whitespace between the braces.
fn range_quantifier<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Parsed<ast::QuantifierType>>
{
    let lower_bound = parcel::right(parcel::join(
        whitespace(),
        parcel::left(parcel::join(integer(), whitespace())),
    ));
    let upper_bound = parcel::right(parcel::join(
        expect_character(','),
        parcel::right(parcel::join(
            whitespace(),
            parcel::optional(parcel::left(parcel::join(integer(), whitespace()))),
        )),
    ));

    parcel::join(
        located('{'),
        parcel::left(parcel::join(
            parcel::join(lower_bound, parcel::optional(upper_bound)),
            expect_character('}'),
        )),
    )
    .map(|(pos, bounds)| {
        let invalid = ParseError::new(pos, ParseErrorKind::InvalidRepetition);

        match bounds {
            // `{0}` and `{0,0}` can only ever match the empty string.
            (Some(0), None) | (Some(0), Some(Some(Some(0)))) => Err(invalid),
            (Some(count), None) => Ok(ast::QuantifierType::MatchExactRange(count)),
            (Some(lower_bound), Some(None)) => {
                Ok(ast::QuantifierType::MatchAtLeastRange(lower_bound))
            }
            (Some(lower_bound), Some(Some(Some(upper_bound)))) if lower_bound <= upper_bound => {
                Ok(ast::QuantifierType::MatchBetweenRange {
                    lower_bound,
                    upper_bound,
                })
            }
            _ => Err(invalid),
        }
    })
}

// Terminals

/// A decimal integer, `None` if it overflows a `u32`.
fn integer<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Option<u32>> {
    parcel::one_or_more(digit(10))
        .map(|digits| digits.into_iter().collect::<String>().parse::<u32>().ok())
}

fn whitespace<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], Vec<char>> {
    parcel::zero_or_more(any_code_point().predicate(|c| c.is_whitespace()))
}

/// Matches the expected character, returning its position.
fn located<'a>(expected: char) -> impl parcel::Parser<'a, &'a [(usize, char)], usize> {
    move |input: &'a [(usize, char)]| match input.first() {
        Some(&(pos, next)) if next == expected => Ok(MatchStatus::Match {
            span: pos..pos + next.len_utf8(),
            remainder: &input[1..],
            inner: pos,
        }),
        _ => Ok(MatchStatus::NoMatch(input)),
    }
}

fn any_code_point<'a>() -> impl parcel::Parser<'a, &'a [(usize, char)], char> {
    move |input: &'a [(usize, char)]| match input.first() {
        Some(&(pos, next)) => Ok(MatchStatus::Match {
            span: pos..pos + next.len_utf8(),
            remainder: &input[1..],
            inner: next,
        }),
        None => Ok(MatchStatus::NoMatch(input)),
    }
}

// Diagnostics
//
// The grammar above only describes well-formed patterns. When it stops short
// of the end of the input, the unparsed remainder is inspected to explain
// why.

fn diagnose(input: &[(usize, char)], end: usize) -> ParseError {
    let (pos, next) = match input.first() {
        Some(&(pos, next)) => (pos, next),
        None => return ParseError::new(end, ParseErrorKind::UnexpectedEnd),
    };
    let rest = &input[1..];

    let kind = match next {
        '*' | '+' | '?' => ParseErrorKind::NothingToRepeat,
        '{' => match range_quantifier().parse(input) {
            Ok(MatchStatus::Match { inner: Err(err), .. }) => return err,
            // a well-formed quantifier in a position that can't be repeated.
            Ok(MatchStatus::Match { .. }) => ParseErrorKind::NothingToRepeat,
            _ => ParseErrorKind::InvalidRepetition,
        },
        '|' => ParseErrorKind::EmptyAlternative,
        ')' => ParseErrorKind::UnbalancedParenthesis,
        '(' => return diagnose_group(pos, rest, end),
        '[' => return diagnose_bracket_class(pos, rest, end),
        '@' => match rest.first() {
            Some((_, '{')) => return diagnose_set_expression(&rest[1..], pos, end),
            _ => ParseErrorKind::UnexpectedCharacter('@'),
        },
        '\\' => match rest.first() {
            Some(&(_, to_escape)) => ParseErrorKind::UnknownEscape(to_escape),
            None => return ParseError::new(end, ParseErrorKind::UnexpectedEnd),
        },
        c => ParseErrorKind::UnexpectedCharacter(c),
    };

    ParseError::new(pos, kind)
}

fn diagnose_group(pos: usize, rest: &[(usize, char)], end: usize) -> ParseError {
    if let Some((_, ')')) = rest.first() {
        return ParseError::new(pos, ParseErrorKind::EmptyGroup);
    }

    match alternation().parse(rest) {
        Ok(MatchStatus::Match {
            inner: Err(err), ..
        }) => err,
        Ok(MatchStatus::Match { remainder, .. }) if remainder.is_empty() => {
            ParseError::new(pos, ParseErrorKind::UnbalancedParenthesis)
        }
        Ok(MatchStatus::Match { remainder, .. }) => diagnose(remainder, end),
        _ => diagnose(rest, end),
    }
}

fn diagnose_bracket_class(pos: usize, rest: &[(usize, char)], end: usize) -> ParseError {
    let rest = match rest.first() {
        Some((_, '^')) => &rest[1..],
        _ => rest,
    };

    match parcel::zero_or_more(bracket_item()).parse(rest) {
        Ok(MatchStatus::Match {
            remainder, inner, ..
        }) => {
            let is_empty = inner.is_empty();
            if let Some(Err(err)) = inner.into_iter().find(Result::is_err) {
                return err;
            }

            match remainder.first() {
                Some((_, ']')) if is_empty => ParseError::new(pos, ParseErrorKind::EmptyClass),
                Some((_, '[')) => diagnose(remainder, end),
                _ => ParseError::new(pos, ParseErrorKind::UnterminatedClass),
            }
        }
        _ => ParseError::new(pos, ParseErrorKind::UnterminatedClass),
    }
}

fn diagnose_set_expression(rest: &[(usize, char)], class_pos: usize, end: usize) -> ParseError {
    match set_or().parse(rest) {
        Ok(MatchStatus::Match {
            remainder, inner, ..
        }) => match (inner, remainder.first()) {
            (Err(err), _) => err,
            (Ok(_), None) => ParseError::new(class_pos, ParseErrorKind::UnterminatedClass),
            (Ok(_), Some(&(pos, ')'))) => {
                ParseError::new(pos, ParseErrorKind::UnbalancedParenthesis)
            }
            (Ok(_), Some((_, '|' | '&'))) => diagnose_set_operand(&remainder[1..], class_pos, end),
            (Ok(_), Some(_)) => diagnose_set_operand(remainder, class_pos, end),
        },
        _ => diagnose_set_operand(rest, class_pos, end),
    }
}

/// Explains why no class operand could be parsed at the head of `input`.
fn diagnose_set_operand(input: &[(usize, char)], class_pos: usize, end: usize) -> ParseError {
    let (pos, next) = match input.first() {
        Some(&(pos, next)) => (pos, next),
        None => return ParseError::new(class_pos, ParseErrorKind::UnterminatedClass),
    };

    match next {
        '|' | '&' | '}' | ')' => ParseError::new(pos, ParseErrorKind::EmptyClass),
        '!' => diagnose_set_operand(&input[1..], class_pos, end),
        '[' => diagnose(input, end),
        '(' => match set_or().parse(&input[1..]) {
            Ok(MatchStatus::Match {
                remainder,
                inner: Ok(_),
                ..
            }) if !matches!(remainder.first(), Some((_, '|' | '&' | '!' | '(' | '['))) => {
                ParseError::new(pos, ParseErrorKind::UnbalancedParenthesis)
            }
            _ => diagnose_set_expression(&input[1..], class_pos, end),
        },
        '\\' => ParseError::new(end, ParseErrorKind::UnexpectedEnd),
        c => ParseError::new(pos, ParseErrorKind::UnexpectedCharacter(c)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expression, Quantifier, QuantifierType};
    use pretty_assertions::assert_eq;

    fn boxed(node: Node) -> Box<Node> {
        Box::new(node)
    }

    #[test]
    fn should_parse_minimal_expression_with_no_errors() {
        let inputs = vec![
            // a basic input string
            "the red pill",
            // A recursive grouping
            "the ((red|blue) pill)",
            // save points around a quantified group
            "&abc&([def]|\\d)+&abc",
            // set algebra
            "@{[a-p]&[h-t]&!k|[+*?]}+",
            // multi-byte literals
            "\u{e9}t\u{e9}",
        ];

        for (test_id, input) in inputs.into_iter().enumerate() {
            let parse_result = parse(input);
            assert!(parse_result.is_ok(), "{}: {:?}", test_id, parse_result)
        }
    }

    #[test]
    fn should_parse_empty_pattern() {
        assert_eq!(Ok(Expression::new(Node::Cat(vec![]), 0)), parse(""));
    }

    #[test]
    fn should_parse_compound_match() {
        let input_output = vec![
            (
                "abc",
                Node::Cat(vec![Node::Char('a'), Node::Char('b'), Node::Char('c')]),
            ),
            (
                "a|bc",
                Node::Alt(vec![
                    Node::Char('a'),
                    Node::Cat(vec![Node::Char('b'), Node::Char('c')]),
                ]),
            ),
            (
                "^a.$",
                Node::Cat(vec![
                    Node::AnchorBegin,
                    Node::Char('a'),
                    Node::AnyChar,
                    Node::AnchorEnd,
                ]),
            ),
            (
                "a(b|c)",
                Node::Cat(vec![
                    Node::Char('a'),
                    Node::Alt(vec![Node::Char('b'), Node::Char('c')]),
                ]),
            ),
            (
                "\\.\\n\\-",
                Node::Cat(vec![Node::Char('.'), Node::Char('\n'), Node::Char('-')]),
            ),
            (
                " x ",
                Node::Cat(vec![Node::Char(' '), Node::Char('x'), Node::Char(' ')]),
            ),
        ];

        for (test_id, (input, expected)) in input_output.into_iter().enumerate() {
            assert_eq!(
                (test_id, Ok(Expression::new(expected, 0))),
                (test_id, parse(input))
            );
        }
    }

    #[test]
    fn should_parse_eager_and_lazy_repetition_quantifiers() {
        let input_output = vec![
            ("a*", Quantifier::Eager(QuantifierType::ZeroOrMore)),
            ("a+", Quantifier::Eager(QuantifierType::OneOrMore)),
            ("a?", Quantifier::Eager(QuantifierType::ZeroOrOne)),
            ("a*?", Quantifier::Lazy(QuantifierType::ZeroOrMore)),
            ("a+?", Quantifier::Lazy(QuantifierType::OneOrMore)),
            ("a??", Quantifier::Lazy(QuantifierType::ZeroOrOne)),
            ("a{2}", Quantifier::Eager(QuantifierType::MatchExactRange(2))),
            ("a{2,}", Quantifier::Eager(QuantifierType::MatchAtLeastRange(2))),
            (
                "a{2,4}",
                Quantifier::Eager(QuantifierType::MatchBetweenRange {
                    lower_bound: 2,
                    upper_bound: 4,
                }),
            ),
            (
                "a{ 2 , 4 }?",
                Quantifier::Lazy(QuantifierType::MatchBetweenRange {
                    lower_bound: 2,
                    upper_bound: 4,
                }),
            ),
            (
                "a{ 0 , }",
                Quantifier::Eager(QuantifierType::MatchAtLeastRange(0)),
            ),
            (
                "a{0,1}",
                Quantifier::Eager(QuantifierType::MatchBetweenRange {
                    lower_bound: 0,
                    upper_bound: 1,
                }),
            ),
        ];

        for (test_id, (input, quantifier)) in input_output.into_iter().enumerate() {
            let expected = Expression::new(quantifier.apply(Node::Char('a')), 0);
            assert_eq!((test_id, Ok(expected)), (test_id, parse(input)));
        }
    }

    #[test]
    fn should_parse_character_class_items() {
        let input_output = vec![
            ("\\d", ClassExpr::builtin(BuiltinClass::Digit)),
            ("\\W", ClassExpr::builtin(BuiltinClass::Word).complement()),
            ("\\u", ClassExpr::builtin(BuiltinClass::Upper)),
            ("[a]", ClassExpr::single('a')),
            ("[ab]", ClassExpr::single('a').union(ClassExpr::single('b'))),
            ("[a-z]", ClassExpr::Range('a', 'z')),
            ("[^a-c]", ClassExpr::Range('a', 'c').complement()),
            (
                "[a-]",
                ClassExpr::single('a').union(ClassExpr::single('-')),
            ),
            (
                "[\\d_]",
                ClassExpr::builtin(BuiltinClass::Digit).union(ClassExpr::single('_')),
            ),
            (
                "[\\--/]",
                ClassExpr::Range('-', '/'),
            ),
            (
                "[a[^b]]",
                ClassExpr::single('a').union(ClassExpr::single('b').complement()),
            ),
            (
                "[|&]",
                ClassExpr::single('|').union(ClassExpr::single('&')),
            ),
            (
                "@{[a-p]&[h-t]&!k|[+*?]}",
                ClassExpr::Range('a', 'p')
                    .intersect(ClassExpr::Range('h', 't'))
                    .intersect(ClassExpr::single('k').complement())
                    .union(
                        ClassExpr::single('+')
                            .union(ClassExpr::single('*'))
                            .union(ClassExpr::single('?')),
                    ),
            ),
            (
                "@{!(a|b)c}",
                ClassExpr::single('a')
                    .union(ClassExpr::single('b'))
                    .complement()
                    .union(ClassExpr::single('c')),
            ),
            (
                "@{\\w&!\\d}",
                ClassExpr::builtin(BuiltinClass::Word)
                    .intersect(ClassExpr::builtin(BuiltinClass::Digit).complement()),
            ),
        ];

        for (test_id, (input, class)) in input_output.into_iter().enumerate() {
            assert_eq!(
                (test_id, Ok(Expression::new(Node::Class(class), 0))),
                (test_id, parse(input))
            );
        }
    }

    #[test]
    fn should_pair_save_points_into_groups() {
        let digits_or_def = Node::Alt(vec![
            Node::Class(
                ClassExpr::single('d')
                    .union(ClassExpr::single('e'))
                    .union(ClassExpr::single('f')),
            ),
            Node::Class(ClassExpr::builtin(BuiltinClass::Digit)),
        ]);

        let input_output = vec![
            (
                "&b+&",
                Expression::new(
                    Node::Save {
                        group: 1,
                        node: boxed(Node::Plus {
                            node: boxed(Node::Char('b')),
                            greedy: true,
                        }),
                    },
                    1,
                ),
            ),
            (
                "&abc&([def]|\\d)+&abc",
                Expression::new(
                    Node::Cat(vec![
                        Node::Save {
                            group: 1,
                            node: boxed(Node::Cat(vec![
                                Node::Char('a'),
                                Node::Char('b'),
                                Node::Char('c'),
                            ])),
                        },
                        Node::Save {
                            group: 2,
                            node: boxed(Node::Plus {
                                node: boxed(digits_or_def),
                                greedy: true,
                            }),
                        },
                        Node::Char('a'),
                        Node::Char('b'),
                        Node::Char('c'),
                    ]),
                    2,
                ),
            ),
            (
                "&a&|x(&b&)",
                Expression::new(
                    Node::Alt(vec![
                        Node::Save {
                            group: 1,
                            node: boxed(Node::Char('a')),
                        },
                        Node::Cat(vec![
                            Node::Char('x'),
                            Node::Save {
                                group: 2,
                                node: boxed(Node::Char('b')),
                            },
                        ]),
                    ]),
                    2,
                ),
            ),
        ];

        for (test_id, (input, expected)) in input_output.into_iter().enumerate() {
            assert_eq!((test_id, Ok(expected)), (test_id, parse(input)));
        }
    }

    #[test]
    fn should_report_error_positions_and_reasons() {
        use ParseErrorKind::*;

        let input_output = vec![
            ("a|", 1, EmptyAlternative),
            ("|a", 0, EmptyAlternative),
            ("(a", 0, UnbalancedParenthesis),
            ("a)", 1, UnbalancedParenthesis),
            ("\u{e9})", 2, UnbalancedParenthesis),
            ("()", 0, EmptyGroup),
            ("[abc", 0, UnterminatedClass),
            ("[]", 0, EmptyClass),
            ("[^]", 0, EmptyClass),
            ("[z-a]", 1, InvalidRange('z', 'a')),
            ("@{a", 0, UnterminatedClass),
            ("@{}", 2, EmptyClass),
            ("@{a|}", 4, EmptyClass),
            ("*a", 0, NothingToRepeat),
            ("a**", 2, NothingToRepeat),
            ("^*", 1, NothingToRepeat),
            ("&a&*", 3, NothingToRepeat),
            ("{2}", 0, NothingToRepeat),
            ("a{0}", 1, InvalidRepetition),
            ("a{0,0}", 1, InvalidRepetition),
            ("a{3,2}", 1, InvalidRepetition),
            ("a{x}", 1, InvalidRepetition),
            ("a{2", 1, InvalidRepetition),
            ("\\q", 0, UnknownEscape('q')),
            ("[\\q]", 1, UnknownEscape('q')),
            ("a\\", 2, UnexpectedEnd),
            ("&a", 0, UnpairedSavePoint),
            ("&a|b&", 0, UnpairedSavePoint),
            ("&&", 1, EmptySaveGroup),
            ("]", 0, UnexpectedCharacter(']')),
            ("a}", 1, UnexpectedCharacter('}')),
            ("@x", 0, UnexpectedCharacter('@')),
        ];

        for (test_id, (input, position, kind)) in input_output.into_iter().enumerate() {
            assert_eq!(
                (test_id, input, Err(ParseError::new(position, kind))),
                (test_id, input, parse(input))
            );
        }
    }

    #[test]
    fn should_reject_patterns_nested_beyond_the_limit() {
        use ParseErrorKind::NestingTooDeep;

        let input_output = vec![
            ("((a))", Ok(())),
            ("(((a)))", Err(ParseError::new(2, NestingTooDeep(2)))),
            ("(a)(b)(c)(d)", Ok(())),
            ("[[[a]]]", Err(ParseError::new(2, NestingTooDeep(2)))),
            ("@{!a}", Ok(())),
            ("@{!!a}", Err(ParseError::new(3, NestingTooDeep(2)))),
            ("@{!a&!b&!c}", Ok(())),
            ("@{(!a)}", Err(ParseError::new(3, NestingTooDeep(2)))),
            ("(@{a})", Ok(())),
            ("\\(\\(\\(a", Ok(())),
            ("[(((]", Ok(())),
        ];

        for (test_id, (input, expected)) in input_output.into_iter().enumerate() {
            assert_eq!(
                (test_id, input, expected),
                (test_id, input, parse_with(input, 2).map(|_| ()))
            );
        }
    }

    #[test]
    fn should_reject_deeply_nested_patterns_without_recursing() {
        let groups = format!("{}a{}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(
            Err(ParseError::new(
                DEFAULT_NEST_LIMIT as usize,
                ParseErrorKind::NestingTooDeep(DEFAULT_NEST_LIMIT)
            )),
            parse(&groups)
        );

        let complements = format!("@{{{}a}}", "!".repeat(10_000));
        assert_eq!(
            Err(ParseError::new(
                DEFAULT_NEST_LIMIT as usize + 1,
                ParseErrorKind::NestingTooDeep(DEFAULT_NEST_LIMIT)
            )),
            parse(&complements)
        );

        let intersection = format!("@{{a{}}}", "&a".repeat(20_000));
        assert!(parse(&intersection).is_ok());
    }
}
