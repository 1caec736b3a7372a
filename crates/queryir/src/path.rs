//! Property path algebra over predicate IRIs.

use crate::prefix::PrefixMap;
use serde::{Deserialize, Serialize};

/// A regex-like path expression connecting a subject to an object.
///
/// `range` bounds satisfy `min <= max` by caller contract and `negation`
/// holds at least one IRI; neither is validated here.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum PropertyPath {
    Iri {
        iri: String,
    },
    Sequence {
        lhs: Box<PropertyPath>,
        rhs: Box<PropertyPath>,
    },
    Alternative {
        lhs: Box<PropertyPath>,
        rhs: Box<PropertyPath>,
    },
    Inverse {
        path: Box<PropertyPath>,
    },
    ZeroOrMore {
        path: Box<PropertyPath>,
    },
    OneOrMore {
        path: Box<PropertyPath>,
    },
    ZeroOrOne {
        path: Box<PropertyPath>,
    },
    Negation {
        iris: Vec<String>,
    },
    Range {
        path: Box<PropertyPath>,
        min: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<u32>,
    },
}

impl PropertyPath {
    pub fn iri(iri: impl Into<String>) -> Self {
        Self::Iri { iri: iri.into() }
    }

    pub fn sequence(lhs: PropertyPath, rhs: PropertyPath) -> Self {
        Self::Sequence {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn alternative(lhs: PropertyPath, rhs: PropertyPath) -> Self {
        Self::Alternative {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn inverse(path: PropertyPath) -> Self {
        Self::Inverse {
            path: Box::new(path),
        }
    }

    pub fn zero_or_more(path: PropertyPath) -> Self {
        Self::ZeroOrMore {
            path: Box::new(path),
        }
    }

    pub fn one_or_more(path: PropertyPath) -> Self {
        Self::OneOrMore {
            path: Box::new(path),
        }
    }

    pub fn zero_or_one(path: PropertyPath) -> Self {
        Self::ZeroOrOne {
            path: Box::new(path),
        }
    }

    pub fn negation<I, S>(iris: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Negation {
            iris: iris.into_iter().map(Into::into).collect(),
        }
    }

    pub fn range(path: PropertyPath, min: u32, max: Option<u32>) -> Self {
        Self::Range {
            path: Box::new(path),
            min,
            max,
        }
    }

    /// Paths that render without parentheses as operands
    fn is_atomic(&self) -> bool {
        matches!(
            self,
            Self::Iri { .. } | Self::Inverse { .. } | Self::Negation { .. }
        )
    }

    /// The path matching the same pairs with subject and object swapped.
    pub fn reversed(&self) -> Self {
        match self {
            Self::Iri { .. } | Self::Negation { .. } => Self::inverse(self.clone()),
            Self::Inverse { .. } => {
                // ^^…^x: flip parity on leaves, reverse compound cores in place
                let (depth, core) = self.inverse_chain();
                match core {
                    Self::Iri { .. } | Self::Negation { .. } => {
                        wrap_inverse(core.clone(), depth ^ 1)
                    }
                    compound => wrap_inverse(compound.reversed(), depth),
                }
            }
            Self::Sequence { lhs, rhs } => Self::sequence(rhs.reversed(), lhs.reversed()),
            Self::Alternative { lhs, rhs } => Self::alternative(lhs.reversed(), rhs.reversed()),
            Self::ZeroOrMore { path } => Self::zero_or_more(path.reversed()),
            Self::OneOrMore { path } => Self::one_or_more(path.reversed()),
            Self::ZeroOrOne { path } => Self::zero_or_one(path.reversed()),
            Self::Range { path, min, max } => Self::range(path.reversed(), *min, *max),
        }
    }

    /// Number of directly nested inverses and the path beneath them
    fn inverse_chain(&self) -> (u32, &PropertyPath) {
        let mut depth = 0;
        let mut current = self;
        while let Self::Inverse { path } = current {
            depth += 1;
            current = path;
        }
        (depth, current)
    }

    /// Apply the repetition collapse rules bottom-up. Idempotent.
    pub fn simplified(&self) -> Self {
        match self {
            Self::Iri { .. } | Self::Negation { .. } => self.clone(),
            Self::Sequence { lhs, rhs } => Self::sequence(lhs.simplified(), rhs.simplified()),
            Self::Alternative { lhs, rhs } => {
                let (lhs, rhs) = (lhs.simplified(), rhs.simplified());
                if lhs == rhs {
                    lhs
                } else {
                    Self::alternative(lhs, rhs)
                }
            }
            Self::Inverse { path } => Self::inverse(path.simplified()),
            Self::ZeroOrMore { path } => star(path.simplified()),
            Self::OneOrMore { path } => plus(path.simplified()),
            Self::ZeroOrOne { path } => optional(path.simplified()),
            Self::Range { path, min, max } => {
                let inner = path.simplified();
                match (*min, *max) {
                    (1, Some(1)) => inner,
                    (0, Some(1)) => optional(inner),
                    (1, None) => plus(inner),
                    (0, None) => star(inner),
                    (min, max) => Self::range(inner, min, max),
                }
            }
        }
    }

    /// Shortest number of edges a match can traverse
    pub fn min_length(&self) -> u32 {
        match self {
            Self::Iri { .. } | Self::Negation { .. } => 1,
            Self::Sequence { lhs, rhs } => lhs.min_length().saturating_add(rhs.min_length()),
            Self::Alternative { lhs, rhs } => lhs.min_length().min(rhs.min_length()),
            Self::Inverse { path } | Self::OneOrMore { path } => path.min_length(),
            Self::ZeroOrMore { .. } | Self::ZeroOrOne { .. } => 0,
            Self::Range { path, min, .. } => path.min_length().saturating_mul(*min),
        }
    }

    /// Longest number of edges a match can traverse; `None` is unbounded
    pub fn max_length(&self) -> Option<u32> {
        match self {
            Self::Iri { .. } | Self::Negation { .. } => Some(1),
            Self::Sequence { lhs, rhs } => Some(lhs.max_length()?.saturating_add(rhs.max_length()?)),
            Self::Alternative { lhs, rhs } => Some(lhs.max_length()?.max(rhs.max_length()?)),
            Self::Inverse { path } | Self::ZeroOrOne { path } => path.max_length(),
            Self::ZeroOrMore { .. } | Self::OneOrMore { .. } => None,
            Self::Range { path, max, .. } => Some(path.max_length()?.saturating_mul((*max)?)),
        }
    }

    pub fn has_repetition(&self) -> bool {
        match self {
            Self::Iri { .. } | Self::Negation { .. } => false,
            Self::ZeroOrMore { .. } | Self::OneOrMore { .. } | Self::Range { .. } => true,
            Self::Sequence { lhs, rhs } | Self::Alternative { lhs, rhs } => {
                lhs.has_repetition() || rhs.has_repetition()
            }
            Self::Inverse { path } | Self::ZeroOrOne { path } => path.has_repetition(),
        }
    }

    pub fn can_match_empty(&self) -> bool {
        self.min_length() == 0
    }

    /// Relative evaluation cost hint for planners.
    pub fn complexity(&self) -> f64 {
        match self {
            Self::Iri { .. } | Self::Negation { .. } => 1.0,
            Self::Sequence { lhs, rhs } | Self::Alternative { lhs, rhs } => {
                lhs.complexity() + rhs.complexity()
            }
            Self::Inverse { path } => path.complexity(),
            Self::ZeroOrMore { path } | Self::OneOrMore { path } => path.complexity() * 10.0,
            Self::ZeroOrOne { path } => path.complexity() * 2.0,
            Self::Range { path, max, .. } => match max {
                Some(max) => path.complexity() * f64::from((*max).max(1)),
                None => path.complexity() * 10.0,
            },
        }
    }

    /// All IRIs mentioned by the path, in order of appearance
    pub fn iris(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_iris(&mut out);
        out
    }

    fn collect_iris<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Iri { iri } => out.push(iri),
            Self::Negation { iris } => out.extend(iris.iter().map(String::as_str)),
            Self::Sequence { lhs, rhs } | Self::Alternative { lhs, rhs } => {
                lhs.collect_iris(out);
                rhs.collect_iris(out);
            }
            Self::Inverse { path }
            | Self::ZeroOrMore { path }
            | Self::OneOrMore { path }
            | Self::ZeroOrOne { path }
            | Self::Range { path, .. } => path.collect_iris(out),
        }
    }

    pub fn to_sparql(&self, prefixes: &PrefixMap) -> String {
        match self {
            Self::Iri { iri } => prefixes.render_iri(iri),
            Self::Sequence { lhs, rhs } => format!(
                "{}/{}",
                lhs.operand_sparql(prefixes),
                rhs.operand_sparql(prefixes)
            ),
            Self::Alternative { lhs, rhs } => format!(
                "{}|{}",
                lhs.operand_sparql(prefixes),
                rhs.operand_sparql(prefixes)
            ),
            Self::Inverse { path } => format!("^{}", path.operand_sparql(prefixes)),
            Self::ZeroOrMore { path } => format!("{}*", path.operand_sparql(prefixes)),
            Self::OneOrMore { path } => format!("{}+", path.operand_sparql(prefixes)),
            Self::ZeroOrOne { path } => format!("{}?", path.operand_sparql(prefixes)),
            Self::Negation { iris } => {
                let rendered: Vec<String> = iris.iter().map(|i| prefixes.render_iri(i)).collect();
                if rendered.len() == 1 {
                    format!("!{}", rendered[0])
                } else {
                    format!("!({})", rendered.join("|"))
                }
            }
            Self::Range { path, min, max } => {
                let operand = path.operand_sparql(prefixes);
                match max {
                    Some(max) if max == min => format!("{}{{{}}}", operand, min),
                    Some(max) => format!("{}{{{},{}}}", operand, min, max),
                    None => format!("{}{{{},}}", operand, min),
                }
            }
        }
    }

    fn operand_sparql(&self, prefixes: &PrefixMap) -> String {
        if self.is_atomic() {
            self.to_sparql(prefixes)
        } else {
            format!("({})", self.to_sparql(prefixes))
        }
    }
}

fn wrap_inverse(path: PropertyPath, depth: u32) -> PropertyPath {
    (0..depth).fold(path, |inner, _| PropertyPath::inverse(inner))
}

fn star(inner: PropertyPath) -> PropertyPath {
    match inner {
        PropertyPath::ZeroOrMore { path } | PropertyPath::OneOrMore { path } => {
            PropertyPath::ZeroOrMore { path }
        }
        other => PropertyPath::zero_or_more(other),
    }
}

fn plus(inner: PropertyPath) -> PropertyPath {
    match inner {
        repeated @ (PropertyPath::OneOrMore { .. } | PropertyPath::ZeroOrMore { .. }) => repeated,
        other => PropertyPath::one_or_more(other),
    }
}

fn optional(inner: PropertyPath) -> PropertyPath {
    match inner {
        opt @ PropertyPath::ZeroOrOne { .. } => opt,
        other => PropertyPath::zero_or_one(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn p(name: &str) -> PropertyPath {
        PropertyPath::iri(format!("http://ex/{}", name))
    }

    fn render(path: &PropertyPath) -> String {
        path.to_sparql(&PrefixMap::new().with("ex", "http://ex/"))
    }

    // ============================================================================
    // Simplification
    // ============================================================================

    #[test_case(PropertyPath::zero_or_more(PropertyPath::zero_or_more(p("a"))), PropertyPath::zero_or_more(p("a")) ; "star star")]
    #[test_case(PropertyPath::zero_or_more(PropertyPath::one_or_more(p("a"))), PropertyPath::zero_or_more(p("a")) ; "plus star")]
    #[test_case(PropertyPath::one_or_more(PropertyPath::one_or_more(p("a"))), PropertyPath::one_or_more(p("a")) ; "plus plus")]
    #[test_case(PropertyPath::one_or_more(PropertyPath::zero_or_more(p("a"))), PropertyPath::zero_or_more(p("a")) ; "star plus")]
    #[test_case(PropertyPath::zero_or_one(PropertyPath::zero_or_one(p("a"))), PropertyPath::zero_or_one(p("a")) ; "opt opt")]
    #[test_case(PropertyPath::range(p("a"), 1, Some(1)), p("a") ; "range one")]
    #[test_case(PropertyPath::range(p("a"), 0, Some(1)), PropertyPath::zero_or_one(p("a")) ; "range optional")]
    #[test_case(PropertyPath::range(p("a"), 1, None), PropertyPath::one_or_more(p("a")) ; "range plus")]
    #[test_case(PropertyPath::range(p("a"), 0, None), PropertyPath::zero_or_more(p("a")) ; "range star")]
    #[test_case(PropertyPath::range(p("a"), 2, Some(4)), PropertyPath::range(p("a"), 2, Some(4)) ; "range kept")]
    fn test_simplify_rules(input: PropertyPath, expected: PropertyPath) {
        assert_eq!(input.simplified(), expected);
    }

    #[test]
    fn test_simplify_is_bottom_up() {
        // range(a**, 0, nil) -> (a*)* -> a*
        let path = PropertyPath::range(
            PropertyPath::zero_or_more(PropertyPath::zero_or_more(p("a"))),
            0,
            None,
        );
        assert_eq!(path.simplified(), PropertyPath::zero_or_more(p("a")));
    }

    #[test]
    fn test_simplify_collapses_equal_alternatives() {
        let path = PropertyPath::alternative(
            PropertyPath::range(p("a"), 1, Some(1)),
            p("a"),
        );
        assert_eq!(path.simplified(), p("a"));
    }

    // ============================================================================
    // Reversal
    // ============================================================================

    #[test]
    fn test_reverse_sequence_swaps() {
        let path = PropertyPath::sequence(p("a"), p("b"));
        assert_eq!(
            path.reversed(),
            PropertyPath::sequence(PropertyPath::inverse(p("b")), PropertyPath::inverse(p("a")))
        );
        assert_eq!(path.reversed().reversed(), path);
    }

    #[test]
    fn test_double_inverse_cancels() {
        assert_eq!(PropertyPath::inverse(p("a")).reversed(), p("a"));
    }

    #[test]
    fn test_reverse_nested_inverse_chain() {
        let twice = PropertyPath::inverse(PropertyPath::inverse(p("a")));
        let reversed = twice.reversed();
        assert_eq!(render(&reversed), "^^^ex:a");
        assert_eq!(reversed.reversed(), twice);
    }

    #[test]
    fn test_reverse_inverse_of_compound() {
        let path = PropertyPath::inverse(PropertyPath::sequence(p("a"), p("b")));
        let reversed = path.reversed();
        assert_eq!(render(&reversed), "^(^ex:b/^ex:a)");
        assert_eq!(reversed.reversed(), path);
    }

    // ============================================================================
    // Analysis
    // ============================================================================

    #[test]
    fn test_lengths() {
        let path = PropertyPath::sequence(p("a"), PropertyPath::zero_or_one(p("b")));
        assert_eq!(path.min_length(), 1);
        assert_eq!(path.max_length(), Some(2));
        assert!(!path.has_repetition());
        assert!(!path.can_match_empty());

        let star = PropertyPath::zero_or_more(p("a"));
        assert_eq!(star.min_length(), 0);
        assert_eq!(star.max_length(), None);
        assert!(star.has_repetition());
        assert!(star.can_match_empty());

        let range = PropertyPath::range(PropertyPath::sequence(p("a"), p("b")), 2, Some(3));
        assert_eq!(range.min_length(), 4);
        assert_eq!(range.max_length(), Some(6));
    }

    #[test]
    fn test_complexity_weights() {
        assert_eq!(p("a").complexity(), 1.0);
        assert_eq!(PropertyPath::zero_or_more(p("a")).complexity(), 10.0);
        assert_eq!(PropertyPath::zero_or_one(p("a")).complexity(), 2.0);
        assert_eq!(PropertyPath::range(p("a"), 1, Some(4)).complexity(), 4.0);
        assert_eq!(
            PropertyPath::sequence(p("a"), PropertyPath::one_or_more(p("b"))).complexity(),
            11.0
        );
    }

    // ============================================================================
    // Rendering
    // ============================================================================

    #[test_case(PropertyPath::sequence(p("a"), p("b")), "ex:a/ex:b" ; "sequence")]
    #[test_case(PropertyPath::sequence(PropertyPath::alternative(p("a"), p("b")), p("c")), "(ex:a|ex:b)/ex:c" ; "nested alternative")]
    #[test_case(PropertyPath::one_or_more(PropertyPath::inverse(p("a"))), "^ex:a+" ; "inverse is atomic")]
    #[test_case(PropertyPath::zero_or_more(PropertyPath::sequence(p("a"), p("b"))), "(ex:a/ex:b)*" ; "star of sequence")]
    #[test_case(PropertyPath::negation(["http://ex/a"]), "!ex:a" ; "single negation")]
    #[test_case(PropertyPath::negation(["http://ex/a", "http://other/b"]), "!(ex:a|<http://other/b>)" ; "negated set")]
    #[test_case(PropertyPath::range(p("a"), 2, Some(5)), "ex:a{2,5}" ; "bounded range")]
    #[test_case(PropertyPath::range(p("a"), 2, None), "ex:a{2,}" ; "open range")]
    #[test_case(PropertyPath::range(p("a"), 3, Some(3)), "ex:a{3}" ; "exact range")]
    fn test_render(path: PropertyPath, expected: &str) {
        assert_eq!(render(&path), expected);
    }

    #[test]
    fn test_iris_in_order() {
        let path = PropertyPath::alternative(
            PropertyPath::inverse(p("a")),
            PropertyPath::negation(["http://ex/b", "http://ex/c"]),
        );
        assert_eq!(path.iris(), vec!["http://ex/a", "http://ex/b", "http://ex/c"]);
    }
}
