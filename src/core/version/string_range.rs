// ─── String Version Ranges ───
// The range syntax used by `fabric.mod.json` and `quilt.mod.json`: either a
// single range string or a list of alternatives.

use serde::Deserialize;
use tracing::debug;

use super::constraint::{Comparator, Constraint, Op, Range, Version};
use crate::core::error::{ResolveError, ResolveResult};

/// Raw `depends` value as it appears in a JSON manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RangeSpec {
    Single(String),
    AnyOf(Vec<String>),
}

/// Parse either shape of [`RangeSpec`].
pub fn parse_range_spec(spec: &RangeSpec) -> ResolveResult<Constraint> {
    match spec {
        RangeSpec::Single(s) => parse_string_range(s),
        RangeSpec::AnyOf(items) => parse_string_list(items),
    }
}

/// Parse a list of alternatives; the result matches if any element matches.
pub fn parse_string_list<S: AsRef<str>>(items: &[S]) -> ResolveResult<Constraint> {
    if items.is_empty() {
        return Err(ResolveError::EmptyConstraint);
    }
    let mut ranges = Vec::new();
    for item in items {
        ranges.extend(parse_alternatives(item.as_ref())?);
    }
    let source = items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" || ");
    if ranges.is_empty() {
        return Err(invalid(&source));
    }
    Constraint::from_ranges(ranges, &source)
}

/// Parse a single range expression such as `">=1.20"` or `"1.19.x || 1.20"`.
pub fn parse_string_range(input: &str) -> ResolveResult<Constraint> {
    let ranges = parse_alternatives(input)?;
    if ranges.is_empty() {
        return Err(invalid(input));
    }
    Constraint::from_ranges(ranges, input)
}

/// The `||` alternatives of `input` that some release can satisfy.
fn parse_alternatives(input: &str) -> ResolveResult<Vec<Range>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ResolveError::EmptyConstraint);
    }

    let mut ranges = Vec::new();
    for alternative in trimmed.split("||") {
        let alternative = alternative.trim();
        if alternative.is_empty() {
            return Err(invalid(input));
        }
        match parse_conjunction(alternative, input)? {
            Some(range) => ranges.push(range),
            None => debug!("'{}' can only match a pre-release, dropped", alternative),
        }
    }
    Ok(ranges)
}

fn invalid(input: &str) -> ResolveError {
    ResolveError::InvalidVersionRange(input.to_string())
}

const OPERATORS: [&str; 8] = [">=", "<=", "~>", ">", "<", "=", "~", "^"];

/// `None` when the conjunction can only be met by a pre-release.
fn parse_conjunction(alternative: &str, input: &str) -> ResolveResult<Option<Range>> {
    let tokens: Vec<&str> = alternative
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
        .collect();

    let mut comparators = Vec::new();
    let mut pre_release_only = false;
    let mut i = 0;
    while i < tokens.len() {
        let mut token = tokens[i].to_string();
        // `>= 1.20` is written with the operator detached
        if OPERATORS.contains(&token.as_str()) {
            i += 1;
            let operand = tokens.get(i).ok_or_else(|| invalid(input))?;
            token.push_str(operand);
        }

        if tokens.get(i + 1) == Some(&"-") {
            let upper = tokens.get(i + 2).ok_or_else(|| invalid(input))?;
            comparators.extend(hyphen_range(&token, upper, input)?);
            i += 3;
            continue;
        }

        match desugar(&token, input)? {
            Some(desugared) => comparators.extend(desugared),
            None => pre_release_only = true,
        }
        i += 1;
    }

    if pre_release_only {
        return Ok(None);
    }
    if comparators.is_empty() {
        return Err(invalid(input));
    }
    Ok(Some(Range::new(comparators)))
}

/// A version that may end in wildcard components (`1.20.x`, `*`).
struct Partial {
    known: Vec<u64>,
    wildcard: bool,
    /// Had a `-pre` suffix: sorts below its release, above earlier ones.
    pre_release: bool,
}

impl Partial {
    fn parse(s: &str, input: &str) -> ResolveResult<Self> {
        // Build metadata never affects precedence.
        let s = s.split('+').next().unwrap_or_default();
        let (s, pre_release) = match s.split_once('-') {
            Some((release, "")) => (release, false),
            Some((release, _)) => (release, true),
            None => (s, false),
        };
        if s.is_empty() {
            return Err(invalid(input));
        }

        let mut known = Vec::new();
        let mut wildcard = false;
        for (index, part) in s.split('.').enumerate() {
            if index >= 3 {
                return Err(invalid(input));
            }
            if matches!(part, "x" | "X" | "*") {
                wildcard = true;
                continue;
            }
            if wildcard || part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid(input));
            }
            known.push(part.parse().map_err(|_| invalid(input))?);
        }
        if wildcard && pre_release {
            return Err(invalid(input));
        }
        Ok(Self {
            known,
            wildcard,
            pre_release,
        })
    }

    fn base(&self) -> Option<Version> {
        Version::from_components(&self.known)
    }
}

fn split_operator(token: &str) -> (Option<&'static str>, &str) {
    for op in OPERATORS {
        if let Some(rest) = token.strip_prefix(op) {
            return (Some(op), rest);
        }
    }
    (None, token)
}

/// `None` when no release can satisfy the comparator.
fn desugar(token: &str, input: &str) -> ResolveResult<Option<Vec<Comparator>>> {
    let (op, rest) = split_operator(token);
    let partial = Partial::parse(rest, input)?;

    let Some(base) = partial.base() else {
        // A bare `*` matches everything; `>*` and `<*` match nothing.
        return match op {
            None | Some("=") | Some(">=") | Some("<=") | Some("~") | Some("~>") | Some("^") => {
                Ok(Some(vec![Comparator::new(Op::Gte, Version::new(0, 0, 0))]))
            }
            _ => Err(invalid(input)),
        };
    };
    let last = partial.known.len() - 1;

    if partial.pre_release {
        match op {
            None | Some("=") => return Ok(None),
            Some(">" | ">=") => return Ok(Some(vec![Comparator::new(Op::Gte, base)])),
            Some("<" | "<=") => return Ok(Some(vec![Comparator::new(Op::Lt, base)])),
            _ => {}
        }
    }

    let comparators = match (op, partial.wildcard) {
        (None | Some("="), true) => vec![
            Comparator::new(Op::Gte, base),
            Comparator::new(Op::Lt, base.bump(last)),
        ],
        (None | Some("="), false) => vec![Comparator::new(Op::Eq, base)],
        (Some(">="), _) => vec![Comparator::new(Op::Gte, base)],
        (Some(">"), true) => vec![Comparator::new(Op::Gte, base.bump(last))],
        (Some(">"), false) => vec![Comparator::new(Op::Gt, base)],
        (Some("<="), true) => vec![Comparator::new(Op::Lt, base.bump(last))],
        (Some("<="), false) => vec![Comparator::new(Op::Lte, base)],
        (Some("<"), _) => vec![Comparator::new(Op::Lt, base)],
        (Some("~" | "~>"), _) => {
            let index = if partial.known.len() == 1 { 0 } else { 1 };
            vec![
                Comparator::new(Op::Gte, base),
                Comparator::new(Op::Lt, base.bump(index)),
            ]
        }
        (Some("^"), _) => {
            let index = partial
                .known
                .iter()
                .position(|&n| n != 0)
                .unwrap_or(last);
            vec![
                Comparator::new(Op::Gte, base),
                Comparator::new(Op::Lt, base.bump(index)),
            ]
        }
        (Some(_), _) => return Err(invalid(input)),
    };
    Ok(Some(comparators))
}

fn hyphen_range(lower: &str, upper: &str, input: &str) -> ResolveResult<Vec<Comparator>> {
    let lower = Partial::parse(lower, input)?;
    let upper = Partial::parse(upper, input)?;
    let (Some(lo), Some(hi)) = (lower.base(), upper.base()) else {
        return Err(invalid(input));
    };
    let upper_comparator = if upper.pre_release {
        Comparator::new(Op::Lt, hi)
    } else if upper.wildcard {
        Comparator::new(Op::Lt, hi.bump(upper.known.len() - 1))
    } else {
        Comparator::new(Op::Lte, hi)
    };
    Ok(vec![Comparator::new(Op::Gte, lo), upper_comparator])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    fn spec(json: &str) -> Constraint {
        let spec: RangeSpec = serde_json::from_str(json).unwrap();
        parse_range_spec(&spec).unwrap()
    }

    #[test]
    fn json_shapes() {
        let cases = [
            (r#"["1.0"]"#, "=1.0"),
            (r#"">=1.0.0""#, ">=1.0.0"),
            (r#"["1.0.0","1.0.1","1.0.2"]"#, "=1.0.0 || =1.0.1 || =1.0.2"),
        ];
        for (json, expected) in cases {
            assert_eq!(spec(json).to_string(), expected, "{json}");
        }
    }

    #[test]
    fn operators_and_sugar() {
        let cases = [
            (">=1.20", ">=1.20"),
            (">= 1.20", ">=1.20"),
            (">=1.19 <1.21", ">=1.19 <1.21"),
            (">=1.19, <1.21", ">=1.19 <1.21"),
            ("~1.20.1", ">=1.20.1 <1.21"),
            ("~>1.20.1", ">=1.20.1 <1.21"),
            ("~1", ">=1 <2"),
            ("^1.2.3", ">=1.2.3 <2"),
            ("^0.2.3", ">=0.2.3 <0.3"),
            ("^0.0.3", ">=0.0.3 <0.0.4"),
            ("1.20.x", ">=1.20 <1.21"),
            ("1.x", ">=1 <2"),
            ("*", ">=0.0.0"),
            ("<=1.20.x", "<1.21"),
            (">1.20.x", ">=1.21"),
            ("1.18 - 1.19.2", ">=1.18 <=1.19.2"),
            (">=1.20-", ">=1.20"),
            ("1.0+build.5", "=1.0"),
            ("1.16.5 || 1.17.x", "=1.16.5 || >=1.17 <1.18"),
        ];
        for (input, expected) in cases {
            assert_eq!(
                parse_string_range(input).unwrap().to_string(),
                expected,
                "{input}"
            );
        }
    }

    #[test]
    fn empty_inputs() {
        assert!(matches!(
            parse_string_range(""),
            Err(ResolveError::EmptyConstraint)
        ));
        assert!(matches!(
            parse_string_range("   "),
            Err(ResolveError::EmptyConstraint)
        ));
        assert!(matches!(
            parse_string_list::<&str>(&[]),
            Err(ResolveError::EmptyConstraint)
        ));
        assert!(matches!(
            parse_string_list(&["1.20", ""]),
            Err(ResolveError::EmptyConstraint)
        ));
    }

    #[test]
    fn malformed_inputs() {
        for bad in [
            "abc",
            ">=",
            "1.20 ||",
            "|| 1.20",
            "1.2.3.4",
            "!=1.20",
            ">=1.21 <1.20",
            "1.x.3",
            ">*",
            "1.18 -",
        ] {
            assert!(
                matches!(
                    parse_string_range(bad),
                    Err(ResolveError::InvalidVersionRange(_))
                ),
                "{bad} accepted"
            );
        }
    }

    #[test]
    fn single_version_equals_singleton_list() {
        let releases = ["1.19.4", "1.20", "1.20.0", "1.20.1", "1.21"].map(v);
        for input in ["1.20", "1.20.1", "1"] {
            let single = parse_string_range(input).unwrap();
            let list = parse_string_list(&[input]).unwrap();
            for release in &releases {
                assert_eq!(single.matches(release), list.matches(release), "{input} vs {release}");
            }
        }
    }

    #[test]
    fn lower_bound_excludes_older_releases() {
        let c = parse_string_range(">=1.20").unwrap();
        assert!(c.matches(&v("1.20")));
        assert!(c.matches(&v("1.20.1")));
        assert!(!c.matches(&v("1.19.4")));
    }

    #[test]
    fn pre_release_bounds_against_releases() {
        let cases: [(&str, &[&str], &[&str]); 7] = [
            ("1.21-rc.1 || 1.20.1", &["1.20.1"], &["1.21", "1.20"]),
            (">1.20.5-rc.1", &["1.20.5", "1.21"], &["1.20.4"]),
            (">=1.21-rc.1", &["1.21", "1.21.1"], &["1.20.6"]),
            ("<=1.21-rc.1", &["1.20.6"], &["1.21"]),
            ("<1.21-rc.1", &["1.20.6"], &["1.21"]),
            ("1.20-pre.1 - 1.21-pre.2", &["1.20", "1.20.6"], &["1.19.4", "1.21"]),
            ("~1.20.1-rc.1", &["1.20.1", "1.20.4"], &["1.20", "1.21"]),
        ];
        for (input, accepted, rejected) in cases {
            let c = parse_string_range(input).unwrap();
            for release in accepted {
                assert!(c.matches(&v(release)), "{input} should accept {release}");
            }
            for release in rejected {
                assert!(!c.matches(&v(release)), "{input} should reject {release}");
            }
        }
    }

    #[test]
    fn exact_pre_release_matches_no_release() {
        assert!(matches!(
            parse_string_range("1.21-rc.1"),
            Err(ResolveError::InvalidVersionRange(_))
        ));
        assert!(matches!(
            parse_string_list(&["1.21-rc.1", "=1.21-pre.2"]),
            Err(ResolveError::InvalidVersionRange(_))
        ));
        let c = parse_string_list(&["1.21-rc.1", "1.21"]).unwrap();
        assert!(c.matches(&v("1.21")));
        assert_eq!(c.to_string(), "=1.21");
    }
}
