// ─── Interval Version Ranges ───
// Maven-style ranges used by `mods.toml` (`[1.20,1.21)`, `(,1.16.5]`, `1.20.1`).
//
// Grammar, specs separated by commas and combined with OR:
//   spec     := version | open version? "," version? close | "[" version "]"
//   open     := "[" | "("
//   close    := "]" | ")"
//
// An interval must carry at least one bound: `(,)` and `[,]` are rejected.

use super::constraint::{Comparator, Constraint, Op, Range, Version};
use crate::core::error::{ResolveError, ResolveResult};

/// Parse an interval-form range into a canonical constraint.
pub fn parse_interval_range(input: &str) -> ResolveResult<Constraint> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ResolveError::EmptyConstraint);
    }

    let mut cursor = Cursor::new(trimmed, input);
    let mut ranges = Vec::new();
    loop {
        ranges.push(cursor.spec()?);
        cursor.skip_spaces();
        match cursor.peek() {
            None => break,
            Some(',') => {
                cursor.advance();
                cursor.skip_spaces();
                if cursor.peek().is_none() {
                    return Err(cursor.invalid());
                }
            }
            Some(_) => return Err(cursor.invalid()),
        }
    }
    Constraint::from_ranges(ranges, input)
}

/// Left-to-right reader over the remaining input.
struct Cursor<'a> {
    rest: &'a str,
    source: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(rest: &'a str, source: &'a str) -> Self {
        Self { rest, source }
    }

    fn invalid(&self) -> ResolveError {
        ResolveError::InvalidVersionRange(self.source.to_string())
    }

    fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek() {
            self.rest = &self.rest[c.len_utf8()..];
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn skip_spaces(&mut self) {
        self.rest = self.rest.trim_start_matches(' ');
    }

    /// Consume a run of digits and dots, if any, as a version.
    fn version(&mut self) -> ResolveResult<Option<Version>> {
        let len = self
            .rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(self.rest.len());
        if len == 0 {
            return Ok(None);
        }
        let (token, rest) = self.rest.split_at(len);
        self.rest = rest;
        Version::parse(token).map(Some).ok_or_else(|| self.invalid())
    }

    fn spec(&mut self) -> ResolveResult<Range> {
        match self.peek() {
            Some(open @ ('[' | '(')) => {
                self.advance();
                self.interval(open == '[')
            }
            Some(c) if c.is_ascii_digit() => match self.version()? {
                Some(v) => Ok(Range::exact(v)),
                None => Err(self.invalid()),
            },
            _ => Err(self.invalid()),
        }
    }

    fn interval(&mut self, lower_inclusive: bool) -> ResolveResult<Range> {
        self.skip_spaces();
        let lower = self.version()?;
        self.skip_spaces();
        let has_comma = self.eat(',');
        self.skip_spaces();
        let upper = if has_comma { self.version()? } else { None };
        self.skip_spaces();

        let upper_inclusive = match self.peek() {
            Some(']') => true,
            Some(')') => false,
            _ => return Err(self.invalid()),
        };
        self.advance();

        if !has_comma {
            // `[1.16.5]` pins a single version
            return match lower {
                Some(v) if lower_inclusive && upper_inclusive => Ok(Range::exact(v)),
                _ => Err(self.invalid()),
            };
        }

        let mut comparators = Vec::with_capacity(2);
        if let Some(v) = lower {
            let op = if lower_inclusive { Op::Gte } else { Op::Gt };
            comparators.push(Comparator::new(op, v));
        }
        if let Some(v) = upper {
            let op = if upper_inclusive { Op::Lte } else { Op::Lt };
            comparators.push(Comparator::new(op, v));
        }
        if comparators.is_empty() {
            return Err(self.invalid());
        }
        Ok(Range::new(comparators))
    }
}
