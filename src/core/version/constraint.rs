// ─── Canonical Constraint ───
// The comparator representation every range syntax is normalised into.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::core::error::{ResolveError, ResolveResult};

/// A numeric `major[.minor[.patch]]` version.
///
/// Ordering and equality use the zero-filled triple, so `1.0 == 1.0.0`;
/// `Display` keeps the specificity the version was written with.
#[derive(Debug, Clone, Copy)]
pub struct Version {
    parts: [u64; 3],
    precision: u8,
}

impl Version {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            parts: [major, minor, patch],
            precision: 3,
        }
    }

    /// Build from 1–3 leading components; missing ones are zero.
    pub(crate) fn from_components(components: &[u64]) -> Option<Self> {
        if components.is_empty() || components.len() > 3 {
            return None;
        }
        let mut parts = [0; 3];
        parts[..components.len()].copy_from_slice(components);
        Some(Self {
            parts,
            precision: components.len() as u8,
        })
    }

    /// Strict parse of `X`, `X.Y` or `X.Y.Z` (digits only).
    pub fn parse(s: &str) -> Option<Self> {
        let mut components = Vec::with_capacity(3);
        for part in s.split('.') {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            components.push(part.parse().ok()?);
        }
        Self::from_components(&components)
    }

    pub fn major(&self) -> u64 {
        self.parts[0]
    }

    pub fn minor(&self) -> u64 {
        self.parts[1]
    }

    pub fn patch(&self) -> u64 {
        self.parts[2]
    }

    /// Number of components the version was written with.
    pub fn precision(&self) -> u8 {
        self.precision
    }

    /// Increment the component at `index`, zeroing everything after it.
    /// The result is written with `index + 1` components.
    pub(crate) fn bump(&self, index: usize) -> Self {
        let mut parts = [0; 3];
        parts[..index].copy_from_slice(&self.parts[..index]);
        parts[index] = self.parts[index].saturating_add(1);
        Self {
            parts,
            precision: index as u8 + 1,
        }
    }

    /// Minecraft-style rendering: `X.Y`, plus `.Z` only when the patch is non-zero.
    pub fn to_release_string(&self) -> String {
        if self.patch() > 0 {
            format!("{}.{}.{}", self.major(), self.minor(), self.patch())
        } else {
            format!("{}.{}", self.major(), self.minor())
        }
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.parts == other.parts
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.parts.hash(state);
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.parts.cmp(&other.parts)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts[0])?;
        for part in &self.parts[1..self.precision as usize] {
            write!(f, ".{}", part)?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ResolveError::InvalidVersionRange(s.to_string()))
    }
}

/// Comparison operator of a single comparator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Eq,
    Gte,
    Gt,
    Lte,
    Lt,
}

impl Op {
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Gte => ">=",
            Op::Gt => ">",
            Op::Lte => "<=",
            Op::Lt => "<",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Comparator {
    pub op: Op,
    pub version: Version,
}

impl Comparator {
    pub fn new(op: Op, version: Version) -> Self {
        Self { op, version }
    }

    pub fn matches(&self, version: &Version) -> bool {
        let ordering = version.cmp(&self.version);
        match self.op {
            Op::Eq => ordering == Ordering::Equal,
            Op::Gte => ordering != Ordering::Less,
            Op::Gt => ordering == Ordering::Greater,
            Op::Lte => ordering != Ordering::Greater,
            Op::Lt => ordering == Ordering::Less,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op.as_str(), self.version)
    }
}

/// A conjunction of comparators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Range {
    comparators: Vec<Comparator>,
}

/// One side of an interval: the version and whether it is included.
type Bound = (Version, bool);

impl Range {
    pub fn new(comparators: Vec<Comparator>) -> Self {
        Self { comparators }
    }

    pub fn exact(version: Version) -> Self {
        Self::new(vec![Comparator::new(Op::Eq, version)])
    }

    /// The range every version satisfies.
    pub fn any() -> Self {
        Self::new(vec![Comparator::new(Op::Gte, Version::new(0, 0, 0))])
    }

    pub fn comparators(&self) -> &[Comparator] {
        &self.comparators
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.comparators.iter().all(|c| c.matches(version))
    }

    /// Whether at least one version can satisfy every comparator.
    pub fn is_satisfiable(&self) -> bool {
        if self.comparators.is_empty() {
            return false;
        }
        let mut lower: Option<Bound> = None;
        let mut upper: Option<Bound> = None;
        for c in &self.comparators {
            match c.op {
                Op::Eq => {
                    tighten_lower(&mut lower, (c.version, true));
                    tighten_upper(&mut upper, (c.version, true));
                }
                Op::Gte => tighten_lower(&mut lower, (c.version, true)),
                Op::Gt => tighten_lower(&mut lower, (c.version, false)),
                Op::Lte => tighten_upper(&mut upper, (c.version, true)),
                Op::Lt => tighten_upper(&mut upper, (c.version, false)),
            }
        }
        match (lower, upper) {
            (Some((lo, lo_incl)), Some((hi, hi_incl))) => match lo.cmp(&hi) {
                Ordering::Less => true,
                Ordering::Equal => lo_incl && hi_incl,
                Ordering::Greater => false,
            },
            // Nothing sorts below 0.0.0.
            (None, Some((hi, hi_incl))) => hi_incl || hi > Version::new(0, 0, 0),
            _ => true,
        }
    }
}

fn tighten_lower(current: &mut Option<Bound>, candidate: Bound) {
    *current = match *current {
        None => Some(candidate),
        Some(existing) => Some(match existing.0.cmp(&candidate.0) {
            Ordering::Less => candidate,
            Ordering::Greater => existing,
            Ordering::Equal => (existing.0, existing.1 && candidate.1),
        }),
    };
}

fn tighten_upper(current: &mut Option<Bound>, candidate: Bound) {
    *current = match *current {
        None => Some(candidate),
        Some(existing) => Some(match existing.0.cmp(&candidate.0) {
            Ordering::Greater => candidate,
            Ordering::Less => existing,
            Ordering::Equal => (existing.0, existing.1 && candidate.1),
        }),
    };
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.comparators.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", c)?;
        }
        Ok(())
    }
}

/// An ordered disjunction of [`Range`]s.
///
/// Only constructed through the parsers, which guarantee the constraint is
/// non-empty and every range can be satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Constraint {
    ranges: Vec<Range>,
}

impl Constraint {
    /// Validate and wrap parsed ranges. `source` is the raw input, for errors.
    pub(crate) fn from_ranges(ranges: Vec<Range>, source: &str) -> ResolveResult<Self> {
        if ranges.is_empty() {
            return Err(ResolveError::EmptyConstraint);
        }
        if !ranges.iter().all(Range::is_satisfiable) {
            return Err(ResolveError::InvalidVersionRange(source.to_string()));
        }
        Ok(Self { ranges })
    }

    pub fn ranges(&self) -> &[Range] {
        &self.ranges
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.ranges.iter().any(|r| r.matches(version))
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, r) in self.ranges.iter().enumerate() {
            if i > 0 {
                f.write_str(" || ")?;
            }
            write!(f, "{}", r)?;
        }
        Ok(())
    }
}

impl serde::Serialize for Constraint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
