//! Maven version ranges and best-fit selection.
//!
//! Supports `[1.0,2.0)`, `(,1.0]`, `[1.5]`, comma-joined unions such as
//! `[1.0,1.2),(1.5,]`, and a bare version (pinned to exactly that version).

use std::fmt;

use mvnget_maven::metadata::MavenMetadata;
use mvnget_util::errors::MvnGetError;

use crate::version::MavenVersion;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    /// `[` or `]`
    Inclusive,
    /// `(` or `)`
    Exclusive,
    /// No bracket; behaves like inclusive.
    Unmarked,
}

/// One interval of a range. An empty bound is unbounded.
#[derive(Debug, Clone)]
pub struct Interval {
    pub lower_kind: BoundKind,
    pub upper_kind: BoundKind,
    pub low: MavenVersion,
    pub high: MavenVersion,
}

impl Interval {
    pub fn contains(&self, version: &MavenVersion) -> bool {
        let above_low = match self.lower_kind {
            BoundKind::Exclusive => version > &self.low,
            _ => version >= &self.low,
        };
        if !above_low {
            return false;
        }
        if self.high.is_empty() {
            return true;
        }
        match self.upper_kind {
            BoundKind::Exclusive => version < &self.high,
            _ => version <= &self.high,
        }
    }
}

/// Versions published for one `group:artifact`.
#[derive(Debug, Clone, Default)]
pub struct VersionListing {
    pub listed: Vec<MavenVersion>,
    pub released: Vec<MavenVersion>,
}

impl VersionListing {
    /// Unparsable entries are skipped.
    pub fn from_metadata(metadata: &MavenMetadata) -> Self {
        let parse_all = |raw: &[String]| -> Vec<MavenVersion> {
            raw.iter()
                .filter_map(|s| match MavenVersion::parse(s) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        tracing::debug!("Ignoring listed version {s}: {e}");
                        None
                    }
                })
                .collect()
        };
        Self {
            listed: parse_all(&metadata.versions),
            released: parse_all(&metadata.releases),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.listed.is_empty() && self.released.is_empty()
    }
}

/// A parsed range: one or more intervals, matched as a union.
#[derive(Debug, Clone)]
pub struct VersionRange {
    original: String,
    intervals: Vec<Interval>,
}

impl VersionRange {
    /// Parse a range expression. Empty input means "any version".
    pub fn parse(spec: &str) -> Result<Self, MvnGetError> {
        let spec = spec.trim();
        let mut intervals = split_clauses(spec)
            .into_iter()
            .map(parse_clause)
            .collect::<Result<Vec<_>, _>>()?;
        if intervals.is_empty() {
            intervals.push(Interval {
                lower_kind: BoundKind::Exclusive,
                upper_kind: BoundKind::Exclusive,
                low: MavenVersion::parse("0")?,
                high: MavenVersion::parse("99999")?,
            });
        }
        Ok(Self {
            original: spec.to_string(),
            intervals,
        })
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// `false` only for a single, closed, pinned interval.
    pub fn is_vague(&self) -> bool {
        let [only] = self.intervals.as_slice() else {
            return true;
        };
        only.lower_kind == BoundKind::Exclusive
            || only.upper_kind == BoundKind::Exclusive
            || only.low != only.high
    }

    pub fn contains(&self, version: &MavenVersion) -> bool {
        self.intervals.iter().any(|i| i.contains(version))
    }

    /// The latest listed or released version inside the range.
    pub fn best_fit<'a>(&self, listing: &'a VersionListing) -> Option<&'a MavenVersion> {
        tracing::debug!("  %> Finding best fit for `{}`", self.original);
        let mut best: Option<&MavenVersion> = None;
        for candidate in listing.listed.iter().chain(&listing.released) {
            if !self.contains(candidate) {
                tracing::trace!("  %%> {candidate} is outside the range");
                continue;
            }
            match best {
                Some(current) if current >= candidate => {
                    tracing::trace!("  %%> existing best ({current}) is better than {candidate}");
                }
                _ => {
                    tracing::trace!("  %%> new best {candidate}");
                    best = Some(candidate);
                }
            }
        }
        match best {
            Some(v) => tracing::debug!("  %> Found best fit {v} for {}", self.original),
            None => tracing::debug!("  %> No best fit for {}", self.original),
        }
        best
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

/// Split on the earliest `],` or `),` until none remain.
fn split_clauses(spec: &str) -> Vec<&str> {
    let mut clauses = Vec::new();
    let mut rest = spec;
    while let Some(cut) = [rest.find("],"), rest.find("),")]
        .into_iter()
        .flatten()
        .filter(|&p| p > 0)
        .min()
    {
        clauses.push(&rest[..=cut]);
        rest = &rest[cut + 2..];
    }
    if !rest.is_empty() {
        clauses.push(rest);
    }
    clauses
}

fn parse_clause(clause: &str) -> Result<Interval, MvnGetError> {
    let clause = clause.trim();
    let (lower_kind, rest) = if let Some(rest) = clause.strip_prefix('[') {
        (BoundKind::Inclusive, rest)
    } else if let Some(rest) = clause.strip_prefix('(') {
        (BoundKind::Exclusive, rest)
    } else {
        (BoundKind::Unmarked, clause)
    };
    let (upper_kind, body) = if let Some(body) = rest.strip_suffix(']') {
        (BoundKind::Inclusive, body)
    } else if let Some(body) = rest.strip_suffix(')') {
        (BoundKind::Exclusive, body)
    } else {
        (BoundKind::Unmarked, rest)
    };
    let (low, high) = body.split_once(',').unwrap_or((body, body));
    Ok(Interval {
        lower_kind,
        upper_kind,
        low: MavenVersion::parse(low)?,
        high: MavenVersion::parse(high)?,
    })
}
