//! Maven version parsing and ordering.
//!
//! A version string is split into tokens, each either numeric or a
//! qualifier, and each carrying the separator (`.` or `-`) that introduced
//! it. Ordering rules, applied position by position:
//! - A numeric token is newer than a qualifier.
//! - With different separators: `.number` > `-number` > `-qualifier` > `.qualifier`.
//! - Numbers compare by value, with no width limit.
//! - Qualifiers: `alpha` < `beta` < `milestone` < `rc` (= `cr`) < `snapshot`.
//!   Unknown qualifiers sort below all of these, and by text among themselves.
//! - `final` and `ga` are dropped while parsing.
//! - When one version is a prefix of the other, the longer one is newer
//!   unless its next token is a pre-release qualifier.

use std::cmp::Ordering;
use std::fmt;

use mvnget_util::errors::MvnGetError;

const QUALIFIER_ORDER: [&str; 5] = ["alpha", "beta", "milestone", "rc", "snapshot"];

/// Qualifiers that make a longer version older than its prefix.
const PRERELEASE_QUALIFIERS: [&str; 6] = ["alpha", "beta", "milestone", "cr", "rc", "snapshot"];

/// Qualifiers equivalent to no qualifier at all.
const DROPPED_QUALIFIERS: [&str; 2] = ["final", "ga"];

/// The smallest comparable unit of a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionToken {
    pub numeric: bool,
    /// `.` or `-`.
    pub separator: char,
    /// Digits, or a lower-cased qualifier.
    pub text: String,
}

impl VersionToken {
    pub fn number(separator: char, text: impl Into<String>) -> Self {
        Self {
            numeric: true,
            separator,
            text: text.into(),
        }
    }

    pub fn qualifier(separator: char, text: impl Into<String>) -> Self {
        Self {
            numeric: false,
            separator,
            text: text.into(),
        }
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.separator, self.text)
    }
}

/// A parsed Maven version. Equality follows the ordering, not the raw text.
#[derive(Debug, Clone)]
pub struct MavenVersion {
    original: String,
    tokens: Vec<VersionToken>,
}

impl MavenVersion {
    /// Tokenize `version`. Whitespace is ignored.
    pub fn parse(version: &str) -> Result<Self, MvnGetError> {
        Ok(Self {
            original: version.trim().to_string(),
            tokens: tokenize(version)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.original
    }

    pub fn tokens(&self) -> &[VersionToken] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    /// The token sequence written back out, e.g. `1.0-ga` becomes `1.0`.
    pub fn normalized(&self) -> String {
        let joined: String = self.tokens.iter().map(ToString::to_string).collect();
        match joined.get(1..) {
            Some(rest) if !rest.is_empty() => rest.to_string(),
            _ => "?".to_string(),
        }
    }
}

impl fmt::Display for MavenVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

impl PartialEq for MavenVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MavenVersion {}

impl Ord for MavenVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.original == other.original {
            return Ordering::Equal;
        }
        if other.original.is_empty() {
            return Ordering::Greater;
        }
        if self.original.is_empty() {
            return Ordering::Less;
        }

        for (a, b) in self.tokens.iter().zip(&other.tokens) {
            let ord = compare_tokens(a, b);
            if ord != Ordering::Equal {
                return ord;
            }
        }

        let (mine, theirs) = (self.tokens.len(), other.tokens.len());
        match mine.cmp(&theirs) {
            Ordering::Equal => Ordering::Equal,
            Ordering::Greater => extension_ordering(&self.tokens[theirs]),
            Ordering::Less => extension_ordering(&other.tokens[mine]).reverse(),
        }
    }
}

impl PartialOrd for MavenVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// How a longer version orders against its own prefix.
fn extension_ordering(extra: &VersionToken) -> Ordering {
    if !extra.numeric && PRERELEASE_QUALIFIERS.contains(&extra.text.as_str()) {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

fn compare_tokens(a: &VersionToken, b: &VersionToken) -> Ordering {
    match (a.numeric, b.numeric) {
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        _ => {}
    }
    if a.separator != b.separator {
        let dotted = if a.separator == '.' {
            Ordering::Greater
        } else {
            Ordering::Less
        };
        return if a.numeric { dotted } else { dotted.reverse() };
    }
    if a.numeric {
        compare_numbers(&a.text, &b.text)
    } else {
        compare_qualifiers(&a.text, &b.text)
    }
}

/// Compare digit strings as unbounded integers.
fn compare_numbers(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_qualifiers(a: &str, b: &str) -> Ordering {
    let a = if a == "cr" { "rc" } else { a };
    let b = if b == "cr" { "rc" } else { b };
    if a == b {
        return Ordering::Equal;
    }
    let rank = |q: &str| QUALIFIER_ORDER.iter().position(|known| *known == q);
    match (rank(a), rank(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    TokenStart,
    Numeric,
    Qualifier,
}

#[derive(Default)]
struct Tokenizer {
    tokens: Vec<VersionToken>,
    text: String,
}

impl Tokenizer {
    fn emit(&mut self, numeric: bool, separator: char) {
        let text = std::mem::take(&mut self.text);
        if numeric {
            self.tokens.push(VersionToken::number(separator, text));
        } else {
            let text = text.to_lowercase();
            if !DROPPED_QUALIFIERS.contains(&text.as_str()) {
                self.tokens.push(VersionToken::qualifier(separator, text));
            }
        }
    }
}

fn tokenize(version: &str) -> Result<Vec<VersionToken>, MvnGetError> {
    let mut tk = Tokenizer::default();
    let mut separator = '-';
    let mut state = State::TokenStart;

    for c in version.chars().filter(|c| !c.is_whitespace()) {
        match state {
            State::TokenStart => match c {
                '.' => {
                    // ".5" reads as "0.5"
                    tk.tokens.push(VersionToken::number(separator, "0"));
                    separator = '.';
                }
                '+' => {
                    tk.text.push('0');
                    state = State::Numeric;
                }
                '-' | '[' | ']' | '(' | ')' | ',' => {
                    return Err(MvnGetError::Version {
                        message: format!("Invalid version number format {version}"),
                    });
                }
                _ => {
                    tk.text.push(c);
                    state = if c.is_ascii_digit() {
                        State::Numeric
                    } else {
                        State::Qualifier
                    };
                }
            },
            State::Numeric => match c {
                '.' | '-' => {
                    tk.emit(true, separator);
                    separator = c;
                    state = State::TokenStart;
                }
                _ if c.is_ascii_digit() => tk.text.push(c),
                _ => {
                    tk.emit(true, separator);
                    separator = '-';
                    tk.text.push(c);
                    state = State::Qualifier;
                }
            },
            State::Qualifier => match c {
                '.' | '-' => {
                    tk.emit(false, separator);
                    separator = c;
                    state = State::TokenStart;
                }
                _ if c.is_ascii_digit() => {
                    tk.emit(false, separator);
                    separator = '-';
                    tk.text.push(c);
                    state = State::Numeric;
                }
                _ => tk.text.push(c),
            },
        }
    }

    match state {
        State::Numeric => tk.emit(true, separator),
        State::Qualifier => tk.emit(false, separator),
        State::TokenStart => {}
    }
    Ok(tk.tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> MavenVersion {
        MavenVersion::parse(s).unwrap()
    }

    fn tokens(s: &str) -> Vec<String> {
        v(s).tokens().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn prefix_ordering() {
        assert!(v("1") < v("1.0"));
        assert!(v("1.0") < v("1.1"));
        assert!(v("1.1.2") < v("1.2"));
    }

    #[test]
    fn qualifier_ordering() {
        assert!(v("1-alpha") < v("1-beta"));
        assert!(v("1-beta") < v("2-alpha"));
        assert!(v("1-beta") < v("1-milestone"));
        assert!(v("1-milestone") < v("1-rc"));
        assert!(v("1-rc") < v("1-snapshot"));
        assert_eq!(v("1-rc"), v("1-cr"));
        assert_eq!(v("1-RC"), v("1-rc"));
    }

    #[test]
    fn final_and_ga_are_dropped() {
        assert_eq!(v("1.0"), v("1.0-final"));
        assert_eq!(v("1.0"), v("1.0-ga"));
        assert_eq!(v("1.0-final"), v("1.0-GA"));
        assert!(v("1-ga") < v("1-sp"));
    }

    #[test]
    fn prerelease_extension_is_older() {
        assert!(v("1.0-SNAPSHOT") < v("1.0"));
        assert!(v("1.0-alpha") < v("1.0"));
        assert!(v("2.0-cr1") < v("2.0"));
        assert!(v("1.0-jre") > v("1.0"));
    }

    #[test]
    fn separator_ordering() {
        assert!(v("1.alpha") < v("1-alpha"));
        assert!(v("1-a") < v("1-1"));
        assert!(v("1-1") < v("1.1"));
        assert!(v("a") < v("1"));
    }

    #[test]
    fn unknown_qualifiers_rank_below_known() {
        assert!(v("1-foo") < v("1-alpha"));
        assert!(v("1-alpha") > v("1-zzz"));
        assert!(v("1-bar") < v("1-foo"));
        assert!(v("1-sp1") < v("1-sp2"));
    }

    #[test]
    fn digit_letter_transitions() {
        assert_eq!(v("single-23"), v("single23"));
        assert_eq!(tokens("rc1"), vec!["-rc", "-1"]);
        assert_eq!(tokens("5.bard2"), vec!["-5", ".bard", "-2"]);
        assert_eq!(tokens("abc-def.xyz"), vec!["-abc", "-def", ".xyz"]);
    }

    #[test]
    fn implied_leading_zero() {
        assert_eq!(tokens(".123-alpha"), vec!["-0", ".123", "-alpha"]);
        assert_eq!(tokens("ga.1"), vec![".1"]);
        assert_eq!(tokens("1.+"), vec!["-1", ".0"]);
    }

    #[test]
    fn empty_token_sequences() {
        assert!(v("").tokens().is_empty());
        assert!(v("ga").tokens().is_empty());
        assert!(v("final").tokens().is_empty());
        assert_eq!(v("").normalized(), "?");
    }

    #[test]
    fn whitespace_is_ignored() {
        assert_eq!(tokens(" 1 .2 "), vec!["-1", ".2"]);
        assert_eq!(v(" 1.2 ").as_str(), "1.2");
    }

    #[test]
    fn empty_is_earliest() {
        assert!(v("") < v("a"));
        assert!(v("") < v("0"));
        assert_eq!(v(""), v(""));
    }

    #[test]
    fn large_numbers() {
        assert!(v("1.99999999999999999999") < v("1.100000000000000000000"));
        assert!(v("20200101123045") > v("9"));
        assert_eq!(v("1.01"), v("1.1"));
    }

    #[test]
    fn invalid_token_starts() {
        for bad in ["-1", "1.-2", "[1.0]", ",1", "(1"] {
            let err = MavenVersion::parse(bad).unwrap_err();
            assert!(err.to_string().starts_with("Invalid version"), "{bad}");
        }
    }

    #[test]
    fn normalized_form() {
        assert_eq!(v("1.0-GA").normalized(), "1.0");
        assert_eq!(v("1.0-CR2").normalized(), "1.0-cr-2");
        assert_eq!(v("1.0").to_string(), "1.0");
    }

    #[test]
    fn comparison_is_antisymmetric() {
        let sample: Vec<MavenVersion> = [
            "", "1", "1.0", "1.1", "1-alpha", "1-rc", "1-cr", "1-sp", "1-foo", "1.alpha", "1-1",
            "a", "1.0-ga",
        ]
        .iter()
        .map(|s| v(s))
        .collect();
        for a in &sample {
            for b in &sample {
                assert_eq!(a.cmp(b), b.cmp(a).reverse(), "{a} vs {b}");
            }
        }
    }

    #[test]
    fn known_qualifiers_order_transitively() {
        let sample: Vec<MavenVersion> = [
            "", "1", "1.0", "1.0.1", "1.1", "1-alpha", "1-beta", "1-rc", "1-cr", "1-snapshot",
            "1.alpha", "1-1", "2", "2.0-alpha1", "a", "1.0-ga",
        ]
        .iter()
        .map(|s| v(s))
        .collect();
        for a in &sample {
            for b in &sample {
                for c in &sample {
                    if a <= b && b <= c {
                        assert!(a <= c, "{a} <= {b} <= {c}");
                    }
                }
            }
        }
    }
}
