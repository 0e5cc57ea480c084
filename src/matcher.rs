//! Ant-style URL pattern matching.
//!
//! Patterns are split on `/`. Inside a segment `*` matches any run of
//! characters and `?` a single character (delegated to [`glob::Pattern`]);
//! a segment that is exactly `**` matches zero or more whole segments.
//! URI template variables (`{id}`, `{name:[a-z]+}`) match like `*`, and every
//! other character, brackets included, is literal.
//!
//! ```
//! use security_exception_filter::matcher::{EmptyPatterns, UrlMatcher};
//!
//! let matcher = UrlMatcher::new(["/api/**", "/graphql"], EmptyPatterns::MatchNone).unwrap();
//! assert!(matcher.matches("/api/users/123"));
//! assert!(matcher.matches("/graphql"));
//! assert!(!matcher.matches("/health"));
//! ```

use glob::Pattern;

use crate::error::{Error, Result};

const SEPARATOR: char = '/';

/// What a matcher with no patterns answers.
///
/// Configured handlers treat "no URLs" as "every URL", while predicates built
/// for the handler builder treat it as "no URL". Callers pick one explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyPatterns {
    MatchAll,
    MatchNone,
}

/// A set of ant-style patterns; a path matches if any pattern does.
#[derive(Debug, Clone)]
pub struct UrlMatcher {
    patterns: Vec<AntPattern>,
    empty: EmptyPatterns,
}

impl UrlMatcher {
    pub fn new<I, P>(patterns: I, empty: EmptyPatterns) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| AntPattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns, empty })
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.patterns.is_empty() {
            return self.empty == EmptyPatterns::MatchAll;
        }
        self.patterns.iter().any(|pattern| pattern.matches(path))
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(|p| p.source.as_str())
    }

    pub fn empty_patterns(&self) -> EmptyPatterns {
        self.empty
    }
}

#[derive(Debug, Clone)]
struct AntPattern {
    source: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
enum Segment {
    /// `**`
    AnyPath,
    Literal(String),
    Wildcard(Pattern),
}

impl Segment {
    fn parse(raw: &str, source: &str) -> Result<Self> {
        if raw == "**" {
            return Ok(Segment::AnyPath);
        }
        if !raw.contains(['*', '?', '{']) {
            return Ok(Segment::Literal(raw.to_owned()));
        }

        let invalid = |reason| Error::InvalidPattern {
            pattern: source.to_owned(),
            reason,
        };
        let mut glob = String::with_capacity(raw.len());
        let mut chars = raw.chars();
        while let Some(c) = chars.next() {
            match c {
                // a template variable's own constraint is not checked
                '{' => {
                    let mut depth = 1;
                    for c in chars.by_ref() {
                        match c {
                            '{' => depth += 1,
                            '}' => depth -= 1,
                            _ => {}
                        }
                        if depth == 0 {
                            break;
                        }
                    }
                    if depth != 0 {
                        return Err(invalid("unclosed `{` in URI template variable"));
                    }
                    glob.push('*');
                }
                '[' => glob.push_str("[[]"),
                ']' => glob.push_str("[]]"),
                c => glob.push(c),
            }
        }
        // glob only accepts `**` as a whole component; inside a segment it means `*`
        while glob.contains("**") {
            glob = glob.replace("**", "*");
        }
        Pattern::new(&glob)
            .map(Segment::Wildcard)
            .map_err(|err| invalid(err.msg))
    }

    /// A segment that is exactly `*`.
    fn is_single_wildcard(&self) -> bool {
        matches!(self, Segment::Wildcard(pattern) if pattern.as_str() == "*")
    }

    fn matches(&self, segment: &str) -> bool {
        match self {
            Segment::AnyPath => true,
            Segment::Literal(literal) => literal == segment,
            Segment::Wildcard(pattern) => pattern.matches(segment),
        }
    }
}

impl AntPattern {
    fn parse(source: &str) -> Result<Self> {
        let mut segments: Vec<Segment> = Vec::new();
        for raw in tokenize(source) {
            let segment = Segment::parse(raw, source)?;
            // consecutive `**` collapse into one
            if matches!(segment, Segment::AnyPath) && matches!(segments.last(), Some(Segment::AnyPath)) {
                continue;
            }
            segments.push(segment);
        }
        Ok(Self {
            source: source.to_owned(),
            segments,
        })
    }

    fn matches(&self, path: &str) -> bool {
        if self.source.starts_with(SEPARATOR) != path.starts_with(SEPARATOR) {
            return false;
        }

        let path_segments: Vec<&str> = tokenize(path).collect();
        if !match_segments(&self.segments, &path_segments) {
            // `/api/*` also matches `/api/`
            return path.ends_with(SEPARATOR)
                && self.segments.split_last().is_some_and(|(last, rest)| {
                    last.is_single_wildcard() && match_segments(rest, &path_segments)
                });
        }

        // A trailing separator is significant unless the pattern ends in `**`
        matches!(self.segments.last(), Some(Segment::AnyPath))
            || self.source.ends_with(SEPARATOR) == path.ends_with(SEPARATOR)
    }
}

fn tokenize(s: &str) -> impl Iterator<Item = &str> {
    s.split(SEPARATOR).filter(|segment| !segment.is_empty())
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::AnyPath, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((segment, rest)) => match path.split_first() {
            Some((head, tail)) => segment.matches(head) && match_segments(rest, tail),
            None => false,
        },
    }
}
