// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Ant-style path patterns.
//!
//! Patterns and paths are compared segment by segment, split on `/`.
//!
//! | Pattern | Matches |
//! |---------|---------|
//! | `?` | exactly one character within a segment |
//! | `*` | any run of characters within a segment |
//! | `**` | zero or more whole segments, when it is a segment by itself |
//!
//! Inside a segment (`/a**b`) a run of stars acts as a single `*`. Matching
//! is case-sensitive and anchored at both ends, so `/front/**` matches
//! `/front` and `/front/**/status` matches `/front/status`. Empty segments
//! are ignored. A trailing slash must agree between pattern and path unless
//! the pattern ends in `**`, or in `*` against a path ending in `/`.
//!
//! Patterns come from startup configuration, never from requests, so the
//! matcher does not guard against pathological backtracking.

use thiserror::Error;

/// Reasons a configured pattern is rejected at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("path pattern is empty")]
    Empty,
    #[error("path pattern '{0}' must start with '/'")]
    MissingLeadingSlash(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Literal(String),
    Question,
    Star,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// `**`: any number of segments, including none
    AnyDepth,
    Glob(Vec<Token>),
}

impl Segment {
    fn parse(raw: &str) -> Self {
        if raw == "**" {
            Segment::AnyDepth
        } else {
            Segment::Glob(tokenize(raw))
        }
    }

    fn is_single_star(&self) -> bool {
        matches!(self, Segment::Glob(tokens) if tokens.as_slice() == [Token::Star])
    }
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
    trailing_slash: bool,
}

impl PathPattern {
    /// Compile a pattern.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(PatternError::Empty);
        }
        if !raw.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(raw.to_string()));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments: split(raw).map(Segment::parse).collect(),
            trailing_slash: raw.ends_with('/'),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether `path` matches this pattern in full.
    pub fn matches(&self, path: &str) -> bool {
        if !path.starts_with('/') {
            return false;
        }
        let path_segments: Vec<&str> = split(path).collect();
        let slashes_agree = self.trailing_slash == path.ends_with('/');
        match_segments(&self.segments, &path_segments, slashes_agree, path.ends_with('/'))
    }
}

fn match_segments(
    pattern: &[Segment],
    path: &[&str],
    slashes_agree: bool,
    path_trailing_slash: bool,
) -> bool {
    let Some((first, rest)) = pattern.split_first() else {
        return path.is_empty() && slashes_agree;
    };

    match first {
        Segment::AnyDepth => {
            if rest.iter().all(|s| *s == Segment::AnyDepth) {
                return true;
            }
            (0..=path.len()).any(|skip| {
                match_segments(rest, &path[skip..], slashes_agree, path_trailing_slash)
            })
        }
        Segment::Glob(tokens) => match path.split_first() {
            Some((segment, path_rest)) => {
                match_tokens(tokens, segment)
                    && match_segments(rest, path_rest, slashes_agree, path_trailing_slash)
            }
            // `/common/*` accepts `/common/`
            None => rest.is_empty() && first.is_single_star() && path_trailing_slash,
        },
    }
}

impl std::fmt::Display for PathPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

fn split(raw: &str) -> impl Iterator<Item = &str> {
    raw.split('/').filter(|segment| !segment.is_empty())
}

fn tokenize(raw: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut literal = String::new();
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        let token = match c {
            '*' => {
                while chars.next_if_eq(&'*').is_some() {}
                Token::Star
            }
            '?' => Token::Question,
            other => {
                literal.push(other);
                continue;
            }
        };
        if !literal.is_empty() {
            tokens.push(Token::Literal(std::mem::take(&mut literal)));
        }
        tokens.push(token);
    }
    if !literal.is_empty() {
        tokens.push(Token::Literal(literal));
    }
    tokens
}

/// Match one segment; `segment` never contains `/`.
fn match_tokens(tokens: &[Token], segment: &str) -> bool {
    let Some((token, rest)) = tokens.split_first() else {
        return segment.is_empty();
    };

    match token {
        Token::Literal(lit) => segment
            .strip_prefix(lit.as_str())
            .is_some_and(|remaining| match_tokens(rest, remaining)),
        Token::Question => {
            let mut chars = segment.chars();
            chars.next().is_some() && match_tokens(rest, chars.as_str())
        }
        Token::Star => (0..=segment.len())
            .filter(|&i| segment.is_char_boundary(i))
            .any(|i| match_tokens(rest, &segment[i..])),
    }
}

/// An ordered set of compiled patterns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSet {
    patterns: Vec<PathPattern>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile every pattern, failing on the first invalid one.
    pub fn parse<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| PathPattern::parse(p.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn push(&mut self, pattern: PathPattern) {
        self.patterns.push(pattern);
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathPattern> {
        self.patterns.iter()
    }

    /// True iff at least one pattern matches `path`.
    pub fn matches_any(&self, path: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(path))
    }
}

/// Match a single uncompiled pattern. Invalid patterns match nothing.
pub fn matches(pattern: &str, path: &str) -> bool {
    PathPattern::parse(pattern).is_ok_and(|p| p.matches(path))
}

/// True iff any of the uncompiled `patterns` matches `path`.
pub fn matches_any<S: AsRef<str>>(patterns: &[S], path: &str) -> bool {
    patterns.iter().any(|p| matches(p.as_ref(), path))
}
