//! Route pattern compilation.
//!
//! # Responsibilities
//! - Find `:name` parameter tokens in a route spec
//! - Replace each token with its validation sub-pattern
//! - Escape literal text and anchor the expression
//! - Record parameter names in declaration order
//!
//! # Design Decisions
//! - A parameter token is a colon followed by one or more non-slash characters,
//!   so inline sub-patterns cannot contain `/`
//! - Each parameter contributes exactly one capture group; inline groups that
//!   capture on their own are rejected
//! - Literal text is escaped, `.` in `/feed.xml` only matches a dot

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Sub-pattern used for parameters without an inline group: word characters and dash.
pub const DEFAULT_PARAM_PATTERN: &str = r"([-\w]+)";

/// Colon followed by any character except slash.
///
/// `/people/:name` => `:name`, `/people/:age([0-9]{3})` => `:age([0-9]{3})`
static WHOLE_PARAM: Lazy<Regex> = Lazy::new(|| Regex::new(r":[^/]+").unwrap());

/// Errors raised while compiling a route spec.
#[derive(Debug, Error)]
pub enum PatternError {
    /// Inline group is missing a closing parenthesis.
    #[error("route `{spec}`: unbalanced parentheses in pattern for `:{param}`")]
    UnbalancedGroup { spec: String, param: String },

    /// A `:` with no name before the inline group.
    #[error("route `{spec}`: parameter at byte {offset} has no name")]
    EmptyName { spec: String, offset: usize },

    /// Text after the inline group's closing parenthesis within the same segment.
    #[error("route `{spec}`: unexpected `{trailing}` after pattern for `:{param}`")]
    TrailingCharacters {
        spec: String,
        param: String,
        trailing: String,
    },

    /// Inline group defines capture groups of its own.
    #[error("route `{spec}`: pattern for `:{param}` must not contain capturing groups, use (?:...)")]
    NestedCapture { spec: String, param: String },

    /// The regex engine rejected the pattern.
    #[error("route `{spec}`: invalid pattern: {source}")]
    Regex {
        spec: String,
        #[source]
        source: regex::Error,
    },
}

/// A compiled route spec: anchored expression plus parameter names.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    spec: String,
    regex: Regex,
    params: Vec<String>,
}

impl RoutePattern {
    /// Compile a route spec such as `/artist/:name/:track_id([0-9]+)`.
    pub fn compile(spec: &str) -> Result<Self, PatternError> {
        let mut expression = String::with_capacity(spec.len() * 2);
        let mut params = Vec::new();
        let mut last = 0;

        expression.push('^');
        for token in WHOLE_PARAM.find_iter(spec) {
            expression.push_str(&regex::escape(&spec[last..token.start()]));

            let param = parse_param(spec, token.start(), token.as_str())?;
            match param.group {
                Some(group) => {
                    check_group(spec, &param.name, group)?;
                    expression.push_str(group);
                }
                None => expression.push_str(DEFAULT_PARAM_PATTERN),
            }
            params.push(param.name);
            last = token.end();
        }
        expression.push_str(&regex::escape(&spec[last..]));
        expression.push_str("/?$");

        let regex = Regex::new(&expression).map_err(|source| PatternError::Regex {
            spec: spec.to_string(),
            source,
        })?;
        debug_assert_eq!(regex.captures_len() - 1, params.len());

        Ok(Self {
            spec: spec.to_string(),
            regex,
            params,
        })
    }

    /// The route spec this pattern was compiled from.
    pub fn spec(&self) -> &str {
        &self.spec
    }

    /// The anchored expression applied to request paths.
    pub fn expression(&self) -> &str {
        self.regex.as_str()
    }

    /// Parameter names in declaration order, without the leading colon.
    pub fn param_names(&self) -> &[String] {
        &self.params
    }

    pub(crate) fn regex(&self) -> &Regex {
        &self.regex
    }
}

impl FromStr for RoutePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)
    }
}

struct Param<'a> {
    name: String,
    group: Option<&'a str>,
}

fn parse_param<'a>(spec: &str, offset: usize, token: &'a str) -> Result<Param<'a>, PatternError> {
    // skip the colon
    let body = &token[1..];
    let (name, rest) = match body.find('(') {
        Some(i) => (&body[..i], &body[i..]),
        None => (body, ""),
    };

    if name.is_empty() {
        return Err(PatternError::EmptyName {
            spec: spec.to_string(),
            offset,
        });
    }

    if rest.is_empty() {
        return Ok(Param {
            name: name.to_string(),
            group: None,
        });
    }

    let end = group_end(rest).ok_or_else(|| PatternError::UnbalancedGroup {
        spec: spec.to_string(),
        param: name.to_string(),
    })?;

    let trailing = &rest[end + 1..];
    if !trailing.is_empty() {
        return Err(PatternError::TrailingCharacters {
            spec: spec.to_string(),
            param: name.to_string(),
            trailing: trailing.to_string(),
        });
    }

    Ok(Param {
        name: name.to_string(),
        group: Some(&rest[..=end]),
    })
}

/// Byte index of the parenthesis closing the group that opens at index 0.
///
/// Escaped characters and parentheses inside character classes don't count.
fn group_end(group: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_class = false;
    let mut chars = group.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                chars.next();
            }
            '[' if !in_class => in_class = true,
            ']' if in_class => in_class = false,
            '(' if !in_class => depth += 1,
            ')' if !in_class => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Compile the inline group on its own so errors name the parameter.
fn check_group(spec: &str, param: &str, group: &str) -> Result<(), PatternError> {
    let compiled = Regex::new(group).map_err(|source| PatternError::Regex {
        spec: spec.to_string(),
        source,
    })?;
    if compiled.captures_len() != 2 {
        return Err(PatternError::NestedCapture {
            spec: spec.to_string(),
            param: param.to_string(),
        });
    }
    Ok(())
}
