use std::{fmt, str::FromStr};

use regex::Regex;

const DEFAULT_PLACEHOLDER_REGEX: &str = "[^/]+";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PatternError {
    #[error("route pattern '{0}' must start with '/'")]
    MissingLeadingSlash(String),

    #[error("unterminated placeholder in route pattern '{0}'")]
    UnterminatedPlaceholder(String),

    #[error("invalid placeholder name '{name}' in route pattern '{pattern}'")]
    InvalidPlaceholderName { pattern: String, name: String },

    #[error("unbalanced optional segment in route pattern '{0}'")]
    UnbalancedOptional(String),

    #[error("optional segments must be at the end of route pattern '{0}'")]
    OptionalNotTrailing(String),

    #[error("invalid regex for route pattern '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ParamError {
    #[error("missing route parameter '{0}'")]
    Missing(String),

    #[error("invalid value '{value}' for route parameter '{name}'")]
    Invalid { name: String, value: String },
}

/// Path parameters captured by a matched route, in the order the pattern
/// declares them. Optional parameters that were not supplied are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(Vec<(String, String)>);

impl RouteParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn parse<T: FromStr>(&self, name: &str) -> Result<T, ParamError> {
        let value = self
            .get(name)
            .ok_or_else(|| ParamError::Missing(name.to_string()))?;

        value.parse().map_err(|_| ParamError::Invalid {
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone)]
enum Matcher {
    Static,
    Dynamic {
        regex: Regex,
        param_names: Vec<String>,
    },
}

/// A compiled route path such as `/articles/{id:\d+}[/{title}]`.
///
/// `{name}` matches one path segment, `{name:regex}` matches `regex`, and
/// `[...]` marks an optional tail. Optional parts may nest but must close
/// at the end of the pattern.
#[derive(Debug, Clone)]
pub struct RoutePattern {
    source: String,
    matcher: Matcher,
}

impl RoutePattern {
    pub fn parse(source: &str) -> Result<Self, PatternError> {
        if !source.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash(source.to_string()));
        }

        if !source.contains(['{', '[', ']']) {
            return Ok(Self {
                source: source.to_string(),
                matcher: Matcher::Static,
            });
        }

        let (regex_source, param_names) = translate(source)?;
        let regex = Regex::new(&regex_source).map_err(|err| PatternError::InvalidRegex {
            pattern: source.to_string(),
            message: err.to_string(),
        })?;

        Ok(Self {
            source: source.to_string(),
            matcher: Matcher::Dynamic { regex, param_names },
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_static(&self) -> bool {
        matches!(self.matcher, Matcher::Static)
    }

    pub fn captures(&self, path: &str) -> Option<RouteParams> {
        match &self.matcher {
            Matcher::Static => (self.source == path).then(RouteParams::new),
            Matcher::Dynamic { regex, param_names } => {
                let captures = regex.captures(path)?;
                let params = param_names
                    .iter()
                    .filter_map(|name| {
                        captures
                            .name(name)
                            .map(|value| (name.clone(), value.as_str().to_string()))
                    })
                    .collect();
                Some(RouteParams(params))
            }
        }
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_valid_param_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Returns the end index (exclusive) of the placeholder starting at `start`,
/// allowing balanced braces inside a custom regex.
fn placeholder_end(source: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, c) in source[start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

fn translate(source: &str) -> Result<(String, Vec<String>), PatternError> {
    let mut regex_source = String::from("^");
    let mut param_names = Vec::new();
    let mut open_optionals = 0usize;
    let mut closed_optional = false;
    let mut literal = String::new();
    let mut index = 0;

    while index < source.len() {
        let rest = &source[index..];
        let Some(c) = rest.chars().next() else {
            break;
        };

        if closed_optional && c != ']' {
            return Err(PatternError::OptionalNotTrailing(source.to_string()));
        }

        match c {
            '{' => {
                regex_source.push_str(&regex::escape(&literal));
                literal.clear();

                let end = placeholder_end(source, index)
                    .ok_or_else(|| PatternError::UnterminatedPlaceholder(source.to_string()))?;
                let body = &source[index + 1..end - 1];
                let (name, pattern) = match body.split_once(':') {
                    Some((name, pattern)) => (name.trim(), pattern.trim()),
                    None => (body.trim(), DEFAULT_PLACEHOLDER_REGEX),
                };

                if !is_valid_param_name(name) {
                    return Err(PatternError::InvalidPlaceholderName {
                        pattern: source.to_string(),
                        name: name.to_string(),
                    });
                }

                regex_source.push_str(&format!("(?P<{}>{})", name, pattern));
                param_names.push(name.to_string());
                index = end;
                continue;
            }
            '[' => {
                regex_source.push_str(&regex::escape(&literal));
                literal.clear();
                regex_source.push_str("(?:");
                open_optionals += 1;
            }
            ']' => {
                if open_optionals == 0 {
                    return Err(PatternError::UnbalancedOptional(source.to_string()));
                }
                regex_source.push_str(&regex::escape(&literal));
                literal.clear();
                regex_source.push_str(")?");
                open_optionals -= 1;
                closed_optional = true;
            }
            _ => literal.push(c),
        }

        index += c.len_utf8();
    }

    if open_optionals != 0 {
        return Err(PatternError::UnbalancedOptional(source.to_string()));
    }

    regex_source.push_str(&regex::escape(&literal));
    regex_source.push('$');

    Ok((regex_source, param_names))
}
