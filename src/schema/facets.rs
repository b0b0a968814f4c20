//! Constraining facets
//!
//! This module implements the facets that refine a built-in type:
//! `range` (integers and decimal64), `length` (strings and binary) and
//! `pattern` (strings). Range and length share one grammar:
//!
//! ```text
//! range-arg = part *( "|" part )
//! part      = bound [ ".." bound ]
//! bound     = "min" | "max" | number
//! ```

use crate::error::{Error, Result};
use regex::Regex;
use std::fmt;

/// One bound of a range part
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeBound {
    /// The smallest value of the base type
    Min,
    /// The largest value of the base type
    Max,
    /// A literal number, kept as written
    Value(String),
}

impl RangeBound {
    fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        match token {
            "min" => Ok(RangeBound::Min),
            "max" => Ok(RangeBound::Max),
            "" => Err(Error::Value("empty range bound".to_string())),
            _ => {
                let digits = token.strip_prefix(['-', '+']).unwrap_or(token);
                let numeric = !digits.is_empty()
                    && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
                    && digits.chars().filter(|c| *c == '.').count() <= 1;
                if numeric {
                    Ok(RangeBound::Value(token.to_string()))
                } else {
                    Err(Error::Value(format!("invalid range bound '{}'", token)))
                }
            }
        }
    }
}

impl fmt::Display for RangeBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeBound::Min => write!(f, "min"),
            RangeBound::Max => write!(f, "max"),
            RangeBound::Value(v) => write!(f, "{}", v),
        }
    }
}

/// A single value or an interval of a range expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangePart {
    /// Lower bound (or the single value)
    pub lo: RangeBound,
    /// Upper bound for intervals
    pub hi: Option<RangeBound>,
}

/// Range or length facet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeFacet {
    /// Original expression text
    pub expression: String,
    /// Parsed parts in declaration order
    pub parts: Vec<RangePart>,
}

impl RangeFacet {
    /// Parse a range expression such as `"1..10 | 20"`
    pub fn parse(expression: &str) -> Result<Self> {
        let mut parts = Vec::new();
        for raw in expression.split('|') {
            let raw = raw.trim();
            let part = match raw.split_once("..") {
                Some((lo, hi)) => RangePart {
                    lo: RangeBound::parse(lo)?,
                    hi: Some(RangeBound::parse(hi)?),
                },
                None => RangePart {
                    lo: RangeBound::parse(raw)?,
                    hi: None,
                },
            };
            parts.push(part);
        }
        Ok(Self {
            expression: expression.trim().to_string(),
            parts,
        })
    }

    /// A single `a..b` interval
    pub fn is_contiguous(&self) -> bool {
        self.parts.len() == 1 && self.parts[0].hi.is_some()
    }

    /// The interval bounds when the range is contiguous
    pub fn interval(&self) -> Option<(&RangeBound, &RangeBound)> {
        if self.is_contiguous() {
            let part = &self.parts[0];
            part.hi.as_ref().map(|hi| (&part.lo, hi))
        } else {
            None
        }
    }

    /// All boundary tokens, flattened in declaration order
    pub fn boundary_tokens(&self) -> Vec<&RangeBound> {
        let mut tokens = Vec::new();
        for part in &self.parts {
            tokens.push(&part.lo);
            if let Some(ref hi) = part.hi {
                tokens.push(hi);
            }
        }
        tokens
    }

    /// Smallest explicit lower bound as an unsigned count (length facets)
    pub fn min_length(&self) -> Option<usize> {
        self.parts.iter().find_map(|p| match &p.lo {
            RangeBound::Value(v) => v.parse().ok(),
            RangeBound::Min => Some(0),
            RangeBound::Max => None,
        })
    }

    /// Largest explicit upper bound as an unsigned count (length facets)
    pub fn max_length(&self) -> Option<usize> {
        self.parts.iter().rev().find_map(|p| {
            let bound = p.hi.as_ref().unwrap_or(&p.lo);
            match bound {
                RangeBound::Value(v) => v.parse().ok(),
                _ => None,
            }
        })
    }
}

impl fmt::Display for RangeFacet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.expression)
    }
}

/// Pattern facet
///
/// Schema patterns use XML Schema regular expression syntax and are
/// implicitly anchored. Most of them compile with the `regex` crate; the ones
/// that do not are kept as text only and are never used to reject values.
#[derive(Debug, Clone)]
pub struct PatternFacet {
    /// Pattern text as declared
    pub pattern: String,
    regex: Option<Regex>,
}

impl PatternFacet {
    /// Create a new pattern facet
    pub fn new(pattern: &str) -> Self {
        let regex = Regex::new(&format!("^(?:{})$", pattern)).ok();
        Self {
            pattern: pattern.to_string(),
            regex,
        }
    }

    /// Check a value; `None` when the pattern could not be compiled
    pub fn matches(&self, value: &str) -> Option<bool> {
        self.regex.as_ref().map(|re| re.is_match(value))
    }
}

impl PartialEq for PatternFacet {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for PatternFacet {}
