//! Value domain synthesis
//!
//! Every walkable leaf gets a finite, ordered, never-empty [`Domain`] of
//! candidate values derived from its type. Overrides always win; otherwise
//! the domain samples the type at its boundaries (integers, decimals),
//! enumerates it (enumerations, booleans, bits, identities) or generates a
//! recognizable placeholder (strings).

use crate::error::{Error, MapKind, Result};
use crate::limits::Limits;
use crate::schema::builtins::{self, IntegerKind};
use crate::schema::{NodeId, RangeBound, RangeFacet, SchemaNode, SchemaTree, TypeSpec};
use crate::settings::Overrides;
use crate::xpath::{EMPTY_FALSE, EMPTY_TRUE};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::str::FromStr;

/// Placeholder value of a leafref before its target has been adopted
pub const LEAFREF_PLACEHOLDER: &str = "<leafref>";

/// Default decimal64 samples when no range is declared
const DECIMAL_DEFAULTS: [&str; 3] = ["0", "1.5", "100"];

/// Sample byte counts for binary domains
const BINARY_SIZES: [usize; 3] = [1, 2, 4];

/// One value a leaf can take
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// A fixed value
    Literal(String),
    /// A placeholder rendered per pass as `<stem><pass>`, fitted to a length facet
    Generated {
        /// `<parent>-<name>`
        stem: String,
        /// Declared length facet
        length: Option<RangeFacet>,
    },
    /// Filled in from the leafref target during pruning
    Deferred,
}

impl Candidate {
    /// Render the value for a 0-based cursor pass
    pub fn render(&self, pass: usize) -> String {
        match self {
            Candidate::Literal(value) => value.clone(),
            Candidate::Deferred => LEAFREF_PLACEHOLDER.to_string(),
            Candidate::Generated { stem, length } => {
                let mut value = format!("{}{}", stem, pass + 1);
                if let Some(length) = length {
                    let min = length.min_length().unwrap_or(0);
                    let count = value.chars().count();
                    if count < min {
                        value.extend(std::iter::repeat('x').take(min - count));
                    }
                    if let Some(max) = length.max_length() {
                        if value.chars().count() > max {
                            value = value.chars().take(max).collect();
                        }
                    }
                }
                value
            }
        }
    }

    /// Whether the value is taken from a leafref target
    pub fn is_deferred(&self) -> bool {
        matches!(self, Candidate::Deferred)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Candidate::Literal(value) => write!(f, "{}", value),
            Candidate::Generated { stem, .. } => write!(f, "{}<N>", stem),
            Candidate::Deferred => write!(f, "{}", LEAFREF_PLACEHOLDER),
        }
    }
}

/// Ordered, non-empty sequence of candidates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domain {
    candidates: Vec<Candidate>,
}

impl Domain {
    /// Build a domain; an empty candidate list is an error
    pub fn new(candidates: Vec<Candidate>) -> Result<Self> {
        if candidates.is_empty() {
            return Err(Error::UnsupportedType("type yields no values".to_string()));
        }
        Ok(Self { candidates })
    }

    /// Domain of fixed values
    pub fn literals<I, S>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            values
                .into_iter()
                .map(|v| Candidate::Literal(v.into()))
                .collect(),
        )
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// True when the domain has no candidates
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidate at a position
    pub fn get(&self, index: usize) -> Option<&Candidate> {
        self.candidates.get(index)
    }

    /// All candidates
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Rendered values for one pass
    pub fn values(&self, pass: usize) -> Vec<String> {
        self.candidates.iter().map(|c| c.render(pass)).collect()
    }

    /// True when any candidate is a deferred leafref
    pub fn has_deferred(&self) -> bool {
        self.candidates.iter().any(Candidate::is_deferred)
    }
}

/// Restartable position in a leaf's domain
#[derive(Debug, Clone)]
pub struct LeafCursor {
    domain: Domain,
    position: usize,
    pass: usize,
}

impl LeafCursor {
    /// Cursor at the first candidate
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            position: 0,
            pass: 0,
        }
    }

    /// The domain being walked
    pub fn domain(&self) -> &Domain {
        &self.domain
    }

    /// Current position
    pub fn position(&self) -> usize {
        self.position
    }

    /// Completed passes over the domain
    pub fn pass(&self) -> usize {
        self.pass
    }

    /// Current candidate
    pub fn candidate(&self) -> &Candidate {
        &self.domain.candidates[self.position]
    }

    /// Current value, rendered
    pub fn value(&self) -> String {
        self.candidate().render(self.pass)
    }

    /// Step to the next candidate. Returns true when the domain wrapped
    /// (the cursor is back at the first candidate with the pass counter
    /// incremented).
    pub fn advance(&mut self) -> bool {
        self.position += 1;
        if self.position >= self.domain.len() {
            self.position = 0;
            self.pass += 1;
            true
        } else {
            false
        }
    }

    /// Back to the first candidate of the first pass
    pub fn reset(&mut self) {
        self.position = 0;
        self.pass = 0;
    }
}

// =============================================================================
// Synthesizer
// =============================================================================

/// Derives value domains from leaf types and the override maps
#[derive(Debug)]
pub struct ValueDomainSynthesizer<'a> {
    tree: &'a SchemaTree,
    overrides: &'a Overrides,
    limits: Limits,
}

impl<'a> ValueDomainSynthesizer<'a> {
    /// Create a synthesizer with default limits
    pub fn new(tree: &'a SchemaTree, overrides: &'a Overrides) -> Self {
        Self {
            tree,
            overrides,
            limits: Limits::default(),
        }
    }

    /// Set limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Domain of one leaf or leaf-list
    pub fn synthesize(&self, leaf: NodeId) -> Result<Domain> {
        let node = self.tree.node(leaf);
        let spec = node
            .type_spec
            .as_ref()
            .ok_or_else(|| Error::UnsupportedType(format!("{} has no type", node.path)))?;

        let candidates = match self.node_override(node)? {
            Some(values) => values,
            None => self.synthesize_type(node, spec)?,
        };
        self.limits.check_domain_size(candidates.len(), &node.path)?;
        Domain::new(candidates).map_err(|_| {
            Error::UnsupportedType(format!("type of {} yields no values", node.path))
        })
    }

    fn node_override(&self, node: &SchemaNode) -> Result<Option<Vec<Candidate>>> {
        let found = self
            .overrides
            .leaf_values(node)
            .or_else(|| self.overrides.type_values_for_node(node));
        found.map(|values| literal_list(values, &node.path)).transpose()
    }

    fn type_override(&self, node: &SchemaNode, names: &[&str]) -> Result<Option<Vec<Candidate>>> {
        for name in names {
            if let Some(values) = self.overrides.type_values(name) {
                return literal_list(values, &node.path).map(Some);
            }
        }
        Ok(None)
    }

    fn synthesize_type(&self, node: &SchemaNode, spec: &TypeSpec) -> Result<Vec<Candidate>> {
        let mut spec = spec.clone();
        let mut depth = 0usize;
        // one typedef level per iteration, overrides checked at each level
        while let TypeSpec::Typedef { name, restrictions } = &spec {
            depth += 1;
            if depth > self.limits.max_schema_depth {
                return Err(Error::UnsupportedType(format!("typedef chain too deep at '{}'", name)));
            }
            let typedef = self
                .tree
                .lookup_typedef(name)
                .ok_or_else(|| Error::UnsupportedType(format!("unknown typedef '{}'", name)))?;
            if let Some(values) =
                self.type_override(node, &[name.as_str(), typedef.key.as_str(), typedef.name.as_str()])?
            {
                return Ok(values);
            }
            spec = typedef.base.refine(restrictions);
        }
        if let Some(values) = self.type_override(node, &[spec.name()])? {
            return Ok(values);
        }

        match &spec {
            TypeSpec::Leafref { .. } => Ok(vec![Candidate::Deferred]),
            TypeSpec::String { length, patterns } => {
                if patterns.is_empty() {
                    return Ok(vec![Candidate::Generated {
                        stem: self.stem(node),
                        length: length.clone(),
                    }]);
                }
                let (pattern, values) = patterns
                    .iter()
                    .find_map(|p| self.overrides.pattern_values(&p.pattern).map(|v| (p, v)))
                    .ok_or_else(|| Error::MissingMapEntry {
                        map: MapKind::Pattern,
                        key: patterns[0].pattern.clone(),
                        node: node.path.clone(),
                    })?;
                for value in values {
                    if let Some(rejecting) = patterns.iter().find(|p| p.matches(value) == Some(false)) {
                        tracing::warn!(
                            node = %node.path,
                            value = %value,
                            pattern = %rejecting.pattern,
                            "pattern_map value does not match pattern"
                        );
                    }
                }
                tracing::trace!(node = %node.path, pattern = %pattern.pattern, "pattern_map hit");
                literal_list(values, &node.path)
            }
            TypeSpec::Integer { kind, range } => integer_samples(*kind, range.as_ref())
                .map(|v| v.into_iter().map(Candidate::Literal).collect()),
            TypeSpec::Decimal64 {
                fraction_digits,
                range,
            } => decimal_samples(*fraction_digits, range.as_ref())
                .map(|v| v.into_iter().map(Candidate::Literal).collect()),
            TypeSpec::Enumeration(names) => {
                if names.is_empty() {
                    return Err(Error::UnsupportedType(format!(
                        "enumeration without values at {}",
                        node.path
                    )));
                }
                Ok(names.iter().cloned().map(Candidate::Literal).collect())
            }
            TypeSpec::Boolean => Ok(vec![
                Candidate::Literal("false".to_string()),
                Candidate::Literal("true".to_string()),
            ]),
            TypeSpec::Empty => {
                let mut values = Vec::with_capacity(2);
                if !node.mandatory {
                    values.push(Candidate::Literal(EMPTY_FALSE.to_string()));
                }
                values.push(Candidate::Literal(EMPTY_TRUE.to_string()));
                Ok(values)
            }
            TypeSpec::Bits(bits) => {
                if bits.is_empty() {
                    return Err(Error::UnsupportedType(format!("bits without bit at {}", node.path)));
                }
                let mut values: Vec<Candidate> =
                    bits.iter().cloned().map(Candidate::Literal).collect();
                if bits.len() > 1 {
                    values.push(Candidate::Literal(bits.join(" ")));
                }
                Ok(values)
            }
            TypeSpec::Binary { length } => Ok(binary_samples(length.as_ref())
                .into_iter()
                .map(Candidate::Literal)
                .collect()),
            TypeSpec::IdentityRef { bases } => {
                let mut values: Vec<String> = Vec::new();
                for base in bases {
                    for identity in self.tree.derived_identities(base) {
                        if !values.contains(&identity.key) {
                            values.push(identity.key.clone());
                        }
                    }
                }
                if values.is_empty() {
                    return Err(Error::UnsupportedType(format!(
                        "no identity derived from {} (needed by {})",
                        bases.join(", "),
                        node.path
                    )));
                }
                Ok(values.into_iter().map(Candidate::Literal).collect())
            }
            TypeSpec::InstanceIdentifier => Err(Error::MissingMapEntry {
                map: MapKind::Type,
                key: builtins::INSTANCE_IDENTIFIER.to_string(),
                node: node.path.clone(),
            }),
            TypeSpec::Union(members) => {
                let mut values = Vec::new();
                for member in members {
                    values.extend(self.synthesize_type(node, member)?);
                }
                Ok(values)
            }
            TypeSpec::Typedef { name, .. } => {
                Err(Error::UnsupportedType(format!("unresolved typedef '{}'", name)))
            }
        }
    }

    /// `<parent>-<name>`, with the module name standing in for a missing parent
    fn stem(&self, node: &SchemaNode) -> String {
        let parent = match self.tree.data_parent(node.id) {
            Some(parent) => self.tree.node(parent).name.as_str(),
            None => node.module.as_str(),
        };
        format!("{}-{}", parent, node.name)
    }
}

fn literal_list(values: &[String], path: &str) -> Result<Vec<Candidate>> {
    if values.is_empty() {
        return Err(Error::Value(format!("empty override list for {}", path)));
    }
    Ok(values.iter().cloned().map(Candidate::Literal).collect())
}

// =============================================================================
// Numeric sampling
// =============================================================================

fn integer_bound(kind: IntegerKind, bound: &RangeBound) -> Result<i128> {
    let value = match bound {
        RangeBound::Min => kind.min(),
        RangeBound::Max => kind.max(),
        RangeBound::Value(text) => text
            .parse::<i128>()
            .map_err(|_| Error::Value(format!("'{}' is not a valid {} bound", text, kind)))?,
    };
    if !kind.contains(value) {
        return Err(Error::Value(format!("{} is out of range for {}", value, kind)));
    }
    Ok(value)
}

/// Boundary samples of an integer type
pub fn integer_samples(kind: IntegerKind, range: Option<&RangeFacet>) -> Result<Vec<String>> {
    let numbers: Vec<i128> = match range {
        None => kind.default_samples().to_vec(),
        Some(range) => match range.interval() {
            Some((lo, hi)) => {
                let a = integer_bound(kind, lo)?;
                let b = integer_bound(kind, hi)?;
                vec![a, (a + b) / 2, b]
            }
            None => range
                .boundary_tokens()
                .into_iter()
                .map(|t| integer_bound(kind, t))
                .collect::<Result<_>>()?,
        },
    };
    let mut values: Vec<String> = numbers.iter().map(i128::to_string).collect();
    values.dedup();
    Ok(values)
}

fn decimal_bound(fraction_digits: u8, bound: &RangeBound) -> Result<Decimal> {
    let (raw_min, raw_max) = builtins::decimal64_raw_bounds();
    let scaled = |raw: i128| {
        Decimal::try_from_i128_with_scale(raw, u32::from(fraction_digits))
            .map_err(|e| Error::Value(format!("decimal64 bound: {}", e)))
    };
    match bound {
        RangeBound::Min => scaled(raw_min),
        RangeBound::Max => scaled(raw_max),
        RangeBound::Value(text) => Decimal::from_str(text)
            .map_err(|_| Error::Value(format!("'{}' is not a valid decimal64 bound", text))),
    }
}

fn format_decimal(value: Decimal, fraction_digits: u8) -> String {
    let digits = u32::from(fraction_digits);
    let mut value = value.round_dp_with_strategy(digits, RoundingStrategy::ToZero);
    value.rescale(digits);
    value.to_string()
}

/// Boundary samples of a decimal64 type, formatted to `fraction_digits`
pub fn decimal_samples(fraction_digits: u8, range: Option<&RangeFacet>) -> Result<Vec<String>> {
    if !(1..=18).contains(&fraction_digits) {
        return Err(Error::Value(format!(
            "fraction-digits {} is outside 1..18",
            fraction_digits
        )));
    }
    let numbers: Vec<Decimal> = match range {
        None => {
            let max = decimal_bound(fraction_digits, &RangeBound::Max)?;
            DECIMAL_DEFAULTS
                .iter()
                .filter_map(|d| Decimal::from_str(d).ok())
                .filter(|d| *d <= max)
                .collect()
        }
        Some(range) => match range.interval() {
            Some((lo, hi)) => {
                let a = decimal_bound(fraction_digits, lo)?;
                let b = decimal_bound(fraction_digits, hi)?;
                let sum = a
                    .checked_add(b)
                    .ok_or_else(|| Error::Value(format!("range '{}' overflows", range)))?;
                vec![a, sum / Decimal::from(2), b]
            }
            None => range
                .boundary_tokens()
                .into_iter()
                .map(|t| decimal_bound(fraction_digits, t))
                .collect::<Result<_>>()?,
        },
    };
    let mut values: Vec<String> = numbers
        .into_iter()
        .map(|d| format_decimal(d, fraction_digits))
        .collect();
    values.dedup();
    Ok(values)
}

/// Base64 samples of 1, 2 and 4 octets, fitted to a length facet
pub fn binary_samples(length: Option<&RangeFacet>) -> Vec<String> {
    let min = length.and_then(RangeFacet::min_length).unwrap_or(0);
    let max = length.and_then(RangeFacet::max_length).unwrap_or(usize::MAX);
    let mut sizes: Vec<usize> = BINARY_SIZES
        .iter()
        .copied()
        .filter(|n| (min..=max).contains(n))
        .collect();
    if sizes.is_empty() {
        sizes.push(min.min(max));
    }
    sizes
        .into_iter()
        .map(|n| {
            let bytes: Vec<u8> = (1..=n).map(|i| i as u8).collect();
            STANDARD.encode(bytes)
        })
        .collect()
}
