//! Type descriptors
//!
//! A leaf's declared type is a [`TypeSpec`]: a tagged union over the built-in
//! types, with unions and typedef indirection expressed as recursive variants.
//! Named typedefs live in the [`SchemaTree`](super::SchemaTree) and are
//! referenced by their qualified `module:name` key.

use super::builtins::{self, IntegerKind};
use super::facets::{PatternFacet, RangeFacet};
use std::fmt;

/// Refinements applied on top of a base type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Restrictions {
    /// `range` facet (integers, decimal64)
    pub range: Option<RangeFacet>,
    /// `length` facet (string, binary)
    pub length: Option<RangeFacet>,
    /// `pattern` facets (string)
    pub patterns: Vec<PatternFacet>,
    /// `fraction-digits` (decimal64)
    pub fraction_digits: Option<u8>,
}

impl Restrictions {
    /// Create an empty restriction set
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing is refined
    pub fn is_empty(&self) -> bool {
        self.range.is_none()
            && self.length.is_none()
            && self.patterns.is_empty()
            && self.fraction_digits.is_none()
    }
}

/// A type descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeSpec {
    /// int8 .. uint64
    Integer {
        /// Integer family member
        kind: IntegerKind,
        /// Optional range facet
        range: Option<RangeFacet>,
    },
    /// decimal64
    Decimal64 {
        /// Number of fraction digits (1..=18)
        fraction_digits: u8,
        /// Optional range facet
        range: Option<RangeFacet>,
    },
    /// string
    String {
        /// Optional length facet
        length: Option<RangeFacet>,
        /// Pattern facets, all of which apply
        patterns: Vec<PatternFacet>,
    },
    /// boolean
    Boolean,
    /// empty
    Empty,
    /// enumeration, names in declaration order
    Enumeration(Vec<String>),
    /// bits, names in declaration order
    Bits(Vec<String>),
    /// binary
    Binary {
        /// Optional length facet (in octets)
        length: Option<RangeFacet>,
    },
    /// identityref
    IdentityRef {
        /// Qualified base identity keys
        bases: Vec<String>,
    },
    /// instance-identifier
    InstanceIdentifier,
    /// union of member types, in declaration order
    Union(Vec<TypeSpec>),
    /// leafref
    Leafref {
        /// Path to the referenced leaf
        path: String,
        /// `require-instance`; false makes the reference non-strict
        require_instance: bool,
    },
    /// Reference to a named typedef, with local refinements
    Typedef {
        /// Qualified typedef key (`module:name`)
        name: String,
        /// Refinements declared at the point of use
        restrictions: Restrictions,
    },
}

impl TypeSpec {
    /// Unrestricted integer type
    pub fn integer(kind: IntegerKind) -> Self {
        TypeSpec::Integer { kind, range: None }
    }

    /// Unrestricted string type
    pub fn string() -> Self {
        TypeSpec::String {
            length: None,
            patterns: Vec::new(),
        }
    }

    /// Enumeration from names
    pub fn enumeration<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        TypeSpec::Enumeration(names.into_iter().map(Into::into).collect())
    }

    /// Strict leafref
    pub fn leafref(path: impl Into<String>) -> Self {
        TypeSpec::Leafref {
            path: path.into(),
            require_instance: true,
        }
    }

    /// Typedef reference without refinements
    pub fn typedef(name: impl Into<String>) -> Self {
        TypeSpec::Typedef {
            name: name.into(),
            restrictions: Restrictions::default(),
        }
    }

    /// Built-in type name (or the typedef key for references)
    pub fn name(&self) -> &str {
        match self {
            TypeSpec::Integer { kind, .. } => kind.name(),
            TypeSpec::Decimal64 { .. } => builtins::DECIMAL64,
            TypeSpec::String { .. } => builtins::STRING,
            TypeSpec::Boolean => builtins::BOOLEAN,
            TypeSpec::Empty => builtins::EMPTY,
            TypeSpec::Enumeration(_) => builtins::ENUMERATION,
            TypeSpec::Bits(_) => builtins::BITS,
            TypeSpec::Binary { .. } => builtins::BINARY,
            TypeSpec::IdentityRef { .. } => builtins::IDENTITYREF,
            TypeSpec::InstanceIdentifier => builtins::INSTANCE_IDENTIFIER,
            TypeSpec::Union(_) => builtins::UNION,
            TypeSpec::Leafref { .. } => builtins::LEAFREF,
            TypeSpec::Typedef { name, .. } => name,
        }
    }

    /// Overlay refinements onto this type, returning the refined type.
    /// Facets that do not apply to the type are ignored.
    pub fn refine(&self, restrictions: &Restrictions) -> TypeSpec {
        if restrictions.is_empty() {
            return self.clone();
        }
        match self {
            TypeSpec::Integer { kind, range } => TypeSpec::Integer {
                kind: *kind,
                range: restrictions.range.clone().or_else(|| range.clone()),
            },
            TypeSpec::Decimal64 {
                fraction_digits,
                range,
            } => TypeSpec::Decimal64 {
                fraction_digits: restrictions.fraction_digits.unwrap_or(*fraction_digits),
                range: restrictions.range.clone().or_else(|| range.clone()),
            },
            TypeSpec::String { length, patterns } => {
                let mut merged = patterns.clone();
                merged.extend(restrictions.patterns.iter().cloned());
                TypeSpec::String {
                    length: restrictions.length.clone().or_else(|| length.clone()),
                    patterns: merged,
                }
            }
            TypeSpec::Binary { length } => TypeSpec::Binary {
                length: restrictions.length.clone().or_else(|| length.clone()),
            },
            TypeSpec::Typedef {
                name,
                restrictions: inner,
            } => {
                let mut merged = inner.clone();
                if restrictions.range.is_some() {
                    merged.range = restrictions.range.clone();
                }
                if restrictions.length.is_some() {
                    merged.length = restrictions.length.clone();
                }
                if restrictions.fraction_digits.is_some() {
                    merged.fraction_digits = restrictions.fraction_digits;
                }
                merged.patterns.extend(restrictions.patterns.iter().cloned());
                TypeSpec::Typedef {
                    name: name.clone(),
                    restrictions: merged,
                }
            }
            other => other.clone(),
        }
    }

    /// Leafref paths reachable without typedef indirection (direct or in unions)
    pub fn direct_leafrefs(&self) -> Vec<(&str, bool)> {
        match self {
            TypeSpec::Leafref {
                path,
                require_instance,
            } => vec![(path.as_str(), *require_instance)],
            TypeSpec::Union(members) => members.iter().flat_map(|m| m.direct_leafrefs()).collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSpec::Integer {
                kind,
                range: Some(range),
            } => write!(f, "{} {{ range \"{}\" }}", kind, range),
            TypeSpec::Decimal64 {
                fraction_digits, ..
            } => write!(f, "decimal64 {{ fraction-digits {} }}", fraction_digits),
            TypeSpec::Enumeration(names) => write!(f, "enumeration {{ {} }}", names.join(" | ")),
            TypeSpec::Union(members) => {
                let names: Vec<String> = members.iter().map(|m| m.to_string()).collect();
                write!(f, "union {{ {} }}", names.join(", "))
            }
            TypeSpec::Leafref { path, .. } => write!(f, "leafref {{ path \"{}\" }}", path),
            other => write!(f, "{}", other.name()),
        }
    }
}

/// A named typedef
#[derive(Debug, Clone)]
pub struct Typedef {
    /// Qualified key (`module:name`)
    pub key: String,
    /// Local name
    pub name: String,
    /// Defining module
    pub module: String,
    /// Underlying type (may itself reference another typedef)
    pub base: TypeSpec,
    /// Default value declared on the typedef
    pub default: Option<String>,
}

/// An identity declaration (target of identityref)
#[derive(Debug, Clone)]
pub struct Identity {
    /// Qualified key (`module:name`)
    pub key: String,
    /// Local name
    pub name: String,
    /// Defining module
    pub module: String,
    /// Qualified keys of base identities
    pub bases: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refine_integer_range() {
        let base = TypeSpec::integer(IntegerKind::Uint16);
        let refined = base.refine(&Restrictions {
            range: Some(RangeFacet::parse("1..10").unwrap()),
            ..Default::default()
        });
        match refined {
            TypeSpec::Integer { kind, range } => {
                assert_eq!(kind, IntegerKind::Uint16);
                assert_eq!(range.unwrap().expression, "1..10");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_refine_string_accumulates_patterns() {
        let base = TypeSpec::String {
            length: None,
            patterns: vec![PatternFacet::new("[a-z]+")],
        };
        let refined = base.refine(&Restrictions {
            patterns: vec![PatternFacet::new("[a-c]+")],
            ..Default::default()
        });
        if let TypeSpec::String { patterns, .. } = refined {
            assert_eq!(patterns.len(), 2);
        } else {
            panic!("expected string");
        }
    }

    #[test]
    fn test_direct_leafrefs_in_union() {
        let spec = TypeSpec::Union(vec![
            TypeSpec::leafref("../name"),
            TypeSpec::integer(IntegerKind::Int8),
        ]);
        assert_eq!(spec.direct_leafrefs(), vec![("../name", true)]);
    }

    #[test]
    fn test_display() {
        let spec = TypeSpec::enumeration(["up", "down"]);
        assert_eq!(spec.to_string(), "enumeration { up | down }");
        assert_eq!(TypeSpec::Boolean.to_string(), "boolean");
    }
}
