//! YIN schema loading
//!
//! [`YinLoader`] compiles one or more YIN documents (the XML form of YANG)
//! into a finalized [`SchemaTree`]. Sources are collected first and compiled
//! together, so imports, groupings and augments may cross module boundaries.
//!
//! Compilation runs in four passes over all documents:
//!
//! 1. module headers: names and prefix maps (`prefix`, `import`, `belongs-to`)
//! 2. definitions: typedefs, identities and groupings
//! 3. data definitions, expanding `uses`
//! 4. top-level `augment`s, retried until every target resolves
//!
//! Statements in a foreign namespace are extensions; the ones naming a CLI
//! hint (`cli-full-command`, ...) are attached to the enclosing node.
//!
//! ```rust
//! use cfgwalk::loaders::YinLoader;
//!
//! let yin = r#"
//! <module name="demo" xmlns="urn:ietf:params:xml:ns:yang:yin:1">
//!   <prefix value="d"/>
//!   <container name="system">
//!     <leaf name="mtu"><type name="uint16"><range value="1..10"/></type></leaf>
//!   </container>
//! </module>"#;
//! let tree = YinLoader::load_str(yin).unwrap();
//! assert!(tree.find("/system/mtu").is_some());
//! ```

use crate::error::{Error, ParseError, Result};
use crate::limits::Limits;
use crate::names;
use crate::schema::builtins::{self, IntegerKind};
use crate::schema::{
    NodeId, NodeKind, PatternFacet, RangeFacet, Restrictions, SchemaBuilder, SchemaTree, TypeSpec,
};
use roxmltree::{Document, Node};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Namespace of YIN statements
pub const YIN_NAMESPACE: &str = "urn:ietf:params:xml:ns:yang:yin:1";

/// One YIN document awaiting compilation
#[derive(Debug, Clone)]
struct Source {
    name: String,
    text: String,
}

/// Loader for YIN modules
#[derive(Debug, Default)]
pub struct YinLoader {
    sources: Vec<Source>,
    limits: Limits,
}

impl YinLoader {
    /// Create a loader with default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the limits used while compiling and stored in the tree
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Add a document held in memory; `name` is used in error locations
    pub fn add_str(&mut self, name: impl Into<String>, text: impl Into<String>) -> &mut Self {
        self.sources.push(Source {
            name: name.into(),
            text: text.into(),
        });
        self
    }

    /// Add a document from a file
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        Ok(self.add_str(path.display().to_string(), text))
    }

    /// Number of documents added
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// True when no document was added
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Compile every added document into one finalized tree
    pub fn load(&self) -> Result<SchemaTree> {
        if self.sources.is_empty() {
            return Err(Error::malformed("no YIN documents to load"));
        }
        let docs = self
            .sources
            .iter()
            .map(|s| Document::parse(&s.text))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut compiler = Compiler::new(self.limits.clone());
        for (doc, source) in docs.iter().zip(&self.sources) {
            compiler.header(doc, &source.name)?;
        }
        compiler.definitions()?;
        compiler.data()?;
        compiler.augments()?;

        let tree = compiler.builder.build()?;
        tracing::info!(
            modules = tree.modules().len(),
            nodes = tree.len(),
            leaves = tree.leaves().len(),
            "schema loaded"
        );
        Ok(tree)
    }

    /// Load a single document from a file
    pub fn load_file(path: impl AsRef<Path>) -> Result<SchemaTree> {
        let mut loader = Self::new();
        loader.add_file(path)?;
        loader.load()
    }

    /// Load a single document from a string
    pub fn load_str(text: &str) -> Result<SchemaTree> {
        let mut loader = Self::new();
        loader.add_str("<string>", text);
        loader.load()
    }
}

// =============================================================================
// Statement helpers
// =============================================================================

fn is_statement(node: &Node<'_, '_>) -> bool {
    node.is_element() && matches!(node.tag_name().namespace(), None | Some(YIN_NAMESPACE))
}

fn is_extension(node: &Node<'_, '_>) -> bool {
    node.is_element() && !is_statement(node)
}

fn keyword<'a>(node: &Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

fn statements<'a, 'input>(node: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(is_statement)
}

fn substatement<'a, 'input>(node: Node<'a, 'input>, kw: &str) -> Option<Node<'a, 'input>> {
    statements(node).find(|n| keyword(n) == kw)
}

fn substatement_arg<'a>(node: Node<'a, '_>, kw: &str, attr: &str) -> Option<&'a str> {
    substatement(node, kw).and_then(|n| n.attribute(attr))
}

// =============================================================================
// Compiler
// =============================================================================

/// Per-document header information
struct Module<'a, 'input> {
    name: String,
    source: String,
    doc: &'a Document<'input>,
    prefixes: HashMap<String, String>,
}

struct Compiler<'a, 'input> {
    builder: SchemaBuilder,
    limits: Limits,
    modules: Vec<Module<'a, 'input>>,
    groupings: HashMap<String, (usize, Node<'a, 'input>)>,
}

impl<'a, 'input> Compiler<'a, 'input> {
    fn new(limits: Limits) -> Self {
        Self {
            builder: SchemaBuilder::with_limits("", limits.clone()),
            limits,
            modules: Vec::new(),
            groupings: HashMap::new(),
        }
    }

    fn root(&self, m: usize) -> Node<'a, 'input> {
        self.modules[m].doc.root_element()
    }

    fn location(&self, m: usize, node: Node<'_, '_>) -> String {
        let module = &self.modules[m];
        let pos = module.doc.text_pos_at(node.range().start);
        format!("{}:{}:{}", module.source, pos.row, pos.col)
    }

    fn malformed(&self, m: usize, node: Node<'_, '_>, message: impl Into<String>) -> Error {
        Error::MalformedInput(ParseError::new(message).with_source(self.location(m, node)))
    }

    /// Attach the statement location to builder errors that lack one
    fn locate(&self, m: usize, node: Node<'_, '_>, err: Error) -> Error {
        match err {
            Error::MalformedInput(pe) if pe.source.is_none() => {
                Error::MalformedInput(pe.with_source(self.location(m, node)))
            }
            other => other,
        }
    }

    fn arg(&self, m: usize, node: Node<'a, 'input>, attr: &str) -> Result<&'a str> {
        node.attribute(attr).ok_or_else(|| {
            self.malformed(
                m,
                node,
                format!("<{}> is missing its '{}' argument", keyword(&node), attr),
            )
        })
    }

    /// Qualify a definition reference as `module:name`
    fn qualify(&self, m: usize, node: Node<'_, '_>, reference: &str) -> Result<String> {
        match names::split_qname(reference) {
            (Some(prefix), local) => match self.modules[m].prefixes.get(prefix) {
                Some(module) => Ok(format!("{}:{}", module, local)),
                None => Err(self.malformed(m, node, format!("unknown prefix '{}'", prefix))),
            },
            (None, local) => Ok(format!("{}:{}", self.modules[m].name, local)),
        }
    }

    // -------------------------------------------------------------------------
    // Pass 1: headers
    // -------------------------------------------------------------------------

    fn header(&mut self, doc: &'a Document<'input>, source: &str) -> Result<()> {
        let root = doc.root_element();
        self.modules.push(Module {
            name: String::new(),
            source: source.to_string(),
            doc,
            prefixes: HashMap::new(),
        });
        let m = self.modules.len() - 1;

        let (name, prefix) = match keyword(&root) {
            "module" => {
                let name = self.arg(m, root, "name")?.to_string();
                let prefix = substatement_arg(root, "prefix", "value");
                (name, prefix)
            }
            "submodule" => {
                let belongs = substatement(root, "belongs-to")
                    .ok_or_else(|| self.malformed(m, root, "submodule without belongs-to"))?;
                let name = self.arg(m, belongs, "module")?.to_string();
                (name, substatement_arg(belongs, "prefix", "value"))
            }
            other => {
                return Err(self.malformed(
                    m,
                    root,
                    format!("expected <module> or <submodule>, found <{}>", other),
                ))
            }
        };
        names::validate_identifier(&name)
            .map_err(|_| self.malformed(m, root, format!("invalid module name '{}'", name)))?;

        let mut prefixes = HashMap::new();
        if let Some(prefix) = prefix {
            prefixes.insert(prefix.to_string(), name.clone());
        }
        for import in statements(root).filter(|n| keyword(n) == "import") {
            let imported = self.arg(m, import, "module")?;
            let prefix = substatement_arg(import, "prefix", "value")
                .ok_or_else(|| self.malformed(m, import, "import without prefix"))?;
            prefixes.insert(prefix.to_string(), imported.to_string());
        }

        let module = &mut self.modules[m];
        module.name = name;
        module.prefixes = prefixes;
        tracing::debug!(module = %module.name, source = %module.source, "module header read");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Pass 2: typedefs, identities, groupings
    // -------------------------------------------------------------------------

    fn definitions(&mut self) -> Result<()> {
        for m in 0..self.modules.len() {
            let root = self.root(m);
            let name = self.modules[m].name.clone();
            self.builder.set_module(name);

            for grouping in root
                .descendants()
                .filter(|n| is_statement(n) && keyword(n) == "grouping")
            {
                let name = self.arg(m, grouping, "name")?;
                let key = self.qualify(m, grouping, name)?;
                if self.groupings.insert(key.clone(), (m, grouping)).is_some() {
                    return Err(self.malformed(m, grouping, format!("duplicate grouping '{}'", key)));
                }
            }

            for typedef in root
                .descendants()
                .filter(|n| is_statement(n) && keyword(n) == "typedef")
            {
                let name = self.arg(m, typedef, "name")?;
                let type_stmt = substatement(typedef, "type")
                    .ok_or_else(|| self.malformed(m, typedef, format!("typedef '{}' has no type", name)))?;
                let base = self.parse_type(m, type_stmt)?;
                let default = substatement_arg(typedef, "default", "value").map(str::to_string);
                self.builder
                    .typedef_with_default(name, base, default)
                    .map_err(|e| self.locate(m, typedef, e))?;
            }

            for identity in statements(root).filter(|n| keyword(n) == "identity") {
                let name = self.arg(m, identity, "name")?;
                let mut bases = Vec::new();
                for base in statements(identity).filter(|n| keyword(n) == "base") {
                    bases.push(self.qualify(m, base, self.arg(m, base, "name")?)?);
                }
                let bases: Vec<&str> = bases.iter().map(String::as_str).collect();
                self.builder
                    .identity(name, &bases)
                    .map_err(|e| self.locate(m, identity, e))?;
            }
        }
        Ok(())
    }

    fn parse_type(&self, m: usize, stmt: Node<'a, 'input>) -> Result<TypeSpec> {
        let name = self.arg(m, stmt, "name")?;
        let mut restrictions = Restrictions::default();
        for s in statements(stmt) {
            match keyword(&s) {
                "range" => restrictions.range = Some(RangeFacet::parse(self.arg(m, s, "value")?)?),
                "length" => restrictions.length = Some(RangeFacet::parse(self.arg(m, s, "value")?)?),
                "pattern" => restrictions.patterns.push(PatternFacet::new(self.arg(m, s, "value")?)),
                "fraction-digits" => {
                    let text = self.arg(m, s, "value")?;
                    let digits = text.parse::<u8>().map_err(|_| {
                        self.malformed(m, s, format!("invalid fraction-digits '{}'", text))
                    })?;
                    restrictions.fraction_digits = Some(digits);
                }
                _ => {}
            }
        }

        let (prefix, local) = names::split_qname(name);
        if prefix.is_some() || !builtins::is_builtin(local) {
            return Ok(TypeSpec::Typedef {
                name: self.qualify(m, stmt, name)?,
                restrictions,
            });
        }

        let named = |kw: &str| -> Result<Vec<String>> {
            statements(stmt)
                .filter(|n| keyword(n) == kw)
                .map(|n| self.arg(m, n, "name").map(str::to_string))
                .collect()
        };

        if let Some(kind) = IntegerKind::from_name(local) {
            return Ok(TypeSpec::Integer {
                kind,
                range: restrictions.range,
            });
        }
        let spec = match local {
            builtins::DECIMAL64 => TypeSpec::Decimal64 {
                fraction_digits: restrictions
                    .fraction_digits
                    .ok_or_else(|| self.malformed(m, stmt, "decimal64 without fraction-digits"))?,
                range: restrictions.range,
            },
            builtins::STRING => TypeSpec::String {
                length: restrictions.length,
                patterns: restrictions.patterns,
            },
            builtins::BOOLEAN => TypeSpec::Boolean,
            builtins::EMPTY => TypeSpec::Empty,
            builtins::ENUMERATION => TypeSpec::Enumeration(named("enum")?),
            builtins::BITS => TypeSpec::Bits(named("bit")?),
            builtins::BINARY => TypeSpec::Binary {
                length: restrictions.length,
            },
            builtins::IDENTITYREF => {
                let mut bases = Vec::new();
                for base in statements(stmt).filter(|n| keyword(n) == "base") {
                    bases.push(self.qualify(m, base, self.arg(m, base, "name")?)?);
                }
                if bases.is_empty() {
                    return Err(self.malformed(m, stmt, "identityref without base"));
                }
                TypeSpec::IdentityRef { bases }
            }
            builtins::INSTANCE_IDENTIFIER => TypeSpec::InstanceIdentifier,
            builtins::UNION => {
                let members = statements(stmt)
                    .filter(|n| keyword(n) == "type")
                    .map(|n| self.parse_type(m, n))
                    .collect::<Result<Vec<_>>>()?;
                if members.is_empty() {
                    return Err(self.malformed(m, stmt, "union without member types"));
                }
                TypeSpec::Union(members)
            }
            builtins::LEAFREF => {
                let path = substatement_arg(stmt, "path", "value")
                    .ok_or_else(|| self.malformed(m, stmt, "leafref without path"))?;
                let require_instance = substatement_arg(stmt, "require-instance", "value")
                    .map_or(true, |v| v != "false");
                TypeSpec::Leafref {
                    path: path.to_string(),
                    require_instance,
                }
            }
            other => {
                return Err(self.malformed(m, stmt, format!("unhandled built-in type '{}'", other)))
            }
        };
        Ok(spec)
    }

    // -------------------------------------------------------------------------
    // Pass 3: data definitions
    // -------------------------------------------------------------------------

    fn data(&mut self) -> Result<()> {
        for m in 0..self.modules.len() {
            let name = self.modules[m].name.clone();
            self.builder.set_module(name);
            let root = self.root(m);
            self.data_defs(m, None, root, 1)?;
        }
        Ok(())
    }

    /// Compile the data definition substatements of `stmt` below `parent`,
    /// returning the nodes created directly (after `uses` expansion)
    fn data_defs(
        &mut self,
        m: usize,
        parent: Option<NodeId>,
        stmt: Node<'a, 'input>,
        depth: usize,
    ) -> Result<Vec<NodeId>> {
        let mut created = Vec::new();
        for child in statements(stmt) {
            match keyword(&child) {
                "container" | "list" | "leaf" | "leaf-list" | "choice" | "case" => {
                    created.push(self.data_node(m, parent, child, depth)?);
                }
                "uses" => created.extend(self.uses(m, parent, child, depth)?),
                kw @ ("anydata" | "anyxml") => {
                    tracing::debug!(statement = kw, location = %self.location(m, child), "skipping");
                }
                _ => {}
            }
        }
        Ok(created)
    }

    fn data_node(
        &mut self,
        m: usize,
        parent: Option<NodeId>,
        stmt: Node<'a, 'input>,
        depth: usize,
    ) -> Result<NodeId> {
        self.limits
            .check_schema_depth(depth)
            .map_err(|e| self.locate(m, stmt, e))?;
        let kw = keyword(&stmt);
        let kind = NodeKind::from_keyword(kw)
            .ok_or_else(|| self.malformed(m, stmt, format!("<{}> is not a data node", kw)))?;
        let name = self.arg(m, stmt, "name")?;
        let id = self
            .builder
            .child(parent, name, kind)
            .map_err(|e| self.locate(m, stmt, e))?;

        for s in stmt.children().filter(Node::is_element) {
            if is_extension(&s) {
                let extension = keyword(&s);
                if !self.builder.hint(id, extension) {
                    tracing::trace!(extension, location = %self.location(m, s), "extension ignored");
                }
                continue;
            }
            match keyword(&s) {
                "type" => {
                    let spec = self.parse_type(m, s)?;
                    self.builder.type_spec(id, spec);
                }
                "when" => {
                    let condition = self.arg(m, s, "condition")?;
                    self.builder.when(id, condition);
                }
                "must" => {
                    let condition = self.arg(m, s, "condition")?;
                    self.builder.must(id, condition);
                }
                "mandatory" => {
                    let mandatory = self.arg(m, s, "value")? == "true";
                    self.builder.mandatory(id, mandatory);
                }
                "presence" => {
                    self.builder.presence(id);
                }
                "config" => {
                    let config = self.arg(m, s, "value")? != "false";
                    self.builder.config(id, config);
                }
                "default" => {
                    let value = self.arg(m, s, "value")?;
                    if self.builder.node(id).default.is_none() {
                        self.builder.default_value(id, value);
                    }
                }
                "key" => {
                    let keys: Vec<&str> = self.arg(m, s, "value")?.split_whitespace().collect();
                    self.builder.keys(id, &keys);
                }
                _ => {}
            }
        }

        if kind.is_leaf() && self.builder.node(id).type_spec.is_none() {
            return Err(self.malformed(m, stmt, format!("{} '{}' has no type", kind, name)));
        }
        self.data_defs(m, Some(id), stmt, depth + 1)?;
        Ok(id)
    }

    fn uses(
        &mut self,
        m: usize,
        parent: Option<NodeId>,
        stmt: Node<'a, 'input>,
        depth: usize,
    ) -> Result<Vec<NodeId>> {
        self.limits
            .check_schema_depth(depth)
            .map_err(|e| self.locate(m, stmt, e))?;
        let key = self.qualify(m, stmt, self.arg(m, stmt, "name")?)?;
        let (gm, grouping) = self
            .groupings
            .get(&key)
            .copied()
            .ok_or_else(|| self.malformed(m, stmt, format!("unknown grouping '{}'", key)))?;

        let created = self.data_defs(gm, parent, grouping, depth + 1)?;
        for s in statements(stmt) {
            match keyword(&s) {
                "when" => {
                    let condition = self.arg(m, s, "condition")?;
                    for &id in &created {
                        self.builder.when(id, condition);
                    }
                }
                kw @ ("refine" | "augment") => {
                    tracing::debug!(grouping = %key, statement = kw, "uses substatement ignored");
                }
                _ => {}
            }
        }
        Ok(created)
    }

    // -------------------------------------------------------------------------
    // Pass 4: augments
    // -------------------------------------------------------------------------

    fn augments(&mut self) -> Result<()> {
        let mut pending: Vec<(usize, Node<'a, 'input>)> = Vec::new();
        for m in 0..self.modules.len() {
            let root = self.root(m);
            pending.extend(statements(root).filter(|n| keyword(n) == "augment").map(|n| (m, n)));
        }

        // augments may target nodes added by other augments
        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();
            for (m, stmt) in pending {
                let target_path = self.augment_target(m, stmt)?;
                match self.builder.tree().find(&target_path) {
                    Some(target) => self.augment(m, target, stmt)?,
                    None => deferred.push((m, stmt)),
                }
            }
            if deferred.len() == before {
                let (m, stmt) = deferred[0];
                let target = self.augment_target(m, stmt)?;
                return Err(self.malformed(m, stmt, format!("augment target '{}' not found", target)));
            }
            pending = deferred;
        }
        Ok(())
    }

    /// Absolute schema path of an augment target, prefixes stripped
    fn augment_target(&self, m: usize, stmt: Node<'a, 'input>) -> Result<String> {
        let target = self.arg(m, stmt, "target-node")?;
        if !target.starts_with('/') {
            return Err(self.malformed(
                m,
                stmt,
                format!("augment target '{}' is not absolute", target),
            ));
        }
        let steps: Vec<&str> = target
            .split('/')
            .filter(|s| !s.is_empty())
            .map(names::local_name)
            .collect();
        Ok(format!("/{}", steps.join("/")))
    }

    fn augment(&mut self, m: usize, target: NodeId, stmt: Node<'a, 'input>) -> Result<()> {
        let name = self.modules[m].name.clone();
        self.builder.set_module(name);
        let depth = self.builder.tree().depth(target) + 2;
        let created = self.data_defs(m, Some(target), stmt, depth)?;
        for s in statements(stmt).filter(|n| keyword(n) == "when") {
            let condition = self.arg(m, s, "condition")?;
            for &id in &created {
                self.builder.when(id, condition);
            }
        }
        tracing::debug!(
            target = %self.builder.tree().node(target).path,
            nodes = created.len(),
            "augment applied"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn module(body: &str) -> String {
        format!(
            r#"<module name="m" xmlns="{}" xmlns:x="urn:example:ext">
                 <prefix value="m"/>
                 {}
               </module>"#,
            YIN_NAMESPACE, body
        )
    }

    #[test]
    fn test_containers_and_leaves() {
        let tree = YinLoader::load_str(&module(
            r#"<container name="system">
                 <leaf name="hostname"><type name="string"/></leaf>
                 <leaf name="mtu"><type name="uint16"><range value="68..9000"/></type></leaf>
               </container>"#,
        ))
        .unwrap();
        let mtu = tree.find("/system/mtu").unwrap();
        match tree.node(mtu).type_spec.as_ref().unwrap() {
            TypeSpec::Integer { kind, range } => {
                assert_eq!(*kind, IntegerKind::Uint16);
                assert_eq!(range.as_ref().unwrap().expression, "68..9000");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(tree.leaves().len(), 2);
    }

    #[test]
    fn test_choice_shorthand_gets_implicit_case() {
        let tree = YinLoader::load_str(&module(
            r#"<choice name="mode">
                 <leaf name="auto"><type name="empty"/></leaf>
                 <case name="manual">
                   <leaf name="speed"><type name="uint32"/></leaf>
                 </case>
               </choice>"#,
        ))
        .unwrap();
        let auto = tree.find("/mode/auto/auto").unwrap();
        assert_eq!(tree.node(auto).data_path, "/auto");
        assert!(tree.find("/mode/manual/speed").is_some());
    }

    #[test]
    fn test_typedef_and_prefixed_reference() {
        let tree = YinLoader::load_str(&module(
            r#"<typedef name="percent">
                 <type name="uint8"><range value="0..100"/></type>
               </typedef>
               <leaf name="load"><type name="m:percent"/></leaf>"#,
        ))
        .unwrap();
        let load = tree.find("/load").unwrap();
        let resolved = tree
            .resolve_type(tree.node(load).type_spec.as_ref().unwrap())
            .unwrap();
        assert!(matches!(resolved, TypeSpec::Integer { kind: IntegerKind::Uint8, .. }));
    }

    #[test]
    fn test_grouping_and_uses_with_when() {
        let tree = YinLoader::load_str(&module(
            r#"<grouping name="addr">
                 <leaf name="ip"><type name="string"/></leaf>
               </grouping>
               <container name="a">
                 <leaf name="on"><type name="boolean"/></leaf>
                 <uses name="addr"><when condition="on = 'true'"/></uses>
               </container>"#,
        ))
        .unwrap();
        let ip = tree.find("/a/ip").unwrap();
        assert_eq!(tree.node(ip).when, vec!["on = 'true'".to_string()]);
        assert!(tree.find("/addr").is_none());
    }

    #[test]
    fn test_list_keys_constraints_and_hints() {
        let tree = YinLoader::load_str(&module(
            r#"<list name="iface">
                 <key value="name"/>
                 <x:cli-compact-syntax/>
                 <leaf name="name"><type name="string"/></leaf>
                 <leaf name="shutdown">
                   <type name="empty"/>
                   <x:cli-full-command/>
                   <must condition="../name"/>
                 </leaf>
                 <leaf name="counter"><type name="uint64"/><config value="false"/></leaf>
               </list>"#,
        ))
        .unwrap();
        let list = tree.find("/iface").unwrap();
        let name = tree.find("/iface/name").unwrap();
        let shutdown = tree.find("/iface/shutdown").unwrap();
        let counter = tree.find("/iface/counter").unwrap();
        assert_eq!(tree.node(list).keys, vec![name]);
        assert!(tree.node(name).is_key);
        assert!(tree.node(list).hints.compact_syntax);
        assert!(tree.node(shutdown).hints.full_command);
        assert_eq!(tree.node(shutdown).must.len(), 1);
        assert!(!tree.node(counter).config);
    }

    #[test]
    fn test_identities_and_leafref() {
        let tree = YinLoader::load_str(&module(
            r#"<identity name="proto"/>
               <identity name="tcp"><base name="proto"/></identity>
               <identity name="udp"><base name="m:proto"/></identity>
               <leaf name="p"><type name="identityref"><base name="proto"/></type></leaf>
               <container name="c">
                 <leaf name="target"><type name="string"/></leaf>
                 <leaf name="ref">
                   <type name="leafref">
                     <path value="../target"/>
                     <require-instance value="false"/>
                   </type>
                 </leaf>
               </container>"#,
        ))
        .unwrap();
        let keys: Vec<&str> = tree
            .derived_identities("m:proto")
            .iter()
            .map(|i| i.key.as_str())
            .collect();
        assert_eq!(keys, vec!["m:tcp", "m:udp"]);
        let r = tree.find("/c/ref").unwrap();
        assert_eq!(tree.node(r).leafref_target, tree.find("/c/target"));
        assert!(!tree.node(r).leafref_strict);
    }

    #[test]
    fn test_augment_across_modules() {
        let base = module(r#"<container name="sys"/>"#);
        let ext = format!(
            r#"<module name="ext" xmlns="{}">
                 <prefix value="e"/>
                 <import module="m"><prefix value="base"/></import>
                 <augment target-node="/base:sys">
                   <leaf name="extra"><type name="boolean"/></leaf>
                 </augment>
               </module>"#,
            YIN_NAMESPACE
        );
        let mut loader = YinLoader::new();
        loader.add_str("ext.yin", ext).add_str("m.yin", base);
        let tree = loader.load().unwrap();
        let extra = tree.find("/sys/extra").unwrap();
        assert_eq!(tree.node(extra).module, "ext");
    }

    #[test]
    fn test_structural_errors() {
        let missing_type = YinLoader::load_str(&module(r#"<leaf name="x"/>"#));
        assert!(matches!(missing_type, Err(Error::MalformedInput(_))));

        let unknown_grouping = YinLoader::load_str(&module(r#"<uses name="nope"/>"#));
        assert!(matches!(unknown_grouping, Err(Error::MalformedInput(_))));

        let bad_target = YinLoader::load_str(&module(
            r#"<augment target-node="/nowhere"><leaf name="x"><type name="string"/></leaf></augment>"#,
        ));
        assert!(matches!(bad_target, Err(Error::MalformedInput(_))));

        assert!(matches!(YinLoader::load_str("<module"), Err(Error::Xml(_))));
    }

    #[test]
    fn test_recursive_uses_hits_depth_limit() {
        let result = YinLoader::load_str(&module(
            r#"<grouping name="loop">
                 <container name="c"><uses name="loop"/></container>
               </grouping>
               <uses name="loop"/>"#,
        ));
        assert!(matches!(result, Err(Error::LimitExceeded(_))));
    }

    #[test]
    fn test_error_carries_location() {
        let err = YinLoader::load_str(&module(r#"<leaf name="x"><type name="q:t"/></leaf>"#))
            .unwrap_err();
        match err {
            Error::MalformedInput(pe) => {
                assert!(pe.message.contains("unknown prefix"));
                assert!(pe.source.unwrap().starts_with("<string>:"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
