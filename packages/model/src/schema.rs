use crate::content::ContentMatch;
use crate::error::{ModelError, ModelResult};
use crate::fragment::Fragment;
use crate::mark::Mark;
use crate::node::Node;
use crate::spec::{MarkSpec, NodeSpec, Whitespace};
use quire_codec::Attrs;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Name of the text node type every schema defines
pub const TEXT_TYPE: &str = "text";

/// Input to [`Schema::new`]: ordered node and mark declarations
#[derive(Debug, Clone, Default)]
pub struct SchemaSpec {
    pub nodes: Vec<(String, NodeSpec)>,
    pub marks: Vec<(String, MarkSpec)>,
    /// Defaults to `doc`
    pub top_node: Option<String>,
}

pub struct NodeType {
    name: String,
    spec: NodeSpec,
    groups: Vec<String>,
    content_match: ContentMatch,
    inline_content: bool,
    /// `None` allows every mark
    mark_set: Option<Vec<String>>,
}

impl NodeType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &NodeSpec {
        &self.spec
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn is_in_group(&self, group: &str) -> bool {
        self.groups.iter().any(|g| g == group)
    }

    pub fn is_text(&self) -> bool {
        self.name == TEXT_TYPE
    }

    pub fn is_inline(&self) -> bool {
        self.spec.inline || self.is_text()
    }

    pub fn is_block(&self) -> bool {
        !self.is_inline()
    }

    pub fn is_leaf(&self) -> bool {
        self.spec.is_leaf()
    }

    pub fn is_atom(&self) -> bool {
        self.is_leaf() || self.spec.atom
    }

    pub fn inline_content(&self) -> bool {
        self.inline_content
    }

    pub fn is_textblock(&self) -> bool {
        self.is_block() && self.inline_content
    }

    pub fn whitespace(&self) -> Whitespace {
        if self.spec.code {
            Whitespace::Pre
        } else {
            self.spec.whitespace
        }
    }

    pub fn content_match(&self) -> &ContentMatch {
        &self.content_match
    }

    pub fn has_required_attrs(&self) -> bool {
        self.spec.attrs.iter().any(|(_, spec)| spec.is_required())
    }

    pub fn allows_mark_type(&self, mark: &str) -> bool {
        match &self.mark_set {
            None => true,
            Some(allowed) => allowed.iter().any(|m| m == mark),
        }
    }

    pub fn allows_marks(&self, marks: &[Mark]) -> bool {
        marks.iter().all(|m| self.allows_mark_type(m.type_name()))
    }

    /// Attribute map with defaults filled in
    pub fn compute_attrs(&self, attrs: &Attrs) -> ModelResult<Attrs> {
        self.spec
            .attrs
            .compute(attrs)
            .map_err(|attr| ModelError::MissingAttribute {
                type_name: self.name.clone(),
                attr,
            })
    }

    /// Whether `content` satisfies this type's content expression and mark allowance
    pub fn valid_content(&self, content: &Fragment) -> bool {
        let Some(end) = self.content_match.match_types(&content.type_names()) else {
            return false;
        };
        end.valid_end() && content.iter().all(|child| self.allows_marks(child.marks()))
    }
}

impl fmt::Debug for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeType({})", self.name)
    }
}

pub struct MarkType {
    name: String,
    spec: MarkSpec,
    rank: usize,
    excluded: Vec<String>,
}

impl MarkType {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &MarkSpec {
        &self.spec
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn excludes(&self, other: &MarkType) -> bool {
        self.excluded.iter().any(|m| m == &other.name)
    }

    pub fn compute_attrs(&self, attrs: &Attrs) -> ModelResult<Attrs> {
        self.spec
            .attrs
            .compute(attrs)
            .map_err(|attr| ModelError::MissingAttribute {
                type_name: self.name.clone(),
                attr,
            })
    }
}

impl fmt::Debug for MarkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MarkType({})", self.name)
    }
}

/// A closed set of node and mark types with one top node type
pub struct Schema {
    nodes: Vec<Arc<NodeType>>,
    node_index: HashMap<String, usize>,
    marks: Vec<Arc<MarkType>>,
    mark_index: HashMap<String, usize>,
    top_node: String,
}

impl Schema {
    pub fn new(spec: SchemaSpec) -> ModelResult<Schema> {
        let top_node = spec.top_node.clone().unwrap_or_else(|| "doc".to_string());

        let mut node_groups: Vec<(String, Vec<String>)> = Vec::new();
        for (name, node) in &spec.nodes {
            if node_groups.iter().any(|(n, _)| n == name) {
                return Err(ModelError::DuplicateType(name.clone()));
            }
            node_groups.push((name.clone(), split_names(node.group.as_deref())));
        }
        if !node_groups.iter().any(|(n, _)| n == TEXT_TYPE) {
            return Err(ModelError::MissingTextType);
        }
        if !node_groups.iter().any(|(n, _)| *n == top_node) {
            return Err(ModelError::MissingTopNode(top_node));
        }

        let resolve_node = |name: &str| -> Option<Vec<String>> {
            if node_groups.iter().any(|(n, _)| n == name) {
                return Some(vec![name.to_string()]);
            }
            let members: Vec<String> = node_groups
                .iter()
                .filter(|(_, groups)| groups.iter().any(|g| g == name))
                .map(|(n, _)| n.clone())
                .collect();
            (!members.is_empty()).then_some(members)
        };

        let mut mark_groups: Vec<(String, Vec<String>)> = Vec::new();
        for (name, mark) in &spec.marks {
            if mark_groups.iter().any(|(n, _)| n == name) {
                return Err(ModelError::DuplicateType(name.clone()));
            }
            mark_groups.push((name.clone(), split_names(mark.group.as_deref())));
        }
        let resolve_marks = |expr: &str| -> ModelResult<Vec<String>> {
            let mut out = Vec::new();
            for name in expr.split_whitespace() {
                if name == "_" {
                    return Ok(mark_groups.iter().map(|(n, _)| n.clone()).collect());
                }
                let members: Vec<String> = mark_groups
                    .iter()
                    .filter(|(n, groups)| n == name || groups.iter().any(|g| g == name))
                    .map(|(n, _)| n.clone())
                    .collect();
                if members.is_empty() {
                    return Err(ModelError::UnknownMarkType(name.to_string()));
                }
                out.extend(members);
            }
            Ok(out)
        };

        let inline_names: Vec<&str> = spec
            .nodes
            .iter()
            .filter(|(name, node)| node.inline || name == TEXT_TYPE)
            .map(|(name, _)| name.as_str())
            .collect();

        let mut nodes = Vec::with_capacity(spec.nodes.len());
        let mut node_index = HashMap::new();
        for (i, (name, node)) in spec.nodes.iter().enumerate() {
            let content_match = match node.content.as_deref() {
                Some(expr) if !expr.trim().is_empty() => ContentMatch::compile(expr, &resolve_node)?,
                _ => ContentMatch::empty(),
            };
            let inline_content = content_match
                .all_types()
                .iter()
                .any(|t| inline_names.contains(t));
            let mark_set = match node.marks.as_deref() {
                Some("_") => None,
                Some(expr) => Some(resolve_marks(expr)?),
                None if inline_content => None,
                None => Some(Vec::new()),
            };
            node_index.insert(name.clone(), i);
            nodes.push(Arc::new(NodeType {
                name: name.clone(),
                spec: node.clone(),
                groups: split_names(node.group.as_deref()),
                content_match,
                inline_content,
                mark_set,
            }));
        }

        let mut marks = Vec::with_capacity(spec.marks.len());
        let mut mark_index = HashMap::new();
        for (rank, (name, mark)) in spec.marks.iter().enumerate() {
            let excluded = match mark.excludes.as_deref() {
                None => vec![name.clone()],
                Some(expr) => resolve_marks(expr)?,
            };
            mark_index.insert(name.clone(), rank);
            marks.push(Arc::new(MarkType {
                name: name.clone(),
                spec: mark.clone(),
                rank,
                excluded,
            }));
        }

        tracing::debug!(
            nodes = nodes.len(),
            marks = marks.len(),
            top_node = %top_node,
            "schema created"
        );

        Ok(Schema {
            nodes,
            node_index,
            marks,
            mark_index,
            top_node,
        })
    }

    pub fn node_type(&self, name: &str) -> Option<&Arc<NodeType>> {
        self.node_index.get(name).map(|i| &self.nodes[*i])
    }

    pub fn mark_type(&self, name: &str) -> Option<&Arc<MarkType>> {
        self.mark_index.get(name).map(|i| &self.marks[*i])
    }

    fn require_node_type(&self, name: &str) -> ModelResult<&Arc<NodeType>> {
        self.node_type(name)
            .ok_or_else(|| ModelError::UnknownNodeType(name.to_string()))
    }

    /// Node types in declaration order
    pub fn node_types(&self) -> &[Arc<NodeType>] {
        &self.nodes
    }

    /// Mark types in declaration (rank) order
    pub fn mark_types(&self) -> &[Arc<MarkType>] {
        &self.marks
    }

    pub fn top_node_name(&self) -> &str {
        &self.top_node
    }

    pub fn top_node_type(&self) -> &Arc<NodeType> {
        &self.nodes[self.node_index[&self.top_node]]
    }

    /// Create a node, checking its content
    pub fn node(&self, type_name: &str, attrs: Attrs, content: Vec<Node>, marks: Vec<Mark>) -> ModelResult<Node> {
        let node_type = self.require_node_type(type_name)?;
        let content = Fragment::from_vec(content);
        if !node_type.valid_content(&content) {
            return Err(ModelError::InvalidContent {
                type_name: type_name.to_string(),
            });
        }
        let attrs = node_type.compute_attrs(&attrs)?;
        Ok(Node::new(node_type.clone(), attrs, content, marks))
    }

    /// Create a node without checking its content
    pub fn node_unchecked(&self, type_name: &str, attrs: Attrs, content: Vec<Node>, marks: Vec<Mark>) -> ModelResult<Node> {
        let node_type = self.require_node_type(type_name)?;
        let attrs = node_type.compute_attrs(&attrs)?;
        Ok(Node::new(node_type.clone(), attrs, Fragment::from_vec(content), marks))
    }

    /// Text node. Empty text is not allowed in documents, callers skip it.
    pub fn text(&self, text: impl Into<String>, marks: Vec<Mark>) -> ModelResult<Node> {
        let node_type = self.require_node_type(TEXT_TYPE)?;
        Ok(Node::new_text(node_type.clone(), text.into(), marks))
    }

    pub fn mark(&self, type_name: &str, attrs: Attrs) -> ModelResult<Mark> {
        let mark_type = self
            .mark_type(type_name)
            .ok_or_else(|| ModelError::UnknownMarkType(type_name.to_string()))?;
        let attrs = mark_type.compute_attrs(&attrs)?;
        Ok(Mark::new(mark_type.clone(), attrs))
    }

    /// Whether a node of this type can be created with no input
    pub fn is_fillable(&self, type_name: &str) -> bool {
        self.node_type(type_name)
            .map(|t| !t.is_text() && !t.has_required_attrs())
            .unwrap_or(false)
    }

    /// Create a node, inserting the minimal content needed to make it valid
    pub fn create_and_fill(&self, type_name: &str, attrs: Attrs, content: Vec<Node>) -> ModelResult<Node> {
        let node_type = self.require_node_type(type_name)?;
        let content = Fragment::from_vec(content);
        let fillable = |name: &str| self.is_fillable(name);
        let types = content.type_names();

        let before = node_type
            .content_match()
            .fill_before(&types, false, &fillable)
            .ok_or_else(|| ModelError::InvalidContent {
                type_name: type_name.to_string(),
            })?;
        let start = node_type
            .content_match()
            .match_types(&before)
            .and_then(|m| m.match_types(&types))
            .ok_or_else(|| ModelError::InvalidContent {
                type_name: type_name.to_string(),
            })?;
        let after = start
            .fill_before::<&str>(&[], true, &fillable)
            .ok_or_else(|| ModelError::InvalidContent {
                type_name: type_name.to_string(),
            })?;

        let mut children = Vec::new();
        for name in &before {
            children.push(self.create_and_fill(name, Attrs::new(), Vec::new())?);
        }
        children.extend(content.iter().cloned());
        for name in &after {
            children.push(self.create_and_fill(name, Attrs::new(), Vec::new())?);
        }
        self.node(type_name, attrs, children, Vec::new())
    }

    /// The first textblock type that can be created with no input
    pub fn default_textblock(&self) -> Option<&Arc<NodeType>> {
        self.nodes
            .iter()
            .find(|t| t.is_textblock() && !t.has_required_attrs())
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("nodes", &self.nodes.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("marks", &self.marks.iter().map(|t| t.name()).collect::<Vec<_>>())
            .field("top_node", &self.top_node)
            .finish()
    }
}

fn split_names(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| v.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quire_codec::AttributeSpec;

    fn spec() -> SchemaSpec {
        SchemaSpec {
            nodes: vec![
                ("doc".to_string(), NodeSpec::new().content("block+")),
                ("p".to_string(), NodeSpec::new().content("inline*").group("block")),
                ("list".to_string(), NodeSpec::new().content("item+").group("block")),
                ("item".to_string(), NodeSpec::new().content("p block*")),
                (
                    "img".to_string(),
                    NodeSpec::new()
                        .inline()
                        .group("inline")
                        .attr("src", AttributeSpec::required()),
                ),
                ("text".to_string(), NodeSpec::new().group("inline")),
            ],
            marks: vec![
                ("em".to_string(), MarkSpec::new()),
                ("note".to_string(), MarkSpec::new().excludes("").attr("id", AttributeSpec::optional())),
            ],
            top_node: None,
        }
    }

    #[test]
    fn test_type_flags() {
        let schema = Schema::new(spec()).unwrap();
        let p = schema.node_type("p").unwrap();
        assert!(p.is_textblock());
        assert!(p.allows_mark_type("em"));
        let list = schema.node_type("list").unwrap();
        assert!(!list.inline_content());
        assert!(!list.allows_mark_type("em"));
        assert!(schema.node_type("img").unwrap().is_leaf());
        assert_eq!(schema.default_textblock().map(|t| t.name()), Some("p"));
    }

    #[test]
    fn test_create_and_fill() {
        let schema = Schema::new(spec()).unwrap();
        let doc = schema.create_and_fill("doc", Attrs::new(), Vec::new()).unwrap();
        assert_eq!(doc.child_count(), 1);
        assert_eq!(doc.child(0).map(|c| c.type_name().to_string()), Some("p".to_string()));

        let list = schema.create_and_fill("list", Attrs::new(), Vec::new()).unwrap();
        assert_eq!(list.to_string(), "list(item(p))");
    }

    #[test]
    fn test_node_checks_content() {
        let schema = Schema::new(spec()).unwrap();
        assert!(matches!(
            schema.node("doc", Attrs::new(), Vec::new(), Vec::new()),
            Err(ModelError::InvalidContent { .. })
        ));
        assert!(matches!(
            schema.node("img", Attrs::new(), Vec::new(), Vec::new()),
            Err(ModelError::MissingAttribute { .. })
        ));
    }

    #[test]
    fn test_mark_exclusion() {
        let schema = Schema::new(spec()).unwrap();
        let em = schema.mark("em", Attrs::new()).unwrap();
        let note_a = schema.mark("note", quire_codec::attrs([("id", "a")])).unwrap();
        let note_b = schema.mark("note", quire_codec::attrs([("id", "b")])).unwrap();

        let set = note_a.add_to_set(&[]);
        let set = note_b.add_to_set(&set);
        assert_eq!(set.len(), 2);
        let set = em.add_to_set(&set);
        assert_eq!(set[0].type_name(), "em");
        assert_eq!(em.add_to_set(&set).len(), 3);
    }

    #[test]
    fn test_schema_errors() {
        let mut missing_text = spec();
        missing_text.nodes.retain(|(n, _)| n != "text");
        assert_eq!(Schema::new(missing_text).err(), Some(ModelError::MissingTextType));

        let mut dup = spec();
        dup.nodes.push(("p".to_string(), NodeSpec::new()));
        assert_eq!(Schema::new(dup).err(), Some(ModelError::DuplicateType("p".to_string())));

        let mut top = spec();
        top.top_node = Some("page".to_string());
        assert_eq!(Schema::new(top).err(), Some(ModelError::MissingTopNode("page".to_string())));
    }
}
