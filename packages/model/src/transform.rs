//! Steps and transactions
//!
//! A [`Step`] is one atomic document change that knows how to invert itself
//! and how its positions move through later changes. A [`Transaction`] groups
//! steps built against a state and records their inverses for history.

use crate::error::{ModelError, StepError};
use crate::fragment::Fragment;
use crate::mark::Mark;
use crate::node::Node;
use crate::resolve::ResolvedPos;
use crate::schema::{NodeType, Schema};
use crate::selection::Selection;
use quire_codec::{AttrValue, Attrs};
use std::collections::BTreeMap;
use std::sync::Arc;

pub type StepResult<T> = Result<T, StepError>;

/// Position changes made by one step: `(start, old_size, new_size)` ranges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepMap {
    ranges: Vec<(usize, usize, usize)>,
}

impl StepMap {
    pub fn new(ranges: Vec<(usize, usize, usize)>) -> Self {
        Self { ranges }
    }

    pub fn identity() -> Self {
        Self::default()
    }

    /// Map a position. `assoc` picks the side for positions at an insertion
    /// point: negative stays before, positive moves after.
    pub fn map_result(&self, pos: usize, assoc: i32) -> (usize, bool) {
        let mut diff: isize = 0;
        for &(start, old_size, new_size) in &self.ranges {
            if start > pos {
                break;
            }
            let end = start + old_size;
            if pos <= end {
                let side = if old_size == 0 {
                    assoc
                } else if pos == start {
                    -1
                } else if pos == end {
                    1
                } else {
                    assoc
                };
                let base = (start as isize + diff) as usize;
                let result = if side < 0 { base } else { base + new_size };
                let deleted = pos != start && pos != end;
                return (result, deleted);
            }
            diff += new_size as isize - old_size as isize;
        }
        ((pos as isize + diff) as usize, false)
    }

    pub fn map(&self, pos: usize, assoc: i32) -> usize {
        self.map_result(pos, assoc).0
    }
}

/// A sequence of step maps
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    maps: Vec<StepMap>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, map: StepMap) {
        self.maps.push(map);
    }

    pub fn maps(&self) -> &[StepMap] {
        &self.maps
    }

    /// Mapping over the maps from index `from` on
    pub fn slice(&self, from: usize) -> Mapping {
        Mapping {
            maps: self.maps.get(from..).map(<[StepMap]>::to_vec).unwrap_or_default(),
        }
    }

    pub fn map_result(&self, pos: usize, assoc: i32) -> (usize, bool) {
        let mut pos = pos;
        let mut deleted = false;
        for map in &self.maps {
            let (mapped, gone) = map.map_result(pos, assoc);
            pos = mapped;
            deleted |= gone;
        }
        (pos, deleted)
    }

    pub fn map(&self, pos: usize, assoc: i32) -> usize {
        self.map_result(pos, assoc).0
    }
}

/// One atomic document change
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Replace `from..to`, which must share a parent, with flat content
    Replace { from: usize, to: usize, content: Fragment },
    /// Replace the attributes of the node starting at `pos`
    SetAttrs { pos: usize, attrs: Attrs },
    /// Replace the attributes of the root
    SetDocAttrs { attrs: Attrs },
    AddMark { from: usize, to: usize, mark: Mark },
    RemoveMark { from: usize, to: usize, mark: Mark },
}

impl Step {
    pub fn apply(&self, doc: &Node) -> StepResult<Node> {
        match self {
            Step::Replace { from, to, content } => apply_replace(doc, *from, *to, content),
            Step::SetAttrs { pos, attrs } => {
                let (rp, node) = node_starting_at(doc, *pos)?;
                let attrs = node.node_type().compute_attrs(attrs)?;
                let depth = rp.depth();
                let parent = rp.parent().replace_child(rp.index(depth), node.with_attrs(attrs));
                Ok(rebuild(&rp, depth, parent))
            }
            Step::SetDocAttrs { attrs } => {
                let attrs = doc.node_type().compute_attrs(attrs)?;
                Ok(doc.with_attrs(attrs))
            }
            Step::AddMark { from, to, mark } => {
                check_range(doc, *from, *to)?;
                Ok(map_marks(doc, *from, *to, &|marks, parent| {
                    if parent.allows_mark_type(mark.type_name()) {
                        mark.add_to_set(marks)
                    } else {
                        marks.to_vec()
                    }
                }))
            }
            Step::RemoveMark { from, to, mark } => {
                check_range(doc, *from, *to)?;
                Ok(map_marks(doc, *from, *to, &|marks, _| mark.remove_from_set(marks)))
            }
        }
    }

    pub fn get_map(&self) -> StepMap {
        match self {
            Step::Replace { from, to, content } => StepMap::new(vec![(*from, to - from, content.size())]),
            _ => StepMap::identity(),
        }
    }

    /// The step undoing this one. `doc` is the document before this step.
    pub fn invert(&self, doc: &Node) -> StepResult<Step> {
        Ok(match self {
            Step::Replace { from, to, content } => {
                let rp = doc.resolve(*from)?;
                let start = rp.start(rp.depth());
                Step::Replace {
                    from: *from,
                    to: from + content.size(),
                    content: rp.parent().content().cut(from - start, to - start),
                }
            }
            Step::SetAttrs { pos, .. } => {
                let (_, node) = node_starting_at(doc, *pos)?;
                Step::SetAttrs {
                    pos: *pos,
                    attrs: node.attrs().clone(),
                }
            }
            Step::SetDocAttrs { .. } => Step::SetDocAttrs {
                attrs: doc.attrs().clone(),
            },
            Step::AddMark { from, to, mark } => Step::RemoveMark {
                from: *from,
                to: *to,
                mark: mark.clone(),
            },
            Step::RemoveMark { from, to, mark } => Step::AddMark {
                from: *from,
                to: *to,
                mark: mark.clone(),
            },
        })
    }

    /// This step moved through `mapping`, or `None` if its target was deleted
    pub fn map(&self, mapping: &Mapping) -> Option<Step> {
        match self {
            Step::Replace { from, to, content } => {
                let (from_pos, from_deleted) = mapping.map_result(*from, 1);
                let (to_pos, to_deleted) = mapping.map_result(*to, -1);
                if from_deleted && to_deleted {
                    return None;
                }
                Some(Step::Replace {
                    from: from_pos,
                    to: to_pos.max(from_pos),
                    content: content.clone(),
                })
            }
            Step::SetAttrs { pos, attrs } => {
                let (pos, deleted) = mapping.map_result(*pos, 1);
                (!deleted).then(|| Step::SetAttrs {
                    pos,
                    attrs: attrs.clone(),
                })
            }
            Step::SetDocAttrs { .. } => Some(self.clone()),
            Step::AddMark { from, to, mark } | Step::RemoveMark { from, to, mark } => {
                let from_pos = mapping.map(*from, 1);
                let to_pos = mapping.map(*to, -1);
                if from_pos >= to_pos {
                    return None;
                }
                Some(match self {
                    Step::AddMark { .. } => Step::AddMark {
                        from: from_pos,
                        to: to_pos,
                        mark: mark.clone(),
                    },
                    _ => Step::RemoveMark {
                        from: from_pos,
                        to: to_pos,
                        mark: mark.clone(),
                    },
                })
            }
        }
    }
}

fn check_range(doc: &Node, from: usize, to: usize) -> StepResult<()> {
    if from > to {
        return Err(StepError::OutOfRange { pos: from });
    }
    if to > doc.content_size() {
        return Err(StepError::OutOfRange { pos: to });
    }
    Ok(())
}

fn node_starting_at(doc: &Node, pos: usize) -> StepResult<(ResolvedPos, Node)> {
    if pos >= doc.content_size() {
        return Err(StepError::OutOfRange { pos });
    }
    let rp = doc.resolve(pos)?;
    if rp.text_offset() > 0 {
        return Err(StepError::NoNode { pos });
    }
    match rp.node_after() {
        Some(node) if !node.is_text() => Ok((rp, node)),
        _ => Err(StepError::NoNode { pos }),
    }
}

/// Put `node` in place of the ancestor at `depth`, copying the path above it
fn rebuild(rp: &ResolvedPos, depth: usize, node: Node) -> Node {
    let mut node = node;
    for d in (0..depth).rev() {
        node = rp.node(d).replace_child(rp.index(d), node);
    }
    node
}

fn apply_replace(doc: &Node, from: usize, to: usize, content: &Fragment) -> StepResult<Node> {
    check_range(doc, from, to)?;
    let rfrom = doc.resolve(from)?;
    let rto = doc.resolve(to)?;
    if !rfrom.same_parent(&rto) {
        return Err(StepError::CrossParent { from, to });
    }
    let depth = rfrom.depth();
    let parent = rfrom.parent();
    let start = rfrom.start(depth);
    let merged = parent
        .content()
        .cut(0, from - start)
        .append(content)
        .append(&parent.content().cut_from(to - start));
    if !parent.node_type().valid_content(&merged) {
        return Err(StepError::invalid_content(parent.type_name()));
    }
    Ok(rebuild(&rfrom, depth, parent.copy(merged)))
}

/// Rewrite the marks of inline content in `from..to`, positions relative to
/// the start of `node`'s content
fn map_marks(node: &Node, from: usize, to: usize, f: &dyn Fn(&[Mark], &NodeType) -> Vec<Mark>) -> Node {
    let mut out = Vec::with_capacity(node.child_count());
    let mut pos = 0;
    for child in node.children() {
        let size = child.node_size();
        let end = pos + size;
        if end <= from || pos >= to {
            out.push(child.clone());
        } else if child.is_text() {
            let start = from.saturating_sub(pos);
            let stop = (to - pos).min(size);
            if start > 0 {
                out.push(child.cut(0, start));
            }
            let piece = child.cut(start, stop);
            out.push(piece.mark(f(piece.marks(), node.node_type())));
            if stop < size {
                out.push(child.cut(stop, size));
            }
        } else if child.is_inline() {
            out.push(child.mark(f(child.marks(), node.node_type())));
        } else {
            let inner_to = (to - pos - 1).min(child.content_size());
            out.push(map_marks(child, from.saturating_sub(pos + 1), inner_to, f));
        }
        pos = end;
    }
    node.copy(Fragment::from_vec(out))
}

/// A group of steps applied to a document, with their inverses
#[derive(Debug, Clone)]
pub struct Transaction {
    schema: Arc<Schema>,
    before: Node,
    doc: Node,
    steps: Vec<Step>,
    inverses: Vec<Step>,
    mapping: Mapping,
    selection_before: Selection,
    selection: Option<Selection>,
    add_to_history: bool,
    meta: BTreeMap<String, String>,
}

impl Transaction {
    pub fn new(schema: Arc<Schema>, doc: Node, selection: Selection) -> Self {
        Self {
            schema,
            before: doc.clone(),
            doc,
            steps: Vec::new(),
            inverses: Vec::new(),
            mapping: Mapping::new(),
            selection_before: selection,
            selection: None,
            add_to_history: true,
            meta: BTreeMap::new(),
        }
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Document before any step
    pub fn before(&self) -> &Node {
        &self.before
    }

    pub fn doc(&self) -> &Node {
        &self.doc
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Inverses of the steps, in step order
    pub fn inverses(&self) -> &[Step] {
        &self.inverses
    }

    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    pub fn doc_changed(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn selection_before(&self) -> &Selection {
        &self.selection_before
    }

    /// The selection after this transaction: the one set explicitly, or the
    /// starting selection mapped through the steps
    pub fn selection(&self) -> Selection {
        match &self.selection {
            Some(selection) => selection.clone(),
            None => self.selection_before.map(&self.mapping, &self.doc),
        }
    }

    pub fn selection_set(&self) -> bool {
        self.selection.is_some()
    }

    pub fn set_selection(&mut self, selection: Selection) -> &mut Self {
        self.selection = Some(selection);
        self
    }

    pub fn is_add_to_history(&self) -> bool {
        self.add_to_history
    }

    pub fn set_add_to_history(&mut self, add: bool) -> &mut Self {
        self.add_to_history = add;
        self
    }

    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn get_meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    /// Map a position from the starting document to the current one
    pub fn map(&self, pos: usize, assoc: i32) -> usize {
        self.mapping.map(pos, assoc)
    }

    /// Apply a step. On failure the transaction is left as it was.
    pub fn step(&mut self, step: Step) -> StepResult<&mut Self> {
        let doc = step.apply(&self.doc)?;
        let inverse = step.invert(&self.doc)?;
        let map = step.get_map();
        if let Some(selection) = self.selection.take() {
            let mut single = Mapping::new();
            single.push(map.clone());
            self.selection = Some(selection.map(&single, &doc));
        }
        self.mapping.push(map);
        self.doc = doc;
        self.steps.push(step);
        self.inverses.push(inverse);
        Ok(self)
    }

    pub fn replace(&mut self, from: usize, to: usize, nodes: Vec<Node>) -> StepResult<&mut Self> {
        if from == to && nodes.is_empty() {
            return Ok(self);
        }
        self.step(Step::Replace {
            from,
            to,
            content: Fragment::from_vec(nodes),
        })
    }

    pub fn replace_with(&mut self, from: usize, to: usize, node: Node) -> StepResult<&mut Self> {
        self.replace(from, to, vec![node])
    }

    pub fn insert(&mut self, pos: usize, nodes: Vec<Node>) -> StepResult<&mut Self> {
        self.replace(pos, pos, nodes)
    }

    pub fn delete(&mut self, from: usize, to: usize) -> StepResult<&mut Self> {
        self.replace(from, to, Vec::new())
    }

    /// Insert text at `pos` with the marks active there
    pub fn insert_text(&mut self, pos: usize, text: &str) -> StepResult<&mut Self> {
        if text.is_empty() {
            return Ok(self);
        }
        let rp = self.doc.resolve(pos)?;
        let parent_type = rp.parent().node_type().clone();
        let marks: Vec<Mark> = rp
            .marks()
            .into_iter()
            .filter(|m| parent_type.allows_mark_type(m.type_name()))
            .collect();
        let node = self.schema.text(text, marks)?;
        self.insert(pos, vec![node])
    }

    /// Delete a range, joining the blocks it starts and ends in when they
    /// have different parents
    pub fn delete_range(&mut self, from: usize, to: usize) -> StepResult<&mut Self> {
        if from >= to {
            return Ok(self);
        }
        let rfrom = self.doc.resolve(from)?;
        let rto = self.doc.resolve(to)?;
        if rfrom.same_parent(&rto) {
            return self.delete(from, to);
        }

        let depth = rfrom.shared_depth(to);
        let inner = depth + 1;
        if inner > rfrom.depth() || inner > rto.depth() {
            return Err(StepError::CrossParent { from, to });
        }
        let left = rfrom.node(inner).cut(0, from - rfrom.start(inner));
        let right_node = rto.node(inner);
        let right = right_node.cut(to - rto.start(inner), right_node.content_size());

        let joined = left.copy(left.content().append(right.content()));
        let replacement = if left.is_textblock()
            && right.is_textblock()
            && left.node_type().valid_content(joined.content())
        {
            vec![joined]
        } else {
            vec![left, right]
        };
        let start = rfrom.before(inner);
        let end = rto.after(inner);
        self.replace(start, end, replacement)
    }

    pub fn set_node_attrs(&mut self, pos: usize, attrs: Attrs) -> StepResult<&mut Self> {
        self.step(Step::SetAttrs { pos, attrs })
    }

    pub fn set_node_attribute(&mut self, pos: usize, name: &str, value: AttrValue) -> StepResult<&mut Self> {
        let node = self.doc.node_at(pos).ok_or(StepError::NoNode { pos })?;
        let mut attrs = node.attrs().clone();
        attrs.insert(name.to_string(), value);
        self.set_node_attrs(pos, attrs)
    }

    pub fn set_doc_attrs(&mut self, attrs: Attrs) -> StepResult<&mut Self> {
        self.step(Step::SetDocAttrs { attrs })
    }

    pub fn set_doc_attribute(&mut self, name: &str, value: AttrValue) -> StepResult<&mut Self> {
        let mut attrs = self.doc.attrs().clone();
        attrs.insert(name.to_string(), value);
        self.set_doc_attrs(attrs)
    }

    /// Add a mark to the inline content in range. Marks it excludes are
    /// removed first, so every step inverts exactly.
    pub fn add_mark(&mut self, from: usize, to: usize, mark: Mark) -> StepResult<&mut Self> {
        check_range(&self.doc, from, to)?;
        let mut removed: Vec<(usize, usize, Mark)> = Vec::new();
        let mut added: Vec<(usize, usize)> = Vec::new();
        self.doc.nodes_between(from, to, &mut |node, pos, parent, _| {
            if !node.is_inline() {
                return true;
            }
            let allowed = parent
                .map(|p| p.node_type().allows_mark_type(mark.type_name()))
                .unwrap_or(false);
            if !allowed || mark.is_in_set(node.marks()) {
                return false;
            }
            let start = pos.max(from);
            let end = (pos + node.node_size()).min(to);
            for existing in node.marks() {
                if mark.excludes(existing) {
                    push_range(&mut removed, start, end, existing);
                }
            }
            match added.last_mut() {
                Some(last) if last.1 == start => last.1 = end,
                _ => added.push((start, end)),
            }
            false
        });
        for (from, to, mark) in removed {
            self.step(Step::RemoveMark { from, to, mark })?;
        }
        for (from, to) in added {
            self.step(Step::AddMark {
                from,
                to,
                mark: mark.clone(),
            })?;
        }
        Ok(self)
    }

    /// Remove every mark equal to `mark` from the range
    pub fn remove_mark(&mut self, from: usize, to: usize, mark: &Mark) -> StepResult<&mut Self> {
        self.remove_marks_where(from, to, &|m| m == mark)
    }

    /// Remove every mark of a type from the range
    pub fn remove_mark_type(&mut self, from: usize, to: usize, type_name: &str) -> StepResult<&mut Self> {
        self.remove_marks_where(from, to, &|m| m.type_name() == type_name)
    }

    fn remove_marks_where(&mut self, from: usize, to: usize, pred: &dyn Fn(&Mark) -> bool) -> StepResult<&mut Self> {
        check_range(&self.doc, from, to)?;
        let mut removed: Vec<(usize, usize, Mark)> = Vec::new();
        self.doc.nodes_between(from, to, &mut |node, pos, _, _| {
            if !node.is_inline() {
                return true;
            }
            let start = pos.max(from);
            let end = (pos + node.node_size()).min(to);
            for mark in node.marks().iter().filter(|m| pred(m)) {
                push_range(&mut removed, start, end, mark);
            }
            false
        });
        for (from, to, mark) in removed {
            self.step(Step::RemoveMark { from, to, mark })?;
        }
        Ok(self)
    }

    /// Create a node of a registered type
    pub fn create(&self, type_name: &str, attrs: Attrs, content: Vec<Node>) -> Result<Node, ModelError> {
        self.schema.node(type_name, attrs, content, Vec::new())
    }
}

fn push_range(ranges: &mut Vec<(usize, usize, Mark)>, start: usize, end: usize, mark: &Mark) {
    if let Some(last) = ranges.iter_mut().rev().find(|(_, _, m)| m == mark) {
        if last.1 == start {
            last.1 = end;
            return;
        }
    }
    ranges.push((start, end, mark.clone()));
}
