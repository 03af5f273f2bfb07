//! # Head Synchronization
//!
//! Keeps a live `head` element in step with the head sub-document. Each
//! update diffs the rendered head against the live children and applies the
//! resulting patches in place, so unchanged elements are never recreated.
//!
//! Nodes the editor injects for its own use (editing styles and scripts) are
//! marked as editor-owned. They are detached before each reconciliation and
//! reattached afterwards, untouched.

use crate::head::head_equal;
use crate::render::CommentRenderPass;
use quire_codec::{to_attributes, EDITING_ATTR};
use quire_dom::{DomNode, Element};
use quire_model::{EditorState, Node};

/// `data-ww-editing` value of editor-owned nodes
pub const OWNED_MARKER: &str = "editor";

/// Child-index path from the head element. The empty path is the head.
pub type NodePath = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadPatch {
    Create { path: NodePath, node: DomNode },
    Remove { path: NodePath },
    Replace { path: NodePath, node: DomNode },
    UpdateAttributes { path: NodePath, attributes: Vec<(String, String)> },
    UpdateText { path: NodePath, content: String },
}

fn is_owned(node: &DomNode) -> bool {
    node.as_element()
        .and_then(|el| el.get_attribute(EDITING_ATTR))
        .map(|value| value == OWNED_MARKER)
        .unwrap_or(false)
}

/// Editor-owned nodes: one `style` per stylesheet and one inline module
/// `script` per script source
pub fn owned_nodes(styles: &[String], scripts: &[String]) -> Vec<DomNode> {
    let styles = styles.iter().map(|css| {
        DomNode::Element(
            Element::new("style")
                .with_attr(EDITING_ATTR, OWNED_MARKER)
                .with_child(DomNode::text(css.as_str())),
        )
    });
    let scripts = scripts.iter().map(|source| {
        DomNode::Element(
            Element::new("script")
                .with_attr(EDITING_ATTR, OWNED_MARKER)
                .with_attr("type", "module")
                .with_child(DomNode::text(source.as_str())),
        )
    });
    styles.chain(scripts).collect()
}

fn root_attributes(doc: &Node) -> Vec<(String, String)> {
    to_attributes(doc.attrs(), Some(&doc.node_type().spec().attrs), None)
}

fn render_children(doc: &Node) -> Vec<DomNode> {
    CommentRenderPass::new().serialize(doc.content())
}

/// Patches turning `old` into `new`, both children of the node at `path`.
/// Trailing removals come last-first so they apply in order.
pub fn diff_children(old: &[DomNode], new: &[DomNode], path: &[usize]) -> Vec<HeadPatch> {
    let mut patches = Vec::new();
    let child_path = |i: usize| {
        let mut p = path.to_vec();
        p.push(i);
        p
    };

    for (i, (old_node, new_node)) in old.iter().zip(new).enumerate() {
        patches.extend(diff_node(old_node, new_node, child_path(i)));
    }
    for (i, node) in new.iter().enumerate().skip(old.len()) {
        patches.push(HeadPatch::Create {
            path: child_path(i),
            node: node.clone(),
        });
    }
    for i in (new.len()..old.len()).rev() {
        patches.push(HeadPatch::Remove { path: child_path(i) });
    }
    patches
}

fn diff_node(old: &DomNode, new: &DomNode, path: NodePath) -> Vec<HeadPatch> {
    match (old, new) {
        (DomNode::Element(a), DomNode::Element(b)) if a.tag == b.tag => {
            let mut patches = Vec::new();
            if a.attributes != b.attributes {
                patches.push(HeadPatch::UpdateAttributes {
                    path: path.clone(),
                    attributes: b.attributes.clone(),
                });
            }
            patches.extend(diff_children(&a.children, &b.children, &path));
            patches
        }
        (DomNode::Text(a), DomNode::Text(b)) => {
            if a == b {
                Vec::new()
            } else {
                vec![HeadPatch::UpdateText {
                    path,
                    content: b.clone(),
                }]
            }
        }
        _ if old == new => Vec::new(),
        _ => vec![HeadPatch::Replace {
            path,
            node: new.clone(),
        }],
    }
}

fn element_at<'a>(root: &'a mut Element, path: &[usize]) -> Option<&'a mut Element> {
    path.iter().try_fold(root, |el, &i| match el.children.get_mut(i)? {
        DomNode::Element(child) => Some(child),
        _ => None,
    })
}

/// Apply one patch to the tree under `root`. Returns false when the path
/// does not exist.
pub fn apply_patch(root: &mut Element, patch: &HeadPatch) -> bool {
    let split = |path: &[usize]| path.split_last().map(|(last, parent)| (*last, parent.to_vec()));
    match patch {
        HeadPatch::UpdateAttributes { path, attributes } => match element_at(root, path) {
            Some(el) => {
                el.attributes = attributes.clone();
                true
            }
            None => false,
        },
        HeadPatch::Create { path, node } => {
            let Some((index, parent)) = split(path) else {
                return false;
            };
            match element_at(root, &parent) {
                Some(el) if index <= el.children.len() => {
                    el.children.insert(index, node.clone());
                    true
                }
                _ => false,
            }
        }
        HeadPatch::Remove { path } => {
            let Some((index, parent)) = split(path) else {
                return false;
            };
            match element_at(root, &parent) {
                Some(el) if index < el.children.len() => {
                    el.children.remove(index);
                    true
                }
                _ => false,
            }
        }
        HeadPatch::Replace { path, node } => {
            let Some((index, parent)) = split(path) else {
                return false;
            };
            match element_at(root, &parent).and_then(|el| el.children.get_mut(index)) {
                Some(slot) => {
                    *slot = node.clone();
                    true
                }
                None => false,
            }
        }
        HeadPatch::UpdateText { path, content } => {
            let Some((index, parent)) = split(path) else {
                return false;
            };
            match element_at(root, &parent).and_then(|el| el.children.get_mut(index)) {
                Some(DomNode::Text(text)) => {
                    *text = content.clone();
                    true
                }
                _ => false,
            }
        }
    }
}

/// A live `head` element mirroring the head sub-document
#[derive(Debug)]
pub struct HeadSyncView {
    head: Element,
    doc: Node,
    owned: Vec<DomNode>,
}

impl HeadSyncView {
    /// Take over `head`, render `state` into it and append the editor-owned
    /// nodes
    pub fn mount(head: Element, state: &EditorState, owned: Vec<DomNode>) -> Self {
        let mut view = Self {
            head,
            doc: state.doc().clone(),
            owned,
        };
        view.head.children.retain(|child| !is_owned(child));
        let target = root_attributes(&view.doc);
        let mut patches = Vec::new();
        if view.head.attributes != target {
            patches.push(HeadPatch::UpdateAttributes {
                path: Vec::new(),
                attributes: target,
            });
        }
        patches.extend(diff_children(&view.head.children, &render_children(&view.doc), &[]));
        view.apply(&patches);
        view.head.children.extend(view.owned.iter().cloned());
        tracing::debug!(owned = view.owned.len(), patches = patches.len(), "head view mounted");
        view
    }

    pub fn head(&self) -> &Element {
        &self.head
    }

    fn apply(&mut self, patches: &[HeadPatch]) {
        for patch in patches {
            if !apply_patch(&mut self.head, patch) {
                tracing::warn!(?patch, "head patch did not apply");
            }
        }
    }

    /// Reconcile with `state`. Returns the patches applied, none when the head
    /// is unchanged.
    pub fn update(&mut self, state: &EditorState) -> Vec<HeadPatch> {
        let doc = state.doc();
        if head_equal(&self.doc, doc) {
            return Vec::new();
        }

        // editor-owned nodes sit outside the diff
        let (owned, children): (Vec<DomNode>, Vec<DomNode>) =
            std::mem::take(&mut self.head.children).into_iter().partition(is_owned);
        self.head.children = children;

        let mut patches = Vec::new();
        let attributes = root_attributes(doc);
        if self.head.attributes != attributes {
            patches.push(HeadPatch::UpdateAttributes {
                path: Vec::new(),
                attributes,
            });
        }
        patches.extend(diff_children(&self.head.children, &render_children(doc), &[]));
        self.apply(&patches);

        self.head.children.extend(owned);
        self.doc = doc.clone();
        tracing::debug!(patches = patches.len(), "head view updated");
        patches
    }

    /// Remove the editor-owned nodes and hand back the head element
    pub fn destroy(mut self) -> Element {
        self.head.children.retain(|child| !is_owned(child));
        self.head
    }
}
