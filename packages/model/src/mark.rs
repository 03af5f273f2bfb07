use crate::schema::MarkType;
use quire_codec::{AttrValue, Attrs};
use std::fmt;
use std::sync::Arc;

/// An annotation on inline content. Cheap to clone; clones share identity.
#[derive(Clone)]
pub struct Mark(Arc<MarkData>);

struct MarkData {
    mark_type: Arc<MarkType>,
    attrs: Attrs,
}

impl Mark {
    pub(crate) fn new(mark_type: Arc<MarkType>, attrs: Attrs) -> Self {
        Mark(Arc::new(MarkData { mark_type, attrs }))
    }

    pub fn mark_type(&self) -> &Arc<MarkType> {
        &self.0.mark_type
    }

    pub fn type_name(&self) -> &str {
        self.0.mark_type.name()
    }

    pub fn attrs(&self) -> &Attrs {
        &self.0.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.0.attrs.get(name)
    }

    /// Same mark with different attributes (a new identity)
    pub fn with_attrs(&self, attrs: Attrs) -> Mark {
        Mark::new(self.0.mark_type.clone(), attrs)
    }

    /// Identity of this mark instance, shared by its clones
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    pub fn ptr_eq(&self, other: &Mark) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Whether `other` cannot coexist with this mark in one set
    pub fn excludes(&self, other: &Mark) -> bool {
        self.0.mark_type.excludes(other.mark_type())
    }

    pub fn is_in_set(&self, set: &[Mark]) -> bool {
        set.iter().any(|m| m == self)
    }

    /// Add this mark to a sorted set, replacing marks it excludes. A set that
    /// already holds an excluding mark is returned unchanged.
    pub fn add_to_set(&self, set: &[Mark]) -> Vec<Mark> {
        let mut copy: Vec<Mark> = Vec::with_capacity(set.len() + 1);
        let mut placed = false;
        for (i, other) in set.iter().enumerate() {
            if self == other {
                return set.to_vec();
            }
            if self.excludes(other) {
                continue;
            }
            if other.excludes(self) {
                return set.to_vec();
            }
            if !placed && other.mark_type().rank() > self.mark_type().rank() {
                copy.push(self.clone());
                placed = true;
            }
            copy.push(set[i].clone());
        }
        if !placed {
            copy.push(self.clone());
        }
        copy
    }

    pub fn remove_from_set(&self, set: &[Mark]) -> Vec<Mark> {
        set.iter().filter(|m| *m != self).cloned().collect()
    }
}

/// Structural equality: same type and attributes
impl PartialEq for Mark {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.type_name() == other.type_name() && self.attrs() == other.attrs())
    }
}

impl fmt::Debug for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.attrs().values().all(AttrValue::is_null) {
            write!(f, "{}", self.type_name())
        } else {
            write!(f, "{}{:?}", self.type_name(), self.attrs())
        }
    }
}

/// Whether two mark sets are equal
pub fn same_mark_set(a: &[Mark], b: &[Mark]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x == y)
}
