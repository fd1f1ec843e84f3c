// CLASSIFICATION: COMMUNITY
// Filename: tree.rs v0.3
// Author: Lukas Bower
// Date Modified: 2025-11-18

//! Named, rooted resource tree.
//!
//! Each entry owns its name, one handler and its children; the whole tree
//! is owned by the root. Children keep registration order, which is what
//! the REST layer reports as `Resources`. Sibling name uniqueness is a
//! caller convention: lookup returns the first match.

use crate::node::Node;

/// One entry in the resource tree.
pub struct Tree {
    name: String,
    data: Box<dyn Node>,
    children: Vec<Tree>,
}

impl Tree {
    /// Create a leaf entry holding `data`.
    pub fn new(name: impl Into<String>, data: Box<dyn Node>) -> Self {
        Self {
            name: name.into(),
            data,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handler registered at this entry.
    pub fn data(&self) -> &dyn Node {
        self.data.as_ref()
    }

    /// Append `child`, returning a handle for nested registration.
    pub fn add_child(&mut self, child: Tree) -> &mut Tree {
        self.children.push(child);
        self.children.last_mut().unwrap()
    }

    /// First immediate child whose name matches exactly.
    pub fn child_by_name(&self, name: &str) -> Option<&Tree> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Children in registration order.
    pub fn children(&self) -> &[Tree] {
        &self.children
    }

    /// Walk a slash-delimited path from this entry, one segment per level.
    ///
    /// The first non-empty segment must match this entry's own name; any
    /// unresolved segment yields `None`, never a fabricated entry.
    pub fn resolve(&self, path: &str) -> Option<&Tree> {
        let mut segments = path.split('/').filter(|s| !s.is_empty());
        if segments.next()? != self.name {
            return None;
        }
        let mut cur = self;
        for seg in segments {
            cur = cur.child_by_name(seg)?;
        }
        Some(cur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::StructNode;

    fn leaf(name: &str) -> Tree {
        Tree::new(name, Box::new(StructNode))
    }

    fn sample() -> Tree {
        let mut api = leaf("api");
        let sys = api.add_child(leaf("sys"));
        sys.add_child(leaf("fan"));
        sys.add_child(leaf("psu1"));
        sys.add_child(leaf("psu2"));
        api
    }

    #[test]
    fn children_keep_registration_order() {
        let t = sample();
        let names: Vec<&str> = t
            .child_by_name("sys")
            .unwrap()
            .children()
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(names, ["fan", "psu1", "psu2"]);
        // repeated enumeration is stable
        let again: Vec<&str> = t
            .child_by_name("sys")
            .unwrap()
            .children()
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(names, again);
    }

    #[test]
    fn resolve_registered_paths() {
        let t = sample();
        assert_eq!(t.resolve("api").unwrap().name(), "api");
        assert_eq!(t.resolve("api/sys").unwrap().name(), "sys");
        assert_eq!(t.resolve("api/sys/psu2").unwrap().name(), "psu2");
        // tolerant of duplicate slashes
        assert_eq!(t.resolve("/api//sys/fan").unwrap().name(), "fan");
    }

    #[test]
    fn resolve_unregistered_paths() {
        let t = sample();
        assert!(t.resolve("api/sys/psu3").is_none());
        assert!(t.resolve("api/fan").is_none());
        assert!(t.resolve("sys").is_none());
        assert!(t.resolve("").is_none());
    }

    #[test]
    fn duplicate_names_return_first_registered() {
        let mut root = leaf("api");
        root.add_child(leaf("dup"));
        root.add_child(leaf("dup"));
        let first = root.child_by_name("dup").unwrap();
        assert!(std::ptr::eq(first, &root.children()[0]));
    }
}
