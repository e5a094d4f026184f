#![forbid(unsafe_code)]

//! In-memory element tree.
//!
//! Just enough of a DOM to exercise the anchor walk and element lookups:
//! nodes have a tag, an optional id, an optional href, and a parent.

use std::cell::RefCell;
use std::rc::Rc;

use tabwire_backend::{DomNode, ElementLocator};

#[derive(Debug)]
struct NodeData {
    tag: String,
    id: Option<String>,
    href: Option<String>,
    parent: Option<usize>,
}

#[derive(Debug, Default)]
struct DomState {
    nodes: Vec<NodeData>,
    focused: Vec<String>,
}

/// Owner of an element tree. Index 0 is `HTML`, index 1 is `BODY`.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    state: Rc<RefCell<DomState>>,
}

/// Handle to one node of a [`MemoryDom`].
#[derive(Debug, Clone)]
pub struct NodeRef {
    dom: MemoryDom,
    index: usize,
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && Rc::ptr_eq(&self.dom.state, &other.dom.state)
    }
}

impl Eq for NodeRef {}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// A document with `<html><body></body></html>`.
    #[must_use]
    pub fn new() -> Self {
        let state = DomState {
            nodes: vec![
                NodeData {
                    tag: "HTML".into(),
                    id: None,
                    href: None,
                    parent: None,
                },
                NodeData {
                    tag: "BODY".into(),
                    id: None,
                    href: None,
                    parent: Some(0),
                },
            ],
            focused: Vec::new(),
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// The root `HTML` element.
    #[must_use]
    pub fn root(&self) -> NodeRef {
        self.node(0)
    }

    /// The `BODY` element.
    #[must_use]
    pub fn body(&self) -> NodeRef {
        self.node(1)
    }

    fn node(&self, index: usize) -> NodeRef {
        NodeRef {
            dom: self.clone(),
            index,
        }
    }

    /// Append a child element to `parent`.
    pub fn append(&self, parent: &NodeRef, tag: &str) -> NodeRef {
        let mut state = self.state.borrow_mut();
        state.nodes.push(NodeData {
            tag: tag.to_ascii_uppercase(),
            id: None,
            href: None,
            parent: Some(parent.index),
        });
        let index = state.nodes.len() - 1;
        drop(state);
        self.node(index)
    }

    /// Append an `<a href=...>` to `parent`.
    pub fn append_anchor(&self, parent: &NodeRef, href: &str) -> NodeRef {
        let anchor = self.append(parent, "a");
        self.state.borrow_mut().nodes[anchor.index].href = Some(href.to_owned());
        anchor
    }

    /// Give `node` an id attribute.
    pub fn set_id(&self, node: &NodeRef, id: &str) {
        self.state.borrow_mut().nodes[node.index].id = Some(id.to_owned());
    }

    /// Selectors passed to [`ElementLocator::focus`], in order.
    #[must_use]
    pub fn focused(&self) -> Vec<String> {
        self.state.borrow().focused.clone()
    }

    fn matches(&self, index: usize, selector: &str) -> bool {
        let state = self.state.borrow();
        let node = &state.nodes[index];
        match selector.strip_prefix('#') {
            Some(id) => node.id.as_deref() == Some(id),
            None => node.tag.eq_ignore_ascii_case(selector),
        }
    }
}

impl DomNode for NodeRef {
    fn tag_name(&self) -> String {
        self.dom.state.borrow().nodes[self.index].tag.clone()
    }

    fn parent(&self) -> Option<Self> {
        let parent = self.dom.state.borrow().nodes[self.index].parent;
        parent.map(|index| self.dom.node(index))
    }

    fn href(&self) -> Option<String> {
        self.dom.state.borrow().nodes[self.index].href.clone()
    }
}

impl ElementLocator for MemoryDom {
    type Element = NodeRef;

    fn by_id(&self, id: &str) -> Option<NodeRef> {
        let index = self
            .state
            .borrow()
            .nodes
            .iter()
            .position(|n| n.id.as_deref() == Some(id));
        index.map(|index| self.node(index))
    }

    fn focus(&self, selector: &str) {
        self.state.borrow_mut().focused.push(selector.to_owned());
    }

    fn within(&self, element: &NodeRef, selector: &str) -> bool {
        let mut current = Some(element.index);
        while let Some(index) = current {
            if self.matches(index, selector) {
                return true;
            }
            current = self.state.borrow().nodes[index].parent;
        }
        false
    }
}
