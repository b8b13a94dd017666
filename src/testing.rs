//! In-memory `DomHost` for native unit tests.
//!
//! Nodes are indices into an arena.  Listeners are recorded rather than
//! wired, and `click` / `press_key` replay DOM bubbling against them the way
//! the browser host's closures would.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::config::ModalOptions;
use crate::dom::{ClickOutcome, DomHost, Listener, ModalEvent};
use crate::error::ModalError;
use crate::modal::Modals;

const TEXT_TAG: &str = "#text";

#[derive(Debug, Default)]
struct MockNode {
    tag: String,
    parent: Option<usize>,
    children: Vec<usize>,
    classes: Vec<String>,
    attrs: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    text: String,
}

struct Arena {
    nodes: Vec<MockNode>,
    body: usize,
    listeners: Vec<Listener<usize>>,
    events: Vec<(usize, ModalEvent)>,
    viewport: (f64, f64),
    scroll_height: f64,
}

pub struct MockDom {
    arena: RefCell<Arena>,
}

enum ClickTarget {
    Root(String),
    Backdrop,
    Trigger(String, Option<ModalOptions<usize>>),
}

impl MockDom {
    pub fn new() -> Self {
        let html = MockNode {
            tag: "html".into(),
            ..Default::default()
        };
        let body = MockNode {
            tag: "body".into(),
            parent: Some(0),
            ..Default::default()
        };
        let mut nodes = vec![html, body];
        nodes[0].children.push(1);
        Self {
            arena: RefCell::new(Arena {
                nodes,
                body: 1,
                listeners: Vec::new(),
                events: Vec::new(),
                viewport: (1000.0, 800.0),
                scroll_height: 0.0,
            }),
        }
    }

    /// Create an element with an optional id and attach it under `parent`.
    pub fn add_element(&self, parent: usize, tag: &str, id: Option<&str>) -> usize {
        let node = self.create_element(tag).unwrap();
        if let Some(id) = id {
            self.set_attribute(&node, "id", id).unwrap();
        }
        self.append_child(&parent, &node).unwrap();
        node
    }

    pub fn add_text(&self, parent: usize, text: &str) -> usize {
        let node = self.create_element(TEXT_TAG).unwrap();
        self.set_text(&node, text);
        self.append_child(&parent, &node).unwrap();
        node
    }

    /// A hidden `<div id=..>` with a paragraph, attached to the body.
    pub fn dialog(&self, id: &str, text: &str) -> usize {
        let body = self.body().unwrap();
        let root = self.add_element(body, "div", Some(id));
        self.set_style(&root, "display", "none").unwrap();
        let p = self.add_element(root, "p", None);
        self.add_text(p, text);
        root
    }

    pub fn text_content(&self, node: usize) -> String {
        let arena = self.arena.borrow();
        let mut out = String::new();
        collect_text(&arena.nodes, node, &mut out);
        out
    }

    pub fn find_all_by_class(&self, class: &str) -> Vec<usize> {
        let arena = self.arena.borrow();
        (0..arena.nodes.len())
            .filter(|i| arena.nodes[*i].classes.iter().any(|c| c == class))
            .collect()
    }

    pub fn find_by_class(&self, scope: usize, class: &str) -> Option<usize> {
        self.find_all_by_class(class)
            .into_iter()
            .find(|node| *node != scope && self.contains(&scope, node))
    }

    pub fn set_viewport(&self, width: f64, height: f64) {
        self.arena.borrow_mut().viewport = (width, height);
    }

    pub fn set_scroll_height(&self, height: f64) {
        self.arena.borrow_mut().scroll_height = height;
    }

    pub fn listener_count(&self) -> usize {
        self.arena.borrow().listeners.len()
    }

    pub fn keydown_listener_count(&self) -> usize {
        self.arena
            .borrow()
            .listeners
            .iter()
            .filter(|l| matches!(l, Listener::Keydown))
            .count()
    }

    pub fn has_root_listener(&self, id: &str) -> bool {
        self.arena
            .borrow()
            .listeners
            .iter()
            .any(|l| matches!(l, Listener::RootClick { id: root_id, .. } if root_id == id))
    }

    pub fn events_for(&self, node: usize) -> Vec<ModalEvent> {
        self.arena
            .borrow()
            .events
            .iter()
            .filter(|(n, _)| *n == node)
            .map(|(_, e)| *e)
            .collect()
    }

    fn click_target(&self, node: usize) -> Option<ClickTarget> {
        let arena = self.arena.borrow();
        arena.listeners.iter().find_map(|l| match l {
            Listener::RootClick { root, id } if *root == node => Some(ClickTarget::Root(id.clone())),
            Listener::BackdropClick { backdrop } if *backdrop == node => Some(ClickTarget::Backdrop),
            Listener::TriggerClick {
                trigger,
                target_id,
                options,
            } if *trigger == node => Some(ClickTarget::Trigger(target_id.clone(), options.clone())),
            _ => None,
        })
    }

    /// Text nodes reject element-only mutations, as `web_sys::Node` does.
    fn element(arena: &mut Arena, node: usize) -> Result<&mut MockNode, ModalError> {
        let node = &mut arena.nodes[node];
        if node.tag == TEXT_TAG {
            return Err(ModalError::dom("#text is not an element"));
        }
        Ok(node)
    }

    fn detach(arena: &mut Arena, child: usize) {
        if let Some(parent) = arena.nodes[child].parent.take() {
            arena.nodes[parent].children.retain(|c| *c != child);
        }
    }
}

fn collect_text(nodes: &[MockNode], node: usize, out: &mut String) {
    out.push_str(&nodes[node].text);
    for child in &nodes[node].children {
        collect_text(nodes, *child, out);
    }
}

/// Replay a click on `target`, bubbling through recorded listeners.
pub fn click(modals: &Modals<MockDom>, target: usize) -> ClickOutcome {
    let mut outcome = ClickOutcome::default();
    let mut current = Some(target);
    while let Some(node) = current {
        let handled = match modals.host().click_target(node) {
            Some(ClickTarget::Root(id)) => Some(modals.on_root_click(&id, &target)),
            Some(ClickTarget::Backdrop) => Some(modals.on_backdrop_click(&target)),
            Some(ClickTarget::Trigger(id, options)) => {
                Some(modals.on_trigger_click(&id, options.as_ref()))
            }
            None => None,
        };
        if let Some(result) = handled {
            let step = result.unwrap();
            outcome.prevent_default |= step.prevent_default;
            if step.stop_propagation {
                outcome.stop_propagation = true;
                break;
            }
        }
        current = modals.host().parent(&node);
    }
    outcome
}

pub fn press_key(modals: &Modals<MockDom>, key: &str) {
    if modals.host().keydown_listener_count() > 0 {
        modals.on_keydown(key).unwrap();
    }
}

impl DomHost for MockDom {
    type Node = usize;

    fn create_element(&self, tag: &str) -> Result<usize, ModalError> {
        let mut arena = self.arena.borrow_mut();
        arena.nodes.push(MockNode {
            tag: tag.to_string(),
            ..Default::default()
        });
        Ok(arena.nodes.len() - 1)
    }

    fn body(&self) -> Result<usize, ModalError> {
        Ok(self.arena.borrow().body)
    }

    fn query_selector(&self, selector: &str) -> Result<Option<usize>, ModalError> {
        let arena = self.arena.borrow();
        let found = if let Some(id) = selector.strip_prefix('#') {
            (0..arena.nodes.len()).find(|i| arena.nodes[*i].attrs.get("id").map(String::as_str) == Some(id))
        } else if let Some(class) = selector.strip_prefix('.') {
            (0..arena.nodes.len()).find(|i| arena.nodes[*i].classes.iter().any(|c| c == class))
        } else {
            return Err(ModalError::dom(format!("unsupported selector '{}'", selector)));
        };
        Ok(found)
    }

    fn element_id(&self, node: &usize) -> Option<String> {
        self.arena.borrow().nodes[*node]
            .attrs
            .get("id")
            .filter(|id| !id.is_empty())
            .cloned()
    }

    fn parent(&self, node: &usize) -> Option<usize> {
        self.arena.borrow().nodes[*node].parent
    }

    fn children(&self, node: &usize) -> Vec<usize> {
        self.arena.borrow().nodes[*node].children.clone()
    }

    fn contains(&self, ancestor: &usize, node: &usize) -> bool {
        let arena = self.arena.borrow();
        let mut current = Some(*node);
        while let Some(n) = current {
            if n == *ancestor {
                return true;
            }
            current = arena.nodes[n].parent;
        }
        false
    }

    fn append_child(&self, parent: &usize, child: &usize) -> Result<(), ModalError> {
        let mut arena = self.arena.borrow_mut();
        Self::detach(&mut arena, *child);
        arena.nodes[*child].parent = Some(*parent);
        arena.nodes[*parent].children.push(*child);
        Ok(())
    }

    fn prepend_child(&self, parent: &usize, child: &usize) -> Result<(), ModalError> {
        let mut arena = self.arena.borrow_mut();
        Self::detach(&mut arena, *child);
        arena.nodes[*child].parent = Some(*parent);
        arena.nodes[*parent].children.insert(0, *child);
        Ok(())
    }

    fn clear_children(&self, node: &usize) -> Result<(), ModalError> {
        let mut arena = self.arena.borrow_mut();
        let children = std::mem::take(&mut arena.nodes[*node].children);
        for child in children {
            arena.nodes[child].parent = None;
        }
        arena.nodes[*node].text.clear();
        Ok(())
    }

    fn set_text(&self, node: &usize, text: &str) {
        let mut arena = self.arena.borrow_mut();
        let children = std::mem::take(&mut arena.nodes[*node].children);
        for child in children {
            arena.nodes[child].parent = None;
        }
        arena.nodes[*node].text = text.to_string();
    }

    fn add_class(&self, node: &usize, class: &str) -> Result<(), ModalError> {
        let mut arena = self.arena.borrow_mut();
        let classes = &mut Self::element(&mut arena, *node)?.classes;
        for class in class.split_whitespace() {
            if !classes.iter().any(|c| c == class) {
                classes.push(class.to_string());
            }
        }
        Ok(())
    }

    fn remove_class(&self, node: &usize, class: &str) -> Result<(), ModalError> {
        self.arena.borrow_mut().nodes[*node]
            .classes
            .retain(|c| c != class);
        Ok(())
    }

    fn has_class(&self, node: &usize, class: &str) -> bool {
        self.arena.borrow().nodes[*node]
            .classes
            .iter()
            .any(|c| c == class)
    }

    fn attribute(&self, node: &usize, name: &str) -> Option<String> {
        self.arena.borrow().nodes[*node].attrs.get(name).cloned()
    }

    fn set_attribute(&self, node: &usize, name: &str, value: &str) -> Result<(), ModalError> {
        let mut arena = self.arena.borrow_mut();
        Self::element(&mut arena, *node)?
            .attrs
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn style(&self, node: &usize, property: &str) -> String {
        self.arena.borrow().nodes[*node]
            .styles
            .get(property)
            .cloned()
            .unwrap_or_default()
    }

    fn set_style(&self, node: &usize, property: &str, value: &str) -> Result<(), ModalError> {
        let mut arena = self.arena.borrow_mut();
        let styles = &mut arena.nodes[*node].styles;
        // `overflow` is a shorthand for both axes.
        let longhands: &[&str] = if property == "overflow" {
            &["overflow", "overflow-x", "overflow-y"]
        } else {
            &[]
        };
        for prop in longhands.iter().copied().chain(std::iter::once(property)) {
            if value.is_empty() {
                styles.remove(prop);
            } else {
                styles.insert(prop.to_string(), value.to_string());
            }
        }
        Ok(())
    }

    fn set_visible(&self, node: &usize, visible: bool) -> Result<(), ModalError> {
        self.set_style(node, "display", if visible { "" } else { "none" })
    }

    fn is_visible(&self, node: &usize) -> bool {
        self.style(node, "display") != "none"
    }

    fn emit(&self, node: &usize, event: ModalEvent) -> Result<(), ModalError> {
        self.arena.borrow_mut().events.push((*node, event));
        Ok(())
    }

    fn listen(&self, listener: Listener<usize>) -> Result<(), ModalError> {
        self.arena.borrow_mut().listeners.push(listener);
        Ok(())
    }

    fn unlisten_root(&self, id: &str) {
        self.arena
            .borrow_mut()
            .listeners
            .retain(|l| !matches!(l, Listener::RootClick { id: root_id, .. } if root_id == id));
    }

    fn viewport_size(&self) -> (f64, f64) {
        self.arena.borrow().viewport
    }

    fn body_scroll_height(&self) -> f64 {
        self.arena.borrow().scroll_height
    }
}
