//! Page-wide backdrop registry and body scroll-lock bookkeeping.
//!
//! There is exactly one backdrop per page.  It is created lazily, hidden
//! between uses and never removed.  The registry records which modal
//! currently owns it; light-dismiss gestures are routed to that owner only.

use tracing::debug;

use crate::constants::{
    CSS_INITIAL, CSS_MODAL_CONTAINER, OVERFLOW_HIDDEN, SCROLLBAR_COMPENSATION, STYLE_OVERFLOW,
    STYLE_OVERFLOW_Y, STYLE_PADDING_RIGHT,
};
use crate::dom::{DomHost, Listener};
use crate::error::ModalError;

pub struct Backdrop<N> {
    node: Option<N>,
    owner: Option<String>,
}

impl<N: Clone + PartialEq + 'static> Backdrop<N> {
    pub fn new() -> Self {
        Self {
            node: None,
            owner: None,
        }
    }

    pub fn node(&self) -> Option<&N> {
        self.node.as_ref()
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Return the backdrop, creating and wiring it on first use.
    ///
    /// Creation appends a hidden `<div class="modalContainer">` to the body
    /// and binds the page-wide backdrop click and Escape listeners.  On later
    /// calls the backdrop is re-hidden only when no modal owns it.
    pub fn ensure<H>(&mut self, host: &H, custom_class: Option<&str>) -> Result<N, ModalError>
    where
        H: DomHost<Node = N>,
    {
        if let Some(node) = &self.node {
            if self.owner.is_none() {
                host.set_visible(node, false)?;
            }
            return Ok(node.clone());
        }

        let node = host.create_element("div")?;
        if let Some(class) = custom_class {
            host.add_class(&node, class)?;
        }
        host.add_class(&node, CSS_MODAL_CONTAINER)?;
        host.body().and_then(|body| host.append_child(&body, &node))?;
        host.set_visible(&node, false)?;

        host.listen(Listener::BackdropClick {
            backdrop: node.clone(),
        })?;
        host.listen(Listener::Keydown)?;

        debug!(event = "modal.backdrop.created");
        self.node = Some(node.clone());
        Ok(node)
    }

    /// Make `id` the owner, returning the owner it displaced.
    pub fn claim(&mut self, id: &str) -> Option<String> {
        let previous = self.owner.replace(id.to_string());
        match &previous {
            Some(prev) if prev != id => {
                debug!(event = "modal.backdrop.owner_replaced", previous = %prev, owner = id);
            }
            _ => {}
        }
        previous.filter(|prev| prev != id)
    }

    /// Drop ownership if `id` holds it.  Returns true when the backdrop is
    /// now unowned.
    pub fn release(&mut self, id: &str) -> bool {
        match self.owner.as_deref() {
            Some(owner) if owner == id => {
                self.owner = None;
                true
            }
            Some(_) => false,
            None => true,
        }
    }
}

impl<N: Clone + PartialEq + 'static> Default for Backdrop<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BodyStyle {
    overflow: String,
    overflow_y: String,
    padding_right: String,
}

/// Body scroll suppression while a modal is shown.
///
/// The first lock snapshots the body's inline styles; unlocking always
/// writes them back (or `initial` for properties that were unset), whether
/// or not a lock was taken.  Not reference counted.
#[derive(Debug, Default)]
pub struct ScrollLock {
    saved: Option<BodyStyle>,
}

impl ScrollLock {
    pub fn is_locked(&self) -> bool {
        self.saved.is_some()
    }

    pub fn lock<H: DomHost>(&mut self, host: &H) -> Result<(), ModalError> {
        let body = host.body()?;
        if self.saved.is_none() {
            self.saved = Some(BodyStyle {
                overflow: host.style(&body, STYLE_OVERFLOW),
                overflow_y: host.style(&body, STYLE_OVERFLOW_Y),
                padding_right: host.style(&body, STYLE_PADDING_RIGHT),
            });
        }
        host.set_style(&body, STYLE_PADDING_RIGHT, SCROLLBAR_COMPENSATION)?;
        host.set_style(&body, STYLE_OVERFLOW_Y, OVERFLOW_HIDDEN)?;
        debug!(event = "modal.scroll.locked");
        Ok(())
    }

    pub fn unlock<H: DomHost>(&mut self, host: &H) -> Result<(), ModalError> {
        let body = host.body()?;
        let saved = self.saved.take();
        let restore = |value: Option<&String>| match value {
            Some(v) if !v.is_empty() => v.clone(),
            _ => CSS_INITIAL.to_string(),
        };

        // `overflow` is a shorthand and resets `overflow-y`, so it goes first.
        host.set_style(
            &body,
            STYLE_OVERFLOW,
            &restore(saved.as_ref().map(|s| &s.overflow)),
        )?;
        if let Some(s) = saved.as_ref().filter(|s| !s.overflow_y.is_empty()) {
            host.set_style(&body, STYLE_OVERFLOW_Y, &s.overflow_y)?;
        }
        host.set_style(
            &body,
            STYLE_PADDING_RIGHT,
            &restore(saved.as_ref().map(|s| &s.padding_right)),
        )?;
        debug!(event = "modal.scroll.unlocked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockDom;

    #[test]
    fn ensure_creates_one_hidden_backdrop() {
        let dom = MockDom::new();
        let mut backdrop = Backdrop::new();

        let first = backdrop.ensure(&dom, Some("dim")).unwrap();
        let second = backdrop.ensure(&dom, Some("other")).unwrap();

        assert_eq!(first, second);
        assert_eq!(dom.find_all_by_class(CSS_MODAL_CONTAINER).len(), 1);
        assert!(dom.has_class(&first, "dim"));
        assert!(!dom.has_class(&first, "other"));
        assert!(!dom.is_visible(&first));
        assert_eq!(dom.parent(&first), Some(dom.body().unwrap()));
        assert_eq!(dom.listener_count(), 2);
    }

    #[test]
    fn ensure_leaves_an_owned_backdrop_alone() {
        let dom = MockDom::new();
        let mut backdrop = Backdrop::new();
        let node = backdrop.ensure(&dom, None).unwrap();
        backdrop.claim("a");
        dom.set_visible(&node, true).unwrap();

        backdrop.ensure(&dom, None).unwrap();
        assert!(dom.is_visible(&node));
    }

    #[test]
    fn ownership_is_exclusive() {
        let mut backdrop: Backdrop<usize> = Backdrop::new();
        assert_eq!(backdrop.claim("a"), None);
        assert_eq!(backdrop.claim("a"), None);
        assert_eq!(backdrop.claim("b"), Some("a".to_string()));

        assert!(!backdrop.release("a"));
        assert_eq!(backdrop.owner(), Some("b"));
        assert!(backdrop.release("b"));
        assert_eq!(backdrop.owner(), None);
        assert!(backdrop.release("a"));
    }

    #[test]
    fn unlock_restores_snapshot() {
        let dom = MockDom::new();
        let body = dom.body().unwrap();
        dom.set_style(&body, STYLE_OVERFLOW, "auto").unwrap();
        dom.set_style(&body, STYLE_PADDING_RIGHT, "4px").unwrap();

        let mut lock = ScrollLock::default();
        lock.lock(&dom).unwrap();
        lock.lock(&dom).unwrap();
        assert!(lock.is_locked());
        assert_eq!(dom.style(&body, STYLE_OVERFLOW_Y), "hidden");
        assert_eq!(dom.style(&body, STYLE_PADDING_RIGHT), "16px");

        lock.unlock(&dom).unwrap();
        assert!(!lock.is_locked());
        assert_eq!(dom.style(&body, STYLE_OVERFLOW), "auto");
        assert_eq!(dom.style(&body, STYLE_PADDING_RIGHT), "4px");
    }

    #[test]
    fn unlock_without_lock_writes_initial() {
        let dom = MockDom::new();
        let body = dom.body().unwrap();

        ScrollLock::default().unlock(&dom).unwrap();
        assert_eq!(dom.style(&body, STYLE_OVERFLOW), "initial");
        assert_eq!(dom.style(&body, STYLE_PADDING_RIGHT), "initial");
    }
}
