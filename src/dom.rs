//! The DOM seam.
//!
//! The modal core never touches `web_sys` directly.  Everything it needs from
//! the page (building elements, moving them around, class/style access,
//! dispatching events, wiring listeners) goes through `DomHost`, so the
//! lifecycle can be driven by the browser (`web::WebDom`) or by an in-memory
//! document in native unit tests.

use crate::config::ModalOptions;
use crate::error::ModalError;

/// Events emitted on a modal's root element after each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalEvent {
    Show,
    Close,
    Destroy,
}

impl ModalEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            ModalEvent::Show => "show",
            ModalEvent::Close => "close",
            ModalEvent::Destroy => "destroy",
        }
    }
}

/// A listener the modal subsystem asks the host to attach.  The host forwards
/// the matching DOM event to the corresponding `Modals::on_*` handler.
pub enum Listener<N> {
    /// Click anywhere inside a modal root → `Modals::on_root_click`.
    RootClick { root: N, id: String },
    /// Click on the shared backdrop → `Modals::on_backdrop_click`.
    BackdropClick { backdrop: N },
    /// Document-level keydown → `Modals::on_keydown`.  Bound once per page.
    Keydown,
    /// Click on a trigger element → `Modals::on_trigger_click`.
    TriggerClick {
        trigger: N,
        target_id: String,
        options: Option<ModalOptions<N>>,
    },
}

/// What the host should do with the DOM event after a handler ran.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClickOutcome {
    pub prevent_default: bool,
    pub stop_propagation: bool,
}

pub trait DomHost {
    type Node: Clone + PartialEq + 'static;

    fn create_element(&self, tag: &str) -> Result<Self::Node, ModalError>;
    fn body(&self) -> Result<Self::Node, ModalError>;
    fn query_selector(&self, selector: &str) -> Result<Option<Self::Node>, ModalError>;

    fn element_id(&self, node: &Self::Node) -> Option<String>;
    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;
    /// Child nodes including text nodes.
    fn children(&self, node: &Self::Node) -> Vec<Self::Node>;
    /// Inclusive, like `Node.contains`.
    fn contains(&self, ancestor: &Self::Node, node: &Self::Node) -> bool;

    /// Moves `child` if it is already attached elsewhere.
    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), ModalError>;
    fn prepend_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), ModalError>;
    fn clear_children(&self, node: &Self::Node) -> Result<(), ModalError>;
    fn set_text(&self, node: &Self::Node, text: &str);

    fn add_class(&self, node: &Self::Node, class: &str) -> Result<(), ModalError>;
    fn remove_class(&self, node: &Self::Node, class: &str) -> Result<(), ModalError>;
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), ModalError>;

    /// Inline style value, empty when unset.
    fn style(&self, node: &Self::Node, property: &str) -> String;
    fn set_style(&self, node: &Self::Node, property: &str, value: &str) -> Result<(), ModalError>;

    fn set_visible(&self, node: &Self::Node, visible: bool) -> Result<(), ModalError>;
    fn is_visible(&self, node: &Self::Node) -> bool;

    fn emit(&self, node: &Self::Node, event: ModalEvent) -> Result<(), ModalError>;

    fn listen(&self, listener: Listener<Self::Node>) -> Result<(), ModalError>;
    /// Detach the `RootClick` listener registered for `id`.
    fn unlisten_root(&self, id: &str);

    /// `(width, height)` of the visual viewport.
    fn viewport_size(&self) -> (f64, f64);
    fn body_scroll_height(&self) -> f64;
}
