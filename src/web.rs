//! Browser host: `DomHost` over `web_sys`, the page-wide `Modals` registry
//! and the glue that turns plain JS option objects into `ModalOptions`.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, EventInit, EventTarget, HtmlElement, KeyboardEvent, Node, Window};

use crate::config::{HookKind, ModalOptions};
use crate::dom::{ClickOutcome, DomHost, Listener, ModalEvent};
use crate::error::ModalError;
use crate::modal::Modals;

struct BoundListener {
    root_id: Option<String>,
    target: EventTarget,
    event: &'static str,
    closure: Closure<dyn FnMut(Event)>,
}

// Attached closures live here so `destroy` can detach them again.
thread_local! {
    static MODALS: Modals<WebDom> = Modals::new(WebDom);
    static LISTENERS: RefCell<Vec<BoundListener>> = RefCell::new(Vec::new());
}

/// Run `f` against the page-wide modal registry.
pub fn with_modals<R>(f: impl FnOnce(&Modals<WebDom>) -> R) -> R {
    MODALS.with(f)
}

fn window() -> Result<Window, ModalError> {
    web_sys::window().ok_or_else(|| ModalError::dom("no global `window` exists"))
}

fn document() -> Result<Document, ModalError> {
    window()?
        .document()
        .ok_or_else(|| ModalError::dom("window has no document"))
}

fn as_element(node: &Node) -> Result<&Element, ModalError> {
    node.dyn_ref::<Element>()
        .ok_or_else(|| ModalError::dom(format!("{} is not an element", node.node_name())))
}

fn as_html(node: &Node) -> Result<&HtmlElement, ModalError> {
    node.dyn_ref::<HtmlElement>()
        .ok_or_else(|| ModalError::dom(format!("{} is not an HTML element", node.node_name())))
}

fn apply_outcome(event: &Event, outcome: ClickOutcome) {
    if outcome.prevent_default {
        event.prevent_default();
    }
    if outcome.stop_propagation {
        event.stop_propagation();
    }
}

fn event_target(event: &Event) -> Option<Node> {
    event.target().and_then(|t| t.dyn_into::<Node>().ok())
}

/// `DomHost` backed by the live document.
pub struct WebDom;

impl WebDom {
    fn bind(
        &self,
        target: EventTarget,
        event: &'static str,
        root_id: Option<String>,
        handler: impl FnMut(Event) + 'static,
    ) -> Result<(), ModalError> {
        let closure = Closure::<dyn FnMut(Event)>::wrap(Box::new(handler));
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        LISTENERS.with(|listeners| {
            listeners.borrow_mut().push(BoundListener {
                root_id,
                target,
                event,
                closure,
            });
        });
        Ok(())
    }
}

impl DomHost for WebDom {
    type Node = Node;

    fn create_element(&self, tag: &str) -> Result<Node, ModalError> {
        Ok(document()?.create_element(tag)?.into())
    }

    fn body(&self) -> Result<Node, ModalError> {
        document()?
            .body()
            .map(Into::into)
            .ok_or_else(|| ModalError::dom("document has no body"))
    }

    fn query_selector(&self, selector: &str) -> Result<Option<Node>, ModalError> {
        Ok(document()?.query_selector(selector)?.map(Into::into))
    }

    fn element_id(&self, node: &Node) -> Option<String> {
        node.dyn_ref::<Element>()
            .map(Element::id)
            .filter(|id| !id.is_empty())
    }

    fn parent(&self, node: &Node) -> Option<Node> {
        node.parent_node()
    }

    fn children(&self, node: &Node) -> Vec<Node> {
        let list = node.child_nodes();
        (0..list.length()).filter_map(|i| list.item(i)).collect()
    }

    fn contains(&self, ancestor: &Node, node: &Node) -> bool {
        ancestor.contains(Some(node))
    }

    fn append_child(&self, parent: &Node, child: &Node) -> Result<(), ModalError> {
        parent.append_child(child)?;
        Ok(())
    }

    fn prepend_child(&self, parent: &Node, child: &Node) -> Result<(), ModalError> {
        parent.insert_before(child, parent.first_child().as_ref())?;
        Ok(())
    }

    fn clear_children(&self, node: &Node) -> Result<(), ModalError> {
        node.set_text_content(None);
        Ok(())
    }

    fn set_text(&self, node: &Node, text: &str) {
        node.set_text_content(Some(text));
    }

    fn add_class(&self, node: &Node, class: &str) -> Result<(), ModalError> {
        let list = as_element(node)?.class_list();
        for class in class.split_whitespace() {
            list.add_1(class)?;
        }
        Ok(())
    }

    fn remove_class(&self, node: &Node, class: &str) -> Result<(), ModalError> {
        as_element(node)?.class_list().remove_1(class)?;
        Ok(())
    }

    fn has_class(&self, node: &Node, class: &str) -> bool {
        node.dyn_ref::<Element>()
            .map(|el| el.class_list().contains(class))
            .unwrap_or(false)
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        node.dyn_ref::<Element>().and_then(|el| el.get_attribute(name))
    }

    fn set_attribute(&self, node: &Node, name: &str, value: &str) -> Result<(), ModalError> {
        as_element(node)?.set_attribute(name, value)?;
        Ok(())
    }

    fn style(&self, node: &Node, property: &str) -> String {
        node.dyn_ref::<HtmlElement>()
            .and_then(|el| el.style().get_property_value(property).ok())
            .unwrap_or_default()
    }

    fn set_style(&self, node: &Node, property: &str, value: &str) -> Result<(), ModalError> {
        as_html(node)?.style().set_property(property, value)?;
        Ok(())
    }

    fn set_visible(&self, node: &Node, visible: bool) -> Result<(), ModalError> {
        let el = as_html(node)?;
        let style = el.style();
        if !visible {
            style.set_property("display", "none")?;
            return Ok(());
        }
        style.remove_property("display")?;
        // A stylesheet may still hide it.
        let computed = window()?
            .get_computed_style(el)?
            .and_then(|s| s.get_property_value("display").ok());
        if computed.as_deref() == Some("none") {
            style.set_property("display", "block")?;
        }
        Ok(())
    }

    fn is_visible(&self, node: &Node) -> bool {
        self.style(node, "display") != "none"
    }

    fn emit(&self, node: &Node, event: ModalEvent) -> Result<(), ModalError> {
        let init = EventInit::new();
        init.set_bubbles(true);
        let event = Event::new_with_event_init_dict(event.as_str(), &init)?;
        node.dispatch_event(&event)?;
        Ok(())
    }

    fn listen(&self, listener: Listener<Node>) -> Result<(), ModalError> {
        match listener {
            Listener::RootClick { root, id } => {
                let root_id = id.clone();
                self.bind(root.into(), "click", Some(root_id), move |event: Event| {
                    let Some(target) = event_target(&event) else {
                        return;
                    };
                    match with_modals(|m| m.on_root_click(&id, &target)) {
                        Ok(outcome) => apply_outcome(&event, outcome),
                        Err(err) => warn!(event = "modal.web.root_click_failed", id = %id, error = %err),
                    }
                })
            }
            Listener::BackdropClick { backdrop } => {
                self.bind(backdrop.into(), "click", None, move |event: Event| {
                    let Some(target) = event_target(&event) else {
                        return;
                    };
                    match with_modals(|m| m.on_backdrop_click(&target)) {
                        Ok(outcome) => apply_outcome(&event, outcome),
                        Err(err) => warn!(event = "modal.web.backdrop_click_failed", error = %err),
                    }
                })
            }
            Listener::Keydown => {
                let target: EventTarget = document()?.into();
                self.bind(target, "keydown", None, move |event: Event| {
                    let Some(key) = event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key) else {
                        return;
                    };
                    if let Err(err) = with_modals(|m| m.on_keydown(&key)) {
                        warn!(event = "modal.web.keydown_failed", error = %err);
                    }
                })
            }
            Listener::TriggerClick {
                trigger,
                target_id,
                options,
            } => self.bind(trigger.into(), "click", None, move |event: Event| {
                match with_modals(|m| m.on_trigger_click(&target_id, options.as_ref())) {
                    Ok(outcome) => apply_outcome(&event, outcome),
                    Err(err) => {
                        warn!(event = "modal.web.trigger_click_failed", target = %target_id, error = %err)
                    }
                }
            }),
        }
    }

    fn unlisten_root(&self, id: &str) {
        let removed: Vec<BoundListener> = LISTENERS.with(|listeners| {
            let mut listeners = listeners.borrow_mut();
            let (removed, kept): (Vec<_>, Vec<_>) = listeners
                .drain(..)
                .partition(|l| l.root_id.as_deref() == Some(id));
            *listeners = kept;
            removed
        });
        for listener in removed {
            let _ = listener.target.remove_event_listener_with_callback(
                listener.event,
                listener.closure.as_ref().unchecked_ref(),
            );
            // The closure may be the one currently on the stack (a dismiss
            // click that ends in destroy), so it cannot be dropped here.
            listener.closure.forget();
        }
    }

    fn viewport_size(&self) -> (f64, f64) {
        let Ok(window) = window() else {
            return (0.0, 0.0);
        };
        if let Some(viewport) = window.visual_viewport() {
            return (viewport.width(), viewport.height());
        }
        let read = |v: Result<JsValue, JsValue>| v.ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        (read(window.inner_width()), read(window.inner_height()))
    }

    fn body_scroll_height(&self) -> f64 {
        document()
            .ok()
            .and_then(|d| d.body())
            .map(|b| b.scroll_height() as f64)
            .unwrap_or(0.0)
    }
}

/// Build `ModalOptions` from a plain JS object.  Data fields go through
/// serde; function-valued hook keys are picked up with `Reflect`.
pub fn parse_options(value: &JsValue) -> Result<ModalOptions<Node>, ModalError> {
    let mut options: ModalOptions<Node> = serde_wasm_bindgen::from_value(value.clone())
        .map_err(|e| ModalError::InvalidOptions {
            message: e.to_string(),
        })?;

    for kind in HookKind::ALL {
        let Ok(candidate) = js_sys::Reflect::get(value, &JsValue::from_str(kind.as_str())) else {
            continue;
        };
        let Some(function) = candidate.dyn_ref::<js_sys::Function>().cloned() else {
            continue;
        };
        options.hooks.set(
            kind,
            Rc::new(move |root: &Node| {
                function
                    .call0(root)
                    .map(|_| ())
                    .map_err(|e| ModalError::Hook {
                        hook: kind.as_str(),
                        message: e.as_string().unwrap_or_else(|| format!("{:?}", e)),
                    })
            }),
        );
    }
    Ok(options)
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Route `tracing` events at or above `level` (`"trace"` .. `"error"`) to
/// the browser console through `tracing-wasm`.
pub fn install_console_logging(level: &str) -> Result<(), ModalError> {
    let level = level
        .parse::<tracing::Level>()
        .map_err(|e| ModalError::InvalidOptions {
            message: format!("log level '{}': {}", level, e),
        })?;
    let config = tracing_wasm::WASMLayerConfigBuilder::new()
        .set_max_level(level)
        .build();
    tracing_subscriber::registry()
        .with(tracing_wasm::WASMLayer::new(config))
        .try_init()
        .map_err(|e| ModalError::dom(e.to_string()))
}
