//! Modal lifecycle.
//!
//! `Modals` owns every modal on the page: the element-id → instance map, the
//! shared backdrop and the body scroll lock.  Each instance moves through
//!
//! ```text
//! init ──▶ hidden ◀──▶ shown
//!             │          │
//!             └──────────┴──▶ destroyed (root emptied, instance dropped)
//! ```
//!
//! All operations are synchronous and run on the UI thread.  No `RefCell`
//! borrow is held while a hook runs or an event is emitted, so hooks and
//! external `show`/`close`/`destroy` listeners may call back into `Modals`.

use std::cell::{Cell, Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::backdrop::{Backdrop, ScrollLock};
use crate::config::{HookKind, ModalConfig, ModalOptions};
use crate::constants::{
    ATTR_DISMISS, ATTR_FOR, ATTR_REL, ATTR_TYPE, BUTTON_TYPE_BUTTON, CSS_CLOSE, CSS_ICON_MAXIMIZE,
    CSS_ICON_RESTORE, CSS_INITIAL, CSS_MODAL_BODY, CSS_MODAL_CONTENT, CSS_MODAL_HEAD,
    CSS_MODAL_TITLE, CSS_RESIZE, DISMISS_MODAL, KEY_ESCAPE, MAXIMIZED_HEIGHT, MAXIMIZED_WIDTH,
    MAX_HEIGHT_UNSET, STYLE_HEIGHT, STYLE_MAX_HEIGHT, STYLE_WIDTH,
};
use crate::dom::{ClickOutcome, DomHost, Listener, ModalEvent};
use crate::error::ModalError;

/// Operations reachable by name from the JS entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalCommand {
    Show,
    Close,
    Destroy,
}

impl FromStr for ModalCommand {
    type Err = ModalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "show" => Ok(ModalCommand::Show),
            "close" => Ok(ModalCommand::Close),
            "destroy" => Ok(ModalCommand::Destroy),
            other => Err(ModalError::UnknownCommand {
                name: other.to_string(),
            }),
        }
    }
}

/// Argument accepted by `Modals::modal`.
pub enum ModalArg<N> {
    None,
    Options(ModalOptions<N>),
    Command(ModalCommand),
}

/// One wrapped dialog element.
pub struct ModalInstance<N> {
    id: String,
    root: N,
    head: N,
    title: N,
    resize: Option<N>,
    body: N,
    config: RefCell<ModalConfig<N>>,
    maximized: Cell<bool>,
}

impl<N> ModalInstance<N> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> &N {
        &self.root
    }

    pub fn head(&self) -> &N {
        &self.head
    }

    pub fn body(&self) -> &N {
        &self.body
    }

    pub fn resize_control(&self) -> Option<&N> {
        self.resize.as_ref()
    }

    pub fn config(&self) -> Ref<'_, ModalConfig<N>> {
        self.config.borrow()
    }

    pub fn is_maximized(&self) -> bool {
        self.maximized.get()
    }
}

pub struct Modals<H: DomHost> {
    host: H,
    backdrop: RefCell<Backdrop<H::Node>>,
    scroll_lock: RefCell<ScrollLock>,
    instances: RefCell<HashMap<String, Rc<ModalInstance<H::Node>>>>,
}

impl<H: DomHost> Modals<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            backdrop: RefCell::new(Backdrop::new()),
            scroll_lock: RefCell::new(ScrollLock::default()),
            instances: RefCell::new(HashMap::new()),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn instance(&self, id: &str) -> Option<Rc<ModalInstance<H::Node>>> {
        self.instances.borrow().get(id).cloned()
    }

    pub fn backdrop(&self) -> Option<H::Node> {
        self.backdrop.borrow().node().cloned()
    }

    pub fn backdrop_owner(&self) -> Option<String> {
        self.backdrop.borrow().owner().map(str::to_string)
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.instance(id)
            .map(|inst| self.host.is_visible(&inst.root))
            .unwrap_or(false)
    }

    /// Single entry point mirroring the markup-facing API.
    ///
    /// * An element with a `rel` attribute is a trigger: its target gets an
    ///   instance and a click on the trigger shows it.
    /// * Options on an element without an instance construct one, and show
    ///   it when `autoOpen` is set; on an existing instance they go to `show`.
    /// * A command runs against an existing instance.
    pub fn modal(&self, element: &H::Node, arg: ModalArg<H::Node>) -> Result<(), ModalError> {
        if self.host.attribute(element, ATTR_REL).is_some() {
            let options = match arg {
                ModalArg::Options(options) => Some(options),
                _ => None,
            };
            return self.bind_trigger(element, options);
        }

        let id = self.host.element_id(element).ok_or(ModalError::MissingId)?;
        let existing = self.instance(&id);
        match (arg, existing) {
            (ModalArg::Options(options), None) => {
                let inst = self.init(element, &options)?;
                let auto_open = inst.config.borrow().auto_open;
                if auto_open {
                    self.show(&id, None)?;
                }
                Ok(())
            }
            (ModalArg::Options(options), Some(_)) => self.show(&id, Some(&options)),
            (ModalArg::Command(command), Some(_)) => self.run(&id, command),
            (ModalArg::Command(command), None) => {
                debug!(event = "modal.command.no_instance", id = %id, command = ?command);
                Ok(())
            }
            (ModalArg::None, _) => Ok(()),
        }
    }

    pub fn run(&self, id: &str, command: ModalCommand) -> Result<(), ModalError> {
        match command {
            ModalCommand::Show => self.show(id, None),
            ModalCommand::Close => self.close(id),
            ModalCommand::Destroy => self.destroy(id),
        }
    }

    /// Wrap `root` in a modal.  Returns the existing instance if `root`
    /// already has one.
    pub fn init(
        &self,
        root: &H::Node,
        options: &ModalOptions<H::Node>,
    ) -> Result<Rc<ModalInstance<H::Node>>, ModalError> {
        let id = self.host.element_id(root).ok_or(ModalError::MissingId)?;
        if let Some(existing) = self.instance(&id) {
            return Ok(existing);
        }

        let (vw, vh) = self.host.viewport_size();
        let mut config = ModalConfig::new(vw, vh);
        config.merge(options);

        if let Some(hook) = config.hooks.get(HookKind::OnInit) {
            if let Err(err) = hook(root) {
                warn!(event = "modal.hook.failed", id = %id, hook = "onInit", error = %err);
            }
        }

        self.backdrop
            .borrow_mut()
            .ensure(&self.host, config.custom_classes.container.as_deref())?;

        let head = match self.scoped_region(root, CSS_MODAL_HEAD, &id) {
            Some(head) => head,
            None => self.build_head(root, &id, &config)?,
        };
        let title = match self.find_class(&head, CSS_MODAL_TITLE) {
            Some(title) => title,
            None => self.wrap_title(&head)?,
        };
        let resize = self.find_class(&head, CSS_RESIZE);

        let body = match self.scoped_region(root, CSS_MODAL_BODY, &id) {
            Some(body) => body,
            None => self.build_body(root, &head, &id, &config)?,
        };

        self.host.set_visible(root, false)?;
        self.host.listen(Listener::RootClick {
            root: root.clone(),
            id: id.clone(),
        })?;

        let inst = Rc::new(ModalInstance {
            id: id.clone(),
            root: root.clone(),
            head,
            title,
            resize,
            body,
            config: RefCell::new(config),
            maximized: Cell::new(false),
        });
        self.instances.borrow_mut().insert(id.clone(), inst.clone());
        debug!(event = "modal.instance.initialized", id = %id);
        Ok(inst)
    }

    pub fn show(&self, id: &str, options: Option<&ModalOptions<H::Node>>) -> Result<(), ModalError> {
        let Some(inst) = self.instance(id) else {
            warn!(event = "modal.show.no_instance", id = id);
            return Ok(());
        };

        if let Some(options) = options {
            inst.config.borrow_mut().merge(options);
            if options.touches_layout() {
                self.refresh_layout(&inst)?;
            }
        }
        if self.host.is_visible(&inst.root) {
            return Ok(());
        }

        self.run_hook(&inst, HookKind::BeforeShow);

        let content_class = inst.config.borrow().custom_classes.content.clone();
        self.host.add_class(&inst.root, CSS_MODAL_CONTENT)?;
        if let Some(class) = content_class {
            self.host.add_class(&inst.root, &class)?;
        }

        let (_, viewport_height) = self.host.viewport_size();
        if self.host.body_scroll_height() > viewport_height {
            self.scroll_lock.borrow_mut().lock(&self.host)?;
        }

        let container_class = inst.config.borrow().custom_classes.container.clone();
        let backdrop = self
            .backdrop
            .borrow_mut()
            .ensure(&self.host, container_class.as_deref())?;
        self.host.append_child(&backdrop, &inst.root)?;
        self.backdrop.borrow_mut().claim(id);

        self.host.set_visible(&inst.root, true)?;
        self.host.set_visible(&backdrop, true)?;
        debug!(event = "modal.instance.shown", id = id);

        self.host.emit(&inst.root, ModalEvent::Show)?;
        self.run_hook(&inst, HookKind::OnShow);
        Ok(())
    }

    pub fn close(&self, id: &str) -> Result<(), ModalError> {
        let Some(inst) = self.instance(id) else {
            return Ok(());
        };
        if !self.host.is_visible(&inst.root) {
            return Ok(());
        }

        self.run_hook(&inst, HookKind::BeforeClose);
        self.host.set_visible(&inst.root, false)?;

        // An obscured modal closing underneath the owner leaves the backdrop
        // up. The scroll lock is reverted on every close.
        let released = self.backdrop.borrow_mut().release(id);
        if released {
            self.hide_backdrop()?;
        }
        self.scroll_lock.borrow_mut().unlock(&self.host)?;
        debug!(event = "modal.instance.closed", id = id, released_backdrop = released);

        self.run_hook(&inst, HookKind::OnClose);
        self.host.emit(&inst.root, ModalEvent::Close)?;

        let destroy_on_hide = inst.config.borrow().destroy_on_hide;
        if destroy_on_hide {
            self.destroy(id)?;
        }
        Ok(())
    }

    /// Tear the instance down and empty its root.  Irreversible.
    pub fn destroy(&self, id: &str) -> Result<(), ModalError> {
        let Some(inst) = self.instance(id) else {
            return Ok(());
        };

        self.run_hook(&inst, HookKind::OnDestroy);
        self.host.emit(&inst.root, ModalEvent::Destroy)?;
        self.host.unlisten_root(id);
        self.instances.borrow_mut().remove(id);

        let owned = self.backdrop.borrow().owner() == Some(id);
        if owned {
            self.backdrop.borrow_mut().release(id);
            self.hide_backdrop()?;
            self.scroll_lock.borrow_mut().unlock(&self.host)?;
        }

        self.host.clear_children(&inst.root)?;
        debug!(event = "modal.instance.destroyed", id = id);
        Ok(())
    }

    /// Flip between the configured size and near-fullscreen.  Returns the
    /// new maximized state.
    pub fn toggle_maximize(&self, id: &str) -> Result<bool, ModalError> {
        let Some(inst) = self.instance(id) else {
            return Ok(false);
        };

        let maximize = !inst.maximized.get();
        let root = &inst.root;
        if maximize {
            self.host.set_style(root, STYLE_HEIGHT, MAXIMIZED_HEIGHT)?;
            self.host.set_style(root, STYLE_WIDTH, MAXIMIZED_WIDTH)?;
            self.host.set_style(root, STYLE_MAX_HEIGHT, MAX_HEIGHT_UNSET)?;
        } else {
            let (height, width) = {
                let config = inst.config.borrow();
                (config.height.clone(), config.width.clone())
            };
            self.host.set_style(root, STYLE_HEIGHT, &height)?;
            self.host.set_style(root, STYLE_WIDTH, &width)?;
            self.host.set_style(root, STYLE_MAX_HEIGHT, CSS_INITIAL)?;
        }

        if let Some(control) = &inst.resize {
            let (from, to) = if maximize {
                (CSS_ICON_MAXIMIZE, CSS_ICON_RESTORE)
            } else {
                (CSS_ICON_RESTORE, CSS_ICON_MAXIMIZE)
            };
            self.host.remove_class(control, from)?;
            self.host.add_class(control, to)?;
        }

        inst.maximized.set(maximize);
        debug!(event = "modal.instance.resized", id = id, maximized = maximize);
        Ok(maximize)
    }

    /// Click bubbling through a modal root: dismiss and resize controls.
    pub fn on_root_click(&self, id: &str, target: &H::Node) -> Result<ClickOutcome, ModalError> {
        let Some(inst) = self.instance(id) else {
            return Ok(ClickOutcome::default());
        };
        // Shown content swallows its clicks so the backdrop never sees them.
        let mut outcome = ClickOutcome {
            prevent_default: false,
            stop_propagation: self.host.has_class(&inst.root, CSS_MODAL_CONTENT),
        };

        if self.closest(target, &inst.root, |node| {
            self.host.attribute(node, ATTR_DISMISS).as_deref() == Some(DISMISS_MODAL)
        }) {
            outcome.prevent_default = true;
            self.close(id)?;
        } else if self.closest(target, &inst.root, |node| self.host.has_class(node, CSS_RESIZE)) {
            outcome.prevent_default = true;
            self.toggle_maximize(id)?;
        }
        Ok(outcome)
    }

    /// Click on the backdrop closes the owning modal unless the click landed
    /// inside its root.
    pub fn on_backdrop_click(&self, target: &H::Node) -> Result<ClickOutcome, ModalError> {
        let outcome = ClickOutcome {
            prevent_default: false,
            stop_propagation: true,
        };
        let Some(owner) = self.backdrop_owner() else {
            return Ok(outcome);
        };
        let Some(inst) = self.instance(&owner) else {
            return Ok(outcome);
        };
        if !self.host.contains(&inst.root, target) {
            debug!(event = "modal.dismiss.outside_click", id = %owner);
            self.close(&owner)?;
        }
        Ok(outcome)
    }

    /// Page-wide keydown; Escape closes the backdrop owner only.
    pub fn on_keydown(&self, key: &str) -> Result<(), ModalError> {
        if key != KEY_ESCAPE {
            return Ok(());
        }
        match self.backdrop_owner() {
            Some(owner) => {
                debug!(event = "modal.dismiss.escape", id = %owner);
                self.close(&owner)
            }
            None => Ok(()),
        }
    }

    pub fn on_trigger_click(
        &self,
        target_id: &str,
        options: Option<&ModalOptions<H::Node>>,
    ) -> Result<ClickOutcome, ModalError> {
        self.show(target_id, options)?;
        Ok(ClickOutcome {
            prevent_default: true,
            stop_propagation: false,
        })
    }

    fn bind_trigger(
        &self,
        trigger: &H::Node,
        options: Option<ModalOptions<H::Node>>,
    ) -> Result<(), ModalError> {
        let selector = self.host.attribute(trigger, ATTR_REL).unwrap_or_default();
        let target = self
            .host
            .query_selector(&selector)?
            .ok_or_else(|| ModalError::TargetNotFound {
                selector: selector.clone(),
            })?;
        let target_id = self.host.element_id(&target).ok_or(ModalError::MissingId)?;

        if self.instance(&target_id).is_none() {
            let defaults = ModalOptions::default();
            self.init(&target, options.as_ref().unwrap_or(&defaults))?;
            let auto_open = options.as_ref().and_then(|o| o.auto_open) == Some(true);
            if auto_open {
                self.show(&target_id, None)?;
            }
        }

        self.host.listen(Listener::TriggerClick {
            trigger: trigger.clone(),
            target_id: target_id.clone(),
            options,
        })?;
        debug!(event = "modal.trigger.bound", target = %target_id);
        Ok(())
    }

    fn build_head(
        &self,
        root: &H::Node,
        id: &str,
        config: &ModalConfig<H::Node>,
    ) -> Result<H::Node, ModalError> {
        let host = &self.host;
        let head = host.create_element("div")?;
        host.add_class(&head, CSS_MODAL_HEAD)?;
        host.set_attribute(&head, ATTR_FOR, id)?;
        if let Some(class) = &config.custom_classes.head {
            host.add_class(&head, class)?;
        }

        let title = host.create_element("span")?;
        host.add_class(&title, CSS_MODAL_TITLE)?;
        host.set_text(&title, &config.title);
        host.append_child(&head, &title)?;

        let close = host.create_element("button")?;
        host.set_attribute(&close, ATTR_TYPE, BUTTON_TYPE_BUTTON)?;
        host.add_class(&close, CSS_CLOSE)?;
        host.set_attribute(&close, ATTR_DISMISS, DISMISS_MODAL)?;
        host.add_class(&close, &config.close_icon_class)?;
        if let Some(class) = &config.custom_classes.close {
            host.add_class(&close, class)?;
        }
        host.append_child(&head, &close)?;

        if config.show_maximize_control {
            let resize = host.create_element("button")?;
            host.set_attribute(&resize, ATTR_TYPE, BUTTON_TYPE_BUTTON)?;
            host.add_class(&resize, CSS_ICON_MAXIMIZE)?;
            host.add_class(&resize, CSS_RESIZE)?;
            host.append_child(&head, &resize)?;
        }

        host.prepend_child(root, &head)?;
        Ok(head)
    }

    fn build_body(
        &self,
        root: &H::Node,
        head: &H::Node,
        id: &str,
        config: &ModalConfig<H::Node>,
    ) -> Result<H::Node, ModalError> {
        let host = &self.host;
        host.set_style(root, STYLE_HEIGHT, &config.height)?;
        host.set_style(root, STYLE_WIDTH, &config.width)?;

        let body = host.create_element("div")?;
        host.add_class(&body, CSS_MODAL_BODY)?;
        host.set_attribute(&body, ATTR_FOR, id)?;
        if let Some(class) = &config.custom_classes.body {
            host.add_class(&body, class)?;
        }
        for child in host.children(root) {
            if child != *head {
                host.append_child(&body, &child)?;
            }
        }
        host.append_child(root, &body)?;
        Ok(body)
    }

    /// Move a prebuilt head's bare title text into a title span so later
    /// title overrides have a node to render into.  Controls stay put.
    fn wrap_title(&self, head: &H::Node) -> Result<H::Node, ModalError> {
        let host = &self.host;
        let title = host.create_element("span")?;
        host.add_class(&title, CSS_MODAL_TITLE)?;
        for child in host.children(head) {
            let control = host.attribute(&child, ATTR_DISMISS).is_some()
                || host.has_class(&child, CSS_RESIZE);
            if !control {
                host.append_child(&title, &child)?;
            }
        }
        host.prepend_child(head, &title)?;
        debug!(event = "modal.instance.title_wrapped");
        Ok(title)
    }

    /// Re-render the title and, unless maximized, the configured size.
    fn refresh_layout(&self, inst: &ModalInstance<H::Node>) -> Result<(), ModalError> {
        let (title, height, width) = {
            let config = inst.config.borrow();
            (config.title.clone(), config.height.clone(), config.width.clone())
        };
        self.host.set_text(&inst.title, &title);
        if !inst.maximized.get() {
            self.host.set_style(&inst.root, STYLE_HEIGHT, &height)?;
            self.host.set_style(&inst.root, STYLE_WIDTH, &width)?;
        }
        Ok(())
    }

    fn hide_backdrop(&self) -> Result<(), ModalError> {
        match self.backdrop() {
            Some(backdrop) => self.host.set_visible(&backdrop, false),
            None => Ok(()),
        }
    }

    fn run_hook(&self, inst: &ModalInstance<H::Node>, kind: HookKind) {
        let hook = inst.config.borrow().hooks.get(kind);
        if let Some(hook) = hook {
            if let Err(err) = hook(&inst.root) {
                warn!(
                    event = "modal.hook.failed",
                    id = %inst.id,
                    hook = kind.as_str(),
                    error = %err
                );
            }
        }
    }

    /// Direct child of `root` carrying `class` and `for="{id}"`.
    fn scoped_region(&self, root: &H::Node, class: &str, id: &str) -> Option<H::Node> {
        self.host.children(root).into_iter().find(|child| {
            self.host.has_class(child, class)
                && self.host.attribute(child, ATTR_FOR).as_deref() == Some(id)
        })
    }

    fn find_class(&self, scope: &H::Node, class: &str) -> Option<H::Node> {
        for child in self.host.children(scope) {
            if self.host.has_class(&child, class) {
                return Some(child);
            }
            if let Some(found) = self.find_class(&child, class) {
                return Some(found);
            }
        }
        None
    }

    /// Whether `target` or an ancestor up to and including `root` matches.
    fn closest(&self, target: &H::Node, root: &H::Node, matches: impl Fn(&H::Node) -> bool) -> bool {
        let mut current = Some(target.clone());
        while let Some(node) = current {
            if matches(&node) {
                return true;
            }
            if node == *root {
                return false;
            }
            current = self.host.parent(&node);
        }
        false
    }
}
