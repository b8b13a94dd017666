//! Modal configuration.
//!
//! `ModalConfig` is the resolved, per-instance configuration.  It starts from
//! viewport-derived defaults and is refined by layering `ModalOptions` on top,
//! once at construction and again whenever `show` receives overrides.
//!
//! `ModalOptions` deserializes from the same camelCase keys the markup-facing
//! JS API accepts (`autoOpen`, `customClasses.modalHead`, `showMaximize`, …).
//! Hooks cannot travel through serde; the wasm layer extracts them from the
//! JS object separately and stores them in `ModalOptions::hooks`.

use std::fmt;
use std::rc::Rc;

use serde::Deserialize;

use crate::constants::{DEFAULT_CLOSE_ICON, DEFAULT_TITLE};
use crate::error::ModalError;

/// Lifecycle callback.  Receives the modal's root element.
pub type Hook<N> = Rc<dyn Fn(&N) -> Result<(), ModalError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    OnInit,
    BeforeShow,
    OnShow,
    BeforeClose,
    OnClose,
    OnDestroy,
}

impl HookKind {
    pub const ALL: [HookKind; 6] = [
        HookKind::OnInit,
        HookKind::BeforeShow,
        HookKind::OnShow,
        HookKind::BeforeClose,
        HookKind::OnClose,
        HookKind::OnDestroy,
    ];

    /// Option key used by the JS surface.
    pub fn as_str(self) -> &'static str {
        match self {
            HookKind::OnInit => "onInit",
            HookKind::BeforeShow => "beforeShow",
            HookKind::OnShow => "onShow",
            HookKind::BeforeClose => "beforeClose",
            HookKind::OnClose => "onClose",
            HookKind::OnDestroy => "onDestroy",
        }
    }
}

pub struct Hooks<N> {
    pub on_init: Option<Hook<N>>,
    pub before_show: Option<Hook<N>>,
    pub on_show: Option<Hook<N>>,
    pub before_close: Option<Hook<N>>,
    pub on_close: Option<Hook<N>>,
    pub on_destroy: Option<Hook<N>>,
}

impl<N> Hooks<N> {
    pub fn get(&self, kind: HookKind) -> Option<Hook<N>> {
        self.slot(kind).clone()
    }

    pub fn set(&mut self, kind: HookKind, hook: Hook<N>) {
        *self.slot_mut(kind) = Some(hook);
    }

    fn slot(&self, kind: HookKind) -> &Option<Hook<N>> {
        match kind {
            HookKind::OnInit => &self.on_init,
            HookKind::BeforeShow => &self.before_show,
            HookKind::OnShow => &self.on_show,
            HookKind::BeforeClose => &self.before_close,
            HookKind::OnClose => &self.on_close,
            HookKind::OnDestroy => &self.on_destroy,
        }
    }

    fn slot_mut(&mut self, kind: HookKind) -> &mut Option<Hook<N>> {
        match kind {
            HookKind::OnInit => &mut self.on_init,
            HookKind::BeforeShow => &mut self.before_show,
            HookKind::OnShow => &mut self.on_show,
            HookKind::BeforeClose => &mut self.before_close,
            HookKind::OnClose => &mut self.on_close,
            HookKind::OnDestroy => &mut self.on_destroy,
        }
    }

    /// Overwrite every hook that `other` sets.
    fn merge(&mut self, other: &Hooks<N>) {
        for kind in HookKind::ALL {
            if let Some(hook) = other.get(kind) {
                self.set(kind, hook);
            }
        }
    }
}

impl<N> Default for Hooks<N> {
    fn default() -> Self {
        Self {
            on_init: None,
            before_show: None,
            on_show: None,
            before_close: None,
            on_close: None,
            on_destroy: None,
        }
    }
}

impl<N> Clone for Hooks<N> {
    fn clone(&self) -> Self {
        Self {
            on_init: self.on_init.clone(),
            before_show: self.before_show.clone(),
            on_show: self.on_show.clone(),
            before_close: self.before_close.clone(),
            on_close: self.on_close.clone(),
            on_destroy: self.on_destroy.clone(),
        }
    }
}

impl<N> fmt::Debug for Hooks<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set: Vec<&str> = HookKind::ALL
            .iter()
            .filter(|kind| self.slot(**kind).is_some())
            .map(|kind| kind.as_str())
            .collect();
        f.debug_tuple("Hooks").field(&set).finish()
    }
}

/// Extra classes applied to the generated markup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CustomClasses {
    #[serde(rename = "modalHead", default)]
    pub head: Option<String>,
    #[serde(rename = "modalBody", default)]
    pub body: Option<String>,
    #[serde(default)]
    pub close: Option<String>,
    #[serde(rename = "modalContainer", default)]
    pub container: Option<String>,
    #[serde(rename = "modalContent", default)]
    pub content: Option<String>,
}

impl CustomClasses {
    fn merge(&mut self, other: &CustomClasses) {
        fn take(dst: &mut Option<String>, src: &Option<String>) {
            if src.is_some() {
                dst.clone_from(src);
            }
        }
        take(&mut self.head, &other.head);
        take(&mut self.body, &other.body);
        take(&mut self.close, &other.close);
        take(&mut self.container, &other.container);
        take(&mut self.content, &other.content);
    }
}

/// Caller-supplied overrides.  Unset fields leave the config untouched.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase", bound(deserialize = ""))]
pub struct ModalOptions<N> {
    #[serde(default)]
    pub auto_open: Option<bool>,
    #[serde(default)]
    pub destroy_on_hide: Option<bool>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub custom_classes: Option<CustomClasses>,
    #[serde(rename = "closeIcon", default)]
    pub close_icon_class: Option<String>,
    #[serde(default)]
    pub height: Option<String>,
    #[serde(default)]
    pub width: Option<String>,
    #[serde(rename = "showMaximize", default)]
    pub show_maximize_control: Option<bool>,
    #[serde(skip)]
    pub hooks: Hooks<N>,
}

impl<N> ModalOptions<N> {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn size(mut self, height: impl Into<String>, width: impl Into<String>) -> Self {
        self.height = Some(height.into());
        self.width = Some(width.into());
        self
    }

    pub fn hook(mut self, kind: HookKind, hook: impl Fn(&N) -> Result<(), ModalError> + 'static) -> Self {
        self.hooks.set(kind, Rc::new(hook));
        self
    }

    /// Whether these overrides touch anything rendered in the head or the
    /// root element's size.
    pub(crate) fn touches_layout(&self) -> bool {
        self.title.is_some() || self.height.is_some() || self.width.is_some()
    }
}

impl<N> Default for ModalOptions<N> {
    fn default() -> Self {
        Self {
            auto_open: None,
            destroy_on_hide: None,
            title: None,
            custom_classes: None,
            close_icon_class: None,
            height: None,
            width: None,
            show_maximize_control: None,
            hooks: Hooks::default(),
        }
    }
}

impl<N> Clone for ModalOptions<N> {
    fn clone(&self) -> Self {
        Self {
            auto_open: self.auto_open,
            destroy_on_hide: self.destroy_on_hide,
            title: self.title.clone(),
            custom_classes: self.custom_classes.clone(),
            close_icon_class: self.close_icon_class.clone(),
            height: self.height.clone(),
            width: self.width.clone(),
            show_maximize_control: self.show_maximize_control,
            hooks: self.hooks.clone(),
        }
    }
}

impl<N> fmt::Debug for ModalOptions<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalOptions")
            .field("auto_open", &self.auto_open)
            .field("destroy_on_hide", &self.destroy_on_hide)
            .field("title", &self.title)
            .field("custom_classes", &self.custom_classes)
            .field("close_icon_class", &self.close_icon_class)
            .field("height", &self.height)
            .field("width", &self.width)
            .field("show_maximize_control", &self.show_maximize_control)
            .field("hooks", &self.hooks)
            .finish()
    }
}

pub struct ModalConfig<N> {
    pub auto_open: bool,
    pub destroy_on_hide: bool,
    pub title: String,
    pub custom_classes: CustomClasses,
    pub close_icon_class: String,
    /// CSS length, passed through unvalidated.
    pub height: String,
    /// CSS length, passed through unvalidated.
    pub width: String,
    pub show_maximize_control: bool,
    pub hooks: Hooks<N>,
}

impl<N> ModalConfig<N> {
    /// Defaults sized to half of the visual viewport.
    pub fn new(viewport_width: f64, viewport_height: f64) -> Self {
        Self {
            auto_open: true,
            destroy_on_hide: false,
            title: DEFAULT_TITLE.to_string(),
            custom_classes: CustomClasses::default(),
            close_icon_class: DEFAULT_CLOSE_ICON.to_string(),
            height: format!("{}px", viewport_height / 2.0),
            width: format!("{}px", viewport_width / 2.0),
            show_maximize_control: true,
            hooks: Hooks::default(),
        }
    }

    pub fn merge(&mut self, options: &ModalOptions<N>) {
        if let Some(v) = options.auto_open {
            self.auto_open = v;
        }
        if let Some(v) = options.destroy_on_hide {
            self.destroy_on_hide = v;
        }
        if let Some(v) = &options.title {
            self.title.clone_from(v);
        }
        if let Some(v) = &options.custom_classes {
            self.custom_classes.merge(v);
        }
        if let Some(v) = &options.close_icon_class {
            self.close_icon_class.clone_from(v);
        }
        if let Some(v) = &options.height {
            self.height.clone_from(v);
        }
        if let Some(v) = &options.width {
            self.width.clone_from(v);
        }
        if let Some(v) = options.show_maximize_control {
            self.show_maximize_control = v;
        }
        self.hooks.merge(&options.hooks);
    }
}

impl<N> fmt::Debug for ModalConfig<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalConfig")
            .field("auto_open", &self.auto_open)
            .field("destroy_on_hide", &self.destroy_on_hide)
            .field("title", &self.title)
            .field("custom_classes", &self.custom_classes)
            .field("close_icon_class", &self.close_icon_class)
            .field("height", &self.height)
            .field("width", &self.width)
            .field("show_maximize_control", &self.show_maximize_control)
            .field("hooks", &self.hooks)
            .finish()
    }
}
