// Markup contract shared by the modal core and the DOM host.  Style sheets
// target these names, so treat them as public API.

// Generated regions
pub const CSS_MODAL_HEAD: &str = "modalHead";
pub const CSS_MODAL_BODY: &str = "modalBody";
pub const CSS_MODAL_TITLE: &str = "modalTitle";
pub const CSS_MODAL_CONTAINER: &str = "modalContainer";
pub const CSS_MODAL_CONTENT: &str = "modalContent";

// Head controls
pub const CSS_CLOSE: &str = "close";
pub const CSS_RESIZE: &str = "resize-modal";
pub const CSS_ICON_MAXIMIZE: &str = "icon-window-maximize";
pub const CSS_ICON_RESTORE: &str = "icon-window-restore";
pub const DEFAULT_CLOSE_ICON: &str = "icon-cancel";

// Attributes
pub const ATTR_FOR: &str = "for";
pub const ATTR_REL: &str = "rel";
pub const ATTR_DISMISS: &str = "data-dismiss";
pub const DISMISS_MODAL: &str = "modal";
pub const ATTR_TYPE: &str = "type";
pub const BUTTON_TYPE_BUTTON: &str = "button";

// Default title is a non-breaking space so the head keeps its line height.
pub const DEFAULT_TITLE: &str = "\u{a0}";

// Sizing
pub const MAXIMIZED_HEIGHT: &str = "97vh";
pub const MAXIMIZED_WIDTH: &str = "97vw";
pub const MAX_HEIGHT_UNSET: &str = "unset";

// Scroll lock
pub const SCROLLBAR_COMPENSATION: &str = "16px";
pub const OVERFLOW_HIDDEN: &str = "hidden";
pub const CSS_INITIAL: &str = "initial";

// Style properties
pub const STYLE_HEIGHT: &str = "height";
pub const STYLE_WIDTH: &str = "width";
pub const STYLE_MAX_HEIGHT: &str = "max-height";
pub const STYLE_OVERFLOW: &str = "overflow";
pub const STYLE_OVERFLOW_Y: &str = "overflow-y";
pub const STYLE_PADDING_RIGHT: &str = "padding-right";

pub const KEY_ESCAPE: &str = "Escape";
