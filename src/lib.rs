//! Overlay modal dialogs for existing page elements.
//!
//! Any element with an id can be turned into a dialog: it gets a title bar
//! with close / maximize controls, is moved into a single page-wide dimming
//! backdrop when shown, and closes on Escape or a click outside it.
//!
//! ```js
//! import init, { modal } from "./pkg/modal_overlay.js";
//! await init();
//! // <button id="open_dialog" rel="#dialog">Open</button>
//! modal(document.getElementById("open_dialog"), { title: "Hello" });
//! modal(document.getElementById("dialog"), "close");
//! ```

pub mod backdrop;
pub mod config;
pub mod constants;
pub mod dom;
pub mod error;
pub mod modal;
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(test)]
mod testing;

pub use config::{CustomClasses, Hook, HookKind, ModalConfig, ModalOptions};
pub use dom::{ClickOutcome, DomHost, Listener, ModalEvent};
pub use error::ModalError;
pub use modal::{ModalArg, ModalCommand, ModalInstance, Modals};

#[cfg(target_arch = "wasm32")]
mod bindings {
    use wasm_bindgen::prelude::*;
    use wasm_bindgen::JsCast;
    use web_sys::{Element, Node};

    use crate::modal::{ModalArg, ModalCommand};
    use crate::web::{install_console_logging, parse_options, with_modals};

    #[wasm_bindgen(start)]
    pub fn start() {
        // Initialize better panic messages
        console_error_panic_hook::set_once();
    }

    fn to_arg(option: &JsValue) -> Result<ModalArg<Node>, JsValue> {
        if let Some(name) = option.as_string() {
            let command: ModalCommand = name.parse()?;
            return Ok(ModalArg::Command(command));
        }
        if option.is_object() {
            return Ok(ModalArg::Options(parse_options(option)?));
        }
        Ok(ModalArg::None)
    }

    /// Entry point for a single element.
    ///
    /// * `option` object: build options (trigger or dialog element).
    /// * `option` string: `"show"`, `"close"` or `"destroy"`.
    #[wasm_bindgen]
    pub fn modal(element: &Element, option: JsValue) -> Result<(), JsValue> {
        let arg = to_arg(&option)?;
        let node: &Node = element.as_ref();
        with_modals(|m| m.modal(node, arg))?;
        Ok(())
    }

    /// Apply `modal` to every element matching `selector`.
    #[wasm_bindgen(js_name = modalAll)]
    pub fn modal_all(selector: &str, option: JsValue) -> Result<(), JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        let list = document.query_selector_all(selector)?;
        for i in 0..list.length() {
            let Some(element) = list.item(i).and_then(|n| n.dyn_into::<Element>().ok()) else {
                continue;
            };
            modal(&element, option.clone())?;
        }
        Ok(())
    }

    /// Route `tracing` output at or above `level` to the browser console.
    #[wasm_bindgen(js_name = initLogging)]
    pub fn init_logging(level: &str) -> Result<(), JsValue> {
        install_console_logging(level)?;
        Ok(())
    }
}
