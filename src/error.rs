#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModalError {
    #[error("Modal root element has no id; ids scope the generated head/body regions")]
    MissingId,

    #[error("Trigger target '{selector}' did not match any element")]
    TargetNotFound { selector: String },

    #[error("Unknown modal command '{name}'. Supported commands: show, close, destroy")]
    UnknownCommand { name: String },

    #[error("Invalid modal options: {message}")]
    InvalidOptions { message: String },

    #[error("DOM operation failed: {message}")]
    Dom { message: String },

    #[error("Hook '{hook}' failed: {message}")]
    Hook { hook: &'static str, message: String },
}

impl ModalError {
    pub fn dom(message: impl Into<String>) -> Self {
        Self::Dom {
            message: message.into(),
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl From<wasm_bindgen::JsValue> for ModalError {
    fn from(value: wasm_bindgen::JsValue) -> Self {
        Self::dom(
            value
                .as_string()
                .unwrap_or_else(|| format!("{:?}", value)),
        )
    }
}

#[cfg(target_arch = "wasm32")]
impl From<ModalError> for wasm_bindgen::JsValue {
    fn from(err: ModalError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}
