pub mod script_constants;

pub use script_constants::{ScriptConstants, HEADING_REGEX};

/// 去掉首尾空白后为空的名字视为未声明
pub fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
