//! Display-policy stylesheet.
//!
//! The marking contract only toggles data attributes; this stylesheet is
//! what turns them into hidden or blurred results. The host injects it into
//! the page under [`STYLE_ID`] and swaps its content when the display mode
//! changes.

use rb_core::settings::DisplayMode;

use crate::mark::{BLOCKED_ATTR, REVEALED_ATTR, SHOW_BUTTON_ATTR};

/// Element id of the injected `<style>` tag.
pub const STYLE_ID: &str = "rb-blocker-style";

/// Stylesheet text for the given display mode.
pub fn style_content(mode: DisplayMode) -> String {
    match mode {
        DisplayMode::Hide => {
            format!("[{BLOCKED_ATTR}=\"true\"] {{ display: none !important; }}\n")
        }
        DisplayMode::Blur => format!(
            r#"[{b}="true"] {{
  max-height: 120px !important;
  overflow: hidden !important;
  position: relative !important;
}}
[{b}="true"] *:not([{s}="true"]) {{
  filter: blur(4px) !important;
}}
[{b}="true"][{r}="true"] {{
  max-height: none !important;
  overflow: visible !important;
}}
[{b}="true"][{r}="true"] * {{
  filter: none !important;
}}
[{b}="true"] [{s}="true"] {{
  position: absolute !important;
  top: 8px !important;
  right: 8px !important;
  z-index: 2147483647 !important;
  filter: none !important;
  background: #1a73e8 !important;
  color: #fff !important;
  border: none !important;
  border-radius: 6px !important;
  padding: 6px 10px !important;
  font-size: 12px !important;
  cursor: pointer !important;
}}
[{b}="true"][{r}="true"] [{s}="true"] {{
  display: none !important;
}}
"#,
            b = BLOCKED_ATTR,
            r = REVEALED_ATTR,
            s = SHOW_BUTTON_ATTR,
        ),
    }
}
