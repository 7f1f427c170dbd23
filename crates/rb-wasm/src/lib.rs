//! WebAssembly bindings for ResultBlocker
//!
//! Exposes the rule engine to the browser content script. The script owns
//! the live DOM and its observers; these bindings keep the active settings
//! and rules in module state and answer rule queries against them.

use std::cell::RefCell;

use wasm_bindgen::prelude::*;

use rb_core::rules::{parse_rules_from_text, should_block};
use rb_core::settings::Settings;
use rb_core::url::domain_of;
use rb_core::validate::validate_regex_pattern;

#[derive(Default)]
struct EngineState {
    settings: Settings,
    rules: Vec<String>,
}

thread_local! {
    static STATE: RefCell<EngineState> = RefCell::new(EngineState::default());
}

fn parse_settings(settings_json: &str) -> Result<Settings, JsValue> {
    serde_json::from_str(settings_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid settings: {e}")))
}

/// Install settings and rules. Safe to call again on storage changes.
#[wasm_bindgen]
pub fn init(settings_json: &str, rules_text: &str) -> Result<(), JsValue> {
    let settings = parse_settings(settings_json)?;
    STATE.with(|state| {
        let mut state = state.borrow_mut();
        state.settings = settings;
        state.rules = parse_rules_from_text(rules_text);
    });
    Ok(())
}

#[wasm_bindgen]
pub fn update_settings(settings_json: &str) -> Result<(), JsValue> {
    let settings = parse_settings(settings_json)?;
    STATE.with(|state| state.borrow_mut().settings = settings);
    Ok(())
}

#[wasm_bindgen]
pub fn update_rules(rules_text: &str) {
    STATE.with(|state| state.borrow_mut().rules = parse_rules_from_text(rules_text));
}

/// The rule blocking `url`, or `undefined` when nothing matches or the
/// engine is disabled.
#[wasm_bindgen]
pub fn blocking_rule(url: &str) -> Option<String> {
    STATE.with(|state| {
        let state = state.borrow();
        if !state.settings.enabled {
            return None;
        }
        let matched = should_block(url, &state.rules).map(str::to_string);
        if state.settings.debug_mode {
            if let Some(rule) = &matched {
                web_sys::console::log_2(
                    &JsValue::from_str("[ResultBlocker] matched"),
                    &JsValue::from_str(rule),
                );
            }
        }
        matched
    })
}

/// Pattern validation result as `{valid, reason?, message?}`.
#[wasm_bindgen]
pub fn validate_pattern(pattern: &str) -> JsValue {
    let result = js_sys::Object::new();
    match validate_regex_pattern(pattern) {
        Ok(()) => {
            let _ = js_sys::Reflect::set(&result, &"valid".into(), &JsValue::from(true));
        }
        Err(issue) => {
            let _ = js_sys::Reflect::set(&result, &"valid".into(), &JsValue::from(false));
            let _ = js_sys::Reflect::set(&result, &"reason".into(), &JsValue::from_str(issue.code()));
            let _ = js_sys::Reflect::set(
                &result,
                &"message".into(),
                &JsValue::from_str(&issue.to_string()),
            );
        }
    }
    result.into()
}

/// Split rule text into an ordered rule array.
#[wasm_bindgen]
pub fn parse_rules(text: &str) -> js_sys::Array {
    parse_rules_from_text(text)
        .into_iter()
        .map(JsValue::from)
        .collect()
}

/// Hostname of `url`, empty when unparsable.
#[wasm_bindgen]
pub fn active_domain(url: &str) -> String {
    domain_of(url)
}
