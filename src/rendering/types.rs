//! Common data types used across the rendering subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How an element is located on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Selector {
    Css(String),
    XPath(String),
}

impl Selector {
    pub fn css(value: &str) -> Self {
        Selector::Css(value.to_string())
    }

    pub fn xpath(value: &str) -> Self {
        Selector::XPath(value.to_string())
    }

    /// Button-like element whose normalised text equals `text`, ignoring case.
    pub fn button_text(text: &str) -> Self {
        let lowered = text.to_lowercase();
        Selector::XPath(format!(
            "//*[self::button or self::a or @role='button'][translate(normalize-space(.), \
             'ABCDEFGHIJKLMNOPQRSTUVWXYZÀÁÂÃÇÉÊÍÓÔÕÚ', 'abcdefghijklmnopqrstuvwxyzàáâãçéêíóôõú')={}]",
            xpath_literal(&lowered)
        ))
    }

    /// WebDriver locator strategy name.
    pub fn strategy(&self) -> &'static str {
        match self {
            Selector::Css(_) => "css selector",
            Selector::XPath(_) => "xpath",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            Selector::Css(v) | Selector::XPath(v) => v,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Css(v) => write!(f, "css:{}", v),
            Selector::XPath(v) => write!(f, "xpath:{}", v),
        }
    }
}

/// Quotes `text` as an XPath 1.0 string literal. XPath has no escapes, so text
/// holding both quote kinds is split into a `concat()`.
fn xpath_literal(text: &str) -> String {
    if !text.contains('\'') {
        return format!("'{}'", text);
    }
    if !text.contains('"') {
        return format!("\"{}\"", text);
    }
    let parts: Vec<String> = text
        .split('\'')
        .map(|part| format!("'{}'", part))
        .collect();
    format!("concat({})", parts.join(", \"'\", "))
}

/// Page readiness signal awaited after navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The load event fired.
    Load,
    /// Load fired and no new network requests started for a quiet window.
    NetworkSettled,
}

/// Opaque reference to an element inside a render session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    pub id: String,
    pub selector: Selector,
}
