//! CSS selector parsing and matching.
//!
//! Used in two places: matching declared components/directives against
//! template elements, and resolving `find()` queries against the rendered
//! tree. Supports the subset the host framework's selectors use: element
//! names, classes, attributes (with optional values), `:not(...)` groups and
//! comma-separated unions.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShallowError};

static SELECTOR_REGEXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\:not\()|(([\.\#]?)[-\w]+)|(?:\[([-.\w*\\$]+)(?:=(?:"([^"]*)"|'([^']*)'|([^\]]*)))?\])|(\))|(\s*,\s*)"#).unwrap()
});

// Capture-group indices in SELECTOR_REGEXP.
const GROUP_NOT: usize = 1;
const GROUP_TAG: usize = 2;
const GROUP_PREFIX: usize = 3;
const GROUP_ATTRIBUTE: usize = 4;
const GROUP_ATTR_VALUE_DOUBLE: usize = 5;
const GROUP_ATTR_VALUE_SINGLE: usize = 6;
const GROUP_ATTR_VALUE_UNQUOTED: usize = 7;
const GROUP_NOT_END: usize = 8;
const GROUP_SEPARATOR: usize = 9;

/// One parsed CSS selector. Attributes are stored as (name, value) pairs; an
/// empty value means "attribute present, any value".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CssSelector {
    pub element: Option<String>,
    pub class_names: Vec<String>,
    pub attrs: Vec<(String, String)>,
    pub not_selectors: Vec<CssSelector>,
}

impl CssSelector {
    pub fn new() -> CssSelector {
        CssSelector::default()
    }

    pub fn set_element(&mut self, element: &str) {
        self.element = Some(element.to_string());
    }

    pub fn add_class_name(&mut self, name: &str) {
        self.class_names.push(name.to_string());
    }

    pub fn add_attribute(&mut self, name: &str, value: &str) {
        self.attrs.push((name.to_string(), value.to_string()));
    }

    /// Parses a selector string into its comma-separated alternatives.
    pub fn parse(selector: &str) -> Result<Vec<CssSelector>> {
        let mut results = Vec::new();
        let mut current = CssSelector::new();
        let mut in_not = false;

        for cap in SELECTOR_REGEXP.captures_iter(selector) {
            if cap.get(GROUP_NOT).is_some() {
                if in_not {
                    return Err(ShallowError::SelectorParse(
                        "nesting :not in a selector is not allowed".to_string(),
                    ));
                }
                in_not = true;
                current.not_selectors.push(CssSelector::new());
            }

            if let Some(tag_match) = cap.get(GROUP_TAG) {
                let tag = tag_match.as_str();
                let prefix = cap.get(GROUP_PREFIX).map(|m| m.as_str()).unwrap_or("");
                let target = if in_not {
                    current.not_selectors.last_mut().unwrap()
                } else {
                    &mut current
                };
                if prefix == "#" {
                    target.add_attribute("id", &tag[1..]);
                } else if prefix == "." {
                    target.add_class_name(&tag[1..]);
                } else {
                    target.set_element(tag);
                }
            }

            if let Some(attr_match) = cap.get(GROUP_ATTRIBUTE) {
                let value = cap
                    .get(GROUP_ATTR_VALUE_DOUBLE)
                    .or_else(|| cap.get(GROUP_ATTR_VALUE_SINGLE))
                    .or_else(|| cap.get(GROUP_ATTR_VALUE_UNQUOTED))
                    .map(|m| m.as_str())
                    .unwrap_or("");
                let target = if in_not {
                    current.not_selectors.last_mut().unwrap()
                } else {
                    &mut current
                };
                target.add_attribute(attr_match.as_str(), value);
            }

            if cap.get(GROUP_NOT_END).is_some() {
                in_not = false;
            }

            if cap.get(GROUP_SEPARATOR).is_some() {
                if in_not {
                    return Err(ShallowError::SelectorParse(
                        "multiple selectors in :not are not supported".to_string(),
                    ));
                }
                push_result(&mut results, std::mem::take(&mut current));
            }
        }
        push_result(&mut results, current);
        Ok(results)
    }

    /// True when this selector can match an element purely by tag name.
    pub fn is_element_selector(&self) -> bool {
        self.element.is_some()
            && self.class_names.is_empty()
            && self.attrs.is_empty()
            && self.not_selectors.is_empty()
    }

    /// Matches `self` (a declared selector) against an element described by
    /// `element` (tag + actual attributes/classes).
    pub fn matches(&self, element: &CssSelector) -> bool {
        if let Some(tag) = &self.element {
            if tag != "*" {
                match &element.element {
                    Some(el_tag) if el_tag == tag => {}
                    _ => return false,
                }
            }
        }
        for class in &self.class_names {
            if !element.class_names.iter().any(|c| c == class) {
                return false;
            }
        }
        for (name, value) in &self.attrs {
            let found = element.attrs.iter().find(|(n, _)| n == name);
            match found {
                Some((_, actual)) => {
                    if !value.is_empty() && actual != value {
                        return false;
                    }
                }
                None => return false,
            }
        }
        for not_sel in &self.not_selectors {
            if not_sel.matches(element) {
                return false;
            }
        }
        true
    }
}

fn push_result(results: &mut Vec<CssSelector>, mut selector: CssSelector) {
    if !selector.not_selectors.is_empty()
        && selector.element.is_none()
        && selector.class_names.is_empty()
        && selector.attrs.is_empty()
    {
        selector.element = Some("*".to_string());
    }
    results.push(selector);
}

/// True when any alternative of `selector` matches the element description.
pub fn matches_selector(selector: &str, element: &CssSelector) -> Result<bool> {
    let parsed = CssSelector::parse(selector)?;
    Ok(parsed.iter().any(|s| s.matches(element)))
}
