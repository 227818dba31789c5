use shallow_render::selector::{matches_selector, CssSelector};

#[cfg(test)]
mod tests {
    use super::*;

    // Helper to describe a rendered element for matching
    fn element(tag: &str, attrs: Vec<(&str, &str)>, classes: &str) -> CssSelector {
        let mut desc = CssSelector::new();
        desc.set_element(tag);
        for (name, value) in attrs {
            desc.add_attribute(name, value);
        }
        for class in classes.split_whitespace() {
            desc.add_class_name(class);
        }
        desc
    }

    #[test]
    fn should_parse_element_selectors() {
        let parsed = CssSelector::parse("some-tag").unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].element.as_deref(), Some("some-tag"));
        assert!(parsed[0].is_element_selector());
    }

    #[test]
    fn should_parse_classes_and_attributes() {
        let parsed = CssSelector::parse("div.warn[role]").unwrap();
        assert_eq!(parsed[0].element.as_deref(), Some("div"));
        assert_eq!(parsed[0].class_names, vec!["warn".to_string()]);
        assert_eq!(parsed[0].attrs, vec![("role".to_string(), String::new())]);
        assert!(!parsed[0].is_element_selector());
    }

    #[test]
    fn should_parse_attribute_values() {
        let parsed = CssSelector::parse("[type=\"text\"]").unwrap();
        assert_eq!(
            parsed[0].attrs,
            vec![("type".to_string(), "text".to_string())]
        );
        let single = CssSelector::parse("[type='radio']").unwrap();
        assert_eq!(
            single[0].attrs,
            vec![("type".to_string(), "radio".to_string())]
        );
    }

    #[test]
    fn should_parse_not_groups() {
        let parsed = CssSelector::parse("input:not(.hidden)").unwrap();
        assert_eq!(parsed[0].element.as_deref(), Some("input"));
        assert_eq!(parsed[0].not_selectors.len(), 1);
        assert_eq!(parsed[0].not_selectors[0].class_names, vec!["hidden".to_string()]);
    }

    #[test]
    fn should_parse_comma_separated_unions() {
        let parsed = CssSelector::parse("a, button[disabled]").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].element.as_deref(), Some("a"));
        assert_eq!(parsed[1].element.as_deref(), Some("button"));
    }

    #[test]
    fn should_reject_nested_not() {
        assert!(CssSelector::parse(":not(:not(div))").is_err());
    }

    #[test]
    fn should_match_by_tag_name() {
        assert!(matches_selector("child", &element("child", vec![], "")).unwrap());
        assert!(!matches_selector("child", &element("other", vec![], "")).unwrap());
    }

    #[test]
    fn should_match_by_class() {
        assert!(matches_selector(".row", &element("p", vec![], "row wide")).unwrap());
        assert!(!matches_selector(".row", &element("p", vec![], "wide")).unwrap());
    }

    #[test]
    fn should_match_attribute_presence_and_value() {
        let desc = element("input", vec![("type", "text")], "");
        assert!(matches_selector("[type]", &desc).unwrap());
        assert!(matches_selector("[type=text]", &desc).unwrap());
        assert!(!matches_selector("[type=radio]", &desc).unwrap());
        assert!(!matches_selector("[missing]", &desc).unwrap());
    }

    #[test]
    fn should_reject_when_not_group_matches() {
        let desc = element("input", vec![], "hidden");
        assert!(!matches_selector("input:not(.hidden)", &desc).unwrap());
        assert!(matches_selector("input:not(.shown)", &desc).unwrap());
    }

    #[test]
    fn should_match_any_union_alternative() {
        let desc = element("button", vec![("disabled", "")], "");
        assert!(matches_selector("a, button[disabled]", &desc).unwrap());
    }

    #[test]
    fn should_treat_bare_not_as_wildcard() {
        let desc = element("span", vec![], "");
        assert!(matches_selector(":not(.hidden)", &desc).unwrap());
    }
}
