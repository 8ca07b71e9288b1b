// Removability configuration.
//
// Mirrors the `removableSections` block of the upstream page-loader config
// document, so it deserializes straight out of the loaded YAML/JSON. The
// loader itself is the caller's concern.

use serde::Deserialize;

/// Which subtrees to strip from the document while parsing.
///
/// Template entries match the transclusion target literally
/// (case-insensitive), or as a case-insensitive regex when wrapped in
/// `/…/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RemovableSections {
    /// CSS classes; a tag carrying any of them is removed.
    pub classes: Vec<String>,
    /// RDFa values matched against a tag's single `typeof`/`rel` token.
    pub rdfa: Vec<String>,
    /// Template names or `/…/` regexes matched against the transclusion
    /// target.
    pub templates: Vec<String>,
}

impl RemovableSections {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.rdfa.is_empty() && self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_from_config_json() {
        let config: RemovableSections = serde_json::from_str(
            r#"{"classes": ["navbox", "metadata"], "templates": ["/^infobox/", "coord"]}"#,
        )
        .unwrap();
        assert_eq!(config.classes, ["navbox", "metadata"]);
        assert!(config.rdfa.is_empty());
        assert_eq!(config.templates, ["/^infobox/", "coord"]);
    }

    #[test]
    fn test_default_is_empty() {
        assert!(RemovableSections::default().is_empty());
    }
}
