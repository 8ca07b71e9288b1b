// Contextualizer — a pushdown automaton over the open-tag stack that
// classifies the region being parsed, per the MediaWiki DOM spec
// (https://www.mediawiki.org/wiki/Specs/HTML).

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};

use crate::config::RemovableSections;
use crate::tag::TagRef;
use crate::trace::trace;

/// Classification of the currently open region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    /// Immediate child region of `<body>`.
    Section,
    /// Translatable prose; the only region where segmentation fires.
    ContentBranch,
    /// Figure internals.
    Media,
    /// Inline file/image/video/audio span internals.
    MediaInline,
    /// Transclusion output; passed through untouched.
    Verbatim,
    /// Configured-away content; dropped from the document.
    Removable,
}

/// Tracks the context of the innermost open tag.
pub trait Contextualizer {
    /// Push the context for a tag being opened.
    fn on_open_tag(&mut self, tag: &TagRef);
    /// Pop on close.
    fn on_close_tag(&mut self);
    /// Context of the innermost open tag (`None` outside any classified
    /// region).
    fn context(&self) -> Option<Context>;
    /// Whether sentences may be segmented here.
    fn can_segment(&self) -> bool;
    /// Whether the subtree rooted at `tag` should be dropped entirely.
    fn is_removable(&mut self, tag: &TagRef) -> bool;
}

static TRANSCLUSION_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)(mw:Transclusion|mw:Placeholder)\b").unwrap());

static MEDIA_TYPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)(mw:File|mw:Image|mw:Video|mw:Audio)\b").unwrap());

const CONTENT_BRANCH_NODE_NAMES: [&str; 17] = [
    "blockquote", "h1", "h2", "h3", "h4", "h5", "h6", "p", "pre", "div", "table", "ol", "ul",
    "dl", "figure", "center", "section",
];

enum TemplateMatcher {
    /// Lowercased literal name.
    Literal(String),
    /// Compiled from a `/…/` config entry.
    Pattern(Regex),
}

/// Contextualizer for MediaWiki DOM HTML.
pub struct MwContextualizer {
    contexts: Vec<Option<Context>>,
    classes: Vec<String>,
    rdfa: Vec<String>,
    templates: Vec<TemplateMatcher>,
    /// `about` values of removed transclusions, so their sibling fragments
    /// are removed too.
    removable_fragments: Vec<String>,
}

impl MwContextualizer {
    pub fn new() -> Self {
        Self::with_config(&RemovableSections::default())
    }

    pub fn with_config(config: &RemovableSections) -> Self {
        let templates = config
            .templates
            .iter()
            .filter_map(|entry| {
                if entry.len() > 1 && entry.starts_with('/') && entry.ends_with('/') {
                    RegexBuilder::new(&entry[1..entry.len() - 1])
                        .case_insensitive(true)
                        .build()
                        .ok()
                        .map(TemplateMatcher::Pattern)
                } else {
                    Some(TemplateMatcher::Literal(entry.to_lowercase()))
                }
            })
            .collect();
        MwContextualizer {
            contexts: Vec::new(),
            classes: config.classes.clone(),
            rdfa: config.rdfa.clone(),
            templates,
            removable_fragments: Vec::new(),
        }
    }

    fn has_config(&self) -> bool {
        !self.classes.is_empty() || !self.rdfa.is_empty() || !self.templates.is_empty()
    }

    /// The context a child of the current region gets; first match wins.
    fn child_context(&mut self, tag: &TagRef) -> Option<Context> {
        let context = self.context();

        if context == Some(Context::Removable) || self.is_removable(tag) {
            return Some(Context::Removable);
        }

        let tag = tag.borrow();
        let tag_type = match tag.attr("typeof") {
            Some(t) if !t.is_empty() => t,
            _ => tag.attr("rel").unwrap_or(""),
        };

        // Any descendant of a Transclusion/Placeholder is verbatim
        if context == Some(Context::Verbatim) || TRANSCLUSION_TYPE_RE.is_match(tag_type) {
            return Some(Context::Verbatim);
        }

        if tag.name == "figure" {
            return Some(Context::Media);
        }

        if tag.name == "span" && MEDIA_TYPE_RE.is_match(tag_type) {
            return Some(Context::MediaInline);
        }

        // Immediate children of body are sections
        if context.is_none() && tag.name == "body" {
            return Some(Context::Section);
        }

        // figure//figcaption is translatable prose
        if matches!(context, Some(Context::Media) | Some(Context::MediaInline))
            && tag.name == "figcaption"
        {
            return Some(Context::ContentBranch);
        }

        if matches!(context, Some(Context::Section) | None)
            && CONTENT_BRANCH_NODE_NAMES.contains(&tag.name.as_str())
        {
            return Some(Context::ContentBranch);
        }

        context
    }
}

impl Default for MwContextualizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Contextualizer for MwContextualizer {
    fn on_open_tag(&mut self, tag: &TagRef) {
        let context = self.child_context(tag);
        self.contexts.push(context);
    }

    fn on_close_tag(&mut self) {
        self.contexts.pop();
    }

    fn context(&self) -> Option<Context> {
        self.contexts.last().copied().flatten()
    }

    fn can_segment(&self) -> bool {
        self.context() == Some(Context::ContentBranch)
    }

    fn is_removable(&mut self, tag: &TagRef) -> bool {
        if !self.has_config() {
            return false;
        }

        let tag = tag.borrow();
        let about = tag.attr("about").filter(|v| !v.is_empty()).map(str::to_string);

        // Once a transclusion is removed, its fragments go with it
        if let Some(about) = &about {
            if self.removable_fragments.contains(about) {
                return true;
            }
        }

        let record_fragment = |fragments: &mut Vec<String>| {
            if let Some(about) = &about {
                fragments.push(about.clone());
            }
        };

        let class_list: Vec<&str> = tag.attr("class").unwrap_or("").split_whitespace().collect();
        if self
            .classes
            .iter()
            .any(|class| class_list.contains(&class.as_str()))
        {
            record_fragment(&mut self.removable_fragments);
            trace!(name = %tag.name, "removable by class");
            return true;
        }

        // An RDFa value only matches a tag whose typeof+rel is exactly that
        // one token
        let rdfa: Vec<&str> = tag
            .attr("typeof")
            .unwrap_or("")
            .split_whitespace()
            .chain(tag.attr("rel").unwrap_or("").split_whitespace())
            .collect();
        if rdfa.len() == 1 && self.rdfa.iter().any(|value| value.as_str() == rdfa[0]) {
            record_fragment(&mut self.removable_fragments);
            trace!(name = %tag.name, "removable by rdfa");
            return true;
        }

        let Some(data_mw) = tag.attr("data-mw").filter(|v| !v.is_empty()) else {
            return false;
        };
        // Invalid data-mw JSON means "not a removable template"
        let Ok(data_mw) = serde_json::from_str::<serde_json::Value>(data_mw) else {
            return false;
        };
        let Some(template_name) = data_mw
            .pointer("/parts/0/template/target/wt")
            .and_then(serde_json::Value::as_str)
            .filter(|name| !name.is_empty())
        else {
            return false;
        };

        let template_lower = template_name.to_lowercase();
        let hit = self.templates.iter().any(|matcher| match matcher {
            TemplateMatcher::Literal(literal) => *literal == template_lower,
            TemplateMatcher::Pattern(pattern) => pattern.is_match(template_name),
        });
        if hit {
            record_fragment(&mut self.removable_fragments);
            trace!(template = template_name, "removable by template");
            return true;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::Tag;

    fn open(ctx: &mut MwContextualizer, tag: Tag) {
        ctx.on_open_tag(&tag.into_shared());
    }

    #[test]
    fn test_body_is_section_context() {
        let mut ctx = MwContextualizer::new();
        open(&mut ctx, Tag::new("html"));
        assert_eq!(ctx.context(), None);
        open(&mut ctx, Tag::new("body"));
        assert_eq!(ctx.context(), Some(Context::Section));
    }

    #[test]
    fn test_paragraph_under_section_is_content_branch() {
        let mut ctx = MwContextualizer::new();
        open(&mut ctx, Tag::new("body"));
        open(&mut ctx, Tag::new("p"));
        assert_eq!(ctx.context(), Some(Context::ContentBranch));
        assert!(ctx.can_segment());
        ctx.on_close_tag();
        assert!(!ctx.can_segment());
    }

    #[test]
    fn test_inline_tags_inherit_content_branch() {
        let mut ctx = MwContextualizer::new();
        open(&mut ctx, Tag::new("body"));
        open(&mut ctx, Tag::new("p"));
        open(&mut ctx, Tag::new("b"));
        assert_eq!(ctx.context(), Some(Context::ContentBranch));
    }

    #[test]
    fn test_figure_and_figcaption() {
        let mut ctx = MwContextualizer::new();
        open(&mut ctx, Tag::new("body"));
        open(&mut ctx, Tag::new("figure"));
        assert_eq!(ctx.context(), Some(Context::Media));
        assert!(!ctx.can_segment());
        open(&mut ctx, Tag::new("figcaption"));
        assert_eq!(ctx.context(), Some(Context::ContentBranch));
    }

    #[test]
    fn test_media_inline_span() {
        let mut ctx = MwContextualizer::new();
        open(&mut ctx, Tag::new("body"));
        open(&mut ctx, Tag::new("p"));
        open(&mut ctx, Tag::with_attrs("span", [("typeof", "mw:File")]));
        assert_eq!(ctx.context(), Some(Context::MediaInline));
    }

    #[test]
    fn test_transclusion_is_verbatim_all_the_way_down() {
        let mut ctx = MwContextualizer::new();
        open(&mut ctx, Tag::new("body"));
        open(&mut ctx, Tag::with_attrs("div", [("typeof", "mw:Transclusion")]));
        assert_eq!(ctx.context(), Some(Context::Verbatim));
        open(&mut ctx, Tag::new("p"));
        assert_eq!(ctx.context(), Some(Context::Verbatim));
    }

    #[test]
    fn test_removable_by_class() {
        let config = RemovableSections {
            classes: vec!["navbox".to_string()],
            ..Default::default()
        };
        let mut ctx = MwContextualizer::with_config(&config);
        assert!(ctx.is_removable(
            &Tag::with_attrs("div", [("class", "plainlinks navbox")]).into_shared()
        ));
        assert!(!ctx.is_removable(&Tag::with_attrs("div", [("class", "navboxes")]).into_shared()));
    }

    #[test]
    fn test_removable_context_inherited() {
        let config = RemovableSections {
            classes: vec!["navbox".to_string()],
            ..Default::default()
        };
        let mut ctx = MwContextualizer::with_config(&config);
        open(&mut ctx, Tag::new("body"));
        open(&mut ctx, Tag::with_attrs("div", [("class", "navbox")]));
        assert_eq!(ctx.context(), Some(Context::Removable));
        open(&mut ctx, Tag::new("p"));
        assert_eq!(ctx.context(), Some(Context::Removable));
    }

    #[test]
    fn test_removable_by_rdfa_needs_single_token() {
        let config = RemovableSections {
            rdfa: vec!["mw:PageProp/Category".to_string()],
            ..Default::default()
        };
        let mut ctx = MwContextualizer::with_config(&config);
        assert!(ctx.is_removable(
            &Tag::with_attrs("link", [("rel", "mw:PageProp/Category")]).into_shared()
        ));
        // Two tokens: not removable
        assert!(!ctx.is_removable(
            &Tag::with_attrs("link", [("rel", "mw:PageProp/Category nofollow")]).into_shared()
        ));
    }

    #[test]
    fn test_removable_by_template_literal_and_regex() {
        let config = RemovableSections {
            templates: vec!["Coord".to_string(), "/^infobox/".to_string()],
            ..Default::default()
        };
        let mut ctx = MwContextualizer::with_config(&config);
        let coord = Tag::with_attrs(
            "span",
            [("data-mw", r#"{"parts":[{"template":{"target":{"wt":"coord"}}}]}"#)],
        );
        assert!(ctx.is_removable(&coord.into_shared()));

        let infobox = Tag::with_attrs(
            "table",
            [("data-mw", r#"{"parts":[{"template":{"target":{"wt":"Infobox settlement"}}}]}"#)],
        );
        assert!(ctx.is_removable(&infobox.into_shared()));

        let other = Tag::with_attrs(
            "span",
            [("data-mw", r#"{"parts":[{"template":{"target":{"wt":"cite web"}}}]}"#)],
        );
        assert!(!ctx.is_removable(&other.into_shared()));
    }

    #[test]
    fn test_invalid_data_mw_is_not_removable() {
        let config = RemovableSections {
            templates: vec!["coord".to_string()],
            ..Default::default()
        };
        let mut ctx = MwContextualizer::with_config(&config);
        assert!(!ctx.is_removable(&Tag::with_attrs("span", [("data-mw", "{not json")]).into_shared()));
    }

    #[test]
    fn test_fragments_of_removed_transclusions_are_removed() {
        let config = RemovableSections {
            classes: vec!["navbox".to_string()],
            ..Default::default()
        };
        let mut ctx = MwContextualizer::with_config(&config);
        assert!(ctx.is_removable(
            &Tag::with_attrs("div", [("class", "navbox"), ("about", "#mwt5")]).into_shared()
        ));
        // A later sibling with the same about but no matching class
        assert!(ctx.is_removable(&Tag::with_attrs("div", [("about", "#mwt5")]).into_shared()));
        assert!(!ctx.is_removable(&Tag::with_attrs("div", [("about", "#mwt6")]).into_shared()));
    }
}
