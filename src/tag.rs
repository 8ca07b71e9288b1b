// Tag model and HTML tag utilities.
//
// Tags are shared, mutable allocations (`TagRef`): the linearized document
// holds the same allocation in the open item, the close item, and every
// text chunk annotated by the tag. Several algorithms (common-tag prefix,
// render collapsing) compare tags by allocation identity via `Rc::ptr_eq`,
// not by structural equality.

use std::borrow::Cow;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

/// A shared handle to a mutable tag.
pub type TagRef = Rc<RefCell<Tag>>;

/// An HTML tag: lowercase name, insertion-ordered attributes, and a
/// self-closing marker for void elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tag {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub is_self_closing: bool,
}

impl Tag {
    /// Create a tag with no attributes.
    pub fn new(name: impl Into<String>) -> Self {
        Tag {
            name: name.into(),
            attributes: IndexMap::new(),
            is_self_closing: false,
        }
    }

    /// Create a tag from `(name, value)` attribute pairs.
    pub fn with_attrs<'a>(
        name: impl Into<String>,
        attrs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let mut tag = Tag::new(name);
        for (attr, value) in attrs {
            tag.attributes.insert(attr.to_string(), value.to_string());
        }
        tag
    }

    /// Move the tag into a shared handle.
    pub fn into_shared(self) -> TagRef {
        Rc::new(RefCell::new(self))
    }

    /// Attribute lookup by name.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Render the open tag. Attributes are emitted in ascending name order.
    pub fn open_html(&self) -> String {
        let mut html = String::with_capacity(self.name.len() + 2);
        html.push('<');
        html.push_str(&esc(&self.name));
        let mut names: Vec<&String> = self.attributes.keys().collect();
        names.sort();
        for attr in names {
            html.push(' ');
            html.push_str(&esc(attr));
            html.push_str("=\"");
            html.push_str(&esc_attr(&self.attributes[attr.as_str()]));
            html.push('"');
        }
        if self.is_self_closing {
            html.push_str(" /");
        }
        html.push('>');
        html
    }

    /// Render the close tag. Self-closing tags render as the empty string.
    pub fn close_html(&self) -> String {
        if self.is_self_closing {
            String::new()
        } else {
            format!("</{}>", esc(&self.name))
        }
    }
}

/// Escape text for inclusion in HTML, outside of a tag.
///
/// `&`, `<`, `>` become numeric entities, in that order, so an `&`
/// introduced by a later replacement is never re-escaped.
pub fn esc(s: &str) -> Cow<'_, str> {
    escape_with(s, |b| matches!(b, b'&' | b'<' | b'>'))
}

/// Escape text for inclusion in a double-quoted attribute value.
/// Additionally escapes `"` and `'`.
pub fn esc_attr(s: &str) -> Cow<'_, str> {
    escape_with(s, |b| matches!(b, b'"' | b'\'' | b'&' | b'<' | b'>'))
}

// Single pass over the bytes; indexing back into the &str is sound because
// every escaped character is single-byte ASCII, never part of a multi-byte
// UTF-8 sequence.
fn escape_with(s: &str, needs_escape: impl Fn(u8) -> bool) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    if !bytes.iter().any(|&b| needs_escape(b)) {
        return Cow::Borrowed(s);
    }

    let mut result = String::with_capacity(s.len() + 8);
    let mut last = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if needs_escape(b) {
            result.push_str(&s[last..i]);
            result.push_str("&#");
            result.push_str(entity_code(b));
            result.push(';');
            last = i + 1;
        }
    }
    result.push_str(&s[last..]);
    Cow::Owned(result)
}

fn entity_code(b: u8) -> &'static str {
    match b {
        b'&' => "38",
        b'<' => "60",
        b'>' => "62",
        b'"' => "34",
        b'\'' => "39",
        _ => unreachable!("unexpected escape byte"),
    }
}

/// Represent an annotation-tag stack as a single attribute value, for the
/// diagnostic XML dump.
pub(crate) fn dump_tags(tags: &[TagRef]) -> String {
    let mut tag_dumps = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.borrow();
        if tag.attributes.is_empty() {
            tag_dumps.push(tag.name.clone());
        } else {
            let mut attr_dumps: Vec<String> = tag
                .attributes
                .iter()
                .map(|(attr, value)| format!("{attr}={}", esc_attr(value)))
                .collect();
            attr_dumps.sort();
            tag_dumps.push(format!("{}:{}", tag.name, attr_dumps.join(",")));
        }
    }
    tag_dumps.join(" ")
}

static TRANSCLUSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|\s)(mw:Transclusion|mw:Placeholder)\b").unwrap());

/// Whether the tag is a MediaWiki reference span.
pub fn is_reference(tag: &Tag) -> bool {
    if (tag.name == "span" || tag.name == "sup") && tag.attr("typeof") == Some("mw:Extension/ref")
    {
        return true;
    }
    tag.name == "sup" && tag.attr("class") == Some("reference")
}

/// Whether the tag is a MediaWiki math span.
pub fn is_math(tag: &Tag) -> bool {
    (tag.name == "span" || tag.name == "sup") && tag.attr("typeof") == Some("mw:Extension/math")
}

/// Whether the tag is a MediaWiki gallery.
pub fn is_gallery(tag: &Tag) -> bool {
    tag.name == "ul" && tag.attr("typeof") == Some("mw:Extension/gallery")
}

/// Whether the tag is a rendered references list.
pub fn is_reference_list(tag: &Tag) -> bool {
    tag.name == "div"
        && tag.attr("typeof") == Some("mw:Extension/references")
        && tag.attr("data-mw").is_some_and(|v| !v.is_empty())
}

/// Whether the tag is a MediaWiki external link.
pub fn is_external_link(tag: &Tag) -> bool {
    let rel = tag.attr("rel").unwrap_or("");
    tag.name == "a" && format!(" {rel} ").contains(" mw:ExtLink ")
}

/// Whether the tag is an already-segmented sentence span.
pub fn is_segment(tag: &Tag) -> bool {
    tag.name == "span" && tag.attr("class") == Some("cx-segment")
}

/// Whether the tag is a template transclusion or placeholder.
pub fn is_transclusion(tag: &Tag) -> bool {
    TRANSCLUSION_RE.is_match(tag.attr("typeof").unwrap_or(""))
}

/// Whether the tag is a transclusion fragment: it carries `about` but no
/// `data-mw` of its own.
pub fn is_transclusion_fragment(tag: &Tag) -> bool {
    tag.attr("about").is_some_and(|v| !v.is_empty())
        && !tag.attr("data-mw").is_some_and(|v| !v.is_empty())
}

/// Whether the tag's content should not be sent to a translation service.
pub fn is_non_translatable(tag: &Tag) -> bool {
    if matches!(tag.name.as_str(), "style" | "svg" | "script") {
        return true;
    }
    if tag.attributes.is_empty() {
        return false;
    }

    const NON_TRANSLATABLE_RDFA: [&str; 4] = [
        "mw:Entity",
        "mw:Extension/math",
        "mw:Extension/references",
        "mw:Transclusion",
    ];
    tag.attr("rel")
        .unwrap_or("")
        .split_whitespace()
        .chain(tag.attr("typeof").unwrap_or("").split_whitespace())
        .any(|token| NON_TRANSLATABLE_RDFA.contains(&token))
}

/// Whether the tag name is an inline empty tag, to be carried as inline
/// content rather than as an annotation.
pub fn is_inline_empty_tag(tag_name: &str) -> bool {
    matches!(tag_name, "br" | "img" | "source" | "track" | "link" | "meta")
}

/// Whether the tag is a category page-property link.
pub fn is_category(tag: &Tag) -> bool {
    let rel = tag.attr("rel").unwrap_or("");
    tag.name == "link"
        && format!(" {rel} ").contains(" mw:PageProp/Category ")
        && !tag.attr("about").is_some_and(|v| !v.is_empty())
}

/// Whether the tag name is treated as block-level by default. Everything
/// else is an inline annotation tag.
pub(crate) fn is_block_tag(name: &str) -> bool {
    matches!(
        name,
        "html" | "head" | "body" | "script"
        // In HTML5+RDFa, link/meta are actually allowed anywhere in the body,
        // and are to be treated as void flow content (like <br> and <img>).
        | "title" | "style" | "meta" | "link" | "noscript" | "base"
        // non-visual content
        | "audio" | "data" | "datagrid" | "datalist" | "dialog" | "eventsource" | "form"
        | "iframe" | "main" | "menu" | "menuitem" | "optgroup" | "option"
        // paragraph
        | "div" | "p"
        // tables
        | "table" | "tbody" | "thead" | "tfoot" | "caption" | "th" | "tr" | "td"
        // lists
        | "ul" | "ol" | "li" | "dl" | "dt" | "dd"
        // HTML5 heading content
        | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "hgroup"
        // HTML5 sectioning content
        | "article" | "aside" | "nav" | "section" | "footer" | "header" | "figure"
        | "figcaption" | "fieldset" | "details" | "blockquote"
        // other
        | "hr" | "button" | "canvas" | "center" | "col" | "colgroup" | "embed"
        | "map" | "object" | "pre" | "progress" | "video"
        // non-annotation inline tags
        | "img" | "br"
        | "wiki-chart"
    )
}

/// HTML void elements: no content, rendered self-closing.
pub(crate) fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta"
            | "param" | "source" | "track" | "wbr"
    )
}
