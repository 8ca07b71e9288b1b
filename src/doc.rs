// Doc — an HTML document in linear representation.
//
// The document is a flat sequence of items, where each item is a block open
// tag, a block close tag, a text block of annotated inline text, or "block
// whitespace" (a run of whitespace separating two block boundaries).
// Categories live on a sidelist, outside the linear stream.

use sha2::{Digest, Sha256};

use crate::error::LinearDocError;
use crate::tag::{self, Tag, TagRef};
use crate::textblock::{BoundaryFn, TextBlock};

/// One item of the linear representation.
#[derive(Debug, Clone)]
pub enum Item {
    /// A block open tag.
    Open(TagRef),
    /// A block close tag.
    Close(TagRef),
    /// Whitespace between two block boundaries.
    Blockspace(String),
    /// An inline run.
    TextBlock(TextBlock),
}

impl Item {
    /// The tag carried by an open or close item.
    pub fn tag(&self) -> Option<&TagRef> {
        match self {
            Item::Open(tag) | Item::Close(tag) => Some(tag),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            Item::Open(tag) | Item::Close(tag) => tag.borrow().name.clone(),
            Item::Blockspace(_) => "blockspace".to_string(),
            Item::TextBlock(_) => "textblock".to_string(),
        }
    }
}

/// Generator for the tracking identifiers stamped during segmentation.
///
/// Block, segment, and link IDs are drawn from a single shared counter;
/// generated section tags draw `cxSourceSectionN` from their own.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next_id: u32,
    next_section_id: u32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_segment_id(&mut self) -> String {
        self.next_shared()
    }

    pub fn next_link_id(&mut self) -> String {
        self.next_shared()
    }

    pub fn next_block_id(&mut self, tag_name: &str) -> String {
        if tag_name == "section" {
            let id = format!("cxSourceSection{}", self.next_section_id);
            self.next_section_id += 1;
            id
        } else {
            self.next_shared()
        }
    }

    fn next_shared(&mut self) -> String {
        let id = self.next_id.to_string();
        self.next_id += 1;
        id
    }
}

/// An HTML document in linear representation.
#[derive(Debug, Clone, Default)]
pub struct Doc {
    items: Vec<Item>,
    wrapper_tag: Option<TagRef>,
    categories: Vec<TagRef>,
}

impl Doc {
    pub fn new() -> Self {
        Doc::default()
    }

    /// A document rendered inside `wrapper_tag` (used for reference
    /// sub-documents).
    pub fn with_wrapper(wrapper_tag: TagRef) -> Self {
        Doc {
            wrapper_tag: Some(wrapper_tag),
            ..Doc::default()
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn wrapper_tag(&self) -> Option<&TagRef> {
        self.wrapper_tag.as_ref()
    }

    /// Category links extracted from the content stream.
    pub fn categories(&self) -> &[TagRef] {
        &self.categories
    }

    pub fn push_item(&mut self, item: Item) -> &mut Self {
        self.items.push(item);
        self
    }

    pub(crate) fn push_category(&mut self, tag: TagRef) {
        self.categories.push(tag);
    }

    /// Remove the most recently added item.
    pub(crate) fn pop_item(&mut self) -> Option<Item> {
        self.items.pop()
    }

    pub(crate) fn current_item(&self) -> Option<&Item> {
        self.items.last()
    }

    /// The wrapper tag if any, else the first block open tag.
    pub fn root_item(&self) -> Option<TagRef> {
        if let Some(wrapper) = &self.wrapper_tag {
            return Some(wrapper.clone());
        }
        self.items.iter().find_map(|item| match item {
            Item::Open(tag) => Some(tag.clone()),
            _ => None,
        })
    }

    /// Clone the document, passing every item through `map`.
    pub fn clone_map(&self, mut map: impl FnMut(&Item) -> Item) -> Doc {
        let mut doc = Doc {
            wrapper_tag: self.wrapper_tag.clone(),
            ..Doc::default()
        };
        for item in &self.items {
            doc.items.push(map(item));
        }
        doc
    }

    /// Render the document as HTML. Isolation wrappers
    /// (`<div class="cx-segment-block">`) are suppressed.
    pub fn html(&self) -> String {
        let mut html = String::new();

        if let Some(wrapper) = &self.wrapper_tag {
            html.push_str(&wrapper.borrow().open_html());
        }

        for item in &self.items {
            if let Some(tag) = item.tag() {
                if tag.borrow().attr("class") == Some("cx-segment-block") {
                    continue;
                }
            }
            match item {
                Item::Open(tag) => html.push_str(&tag.borrow().open_html()),
                Item::Close(tag) => html.push_str(&tag.borrow().close_html()),
                Item::Blockspace(space) => html.push_str(space),
                Item::TextBlock(block) => html.push_str(&block.html()),
            }
        }

        if let Some(wrapper) = &self.wrapper_tag {
            html.push_str(&wrapper.borrow().close_html());
        }

        html
    }

    /// The balanced HTML fragment of every text block, in order.
    pub fn segments(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|item| match item {
                Item::TextBlock(block) => Some(block.html()),
                _ => None,
            })
            .collect()
    }

    /// Group the top-level blocks inside `<body>` under
    /// `<section rel="cx:Section">` elements. Blocks sharing a section key
    /// with the previous section (transclusion continuations), and orphan
    /// blockspace or bare text blocks, are re-attached to the previous
    /// section.
    pub fn wrap_sections(&self) -> Result<Doc, LinearDocError> {
        let mut wrapper = SectionWrapper {
            doc: Doc::new(),
            prev: None,
            curr: None,
        };
        wrapper.doc.categories = self.categories.clone();
        let mut in_body = false;

        for item in &self.items {
            if !in_body {
                // Until body opens, items pass through untouched
                wrapper.doc.items.push(item.clone());
                if item.tag().is_some_and(|tag| tag.borrow().name == "body") {
                    in_body = true;
                }
                continue;
            }

            match item {
                Item::Open(open_tag) => {
                    if wrapper.curr.is_none() {
                        let key = tag_key(open_tag);
                        if wrapper.prev.as_deref() == Some(key.as_str()) {
                            // Connected to the previous section: reopen it
                            wrapper.doc.pop_item();
                            wrapper.curr = wrapper.prev.clone();
                        } else {
                            wrapper.open_section();
                            wrapper.curr = Some(key);
                        }
                    }
                    wrapper.doc.items.push(item.clone());
                }
                Item::Close(close_tag) => {
                    if wrapper.curr.is_some() && close_tag.borrow().name == "body" {
                        wrapper.close_section();
                        in_body = false;
                    }
                    wrapper.doc.items.push(item.clone());
                    if wrapper.curr.is_some() && wrapper.curr.as_deref() == Some(tag_key(close_tag).as_str()) {
                        wrapper.close_section();
                    }
                }
                Item::Blockspace(_) => {
                    if wrapper.prev.is_some() && wrapper.current_is_section_tag() {
                        wrapper.insert_to_prev(item.clone())?;
                    } else {
                        wrapper.doc.items.push(item.clone());
                    }
                }
                Item::TextBlock(block) => {
                    let tag_for_id = block.root_item();

                    if tag_for_id.is_none() && wrapper.curr.is_none() {
                        // Text block with no tag identifier
                        wrapper.insert_to_prev(item.clone())?;
                        continue;
                    }

                    let is_connected = tag_for_id
                        .as_ref()
                        .is_some_and(|tag| wrapper.prev.as_deref() == Some(tag_key(tag).as_str()));
                    if is_connected {
                        wrapper.insert_to_prev(item.clone())?;
                        continue;
                    }

                    if wrapper.curr.is_none() {
                        wrapper.open_section();
                        wrapper.curr = tag_for_id.as_ref().map(tag_key);
                        wrapper.doc.items.push(item.clone());
                        wrapper.close_section();
                        continue;
                    }

                    wrapper.doc.items.push(item.clone());
                }
            }
        }

        Ok(wrapper.doc)
    }

    /// Segment the whole document: assign block/section/heading IDs, then
    /// run sentence segmentation over every segmentable text block that is
    /// not inside a transclusion.
    pub fn segment(&self, get_boundaries: &BoundaryFn<'_>) -> Doc {
        let mut new_doc = Doc::new();
        let mut ids = IdGenerator::new();
        let mut section_number: u32 = 0;
        let mut transclusion_context: Option<String> = None;

        for (i, item) in self.items.iter().enumerate() {
            match item {
                Item::Open(open_tag) => {
                    let cloned = open_tag.borrow().clone().into_shared();
                    {
                        let mut tag = cloned.borrow_mut();
                        let existing_id = tag
                            .attr("id")
                            .filter(|id| !id.is_empty())
                            .map(str::to_string);
                        if let Some(id) = existing_id {
                            // Headings get a stable fixed-length id derived
                            // from their text
                            let next_is_textblock =
                                matches!(self.items.get(i + 1), Some(Item::TextBlock(_)));
                            if matches!(tag.name.as_str(), "h1" | "h2" | "h3" | "h4" | "h5")
                                && next_is_textblock
                            {
                                if let Some(Item::TextBlock(block)) = self.items.get(i + 1) {
                                    let digest = Sha256::digest(block.plain_text().as_bytes());
                                    let hex: String =
                                        digest.iter().map(|b| format!("{b:02x}")).collect();
                                    tag.attributes
                                        .insert("id".to_string(), hex[..30].to_string());
                                }
                            } else if id.chars().count() > 30 {
                                tag.attributes
                                    .insert("id".to_string(), id.chars().take(30).collect());
                            }
                        } else {
                            let block_id = ids.next_block_id(&tag.name);
                            tag.attributes.insert("id".to_string(), block_id);
                            // Section headers (<h2> tags) mark the start of
                            // a new section
                            if let Some(next) = self.items.get(i + 1) {
                                if matches!(next, Item::Open(t) if t.borrow().name == "h2") {
                                    section_number += 1;
                                }
                            }
                        }

                        if tag.name == "section" {
                            tag.attributes.insert(
                                "data-mw-section-number".to_string(),
                                section_number.to_string(),
                            );
                        }

                        // Transclusion and extension content keeps its
                        // internals unsegmented
                        let about = tag.attr("about").filter(|v| !v.is_empty()).map(str::to_string);
                        let has_typeof = tag.attr("typeof").is_some_and(|v| !v.is_empty());
                        if has_typeof {
                            if let Some(about) = about {
                                transclusion_context = Some(about);
                            }
                        }
                    }
                    new_doc.items.push(Item::Open(cloned));
                }
                Item::Close(close_tag) => {
                    let about = close_tag
                        .borrow()
                        .attr("about")
                        .filter(|v| !v.is_empty())
                        .map(str::to_string);
                    if about.is_some() && about == transclusion_context {
                        transclusion_context = None;
                    }
                    new_doc.items.push(item.clone());
                }
                Item::Blockspace(_) => {
                    new_doc.items.push(item.clone());
                }
                Item::TextBlock(block) => {
                    let block = if block.can_segment() && transclusion_context.is_none() {
                        block.segment(get_boundaries, &mut ids)
                    } else {
                        let block = block.clone();
                        block.set_link_ids(&mut ids);
                        block
                    };
                    new_doc.items.push(Item::TextBlock(block));
                }
            }
        }

        new_doc
    }

    /// Whether this wrapped section carries nothing worth translating: its
    /// only content is a block-level template or a references list.
    pub fn is_ignorable_block(&self) -> bool {
        let mut ignorable = false;
        let mut block_stack: Vec<TagRef> = Vec::new();
        let mut first_block_template: Option<TagRef> = None;

        // Start past the leading <section> tag
        for item in self.items.iter().skip(1) {
            match item {
                Item::Open(open_tag) => {
                    block_stack.push(open_tag.clone());
                    if first_block_template.is_none() {
                        let tag = open_tag.borrow();
                        if tag::is_transclusion(&tag) || tag::is_reference_list(&tag) {
                            drop(tag);
                            first_block_template = Some(open_tag.clone());
                        }
                    }
                }
                Item::Close(_) => {
                    if let Some(current) = block_stack.pop() {
                        if block_stack.is_empty() {
                            let tag = current.borrow();
                            let closes_template = tag::is_transclusion(&tag)
                                && first_block_template.as_ref().is_some_and(|first| {
                                    tag.attr("about") == first.borrow().attr("about")
                                });
                            if closes_template || tag::is_reference_list(&tag) {
                                return true;
                            }
                        }
                    }
                }
                Item::TextBlock(block) => {
                    if first_block_template.is_none() {
                        match block.root_item() {
                            Some(root) if tag::is_non_translatable(&root.borrow()) => {
                                first_block_template = Some(root);
                                ignorable = true;
                            }
                            // There is non-ignorable content to translate
                            _ => return false,
                        }
                    }
                }
                Item::Blockspace(_) => {}
            }
        }

        ignorable
    }

    /// Full XML rendition of the linear representation, for debugging.
    pub fn dump_xml(&self) -> String {
        self.dump_xml_array("").join("\n")
    }

    pub(crate) fn dump_xml_array(&self, pad: &str) -> Vec<String> {
        let mut dump = Vec::new();

        if self.wrapper_tag.is_some() {
            dump.push(format!("{pad}<cxwrapper>"));
        }

        for item in &self.items {
            match item {
                Item::Open(open_tag) => {
                    let name = open_tag.borrow().name.clone();
                    dump.push(format!("{pad}<{name}>"));
                    if name == "head" {
                        // A few things for easy display
                        dump.push(format!("{pad}<meta charset=\"UTF-8\" />"));
                        dump.push(format!(
                            "{pad}<style>cxtextblock {{ border: solid #88f 1px }}"
                        ));
                        dump.push(format!(
                            "{pad}cxtextchunk {{ border-right: solid #f88 1px }}</style>"
                        ));
                    }
                }
                Item::Close(close_tag) => {
                    dump.push(format!("{pad}</{}>", close_tag.borrow().name));
                }
                Item::Blockspace(_) => {
                    dump.push(format!("{pad}<cxblockspace/>"));
                }
                Item::TextBlock(block) => {
                    dump.push(format!("{pad}<cxtextblock>"));
                    dump.extend(block.dump_xml_array(&format!("{pad}  ")));
                    dump.push(format!("{pad}</cxtextblock>"));
                }
            }
        }

        if self.wrapper_tag.is_some() {
            dump.push(format!("{pad}</cxwrapper>"));
        }

        dump
    }
}

/// The stable identifier deciding whether two sibling blocks belong to the
/// same generated section: `about`, else `id`, else the tag name.
fn tag_key(tag: &TagRef) -> String {
    let tag = tag.borrow();
    tag.attr("about")
        .filter(|v| !v.is_empty())
        .or_else(|| tag.attr("id").filter(|v| !v.is_empty()))
        .map(str::to_string)
        .unwrap_or_else(|| tag.name.clone())
}

/// Working state for `wrap_sections`.
struct SectionWrapper {
    doc: Doc,
    /// Section key of the previously closed section.
    prev: Option<String>,
    /// Section key of the currently open section.
    curr: Option<String>,
}

impl SectionWrapper {
    fn open_section(&mut self) {
        self.doc.items.push(Item::Open(
            Tag::with_attrs("section", [("rel", "cx:Section")]).into_shared(),
        ));
    }

    fn close_section(&mut self) {
        self.doc
            .items
            .push(Item::Close(Tag::new("section").into_shared()));
        self.prev = self.curr.take();
    }

    fn current_is_section_tag(&self) -> bool {
        self.doc
            .current_item()
            .and_then(Item::tag)
            .is_some_and(|tag| tag.borrow().name == "section")
    }

    /// Undo the previous section's close, adopt the item into it, and
    /// re-close.
    fn insert_to_prev(&mut self, item: Item) -> Result<(), LinearDocError> {
        if !self.current_is_section_tag() {
            return Err(LinearDocError::SectionMismatch(item.describe()));
        }
        self.doc.pop_item();
        self.curr = self.prev.clone();
        self.doc.items.push(item);
        self.close_section();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::TextChunk;

    fn text_block(text: &str) -> TextBlock {
        TextBlock::new(vec![TextChunk::new(text, vec![])], true)
    }

    fn open(name: &str) -> Item {
        Item::Open(Tag::new(name).into_shared())
    }

    fn close(name: &str) -> Item {
        Item::Close(Tag::new(name).into_shared())
    }

    #[test]
    fn test_doc_creation() {
        let doc = Doc::new();
        assert!(doc.items().is_empty());
        assert!(doc.wrapper_tag().is_none());
        assert!(doc.categories().is_empty());
    }

    #[test]
    fn test_html_simple() {
        let mut doc = Doc::new();
        doc.push_item(open("p"));
        doc.push_item(Item::TextBlock(text_block("Hello")));
        doc.push_item(close("p"));
        assert_eq!(doc.html(), "<p>Hello</p>");
    }

    #[test]
    fn test_html_with_wrapper() {
        let wrapper = Tag::with_attrs("div", [("class", "wrapper")]).into_shared();
        let mut doc = Doc::with_wrapper(wrapper);
        doc.push_item(Item::TextBlock(text_block("content")));
        assert_eq!(doc.html(), "<div class=\"wrapper\">content</div>");
    }

    #[test]
    fn test_html_blockspace_passthrough() {
        let mut doc = Doc::new();
        doc.push_item(Item::Blockspace("  ".to_string()));
        assert_eq!(doc.html(), "  ");
    }

    #[test]
    fn test_html_skips_isolation_wrappers() {
        let mut doc = Doc::new();
        let isolation = Tag::with_attrs("div", [("class", "cx-segment-block")]).into_shared();
        doc.push_item(Item::Open(isolation.clone()));
        doc.push_item(Item::TextBlock(text_block("text")));
        doc.push_item(Item::Close(isolation));
        assert_eq!(doc.html(), "text");
    }

    #[test]
    fn test_root_item_skips_blockspace() {
        let mut doc = Doc::new();
        doc.push_item(Item::Blockspace(" ".to_string()));
        doc.push_item(open("div"));
        assert_eq!(doc.root_item().unwrap().borrow().name, "div");
    }

    #[test]
    fn test_root_item_prefers_wrapper() {
        let wrapper = Tag::new("span").into_shared();
        let mut doc = Doc::with_wrapper(wrapper.clone());
        doc.push_item(open("p"));
        assert!(std::rc::Rc::ptr_eq(&doc.root_item().unwrap(), &wrapper));
    }

    #[test]
    fn test_clone_map() {
        let mut doc = Doc::new();
        doc.push_item(open("p"));
        let cloned = doc.clone_map(|item| match item {
            Item::Open(tag) => {
                let mut tag = tag.borrow().clone();
                tag.attributes
                    .insert("class".to_string(), "modified".to_string());
                Item::Open(tag.into_shared())
            }
            other => other.clone(),
        });
        assert_eq!(
            cloned.items()[0].tag().unwrap().borrow().attr("class"),
            Some("modified")
        );
        // Original untouched
        assert_eq!(doc.items()[0].tag().unwrap().borrow().attr("class"), None);
    }

    #[test]
    fn test_wrap_sections_simple() {
        let mut doc = Doc::new();
        doc.push_item(open("body"));
        doc.push_item(open("h2"));
        doc.push_item(Item::TextBlock(text_block("Heading")));
        doc.push_item(close("h2"));
        doc.push_item(close("body"));

        let wrapped = doc.wrap_sections().unwrap();
        let html = wrapped.html();
        assert!(html.contains("<section rel=\"cx:Section\"><h2>Heading</h2></section>"));
    }

    #[test]
    fn test_wrap_sections_splits_sibling_blocks() {
        let mut doc = Doc::new();
        doc.push_item(open("body"));
        doc.push_item(open("p"));
        doc.push_item(Item::TextBlock(text_block("One")));
        doc.push_item(close("p"));
        doc.push_item(open("div"));
        doc.push_item(Item::TextBlock(text_block("Two")));
        doc.push_item(close("div"));
        doc.push_item(close("body"));

        let html = doc.wrap_sections().unwrap().html();
        assert_eq!(html.matches("<section rel=\"cx:Section\">").count(), 2);
    }

    #[test]
    fn test_wrap_sections_reattaches_shared_about() {
        // Two top-level transclusion fragments with the same about land in
        // one section
        let t1 = Tag::with_attrs("div", [("about", "#mwt1"), ("typeof", "mw:Transclusion")])
            .into_shared();
        let t2 = Tag::with_attrs("div", [("about", "#mwt1")]).into_shared();
        let mut doc = Doc::new();
        doc.push_item(open("body"));
        doc.push_item(Item::Open(t1.clone()));
        doc.push_item(Item::TextBlock(text_block("a")));
        doc.push_item(Item::Close(t1));
        doc.push_item(Item::Open(t2.clone()));
        doc.push_item(Item::TextBlock(text_block("b")));
        doc.push_item(Item::Close(t2));
        doc.push_item(close("body"));

        let html = doc.wrap_sections().unwrap().html();
        assert_eq!(html.matches("<section rel=\"cx:Section\">").count(), 1);
    }

    #[test]
    fn test_wrap_sections_adopts_blockspace() {
        let mut doc = Doc::new();
        doc.push_item(open("body"));
        doc.push_item(open("p"));
        doc.push_item(Item::TextBlock(text_block("One")));
        doc.push_item(close("p"));
        doc.push_item(Item::Blockspace(" ".to_string()));
        doc.push_item(close("body"));

        let html = doc.wrap_sections().unwrap().html();
        // The blockspace is pulled inside the section, not left between
        // sections
        assert!(html.contains("</p> </section>"));
    }

    #[test]
    fn test_wrap_sections_preserves_categories() {
        let mut doc = Doc::new();
        doc.push_category(Tag::new("link").into_shared());
        let wrapped = doc.wrap_sections().unwrap();
        assert_eq!(wrapped.categories().len(), 1);
    }

    #[test]
    fn test_segment_assigns_interleaved_ids() {
        let mut doc = Doc::new();
        doc.push_item(open("body"));
        doc.push_item(open("p"));
        doc.push_item(Item::TextBlock(text_block("One. Two.")));
        doc.push_item(close("p"));
        doc.push_item(close("body"));

        let segmented = doc.segment(&|_| vec![5]);
        let html = segmented.html();
        // body=0, p=1, then segments 2 and 3 from the same counter
        assert!(html.contains("<body id=\"0\">"));
        assert!(html.contains("<p id=\"1\">"));
        assert!(html.contains("data-segmentid=\"2\""));
        assert!(html.contains("data-segmentid=\"3\""));
    }

    #[test]
    fn test_segment_section_ids_and_numbers() {
        let mut doc = Doc::new();
        doc.push_item(open("body"));
        for title in ["A.", "B."] {
            let section = Tag::with_attrs("section", [("rel", "cx:Section")]).into_shared();
            doc.push_item(Item::Open(section));
            doc.push_item(open("h2"));
            doc.push_item(Item::TextBlock(text_block(title)));
            doc.push_item(close("h2"));
            doc.push_item(close("section"));
        }
        doc.push_item(close("body"));

        let html = doc.segment(&|_| vec![]).html();
        assert!(html.contains("id=\"cxSourceSection0\""));
        assert!(html.contains("id=\"cxSourceSection1\""));
        assert!(html.contains("data-mw-section-number=\"1\""));
        assert!(html.contains("data-mw-section-number=\"2\""));
    }

    #[test]
    fn test_segment_heading_id_becomes_hash() {
        let heading = Tag::with_attrs("h2", [("id", "Some_heading")]).into_shared();
        let mut doc = Doc::new();
        doc.push_item(Item::Open(heading));
        doc.push_item(Item::TextBlock(text_block("Some heading")));
        doc.push_item(close("h2"));

        let segmented = doc.segment(&|_| vec![]);
        let id = segmented.items()[0]
            .tag()
            .unwrap()
            .borrow()
            .attr("id")
            .unwrap()
            .to_string();
        assert_eq!(id.len(), 30);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_segment_truncates_long_ids() {
        let long_id = "x".repeat(40);
        let div = Tag::with_attrs("div", [("id", long_id.as_str())]).into_shared();
        let mut doc = Doc::new();
        doc.push_item(Item::Open(div));
        doc.push_item(close("div"));

        let segmented = doc.segment(&|_| vec![]);
        assert_eq!(
            segmented.items()[0].tag().unwrap().borrow().attr("id"),
            Some("x".repeat(30).as_str())
        );
    }

    #[test]
    fn test_segment_skips_transclusion_context() {
        let t = Tag::with_attrs("div", [("about", "#mwt1"), ("typeof", "mw:Transclusion")])
            .into_shared();
        let tc = Tag::with_attrs("div", [("about", "#mwt1")]).into_shared();
        let mut doc = Doc::new();
        doc.push_item(Item::Open(t));
        doc.push_item(Item::TextBlock(text_block("Inside template. Yes.")));
        doc.push_item(Item::Close(tc));
        doc.push_item(open("p"));
        doc.push_item(Item::TextBlock(text_block("Outside.")));
        doc.push_item(close("p"));

        let html = doc.segment(&|_| vec![9]).html();
        assert!(!html.contains("data-segmentid=\"\""));
        // Template internals untouched, the trailing paragraph segmented
        assert!(html.contains("Inside template. Yes."));
        assert!(!html.contains("<span class=\"cx-segment\" data-segmentid=\"1\">Inside"));
        assert!(html.contains("cx-segment\" data-segmentid="));
    }

    #[test]
    fn test_segments_extraction() {
        let mut doc = Doc::new();
        doc.push_item(open("p"));
        doc.push_item(Item::TextBlock(text_block("First")));
        doc.push_item(close("p"));
        doc.push_item(open("p"));
        doc.push_item(Item::TextBlock(text_block("Second")));
        doc.push_item(close("p"));

        assert_eq!(doc.segments(), vec!["First", "Second"]);
    }

    #[test]
    fn test_is_ignorable_block_reference_list() {
        let section = Tag::with_attrs("section", [("rel", "cx:Section")]).into_shared();
        let reflist = Tag::with_attrs(
            "div",
            [("typeof", "mw:Extension/references"), ("data-mw", "{}")],
        )
        .into_shared();
        let mut doc = Doc::new();
        doc.push_item(Item::Open(section));
        doc.push_item(Item::Open(reflist.clone()));
        doc.push_item(Item::Close(reflist));
        doc.push_item(close("section"));
        assert!(doc.is_ignorable_block());
    }

    #[test]
    fn test_is_ignorable_block_with_prose() {
        let section = Tag::with_attrs("section", [("rel", "cx:Section")]).into_shared();
        let mut doc = Doc::new();
        doc.push_item(Item::Open(section));
        doc.push_item(open("p"));
        doc.push_item(Item::TextBlock(text_block("Real content.")));
        doc.push_item(close("p"));
        doc.push_item(close("section"));
        assert!(!doc.is_ignorable_block());
    }

    #[test]
    fn test_dump_xml() {
        let mut doc = Doc::new();
        doc.push_item(open("p"));
        doc.push_item(Item::TextBlock(text_block("x")));
        doc.push_item(close("p"));
        assert_eq!(
            doc.dump_xml(),
            "<p>\n<cxtextblock>\n  <cxtextchunk>x</cxtextchunk>\n</cxtextblock>\n</p>"
        );
    }
}
