// HTML → linear Doc.
//
// html5ever parses the input into a tree; the Parser walks it depth-first,
// synthesizing a SAX-like open/text/close event stream and routing each
// event into the Builder and Contextualizer. Reference and math spans
// switch to a child builder, producing inline sub-documents.

pub(crate) mod builder;
pub(crate) mod context;

use html5ever::interface::Attribute;
use html5ever::parse_document;
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{ParseOpts, QualName};
use markup5ever_rcdom::{Handle, NodeData, RcDom};

use crate::chunk::InlineContent;
use crate::doc::Doc;
use crate::error::LinearDocError;
use crate::tag::{self, Tag, TagRef};
use crate::trace::debug;

pub use builder::Builder;
pub use context::{Context, Contextualizer, MwContextualizer};

/// Parser behavior switches.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOptions {
    /// Wrap pre-existing `cx-segment` spans in isolation blocks.
    pub isolate_segments: bool,
}

/// Reads an HTML stream into a linear Doc.
pub struct Parser<C: Contextualizer> {
    contextualizer: C,
    options: ParserOptions,
    root: Builder,
    /// Child builders for reference sub-documents; the innermost is
    /// active.
    children: Vec<Builder>,
    /// Stack of tags currently open.
    all_tags: Vec<TagRef>,
}

impl<C: Contextualizer> Parser<C> {
    pub fn new(contextualizer: C, options: ParserOptions) -> Self {
        Parser {
            contextualizer,
            options,
            root: Builder::new(),
            children: Vec::new(),
            all_tags: Vec::new(),
        }
    }

    /// Parse HTML into the document.
    pub fn write(&mut self, html: &str) -> Result<(), LinearDocError> {
        let dom = parse_html(html);
        self.walk(&dom.document)?;
        debug!("parsed document");
        Ok(())
    }

    /// The document built so far.
    pub fn into_doc(self) -> Doc {
        self.root.into_doc()
    }

    fn builder(&mut self) -> &mut Builder {
        self.children.last_mut().unwrap_or(&mut self.root)
    }

    fn walk(&mut self, handle: &Handle) -> Result<(), LinearDocError> {
        match &handle.data {
            NodeData::Document => {
                for child in handle.children.borrow().iter() {
                    self.walk(child)?;
                }
            }
            NodeData::Element { name, attrs, .. } => {
                let tag = element_tag(name, &attrs.borrow()).into_shared();
                let tag_name = tag.borrow().name.clone();
                self.on_open_tag(&tag)?;
                for child in handle.children.borrow().iter() {
                    self.walk(child)?;
                }
                self.on_close_tag(&tag_name)?;
            }
            NodeData::Text { contents } => {
                self.on_text(&contents.borrow());
            }
            // Comments, doctypes, processing instructions
            _ => {}
        }
        Ok(())
    }

    fn on_open_tag(&mut self, open_tag: &TagRef) -> Result<(), LinearDocError> {
        // Removability is checked before the tag enters the contextualizer
        if self.contextualizer.context() == Some(Context::Removable)
            || self.contextualizer.is_removable(open_tag)
        {
            self.all_tags.push(open_tag.clone());
            self.contextualizer.on_open_tag(open_tag);
            return Ok(());
        }

        let (is_segment, is_sub_doc, is_inline_empty, is_annotation) = {
            let tag = open_tag.borrow();
            (
                tag::is_segment(&tag),
                tag::is_reference(&tag) || tag::is_math(&tag),
                tag::is_inline_empty_tag(&tag.name),
                self.is_inline_annotation_tag(&tag.name, tag::is_transclusion(&tag)),
            )
        };

        if self.options.isolate_segments && is_segment {
            self.builder().push_block_tag(
                Tag::with_attrs("div", [("class", "cx-segment-block")]).into_shared(),
            );
        }

        if is_sub_doc {
            // Start a reference: open a child builder and move into it
            self.children.push(Builder::with_wrapper(open_tag.clone()));
        } else if is_inline_empty {
            let can_segment = self.contextualizer.can_segment();
            self.builder()
                .add_inline_content(InlineContent::EmptyTag(open_tag.clone()), can_segment);
        } else if is_annotation {
            self.builder().push_inline_annotation_tag(open_tag.clone());
        } else {
            self.builder().push_block_tag(open_tag.clone());
        }

        self.all_tags.push(open_tag.clone());
        self.contextualizer.on_open_tag(open_tag);
        Ok(())
    }

    fn on_text(&mut self, text: &str) {
        if self.contextualizer.context() == Some(Context::Removable) {
            return;
        }
        let can_segment = self.contextualizer.can_segment();
        self.builder().add_text_chunk(text, can_segment);
    }

    fn on_close_tag(&mut self, tag_name: &str) -> Result<(), LinearDocError> {
        let Some(open_tag) = self.all_tags.pop() else {
            return Ok(());
        };

        let (is_segment, is_annotation) = {
            let tag = open_tag.borrow();
            (
                tag::is_segment(&tag),
                self.is_inline_annotation_tag(tag_name, tag::is_transclusion(&tag)),
            )
        };

        if self.contextualizer.is_removable(&open_tag)
            || self.contextualizer.context() == Some(Context::Removable)
        {
            self.contextualizer.on_close_tag();
            return Ok(());
        }
        self.contextualizer.on_close_tag();

        if tag::is_inline_empty_tag(tag_name) {
            return Ok(());
        }

        if is_annotation && self.builder().has_open_annotations() {
            self.builder().pop_inline_annotation_tag(tag_name)?;
            if self.options.isolate_segments && is_segment {
                self.builder().pop_block_tag("div")?;
            }
        } else if is_annotation && !self.children.is_empty() {
            // In a sub-document: should be a span or sup closing a reference
            if !matches!(tag_name, "span" | "sup") {
                return Err(LinearDocError::UnexpectedReferenceClose(
                    tag_name.to_string(),
                ));
            }
            let can_segment = self.contextualizer.can_segment();
            if let Some(mut child) = self.children.pop() {
                child.finish_text_block();
                self.builder()
                    .add_inline_content(InlineContent::SubDoc(Box::new(child.into_doc())), can_segment);
            }
        } else if !is_annotation {
            if tag_name == "p" && self.contextualizer.can_segment() {
                // Flush trailing segmentation context (e.g. transclusion
                // based references at the end of a paragraph)
                let can_segment = self.contextualizer.can_segment();
                self.builder().add_text_chunk("", can_segment);
            }
            self.builder().pop_block_tag(tag_name)?;
        } else {
            return Err(LinearDocError::InlineTagMismatch {
                open: None,
                close: tag_name.to_string(),
            });
        }
        Ok(())
    }

    /// Whether a tag is an inline annotation in the current context.
    fn is_inline_annotation_tag(&self, tag_name: &str, is_transclusion: bool) -> bool {
        let context = self.contextualizer.context();

        // <span> inside a media context acts like a block tag wrapping
        // another block tag (<video>); see the MediaWiki audio/video spec
        if tag_name == "span" && context == Some(Context::Media) {
            return false;
        }

        // Audio and video are block tags, but inline in a media-inline
        // context
        if matches!(tag_name, "audio" | "video") && context == Some(Context::MediaInline) {
            return true;
        }

        // Style tags used as transclusions are inline, to avoid wrong
        // segmentation around template styles
        if tag_name == "style" && is_transclusion {
            return true;
        }

        !tag::is_block_tag(tag_name)
    }
}

/// Parse an HTML string into an html5ever RcDom.
fn parse_html(html: &str) -> RcDom {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            drop_doctype: true,
            ..Default::default()
        },
        ..Default::default()
    };
    parse_document(RcDom::default(), opts)
        .from_utf8()
        .one(html.as_bytes())
}

/// Build a Tag from an html5ever element. Names are lowercased; void
/// elements are marked self-closing.
fn element_tag(name: &QualName, attrs: &[Attribute]) -> Tag {
    let mut tag = Tag::new(name.local.as_ref().to_ascii_lowercase());
    for attr in attrs {
        tag.attributes.insert(
            attr.name.local.as_ref().to_ascii_lowercase(),
            attr.value.to_string(),
        );
    }
    if tag::is_void_element(&tag.name) {
        tag.is_self_closing = true;
    }
    tag
}

/// Parse and re-serialize with canonical attribute order and escaping,
/// without any linearization.
pub(crate) fn reserialize(html: &str) -> String {
    let dom = parse_html(html);
    let mut out = String::new();
    write_node(&dom.document, &mut out);
    out
}

fn write_node(handle: &Handle, out: &mut String) {
    match &handle.data {
        NodeData::Document => {
            for child in handle.children.borrow().iter() {
                write_node(child, out);
            }
        }
        NodeData::Element { name, attrs, .. } => {
            let tag = element_tag(name, &attrs.borrow());
            out.push_str(&tag.open_html());
            for child in handle.children.borrow().iter() {
                write_node(child, out);
            }
            out.push_str(&tag.close_html());
        }
        NodeData::Text { contents } => {
            out.push_str(&tag::esc(&contents.borrow()));
        }
        _ => {}
    }
}
