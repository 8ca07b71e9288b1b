// TextChunk — a chunk of uniformly-annotated inline text.
//
// The annotations are a stack of inline tags (<a>, <i>, …) plus an optional
// inline content element: an empty tag (br/img) or a sub-document (e.g. a
// reference span). The annotations apply to the whole text, so text with
// varying markup must be split into multiple chunks. Cloning a chunk clones
// the tag *stack* but shares the tag allocations, preserving tag identity.

use crate::doc::Doc;
use crate::tag::TagRef;

/// Content carried inline by a chunk, rendered after its text.
#[derive(Debug, Clone)]
pub enum InlineContent {
    /// An empty inline tag such as `<br/>` or `<img/>`.
    EmptyTag(TagRef),
    /// A nested document, e.g. the body of a reference or math span.
    SubDoc(Box<Doc>),
}

impl InlineContent {
    /// The tag that can represent this content: the empty tag itself, or
    /// the sub-document's root item.
    pub fn root_item(&self) -> Option<TagRef> {
        match self {
            InlineContent::EmptyTag(tag) => Some(tag.clone()),
            InlineContent::SubDoc(doc) => doc.root_item(),
        }
    }
}

/// A chunk of uniformly-annotated inline text.
#[derive(Debug, Clone, Default)]
pub struct TextChunk {
    /// Plaintext in the chunk (may be empty).
    pub text: String,
    /// Annotation tags applying to the whole text, outermost first.
    pub tags: Vec<TagRef>,
    /// Optional inline content, appearing after the text.
    pub inline_content: Option<InlineContent>,
}

impl TextChunk {
    pub fn new(text: impl Into<String>, tags: Vec<TagRef>) -> Self {
        TextChunk {
            text: text.into(),
            tags,
            inline_content: None,
        }
    }

    pub fn with_inline_content(
        text: impl Into<String>,
        tags: Vec<TagRef>,
        content: InlineContent,
    ) -> Self {
        TextChunk {
            text: text.into(),
            tags,
            inline_content: Some(content),
        }
    }

    /// Length of the chunk text in characters (not bytes); all offsets in
    /// the linear model are character offsets.
    pub(crate) fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
