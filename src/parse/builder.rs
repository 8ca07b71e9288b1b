// Builder — assembles a linear Doc from SAX-like events.
//
// Holds the block-tag stack, the inline-annotation stack, and the buffer of
// text chunks for the text block currently being accumulated. Reference
// sub-documents get their own child Builder; the Parser keeps the stack.

use std::rc::Rc;

use crate::chunk::{InlineContent, TextChunk};
use crate::doc::{Doc, Item};
use crate::error::LinearDocError;
use crate::tag::{self, TagRef};
use crate::textblock::TextBlock;

pub struct Builder {
    block_tags: Vec<TagRef>,
    inline_annotation_tags: Vec<TagRef>,
    text_chunks: Vec<TextChunk>,
    is_block_segmentable: bool,
    doc: Doc,
}

impl Builder {
    pub fn new() -> Self {
        Builder {
            block_tags: Vec::new(),
            inline_annotation_tags: Vec::new(),
            text_chunks: Vec::new(),
            is_block_segmentable: true,
            doc: Doc::new(),
        }
    }

    /// A child builder for a sub-document rendered inside `wrapper_tag`.
    pub fn with_wrapper(wrapper_tag: TagRef) -> Self {
        Builder {
            doc: Doc::with_wrapper(wrapper_tag),
            ..Builder::new()
        }
    }

    pub fn doc(&self) -> &Doc {
        &self.doc
    }

    pub fn into_doc(self) -> Doc {
        self.doc
    }

    pub(crate) fn has_open_annotations(&self) -> bool {
        !self.inline_annotation_tags.is_empty()
    }

    pub fn push_block_tag(&mut self, block_tag: TagRef) {
        self.finish_text_block();
        self.block_tags.push(block_tag.clone());
        if self.is_ignored_tag(&block_tag) {
            return;
        }
        if block_tag.borrow().name == "figure" {
            block_tag
                .borrow_mut()
                .attributes
                .insert("rel".to_string(), "cx:Figure".to_string());
        }
        self.doc.push_item(Item::Open(block_tag));
    }

    pub fn pop_block_tag(&mut self, tag_name: &str) -> Result<TagRef, LinearDocError> {
        let Some(block_tag) = self.block_tags.pop() else {
            return Err(LinearDocError::BlockTagMismatch {
                open: None,
                close: tag_name.to_string(),
            });
        };
        if block_tag.borrow().name != tag_name {
            return Err(LinearDocError::BlockTagMismatch {
                open: Some(block_tag.borrow().name.clone()),
                close: tag_name.to_string(),
            });
        }

        self.finish_text_block();
        if !self.is_ignored_tag(&block_tag) {
            self.doc.push_item(Item::Close(block_tag.clone()));
        }
        Ok(block_tag)
    }

    pub fn push_inline_annotation_tag(&mut self, annotation_tag: TagRef) {
        self.inline_annotation_tags.push(annotation_tag);
    }

    /// Pop an annotation. If it is a reference, external link, or
    /// transclusion that annotated nothing but whitespace, the whitespace
    /// chunks collapse into an inline sub-document so the tag (and its
    /// spacing) survives in the output as an inline element.
    pub fn pop_inline_annotation_tag(&mut self, tag_name: &str) -> Result<(), LinearDocError> {
        let Some(annotation_tag) = self.inline_annotation_tags.pop() else {
            return Err(LinearDocError::InlineTagMismatch {
                open: None,
                close: tag_name.to_string(),
            });
        };
        if annotation_tag.borrow().name != tag_name {
            return Err(LinearDocError::InlineTagMismatch {
                open: Some(annotation_tag.borrow().name.clone()),
                close: tag_name.to_string(),
            });
        }

        if annotation_tag.borrow().attributes.is_empty() {
            // Skip tags which have no attributes
            return Ok(());
        }

        // Walk the buffer tail: chunks annotated by this tag that carry
        // only whitespace
        let mut replace = true;
        let mut whitespace: Vec<String> = Vec::new();
        let mut keep = self.text_chunks.len();
        for chunk in self.text_chunks.iter().rev() {
            let Some(chunk_tag) = chunk.tags.last() else {
                break;
            };
            if !chunk.text.trim().is_empty()
                || chunk.inline_content.is_some()
                || !Rc::ptr_eq(chunk_tag, &annotation_tag)
            {
                replace = false;
                break;
            }
            whitespace.push(chunk.text.clone());
            keep -= 1;
        }

        let qualifies = {
            let tag = annotation_tag.borrow();
            tag::is_reference(&tag) || tag::is_external_link(&tag) || tag::is_transclusion(&tag)
        };
        if replace && qualifies {
            self.text_chunks.truncate(keep);
            whitespace.reverse();
            let mut sub_doc = Doc::new();
            sub_doc
                .push_item(Item::Open(annotation_tag.clone()))
                .push_item(Item::TextBlock(TextBlock::new(
                    vec![TextChunk::new(whitespace.concat(), Vec::new())],
                    true,
                )))
                .push_item(Item::Close(annotation_tag));
            self.add_inline_content(InlineContent::SubDoc(Box::new(sub_doc)), true);
        }
        Ok(())
    }

    /// Append a text chunk annotated with a snapshot of the current
    /// annotation stack.
    pub fn add_text_chunk(&mut self, text: impl Into<String>, can_segment: bool) {
        self.text_chunks
            .push(TextChunk::new(text, self.inline_annotation_tags.clone()));
        self.is_block_segmentable = can_segment;
    }

    /// Append content that needs no linearizing, to appear inline.
    /// Category links go to the document sidelist instead.
    pub fn add_inline_content(&mut self, content: InlineContent, can_segment: bool) {
        if let InlineContent::EmptyTag(content_tag) = &content {
            if tag::is_category(&content_tag.borrow()) {
                self.doc.push_category(content_tag.clone());
                return;
            }
        }
        self.text_chunks.push(TextChunk::with_inline_content(
            "",
            self.inline_annotation_tags.clone(),
            content,
        ));
        if !can_segment {
            self.is_block_segmentable = false;
        }
    }

    /// Flush the chunk buffer: a whitespace-only buffer without inline
    /// content becomes blockspace, anything else a text block.
    pub fn finish_text_block(&mut self) {
        if self.text_chunks.is_empty() {
            return;
        }

        let whitespace_only = self
            .text_chunks
            .iter()
            .all(|chunk| chunk.inline_content.is_none() && chunk.text.trim().is_empty());

        if whitespace_only {
            let space: String = self
                .text_chunks
                .iter()
                .map(|chunk| chunk.text.as_str())
                .collect();
            self.doc.push_item(Item::Blockspace(space));
            self.text_chunks.clear();
        } else {
            let chunks = std::mem::take(&mut self.text_chunks);
            self.doc
                .push_item(Item::TextBlock(TextBlock::new(chunks, self.is_block_segmentable)));
        }
        self.is_block_segmentable = true;
    }

    fn is_ignored_tag(&self, tag: &TagRef) -> bool {
        let tag = tag.borrow();
        let is_section_stub = tag.name == "section"
            && tag.attr("data-mw-section-id").is_some_and(|v| !v.is_empty());
        is_section_stub || tag::is_category(&tag)
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
