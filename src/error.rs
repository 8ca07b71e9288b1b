/// Errors that can occur while linearizing or segmenting a document.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LinearDocError {
    #[error("HTML parse error: {0}")]
    Parse(String),

    /// A block close event did not match the top of the block-tag stack.
    #[error("mismatched block tags: open={open:?}, close={close}")]
    BlockTagMismatch { open: Option<String>, close: String },

    /// An inline close event did not match the top of the annotation stack.
    #[error("mismatched inline tags: open={open:?}, close={close}")]
    InlineTagMismatch { open: Option<String>, close: String },

    /// A reference sub-document was closed by something other than
    /// `</span>` or `</sup>`.
    #[error("expected span or sup closing a reference, got \"{0}\"")]
    UnexpectedReferenceClose(String),

    /// Section wrapping tried to reopen an item that is not a section close.
    #[error("section wrap: attempting to reopen a non-section item: {0}")]
    SectionMismatch(String),

    /// Range mappings passed to tag translation overlap.
    #[error("overlapping range mappings at position {0}")]
    RangeOverlap(usize),
}
