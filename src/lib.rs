// lineardoc — MediaWiki HTML sentence segmentation for machine translation.
//
// Architecture:
//   Parsoid HTML → html5ever parse → Parser/Builder/Contextualizer →
//   linear Doc → wrap_sections → segment → HTML
//
// Reference material:
//   - MediaWiki DOM spec: https://www.mediawiki.org/wiki/Specs/HTML
//   - Content Translation segmentation, whose output format this produces

mod chunk;
mod config;
mod doc;
mod error;
mod parse;
mod segmenter;
pub mod tag;
mod textblock;
mod trace;

pub use chunk::{InlineContent, TextChunk};
pub use config::RemovableSections;
pub use doc::{Doc, IdGenerator, Item};
pub use error::LinearDocError;
pub use parse::{Builder, Context, Contextualizer, MwContextualizer, Parser, ParserOptions};
pub use segmenter::Segmenter;
pub use tag::{Tag, TagRef};
pub use textblock::{Offset, RangeMapping, Span, TextBlock};

use crate::trace::debug;

/// Pipeline options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Language handed to the sentence boundary collaborator.
    pub language: String,
    /// Wrap pre-existing `cx-segment` spans in isolation blocks.
    pub isolate_segments: bool,
    /// Subtrees to strip while parsing.
    pub removable_sections: RemovableSections,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            language: "en".to_string(),
            isolate_segments: false,
            removable_sections: RemovableSections::default(),
        }
    }
}

impl Options {
    /// Create a new Options with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the language passed to the boundary collaborator.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Set whether pre-existing segments get isolation wrappers.
    pub fn with_isolate_segments(mut self, isolate: bool) -> Self {
        self.isolate_segments = isolate;
        self
    }

    /// Set the removability configuration.
    pub fn with_removable_sections(mut self, sections: RemovableSections) -> Self {
        self.removable_sections = sections;
        self
    }
}

/// Run the whole pipeline with default options: parse, wrap sections,
/// segment sentences, render.
///
/// # Examples
///
/// ```
/// let boundaries = |_text: &str, _lang: &str| Vec::<usize>::new();
/// let html = lineardoc::segment("<p>One sentence.</p>", &boundaries).unwrap();
/// assert!(html.contains("cx-segment"));
/// ```
pub fn segment(html: &str, segmenter: &dyn Segmenter) -> Result<String, LinearDocError> {
    segment_with(html, segmenter, &Options::default())
}

/// Run the whole pipeline with custom options.
pub fn segment_with(
    html: &str,
    segmenter: &dyn Segmenter,
    options: &Options,
) -> Result<String, LinearDocError> {
    let doc = parse(html, options)?;
    let doc = doc.wrap_sections()?;
    let get_boundaries = |text: &str| segmenter.boundaries(text, &options.language);
    let doc = doc.segment(&get_boundaries);
    debug!("pipeline complete");
    Ok(doc.html())
}

/// Parse HTML into its linear representation, dropping removable subtrees.
///
/// Tab, carriage return, and line feed are stripped from the input first,
/// so block structure does not depend on inter-tag whitespace.
pub fn parse(html: &str, options: &Options) -> Result<Doc, LinearDocError> {
    let html: String = html
        .chars()
        .filter(|c| !matches!(c, '\t' | '\r' | '\n'))
        .collect();
    let contextualizer = MwContextualizer::with_config(&options.removable_sections);
    let mut parser = Parser::new(
        contextualizer,
        ParserOptions {
            isolate_segments: options.isolate_segments,
        },
    );
    parser.write(&html)?;
    Ok(parser.into_doc())
}

/// Parse and re-serialize HTML with canonical attribute order and
/// escaping, without linearizing. Useful for output comparison.
pub fn normalize(html: &str) -> Result<String, LinearDocError> {
    let html: String = html
        .chars()
        .filter(|c| !matches!(c, '\t' | '\r' | '\n'))
        .collect();
    Ok(parse::reserialize(&html))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_boundaries(_text: &str, _lang: &str) -> Vec<usize> {
        Vec::new()
    }

    #[test]
    fn test_segment_empty() {
        let result = segment("", &no_boundaries).unwrap();
        assert!(result.contains("<body"));
    }

    #[test]
    fn test_segment_simple_paragraph() {
        let result = segment("<p>Hello, world.</p>", &no_boundaries).unwrap();
        assert!(result.contains("Hello, world."));
        assert!(result.contains("cx-segment"));
        assert!(result.contains("<section"));
    }

    #[test]
    fn test_options_builder() {
        let options = Options::new()
            .with_language("es")
            .with_isolate_segments(true);
        assert_eq!(options.language, "es");
        assert!(options.isolate_segments);
    }

    #[test]
    fn test_default_options() {
        let options = Options::default();
        assert_eq!(options.language, "en");
        assert!(!options.isolate_segments);
        assert!(options.removable_sections.is_empty());
    }

    #[test]
    fn test_parse_strips_intertag_newlines() {
        let doc = parse("<p>a</p>\n\t<p>b</p>", &Options::default()).unwrap();
        assert!(!doc.html().contains('\n'));
    }

    #[test]
    fn test_normalize() {
        let normalized = normalize("<p  title='x'>a &amp; b</p>").unwrap();
        assert!(normalized.contains("<p title=\"x\">a &#38; b</p>"));
    }
}
