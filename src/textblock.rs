// TextBlock — a block of annotated inline text.
//
// A text block is a maximal inline run between two block boundaries, stored
// as chunks of uniform annotation. All offsets and lengths are character
// counts, matching the offsets handed to and received from the sentence
// boundary collaborator.

use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::chunk::{InlineContent, TextChunk};
use crate::doc::IdGenerator;
use crate::error::LinearDocError;
use crate::tag::{self, Tag, TagRef};

/// A boundary function: plaintext in, sorted sentence-start character
/// offsets out. An offset of 0 is ignored.
pub type BoundaryFn<'a> = dyn Fn(&str) -> Vec<usize> + 'a;

/// Start and length (in characters) of one chunk, with its annotation stack.
#[derive(Debug, Clone)]
pub struct Offset {
    pub start: usize,
    pub length: usize,
    pub tags: Vec<TagRef>,
}

/// A half-open character range, `start..start + length`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub length: usize,
}

/// A correspondence between a source range and a target range, as produced
/// by a translation service that reports alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeMapping {
    pub source: Span,
    pub target: Span,
}

/// A block of annotated inline text.
#[derive(Debug, Clone, Default)]
pub struct TextBlock {
    chunks: Vec<TextChunk>,
    can_segment: bool,
    offsets: Vec<Offset>,
}

impl TextBlock {
    pub fn new(chunks: Vec<TextChunk>, can_segment: bool) -> Self {
        let mut offsets = Vec::with_capacity(chunks.len());
        let mut cursor = 0;
        for chunk in &chunks {
            let length = chunk.char_len();
            offsets.push(Offset {
                start: cursor,
                length,
                tags: chunk.tags.clone(),
            });
            cursor += length;
        }
        TextBlock {
            chunks,
            can_segment,
            offsets,
        }
    }

    pub fn chunks(&self) -> &[TextChunk] {
        &self.chunks
    }

    /// Whether sentence segmentation may run on this block.
    pub fn can_segment(&self) -> bool {
        self.can_segment
    }

    pub fn offsets(&self) -> &[Offset] {
        &self.offsets
    }

    /// Plain text projection of the block.
    pub fn plain_text(&self) -> String {
        self.chunks.iter().map(|chunk| chunk.text.as_str()).collect()
    }

    /// The start and length of each annotation beyond the common tags.
    pub fn tag_offsets(&self) -> Vec<Offset> {
        let common_len = self.common_tags().len();
        self.offsets
            .iter()
            .zip(&self.chunks)
            .filter(|(_, chunk)| chunk.tags.len() > common_len && !chunk.text.is_empty())
            .map(|(offset, _)| offset.clone())
            .collect()
    }

    /// The (last) text chunk covering a given character offset.
    fn chunk_at(&self, char_offset: usize) -> Option<&TextChunk> {
        if self.chunks.is_empty() {
            return None;
        }
        let mut i = 0;
        while i < self.chunks.len() - 1 && self.offsets[i + 1].start <= char_offset {
            i += 1;
        }
        Some(&self.chunks[i])
    }

    /// The tags that apply to the whole block, compared by name.
    pub fn common_tags(&self) -> Vec<TagRef> {
        let Some(first) = self.chunks.first() else {
            return Vec::new();
        };
        let mut common: Vec<TagRef> = first.tags.clone();
        for chunk in &self.chunks {
            if chunk.tags.len() < common.len() {
                common.truncate(chunk.tags.len());
            }
            for j in 0..common.len() {
                if common[j].borrow().name != chunk.tags[j].borrow().name {
                    common.truncate(j);
                    break;
                }
            }
        }
        common
    }

    /// HTML rendering. Adjacent chunks sharing a tag prefix (by identity)
    /// share the rendered open tags.
    pub fn html(&self) -> String {
        let mut html = String::new();
        // Currently open tag stack
        let mut old_tags: &[TagRef] = &[];

        for chunk in &self.chunks {
            // Find the highest offset up to which the tag stacks match,
            // then close and reopen only what differs.
            let min_len = old_tags.len().min(chunk.tags.len());
            let mut matched = 0;
            while matched < min_len && Rc::ptr_eq(&old_tags[matched], &chunk.tags[matched]) {
                matched += 1;
            }
            for tg in old_tags[matched..].iter().rev() {
                html.push_str(&tg.borrow().close_html());
            }
            for tg in &chunk.tags[matched..] {
                html.push_str(&tg.borrow().open_html());
            }
            old_tags = &chunk.tags;

            html.push_str(&tag::esc(&chunk.text));
            match &chunk.inline_content {
                Some(InlineContent::SubDoc(doc)) => html.push_str(&doc.html()),
                Some(InlineContent::EmptyTag(tg)) => {
                    html.push_str(&tg.borrow().open_html());
                    html.push_str(&tg.borrow().close_html());
                }
                None => {}
            }
        }

        for tg in old_tags.iter().rev() {
            html.push_str(&tg.borrow().close_html());
        }
        html
    }

    /// A tag that can represent this block: the outermost annotation of the
    /// first annotated chunk, or the root of its inline content. `None` if
    /// the block leads with bare non-whitespace text.
    pub fn root_item(&self) -> Option<TagRef> {
        for chunk in &self.chunks {
            if chunk.tags.is_empty() && chunk.text.chars().any(|c| !c.is_whitespace()) {
                return None;
            }
            if let Some(tg) = chunk.tags.first() {
                return Some(tg.clone());
            }
            if let Some(content) = &chunk.inline_content {
                return content.root_item();
            }
        }
        None
    }

    /// Split the block at sentence boundaries, wrapping each sentence in a
    /// `cx-segment` span and stamping wikilink IDs.
    ///
    /// Blocks rooted in a transclusion are not segmented; they only get
    /// their links stamped.
    pub fn segment(&self, boundaries: &BoundaryFn<'_>, ids: &mut IdGenerator) -> TextBlock {
        if let Some(root) = self.root_item() {
            if tag::is_transclusion(&root.borrow()) {
                let block = self.clone();
                set_link_ids_in_place(&block.chunks, ids);
                return block;
            }
        }

        let mut all_chunks: Vec<TextChunk> = Vec::new();
        let mut current: Vec<TextChunk> = Vec::new();

        // For each chunk, the boundaries that fall inside it.
        let groups = chunk_boundary_groups(&boundaries(&self.plain_text()), &self.chunks);

        let mut offset = 0;
        for (chunk, bounds) in self.chunks.iter().zip(groups) {
            let mut chunk = chunk.clone();
            for boundary in bounds {
                let rel_offset = boundary - offset;
                if rel_offset == 0 {
                    flush_segment(&mut current, &mut all_chunks, ids);
                } else {
                    let (left_text, right_text) = split_at_char(&chunk.text, rel_offset);
                    let left = TextChunk::new(left_text, chunk.tags.clone());
                    let right = TextChunk {
                        text: right_text.to_string(),
                        tags: chunk.tags.clone(),
                        inline_content: chunk.inline_content.take(),
                    };
                    current.push(left);
                    offset += rel_offset;
                    flush_segment(&mut current, &mut all_chunks, ids);
                    chunk = right;
                }
            }
            // Even a zero-width chunk may carry a reference
            offset += chunk.char_len();
            current.push(chunk);
        }
        flush_segment(&mut current, &mut all_chunks, ids);

        TextBlock::new(all_chunks, true)
    }

    /// Stamp wikilink IDs without segmenting.
    pub fn set_link_ids(&self, ids: &mut IdGenerator) {
        set_link_ids_in_place(&self.chunks, ids);
    }

    /// Build a new block applying this block's annotations to a translated
    /// string, given source↔target character range mappings. Unmapped gaps
    /// take the common tags; trailing whitespace becomes a terminal chunk.
    pub fn translate_tags(
        &self,
        target_text: &str,
        range_mappings: &[RangeMapping],
    ) -> Result<TextBlock, LinearDocError> {
        // Zero-width chunks by source offset; they are re-inserted at the
        // end of the mapped range that covers their offset.
        let mut empty_chunks: BTreeMap<usize, Vec<TextChunk>> = BTreeMap::new();
        for (chunk, offset) in self.chunks.iter().zip(&self.offsets) {
            if chunk.text.is_empty() {
                empty_chunks
                    .entry(offset.start)
                    .or_default()
                    .push(chunk.clone());
            }
        }

        let mut positioned: Vec<(usize, usize, TextChunk)> = Vec::new();
        for mapping in range_mappings {
            let source_end = mapping.source.start + mapping.source.length;
            let target_end = mapping.target.start + mapping.target.length;
            let Some(source_chunk) = self.chunk_at(mapping.source.start) else {
                continue;
            };
            positioned.push((
                mapping.target.start,
                mapping.target.length,
                TextChunk {
                    text: char_slice(target_text, mapping.target.start, target_end),
                    tags: source_chunk.tags.clone(),
                    inline_content: source_chunk.inline_content.clone(),
                },
            ));

            let covered: Vec<usize> = empty_chunks
                .keys()
                .copied()
                .filter(|&o| o >= mapping.source.start && o <= source_end)
                .collect();
            for o in covered {
                if let Some(chunks) = empty_chunks.remove(&o) {
                    for chunk in chunks {
                        positioned.push((target_end, 0, chunk));
                    }
                }
            }
        }

        positioned.sort_by_key(|(start, _, _)| *start);

        // Fill gaps between mapped ranges with common-tag text
        let common = self.common_tags();
        let mut pos = 0;
        let mut i = 0;
        while i < positioned.len() {
            let (start, length) = (positioned[i].0, positioned[i].1);
            if start < pos {
                return Err(LinearDocError::RangeOverlap(pos));
            }
            if start > pos {
                positioned.insert(
                    i,
                    (
                        pos,
                        start - pos,
                        TextChunk::new(char_slice(target_text, pos, start), common.clone()),
                    ),
                );
                i += 1;
            }
            pos = start + length;
            i += 1;
        }

        let total = target_text.chars().count();
        let tail = char_slice(target_text, pos, total);
        let trimmed = tail.trim_end();
        let tail_space = tail[trimmed.len()..].to_string();
        let tail = trimmed.to_string();

        if !tail.is_empty() {
            let length = tail.chars().count();
            positioned.push((pos, length, TextChunk::new(tail, common.clone())));
            pos += length;
        }

        // Remaining zero-width chunks land before the trailing whitespace
        for (_, chunks) in std::mem::take(&mut empty_chunks) {
            for chunk in chunks {
                positioned.push((pos, 0, chunk));
            }
        }

        if !tail_space.is_empty() {
            let length = tail_space.chars().count();
            positioned.push((pos, length, TextChunk::new(tail_space, common)));
        }

        Ok(TextBlock::new(
            positioned.into_iter().map(|(_, _, chunk)| chunk).collect(),
            true,
        ))
    }

    /// Indented XML rendition of the block, for debugging.
    pub(crate) fn dump_xml_array(&self, pad: &str) -> Vec<String> {
        let mut dump = Vec::new();
        for chunk in &self.chunks {
            let tags_dump = tag::dump_tags(&chunk.tags);
            let tags_attr = if tags_dump.is_empty() {
                String::new()
            } else {
                format!(" tags=\"{tags_dump}\"")
            };

            if !chunk.text.is_empty() {
                dump.push(format!(
                    "{pad}<cxtextchunk{tags_attr}>{}</cxtextchunk>",
                    tag::esc(&chunk.text).replace('\n', "&#10;")
                ));
            }

            match &chunk.inline_content {
                Some(InlineContent::SubDoc(doc)) => {
                    dump.push(format!("{pad}<cxinlineelement{tags_attr}>"));
                    dump.extend(doc.dump_xml_array(&format!("{pad}  ")));
                    dump.push(format!("{pad}</cxinlineelement>"));
                }
                Some(InlineContent::EmptyTag(tg)) => {
                    dump.push(format!("{pad}<cxinlineelement{tags_attr}>"));
                    dump.push(format!("{pad}  <{}/>", tg.borrow().name));
                    dump.push(format!("{pad}</cxinlineelement>"));
                }
                None => {}
            }
        }
        dump
    }
}

/// Close off the accumulated sentence: insert a fresh `cx-segment` span
/// above the common tags of the flushed chunks, stamp wikilinks, append.
fn flush_segment(current: &mut Vec<TextChunk>, all: &mut Vec<TextChunk>, ids: &mut IdGenerator) {
    if current.is_empty() {
        return;
    }
    let segment_id = ids.next_segment_id();
    let span = Tag::with_attrs(
        "span",
        [("class", "cx-segment"), ("data-segmentid", segment_id.as_str())],
    )
    .into_shared();
    let modified = add_common_tag(current, &span);
    set_link_ids_in_place(&modified, ids);
    all.extend(modified);
    current.clear();
}

/// Copy the chunks with `tag` inserted above their common tags (by
/// identity) and below everything else. The same allocation is inserted
/// into every chunk, so rendering collapses it into one open tag.
fn add_common_tag(chunks: &[TextChunk], tag: &TagRef) -> Vec<TextChunk> {
    if chunks.is_empty() {
        return Vec::new();
    }
    let common_len = common_prefix_len(chunks);
    chunks
        .iter()
        .map(|chunk| {
            let mut tags = chunk.tags.clone();
            tags.insert(common_len, tag.clone());
            TextChunk {
                text: chunk.text.clone(),
                tags,
                inline_content: chunk.inline_content.clone(),
            }
        })
        .collect()
}

/// Length of the longest tag prefix (by identity) shared by every chunk.
fn common_prefix_len(chunks: &[TextChunk]) -> usize {
    let Some(first) = chunks.first() else {
        return 0;
    };
    let mut len = first.tags.len();
    for chunk in &chunks[1..] {
        let limit = len.min(chunk.tags.len());
        let mut j = 0;
        while j < limit && Rc::ptr_eq(&first.tags[j], &chunk.tags[j]) {
            j += 1;
        }
        len = j;
    }
    len
}

/// Stamp unmarked wikilink anchors: strip the query string from `href`,
/// drop presentation attributes, and assign `class=cx-link` plus a fresh
/// `data-linkid`. Already-stamped anchors are left alone.
fn set_link_ids_in_place(chunks: &[TextChunk], ids: &mut IdGenerator) {
    for chunk in chunks {
        for tg in &chunk.tags {
            let mut tg = tg.borrow_mut();
            if tg.name != "a" {
                continue;
            }
            let Some(href) = tg.attr("href") else {
                continue;
            };
            let is_wikilink = tg
                .attr("rel")
                .is_some_and(|rel| !rel.is_empty() && format!(" {rel} ").contains(" mw:WikiLink "));
            if !is_wikilink || tg.attr("data-linkid").is_some() {
                continue;
            }

            let href = href.split('?').next().unwrap_or_default().to_string();
            tg.attributes.shift_remove("typeof");
            tg.attributes.shift_remove("href");
            tg.attributes.shift_remove("data-mw-i18n");
            tg.attributes
                .insert("class".to_string(), "cx-link".to_string());
            tg.attributes
                .insert("data-linkid".to_string(), ids.next_link_id());
            tg.attributes.insert("href".to_string(), href);
        }
    }
}

/// For each chunk, the sorted boundaries lying in its interior. Boundaries
/// between chunks go to the latest possible chunk; boundaries at the start
/// of the first chunk or the end of the last are dropped.
fn chunk_boundary_groups(boundaries: &[usize], chunks: &[TextChunk]) -> Vec<Vec<usize>> {
    let mut sorted = boundaries.to_vec();
    sorted.sort_unstable();
    let mut ptr = 0;
    while ptr < sorted.len() && sorted[ptr] == 0 {
        ptr += 1;
    }

    let mut groups = Vec::with_capacity(chunks.len());
    let mut offset = 0;
    for chunk in chunks {
        let length = chunk.char_len();
        let mut group = Vec::new();
        while ptr < sorted.len() {
            let boundary = sorted[ptr];
            if boundary >= offset + length {
                // beyond the interior of this chunk
                break;
            }
            group.push(boundary);
            ptr += 1;
        }
        offset += length;
        groups.push(group);
    }
    groups
}

/// Split at a character index, on a UTF-8 boundary.
fn split_at_char(text: &str, char_idx: usize) -> (&str, &str) {
    let byte = text
        .char_indices()
        .nth(char_idx)
        .map(|(b, _)| b)
        .unwrap_or(text.len());
    text.split_at(byte)
}

/// Slice by character positions.
fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end.saturating_sub(start)).collect()
}
