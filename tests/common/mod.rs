// Shared test helpers for lineardoc.

/// Deterministic stand-in for the external sentence boundary collaborator:
/// a sentence starts after `.`/`!`/`?` followed by whitespace. Offsets are
/// sentence starts, in characters; offset 0 may be included (the library
/// ignores it).
pub fn sentence_boundaries(text: &str, _language: &str) -> Vec<usize> {
    let chars: Vec<char> = text.chars().collect();
    let mut boundaries = vec![0];
    let mut i = 0;
    while i < chars.len() {
        if matches!(chars[i], '.' | '!' | '?') {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j > i + 1 && j < chars.len() {
                boundaries.push(j);
                i = j;
                continue;
            }
        }
        i += 1;
    }
    boundaries
}

/// Count occurrences of a needle.
#[allow(dead_code)]
pub fn count(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}
