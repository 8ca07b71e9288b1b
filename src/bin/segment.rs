use std::io::{self, Read};
use std::process;

/// Naive fallback boundary detector: a sentence starts after `.`/`!`/`?`
/// plus whitespace. Real deployments plug in a proper segmenter through
/// the library API.
fn sentence_starts(text: &str, _language: &str) -> Vec<usize> {
    let chars: Vec<char> = text.chars().collect();
    let mut boundaries = Vec::new();
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

fn main() {
    let mut html = String::new();
    io::stdin().read_to_string(&mut html).expect("read stdin");
    match lineardoc::segment(&html, &sentence_starts) {
        Ok(out) => print!("{out}"),
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    }
}
