//! # Chain Splitter
//!
//! Breaks a compound command into the steps that can be validated one by one.
//! Steps are separated by `&&` or a newline outside quotes. A step opening with a loop
//! keyword is handed out whole, up to its closing `done`, as an opaque segment.
//! When no closing `done` is found the rest of the string belongs to the loop: the
//! splitter would rather under-split than cut a construct in half.

use std::iter::FusedIterator;

use crate::domain::types::CommandSegment;

const LOOP_KEYWORDS: &[&str] = &["for", "while", "until"];

/// Words after which the next word is again in command position.
const COMMAND_PREFIX_WORDS: &[&str] = &["do", "then", "else", "elif", "!", "{"];

pub fn split(command: &str) -> ChainSplitter<'_> {
    ChainSplitter {
        input: command,
        pos: 0,
    }
}

/// Single forward pass over the command. Not restartable.
#[derive(Debug)]
pub struct ChainSplitter<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Iterator for ChainSplitter<'a> {
    type Item = CommandSegment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest = &self.input[self.pos..];
            let start = self.pos + (rest.len() - rest.trim_start().len());
            if start >= self.input.len() {
                self.pos = self.input.len();
                return None;
            }

            if is_loop_start(&self.input[start..]) {
                let body_end =
                    find_construct_end(self.input, start).unwrap_or(self.input.len());
                // Trailing redirections or `; cmd` after `done` stay with the loop.
                let (end, next) = find_separator(self.input, body_end);
                self.pos = next;
                return Some(CommandSegment::opaque(self.input[start..end].trim()));
            }

            let (end, next) = find_separator(self.input, start);
            self.pos = next;
            let text = self.input[start..end].trim();
            if !text.is_empty() {
                return Some(CommandSegment::simple(text));
            }
        }
    }
}

impl FusedIterator for ChainSplitter<'_> {}

fn is_boundary(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b';' | b'&' | b'|' | b'(' | b')')
}

fn is_loop_start(s: &str) -> bool {
    let end = s.bytes().position(is_boundary).unwrap_or(s.len());
    LOOP_KEYWORDS.contains(&&s[..end])
}

/// Returns `(segment_end, resume_at)` for the first top-level `&&` or newline at or
/// after `from`. Both are `input.len()` when there is none.
fn find_separator(input: &str, from: usize) -> (usize, usize) {
    let bytes = input.as_bytes();
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;
    let mut i = from;

    while i < bytes.len() {
        let b = bytes[i];
        if escaped {
            escaped = false;
            i += 1;
            continue;
        }
        let quoted = in_single || in_double;
        match b {
            b'\\' if !in_single => escaped = true,
            b'\'' if !in_double => in_single = !in_single,
            b'"' if !in_single => in_double = !in_double,
            b'&' if !quoted && bytes.get(i + 1) == Some(&b'&') => return (i, i + 2),
            b'\n' if !quoted => return (i, i + 1),
            _ => {}
        }
        i += 1;
    }

    (bytes.len(), bytes.len())
}

/// Byte offset just past the `done` that closes the loop opened at `from`.
fn find_construct_end(input: &str, from: usize) -> Option<usize> {
    let bytes = input.as_bytes();
    let mut depth = 0usize;
    let mut command_position = true;
    let mut i = from;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\n' || matches!(b, b';' | b'&' | b'|' | b'(' | b')') {
            command_position = true;
            i += 1;
            continue;
        }
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let word_start = i;
        let mut in_single = false;
        let mut in_double = false;
        let mut escaped = false;
        while i < bytes.len() {
            let c = bytes[i];
            if escaped {
                escaped = false;
                i += 1;
                continue;
            }
            if !in_single && !in_double && is_boundary(c) {
                break;
            }
            match c {
                b'\\' if !in_single => escaped = true,
                b'\'' if !in_double => in_single = !in_single,
                b'"' if !in_single => in_double = !in_double,
                _ => {}
            }
            i += 1;
        }

        let word = &input[word_start..i];
        if command_position {
            if LOOP_KEYWORDS.contains(&word) {
                depth += 1;
            } else if word == "done" {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
        }
        command_position = COMMAND_PREFIX_WORDS.contains(&word);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SegmentKind;

    fn texts(command: &str) -> Vec<(&str, SegmentKind)> {
        split(command).map(|s| (s.text, s.kind)).collect()
    }

    #[test]
    fn test_single_command() {
        assert_eq!(
            texts("ffmpeg -i in.mp4 out.mp3"),
            vec![("ffmpeg -i in.mp4 out.mp3", SegmentKind::Simple)]
        );
    }

    #[test]
    fn test_chain_preserves_order() {
        assert_eq!(
            texts("pdftocairo -png input.pdf page && mogrify -colorspace Gray page-*.png"),
            vec![
                ("pdftocairo -png input.pdf page", SegmentKind::Simple),
                ("mogrify -colorspace Gray page-*.png", SegmentKind::Simple),
            ]
        );
    }

    #[test]
    fn test_empty_segments_dropped() {
        assert_eq!(
            texts("&& convert a.png b.jpg &&  && pdfinfo doc.pdf &&"),
            vec![
                ("convert a.png b.jpg", SegmentKind::Simple),
                ("pdfinfo doc.pdf", SegmentKind::Simple),
            ]
        );
        assert!(texts("   ").is_empty());
        assert!(texts("&&").is_empty());
    }

    #[test]
    fn test_newline_separates_steps() {
        assert_eq!(
            texts("pdftocairo -png in.pdf page\n\nmogrify -resize 50% page-1.png\n"),
            vec![
                ("pdftocairo -png in.pdf page", SegmentKind::Simple),
                ("mogrify -resize 50% page-1.png", SegmentKind::Simple),
            ]
        );
    }

    #[test]
    fn test_quoted_operator_does_not_split() {
        assert_eq!(
            texts(r#"convert in.png -annotate +10+10 "a && b" out.png"#),
            vec![(
                r#"convert in.png -annotate +10+10 "a && b" out.png"#,
                SegmentKind::Simple
            )]
        );
    }

    #[test]
    fn test_for_loop_is_opaque() {
        let command = r#"pdftocairo -png input.pdf page && for f in page-*.png; do convert "$f" -resize 50% "$f" && echo "$f"; done"#;
        assert_eq!(
            texts(command),
            vec![
                ("pdftocairo -png input.pdf page", SegmentKind::Simple),
                (
                    r#"for f in page-*.png; do convert "$f" -resize 50% "$f" && echo "$f"; done"#,
                    SegmentKind::Opaque
                ),
            ]
        );
    }

    #[test]
    fn test_scan_resumes_after_loop() {
        let command = "for f in *.jpg; do mogrify -strip $f; done > log.txt && pdfinfo a.pdf";
        assert_eq!(
            texts(command),
            vec![
                (
                    "for f in *.jpg; do mogrify -strip $f; done > log.txt",
                    SegmentKind::Opaque
                ),
                ("pdfinfo a.pdf", SegmentKind::Simple),
            ]
        );
    }

    #[test]
    fn test_nested_loops() {
        let command = "for a in 1 2; do for b in x y; do echo $a$b; done; done && ffmpeg -i a.mp4 b.mp3";
        let segments = texts(command);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[0].1, SegmentKind::Opaque);
        assert!(segments[0].0.ends_with("done; done"));
        assert_eq!(segments[1], ("ffmpeg -i a.mp4 b.mp3", SegmentKind::Simple));
    }

    #[test]
    fn test_unterminated_loop_takes_remainder() {
        let command = "while read f; do convert $f out.png && pdftocairo";
        assert_eq!(texts(command), vec![(command, SegmentKind::Opaque)]);
    }

    #[test]
    fn test_done_inside_filename_is_not_terminator() {
        let command = "for f in a b; do cp done.png $f.png; done && tesseract x.png out";
        let segments = texts(command);
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].0, "tesseract x.png out");
    }

    #[test]
    fn test_keyword_prefix_is_not_loop() {
        assert_eq!(
            texts("format_tool in.png"),
            vec![("format_tool in.png", SegmentKind::Simple)]
        );
    }

    #[test]
    fn test_fused() {
        let mut splitter = split("pdfinfo a.pdf");
        assert!(splitter.next().is_some());
        assert!(splitter.next().is_none());
        assert!(splitter.next().is_none());
    }
}
