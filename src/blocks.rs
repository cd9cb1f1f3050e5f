//! Splitting multi-line text into paragraph and quote blocks.

use std::borrow::Cow;

/// Consecutive blank lines kept inside a block.
const MAX_BLANK_LINES: usize = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    Quote,
}

impl BlockKind {
    /// Container element the block renders into.
    pub fn tag(&self) -> &'static str {
        match self {
            BlockKind::Paragraph => "p",
            BlockKind::Quote => "blockquote",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock {
    pub kind: BlockKind,
    pub content: String,
}

impl TextBlock {
    pub fn paragraph(content: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            content: content.into(),
        }
    }

    pub fn quote(content: impl Into<String>) -> Self {
        Self {
            kind: BlockKind::Quote,
            content: content.into(),
        }
    }
}

/// `\r\n` and lone `\r` become `\n`.
pub fn normalize_newlines(text: &str) -> Cow<'_, str> {
    if text.contains('\r') {
        Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
    } else {
        Cow::Borrowed(text)
    }
}

/// Split `text` into blocks in input order.
///
/// A line starting with `>` (optionally followed by one whitespace
/// character, both stripped) is quoted. Runs of lines with the same
/// quotedness form one block. Leading and trailing blank lines of a block
/// are dropped, runs of blank lines inside it are capped, and blocks left
/// empty are skipped.
pub fn segment(text: &str) -> Vec<TextBlock> {
    let text = normalize_newlines(text);
    let mut blocks = Vec::new();
    let mut kind = BlockKind::Paragraph;
    let mut lines: Vec<&str> = Vec::new();

    for line in text.split('\n') {
        let (line_kind, content) = match line.strip_prefix('>') {
            Some(rest) => (BlockKind::Quote, strip_one_space(rest)),
            None => (BlockKind::Paragraph, line),
        };

        if line_kind != kind {
            flush(&mut blocks, kind, &lines);
            lines.clear();
            kind = line_kind;
        }
        lines.push(content);
    }
    flush(&mut blocks, kind, &lines);

    blocks
}

fn strip_one_space(s: &str) -> &str {
    match s.chars().next() {
        Some(c) if c.is_whitespace() => &s[c.len_utf8()..],
        _ => s,
    }
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

fn flush(blocks: &mut Vec<TextBlock>, kind: BlockKind, lines: &[&str]) {
    let Some(first) = lines.iter().position(|l| !is_blank(l)) else {
        return;
    };
    let last = lines.iter().rposition(|l| !is_blank(l)).unwrap_or(first);

    let mut content = String::new();
    let mut blank_run = 0;
    for (i, line) in lines[first..=last].iter().enumerate() {
        if is_blank(line) {
            blank_run += 1;
            if blank_run > MAX_BLANK_LINES {
                continue;
            }
        } else {
            blank_run = 0;
        }

        if i > 0 {
            content.push('\n');
        }
        if !is_blank(line) {
            content.push_str(line);
        }
    }

    blocks.push(TextBlock { kind, content });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_segmentation() {
        let blocks = segment("hello\n> a quote\n> continues\nback to normal");
        assert_eq!(
            blocks,
            vec![
                TextBlock::paragraph("hello"),
                TextBlock::quote("a quote\ncontinues"),
                TextBlock::paragraph("back to normal"),
            ]
        );
    }

    #[test]
    fn test_marker_without_space() {
        assert_eq!(segment(">tight"), vec![TextBlock::quote("tight")]);
        assert_eq!(segment(">  two spaces"), vec![TextBlock::quote(" two spaces")]);
        assert_eq!(segment(" > not a quote"), vec![TextBlock::paragraph(" > not a quote")]);
    }

    #[test]
    fn test_crlf() {
        assert_eq!(
            segment("a\r\n> b\rc"),
            vec![
                TextBlock::paragraph("a"),
                TextBlock::quote("b"),
                TextBlock::paragraph("c"),
            ]
        );
    }

    #[test]
    fn test_blank_lines_are_capped() {
        let blocks = segment("top\n\n\n\n\n\nbottom");
        assert_eq!(blocks, vec![TextBlock::paragraph("top\n\nbottom")]);

        let blocks = segment("top\n\n\nbottom");
        assert_eq!(blocks, vec![TextBlock::paragraph("top\n\nbottom")]);

        let blocks = segment("top\n\nbottom\nend");
        assert_eq!(blocks, vec![TextBlock::paragraph("top\n\nbottom\nend")]);
    }

    #[test]
    fn test_edges_trimmed_and_empty_skipped() {
        assert_eq!(segment(""), vec![]);
        assert_eq!(segment("\n \n"), vec![]);
        assert_eq!(
            segment("intro\n\n> quoted\n>\n"),
            vec![TextBlock::paragraph("intro"), TextBlock::quote("quoted")]
        );
    }
}
