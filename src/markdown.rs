//! Message content renderer.
//!
//! Turns a raw reply string into an ordered sequence of display blocks:
//! fenced code blocks, bold/italic spans, and plain paragraphs with bare
//! URLs lifted into link spans. The function is total — malformed or
//! unterminated markers fall through to the plain branch.

use std::sync::OnceLock;

use regex::Regex;

/// A rendered piece of message content, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Triple-backtick fenced code with an optional language tag on the
    /// first line. `body` excludes the tag; the copy action uses it as-is.
    Code { language: String, body: String },
    Bold(String),
    Italic(String),
    /// Plain text with detected URLs split out as link spans.
    Paragraph(Vec<Inline>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inline {
    Text(String),
    Link(String),
}

/// Matches, in order of precedence at a given position: a fenced code
/// run, a `**bold**` run, or a `*italic*` run. No nesting — one pass.
fn marker_regex() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"(?s)```.*?```|\*\*[^*]+\*\*|\*[^*]+\*").expect("valid marker regex")
    })
}

fn url_regex() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| Regex::new(r"https?://\S+").expect("valid url regex"))
}

/// Split `text` into display blocks, in source order.
pub fn render(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut last = 0;

    for m in marker_regex().find_iter(text) {
        if m.start() > last {
            blocks.push(paragraph(&text[last..m.start()]));
        }
        blocks.push(classify(m.as_str()));
        last = m.end();
    }
    if last < text.len() {
        blocks.push(paragraph(&text[last..]));
    }

    // A string with no content still renders as a single empty paragraph.
    if blocks.is_empty() {
        blocks.push(Block::Paragraph(vec![Inline::Text(String::new())]));
    }
    blocks
}

/// First-match-wins over {code, bold, italic, plain}. Segments that
/// satisfy several marker patterns are not re-analyzed.
fn classify(segment: &str) -> Block {
    if segment.len() >= 6 && segment.starts_with("```") && segment.ends_with("```") {
        let inner = segment[3..segment.len() - 3].trim();
        let (language, body) = match inner.split_once('\n') {
            Some((first, rest)) => (first.trim().to_string(), rest.to_string()),
            None => (inner.to_string(), String::new()),
        };
        Block::Code { language, body }
    } else if segment.len() > 4 && segment.starts_with("**") && segment.ends_with("**") {
        Block::Bold(segment[2..segment.len() - 2].to_string())
    } else if segment.len() > 2 && segment.starts_with('*') && segment.ends_with('*') {
        Block::Italic(segment[1..segment.len() - 1].to_string())
    } else {
        paragraph(segment)
    }
}

fn paragraph(text: &str) -> Block {
    let mut spans = Vec::new();
    let mut last = 0;

    for m in url_regex().find_iter(text) {
        if m.start() > last {
            spans.push(Inline::Text(text[last..m.start()].to_string()));
        }
        spans.push(Inline::Link(m.as_str().to_string()));
        last = m.end();
    }
    if last < text.len() {
        spans.push(Inline::Text(text[last..].to_string()));
    }
    if spans.is_empty() {
        spans.push(Inline::Text(String::new()));
    }
    Block::Paragraph(spans)
}

impl Block {
    /// Text content with delimiter markers and link wrapping stripped.
    pub fn visible_text(&self) -> String {
        match self {
            Block::Code { language, body } => {
                if language.is_empty() {
                    body.clone()
                } else {
                    format!("{language}\n{body}")
                }
            }
            Block::Bold(text) | Block::Italic(text) => text.clone(),
            Block::Paragraph(spans) => spans
                .iter()
                .map(|span| match span {
                    Inline::Text(text) => text.as_str(),
                    Inline::Link(url) => url.as_str(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visible(blocks: &[Block]) -> String {
        blocks.iter().map(Block::visible_text).collect()
    }

    #[test]
    fn test_code_block_with_language_tag() {
        let blocks = render("before\n```py\nx = 1\ny = 2\n```\nafter");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec![Inline::Text("before\n".to_string())]),
                Block::Code {
                    language: "py".to_string(),
                    body: "x = 1\ny = 2".to_string(),
                },
                Block::Paragraph(vec![Inline::Text("\nafter".to_string())]),
            ]
        );
    }

    #[test]
    fn test_mixed_markers_preserve_order() {
        let blocks = render("Hello **world**\n```js\nconsole.log(1)\n```");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec![Inline::Text("Hello ".to_string())]),
                Block::Bold("world".to_string()),
                Block::Paragraph(vec![Inline::Text("\n".to_string())]),
                Block::Code {
                    language: "js".to_string(),
                    body: "console.log(1)".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_plain_text_is_single_paragraph() {
        let blocks = render("no markers in here at all");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![Inline::Text(
                "no markers in here at all".to_string()
            )])]
        );
    }

    #[test]
    fn test_empty_input_is_single_empty_paragraph() {
        let blocks = render("");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![Inline::Text(String::new())])]
        );
    }

    #[test]
    fn test_urls_become_link_spans() {
        let blocks = render("see https://example.com and http://a.io now");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![
                Inline::Text("see ".to_string()),
                Inline::Link("https://example.com".to_string()),
                Inline::Text(" and ".to_string()),
                Inline::Link("http://a.io".to_string()),
                Inline::Text(" now".to_string()),
            ])]
        );
    }

    #[test]
    fn test_bold_and_italic() {
        let blocks = render("a *i* b **strong** c");
        assert_eq!(
            blocks,
            vec![
                Block::Paragraph(vec![Inline::Text("a ".to_string())]),
                Block::Italic("i".to_string()),
                Block::Paragraph(vec![Inline::Text(" b ".to_string())]),
                Block::Bold("strong".to_string()),
                Block::Paragraph(vec![Inline::Text(" c".to_string())]),
            ]
        );
    }

    #[test]
    fn test_unterminated_fence_falls_through_to_plain() {
        let blocks = render("```js\nlet x = 1;");
        assert_eq!(
            blocks,
            vec![Block::Paragraph(vec![Inline::Text(
                "```js\nlet x = 1;".to_string()
            )])]
        );
    }

    #[test]
    fn test_fence_wins_over_asterisks() {
        // The whole run is fenced; the asterisks inside are not re-analyzed.
        let blocks = render("```**bold**```");
        assert_eq!(
            blocks,
            vec![Block::Code {
                language: "**bold**".to_string(),
                body: String::new(),
            }]
        );
    }

    #[test]
    fn test_fence_without_language_line() {
        let blocks = render("```just one line```");
        assert_eq!(
            blocks,
            vec![Block::Code {
                language: "just one line".to_string(),
                body: String::new(),
            }]
        );
    }

    #[test]
    fn test_rendering_is_lossless_over_text_content() {
        let cases = [
            "plain text with https://example.com inside",
            "a *i* b **strong** c",
            "x ```js\ncode()``` y",
            "**lead** then ```rs\nfn main() {}``` then *tail*",
        ];
        for case in cases {
            let stripped: String = case.replace("```", "").replace("**", "").replace('*', "");
            assert_eq!(visible(&render(case)), stripped, "lossless for {case:?}");
        }
    }

    #[test]
    fn test_multiple_fences_stay_separate() {
        let blocks = render("```a\none```mid```b\ntwo```");
        assert_eq!(
            blocks,
            vec![
                Block::Code {
                    language: "a".to_string(),
                    body: "one".to_string(),
                },
                Block::Paragraph(vec![Inline::Text("mid".to_string())]),
                Block::Code {
                    language: "b".to_string(),
                    body: "two".to_string(),
                },
            ]
        );
    }
}
