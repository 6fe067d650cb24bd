//! # Body Markup Tokenizers
//!
//! Certificate bodies come in two dialects:
//!
//! - **Block markup**: HTML from a rich-text editor (`<p>`, `<strong>`,
//!   `<ol>`, `<br>`, ...). Parsed into a DOM and walked, inheriting emphasis
//!   from ancestors.
//! - **Legacy markup**: plain text where `**` toggles bold and newlines are
//!   explicit breaks.
//!
//! Both produce the same [`Token`] stream.

use regex::Regex;
use scraper::{ElementRef, Html, Node};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::{RunStyle, Token};

/// Which dialect a body is written in, when the template says so.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormat {
    Plain,
    Block,
}

/// A body string tagged with its dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Markup<'a> {
    Plain(&'a str),
    Block(&'a str),
}

fn tag_pattern() -> &'static Regex {
    static TAG: OnceLock<Regex> = OnceLock::new();
    TAG.get_or_init(|| {
        Regex::new(r"</?[A-Za-z][A-Za-z0-9]*(\s[^<>]*)?/?>").expect("valid tag regex")
    })
}

impl<'a> Markup<'a> {
    /// Classify untyped input: block markup iff it contains an HTML tag.
    pub fn detect(source: &'a str) -> Self {
        if tag_pattern().is_match(source) {
            Markup::Block(source)
        } else {
            Markup::Plain(source)
        }
    }

    pub fn format(&self) -> BodyFormat {
        match self {
            Markup::Plain(_) => BodyFormat::Plain,
            Markup::Block(_) => BodyFormat::Block,
        }
    }

    /// Use the declared format when there is one, otherwise sniff.
    pub fn with_format(source: &'a str, format: Option<BodyFormat>) -> Self {
        match format {
            Some(BodyFormat::Plain) => Markup::Plain(source),
            Some(BodyFormat::Block) => Markup::Block(source),
            None => Self::detect(source),
        }
    }
}

/// Convert a body into a token stream.
///
/// Block markup that yields no tokens (e.g. only empty tags) falls back to
/// legacy tokenization of the same string.
pub fn tokenize(markup: Markup<'_>) -> Vec<Token> {
    match markup {
        Markup::Plain(source) => tokenize_legacy(source),
        Markup::Block(source) => {
            let tokens = tokenize_block(source);
            if tokens.is_empty() {
                log::debug!("Block markup produced no tokens, falling back to legacy markup");
                tokenize_legacy(source)
            } else {
                tokens
            }
        }
    }
}

/// `**` toggles bold; `\n` (or the two-character escape `\` `n`) breaks.
pub fn tokenize_legacy(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut bold = false;
    let mut buf = String::new();
    let mut chars = source.chars().peekable();

    let flush = |buf: &mut String, tokens: &mut Vec<Token>, bold: bool| {
        if !buf.is_empty() {
            let style = if bold { RunStyle::BOLD } else { RunStyle::PLAIN };
            tokens.push(Token::text(std::mem::take(buf), style));
        }
    };

    while let Some(ch) = chars.next() {
        match ch {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                flush(&mut buf, &mut tokens, bold);
                bold = !bold;
            }
            '\\' if chars.peek() == Some(&'n') => {
                chars.next();
                flush(&mut buf, &mut tokens, bold);
                tokens.push(Token::Newline);
            }
            '\n' => {
                flush(&mut buf, &mut tokens, bold);
                tokens.push(Token::Newline);
            }
            '\r' => {}
            _ => buf.push(ch),
        }
    }
    flush(&mut buf, &mut tokens, bold);

    tokens
}

/// Parse HTML and walk it into tokens.
pub fn tokenize_block(source: &str) -> Vec<Token> {
    let fragment = Html::parse_fragment(source);
    let mut walker = BlockWalker { tokens: Vec::new() };
    walker.walk(fragment.root_element(), RunStyle::PLAIN, false);

    while walker.tokens.last().is_some_and(Token::is_newline) {
        walker.tokens.pop();
    }
    walker.tokens
}

fn is_block_element(name: &str) -> bool {
    matches!(
        name,
        "p" | "div"
            | "section"
            | "article"
            | "h1"
            | "h2"
            | "h3"
            | "h4"
            | "h5"
            | "h6"
            | "blockquote"
            | "pre"
    )
}

/// Apply the emphasis an element contributes on top of the inherited style.
fn element_style(el: &ElementRef<'_>, inherited: RunStyle) -> RunStyle {
    let mut style = inherited;
    match el.value().name() {
        "b" | "strong" => style.bold = true,
        "i" | "em" => style.italic = true,
        "u" | "ins" => style.underline = true,
        _ => {}
    }

    if let Some(css) = el.value().attr("style") {
        let css = css.to_ascii_lowercase().replace(' ', "");
        if css.contains("font-weight:bold") || css.contains("font-weight:700") {
            style.bold = true;
        }
        if css.contains("font-style:italic") {
            style.italic = true;
        }
        if css.contains("text-decoration:underline") {
            style.underline = true;
        }
    }
    style
}

struct BlockWalker {
    tokens: Vec<Token>,
}

impl BlockWalker {
    /// Break unless we are at the start or already after a break.
    fn break_if_needed(&mut self) {
        if self.tokens.last().is_some_and(|t| !t.is_newline()) {
            self.tokens.push(Token::Newline);
        }
    }

    /// A space after text that does not already end in whitespace.
    fn separate(&mut self, style: RunStyle) {
        if let Some(Token::Text { text, .. }) = self.tokens.last() {
            if !text.ends_with(char::is_whitespace) {
                self.tokens.push(Token::text(" ", style));
            }
        }
    }

    fn push_text(&mut self, text: &str, style: RunStyle) {
        if text.is_empty() {
            return;
        }
        let at_line_start = self.tokens.last().map_or(true, Token::is_newline);
        if at_line_start && text.trim().is_empty() {
            return;
        }
        self.tokens.push(Token::text(text, style));
    }

    fn walk(&mut self, element: ElementRef<'_>, style: RunStyle, in_list: bool) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => self.push_text(text, style),
                Node::Element(_) => {
                    if let Some(el) = ElementRef::wrap(child) {
                        self.element(el, style, in_list);
                    }
                }
                _ => {}
            }
        }
    }

    fn element(&mut self, el: ElementRef<'_>, inherited: RunStyle, in_list: bool) {
        let style = element_style(&el, inherited);
        match el.value().name() {
            "br" => self.tokens.push(Token::Newline),
            "script" | "style" | "head" => {}
            // Lists and blocks inside list items are flattened into inline
            // content, kept apart from their neighbours by a space.
            name if in_list && (matches!(name, "ul" | "ol" | "li") || is_block_element(name)) => {
                self.separate(style);
                self.walk(el, style, true);
                self.separate(style);
            }
            "ul" => self.list(el, style, false),
            "ol" => self.list(el, style, true),
            name if is_block_element(name) => {
                self.break_if_needed();
                self.walk(el, style, false);
                self.break_if_needed();
            }
            _ => self.walk(el, style, in_list),
        }
    }

    fn list(&mut self, list: ElementRef<'_>, style: RunStyle, ordered: bool) {
        self.break_if_needed();
        let mut counter = 0usize;

        for child in list.children() {
            let Some(item) = ElementRef::wrap(child) else {
                continue;
            };
            if item.value().name() != "li" {
                self.element(item, style, true);
                continue;
            }

            counter += 1;
            let marker = if ordered {
                format!("{}. ", counter)
            } else {
                "• ".to_string()
            };
            let item_style = element_style(&item, style);
            self.break_if_needed();
            self.tokens.push(Token::text(marker, item_style));
            self.walk(item, item_style, true);
            self.break_if_needed();
        }

        self.break_if_needed();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{break_lines, LayoutParams};

    fn texts(tokens: &[Token]) -> Vec<String> {
        tokens
            .iter()
            .map(|t| match t {
                Token::Text { text, .. } => text.clone(),
                Token::Newline => "\n".to_string(),
            })
            .collect()
    }

    #[test]
    fn test_detect() {
        assert!(matches!(Markup::detect("<p>oi</p>"), Markup::Block(_)));
        assert!(matches!(Markup::detect("linha<br/>outra"), Markup::Block(_)));
        assert!(matches!(Markup::detect("**negrito** e 2 < 3"), Markup::Plain(_)));
        assert!(matches!(
            Markup::with_format("<p>x</p>", Some(BodyFormat::Plain)),
            Markup::Plain(_)
        ));
    }

    #[test]
    fn test_legacy_bold_toggle() {
        let tokens = tokenize(Markup::Plain("Certifico que **Ana** concluiu"));
        assert_eq!(
            tokens,
            vec![
                Token::text("Certifico que ", RunStyle::PLAIN),
                Token::text("Ana", RunStyle::BOLD),
                Token::text(" concluiu", RunStyle::PLAIN),
            ]
        );
    }

    #[test]
    fn test_legacy_newlines() {
        let tokens = tokenize(Markup::Plain("A\nB\\nC\r\n"));
        assert_eq!(texts(&tokens), vec!["A", "\n", "B", "\n", "C", "\n"]);
    }

    #[test]
    fn test_legacy_unclosed_bold_runs_to_end() {
        let tokens = tokenize(Markup::Plain("a **b c"));
        assert_eq!(tokens[1], Token::text("b c", RunStyle::BOLD));
    }

    #[test]
    fn test_block_paragraphs_and_emphasis() {
        let tokens = tokenize(Markup::Block(
            "<p>Certifico que <strong>Ana <em>Silva</em></strong></p><p><u>NR-10</u></p>",
        ));
        assert_eq!(
            tokens,
            vec![
                Token::text("Certifico que ", RunStyle::PLAIN),
                Token::text("Ana ", RunStyle::BOLD),
                Token::text(
                    "Silva",
                    RunStyle {
                        bold: true,
                        italic: true,
                        underline: false
                    }
                ),
                Token::Newline,
                Token::text(
                    "NR-10",
                    RunStyle {
                        bold: false,
                        italic: false,
                        underline: true
                    }
                ),
            ]
        );
    }

    #[test]
    fn test_block_br_and_empty_paragraph() {
        let tokens = tokenize(Markup::Block("<p>A</p><p><br></p><p>B</p>"));
        assert_eq!(texts(&tokens), vec!["A", "\n", "\n", "B"]);
    }

    #[test]
    fn test_ordered_list_markers() {
        let tokens = tokenize(Markup::Block(
            "<ol><li>um</li><li>dois</li><li>três</li></ol>",
        ));
        let markers: Vec<String> = texts(&tokens)
            .into_iter()
            .filter(|t| t.ends_with(". "))
            .collect();
        assert_eq!(markers, vec!["1. ", "2. ", "3. "]);
    }

    #[test]
    fn test_unordered_list_markers() {
        let tokens = tokenize(Markup::Block("<p>Conteúdo:</p><ul><li>a</li><li>b</li></ul>"));
        assert_eq!(
            texts(&tokens),
            vec!["Conteúdo:", "\n", "• ", "a", "\n", "• ", "b"]
        );
    }

    #[test]
    fn test_counter_restarts_per_list() {
        let tokens = tokenize(Markup::Block(
            "<ol><li>a</li><li>b</li></ol><ol><li>c</li></ol>",
        ));
        let markers: Vec<String> = texts(&tokens)
            .into_iter()
            .filter(|t| t.ends_with(". "))
            .collect();
        assert_eq!(markers, vec!["1. ", "2. ", "1. "]);
    }

    #[test]
    fn test_nested_list_is_flattened() {
        let tokens = tokenize(Markup::Block(
            "<ul><li>a<ul><li>interno</li></ul></li><li>b</li></ul>",
        ));
        assert_eq!(
            texts(&tokens),
            vec!["• ", "a", " ", "interno", " ", "\n", "• ", "b"]
        );
    }

    fn laid_out(source: &str) -> Vec<String> {
        let unit = |word: &str, _style: RunStyle| word.chars().count() as f64;
        let params = LayoutParams {
            max_width: 200.0,
            space_width: 1.0,
            first_line_indent: 0.0,
        };
        break_lines(&tokenize(Markup::Block(source)), params, &unit)
            .iter()
            .map(|line| line.text())
            .collect()
    }

    #[test]
    fn test_flattened_nested_list_keeps_words_apart() {
        assert_eq!(
            laid_out("<ul><li>Item a<ul><li>interno</li><li>outro</li></ul></li><li>b</li></ul>"),
            vec!["• Item a interno outro", "• b"]
        );
    }

    #[test]
    fn test_blocks_inside_list_item_keep_words_apart() {
        assert_eq!(
            laid_out("<ol><li><p>Primeiro</p><p>Segundo</p>fim</li></ol>"),
            vec!["1. Primeiro Segundo fim"]
        );
    }

    #[test]
    fn test_trailing_newlines_trimmed() {
        let tokens = tokenize(Markup::Block("<p>fim</p><br><br>"));
        assert_eq!(texts(&tokens), vec!["fim"]);
    }

    #[test]
    fn test_pretty_printed_html_whitespace_ignored() {
        let tokens = tokenize(Markup::Block("<p>A</p>\n  <p>B</p>\n"));
        assert_eq!(texts(&tokens), vec!["A", "\n", "B"]);
    }

    #[test]
    fn test_entities_decoded() {
        let tokens = tokenize(Markup::Block("<p>S&atilde;o Paulo &amp; Rio</p>"));
        assert_eq!(texts(&tokens), vec!["São Paulo & Rio"]);
    }

    #[test]
    fn test_empty_block_falls_back_to_legacy() {
        let tokens = tokenize(Markup::Block("<p></p>"));
        assert_eq!(texts(&tokens), vec!["<p></p>"]);
    }

    #[test]
    fn test_inline_css_emphasis() {
        let tokens = tokenize(Markup::Block(
            "<p><span style=\"font-weight: bold\">x</span></p>",
        ));
        assert_eq!(tokens, vec![Token::text("x", RunStyle::BOLD)]);
    }
}
