//! # Text Layout
//!
//! Line breaking for certificate bodies.
//!
//! The pipeline is: markup string → [`Token`] stream ([`markup`]) → [`Line`]s
//! ([`break_lines`]) → positioned words ([`justify`]). Everything here is
//! pure; widths come from a [`TextMeasure`] supplied by the caller, so the
//! same code runs against real font metrics or a fixed-width test double.

pub mod justify;
pub mod markup;

/// Emphasis flags carried by a text run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RunStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
}

impl RunStyle {
    pub const PLAIN: RunStyle = RunStyle {
        bold: false,
        italic: false,
        underline: false,
    };

    pub const BOLD: RunStyle = RunStyle {
        bold: true,
        italic: false,
        underline: false,
    };
}

/// One element of the token stream produced by the markup tokenizers.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Text { text: String, style: RunStyle },
    Newline,
}

impl Token {
    pub fn text(text: impl Into<String>, style: RunStyle) -> Self {
        Token::Text {
            text: text.into(),
            style,
        }
    }

    pub fn is_newline(&self) -> bool {
        matches!(self, Token::Newline)
    }
}

/// A run of non-whitespace characters placed on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub text: String,
    pub style: RunStyle,
    /// Glued to the previous word with no space between them (a style change
    /// mid-word, e.g. a bold name followed by a plain comma).
    pub joined: bool,
}

/// A line of words after line-breaking.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Line {
    pub words: Vec<Word>,
    /// Horizontal offset of the first word from the block's left edge.
    pub indent: f64,
}

impl Line {
    pub fn is_blank(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of inter-word gaps that take spacing.
    pub fn gaps(&self) -> usize {
        self.words.iter().skip(1).filter(|w| !w.joined).count()
    }

    /// The line's text with single spaces at every gap.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for (i, word) in self.words.iter().enumerate() {
            if i > 0 && !word.joined {
                out.push(' ');
            }
            out.push_str(&word.text);
        }
        out
    }
}

/// Width measurement delegated to whoever owns the font metrics.
pub trait TextMeasure {
    fn measure(&self, word: &str, style: RunStyle) -> f64;
}

impl<F> TextMeasure for F
where
    F: Fn(&str, RunStyle) -> f64,
{
    fn measure(&self, word: &str, style: RunStyle) -> f64 {
        self(word, style)
    }
}

/// Geometry for one layout pass.
#[derive(Debug, Clone, Copy)]
pub struct LayoutParams {
    pub max_width: f64,
    pub space_width: f64,
    /// Applied to the first line of the pass and to the first line after
    /// every blank line.
    pub first_line_indent: f64,
}

/// A piece of a word: text from one token, glued to its neighbours.
struct Fragment<'a> {
    text: &'a str,
    style: RunStyle,
}

/// Fragments with no whitespace between them; never broken across lines.
struct Chunk<'a> {
    fragments: Vec<Fragment<'a>>,
}

/// Break a token stream into lines that fit within `params.max_width`.
///
/// Greedy: each chunk goes on the current line if it fits, otherwise the line
/// is flushed. A chunk wider than an empty line is placed on its own line
/// rather than split.
pub fn break_lines(tokens: &[Token], params: LayoutParams, measure: &dyn TextMeasure) -> Vec<Line> {
    let mut lines = Vec::new();
    if tokens.is_empty() {
        return lines;
    }
    let mut paragraph_start = true;

    for group in tokens.split(|t| t.is_newline()) {
        let chunks = collect_chunks(group);
        if chunks.is_empty() {
            lines.push(Line::default());
            paragraph_start = true;
            continue;
        }

        let mut indent = if paragraph_start {
            params.first_line_indent
        } else {
            0.0
        };
        paragraph_start = false;

        let mut current = Line {
            words: Vec::new(),
            indent,
        };
        let mut line_width = 0.0;

        for chunk in chunks {
            let chunk_width: f64 = chunk
                .fragments
                .iter()
                .map(|f| measure.measure(f.text, f.style))
                .sum();
            let available = params.max_width - indent;

            if !current.words.is_empty()
                && line_width + params.space_width + chunk_width > available + 1e-9
            {
                lines.push(std::mem::take(&mut current));
                indent = 0.0;
                line_width = 0.0;
            }

            let gap = if current.words.is_empty() {
                0.0
            } else {
                params.space_width
            };
            line_width += gap + chunk_width;
            for (i, fragment) in chunk.fragments.iter().enumerate() {
                current.words.push(Word {
                    text: fragment.text.to_string(),
                    style: fragment.style,
                    joined: i > 0,
                });
            }
        }

        lines.push(current);
    }

    log::debug!("Broke {} tokens into {} lines", tokens.len(), lines.len());
    lines
}

/// Split one explicit-line group into unbreakable chunks.
fn collect_chunks(group: &[Token]) -> Vec<Chunk<'_>> {
    let mut chunks: Vec<Chunk<'_>> = Vec::new();
    // Whether the last chunk can still take a glued fragment.
    let mut open = false;

    for token in group {
        let Token::Text { text, style } = token else {
            continue;
        };
        for (is_space, run) in whitespace_runs(text) {
            if is_space {
                open = false;
                continue;
            }
            let fragment = Fragment { text: run, style: *style };
            match chunks.last_mut() {
                Some(chunk) if open => chunk.fragments.push(fragment),
                _ => chunks.push(Chunk {
                    fragments: vec![fragment],
                }),
            }
            open = true;
        }
    }

    chunks
}

/// Split a string into alternating whitespace / non-whitespace runs.
fn whitespace_runs(text: &str) -> Vec<(bool, &str)> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;

    for (idx, ch) in text.char_indices() {
        let is_space = ch.is_whitespace();
        match current {
            Some(kind) if kind == is_space => {}
            Some(kind) => {
                runs.push((kind, &text[start..idx]));
                start = idx;
                current = Some(is_space);
            }
            None => current = Some(is_space),
        }
    }
    if let Some(kind) = current {
        runs.push((kind, &text[start..]));
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One unit per character, spaces one unit.
    fn unit(word: &str, _style: RunStyle) -> f64 {
        word.chars().count() as f64
    }

    fn params(max_width: f64) -> LayoutParams {
        LayoutParams {
            max_width,
            space_width: 1.0,
            first_line_indent: 0.0,
        }
    }

    fn plain(text: &str) -> Vec<Token> {
        vec![Token::text(text, RunStyle::PLAIN)]
    }

    fn texts(lines: &[Line]) -> Vec<String> {
        lines.iter().map(|l| l.text()).collect()
    }

    #[test]
    fn test_single_line() {
        let lines = break_lines(&plain("Hello world"), params(100.0), &unit);
        assert_eq!(texts(&lines), vec!["Hello world"]);
    }

    #[test]
    fn test_line_break_at_space() {
        let lines = break_lines(&plain("aaa bbb ccc"), params(7.0), &unit);
        assert_eq!(texts(&lines), vec!["aaa bbb", "ccc"]);
    }

    #[test]
    fn test_exact_fit_stays_on_line() {
        let lines = break_lines(&plain("aaa bbb"), params(7.0), &unit);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn test_explicit_newline() {
        let tokens = vec![
            Token::text("A", RunStyle::PLAIN),
            Token::Newline,
            Token::text("B", RunStyle::PLAIN),
        ];
        for width in [0.5, 1.0, 50.0] {
            let lines = break_lines(&tokens, params(width), &unit);
            assert!(lines.len() >= 2);
            assert_eq!(texts(&lines)[0], "A");
        }
    }

    #[test]
    fn test_overwide_word_kept_whole() {
        let lines = break_lines(&plain("a extraordinarily b"), params(5.0), &unit);
        assert_eq!(texts(&lines), vec!["a", "extraordinarily", "b"]);
    }

    #[test]
    fn test_blank_line_resets_indent() {
        let tokens = vec![
            Token::text("aaa bbb ccc", RunStyle::PLAIN),
            Token::Newline,
            Token::text("ddd", RunStyle::PLAIN),
            Token::Newline,
            Token::Newline,
            Token::text("eee", RunStyle::PLAIN),
        ];
        let p = LayoutParams {
            max_width: 9.0,
            space_width: 1.0,
            first_line_indent: 2.0,
        };
        let lines = break_lines(&tokens, p, &unit);
        let indents: Vec<f64> = lines.iter().map(|l| l.indent).collect();
        assert_eq!(texts(&lines), vec!["aaa bbb", "ccc", "ddd", "", "eee"]);
        assert_eq!(indents, vec![2.0, 0.0, 0.0, 0.0, 2.0]);
    }

    #[test]
    fn test_indent_narrows_first_line() {
        let p = LayoutParams {
            max_width: 7.0,
            space_width: 1.0,
            first_line_indent: 2.0,
        };
        let lines = break_lines(&plain("aaa bbb ccc ddd"), p, &unit);
        assert_eq!(texts(&lines), vec!["aaa", "bbb ccc", "ddd"]);
    }

    #[test]
    fn test_style_change_mid_word_is_glued() {
        let tokens = vec![
            Token::text("por ", RunStyle::PLAIN),
            Token::text("Ana", RunStyle::BOLD),
            Token::text(", com", RunStyle::PLAIN),
        ];
        let lines = break_lines(&tokens, params(100.0), &unit);
        assert_eq!(lines[0].words.len(), 4);
        assert!(lines[0].words[2].joined);
        assert_eq!(lines[0].gaps(), 2);
        assert_eq!(lines[0].text(), "por Ana, com");
    }

    #[test]
    fn test_glued_chunk_moves_together() {
        let tokens = vec![
            Token::text("xx ", RunStyle::PLAIN),
            Token::text("Ana", RunStyle::BOLD),
            Token::text(".", RunStyle::PLAIN),
        ];
        let lines = break_lines(&tokens, params(5.0), &unit);
        assert_eq!(texts(&lines), vec!["xx", "Ana."]);
    }

    #[test]
    fn test_round_trip_plain_text() {
        let text = "Certifico que a pessoa concluiu o treinamento com aproveitamento";
        let lines = break_lines(&plain(text), params(20.0), &unit);
        let words: Vec<&str> = lines
            .iter()
            .flat_map(|l| l.words.iter().map(|w| w.text.as_str()))
            .collect();
        assert_eq!(words, text.split_whitespace().collect::<Vec<_>>());
    }

    #[test]
    fn test_words_never_split() {
        let text = "um dois três quatro cinco seis sete oito nove dez";
        let originals: Vec<&str> = text.split_whitespace().collect();
        for width in [1.0, 3.0, 4.5, 8.0, 13.0, 40.0] {
            let lines = break_lines(&plain(text), params(width), &unit);
            for line in &lines {
                for word in &line.words {
                    assert!(originals.contains(&word.text.as_str()));
                }
            }
        }
    }

    #[test]
    fn test_whitespace_only_group_is_blank() {
        let tokens = vec![
            Token::text("A", RunStyle::PLAIN),
            Token::Newline,
            Token::text("   ", RunStyle::PLAIN),
            Token::Newline,
            Token::text("B", RunStyle::PLAIN),
        ];
        let lines = break_lines(&tokens, params(10.0), &unit);
        assert_eq!(texts(&lines), vec!["A", "", "B"]);
    }

    #[test]
    fn test_empty_stream() {
        assert!(break_lines(&[], params(10.0), &unit).is_empty());
    }

    #[test]
    fn test_whitespace_runs() {
        assert_eq!(
            whitespace_runs(" ab  c"),
            vec![(true, " "), (false, "ab"), (true, "  "), (false, "c")]
        );
    }
}
