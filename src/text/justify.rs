//! Word spacing and horizontal placement for broken lines.

use super::{Line, TextMeasure, Word};

#[derive(Debug, Clone, Copy)]
pub struct JustifyParams {
    pub max_width: f64,
    pub space_width: f64,
    pub justify: bool,
    /// Upper bound on stretched spacing, as a multiple of `space_width`.
    pub max_word_spacing: f64,
}

/// A word with its offset from the block's left edge.
#[derive(Debug, Clone)]
pub struct PlacedWord<'a> {
    pub word: &'a Word,
    pub x: f64,
    pub width: f64,
}

#[derive(Debug, Clone)]
pub struct PlacedLine<'a> {
    pub words: Vec<PlacedWord<'a>>,
    /// Spacing applied at every gap.
    pub spacing: f64,
}

/// Spacing for one line.
///
/// Stretched spacing is only used when it lands within
/// `[space_width, space_width * max_word_spacing]`; anything else keeps the
/// plain space so short lines are not pulled apart.
pub fn word_spacing(
    line: &Line,
    is_last: bool,
    params: JustifyParams,
    measure: &dyn TextMeasure,
) -> f64 {
    let base = params.space_width;
    let gaps = line.gaps();
    if !params.justify || is_last || gaps == 0 {
        return base;
    }

    let words_width: f64 = line
        .words
        .iter()
        .map(|w| measure.measure(&w.text, w.style))
        .sum();
    let available = params.max_width - line.indent;
    let proposed = (available - words_width) / gaps as f64;

    if proposed >= base && proposed <= base * params.max_word_spacing {
        proposed
    } else {
        base
    }
}

/// Position every word of a line, starting at the line's indent.
pub fn place_line<'a>(
    line: &'a Line,
    is_last: bool,
    params: JustifyParams,
    measure: &dyn TextMeasure,
) -> PlacedLine<'a> {
    let spacing = word_spacing(line, is_last, params, measure);
    let mut x = line.indent;
    let mut words = Vec::with_capacity(line.words.len());

    for (i, word) in line.words.iter().enumerate() {
        if i > 0 && !word.joined {
            x += spacing;
        }
        let width = measure.measure(&word.text, word.style);
        words.push(PlacedWord { word, x, width });
        x += width;
    }

    PlacedLine { words, spacing }
}

/// Place a whole body; only its final line is exempt from justification.
pub fn place_lines<'a>(
    lines: &'a [Line],
    params: JustifyParams,
    measure: &dyn TextMeasure,
) -> Vec<PlacedLine<'a>> {
    let last = lines.len().saturating_sub(1);
    lines
        .iter()
        .enumerate()
        .map(|(i, line)| place_line(line, i == last, params, measure))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{break_lines, LayoutParams, RunStyle, Token};

    fn unit(word: &str, _style: RunStyle) -> f64 {
        word.chars().count() as f64
    }

    fn line(words: &[&str]) -> Line {
        Line {
            words: words
                .iter()
                .map(|w| Word {
                    text: w.to_string(),
                    style: RunStyle::PLAIN,
                    joined: false,
                })
                .collect(),
            indent: 0.0,
        }
    }

    fn params(max_width: f64, max_word_spacing: f64) -> JustifyParams {
        JustifyParams {
            max_width,
            space_width: 1.0,
            justify: true,
            max_word_spacing,
        }
    }

    #[test]
    fn test_stretch_within_bounds() {
        // 3 words of width 3, 2 gaps, width 13 → (13 - 9) / 2 = 2
        let spacing = word_spacing(&line(&["aaa", "bbb", "ccc"]), false, params(13.0, 3.0), &unit);
        assert!((spacing - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_stretch_too_wide_falls_back() {
        let spacing = word_spacing(&line(&["aaa", "bbb"]), false, params(30.0, 3.0), &unit);
        assert_eq!(spacing, 1.0);
    }

    #[test]
    fn test_overfull_line_falls_back() {
        let spacing = word_spacing(&line(&["aaaaa", "bbbbb"]), false, params(8.0, 3.0), &unit);
        assert_eq!(spacing, 1.0);
    }

    #[test]
    fn test_last_line_not_justified() {
        let spacing = word_spacing(&line(&["aaa", "bbb", "ccc"]), true, params(13.0, 3.0), &unit);
        assert_eq!(spacing, 1.0);
    }

    #[test]
    fn test_single_word_not_justified() {
        let spacing = word_spacing(&line(&["aaa"]), false, params(13.0, 3.0), &unit);
        assert_eq!(spacing, 1.0);
    }

    #[test]
    fn test_justify_disabled() {
        let mut p = params(13.0, 3.0);
        p.justify = false;
        assert_eq!(word_spacing(&line(&["aaa", "bbb", "ccc"]), false, p, &unit), 1.0);
    }

    #[test]
    fn test_spacing_always_within_bounds() {
        let text = "o participante concluiu com êxito todas as atividades previstas no programa de formação";
        let tokens = vec![Token::text(text, RunStyle::PLAIN)];
        for width in [12.0, 17.0, 23.0, 31.0, 44.0] {
            let layout = LayoutParams {
                max_width: width,
                space_width: 1.0,
                first_line_indent: 0.0,
            };
            let lines = break_lines(&tokens, layout, &unit);
            for placed in place_lines(&lines, params(width, 2.5), &unit) {
                assert!(placed.spacing >= 1.0 && placed.spacing <= 2.5);
            }
        }
    }

    #[test]
    fn test_place_line_positions() {
        let l = Line {
            words: vec![
                Word {
                    text: "Ana".into(),
                    style: RunStyle::BOLD,
                    joined: false,
                },
                Word {
                    text: ",".into(),
                    style: RunStyle::PLAIN,
                    joined: true,
                },
                Word {
                    text: "oi".into(),
                    style: RunStyle::PLAIN,
                    joined: false,
                },
            ],
            indent: 2.0,
        };
        let placed = place_line(&l, true, params(50.0, 3.0), &unit);
        let xs: Vec<f64> = placed.words.iter().map(|w| w.x).collect();
        assert_eq!(xs, vec![2.0, 5.0, 7.0]);
    }

    #[test]
    fn test_justified_line_fills_width() {
        let l = line(&["aa", "bb", "cc"]);
        let placed = place_line(&l, false, params(10.0, 3.0), &unit);
        let last = placed.words.last().unwrap();
        assert!((last.x + last.width - 10.0).abs() < 1e-9);
    }
}
