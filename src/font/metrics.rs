//! Advance widths for the standard PDF fonts, in 1/1000 em units, taken from
//! the Adobe Font Metrics files for the printable ASCII range (32..=126).
//!
//! Latin-1 accented letters reuse the width of their base letter, which is
//! what the AFM files specify for every accented glyph in these families.

use super::StandardFont;

/// Width table plus the handful of punctuation glyphs outside ASCII that show
/// up in certificate text (list bullets, typographic quotes, dashes).
pub struct StandardFontMetrics {
    ascii: &'static [u16; 95],
    bullet: u16,
    quote: u16,
    en_dash: u16,
    fallback: u16,
}

impl StandardFontMetrics {
    /// Advance width of one character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.units(ch) as f64 / 1000.0 * font_size
    }

    /// Width of a string in points, with optional extra spacing per character.
    pub fn measure_string(&self, text: &str, font_size: f64, letter_spacing: f64) -> f64 {
        text.chars()
            .map(|ch| self.char_width(ch, font_size) + letter_spacing)
            .sum()
    }

    fn units(&self, ch: char) -> u16 {
        let ch = fold_accent(ch);
        let cp = ch as u32;
        if (32..=126).contains(&cp) {
            return self.ascii[(cp - 32) as usize];
        }
        match ch {
            '\u{a0}' => self.ascii[0],
            '\u{2022}' => self.bullet,
            '\u{2018}' | '\u{2019}' | '\u{201c}' | '\u{201d}' => self.quote,
            '\u{2013}' => self.en_dash,
            '\u{2014}' => 1000,
            '\u{2026}' => 1000,
            'º' | 'ª' | '°' => 365,
            _ => self.fallback,
        }
    }
}

/// Map an accented Latin-1 letter to its unaccented base letter.
pub(crate) fn fold_accent(ch: char) -> char {
    match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' => 'A',
        'ç' => 'c',
        'Ç' => 'C',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'È' | 'É' | 'Ê' | 'Ë' => 'E',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'Ì' | 'Í' | 'Î' | 'Ï' => 'I',
        'ñ' => 'n',
        'Ñ' => 'N',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' => 'O',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'Ù' | 'Ú' | 'Û' | 'Ü' => 'U',
        'ý' | 'ÿ' => 'y',
        'Ý' => 'Y',
        other => other,
    }
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,      // p..~
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

#[rustfmt::skip]
const TIMES_ITALIC: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 675, 675, 675, 500,
    920, 611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722,
    611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556, 389, 278, 389, 422, 500,
    333, 500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722, 500, 500,
    500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,
];

#[rustfmt::skip]
const TIMES_BOLD_ITALIC: [u16; 95] = [
    250, 389, 555, 500, 500, 833, 778, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    832, 667, 667, 667, 722, 667, 667, 722, 778, 389, 500, 667, 611, 889, 722, 722,
    611, 722, 667, 556, 611, 722, 667, 889, 667, 611, 611, 333, 278, 333, 570, 500,
    333, 500, 500, 444, 500, 444, 333, 500, 556, 278, 278, 500, 278, 778, 556, 500,
    500, 500, 389, 389, 278, 556, 444, 667, 500, 444, 389, 348, 220, 348, 570,
];

const COURIER: [u16; 95] = [600; 95];

static HELVETICA_METRICS: StandardFontMetrics = StandardFontMetrics {
    ascii: &HELVETICA,
    bullet: 350,
    quote: 222,
    en_dash: 556,
    fallback: 556,
};

static HELVETICA_BOLD_METRICS: StandardFontMetrics = StandardFontMetrics {
    ascii: &HELVETICA_BOLD,
    bullet: 350,
    quote: 278,
    en_dash: 556,
    fallback: 611,
};

static TIMES_ROMAN_METRICS: StandardFontMetrics = StandardFontMetrics {
    ascii: &TIMES_ROMAN,
    bullet: 350,
    quote: 333,
    en_dash: 500,
    fallback: 500,
};

static TIMES_BOLD_METRICS: StandardFontMetrics = StandardFontMetrics {
    ascii: &TIMES_BOLD,
    bullet: 350,
    quote: 333,
    en_dash: 500,
    fallback: 500,
};

static TIMES_ITALIC_METRICS: StandardFontMetrics = StandardFontMetrics {
    ascii: &TIMES_ITALIC,
    bullet: 350,
    quote: 333,
    en_dash: 500,
    fallback: 500,
};

static TIMES_BOLD_ITALIC_METRICS: StandardFontMetrics = StandardFontMetrics {
    ascii: &TIMES_BOLD_ITALIC,
    bullet: 350,
    quote: 333,
    en_dash: 500,
    fallback: 500,
};

static COURIER_METRICS: StandardFontMetrics = StandardFontMetrics {
    ascii: &COURIER,
    bullet: 600,
    quote: 600,
    en_dash: 600,
    fallback: 600,
};

impl StandardFont {
    /// AFM metrics for this font. Obliques share the upright widths.
    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica | Self::HelveticaOblique => &HELVETICA_METRICS,
            Self::HelveticaBold | Self::HelveticaBoldOblique => &HELVETICA_BOLD_METRICS,
            Self::TimesRoman => &TIMES_ROMAN_METRICS,
            Self::TimesBold => &TIMES_BOLD_METRICS,
            Self::TimesItalic => &TIMES_ITALIC_METRICS,
            Self::TimesBoldItalic => &TIMES_BOLD_ITALIC_METRICS,
            Self::Courier
            | Self::CourierBold
            | Self::CourierOblique
            | Self::CourierBoldOblique => &COURIER_METRICS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helvetica_space() {
        let m = StandardFont::Helvetica.metrics();
        assert!((m.char_width(' ', 12.0) - 3.336).abs() < 1e-9);
    }

    #[test]
    fn test_accented_letters_use_base_width() {
        let m = StandardFont::TimesRoman.metrics();
        assert_eq!(m.char_width('ã', 10.0), m.char_width('a', 10.0));
        assert_eq!(m.char_width('Ç', 10.0), m.char_width('C', 10.0));
    }

    #[test]
    fn test_courier_is_monospaced() {
        let m = StandardFont::Courier.metrics();
        assert_eq!(m.measure_string("iii", 10.0, 0.0), m.measure_string("WWW", 10.0, 0.0));
    }

    #[test]
    fn test_bullet_width() {
        let m = StandardFont::Helvetica.metrics();
        assert!((m.char_width('•', 10.0) - 3.5).abs() < 1e-9);
    }
}
