//! # Font Management
//!
//! Certificates are set in the standard PDF font families (Helvetica, Times,
//! Courier), which every PDF viewer ships and which need no embedding. The
//! template names a family; bold and italic runs pick the matching face.

pub mod metrics;

pub use metrics::StandardFontMetrics;
use std::collections::HashMap;

/// A standard font family selectable from a template.
#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq)]
pub enum FontFamily {
    #[default]
    Helvetica,
    Times,
    Courier,
}

impl FontFamily {
    /// Resolve a template family name. Unknown names fall back to Helvetica.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "times" | "times-roman" | "times new roman" | "serif" => Self::Times,
            "courier" | "courier new" | "monospace" => Self::Courier,
            "helvetica" | "arial" | "sans-serif" => Self::Helvetica,
            other => {
                log::debug!("Unknown font family '{}', using Helvetica", other);
                Self::Helvetica
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: FontFamily,
    pub bold: bool,
    pub italic: bool,
}

/// The 12 standard PDF text fonts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
        }
    }
}

/// Maps family + bold + italic to one of the standard fonts.
pub struct FontRegistry {
    fonts: HashMap<FontKey, StandardFont>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        use FontFamily::*;

        let standard_mappings = [
            ((Helvetica, false, false), StandardFont::Helvetica),
            ((Helvetica, true, false), StandardFont::HelveticaBold),
            ((Helvetica, false, true), StandardFont::HelveticaOblique),
            ((Helvetica, true, true), StandardFont::HelveticaBoldOblique),
            ((Times, false, false), StandardFont::TimesRoman),
            ((Times, true, false), StandardFont::TimesBold),
            ((Times, false, true), StandardFont::TimesItalic),
            ((Times, true, true), StandardFont::TimesBoldItalic),
            ((Courier, false, false), StandardFont::Courier),
            ((Courier, true, false), StandardFont::CourierBold),
            ((Courier, false, true), StandardFont::CourierOblique),
            ((Courier, true, true), StandardFont::CourierBoldOblique),
        ];

        let fonts = standard_mappings
            .into_iter()
            .map(|((family, bold, italic), font)| {
                (
                    FontKey {
                        family,
                        bold,
                        italic,
                    },
                    font,
                )
            })
            .collect();

        Self { fonts }
    }

    /// Look up a font, falling back to regular Helvetica.
    pub fn resolve(&self, key: FontKey) -> StandardFont {
        self.fonts
            .get(&key)
            .copied()
            .unwrap_or(StandardFont::Helvetica)
    }
}

/// Shared font context used by layout and PDF serialization.
pub struct FontContext {
    registry: FontRegistry,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FontContext {
    pub fn new() -> Self {
        Self {
            registry: FontRegistry::new(),
        }
    }

    /// Get the advance width of a single character in points.
    pub fn char_width(&self, ch: char, key: FontKey, font_size: f64) -> f64 {
        self.registry
            .resolve(key)
            .metrics()
            .char_width(ch, font_size)
    }

    /// Measure the width of a string in points.
    pub fn measure_string(&self, text: &str, key: FontKey, font_size: f64) -> f64 {
        self.registry
            .resolve(key)
            .metrics()
            .measure_string(text, font_size, 0.0)
    }

    pub fn resolve(&self, key: FontKey) -> StandardFont {
        self.registry.resolve(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(family: FontFamily, bold: bool, italic: bool) -> FontKey {
        FontKey {
            family,
            bold,
            italic,
        }
    }

    #[test]
    fn test_font_context_helvetica() {
        let ctx = FontContext::new();
        let w = ctx.char_width(' ', key(FontFamily::Helvetica, false, false), 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_font_context_bold_wider() {
        let ctx = FontContext::new();
        let regular = ctx.measure_string("certificado", key(FontFamily::Helvetica, false, false), 12.0);
        let bold = ctx.measure_string("certificado", key(FontFamily::Helvetica, true, false), 12.0);
        assert!(bold > regular, "Bold text should be wider than regular");
    }

    #[test]
    fn test_family_names() {
        assert_eq!(FontFamily::from_name("times"), FontFamily::Times);
        assert_eq!(FontFamily::from_name(" Courier "), FontFamily::Courier);
        assert_eq!(FontFamily::from_name("helvetica"), FontFamily::Helvetica);
        assert_eq!(FontFamily::from_name("Comic Sans"), FontFamily::Helvetica);
    }

    #[test]
    fn test_resolve_faces() {
        let ctx = FontContext::new();
        assert_eq!(
            ctx.resolve(key(FontFamily::Times, true, true)).pdf_name(),
            "Times-BoldItalic"
        );
        assert_eq!(
            ctx.resolve(key(FontFamily::Helvetica, false, true)).pdf_name(),
            "Helvetica-Oblique"
        );
    }
}
