//! # Certificate Templates
//!
//! A template is the per-deployment configuration every certificate in a
//! batch shares: fonts, logo placements, header lines, the title/body/footer
//! strings with `{{placeholder}}` tokens, text block positions, justification
//! options and the two signature blocks.
//!
//! Templates are edited by hand and by older tooling, so numeric fields are
//! read leniently: JSON numbers and numeric strings (`"12"`, `"12,5"`) are
//! accepted, and anything else is treated as absent. Every position has a
//! default for A4 landscape, so an empty template `{}` still renders.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{CertError, Result};
use crate::font::FontFamily;
use crate::image_loader::{load_image, LoadedImage};
use crate::text::markup::BodyFormat;

/// Inset between the page edge and default logo slots.
const LOGO_MARGIN: f64 = 20.0;
const LOGO_WIDTH: f64 = 35.0;
const LOGO_HEIGHT: f64 = 20.0;
/// Left and right margin of the default text blocks.
const TEXT_MARGIN: f64 = 30.0;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default)]
    pub fonts: Fonts,
    #[serde(default)]
    pub logos: Vec<Logo>,
    #[serde(default)]
    pub header_lines: Vec<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub footer: String,
    /// Declared body dialect; sniffed from the body when absent.
    #[serde(default)]
    pub body_format: Option<BodyFormat>,
    #[serde(default)]
    pub text_positions: TextPositions,
    #[serde(default)]
    pub text_options: TextOptions,
    #[serde(default)]
    pub signature1: SignatureConfig,
    #[serde(default)]
    pub signature2: SignatureConfig,
    #[serde(default)]
    pub signature_positions: SignaturePositions,
    #[serde(default, deserialize_with = "lenient_string")]
    pub entity_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fonts {
    #[serde(default)]
    pub family: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub header: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub title: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub name: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub body: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub footer: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub signature: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub signature_role: Option<f64>,
}

/// Resolved font sizes in points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontSizes {
    pub header: f64,
    pub title: f64,
    pub name: f64,
    pub body: f64,
    pub footer: f64,
    pub signature: f64,
    pub signature_role: f64,
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

impl Fonts {
    pub fn family(&self) -> FontFamily {
        self.family
            .as_deref()
            .map(FontFamily::from_name)
            .unwrap_or_default()
    }

    pub fn sizes(&self) -> FontSizes {
        FontSizes {
            header: positive(self.header).unwrap_or(12.0),
            title: positive(self.title).unwrap_or(26.0),
            name: positive(self.name).unwrap_or(22.0),
            body: positive(self.body).unwrap_or(14.0),
            footer: positive(self.footer).unwrap_or(10.0),
            signature: positive(self.signature).unwrap_or(11.0),
            signature_role: positive(self.signature_role).unwrap_or(9.0),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Logo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub id: String,
    /// Data URI, file path, or raw base64.
    #[serde(default, deserialize_with = "lenient_string")]
    pub image: String,
    #[serde(default)]
    pub position: Option<LogoPosition>,
}

/// Logo box in millimeters; every field independently optional.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LogoPosition {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub x: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub y: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub w: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub h: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TextPosition {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub x: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub y: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub width: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextPositions {
    #[serde(default)]
    pub title: TextPosition,
    #[serde(default)]
    pub body: TextPosition,
    #[serde(default)]
    pub footer: TextPosition,
    /// The recipient name line is only drawn when this is configured.
    #[serde(default)]
    pub name: Option<TextPosition>,
}

/// A resolved text block: `x` is the left edge for the body and the center
/// for centered blocks; `y` is the first baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
}

impl TextPosition {
    fn resolve(&self, default: TextBox) -> TextBox {
        TextBox {
            x: self.x.unwrap_or(default.x),
            y: self.y.unwrap_or(default.y),
            width: positive(self.width).unwrap_or(default.width),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextOptions {
    #[serde(default, deserialize_with = "lenient_bool")]
    pub body_justify: Option<bool>,
    /// Line advance as a multiple of the body font size.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub body_line_height: Option<f64>,
    /// Upper bound for stretched word spacing, as a multiple of a space.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub body_max_word_spacing: Option<f64>,
    /// First-line indent in millimeters.
    #[serde(default, deserialize_with = "lenient_f64")]
    pub body_indent: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyOptions {
    pub justify: bool,
    pub line_height: f64,
    pub max_word_spacing: f64,
    pub indent: f64,
}

impl TextOptions {
    pub fn resolve(&self) -> BodyOptions {
        BodyOptions {
            justify: self.body_justify.unwrap_or(true),
            line_height: positive(self.body_line_height).unwrap_or(1.5),
            max_word_spacing: positive(self.body_max_word_spacing).unwrap_or(3.0),
            indent: self.body_indent.filter(|v| *v >= 0.0).unwrap_or(0.0),
        }
    }
}

/// Where a signature block takes its name from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureSource {
    Coordinator,
    Instructor,
    Custom,
    None,
}

impl SignatureSource {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "coordinator" => Some(Self::Coordinator),
            "instructor" => Some(Self::Instructor),
            "custom" => Some(Self::Custom),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignatureConfig {
    /// Unknown sources are treated as absent, leaving the role default.
    #[serde(default, deserialize_with = "lenient_source")]
    pub source: Option<SignatureSource>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignaturePosition {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub x: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub y: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub line_width: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignaturePositions {
    #[serde(default)]
    pub signature1: SignaturePosition,
    #[serde(default)]
    pub signature2: SignaturePosition,
}

/// A resolved signature anchor: center of the rule and its length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignatureAnchor {
    pub x: f64,
    pub y: f64,
    pub line_width: f64,
}

impl Template {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CertError::parse("template", e))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| CertError::io(path.display().to_string(), e))?;
        Self::from_json(&json)
    }

    /// First header baseline.
    pub fn header_top(&self) -> f64 {
        30.0
    }

    pub fn title_box(&self, page: (f64, f64)) -> TextBox {
        self.text_positions.title.resolve(TextBox {
            x: page.0 / 2.0,
            y: 62.0,
            width: page.0 - 2.0 * TEXT_MARGIN,
        })
    }

    pub fn body_box(&self, page: (f64, f64)) -> TextBox {
        self.text_positions.body.resolve(TextBox {
            x: TEXT_MARGIN,
            y: 80.0,
            width: page.0 - 2.0 * TEXT_MARGIN,
        })
    }

    pub fn footer_box(&self, page: (f64, f64)) -> TextBox {
        self.text_positions.footer.resolve(TextBox {
            x: page.0 / 2.0,
            y: 150.0,
            width: page.0 - 2.0 * TEXT_MARGIN,
        })
    }

    /// The name line, when the template places one.
    pub fn name_box(&self, page: (f64, f64)) -> Option<TextBox> {
        let pos = self.text_positions.name?;
        let default_y = self.title_box(page).y + 10.0;
        Some(pos.resolve(TextBox {
            x: page.0 / 2.0,
            y: default_y,
            width: page.0 - 2.0 * TEXT_MARGIN,
        }))
    }

    /// Box for the logo at `index`; explicit fields win over the slot default.
    pub fn logo_rect(&self, index: usize, page: (f64, f64)) -> Rect {
        let (page_w, page_h) = page;
        let left = LOGO_MARGIN;
        let right = page_w - LOGO_MARGIN - LOGO_WIDTH;
        let top = LOGO_MARGIN;
        let bottom = page_h - LOGO_MARGIN - LOGO_HEIGHT;
        let (x, y) = match index % 4 {
            0 => (left, top),
            1 => (right, top),
            2 => (left, bottom),
            _ => (right, bottom),
        };

        let pos = self
            .logos
            .get(index)
            .and_then(|logo| logo.position)
            .unwrap_or_default();
        Rect {
            x: pos.x.unwrap_or(x),
            y: pos.y.unwrap_or(y),
            w: positive(pos.w).unwrap_or(LOGO_WIDTH),
            h: positive(pos.h).unwrap_or(LOGO_HEIGHT),
        }
    }

    /// Anchor for signature block `slot` (0 or 1).
    pub fn signature_anchor(&self, slot: usize, page: (f64, f64)) -> SignatureAnchor {
        let (pos, default_x) = if slot == 0 {
            (self.signature_positions.signature1, page.0 / 2.0 - 60.0)
        } else {
            (self.signature_positions.signature2, page.0 / 2.0 + 60.0)
        };
        SignatureAnchor {
            x: pos.x.unwrap_or(default_x),
            y: pos.y.unwrap_or(178.0),
            line_width: positive(pos.line_width).unwrap_or(70.0),
        }
    }

    pub fn signature(&self, slot: usize) -> &SignatureConfig {
        if slot == 0 {
            &self.signature1
        } else {
            &self.signature2
        }
    }

    /// Decode every logo once. Logos that fail to load are logged and left
    /// out; the others keep their slot index.
    pub fn prepare(self) -> PreparedTemplate {
        let logos = self
            .logos
            .iter()
            .enumerate()
            .filter(|(_, logo)| !logo.image.trim().is_empty())
            .filter_map(|(index, logo)| match load_image(&logo.image) {
                Ok(image) => Some(PreparedLogo {
                    index,
                    image: Arc::new(image),
                }),
                Err(e) => {
                    log::warn!("Skipping logo '{}': {}", logo.id, e);
                    None
                }
            })
            .collect();
        PreparedTemplate {
            template: self,
            logos,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PreparedLogo {
    /// Position in `Template::logos`, which picks the default slot.
    pub index: usize,
    pub image: Arc<LoadedImage>,
}

/// A template with its logos decoded, shared by every certificate in a batch.
#[derive(Debug, Clone)]
pub struct PreparedTemplate {
    pub template: Template,
    pub logos: Vec<PreparedLogo>,
}

/// Starter template printed by `certforme --example-template`.
pub const EXAMPLE_TEMPLATE: &str = r#"{
  "fonts": { "family": "Times", "title": 28, "body": 14 },
  "entityName": "Centro de Treinamento",
  "headerLines": ["{{entidade}}"],
  "title": "CERTIFICADO DE {{tipo_certificado}}",
  "bodyFormat": "block",
  "body": "<p>Certificamos que <strong>{{nome}}</strong>, RG {{rg}}, participou como {{funcao}} do treinamento <strong>{{treinamento}}</strong>, realizado {{periodo_treinamento}}, com carga horária de {{carga_horaria}} horas.</p><p>{{nota_texto}}</p>",
  "footer": "Emitido em {{data}}",
  "textOptions": { "bodyJustify": true, "bodyLineHeight": 1.5, "bodyIndent": 10 },
  "signature1": { "source": "coordinator" },
  "signature2": { "source": "instructor" }
}"#;

/// Accept a decimal with either `.` or `,` as separator.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// A JSON number or numeric string; anything else is `None`.
pub fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(number_from_value(&value))
}

pub(crate) fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        _ => None,
    })
}

/// Strings as-is, numbers printed, everything else empty.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}

pub(crate) fn lenient_opt_string<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_source<'de, D>(deserializer: D) -> std::result::Result<Option<SignatureSource>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => SignatureSource::from_name(&s),
        _ => None,
    })
}
