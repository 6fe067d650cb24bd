//! # Drawing Surface
//!
//! The composer paints through the [`Canvas`] trait: text, rules, rectangles
//! and images, all positioned in millimeters from the top-left corner of the
//! page. Font family, size and emphasis travel with every call in a
//! [`DrawContext`] value instead of living as hidden canvas state.
//!
//! [`PageCanvas`] is the implementation used for PDF output. It records draw
//! operations into a [`Page`], measuring text with the standard font metrics.

use std::sync::Arc;

use crate::font::{FontContext, FontFamily, FontKey};
use crate::image_loader::LoadedImage;
use crate::text::{RunStyle, TextMeasure};

/// Points to millimeters.
pub const PT_TO_MM: f64 = 25.4 / 72.0;

/// A4 landscape, in millimeters.
pub const A4_LANDSCAPE: (f64, f64) = (297.0, 210.0);

/// Font selection for one draw or measure call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawContext {
    pub family: FontFamily,
    /// Font size in points.
    pub size: f64,
    pub style: RunStyle,
}

impl DrawContext {
    pub fn new(family: FontFamily, size: f64) -> Self {
        Self {
            family,
            size,
            style: RunStyle::PLAIN,
        }
    }

    pub fn with_style(self, style: RunStyle) -> Self {
        Self { style, ..self }
    }

    pub fn bold(self) -> Self {
        self.with_style(RunStyle::BOLD)
    }

    pub fn font_key(&self) -> FontKey {
        FontKey {
            family: self.family,
            bold: self.style.bold,
            italic: self.style.italic,
        }
    }

    /// Font size in millimeters.
    pub fn size_mm(&self) -> f64 {
        self.size * PT_TO_MM
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// The drawing backend the composer paints onto.
pub trait Canvas {
    /// Page width and height in millimeters.
    fn page_size(&self) -> (f64, f64);

    /// Width of `text` in millimeters.
    fn text_width(&self, ctx: &DrawContext, text: &str) -> f64;

    /// Baseline-to-baseline distance for single-spaced text.
    fn line_height(&self, ctx: &DrawContext) -> f64 {
        ctx.size_mm() * 1.15
    }

    /// Draw `text` with its baseline at `y`; `x` is interpreted per `align`.
    fn text(&mut self, ctx: &DrawContext, text: &str, x: f64, y: f64, align: Align);

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, width: f64);

    /// Stroke (not fill) a rectangle.
    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, width: f64);

    fn image(&mut self, image: &Arc<LoadedImage>, x: f64, y: f64, w: f64, h: f64);
}

/// Measures words in one family and size, with per-word emphasis.
pub struct CanvasMeasure<'a, C: Canvas + ?Sized> {
    pub canvas: &'a C,
    pub ctx: DrawContext,
}

impl<C: Canvas + ?Sized> TextMeasure for CanvasMeasure<'_, C> {
    fn measure(&self, word: &str, style: RunStyle) -> f64 {
        self.canvas.text_width(&self.ctx.with_style(style), word)
    }
}

/// A recorded drawing operation. Coordinates are millimeters, y grows down.
#[derive(Debug, Clone)]
pub enum DrawOp {
    Text {
        text: String,
        x: f64,
        y: f64,
        font: FontKey,
        size: f64,
    },
    Line {
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        width: f64,
    },
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        width: f64,
    },
    Image {
        image: Arc<LoadedImage>,
        x: f64,
        y: f64,
        w: f64,
        h: f64,
    },
}

/// A finished single page, ready for serialization.
#[derive(Debug, Clone)]
pub struct Page {
    pub width: f64,
    pub height: f64,
    pub ops: Vec<DrawOp>,
}

impl Page {
    /// Every text run on the page, in paint order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Records draw operations for one page.
pub struct PageCanvas {
    fonts: FontContext,
    page: Page,
}

impl Default for PageCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl PageCanvas {
    /// An empty A4 landscape page.
    pub fn new() -> Self {
        Self::with_size(A4_LANDSCAPE.0, A4_LANDSCAPE.1)
    }

    pub fn with_size(width: f64, height: f64) -> Self {
        Self {
            fonts: FontContext::new(),
            page: Page {
                width,
                height,
                ops: Vec::new(),
            },
        }
    }

    pub fn finish(self) -> Page {
        self.page
    }
}

impl Canvas for PageCanvas {
    fn page_size(&self) -> (f64, f64) {
        (self.page.width, self.page.height)
    }

    fn text_width(&self, ctx: &DrawContext, text: &str) -> f64 {
        self.fonts.measure_string(text, ctx.font_key(), ctx.size) * PT_TO_MM
    }

    fn text(&mut self, ctx: &DrawContext, text: &str, x: f64, y: f64, align: Align) {
        if text.is_empty() {
            return;
        }
        let x = match align {
            Align::Left => x,
            Align::Center => x - self.text_width(ctx, text) / 2.0,
        };
        self.page.ops.push(DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            font: ctx.font_key(),
            size: ctx.size,
        });
    }

    fn line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, width: f64) {
        self.page.ops.push(DrawOp::Line {
            x1,
            y1,
            x2,
            y2,
            width,
        });
    }

    fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, width: f64) {
        self.page.ops.push(DrawOp::Rect { x, y, w, h, width });
    }

    fn image(&mut self, image: &Arc<LoadedImage>, x: f64, y: f64, w: f64, h: f64) {
        self.page.ops.push(DrawOp::Image {
            image: Arc::clone(image),
            x,
            y,
            w,
            h,
        });
    }
}
