//! # PDF Serializer
//!
//! Writes a composed [`Page`] as a single-page PDF 1.7 file.
//!
//! The subset needed for certificates is small: Type1 standard fonts with
//! WinAnsiEncoding, stroked rules, and image XObjects (JPEG passthrough or
//! Flate-compressed RGB with an optional soft mask).
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, images, content, page
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! Pages are laid out in millimeters with y growing downward; PDF user space
//! is points with y growing upward, so every coordinate is scaled and flipped
//! here.

use std::collections::HashMap;
use std::fmt::Write as FmtWrite;
use std::io::Write as IoWrite;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::canvas::{DrawOp, Page};
use crate::error::{CertError, Result};
use crate::font::{FontContext, FontKey};
use crate::image_loader::{ImagePixelData, JpegColorSpace, LoadedImage};

const MM_TO_PT: f64 = 72.0 / 25.4;

/// Document information dictionary entries.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
}

pub struct PdfWriter {
    fonts: FontContext,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

struct PdfObject {
    data: Vec<u8>,
}

/// Tracks allocated PDF objects during writing. Object 0 is the free-list
/// head and never written.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    /// Fonts in resource order: `/F0`, `/F1`, ...
    font_objects: Vec<(FontKey, usize)>,
    /// Image XObject ids in paint order: `/Im0`, `/Im1`, ...
    image_objects: Vec<usize>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }

    fn push_stream(&mut self, dict_entries: &str, payload: &[u8]) -> usize {
        let mut data: Vec<u8> = Vec::new();
        let _ = write!(
            data,
            "<< {} /Length {} >>\nstream\n",
            dict_entries,
            payload.len()
        );
        data.extend_from_slice(payload);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }

    fn font_index(&self, key: FontKey) -> usize {
        self.font_objects
            .iter()
            .position(|(k, _)| *k == key)
            .unwrap_or(0)
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self {
            fonts: FontContext::new(),
        }
    }

    /// Serialize one page to PDF bytes.
    pub fn write(&self, page: &Page, metadata: &Metadata) -> Result<Vec<u8>> {
        if !(page.width.is_finite() && page.height.is_finite())
            || page.width <= 0.0
            || page.height <= 0.0
        {
            return Err(CertError::RenderError(format!(
                "Invalid page size {}x{} mm",
                page.width, page.height
            )));
        }

        let mut builder = PdfBuilder {
            objects: Vec::new(),
            font_objects: Vec::new(),
            image_objects: Vec::new(),
        };

        // 0 = free entry, 1 = Catalog, 2 = Pages; filled in below.
        builder.objects.push(PdfObject { data: vec![] });
        builder.objects.push(PdfObject { data: vec![] });
        builder.objects.push(PdfObject { data: vec![] });

        self.register_fonts(&mut builder, page);
        self.register_images(&mut builder, page);

        let content = self.build_content_stream(page, &builder);
        let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
        let content_obj_id = builder.push_stream("/Filter /FlateDecode", &compressed);

        let width_pt = page.width * MM_TO_PT;
        let height_pt = page.height * MM_TO_PT;
        let mut resources = format!("/Font << {} >>", self.build_font_resource_dict(&builder));
        if !builder.image_objects.is_empty() {
            let _ = write!(
                resources,
                " /XObject << {} >>",
                self.build_xobject_resource_dict(&builder)
            );
        }
        let page_obj_id = builder.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                width_pt, height_pt, content_obj_id, resources
            )
            .into_bytes(),
        );

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();
        builder.objects[2].data =
            format!("<< /Type /Pages /Kids [{} 0 R] /Count 1 >>", page_obj_id).into_bytes();

        let info_obj_id = self.write_info(&mut builder, metadata);
        Ok(self.serialize(&builder, info_obj_id))
    }

    fn write_info(&self, builder: &mut PdfBuilder, metadata: &Metadata) -> Option<usize> {
        if metadata.title.is_none() && metadata.author.is_none() && metadata.subject.is_none() {
            return None;
        }
        let mut info = String::from("<< ");
        let entries = [
            ("Title", &metadata.title),
            ("Author", &metadata.author),
            ("Subject", &metadata.subject),
        ];
        for (name, value) in entries {
            if let Some(value) = value {
                let _ = write!(info, "/{} ({}) ", name, Self::encode_text(value));
            }
        }
        info.push_str("/Producer (certforme) >>");
        Some(builder.push(info.into_bytes()))
    }

    /// Each distinct (family, bold, italic) gets its own Type1 font object.
    fn register_fonts(&self, builder: &mut PdfBuilder, page: &Page) {
        let mut keys: Vec<FontKey> = Vec::new();
        for op in &page.ops {
            if let DrawOp::Text { font, .. } = op {
                if !keys.contains(font) {
                    keys.push(*font);
                }
            }
        }

        if keys.is_empty() {
            keys.push(FontKey {
                family: Default::default(),
                bold: false,
                italic: false,
            });
        }

        for key in keys {
            let font = self.fonts.resolve(key);
            let obj_id = builder.push(
                format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    font.pdf_name()
                )
                .into_bytes(),
            );
            builder.font_objects.push((key, obj_id));
        }
    }

    /// One XObject per image op, in paint order. Logos shared through the
    /// same `Arc` are written once.
    fn register_images(&self, builder: &mut PdfBuilder, page: &Page) {
        let mut written: HashMap<*const LoadedImage, usize> = HashMap::new();
        for op in &page.ops {
            if let DrawOp::Image { image, .. } = op {
                let ptr = std::sync::Arc::as_ptr(image);
                let obj_id = match written.get(&ptr) {
                    Some(&id) => id,
                    None => {
                        let id = Self::write_image_xobject(builder, image);
                        written.insert(ptr, id);
                        id
                    }
                };
                builder.image_objects.push(obj_id);
            }
        }
    }

    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let color_space = match color_space {
                    JpegColorSpace::DeviceRGB => "/DeviceRGB",
                    JpegColorSpace::DeviceGray => "/DeviceGray",
                };
                builder.push_stream(
                    &format!(
                        "/Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace {} /BitsPerComponent 8 /Filter /DCTDecode",
                        image.width_px, image.height_px, color_space
                    ),
                    data,
                )
            }
            ImagePixelData::Decoded { rgb, alpha } => {
                let smask_ref = alpha
                    .as_ref()
                    .map(|alpha_data| {
                        let compressed = compress_to_vec_zlib(alpha_data, 6);
                        let id = builder.push_stream(
                            &format!(
                                "/Type /XObject /Subtype /Image /Width {} /Height {} \
                                 /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode",
                                image.width_px, image.height_px
                            ),
                            &compressed,
                        );
                        format!(" /SMask {} 0 R", id)
                    })
                    .unwrap_or_default();

                let compressed = compress_to_vec_zlib(rgb, 6);
                builder.push_stream(
                    &format!(
                        "/Type /XObject /Subtype /Image /Width {} /Height {} \
                         /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode{}",
                        image.width_px, image.height_px, smask_ref
                    ),
                    &compressed,
                )
            }
        }
    }

    fn build_content_stream(&self, page: &Page, builder: &PdfBuilder) -> String {
        let mut stream = String::new();
        let page_height = page.height;
        let mut image_counter = 0usize;

        for op in &page.ops {
            match op {
                DrawOp::Text {
                    text,
                    x,
                    y,
                    font,
                    size,
                } => {
                    let _ = write!(
                        stream,
                        "BT\n0 0 0 rg\n/F{} {:.1} Tf\n{:.2} {:.2} Td\n({}) Tj\nET\n",
                        builder.font_index(*font),
                        size,
                        x * MM_TO_PT,
                        (page_height - y) * MM_TO_PT,
                        Self::encode_text(text)
                    );
                }
                DrawOp::Line {
                    x1,
                    y1,
                    x2,
                    y2,
                    width,
                } => {
                    let _ = write!(
                        stream,
                        "q\n0 0 0 RG\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
                        width * MM_TO_PT,
                        x1 * MM_TO_PT,
                        (page_height - y1) * MM_TO_PT,
                        x2 * MM_TO_PT,
                        (page_height - y2) * MM_TO_PT
                    );
                }
                DrawOp::Rect { x, y, w, h, width } => {
                    let _ = write!(
                        stream,
                        "q\n0 0 0 RG\n{:.2} w\n{:.2} {:.2} {:.2} {:.2} re\nS\nQ\n",
                        width * MM_TO_PT,
                        x * MM_TO_PT,
                        (page_height - y - h) * MM_TO_PT,
                        w * MM_TO_PT,
                        h * MM_TO_PT
                    );
                }
                DrawOp::Image { x, y, w, h, .. } => {
                    let _ = write!(
                        stream,
                        "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                        w * MM_TO_PT,
                        h * MM_TO_PT,
                        x * MM_TO_PT,
                        (page_height - y - h) * MM_TO_PT,
                        image_counter
                    );
                    image_counter += 1;
                }
            }
        }

        stream
    }

    fn build_font_resource_dict(&self, builder: &PdfBuilder) -> String {
        builder
            .font_objects
            .iter()
            .enumerate()
            .map(|(i, (_, obj_id))| format!("/F{} {} 0 R", i, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build_xobject_resource_dict(&self, builder: &PdfBuilder) -> String {
        builder
            .image_objects
            .iter()
            .enumerate()
            .map(|(i, obj_id)| format!("/Im{} {} 0 R", i, obj_id))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Encode text as the body of a PDF literal string in WinAnsiEncoding.
    /// Unmappable characters become `?`.
    fn encode_text(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            let b = Self::unicode_to_winansi(ch).unwrap_or(b'?');
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Map a Unicode codepoint to a WinAnsiEncoding (Windows-1252) byte.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        match cp {
            0x20AC => Some(0x80), // Euro sign
            0x201A => Some(0x82),
            0x0192 => Some(0x83),
            0x201E => Some(0x84),
            0x2026 => Some(0x85), // Ellipsis
            0x2020 => Some(0x86),
            0x2021 => Some(0x87),
            0x02C6 => Some(0x88),
            0x2030 => Some(0x89),
            0x0160 => Some(0x8A),
            0x2039 => Some(0x8B),
            0x0152 => Some(0x8C),
            0x017D => Some(0x8E),
            0x2018 => Some(0x91), // Left single quotation mark
            0x2019 => Some(0x92), // Right single quotation mark
            0x201C => Some(0x93), // Left double quotation mark
            0x201D => Some(0x94), // Right double quotation mark
            0x2022 => Some(0x95), // Bullet
            0x2013 => Some(0x96), // En dash
            0x2014 => Some(0x97), // Em dash
            0x02DC => Some(0x98),
            0x2122 => Some(0x99),
            0x0161 => Some(0x9A),
            0x203A => Some(0x9B),
            0x0153 => Some(0x9C),
            0x017E => Some(0x9E),
            0x0178 => Some(0x9F),
            _ => None,
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: Option<usize>) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(output, "trailer\n<< /Size {} /Root 1 0 R", builder.objects.len());
        if let Some(info_id) = info_obj_id {
            let _ = write!(output, " /Info {} 0 R", info_id);
        }
        let _ = write!(output, " >>\nstartxref\n{}\n%%EOF\n", xref_offset);

        output
    }
}
