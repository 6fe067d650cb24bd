//! # Page Painting
//!
//! Draws a resolved certificate onto a [`Canvas`]: border rules, logos,
//! header lines, title, optional name line, the justified body, footer and
//! signature blocks. Every string arrives already interpolated; this module
//! only decides where things go.

use crate::canvas::{Align, Canvas, CanvasMeasure, DrawContext};
use crate::template::{PreparedTemplate, Template};
use crate::text::justify::{place_lines, JustifyParams};
use crate::text::markup::{tokenize, BodyFormat, Markup};
use crate::text::{break_lines, LayoutParams, RunStyle, Token};

const OUTER_BORDER: f64 = 10.0;
const INNER_BORDER: f64 = 15.0;
const RULE_WIDTH: f64 = 0.2;
/// Underline distance below the baseline, as a fraction of the font size.
const UNDERLINE_OFFSET: f64 = 0.15;
/// Signature name and role baselines below the signature rule.
const SIGNATURE_NAME_GAP: f64 = 5.0;
const SIGNATURE_ROLE_GAP: f64 = 4.5;

/// A signature block with its name resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub name: String,
    pub role: String,
}

/// Everything recipient-specific on a certificate, ready to paint.
#[derive(Debug, Clone, Default)]
pub struct ResolvedDocument {
    pub header_lines: Vec<String>,
    pub title: String,
    pub name: String,
    pub body: String,
    /// Dialect of `body`, settled before placeholders were filled in.
    /// The template's declared format applies when absent.
    pub body_format: Option<BodyFormat>,
    pub footer: String,
    pub signatures: [Option<Signature>; 2],
}

/// Paint one certificate. Returns the number of body lines laid out.
pub fn render_page(
    prepared: &PreparedTemplate,
    doc: &ResolvedDocument,
    canvas: &mut dyn Canvas,
) -> usize {
    let template = &prepared.template;
    draw_borders(canvas);
    draw_logos(prepared, canvas);
    draw_header(template, &doc.header_lines, canvas);
    draw_title(template, &doc.title, canvas);
    draw_name(template, &doc.name, canvas);
    let format = doc.body_format.or(template.body_format);
    let body_lines = draw_body(template, &doc.body, format, canvas);
    draw_footer(template, &doc.footer, canvas);
    draw_signatures(template, &doc.signatures, canvas);
    body_lines
}

fn draw_borders(canvas: &mut dyn Canvas) {
    let (w, h) = canvas.page_size();
    canvas.rect(
        OUTER_BORDER,
        OUTER_BORDER,
        w - 2.0 * OUTER_BORDER,
        h - 2.0 * OUTER_BORDER,
        0.6,
    );
    canvas.rect(
        INNER_BORDER,
        INNER_BORDER,
        w - 2.0 * INNER_BORDER,
        h - 2.0 * INNER_BORDER,
        RULE_WIDTH,
    );
}

fn draw_logos(prepared: &PreparedTemplate, canvas: &mut dyn Canvas) {
    let page = canvas.page_size();
    for logo in &prepared.logos {
        let rect = prepared.template.logo_rect(logo.index, page);
        canvas.image(&logo.image, rect.x, rect.y, rect.w, rect.h);
    }
}

fn draw_header(template: &Template, lines: &[String], canvas: &mut dyn Canvas) {
    let (page_w, _) = canvas.page_size();
    let ctx = DrawContext::new(template.fonts.family(), template.fonts.sizes().header);
    let advance = canvas.line_height(&ctx);
    let mut y = template.header_top();
    for line in lines.iter().filter(|l| !l.trim().is_empty()) {
        canvas.text(&ctx, line.trim(), page_w / 2.0, y, Align::Center);
        y += advance;
    }
}

fn draw_title(template: &Template, title: &str, canvas: &mut dyn Canvas) {
    let page = canvas.page_size();
    let ctx = DrawContext::new(template.fonts.family(), template.fonts.sizes().title).bold();
    let bx = template.title_box(page);
    draw_centered(canvas, &ctx, title, bx.x, bx.y, bx.width);
}

fn draw_name(template: &Template, name: &str, canvas: &mut dyn Canvas) {
    let page = canvas.page_size();
    let Some(bx) = template.name_box(page) else {
        return;
    };
    let ctx = DrawContext::new(template.fonts.family(), template.fonts.sizes().name).bold();
    draw_centered(canvas, &ctx, name, bx.x, bx.y, bx.width);
}

fn draw_footer(template: &Template, footer: &str, canvas: &mut dyn Canvas) {
    if footer.trim().is_empty() {
        return;
    }
    let page = canvas.page_size();
    let ctx = DrawContext::new(template.fonts.family(), template.fonts.sizes().footer);
    let bx = template.footer_box(page);
    draw_centered(canvas, &ctx, footer, bx.x, bx.y, bx.width);
}

/// Wrap `text` to `width` and center each line on `center_x`.
fn draw_centered(
    canvas: &mut dyn Canvas,
    ctx: &DrawContext,
    text: &str,
    center_x: f64,
    top: f64,
    width: f64,
) {
    let lines = wrap_plain(&*canvas, ctx, text, width);
    let advance = canvas.line_height(ctx);
    let mut y = top;
    for line in lines {
        canvas.text(ctx, &line, center_x, y, Align::Center);
        y += advance;
    }
}

/// Greedy wrap without markup; `\n` still forces a break.
pub fn wrap_plain(canvas: &dyn Canvas, ctx: &DrawContext, text: &str, width: f64) -> Vec<String> {
    let mut tokens = Vec::new();
    for (i, part) in text.split('\n').enumerate() {
        if i > 0 {
            tokens.push(Token::Newline);
        }
        tokens.push(Token::text(part.trim_end_matches('\r'), ctx.style));
    }
    let measure = CanvasMeasure { canvas, ctx: *ctx };
    let params = LayoutParams {
        max_width: width,
        space_width: canvas.text_width(ctx, " "),
        first_line_indent: 0.0,
    };
    break_lines(&tokens, params, &measure)
        .iter()
        .map(|line| line.text())
        .collect()
}

fn draw_body(
    template: &Template,
    body: &str,
    format: Option<BodyFormat>,
    canvas: &mut dyn Canvas,
) -> usize {
    let tokens = tokenize(Markup::with_format(body, format));
    if tokens.is_empty() {
        return 0;
    }

    let page = canvas.page_size();
    let bx = template.body_box(page);
    let options = template.text_options.resolve();
    let ctx = DrawContext::new(template.fonts.family(), template.fonts.sizes().body);
    let space_width = canvas.text_width(&ctx, " ");

    let lines = {
        let measure = CanvasMeasure {
            canvas: &*canvas,
            ctx,
        };
        let params = LayoutParams {
            max_width: bx.width,
            space_width,
            first_line_indent: options.indent,
        };
        break_lines(&tokens, params, &measure)
    };
    let placed = {
        let measure = CanvasMeasure {
            canvas: &*canvas,
            ctx,
        };
        let params = JustifyParams {
            max_width: bx.width,
            space_width,
            justify: options.justify,
            max_word_spacing: options.max_word_spacing,
        };
        place_lines(&lines, params, &measure)
    };

    let advance = ctx.size_mm() * options.line_height;
    let underline_gap = UNDERLINE_OFFSET * ctx.size_mm();
    let mut y = bx.y;
    for line in &placed {
        for placed_word in &line.words {
            let word = placed_word.word;
            let x = bx.x + placed_word.x;
            canvas.text(&ctx.with_style(word.style), &word.text, x, y, Align::Left);
            if word.style.underline {
                let uy = y + underline_gap;
                canvas.line(x, uy, x + placed_word.width, uy, RULE_WIDTH);
            }
        }
        y += advance;
    }

    log::debug!(
        "Body laid out in {} lines ({} tokens, width {:.1} mm)",
        lines.len(),
        tokens.len(),
        bx.width
    );
    lines.len()
}

fn draw_signatures(template: &Template, signatures: &[Option<Signature>; 2], canvas: &mut dyn Canvas) {
    let page = canvas.page_size();
    let family = template.fonts.family();
    let sizes = template.fonts.sizes();
    let name_ctx = DrawContext::new(family, sizes.signature);
    let role_ctx = DrawContext::new(family, sizes.signature_role).with_style(RunStyle::PLAIN);

    for (slot, signature) in signatures.iter().enumerate() {
        let Some(signature) = signature else {
            continue;
        };
        if signature.name.trim().is_empty() {
            continue;
        }
        let anchor = template.signature_anchor(slot, page);
        let half = anchor.line_width / 2.0;
        canvas.line(anchor.x - half, anchor.y, anchor.x + half, anchor.y, RULE_WIDTH);

        let name_y = anchor.y + SIGNATURE_NAME_GAP;
        canvas.text(&name_ctx, signature.name.trim(), anchor.x, name_y, Align::Center);
        if !signature.role.trim().is_empty() {
            canvas.text(
                &role_ctx,
                signature.role.trim(),
                anchor.x,
                name_y + SIGNATURE_ROLE_GAP,
                Align::Center,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DrawOp, PageCanvas};
    use crate::font::FontFamily;

    fn prepared(json: &str) -> PreparedTemplate {
        Template::from_json(json).unwrap().prepare()
    }

    fn doc(body: &str) -> ResolvedDocument {
        ResolvedDocument {
            title: "CERTIFICADO".to_string(),
            body: body.to_string(),
            ..ResolvedDocument::default()
        }
    }

    #[test]
    fn test_borders_drawn_first() {
        let mut canvas = PageCanvas::new();
        render_page(&prepared("{}"), &doc(""), &mut canvas);
        let page = canvas.finish();
        match (&page.ops[0], &page.ops[1]) {
            (DrawOp::Rect { x: outer, .. }, DrawOp::Rect { x: inner, w, .. }) => {
                assert_eq!(*outer, 10.0);
                assert_eq!(*inner, 15.0);
                assert_eq!(*w, 267.0);
            }
            other => panic!("expected border rects, got {:?}", other),
        }
    }

    #[test]
    fn test_body_words_in_order() {
        let mut canvas = PageCanvas::new();
        let lines = render_page(
            &prepared("{}"),
            &doc("Certifico que **Ana** concluiu o curso."),
            &mut canvas,
        );
        assert_eq!(lines, 1);
        let page = canvas.finish();
        let texts: Vec<&str> = page.texts().collect();
        assert_eq!(
            texts,
            vec!["CERTIFICADO", "Certifico", "que", "Ana", "concluiu", "o", "curso."]
        );
    }

    #[test]
    fn test_bold_body_run_uses_bold_font() {
        let mut canvas = PageCanvas::new();
        render_page(&prepared("{}"), &doc("Olá **Ana**"), &mut canvas);
        let page = canvas.finish();
        let bold = page.ops.iter().any(|op| {
            matches!(op, DrawOp::Text { text, font, .. } if text == "Ana" && font.bold)
        });
        assert!(bold);
    }

    #[test]
    fn test_underline_draws_rule() {
        let mut canvas = PageCanvas::new();
        render_page(&prepared("{}"), &doc("<p><u>sublinhado</u></p>"), &mut canvas);
        let page = canvas.finish();
        let rules = page
            .ops
            .iter()
            .filter(|op| matches!(op, DrawOp::Line { width, .. } if *width == RULE_WIDTH))
            .count();
        assert_eq!(rules, 1);
    }

    #[test]
    fn test_line_advance_uses_body_line_height() {
        let mut canvas = PageCanvas::new();
        let t = prepared(r#"{ "textOptions": { "bodyLineHeight": 2 }, "fonts": { "body": 12 } }"#);
        render_page(&t, &doc("A\nB"), &mut canvas);
        let page = canvas.finish();
        let ys: Vec<f64> = page
            .ops
            .iter()
            .filter_map(|op| match op {
                DrawOp::Text { text, y, .. } if text == "A" || text == "B" => Some(*y),
                _ => None,
            })
            .collect();
        assert_eq!(ys.len(), 2);
        assert!((ys[1] - ys[0] - 12.0 * crate::canvas::PT_TO_MM * 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_signatures_skip_empty_names() {
        let mut canvas = PageCanvas::new();
        let mut d = doc("");
        d.signatures = [
            Some(Signature {
                name: "Maria Souza".to_string(),
                role: "Coordenador(a)".to_string(),
            }),
            Some(Signature {
                name: "  ".to_string(),
                role: "Instrutor(a)".to_string(),
            }),
        ];
        render_page(&prepared("{}"), &d, &mut canvas);
        let page = canvas.finish();
        let texts: Vec<&str> = page.texts().collect();
        assert!(texts.contains(&"Maria Souza"));
        assert!(texts.contains(&"Coordenador(a)"));
        assert!(!texts.contains(&"Instrutor(a)"));
    }

    #[test]
    fn test_name_line_only_when_positioned() {
        let mut d = doc("");
        d.name = "Ana Silva".to_string();

        let mut canvas = PageCanvas::new();
        render_page(&prepared("{}"), &d, &mut canvas);
        assert!(!canvas.finish().texts().any(|t| t == "Ana Silva"));

        let mut canvas = PageCanvas::new();
        render_page(
            &prepared(r#"{ "textPositions": { "name": { "y": 75 } } }"#),
            &d,
            &mut canvas,
        );
        assert!(canvas.finish().texts().any(|t| t == "Ana Silva"));
    }

    #[test]
    fn test_wrap_plain_centers_long_title() {
        let canvas = PageCanvas::new();
        let ctx = DrawContext::new(FontFamily::Helvetica, 26.0).bold();
        let lines = wrap_plain(
            &canvas,
            &ctx,
            "CERTIFICADO DE PARTICIPAÇÃO NO TREINAMENTO DE SEGURANÇA EM INSTALAÇÕES ELÉTRICAS",
            120.0,
        );
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(canvas.text_width(&ctx, line) <= 120.0 + 1e-9 || !line.contains(' '));
        }
    }
}
