//! # certforme
//!
//! A template-driven certificate composer.
//!
//! One template describes the page: fonts, logos, header lines, a title, a
//! rich-text body with `{{placeholder}}` tokens, a footer and two signature
//! blocks. For every recipient of a training (participant, monitor or guest
//! speaker) the composer fills the placeholders, lays out and justifies the
//! body, and paints everything onto a single A4 landscape page, which is then
//! written out as a PDF.
//!
//! ## Architecture
//!
//! ```text
//! Template JSON + training + recipient
//!       ↓
//!   [template]     — Typed, lenient configuration with layout defaults
//!   [placeholder]  — {{key}} substitution
//!   [score]        — Kappa / score resolution for participants
//!       ↓
//!   [compose]      — One composer, parameterized by a RoleResolver
//!       ↓
//!   [text]         — Markup → tokens → lines → justified words
//!   [render]       — Paints the certificate onto a Canvas
//!       ↓
//!   [canvas]       — Recorded page of draw operations (mm)
//!       ↓
//!   [pdf]          — Serialize to PDF bytes
//! ```

pub mod batch;
pub mod canvas;
pub mod compose;
pub mod error;
pub mod font;
pub mod image_loader;
pub mod model;
pub mod pdf;
pub mod placeholder;
pub mod render;
pub mod score;
pub mod template;
pub mod text;

pub use batch::{issue_batch, IssuedCertificate, Job};
pub use canvas::{Canvas, DrawContext, Page, PageCanvas};
pub use compose::{compose, compose_monitor, compose_participant, compose_speaker, ComposeOptions, RoleResolver};
pub use error::{CertError, Result};
pub use model::{Monitor, Participant, Recipient, RecipientKind, Speaker, Training};
pub use pdf::Metadata;
pub use template::{PreparedTemplate, Template};

/// Serialize a composed page to PDF bytes.
pub fn render_pdf(page: &Page, metadata: &Metadata) -> Result<Vec<u8>> {
    pdf::PdfWriter::new().write(page, metadata)
}
