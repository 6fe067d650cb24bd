//! # Batch Issuance
//!
//! Composes and serializes one PDF per recipient. Recipients are independent:
//! a failure is recorded against that recipient and the batch carries on.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::canvas::PageCanvas;
use crate::compose::{compose, ComposeOptions};
use crate::error::{CertError, Result};
use crate::font::metrics::fold_accent;
use crate::model::{Recipient, RecipientKind, Training};
use crate::pdf::{Metadata, PdfWriter};
use crate::template::PreparedTemplate;

/// A job file: one training and the people to certify.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub training: Training,
    #[serde(default)]
    pub recipients: Vec<Value>,
}

impl Job {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CertError::parse("job", e))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| CertError::io(path.display().to_string(), e))?;
        Self::from_json(&json)
    }

    /// Parse each recipient record on its own.
    pub fn recipients(&self, default_kind: RecipientKind) -> Vec<Result<Recipient>> {
        self.recipients
            .iter()
            .cloned()
            .map(|value| Recipient::from_value(value, default_kind))
            .collect()
    }
}

#[derive(Debug)]
pub struct IssuedCertificate {
    pub recipient: String,
    pub kind: RecipientKind,
    /// Unique within the batch.
    pub file_name: String,
    pub result: Result<Vec<u8>>,
}

/// Compose and serialize one certificate.
pub fn issue_one(
    prepared: &PreparedTemplate,
    training: &Training,
    recipient: &Recipient,
    options: &ComposeOptions,
) -> Result<Vec<u8>> {
    let mut canvas = PageCanvas::new();
    let values = compose(prepared, training, recipient, options, &mut canvas);
    let page = canvas.finish();

    let entity = prepared.template.entity_name.trim();
    let metadata = Metadata {
        title: Some(format!(
            "Certificado - {}",
            values.get("nome").map(String::as_str).unwrap_or_default()
        )),
        author: (!entity.is_empty()).then(|| entity.to_string()),
        subject: (!training.title.trim().is_empty()).then(|| training.title.trim().to_string()),
    };
    PdfWriter::new().write(&page, &metadata)
}

pub fn issue_batch(
    prepared: &PreparedTemplate,
    training: &Training,
    recipients: &[Recipient],
    options: &ComposeOptions,
) -> Vec<IssuedCertificate> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    recipients
        .iter()
        .map(|recipient| {
            let base = slug(recipient.name());
            let count = seen.entry(base.clone()).or_insert(0);
            *count += 1;
            let file_name = if *count == 1 {
                format!("certificado-{}.pdf", base)
            } else {
                format!("certificado-{}-{}.pdf", base, count)
            };

            let result = issue_one(prepared, training, recipient, options);
            if let Err(e) = &result {
                log::warn!("Certificate for '{}' failed: {}", recipient.name(), e);
            }
            IssuedCertificate {
                recipient: recipient.name().to_string(),
                kind: recipient.kind(),
                file_name,
                result,
            }
        })
        .collect()
}

/// ASCII-folded, lowercase, dash-separated.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars().map(fold_accent) {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() {
        "sem-nome".to_string()
    } else {
        out
    }
}
