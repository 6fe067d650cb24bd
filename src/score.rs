//! # Exam Score Resolution
//!
//! Participants carry an exam result as a kappa coefficient (0–1), a score
//! (0–100), both, or neither, and older records store them under several
//! field names and as strings. This module turns whatever is there into a
//! consistent pair plus printable labels.

/// Kappa and score candidates before clamping and derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreInput {
    pub kappa: Option<f64>,
    pub score: Option<f64>,
}

impl ScoreInput {
    /// Repair untyped legacy values that landed in the wrong field.
    ///
    /// A "kappa" above 1 (and at most 100) with no score is really a score;
    /// a "score" of at most 1 with no kappa is really a kappa. A legacy kappa
    /// of 1.05 therefore reads as a 1.05% score.
    pub fn from_legacy(kappa: Option<f64>, score: Option<f64>) -> Self {
        let mut kappa = kappa.filter(|v| v.is_finite());
        let mut score = score.filter(|v| v.is_finite());

        if let (Some(k), None) = (kappa, score) {
            if k > 1.0 && k <= 100.0 {
                score = Some(k);
                kappa = None;
            }
        }
        if let (None, Some(s)) = (kappa, score) {
            if s <= 1.0 {
                kappa = Some(s);
                score = None;
            }
        }

        Self { kappa, score }
    }
}

/// Resolved exam result with its printable forms. Labels are empty when no
/// value exists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreSummary {
    pub kappa: Option<f64>,
    pub score: Option<f64>,
    /// Three decimals with a dot: `0.850`.
    pub kappa_label: String,
    /// One decimal with a comma: `85,0`.
    pub score_label: String,
    pub score_text: String,
}

impl ScoreSummary {
    /// Clamp to range, derive the missing value, format.
    pub fn resolve(input: ScoreInput) -> Self {
        let kappa = input.kappa.filter(|v| v.is_finite()).map(|v| v.clamp(0.0, 1.0));
        let score = input.score.filter(|v| v.is_finite()).map(|v| v.clamp(0.0, 100.0));

        let (kappa, score) = match (kappa, score) {
            (Some(k), None) => (Some(k), Some(k * 100.0)),
            (None, Some(s)) => (Some(s / 100.0), Some(s)),
            other => other,
        };

        let kappa_label = kappa.map(|k| format!("{:.3}", k)).unwrap_or_default();
        let score_label = score
            .map(|s| format!("{:.1}", s).replace('.', ","))
            .unwrap_or_default();
        let score_text = if score_label.is_empty() {
            String::new()
        } else {
            format!("Nota final (Kappa x100): {}%", score_label)
        };

        Self {
            kappa,
            score,
            kappa_label,
            score_label,
            score_text,
        }
    }

    /// The score label with a percent sign, or empty.
    pub fn percent_label(&self) -> String {
        if self.score_label.is_empty() {
            String::new()
        } else {
            format!("{}%", self.score_label)
        }
    }
}
