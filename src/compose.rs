//! # Certificate Composition
//!
//! Turns a template, a training and one recipient into a painted page.
//! The three certificate kinds (participant, monitor, guest speaker) differ
//! only in a handful of placeholder values and in which signatures they get
//! by default; [`RoleResolver`] captures exactly that, and [`compose`] does
//! the rest once for all of them.

use chrono::NaiveDate;

use crate::canvas::Canvas;
use crate::model::{format_date, Monitor, Participant, Recipient, RecipientKind, Speaker, Training};
use crate::placeholder::{interpolate, interpolate_markup, Placeholders};
use crate::render::{render_page, ResolvedDocument, Signature};
use crate::template::{PreparedTemplate, SignatureConfig, SignatureSource, Template};
use crate::text::markup::{BodyFormat, Markup};

const COORDINATOR_ROLE: &str = "Coordenador(a)";
const INSTRUCTOR_ROLE: &str = "Instrutor(a)";

#[derive(Debug, Clone, Copy, Default)]
pub struct ComposeOptions {
    /// Printed as `data`; the last training date is used when absent.
    pub issued_on: Option<NaiveDate>,
}

/// What varies between certificate kinds.
pub trait RoleResolver {
    fn kind(&self) -> RecipientKind;

    /// Recipient-specific placeholder values. Shared training keys are added
    /// by the composer.
    fn placeholders(&self) -> Placeholders;

    /// Signature sources used when the template does not name one.
    fn signature_defaults(&self) -> [SignatureSource; 2];
}

fn person_placeholders(
    name: &str,
    rg: Option<&str>,
    email: Option<&str>,
    funcao: &str,
    tipo: &str,
    aula: Option<&str>,
) -> Placeholders {
    let mut values = Placeholders::new();
    let mut set = |key: &str, value: &str| {
        values.insert(key.to_string(), value.trim().to_string());
    };
    set("nome", name);
    set("rg", rg.unwrap_or_default());
    set("email", email.unwrap_or_default());
    set("funcao", funcao);
    set("tipo_certificado", tipo);
    set("aula", aula.unwrap_or_default());
    for key in ["nota", "nota_percentual", "kappa", "nota_texto"] {
        set(key, "");
    }
    values
}

impl RoleResolver for Participant {
    fn kind(&self) -> RecipientKind {
        RecipientKind::Participant
    }

    fn placeholders(&self) -> Placeholders {
        let funcao = self
            .role
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or("Participante");
        let mut values = person_placeholders(
            &self.name,
            self.rg.as_deref(),
            self.email.as_deref(),
            funcao,
            "Participação",
            None,
        );

        let summary = self.score_summary();
        values.insert("nota_percentual".to_string(), summary.percent_label());
        values.insert("nota".to_string(), summary.score_label);
        values.insert("kappa".to_string(), summary.kappa_label);
        values.insert("nota_texto".to_string(), summary.score_text);
        values
    }

    fn signature_defaults(&self) -> [SignatureSource; 2] {
        [SignatureSource::Coordinator, SignatureSource::Instructor]
    }
}

impl RoleResolver for Monitor {
    fn kind(&self) -> RecipientKind {
        RecipientKind::Monitor
    }

    fn placeholders(&self) -> Placeholders {
        person_placeholders(
            &self.name,
            self.rg.as_deref(),
            self.email.as_deref(),
            "Monitor(a)",
            "Monitoria",
            self.lecture.as_deref(),
        )
    }

    fn signature_defaults(&self) -> [SignatureSource; 2] {
        [SignatureSource::Coordinator, SignatureSource::Instructor]
    }
}

impl RoleResolver for Speaker {
    fn kind(&self) -> RecipientKind {
        RecipientKind::Speaker
    }

    fn placeholders(&self) -> Placeholders {
        person_placeholders(
            &self.name,
            self.rg.as_deref(),
            self.email.as_deref(),
            "Palestrante",
            "Palestrante",
            self.lecture.as_deref(),
        )
    }

    fn signature_defaults(&self) -> [SignatureSource; 2] {
        [SignatureSource::Coordinator, SignatureSource::None]
    }
}

impl RoleResolver for Recipient {
    fn kind(&self) -> RecipientKind {
        Recipient::kind(self)
    }

    fn placeholders(&self) -> Placeholders {
        match self {
            Recipient::Participant(p) => p.placeholders(),
            Recipient::Monitor(m) => m.placeholders(),
            Recipient::Speaker(s) => s.placeholders(),
        }
    }

    fn signature_defaults(&self) -> [SignatureSource; 2] {
        match self {
            Recipient::Participant(p) => p.signature_defaults(),
            Recipient::Monitor(m) => m.signature_defaults(),
            Recipient::Speaker(s) => s.signature_defaults(),
        }
    }
}

/// Keys every certificate kind shares.
fn training_placeholders(
    template: &Template,
    training: &Training,
    options: &ComposeOptions,
) -> Placeholders {
    let issued = options
        .issued_on
        .or_else(|| training.last_date())
        .map(format_date)
        .unwrap_or_default();

    [
        ("treinamento", training.title.trim().to_string()),
        ("carga_horaria", training.duration_label()),
        ("data", issued),
        ("entidade", template.entity_name.trim().to_string()),
        ("coordenador", training.coordinator.clone().unwrap_or_default()),
        ("instrutor", training.instructor.clone().unwrap_or_default()),
        ("periodo_treinamento", training.period()),
        ("dias_treinamento", training.all_dates()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// The template's source wins over the role default. `None` omits the block,
/// as does a source that resolves to an empty name.
fn resolve_signature(
    config: &SignatureConfig,
    default: SignatureSource,
    training: &Training,
) -> Option<Signature> {
    let (name, default_role) = match config.source.unwrap_or(default) {
        SignatureSource::Coordinator => (training.coordinator.clone(), COORDINATOR_ROLE),
        SignatureSource::Instructor => (training.instructor.clone(), INSTRUCTOR_ROLE),
        SignatureSource::Custom => (config.name.clone(), ""),
        SignatureSource::None => return None,
    };
    let name = name.map(|n| n.trim().to_string()).unwrap_or_default();
    if name.is_empty() {
        return None;
    }
    let role = config
        .role
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(default_role)
        .to_string();
    Some(Signature { name, role })
}

/// Compose one certificate onto `canvas`. Returns the placeholder values
/// used, which callers reuse for file names and document metadata.
pub fn compose<R: RoleResolver + ?Sized>(
    prepared: &PreparedTemplate,
    training: &Training,
    recipient: &R,
    options: &ComposeOptions,
    canvas: &mut dyn Canvas,
) -> Placeholders {
    let template = &prepared.template;
    let mut values = training_placeholders(template, training, options);
    values.extend(recipient.placeholders());

    let defaults = recipient.signature_defaults();
    // The dialect is read from the template, so values cannot change it.
    let body_format = Markup::with_format(&template.body, template.body_format).format();
    let body = match body_format {
        BodyFormat::Block => interpolate_markup(&template.body, &values),
        BodyFormat::Plain => interpolate(&template.body, &values),
    };
    let doc = ResolvedDocument {
        header_lines: template
            .header_lines
            .iter()
            .map(|line| interpolate(line, &values))
            .collect(),
        title: interpolate(&template.title, &values),
        name: values.get("nome").cloned().unwrap_or_default(),
        body,
        body_format: Some(body_format),
        footer: interpolate(&template.footer, &values),
        signatures: [0, 1].map(|slot| {
            resolve_signature(template.signature(slot), defaults[slot], training)
        }),
    };

    let body_lines = render_page(prepared, &doc, canvas);
    log::debug!(
        "Composed {:?} certificate for '{}' ({} body lines)",
        recipient.kind(),
        doc.name,
        body_lines
    );
    values
}

pub fn compose_participant(
    prepared: &PreparedTemplate,
    training: &Training,
    participant: &Participant,
    options: &ComposeOptions,
    canvas: &mut dyn Canvas,
) -> Placeholders {
    compose(prepared, training, participant, options, canvas)
}

pub fn compose_monitor(
    prepared: &PreparedTemplate,
    training: &Training,
    monitor: &Monitor,
    options: &ComposeOptions,
    canvas: &mut dyn Canvas,
) -> Placeholders {
    compose(prepared, training, monitor, options, canvas)
}

pub fn compose_speaker(
    prepared: &PreparedTemplate,
    training: &Training,
    speaker: &Speaker,
    options: &ComposeOptions,
    canvas: &mut dyn Canvas,
) -> Placeholders {
    compose(prepared, training, speaker, options, canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::PageCanvas;

    fn training() -> Training {
        Training::from_json(
            r#"{
                "title": "NR-10",
                "coordinator": "Maria Souza",
                "instructor": "João Lima",
                "duration": 40,
                "dates": [{ "date": "2025-02-10" }, { "date": "2025-02-11" }]
            }"#,
        )
        .unwrap()
    }

    fn prepared(json: &str) -> PreparedTemplate {
        Template::from_json(json).unwrap().prepare()
    }

    #[test]
    fn test_participant_placeholders() {
        let mut p = Participant::named("Ana Silva");
        p.kappa = Some(0.85);
        let mut canvas = PageCanvas::new();
        let values = compose_participant(
            &prepared("{}"),
            &training(),
            &p,
            &ComposeOptions::default(),
            &mut canvas,
        );
        assert_eq!(values["funcao"], "Participante");
        assert_eq!(values["tipo_certificado"], "Participação");
        assert_eq!(values["aula"], "");
        assert_eq!(values["nota"], "85,0");
        assert_eq!(values["nota_percentual"], "85,0%");
        assert_eq!(values["kappa"], "0.850");
        assert_eq!(values["carga_horaria"], "40");
        assert_eq!(values["periodo_treinamento"], "de 10/02/2025 a 11/02/2025");
        assert_eq!(values["dias_treinamento"], "10/02/2025, 11/02/2025");
        assert_eq!(values["data"], "11/02/2025");
    }

    #[test]
    fn test_issue_date_overrides_training_date() {
        let options = ComposeOptions {
            issued_on: NaiveDate::from_ymd_opt(2025, 3, 1),
        };
        let mut canvas = PageCanvas::new();
        let values = compose(
            &prepared("{}"),
            &training(),
            &Participant::named("Ana"),
            &options,
            &mut canvas,
        );
        assert_eq!(values["data"], "01/03/2025");
    }

    #[test]
    fn test_monitor_and_speaker_roles() {
        let monitor = Monitor {
            name: "Caio".to_string(),
            lecture: Some("Aterramento".to_string()),
            ..Monitor::default()
        };
        let mut canvas = PageCanvas::new();
        let values = compose_monitor(
            &prepared("{}"),
            &training(),
            &monitor,
            &ComposeOptions::default(),
            &mut canvas,
        );
        assert_eq!(values["funcao"], "Monitor(a)");
        assert_eq!(values["tipo_certificado"], "Monitoria");
        assert_eq!(values["aula"], "Aterramento");
        assert_eq!(values["nota"], "");

        let speaker = Speaker {
            name: "Dr. Rui".to_string(),
            ..Speaker::default()
        };
        let mut canvas = PageCanvas::new();
        let values = compose_speaker(
            &prepared("{}"),
            &training(),
            &speaker,
            &ComposeOptions::default(),
            &mut canvas,
        );
        assert_eq!(values["funcao"], "Palestrante");
        assert_eq!(values["tipo_certificado"], "Palestrante");
    }

    #[test]
    fn test_speaker_gets_only_coordinator_signature() {
        let speaker = Speaker {
            name: "Dr. Rui".to_string(),
            ..Speaker::default()
        };
        let mut canvas = PageCanvas::new();
        compose_speaker(
            &prepared("{}"),
            &training(),
            &speaker,
            &ComposeOptions::default(),
            &mut canvas,
        );
        let page = canvas.finish();
        let texts: Vec<&str> = page.texts().collect();
        assert!(texts.contains(&"Maria Souza"));
        assert!(texts.contains(&"Coordenador(a)"));
        assert!(!texts.contains(&"João Lima"));
    }

    #[test]
    fn test_template_signature_source_wins() {
        let t = prepared(
            r#"{
                "signature1": { "source": "custom", "name": "Dra. Helena", "role": "Diretora" },
                "signature2": { "source": "none" }
            }"#,
        );
        let mut canvas = PageCanvas::new();
        compose(
            &t,
            &training(),
            &Participant::named("Ana"),
            &ComposeOptions::default(),
            &mut canvas,
        );
        let page = canvas.finish();
        let texts: Vec<&str> = page.texts().collect();
        assert!(texts.contains(&"Dra. Helena"));
        assert!(texts.contains(&"Diretora"));
        assert!(!texts.contains(&"João Lima"));
        assert!(!texts.contains(&"Maria Souza"));
    }

    #[test]
    fn test_signature_role_override_keeps_training_name() {
        let config = SignatureConfig {
            source: Some(SignatureSource::Instructor),
            name: Some("Ignored".to_string()),
            role: Some("Instrutora líder".to_string()),
        };
        let sig = resolve_signature(&config, SignatureSource::Coordinator, &training()).unwrap();
        assert_eq!(sig.name, "João Lima");
        assert_eq!(sig.role, "Instrutora líder");
    }

    #[test]
    fn test_missing_coordinator_omits_block() {
        let config = SignatureConfig::default();
        let sig = resolve_signature(&config, SignatureSource::Coordinator, &Training::default());
        assert!(sig.is_none());
    }

    #[test]
    fn test_header_and_title_interpolated() {
        let t = prepared(
            r#"{ "entityName": "Escola Técnica", "headerLines": ["{{entidade}}"], "title": "CERTIFICADO DE {{tipo_certificado}}" }"#,
        );
        let mut canvas = PageCanvas::new();
        compose(
            &t,
            &training(),
            &Participant::named("Ana"),
            &ComposeOptions::default(),
            &mut canvas,
        );
        let page = canvas.finish();
        let texts: Vec<&str> = page.texts().collect();
        assert!(texts.contains(&"Escola Técnica"));
        assert!(texts.contains(&"CERTIFICADO DE Participação"));
    }

    fn body_texts(template_json: &str, name: &str) -> Vec<String> {
        let mut canvas = PageCanvas::new();
        compose(
            &prepared(template_json),
            &training(),
            &Participant::named(name),
            &ComposeOptions::default(),
            &mut canvas,
        );
        canvas.finish().texts().map(str::to_string).collect()
    }

    #[test]
    fn test_block_body_values_are_literal_text() {
        let texts = body_texts(
            r#"{ "body": "<p>Certifico que <b>{{nome}}</b> concluiu.</p>" }"#,
            "Ana <i>Souza</i> & Cia",
        );
        for word in ["Ana", "<i>Souza</i>", "&", "Cia"] {
            assert!(texts.iter().any(|t| t == word), "missing {word:?} in {texts:?}");
        }
    }

    #[test]
    fn test_value_markup_does_not_switch_plain_body() {
        let texts = body_texts(r#"{ "body": "Certifico que {{nome}} concluiu." }"#, "<b>Ana</b>");
        assert!(texts.iter().any(|t| t == "<b>Ana</b>"), "{texts:?}");
    }
}
