//! # certforme CLI
//!
//! Usage:
//!   certforme --template template.json --job job.json --out-dir out/
//!   certforme --example-template > template.json

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};

use certforme::template::EXAMPLE_TEMPLATE;
use certforme::{issue_batch, CertError, ComposeOptions, Job, RecipientKind, Template};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Role {
    Participant,
    Monitor,
    Speaker,
}

impl From<Role> for RecipientKind {
    fn from(role: Role) -> Self {
        match role {
            Role::Participant => RecipientKind::Participant,
            Role::Monitor => RecipientKind::Monitor,
            Role::Speaker => RecipientKind::Speaker,
        }
    }
}

/// Issue certificate PDFs for every recipient of a training.
#[derive(Debug, Parser)]
#[command(name = "certforme", version, about)]
struct Cli {
    /// Template JSON file.
    #[arg(long, env = "CERTFORME_TEMPLATE", required_unless_present = "example_template")]
    template: Option<PathBuf>,

    /// Job JSON file: `{ "training": {...}, "recipients": [...] }`.
    #[arg(long, required_unless_present = "example_template")]
    job: Option<PathBuf>,

    /// Directory the PDFs are written to.
    #[arg(long, env = "CERTFORME_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Certificate kind for recipients without a `kind` field.
    #[arg(long, value_enum, default_value_t = Role::Participant)]
    role: Role,

    /// Issue date printed as `{{data}}` (YYYY-MM-DD).
    #[arg(long)]
    issued_on: Option<NaiveDate>,

    /// Print a starter template and exit.
    #[arg(long)]
    example_template: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if cli.example_template {
        println!("{}", EXAMPLE_TEMPLATE);
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(failed) => {
            eprintln!("✗ {} certificate(s) failed", failed);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("✗ {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Returns the number of recipients that failed.
fn run(cli: &Cli) -> Result<usize, CertError> {
    let (Some(template_path), Some(job_path)) = (&cli.template, &cli.job) else {
        return Ok(0);
    };

    let prepared = Template::load(template_path)?.prepare();
    let job = Job::load(job_path)?;
    let options = ComposeOptions {
        issued_on: cli.issued_on,
    };

    let mut failed = 0;
    let mut recipients = Vec::new();
    for (i, parsed) in job.recipients(cli.role.into()).into_iter().enumerate() {
        match parsed {
            Ok(recipient) => recipients.push(recipient),
            Err(e) => {
                log::warn!("Skipping recipient #{}: {}", i + 1, e);
                failed += 1;
            }
        }
    }

    fs::create_dir_all(&cli.out_dir)
        .map_err(|e| CertError::io(cli.out_dir.display().to_string(), e))?;

    for issued in issue_batch(&prepared, &job.training, &recipients, &options) {
        let path = cli.out_dir.join(&issued.file_name);
        let written = issued.result.and_then(|bytes| {
            fs::write(&path, &bytes)
                .map(|_| bytes.len())
                .map_err(|e| CertError::io(path.display().to_string(), e))
        });
        match written {
            Ok(len) => eprintln!("✓ Written {} bytes to {}", len, path.display()),
            Err(e) => {
                eprintln!("✗ {}: {}", issued.recipient, e);
                failed += 1;
            }
        }
    }

    Ok(failed)
}
