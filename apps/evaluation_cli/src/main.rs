use std::{collections::BTreeMap, fmt::Write as _, path::PathBuf, sync::Arc};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{
    initialize, ElementState, EvaluationApi, EvaluationFormSubmitter, HttpEvaluationApi,
    MemoryRenderer, OverallUpdater, SubmitOutcome, UpdateOutcome,
};
use shared::{
    domain::{CollaboratorId, ElementKey, Sector, StyleProperty},
    protocol::FormPayload,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod page_file;

use config::{load_settings, Settings};
use page_file::PageDescription;

const STATUS_ELEMENT: &str = "save-status";

#[derive(Parser, Debug)]
#[command(about = "Drives the evaluation page flows against a running evaluation server")]
struct Cli {
    /// Settings file; defaults to ./evaluation.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    base_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh one collaborator's overall score for a sector.
    Overall {
        #[arg(long)]
        colaborador_id: String,
        #[arg(long)]
        setor: String,
    },
    /// Submit an evaluation form built from name=value fields.
    Submit {
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Print a collaborator's score history.
    History {
        #[arg(long)]
        colaborador_id: String,
    },
    /// Replace a collaborator's badges.
    Badges {
        #[arg(long)]
        colaborador_id: String,
        #[arg(long = "badge")]
        badges: Vec<String>,
    },
    /// Compare 2 to 4 collaborators side by side.
    Compare {
        #[arg(long = "id", required = true)]
        ids: Vec<String>,
    },
    /// Initialize a page description and replay selector changes and submissions.
    Page {
        #[arg(long)]
        file: PathBuf,
        /// selector=sector
        #[arg(long = "change", value_parser = parse_field)]
        changes: Vec<(String, String)>,
        /// form:name=value,name=value
        #[arg(long = "submit", value_parser = parse_submission)]
        submissions: Vec<(String, Vec<(String, String)>)>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings(cli.config.as_deref())?;
    if let Some(base_url) = cli.base_url {
        settings.base_url = base_url;
    }
    info!(base_url = %settings.base_url, "using evaluation api");

    let api: Arc<dyn EvaluationApi> = Arc::new(HttpEvaluationApi::with_timeout(
        &settings.base_url,
        settings.request_timeout(),
    )?);

    run(cli.command, &settings, api).await
}

async fn run(command: Command, settings: &Settings, api: Arc<dyn EvaluationApi>) -> Result<()> {
    match command {
        Command::Overall {
            colaborador_id,
            setor,
        } => {
            let collaborator_id = CollaboratorId::new(colaborador_id);
            let renderer = Arc::new(MemoryRenderer::with_elements([
                ElementKey::overall_display(&collaborator_id),
            ]));
            let updater = OverallUpdater::with_policy(
                renderer.clone(),
                api,
                settings.stale_response_policy,
            );
            let outcome = updater.update(&collaborator_id, &Sector::new(setor)).await;
            print!("{}", render_snapshot(&renderer.snapshot()));
            if outcome == UpdateOutcome::Failed {
                bail!("overall refresh failed for collaborator {collaborator_id}");
            }
        }
        Command::Submit { fields } => {
            let renderer = Arc::new(MemoryRenderer::with_elements([STATUS_ELEMENT]));
            let submitter = EvaluationFormSubmitter::with_clear_delay(
                renderer.clone(),
                api,
                settings.page_options().status_clear_delay,
            );
            let submission = submitter
                .submit(
                    &ElementKey::from(STATUS_ELEMENT),
                    FormPayload::from_fields(fields),
                )
                .await;
            print!("{}", render_snapshot(&renderer.snapshot()));
            if submission.outcome == SubmitOutcome::Failed {
                bail!("evaluation was not saved");
            }
        }
        Command::History { colaborador_id } => {
            let history = api
                .fetch_history(&CollaboratorId::new(colaborador_id))
                .await?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
        Command::Badges {
            colaborador_id,
            badges,
        } => {
            let response = api
                .save_badges(&CollaboratorId::new(colaborador_id), &badges)
                .await?;
            println!("{}", response.mensagem);
        }
        Command::Compare { ids } => {
            let ids: Vec<CollaboratorId> = ids.into_iter().map(CollaboratorId::new).collect();
            let comparison = api.compare(&ids).await?;
            println!("{}", serde_json::to_string_pretty(&comparison)?);
        }
        Command::Page {
            file,
            changes,
            submissions,
        } => {
            let description = PageDescription::load(&file)?;
            let renderer = Arc::new(description.renderer());
            let mut page = initialize(
                description.bindings,
                renderer.clone(),
                api,
                settings.page_options(),
            );
            let outcomes = page.settle_initial_updates().await;
            info!(refreshed = outcomes.len(), "initial overall refresh done");

            for (selector, sector) in changes {
                match page.sector_changed(&ElementKey::new(selector.as_str()), sector) {
                    Some(update) => {
                        update.await?;
                    }
                    None => warn!(selector = %selector, "no selector registered with this key"),
                }
            }

            for (form, fields) in submissions {
                match page.form_submitted(&ElementKey::new(form.as_str()), fields) {
                    Some(submission) => {
                        let submission = submission.await?;
                        info!(form = %form, outcome = ?submission.outcome, "form submitted");
                    }
                    None => warn!(form = %form, "no form registered with this key"),
                }
            }

            print!("{}", render_snapshot(&renderer.snapshot()));
        }
    }

    Ok(())
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("field name is empty in '{raw}'"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn parse_submission(raw: &str) -> Result<(String, Vec<(String, String)>), String> {
    let (form, fields) = raw
        .split_once(':')
        .ok_or_else(|| format!("expected form:name=value,..., got '{raw}'"))?;
    let fields = fields
        .split(',')
        .filter(|field| !field.trim().is_empty())
        .map(parse_field)
        .collect::<Result<Vec<_>, _>>()?;
    Ok((form.trim().to_string(), fields))
}

fn render_snapshot(elements: &BTreeMap<ElementKey, ElementState>) -> String {
    let mut out = String::new();
    for (key, state) in elements {
        let _ = write!(out, "{key}: {:?}", state.text);
        for property in [StyleProperty::Opacity, StyleProperty::Color] {
            if let Some(value) = state.styles.get(&property) {
                let _ = write!(out, " {}={value}", property.css_name());
            }
        }
        out.push('\n');
    }
    out
}
