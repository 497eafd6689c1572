//! skai-demo - headless driver for the disaster response dashboard
//!
//! Runs the same dashboard as the TUI from the command line, for scripting
//! and demos.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/skai/skai.db (~/.local/share/skai/skai.db)
//! - Logs: $XDG_STATE_HOME/skai/ (~/.local/state/skai/)
//! - Config: $XDG_CONFIG_HOME/skai/config.toml (~/.config/skai/config.toml)

use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use skai_core::format::format_count;
use skai_core::i18n::Localizer;
use skai_core::logging::{self, LogTarget};
use skai_core::operations::OperationKind;
use skai_core::report::REPORT_FORMATS;
use skai_core::session::CredentialTable;
use skai_core::{Config, Dashboard, Params, Trigger};

#[derive(Parser)]
#[command(name = "skai-demo")]
#[command(about = "Drive the SKAI damage assessment pipeline from the command line")]
#[command(version)]
struct Args {
    /// Language code for output (en, es, fr, ht, ar, zh)
    #[arg(long, global = true)]
    lang: Option<String>,

    /// Echo warnings and errors to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in and remember the session
    Login {
        /// Username, e.g. unhcr.admin
        username: String,

        #[arg(short, long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami {
        /// Print the session as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the pipeline on the sample images
    Run {
        /// Stop after this operation
        #[arg(long, value_enum, default_value = "generate-report")]
        until: Step,

        /// Comma-separated export formats (pdf, images, gis, json)
        #[arg(long, value_delimiter = ',', default_value = "pdf")]
        formats: Vec<String>,

        /// Print results as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Look up a translation key
    Translate {
        key: String,

        /// Substitution parameter, name=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// List the demo accounts
    Accounts,
}

/// Pipeline operations in order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
enum Step {
    Enhance,
    Analyze,
    Summarize,
    GenerateReport,
}

impl From<Step> for OperationKind {
    fn from(step: Step) -> Self {
        match step {
            Step::Enhance => OperationKind::Enhance,
            Step::Analyze => OperationKind::Analyze,
            Step::Summarize => OperationKind::Summarize,
            Step::GenerateReport => OperationKind::GenerateReport,
        }
    }
}

fn parse_param(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected name=value, got {raw:?}"))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(lang) = &args.lang {
        config.locale.language = lang.clone();
    }

    // Initialize logging
    let target = LogTarget {
        component: "skai-demo",
        stderr: args.verbose,
    };
    let _log_guard =
        logging::init(&config.logging, target).context("failed to initialize logging")?;

    tracing::info!("skai-demo starting");

    match args.command {
        Command::Translate { key, params } => {
            let localizer = Localizer::new(&config.locale.language);
            let params = params
                .into_iter()
                .fold(Params::new(), |p, (name, value)| p.with(name, value));
            println!("{}", localizer.translate_with(&key, &params));
            Ok(())
        }
        Command::Accounts => {
            for identifier in CredentialTable::seeded().identifiers() {
                println!("{identifier}");
            }
            Ok(())
        }
        Command::Login { username, password } => {
            let mut dashboard = Dashboard::open(&config).context("failed to open dashboard")?;
            match dashboard.login(&username, &password).await {
                Ok(session) => {
                    let params = Params::new()
                        .with("name", &session.name)
                        .with("organization", &session.organization);
                    println!("{}", dashboard.t_with("signedInAs", &params));
                    Ok(())
                }
                Err(failure) => {
                    tracing::info!(identifier = %failure.identifier, "Sign-in rejected");
                    bail!("{}", dashboard.t("invalidCredentials"))
                }
            }
        }
        Command::Logout => {
            let mut dashboard = Dashboard::open(&config).context("failed to open dashboard")?;
            dashboard.restore();
            dashboard.logout();
            println!("Signed out");
            Ok(())
        }
        Command::Whoami { json } => {
            let mut dashboard = Dashboard::open(&config).context("failed to open dashboard")?;
            match dashboard.restore() {
                Some(session) if json => {
                    println!("{}", serde_json::to_string_pretty(&session)?);
                }
                Some(session) => {
                    let params = Params::new()
                        .with("name", &session.name)
                        .with("organization", &session.organization);
                    println!("{}", dashboard.t_with("signedInAs", &params));
                    println!("  {} · {}", session.role, session.region);
                }
                None => println!("{}", dashboard.t("notSignedIn")),
            }
            Ok(())
        }
        Command::Run {
            until,
            formats,
            json,
        } => {
            let mut dashboard = Dashboard::open(&config).context("failed to open dashboard")?;
            if dashboard.restore().is_none() {
                bail!("not signed in; run `skai-demo login` first");
            }
            run_pipeline(&mut dashboard, until, &formats, json).await
        }
    }
}

async fn run_pipeline(
    dashboard: &mut Dashboard,
    until: Step,
    formats: &[String],
    json: bool,
) -> Result<()> {
    if let Some(unknown) = formats
        .iter()
        .find(|f| !REPORT_FORMATS.iter().any(|r| r.id == f.as_str()))
    {
        bail!("unknown report format {unknown:?}");
    }
    for format in REPORT_FORMATS.iter() {
        let wanted = formats.iter().any(|f| f == format.id);
        if wanted != dashboard.report().is_selected(format.id) {
            dashboard.toggle_report_format(format.id);
        }
    }

    dashboard.select_sample_data()?;
    if !json {
        for image in dashboard.assets().images() {
            println!("{:<14} {} ({})", image.role.label(), image.name, image.location);
        }
    }

    let steps = [
        Step::Enhance,
        Step::Analyze,
        Step::Summarize,
        Step::GenerateReport,
    ];
    for step in steps.into_iter().filter(|s| *s <= until) {
        let kind = OperationKind::from(step);
        run_step(dashboard, kind, json).await?;
    }

    if json {
        print_json(dashboard)?;
    } else {
        print_text(dashboard);
    }
    Ok(())
}

/// Trigger one operation and wait for it, showing a progress bar.
async fn run_step(dashboard: &mut Dashboard, kind: OperationKind, quiet: bool) -> Result<()> {
    match dashboard.trigger(kind)? {
        Trigger::Started(id) => tracing::debug!(%kind, %id, "Step started"),
        Trigger::AlreadyRunning => bail!("{kind} is already running"),
        Trigger::Unmet(reason) => bail!("cannot run {kind}: {reason}"),
    }

    let bar = if quiet {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} {msg:32} [{bar:30.cyan/blue}] {pos:>3}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        bar.set_message(dashboard.t(kind.progress_key()));
        bar
    };

    while dashboard.pump() == 0 {
        if let Some(progress) = dashboard.progress(kind) {
            bar.set_position((progress * 100.0) as u64);
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    bar.finish_and_clear();

    if let Some(error) = dashboard.last_error() {
        bail!("{error}");
    }
    Ok(())
}

fn print_text(dashboard: &Dashboard) {
    let results = dashboard.results();

    if let Some(enhancement) = &results.enhancement {
        let params = Params::new().with("count", enhancement.damage_areas_detected);
        println!("{}", dashboard.t_with("damageAreasDetected", &params));
    }
    if let Some(analysis) = &results.analysis {
        let params = Params::new()
            .with("count", analysis.areas.len())
            .with("buildings", analysis.total_buildings());
        println!("{}", dashboard.t_with("analysisComplete", &params));
    }
    if let Some(summary) = &results.summary {
        println!(
            "{}: {}  {}: {:.1} km²  {}: {}%",
            dashboard.t("severity"),
            dashboard.t(summary.overall_severity.label_key()),
            dashboard.t("affectedArea"),
            summary.affected_area_km2,
            dashboard.t("damageLevel"),
            summary.damage_level_percent
        );
        println!(
            "{}: {} {}, {} {}, {} {}",
            dashboard.t("populationImpact"),
            format_count(summary.population.affected),
            dashboard.t("affected"),
            format_count(summary.population.displaced),
            dashboard.t("displaced"),
            format_count(summary.population.vulnerable),
            dashboard.t("vulnerable")
        );
    }
    if results.report.is_some() {
        let report = dashboard.report();
        println!(
            "{}: {} ({} {}, {} MB)",
            dashboard.t("disasterReport"),
            report
                .selected()
                .map(|f| f.name)
                .collect::<Vec<_>>()
                .join(", "),
            report.count(),
            dashboard.t("itemsSelected"),
            report.total_size_label()
        );
    }
    if let Some(notice) = dashboard.notice() {
        println!("{notice}");
    }
}

fn print_json(dashboard: &Dashboard) -> Result<()> {
    let results = dashboard.results();
    let stages: Vec<_> = dashboard
        .pipeline()
        .snapshot()
        .into_iter()
        .map(|(stage, status)| json!({ "stage": stage, "status": status }))
        .collect();

    let output = json!({
        "user": dashboard.session().map(|s| s.username.clone()),
        "active_stage": dashboard.pipeline().active_stage(),
        "stages": stages,
        "enhancement": results.enhancement,
        "analysis": results.analysis,
        "summary": results.summary,
        "report": results.report,
        "formats": dashboard.report().selected().map(|f| f.id).collect::<Vec<_>>(),
        "total_size_mb": dashboard.report().total_size_label(),
        "notice": dashboard.notice(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
