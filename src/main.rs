use anyhow::{bail, Context};
use clap::Parser;
use colored::Colorize;
use fs_err as fs;
use serde::Serialize;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod cli;
mod config;
mod errors;
mod fallback;
mod log;
mod normalize;
mod prompt;
mod provider;
mod session;
mod ux;
mod wire;

use config::Config;
use normalize::Provenance;
use provider::{GenerationParams, Provider};
use session::{Session, SessionSettings};
use wire::AutomationRecommendationSet;

/// What `--json` and `--output` emit.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    role: &'a str,
    example_data: bool,
    provenance: Option<&'a Provenance>,
    case_ids: Vec<String>,
    #[serde(flatten)]
    result: &'a AutomationRecommendationSet,
}

impl<'a> Report<'a> {
    fn of(session: &'a Session, result: &'a AutomationRecommendationSet) -> Self {
        Self {
            role: session.role(),
            example_data: session.shows_example_data(),
            provenance: session.last_provenance(),
            case_ids: result
                .automation_cases
                .iter()
                .enumerate()
                .map(|(i, c)| c.id(i))
                .collect(),
            result,
        }
    }
}

struct AnalyzeOpts<'a> {
    role: &'a str,
    more: Option<u32>,
    output: Option<&'a str>,
    json: bool,
    save_artifacts: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    log::init_tracing(args.debug);

    let mut cfg = Config::load(args.config.as_deref().map(Path::new))?;
    cfg.apply_args(&args);

    let api_key = cfg.resolve_api_key(args.api_key.as_deref())?;
    let prov = provider::make_provider(&cfg, api_key.clone());

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; cancelling the request in flight");
            on_interrupt.cancel();
        }
    });

    match &args.command {
        cli::Command::Probe => probe(&cfg, prov.as_ref(), &api_key, &cancel).await,
        cli::Command::Analyze { role, more, output, json } => {
            if let Some(problem) = cfg.provider.key_format_problem(&api_key) {
                warn!(provider = %cfg.provider, "API key looks wrong: {problem}");
            }
            let opts = AnalyzeOpts {
                role,
                more: *more,
                output: output.as_deref(),
                json: *json,
                save_artifacts: args.save_artifacts,
            };
            analyze(&cfg, prov.as_ref(), opts, &cancel).await
        }
    }
}

async fn analyze(
    cfg: &Config,
    prov: &dyn Provider,
    opts: AnalyzeOpts<'_>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let mut session = Session::new(SessionSettings::from_config(cfg));
    if opts.save_artifacts {
        let run = log::RunLog::create(Path::new(&cfg.artifacts_dir))
            .with_context(|| format!("creating artifacts dir under {}", cfg.artifacts_dir))?;
        info!(run = %run.id(), dir = %run.dir().display(), "saving run artifacts");
        session = session.with_artifacts(run);
    }

    let mut role = opts.role.to_string();
    loop {
        analyze_role(cfg, prov, &mut session, &role, &opts, cancel).await?;
        if opts.more.is_some() || opts.json {
            break;
        }
        match ux::ask_line("\nAnother role to analyze (empty to quit)") {
            Some(next) => {
                session.clear();
                role = next;
            }
            None => break,
        }
    }
    Ok(())
}

/// One role: analysis, "more" rounds, then the report.
async fn analyze_role(
    cfg: &Config,
    prov: &dyn Provider,
    session: &mut Session,
    role: &str,
    opts: &AnalyzeOpts<'_>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let pb = ux::spinner(&format!("analyzing role with {} ({})", cfg.provider, cfg.model));
    let outcome = session.analyze(prov, role, cancel).await.map(|_| ());
    pb.finish_and_clear();
    outcome.context("analysis failed")?;

    if !opts.json {
        if let Some(set) = session.current() {
            ux::show_result(set, session.last_provenance(), session.shows_example_data());
        }
    }

    let mut round = 0u32;
    loop {
        let wanted = match opts.more {
            Some(n) => round < n,
            None => !opts.json && ux::confirm("\nGenerate more cases?"),
        };
        if !wanted {
            break;
        }
        round += 1;

        let offset = session.current().map_or(0, |s| s.automation_cases.len());
        let pb = ux::spinner(&format!("generating more cases (round {round})"));
        let outcome = session.generate_more(prov, cancel).await.map(|added| added.len());
        pb.finish_and_clear();
        let added = outcome.context("generating more cases failed")?;
        info!(round, added, "more cases appended");

        if !opts.json {
            if let Some(set) = session.current() {
                ux::show_cases(&set.automation_cases[offset..], offset);
            }
            if session.last_provenance().is_some_and(Provenance::uses_example_data) {
                ux::print_example_notice(session.last_provenance());
            }
        }
    }

    let Some(result) = session.current() else {
        bail!("no result to report");
    };
    let report = serde_json::to_string_pretty(&Report::of(session, result))?;
    if let Some(path) = opts.output {
        fs::write(path, &report).with_context(|| format!("writing {path}"))?;
        if !opts.json {
            println!("\n{} {}", "saved".green().bold(), path);
        }
    }
    if opts.json {
        println!("{report}");
    }
    Ok(())
}

/// Key-shape check followed by a minimal completion.
async fn probe(cfg: &Config, prov: &dyn Provider, api_key: &str, cancel: &CancellationToken) -> anyhow::Result<()> {
    if let Some(problem) = cfg.provider.key_format_problem(api_key) {
        bail!("API key for {} looks wrong: {problem}", cfg.provider);
    }
    let params = GenerationParams { temperature: 0.0, max_tokens: 10 };
    let pb = ux::spinner(&format!("probing {}", cfg.provider));
    let outcome = prov.complete("Reply with OK.", &params, cancel).await;
    pb.finish_and_clear();
    outcome.with_context(|| format!("{} probe failed", cfg.provider))?;
    println!(
        "{} {} is reachable with model {}",
        "OK".green().bold(),
        cfg.provider,
        cfg.model
    );
    Ok(())
}
