use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use client_core::{
    derive::{cumulative_ranking, monthly_totals},
    AchievementForm, ExportTrigger, HttpScoringService, RefreshReport, ScoringService,
    SyncController, UiError,
};
use shared::{
    domain::{Filter, FilterSelection, MonthKey},
    protocol::{ExportKind, SeedRequest},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod render;

#[derive(Parser, Debug)]
#[command(name = "kam-dashboard", about = "KAM incentive dashboard client")]
struct Args {
    /// Overrides `api_base_url` from the config file and environment.
    #[arg(long, global = true)]
    api_base_url: Option<String>,
    #[arg(long, global = true, default_value = "dashboard.toml")]
    config: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reload state, scores, dataset and inputs and report what loaded.
    Refresh,
    /// Monthly score breakdown.
    Scores(TableArgs),
    /// Cumulative leaderboard, highest first.
    Cumulative,
    /// Month-by-month total for one KAM.
    Trend {
        #[arg(long)]
        kam: String,
    },
    /// Every project-month row, seeded and manual.
    Dataset(TableArgs),
    /// Manually entered project-month rows.
    Inputs(TableArgs),
    /// Regenerate the synthetic demo dataset.
    Seed(SeedArgs),
    /// Record one month of achievements for a KAM.
    Submit(SubmitArgs),
    /// Download a CSV export.
    Export(ExportArgs),
}

#[derive(clap::Args, Debug)]
struct TableArgs {
    #[arg(long)]
    kam: Option<String>,
    /// `YYYY-MM` or `YYYY-MM-DD`.
    #[arg(long)]
    month: Option<MonthKey>,
}

impl TableArgs {
    fn selection(&self) -> FilterSelection {
        FilterSelection::new(
            Filter::from_option(self.kam.clone()),
            Filter::from_option(self.month.clone()),
        )
    }
}

#[derive(clap::Args, Debug)]
struct SeedArgs {
    #[arg(long)]
    start_month: Option<NaiveDate>,
    #[arg(long)]
    months: Option<u32>,
    /// Repeat for each KAM.
    #[arg(long = "kam")]
    kams: Vec<String>,
    /// Repeat for each region.
    #[arg(long = "region")]
    regions: Vec<String>,
    #[arg(long)]
    random_seed: Option<u64>,
}

impl SeedArgs {
    fn into_request(self) -> SeedRequest {
        let mut request = SeedRequest::default();
        if let Some(start) = self.start_month {
            request.start_month = start;
        }
        if let Some(months) = self.months {
            request.months = months;
        }
        if !self.kams.is_empty() {
            request.kam_names = self.kams;
        }
        if !self.regions.is_empty() {
            request.regions = self.regions;
        }
        if let Some(seed) = self.random_seed {
            request.random_seed = seed;
        }
        request
    }
}

#[derive(clap::Args, Debug)]
struct SubmitArgs {
    /// KAM to sign in as.
    #[arg(long = "as", value_name = "KAM")]
    kam: String,
    #[arg(long)]
    month: MonthKey,
    #[arg(long)]
    added_pp: f64,
    #[arg(long)]
    added_lvp: f64,
    #[arg(long)]
    new_projects: Option<u32>,
    #[arg(long)]
    avg_sop_month: Option<u32>,
    #[arg(long)]
    foc_ratio_pp: Option<f64>,
    #[arg(long)]
    foc_ratio_lvp: Option<f64>,
}

impl SubmitArgs {
    fn form(&self) -> AchievementForm {
        let mut form = AchievementForm::new(self.month.clone(), self.added_pp, self.added_lvp);
        if let Some(v) = self.new_projects {
            form.new_projects = v;
        }
        if let Some(v) = self.avg_sop_month {
            form.avg_sop_month = v;
        }
        if let Some(v) = self.foc_ratio_pp {
            form.foc_ratio_pp = v;
        }
        if let Some(v) = self.foc_ratio_lvp {
            form.foc_ratio_lvp = v;
        }
        form
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ExportTarget {
    Scores,
    Cumulative,
    Dataset,
    Inputs,
}

impl From<ExportTarget> for ExportKind {
    fn from(value: ExportTarget) -> Self {
        match value {
            ExportTarget::Scores => ExportKind::MonthlyScores,
            ExportTarget::Cumulative => ExportKind::CumulativeScores,
            ExportTarget::Dataset => ExportKind::Dataset,
            ExportTarget::Inputs => ExportKind::Inputs,
        }
    }
}

#[derive(clap::Args, Debug)]
struct ExportArgs {
    #[arg(value_enum)]
    target: ExportTarget,
    /// Directory to save into; defaults to `export_dir` from config.
    #[arg(long)]
    out: Option<PathBuf>,
    #[arg(long)]
    filename: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = config::load_settings(&args.config)?;
    if let Some(url) = args.api_base_url.as_deref() {
        settings.api_base_url = config::normalize_base_url(url)?;
    }
    info!(api = %settings.api_base_url, "using scoring service");

    let service: Arc<dyn ScoringService> =
        Arc::new(HttpScoringService::new(settings.api_base_url.clone()));
    let controller = SyncController::new(service.clone());

    match args.command {
        Command::Refresh => {
            let report = controller.refresh_all().await;
            let store = controller.snapshot().await;
            println!(
                "kams={} score_rows={} dataset_rows={} input_rows={}",
                store.kams().len(),
                store.score_rows().len(),
                store.dataset_rows().len(),
                store.input_rows().len()
            );
            print_failures(&report);
        }
        Command::Scores(table) => {
            controller
                .load_scores()
                .await
                .map_err(|err| anyhow::anyhow!(err.user_message()))
                .context("loading scores")?;
            print_lines(render::scores_table(
                &controller.scores_view(&table.selection()).await,
            ));
        }
        Command::Cumulative => {
            controller
                .load_scores()
                .await
                .map_err(|err| anyhow::anyhow!(err.user_message()))
                .context("loading scores")?;
            let store = controller.snapshot().await;
            let ranking = store.cumulative().map(cumulative_ranking).unwrap_or_default();
            print_lines(render::ranking_table(&ranking));
        }
        Command::Trend { kam } => {
            controller
                .load_scores()
                .await
                .map_err(|err| anyhow::anyhow!(err.user_message()))
                .context("loading scores")?;
            let store = controller.snapshot().await;
            print_lines(render::trend_table(&monthly_totals(store.score_rows(), &kam)));
        }
        Command::Dataset(table) => {
            controller
                .load_dataset()
                .await
                .map_err(|err| anyhow::anyhow!(err.user_message()))
                .context("loading dataset")?;
            controller.set_dataset_filter(table.selection()).await;
            let (kams, months) = controller.dataset_domains().await;
            println!("{}", render::domains_line(&kams, &months));
            print_lines(render::projects_table(&controller.dataset_view().await));
        }
        Command::Inputs(table) => {
            controller
                .load_inputs()
                .await
                .map_err(|err| anyhow::anyhow!(err.user_message()))
                .context("loading inputs")?;
            controller.set_inputs_filter(table.selection()).await;
            let (kams, months) = controller.inputs_domains().await;
            println!("{}", render::domains_line(&kams, &months));
            print_lines(render::projects_table(&controller.inputs_view().await));
        }
        Command::Seed(seed) => {
            let report = controller
                .seed_demo(seed.into_request())
                .await
                .map_err(|err| anyhow::anyhow!(err.user_message()))
                .context("seeding demo data")?;
            print_notice(&controller).await;
            print_failures(&report);
        }
        Command::Submit(submit) => {
            // Sign-in picks from the roster; an unreachable roster defers to the server.
            if controller.load_state().await.is_ok() {
                let options = controller.kam_options().await;
                if !options.iter().any(|name| name == &submit.kam) {
                    bail!(
                        "unknown KAM '{}'; choose one of: {}",
                        submit.kam,
                        options.join(", ")
                    );
                }
            }
            controller.select_identity(Some(submit.kam.clone())).await;

            if let Err(err) = controller.submit_achievements(submit.form()).await {
                let shown = controller
                    .ui_state()
                    .await
                    .last_error
                    .map(|ui| ui.message().to_string())
                    .unwrap_or_else(|| err.user_message());
                bail!("submit failed: {shown}");
            }
            print_notice(&controller).await;
        }
        Command::Export(export) => {
            let dir = export.out.unwrap_or_else(|| settings.export_dir.clone());
            let trigger = ExportTrigger::new(service, dir);
            let handle = trigger.spawn(export.target.into(), export.filename);
            match handle.await.context("export task panicked")? {
                Ok(path) => println!("saved {}", path.display()),
                Err(err) => bail!("export failed: {}", UiError::from_export(&err).message()),
            }
        }
    }

    Ok(())
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

async fn print_notice(controller: &SyncController) {
    if let Some(notice) = controller.ui_state().await.notice {
        println!("{notice}");
    }
}

fn print_failures(report: &RefreshReport) {
    for (collection, message) in &report.failures {
        eprintln!("could not refresh {collection}: {message}");
    }
}
