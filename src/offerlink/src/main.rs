//! OfferLink — hierarchical selection and bulk-assignment engine for
//! partner offer catalogs.
//!
//! Demo console: loads the sample catalog and drives a full
//! select -> search -> reveal -> assign -> summarize session against the
//! mock executor.

use clap::Parser;
use offerlink_assignment::{AssignmentRegistry, MockExecutor, RunItem, RunOutcome};
use offerlink_catalog::sample::sample_catalog;
use offerlink_catalog::{filter_catalog, CatalogLoader, StaticLoader};
use offerlink_core::config::AppConfig;
use offerlink_core::event_bus;
use offerlink_selection::{project, ExpansionState, RevealState, SelectionModel};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "offerlink")]
#[command(about = "Hierarchical selection and bulk-assignment engine for offer catalogs")]
#[command(version)]
struct Cli {
    /// Product filter to assign
    #[arg(long, env = "OFFERLINK__FILTER_ID", default_value = "filter-123")]
    filter_id: String,

    /// Search query applied to the catalog before revealing
    #[arg(long)]
    query: Option<String>,

    /// Select every active promotion instead of one program
    #[arg(long, default_value_t = false)]
    select_all: bool,

    /// Mock executor failure rate (overrides config)
    #[arg(long, env = "OFFERLINK__EXECUTOR__FAILURE_RATE")]
    failure_rate: Option<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "offerlink=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(rate) = cli.failure_rate {
        config.executor.failure_rate = rate;
    }

    info!(
        node_id = %config.node_id,
        filter_id = %cli.filter_id,
        partners_per_page = config.reveal.partners_per_page,
        "OfferLink starting up"
    );

    // Load the catalog and seed the selection from existing links.
    let loader = StaticLoader::named(sample_catalog(), "sample");
    let catalog = Arc::new(loader.load()?);
    let sink = event_bus::capture_sink();
    let mut selection = SelectionModel::seeded_for_filter(Arc::clone(&catalog), &cli.filter_id)
        .with_event_sink(sink.clone());

    if cli.select_all {
        selection.select_all();
    } else if let Some(program) = catalog.find_program("prog1") {
        selection.toggle_program(program, true);
    }
    info!(selected = selection.selected_count(), "Selection prepared");

    // Apply the search, reveal page by page.
    let query = cli.query.as_deref().unwrap_or("");
    let filtered = filter_catalog(&catalog, query);
    let mut expansion = ExpansionState::new();
    if !query.trim().is_empty() {
        expansion.expand_matches(&filtered);
    }
    let reveal = RevealState::new(filtered.clone(), &config.reveal);
    let mut shown = 0;
    loop {
        let visible = reveal.visible_partners();
        for partner in &visible[shown..] {
            info!(
                partner = %partner.name,
                programs = partner.programs.len(),
                expanded = expansion.is_partner_expanded(&partner.id),
                "Visible partner"
            );
        }
        shown = visible.len();
        if !reveal.has_more() {
            break;
        }
        reveal.load_more().await;
    }

    // Run the bulk assignment.
    let executor = Arc::new(MockExecutor::new(&config.executor));
    let registry = AssignmentRegistry::new(executor, config.assignment.clone());
    let run = registry.begin_run(&cli.filter_id, sink.clone());

    let items: Vec<RunItem> = selection
        .selected_ids()
        .iter()
        .filter_map(|id| RunItem::from_catalog(&catalog, id))
        .collect();

    match run.start(items).await {
        RunOutcome::Completed(stats) if stats.failed == 0 => {
            info!(succeeded = stats.succeeded, "All assignments linked");
        }
        RunOutcome::Completed(stats) => {
            warn!(
                failed = stats.failed,
                succeeded = stats.succeeded,
                "Assignments failed, retrying the failed subset"
            );
            if let RunOutcome::Completed(after) = run.retry_failed().await {
                info!(
                    succeeded = after.succeeded,
                    failed = after.failed,
                    "Retry pass finished"
                );
            }
        }
        RunOutcome::Cancelled(stats) => {
            warn!(pending = stats.pending, "Run cancelled");
        }
        RunOutcome::AlreadyProcessing | RunOutcome::Empty => {
            warn!("Nothing to assign");
        }
    }

    // Final rollup.
    let summary = project(&catalog, selection.selected_set());
    info!(
        selected = summary.counts.selected_leaves,
        partners = summary.counts.partners_with_selection,
        programs = summary.counts.programs_with_selection,
        events = sink.count(),
        "Session summary"
    );
    for partner in &summary.catalog.partners {
        for program in &partner.programs {
            for pp in &program.promoted_programs {
                info!(
                    partner = %partner.name,
                    program = %program.name,
                    promotion = %pp.name,
                    "Linked promotion"
                );
            }
        }
    }

    Ok(())
}
