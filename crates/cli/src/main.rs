use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use ledger_core::domain::template::{EntryInput, TemplateRow, TransactionKind};
use ledger_core::projection::{expand_with, ExpandOptions, MonthView};
use ledger_core::service::BudgetService;
use ledger_core::storage::PgTemplateStore;
use ledger_core::time::calendar::{self, YearMonth};
use rust_decimal::Decimal;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "ledger_cli")]
struct Args {
    /// Owner whose entries are read or written.
    #[arg(long, global = true, default_value_t = 1)]
    owner: i64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply database migrations.
    Migrate,
    /// Record a new one-time or recurring entry.
    Add(EntryArgs),
    /// List stored entries with their ids.
    List,
    /// Replace an existing entry.
    Edit {
        id: i64,
        #[command(flatten)]
        entry: EntryArgs,
    },
    /// Delete an entry by id.
    Delete { id: i64 },
    /// Show the projected occurrences for one month.
    Project {
        /// Month to show (YYYY-MM). Defaults to the month of --today.
        #[arg(long)]
        month: Option<YearMonth>,

        /// Reference date (YYYY-MM-DD). Defaults to the local date.
        #[arg(long)]
        today: Option<String>,

        /// Read template rows from a JSON file instead of the database.
        #[arg(long)]
        from_file: Option<PathBuf>,
    },
}

#[derive(Debug, ClapArgs)]
struct EntryArgs {
    #[arg(long)]
    description: String,

    /// Magnitude; the sign is taken from --kind.
    #[arg(long, allow_hyphen_values = true)]
    amount: Decimal,

    #[arg(long, default_value = "debit")]
    kind: TransactionKind,

    /// one-time, weekly, monthly, quarterly or yearly.
    #[arg(long, default_value = "one-time")]
    frequency: String,

    /// First occurrence (YYYY-MM-DD).
    #[arg(long)]
    date: String,
}

impl From<EntryArgs> for EntryInput {
    fn from(a: EntryArgs) -> Self {
        EntryInput {
            description: a.description,
            amount: a.amount,
            kind: a.kind,
            frequency: a.frequency,
            date: a.date,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Parsed first so --help and usage errors never depend on the environment.
    let args = Args::parse();

    let settings = ledger_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let result = run(args, &settings).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
    }
    result
}

async fn run(args: Args, settings: &ledger_core::config::Settings) -> anyhow::Result<()> {
    if let Command::Project {
        month,
        today,
        from_file: Some(path),
    } = &args.command
    {
        let today = resolve_today(today.as_deref())?;
        let view = project_from_file(path, *month, today, &settings.expand_options())?;
        print!("{}", render_month(&view));
        return Ok(());
    }

    let db_url = settings.require_database_url()?;
    let pool = ledger_core::storage::connect(db_url, settings.db_max_connections).await?;
    ledger_core::storage::migrate(&pool).await?;

    let service = BudgetService::new(PgTemplateStore::new(pool), settings.expand_options());
    let owner = args.owner;

    match args.command {
        Command::Migrate => {
            tracing::info!("migrations applied");
        }
        Command::Add(entry) => {
            let id = service.add_entry(owner, entry.into()).await?;
            println!("{id}");
        }
        Command::List => {
            for e in service.entries(owner).await? {
                println!(
                    "{:>6}  {:<10}  {:<10}  {:>12}  {}",
                    e.id,
                    e.row.start_date,
                    e.row.frequency.as_deref().unwrap_or("-"),
                    e.row.amount,
                    e.row.description
                );
            }
        }
        Command::Edit { id, entry } => {
            let updated = service.edit_entry(id, entry.into()).await?;
            anyhow::ensure!(updated, "no budget entry with id {id}");
        }
        Command::Delete { id } => {
            let removed = service.remove_entry(id).await?;
            anyhow::ensure!(removed, "no budget entry with id {id}");
        }
        Command::Project { month, today, .. } => {
            let today = resolve_today(today.as_deref())?;
            let view = service.month_view(owner, month, today).await?;
            print!("{}", render_month(&view));
        }
    }

    Ok(())
}

fn project_from_file(
    path: &Path,
    month: Option<YearMonth>,
    today: chrono::NaiveDate,
    opts: &ExpandOptions,
) -> anyhow::Result<MonthView> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("read {} failed", path.display()))?;
    let rows: Vec<TemplateRow> = serde_json::from_str(&raw)
        .with_context(|| format!("parse template rows from {} failed", path.display()))?;

    let occurrences = expand_with(&rows, today, opts)?;
    Ok(MonthView::for_selection(occurrences, month, today))
}

fn resolve_today(arg: Option<&str>) -> anyhow::Result<chrono::NaiveDate> {
    match arg {
        Some(s) => calendar::parse_date(s),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

fn render_month(view: &MonthView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", view.month);
    for row in &view.rows {
        let o = &row.occurrence;
        let _ = writeln!(
            out,
            "{}  {:>12}  {:>12}  {}",
            o.date, o.amount, row.running_total, o.description
        );
    }
    let _ = writeln!(out, "total {}", view.total);
    out
}

fn init_sentry(settings: &ledger_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
