use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::de::DeserializeOwned;
use serde_json::Value;

use ecole_desk::client::{self, ApiClient, ApiRequest, Backend, HttpMethod};
use ecole_desk::collection::LoadOutcome;
use ecole_desk::config::Config;
use ecole_desk::export::{CellValue, ExportFormat, Exportable};
use ecole_desk::filter::Selection;
use ecole_desk::form::{self, EnrollmentCatalog, EnrollmentForm};
use ecole_desk::logging::{init_logging, LogConfig, LogFormat};
use ecole_desk::models::{
    Eleve, Facture, Filiere, Formateur, Module, Paiement, Parent, Quittance, Rapport, RecordId,
    Vague,
};
use ecole_desk::notify::{ConsoleNotifier, Notifier};
use ecole_desk::page::Page;
use ecole_desk::resources::{self, RecordAction, Resource, ResourceKind, Role};
use ecole_desk::sort::{SortDirection, SortState};
use ecole_desk::summary;
use ecole_desk::DeskError;

#[derive(Parser)]
#[command(name = "ecole-desk", version)]
#[command(about = "School dashboard console: lists, exports and record management", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[arg(long, value_enum, default_value = "pretty", global = true)]
    log_format: LogFormatArg,

    /// Append logs to a file instead of stderr.
    #[arg(long, value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    /// Configuration file (default: platform config dir).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Act as this role instead of the configured one.
    #[arg(long, global = true)]
    role: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Pdf,
    Xlsx,
    Csv,
}

impl From<FormatArg> for ExportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Pdf => Self::Pdf,
            FormatArg::Xlsx => Self::Xlsx,
            FormatArg::Csv => Self::Csv,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ActionArg {
    Approve,
    Reject,
    Send,
    Cancel,
    ToggleStatus,
}

impl From<ActionArg> for RecordAction {
    fn from(value: ActionArg) -> Self {
        match value {
            ActionArg::Approve => Self::Approve,
            ActionArg::Reject => Self::Reject,
            ActionArg::Send => Self::Send,
            ActionArg::Cancel => Self::Cancel,
            ActionArg::ToggleStatus => Self::ToggleStatus,
        }
    }
}

#[derive(Args, Clone, Default)]
struct FilterArgs {
    /// Case-insensitive text search.
    #[arg(long)]
    search: Option<String>,
    /// Category filter, e.g. `--where statut=generee` (`all` disables it).
    #[arg(long = "where", value_name = "KEY=VALUE")]
    filters: Vec<String>,
    /// Sort column.
    #[arg(long)]
    sort: Option<String>,
    /// Sort descending.
    #[arg(long)]
    desc: bool,
}

#[derive(Args)]
#[command(group(ArgGroup::new("body").args(["data", "file"]).required(true)))]
struct BodyArgs {
    /// JSON body.
    #[arg(long)]
    data: Option<String>,
    /// Path to a JSON file.
    #[arg(long)]
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the resources available to each role
    Resources,
    /// Load, filter, sort and print a resource
    List {
        resource: String,
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Export the filtered list as PDF, Excel or CSV
    Export {
        resource: String,
        #[arg(long, value_enum)]
        format: FormatArg,
        #[command(flatten)]
        filters: FilterArgs,
        /// Output directory (default: configured export_dir).
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Count records by category
    Summary {
        resource: String,
        /// Grouping field (default: the resource's main category).
        #[arg(long)]
        by: Option<String>,
        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Show backend-computed statistics
    Stats { resource: String },
    /// Create a record
    Create {
        resource: String,
        #[command(flatten)]
        body: BodyArgs,
    },
    /// Update a record
    Update {
        resource: String,
        #[arg(long)]
        id: String,
        #[command(flatten)]
        body: BodyArgs,
    },
    /// Delete a record
    Delete {
        resource: String,
        #[arg(long)]
        id: String,
    },
    /// Run an inline action (approve, reject, send, cancel, toggle-status)
    Action {
        resource: String,
        #[arg(long)]
        id: String,
        #[arg(long, value_enum)]
        name: ActionArg,
    },
    /// Assign a formateur and a vague to a module of a filière
    Enroll {
        #[arg(long)]
        filiere: String,
        #[arg(long)]
        module: String,
        #[arg(long)]
        formateur: String,
        #[arg(long)]
        vague: String,
    },
}

/// Runs `$body` with `$T` bound to the record type of `$kind`.
macro_rules! with_record_type {
    ($kind:expr, $T:ident => $body:expr) => {
        match $kind {
            ResourceKind::Parents => {
                type $T = Parent;
                $body
            }
            ResourceKind::Eleves => {
                type $T = Eleve;
                $body
            }
            ResourceKind::Formateurs => {
                type $T = Formateur;
                $body
            }
            ResourceKind::Filieres => {
                type $T = Filiere;
                $body
            }
            ResourceKind::Modules => {
                type $T = Module;
                $body
            }
            ResourceKind::Vagues => {
                type $T = Vague;
                $body
            }
            ResourceKind::Paiements => {
                type $T = Paiement;
                $body
            }
            ResourceKind::Factures => {
                type $T = Facture;
                $body
            }
            ResourceKind::Quittances => {
                type $T = Quittance;
                $body
            }
            ResourceKind::Rapports => {
                type $T = Rapport;
                $body
            }
        }
    };
}

struct Session {
    config: Config,
    role: Role,
    backend: ApiClient,
    notifier: ConsoleNotifier,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut log_config = LogConfig::from_verbosity(cli.verbose);
    log_config.format = match cli.log_format {
        LogFormatArg::Pretty => LogFormat::Pretty,
        LogFormatArg::Compact => LogFormat::Compact,
        LogFormatArg::Json => LogFormat::Json,
    };
    log_config.with_ansi = cli.log_file.is_none() && io::stderr().is_terminal();
    log_config.log_file = cli.log_file.clone();
    if let Err(error) = init_logging(&log_config) {
        eprintln!("error: failed to initialize logging: {error}");
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            match error.downcast_ref::<DeskError>() {
                Some(desk) => {
                    eprintln!("error: {}", desk.user_message());
                    eprintln!("  {desk}");
                    if desk.is_retryable() {
                        eprintln!("hint: the same command can be re-run once the server is reachable.");
                    }
                }
                None => eprintln!("error: {error:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::load(cli.config.as_deref())?;
    let role = match cli.role.as_deref() {
        Some(role) => role.parse::<Role>()?,
        None => config.role,
    };
    let backend = ApiClient::new(&config.base_url, config.token.as_deref(), config.timeout())?;
    let ctx = Session {
        config,
        role,
        backend,
        notifier: ConsoleNotifier::default(),
    };

    match cli.command {
        Commands::Resources => {
            print_registry();
            Ok(())
        }
        Commands::List {
            resource,
            filters,
            limit,
        } => {
            let resource = resources::find(ctx.role, &resource)?;
            with_record_type!(resource.kind, T => list::<T>(&ctx, resource, &filters, limit).await)
        }
        Commands::Export {
            resource,
            format,
            filters,
            out_dir,
        } => {
            let resource = resources::find(ctx.role, &resource)?;
            let dir = out_dir.unwrap_or_else(|| ctx.config.export_dir.clone());
            with_record_type!(resource.kind, T => {
                export::<T>(&ctx, resource, &filters, format.into(), &dir).await
            })
        }
        Commands::Summary {
            resource,
            by,
            filters,
        } => {
            let resource = resources::find(ctx.role, &resource)?;
            let key = by.unwrap_or_else(|| resource.group_by.to_string());
            with_record_type!(resource.kind, T => {
                summarize::<T>(&ctx, resource, &filters, &key).await
            })
        }
        Commands::Stats { resource } => {
            let resource = resources::find(ctx.role, &resource)?;
            let stats = client::fetch_stats(&ctx.backend, resource).await?;
            let mut table = styled_table(vec!["Indicateur", "Valeur"]);
            for (key, value) in &stats.0 {
                let shown = match value {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                };
                table.add_row(vec![Cell::new(key), Cell::new(shown)]);
            }
            println!("{table}");
            Ok(())
        }
        Commands::Create { resource, body } => {
            let resource = resources::find(ctx.role, &resource)?;
            let draft = read_body(&body)?;
            with_record_type!(resource.kind, T => create::<T>(&ctx, resource, &draft).await)
        }
        Commands::Update { resource, id, body } => {
            let resource = resources::find(ctx.role, &resource)?;
            let draft = read_body(&body)?;
            let id = RecordId(id);
            with_record_type!(resource.kind, T => update::<T>(&ctx, resource, &id, &draft).await)
        }
        Commands::Delete { resource, id } => {
            let resource = resources::find(ctx.role, &resource)?;
            let id = RecordId(id);
            with_record_type!(resource.kind, T => delete::<T>(&ctx, resource, &id).await)
        }
        Commands::Action { resource, id, name } => {
            let resource = resources::find(ctx.role, &resource)?;
            let id = RecordId(id);
            with_record_type!(resource.kind, T => {
                act::<T>(&ctx, resource, &id, name.into()).await
            })
        }
        Commands::Enroll {
            filiere,
            module,
            formateur,
            vague,
        } => enroll(&ctx, &filiere, &module, &formateur, &vague).await,
    }
}

fn apply_filters<T: Exportable + Clone + DeserializeOwned>(
    page: &mut Page<T>,
    args: &FilterArgs,
) -> anyhow::Result<()> {
    let resource = page.resource();
    if let Some(search) = &args.search {
        page.criteria.search = search.clone();
    }
    for raw in &args.filters {
        let Some((key, value)) = raw.split_once('=') else {
            bail!("invalid filter {raw:?}, expected KEY=VALUE");
        };
        let key = key.trim();
        if !resource.filter_keys.iter().any(|k| *k == key) {
            bail!(
                "{} cannot be filtered by {key:?} (available: {})",
                resource.name,
                resource.filter_keys.join(", ")
            );
        }
        page.criteria
            .categories
            .insert(key.to_string(), Selection::parse(value));
    }
    if let Some(key) = &args.sort {
        page.sort = SortState::by(key.as_str(), SortDirection::Ascending);
    }
    if args.desc {
        page.sort.direction = SortDirection::Descending;
    }
    Ok(())
}

async fn load_page<T: Exportable + Clone + DeserializeOwned>(
    ctx: &Session,
    resource: &'static Resource,
    args: &FilterArgs,
) -> anyhow::Result<Page<T>> {
    let mut page = Page::<T>::new(resource);
    apply_filters(&mut page, args)?;
    if page.refresh(&ctx.backend).await == LoadOutcome::Failed {
        let message = page.collection.error().unwrap_or_default();
        bail!("could not load {}: {message}", resource.name);
    }
    Ok(page)
}

async fn list<T: Exportable + Clone + DeserializeOwned>(
    ctx: &Session,
    resource: &'static Resource,
    args: &FilterArgs,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let page = load_page::<T>(ctx, resource, args).await?;
    let visible = page.visible();
    let columns = T::columns();

    let mut table = styled_table(columns.iter().map(|c| c.header).collect());
    for record in visible.iter().take(limit.unwrap_or(usize::MAX)) {
        table.add_row(
            columns
                .iter()
                .map(|column| match (column.value)(record) {
                    CellValue::Number(value) => {
                        Cell::new(CellValue::Number(value)).set_alignment(CellAlignment::Right)
                    }
                    text => Cell::new(text),
                })
                .collect::<Vec<_>>(),
        );
    }

    println!("{}", resource.title);
    println!("{table}");
    println!(
        "{} of {} record(s) shown.",
        visible.len().min(limit.unwrap_or(usize::MAX)),
        page.collection.items().len()
    );
    if let Some(total) = summary::total_amount(&visible) {
        println!("Total: {}", ecole_desk::export::columns::format_amount(total));
    }
    Ok(())
}

async fn export<T: Exportable + Clone + DeserializeOwned>(
    ctx: &Session,
    resource: &'static Resource,
    args: &FilterArgs,
    format: ExportFormat,
    dir: &Path,
) -> anyhow::Result<()> {
    let page = load_page::<T>(ctx, resource, args).await?;
    let today = chrono::Local::now().date_naive();
    let document = page.export(format, today, &ctx.notifier)?;
    let path = document
        .write_to(dir)
        .with_context(|| format!("failed to write export to {}", dir.display()))?;
    println!("Export written to {}.", path.display());
    Ok(())
}

async fn summarize<T: Exportable + Clone + DeserializeOwned>(
    ctx: &Session,
    resource: &'static Resource,
    args: &FilterArgs,
    key: &str,
) -> anyhow::Result<()> {
    let page = load_page::<T>(ctx, resource, args).await?;
    let summaries = page.summary(key);
    if summaries.is_empty() {
        println!("No records found for this selection.");
        return Ok(());
    }

    let with_amounts = summaries.iter().any(|s| s.amount_total.is_some());
    let mut headers = vec![key, "Nombre"];
    if with_amounts {
        headers.push("Montant");
    }
    let mut table = styled_table(headers);
    for entry in &summaries {
        let mut row = vec![
            Cell::new(&entry.value),
            Cell::new(entry.count).set_alignment(CellAlignment::Right),
        ];
        if with_amounts {
            let amount = entry
                .amount_total
                .map(ecole_desk::export::columns::format_amount)
                .unwrap_or_default();
            row.push(Cell::new(amount).set_alignment(CellAlignment::Right));
        }
        table.add_row(row);
    }
    println!("{}", resource.title);
    println!("{table}");
    tracing::debug!(summary = %summary::describe(&summaries), "summary computed");
    Ok(())
}

async fn create<T: Exportable + Clone + DeserializeOwned>(
    ctx: &Session,
    resource: &'static Resource,
    draft: &Value,
) -> anyhow::Result<()> {
    let mut page = Page::<T>::new(resource);
    let created = page.collection.create(&ctx.backend, draft).await?;
    ctx.notifier
        .success(&format!("Enregistrement {} créé.", created.id()));
    finish_mutation(ctx, &mut page).await;
    Ok(())
}

async fn update<T: Exportable + Clone + DeserializeOwned>(
    ctx: &Session,
    resource: &'static Resource,
    id: &RecordId,
    draft: &Value,
) -> anyhow::Result<()> {
    let mut page = Page::<T>::new(resource);
    page.collection.update(&ctx.backend, id, draft).await?;
    ctx.notifier.success(&format!("Enregistrement {id} mis à jour."));
    finish_mutation(ctx, &mut page).await;
    Ok(())
}

async fn delete<T: Exportable + Clone + DeserializeOwned>(
    ctx: &Session,
    resource: &'static Resource,
    id: &RecordId,
) -> anyhow::Result<()> {
    let mut page = Page::<T>::new(resource);
    page.collection.delete(&ctx.backend, id).await?;
    ctx.notifier.success(&format!("Enregistrement {id} supprimé."));
    finish_mutation(ctx, &mut page).await;
    Ok(())
}

async fn act<T: Exportable + Clone + DeserializeOwned>(
    ctx: &Session,
    resource: &'static Resource,
    id: &RecordId,
    action: RecordAction,
) -> anyhow::Result<()> {
    let mut page = Page::<T>::new(resource);
    page.collection.act(&ctx.backend, id, action).await?;
    ctx.notifier.success(&format!("Action {action} appliquée à {id}."));
    finish_mutation(ctx, &mut page).await;
    Ok(())
}

/// Background resync after a local patch, when enabled.
async fn finish_mutation<T: Exportable + Clone + DeserializeOwned>(ctx: &Session, page: &mut Page<T>) {
    if !ctx.config.resync_after_mutation {
        return;
    }
    match page.resync_if_needed(&ctx.backend).await {
        Some(LoadOutcome::Applied(count)) => {
            println!("{} now holds {count} record(s).", page.resource().name);
        }
        Some(LoadOutcome::Failed) => {
            if let Some(message) = page.collection.error() {
                ctx.notifier.error(message);
            }
        }
        _ => {}
    }
}

async fn enroll(
    ctx: &Session,
    filiere: &str,
    module: &str,
    formateur: &str,
    vague: &str,
) -> anyhow::Result<()> {
    if ctx.role != Role::Admin {
        return Err(DeskError::Forbidden {
            expected: Role::Admin.to_string(),
            actual: ctx.role.to_string(),
        }
        .into());
    }

    let catalog = EnrollmentCatalog {
        filieres: fetch_all(ctx, "filieres").await?,
        modules: fetch_all(ctx, "modules").await?,
        formateurs: fetch_all(ctx, "formateurs").await?,
        vagues: fetch_all(ctx, "vagues").await?,
    };

    let mut assignment = EnrollmentForm::new(catalog);
    assignment.select(form::FILIERE, filiere)?;
    assignment.select(form::MODULE, module)?;
    assignment.select(form::VAGUE, vague)?;
    assignment.select(form::FORMATEUR, formateur)?;
    assignment.validate()?;

    let request = ApiRequest::with_body(
        HttpMethod::Post,
        format!("/api/{}/affectations", Role::Admin),
        assignment.to_json(),
    );
    ctx.backend.execute(request).await?;
    ctx.notifier.success("Affectation enregistrée.");
    Ok(())
}

async fn fetch_all<T: DeserializeOwned>(ctx: &Session, name: &str) -> anyhow::Result<Vec<T>> {
    let resource = resources::find(ctx.role, name)?;
    let items = client::fetch_list(&ctx.backend, resource, &Default::default())
        .await
        .with_context(|| format!("failed to load {name}"))?;
    Ok(items)
}

fn read_body(args: &BodyArgs) -> anyhow::Result<Value> {
    let text = match (&args.data, &args.file) {
        (Some(data), _) => data.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => bail!("either --data or --file is required"),
    };
    let value: Value = serde_json::from_str(&text).context("body is not valid JSON")?;
    if !value.is_object() {
        bail!("body must be a JSON object");
    }
    Ok(value)
}

fn styled_table(headers: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .into_iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold).fg(Color::Cyan))
                .collect::<Vec<_>>(),
        );
    table
}

fn print_registry() {
    let mut table = styled_table(vec!["Rôle", "Ressource", "Chemin", "Filtres", "Actions"]);
    for role in Role::ALL {
        for resource in resources::for_role(role) {
            let actions: Vec<&str> = resource.actions.iter().map(|a| a.as_str()).collect();
            table.add_row(vec![
                Cell::new(role),
                Cell::new(resource.name),
                Cell::new(resource.path()),
                Cell::new(resource.filter_keys.join(", ")),
                Cell::new(actions.join(", ")),
            ]);
        }
    }
    println!("{table}");
}
