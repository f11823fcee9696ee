//! CLI binary for documental: maintain, search, import and export an
//! archival classification table.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use documental_core::cascade::{DeleteOutcome, preview_cascade};
use documental_core::config::DocumentalConfig;
use documental_core::kind::EntityKind;
use documental_core::model::{AnyRecord, FieldValue, RecordView, field_spec};
use documental_core::route::{RecordRef, TableRoute};
use documental_core::schema;
use documental_core::storage::{self, Store};
use documental_nav::filter::filter_records;
use documental_nav::lineage::Lineage;
use documental_nav::search::{SearchOptions, SearchResult, search_with_options};
use documental_sheets::export::{self, ExportOptions, cascade_sheets, default_headers};
use documental_sheets::tables::{ImportOptions, TableImportReport, import_hierarchy, import_table};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Parser)]
#[command(name = "documental", about = "Archival classification table manager")]
struct Cli {
    /// Project root directory (defaults to current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Print listings, records and reports as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store under .documental/
    Init,

    /// List the hierarchy levels with their record counts
    Tables,

    /// List the records of a table
    List {
        /// Table name, singular or plural (e.g. Fondos, Serie)
        table: String,

        /// Only children of this parent record
        #[arg(long)]
        parent: Option<String>,

        /// Keep records whose Codigo or Nombre contains this text
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Show one record with its lineage
    Show { table: String, id: String },

    /// Create a record
    Add {
        table: String,

        #[arg(long)]
        codigo: String,

        #[arg(long)]
        nombre: String,

        #[arg(long)]
        observacion: Option<String>,

        /// Id of the parent record (required below Fondo)
        #[arg(long)]
        parent: Option<String>,

        /// Extra field assignment, FIELD=VALUE (repeatable)
        #[arg(long = "set", value_name = "FIELD=VALUE")]
        assignments: Vec<String>,
    },

    /// Modify a record
    Edit {
        table: String,
        id: String,

        #[arg(long)]
        codigo: Option<String>,

        #[arg(long)]
        nombre: Option<String>,

        #[arg(long)]
        observacion: Option<String>,

        /// Move the record under another parent
        #[arg(long)]
        parent: Option<String>,

        #[arg(long = "set", value_name = "FIELD=VALUE")]
        assignments: Vec<String>,
    },

    /// Delete a record
    Delete {
        table: String,
        id: String,

        /// Also delete every descendant record
        #[arg(long)]
        cascade: bool,
    },

    /// Search the hierarchy by name
    Search {
        query: String,

        /// Highest level searched (defaults to search.top_level)
        #[arg(long)]
        top_level: Option<String>,

        /// Maximum number of results, 0 for no limit (defaults to search.result_limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Import a spreadsheet into a table, or `all` for a multi-sheet workbook
    Import {
        /// Table name, or `all`
        table: String,

        file: PathBuf,

        /// Sheet to read (defaults to import.default_sheet, then the first sheet)
        #[arg(long)]
        sheet: Option<String>,
    },

    /// Export a table to a spreadsheet
    Export {
        table: String,

        /// Export only this record (with --cascade: this subtree)
        #[arg(long)]
        id: Option<String>,

        /// One sheet per level from this table down to TipoDocumental
        #[arg(long)]
        cascade: bool,

        /// Output file (defaults to <Plural>_<timestamp>.xlsx in the project root)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Resolve a navigation route (e.g. "tableName=Series&parentId=…")
    Browse { route: String },

    /// List the configured digital formats
    Formats,

    /// Show store location, configuration and record counts
    Info,
}

fn get_project_root(cli: &Cli) -> Result<PathBuf> {
    match &cli.project {
        Some(p) => Ok(p.clone()),
        None => std::env::current_dir().context("failed to get current directory"),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let project_root = get_project_root(&cli)?;
    let json = cli.json;

    match cli.command {
        Commands::Init => cmd_init(&project_root),
        Commands::Tables => cmd_tables(&project_root, json),
        Commands::List {
            table,
            parent,
            filter,
        } => cmd_list(
            &project_root,
            &table,
            parent.as_deref(),
            filter.as_deref(),
            json,
        ),
        Commands::Show { table, id } => cmd_show(&project_root, &table, &id, json),
        Commands::Add {
            table,
            codigo,
            nombre,
            observacion,
            parent,
            assignments,
        } => {
            let edits = RecordEdits {
                codigo: Some(codigo),
                nombre: Some(nombre),
                observacion,
                parent,
                assignments,
            };
            cmd_add(&project_root, &table, edits, json)
        }
        Commands::Edit {
            table,
            id,
            codigo,
            nombre,
            observacion,
            parent,
            assignments,
        } => {
            let edits = RecordEdits {
                codigo,
                nombre,
                observacion,
                parent,
                assignments,
            };
            cmd_edit(&project_root, &table, &id, edits, json)
        }
        Commands::Delete { table, id, cascade } => cmd_delete(&project_root, &table, &id, cascade),
        Commands::Search {
            query,
            top_level,
            limit,
        } => cmd_search(&project_root, &query, top_level.as_deref(), limit, json),
        Commands::Import { table, file, sheet } => {
            cmd_import(&project_root, &table, &file, sheet, json)
        }
        Commands::Export {
            table,
            id,
            cascade,
            out,
        } => cmd_export(&project_root, &table, id.as_deref(), cascade, out),
        Commands::Browse { route } => cmd_browse(&project_root, &route, json),
        Commands::Formats => cmd_formats(&project_root, json),
        Commands::Info => cmd_info(&project_root),
    }
}

/// Open the project's store, refusing to create one outside `init`.
fn open_store(project_root: &Path, config: &DocumentalConfig) -> Result<Store> {
    let file_name = &config.storage.database_file;
    if !storage::db_exists(project_root, file_name) {
        bail!(
            "no store found at {}. Run `documental init` first.",
            storage::db_file(project_root, file_name).display()
        );
    }
    Store::open_project(project_root, file_name).context("failed to open store")
}

fn load(project_root: &Path) -> Result<(DocumentalConfig, Store)> {
    let config = DocumentalConfig::load(project_root)?;
    let store = open_store(project_root, &config)?;
    Ok((config, store))
}

fn parse_kind(table: &str) -> Result<EntityKind> {
    Ok(table.parse::<EntityKind>()?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_rows(records: &[AnyRecord]) {
    for r in records {
        println!("{:<38} {:<14} {}", r.id(), r.codigo(), r.nombre());
    }
}

/// Field changes collected from `add`/`edit` flags.
#[derive(Debug, Default)]
struct RecordEdits {
    codigo: Option<String>,
    nombre: Option<String>,
    observacion: Option<String>,
    parent: Option<String>,
    assignments: Vec<String>,
}

/// Split `FIELD=VALUE`. The value may itself contain `=`.
fn parse_assignment(raw: &str) -> Result<(&str, &str)> {
    let (field, value) = raw
        .split_once('=')
        .with_context(|| format!("expected FIELD=VALUE, got '{raw}'"))?;
    if field.trim().is_empty() {
        bail!("expected FIELD=VALUE, got '{raw}'");
    }
    Ok((field.trim(), value.trim()))
}

/// Apply flag edits to `record`, parsing typed fields from their text.
fn apply_edits(record: &mut AnyRecord, edits: RecordEdits) -> Result<()> {
    let kind = record.kind();
    for (field, value) in [
        ("Codigo", edits.codigo),
        ("Nombre", edits.nombre),
        ("Observacion", edits.observacion),
    ] {
        if let Some(value) = value {
            record.set(field, FieldValue::Text(value))?;
        }
    }
    if let Some(parent) = edits.parent {
        let key = kind
            .parent_key()
            .with_context(|| format!("{kind} is a root level and has no parent"))?;
        record.set(key, FieldValue::Text(parent))?;
    }
    for raw in &edits.assignments {
        let (field, value) = parse_assignment(raw)?;
        let spec = field_spec(record.field_specs(), field)
            .with_context(|| format!("{kind} has no field '{field}'"))?;
        if spec.name == "Id" {
            bail!("Id cannot be set with --set");
        }
        let parsed = FieldValue::parse(spec.ty, value)
            .with_context(|| format!("invalid value '{value}' for {}", spec.name))?;
        record.set(spec.name, parsed)?;
    }
    Ok(())
}

/// Warn when FormatoDigital is outside the configured catalog.
fn check_format(config: &DocumentalConfig, record: &AnyRecord) {
    let format = record.text("FormatoDigital");
    if format.is_empty() {
        return;
    }
    if !config
        .catalog
        .formatos_digitales
        .iter()
        .any(|f| f.eq_ignore_ascii_case(&format))
    {
        warn!(format = %format, "FormatoDigital is not in catalog.formatos_digitales");
    }
}

fn cmd_init(project_root: &Path) -> Result<()> {
    let config = DocumentalConfig::load(project_root)?;
    let path = storage::db_file(project_root, &config.storage.database_file);
    let existed = path.exists();
    Store::open(&path).context("failed to create store")?;
    if !storage::ensure_gitignore(project_root).context("failed to update .gitignore")? {
        eprintln!("Added .documental/ to .gitignore");
    }
    if existed {
        println!("Store already initialized at {}", path.display());
    } else {
        println!("Initialized store at {}", path.display());
    }
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct TableInfo {
    kind: EntityKind,
    table_name: &'static str,
    parent_key: Option<&'static str>,
    count: usize,
}

fn cmd_tables(project_root: &Path, json: bool) -> Result<()> {
    let (_, store) = load(project_root)?;
    let mut tables = Vec::new();
    for kind in EntityKind::ALL {
        tables.push(TableInfo {
            kind,
            table_name: kind.plural(),
            parent_key: kind.parent_key(),
            count: store.count(kind)?,
        });
    }
    if json {
        return print_json(&tables);
    }
    for t in &tables {
        println!(
            "{:<26} {:>6}  {}",
            t.table_name,
            t.count,
            t.parent_key.unwrap_or("-")
        );
    }
    Ok(())
}

fn cmd_list(
    project_root: &Path,
    table: &str,
    parent: Option<&str>,
    filter: Option<&str>,
    json: bool,
) -> Result<()> {
    let kind = parse_kind(table)?;
    let (_, store) = load(project_root)?;
    let route = match parent {
        Some(parent_id) => TableRoute::scoped(kind, parent_id)?,
        None => TableRoute::new(kind),
    };
    let records = filter_records(store.list_for_route(&route)?, filter.unwrap_or(""));

    if json {
        return print_json(&records);
    }
    if records.is_empty() {
        eprintln!("No {} found.", kind.plural());
        return Ok(());
    }
    print_rows(&records);
    eprintln!("{} record(s)", records.len());
    Ok(())
}

fn print_record(store: &Store, record: &AnyRecord, json: bool) -> Result<()> {
    let lineage = Lineage::resolve(store, record)?;
    if json {
        #[derive(Serialize)]
        #[serde(rename_all = "PascalCase")]
        struct Shown<'a> {
            record: &'a AnyRecord,
            codigo_completo: String,
        }
        return print_json(&Shown {
            record,
            codigo_completo: lineage.full_code(),
        });
    }

    let kind = record.kind();
    println!("{kind}");
    for spec in record.field_specs() {
        println!("  {:<20} {}", spec.name, record.text(spec.name));
    }
    println!("  {:<20} {}", "CodigoCompleto", lineage.full_code());
    for ancestor in kind.ancestors().into_iter().rev() {
        let name = lineage.name(ancestor);
        println!(
            "  {:<20} {}",
            ancestor.name(),
            if name.is_empty() { "(missing)" } else { name }
        );
    }
    if let Some(child) = kind.child() {
        let children = store.children_of(child, record.id())?;
        println!("  {:<20} {}", child.plural(), children.len());
    }
    Ok(())
}

fn cmd_show(project_root: &Path, table: &str, id: &str, json: bool) -> Result<()> {
    let kind = parse_kind(table)?;
    let (_, store) = load(project_root)?;
    let record = store
        .get_any(kind, id)?
        .with_context(|| format!("{kind} '{id}' not found"))?;
    print_record(&store, &record, json)
}

fn cmd_add(project_root: &Path, table: &str, edits: RecordEdits, json: bool) -> Result<()> {
    let kind = parse_kind(table)?;
    let (config, store) = load(project_root)?;
    let mut record = AnyRecord::empty(kind);
    apply_edits(&mut record, edits)?;
    check_format(&config, &record);
    store.insert_any(&mut record)?;
    if json {
        return print_json(&record);
    }
    println!("{}", record.id());
    Ok(())
}

fn cmd_edit(
    project_root: &Path,
    table: &str,
    id: &str,
    edits: RecordEdits,
    json: bool,
) -> Result<()> {
    let kind = parse_kind(table)?;
    let (config, store) = load(project_root)?;
    let mut record = store
        .get_any(kind, id)?
        .with_context(|| format!("{kind} '{id}' not found"))?;
    apply_edits(&mut record, edits)?;
    check_format(&config, &record);
    store.update_any(&record)?;
    if json {
        return print_json(&record);
    }
    println!("Updated {kind} '{id}'");
    Ok(())
}

fn cmd_delete(project_root: &Path, table: &str, id: &str, cascade: bool) -> Result<()> {
    let kind = parse_kind(table)?;
    let (_, store) = load(project_root)?;

    if !cascade && store.has_related_records(kind, id)? {
        let preview = preview_cascade(&store, kind, id)?;
        eprintln!("{kind} '{id}' has dependent records:");
        for (level, count) in &preview.counts {
            if *level != kind {
                eprintln!("  {:<26} {count}", level.plural());
            }
        }
        bail!(
            "refusing to delete {} record(s) without --cascade",
            preview.total()
        );
    }

    match store.delete_record(kind, id, cascade)? {
        DeleteOutcome::Deleted => println!("Deleted {kind} '{id}'"),
        DeleteOutcome::NotFound => println!("{kind} '{id}' not found; nothing to delete"),
        DeleteOutcome::Cascaded(report) => {
            println!("Deleted {} record(s):", report.len());
            for level in EntityKind::ALL {
                let n = report.count_of(level);
                if n > 0 {
                    println!("  {:<26} {n}", level.plural());
                }
            }
        }
    }
    Ok(())
}

fn cmd_search(
    project_root: &Path,
    query: &str,
    top_level: Option<&str>,
    limit: Option<usize>,
    json: bool,
) -> Result<()> {
    let (config, store) = load(project_root)?;
    let top_level = match top_level {
        Some(raw) => parse_kind(raw)?,
        None => config.search.top_level_kind()?,
    };
    let options = SearchOptions {
        top_level,
        limit: limit.unwrap_or(config.search.result_limit),
    };
    let results = search_with_options(&store, query, &options)?;

    if json {
        return print_json(&results);
    }
    if results.is_empty() {
        eprintln!("No results for '{query}'.");
        return Ok(());
    }
    for r in &results {
        print_result(r);
    }
    eprintln!("{} result(s)", results.len());
    Ok(())
}

fn print_result(r: &SearchResult) {
    let path: Vec<&str> = EntityKind::ALL
        .into_iter()
        .map(|k| r.name_at(k))
        .filter(|n| !n.is_empty())
        .collect();
    let matched = r.matched.map(EntityKind::name).unwrap_or("-");
    println!("{:<32} [{matched}] {}", r.codigo_completo, path.join(" / "));
    if !r.subserie.is_empty() {
        let d = &r.disposition;
        println!(
            "{:<32} AG {} / AC {}{}{}{}",
            "",
            d.ag,
            d.ac,
            if d.conservacion_total { " CT" } else { "" },
            if d.eliminacion { " E" } else { "" },
            if d.seleccion { " S" } else { "" },
        );
    }
}

fn print_import_report(report: &TableImportReport) {
    println!(
        "{}: {} detected, {} inserted, {} duplicate(s), {} error(s)",
        report.kind.plural(),
        report.detected,
        report.inserted,
        report.duplicates.len(),
        report.errors.len()
    );
    for err in &report.errors {
        println!("  {err}");
    }
}

fn cmd_import(
    project_root: &Path,
    table: &str,
    file: &Path,
    sheet: Option<String>,
    json: bool,
) -> Result<()> {
    let (config, store) = load(project_root)?;

    let reports = if table.eq_ignore_ascii_case("all") {
        import_hierarchy(&store, file)
            .with_context(|| format!("failed to import {}", file.display()))?
    } else {
        let kind = parse_kind(table)?;
        let options = ImportOptions {
            sheet: sheet.or(config.import.default_sheet),
        };
        vec![import_table(&store, kind, file, &options)]
    };

    if json {
        print_json(&reports)?;
    } else {
        for report in &reports {
            print_import_report(report);
        }
    }
    if reports.iter().any(TableImportReport::is_aborted) {
        bail!("import aborted");
    }
    Ok(())
}

/// Default export path: `<Plural>_<timestamp>.xlsx` in the project root.
fn default_export_path(
    project_root: &Path,
    config: &DocumentalConfig,
    kind: EntityKind,
) -> Result<PathBuf> {
    let now = chrono::Local::now().naive_local();
    let name = export::export_file_name_with(kind, &now, &config.export.timestamp_format)?;
    Ok(project_root.join(name))
}

fn cmd_export(
    project_root: &Path,
    table: &str,
    id: Option<&str>,
    cascade: bool,
    out: Option<PathBuf>,
) -> Result<()> {
    let kind = parse_kind(table)?;
    let (config, store) = load(project_root)?;
    let options = ExportOptions::from(&config.export);
    let path = match out {
        Some(path) => path,
        None => default_export_path(project_root, &config, kind)?,
    };

    if let Some(id) = id
        && !store.exists_by_id(kind, id)?
    {
        bail!("{kind} '{id}' not found");
    }

    if cascade {
        let sheets = cascade_sheets(&store, kind, id)?;
        export::export_multiple(&sheets, &path, &options)?;
        let rows: usize = sheets.iter().map(|s| s.records.len()).sum();
        println!(
            "Exported {rows} record(s) in {} sheet(s) to {}",
            sheets.len(),
            path.display()
        );
        return Ok(());
    }

    let records = match id {
        Some(id) => store.get_any(kind, id)?.into_iter().collect(),
        None => store.get_all_kind(kind)?,
    };
    export::export(&records, &path, &default_headers(kind), &options)?;
    println!("Exported {} record(s) to {}", records.len(), path.display());
    Ok(())
}

fn cmd_browse(project_root: &Path, raw: &str, json: bool) -> Result<()> {
    let route = TableRoute::parse(raw)?;
    let (_, store) = load(project_root)?;

    match &route.record {
        Some(RecordRef::Existing(id)) => {
            let record = store
                .get_any(route.kind, id)?
                .with_context(|| format!("{} '{id}' not found", route.kind))?;
            print_record(&store, &record, json)
        }
        Some(RecordRef::New) => {
            let mut template = AnyRecord::empty(route.kind);
            if let (Some(scope), Some(key)) = (&route.parent, route.kind.parent_key()) {
                template.set(key, FieldValue::Text(scope.parent_id.clone()))?;
            }
            if json {
                return print_json(&template);
            }
            println!("New {}", route.kind);
            for spec in template.field_specs() {
                println!("  {:<20} {}", spec.name, template.text(spec.name));
            }
            Ok(())
        }
        None => {
            let records = store.list_for_route(&route)?;
            if json {
                return print_json(&records);
            }
            println!("{route}");
            print_rows(&records);
            Ok(())
        }
    }
}

fn cmd_formats(project_root: &Path, json: bool) -> Result<()> {
    let config = DocumentalConfig::load(project_root)?;
    let formats = &config.catalog.formatos_digitales;
    if json {
        return print_json(formats);
    }
    for f in formats {
        println!("{f}");
    }
    Ok(())
}

fn cmd_info(project_root: &Path) -> Result<()> {
    let config = DocumentalConfig::load(project_root)?;
    if !storage::db_exists(project_root, &config.storage.database_file) {
        eprintln!("No store found. Run `documental init` first.");
        return Ok(());
    }
    let store = open_store(project_root, &config)?;

    println!(
        "Store: {}",
        storage::db_file(project_root, &config.storage.database_file).display()
    );
    println!("Schema version: {}", schema::CURRENT_VERSION);
    println!();
    let mut total = 0;
    for kind in EntityKind::ALL {
        let n = store.count(kind)?;
        total += n;
        println!("{:<26} {n}", kind.plural());
    }
    println!("{:<26} {total}", "Total");
    println!();
    println!("Search top level: {}", config.search.top_level);
    println!(
        "Search limit: {}",
        match config.search.result_limit {
            0 => "unlimited".to_string(),
            n => n.to_string(),
        }
    );
    println!("Export sheet: {}", config.export.sheet_name);
    if let Some(sheet) = &config.import.default_sheet {
        println!("Import sheet: {sheet}");
    }
    Ok(())
}
