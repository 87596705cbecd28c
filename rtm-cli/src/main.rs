mod cli;
mod prompts;

use anyhow::{bail, Context, Result};
use clap::Parser;
use colored::Colorize;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use rtm_core::{
    get_config_path, load_reference_sets, write_template, FieldTier, HttpApiClient, ImportConfig,
    ImportSession, ReferenceSet, SubmissionOutcome, TargetField, ValidationReport,
};

use crate::cli::{Cli, Command, ConfigCommand};

/// Rows listed individually before the summary is truncated
const MAX_ROWS_SHOWN: usize = 25;

fn setup_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        _ => log::LevelFilter::Debug,
    };
    // RUST_LOG still wins when set
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init()?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => get_config_path()?,
    };

    match &cli.command {
        Command::Import {
            file,
            partial,
            mappings,
            interactive,
            dry_run,
            report,
            offline,
            yes,
        } => {
            let config = ImportConfig::load_or_default(&config_path)?;
            let options = ImportOptions {
                partial: *partial || config.defaults.allow_partial,
                mappings,
                interactive: *interactive,
                dry_run: *dry_run,
                report: report.as_deref(),
                offline: *offline,
                yes: *yes,
            };
            import_file(&config, file, &options)?;
        }
        Command::Infer { file } => {
            let session = read_file(ImportSession::new(ReferenceSet::new()), file)?;
            print_mapping(&session);
        }
        Command::Validate {
            file,
            partial,
            mappings,
            offline,
            report,
        } => {
            let config = ImportConfig::load_or_default(&config_path)?;
            validate_file(
                &config,
                file,
                *partial || config.defaults.allow_partial,
                mappings,
                *offline,
                report.as_deref(),
            )?;
        }
        Command::Template {
            format,
            output,
            no_sample,
            offline,
        } => {
            let config = ImportConfig::load_or_default(&config_path)?;
            let format = format.unwrap_or(config.defaults.template_format);
            let output = output.clone().unwrap_or_else(|| {
                PathBuf::from(format!("rtm-import-template.{}", format.extension()))
            });
            let references = reference_data(&config, *offline);
            write_template(&output, format, &references, !*no_sample)?;
            println!(
                "{} Template written to {}",
                "✓".green(),
                output.display().to_string().cyan()
            );
        }
        Command::Fields => {
            list_fields();
        }
        Command::Config(config_cmd) => {
            handle_config_command(config_cmd, &config_path)?;
        }
    }

    Ok(())
}

struct ImportOptions<'a> {
    partial: bool,
    mappings: &'a [String],
    interactive: bool,
    dry_run: bool,
    report: Option<&'a Path>,
    offline: bool,
    yes: bool,
}

fn connect(config: &ImportConfig) -> Result<HttpApiClient> {
    HttpApiClient::from_config(&config.api)
        .context("Cannot reach the requirements service; set it with `rtm config set-url <URL>`")
}

/// Reference lists for validation and templates; an unconfigured service
/// degrades to no referential checks
fn reference_data(config: &ImportConfig, offline: bool) -> ReferenceSet {
    if offline {
        return ReferenceSet::new();
    }
    match HttpApiClient::from_config(&config.api) {
        Ok(client) => load_reference_sets(&client),
        Err(e) => {
            warn!("Reference data unavailable: {}", e);
            eprintln!(
                "{} Reference data unavailable ({}); referential checks skipped",
                "!".yellow(),
                e
            );
            ReferenceSet::new()
        }
    }
}

fn read_file(session: ImportSession, file: &Path) -> Result<ImportSession> {
    let bytes = fs::read(file).with_context(|| format!("Failed to read {:?}", file))?;
    let name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    Ok(session.upload(name, &bytes)?)
}

/// Apply `HEADER=FIELD` overrides on top of the inferred mapping
fn apply_overrides(mut session: ImportSession, overrides: &[String]) -> Result<ImportSession> {
    for spec in overrides {
        let Some((header, field)) = spec.split_once('=') else {
            bail!("Invalid mapping '{}'. Use HEADER=FIELD.", spec);
        };
        let field = match field.trim() {
            "" | "none" | "-" => None,
            id => match TargetField::from_id(id) {
                Some(f) => Some(f),
                None => bail!("Unknown field '{}'. Run `rtm fields` for the list.", id),
            },
        };
        session = session.set_mapping(header.trim(), field)?;
    }
    Ok(session)
}

fn prepare_session(
    references: ReferenceSet,
    file: &Path,
    partial: bool,
    overrides: &[String],
) -> Result<ImportSession> {
    let session = read_file(ImportSession::new(references), file)?;
    let session = session.set_allow_partial(partial)?;
    apply_overrides(session, overrides)
}

fn import_file(config: &ImportConfig, file: &Path, options: &ImportOptions) -> Result<()> {
    // a dry run never submits, so it tolerates a missing service
    let client = if options.dry_run {
        None
    } else {
        Some(connect(config)?)
    };
    let references = match (&client, options.offline) {
        (_, true) => ReferenceSet::new(),
        (Some(client), false) => load_reference_sets(client),
        (None, false) => reference_data(config, false),
    };

    let mut session = prepare_session(references, file, options.partial, options.mappings)?;
    if options.interactive {
        session = prompts::edit_mapping(session)?;
    }
    print_mapping(&session);

    let session = session.proceed_to_review()?;
    print_validation(&session);

    if options.dry_run {
        println!("{}", serde_json::to_string_pretty(&session.payloads())?);
        return save_report(&session, options.report);
    }

    if !session.is_ready_to_submit() {
        save_report(&session, options.report)?;
        bail!("Fix the errors above or rerun with --partial to import and review later");
    }

    let rows = session.payloads().len();
    if !options.yes && !prompts::confirm_submit(rows, session.needs_review())? {
        println!("{}", "Import cancelled".yellow());
        return save_report(&session, options.report);
    }

    let Some(client) = client else {
        bail!("No requirements service configured");
    };
    let session = session.submit(&client)?;
    info!("Session {} finished at {}", session.id(), session.step());

    match session.outcome() {
        Some(SubmissionOutcome::Complete { imported }) => {
            println!("{} Imported {} requirement(s)", "✓".green(), imported);
            if session.needs_review() {
                println!(
                    "{}",
                    "  Imported requirements are flagged for review".yellow()
                );
            }
        }
        Some(SubmissionOutcome::Partial { imported, failures }) => {
            println!(
                "{} Imported {} requirement(s), {} rejected:",
                "!".yellow(),
                imported,
                failures.len()
            );
            for failure in failures {
                println!(
                    "  {} {}",
                    format!("Row {}:", failure.index + 1).red(),
                    failure.error
                );
            }
        }
        None => {}
    }

    save_report(&session, options.report)
}

fn validate_file(
    config: &ImportConfig,
    file: &Path,
    partial: bool,
    overrides: &[String],
    offline: bool,
    report: Option<&Path>,
) -> Result<()> {
    let references = reference_data(config, offline);
    let session = prepare_session(references, file, partial, overrides)?;
    print_mapping(&session);

    if let Err(e) = session.check_mapping() {
        println!("{} {}", "!".yellow(), e);
    }

    let session = session.validate();
    print_validation(&session);
    save_report(&session, report)?;

    if session
        .validation()
        .is_some_and(|v| v.blocks_submission())
    {
        bail!("Validation failed");
    }
    Ok(())
}

fn save_report(session: &ImportSession, path: Option<&Path>) -> Result<()> {
    if let Some(path) = path {
        ValidationReport::from_session(session).save(path)?;
        println!(
            "{} Report written to {}",
            "✓".green(),
            path.display().to_string().cyan()
        );
    }
    Ok(())
}

fn print_mapping(session: &ImportSession) {
    let mapping = session.mapping();
    if let Some(file) = session.file() {
        println!(
            "{} {} ({} rows)",
            "File:".blue().bold(),
            file.file_name,
            file.rows.len()
        );
    }
    println!("{}", "Column mapping:".blue().bold());

    let width = mapping.headers().map(|h| h.len()).max().unwrap_or(0);
    for entry in mapping.entries() {
        let target = match entry.field {
            Some(field) if mapping.is_conflicted(&entry.header) => {
                format!("{} (conflict)", field.id()).red().to_string()
            }
            Some(field) => field.id().green().to_string(),
            None => "(ignored)".dimmed().to_string(),
        };
        println!("  {:width$}  ->  {}", entry.header, target, width = width);
    }

    let missing = mapping.unmapped_core();
    if !missing.is_empty() {
        let ids: Vec<&str> = missing.iter().map(|f| f.id()).collect();
        println!(
            "{} {}",
            "Unmapped required fields:".yellow(),
            ids.join(", ")
        );
    }
    let domain = mapping.unmapped_domain();
    if !domain.is_empty() {
        let ids: Vec<&str> = domain.iter().map(|f| f.id()).collect();
        println!("{} {}", "Unmapped domain fields:".dimmed(), ids.join(", "));
    }
    println!();
}

fn print_validation(session: &ImportSession) {
    let Some(validation) = session.validation() else {
        return;
    };

    let total = validation.row_issues.len();
    let in_error = validation.rows_in_error();
    if validation.is_clean() {
        println!("{} All {} row(s) passed validation", "✓".green(), total);
    } else {
        let label = if validation.blocks_submission() {
            "Validation errors:".red().bold()
        } else {
            "Validation warnings:".yellow().bold()
        };
        println!(
            "{} {} issue(s) in {} of {} row(s)",
            label,
            validation.error_count(),
            in_error.len(),
            total
        );
        for row in in_error.iter().take(MAX_ROWS_SHOWN) {
            println!(
                "  {} {}",
                format!("Row {}:", row + 1).cyan(),
                validation.errors_for(*row).join("; ")
            );
        }
        if in_error.len() > MAX_ROWS_SHOWN {
            println!("  ... and {} more", in_error.len() - MAX_ROWS_SHOWN);
        }

        println!("{}", "By type:".blue());
        for (category, count) in &validation.errors_by_type {
            println!("  {}: {}", category, count);
        }
    }

    if !validation.skipped_required_fields.is_empty() {
        let ids: Vec<&str> = validation
            .skipped_required_fields
            .iter()
            .map(|f| f.id())
            .collect();
        println!(
            "{} {} (rows will be flagged for review)",
            "Skipped required fields:".yellow(),
            ids.join(", ")
        );
    }
    println!();
}

fn list_fields() {
    println!("{}", "Importable fields:".blue().bold());
    for field in TargetField::all() {
        let tier = match field.tier() {
            FieldTier::CoreRequired => field.tier().to_string().red(),
            FieldTier::DomainRequired => field.tier().to_string().yellow(),
            FieldTier::Optional => field.tier().to_string().dimmed(),
        };
        println!("  {:24} {:28} {}", field.id().cyan(), field.label(), tier);
    }
}

fn handle_config_command(cmd: &ConfigCommand, path: &Path) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            let mut config = ImportConfig::load_or_default(path)?;
            if config.api.token.is_some() {
                config.api.token = Some("********".to_string());
            }
            println!("{} {}", "Config file:".blue().bold(), path.display());
            if !path.exists() {
                println!("{}", "  (not created yet, showing defaults)".dimmed());
            }
            print!("{}", config.to_yaml()?);
        }
        ConfigCommand::Init => {
            if path.exists() {
                println!("{} Config already exists at {}", "!".yellow(), path.display());
            } else {
                ImportConfig::create_default(path)?;
                println!("{} Created {}", "✓".green(), path.display());
            }
        }
        ConfigCommand::SetUrl { url } => {
            let mut config = load_for_edit(path)?;
            config.api.base_url = url.trim().to_string();
            config.save(path)?;
            println!("{} API URL set to {}", "✓".green(), url.cyan());
        }
        ConfigCommand::SetToken { token } => {
            let mut config = load_for_edit(path)?;
            config.api.token = Some(token.trim().to_string()).filter(|t| !t.is_empty());
            config.save(path)?;
            println!("{} API token updated", "✓".green());
        }
    }
    Ok(())
}

/// Load the file as written, without environment overrides
fn load_for_edit(path: &Path) -> Result<ImportConfig> {
    if path.exists() {
        ImportConfig::load(path)
    } else {
        Ok(ImportConfig::default())
    }
}
