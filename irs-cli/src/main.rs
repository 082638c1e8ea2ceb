use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use irs_chat::{ConversationState, FieldExtractor};
use irs_cli::logging;
use irs_cli::report::{render_adjustments, render_profile, render_result, render_validation};
use irs_cli::utils::{parse_civil_status, parse_money, parse_regime};
use irs_core::{
    CivilStatus, ExpenseCategory, FiscalProfile, ParameterRepository, Regime, TaxEngine,
    TaxParameterTable, Validator,
};
use irs_data::{FileParameterRepository, VocabularyLoader};
use rust_decimal::Decimal;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Portuguese personal income tax (IRS) estimator.
///
/// Loads the parameter table for the requested tax year from the parameters
/// directory and estimates tax from flags, one sentence, or a conversation.
#[derive(Debug, Parser)]
#[command(name = "irs-estimator", version, about)]
struct Cli {
    /// Directory holding `irs_<year>.toml` parameter tables.
    #[arg(long, default_value = "data", global = true)]
    params_dir: PathBuf,

    /// Tax year to estimate.
    #[arg(long, default_value_t = 2025, global = true)]
    year: i32,

    /// TOML file overriding the built-in extractor vocabulary.
    #[arg(long, global = true)]
    vocabulary: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `irs_chat=debug`. Overrides RUST_LOG.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Estimate from structured values.
    Estimate(EstimateArgs),

    /// Show what the extractor reads from one sentence.
    Extract {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Answer questions on stdin until the estimate can be computed.
    Chat,

    /// Check every parameter table in the parameters directory.
    Validate,
}

#[derive(Debug, Args)]
struct EstimateArgs {
    /// Annual employment income.
    #[arg(long, value_parser = parse_money)]
    employment: Option<Decimal>,

    /// Annual independent (self-employed) income.
    #[arg(long, value_parser = parse_money)]
    independent: Option<Decimal>,

    /// Annual pension income.
    #[arg(long, value_parser = parse_money)]
    pension: Option<Decimal>,

    /// Holiday and Christmas subsidies paid on top of income.
    #[arg(long, value_parser = parse_money)]
    subsidies: Option<Decimal>,

    #[arg(long, value_parser = parse_civil_status, default_value = "single")]
    civil_status: CivilStatus,

    #[arg(long, default_value_t = 0)]
    dependents: u32,

    #[arg(long)]
    disabled_dependents: Option<u32>,

    #[arg(long, value_parser = parse_money)]
    health: Option<Decimal>,

    #[arg(long, value_parser = parse_money)]
    education: Option<Decimal>,

    #[arg(long, value_parser = parse_money)]
    housing: Option<Decimal>,

    #[arg(long, value_parser = parse_money)]
    donations: Option<Decimal>,

    /// Tax already withheld at source.
    #[arg(long, value_parser = parse_money)]
    withholding: Option<Decimal>,

    #[arg(long, value_parser = parse_regime)]
    regime: Option<Regime>,

    /// Correct out-of-range values before computing.
    #[arg(long, default_value_t = false)]
    clamp: bool,
}

impl EstimateArgs {
    fn profile(&self) -> FiscalProfile {
        let mut profile = FiscalProfile {
            employment_income: self.employment,
            independent_income: self.independent,
            pension_income: self.pension,
            subsidies: self.subsidies,
            civil_status: Some(self.civil_status),
            dependents: Some(self.dependents),
            disabled_dependents: self.disabled_dependents,
            withholding_tax: self.withholding,
            regime: self.regime,
            ..Default::default()
        };
        let expenses = [
            (ExpenseCategory::Health, self.health),
            (ExpenseCategory::Education, self.education),
            (ExpenseCategory::Housing, self.housing),
            (ExpenseCategory::Donations, self.donations),
        ];
        for (category, amount) in expenses
            .into_iter()
            .filter_map(|(category, amount)| amount.map(|a| (category, a)))
        {
            profile.set_expense(category, amount);
        }
        profile
    }
}

// ─── commands ────────────────────────────────────────────────────────────────

async fn load_table(cli: &Cli) -> Result<TaxParameterTable> {
    let repo = FileParameterRepository::new(&cli.params_dir);
    repo.get_parameter_table(cli.year).await.with_context(|| {
        format!(
            "Failed to load parameters for {} from {}",
            cli.year,
            cli.params_dir.display()
        )
    })
}

fn build_extractor(cli: &Cli) -> Result<FieldExtractor> {
    match &cli.vocabulary {
        Some(path) => VocabularyLoader::extractor_from_path(path)
            .with_context(|| format!("Failed to load vocabulary: {}", path.display())),
        None => Ok(FieldExtractor::default()),
    }
}

/// Validates `profile`, computes it, and prints both.
fn print_estimate(
    table: &TaxParameterTable,
    profile: &FiscalProfile,
) -> Result<()> {
    let engine = TaxEngine::new(table).context("Invalid parameter table")?;
    let report = Validator::new(table).validate(profile);
    if !report.is_valid() {
        warn!(errors = report.errors.len(), "profile has validation errors");
    }
    print!("{}", render_validation(&report));

    let result = engine.compute(profile);
    info!(
        year = result.tax_year,
        tax_due = %result.tax_due,
        refund_or_payment = %result.refund_or_payment,
        "estimate computed"
    );
    print!("{}", render_result(&result));
    Ok(())
}

fn estimate(
    table: &TaxParameterTable,
    args: &EstimateArgs,
) -> Result<()> {
    let mut profile = args.profile();
    if args.clamp {
        let (fixed, adjustments) = Validator::new(table).clamp(&profile);
        print!("{}", render_adjustments(&adjustments));
        profile = fixed;
    }
    print_estimate(table, &profile)
}

fn extract(
    extractor: &FieldExtractor,
    text: &str,
) {
    let extraction = extractor.extract_detailed(text, None);
    print!("{}", render_profile(&extraction.profile));
    for m in &extraction.matches {
        println!("  {:?} <- {}", m.field, m.rule);
    }
}

async fn chat(
    table: &TaxParameterTable,
    extractor: &FieldExtractor,
) -> Result<()> {
    let mut state = ConversationState::new();
    println!("{}", state.prompt());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let input = line.trim();
        match input {
            "sair" => break,
            "reiniciar" => {
                state = state.reset();
                println!("{}", state.prompt());
                continue;
            }
            _ => {}
        }

        state = state.respond(input, extractor);
        debug!(step = ?state.step(), confidence = state.confidence(), "turn handled");
        if let Some(turn) = state.history().last() {
            println!("{}", turn.text);
        }
        if state.is_complete() {
            print!("{}", render_profile(state.profile()));
            print_estimate(table, state.profile())?;
            println!("Pode corrigir qualquer valor, escrever \"reiniciar\" ou \"sair\".");
        }
    }
    Ok(())
}

async fn validate_tables(cli: &Cli) -> Result<()> {
    let repo = FileParameterRepository::new(&cli.params_dir);
    let years = repo
        .list_tax_years()
        .await
        .with_context(|| format!("Failed to list {}", cli.params_dir.display()))?;
    if years.is_empty() {
        anyhow::bail!("No parameter tables in {}", cli.params_dir.display());
    }

    let mut failures = 0;
    for year in years {
        match repo.get_parameter_table(year).await {
            Ok(table) => println!("{year}: ok ({} brackets)", table.brackets.len()),
            Err(e) => {
                failures += 1;
                println!("{year}: {e}");
            }
        }
    }
    if failures > 0 {
        anyhow::bail!("{failures} parameter table(s) failed validation");
    }
    Ok(())
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_logging();
    if let Some(level) = &cli.log_level {
        logging::set_log_level(level)?;
    }
    if let Some(path) = &cli.log_file {
        logging::enable_file_logging(path)?;
    }

    match &cli.command {
        Command::Estimate(args) => {
            let table = load_table(&cli).await?;
            estimate(&table, args)
        }
        Command::Extract { text } => {
            extract(&build_extractor(&cli)?, &text.join(" "));
            Ok(())
        }
        Command::Chat => {
            let table = load_table(&cli).await?;
            chat(&table, &build_extractor(&cli)?).await
        }
        Command::Validate => validate_tables(&cli).await,
    }
}
