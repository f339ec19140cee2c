//! HoodQuiz - SF neighborhood personality quiz
//!
//! A CLI that scores quiz answers against a static scoring table, walks
//! through the quiz one answer at a time with saved progress, and renders
//! the result card.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (bad config, unreadable data, invalid answers, etc.)

use anyhow::{Context, Result};
use hoodquiz::catalog::QuestionCatalog;
use hoodquiz::cli::{Args, Command, OutputFormat};
use hoodquiz::config::{Config, CONFIG_FILE};
use hoodquiz::models::{AnswerVector, ResultReport};
use hoodquiz::report;
use hoodquiz::scoring::{AggregationEngine, ScoringConfig};
use hoodquiz::session::{resolve_or_fallback, Outcome, QuizSession, Step};
use hoodquiz::store::JsonFileStore;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    // Load configuration before logging so `[general] verbose` applies
    let (mut config, source) = match load_config(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(args.log_level(config.general.verbose));

    info!("HoodQuiz v{}", env!("CARGO_PKG_VERSION"));
    source.log();
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args, config) {
        error!("Command failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Handle init-config: generate a default .hoodquiz.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        anyhow::bail!("{} already exists. Remove it first or edit it manually.", CONFIG_FILE);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to point at your scoring table and questions.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to set tracing subscriber: {}", e);
    }
}

/// Dispatch the parsed command.
fn run(args: Args, config: Config) -> Result<()> {
    match args.command {
        Command::Resolve {
            ref answers,
            seed,
            format,
            ref output,
        } => {
            let engine = load_engine(&config)?;
            let answers = AnswerVector::from_raw(answers);
            let fallback = config.quiz.fallback_category.as_deref();
            let outcome = match seed {
                Some(seed) => {
                    let mut rng = StdRng::seed_from_u64(seed);
                    resolve_or_fallback(&engine, &answers, fallback, &mut rng)
                }
                None => resolve_or_fallback(&engine, &answers, fallback, &mut rand::rng()),
            }
            .context("Failed to resolve answers")?;

            let rendered = render_outcome(&engine, &config, &outcome, &answers, seed, format)?;
            match output {
                Some(path) => {
                    std::fs::write(path, &rendered).with_context(|| {
                        format!("Failed to write result to {}", path.display())
                    })?;
                    println!("✅ Result saved to: {}", path.display());
                }
                None => print!("{}", rendered),
            }
            Ok(())
        }
        Command::Status => {
            let session = open_session(&config)?;
            print_status(&session)
        }
        Command::Answer { option, seed } => {
            let mut session = open_session(&config)?;
            let step = match seed {
                Some(seed) => {
                    session.select_option_with(option, &mut StdRng::seed_from_u64(seed))?
                }
                None => session.select_option(option)?,
            };

            match step {
                Step::Advanced(_) => print_status(&session),
                Step::Completed(outcome) => {
                    let rendered = render_outcome(
                        session.engine(),
                        &config,
                        &outcome,
                        session.answers(),
                        seed,
                        OutputFormat::Markdown,
                    )?;
                    print!("{}", rendered);
                    Ok(())
                }
            }
        }
        Command::Back => {
            let mut session = open_session(&config)?;
            session.back()?;
            print_status(&session)
        }
        Command::Retry => {
            let mut session = open_session(&config)?;
            session.retry()?;
            println!("🧹 Progress and saved result cleared.");
            Ok(())
        }
        Command::Again => {
            let mut session = open_session(&config)?;
            session.again()?;
            println!("🔁 Back to the start.");
            print_status(&session)
        }
        Command::Result { format } => {
            let session = open_session(&config)?;
            let Some(key) = session.existing_result()? else {
                println!("No completed quiz yet.");
                return Ok(());
            };
            print_saved_result(session.engine(), &key, format)
        }
        Command::Validate => handle_validate(&config),
        Command::InitConfig => handle_init_config(),
    }
}

/// Where the configuration came from, reported once logging is up.
enum ConfigSource {
    Explicit(PathBuf),
    DefaultFile,
    Builtin,
    Unreadable(String),
}

impl ConfigSource {
    fn log(&self) {
        match self {
            ConfigSource::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigSource::DefaultFile => info!("Loaded default config from {}", CONFIG_FILE),
            ConfigSource::Builtin => debug!("No config file found, using defaults"),
            ConfigSource::Unreadable(e) => warn!("Failed to load config: {}", e),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<(Config, ConfigSource)> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        let config = Config::load(config_path)?;
        return Ok((config, ConfigSource::Explicit(config_path.clone())));
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok((config, ConfigSource::DefaultFile)),
        Ok(None) => Ok((Config::default(), ConfigSource::Builtin)),
        Err(e) => Ok((Config::default(), ConfigSource::Unreadable(format!("{:#}", e)))),
    }
}

/// Load the scoring table, degrading to the fallback category if one is set.
fn load_engine(config: &Config) -> Result<AggregationEngine> {
    AggregationEngine::load(
        &config.quiz.scoring,
        config.quiz.question_count,
        config.quiz.fallback_category.as_deref(),
    )
    .context("Failed to load scoring table")
}

/// Load the question catalog if the file is there.
fn load_catalog(config: &Config) -> Result<Option<QuestionCatalog>> {
    if !config.quiz.questions.exists() {
        warn!(
            "Question catalog {} not found, options will not be range-checked",
            config.quiz.questions.display()
        );
        return Ok(None);
    }

    let catalog = QuestionCatalog::load(&config.quiz.questions, config.quiz.question_count)
        .context("Failed to load question catalog")?;
    Ok(Some(catalog))
}

fn open_session(config: &Config) -> Result<QuizSession<JsonFileStore>> {
    let engine = load_engine(config)?;
    let store = JsonFileStore::open(&config.general.store).with_context(|| {
        format!(
            "Failed to open progress file {}",
            config.general.store.display()
        )
    })?;

    let mut session = QuizSession::restore(engine, store)?
        .with_fallback(config.quiz.fallback_category.clone());
    if let Some(catalog) = load_catalog(config)? {
        session = session.with_catalog(catalog)?;
    }
    Ok(session)
}

/// Render a finished run as a result card.
fn render_outcome(
    engine: &AggregationEngine,
    config: &Config,
    outcome: &Outcome,
    answers: &AnswerVector,
    seed: Option<u64>,
    format: OutputFormat,
) -> Result<String> {
    let Some(ref resolution) = outcome.resolution else {
        // Fallback results carry no scores.
        return Ok(match format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(&serde_json::json!({ "category": outcome.category }))?
            }
            OutputFormat::Markdown => format!("# You are {}\n", outcome.category),
        });
    };

    let result_report =
        ResultReport::new(resolution, answers, seed, &engine.config().categories);

    match format {
        OutputFormat::Json => report::generate_json_report(&result_report),
        OutputFormat::Markdown => Ok(report::generate_markdown_report(
            &result_report,
            config.report.include_diagnostics,
        )),
    }
}

fn print_status(session: &QuizSession<JsonFileStore>) -> Result<()> {
    let index = session.current_index();
    let total = session.question_count();

    if index == 0 {
        println!("📖 Story opener");
    } else {
        println!("❓ Question {} of {}", index, total);
    }

    match session.current_question() {
        Some(question) => {
            println!("   {}\n", question.question);
            for (i, option) in question.options.iter().enumerate() {
                println!("   [{}] {}", i, option);
            }
        }
        None => println!("   (no question catalog loaded)"),
    }

    println!(
        "\n   Answered: {} of {}",
        session.answers().answered_count(),
        total
    );
    Ok(())
}

fn print_saved_result(engine: &AggregationEngine, key: &str, format: OutputFormat) -> Result<()> {
    let category = engine.config().categories.get(key);

    match format {
        OutputFormat::Json => {
            let json = match category {
                Some(category) => serde_json::to_string_pretty(category)?,
                None => serde_json::to_string_pretty(&serde_json::json!({ "key": key }))?,
            };
            println!("{}", json);
        }
        OutputFormat::Markdown => match category {
            Some(category) => {
                println!("# You are {}\n", category.name);
                if !category.image.is_empty() {
                    println!("![{}]({})", category.name, category.image);
                }
            }
            None => println!("# You are {}", key),
        },
    }
    Ok(())
}

/// Handle validate: load everything, report authoring gaps, exit.
fn handle_validate(config: &Config) -> Result<()> {
    println!("🔍 Checking quiz data...\n");

    let scoring = ScoringConfig::load(&config.quiz.scoring, config.quiz.question_count)
        .context("Failed to load scoring table")?;
    println!(
        "   Scoring: {} ({} categories)",
        config.quiz.scoring.display(),
        scoring.categories.len()
    );
    for category in scoring.categories.iter() {
        println!("     🏙️  {} ({})", category.name, category.key);
    }

    let catalog = QuestionCatalog::load(&config.quiz.questions, config.quiz.question_count)
        .context("Failed to load question catalog")?;
    println!(
        "   Questions: {} ({} scored)",
        config.quiz.questions.display(),
        catalog.question_count()
    );

    let unscored = catalog.unscored_options(&scoring.table);
    if unscored.is_empty() {
        println!("\n✅ Every option carries a scoring entry.");
    } else {
        println!("\n⚠️  {} options have no scoring entry:", unscored.len());
        for (question, option) in unscored {
            println!("     Q{} option {}", question, option);
        }
    }

    if let Some(ref fallback) = config.quiz.fallback_category {
        if !scoring.categories.contains(fallback) {
            warn!("Fallback category '{}' is not in the registry", fallback);
        }
    }

    Ok(())
}
