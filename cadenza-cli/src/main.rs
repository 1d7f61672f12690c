mod summary;

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use cadenza_core::config::Config;
use cadenza_core::knowledge::save_knowledge;
use cadenza_core::{AnalysisError, Analyzer, AnalyzerSettings, KnowledgeBase, KnowledgeReader, Stage};
use cadenza_types::{AnalysisLevel, FacetConfig, Session};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const USAGE: &str = "\
usage: cadenza [options] <session.json | ->

options:
  --json                     print the full report as JSON
  --level <name>             beginner, intermediate or advanced
  --knowledge <path>         read the knowledge base from a SQLite file
  --export-knowledge <path>  write the built-in knowledge base and exit
  --chords <prefix>          list chord shapes whose suffix starts with <prefix>
  -v, --verbose              debug logging";

fn init_logging(verbose: bool) {
    use simplelog::{LevelFilter, WriteLogger};

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cadenza")
        .join("cadenza.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path).or_else(|_| File::create(std::env::temp_dir().join("cadenza.log"))) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("cadenza: logging disabled, cannot create log file: {}", e);
            return;
        }
    };

    if WriteLogger::init(log_level, simplelog::Config::default(), log_file).is_ok() {
        log::info!("cadenza starting (log level: {:?})", log_level);
    }
}

#[derive(Debug, Default, PartialEq)]
struct Options {
    verbose: bool,
    json: bool,
    level: Option<AnalysisLevel>,
    knowledge: Option<PathBuf>,
    export_knowledge: Option<PathBuf>,
    chords: Option<String>,
    /// Session JSON path, or "-" for stdin
    session: Option<String>,
}

fn parse_level(name: &str) -> Option<AnalysisLevel> {
    match name.to_ascii_lowercase().as_str() {
        "beginner" => Some(AnalysisLevel::Beginner),
        "intermediate" => Some(AnalysisLevel::Intermediate),
        "advanced" => Some(AnalysisLevel::Advanced),
        _ => None,
    }
}

fn parse_options(args: &[String]) -> Result<Options, String> {
    let mut options = Options::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let mut value = |flag: &str| iter.next().cloned().ok_or_else(|| format!("{} needs a value", flag));
        match arg.as_str() {
            "-v" | "--verbose" => options.verbose = true,
            "--json" => options.json = true,
            "--level" => {
                let name = value("--level")?;
                options.level = Some(parse_level(&name).ok_or_else(|| format!("unknown level `{}`", name))?);
            }
            "--knowledge" => options.knowledge = Some(PathBuf::from(value("--knowledge")?)),
            "--export-knowledge" => options.export_knowledge = Some(PathBuf::from(value("--export-knowledge")?)),
            "--chords" => options.chords = Some(value("--chords")?),
            "-h" | "--help" => return Err(String::new()),
            flag if flag.starts_with("--") => return Err(format!("unknown option `{}`", flag)),
            path => {
                if options.session.replace(path.to_string()).is_some() {
                    return Err("only one session can be analyzed at a time".to_string());
                }
            }
        }
    }
    Ok(options)
}

/// Configuration file first, then command-line overrides.
fn build_analyzer(config: &Config, options: &Options) -> CliResult<Analyzer> {
    let mut settings = AnalyzerSettings::from_config(config);
    if let Some(level) = options.level {
        settings.facets = FacetConfig::for_level(level);
    }

    let knowledge = match options.knowledge.clone().or_else(|| config.knowledge_path()) {
        Some(path) => KnowledgeBase::open(&path),
        None => KnowledgeBase::builtin(),
    }
    .map_err(|e| AnalysisError::knowledge(Stage::KnowledgeLoad, e))?;

    Ok(Analyzer::new(Arc::new(knowledge), settings))
}

fn read_session(source: &str) -> CliResult<Session> {
    let mut json = String::new();
    if source == "-" {
        std::io::stdin().read_to_string(&mut json)?;
    } else {
        File::open(source)
            .map_err(|e| format!("cannot open {}: {}", source, e))?
            .read_to_string(&mut json)?;
    }
    let session: Session = serde_json::from_str(&json).map_err(|e| format!("{} is not a session: {}", source, e))?;
    log::debug!("read session {} with {} events from {}", session.id, session.len(), source);
    Ok(session)
}

fn list_chords(knowledge: &dyn KnowledgeReader, prefix: &str) -> CliResult<()> {
    let shapes = knowledge.chords_by_prefix(prefix)?;
    if shapes.is_empty() {
        println!("no chord shapes match `{}`", prefix);
    }
    for shape in shapes {
        println!(
            "C{:<9} {:<22} {:<28} {}",
            shape.quality.suffix(),
            shape.quality.name(),
            shape.tones,
            shape.scale_relationship
        );
    }
    Ok(())
}

fn run(options: &Options) -> CliResult<()> {
    if let Some(path) = &options.export_knowledge {
        save_knowledge(path, &KnowledgeBase::builtin()?)?;
        println!("wrote knowledge base to {}", path.display());
        return Ok(());
    }

    let config = Config::load();
    let analyzer = build_analyzer(&config, options)?;

    if let Some(prefix) = &options.chords {
        return list_chords(analyzer.knowledge(), prefix);
    }

    let source = options.session.as_deref().ok_or("no session given")?;
    let session = read_session(source)?;
    let report = analyzer.analyze(&session)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", summary::render(&report));
    }
    Ok(())
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match parse_options(&args) {
        Ok(options) => options,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("cadenza: {}\n", message);
            }
            eprintln!("{}", USAGE);
            return ExitCode::from(2);
        }
    };
    init_logging(options.verbose);

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            eprintln!("cadenza: {}", e);
            ExitCode::FAILURE
        }
    }
}
