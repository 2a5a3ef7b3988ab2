//! xlint: Command-line linter for X.509 certificates.

mod batch;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rayon::prelude::*;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;
use xlint_lib::lint::registry;
use xlint_lib::{Engine, LintConfig, ReferenceTime, Registry, Source};

#[derive(Parser)]
#[command(
    name = "xlint",
    about = "Check X.509 certificates against CA/B Forum and RFC 5280 requirements",
    long_about = "xlint runs a registry of independent lints over X.509 certificates\n\
                  and reports a per-lint verdict: pass, info, warn, error, fatal,\n\
                  NA (not applicable) or NE (not yet effective).\n\n\
                  Input format (PEM vs DER) is auto-detected unless --pem or --der\n\
                  is specified. `lint` reads from stdin when no file is given.\n\n\
                  Set XLINT_LOG (e.g. XLINT_LOG=debug) to control log output on stderr.",
    after_help = "EXAMPLES:\n\
                  \n  xlint lint cert.pem\
                  \n  xlint lint --json cert.der\
                  \n  xlint lint --recurse --failures-only certs/\
                  \n  xlint lint --sources CABF_BR --exclude w_subject_dn_trailing_whitespace cert.pem\
                  \n  xlint batch --input-file certs.json --output-file out.json --cert-threads 8\
                  \n  xlint list --json\
                  \n  cat cert.pem | xlint lint"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lint a certificate file or a directory of certificates
    #[command(after_help = "EXIT STATUS:\n\
                      \n  0  no lint returned error or fatal\
                      \n  1  at least one error or fatal result")]
    Lint {
        /// Certificate file or directory. Reads from stdin if omitted.
        file: Option<PathBuf>,
        /// Force DER input parsing (default: auto-detect)
        #[arg(long)]
        der: bool,
        /// Force PEM input parsing (default: auto-detect)
        #[arg(long)]
        pem: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Only print lints (or files) that did not pass
        #[arg(long)]
        failures_only: bool,
        /// Recurse into subdirectories (directory mode)
        #[arg(short, long)]
        recurse: bool,
        #[command(flatten)]
        select: SelectArgs,
    },
    /// Lint a stream of JSON records `{"raw": <base64 DER>, "validation": ...}`
    #[command(after_help = "OUTPUT:\n\
                      \n  --output-file     one JSON object per certificate: raw, parsed, lint, validation\
                      \n  --output-process  one CSV-style line per certificate:\
                      \n                    errors,warnings,nss_valid,nss_was_valid,not_before,not_after,\
                      \n                    issuer,subject,sha256,fatals,<errors>,<warnings>\
                      \n                    (empty line when the record has no NSS validation)\
                      \n\nUse '-' for stdin/stdout.")]
    Batch {
        /// Input file of concatenated JSON records ('-' for stdin)
        #[arg(long)]
        input_file: PathBuf,
        /// Destination for JSON results
        #[arg(long, default_value = "-")]
        output_file: PathBuf,
        /// Destination for process lines
        #[arg(long, default_value = "-")]
        output_process: PathBuf,
        /// Number of worker threads
        #[arg(long, default_value_t = 1)]
        cert_threads: usize,
        /// Capacity of the queue between the reader and the workers
        #[arg(long, default_value_t = 1000)]
        channel_size: usize,
        /// Abort on the first certificate that cannot be parsed
        #[arg(long)]
        fatal_parse_errors: bool,
        #[command(flatten)]
        select: SelectArgs,
    },
    /// List registered lints
    List {
        /// One JSON object per line
        #[arg(long)]
        json: bool,
        /// Only lints from this source (e.g. CABF_BR, RFC5280, AWSLabs)
        #[arg(long)]
        source: Option<Source>,
    },
}

/// Lint selection flags shared by `lint` and `batch`.
#[derive(Args, Debug, Default)]
struct SelectArgs {
    /// Only run these lints (comma separated)
    #[arg(long, value_delimiter = ',')]
    include: Vec<String>,
    /// Never run these lints (comma separated)
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,
    /// Only run lints from these sources (comma separated)
    #[arg(long, value_delimiter = ',')]
    sources: Vec<Source>,
    /// TOML file with include/exclude/sources/reference_time
    #[arg(long)]
    config: Option<PathBuf>,
    /// Evaluate effective dates at this unix timestamp instead of notBefore
    #[arg(long)]
    at_time: Option<i64>,
}

impl SelectArgs {
    /// Build the lint configuration: the TOML file first, then flags on top.
    fn to_config(&self) -> Result<LintConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config: {}", path.display()))?;
                LintConfig::from_toml_str(&text)
                    .with_context(|| format!("Invalid config: {}", path.display()))?
            }
            None => LintConfig::default(),
        };
        if !self.include.is_empty() {
            config = config.with_include(self.include.iter().cloned());
        }
        config = config.with_exclude(self.exclude.iter().cloned());
        if !self.sources.is_empty() {
            config = config.with_sources(self.sources.iter().copied());
        }
        if let Some(ts) = self.at_time {
            config = config.with_reference_time(ReferenceTime::Fixed(ts));
        }
        Ok(config)
    }
}

/// Maximum input file size (10 MiB). Prevents OOM on accidental large inputs.
const MAX_INPUT_BYTES: u64 = 10 * 1024 * 1024;

static TRACING: Once = Once::new();

/// Log to stderr, filtered by `XLINT_LOG` (default `warn`).
fn init_tracing() {
    TRACING.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_env("XLINT_LOG")
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    });
}

fn read_input(file: Option<&PathBuf>) -> Result<Vec<u8>> {
    match file {
        Some(path) => {
            let meta = std::fs::metadata(path)
                .with_context(|| format!("Failed to stat file: {}", path.display()))?;
            if meta.len() > MAX_INPUT_BYTES {
                anyhow::bail!(
                    "File too large ({} bytes, max {} bytes): {}",
                    meta.len(),
                    MAX_INPUT_BYTES,
                    path.display()
                );
            }
            std::fs::read(path).with_context(|| format!("Failed to read file: {}", path.display()))
        }
        None => {
            let mut buf = Vec::new();
            std::io::stdin()
                .take(MAX_INPUT_BYTES)
                .read_to_end(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn parse_input(input: &[u8], der: bool, pem: bool) -> Result<xlint_lib::CertificateInfo> {
    if der {
        Ok(xlint_lib::parse_der(input)?)
    } else if pem {
        Ok(xlint_lib::parse_pem(input)?)
    } else {
        Ok(xlint_lib::parse_cert(input)?)
    }
}

/// Check if a path has a certificate file extension.
fn is_cert_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if ext.eq_ignore_ascii_case("pem") || ext.eq_ignore_ascii_case("der")
            || ext.eq_ignore_ascii_case("crt") || ext.eq_ignore_ascii_case("cer")
    )
}

/// Find all certificate files (.pem, .der, .crt, .cer) in a directory.
fn find_cert_files(dir: &Path, recurse: bool) -> Vec<PathBuf> {
    let walker = if recurse {
        walkdir::WalkDir::new(dir)
    } else {
        walkdir::WalkDir::new(dir).max_depth(1)
    };
    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_cert_file(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// The outcome of linting one file in directory mode.
struct FileResult {
    path: String,
    pass: bool,
    detail: String,
}

/// Lint files in parallel, printing `filename: result` in path order.
///
/// Returns the number of files with an error or fatal result.
fn run_files<F>(files: &[PathBuf], failures_only: bool, op: F) -> usize
where
    F: Fn(&Path) -> FileResult + Sync,
{
    let results: Vec<FileResult> = files.par_iter().map(|f| op(f)).collect();

    let mut failures = 0;
    for r in &results {
        if !r.pass {
            failures += 1;
        }
        if failures_only && r.pass {
            continue;
        }
        if r.pass {
            println!("{}: {}", r.path, r.detail);
        } else {
            eprintln!("{}: {}", r.path, r.detail);
        }
    }
    failures
}

fn lint_file(
    path: &Path,
    engine: Engine<'_>,
    config: &LintConfig,
    der: bool,
    pem: bool,
    json: bool,
) -> FileResult {
    let label = path.display().to_string();
    let cert = match read_input(Some(&path.to_path_buf())).and_then(|d| parse_input(&d, der, pem))
    {
        Ok(c) => c,
        Err(e) => {
            return FileResult {
                path: label,
                pass: false,
                detail: format!("FAIL (parse error: {:#})", e),
            }
        }
    };
    let results = engine.run(&cert, config);
    let pass = !results.has_failures();
    let detail = if json {
        match serde_json::to_string(&results) {
            Ok(j) => j,
            Err(e) => format!("FAIL (serialize error: {})", e),
        }
    } else if pass {
        format!("PASS ({})", results.summary())
    } else {
        let summary = results.summary();
        let mut names = summary.errors;
        names.extend(summary.fatals);
        format!("FAIL ({})", names.join(", "))
    };
    FileResult {
        path: label,
        pass,
        detail,
    }
}

fn log_config_warnings(config: &LintConfig, registry: &Registry) {
    for warning in config.validate(registry) {
        tracing::warn!("{}", warning);
    }
}

fn open_output(path: &Path) -> Result<Box<dyn Write + Send>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(std::io::stdout()));
    }
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    Ok(Box::new(std::io::BufWriter::new(file)))
}

fn open_input(path: &Path) -> Result<Box<dyn Read + Send>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(std::io::stdin()));
    }
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    Ok(Box::new(file))
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let registry = registry::install(Registry::builtin()?);
    let engine = Engine::new(registry);

    match &cli.command {
        Commands::Lint {
            file,
            der,
            pem,
            json,
            failures_only,
            recurse,
            select,
        } => {
            let config = select.to_config()?;
            log_config_warnings(&config, registry);

            // Directory mode: lint all cert files in parallel
            if let Some(path) = file {
                if path.is_dir() {
                    let files = find_cert_files(path, *recurse);
                    if files.is_empty() {
                        anyhow::bail!(
                            "No certificate files (.pem, .der, .crt, .cer) found in {}",
                            path.display()
                        );
                    }
                    let failures = run_files(&files, *failures_only, |f| {
                        lint_file(f, engine, &config, *der, *pem, *json)
                    });
                    tracing::info!(files = files.len(), failures, "directory linted");
                    if failures > 0 {
                        std::process::exit(1);
                    }
                    return Ok(());
                }
            }

            // Single file mode
            let input = read_input(file.as_ref())?;
            let cert = parse_input(&input, *der, *pem)?;
            let results = engine.run(&cert, &config);

            if *json {
                println!("{}", xlint_lib::to_json(&results)?);
            } else {
                print!("{}", xlint_lib::display_results(&results, *failures_only));
            }
            if results.has_failures() {
                std::process::exit(1);
            }
        }
        Commands::Batch {
            input_file,
            output_file,
            output_process,
            cert_threads,
            channel_size,
            fatal_parse_errors,
            select,
        } => {
            let config = select.to_config()?;
            log_config_warnings(&config, registry);

            let input = open_input(input_file)?;
            let mut json_out = open_output(output_file)?;
            let mut process_out = open_output(output_process)?;
            let opts = batch::BatchOptions {
                cert_threads: *cert_threads,
                channel_size: *channel_size,
                fatal_parse_errors: *fatal_parse_errors,
            };
            batch::run(input, &mut json_out, &mut process_out, engine, &config, &opts)?;
        }
        Commands::List { json, source } => {
            let selected = registry.filter(|m| source.map_or(true, |s| m.source == s));
            if *json {
                if source.is_none() {
                    print!("{}", registry.list_json()?);
                } else {
                    for entry in selected {
                        println!("{}", serde_json::to_string(entry.metadata())?);
                    }
                }
            } else {
                print!(
                    "{}",
                    xlint_lib::display_listing(selected.map(|e| e.metadata()))
                );
            }
        }
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn select(args: &[&str]) -> SelectArgs {
        #[derive(Parser)]
        struct Harness {
            #[command(flatten)]
            select: SelectArgs,
        }
        let argv = std::iter::once("xlint").chain(args.iter().copied());
        Harness::try_parse_from(argv).unwrap().select
    }

    // ---- Selection flags ----

    #[test]
    fn comma_separated_selection() {
        let config = select(&["--include", "e_a,e_b", "--exclude", "e_b"])
            .to_config()
            .unwrap();
        assert_eq!(config.include.unwrap().len(), 2);
        assert!(config.exclude.contains("e_b"));
        assert!(config.sources.is_none());
    }

    #[test]
    fn sources_parse_case_insensitively() {
        let config = select(&["--sources", "cabf_br,RFC5280"]).to_config().unwrap();
        let sources = config.sources.unwrap();
        assert!(sources.contains(&Source::CabfBaselineRequirements));
        assert!(sources.contains(&Source::Rfc5280));
    }

    #[test]
    fn unknown_source_is_rejected() {
        #[derive(Parser)]
        struct Harness {
            #[command(flatten)]
            select: SelectArgs,
        }
        assert!(Harness::try_parse_from(["xlint", "--sources", "NIST"]).is_err());
    }

    #[test]
    fn at_time_fixes_reference() {
        let config = select(&["--at-time", "1500000000"]).to_config().unwrap();
        assert_eq!(config.reference_time, ReferenceTime::Fixed(1_500_000_000));
    }

    #[test]
    fn flags_layer_over_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("xlint.toml");
        std::fs::write(
            &path,
            "exclude = [\"w_x\"]\nreference_time = { fixed = 1 }\n",
        )
        .unwrap();
        let config = select(&[
            "--config",
            path.to_str().unwrap(),
            "--exclude",
            "w_y",
            "--at-time",
            "2",
        ])
        .to_config()
        .unwrap();
        assert!(config.exclude.contains("w_x"));
        assert!(config.exclude.contains("w_y"));
        assert_eq!(config.reference_time, ReferenceTime::Fixed(2));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let err = select(&["--config", "/nonexistent/xlint.toml"])
            .to_config()
            .unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to read config"));
    }

    // ---- Directory mode ----

    fn write_cert(dir: &Path, name: &str, cn: &str) {
        let mut params = rcgen::CertificateParams::new(Vec::<String>::new()).unwrap();
        params.distinguished_name = rcgen::DistinguishedName::new();
        params.distinguished_name.push(rcgen::DnType::CommonName, cn);
        let key = rcgen::KeyPair::generate().unwrap();
        let cert = params.self_signed(&key).unwrap();
        std::fs::write(dir.join(name), cert.pem()).unwrap();
    }

    #[test]
    fn finds_cert_files_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();
        write_cert(dir.path(), "a.pem", "a.example");
        write_cert(dir.path(), "b.CRT", "b.example");
        write_cert(&dir.path().join("nested"), "c.cer", "c.example");
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();

        assert_eq!(find_cert_files(dir.path(), false).len(), 2);
        assert_eq!(find_cert_files(dir.path(), true).len(), 3);
    }

    #[test]
    fn lint_file_reports_pass_and_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        write_cert(dir.path(), "ok.pem", "ok.example");
        std::fs::write(dir.path().join("bad.pem"), "garbage").unwrap();

        let registry = Registry::builtin().unwrap();
        let engine = Engine::new(&registry);
        let config = LintConfig::default();

        let ok = lint_file(&dir.path().join("ok.pem"), engine, &config, false, false, false);
        assert!(ok.pass, "{}", ok.detail);
        assert!(ok.detail.starts_with("PASS"));

        let bad = lint_file(&dir.path().join("bad.pem"), engine, &config, false, false, false);
        assert!(!bad.pass);
        assert!(bad.detail.contains("parse error"));

        let json = lint_file(&dir.path().join("ok.pem"), engine, &config, false, false, true);
        let value: serde_json::Value = serde_json::from_str(&json.detail).unwrap();
        assert_eq!(
            value["w_subject_dn_leading_whitespace"]["result"],
            "pass"
        );
    }
}
