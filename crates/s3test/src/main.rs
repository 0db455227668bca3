//! s3test: A conformance test suite for S3-compatible object storage.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use s3test::catalog;
use s3test::{ConsoleDiagnostics, FileDiagnostics, FixtureProvider, Runner, S3Provider, TestGroup};
use s3test_core::{Config, LogFormat, QuirkSet, RunFilter, Target};
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod cli;

use cli::Cli;

/// How the process exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Success,
    Failure,
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        match exit {
            Exit::Success => Self::SUCCESS,
            Exit::Failure => Self::FAILURE,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    init_logging(&config);

    let groups = catalog::groups();
    let exit = run(&cli, &config, S3Provider, &groups, io::stdout(), io::stderr()).await?;
    Ok(exit.into())
}

/// Resolves the target and runs the selected cases, writing the status stream to `out`.
///
/// A missing or malformed target and an invalid filter print usage to `err`
/// and exit with failure. Case failures only change the exit status under `--strict`.
async fn run<P, W, E>(
    cli: &Cli,
    config: &Config,
    provider: P,
    groups: &[TestGroup<P::Fixture>],
    mut out: W,
    mut err: E,
) -> Result<Exit>
where
    P: FixtureProvider,
    W: Write,
    E: Write,
{
    let filter = match RunFilter::new(&cli.exclude, &cli.include) {
        Ok(filter) => filter,
        Err(e) if e.is_configuration() => return usage_error(&mut err, Some(&e)),
        Err(e) => return Err(e).context("Invalid case filter"),
    };

    if cli.list {
        print_catalog(&mut out, groups, &filter)?;
        return Ok(Exit::Success);
    }

    let Some(spec) = cli.target.as_deref() else {
        return usage_error(&mut err, None);
    };
    let target = match Target::resolve(spec, config) {
        Ok(target) => target,
        Err(e) if e.is_configuration() => return usage_error(&mut err, Some(&e)),
        Err(e) => return Err(e).context("Failed to resolve target"),
    };
    debug!(?target, "Resolved target");

    print_banner(&mut out, &target)?;

    let log_root = cli.log.clone().or_else(|| config.diagnostics.log_dir.clone());
    let files = log_root.map(|root| FileDiagnostics::new(root, &config.diagnostics.wire_filter));
    let sink = ConsoleDiagnostics::new(out, files);

    let mut runner = Runner::new(&target, &filter, provider, sink);
    let summary = runner.run(groups).await.summary();

    if cli.strict && summary.has_failures() {
        return Ok(Exit::Failure);
    }
    Ok(Exit::Success)
}

fn usage_error(err: &mut impl Write, cause: Option<&s3test_core::Error>) -> Result<Exit> {
    if let Some(cause) = cause {
        writeln!(err, "error: {cause}\n")?;
    }
    writeln!(err, "{}", Cli::command().render_usage())?;
    Ok(Exit::Failure)
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry().with(filter).with(fmt_layer.json()).init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry().with(filter).with(fmt_layer).init();
        }
    }
}

fn print_banner(out: &mut impl Write, target: &Target) -> io::Result<()> {
    let quirks = if target.quirks().is_empty() {
        "none".to_string()
    } else {
        target.quirks().to_string()
    };

    writeln!(
        out,
        r#"
  S3 tests: {}

  Endpoint:    {}
  Bucket:      {}
  Region:      {}
  Quirks:      {}
"#,
        target.host(),
        target.endpoint(),
        target.bucket(),
        target.region(),
        quirks,
    )
}

fn print_catalog<F>(
    out: &mut impl Write,
    groups: &[TestGroup<F>],
    filter: &RunFilter,
) -> io::Result<()> {
    for group in groups {
        let selected: Vec<_> = group.cases().iter().filter(|c| filter.accepts(c.name())).collect();
        if selected.is_empty() {
            continue;
        }
        writeln!(out, "{}", group.name())?;
        for case in selected {
            let quirks: QuirkSet = case.skip_for_quirks().iter().copied().collect();
            if quirks.is_empty() {
                writeln!(out, "  {}", case.name())?;
            } else {
                writeln!(out, "  {} (skipped for {quirks})", case.name())?;
            }
        }
    }
    Ok(())
}
