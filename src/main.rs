use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use covdelta_core::{CovdeltaConfig, OutputFormat};
use covdelta_github::publish::{PublishOptions, PublishOutcome};
use covdelta_report::RenderOptions;

const CONFIG_FILE: &str = ".covdelta.toml";

#[derive(Parser)]
#[command(
    name = "covdelta",
    version,
    about = "Compare coverage between a pull request and main",
    long_about = "covdelta compares `go tool cover -func` output of a pull request branch\n\
                   against the main branch and keeps a single summary comment on the PR.\n\n\
                   Examples:\n  \
                     covdelta fetch                      Download main-branch coverage from CI\n  \
                     covdelta compare                    Compare and comment on the PR\n  \
                     covdelta compare --dry-run          Print the report without posting\n  \
                     covdelta compare --format json      Print every diff bucket as JSON\n  \
                     covdelta init                       Write a default .covdelta.toml"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .covdelta.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format for the compare report
    #[arg(
        long,
        global = true,
        default_value = "markdown",
        long_help = "Output format for the compare report.\n\n\
                       Formats:\n  \
                         markdown  The PR comment body (default)\n  \
                         json      Every diff bucket, including added/removed/unchanged files"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Compare two coverage dumps and upsert the report comment
    #[command(long_about = "Compare two coverage dumps and upsert the report comment.\n\n\
        Parses both dumps, averages coverage per file, classifies each file as\n\
        increased, decreased, added, removed, or unchanged, and prints the report.\n\
        Unless --dry-run is given, the report is then posted on the pull request,\n\
        replacing an earlier report if one exists. Without a token or PR number\n\
        the command exits successfully without doing anything.\n\n\
        Examples:\n  covdelta compare\n  covdelta compare --current pr.out --main base.out --dry-run")]
    Compare {
        /// Coverage dump of the pull request branch
        #[arg(long)]
        current: Option<PathBuf>,
        /// Coverage dump of the main branch
        #[arg(long)]
        main: Option<PathBuf>,
        /// Pull request number
        #[arg(long, env = "PULL_REQUEST_NUMBER")]
        pr: Option<String>,
        /// GitHub token used to read and write comments
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,
        /// Print the report without contacting GitHub
        #[arg(long)]
        dry_run: bool,
    },
    /// Download the latest main-branch coverage artifact
    #[command(long_about = "Download the latest main-branch coverage artifact.\n\n\
        Looks up the configured workflow, walks its most recent completed runs on the\n\
        base branch, and extracts the first coverage artifact that contains the\n\
        expected file into the output directory. Without a PR number or token the\n\
        command exits successfully without doing anything.\n\n\
        Examples:\n  covdelta fetch\n  covdelta fetch --workflow test.yml --output-dir base")]
    Fetch {
        /// Workflow file that uploads coverage
        #[arg(long)]
        workflow: Option<String>,
        /// Branch whose runs are searched
        #[arg(long)]
        branch: Option<String>,
        /// Directory the artifact is extracted into
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Pull request the base coverage is fetched for
        #[arg(long, env = "PULL_REQUEST_NUMBER")]
        pr: Option<String>,
        /// GitHub token used to read workflow artifacts
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
    /// Create a default .covdelta.toml configuration file
    #[command(long_about = "Create a default .covdelta.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .covdelta.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

const DEFAULT_CONFIG: &str = r#"# covdelta configuration
# See `covdelta --help` for details.

[github]
# owner = "azure"
# repo = "retina"
# api_url = "https://api.github.com"   # GITHUB_API_URL overrides this
# bot_login = "dependabot[bot]"        # PRs by this account get no comment

[report]
# title = "Retina Code Coverage Report"
# strip_prefix = "github.com/microsoft/retina/"
# current_file = "coverageexpanded.out"
# main_file = "maincoverageexpanded.out"

[artifact]
# workflow = "retina-test.yaml"
# branch = "main"
# name_contains = "coverage"
# output_dir = "mainbranchcoverage"
# file_name = "coverage.out"
# runs_per_page = 10
"#;

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env("COVDELTA_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<CovdeltaConfig> {
    let config = match path {
        Some(path) => CovdeltaConfig::from_file(path)?,
        None => {
            let default_path = Path::new(CONFIG_FILE);
            if default_path.exists() {
                CovdeltaConfig::from_file(default_path)?
            } else {
                CovdeltaConfig::default()
            }
        }
    };
    Ok(config)
}

/// Treat unset and empty values alike, as CI often exports empty variables.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

async fn run_compare(
    config: &CovdeltaConfig,
    format: OutputFormat,
    current: Option<PathBuf>,
    main: Option<PathBuf>,
    pr: Option<String>,
    token: Option<String>,
    dry_run: bool,
) -> Result<()> {
    let pr = non_empty(pr);
    let token = non_empty(token);

    let target = if dry_run {
        None
    } else {
        let Some(pr) = pr else {
            tracing::info!("no pull request number found, nothing to do");
            return Ok(());
        };
        let Some(token) = token else {
            tracing::info!("no GitHub token found, nothing to do");
            return Ok(());
        };
        let number: u64 = pr.trim().parse().map_err(|_| {
            miette::miette!(
                help = "PULL_REQUEST_NUMBER must be a positive integer",
                "invalid pull request number '{pr}'"
            )
        })?;
        tracing::info!(pr = number, "comparing coverage for pull request");
        Some((number, token))
    };

    let current_path = current.unwrap_or_else(|| config.report.current_file.clone());
    let main_path = main.unwrap_or_else(|| config.report.main_file.clone());

    let current_report = covdelta_report::parser::parse_coverage_file(&current_path)?;
    let main_report = covdelta_report::parser::parse_coverage_file(&main_path)?;
    let diff = covdelta_report::diff::diff_reports(
        &covdelta_report::average::average_report(&main_report)?,
        &covdelta_report::average::average_report(&current_report)?,
    );

    let body = covdelta_report::render::render_report(&diff, &RenderOptions::from(&config.report));
    match format {
        OutputFormat::Markdown => print!("{body}"),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&diff).into_diagnostic()?);
        }
    }

    let Some((number, token)) = target else {
        return Ok(());
    };

    let client = covdelta_github::GitHubClient::new(&token, &config.github)?;
    let outcome = covdelta_github::publish::publish_report(
        &client,
        number,
        &body,
        &PublishOptions::from(config),
    )
    .await?;

    match outcome {
        PublishOutcome::SkippedBot { login } => {
            eprintln!("PR #{number} was opened by {login}, not posting a comment");
        }
        PublishOutcome::Updated { comment_id } => {
            eprintln!("Updated coverage comment {comment_id} on PR #{number}");
        }
        PublishOutcome::Created { comment_id } => {
            eprintln!("Posted coverage comment {comment_id} on PR #{number}");
        }
    }
    Ok(())
}

async fn run_fetch(
    config: &CovdeltaConfig,
    workflow: Option<String>,
    branch: Option<String>,
    output_dir: Option<PathBuf>,
    pr: Option<String>,
    token: Option<String>,
) -> Result<()> {
    if non_empty(pr).is_none() {
        tracing::info!("no pull request number found, nothing to do");
        return Ok(());
    }
    let Some(token) = non_empty(token) else {
        tracing::info!("no GitHub token found, nothing to do");
        return Ok(());
    };

    let mut artifact = config.artifact.clone();
    if let Some(workflow) = workflow {
        artifact.workflow = workflow;
    }
    if let Some(branch) = branch {
        artifact.branch = branch;
    }
    if let Some(dir) = output_dir {
        artifact.output_dir = dir;
    }

    let client = covdelta_github::GitHubClient::new(&token, &config.github)?;

    let spinner = if std::io::stderr().is_terminal() {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
                .into_diagnostic()?,
        );
        pb.set_message(format!(
            "Fetching {} coverage from {}...",
            artifact.branch, artifact.workflow
        ));
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        Some(pb)
    } else {
        None
    };

    let path = covdelta_github::artifact::fetch_base_coverage(&client, &artifact)
        .await
        .inspect_err(|_e| {
            if let Some(pb) = &spinner {
                pb.finish_with_message("Failed");
            }
        })?;

    if let Some(pb) = spinner {
        pb.finish_with_message("Done");
    }
    println!("{}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(format = %cli.format, owner = %config.github.owner, repo = %config.github.repo, "loaded configuration");

    match cli.command {
        None => {
            let mut cmd = Cli::command();
            cmd.print_help().into_diagnostic()?;
        }
        Some(Command::Compare {
            current,
            main,
            pr,
            token,
            dry_run,
        }) => {
            run_compare(&config, cli.format, current, main, pr, token, dry_run).await?;
        }
        Some(Command::Fetch {
            workflow,
            branch,
            output_dir,
            pr,
            token,
        }) => {
            run_fetch(&config, workflow, branch, output_dir, pr, token).await?;
        }
        Some(Command::Init) => {
            let path = Path::new(CONFIG_FILE);
            if path.exists() {
                miette::bail!("{CONFIG_FILE} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {CONFIG_FILE} with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "covdelta", &mut std::io::stdout());
        }
    }

    Ok(())
}
