use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use depbump::cli::orchestration::{BumpWorkflow, WorkflowOutcome};
use depbump::cli::Args;
use depbump::config::{self, Credentials};
use depbump::git::Git2Repository;
use depbump::hosting::GitHubApi;
use depbump::{logging, ui};

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.verbose);

    match run(&args) {
        Ok(outcome) => {
            ui::display_outcome(&outcome);
            ExitCode::SUCCESS
        }
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<WorkflowOutcome> {
    // Nothing touches the repository or the network without credentials.
    let credentials = Credentials::from_env()?;

    let mut config = config::load_config(args.config.as_deref(), &args.repository_path)
        .context("Error loading config")?;
    args.apply_overrides(&mut config);

    let repo = Git2Repository::open(&args.repository_path)?
        .with_credentials(credentials.clone())
        .with_author(config.commit.author());
    let hosting = GitHubApi::default();

    let request = args.bump_request();
    ui::display_status(&format!(
        "Bumping {} from {} to {} on {}",
        request.package_name,
        request.before_version,
        request.after_version,
        request.names().branch
    ));

    let workflow = BumpWorkflow::new(&repo, &hosting, &config, credentials);
    let outcome = workflow
        .run(&request)
        .with_context(|| format!("bump aborted at stage '{}'", workflow.stage()))?;

    ui::display_success(&format!(
        "Opened pull request #{}",
        outcome.pull_request.number
    ));
    Ok(outcome)
}
