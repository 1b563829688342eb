//! CLA Bot Summoner
//!
//! Finds open pull requests by new contributors that lack the `cla-signed`
//! label and comments `@cla-bot check` on each of them.
//!
//! ## Usage
//! ```bash
//! # Comment on every matching PR
//! GITHUB_TOKEN=<TOKEN> \
//! summon-cla-bot --contributors new_contributors
//!
//! # Only list the PRs that would be commented on
//! GITHUB_TOKEN=<TOKEN> \
//! summon-cla-bot --contributors new_contributors --dry-run --format json
//!
//! # Run the embedded self-check
//! summon-cla-bot --test
//! ```

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use cla_bot::comments::{
    post_comments, post_comments_keep_going, CommentOutcome, CommentSummary, TokioPause,
};
use cla_bot::config::{GitHubConfig, DEFAULT_REPOSITORY, GITHUB_API_URL};
use cla_bot::contributors::read_contributors;
use cla_bot::discovery::find_pull_requests;
use cla_bot::github::GitHubClient;
use cla_bot::self_check;

/// Summon the CLA bot for all PRs by new contributors
#[derive(Parser, Debug)]
#[command(name = "summon-cla-bot")]
#[command(about = "Summon the CLA bot for all PRs by new contributors")]
#[command(version)]
struct Args {
    /// JSON file with new contributors
    #[arg(short, long, default_value = "new_contributors")]
    contributors: PathBuf,

    /// Repository in format owner/repo
    ///
    /// GitHub Actions always sets GITHUB_REPOSITORY, so workflow runs target
    /// their own repository and the default only applies to local runs.
    #[arg(long, env = "GITHUB_REPOSITORY", default_value = DEFAULT_REPOSITORY)]
    repo: String,

    /// GitHub token used for search and comments
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// GitHub API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = GITHUB_API_URL)]
    api_url: String,

    /// Find matching PRs but don't comment on them
    #[arg(long)]
    dry_run: bool,

    /// Keep commenting after a failed post and report every PR
    #[arg(long)]
    keep_going: bool,

    /// Output format: text (default), json
    #[arg(long, default_value = "text")]
    format: String,

    /// Print debug level logs
    #[arg(short, long)]
    verbose: bool,

    /// Run the embedded self-check instead of the job
    #[arg(short, long)]
    test: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    if args.test {
        self_check::run_summon_checks().await?;
        info!("Self-check passed");
        return Ok(());
    }

    let contributors = read_contributors(&args.contributors).with_context(|| {
        format!(
            "Failed to read new contributors: {}",
            args.contributors.display()
        )
    })?;
    debug!("Contributors: {:?}", contributors);

    if contributors.is_empty() {
        info!("No new contributors, nothing to do");
        return Ok(());
    }

    let token = args
        .token
        .clone()
        .context("GITHUB_TOKEN is not set (pass --token or set the environment variable)")?;
    let config = GitHubConfig::for_repository(&args.repo)?.with_api_base(&args.api_url);
    let client = GitHubClient::new(token, config.clone())?;

    let pr_numbers = find_pull_requests(&client, &config, &contributors)
        .await
        .context("Failed to search pull requests")?;

    if args.dry_run {
        info!("🔍 Would post '{}' on pull requests: {:?}", config.comment, pr_numbers);
        if args.format == "json" {
            let report = serde_json::json!({
                "repository": config.repository(),
                "pull_requests": pr_numbers,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        return Ok(());
    }

    info!("Posting '{}' comment on pull requests: {:?}", config.comment, pr_numbers);

    let summary = if args.keep_going {
        post_comments_keep_going(&client, &TokioPause, &config, &pr_numbers).await
    } else {
        post_comments(&client, &TokioPause, &config, &pr_numbers)
            .await
            .context("Failed to post comment")?;
        CommentSummary::from_results(
            config.repository(),
            pr_numbers.iter().map(|&n| CommentOutcome::success(n)).collect(),
        )
    };

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        _ => {
            info!(
                "{} {}/{} PR(s) commented in {}",
                if summary.all_succeeded() { "✅" } else { "⚠️" },
                summary.succeeded,
                summary.total,
                summary.repository
            );
            for outcome in summary.results.iter().filter(|r| !r.success) {
                warn!(
                    pr = outcome.pr_number,
                    "Not commented: {}",
                    outcome.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    // Exit with error if any failed
    if !summary.all_succeeded() {
        std::process::exit(1);
    }

    Ok(())
}
