//! The export command: collect repository audiences and write the
//! partitioned CSV files.

use std::path::PathBuf;
use std::sync::Arc;

use audience::{
    AudienceError, AudienceReport, DbProfileStore, GitHubClient, MemoryProfileStore, ProfileStore,
    Relation, Shutdown, UserProfile, collect_audience, connect_and_migrate, export_partitioned,
    parse_repo_url,
};
use clap::ValueEnum;
use console::Term;

use crate::config::Config;
use crate::progress::ProgressReporter;

/// Membership sets selectable on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum RelationArg {
    /// Users who starred the repository
    Stars,
    /// Users subscribed to notifications for the repository
    Watchers,
    /// Users who forked the repository
    Forks,
}

impl RelationArg {
    fn to_relation(self) -> Relation {
        match self {
            RelationArg::Stars => Relation::Stargazers,
            RelationArg::Watchers => Relation::Watchers,
            RelationArg::Forks => Relation::Forkers,
        }
    }
}

/// Map the CLI selection to relations, defaulting to all of them.
fn selected_relations(args: &[RelationArg]) -> Vec<Relation> {
    if args.is_empty() {
        Relation::ALL.to_vec()
    } else {
        args.iter().map(|arg| arg.to_relation()).collect()
    }
}

#[allow(clippy::too_many_arguments)]
pub(crate) async fn handle_export(
    urls: Vec<String>,
    relations: Vec<RelationArg>,
    token: Option<String>,
    output_dir: Option<PathBuf>,
    no_cache: bool,
    config: &Config,
    database_url: &str,
    shutdown: &Shutdown,
) -> Result<(), Box<dyn std::error::Error>> {
    // Validate every URL up front so a typo fails before any network
    // traffic or database writes.
    let repos = urls
        .iter()
        .map(|url| parse_repo_url(url))
        .collect::<Result<Vec<_>, _>>()?;

    let relations = selected_relations(&relations);

    let token = token.or_else(|| config.github_token());
    if token.is_none() {
        tracing::warn!(
            "No GitHub token configured; unauthenticated requests hit a much lower rate limit"
        );
    }
    let client = GitHubClient::new(token);

    let store: Box<dyn ProfileStore> = if no_cache {
        Box::new(MemoryProfileStore::new())
    } else {
        let db = connect_and_migrate(database_url).await?;
        Box::new(DbProfileStore::new(db))
    };

    let output_dir = output_dir.unwrap_or_else(|| config.export_dir());
    std::fs::create_dir_all(&output_dir)?;

    let is_tty = Term::stdout().is_term();

    // Profiles concatenated across repositories, in collection order.
    let mut profiles: Vec<UserProfile> = Vec::new();
    let mut failures: Vec<(String, AudienceError)> = Vec::new();

    for repo in &repos {
        if shutdown.is_cancelled() {
            break;
        }

        if is_tty {
            println!("Collecting audience of {}...", repo.slug());
        }

        let reporter = Arc::new(ProgressReporter::new());
        let callback = reporter.as_callback();

        let result = collect_audience(
            &client,
            store.as_ref(),
            repo,
            &relations,
            shutdown,
            Some(&callback),
        )
        .await;
        reporter.finish();

        match result {
            Ok(report) => {
                report_repo(&report, is_tty);
                profiles.extend(report.profiles);
            }
            Err(AudienceError::Cancelled) => break,
            Err(err) if err.is_fatal() => return Err(err.into()),
            Err(err) => {
                tracing::error!(repository = %repo.slug(), error = %err, "Collection failed");
                failures.push((repo.slug(), err));
            }
        }
    }

    for (slug, err) in &failures {
        eprintln!("Failed to collect {}: {}", slug, err);
    }
    if failures.len() == repos.len() {
        return Err("no repository could be collected".into());
    }

    let summary = export_partitioned(&output_dir, profiles)?;

    if is_tty {
        println!();
        if summary.total() == 0 {
            println!("Nothing to export.");
        } else {
            println!("Exported {} profiles:", summary.total());
            if let Some(path) = &summary.emails_path {
                println!("  {} with email    -> {}", summary.with_email, path.display());
            }
            if let Some(path) = &summary.no_emails_path {
                println!(
                    "  {} without email -> {}",
                    summary.without_email,
                    path.display()
                );
            }
        }
    } else {
        tracing::info!(
            with_email = summary.with_email,
            without_email = summary.without_email,
            "Export complete"
        );
    }

    // A cancelled run still exports what it collected, but the process
    // must exit non-zero like any other fatal outcome.
    if shutdown.is_cancelled() {
        return Err(AudienceError::Cancelled.into());
    }

    Ok(())
}

fn report_repo(report: &AudienceReport, is_tty: bool) {
    if is_tty {
        println!(
            "  {}: {} users ({} resolved, {} unresolved, {} from cache)",
            report.repository.slug(),
            report.total_usernames,
            report.resolved,
            report.unresolved,
            report.cache_hits,
        );
    } else {
        tracing::info!(
            repository = %report.repository.slug(),
            total_usernames = report.total_usernames,
            resolved = report.resolved,
            unresolved = report.unresolved,
            cache_hits = report.cache_hits,
            "Repository collected"
        );
    }
}
