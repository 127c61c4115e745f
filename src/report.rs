// Plain-text report.
// Lays out the account snapshot and aggregated totals for humans and templates.

use chrono::{DateTime, Utc};

use crate::github::AccountSnapshot;
use crate::stats::Totals;

/// Whole days between account creation and `now`.
pub fn account_age_days(created_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(created_at).num_days().max(0)
}

/// Render the report. `now` is injected so output is reproducible.
///
/// `branch_commits` is the all-branch commit count from the repository listing; the row is
/// omitted when the listing did not report one.
pub fn render_report(
    snapshot: &AccountSnapshot,
    totals: &Totals,
    branch_commits: Option<u64>,
    now: DateTime<Utc>,
) -> String {
    let mut rows: Vec<(&str, String)> = vec![
        (
            "Account created",
            snapshot.created_at.format("%Y-%m-%d").to_string(),
        ),
        (
            "Account age",
            format!("{} days", account_age_days(snapshot.created_at, now)),
        ),
        ("Repositories", totals.repo_count.to_string()),
        ("Contributed to", totals.contributed_to_count.to_string()),
        ("Commits", totals.total_commits.to_string()),
    ];
    if let Some(commits) = branch_commits {
        rows.push(("Branch commits", commits.to_string()));
    }
    rows.extend([
        ("Lines added", totals.lines_added.to_string()),
        ("Lines deleted", totals.lines_deleted.to_string()),
        ("Net lines", totals.net_lines().to_string()),
        ("Public repositories", snapshot.public_repo_count.to_string()),
        ("Stars", snapshot.starred_count.to_string()),
        ("Followers", snapshot.followers.to_string()),
        (
            "Pull requests",
            format!(
                "{} merged, {} open",
                snapshot.merged_pr_count, snapshot.open_pr_count
            ),
        ),
        (
            "Issues",
            format!(
                "{} closed, {} open",
                snapshot.closed_issue_count, snapshot.open_issue_count
            ),
        ),
    ]);

    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    rows.iter()
        .map(|(label, value)| format!("{label:<width$}  {value}\n"))
        .collect()
}
