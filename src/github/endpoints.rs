// GitHub API endpoint functions.
// Builds the listing endpoints and fetches the account-level data the pipeline needs.

use serde_json::{Value, json};

use crate::config::{Config, RepoSource};
use crate::error::{Result, StatsError};

use super::pagination::{Endpoint, Paginator, check_query_errors};
use super::transport::Transport;
use super::types::{AccountNode, AccountSnapshot, RepoRef, Repository, RepositoryNode};

const REPOSITORIES_QUERY: &str = r#"
query($login: String!, $first: Int!, $cursor: String) {
  user(login: $login) {
    repositories(first: $first, after: $cursor, ownerAffiliations: [OWNER, COLLABORATOR, ORGANIZATION_MEMBER]) {
      nodes {
        name
        owner { login }
        refs(refPrefix: "refs/heads/", first: 100) {
          nodes { target { ... on Commit { history { totalCount } } } }
        }
      }
      pageInfo { hasNextPage endCursor }
    }
  }
}"#;

const ACCOUNT_QUERY: &str = r#"
query($login: String!) {
  user(login: $login) {
    createdAt
    followers { totalCount }
    repositories(privacy: PUBLIC, ownerAffiliations: [OWNER]) { totalCount }
    starredRepositories { totalCount }
    mergedPullRequests: pullRequests(states: [MERGED]) { totalCount }
    openPullRequests: pullRequests(states: [OPEN]) { totalCount }
    closedIssues: issues(states: [CLOSED]) { totalCount }
    openIssues: issues(states: [OPEN]) { totalCount }
  }
}"#;

/// REST listing of the account's repositories.
pub fn user_repos_endpoint(config: &Config) -> Endpoint {
    Endpoint::Link {
        url: config.api_url(&format!(
            "/users/{}/repos?type=all&per_page={}",
            config.user, config.per_page
        )),
    }
}

/// GraphQL listing of repositories the account owns, collaborates on, or is a member of.
pub fn graph_repos_endpoint(config: &Config) -> Endpoint {
    Endpoint::Cursor {
        url: config.graphql_url(),
        query: REPOSITORIES_QUERY.to_string(),
        variables: json!({ "login": config.user, "first": config.per_page }),
        connection: "/data/user/repositories".to_string(),
    }
}

/// Commit listing for one repository.
pub fn commits_endpoint(config: &Config, repo: &RepoRef) -> Endpoint {
    Endpoint::Link {
        url: config.api_url(&format!(
            "/repos/{}/{}/commits?per_page={}",
            repo.owner, repo.name, config.per_page
        )),
    }
}

/// Enumerate the account's repositories from the configured source.
pub async fn list_repositories<X: Transport>(transport: &X, config: &Config) -> Result<Vec<RepoRef>> {
    let repos: Vec<RepoRef> = match config.repo_source {
        RepoSource::Rest => Paginator::<_, Repository>::new(transport, user_repos_endpoint(config))
            .collect_all()
            .await?
            .into_iter()
            .map(RepoRef::from)
            .collect(),
        RepoSource::Graphql => {
            Paginator::<_, RepositoryNode>::new(transport, graph_repos_endpoint(config))
                .collect_all()
                .await?
                .into_iter()
                .map(RepoRef::from)
                .collect()
        }
    };
    Ok(repos)
}

/// Fetch the live account counters in a single query.
pub async fn fetch_account_snapshot<X: Transport>(
    transport: &X,
    config: &Config,
) -> Result<AccountSnapshot> {
    let body = json!({ "query": ACCOUNT_QUERY, "variables": { "login": config.user } });
    let response = transport
        .post_json(&config.graphql_url(), &body)
        .await?
        .error_for_status()?;

    let mut value: Value = response.json()?;
    check_query_errors(&value)?;
    match value.pointer_mut("/data/user").map(Value::take) {
        Some(Value::Null) | None => Err(StatsError::Query(format!(
            "account {} not found",
            config.user
        ))),
        Some(user) => {
            let node: AccountNode = serde_json::from_value(user)?;
            Ok(node.into())
        }
    }
}
