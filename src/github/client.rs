//! Blocking GitHub REST client

use super::CodeHost;
use super::types::{CommentBody, IssueComment, NewRelease, PullRequest, Release, ReleaseAsset};
use crate::core::context::HostSettings;
use crate::core::error::{HostError, ReleaseError, ReleaseResult, ResultExt};
use reqwest::blocking::{Body, Client, RequestBuilder, Response};
use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::path::Path;
use std::time::Duration;

const PER_PAGE: usize = 100;
const API_VERSION: &str = "2022-11-28";

pub struct GitHubClient {
  http: Client,
  api_url: String,
  /// `owner/repo`
  repository: String,
  owner: String,
}

impl GitHubClient {
  pub fn new(settings: &HostSettings) -> ReleaseResult<Self> {
    let mut auth = HeaderValue::from_str(&format!("Bearer {}", settings.token))
      .map_err(|_| ReleaseError::message("GITHUB_TOKEN contains characters not allowed in an HTTP header"))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, auth);
    headers.insert(header::ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
    headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

    let http = Client::builder()
      .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
      .default_headers(headers)
      .connect_timeout(Duration::from_secs(30))
      .build()?;

    Ok(Self {
      http,
      api_url: settings.api_url.clone(),
      repository: settings.repository.to_string(),
      owner: settings.repository.owner.clone(),
    })
  }

  fn repo_url(&self, path: &str) -> String {
    format!("{}/repos/{}/{}", self.api_url, self.repository, path)
  }

  fn send(&self, method: &str, url: &str, request: RequestBuilder) -> ReleaseResult<Response> {
    tracing::debug!(method, url, "github request");
    let response = request.send()?;
    check_response(method, url, response)
  }

  fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> ReleaseResult<T> {
    let response = self.send("GET", url, self.http.get(url).query(query))?;
    Ok(response.json()?)
  }

  /// Follow `page=` until a short page comes back
  fn get_paginated<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> ReleaseResult<Vec<T>> {
    let mut items = Vec::new();
    for page in 1.. {
      let mut params = query.to_vec();
      params.push(("per_page", PER_PAGE.to_string()));
      params.push(("page", page.to_string()));

      let batch: Vec<T> = self.get_json(url, &params)?;
      let done = batch.len() < PER_PAGE;
      items.extend(batch);
      if done {
        break;
      }
    }
    Ok(items)
  }
}

impl CodeHost for GitHubClient {
  fn get_release_by_tag(&self, tag: &str) -> ReleaseResult<Release> {
    self.get_json(&self.repo_url(&format!("releases/tags/{}", tag)), &[])
  }

  fn create_release(&self, release: &NewRelease) -> ReleaseResult<Release> {
    let url = self.repo_url("releases");
    let response = self.send("POST", &url, self.http.post(&url).json(release))?;
    Ok(response.json()?)
  }

  fn list_release_assets(&self, release: &Release) -> ReleaseResult<Vec<ReleaseAsset>> {
    self.get_paginated(&self.repo_url(&format!("releases/{}/assets", release.id)), &[])
  }

  fn upload_asset(&self, release: &Release, name: &str, path: &Path) -> ReleaseResult<ReleaseAsset> {
    let url = release.upload_endpoint();
    if url.is_empty() {
      return Err(ReleaseError::message(format!(
        "Release {} has no upload URL",
        release.tag_name
      )));
    }

    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let len = file.metadata()?.len();

    let request = self
      .http
      .post(url)
      .query(&[("name", name), ("label", name)])
      .header(header::CONTENT_TYPE, "application/octet-stream")
      .header(header::CONTENT_LENGTH, len)
      .body(Body::sized(file, len));

    let response = self.send("POST", url, request)?;
    Ok(response.json()?)
  }

  fn list_issue_comments(&self, number: u64) -> ReleaseResult<Vec<IssueComment>> {
    self.get_paginated(&self.repo_url(&format!("issues/{}/comments", number)), &[])
  }

  fn create_comment(&self, number: u64, body: &str) -> ReleaseResult<IssueComment> {
    let url = self.repo_url(&format!("issues/{}/comments", number));
    let response = self.send("POST", &url, self.http.post(&url).json(&CommentBody { body }))?;
    Ok(response.json()?)
  }

  fn update_comment(&self, comment_id: u64, body: &str) -> ReleaseResult<IssueComment> {
    let url = self.repo_url(&format!("issues/comments/{}", comment_id));
    let response = self.send("PATCH", &url, self.http.patch(&url).json(&CommentBody { body }))?;
    Ok(response.json()?)
  }

  fn list_open_pulls_by_head(&self, branch: &str) -> ReleaseResult<Vec<PullRequest>> {
    let query = [
      ("state", "open".to_string()),
      ("head", format!("{}:{}", self.owner, branch)),
    ];
    self.get_paginated(&self.repo_url("pulls"), &query)
  }
}

fn check_response(method: &str, url: &str, response: Response) -> ReleaseResult<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }
  if status == reqwest::StatusCode::NOT_FOUND {
    return Err(ReleaseError::Host(HostError::NotFound {
      resource: url.to_string(),
    }));
  }

  let body = response.text().unwrap_or_default();
  Err(ReleaseError::Host(HostError::Status {
    method: method.to_string(),
    url: url.to_string(),
    status: status.as_u16(),
    body,
  }))
}
