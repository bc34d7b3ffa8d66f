use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// URLs for the four artifacts of one playable build, derived from the
/// project id. These are paths under the static `/builds` mount, not
/// absolute URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildUrls {
  pub loader_url: String,
  pub data_url: String,
  pub framework_url: String,
  pub code_url: String,
}

impl BuildUrls {
  /// Derive the four artifact URLs for a project id.
  pub fn for_project(id: &str) -> Self {
    Self {
      loader_url: format!("/builds/{id}/Build/{id}.loader.js"),
      data_url: format!("/builds/{id}/Build/{id}.data"),
      framework_url: format!("/builds/{id}/Build/{id}.framework.js"),
      code_url: format!("/builds/{id}/Build/{id}.wasm"),
    }
  }
}

/// One published build as stored in the catalog document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameEntry {
  /// Unique key across the catalog; caller-supplied project id.
  pub id: String,
  pub title: String,
  pub author: String,
  /// Optional classification code; empty string when not provided.
  #[serde(default)]
  pub module_code: String,
  pub upload_date: DateTime<Utc>,
  pub thumbnail: String,
  pub build: BuildUrls,
}

impl GameEntry {
  /// Construct a new entry for a freshly ingested build, deriving the
  /// thumbnail and artifact URLs from the project id.
  pub fn new(id: String, title: String, author: String, module_code: Option<String>) -> Self {
    let build = BuildUrls::for_project(&id);
    let thumbnail = format!("/builds/{id}/thumbnail.png");
    Self {
      id,
      title,
      author,
      module_code: module_code.unwrap_or_default(),
      upload_date: Utc::now(),
      thumbnail,
      build,
    }
  }
}

/// Partial update for an entry. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatch {
  pub title: Option<String>,
  pub author: Option<String>,
  pub module_code: Option<String>,
  pub upload_date: Option<DateTime<Utc>>,
}

impl EntryPatch {
  /// Apply the supplied fields to an entry, leaving the rest unchanged.
  pub fn apply(&self, entry: &mut GameEntry) {
    if let Some(title) = &self.title {
      entry.title = title.clone();
    }
    if let Some(author) = &self.author {
      entry.author = author.clone();
    }
    if let Some(module_code) = &self.module_code {
      entry.module_code = module_code.clone();
    }
    if let Some(upload_date) = self.upload_date {
      entry.upload_date = upload_date;
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn build_urls_derive_from_id() {
    let urls = BuildUrls::for_project("SpaceRun");
    assert_eq!(urls.loader_url, "/builds/SpaceRun/Build/SpaceRun.loader.js");
    assert_eq!(urls.data_url, "/builds/SpaceRun/Build/SpaceRun.data");
    assert_eq!(
      urls.framework_url,
      "/builds/SpaceRun/Build/SpaceRun.framework.js"
    );
    assert_eq!(urls.code_url, "/builds/SpaceRun/Build/SpaceRun.wasm");
  }

  #[test]
  fn entry_serializes_camel_case() {
    let entry = GameEntry::new(
      "demo".to_string(),
      "Demo".to_string(),
      "someone".to_string(),
      None,
    );
    let json = serde_json::to_value(&entry).unwrap();
    assert_eq!(json["moduleCode"], "");
    assert_eq!(json["thumbnail"], "/builds/demo/thumbnail.png");
    assert_eq!(json["build"]["codeUrl"], "/builds/demo/Build/demo.wasm");
    assert!(json["uploadDate"].is_string());
  }

  #[test]
  fn patch_applies_only_supplied_fields() {
    let mut entry = GameEntry::new(
      "demo".to_string(),
      "Old title".to_string(),
      "author".to_string(),
      Some("CS101".to_string()),
    );
    let before_date = entry.upload_date;

    let patch = EntryPatch {
      title: Some("New title".to_string()),
      ..Default::default()
    };
    patch.apply(&mut entry);

    assert_eq!(entry.title, "New title");
    assert_eq!(entry.author, "author");
    assert_eq!(entry.module_code, "CS101");
    assert_eq!(entry.upload_date, before_date);
  }
}
