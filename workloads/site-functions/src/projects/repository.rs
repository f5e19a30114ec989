//! Stable repository schema and normalization of the upstream payload.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A repository as served by `/api/projects`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplifiedRepository {
    pub name: String,
    pub url: String,
    pub homepage: String,
    pub language: String,
    pub description: String,
    pub topics: Vec<String>,
    pub is_fork: bool,
    pub is_archived: bool,
    pub has_pages: bool,
    pub stars: u64,
    pub forks: u64,
    pub updated_at: String,
}

impl SimplifiedRepository {
    /// Map one raw upstream element. Fields of the wrong type take their
    /// zero value; `None` when `name` or `html_url` is missing or empty.
    pub fn from_raw(raw: &Value) -> Option<Self> {
        let name = string_field(raw, "name");
        let url = string_field(raw, "html_url");
        if name.is_empty() || url.is_empty() {
            return None;
        }

        Some(Self {
            name,
            url,
            homepage: string_field(raw, "homepage"),
            language: string_field(raw, "language"),
            description: string_field(raw, "description"),
            topics: raw
                .get("topics")
                .and_then(Value::as_array)
                .map(|topics| {
                    topics
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            is_fork: bool_field(raw, "fork"),
            is_archived: bool_field(raw, "archived"),
            has_pages: bool_field(raw, "has_pages"),
            stars: count_field(raw, "stargazers_count"),
            forks: count_field(raw, "forks_count"),
            updated_at: string_field(raw, "updated_at"),
        })
    }
}

/// Normalize an upstream payload. Anything but an array yields an empty
/// list; elements are mapped independently.
pub fn normalize(payload: &Value) -> Vec<SimplifiedRepository> {
    payload
        .as_array()
        .map(|items| items.iter().filter_map(SimplifiedRepository::from_raw).collect())
        .unwrap_or_default()
}

/// Most recent `updatedAt` among `repositories` as an RFC 3339 UTC
/// timestamp, or empty when none parse.
///
/// Values are compared as instants; anything that is not RFC 3339 is
/// skipped.
pub fn last_updated(repositories: &[SimplifiedRepository]) -> String {
    repositories
        .iter()
        .filter_map(|r| DateTime::parse_from_rfc3339(&r.updated_at).ok())
        .map(|at| at.with_timezone(&Utc))
        .max()
        .map(|at| at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
        .unwrap_or_default()
}

fn string_field(raw: &Value, key: &str) -> String {
    raw.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn bool_field(raw: &Value, key: &str) -> bool {
    raw.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn count_field(raw: &Value, key: &str) -> u64 {
    raw.get(key).and_then(Value::as_u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_element() {
        let repos = normalize(&json!([{
            "name": "site",
            "html_url": "https://github.com/no-tone/site",
            "homepage": "https://no-tone.com",
            "language": "Rust",
            "description": "Personal site",
            "topics": ["astro", 7, "edge"],
            "fork": false,
            "archived": true,
            "has_pages": true,
            "stargazers_count": 12,
            "forks_count": 3,
            "updated_at": "2024-05-01T10:00:00Z",
            "owner": {"login": "no-tone"}
        }]));

        assert_eq!(
            repos,
            vec![SimplifiedRepository {
                name: "site".into(),
                url: "https://github.com/no-tone/site".into(),
                homepage: "https://no-tone.com".into(),
                language: "Rust".into(),
                description: "Personal site".into(),
                topics: vec!["astro".into(), "edge".into()],
                is_fork: false,
                is_archived: true,
                has_pages: true,
                stars: 12,
                forks: 3,
                updated_at: "2024-05-01T10:00:00Z".into(),
            }]
        );
    }

    #[test]
    fn test_wrong_types_take_defaults() {
        let repos = normalize(&json!([{
            "name": "x",
            "html_url": "y",
            "stargazers_count": "3",
            "forks_count": -1,
            "fork": "true",
            "homepage": null,
            "topics": "rust"
        }]));

        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].stars, 0);
        assert_eq!(repos[0].forks, 0);
        assert!(!repos[0].is_fork);
        assert_eq!(repos[0].homepage, "");
        assert!(repos[0].topics.is_empty());
    }

    #[test]
    fn test_elements_without_name_or_url_are_dropped() {
        let repos = normalize(&json!([
            {"name": "keep", "html_url": "u"},
            {"name": "", "html_url": "u"},
            {"html_url": "u"},
            {"name": "no-url"},
            {"name": 5, "html_url": "u"},
            "not an object",
            null
        ]));

        assert_eq!(repos.len(), 1);
        assert!(repos.iter().all(|r| !r.name.is_empty() && !r.url.is_empty()));
    }

    #[test]
    fn test_non_array_payloads_normalize_to_empty() {
        for payload in [
            json!(null),
            json!({"message": "API rate limit exceeded"}),
            json!("repos"),
            json!(42),
            json!(true),
        ] {
            assert!(normalize(&payload).is_empty(), "payload {payload}");
        }
    }

    #[test]
    fn test_serializes_camel_case() {
        let repo = SimplifiedRepository {
            name: "a".into(),
            url: "b".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&repo).unwrap();
        assert_eq!(value["isFork"], false);
        assert_eq!(value["hasPages"], false);
        assert_eq!(value["updatedAt"], "");
        assert!(value.get("is_fork").is_none());
    }

    #[test]
    fn test_last_updated() {
        let repo = |updated: &str| SimplifiedRepository {
            updated_at: updated.into(),
            ..Default::default()
        };
        assert_eq!(
            last_updated(&[repo("2024-01-01T00:00:00Z"), repo("2024-03-01T00:00:00Z"), repo("")]),
            "2024-03-01T00:00:00Z"
        );
        assert_eq!(last_updated(&[]), "");
    }

    #[test]
    fn test_last_updated_orders_by_instant() {
        let repo = |updated: &str| SimplifiedRepository {
            updated_at: updated.into(),
            ..Default::default()
        };
        assert_eq!(
            last_updated(&[repo("2024-06-01T12:00:00Z"), repo("2024-06-01T12:00:00.500Z")]),
            "2024-06-01T12:00:00.500Z"
        );
        // 13:30+02:00 is 11:30Z
        assert_eq!(
            last_updated(&[repo("2024-06-01T12:00:00Z"), repo("2024-06-01T13:30:00+02:00")]),
            "2024-06-01T12:00:00Z"
        );
        assert_eq!(
            last_updated(&[repo("2024-06-01T23:30:00-02:00")]),
            "2024-06-02T01:30:00Z"
        );
    }

    #[test]
    fn test_last_updated_skips_unparseable() {
        let repo = |updated: &str| SimplifiedRepository {
            updated_at: updated.into(),
            ..Default::default()
        };
        assert_eq!(
            last_updated(&[repo("2024-06-01T12:00:00Z"), repo("unknown"), repo("9999")]),
            "2024-06-01T12:00:00Z"
        );
        assert_eq!(last_updated(&[repo("unknown"), repo("")]), "");
    }
}
