//! Picker lookups for the lesson form (`/teacher/search/*`).

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use super::{ApiClient, RequestBody};
use crate::error::ApiResult;
use crate::models::LookupOption;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchKind {
    Fakultets,
    Groups,
    Rooms,
    Subjects,
    Paras,
    LessonTypes,
}

impl SearchKind {
    pub const ALL: [SearchKind; 6] = [
        SearchKind::Fakultets,
        SearchKind::Groups,
        SearchKind::Rooms,
        SearchKind::Subjects,
        SearchKind::Paras,
        SearchKind::LessonTypes,
    ];

    pub fn path_segment(self) -> &'static str {
        match self {
            SearchKind::Fakultets => "fakultets",
            SearchKind::Groups => "groups",
            SearchKind::Rooms => "rooms",
            SearchKind::Subjects => "subjects",
            SearchKind::Paras => "paras",
            SearchKind::LessonTypes => "lesson-types",
        }
    }

    /// Whether the endpoint filters by a `q` parameter.
    pub fn is_searchable(self) -> bool {
        matches!(
            self,
            SearchKind::Groups | SearchKind::Rooms | SearchKind::Subjects
        )
    }

    fn path(self) -> String {
        format!("/teacher/search/{}", self.path_segment())
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl FromStr for SearchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SearchKind::ALL
            .into_iter()
            .find(|kind| kind.path_segment() == s)
            .ok_or_else(|| {
                let known: Vec<_> = SearchKind::ALL.iter().map(|k| k.path_segment()).collect();
                format!("unknown lookup '{}', expected one of: {}", s, known.join(", "))
            })
    }
}

/// Ids arrive as numbers or strings depending on the endpoint.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Number(n) => n.to_string(),
            RawId::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawOption {
    id: RawId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    fakultet: Option<String>,
    /// Paras carry their label here instead of `name`
    #[serde(default)]
    time: Option<String>,
}

impl RawOption {
    fn into_option(self, kind: SearchKind) -> LookupOption {
        let name = match kind {
            SearchKind::Paras => self.time.or(self.name),
            _ => self.name,
        };
        LookupOption {
            id: self.id.into_string(),
            name: name.unwrap_or_default(),
            fakultet: match kind {
                SearchKind::Rooms => self.fakultet,
                _ => None,
            },
        }
    }
}

impl ApiClient {
    pub async fn get_fakultets(&self) -> ApiResult<Vec<String>> {
        let data: Value = self.get(&SearchKind::Fakultets.path(), None, true).await?;
        Ok(fakultet_names(data))
    }

    pub async fn search_groups(&self, q: Option<&str>) -> ApiResult<Vec<LookupOption>> {
        self.lookup(SearchKind::Groups, q, None).await
    }

    pub async fn search_rooms(
        &self,
        q: Option<&str>,
        fakultet: Option<&str>,
    ) -> ApiResult<Vec<LookupOption>> {
        self.lookup(SearchKind::Rooms, q, fakultet).await
    }

    pub async fn search_subjects(&self, q: Option<&str>) -> ApiResult<Vec<LookupOption>> {
        self.lookup(SearchKind::Subjects, q, None).await
    }

    pub async fn get_paras(&self) -> ApiResult<Vec<LookupOption>> {
        self.lookup(SearchKind::Paras, None, None).await
    }

    pub async fn get_lesson_types(&self) -> ApiResult<Vec<LookupOption>> {
        self.lookup(SearchKind::LessonTypes, None, None).await
    }

    /// Any lookup by kind. Faculties come back with the name as the id.
    pub async fn search(
        &self,
        kind: SearchKind,
        q: Option<&str>,
        fakultet: Option<&str>,
    ) -> ApiResult<Vec<LookupOption>> {
        match kind {
            SearchKind::Fakultets => Ok(self
                .get_fakultets()
                .await?
                .into_iter()
                .map(|name| LookupOption {
                    id: name.clone(),
                    name,
                    fakultet: None,
                })
                .collect()),
            _ => self.lookup(kind, q, fakultet).await,
        }
    }

    async fn lookup(
        &self,
        kind: SearchKind,
        q: Option<&str>,
        fakultet: Option<&str>,
    ) -> ApiResult<Vec<LookupOption>> {
        let mut params = RequestBody::new();
        if let Some(q) = q.map(str::trim).filter(|q| !q.is_empty()) {
            params = params.field("q", q);
        }
        if let Some(fakultet) = fakultet.filter(|f| !f.is_empty()) {
            params = params.field("fakultet", fakultet);
        }

        let raw: Option<Vec<RawOption>> = self.get(&kind.path(), Some(params), true).await?;
        Ok(raw
            .unwrap_or_default()
            .into_iter()
            .map(|o| o.into_option(kind))
            .collect())
    }
}

/// `fakultets` is either a list or an object whose values are the names.
fn fakultet_names(data: Value) -> Vec<String> {
    let values: Vec<Value> = match data {
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        _ => Vec::new(),
    };
    values
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::spawn;
    use crate::session::{MemoryTokenStore, Session};
    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    fn client(base_url: &str) -> ApiClient {
        ApiClient::with_timeouts(
            base_url,
            Session::new(Arc::new(MemoryTokenStore::with_token("tok"))),
            Duration::from_secs(5),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    async fn rooms(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        let q = params.get("q").cloned().unwrap_or_default();
        let fakultet = params.get("fakultet").cloned();
        Json(json!({
            "success": true,
            "data": [
                {"id": 2, "name": format!("{}-204", q), "fakultet": fakultet},
                {"id": "x7", "name": "Sport zali"}
            ]
        }))
    }

    async fn paras() -> Json<Value> {
        Json(json!({"success": true, "data": [{"id": 1, "time": "08:30-09:50"}, {"id": 2, "time": "10:00-11:20"}]}))
    }

    async fn groups(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        assert!(!params.contains_key("q"));
        Json(json!({"success": true, "data": [{"id": 5, "name": "221-21", "fakultet": "A"}]}))
    }

    #[test]
    fn test_kind_round_trip_names() {
        assert_eq!("lesson-types".parse::<SearchKind>(), Ok(SearchKind::LessonTypes));
        assert_eq!(SearchKind::Rooms.to_string(), "rooms");
        assert!("teachers".parse::<SearchKind>().is_err());
        assert!(SearchKind::Subjects.is_searchable());
        assert!(!SearchKind::Paras.is_searchable());
    }

    #[test]
    fn test_fakultets_array_or_map() {
        assert_eq!(fakultet_names(json!(["A", "B"])), vec!["A", "B"]);

        let mut names = fakultet_names(json!({"1": "Iqtisod", "2": "Fizika"}));
        names.sort();
        assert_eq!(names, vec!["Fizika", "Iqtisod"]);

        assert!(fakultet_names(Value::Null).is_empty());
    }

    #[tokio::test]
    async fn test_rooms_pass_query_and_faculty() {
        let base = spawn(Router::new().route("/teacher/search/rooms", get(rooms))).await;
        let api = client(&base);

        let options = api.search_rooms(Some(" A "), Some("A")).await.unwrap();
        assert_eq!(
            options,
            vec![
                LookupOption {
                    id: "2".to_string(),
                    name: "A-204".to_string(),
                    fakultet: Some("A".to_string()),
                },
                LookupOption {
                    id: "x7".to_string(),
                    name: "Sport zali".to_string(),
                    fakultet: None,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_paras_use_time_as_name_and_blank_query_is_dropped() {
        let base = spawn(
            Router::new()
                .route("/teacher/search/paras", get(paras))
                .route("/teacher/search/groups", get(groups)),
        )
        .await;
        let api = client(&base);

        let slots = api.get_paras().await.unwrap();
        assert_eq!(slots[0].name, "08:30-09:50");
        assert_eq!(slots[1].id, "2");

        let found = api.search(SearchKind::Groups, Some("  "), None).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "221-21");
        assert_eq!(found[0].fakultet, None);
    }

    #[tokio::test]
    async fn test_generic_search_for_fakultets() {
        async fn fakultets() -> Json<Value> {
            Json(json!({"success": true, "data": {"a": "A", "b": "B"}}))
        }
        let base = spawn(Router::new().route("/teacher/search/fakultets", get(fakultets))).await;
        let api = client(&base);

        let mut found = api.search(SearchKind::Fakultets, None, None).await.unwrap();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(found[0].id, "A");
        assert_eq!(found[1].name, "B");
    }
}
