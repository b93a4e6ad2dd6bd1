// Generic resource operations.
//
// Every CBRAIN collection (files, tags, tasks, ...) is driven through the
// same handful of calls; `ResourceKind` supplies the endpoint path and
// the wording used when the server answers 404.

use super::{ApiClient, Body};
use crate::error::{Error, Result};
use reqwest::Method;
use serde_json::Value;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PER_PAGE: i64 = 25;
pub const MIN_PER_PAGE: i64 = 5;
pub const MAX_PER_PAGE: i64 = 1000;

/// A REST collection exposed by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    File,
    DataProvider,
    Project,
    Tool,
    ToolConfig,
    Tag,
    Task,
    RemoteResource,
    BackgroundActivity,
    User,
}

impl ResourceKind {
    /// Collection path relative to the server base URL.
    pub fn path(self) -> &'static str {
        match self {
            ResourceKind::File => "userfiles",
            ResourceKind::DataProvider => "data_providers",
            ResourceKind::Project => "groups",
            ResourceKind::Tool => "tools",
            ResourceKind::ToolConfig => "tool_configs",
            ResourceKind::Tag => "tags",
            ResourceKind::Task => "tasks",
            ResourceKind::RemoteResource => "bourreaux",
            ResourceKind::BackgroundActivity => "background_activities",
            ResourceKind::User => "users",
        }
    }

    /// Name used in user-facing messages.
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::File => "File",
            ResourceKind::DataProvider => "Data provider",
            ResourceKind::Project => "Project",
            ResourceKind::Tool => "Tool",
            ResourceKind::ToolConfig => "Tool configuration",
            ResourceKind::Tag => "Tag",
            ResourceKind::Task => "Task",
            ResourceKind::RemoteResource => "Remote resource",
            ResourceKind::BackgroundActivity => "Background activity",
            ResourceKind::User => "User",
        }
    }

    pub fn not_found(self, id: u64) -> String {
        format!("{} with ID {} not found", self.label(), id)
    }
}

/// Validated page/page-size pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    /// Accepts `page >= 1` and `5 <= per_page <= 1000`.
    pub fn new(page: i64, per_page: i64) -> Result<Self> {
        if !(MIN_PER_PAGE..=MAX_PER_PAGE).contains(&per_page) {
            return Err(Error::Validation(format!(
                "per-page must be between {} and {}",
                MIN_PER_PAGE, MAX_PER_PAGE
            )));
        }
        if page < 1 {
            return Err(Error::Validation("page must be 1 or greater".into()));
        }
        Ok(Pagination {
            page: u32::try_from(page)
                .map_err(|_| Error::Validation("page is too large".into()))?,
            per_page: per_page as u32,
        })
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination {
            page: DEFAULT_PAGE as u32,
            per_page: DEFAULT_PER_PAGE as u32,
        }
    }
}

/// Query string for a list call: optional filters plus pagination.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    filters: Vec<(String, String)>,
    pagination: Option<Pagination>,
}

impl ListQuery {
    pub fn paged(pagination: Pagination) -> Self {
        ListQuery {
            filters: Vec::new(),
            pagination: Some(pagination),
        }
    }

    /// Add `key=value` when the value is present.
    pub fn filter(mut self, key: &str, value: Option<impl ToString>) -> Self {
        if let Some(v) = value {
            self.filters.push((key.to_string(), v.to_string()));
        }
        self
    }

    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs = self.filters.clone();
        if let Some(p) = self.pagination {
            pairs.push(("page".into(), p.page.to_string()));
            pairs.push(("per_page".into(), p.per_page.to_string()));
        }
        pairs
    }
}

/// Operations on one collection.
pub struct ResourceApi<'a> {
    client: &'a ApiClient,
    kind: ResourceKind,
}

impl<'a> ResourceApi<'a> {
    pub(crate) fn new(client: &'a ApiClient, kind: ResourceKind) -> Self {
        ResourceApi { client, kind }
    }

    fn member(&self, id: u64) -> String {
        format!("{}/{}", self.kind.path(), id)
    }

    fn not_found(&self, id: u64) -> impl FnOnce() -> String {
        let kind = self.kind;
        move || kind.not_found(id)
    }

    /// GET the collection.
    pub fn list(&self, query: &ListQuery) -> Result<Value> {
        self.client.get(self.kind.path(), &query.pairs())
    }

    /// GET one member.
    pub fn show(&self, id: u64) -> Result<Value> {
        self.client
            .get(&self.member(id), &[] as &[(&str, &str)])
            .map_err(|e| e.or_not_found(self.not_found(id)))
    }

    /// POST a new member.
    pub fn create(&self, body: &Value) -> Result<Value> {
        self.client.post_json(self.kind.path(), body)
    }

    /// PUT changes to one member.
    pub fn update(&self, id: u64, body: &Value) -> Result<Value> {
        self.client
            .put_json(&self.member(id), body)
            .map_err(|e| e.or_not_found(self.not_found(id)))
    }

    /// DELETE one member.
    pub fn delete(&self, id: u64) -> Result<Value> {
        self.client
            .delete(&self.member(id))
            .map_err(|e| e.or_not_found(self.not_found(id)))
    }

    /// GET a member sub-route such as `data_providers/3/is_alive`.
    pub fn member_get(&self, id: u64, action: &str) -> Result<Value> {
        self.client
            .get(&format!("{}/{}", self.member(id), action), &[] as &[(&str, &str)])
            .map_err(|e| e.or_not_found(self.not_found(id)))
    }

    /// POST to a member sub-route with no body.
    pub fn member_post(&self, id: u64, action: &str) -> Result<Value> {
        self.client
            .request(
                Method::POST,
                &format!("{}/{}", self.member(id), action),
                &[] as &[(&str, &str)],
                Body::Empty,
            )
            .map_err(|e| e.or_not_found(self.not_found(id)))
    }

    /// POST to a collection sub-route such as `tasks/operation`.
    pub fn collection_post<Q: serde::Serialize + ?Sized>(
        &self,
        action: &str,
        query: &Q,
        body: Option<&Value>,
    ) -> Result<Value> {
        let body = match body {
            Some(v) => Body::Json(v),
            None => Body::Empty,
        };
        self.client.request(
            Method::POST,
            &format!("{}/{}", self.kind.path(), action),
            query,
            body,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::TestServer;
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, ResponseTemplate};

    #[test]
    fn pagination_bounds() {
        assert!(Pagination::new(1, 5).is_ok());
        assert!(Pagination::new(1, 1000).is_ok());
        assert!(Pagination::new(1, 4).is_err());
        assert!(Pagination::new(1, 1001).is_err());
        assert!(Pagination::new(0, 25).is_err());
        assert!(Pagination::new(-3, 25).is_err());
        assert_eq!(
            Pagination::new(1, 2).unwrap_err().to_string(),
            "Error: per-page must be between 5 and 1000"
        );
        assert_eq!(
            Pagination::new(0, 25).unwrap_err().to_string(),
            "Error: page must be 1 or greater"
        );
    }

    #[test]
    fn list_query_orders_filters_before_paging() {
        let q = ListQuery::paged(Pagination::new(2, 50).unwrap())
            .filter("group_id", Some(3))
            .filter("type", None::<String>);
        assert_eq!(
            q.pairs(),
            vec![
                ("group_id".to_string(), "3".to_string()),
                ("page".to_string(), "2".to_string()),
                ("per_page".to_string(), "50".to_string()),
            ]
        );
    }

    #[test]
    fn show_404_names_the_resource() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("GET"))
                .and(path("/tags/12"))
                .respond_with(ResponseTemplate::new(404)),
        );
        let api = ApiClient::new(&server.uri()).unwrap();
        let err = api.resource(ResourceKind::Tag).show(12).unwrap_err();
        assert_eq!(err.to_string(), "Error: Tag with ID 12 not found");
    }

    #[test]
    fn list_passes_pagination() {
        let server = TestServer::start();
        server.mount(
            Mock::given(method("GET"))
                .and(path("/bourreaux"))
                .and(query_param("per_page", "10"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!([]))),
        );
        let api = ApiClient::new(&server.uri()).unwrap();
        let q = ListQuery::paged(Pagination::new(1, 10).unwrap());
        assert_eq!(api.resource(ResourceKind::RemoteResource).list(&q).unwrap(), json!([]));
    }
}
