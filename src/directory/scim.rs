use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use super::{DirectoryUser, UserDirectory};
use crate::provider::client::{decode_json, WorkspaceEndpoint};
use crate::provider::error::{ProviderError, ProviderResult};

const USERS: &str = "/api/2.0/preview/scim/v2/Users";
const ATTRIBUTES: &str = "id,userName,displayName,emails,active";
pub const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListUsersResponse {
    #[serde(default)]
    pub total_results: Option<usize>,
    #[serde(default, rename = "Resources")]
    pub resources: Vec<ScimUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ScimUser {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub emails: Vec<ScimEmail>,
    /// Absent means active.
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScimEmail {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub primary: bool,
}

impl From<ScimUser> for DirectoryUser {
    fn from(u: ScimUser) -> Self {
        let email = u
            .emails
            .iter()
            .find(|e| e.primary)
            .or_else(|| u.emails.first())
            .map(|e| e.value.clone())
            .unwrap_or_default();
        DirectoryUser {
            id: u.id,
            display_name: u.display_name.unwrap_or_default(),
            user_name: u.user_name,
            email,
            active: u.active.unwrap_or(true),
        }
    }
}

/// SCIM Users listing, paged and sorted by userName.
pub struct ScimDirectory {
    endpoint: WorkspaceEndpoint,
    page_size: usize,
}

impl ScimDirectory {
    pub fn new(endpoint: WorkspaceEndpoint) -> Self {
        Self {
            endpoint,
            page_size: PAGE_SIZE,
        }
    }

    async fn page(&self, start_index: usize) -> ProviderResult<ListUsersResponse> {
        let req = self.endpoint.get(USERS).query(&[
            ("attributes", ATTRIBUTES.to_string()),
            ("sortBy", "userName".to_string()),
            ("startIndex", start_index.to_string()),
            ("count", self.page_size.to_string()),
        ]);
        decode_json(req.send().await?).await
    }
}

#[async_trait]
impl UserDirectory for ScimDirectory {
    async fn list_users(&self) -> ProviderResult<Vec<DirectoryUser>> {
        let mut users: Vec<DirectoryUser> = Vec::new();
        // SCIM indexes are 1-based.
        let mut start_index = 1;

        loop {
            let page = self.page(start_index).await?;
            let fetched = page.resources.len();
            users.extend(page.resources.into_iter().map(DirectoryUser::from));
            debug!(start_index, fetched, total = ?page.total_results, "Fetched SCIM page");

            let done = match page.total_results {
                Some(total) => users.len() >= total,
                None => fetched < self.page_size,
            };
            if done || fetched == 0 {
                break;
            }
            start_index += fetched;
        }

        if users.iter().any(|u| u.id.is_empty()) {
            return Err(ProviderError::MissingField("id"));
        }
        info!(count = users.len(), "Listed workspace users");
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scim_page() {
        let body = r#"{
            "totalResults": 2,
            "startIndex": 1,
            "itemsPerPage": 2,
            "Resources": [
                {"id": "101", "userName": "ada@corp.com", "displayName": "Ada",
                 "emails": [{"value": "ada@work.com", "primary": false},
                            {"value": "ada@corp.com", "primary": true}],
                 "active": true},
                {"id": "102", "userName": "bob@corp.com", "active": false}
            ]
        }"#;
        let page: ListUsersResponse = serde_json::from_str(body).unwrap();
        assert_eq!(page.total_results, Some(2));
        let users: Vec<DirectoryUser> = page.resources.into_iter().map(Into::into).collect();
        assert_eq!(users[0].email, "ada@corp.com");
        assert_eq!(users[0].display_name, "Ada");
        assert!(users[0].active);
        assert_eq!(users[1].email, "");
        assert!(!users[1].active);
    }

    #[test]
    fn test_missing_active_means_active() {
        let body = r#"{"Resources": [{"id": "7", "userName": "c"}]}"#;
        let page: ListUsersResponse = serde_json::from_str(body).unwrap();
        let user: DirectoryUser = page.resources.into_iter().next().unwrap().into();
        assert!(user.active);
        assert!(page.total_results.is_none());
    }
}
