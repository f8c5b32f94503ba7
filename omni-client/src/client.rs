//! Blocking SCIM client for the Omni identity API.
//!
//! One request at a time, no retries: a call either returns or yields an
//! [`ApiError`] the caller decides what to do with.

use omni_core::{Attributes, Group, GroupUpdate, User, UserId};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::scim::{
    filter_literal, resource_path, ListResponse, PatchRequest, PAGE_SIZE, SCIM_MEDIA_TYPE,
};
use crate::IdentityApi;

/// HTTP implementation of [`IdentityApi`] plus the read-only lookups the CLI
/// exposes.
#[derive(Debug, Clone)]
pub struct OmniClient {
    config: ClientConfig,
    agent: ureq::Agent,
}

impl OmniClient {
    pub fn new(config: ClientConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout)
            .user_agent(concat!("omni-user-manager/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { config, agent }
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Every user on the instance.
    pub fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.list_resources("Users", None)
    }

    /// Users whose `userName` contains `query`.
    pub fn search_users(&self, query: &str) -> Result<Vec<User>, ApiError> {
        let filter = format!("userName co {}", filter_literal(query));
        self.list_resources("Users", Some(&filter))
    }

    /// A single user by platform ID; `None` on 404.
    pub fn get_user_by_id(&self, id: &UserId) -> Result<Option<User>, ApiError> {
        self.get_optional(&resource_path("Users", &id.0))
    }

    // -----------------------------------------------------------------------
    // Groups
    // -----------------------------------------------------------------------

    /// Groups whose `displayName` contains `query`.
    pub fn search_groups(&self, query: &str) -> Result<Vec<Group>, ApiError> {
        let filter = format!("displayName co {}", filter_literal(query));
        self.list_resources("Groups", Some(&filter))
    }

    /// A single group by ID; `None` on 404.
    pub fn get_group_by_id(&self, id: &str) -> Result<Option<Group>, ApiError> {
        self.get_optional(&resource_path("Groups", id))
    }

    // -----------------------------------------------------------------------
    // Transport helpers
    // -----------------------------------------------------------------------

    fn request(&self, method: &'static str, url: &str) -> ureq::Request {
        self.agent
            .request(method, url)
            .set("Authorization", &format!("Bearer {}", self.config.api_key))
            .set("Accept", SCIM_MEDIA_TYPE)
    }

    fn send(
        &self,
        method: &'static str,
        url: &str,
        request: ureq::Request,
        body: Option<Value>,
    ) -> Result<ureq::Response, ApiError> {
        debug!("{method} {url}");
        let result = match body {
            Some(body) => request.set("Content-Type", SCIM_MEDIA_TYPE).send_json(body),
            None => request.call(),
        };
        result.map_err(|err| match err {
            ureq::Error::Status(status, response) => ApiError::Status {
                method,
                url: url.to_string(),
                status,
                body: response.into_string().unwrap_or_default(),
            },
            ureq::Error::Transport(transport) => ApiError::Transport {
                method,
                url: url.to_string(),
                message: transport.to_string(),
            },
        })
    }

    fn read_json<T: DeserializeOwned>(url: &str, response: ureq::Response) -> Result<T, ApiError> {
        response.into_json().map_err(|e| ApiError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    fn get_optional<T: DeserializeOwned>(&self, resource: &str) -> Result<Option<T>, ApiError> {
        let url = self.config.endpoint(resource);
        match self.send("GET", &url, self.request("GET", &url), None) {
            Ok(response) => Self::read_json(&url, response).map(Some),
            Err(ApiError::Status { status: 404, .. }) => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Page through a SCIM list endpoint.
    ///
    /// Stops on an empty page, or once the reported `totalResults` is reached
    /// when the server sends one.
    fn list_resources<T: DeserializeOwned>(
        &self,
        resource: &str,
        filter: Option<&str>,
    ) -> Result<Vec<T>, ApiError> {
        let url = self.config.endpoint(resource);
        let mut collected = Vec::new();
        let mut start_index = 1usize;
        loop {
            let mut request = self
                .request("GET", &url)
                .query("startIndex", &start_index.to_string())
                .query("count", &PAGE_SIZE.to_string());
            if let Some(filter) = filter {
                request = request.query("filter", filter);
            }
            let page: ListResponse<T> = Self::read_json(&url, self.send("GET", &url, request, None)?)?;
            let received = page.resources.len();
            collected.extend(page.resources);
            let reached_total = page
                .total_results
                .is_some_and(|total| collected.len() >= total);
            if received == 0 || reached_total {
                break;
            }
            start_index += received;
        }
        debug!("{url}: {} resources", collected.len());
        Ok(collected)
    }

    fn encode<T: serde::Serialize>(url: &str, body: &T) -> Result<Value, ApiError> {
        serde_json::to_value(body).map_err(|e| ApiError::Encode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

impl IdentityApi for OmniClient {
    fn get_groups(&self) -> Result<Vec<Group>, ApiError> {
        self.list_resources("Groups", None)
    }

    fn get_user(&self, user_name: &str) -> Result<Option<User>, ApiError> {
        let url = self.config.endpoint("Users");
        let filter = format!("userName eq {}", filter_literal(user_name));
        let request = self.request("GET", &url).query("filter", &filter);
        let page: ListResponse<User> = Self::read_json(&url, self.send("GET", &url, request, None)?)?;
        Ok(page.resources.into_iter().next())
    }

    fn update_group(&self, update: &GroupUpdate) -> Result<(), ApiError> {
        let url = self.config.endpoint(&resource_path("Groups", &update.id.0));
        let body = Self::encode(&url, update)?;
        self.send("PUT", &url, self.request("PUT", &url), Some(body))?;
        Ok(())
    }

    fn update_user_attributes(
        &self,
        user_id: &UserId,
        attributes: &Attributes,
    ) -> Result<(), ApiError> {
        let url = self.config.endpoint(&resource_path("Users", &user_id.0));
        let body = Self::encode(&url, &PatchRequest::replace_attributes(attributes))?;
        self.send("PATCH", &url, self.request("PATCH", &url), Some(body))?;
        Ok(())
    }
}
