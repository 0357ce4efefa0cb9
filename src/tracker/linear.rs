use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{TrackerClient, TrackerError};
use crate::models::{IssuePayload, IssueRef, Priority};

const LINEAR_API_URL: &str = "https://api.linear.app/graphql";

/// Linear GraphQL client
pub struct LinearClient {
    http: Client,
    api_key: String,
    team_id: String,
    api_url: String,
}

impl LinearClient {
    pub fn new(api_key: String, team_id: String) -> Self {
        Self {
            http: Client::new(),
            api_key,
            team_id,
            api_url: LINEAR_API_URL.to_string(),
        }
    }

    /// Point the client at a non-default endpoint (tests, proxies)
    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url;
        self
    }

    async fn post_graphql(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<serde_json::Value, TrackerError> {
        let request = GraphqlRequest {
            query: query.to_string(),
            variables,
        };

        let response = self
            .http
            .post(&self.api_url)
            .header(AUTHORIZATION, &self.api_key)
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|err| TrackerError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(TrackerError::from_status(status, body));
        }

        let body: GraphqlResponse = response
            .json()
            .await
            .map_err(|err| TrackerError::Transport(format!("invalid response body: {err}")))?;

        if let Some(errors) = body.errors {
            // Linear reports auth/permission problems as 200s with a typed
            // error extension
            if let Some(first) = errors.first() {
                let code = first
                    .extensions
                    .as_ref()
                    .and_then(|e| e.code.as_deref())
                    .unwrap_or_default();
                return Err(match code {
                    "AUTHENTICATION_ERROR" => TrackerError::Unauthorized,
                    "FORBIDDEN" | "PERMISSION_ERROR" => TrackerError::Forbidden,
                    "RATELIMITED" => TrackerError::RateLimited,
                    _ => TrackerError::Api {
                        status: status.as_u16(),
                        message: first.message.clone(),
                    },
                });
            }
            return Err(TrackerError::Api {
                status: status.as_u16(),
                message: "unknown GraphQL error".to_string(),
            });
        }

        body.data.ok_or_else(|| TrackerError::Api {
            status: status.as_u16(),
            message: "response carried no data".to_string(),
        })
    }

    /// Linear's priority scale: 1 urgent, 2 high, 3 normal, 4 low
    fn linear_priority(priority: Priority) -> u8 {
        match priority {
            Priority::High => 2,
            Priority::Med => 3,
            Priority::Low => 4,
        }
    }

    /// Render the payload as the markdown body Linear displays
    pub fn render_description(payload: &IssuePayload) -> String {
        let mut body = payload.description.trim().to_string();

        if !payload.acceptance_criteria.is_empty() {
            body.push_str("\n\n## Acceptance Criteria\n");
            for criterion in &payload.acceptance_criteria {
                body.push_str(&format!("- [ ] {criterion}\n"));
            }
        }

        if let Some(url) = &payload.source_link_url {
            body.push_str(&format!("\n\n[Source transcript]({url})"));
        }

        body
    }
}

#[async_trait]
impl TrackerClient for LinearClient {
    async fn validate_credentials(&self) -> Result<(), TrackerError> {
        let query = "query { viewer { id } }";
        let data = self.post_graphql(query, serde_json::json!({})).await?;

        let viewer: ViewerData = serde_json::from_value(data)
            .map_err(|err| TrackerError::Transport(format!("invalid viewer response: {err}")))?;
        if viewer.viewer.id.is_empty() {
            return Err(TrackerError::Unauthorized);
        }
        Ok(())
    }

    async fn create_issue(&self, payload: &IssuePayload) -> Result<IssueRef, TrackerError> {
        let query = r#"mutation IssueCreate($input: IssueCreateInput!) {
            issueCreate(input: $input) {
                success
                issue { id identifier url }
            }
        }"#;

        let variables = serde_json::json!({
            "input": {
                "teamId": self.team_id,
                "title": payload.title,
                "description": Self::render_description(payload),
                "priority": Self::linear_priority(payload.priority),
            }
        });

        let data = self.post_graphql(query, variables).await?;
        let created: IssueCreateData = serde_json::from_value(data)
            .map_err(|err| TrackerError::Transport(format!("invalid create response: {err}")))?;

        let result = created.issue_create;
        if !result.success {
            return Err(TrackerError::Api {
                status: 200,
                message: "issueCreate reported failure".to_string(),
            });
        }
        let issue = result.issue.ok_or_else(|| TrackerError::Api {
            status: 200,
            message: "issueCreate returned no issue".to_string(),
        })?;

        Ok(IssueRef {
            external_id: issue.id,
            external_key: issue.identifier,
            external_url: issue.url,
        })
    }
}

#[derive(Serialize)]
struct GraphqlRequest {
    query: String,
    variables: serde_json::Value,
}

#[derive(Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
    #[serde(default)]
    extensions: Option<GraphqlErrorExtensions>,
}

#[derive(Deserialize)]
struct GraphqlErrorExtensions {
    #[serde(default)]
    code: Option<String>,
}

#[derive(Deserialize)]
struct ViewerData {
    viewer: Viewer,
}

#[derive(Deserialize)]
struct Viewer {
    id: String,
}

#[derive(Deserialize)]
struct IssueCreateData {
    #[serde(rename = "issueCreate")]
    issue_create: IssueCreateResult,
}

#[derive(Deserialize)]
struct IssueCreateResult {
    success: bool,
    #[serde(default)]
    issue: Option<CreatedIssue>,
}

#[derive(Deserialize)]
struct CreatedIssue {
    id: String,
    identifier: String,
    url: String,
}
