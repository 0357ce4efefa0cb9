use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::detail::{DetailGenerator, GenerationError};
use crate::llm::prompts::{build_detail_prompt, SYSTEM_PROMPT};
use crate::models::{TicketDetail, TicketDraft};

/// Configuration for the Anthropic API client
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key (from ANTHROPIC_API_KEY env var)
    pub api_key: String,
    /// Model to use (e.g., "claude-sonnet-4-20250514")
    pub model: String,
    /// Temperature (0-1, lower = more deterministic)
    pub temperature: f64,
    /// Maximum tokens in response
    pub max_tokens: u32,
}

impl AnthropicConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY environment variable not set")?;

        Ok(Self {
            api_key,
            model: "claude-sonnet-4-20250514".to_string(),
            temperature: 0.2,
            max_tokens: 4096,
        })
    }

    /// Create with custom settings
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            temperature: 0.2,
            max_tokens: 4096,
        }
    }
}

/// Anthropic-backed detail generator
///
/// Holds the problem/solution context strings supplied at construction
/// (typically the source transcript and any solutioning notes) and expands
/// one draft per call through forced tool use.
pub struct AnthropicGenerator {
    client: Client,
    config: AnthropicConfig,
    problem_context: String,
    solution_context: String,
}

impl AnthropicGenerator {
    pub fn new(config: AnthropicConfig, problem_context: String, solution_context: String) -> Self {
        Self {
            client: Client::new(),
            config,
            problem_context,
            solution_context,
        }
    }

    /// Call the Messages API with tool use for structured output
    async fn generate_detail(&self, draft: &TicketDraft) -> Result<TicketDetail> {
        let user = build_detail_prompt(draft, &self.problem_context, &self.solution_context);

        let tool = Tool {
            name: "submit_detail".to_string(),
            description: "Submit the expanded ticket detail".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string"},
                    "priority": {"type": "string", "enum": ["high", "med", "low"]},
                    "status": {
                        "type": "string",
                        "description": "Suggested workflow status, e.g. todo"
                    },
                    "problem_statement": {
                        "type": "string",
                        "description": "One paragraph on what is wrong for the user"
                    },
                    "description": {"type": "string"},
                    "acceptance_criteria": {
                        "type": "array",
                        "items": {"type": "string"}
                    },
                    "quotes": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "text": {"type": "string"},
                                "speaker": {"type": "string"},
                                "timestamp": {"type": "string"},
                                "summary": {"type": "string"}
                            },
                            "required": ["text"]
                        }
                    }
                },
                "required": ["title", "priority", "description", "acceptance_criteria"]
            }),
        };

        let request = AnthropicToolRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            system: Some(SYSTEM_PROMPT.to_string()),
            messages: vec![Message {
                role: "user".to_string(),
                content: user,
            }],
            tools: vec![tool],
            tool_choice: Some(ToolChoice {
                choice_type: "tool".to_string(),
                name: "submit_detail".to_string(),
            }),
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Anthropic API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error: {} - {}", status, body);
        }

        let response: AnthropicResponse = response
            .json()
            .await
            .context("Failed to parse Anthropic API response")?;

        // Find the tool_use content block
        for content in &response.content {
            if content.content_type == "tool_use" && content.name.as_deref() == Some("submit_detail")
            {
                if let Some(input) = &content.input {
                    let detail: TicketDetail = serde_json::from_value(input.clone())
                        .context("Failed to parse tool input as TicketDetail")?;
                    return Ok(detail);
                }
            }
        }

        anyhow::bail!("No tool_use response found")
    }
}

#[async_trait]
impl DetailGenerator for AnthropicGenerator {
    async fn generate(&self, draft: &TicketDraft) -> Result<TicketDetail, GenerationError> {
        self.generate_detail(draft)
            .await
            .map_err(|err| GenerationError::Generator(format!("{err:#}")))
    }
}

#[derive(Debug, Serialize)]
struct AnthropicToolRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
    tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct Tool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct ToolChoice {
    #[serde(rename = "type")]
    choice_type: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: Option<serde_json::Value>,
}
