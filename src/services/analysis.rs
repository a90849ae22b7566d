// src/services/analysis.rs
use log::{error, info};
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::errors::ReportError;
use crate::models::AnalysisRequest;

/// Role instruction sent with every request: the analyzer persona, the JSON
/// input shape, and the exact list markup the response must use.
const SYSTEM_PROMPT: &str = r#"You are a stock market analyzer. Your job is to receive input as follows:
{
    "Rate_Movement": float,
    "Market_Data": string
}
where "Rate_Movement" are basis points (bps) showing how the 10 Year Treasury Rate changed during the day.
"Market_Data" represents the market data for the day.

Your job is to use the information from "Market_Data" which can possibly explain the "Rate_Movement" and return an explanation using most of the "Market_Data" information. Do not add any preamble.
Make sure your response is an HTML formatted bullet list, your response should therefore be in the following format:
<ul>
    <li><strong>Short Heading</strong>: explanation point 1</li>
    <li><strong>Short Heading</strong>: explanation point 2</li>
    <li><strong>Short Heading</strong>: explanation point 3</li>
</ul>"#;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Client for the chat-completion endpoint. Holds its credential explicitly;
/// nothing here reads process-wide state after construction.
#[derive(Debug)]
pub struct AnalysisClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl AnalysisClient {
    pub fn new(config: &Config) -> Result<Self, ReportError> {
        if config.openai_api_key.trim().is_empty() {
            return Err(ReportError::Authentication(
                "completion endpoint credential is empty".to_string(),
            ));
        }
        Ok(AnalysisClient {
            http: Client::new(),
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        })
    }

    /// Ask the model to explain the yield movement in terms of the narrative.
    /// Single attempt; throttling and auth failures map to their own errors.
    pub async fn explain(&self, movement_bps: f64, narrative: &str) -> Result<String, ReportError> {
        let user_message = build_user_message(movement_bps, narrative)?;
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_message,
                },
            ],
        };

        let url = format!("{}/chat/completions", self.base_url);
        info!("Requesting analysis from {} (model {})", url, self.model);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ReportError::Upstream {
                status: 0,
                detail: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            error!("Completion endpoint returned {}: {}", status, detail);
            return Err(map_error_status(status, detail));
        }

        let body: ChatResponse = response.json().await.map_err(|e| ReportError::Upstream {
            status: status.as_u16(),
            detail: e.to_string(),
        })?;
        let content = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ReportError::Upstream {
                status: status.as_u16(),
                detail: "no choices in completion response".to_string(),
            })?;

        extract_list_markup(&content)
    }
}

/// Map a non-2xx completion-endpoint status onto the error taxonomy:
/// 401/403 are credential failures, 429 is throttling, everything else is an
/// upstream failure carrying the status and response body.
fn map_error_status(status: StatusCode, detail: String) -> ReportError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ReportError::Authentication(format!("completion endpoint returned {}", status))
        }
        StatusCode::TOO_MANY_REQUESTS => ReportError::RateLimit,
        s => ReportError::Upstream {
            status: s.as_u16(),
            detail,
        },
    }
}

/// Serialize the analysis request as the user message body.
fn build_user_message(movement_bps: f64, narrative: &str) -> Result<String, ReportError> {
    let request = AnalysisRequest {
        rate_movement: movement_bps,
        market_data: narrative.to_string(),
    };
    serde_json::to_string_pretty(&request).map_err(|e| ReportError::Upstream {
        status: 0,
        detail: format!("failed to encode analysis request: {}", e),
    })
}

/// Pull the first `<ul>...</ul>` block out of the model response, tolerating
/// code fences and stray preamble around it. The prompt requests list markup
/// but the model may not comply, so anything without a list holding at least
/// one item is rejected rather than embedded in the report.
pub fn extract_list_markup(content: &str) -> Result<String, ReportError> {
    let ul_re = Regex::new(r"(?s)<ul[^>]*>.*?</ul>")
        .map_err(|e| ReportError::MalformedAnalysis(e.to_string()))?;

    let markup = ul_re
        .find(content)
        .ok_or_else(|| {
            ReportError::MalformedAnalysis(format!("no <ul> block in response: {}", snippet(content)))
        })?
        .as_str();

    if !markup.contains("<li") {
        return Err(ReportError::MalformedAnalysis(
            "list contains no items".to_string(),
        ));
    }
    Ok(markup.to_string())
}

fn snippet(content: &str) -> String {
    let short: String = content.chars().take(120).collect();
    if short.len() < content.len() {
        format!("{}...", short)
    } else {
        short
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIST: &str = "<ul>\n    <li><strong>Fed</strong>: signaled a pause</li>\n</ul>";

    #[test]
    fn user_message_embeds_movement_and_narrative_verbatim() {
        let message = build_user_message(15.0, "Fed signals pause").unwrap();

        assert!(message.contains("15.0"));
        assert!(message.contains("Fed signals pause"));
        assert!(message.contains("\"Rate_Movement\""));
        assert!(message.contains("\"Market_Data\""));
    }

    #[test]
    fn long_narratives_are_embedded_unchanged() {
        let narrative = "word ".repeat(2000);
        let message = build_user_message(-3.5, &narrative).unwrap();

        assert!(message.contains(narrative.trim_end()));
        assert!(message.contains("-3.5"));
    }

    #[test]
    fn well_formed_list_passes_through() {
        assert_eq!(extract_list_markup(LIST).unwrap(), LIST);
    }

    #[test]
    fn code_fences_and_preamble_are_stripped() {
        let content = format!("Sure, here is the analysis:\n```html\n{}\n```", LIST);
        assert_eq!(extract_list_markup(&content).unwrap(), LIST);
    }

    #[test]
    fn prose_without_a_list_is_malformed() {
        let err = extract_list_markup("Yields rose because of the Fed.").unwrap_err();
        assert!(matches!(err, ReportError::MalformedAnalysis(_)));
    }

    #[test]
    fn empty_list_is_malformed() {
        let err = extract_list_markup("<ul></ul>").unwrap_err();
        assert!(matches!(err, ReportError::MalformedAnalysis(_)));
    }

    #[test]
    fn completion_response_parses() {
        let body = r#"{
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [
                {
                    "index": 0,
                    "message": {"role": "assistant", "content": "<ul><li>x</li></ul>"},
                    "finish_reason": "stop"
                }
            ]
        }"#;
        let parsed: ChatResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices[0].message.content, "<ul><li>x</li></ul>");
    }

    #[test]
    fn unauthorized_and_forbidden_map_to_authentication() {
        let err = map_error_status(StatusCode::UNAUTHORIZED, "bad key".to_string());
        assert!(matches!(err, ReportError::Authentication(_)));

        let err = map_error_status(StatusCode::FORBIDDEN, "no access".to_string());
        assert!(matches!(err, ReportError::Authentication(_)));
    }

    #[test]
    fn throttling_maps_to_rate_limit() {
        let err = map_error_status(StatusCode::TOO_MANY_REQUESTS, "slow down".to_string());
        assert!(matches!(err, ReportError::RateLimit));
    }

    #[test]
    fn other_failures_map_to_upstream_with_status_and_body() {
        let err = map_error_status(StatusCode::BAD_GATEWAY, "gateway down".to_string());
        match err {
            ReportError::Upstream { status, detail } => {
                assert_eq!(status, 502);
                assert_eq!(detail, "gateway down");
            }
            other => panic!("expected Upstream, got {:?}", other),
        }
    }

    #[test]
    fn empty_credential_is_rejected_at_construction() {
        let config = Config {
            openai_api_key: "".to_string(),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            maturity: "10 Yr".to_string(),
            lookback_days: 7,
            narrative_url: "https://example.com".to_string(),
            narrative_selector: "section.w-full".to_string(),
            open_after_render: false,
        };
        let err = AnalysisClient::new(&config).unwrap_err();
        assert!(matches!(err, ReportError::Authentication(_)));
    }

    // Live round trip, needs a real credential
    #[tokio::test]
    #[ignore = "requires OPENAI_API_KEY"]
    async fn live_explain_returns_list_markup() {
        dotenv::dotenv().ok();
        let config = Config::from_env().unwrap();
        let client = AnalysisClient::new(&config).unwrap();

        let markup = client
            .explain(15.0, "Stocks slipped as the Fed signaled a pause on rate cuts.")
            .await
            .unwrap();
        assert!(markup.starts_with("<ul"));
        assert!(markup.contains("<li"));
    }
}
