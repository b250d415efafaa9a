use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

pub const FALLBACK_USER_RESPONSE: &str =
    "Thanks for your feedback! Your review has been recorded.";

const MODEL: &str = "llama-3.3-70b-versatile";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// The three-field JSON payload the model is instructed to emit.
#[derive(Debug, Deserialize)]
struct AnalysisPayload {
    user_response: Option<String>,
    summary: Option<String>,
    actions: Option<Vec<String>>,
}

/// Outcome of one analysis call. `user_response` is always populated;
/// `error_message` is set only when `success` is false.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub success: bool,
    pub user_response: String,
    pub summary: Option<String>,
    pub actions: Vec<String>,
    pub error_message: Option<String>,
}

pub struct GroqClient {
    client: Client,
    api_key: String,
    api_url: String,
}

impl GroqClient {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            api_url,
        }
    }

    /// Analyzes one review. Never fails outward: every failure mode collapses
    /// into a fallback result so the submission pipeline has one code path.
    pub async fn analyze(&self, rating: i32, review_text: &str) -> AnalysisResult {
        if self.api_key.trim().is_empty() {
            warn!("Groq API key not configured, using fallback response");
            return fallback_result("Groq API key not configured");
        }

        let body = ChatRequest {
            model: MODEL.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: build_prompt(rating, review_text),
            }],
            temperature: 0.7,
            max_tokens: 1024,
        };

        let response = match self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                error!("Groq API call failed: {}", e);
                return fallback_result(format!("Groq API call failed: {}", e));
            }
        };

        let status = response.status();
        let text = match response.text().await {
            Ok(t) => t,
            Err(e) => {
                error!("Failed to read Groq response body: {}", e);
                return fallback_result(format!("Failed to read Groq response body: {}", e));
            }
        };

        if !status.is_success() {
            error!("Groq API returned status {}: {}", status, text);
            return fallback_result(format!("Groq API returned status {}", status));
        }

        parse_response(&text)
    }
}

fn build_prompt(rating: i32, review_text: &str) -> String {
    format!(
        r#"You are analyzing a customer feedback/review for a product or service.

Rating: {} out of 5 stars
Review: {}

Please analyze this review and provide a response in the following JSON format ONLY (no markdown, no code blocks, just pure JSON):
{{
    "user_response": "A friendly, personalized response to the customer acknowledging their feedback",
    "summary": "A brief 1-2 sentence summary of the key points from the review",
    "actions": ["action1", "action2"]
}}

The "actions" array should contain recommended follow-up actions for the business based on this feedback.
If the rating is low (1-2), include actions to address concerns.
If the rating is high (4-5), include actions to maintain satisfaction.

IMPORTANT: Return ONLY valid JSON, no additional text or formatting."#,
        rating, review_text
    )
}

fn parse_response(raw: &str) -> AnalysisResult {
    let envelope: ChatResponse = match serde_json::from_str(raw) {
        Ok(e) => e,
        Err(e) => {
            error!("Failed to parse Groq response envelope: {}", e);
            return fallback_result(format!("Failed to parse Groq response envelope: {}", e));
        }
    };

    let content = match envelope.choices.first() {
        Some(choice) => choice.message.content.as_deref().unwrap_or(""),
        None => {
            error!("No choices in Groq response");
            return fallback_result("No choices in Groq response");
        }
    };

    if content.trim().is_empty() {
        error!("Empty content in Groq response");
        return fallback_result("Empty content in Groq response");
    }

    let cleaned = clean_json_response(content);

    let payload: AnalysisPayload = match serde_json::from_str(&cleaned) {
        Ok(p) => p,
        Err(e) => {
            error!("Failed to parse Groq response payload: {}", e);
            return fallback_result(format!("Failed to parse Groq response payload: {}", e));
        }
    };

    AnalysisResult {
        success: true,
        user_response: payload
            .user_response
            .unwrap_or_else(|| FALLBACK_USER_RESPONSE.to_string()),
        summary: payload.summary,
        actions: payload.actions.unwrap_or_default(),
        error_message: None,
    }
}

/// Models routinely wrap the payload in a markdown code fence despite the
/// prompt; take the innermost fenced text when present, else just trim.
fn clean_json_response(text: &str) -> String {
    let fence = Regex::new(r"```(?:json)?\s*([\s\S]*?)\s*```").unwrap();
    match fence.captures(text) {
        Some(caps) => caps[1].trim().to_string(),
        None => text.trim().to_string(),
    }
}

fn fallback_result(error_message: impl Into<String>) -> AnalysisResult {
    AnalysisResult {
        success: false,
        user_response: FALLBACK_USER_RESPONSE.to_string(),
        summary: None,
        actions: Vec::new(),
        error_message: Some(error_message.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(content: &str) -> String {
        serde_json::json!({
            "choices": [{"message": {"content": content}}]
        })
        .to_string()
    }

    #[test]
    fn clean_strips_tagged_fence() {
        let text = "```json\n{\"summary\": \"ok\"}\n```";
        assert_eq!(clean_json_response(text), "{\"summary\": \"ok\"}");
    }

    #[test]
    fn clean_strips_untagged_fence() {
        let text = "```\n{\"a\":1}\n```";
        assert_eq!(clean_json_response(text), "{\"a\":1}");
    }

    #[test]
    fn clean_trims_unfenced_text() {
        assert_eq!(clean_json_response("  {\"a\":1}  \n"), "{\"a\":1}");
    }

    #[test]
    fn clean_keeps_only_fenced_part_of_prose() {
        let text = "Here is the JSON:\n```json\n{\"a\":1}\n```\nHope that helps!";
        assert_eq!(clean_json_response(text), "{\"a\":1}");
    }

    #[test]
    fn parse_success_extracts_all_fields() {
        let content = r#"{"user_response":"Thanks so much!","summary":"Customer unhappy with service","actions":["follow up with customer","offer refund"]}"#;
        let result = parse_response(&envelope(content));

        assert!(result.success);
        assert_eq!(result.user_response, "Thanks so much!");
        assert_eq!(
            result.summary.as_deref(),
            Some("Customer unhappy with service")
        );
        assert_eq!(
            result.actions,
            vec!["follow up with customer", "offer refund"]
        );
        assert!(result.error_message.is_none());
    }

    #[test]
    fn parse_success_with_fenced_payload() {
        let content = "```json\n{\"user_response\":\"Hi!\",\"summary\":\"Great\",\"actions\":[]}\n```";
        let result = parse_response(&envelope(content));

        assert!(result.success);
        assert_eq!(result.user_response, "Hi!");
        assert!(result.actions.is_empty());
    }

    #[test]
    fn parse_missing_actions_defaults_to_empty() {
        let content = r#"{"user_response":"Hi!","summary":"Great"}"#;
        let result = parse_response(&envelope(content));

        assert!(result.success);
        assert!(result.actions.is_empty());
    }

    #[test]
    fn parse_empty_choices_falls_back() {
        let result = parse_response(r#"{"choices":[]}"#);

        assert!(!result.success);
        assert_eq!(result.user_response, FALLBACK_USER_RESPONSE);
        assert_eq!(
            result.error_message.as_deref(),
            Some("No choices in Groq response")
        );
    }

    #[test]
    fn parse_blank_content_falls_back() {
        let result = parse_response(&envelope("   "));

        assert!(!result.success);
        assert_eq!(
            result.error_message.as_deref(),
            Some("Empty content in Groq response")
        );
    }

    #[test]
    fn parse_garbage_envelope_falls_back() {
        let result = parse_response("not json at all");

        assert!(!result.success);
        assert_eq!(result.user_response, FALLBACK_USER_RESPONSE);
        assert!(result.summary.is_none());
        assert!(result.actions.is_empty());
        assert!(result.error_message.is_some());
    }

    #[test]
    fn parse_unparsable_payload_falls_back() {
        let result = parse_response(&envelope("the model rambled instead of emitting JSON"));

        assert!(!result.success);
        assert_eq!(result.user_response, FALLBACK_USER_RESPONSE);
        assert!(result
            .error_message
            .as_deref()
            .unwrap()
            .starts_with("Failed to parse Groq response payload"));
    }
}
