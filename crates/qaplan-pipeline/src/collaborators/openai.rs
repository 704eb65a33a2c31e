//! OpenAI-compatible chat completions structurer.

use async_trait::async_trait;
use qaplan_core::{TestCase, TestCaseSet};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use super::Structurer;
use crate::config::LlmSettings;
use crate::error::StructureError;

const SYSTEM_PROMPT: &str = "You are a QA automation expert. You extract test cases from \
QA documents and reply with a single JSON object and nothing else.";

/// Fixed extraction schema and labelling rules sent with every document.
const SCHEMA_PROMPT: &str = r#"Extract every test case from the QA document below into JSON.

Rules:
- Include every test case, even loosely written ones, and keep their IDs (TC-001, TC-002, ...).
- Break each description into short, ordered steps.
- test_type is one of: Functional, Security, Performance, Integration, UI/UX, Error Handling, Edge Case.
  Security covers authentication, authorization, SQL injection and XSS. Integration covers
  third-party services, APIs and databases. Edge Case covers boundaries and unusual input.
- priority is one of: Critical, High, Medium, Low.
  Critical: payments, security, authentication, data loss. High: major user-facing features.
  Medium: secondary features. Low: cosmetic issues.
- components lists the areas under test, e.g. "Login", "Payment Gateway", "Shopping Cart".
- Copy preconditions and expected results when the document states them; otherwise use "".

Reply with exactly this shape:
{
  "test_cases": [
    {
      "test_id": "TC-001",
      "title": "User Login with Valid Credentials",
      "description": "Verify that a registered user can log in with a correct email and password",
      "preconditions": "User account exists",
      "test_steps": ["Open the login page", "Enter a valid email", "Enter the password", "Click Login"],
      "expected_result": "User lands on the dashboard",
      "test_type": "Functional",
      "priority": "High",
      "components": ["Authentication", "Login"]
    }
  ]
}

QA document:
"#;

const TEMPERATURE: f64 = 0.1;

/// Calls `{base_url}/chat/completions` in JSON mode.
#[derive(Debug, Clone, Default)]
pub struct OpenAiStructurer {
    client: reqwest::Client,
}

impl OpenAiStructurer {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

/// Request body for one structuring call.
pub fn request_body(model: &str, text: &str) -> Value {
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": format!("{}{}", SCHEMA_PROMPT, text) }
        ],
        "temperature": TEMPERATURE,
        "response_format": { "type": "json_object" }
    })
}

/// Map a non-success HTTP reply to a structuring error.
pub fn classify_failure(status: u16, body: &str) -> StructureError {
    let detail = format!("HTTP {}: {}", status, body.trim());
    let lower = body.to_ascii_lowercase();

    if status == 401 || lower.contains("invalid_api_key") {
        StructureError::InvalidCredential(detail)
    } else if lower.contains("insufficient_quota") {
        StructureError::QuotaExhausted(detail)
    } else if lower.contains("rate_limit") {
        StructureError::RateLimited(detail)
    } else if status == 429 {
        StructureError::QuotaExhausted(detail)
    } else {
        StructureError::Provider(detail)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Payload {
    Wrapped(TestCaseSet),
    Bare(Vec<TestCase>),
}

/// Drop a surrounding Markdown code fence, if the model added one.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Pull the records out of a chat completions response body.
pub fn parse_completion(body: &Value) -> Result<Vec<TestCase>, StructureError> {
    let content = body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| StructureError::MalformedResponse("missing message content".to_string()))?;

    match serde_json::from_str::<Payload>(strip_code_fence(content)) {
        Ok(Payload::Wrapped(set)) => Ok(set.test_cases),
        Ok(Payload::Bare(records)) => Ok(records),
        Err(e) => Err(StructureError::MalformedResponse(e.to_string())),
    }
}

#[async_trait]
impl Structurer for OpenAiStructurer {
    async fn structure(
        &self,
        text: &str,
        settings: &LlmSettings,
    ) -> Result<Vec<TestCase>, StructureError> {
        let api_key = settings
            .credential()
            .ok_or(StructureError::MissingCredential)?;
        let url = settings.chat_completions_url();

        info!(model = %settings.model, chars = text.len(), "Calling language model");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .timeout(settings.timeout())
            .json(&request_body(&settings.model, text))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    StructureError::Provider(format!(
                        "request timed out after {}s",
                        settings.timeout_secs
                    ))
                } else {
                    StructureError::Provider(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status.as_u16(), &body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| StructureError::MalformedResponse(e.to_string()))?;

        let records = parse_completion(&body)?;
        debug!(records = records.len(), "Parsed model response");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(content: &str) -> Value {
        json!({
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": content } }
            ]
        })
    }

    #[test]
    fn test_request_body_shape() {
        let body = request_body("gpt-4o-mini", "TC-001 Login");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        let user = body["messages"][1]["content"].as_str().unwrap();
        assert!(user.contains("test_cases"));
        assert!(user.ends_with("TC-001 Login"));
    }

    #[test]
    fn test_classify_failure() {
        assert!(matches!(
            classify_failure(401, "{}"),
            StructureError::InvalidCredential(_)
        ));
        assert!(matches!(
            classify_failure(400, r#"{"error":{"code":"invalid_api_key"}}"#),
            StructureError::InvalidCredential(_)
        ));
        assert!(matches!(
            classify_failure(429, r#"{"error":{"code":"insufficient_quota"}}"#),
            StructureError::QuotaExhausted(_)
        ));
        assert!(matches!(
            classify_failure(429, r#"{"error":{"code":"rate_limit_exceeded"}}"#),
            StructureError::RateLimited(_)
        ));
        assert!(matches!(
            classify_failure(429, ""),
            StructureError::QuotaExhausted(_)
        ));
        assert!(matches!(
            classify_failure(500, "upstream"),
            StructureError::Provider(_)
        ));
    }

    #[test]
    fn test_parse_wrapped_payload() {
        let content = r#"{"test_cases":[{"test_id":"TC-001","title":"Login","test_steps":["a","b"],"priority":"High","test_type":"Functional","components":["Login"]}]}"#;
        let records = parse_completion(&completion(content)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "TC-001");
        assert_eq!(records[0].steps.len(), 2);
        assert!(!records[0].is_scored());
    }

    #[test]
    fn test_parse_fenced_and_bare_payload() {
        let content = "```json\n[{\"test_id\":\"TC-002\",\"title\":\"Cart\"}]\n```";
        let records = parse_completion(&completion(content)).unwrap();
        assert_eq!(records[0].id, "TC-002");
    }

    #[test]
    fn test_parse_tolerates_null_fields() {
        let content = r#"{"test_cases":[
            {"test_id":"TC-001","title":"Login","preconditions":null,"test_steps":["a"],"priority":"High","components":null},
            {"test_id":"TC-002","title":"Checkout","description":null,"test_steps":null,"components":["Checkout"]}
        ]}"#;
        let records = parse_completion(&completion(content)).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].preconditions, "");
        assert!(records[0].components.is_empty());
        assert_eq!(records[0].priority, "High");
        assert!(records[1].steps.is_empty());
        assert_eq!(records[1].components, vec!["Checkout".to_string()]);
    }

    #[test]
    fn test_parse_rejects_non_json() {
        let err = parse_completion(&completion("Sorry, I cannot help")).unwrap_err();
        assert!(matches!(err, StructureError::MalformedResponse(_)));

        let err = parse_completion(&json!({ "choices": [] })).unwrap_err();
        assert!(matches!(err, StructureError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_missing_credential_fails_before_request() {
        let settings = LlmSettings::new("gpt-4o-mini", None).with_base_url("http://127.0.0.1:9");
        let err = OpenAiStructurer::new()
            .structure("TC-001", &settings)
            .await
            .unwrap_err();
        assert_eq!(err, StructureError::MissingCredential);
    }
}
