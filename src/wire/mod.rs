use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ========================================
// Recommendation data model
// ========================================

/// Number of cases an initial analysis always yields.
pub const CASES_PER_SET: usize = 6;

/// Word every case title starts with.
pub const TITLE_MARKER: &str = "агент";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// First analysis of a role; yields a full set.
    Initial,
    /// Follow-up round; yields extra cases only.
    More,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationRecommendationSet {
    #[serde(default)]
    pub role_analysis: String,
    #[serde(default)]
    pub best_practices: String,
    pub automation_cases: Vec<AutomationCase>,
}

/// Every field tolerates nulls, missing keys and loosely typed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationCase {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
    /// Free-text label (high/medium/low in whatever language the model used).
    #[serde(default, deserialize_with = "lenient_text")]
    pub priority: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub roi_estimate: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub complexity: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub tools: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub system_prompt: String,
    #[serde(default, deserialize_with = "lenient_pipeline")]
    pub automation_pipeline: Pipeline,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default, deserialize_with = "lenient_text")]
    pub platform: String,
    #[serde(default, deserialize_with = "lenient_steps")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based position; 0 when the model sent nothing usable.
    #[serde(default, deserialize_with = "lenient_step_number")]
    pub step: u32,
    #[serde(default, deserialize_with = "lenient_text")]
    pub action: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub tool: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: String,
}

fn text_of(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(text_of(Value::deserialize(d)?).unwrap_or_default())
}

fn lenient_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items.into_iter().filter_map(text_of).collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    })
}

fn lenient_step_number<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()).unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

fn lenient_steps<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Step>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(items) => items.into_iter().filter_map(|v| Step::deserialize(v).ok()).collect(),
        _ => Vec::new(),
    })
}

fn lenient_pipeline<'de, D: Deserializer<'de>>(d: D) -> Result<Pipeline, D::Error> {
    Ok(Pipeline::deserialize(Value::deserialize(d)?).unwrap_or_default())
}

impl AutomationCase {
    /// Stable identifier for the case at `index` in a result list.
    pub fn id(&self, index: usize) -> String {
        case_id(&self.title, &self.description, index)
    }
}

/// Derives `case-<hash>-<index>` from a 32-bit rolling hash of
/// `"{title}-{description}-{index}"`, hashed over UTF-16 code units.
pub fn case_id(title: &str, description: &str, index: usize) -> String {
    let base = format!("{title}-{description}-{index}");
    let hash = base
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_shl(5).wrapping_sub(h).wrapping_add(unit as i32));
    format!("case-{}-{}", hash.unsigned_abs(), index)
}

// ========================================
// Chat-completions wire protocol
// ========================================

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Error envelope returned by OpenAI-compatible servers.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
}
