//! Turns free-form model output into a validated recommendation set.
//!
//! Each stage is a separate function so it can be exercised on its own.
//! [`normalize`] chains them and resolves any stage failure to fallback
//! content, so a caller always gets something displayable unless
//! [`FallbackPolicy::Fail`] is selected.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::errors::ScoutError;
use crate::fallback;
use crate::wire::{AutomationCase, AutomationRecommendationSet, Mode, CASES_PER_SET};

/// What to do when the model output cannot be used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FallbackPolicy {
    /// Replace with example content and mark the result as such.
    #[default]
    Substitute,
    /// Report [`ScoutError::Unparseable`].
    Fail,
}

/// Where the cases in a normalized result came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Provenance {
    Generated,
    /// Model returned `generated` cases; `padded` example cases were appended.
    Padded { generated: usize, padded: usize },
    /// Model returned `returned` cases; the surplus was dropped.
    Truncated { returned: usize },
    /// Nothing from the model was usable.
    Fallback { reason: String },
}

impl Provenance {
    /// True when any shown case is example data rather than generated.
    pub fn uses_example_data(&self) -> bool {
        matches!(self, Provenance::Padded { .. } | Provenance::Fallback { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub set: AutomationRecommendationSet,
    pub provenance: Provenance,
}

/// Why a stage rejected the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    NoJsonObject,
    InvalidJson(String),
    MissingField(&'static str),
    CasesNotArray,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NoJsonObject => write!(f, "no JSON object in response"),
            Rejection::InvalidJson(e) => write!(f, "invalid JSON: {e}"),
            Rejection::MissingField(name) => write!(f, "missing field {name}"),
            Rejection::CasesNotArray => write!(f, "automationCases is not an array"),
        }
    }
}

/// Context needed to build a fallback for a "more" round.
#[derive(Debug, Clone, Copy)]
pub struct FallbackContext<'a> {
    pub existing: &'a [AutomationCase],
    pub role: &'a str,
}

/// Runs every stage. Never fails under [`FallbackPolicy::Substitute`].
pub fn normalize(
    raw: &str,
    mode: Mode,
    ctx: FallbackContext<'_>,
    policy: FallbackPolicy,
) -> Result<Normalized, ScoutError> {
    match parse_stages(raw, mode) {
        Ok(set) => {
            let (set, provenance) = match mode {
                Mode::Initial => fit_cardinality(set),
                Mode::More => (set, Provenance::Generated),
            };
            debug!(cases = set.automation_cases.len(), ?provenance, "normalized model output");
            Ok(Normalized { set, provenance })
        }
        Err(rejection) => {
            warn!(%rejection, ?mode, "model output rejected");
            match policy {
                FallbackPolicy::Fail => Err(ScoutError::Unparseable { reason: rejection.to_string() }),
                FallbackPolicy::Substitute => {
                    let set = match mode {
                        Mode::Initial => fallback::initial(),
                        Mode::More => fallback::contextual_more(ctx.existing, ctx.role),
                    };
                    Ok(Normalized {
                        set,
                        provenance: Provenance::Fallback { reason: rejection.to_string() },
                    })
                }
            }
        }
    }
}

fn parse_stages(raw: &str, mode: Mode) -> Result<AutomationRecommendationSet, Rejection> {
    let text = trim(raw);
    let candidate = extract_candidate(text)?;
    let cleaned = normalize_quotes(&strip_control_chars(candidate));
    let value = parse(&cleaned)?;
    let obj = require_fields(&value, mode)?;
    require_case_sequence(obj)
}

pub fn trim(raw: &str) -> &str {
    raw.trim()
}

/// Text already starting with `{` is taken as is; otherwise the span from
/// the first `{` to the last `}`.
pub fn extract_candidate(text: &str) -> Result<&str, Rejection> {
    if text.starts_with('{') {
        return Ok(text);
    }
    static SPAN: OnceLock<Regex> = OnceLock::new();
    let span = SPAN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"));
    span.find(text).map(|m| m.as_str()).ok_or(Rejection::NoJsonObject)
}

/// Drops C0 and C1 control characters, including newlines and tabs.
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|&c| !matches!(c, '\u{0000}'..='\u{001F}' | '\u{007F}'..='\u{009F}'))
        .collect()
}

pub fn normalize_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' => '"',
            '\u{2018}' | '\u{2019}' => '\'',
            other => other,
        })
        .collect()
}

pub fn parse(text: &str) -> Result<Value, Rejection> {
    serde_json::from_str(text).map_err(|e| Rejection::InvalidJson(e.to_string()))
}

/// Fields count as present only when non-empty: null, `false`, `0` and `""`
/// are treated as missing. An empty array still counts as present.
pub fn require_fields(value: &Value, mode: Mode) -> Result<&Map<String, Value>, Rejection> {
    let obj = value.as_object().ok_or(Rejection::MissingField("automationCases"))?;
    let required: &[&'static str] = match mode {
        Mode::Initial => &["roleAnalysis", "bestPractices", "automationCases"],
        Mode::More => &["automationCases"],
    };
    for &name in required {
        if !obj.get(name).is_some_and(is_present) {
            return Err(Rejection::MissingField(name));
        }
    }
    Ok(obj)
}

fn is_present(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Keeps every usable case in order. An element that is not an object or has
/// no title is dropped on its own; [`fit_cardinality`] pads in its place.
pub fn require_case_sequence(obj: &Map<String, Value>) -> Result<AutomationRecommendationSet, Rejection> {
    let cases = obj
        .get("automationCases")
        .and_then(Value::as_array)
        .ok_or(Rejection::CasesNotArray)?;
    let automation_cases = cases
        .iter()
        .enumerate()
        .filter_map(|(i, c)| match usable_case(c) {
            Ok(case) => Some(case),
            Err(reason) => {
                warn!(index = i, %reason, "dropping unusable case");
                None
            }
        })
        .collect();
    Ok(AutomationRecommendationSet {
        role_analysis: text_field(obj, "roleAnalysis"),
        best_practices: text_field(obj, "bestPractices"),
        automation_cases,
    })
}

fn usable_case(value: &Value) -> Result<AutomationCase, String> {
    if !value.is_object() {
        return Err("not an object".into());
    }
    let mut case = AutomationCase::deserialize(value).map_err(|e| e.to_string())?;
    if case.title.trim().is_empty() {
        return Err("missing title".into());
    }
    number_steps(&mut case);
    Ok(case)
}

/// Steps without a usable number take their 1-based position.
fn number_steps(case: &mut AutomationCase) {
    for (step, pos) in case.automation_pipeline.steps.iter_mut().zip(1u32..) {
        if step.step == 0 {
            step.step = pos;
        }
    }
}

fn text_field(obj: &Map<String, Value>, name: &str) -> String {
    match obj.get(name) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Pads with catalog cases, in catalog order, or truncates to exactly
/// [`CASES_PER_SET`] cases.
pub fn fit_cardinality(mut set: AutomationRecommendationSet) -> (AutomationRecommendationSet, Provenance) {
    let returned = set.automation_cases.len();
    let provenance = if returned < CASES_PER_SET {
        let needed = CASES_PER_SET - returned;
        set.automation_cases
            .extend(fallback::initial().automation_cases.into_iter().take(needed));
        Provenance::Padded { generated: returned, padded: needed }
    } else if returned > CASES_PER_SET {
        set.automation_cases.truncate(CASES_PER_SET);
        Provenance::Truncated { returned }
    } else {
        Provenance::Generated
    };
    (set, provenance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn generated_case(n: usize) -> Value {
        json!({
            "title": format!("агент задачи {n}"),
            "description": format!("описание {n}"),
            "priority": "высокий",
            "roiEstimate": "10-50%",
            "complexity": "средняя",
            "tools": ["Make", "Telegram Bot"],
            "systemPrompt": "Анализируй платежи подрядчиков.",
            "automationPipeline": {
                "platform": "Make",
                "steps": [
                    { "step": 1, "action": "Триггер", "tool": "Gmail", "description": "Новое письмо" },
                    { "step": 2, "action": "Анализ", "tool": "OpenAI", "description": "Разбор" },
                    { "step": 3, "action": "Запись", "tool": "Google Sheets", "description": "Журнал" }
                ]
            }
        })
    }

    fn response_with(n: usize) -> String {
        json!({
            "roleAnalysis": "Роль контролирует оплату.",
            "bestPractices": "Автоматизируйте сверку.",
            "automationCases": (0..n).map(generated_case).collect::<Vec<_>>()
        })
        .to_string()
    }

    fn initial(raw: &str) -> Normalized {
        normalize(raw, Mode::Initial, FallbackContext { existing: &[], role: "роль" }, FallbackPolicy::Substitute)
            .expect("substitute policy never fails")
    }

    #[test]
    fn malformed_inputs_resolve_to_six_cases() {
        let inputs = [
            "".to_string(),
            "Извините, я не могу помочь с этим.".to_string(),
            r#"{"roleAnalysis": "a", "bestPractices": "b", "automationCases": [{"title": "агент"#.to_string(),
            r#"{"roleAnalysis": "a", "bestPractices": "b"}"#.to_string(),
            r#"{"roleAnalysis": "a", "bestPractices": "b", "automationCases": "none"}"#.to_string(),
            r#"{"roleAnalysis": "", "bestPractices": "b", "automationCases": []}"#.to_string(),
            "[1, 2, 3]".to_string(),
            "{} and then }".to_string(),
        ];
        for raw in &inputs {
            let out = initial(raw);
            assert_eq!(out.set.automation_cases.len(), CASES_PER_SET, "input: {raw}");
            assert!(matches!(out.provenance, Provenance::Fallback { .. }), "input: {raw}");
            assert_eq!(out.set, fallback::initial());
        }
    }

    fn five_good_plus(bad: Value) -> String {
        let mut cases: Vec<Value> = (0..5).map(generated_case).collect();
        cases.push(bad);
        json!({ "roleAnalysis": "a", "bestPractices": "b", "automationCases": cases }).to_string()
    }

    #[test]
    fn loose_step_fields_keep_every_case() {
        let loose_steps = [
            json!([{ "step": "1", "action": "Триггер", "tool": "Gmail" }]),
            json!([{ "step": 1, "action": "Триггер" }]),
            json!([{ "step": 1, "action": "Триггер", "tool": null }]),
        ];
        for steps in loose_steps {
            let mut sixth = generated_case(5);
            sixth["automationPipeline"]["steps"] = steps.clone();
            let out = initial(&five_good_plus(sixth));
            assert_eq!(out.provenance, Provenance::Generated, "steps: {steps}");
            assert_eq!(out.set.automation_cases[0].title, "агент задачи 0");
            let step = &out.set.automation_cases[5].automation_pipeline.steps[0];
            assert_eq!(step.step, 1);
            assert_eq!(step.action, "Триггер");
        }
    }

    #[test]
    fn unusable_case_is_dropped_and_padded() {
        for bad in [json!("just text"), json!({ "description": "без названия" }), json!({ "title": null })] {
            let out = initial(&five_good_plus(bad.clone()));
            assert_eq!(out.provenance, Provenance::Padded { generated: 5, padded: 1 }, "bad: {bad}");
            let titles: Vec<&str> = out.set.automation_cases.iter().map(|c| c.title.as_str()).collect();
            assert_eq!(titles[..5], ["агент задачи 0", "агент задачи 1", "агент задачи 2", "агент задачи 3", "агент задачи 4"]);
            assert_eq!(out.set.automation_cases[5], fallback::initial().automation_cases[0]);
        }
    }

    #[test]
    fn numeric_title_is_kept_as_text() {
        let raw = r#"{"roleAnalysis": "a", "bestPractices": "b", "automationCases": [{"title": 5}]}"#;
        let out = initial(raw);
        assert_eq!(out.set.automation_cases[0].title, "5");
        assert_eq!(out.provenance, Provenance::Padded { generated: 1, padded: 5 });
    }

    #[test]
    fn unnumbered_steps_take_their_position() {
        let mut case = generated_case(0);
        case["automationPipeline"]["steps"] = json!([
            { "step": "x", "action": "a", "tool": "t" },
            { "action": "b", "tool": "t" },
            { "step": 7, "action": "c", "tool": "t" }
        ]);
        let raw = json!({ "roleAnalysis": "a", "bestPractices": "b", "automationCases": [case] }).to_string();
        let out = initial(&raw);
        let numbers: Vec<u32> = out.set.automation_cases[0].automation_pipeline.steps.iter().map(|s| s.step).collect();
        assert_eq!(numbers, vec![1, 2, 7]);
    }

    #[test]
    fn empty_case_array_is_padded_entirely() {
        let raw = json!({ "roleAnalysis": "a", "bestPractices": "b", "automationCases": [] }).to_string();
        let out = initial(&raw);
        assert_eq!(out.set.automation_cases, fallback::initial().automation_cases);
        assert_eq!(out.provenance, Provenance::Padded { generated: 0, padded: 6 });
        assert_eq!(out.set.role_analysis, "a");
    }

    #[test]
    fn smart_quotes_are_recovered() {
        let raw = response_with(6).replace('"', "\u{201C}");
        let out = initial(&raw);
        assert_eq!(out.provenance, Provenance::Generated);
        assert_eq!(out.set.automation_cases[0].title, "агент задачи 0");
    }

    #[test]
    fn exactly_six_cases_pass_through_unchanged() {
        let raw = response_with(6);
        let expected: AutomationRecommendationSet = serde_json::from_str(&raw).unwrap();
        let out = initial(&raw);
        assert_eq!(out.set, expected);
        assert_eq!(out.provenance, Provenance::Generated);
    }

    #[test]
    fn four_cases_are_padded_from_catalog_in_order() {
        let raw = response_with(4);
        let parsed: AutomationRecommendationSet = serde_json::from_str(&raw).unwrap();
        let out = initial(&raw);
        let catalog = fallback::initial().automation_cases;
        assert_eq!(out.set.automation_cases.len(), 6);
        assert_eq!(out.set.automation_cases[..4], parsed.automation_cases[..]);
        assert_eq!(out.set.automation_cases[4..], catalog[..2]);
        assert_eq!(out.provenance, Provenance::Padded { generated: 4, padded: 2 });
        assert!(out.provenance.uses_example_data());
    }

    #[test]
    fn nine_cases_are_truncated_without_padding() {
        let raw = response_with(9);
        let parsed: AutomationRecommendationSet = serde_json::from_str(&raw).unwrap();
        let out = initial(&raw);
        assert_eq!(out.set.automation_cases[..], parsed.automation_cases[..6]);
        assert_eq!(out.provenance, Provenance::Truncated { returned: 9 });
        assert!(!out.provenance.uses_example_data());
    }

    #[test]
    fn prose_and_fences_around_json_are_ignored() {
        let raw = format!("Вот результат:\n```json\n{}\n```\nУдачи!", response_with(6));
        let out = initial(&raw);
        assert_eq!(out.provenance, Provenance::Generated);
    }

    #[test]
    fn extract_candidate_is_greedy() {
        assert_eq!(extract_candidate("x {a} y {b} z"), Ok("{a} y {b}"));
        assert_eq!(extract_candidate("{starts} tail"), Ok("{starts} tail"));
        assert_eq!(extract_candidate("no braces"), Err(Rejection::NoJsonObject));
        assert_eq!(extract_candidate("} backwards {"), Err(Rejection::NoJsonObject));
    }

    #[test]
    fn control_chars_are_stripped() {
        assert_eq!(strip_control_chars("a\u{0000}b\nc\u{0085}d\u{009F}e\u{007F}"), "abcde");
        assert_eq!(strip_control_chars("агент"), "агент");
    }

    #[test]
    fn quotes_are_normalized() {
        assert_eq!(normalize_quotes("\u{201C}x\u{201D} \u{2018}y\u{2019}"), "\"x\" 'y'");
    }

    #[test]
    fn required_fields_depend_on_mode() {
        let only_cases = json!({ "automationCases": [] });
        assert!(require_fields(&only_cases, Mode::More).is_ok());
        assert_eq!(
            require_fields(&only_cases, Mode::Initial),
            Err(Rejection::MissingField("roleAnalysis"))
        );
        assert_eq!(
            require_fields(&json!({ "automationCases": null }), Mode::More),
            Err(Rejection::MissingField("automationCases"))
        );
    }

    #[test]
    fn more_mode_keeps_cardinality_and_uses_contextual_fallback() {
        let existing = fallback::initial().automation_cases;
        let ctx = FallbackContext { existing: &existing, role: "бухгалтер" };

        let raw = json!({ "automationCases": (0..2).map(generated_case).collect::<Vec<_>>() }).to_string();
        let out = normalize(&raw, Mode::More, ctx, FallbackPolicy::Substitute).unwrap();
        assert_eq!(out.set.automation_cases.len(), 2);
        assert_eq!(out.provenance, Provenance::Generated);

        let out = normalize("not json", Mode::More, ctx, FallbackPolicy::Substitute).unwrap();
        assert_eq!(out.set, fallback::contextual_more(&existing, "бухгалтер"));
        assert!(out.provenance.uses_example_data());
    }

    #[test]
    fn fail_policy_surfaces_rejection() {
        let ctx = FallbackContext { existing: &[], role: "роль" };
        let err = normalize("prose only", Mode::Initial, ctx, FallbackPolicy::Fail).unwrap_err();
        match err {
            ScoutError::Unparseable { reason } => assert_eq!(reason, "no JSON object in response"),
            other => panic!("unexpected {other:?}"),
        }
        // padding is not a failure
        let ok = normalize(&response_with(3), Mode::Initial, ctx, FallbackPolicy::Fail).unwrap();
        assert_eq!(ok.provenance, Provenance::Padded { generated: 3, padded: 3 });
    }
}
