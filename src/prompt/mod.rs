use std::collections::BTreeSet;

use crate::wire::{AutomationCase, CASES_PER_SET, TITLE_MARKER};

/// What the previous round produced; steers a "more" request away from repeats.
#[derive(Debug, Clone, Copy)]
pub struct MoreContext<'a> {
    pub role: &'a str,
    pub prior_analysis: &'a str,
    pub prior_practices: &'a str,
    pub prior_cases: &'a [AutomationCase],
}

impl MoreContext<'_> {
    pub fn prior_titles(&self) -> Vec<&str> {
        self.prior_cases.iter().map(|c| c.title.as_str()).collect()
    }
}

fn make_apps() -> &'static str {
r#"Актуальные приложения Make (не ограничивайся ими):
AI: OpenAI (ChatGPT, Whisper, DALL-E), Anthropic Claude, ElevenLabs, Leonardo.ai, Cloudinary
Productivity: Google Sheets, Google Calendar, ClickUp, Notion, AirTable
Marketing: Facebook Pages, Instagram for Business, Facebook Lead Ads, LinkedIn, Pinterest
Communication: Telegram Bot, Gmail, Slack
Task tracking: Jira
Customer Support: Intercom, Zendesk, Freshdesk, Help Scout, Fresh Service
E-commerce: WooCommerce"#
}

fn system_prompt_rules() -> &'static str {
r#"Требования к полю systemPrompt:
- НЕ начинай с "Ты помощник/агент/AI для...".
- Начинай с конкретного действия: "Анализируй...", "Обрабатывай...", "Создавай...".
- Опиши ВХОДНЫЕ ДАННЫЕ, АЛГОРИТМ (пошагово), ВЫХОДНЫЕ ДАННЫЕ, ПРИМЕРЫ, EDGE CASES и КРИТЕРИИ КАЧЕСТВА.
- Минимум 400 слов."#
}

fn case_schema(title_hint: &str) -> String {
    format!(r#"{{
      "title": "{title_hint}",
      "description": "подробное описание AI агента для этой задачи",
      "priority": "высокий/средний/низкий",
      "roiEstimate": "10-50%",
      "complexity": "низкая/средняя/высокая",
      "tools": ["конкретный инструмент 1", "конкретный инструмент 2"],
      "systemPrompt": "практические инструкции для агента",
      "automationPipeline": {{
        "platform": "Make/n8n",
        "steps": [
          {{ "step": 1, "action": "триггер события", "tool": "Gmail/Webhook", "description": "инициация автоматизации" }},
          {{ "step": 2, "action": "обработка данных", "tool": "OpenAI", "description": "анализ и проверка входящих данных" }}
        ]
      }}
    }}"#)
}

/// Instruction for the first analysis of `role`.
pub fn initial_prompt(role: &str) -> String {
    format!(r#"Ты эксперт по автоматизации бизнес-процессов и внедрению AI агентов.

КРИТИЧЕСКИ ВАЖНО: сосредоточься ТОЛЬКО на задачах, которые пользователь описал в своей роли. Не добавляй общие рекомендации и стандартные процессы, которые не упомянуты в описании.

АЛГОРИТМ АНАЛИЗА:
1. Зафиксируй каждую задачу, сформулированную явно (глагол + существительное, например «контролирую оплату подрядчиков»).
2. Оцени автоматизируемость: цифровой вход/выход данных, повторяемость не реже раза в месяц, влияние на деньги, сроки или качество. Сгруппируй связанные задачи.
3. Для каждой задачи создай кейс с AI агентом.
4. Создай РОВНО {count} кейсов. Если задач меньше, раскрой разные аспекты и подзадачи описанных задач.

СТРОГИЕ ПРАВИЛА:
- ЗАПРЕЩЕНО добавлять задачи, которые пользователь не упоминал.
- Используй формулировки, контекст и инструменты из описания роли.
- В массиве automationCases должно быть РОВНО {count} элементов.
- Название каждого кейса начинается со слова "{marker}" (например: "{marker} управления roadmap").
- В каждом пайплайне 4-7 шагов, от триггера до результата.

{apps}

КОНТЕКСТ: российский рынок, Make, n8n, Telegram, Bitrix24, Yandex Cloud.

{prompt_rules}

Верни ТОЛЬКО валидный JSON без дополнительного текста. Начни ответ сразу с {{

ФОРМАТ ОТВЕТА:
{{
  "roleAnalysis": "анализ описанных задач (2-3 предложения)",
  "bestPractices": "рекомендации по автоматизации описанных задач (2-3 предложения)",
  "automationCases": [
    {schema}
  ]
}}

АНАЛИЗИРУЕМАЯ РОЛЬ:
{role}"#,
        count = CASES_PER_SET,
        marker = TITLE_MARKER,
        apps = make_apps(),
        prompt_rules = system_prompt_rules(),
        schema = case_schema(&format!("{TITLE_MARKER} для конкретной задачи из описания")),
        role = role,
    )
}

/// Instruction for a follow-up round that must not repeat `ctx.prior_cases`.
pub fn more_prompt(ctx: &MoreContext<'_>) -> String {
    let existing = ctx
        .prior_cases
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}: {}", i + 1, c.title, c.description))
        .collect::<Vec<_>>()
        .join("\n");
    let tools = distinct_tools(ctx.prior_cases).join(", ");
    let forbidden = ctx
        .prior_titles()
        .iter()
        .map(|t| format!("- {t}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(r#"Ты эксперт по автоматизации бизнес-процессов и внедрению AI агентов. Пользователь уже получил набор кейсов автоматизации и хочет {count} ДОПОЛНИТЕЛЬНЫХ кейсов, которые продолжают и углубляют автоматизацию ТОЙ ЖЕ роли.

КОНТЕКСТ РОЛИ ПОЛЬЗОВАТЕЛЯ:
{role}

ПРЕДЫДУЩИЙ АНАЛИЗ РОЛИ:
{analysis}

ПРЕДЫДУЩИЕ ЛУЧШИЕ ПРАКТИКИ:
{practices}

УЖЕ ПРЕДЛОЖЕННЫЕ КЕЙСЫ:
{existing}

ИНСТРУМЕНТЫ В ПРЕДЛОЖЕННЫХ КЕЙСАХ:
{tools}

Новые кейсы должны:
1. Относиться к той же роли и тем же процессам.
2. Углублять автоматизацию уже выявленных задач или покрывать ещё не автоматизированные аспекты.
3. Дополнять существующие кейсы (мониторинг, обработка исключений, промежуточные этапы, интеграции).
4. НЕ дублировать уже предложенные решения.

ПРАВИЛА:
- Название каждого кейса начинается со слова "{marker}".
- В каждом пайплайне 4-7 шагов.

{apps}

{prompt_rules}

Верни ТОЛЬКО валидный JSON без дополнительного текста. Начни ответ сразу с {{

ФОРМАТ ОТВЕТА:
{{
  "automationCases": [
    {schema}
  ]
}}

НЕ ПОВТОРЯЙ ЭТИ КЕЙСЫ:
{forbidden}"#,
        count = CASES_PER_SET,
        role = ctx.role,
        analysis = ctx.prior_analysis,
        practices = ctx.prior_practices,
        existing = existing,
        tools = tools,
        marker = TITLE_MARKER,
        apps = make_apps(),
        prompt_rules = system_prompt_rules(),
        schema = case_schema(&format!("{TITLE_MARKER} [дополнительный аспект роли]")),
        forbidden = forbidden,
    )
}

/// Tools across `cases` in first-seen order, without repeats.
pub fn distinct_tools(cases: &[AutomationCase]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    cases
        .iter()
        .flat_map(|c| c.tools.iter())
        .filter(|t| seen.insert(t.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback;

    #[test]
    fn initial_prompt_embeds_role_and_rules() {
        let role = "контролирую оплату подрядчиков";
        let p = initial_prompt(role);
        assert!(p.ends_with(role));
        assert!(p.contains("РОВНО 6"));
        assert!(p.contains("\"агент\""));
        assert!(p.contains("\"automationCases\""));
    }

    #[test]
    fn initial_prompt_is_deterministic() {
        assert_eq!(initial_prompt("x"), initial_prompt("x"));
    }

    #[test]
    fn more_prompt_lists_prior_titles_and_tools() {
        let prior = fallback::initial().automation_cases;
        let ctx = MoreContext {
            role: "веду бухгалтерию",
            prior_analysis: "анализ",
            prior_practices: "практики",
            prior_cases: &prior,
        };
        let p = more_prompt(&ctx);
        for c in &prior {
            assert!(p.contains(&format!("- {}", c.title)));
        }
        assert!(p.contains("веду бухгалтерию"));
        assert!(p.contains("Gmail"));
        assert!(!p.contains("roleAnalysis"));
    }

    #[test]
    fn distinct_tools_keeps_first_seen_order() {
        let mut cases = fallback::initial().automation_cases;
        cases.truncate(2);
        cases[0].tools = vec!["Make".into(), "Gmail".into()];
        cases[1].tools = vec!["Gmail".into(), "Notion".into(), "Make".into()];
        assert_eq!(distinct_tools(&cases), vec!["Make", "Gmail", "Notion"]);
    }
}
