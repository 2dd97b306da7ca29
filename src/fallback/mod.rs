//! Hand-authored example cases used when live generation is unusable.

use crate::prompt::distinct_tools;
use crate::wire::{AutomationCase, AutomationRecommendationSet, Pipeline, Step};

const ANALYSIS: &str = "Не удалось получить персональный анализ от модели. Показаны примеры автоматизации, типичные для управленческих ролей.";
const PRACTICES: &str = "Начните с автоматизации простых повторяющихся задач и постепенно переходите к более сложным процессам.";

struct Seed<'a> {
    title: &'a str,
    description: &'a str,
    priority: &'a str,
    roi: &'a str,
    complexity: &'a str,
    platform: &'a str,
    system_prompt: String,
}

fn build(seed: Seed<'_>, tools: Vec<String>, steps: &[(&str, &str, &str)]) -> AutomationCase {
    AutomationCase {
        title: seed.title.into(),
        description: seed.description.into(),
        priority: seed.priority.into(),
        roi_estimate: seed.roi.into(),
        complexity: seed.complexity.into(),
        tools,
        system_prompt: seed.system_prompt,
        automation_pipeline: Pipeline {
            platform: seed.platform.into(),
            steps: steps
                .iter()
                .zip(1u32..)
                .map(|((action, tool, description), n)| Step {
                    step: n,
                    action: (*action).into(),
                    tool: (*tool).into(),
                    description: (*description).into(),
                })
                .collect(),
        },
    }
}

fn owned(tools: &[&str]) -> Vec<String> {
    tools.iter().map(|t| t.to_string()).collect()
}

/// Full six-case set for a first analysis.
pub fn initial() -> AutomationRecommendationSet {
    AutomationRecommendationSet {
        role_analysis: ANALYSIS.into(),
        best_practices: PRACTICES.into(),
        automation_cases: initial_cases(),
    }
}

fn initial_cases() -> Vec<AutomationCase> {
    vec![
        build(
            Seed {
                title: "агент обработки входящей почты",
                description: "Автоматические уведомления и ответы на типовые запросы",
                priority: "высокий",
                roi: "20-30%",
                complexity: "низкая",
                platform: "Make",
                system_prompt: "Анализируй входящие письма и готовь персонализированные ответы. ВХОДНЫЕ ДАННЫЕ: текст письма, данные отправителя, история переписки. АЛГОРИТМ: 1) Определи тему и тон письма 2) Классифицируй приоритет 3) Проверь историю общения 4) Подготовь ответ или переадресуй 5) Сформируй краткую сводку для руководителя. ВЫХОДНЫЕ ДАННЫЕ: JSON с приоритетом, темой, предлагаемым ответом и действиями. EDGE CASES: спам игнорировать, срочные вопросы сразу эскалировать, неизвестный язык переводить.".into(),
            },
            owned(&["Make", "Gmail"]),
            &[
                ("Получение нового письма", "Gmail", "Триггер при получении нового письма"),
                ("Анализ содержимого", "OpenAI", "Определение темы и приоритета письма"),
                ("Проверка контекста отправителя", "Google Sheets", "Поиск информации об отправителе"),
                ("Генерация ответа", "OpenAI", "Создание ответа на основе анализа"),
                ("Отправка уведомления", "Telegram Bot", "Уведомление о важном письме"),
            ],
        ),
        build(
            Seed {
                title: "агент планирования встреч",
                description: "Планирование и координация встреч с командой",
                priority: "средний",
                roi: "15-25%",
                complexity: "средняя",
                platform: "Make",
                system_prompt: "Подбирай время встреч по календарям участников. ВХОДНЫЕ ДАННЫЕ: список участников, длительность, желаемый интервал, приоритет. АЛГОРИТМ: 1) Получи календари участников 2) Найди пересечения свободного времени 3) Учти часовые пояса и рабочие часы 4) Выбери лучший слот 5) Создай событие и разошли приглашения. ВЫХОДНЫЕ ДАННЫЕ: JSON с временем, статусами участников и ссылкой на встречу. EDGE CASES: нет общего времени, участник в отпуске, конфликт приоритетов.".into(),
            },
            owned(&["Make", "Google Calendar"]),
            &[
                ("Получение запроса на встречу", "Gmail", "Триггер по письму с запросом встречи"),
                ("Анализ доступности участников", "Google Calendar", "Проверка свободного времени"),
                ("Поиск оптимального времени", "OpenAI", "Выбор лучшего слота"),
                ("Создание события", "Google Calendar", "Автоматическое создание встречи"),
                ("Отправка приглашений", "Gmail", "Рассылка приглашений участникам"),
            ],
        ),
        build(
            Seed {
                title: "агент подготовки отчетов",
                description: "Генерация регулярных отчетов на основе данных",
                priority: "высокий",
                roi: "25-40%",
                complexity: "высокая",
                platform: "n8n",
                system_prompt: "Формируй структурированные отчеты с выводами. ВХОДНЫЕ ДАННЫЕ: таблицы с метриками, период, цель отчета, аудитория. АЛГОРИТМ: 1) Собери данные из источников 2) Проверь полноту 3) Рассчитай показатели и тренды 4) Выяви аномалии 5) Сформулируй выводы и рекомендации. ВЫХОДНЫЕ ДАННЫЕ: отчет с таблицами и выводами. EDGE CASES: неполные данные, резкие изменения показателей, недоступный источник.".into(),
            },
            owned(&["Google Sheets", "Make"]),
            &[
                ("Сбор данных из источников", "Google Sheets", "Получение данных из таблиц"),
                ("Проверка полноты данных", "OpenAI", "Поиск пропусков и аномалий"),
                ("Анализ и выводы", "OpenAI", "Расчет показателей и трендов"),
                ("Публикация отчета", "Notion", "Размещение отчета для команды"),
            ],
        ),
        build(
            Seed {
                title: "агент распределения задач",
                description: "Распределение и отслеживание задач в команде",
                priority: "средний",
                roi: "20-35%",
                complexity: "средняя",
                platform: "Make",
                system_prompt: "Назначай исполнителей с учетом загрузки и навыков. ВХОДНЫЕ ДАННЫЕ: новая задача, профили участников, текущая загрузка, приоритеты проектов. АЛГОРИТМ: 1) Определи требуемые навыки 2) Оцени загрузку участников 3) Сопоставь навыки с задачей 4) Назначь исполнителя и срок. ВЫХОДНЫЕ ДАННЫЕ: JSON с исполнителем, обоснованием и дедлайном. EDGE CASES: все заняты, нет нужных навыков, критическая задача.".into(),
            },
            owned(&["ClickUp", "Telegram"]),
            &[
                ("Получение новой задачи", "ClickUp", "Триггер при создании карточки"),
                ("Анализ требований", "OpenAI", "Определение навыков и приоритета"),
                ("Назначение исполнителя", "ClickUp", "Обновление карточки"),
                ("Уведомление команды", "Telegram Bot", "Сообщение в рабочий канал"),
            ],
        ),
        build(
            Seed {
                title: "агент контроля качества",
                description: "Проверка результатов работы на соответствие стандартам",
                priority: "низкий",
                roi: "15-30%",
                complexity: "высокая",
                platform: "n8n",
                system_prompt: "Проверяй выполненные задачи на соответствие стандартам. ВХОДНЫЕ ДАННЫЕ: завершенные задачи, чеклисты качества, стандарты команды. АЛГОРИТМ: 1) Сверь результат с требованиями 2) Оцени качество документации 3) Выяви проблемные области 4) Подготовь рекомендации. ВЫХОДНЫЕ ДАННЫЕ: отчет с оценкой, списком проблем и рекомендациями. EDGE CASES: субъективные критерии, технические ограничения, критические дефекты.".into(),
            },
            owned(&["Jira", "Google Docs"]),
            &[
                ("Мониторинг выполненных задач", "Jira", "Отслеживание закрытых задач"),
                ("Проверка качества", "OpenAI", "Сверка со стандартами"),
                ("Формирование отчета", "Google Docs", "Отчет о качестве"),
                ("Эскалация дефектов", "Slack", "Уведомление ответственных"),
            ],
        ),
        build(
            Seed {
                title: "агент развития команды",
                description: "Персональные планы обучения сотрудников",
                priority: "низкий",
                roi: "10-25%",
                complexity: "средняя",
                platform: "Make",
                system_prompt: "Составляй планы обучения по пробелам в навыках. ВХОДНЫЕ ДАННЫЕ: результаты опросов, оценки компетенций, цели команды. АЛГОРИТМ: 1) Выяви пробелы в навыках 2) Подбери материалы 3) Составь план со сроками 4) Отслеживай прогресс. ВЫХОДНЫЕ ДАННЫЕ: индивидуальный план обучения. EDGE CASES: нет данных об оценке, конфликт с рабочей загрузкой.".into(),
            },
            owned(&["Google Forms", "Notion"]),
            &[
                ("Сбор данных о компетенциях", "Google Forms", "Опрос сотрудников"),
                ("Подбор материалов", "OpenAI", "Персонализация программы"),
                ("Создание плана обучения", "Notion", "Индивидуальный план"),
                ("Напоминания о прогрессе", "Telegram Bot", "Еженедельные напоминания"),
            ],
        ),
    ]
}

/// Six follow-up cases that keep continuity with what was already shown:
/// tool lists and pipeline endpoints reuse the tools of `existing`, and some
/// prompts embed `role`.
pub fn contextual_more(existing: &[AutomationCase], role: &str) -> AutomationRecommendationSet {
    let used = distinct_tools(existing);
    let first_tool = used.first().map(String::as_str).unwrap_or("Google Sheets");
    let second_tool = used.get(1).map(String::as_str).unwrap_or("ClickUp");

    let cases = vec![
        build(
            Seed {
                title: "агент валидации и контроля качества данных",
                description: "Проверка целостности и качества данных во всех автоматизированных процессах",
                priority: "высокий",
                roi: "25-40%",
                complexity: "средняя",
                platform: "Make",
                system_prompt: "Валидируй входящие данные и предотвращай ошибки в автоматизированных процессах. ВХОДНЫЕ ДАННЫЕ: таблицы, формы, API запросы, файлы CSV/JSON/XML. АЛГОРИТМ: 1) Проверь обязательные поля 2) Проверь форматы 3) Проверь бизнес-правила 4) Найди дубликаты и аномалии 5) Составь отчет об ошибках. ВЫХОДНЫЕ ДАННЫЕ: JSON с результатом проверки. EDGE CASES: неизвестный формат, массовые ошибки, критичные данные.".into(),
            },
            used.iter().take(3).cloned().collect(),
            &[
                ("Мониторинг входящих данных", "Google Sheets", "Отслеживание новых записей"),
                ("Валидация по правилам", "OpenAI", "Проверка бизнес-логики"),
                ("Проверка дубликатов", "Google Sheets", "Поиск повторов"),
                ("Отчет о качестве", "OpenAI", "Описание найденных проблем"),
                ("Уведомление о проблемах", "Telegram Bot", "Срочные уведомления"),
            ],
        ),
        build(
            Seed {
                title: "агент мониторинга и аналитики автоматизаций",
                description: "Отслеживание эффективности автоматизированных процессов и аналитические отчеты",
                priority: "средний",
                roi: "20-35%",
                complexity: "высокая",
                platform: "n8n",
                system_prompt: "Мониторь KPI автоматизированных процессов и готовь аналитические отчеты. ВХОДНЫЕ ДАННЫЕ: логи выполнения, метрики времени, количество ошибок. АЛГОРИТМ: 1) Собери метрики 2) Рассчитай KPI 3) Выяви тренды 4) Найди узкие места 5) Предложи оптимизации. ВЫХОДНЫЕ ДАННЫЕ: таблица KPI и список рекомендаций. EDGE CASES: нет данных, системные сбои.".into(),
            },
            owned(&["Google Sheets", "OpenAI", "Slack"]),
            &[
                ("Сбор метрик", "Google Sheets", "Агрегация данных о работе"),
                ("Анализ производительности", "OpenAI", "Тренды и аномалии"),
                ("Генерация рекомендаций", "OpenAI", "Предложения по улучшению"),
                ("Еженедельный отчет", "Slack", "Рассылка команде"),
            ],
        ),
        build(
            Seed {
                title: "агент обработки исключительных ситуаций",
                description: "Обработка ошибок в автоматизациях с эскалацией к человеку",
                priority: "высокий",
                roi: "30-45%",
                complexity: "высокая",
                platform: "Make",
                system_prompt: format!("Обрабатывай сбои автоматизаций для роли: {role}. Классифицируй ошибки по критичности, пытайся восстановить работу, при критических ошибках уведомляй ответственных с описанием проблемы и вариантами решения, веди журнал инцидентов."),
            },
            owned(&["OpenAI", "Telegram Bot", "Gmail"]),
            &[
                ("Получение уведомлений об ошибках", "Gmail", "Сбор сообщений о сбоях"),
                ("Классификация критичности", "OpenAI", "Оценка серьезности"),
                ("Эскалация", "Telegram Bot", "Срочное уведомление"),
                ("Логирование инцидента", "Google Sheets", "Журнал для анализа"),
            ],
        ),
        build(
            Seed {
                title: "агент интеграции между системами",
                description: "Передача данных между инструментами, используемыми в роли",
                priority: "средний",
                roi: "25-40%",
                complexity: "высокая",
                platform: "n8n",
                system_prompt: format!("Синхронизируй данные между системами для роли: {role}. Преобразуй форматы, сопоставляй поля, разрешай конфликты данных и веди журнал операций интеграции."),
            },
            used.clone(),
            &[
                ("Мониторинг изменений в системе A", first_tool, "Отслеживание обновлений"),
                ("Трансформация данных", "OpenAI", "Преобразование формата"),
                ("Синхронизация с системой B", second_tool, "Передача данных"),
                ("Логирование операции", "Google Sheets", "Журнал интеграций"),
            ],
        ),
        build(
            Seed {
                title: "агент обучения и адаптации процессов",
                description: "Оптимизация автоматизаций на основе накопленной истории",
                priority: "низкий",
                roi: "15-30%",
                complexity: "высокая",
                platform: "Make",
                system_prompt: format!("Анализируй историю выполнения автоматизаций для роли: {role}. Выявляй закономерности, предлагай настройки процессов и документируй улучшения."),
            },
            owned(&["OpenAI", "Google Sheets", "Notion"]),
            &[
                ("Сбор истории операций", "Google Sheets", "Агрегация данных"),
                ("Анализ паттернов", "OpenAI", "Поиск закономерностей"),
                ("Документирование улучшений", "Notion", "База знаний"),
                ("Уведомление команды", "Slack", "Найденные улучшения"),
            ],
        ),
        build(
            Seed {
                title: "агент планирования и расписания автоматизаций",
                description: "Расписание запуска автоматизаций с учетом приоритетов и ресурсов",
                priority: "средний",
                roi: "20-35%",
                complexity: "средняя",
                platform: "Make",
                system_prompt: format!("Управляй расписанием автоматизаций для роли: {role}. Учитывай приоритеты, доступность внешних систем и лимиты API, переноси запуски при конфликтах."),
            },
            owned(&["Google Calendar", "OpenAI", "Telegram Bot"]),
            &[
                ("Анализ очереди задач", "Google Calendar", "Запланированные запуски"),
                ("Оптимизация расписания", "OpenAI", "Выбор времени выполнения"),
                ("Обновление календаря", "Google Calendar", "Корректировка расписания"),
                ("Уведомление об изменениях", "Telegram Bot", "Переносы и конфликты"),
            ],
        ),
    ];

    AutomationRecommendationSet {
        role_analysis: String::new(),
        best_practices: String::new(),
        automation_cases: cases,
    }
}
