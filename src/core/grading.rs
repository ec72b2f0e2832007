//! Answer checking across the solution encodings found in the content dump.
//!
//! Payloads store solutions in several incompatible ways: a keyed `solutions`
//! map (cross matching), per-question `solution`/`answer`/`answers` fields, a
//! single grammar question at the top level, a top-level `answers` list for
//! gap fills, and an `order` list for ordering tasks. [`extract_items`]
//! flattens all of them into [`GradableItem`]s that [`grade`] can score.

use crate::core::normalize::{compare_keys, grammar_question, json_id, string_list, text_of};
use crate::utils::error::{PracticeError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::OnceLock;

fn alternatives_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*[/|]\s*").expect("static regex"))
}

fn sequence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*[,;]\s*").expect("static regex"))
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

/// The learner's answers, keyed by question key ("1", "2", "order", ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSheet {
    answers: BTreeMap<String, String>,
}

impl AnswerSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts a JSON object; numbers and booleans are stringified, arrays joined with `,`.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| PracticeError::InvalidAnswerSheet {
                message: "expected a JSON object of question key to answer".to_string(),
            })?;

        let mut sheet = Self::new();
        for (key, answer) in obj {
            let text = match answer {
                Value::Null => continue,
                Value::Array(items) => items
                    .iter()
                    .filter_map(json_id)
                    .collect::<Vec<_>>()
                    .join(","),
                Value::Object(_) => {
                    return Err(PracticeError::InvalidAnswerSheet {
                        message: format!("answer for '{}' must not be an object", key),
                    })
                }
                scalar => json_id(scalar).unwrap_or_default(),
            };
            sheet.set(key, &text);
        }
        Ok(sheet)
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        Self::from_value(&value)
    }

    pub fn set(&mut self, key: &str, answer: &str) {
        self.answers.insert(key.to_string(), answer.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.answers.get(key).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.answers.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerFormat {
    SingleChoice,
    GapFill,
    Matching,
    Ordering,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Expected {
    /// Any of the listed answers is accepted.
    OneOf(Vec<String>),
    /// The answer must list these items in this order.
    Sequence(Vec<String>),
}

impl Expected {
    pub fn display(&self) -> String {
        match self {
            Expected::OneOf(alternatives) => alternatives.join(" / "),
            Expected::Sequence(items) => items.join(", "),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradableItem {
    pub key: String,
    pub prompt: Option<String>,
    pub options: Vec<String>,
    pub format: AnswerFormat,
    pub expected: Expected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradingPolicy {
    /// Exact string equality, no normalization or choice resolution.
    pub strict: bool,
    pub case_sensitive: bool,
}

impl Default for GradingPolicy {
    fn default() -> Self {
        Self {
            strict: false,
            case_sensitive: false,
        }
    }
}

impl GradingPolicy {
    pub fn strict() -> Self {
        Self {
            strict: true,
            case_sensitive: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Correct,
    Incorrect,
    Unanswered,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemOutcome {
    pub key: String,
    pub given: Option<String>,
    pub expected: String,
    pub status: ItemStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeReport {
    pub outcomes: Vec<ItemOutcome>,
    pub correct: usize,
    pub total: usize,
}

impl GradeReport {
    pub fn answered(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status != ItemStatus::Unanswered)
            .count()
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.correct as f64 * 1000.0 / self.total as f64).round() / 10.0
    }

    pub fn outcome(&self, key: &str) -> Option<&ItemOutcome> {
        self.outcomes.iter().find(|o| o.key == key)
    }
}

/// Flatten a payload into gradable items. Payloads without solutions yield none.
pub fn extract_items(payload: &Value) -> Vec<GradableItem> {
    if let Some(Value::Object(solutions)) = payload.get("solutions") {
        let items = keyed_items(payload, solutions, false);
        if !items.is_empty() {
            return items;
        }
    }

    if let Some(Value::Array(questions)) = payload.get("questions") {
        let items: Vec<GradableItem> = questions
            .iter()
            .enumerate()
            .filter_map(|(i, q)| question_item((i + 1).to_string(), q))
            .collect();
        if !items.is_empty() {
            return items;
        }
    }

    if let Some(question) = grammar_question(payload) {
        return vec![choice_item(
            "1".to_string(),
            Some(question.text),
            question.choices,
            vec![question.solution],
        )];
    }

    match payload.get("answers") {
        Some(Value::Array(answers)) => {
            let items: Vec<GradableItem> = answers
                .iter()
                .enumerate()
                .filter_map(|(i, answer)| gap_item((i + 1).to_string(), None, answer))
                .collect();
            if !items.is_empty() {
                return items;
            }
        }
        Some(Value::Object(answers)) => {
            let items = keyed_items(payload, answers, true);
            if !items.is_empty() {
                return items;
            }
        }
        _ => {}
    }

    for field in ["order", "correctOrder", "correct_order"] {
        if let Some(Value::Array(order)) = payload.get(field) {
            let sequence: Vec<String> = order.iter().filter_map(json_id).collect();
            if sequence.is_empty() {
                continue;
            }
            let options = ["items", "sentences", "paragraphs"]
                .iter()
                .map(|name| string_list(payload.get(*name)))
                .find(|list| !list.is_empty())
                .unwrap_or_default();
            return vec![GradableItem {
                key: "order".to_string(),
                prompt: None,
                options,
                format: AnswerFormat::Ordering,
                expected: Expected::Sequence(sequence),
            }];
        }
    }

    Vec::new()
}

/// Items from a map keyed by question key; prompts and options come from `questions`.
fn keyed_items(payload: &Value, solutions: &Map<String, Value>, gap_fill: bool) -> Vec<GradableItem> {
    let shared_options = string_list(payload.get("options"));
    let mut keys: Vec<&String> = solutions.keys().collect();
    keys.sort_by(|a, b| compare_keys(a, b));

    keys.into_iter()
        .filter_map(|key| {
            let solution = solutions.get(key)?;
            let question = keyed_question(payload.get("questions"), key);
            let prompt = question.and_then(question_prompt);
            let own_options = question
                .map(|q| string_list(q.get("options")))
                .unwrap_or_default();

            if gap_fill {
                return gap_item(key.clone(), prompt, solution);
            }

            let alternatives = match solution {
                Value::Array(items) => items.iter().filter_map(json_id).collect(),
                other => json_id(other).into_iter().collect::<Vec<_>>(),
            };
            if alternatives.is_empty() {
                return None;
            }

            let (format, options) = if !own_options.is_empty() {
                (AnswerFormat::SingleChoice, own_options)
            } else {
                (AnswerFormat::Matching, shared_options.clone())
            };
            Some(GradableItem {
                key: key.clone(),
                prompt,
                options,
                format,
                expected: Expected::OneOf(alternatives),
            })
        })
        .collect()
}

fn keyed_question<'a>(questions: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    match questions? {
        Value::Object(map) => map.get(key),
        Value::Array(items) => {
            let position: usize = key.trim().parse().ok()?;
            items.get(position.checked_sub(1)?)
        }
        _ => None,
    }
}

fn question_prompt(question: &Value) -> Option<String> {
    match question {
        Value::String(text) => Some(text.clone()),
        _ => question
            .get("question")
            .or_else(|| question.get("text"))
            .and_then(text_of),
    }
}

fn question_item(key: String, question: &Value) -> Option<GradableItem> {
    if let Some(grammar) = grammar_question(question) {
        return Some(choice_item(key, Some(grammar.text), grammar.choices, vec![grammar.solution]));
    }

    let prompt = question_prompt(question);
    if let Some(answer) = question.get("answer").or_else(|| question.get("solution")) {
        let options = string_list(question.get("options"));
        let alternatives: Vec<String> = match answer {
            Value::Array(items) => items.iter().filter_map(json_id).collect(),
            other => json_id(other).into_iter().collect(),
        };
        if alternatives.is_empty() {
            return None;
        }
        return Some(choice_item(key, prompt, options, alternatives));
    }

    question
        .get("answers")
        .and_then(|answers| gap_item(key, prompt, answers))
}

/// Single choice when options exist, otherwise a gap fill.
fn choice_item(
    key: String,
    prompt: Option<String>,
    options: Vec<String>,
    alternatives: Vec<String>,
) -> GradableItem {
    if options.is_empty() {
        let alternatives = alternatives.iter().flat_map(|a| split_alternatives(a)).collect();
        GradableItem {
            key,
            prompt,
            options,
            format: AnswerFormat::GapFill,
            expected: Expected::OneOf(alternatives),
        }
    } else {
        GradableItem {
            key,
            prompt,
            options,
            format: AnswerFormat::SingleChoice,
            expected: Expected::OneOf(alternatives),
        }
    }
}

fn gap_item(key: String, prompt: Option<String>, answer: &Value) -> Option<GradableItem> {
    let alternatives: Vec<String> = match answer {
        Value::Array(items) => items
            .iter()
            .filter_map(json_id)
            .flat_map(|a| split_alternatives(&a))
            .collect(),
        other => json_id(other)
            .map(|a| split_alternatives(&a))
            .unwrap_or_default(),
    };
    if alternatives.is_empty() {
        return None;
    }
    Some(GradableItem {
        key,
        prompt,
        options: Vec::new(),
        format: AnswerFormat::GapFill,
        expected: Expected::OneOf(alternatives),
    })
}

/// "who / that" -> ["who", "that"]
fn split_alternatives(answer: &str) -> Vec<String> {
    alternatives_re()
        .split(answer.trim())
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize(text: &str, policy: &GradingPolicy) -> String {
    let unified = text.replace(['\u{2019}', '\u{2018}'], "'");
    let collapsed = whitespace_re().replace_all(unified.trim(), " ");
    let trimmed = collapsed.trim_end_matches('.').trim_end();
    if policy.case_sensitive {
        trimmed.to_string()
    } else {
        trimmed.to_lowercase()
    }
}

/// Position of the option an answer refers to: by text, by letter, then by 1-based number.
fn resolve_choice(answer: &str, options: &[String], policy: &GradingPolicy) -> Option<usize> {
    if options.is_empty() {
        return None;
    }
    let wanted = normalize(answer, policy);
    if let Some(index) = options.iter().position(|o| normalize(o, policy) == wanted) {
        return Some(index);
    }

    if let Some(index) = letter_index(answer, options.len()) {
        return Some(index);
    }

    match answer.trim().parse::<usize>() {
        Ok(number) if number >= 1 && number <= options.len() => Some(number - 1),
        _ => None,
    }
}

/// Solution keys such as "A" are letters unless the options are letters themselves.
fn resolve_expected_choice(
    solution: &str,
    options: &[String],
    policy: &GradingPolicy,
) -> Option<usize> {
    let worded_options = options.iter().any(|o| o.trim().chars().count() > 1);
    if worded_options {
        if let Some(index) = letter_index(solution, options.len()) {
            return Some(index);
        }
    }
    resolve_choice(solution, options, policy)
}

fn letter_index(answer: &str, option_count: usize) -> Option<usize> {
    let mut chars = answer.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(letter), None) if letter.is_ascii_alphabetic() => {
            let index = (letter.to_ascii_uppercase() as u8 - b'A') as usize;
            (index < option_count).then_some(index)
        }
        _ => None,
    }
}

/// Items of an ordering answer, separated by `,` or `;`.
///
/// When every expected item is a single word, "C A B" and "CAB" are also read.
fn split_sequence(answer: &str, expected: &[String]) -> Vec<String> {
    let tokens: Vec<String> = sequence_re()
        .split(answer.trim())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect();
    if tokens.len() != 1 || expected.len() < 2 {
        return tokens;
    }

    let single_words = expected
        .iter()
        .all(|item| !item.trim().contains(char::is_whitespace));
    if !single_words {
        return tokens;
    }

    let words: Vec<String> = whitespace_re()
        .split(&tokens[0])
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    if words.len() == expected.len() {
        return words;
    }

    let single_letters = expected.iter().all(|item| item.trim().chars().count() == 1);
    if single_letters && tokens[0].chars().count() == expected.len() {
        return tokens[0].chars().map(String::from).collect();
    }
    tokens
}

/// Whether `given` satisfies the item under `policy`. Blank answers never do.
pub fn accepts(item: &GradableItem, given: &str, policy: &GradingPolicy) -> bool {
    if given.trim().is_empty() {
        return false;
    }

    if policy.strict {
        return match &item.expected {
            Expected::OneOf(alternatives) => alternatives.iter().any(|a| a == given),
            Expected::Sequence(sequence) => given == sequence.join(","),
        };
    }

    match &item.expected {
        Expected::OneOf(alternatives) => {
            let uses_options = matches!(
                item.format,
                AnswerFormat::SingleChoice | AnswerFormat::Matching
            );
            if uses_options {
                if let Some(chosen) = resolve_choice(given, &item.options, policy) {
                    let expected: Vec<Option<usize>> = alternatives
                        .iter()
                        .map(|a| resolve_expected_choice(a, &item.options, policy))
                        .collect();
                    if expected.contains(&Some(chosen)) {
                        return true;
                    }
                    // every solution names an option, and this is another one
                    if expected.iter().all(Option::is_some) {
                        return false;
                    }
                }
            }
            let wanted = normalize(given, policy);
            alternatives.iter().any(|a| normalize(a, policy) == wanted)
        }
        Expected::Sequence(sequence) => {
            let given_items = split_sequence(given, sequence);
            given_items.len() == sequence.len()
                && given_items
                    .iter()
                    .zip(sequence)
                    .all(|(g, e)| normalize(g, policy) == normalize(e, policy))
        }
    }
}

pub fn grade(items: &[GradableItem], sheet: &AnswerSheet, policy: &GradingPolicy) -> GradeReport {
    let outcomes: Vec<ItemOutcome> = items
        .iter()
        .map(|item| {
            let given = sheet
                .get(&item.key)
                .filter(|answer| !answer.trim().is_empty())
                .map(str::to_string);
            let status = match &given {
                None => ItemStatus::Unanswered,
                Some(answer) if accepts(item, answer, policy) => ItemStatus::Correct,
                Some(_) => ItemStatus::Incorrect,
            };
            ItemOutcome {
                key: item.key.clone(),
                given,
                expected: item.expected.display(),
                status,
            }
        })
        .collect();

    let correct = outcomes
        .iter()
        .filter(|o| o.status == ItemStatus::Correct)
        .count();
    tracing::debug!("Graded {} items, {} correct", outcomes.len(), correct);

    GradeReport {
        total: outcomes.len(),
        correct,
        outcomes,
    }
}
