//! Helpers that turn loosely-typed content records into display-ready values.

use crate::domain::model::{CourseType, Exercise};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::sync::OnceLock;

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

fn word_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b\w").expect("static regex"))
}

/// "Open Cloze" -> "open-cloze"
pub fn slugify(name: &str) -> String {
    whitespace_re()
        .replace_all(&name.to_lowercase(), "-")
        .into_owned()
}

/// Grammar test choices are stored as one string separated by `//`.
pub fn parse_grammar_choices(choices: &str) -> Vec<String> {
    choices.split("//").map(|c| c.trim().to_string()).collect()
}

/// Textual form of an `id` field as the content tools wrote it.
pub fn json_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub fn id_from_filename(filename: &str) -> String {
    let len = filename.len();
    if len >= 5 && filename.is_char_boundary(len - 5) && filename[len - 5..].eq_ignore_ascii_case(".json") {
        filename[..len - 5].to_string()
    } else {
        filename.to_string()
    }
}

/// Index, quantity and activity listings share the folders of real exercises.
pub fn is_auxiliary_file(filename: &str) -> bool {
    filename.contains("index") || filename.contains("quantities") || filename.contains("activities")
}

/// Placeholder exercises left in the dump ("Exercise bare").
pub fn is_bare_exercise(title: &str, filename: &str) -> bool {
    let title = title.to_lowercase();
    title.contains("exercise bare") || title == "bare" || filename.to_lowercase().contains("bare")
}

/// Numeric-aware ordering: "2.json" sorts before "10.json".
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) if l.is_ascii_digit() && r.is_ascii_digit() => {
                let l_num = take_digits(&mut left);
                let r_num = take_digits(&mut right);
                let l_trim = l_num.trim_start_matches('0');
                let r_trim = r_num.trim_start_matches('0');
                let ord = l_trim
                    .len()
                    .cmp(&r_trim.len())
                    .then_with(|| l_trim.cmp(r_trim));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(l), Some(r)) => {
                let ord = l.to_lowercase().cmp(r.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    digits
}

/// "multiple-choice" -> "Multiple Choice"
pub fn activity_display_name(activity: &str) -> String {
    let spaced = activity.replace('-', " ");
    word_start_re()
        .replace_all(&spaced, |caps: &regex::Captures| caps[0].to_uppercase())
        .into_owned()
}

/// A, B, C ... for option lists.
pub fn choice_label(index: usize) -> String {
    char::from_u32(65 + index as u32)
        .map(String::from)
        .unwrap_or_else(|| (index + 1).to_string())
}

/// Keys of a question map in display order: numeric keys by value, then the rest.
pub fn sorted_object_keys(obj: &Map<String, Value>) -> Vec<String> {
    let mut keys: Vec<String> = obj.keys().cloned().collect();
    keys.sort_by(|a, b| compare_keys(a, b));
    keys
}

pub(crate) fn compare_keys(a: &str, b: &str) -> Ordering {
    match (a.trim().parse::<i64>(), b.trim().parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

const NUMBERED_ACTIVITIES: [&str; 3] = ["signs", "extracts", "pictures"];

/// Title shown in exercise lists; `index` is the position in the listing.
pub fn exercise_title(exercise: &Exercise, index: usize) -> String {
    let payload = &exercise.payload;

    if exercise.course == CourseType::GrammarTests {
        if let Some(number) = payload.get("number").and_then(json_id) {
            if !number.is_empty() && number != "0" {
                return format!("Exercise {}", number);
            }
        }
    }

    if exercise.course == CourseType::Writing {
        return format!("Exercise {}", index + 1);
    }

    let activity = exercise.activity.to_lowercase();
    if activity == "multiple-choice" && exercise.course == CourseType::Listening {
        return format!("Exercise {}", index + 1);
    }
    if NUMBERED_ACTIVITIES.contains(&activity.as_str()) {
        return format!("Exercise {}", index + 1);
    }

    match payload.get("title").and_then(Value::as_str) {
        Some(title) if !title.is_empty() => title.to_string(),
        _ => format!("Exercise {}", exercise.id),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topic {
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrammarQuestion {
    /// Sentence with `[]` marking the gap.
    pub text: String,
    pub choices: Vec<String>,
    pub solution: String,
    pub explanation: Option<String>,
    pub topic: Option<Topic>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WritingTask {
    pub opening: String,
    pub subject: Option<String>,
    pub closure: String,
    pub paragraphs: Vec<String>,
    pub points: Vec<String>,
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeakingTask {
    pub questions: Vec<String>,
    pub image: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComprehensionQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comprehension {
    pub headline: Option<String>,
    pub text: Option<String>,
    pub questions: Vec<ComprehensionQuestion>,
}

/// Typed view of an exercise payload, chosen by course and by the fields present.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "content", rename_all = "snake_case")]
pub enum ExerciseContent {
    Grammar { questions: Vec<GrammarQuestion> },
    Writing(WritingTask),
    Speaking(SpeakingTask),
    Comprehension(Comprehension),
    Unstructured { payload: Value },
}

impl ExerciseContent {
    pub fn from_exercise(exercise: &Exercise) -> Self {
        let payload = &exercise.payload;
        match exercise.course {
            CourseType::GrammarTests => {
                let questions = grammar_questions(payload);
                if questions.is_empty() {
                    Self::Unstructured {
                        payload: payload.clone(),
                    }
                } else {
                    Self::Grammar { questions }
                }
            }
            CourseType::Writing if payload.get("opening").is_some() => {
                Self::Writing(writing_task(payload))
            }
            CourseType::Speaking if payload.get("questions").is_some() => {
                Self::Speaking(speaking_task(payload))
            }
            _ if payload.get("text").is_some()
                || payload.get("headline").is_some()
                || payload.get("questions").map(Value::is_array).unwrap_or(false) =>
            {
                Self::Comprehension(comprehension(payload))
            }
            _ => Self::Unstructured {
                payload: payload.clone(),
            },
        }
    }
}

/// String form of a scalar, or the items of an array joined by newlines.
pub(crate) fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(_) | Value::Bool(_) => json_id(value),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(text_of).collect();
            (!parts.is_empty()).then(|| parts.join("\n"))
        }
        _ => None,
    }
}

pub(crate) fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(text_of).collect(),
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Object(obj)) => sorted_object_keys(obj)
            .iter()
            .filter_map(|key| obj.get(key).and_then(text_of))
            .collect(),
        _ => Vec::new(),
    }
}

fn field(payload: &Value, name: &str) -> Option<String> {
    payload.get(name).and_then(text_of)
}

pub(crate) fn grammar_question(value: &Value) -> Option<GrammarQuestion> {
    let text = field(value, "text")?;
    let solution = field(value, "solution")?;
    let choices = match value.get("choices") {
        Some(Value::String(choices)) => parse_grammar_choices(choices),
        other => string_list(other),
    };
    let topic = value.get("topic").and_then(|topic| {
        Some(Topic {
            name: field(topic, "name")?,
            slug: field(topic, "slug").unwrap_or_default(),
        })
    });

    Some(GrammarQuestion {
        text,
        choices,
        solution,
        explanation: field(value, "explanation"),
        topic,
    })
}

fn grammar_questions(payload: &Value) -> Vec<GrammarQuestion> {
    match payload.get("questions") {
        Some(Value::Array(items)) => items.iter().filter_map(grammar_question).collect(),
        _ => grammar_question(payload).into_iter().collect(),
    }
}

fn writing_task(payload: &Value) -> WritingTask {
    WritingTask {
        opening: field(payload, "opening").unwrap_or_default(),
        subject: field(payload, "subject"),
        closure: field(payload, "closure").unwrap_or_default(),
        paragraphs: string_list(payload.get("paragraphs")),
        points: string_list(payload.get("points")),
        kind: field(payload, "type"),
    }
}

fn speaking_task(payload: &Value) -> SpeakingTask {
    SpeakingTask {
        questions: string_list(payload.get("questions")),
        image: field(payload, "image"),
        notes: field(payload, "notes"),
    }
}

fn comprehension(payload: &Value) -> Comprehension {
    let questions = match payload.get("questions") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(question) => ComprehensionQuestion {
                    question: question.clone(),
                    options: Vec::new(),
                    answer: None,
                },
                _ => ComprehensionQuestion {
                    question: field(item, "question")
                        .or_else(|| field(item, "text"))
                        .unwrap_or_default(),
                    options: string_list(item.get("options")),
                    answer: field(item, "answer"),
                },
            })
            .collect(),
        _ => Vec::new(),
    };

    Comprehension {
        headline: field(payload, "headline"),
        text: field(payload, "text"),
        questions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::LevelType;
    use serde_json::json;

    fn exercise(course: CourseType, activity: &str, id: &str, payload: Value) -> Exercise {
        Exercise {
            id: id.to_string(),
            course,
            level: LevelType::B2,
            activity: activity.to_string(),
            relpath: format!("{}/b2/{}/{}.json", course, activity, id),
            payload,
        }
    }

    #[test]
    fn test_slugify_collapses_whitespace() {
        assert_eq!(slugify("Open  Cloze"), "open-cloze");
        assert_eq!(slugify("Signs"), "signs");
        assert_eq!(slugify("Key word\ttransformation"), "key-word-transformation");
    }

    #[test]
    fn test_parse_grammar_choices_trims() {
        assert_eq!(
            parse_grammar_choices("has been // have been //had been"),
            vec!["has been", "have been", "had been"]
        );
    }

    #[test]
    fn test_json_id_and_filename_id() {
        assert_eq!(json_id(&json!(12)), Some("12".to_string()));
        assert_eq!(json_id(&json!("a7")), Some("a7".to_string()));
        assert_eq!(json_id(&json!({"x": 1})), None);
        assert_eq!(id_from_filename("14.JSON"), "14");
        assert_eq!(id_from_filename("notes.txt"), "notes.txt");
    }

    #[test]
    fn test_file_filters() {
        assert!(is_auxiliary_file("index.json"));
        assert!(is_auxiliary_file("quantities.json"));
        assert!(!is_auxiliary_file("3.json"));
        assert!(is_bare_exercise("Exercise Bare", "3.json"));
        assert!(is_bare_exercise("BARE", "3.json"));
        assert!(is_bare_exercise("", "bare-3.json"));
        assert!(!is_bare_exercise("Barely there", "3.json"));
    }

    #[test]
    fn test_natural_cmp_orders_numbers_by_value() {
        let mut names = vec!["10.json", "2.json", "1.json", "b.json", "A.json"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["1.json", "2.json", "10.json", "A.json", "b.json"]);
    }

    #[test]
    fn test_display_helpers() {
        assert_eq!(activity_display_name("multiple-choice"), "Multiple Choice");
        assert_eq!(choice_label(0), "A");
        assert_eq!(choice_label(3), "D");

        let obj = json!({"10": "a", "2": "b", "x": "c", "1": "d"});
        assert_eq!(
            sorted_object_keys(obj.as_object().unwrap()),
            vec!["1", "2", "10", "x"]
        );
    }

    #[test]
    fn test_exercise_title_rules() {
        let grammar = exercise(CourseType::GrammarTests, "beginner", "g1", json!({"number": 4}));
        assert_eq!(exercise_title(&grammar, 0), "Exercise 4");

        let zero = exercise(CourseType::GrammarTests, "beginner", "g2", json!({"number": 0, "title": "Articles"}));
        assert_eq!(exercise_title(&zero, 0), "Articles");

        let blank = exercise(CourseType::GrammarTests, "beginner", "g3", json!({"number": ""}));
        assert_eq!(exercise_title(&blank, 5), "Exercise g3");

        let writing = exercise(CourseType::Writing, "essay", "w1", json!({"title": "Essay"}));
        assert_eq!(exercise_title(&writing, 2), "Exercise 3");

        let listening = exercise(CourseType::Listening, "multiple-choice", "5", json!({"title": "T"}));
        assert_eq!(exercise_title(&listening, 0), "Exercise 1");

        let reading_mc = exercise(CourseType::Reading, "multiple-choice", "5", json!({"title": "Dogs"}));
        assert_eq!(exercise_title(&reading_mc, 0), "Dogs");

        let signs = exercise(CourseType::Reading, "Signs", "5", json!({"title": "Sign"}));
        assert_eq!(exercise_title(&signs, 1), "Exercise 2");

        let untitled = exercise(CourseType::UseOfEnglish, "open-cloze", "9", json!({}));
        assert_eq!(exercise_title(&untitled, 0), "Exercise 9");
    }

    #[test]
    fn test_content_view_for_grammar_payload() {
        let ex = exercise(
            CourseType::GrammarTests,
            "beginner",
            "1",
            json!({
                "number": 1,
                "questions": [
                    {"text": "She [] here for years.", "choices": "has lived // lives // is living",
                     "solution": "has lived", "topic": {"name": "Present perfect", "slug": "present-perfect"}}
                ]
            }),
        );

        match ExerciseContent::from_exercise(&ex) {
            ExerciseContent::Grammar { questions } => {
                assert_eq!(questions.len(), 1);
                assert_eq!(questions[0].choices.len(), 3);
                assert_eq!(questions[0].topic.as_ref().unwrap().slug, "present-perfect");
            }
            other => panic!("unexpected content: {:?}", other),
        }
    }

    #[test]
    fn test_content_view_for_writing_and_speaking() {
        let writing = exercise(
            CourseType::Writing,
            "letter",
            "1",
            json!({"opening": "Dear Sir,", "closure": "Yours", "points": ["a", "b"], "type": "letter"}),
        );
        match ExerciseContent::from_exercise(&writing) {
            ExerciseContent::Writing(task) => {
                assert_eq!(task.points, vec!["a", "b"]);
                assert_eq!(task.kind.as_deref(), Some("letter"));
            }
            other => panic!("unexpected content: {:?}", other),
        }

        let speaking = exercise(
            CourseType::Speaking,
            "part-2",
            "1",
            json!({"questions": ["Describe the photo"], "image": 2}),
        );
        match ExerciseContent::from_exercise(&speaking) {
            ExerciseContent::Speaking(task) => assert_eq!(task.image.as_deref(), Some("2")),
            other => panic!("unexpected content: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_shape_is_unstructured() {
        let ex = exercise(CourseType::Reading, "gapped", "1", json!({"paragraphs": {"1": "x"}}));
        assert!(matches!(
            ExerciseContent::from_exercise(&ex),
            ExerciseContent::Unstructured { .. }
        ));
    }
}
