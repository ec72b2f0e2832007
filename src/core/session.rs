use crate::core::grading::{accepts, extract_items, grade, AnswerSheet, GradableItem, GradeReport, GradingPolicy};
use crate::core::normalize::{activity_display_name, ExerciseContent};
use crate::domain::model::Exercise;

/// State of one learner working through one exercise.
#[derive(Debug, Clone)]
pub struct ExerciseSession {
    exercise: Exercise,
    items: Vec<GradableItem>,
    policy: GradingPolicy,
    answers: AnswerSheet,
    show_answers: bool,
    show_results: bool,
}

impl ExerciseSession {
    pub fn new(exercise: Exercise, policy: GradingPolicy) -> Self {
        let items = extract_items(&exercise.payload);
        tracing::debug!(
            "Session for {} has {} gradable items",
            exercise.relpath,
            items.len()
        );
        Self {
            exercise,
            items,
            policy,
            answers: AnswerSheet::new(),
            show_answers: false,
            show_results: false,
        }
    }

    pub fn exercise(&self) -> &Exercise {
        &self.exercise
    }

    pub fn items(&self) -> &[GradableItem] {
        &self.items
    }

    pub fn content(&self) -> ExerciseContent {
        ExerciseContent::from_exercise(&self.exercise)
    }

    pub fn activity_display_name(&self) -> String {
        activity_display_name(&self.exercise.activity)
    }

    pub fn answers(&self) -> &AnswerSheet {
        &self.answers
    }

    pub fn is_gradable(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn show_answers(&self) -> bool {
        self.show_answers
    }

    pub fn show_results(&self) -> bool {
        self.show_results
    }

    pub fn select_answer(&mut self, key: &str, answer: &str) {
        self.answers.set(key, answer);
    }

    /// Replace all answers at once, e.g. from a submitted sheet.
    pub fn load_answers(&mut self, answers: AnswerSheet) {
        self.answers = answers;
    }

    pub fn toggle_answers(&mut self) {
        self.show_answers = !self.show_answers;
    }

    pub fn check_answers(&mut self) -> GradeReport {
        self.show_results = true;
        grade(&self.items, &self.answers, &self.policy)
    }

    pub fn reset(&mut self) {
        self.answers.clear();
        self.show_results = false;
        self.show_answers = false;
    }

    /// False when the question has no solution or no answer yet.
    pub fn is_correct_answer(&self, key: &str) -> bool {
        let Some(item) = self.items.iter().find(|item| item.key == key) else {
            return false;
        };
        match self.answers.get(key) {
            Some(answer) => accepts(item, answer, &self.policy),
            None => false,
        }
    }

    pub fn correct_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| self.is_correct_answer(&item.key))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{CourseType, LevelType};
    use serde_json::json;

    fn matching_exercise() -> Exercise {
        Exercise {
            id: "4".to_string(),
            course: CourseType::Reading,
            level: LevelType::C1,
            activity: "cross-matching".to_string(),
            relpath: "reading/c1/Cross Matching/4.json".to_string(),
            payload: json!({
                "title": "Four reviewers",
                "questions": {"1": "q1", "2": "q2", "3": "q3"},
                "solutions": {"1": "A", "2": "C", "3": "B"}
            }),
        }
    }

    #[test]
    fn test_session_flow() {
        let mut session = ExerciseSession::new(matching_exercise(), GradingPolicy::default());
        assert!(session.is_gradable());
        assert_eq!(session.activity_display_name(), "Cross Matching");
        assert!(!session.is_correct_answer("1"));

        session.select_answer("1", "A");
        session.select_answer("2", "B");
        assert!(session.is_correct_answer("1"));
        assert!(!session.is_correct_answer("2"));
        assert!(!session.is_correct_answer("9"));
        assert_eq!(session.correct_count(), 1);

        session.toggle_answers();
        assert!(session.show_answers());

        let report = session.check_answers();
        assert!(session.show_results());
        assert_eq!(report.correct, 1);
        assert_eq!(report.total, 3);

        session.reset();
        assert!(session.answers().is_empty());
        assert!(!session.show_answers());
        assert!(!session.show_results());
        assert_eq!(session.correct_count(), 0);
    }

    #[test]
    fn test_strict_session_matches_exactly() {
        let mut session = ExerciseSession::new(matching_exercise(), GradingPolicy::strict());
        session.select_answer("1", "a");
        assert!(!session.is_correct_answer("1"));
        session.select_answer("1", "A");
        assert!(session.is_correct_answer("1"));
    }
}
