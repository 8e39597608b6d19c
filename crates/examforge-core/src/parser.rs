//! TOML parsing for question sets, submissions, and attempt history.
//!
//! Loads exam files from TOML and validates them before anything downstream
//! sees them.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::model::{
    validate_question_set, Answer, AnswerKey, AttemptEntry, AttemptRecord, Question,
    QuestionSet, Submission,
};

/// Intermediate TOML structure for question-set files.
#[derive(Debug, Deserialize)]
struct TomlExamFile {
    exam: TomlExamHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlExamHeader {
    id: String,
    name: String,
    subject: String,
    #[serde(default)]
    grade_level: String,
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    text: String,
    #[serde(rename = "type")]
    question_type: String,
    topic: String,
    #[serde(default = "default_difficulty")]
    difficulty: String,
    marks: f64,
    #[serde(default)]
    options: Vec<String>,
    #[serde(default)]
    correct_answer: Option<AnswerKey>,
    #[serde(default)]
    grading_rubric: Option<String>,
}

fn default_difficulty() -> String {
    "medium".to_string()
}

/// Intermediate TOML structure for submission files.
#[derive(Debug, Deserialize)]
struct TomlSubmissionFile {
    submission: TomlSubmissionHeader,
    #[serde(default)]
    answers: Vec<Answer>,
}

#[derive(Debug, Deserialize)]
struct TomlSubmissionHeader {
    student_id: String,
    exam_id: String,
    #[serde(default)]
    subject: String,
}

/// Intermediate TOML structure for attempt-history files.
#[derive(Debug, Deserialize)]
struct TomlAttemptsFile {
    #[serde(default)]
    attempts: Vec<TomlAttempt>,
}

#[derive(Debug, Deserialize)]
struct TomlAttempt {
    exam_id: String,
    percentage: f64,
    completed_at: chrono::DateTime<chrono::Utc>,
    #[serde(default)]
    entries: Vec<TomlAttemptEntry>,
}

#[derive(Debug, Deserialize)]
struct TomlAttemptEntry {
    question_id: String,
    #[serde(rename = "type")]
    question_type: String,
    topic: String,
    marks: f64,
    score_earned: f64,
    #[serde(default = "default_answered")]
    answered: bool,
}

fn default_answered() -> bool {
    true
}

/// Parse a single TOML file into a validated [`QuestionSet`].
pub fn parse_question_set(path: &Path) -> Result<QuestionSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read question set: {}", path.display()))?;
    parse_question_set_str(&content)
        .with_context(|| format!("invalid question set: {}", path.display()))
}

/// Parse a TOML string into a validated [`QuestionSet`].
pub fn parse_question_set_str(content: &str) -> Result<QuestionSet> {
    let file: TomlExamFile =
        toml::from_str(content).context("failed to parse question set TOML")?;

    let mut questions = Vec::with_capacity(file.questions.len());
    for q in file.questions {
        let question_type = q
            .question_type
            .parse()
            .map_err(|e: String| anyhow::anyhow!("question {}: {e}", q.id))?;
        let difficulty = q
            .difficulty
            .parse()
            .map_err(|e: String| anyhow::anyhow!("question {}: {e}", q.id))?;
        questions.push(Question {
            id: q.id,
            text: q.text,
            question_type,
            topic: q.topic,
            difficulty,
            marks: q.marks,
            options: q.options,
            correct_answer: q.correct_answer,
            grading_rubric: q.grading_rubric,
        });
    }

    validate_question_set(&questions)?;

    Ok(QuestionSet {
        id: file.exam.id,
        name: file.exam.name,
        subject: file.exam.subject,
        grade_level: file.exam.grade_level,
        questions,
    })
}

/// Load every `.toml` question set under a directory (non-recursive).
pub fn load_question_directory(dir: &Path) -> Result<Vec<QuestionSet>> {
    let mut sets = Vec::new();
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "toml") {
            sets.push(parse_question_set(&path)?);
        }
    }
    sets.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(sets)
}

/// Render a question set in the same TOML layout `parse_question_set`
/// reads, so generated exams can be graded later.
pub fn question_set_to_toml(set: &QuestionSet) -> Result<String> {
    #[derive(serde::Serialize)]
    struct Out<'a> {
        exam: Header<'a>,
        questions: &'a [Question],
    }

    #[derive(serde::Serialize)]
    struct Header<'a> {
        id: &'a str,
        name: &'a str,
        subject: &'a str,
        grade_level: &'a str,
    }

    let out = Out {
        exam: Header {
            id: &set.id,
            name: &set.name,
            subject: &set.subject,
            grade_level: &set.grade_level,
        },
        questions: &set.questions,
    };
    toml::to_string(&out).context("failed to serialize question set")
}

/// Parse a submission (answers) file.
pub fn parse_submission(path: &Path) -> Result<Submission> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read submission: {}", path.display()))?;
    let file: TomlSubmissionFile =
        toml::from_str(&content).context("failed to parse submission TOML")?;

    Ok(Submission {
        student_id: file.submission.student_id,
        exam_id: file.submission.exam_id,
        subject: file.submission.subject,
        answers: file.answers,
    })
}

/// Parse an attempt-history file, most-recent-first.
pub fn parse_attempts(path: &Path) -> Result<Vec<AttemptRecord>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read attempts: {}", path.display()))?;
    let file: TomlAttemptsFile =
        toml::from_str(&content).context("failed to parse attempts TOML")?;

    let mut attempts = Vec::with_capacity(file.attempts.len());
    for a in file.attempts {
        let mut entries = Vec::with_capacity(a.entries.len());
        for e in a.entries {
            let question_type = e
                .question_type
                .parse()
                .map_err(|err: String| anyhow::anyhow!("attempt {}: {err}", a.exam_id))?;
            entries.push(AttemptEntry {
                question_id: e.question_id,
                question_type,
                topic: e.topic,
                marks: e.marks,
                score_earned: e.score_earned,
                answered: e.answered,
            });
        }
        attempts.push(AttemptRecord {
            exam_id: a.exam_id,
            percentage: a.percentage,
            completed_at: a.completed_at,
            entries,
        });
    }

    // Most recent first, regardless of file order.
    attempts.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    Ok(attempts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Difficulty, QuestionType};

    const EXAM_TOML: &str = r#"
[exam]
id = "algebra-1"
name = "Algebra Basics"
subject = "math"
grade_level = "8"

[[questions]]
id = "q1"
text = "What is 2 + 2?"
type = "choice"
topic = "arithmetic"
difficulty = "easy"
marks = 5.0
options = ["3", "4", "5"]
correct_answer = "4"

[[questions]]
id = "q2"
text = "The capital of France is ____ and its river is ____."
type = "fill_blank"
topic = "geography"
marks = 4.0
correct_answer = ["Paris", "Seine"]

[[questions]]
id = "q3"
text = "Explain why the sky is blue."
type = "long_text"
topic = "physics"
difficulty = "hard"
marks = 10.0
grading_rubric = "mention scattering"
"#;

    #[test]
    fn parse_full_question_set() {
        let set = parse_question_set_str(EXAM_TOML).unwrap();
        assert_eq!(set.id, "algebra-1");
        assert_eq!(set.subject, "math");
        assert_eq!(set.questions.len(), 3);
        assert_eq!(set.questions[0].question_type, QuestionType::Choice);
        assert_eq!(set.questions[1].difficulty, Difficulty::Medium);
        assert_eq!(
            set.questions[1].correct_answer,
            Some(AnswerKey::Many(vec!["Paris".into(), "Seine".into()]))
        );
        assert_eq!(set.questions[2].question_type, QuestionType::LongText);
    }

    #[test]
    fn parse_rejects_unknown_type() {
        let bad = EXAM_TOML.replace("type = \"choice\"", "type = \"riddle\"");
        assert!(parse_question_set_str(&bad).is_err());
    }

    #[test]
    fn parse_rejects_invalid_marks() {
        let bad = EXAM_TOML.replace("marks = 5.0", "marks = -5.0");
        let err = parse_question_set_str(&bad).unwrap_err();
        assert!(format!("{err:#}").contains("marks"));
    }

    #[test]
    fn parse_submission_file() {
        let toml = r#"
[submission]
student_id = "s1"
exam_id = "algebra-1"
subject = "math"

[[answers]]
question_id = "q1"
response = "4"

[[answers]]
question_id = "q3"
response = "Rayleigh scattering."
ai_score = 80.0
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("submission.toml");
        std::fs::write(&path, toml).unwrap();

        let submission = parse_submission(&path).unwrap();
        assert_eq!(submission.student_id, "s1");
        assert_eq!(submission.answers.len(), 2);
        assert_eq!(
            submission.answers[0].response,
            Some(AnswerKey::Single("4".into()))
        );
        assert_eq!(submission.answers[1].ai_score, Some(80.0));
    }

    #[test]
    fn parse_attempts_sorts_most_recent_first() {
        let toml = r#"
[[attempts]]
exam_id = "old"
percentage = 60.0
completed_at = "2026-01-01T10:00:00Z"

[[attempts]]
exam_id = "new"
percentage = 90.0
completed_at = "2026-02-01T10:00:00Z"

  [[attempts.entries]]
  question_id = "q1"
  type = "choice"
  topic = "algebra"
  marks = 5.0
  score_earned = 5.0
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("attempts.toml");
        std::fs::write(&path, toml).unwrap();

        let attempts = parse_attempts(&path).unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].exam_id, "new");
        assert_eq!(attempts[1].exam_id, "old");
        assert_eq!(attempts[0].entries.len(), 1);
        assert_eq!(attempts[0].entries[0].question_type, QuestionType::Choice);
    }

    #[test]
    fn written_sets_parse_back() {
        let set = parse_question_set_str(EXAM_TOML).unwrap();
        let rendered = question_set_to_toml(&set).unwrap();
        let reparsed = parse_question_set_str(&rendered).unwrap();

        assert_eq!(reparsed.id, set.id);
        assert_eq!(reparsed.questions.len(), set.questions.len());
        assert_eq!(
            reparsed.questions[1].correct_answer,
            set.questions[1].correct_answer
        );
    }

    #[test]
    fn load_directory_of_sets() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.toml"), EXAM_TOML).unwrap();
        std::fs::write(
            dir.path().join("b.toml"),
            EXAM_TOML.replace("algebra-1", "algebra-2"),
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not toml").unwrap();

        let sets = load_question_directory(dir.path()).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].id, "algebra-1");
        assert_eq!(sets[1].id, "algebra-2");
    }
}
