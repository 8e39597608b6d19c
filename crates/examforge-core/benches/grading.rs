use criterion::{black_box, criterion_group, criterion_main, Criterion};

use examforge_core::model::{Answer, AnswerKey, Difficulty, Question, QuestionType};
use examforge_core::score::{aggregate, GradeTable};

fn make_exam(count: usize) -> (Vec<Question>, Vec<Answer>) {
    let mut questions = Vec::with_capacity(count);
    let mut answers = Vec::with_capacity(count);
    for i in 0..count {
        let id = format!("q{i}");
        questions.push(Question {
            id: id.clone(),
            text: format!("question {i}"),
            question_type: QuestionType::Choice,
            topic: "algebra".into(),
            difficulty: Difficulty::Medium,
            marks: 5.0,
            options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            correct_answer: Some(AnswerKey::Single("B".into())),
            grading_rubric: None,
        });
        answers.push(Answer {
            question_id: id,
            response: Some(AnswerKey::Single(if i % 3 == 0 { "B" } else { "C" }.into())),
            ai_score: None,
            ai_feedback: None,
            manual_score: None,
            manual_feedback: None,
        });
    }
    (questions, answers)
}

fn bench_aggregate(c: &mut Criterion) {
    let table = GradeTable::default();
    let mut group = c.benchmark_group("aggregate");

    for count in [10usize, 50, 200] {
        let (questions, answers) = make_exam(count);
        group.bench_function(format!("{count}_questions"), |b| {
            b.iter(|| aggregate(black_box(&questions), black_box(&answers), &table))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_aggregate);
criterion_main!(benches);
