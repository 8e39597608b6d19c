use criterion::{black_box, criterion_group, criterion_main, Criterion};

use chrono::Utc;
use examforge_core::model::{AttemptEntry, AttemptRecord, QuestionType};
use examforge_core::profile::{analyze, AnalysisThresholds};

fn make_attempt(percentage: f64, entries_per_topic: usize) -> AttemptRecord {
    let topics = ["algebra", "geometry", "fractions", "ratios", "statistics"];
    let mut entries = Vec::new();
    for topic in topics {
        for i in 0..entries_per_topic {
            entries.push(AttemptEntry {
                question_id: format!("{topic}-{i}"),
                question_type: if i % 2 == 0 {
                    QuestionType::Choice
                } else {
                    QuestionType::ShortText
                },
                topic: topic.to_string(),
                marks: 5.0,
                score_earned: if i % 3 == 0 { 5.0 } else { 2.0 },
                answered: true,
            });
        }
    }
    AttemptRecord {
        exam_id: "bench".into(),
        percentage,
        completed_at: Utc::now(),
        entries,
    }
}

fn bench_analyze(c: &mut Criterion) {
    let thresholds = AnalysisThresholds::default();
    let attempts: Vec<AttemptRecord> = [88.0, 72.0, 65.0, 91.0, 54.0]
        .iter()
        .map(|&p| make_attempt(p, 4))
        .collect();

    let mut group = c.benchmark_group("profile_analysis");
    group.bench_function("five_attempts_twenty_entries", |b| {
        b.iter(|| {
            analyze(
                black_box("s1"),
                black_box("math"),
                None,
                black_box(&attempts),
                &thresholds,
            )
        })
    });

    let large: Vec<AttemptRecord> = [88.0, 72.0, 65.0, 91.0, 54.0]
        .iter()
        .map(|&p| make_attempt(p, 40))
        .collect();
    group.bench_function("five_attempts_two_hundred_entries", |b| {
        b.iter(|| analyze(black_box("s1"), black_box("math"), None, black_box(&large), &thresholds))
    });
    group.finish();
}

criterion_group!(benches, bench_analyze);
criterion_main!(benches);
