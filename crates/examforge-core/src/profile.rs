//! Performance-profile analysis over attempt history.
//!
//! A pure heuristic: given a stored profile (if any) and the most recent
//! completed attempts, produce an updated analysis (skill level,
//! strengths, weaknesses, preferred question types, trend). Every cutoff is
//! a named field on [`AnalysisThresholds`] so the heuristic can be tuned
//! and tested without touching control flow.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::model::{
    AttemptRecord, Difficulty, PerformanceAnalysis, PerformanceProfile, QuestionType, Trend,
    DEFAULT_SKILL_LEVEL,
};

/// Tunable cutoffs for the analysis heuristic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisThresholds {
    /// How many of the most recent attempts are considered.
    pub window: usize,
    /// (average-score cutoff, skill-level floor) pairs, best first.
    pub skill_buckets: Vec<(f64, u8)>,
    /// Skill cap applied when the average falls below every bucket.
    pub low_average_cap: u8,
    /// A question type becomes preferred at this accuracy...
    pub preferred_accuracy: f64,
    /// ...over at least this many answered samples.
    pub preferred_min_samples: usize,
    /// A topic becomes a strength at this accuracy.
    pub strength_accuracy: f64,
    /// A topic becomes a weakness below this accuracy.
    pub weakness_accuracy: f64,
    /// Minimum answered samples before a topic is classified either way.
    pub topic_min_samples: usize,
    /// Recent-vs-older mean difference that flips the trend.
    pub trend_delta: f64,
    /// Attempts required before the trend is recomputed at all.
    pub trend_min_samples: usize,
    /// Subjective entries count as correct at this score/marks ratio.
    pub subjective_correct_ratio: f64,
    /// Average score at or above this recommends hard questions.
    pub hard_cutoff: f64,
    /// Average score at or above this recommends medium questions.
    pub medium_cutoff: f64,
}

impl Default for AnalysisThresholds {
    fn default() -> Self {
        Self {
            window: 5,
            skill_buckets: vec![(90.0, 7), (80.0, 6), (70.0, 5), (60.0, 4)],
            low_average_cap: 3,
            preferred_accuracy: 0.8,
            preferred_min_samples: 3,
            strength_accuracy: 0.8,
            weakness_accuracy: 0.6,
            topic_min_samples: 2,
            trend_delta: 10.0,
            trend_min_samples: 3,
            subjective_correct_ratio: 0.7,
            hard_cutoff: 85.0,
            medium_cutoff: 70.0,
        }
    }
}

/// Build an updated analysis from a stored profile and recent attempts.
///
/// `attempts` must be ordered most-recent-first; only the first
/// `thresholds.window` entries are considered.
pub fn analyze(
    student_id: &str,
    subject: &str,
    stored: Option<&PerformanceProfile>,
    attempts: &[AttemptRecord],
    thresholds: &AnalysisThresholds,
) -> PerformanceAnalysis {
    if attempts.is_empty() {
        return match stored {
            Some(profile) => PerformanceAnalysis::from_profile(profile),
            None => PerformanceAnalysis::defaults(student_id, subject),
        };
    }

    let window = &attempts[..attempts.len().min(thresholds.window)];
    let average_score =
        window.iter().map(|a| a.percentage).sum::<f64>() / window.len() as f64;

    let stored_skill = stored.map(|p| p.skill_level).unwrap_or(DEFAULT_SKILL_LEVEL);
    let skill_level = skill_from_average(average_score, stored_skill, thresholds);

    let preferred_question_types = preferred_types(window, thresholds);
    let (strengths, weaknesses) = topic_classification(window, thresholds);
    let focus_topics: Vec<String> = weaknesses.iter().cloned().collect();

    let recommended_difficulty = if average_score >= thresholds.hard_cutoff {
        Difficulty::Hard
    } else if average_score >= thresholds.medium_cutoff {
        Difficulty::Medium
    } else {
        Difficulty::Easy
    };

    let trend = if window.len() >= thresholds.trend_min_samples {
        compute_trend(window, thresholds.trend_delta)
    } else {
        stored.map(|p| p.trend).unwrap_or(Trend::Stable)
    };

    PerformanceAnalysis {
        student_id: student_id.to_string(),
        subject: subject.to_string(),
        skill_level,
        strengths,
        weaknesses,
        preferred_question_types,
        difficulty_preference: recommended_difficulty.preference_level(),
        trend,
        average_score: Some(average_score),
        recommended_difficulty,
        focus_topics,
    }
}

/// Skill level only ratchets up from strong performance; the sole branch
/// that can pull it down is an average below every bucket.
fn skill_from_average(average: f64, stored_skill: u8, thresholds: &AnalysisThresholds) -> u8 {
    let floor = thresholds
        .skill_buckets
        .iter()
        .find(|(cutoff, _)| average >= *cutoff)
        .map(|(_, level)| *level);

    let skill = match floor {
        Some(floor) => floor.max(stored_skill),
        None => stored_skill.min(thresholds.low_average_cap),
    };
    skill.clamp(1, 10)
}

/// Entry-level "correct" predicate used by the accuracy heuristics only.
/// Objective entries need full marks; subjective entries count as correct
/// from the configured score ratio upward.
fn entry_correct(
    entry: &crate::model::AttemptEntry,
    thresholds: &AnalysisThresholds,
) -> bool {
    if entry.marks <= 0.0 {
        return false;
    }
    if entry.question_type.is_objective() {
        entry.score_earned >= entry.marks
    } else {
        entry.score_earned >= thresholds.subjective_correct_ratio * entry.marks
    }
}

fn preferred_types(
    window: &[AttemptRecord],
    thresholds: &AnalysisThresholds,
) -> BTreeSet<QuestionType> {
    let mut tallies: BTreeMap<QuestionType, (usize, usize)> = BTreeMap::new();
    for attempt in window {
        for entry in attempt.entries.iter().filter(|e| e.answered) {
            let tally = tallies.entry(entry.question_type).or_default();
            tally.1 += 1;
            if entry_correct(entry, thresholds) {
                tally.0 += 1;
            }
        }
    }

    tallies
        .into_iter()
        .filter(|(_, (correct, total))| {
            *total >= thresholds.preferred_min_samples
                && *correct as f64 / *total as f64 >= thresholds.preferred_accuracy
        })
        .map(|(qtype, _)| qtype)
        .collect()
}

fn topic_classification(
    window: &[AttemptRecord],
    thresholds: &AnalysisThresholds,
) -> (BTreeSet<String>, BTreeSet<String>) {
    let mut tallies: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for attempt in window {
        for entry in attempt.entries.iter().filter(|e| e.answered) {
            let tally = tallies.entry(entry.topic.as_str()).or_default();
            tally.1 += 1;
            if entry_correct(entry, thresholds) {
                tally.0 += 1;
            }
        }
    }

    let mut strengths = BTreeSet::new();
    let mut weaknesses = BTreeSet::new();
    for (topic, (correct, total)) in tallies {
        if total < thresholds.topic_min_samples {
            continue;
        }
        let accuracy = correct as f64 / total as f64;
        if accuracy >= thresholds.strength_accuracy {
            strengths.insert(topic.to_string());
        } else if accuracy < thresholds.weakness_accuracy {
            weaknesses.insert(topic.to_string());
        }
    }
    (strengths, weaknesses)
}

/// Compare the mean of the two most recent scores against the mean of the
/// two oldest scores in the window. With exactly three attempts the middle
/// one participates in both means.
fn compute_trend(window: &[AttemptRecord], delta: f64) -> Trend {
    let recent = (window[0].percentage + window[1].percentage) / 2.0;
    let oldest =
        (window[window.len() - 2].percentage + window[window.len() - 1].percentage) / 2.0;

    let diff = recent - oldest;
    if diff > delta {
        Trend::Improving
    } else if diff < -delta {
        Trend::Declining
    } else {
        Trend::Stable
    }
}
