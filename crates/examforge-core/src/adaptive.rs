//! Adaptive generation-parameter selection.
//!
//! Turns a performance analysis into the parameter object handed to the
//! external question-generation service: target difficulty, focus topics,
//! advisory topic mix, and skill-scaled mark weighting.

use std::str::FromStr;

use crate::model::{
    Difficulty, GenerationRequest, MarkWeighting, MixPolicy, PerformanceAnalysis,
};

/// Base marks per difficulty tier before skill scaling.
pub const BASE_MARKS_EASY: f64 = 3.0;
pub const BASE_MARKS_MEDIUM: f64 = 5.0;
pub const BASE_MARKS_HARD: f64 = 8.0;

/// Skill divisor and clamp range for the mark-scaling factor.
const SKILL_PIVOT: f64 = 6.0;
const SCALE_MIN: f64 = 0.5;
const SCALE_MAX: f64 = 1.5;

/// Caller-requested difficulty: adapt to the profile, or use a fixed tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetDifficulty {
    Auto,
    Fixed(Difficulty),
}

impl FromStr for TargetDifficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            Ok(TargetDifficulty::Auto)
        } else {
            s.parse::<Difficulty>().map(TargetDifficulty::Fixed)
        }
    }
}

/// Marks for one newly authored question:
/// `round(base × clamp(skill/6, 0.5, 1.5))`.
pub fn scaled_marks(difficulty: Difficulty, skill_level: u8) -> u32 {
    let base = match difficulty {
        Difficulty::Easy => BASE_MARKS_EASY,
        Difficulty::Medium => BASE_MARKS_MEDIUM,
        Difficulty::Hard => BASE_MARKS_HARD,
    };
    let factor = (f64::from(skill_level) / SKILL_PIVOT).clamp(SCALE_MIN, SCALE_MAX);
    (base * factor).round() as u32
}

/// The full per-tier weighting for a skill level.
pub fn mark_weighting(skill_level: u8) -> MarkWeighting {
    MarkWeighting {
        easy: scaled_marks(Difficulty::Easy, skill_level),
        medium: scaled_marks(Difficulty::Medium, skill_level),
        hard: scaled_marks(Difficulty::Hard, skill_level),
    }
}

/// Assemble the generation request for one adaptive exam.
///
/// Focus areas come from the caller's override when supplied, otherwise
/// from the analysis weaknesses; when both are empty the topic list stays
/// empty and the service default applies.
pub fn build_generation_request(
    analysis: &PerformanceAnalysis,
    grade_level: &str,
    target: TargetDifficulty,
    focus_override: Option<Vec<String>>,
    question_count: usize,
) -> GenerationRequest {
    let difficulty = match target {
        TargetDifficulty::Auto => analysis.recommended_difficulty,
        TargetDifficulty::Fixed(d) => d,
    };

    let topics = match focus_override {
        Some(topics) if !topics.is_empty() => topics,
        _ => analysis.focus_topics.clone(),
    };

    GenerationRequest {
        subject: analysis.subject.clone(),
        grade_level: grade_level.to_string(),
        difficulty,
        topics,
        question_count,
        mark_weighting: mark_weighting(analysis.skill_level),
        mix_policy: MixPolicy::default(),
        profile_summary: profile_summary(analysis),
    }
}

/// One-line summary of the student for the service's prompt context.
fn profile_summary(analysis: &PerformanceAnalysis) -> String {
    let weaknesses = if analysis.weaknesses.is_empty() {
        "none identified".to_string()
    } else {
        analysis
            .weaknesses
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "skill {}/10, trend {}, weak areas: {}",
        analysis.skill_level, analysis.trend, weaknesses
    )
}
