use crate::models::{RiskAssessment, RiskFactors, RiskLevel};

// Deficit weights: attendance carries the most signal, engagement the least.
const W_ATTENDANCE: f64 = 0.30;
const W_ACADEMIC: f64 = 0.25;
const W_FEE: f64 = 0.25;
const W_ENGAGEMENT: f64 = 0.20;

// Weighted deficits top out at 100, but observed dropouts cluster well below
// that, so the blend is stretched before bucketing.
const SCALE: f64 = 2.0;

const ATTENDANCE_THRESHOLD: f64 = 70.0;
const ACADEMIC_THRESHOLD: f64 = 70.0;
const FEE_THRESHOLD: f64 = 75.0;
const ENGAGEMENT_THRESHOLD: f64 = 60.0;

/// Derives score, level, reasons, and suggestions in one pass. Pure; the
/// caller replaces the whole assessment whenever factors change.
pub fn classify(factors: &RiskFactors) -> RiskAssessment {
    let score = score(factors);
    let (reasons, suggestions) = explain(factors);
    RiskAssessment {
        score,
        level: level_for(score),
        reasons,
        suggestions,
    }
}

/// Monotone blend of factor deficits: lowering any single factor can only
/// raise the score, clamped into 0-100.
pub fn score(factors: &RiskFactors) -> f64 {
    let blended = W_ATTENDANCE * (100.0 - factors.attendance)
        + W_ACADEMIC * (100.0 - factors.academic_performance)
        + W_FEE * (100.0 - factors.fee_payment)
        + W_ENGAGEMENT * (100.0 - factors.engagement);
    (blended * SCALE).clamp(0.0, 100.0)
}

/// Bucket boundaries are closed on the low end: exactly 70 is High,
/// exactly 40 is Medium.
pub fn level_for(score: f64) -> RiskLevel {
    if score >= 70.0 {
        RiskLevel::High
    } else if score >= 40.0 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Per-factor threshold rules, evaluated independently and concatenated in
/// fixed order: attendance, academic, fee, engagement. Each factor
/// contributes at most one reason/suggestion pair.
fn explain(factors: &RiskFactors) -> (Vec<String>, Vec<String>) {
    let mut reasons = Vec::new();
    let mut suggestions = Vec::new();

    if factors.attendance < ATTENDANCE_THRESHOLD {
        reasons.push("Attendance below 70% threshold".to_string());
        suggestions.push("Immediate counseling session required".to_string());
    }
    if factors.academic_performance < ACADEMIC_THRESHOLD {
        reasons.push("Declining academic performance in recent semesters".to_string());
        suggestions.push("Academic support program enrollment".to_string());
    }
    if factors.fee_payment < FEE_THRESHOLD {
        reasons.push("Outstanding fee payment overdue".to_string());
        suggestions.push("Contact parents regarding fee payment".to_string());
    }
    if factors.engagement < ENGAGEMENT_THRESHOLD {
        reasons.push("Low participation in extracurricular activities".to_string());
        suggestions.push("Mentor assignment for regular check-ins".to_string());
    }

    if reasons.is_empty() {
        reasons.push("All performance indicators within normal range".to_string());
        suggestions.push("Continue current academic approach".to_string());
    }

    (reasons, suggestions)
}
