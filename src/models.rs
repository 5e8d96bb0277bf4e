use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineError;

/// Raw per-student inputs, each a 0-100 percentage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub attendance: f64,
    pub academic_performance: f64,
    pub fee_payment: f64,
    pub engagement: f64,
}

impl RiskFactors {
    pub fn new(
        attendance: f64,
        academic_performance: f64,
        fee_payment: f64,
        engagement: f64,
    ) -> Result<Self, EngineError> {
        check_range("attendance", attendance)?;
        check_range("academic_performance", academic_performance)?;
        check_range("fee_payment", fee_payment)?;
        check_range("engagement", engagement)?;
        Ok(Self {
            attendance,
            academic_performance,
            fee_payment,
            engagement,
        })
    }
}

fn check_range(field: &'static str, value: f64) -> Result<(), EngineError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(EngineError::Validation { field, value });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Derived as one atomic unit from RiskFactors, never edited piecemeal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: f64,
    pub level: RiskLevel,
    pub reasons: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub period: String,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionUnit {
    Days,
    Weeks,
    Months,
}

/// Recency of the last counseling session, as the roster displays it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LastSession {
    Never,
    Ago { amount: u32, unit: SessionUnit },
    On(NaiveDate),
}

impl std::fmt::Display for LastSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LastSession::Never => write!(f, "Never"),
            LastSession::Ago { amount, unit } => {
                let unit = match unit {
                    SessionUnit::Days => "day",
                    SessionUnit::Weeks => "week",
                    SessionUnit::Months => "month",
                };
                if *amount == 1 {
                    write!(f, "1 {unit} ago")
                } else {
                    write!(f, "{amount} {unit}s ago")
                }
            }
            LastSession::On(date) => write!(f, "{date}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub roll_no: String,
    pub branch: String,
    pub factors: RiskFactors,
    pub assessment: RiskAssessment,
    pub last_session: LastSession,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    Deadline,
    Scheduling,
    AtRisk,
    MissedCounseling,
    System,
    Achievement,
}

impl NotificationKind {
    pub fn label(self) -> &'static str {
        match self {
            NotificationKind::Deadline => "deadline",
            NotificationKind::Scheduling => "scheduling",
            NotificationKind::AtRisk => "at-risk",
            NotificationKind::MissedCounseling => "missed-counseling",
            NotificationKind::System => "system",
            NotificationKind::Achievement => "achievement",
        }
    }

    /// Terminal glyph for the feed listing. Exhaustive so a new kind cannot
    /// silently fall through to a default.
    pub fn glyph(self) -> &'static str {
        match self {
            NotificationKind::Deadline => "[!]",
            NotificationKind::Scheduling => "[@]",
            NotificationKind::AtRisk => "[^]",
            NotificationKind::MissedCounseling => "[x]",
            NotificationKind::System => "[i]",
            NotificationKind::Achievement => "[*]",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn label(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
    pub priority: Priority,
    /// Weak reference for display only; lookup misses show no name.
    pub student_id: Option<Uuid>,
    pub action_required: bool,
}
