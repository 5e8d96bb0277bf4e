use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    LastSession, Notification, NotificationKind, Priority, RiskFactors, SessionUnit, Student,
};
use crate::notify::NotificationFeed;
use crate::risk;
use crate::trend::TrendTracker;

/// Five-month trend axis the dashboard reports over.
pub const TREND_PERIODS: [&str; 5] = ["Jan", "Feb", "Mar", "Apr", "May"];

fn seed_ts(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
) -> anyhow::Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .context("invalid timestamp")
}

/// Single owner of the working collections. Queries borrow; mutations go
/// through methods that keep derived state consistent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub students: Vec<Student>,
    pub feed: NotificationFeed,
    pub trends: TrendTracker,
}

impl Store {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read data file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("data file {} is not valid", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)
            .with_context(|| format!("failed to write data file {}", path.display()))?;
        Ok(())
    }

    pub fn student_by_roll(&self, roll_no: &str) -> Option<&Student> {
        self.students.iter().find(|s| s.roll_no == roll_no)
    }

    /// Display-name lookup for notification references; a miss shows no name.
    pub fn student_name(&self, id: Uuid) -> Option<&str> {
        self.students
            .iter()
            .find(|s| s.id == id)
            .map(|s| s.name.as_str())
    }

    pub fn student_ids(&self) -> Vec<Uuid> {
        self.students.iter().map(|s| s.id).collect()
    }

    /// Replaces factors and the derived assessment as one atomic step.
    /// Absent roll numbers are a no-op; returns whether a student matched.
    pub fn set_factors(&mut self, roll_no: &str, factors: RiskFactors) -> bool {
        match self.students.iter_mut().find(|s| s.roll_no == roll_no) {
            Some(student) => {
                student.assessment = risk::classify(&factors);
                student.factors = factors;
                true
            }
            None => false,
        }
    }

    /// Upserts students by roll number from a factor CSV, re-classifying on
    /// the way in. Returns how many rows were inserted or updated.
    pub fn import_csv(&mut self, csv_path: &Path) -> anyhow::Result<usize> {
        #[derive(serde::Deserialize)]
        struct CsvRow {
            name: String,
            roll_no: String,
            branch: String,
            attendance: f64,
            academic_performance: f64,
            fee_payment: f64,
            engagement: f64,
        }

        let mut reader = csv::Reader::from_path(csv_path)?;
        let mut merged = 0usize;

        for result in reader.deserialize::<CsvRow>() {
            let row = result?;
            let factors = RiskFactors::new(
                row.attendance,
                row.academic_performance,
                row.fee_payment,
                row.engagement,
            )
            .with_context(|| format!("row for {} has a bad factor", row.roll_no))?;

            if self.set_factors(&row.roll_no, factors) {
                merged += 1;
                continue;
            }

            self.students.push(Student {
                id: Uuid::new_v4(),
                name: row.name,
                roll_no: row.roll_no,
                branch: row.branch,
                assessment: risk::classify(&factors),
                factors,
                last_session: LastSession::Never,
            });
            merged += 1;
        }

        Ok(merged)
    }

    /// Realistic sample data: a small at-risk roster, its monthly score
    /// history, and a week of notifications.
    pub fn seed() -> anyhow::Result<Self> {
        let axis = TREND_PERIODS.iter().map(|p| p.to_string()).collect();
        let mut trends = TrendTracker::new(axis);

        let roster: [(&str, &str, &str, [f64; 4], LastSession, [f64; 5]); 5] = [
            (
                "Priya Sharma",
                "CSE21001",
                "CSE",
                [65.0, 68.0, 40.0, 55.0],
                LastSession::Ago {
                    amount: 2,
                    unit: SessionUnit::Days,
                },
                [45.0, 52.0, 61.0, 73.0, 85.0],
            ),
            (
                "Rahul Kumar",
                "ECE21045",
                "ECE",
                [72.0, 68.0, 70.0, 62.0],
                LastSession::Ago {
                    amount: 1,
                    unit: SessionUnit::Weeks,
                },
                [45.0, 48.0, 55.0, 58.0, 63.0],
            ),
            (
                "Anjali Singh",
                "IT21023",
                "IT",
                [68.0, 60.0, 55.0, 58.0],
                LastSession::Never,
                [50.0, 58.0, 66.0, 72.0, 78.5],
            ),
            (
                "Vikash Gupta",
                "MECH21012",
                "MECH",
                [92.0, 88.0, 100.0, 85.0],
                LastSession::Ago {
                    amount: 1,
                    unit: SessionUnit::Months,
                },
                [30.0, 28.0, 26.0, 24.0, 18.5],
            ),
            (
                "Sneha Patel",
                "CSE21089",
                "CSE",
                [55.0, 62.0, 45.0, 50.0],
                LastSession::Never,
                [60.0, 70.0, 80.0, 88.0, 93.5],
            ),
        ];

        let mut students = Vec::new();
        for (name, roll_no, branch, [a, p, f, e], last_session, history) in roster {
            let factors = RiskFactors::new(a, p, f, e)?;
            let student = Student {
                id: Uuid::new_v4(),
                name: name.to_string(),
                roll_no: roll_no.to_string(),
                branch: branch.to_string(),
                assessment: risk::classify(&factors),
                factors,
                last_session,
            };
            for (period, value) in TREND_PERIODS.iter().zip(history) {
                trends.record(student.id, period, value)?;
            }
            students.push(student);
        }

        let by_roll = |roll: &str| students.iter().find(|s| s.roll_no == roll).map(|s| s.id);

        let feed = NotificationFeed::new(vec![
            Notification {
                id: Uuid::new_v4(),
                kind: NotificationKind::AtRisk,
                title: "High Risk Student Alert".to_string(),
                message: "Priya Sharma has been identified as high-risk for dropout. \
                          Immediate intervention required."
                    .to_string(),
                timestamp: seed_ts(2024, 1, 15, 10, 30)?,
                is_read: false,
                priority: Priority::High,
                student_id: by_roll("CSE21001"),
                action_required: true,
            },
            Notification {
                id: Uuid::new_v4(),
                kind: NotificationKind::MissedCounseling,
                title: "Missed Counseling Session".to_string(),
                message: "Rahul Kumar missed his scheduled counseling session on Jan 14."
                    .to_string(),
                timestamp: seed_ts(2024, 1, 14, 17, 0)?,
                is_read: false,
                priority: Priority::Medium,
                student_id: by_roll("ECE21045"),
                action_required: true,
            },
            Notification {
                id: Uuid::new_v4(),
                kind: NotificationKind::Deadline,
                title: "Progress Report Deadline".to_string(),
                message: "Student progress reports are due in 3 days (Jan 18).".to_string(),
                timestamp: seed_ts(2024, 1, 15, 9, 0)?,
                is_read: true,
                priority: Priority::Medium,
                student_id: None,
                action_required: false,
            },
            Notification {
                id: Uuid::new_v4(),
                kind: NotificationKind::Scheduling,
                title: "New Counseling Session Requested".to_string(),
                message: "Anjali Singh has requested a counseling session for academic support."
                    .to_string(),
                timestamp: seed_ts(2024, 1, 15, 8, 45)?,
                is_read: false,
                priority: Priority::Low,
                student_id: by_roll("IT21023"),
                action_required: true,
            },
            Notification {
                id: Uuid::new_v4(),
                kind: NotificationKind::Achievement,
                title: "Student Achievement".to_string(),
                message: "Vikash Gupta achieved 95% attendance this month. Consider recognition."
                    .to_string(),
                timestamp: seed_ts(2024, 1, 14, 16, 20)?,
                is_read: true,
                priority: Priority::Low,
                student_id: by_roll("MECH21012"),
                action_required: false,
            },
            Notification {
                id: Uuid::new_v4(),
                kind: NotificationKind::System,
                title: "System Maintenance".to_string(),
                message: "Scheduled maintenance on Jan 16 from 2:00 AM to 4:00 AM.".to_string(),
                timestamp: seed_ts(2024, 1, 13, 15, 0)?,
                is_read: true,
                priority: Priority::Low,
                student_id: None,
                action_required: false,
            },
            Notification {
                id: Uuid::new_v4(),
                kind: NotificationKind::AtRisk,
                title: "Attendance Warning".to_string(),
                message: "Sneha Patel's attendance has dropped below 70%. \
                          Consider scheduling a meeting."
                    .to_string(),
                timestamp: seed_ts(2024, 1, 13, 11, 30)?,
                is_read: false,
                priority: Priority::Medium,
                student_id: by_roll("CSE21089"),
                action_required: true,
            },
        ]);

        Ok(Self {
            students,
            feed,
            trends,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskLevel;

    #[test]
    fn seed_roster_classifies_to_expected_levels() {
        let store = Store::seed().unwrap();
        let level = |roll: &str| store.student_by_roll(roll).unwrap().assessment.level;

        assert_eq!(level("CSE21001"), RiskLevel::High);
        assert_eq!(level("ECE21045"), RiskLevel::Medium);
        assert_eq!(level("IT21023"), RiskLevel::High);
        assert_eq!(level("MECH21012"), RiskLevel::Low);
        assert_eq!(level("CSE21089"), RiskLevel::High);
    }

    #[test]
    fn seed_trends_cover_the_full_axis() {
        let store = Store::seed().unwrap();
        for student in &store.students {
            let series = store.trends.series(student.id);
            assert_eq!(series.len(), TREND_PERIODS.len());
            assert_eq!(series[0].period, "Jan");
            assert_eq!(series[4].period, "May");
        }
    }

    #[test]
    fn set_factors_swaps_the_assessment_atomically() {
        let mut store = Store::seed().unwrap();
        let healthy = RiskFactors::new(95.0, 92.0, 100.0, 90.0).unwrap();
        assert!(store.set_factors("CSE21001", healthy));

        let student = store.student_by_roll("CSE21001").unwrap();
        assert_eq!(student.factors, healthy);
        assert_eq!(student.assessment.level, RiskLevel::Low);
        assert_eq!(
            student.assessment.reasons,
            vec!["All performance indicators within normal range"]
        );
    }

    #[test]
    fn set_factors_for_unknown_roll_is_a_no_op() {
        let mut store = Store::seed().unwrap();
        let before = store.clone();
        let factors = RiskFactors::new(50.0, 50.0, 50.0, 50.0).unwrap();
        assert!(!store.set_factors("ZZ99999", factors));
        assert_eq!(store.students, before.students);
    }

    #[test]
    fn notification_student_references_resolve_by_id() {
        let store = Store::seed().unwrap();
        let alert = store
            .feed
            .all()
            .iter()
            .find(|n| n.title == "High Risk Student Alert")
            .unwrap();
        let id = alert.student_id.unwrap();
        assert_eq!(store.student_name(id), Some("Priya Sharma"));
        assert_eq!(store.student_name(Uuid::new_v4()), None);
    }

    #[test]
    fn import_csv_upserts_by_roll_number() {
        let mut store = Store::seed().unwrap();
        let dir = std::env::temp_dir().join(format!("dew-import-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("factors.csv");
        std::fs::write(
            &path,
            "name,roll_no,branch,attendance,academic_performance,fee_payment,engagement\n\
             Priya Sharma,CSE21001,CSE,90.0,85.0,100.0,80.0\n\
             New Student,CSE21100,CSE,50.0,55.0,40.0,45.0\n",
        )
        .unwrap();

        let before = store.students.len();
        let merged = store.import_csv(&path).unwrap();
        assert_eq!(merged, 2);
        assert_eq!(store.students.len(), before + 1);
        assert_eq!(
            store.student_by_roll("CSE21001").unwrap().assessment.level,
            RiskLevel::Low
        );
        assert_eq!(
            store.student_by_roll("CSE21100").unwrap().assessment.level,
            RiskLevel::High
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn import_csv_rejects_out_of_range_factors() {
        let mut store = Store::seed().unwrap();
        let dir = std::env::temp_dir().join(format!("dew-reject-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("factors.csv");
        std::fs::write(
            &path,
            "name,roll_no,branch,attendance,academic_performance,fee_payment,engagement\n\
             Bad Row,CSE21200,CSE,120.0,85.0,100.0,80.0\n",
        )
        .unwrap();

        let err = store.import_csv(&path).unwrap_err();
        assert!(format!("{err:#}").contains("CSE21200"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn data_file_round_trips() {
        let store = Store::seed().unwrap();
        let dir = std::env::temp_dir().join(format!("dew-roundtrip-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("data.json");

        store.save(&path).unwrap();
        let loaded = Store::load(&path).unwrap();
        assert_eq!(loaded.students, store.students);
        assert_eq!(loaded.feed.unread_count(), store.feed.unread_count());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
