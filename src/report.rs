use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::Student;

/// Fixed column order for both export formats.
const COLUMNS: [&str; 9] = [
    "name",
    "roll_no",
    "branch",
    "risk_level",
    "risk_score",
    "attendance",
    "academic_performance",
    "fee_payment",
    "engagement",
];

/// Rows per page of the printable document.
const PAGE_ROWS: usize = 20;

/// One flattened record: nested factors become top-level columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub name: String,
    pub roll_no: String,
    pub branch: String,
    pub risk_level: String,
    pub risk_score: f64,
    pub attendance: f64,
    pub academic_performance: f64,
    pub fee_payment: f64,
    pub engagement: f64,
}

impl ReportRow {
    fn from_student(student: &Student) -> Self {
        Self {
            name: student.name.clone(),
            roll_no: student.roll_no.clone(),
            branch: student.branch.clone(),
            risk_level: student.assessment.level.label().to_string(),
            risk_score: student.assessment.score,
            attendance: student.factors.attendance,
            academic_performance: student.factors.academic_performance,
            fee_payment: student.factors.fee_payment,
            engagement: student.factors.engagement,
        }
    }

    fn fields(&self) -> [String; 9] {
        [
            self.name.clone(),
            self.roll_no.clone(),
            self.branch.clone(),
            self.risk_level.clone(),
            self.risk_score.to_string(),
            self.attendance.to_string(),
            self.academic_performance.to_string(),
            self.fee_payment.to_string(),
            self.engagement.to_string(),
        ]
    }
}

/// Filters in effect when the snapshot was taken, echoed into the artifact
/// header so a report is self-describing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportFilters {
    pub branch: String,
    pub at_risk_only: bool,
}

/// Immutable snapshot taken at export time; later mutation of the roster
/// does not touch an already-built request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub title: String,
    pub report_type: String,
    pub filters: ReportFilters,
    pub rows: Vec<ReportRow>,
    pub generated_at: DateTime<Utc>,
}

impl ReportRequest {
    pub fn snapshot(
        title: &str,
        report_type: &str,
        filters: ReportFilters,
        students: &[Student],
    ) -> Self {
        Self {
            title: title.to_string(),
            report_type: report_type.to_string(),
            filters,
            rows: students.iter().map(ReportRow::from_student).collect(),
            generated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// RFC 4180 delimited text.
    Csv,
    /// Titled, paginated printable document.
    Document,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Document => "txt",
        }
    }
}

/// The produced download: bytes plus a suggested file name. Writing it out
/// is the caller's one observable side effect.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Single-step export. Either resolves with a complete artifact or fails
/// with an export error; there is no partial output and no shared state
/// between concurrent calls.
pub async fn export(
    request: &ReportRequest,
    format: ExportFormat,
) -> Result<ReportArtifact, EngineError> {
    let bytes = match format {
        ExportFormat::Csv => to_csv(request)?,
        ExportFormat::Document => to_document(request).into_bytes(),
    };
    let file_name = format!(
        "{}-{}.{}",
        request.report_type,
        request.generated_at.format("%Y%m%d"),
        format.extension()
    );
    Ok(ReportArtifact { file_name, bytes })
}

/// Header row plus one row per record. The csv writer quotes fields that
/// contain the delimiter or quote character; empty input still yields a
/// valid header-only file.
fn to_csv(request: &ReportRequest) -> Result<Vec<u8>, EngineError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(COLUMNS)
        .map_err(|e| EngineError::Export(e.to_string()))?;
    for row in &request.rows {
        writer
            .write_record(row.fields())
            .map_err(|e| EngineError::Export(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| EngineError::Export(e.to_string()))
}

fn to_document(request: &ReportRequest) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "{}", request.title);
    let _ = writeln!(
        output,
        "Generated {} | type: {} | branch: {} | at-risk only: {}",
        request.generated_at.format("%Y-%m-%d %H:%M UTC"),
        request.report_type,
        if request.filters.branch.is_empty() {
            "all"
        } else {
            request.filters.branch.as_str()
        },
        request.filters.at_risk_only
    );
    let _ = writeln!(output);

    if request.rows.is_empty() {
        let _ = writeln!(output, "{}", header_line());
        let _ = writeln!(output, "No students matched the export filters.");
        return output;
    }

    let pages = request.rows.chunks(PAGE_ROWS).collect::<Vec<_>>();
    let page_count = pages.len();

    for (index, page) in pages.iter().enumerate() {
        let _ = writeln!(output, "{}", header_line());
        for row in page.iter() {
            let _ = writeln!(
                output,
                "{:<22} {:<12} {:<8} {:<8} {:>7.1} {:>10.1} {:>10.1} {:>10.1} {:>10.1}",
                row.name,
                row.roll_no,
                row.branch,
                row.risk_level,
                row.risk_score,
                row.attendance,
                row.academic_performance,
                row.fee_payment,
                row.engagement
            );
        }
        let _ = writeln!(output);
        let _ = writeln!(output, "Page {} of {}", index + 1, page_count);
        if index + 1 < page_count {
            let _ = writeln!(output);
        }
    }

    output
}

fn header_line() -> String {
    format!(
        "{:<22} {:<12} {:<8} {:<8} {:>7} {:>10} {:>10} {:>10} {:>10}",
        "name", "roll_no", "branch", "level", "score", "attend", "academic", "fee", "engage"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LastSession, RiskFactors};
    use crate::risk;
    use uuid::Uuid;

    fn student(name: &str, roll_no: &str) -> Student {
        let factors = RiskFactors::new(65.0, 68.0, 40.0, 55.0).unwrap();
        Student {
            id: Uuid::new_v4(),
            name: name.to_string(),
            roll_no: roll_no.to_string(),
            branch: "CSE".to_string(),
            assessment: risk::classify(&factors),
            factors,
            last_session: LastSession::Never,
        }
    }

    fn request(students: &[Student]) -> ReportRequest {
        ReportRequest::snapshot(
            "Student Risk Prediction Report",
            "risk-analysis",
            ReportFilters::default(),
            students,
        )
    }

    #[tokio::test]
    async fn csv_export_has_header_plus_one_line_per_row() {
        let students = vec![student("Alice Johnson", "CS21001"), student("Bob", "CS21002")];
        let artifact = export(&request(&students), ExportFormat::Csv).await.unwrap();
        let text = String::from_utf8(artifact.bytes).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(text.as_bytes());
        for record in reader.records() {
            assert_eq!(record.unwrap().len(), COLUMNS.len());
        }
    }

    #[tokio::test]
    async fn fields_containing_the_delimiter_are_quoted_and_round_trip() {
        let students = vec![student("Smith, Bob", "CS21003")];
        let artifact = export(&request(&students), ExportFormat::Csv).await.unwrap();
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert!(text.contains("\"Smith, Bob\""));

        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[0], "Smith, Bob");
    }

    #[tokio::test]
    async fn empty_export_is_a_valid_header_only_artifact() {
        let artifact = export(&request(&[]), ExportFormat::Csv).await.unwrap();
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("name,roll_no,branch"));

        let artifact = export(&request(&[]), ExportFormat::Document).await.unwrap();
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert!(text.contains("Student Risk Prediction Report"));
        assert!(text.contains("No students matched"));
    }

    #[tokio::test]
    async fn document_paginates_with_repeated_headers() {
        let students: Vec<Student> = (0..45)
            .map(|i| student(&format!("Student {i}"), &format!("CS21{i:03}")))
            .collect();
        let artifact = export(&request(&students), ExportFormat::Document)
            .await
            .unwrap();
        let text = String::from_utf8(artifact.bytes).unwrap();

        assert_eq!(text.matches("Page 1 of 3").count(), 1);
        assert!(text.contains("Page 3 of 3"));
        assert_eq!(text.matches("roll_no").count(), 3);
        assert_eq!(text.matches("Student Risk Prediction Report").count(), 1);
    }

    #[tokio::test]
    async fn snapshot_is_immune_to_later_roster_mutation() {
        let mut students = vec![student("Alice Johnson", "CS21001")];
        let snapshot = request(&students);
        students[0].name = "Renamed".to_string();

        let artifact = export(&snapshot, ExportFormat::Csv).await.unwrap();
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert!(text.contains("Alice Johnson"));
        assert!(!text.contains("Renamed"));
    }
}
