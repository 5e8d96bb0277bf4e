use crate::models::{RiskLevel, Student};

/// Roster query: all present predicates must hold.
#[derive(Debug, Clone, Default)]
pub struct StudentQuery {
    /// Case-insensitive substring against name or roll number.
    pub search: Option<String>,
    /// Exact branch; "all" or absent matches everything.
    pub branch: Option<String>,
    /// Counselors usually only want the working set, so Low risk is hidden
    /// unless explicitly included.
    pub at_risk_only: bool,
}

/// Stable filter: the result preserves the input collection's order and the
/// input is never mutated.
pub fn filter(students: &[Student], query: &StudentQuery) -> Vec<Student> {
    students
        .iter()
        .filter(|student| matches(student, query))
        .cloned()
        .collect()
}

fn matches(student: &Student, query: &StudentQuery) -> bool {
    let search_ok = match query.search.as_deref() {
        None | Some("") => true,
        Some(term) => {
            let term = term.to_lowercase();
            student.name.to_lowercase().contains(&term)
                || student.roll_no.to_lowercase().contains(&term)
        }
    };

    let branch_ok = match query.branch.as_deref() {
        None | Some("all") => true,
        Some(branch) => student.branch == branch,
    };

    let risk_ok = !query.at_risk_only || student.assessment.level != RiskLevel::Low;

    search_ok && branch_ok && risk_ok
}

/// Descending by score; sort_by is stable, so equal scores keep their
/// original relative order.
pub fn rank_by_score(students: &[Student]) -> Vec<Student> {
    let mut ranked = students.to_vec();
    ranked.sort_by(|a, b| {
        b.assessment
            .score
            .partial_cmp(&a.assessment.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}
