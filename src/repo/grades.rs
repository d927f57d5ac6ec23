//! Grade repository — transcript queries and class aggregates.

use serde::Serialize;

use crate::{
    db::Db,
    errors::AppResult,
    models::{ExamType, Grade},
};

use super::{bind_query_as, SqlValue, Table};

/// A grade joined with subject info and the grading teacher's identity,
/// newest exam first.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct GradeWithContext {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub grade:              Grade,
    pub subject_name:       Option<String>,
    pub coefficient:        Option<f64>,
    pub teacher_first_name: Option<String>,
    pub teacher_last_name:  Option<String>,
}

/// Aggregate over one class/subject/exam-type slice. `average` is `None`
/// when no grade matches.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ClassGradeSummary {
    pub average:        Option<f64>,
    pub highest:        Option<f64>,
    pub lowest:         Option<f64>,
    pub total_students: i64,
}

#[derive(Clone, Copy)]
pub struct GradeRepo {
    pub table: Table<Grade>,
}

impl GradeRepo {
    pub fn new() -> Self {
        Self { table: Table::new("grades") }
    }

    pub async fn find_by_student(
        &self,
        pool: &Db,
        student_id: &str,
        school_year_id: Option<&str>,
    ) -> AppResult<Vec<GradeWithContext>> {
        let mut sql = String::from(
            "SELECT g.*,
                    s.name AS subject_name,
                    s.coefficient,
                    u.first_name AS teacher_first_name,
                    u.last_name AS teacher_last_name
             FROM grades g
             LEFT JOIN subjects s ON g.subject_id = s.id
             LEFT JOIN teachers t ON g.teacher_id = t.id
             LEFT JOIN users u ON t.user_id = u.id
             WHERE g.student_id = ?",
        );
        let mut values = vec![SqlValue::Text(student_id.to_owned())];
        if let Some(year) = school_year_id {
            sql.push_str(" AND g.school_year_id = ?");
            values.push(SqlValue::Text(year.to_owned()));
        }
        sql.push_str(" ORDER BY g.exam_date DESC");

        let rows = bind_query_as(sqlx::query_as::<_, GradeWithContext>(&sql), &values)
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    pub async fn class_summary(
        &self,
        pool: &Db,
        class_id: &str,
        subject_id: &str,
        exam_type: ExamType,
    ) -> AppResult<ClassGradeSummary> {
        let summary = sqlx::query_as::<_, ClassGradeSummary>(
            "SELECT AVG(score) AS average,
                    MAX(score) AS highest,
                    MIN(score) AS lowest,
                    COUNT(*) AS total_students
             FROM grades
             WHERE class_id = ? AND subject_id = ? AND exam_type = ?",
        )
        .bind(class_id)
        .bind(subject_id)
        .bind(exam_type.as_str())
        .fetch_one(pool)
        .await?;
        Ok(summary)
    }
}

impl Default for GradeRepo {
    fn default() -> Self {
        Self::new()
    }
}
