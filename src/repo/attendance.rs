//! Attendance repository — registers, rosters and per-student statistics.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    db::Db,
    errors::AppResult,
    models::{Attendance, AttendanceStatus},
};

use super::Table;

/// An attendance record joined with the student it belongs to, for a class
/// roster view.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct AttendanceWithStudent {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub attendance:     Attendance,
    pub first_name:     Option<String>,
    pub last_name:      Option<String>,
    pub student_number: Option<String>,
}

/// How many records a student has per attendance status.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: AttendanceStatus,
    pub count:  i64,
}

#[derive(Clone, Copy)]
pub struct AttendanceRepo {
    pub table: Table<Attendance>,
}

impl AttendanceRepo {
    pub fn new() -> Self {
        Self { table: Table::new("attendance") }
    }

    pub async fn find_by_student_in_range(
        &self,
        pool: &Db,
        student_id: &str,
        date_from: NaiveDate,
        date_to: NaiveDate,
    ) -> AppResult<Vec<Attendance>> {
        let rows = sqlx::query_as::<_, Attendance>(
            "SELECT * FROM attendance
             WHERE student_id = ? AND date BETWEEN ? AND ?
             ORDER BY date DESC",
        )
        .bind(student_id)
        .bind(date_from)
        .bind(date_to)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn class_roster(
        &self,
        pool: &Db,
        class_id: &str,
        date: NaiveDate,
    ) -> AppResult<Vec<AttendanceWithStudent>> {
        let rows = sqlx::query_as::<_, AttendanceWithStudent>(
            "SELECT a.*,
                    s.first_name,
                    s.last_name,
                    s.student_number
             FROM attendance a
             LEFT JOIN students s ON a.student_id = s.id
             WHERE a.class_id = ? AND a.date = ?
             ORDER BY s.last_name, s.first_name",
        )
        .bind(class_id)
        .bind(date)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    pub async fn status_counts(&self, pool: &Db, student_id: &str) -> AppResult<Vec<StatusCount>> {
        let rows = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count
             FROM attendance
             WHERE student_id = ?
             GROUP BY status",
        )
        .bind(student_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

impl Default for AttendanceRepo {
    fn default() -> Self {
        Self::new()
    }
}
