//! Student repository — roster and detail queries beyond generic CRUD.

use serde::Serialize;

use crate::{
    db::Db,
    errors::AppResult,
    models::{Student, StudentStatus},
};

use super::{Filter, Table};

/// A student joined with their class and linked user account.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct StudentDetails {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub student:       Student,
    pub class_name:    Option<String>,
    pub level:         Option<String>,
    pub section:       Option<String>,
    pub student_email: Option<String>,
}

#[derive(Clone, Copy)]
pub struct StudentRepo {
    pub table: Table<Student>,
}

impl StudentRepo {
    pub fn new() -> Self {
        Self { table: Table::new("students") }
    }

    /// Current roster of a class. Only active students belong to a roster;
    /// suspended/graduated/expelled rows are kept for history but excluded
    /// here.
    pub async fn find_by_class(&self, pool: &Db, class_id: &str) -> AppResult<Vec<Student>> {
        let filter = Filter::new()
            .eq("class_id", class_id)
            .eq("status", StudentStatus::Active);
        self.table.find_all(pool, &filter).await
    }

    pub async fn find_by_school(
        &self,
        pool: &Db,
        school_id: &str,
        status: Option<StudentStatus>,
    ) -> AppResult<Vec<Student>> {
        let filter = Filter::new().eq("school_id", school_id).eq_opt("status", status);
        self.table.find_all(pool, &filter).await
    }

    pub async fn with_details(&self, pool: &Db, student_id: &str) -> AppResult<Option<StudentDetails>> {
        let row = sqlx::query_as::<_, StudentDetails>(
            "SELECT s.*,
                    c.name AS class_name,
                    c.level,
                    c.section,
                    u.email AS student_email
             FROM students s
             LEFT JOIN classes c ON s.class_id = c.id
             LEFT JOIN users u ON s.user_id = u.id
             WHERE s.id = ?",
        )
        .bind(student_id)
        .fetch_optional(pool)
        .await?;
        Ok(row)
    }

    /// Count students in a school matching an optional status, via the
    /// generic filter.
    pub async fn count_by_school(
        &self,
        pool: &Db,
        school_id: &str,
        status: Option<StudentStatus>,
    ) -> AppResult<i64> {
        let filter = Filter::new().eq("school_id", school_id).eq_opt("status", status);
        self.table.count(pool, &filter).await
    }

    /// List students under the generic equality-filter model
    /// (`?school_id=&class_id=&status=`).
    pub async fn find_filtered(
        &self,
        pool: &Db,
        school_id: Option<&str>,
        class_id: Option<&str>,
        status: Option<StudentStatus>,
    ) -> AppResult<Vec<Student>> {
        let filter = Filter::new()
            .eq_opt("school_id", school_id)
            .eq_opt("class_id", class_id)
            .eq_opt("status", status);
        self.table.find_all(pool, &filter).await
    }
}

impl Default for StudentRepo {
    fn default() -> Self {
        Self::new()
    }
}
