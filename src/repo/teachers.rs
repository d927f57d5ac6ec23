//! Teacher repository — staff listings joined with user identity.

use serde::Serialize;

use crate::{
    db::Db,
    errors::AppResult,
    models::{Teacher, TeacherStatus},
};

use super::{bind_query_as, SqlValue, Table};

/// A teacher row joined with the identity fields of the linked user account.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TeacherWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub teacher:    Teacher,
    pub first_name: Option<String>,
    pub last_name:  Option<String>,
    pub email:      Option<String>,
    pub phone:      Option<String>,
}

/// A subject assignment for a teacher, with subject and class names resolved.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct TeacherSubjectAssignment {
    pub id:           String,
    pub teacher_id:   String,
    pub subject_id:   String,
    pub class_id:     String,
    pub subject_name: Option<String>,
    pub subject_code: Option<String>,
    pub class_name:   Option<String>,
}

#[derive(Clone, Copy)]
pub struct TeacherRepo {
    pub table: Table<Teacher>,
}

impl TeacherRepo {
    pub fn new() -> Self {
        Self { table: Table::new("teachers") }
    }

    pub async fn find_by_school(
        &self,
        pool: &Db,
        school_id: &str,
        status: Option<TeacherStatus>,
    ) -> AppResult<Vec<TeacherWithUser>> {
        let mut sql = String::from(
            "SELECT t.*, u.first_name, u.last_name, u.email, u.phone
             FROM teachers t
             LEFT JOIN users u ON t.user_id = u.id
             WHERE t.school_id = ?",
        );
        let mut values = vec![SqlValue::Text(school_id.to_owned())];
        if let Some(status) = status {
            sql.push_str(" AND t.status = ?");
            values.push(status.into());
        }
        sql.push_str(" ORDER BY t.id");

        let rows = bind_query_as(sqlx::query_as::<_, TeacherWithUser>(&sql), &values)
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    pub async fn subjects(&self, pool: &Db, teacher_id: &str) -> AppResult<Vec<TeacherSubjectAssignment>> {
        let rows = sqlx::query_as::<_, TeacherSubjectAssignment>(
            "SELECT ts.id, ts.teacher_id, ts.subject_id, ts.class_id,
                    s.name AS subject_name,
                    s.code AS subject_code,
                    c.name AS class_name
             FROM teacher_subjects ts
             LEFT JOIN subjects s ON ts.subject_id = s.id
             LEFT JOIN classes c ON ts.class_id = c.id
             WHERE ts.teacher_id = ?
             ORDER BY ts.id",
        )
        .bind(teacher_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }
}

impl Default for TeacherRepo {
    fn default() -> Self {
        Self::new()
    }
}
