//! Data-access layer.
//!
//! `Table<T>` is the table-parameterized CRUD component; the per-entity
//! repositories in the sibling modules embed one and add relationship-aware
//! queries on top. Instances are constructed once at startup (see
//! [`Repositories`]) and injected into handlers through `AppState` — no
//! globals. Repositories never hold a connection across calls; every method
//! borrows from the pool for the duration of one statement.
//!
//! All values are bound positionally. Table and column names are the only
//! parts interpolated into SQL text and they are restricted to compile-time
//! identifiers checked by [`is_safe_ident`].

pub mod attendance;
pub mod grades;
pub mod payments;
pub mod students;
pub mod teachers;
pub mod users;

use std::marker::PhantomData;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use sqlx::{
    mysql::{MySqlArguments, MySqlRow},
    query::{Query, QueryAs},
    FromRow, MySql,
};

use crate::{
    db::Db,
    errors::{AppError, AppResult},
    models::{
        AttendanceStatus, Class, ExamType, Fee, Notification, PaymentMethod, PaymentStatus,
        School, SchoolYear, StudentStatus, Subject, TeacherStatus, Timetable, UserRole,
    },
};

// ── Bind values ──────────────────────────────────────────────

/// A typed SQL bind value. Replaces the untyped field→value mapping of the
/// duck-typed repository pattern: every value that reaches the driver went
/// through one of these variants.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Null,
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_owned())
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Int(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Int(v as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Float(v)
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Bool(v)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(v: NaiveDate) -> Self {
        SqlValue::Date(v)
    }
}

impl From<NaiveTime> for SqlValue {
    fn from(v: NaiveTime) -> Self {
        SqlValue::Time(v)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(v: NaiveDateTime) -> Self {
        SqlValue::DateTime(v)
    }
}

impl<V: Into<SqlValue>> From<Option<V>> for SqlValue {
    fn from(v: Option<V>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => SqlValue::Null,
        }
    }
}

macro_rules! enum_sql_value {
    ($($ty:ty),+ $(,)?) => {
        $(impl From<$ty> for SqlValue {
            fn from(v: $ty) -> Self {
                SqlValue::Text(v.as_str().to_owned())
            }
        })+
    };
}

enum_sql_value!(
    UserRole,
    StudentStatus,
    TeacherStatus,
    ExamType,
    PaymentMethod,
    PaymentStatus,
    AttendanceStatus,
    crate::models::DayOfWeek,
    crate::models::NotificationAudience,
    crate::models::NotificationPriority,
);

/// Push `($col, value)` only when the `Option` patch field is present.
macro_rules! patch_field {
    ($cols:ident, $col:literal, $field:expr) => {
        if let Some(value) = &$field {
            $cols.push(($col, value.clone().into()));
        }
    };
}
pub(crate) use patch_field;

pub fn bind_query<'q>(
    mut query: Query<'q, MySql, MySqlArguments>,
    values: &[SqlValue],
) -> Query<'q, MySql, MySqlArguments> {
    for value in values {
        query = match value {
            SqlValue::Text(v) => query.bind(v.clone()),
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Float(v) => query.bind(*v),
            SqlValue::Bool(v) => query.bind(*v),
            SqlValue::Date(v) => query.bind(*v),
            SqlValue::Time(v) => query.bind(*v),
            SqlValue::DateTime(v) => query.bind(*v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }
    query
}

pub fn bind_query_as<'q, T>(
    mut query: QueryAs<'q, MySql, T, MySqlArguments>,
    values: &[SqlValue],
) -> QueryAs<'q, MySql, T, MySqlArguments> {
    for value in values {
        query = match value {
            SqlValue::Text(v) => query.bind(v.clone()),
            SqlValue::Int(v) => query.bind(*v),
            SqlValue::Float(v) => query.bind(*v),
            SqlValue::Bool(v) => query.bind(*v),
            SqlValue::Date(v) => query.bind(*v),
            SqlValue::Time(v) => query.bind(*v),
            SqlValue::DateTime(v) => query.bind(*v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }
    query
}

// ── Equality filter ──────────────────────────────────────────

/// `true` for identifiers that may be safely interpolated into SQL text:
/// ASCII alphanumerics and underscores, starting with a letter.
pub fn is_safe_ident(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Equality-only filter: column→value pairs combined with `AND`.
///
/// This is the deliberate extensibility seam of the generic layer — anything
/// richer (ranges, joins, OR) lives in a specialized repository as
/// hand-written SQL.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    conds: Vec<(&'static str, SqlValue)>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality condition. Panics on a non-identifier column name,
    /// which can only come from a programming error since names are
    /// compile-time constants.
    pub fn eq(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        assert!(is_safe_ident(column), "invalid column identifier: {column}");
        self.conds.push((column, value.into()));
        self
    }

    /// Add an equality condition only when the value is present. Convenience
    /// for optional query parameters.
    pub fn eq_opt(self, column: &'static str, value: Option<impl Into<SqlValue>>) -> Self {
        match value {
            Some(v) => self.eq(column, v),
            None => self,
        }
    }

    /// ` WHERE a = ? AND b = ?`, or an empty string without conditions.
    pub fn clause(&self) -> String {
        if self.conds.is_empty() {
            return String::new();
        }
        let conds: Vec<String> = self.conds.iter().map(|(col, _)| format!("{col} = ?")).collect();
        format!(" WHERE {}", conds.join(" AND "))
    }

    pub fn values(&self) -> Vec<SqlValue> {
        self.conds.iter().map(|(_, v)| v.clone()).collect()
    }
}

// ── Typed column mapping ─────────────────────────────────────

/// Maps a typed insert/patch struct to column→value pairs. Patch structs
/// with `Option` fields emit only the fields that are present, so an update
/// touches only what the caller supplied.
pub trait ToColumns {
    fn columns(&self) -> Vec<(&'static str, SqlValue)>;
}

// ── SQL text builders (kept free-standing for unit testing) ──

fn build_select(table: &str, filter: &Filter) -> String {
    // Deterministic ordering by primary key; the legacy layer left order
    // undefined.
    format!("SELECT * FROM {table}{} ORDER BY id", filter.clause())
}

fn build_count(table: &str, filter: &Filter) -> String {
    format!("SELECT COUNT(*) FROM {table}{}", filter.clause())
}

fn build_insert(table: &str, columns: &[&'static str]) -> String {
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!("INSERT INTO {table} ({}) VALUES ({placeholders})", columns.join(", "))
}

fn build_update(table: &str, columns: &[&'static str]) -> String {
    let assignments: Vec<String> = columns.iter().map(|col| format!("{col} = ?")).collect();
    format!("UPDATE {table} SET {} WHERE id = ?", assignments.join(", "))
}

// ── Generic table CRUD ───────────────────────────────────────

/// Table-parameterized CRUD with no entity-specific knowledge beyond the row
/// type `T`.
pub struct Table<T> {
    pub name: &'static str,
    _row: PhantomData<fn() -> T>,
}

impl<T> Clone for Table<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Table<T> {}

impl<T> Table<T>
where
    T: for<'r> FromRow<'r, MySqlRow> + Send + Unpin,
{
    pub const fn new(name: &'static str) -> Self {
        Self { name, _row: PhantomData }
    }

    /// Primary-key lookup. Absence is `None`, never an error.
    pub async fn find_by_id(&self, pool: &Db, id: &str) -> AppResult<Option<T>> {
        let sql = format!("SELECT * FROM {} WHERE id = ?", self.name);
        let row = sqlx::query_as::<_, T>(&sql).bind(id).fetch_optional(pool).await?;
        Ok(row)
    }

    /// All rows matching the equality filter, ordered by primary key.
    pub async fn find_all(&self, pool: &Db, filter: &Filter) -> AppResult<Vec<T>> {
        let sql = build_select(self.name, filter);
        let rows = bind_query_as(sqlx::query_as::<_, T>(&sql), &filter.values())
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    /// Insert a row under the given primary key, then return the persisted
    /// row. The id is always caller-generated (UUID v4 in the handlers), so
    /// the created row is always returned — never null.
    pub async fn insert(&self, pool: &Db, id: &str, data: &impl ToColumns) -> AppResult<T> {
        let mut cols: Vec<(&'static str, SqlValue)> = vec![("id", SqlValue::Text(id.to_owned()))];
        cols.extend(data.columns());

        let names: Vec<&'static str> = cols.iter().map(|(c, _)| *c).collect();
        let values: Vec<SqlValue> = cols.into_iter().map(|(_, v)| v).collect();
        let sql = build_insert(self.name, &names);

        bind_query(sqlx::query(&sql), &values)
            .execute(pool)
            .await
            .map_err(AppError::from_sqlx)?;

        self.find_by_id(pool, id)
            .await?
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("inserted row missing: {}", self.name)))
    }

    /// Update only the supplied fields, then return the persisted row.
    pub async fn update(&self, pool: &Db, id: &str, patch: &impl ToColumns) -> AppResult<T> {
        let cols = patch.columns();
        if !cols.is_empty() {
            let names: Vec<&'static str> = cols.iter().map(|(c, _)| *c).collect();
            let mut values: Vec<SqlValue> = cols.into_iter().map(|(_, v)| v).collect();
            values.push(SqlValue::Text(id.to_owned()));
            let sql = build_update(self.name, &names);

            bind_query(sqlx::query(&sql), &values)
                .execute(pool)
                .await
                .map_err(AppError::from_sqlx)?;
        }
        self.find_by_id(pool, id).await?.ok_or(AppError::NotFound)
    }

    /// Delete by primary key. `false` when no row existed, so callers can
    /// treat repeated deletes as idempotent.
    pub async fn delete(&self, pool: &Db, id: &str) -> AppResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", self.name);
        let affected = sqlx::query(&sql).bind(id).execute(pool).await?.rows_affected();
        Ok(affected > 0)
    }

    /// Row count under the same filter semantics as [`Table::find_all`].
    pub async fn count(&self, pool: &Db, filter: &Filter) -> AppResult<i64> {
        let sql = build_count(self.name, filter);
        let (count,): (i64,) = bind_query_as(sqlx::query_as(&sql), &filter.values())
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}

// ── Repository bundle ────────────────────────────────────────

/// All repositories, constructed once at startup and shared through
/// `AppState`.
#[derive(Clone)]
pub struct Repositories {
    pub users:         users::UserRepo,
    pub students:      students::StudentRepo,
    pub teachers:      teachers::TeacherRepo,
    pub grades:        grades::GradeRepo,
    pub payments:      payments::PaymentRepo,
    pub attendance:    attendance::AttendanceRepo,
    pub schools:       Table<School>,
    pub school_years:  Table<SchoolYear>,
    pub classes:       Table<Class>,
    pub subjects:      Table<Subject>,
    pub fees:          Table<Fee>,
    pub timetables:    Table<Timetable>,
    pub notifications: Table<Notification>,
}

impl Repositories {
    pub fn new() -> Self {
        Self {
            users:         users::UserRepo::new(),
            students:      students::StudentRepo::new(),
            teachers:      teachers::TeacherRepo::new(),
            grades:        grades::GradeRepo::new(),
            payments:      payments::PaymentRepo::new(),
            attendance:    attendance::AttendanceRepo::new(),
            schools:       Table::new("schools"),
            school_years:  Table::new("school_years"),
            classes:       Table::new("classes"),
            subjects:      Table::new("subjects"),
            fees:          Table::new("fees"),
            timetables:    Table::new("timetable"),
            notifications: Table::new("notifications"),
        }
    }
}

impl Default for Repositories {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_without_filter_has_no_where() {
        let sql = build_select("students", &Filter::new());
        assert_eq!(sql, "SELECT * FROM students ORDER BY id");
    }

    #[test]
    fn select_with_filter_ands_conditions_in_order() {
        let filter = Filter::new().eq("school_id", "s1").eq("status", StudentStatus::Active);
        let sql = build_select("students", &filter);
        assert_eq!(
            sql,
            "SELECT * FROM students WHERE school_id = ? AND status = ? ORDER BY id"
        );
        assert_eq!(
            filter.values(),
            vec![SqlValue::Text("s1".into()), SqlValue::Text("active".into())]
        );
    }

    #[test]
    fn count_shares_filter_semantics() {
        let filter = Filter::new().eq("class_id", "c1");
        assert_eq!(build_count("students", &filter), "SELECT COUNT(*) FROM students WHERE class_id = ?");
    }

    #[test]
    fn eq_opt_skips_absent_values() {
        let filter = Filter::new()
            .eq_opt("school_id", Some("s1"))
            .eq_opt("status", None::<StudentStatus>);
        assert_eq!(filter.clause(), " WHERE school_id = ?");
    }

    #[test]
    fn insert_sql_binds_every_column() {
        let sql = build_insert("payments", &["id", "student_id", "amount_paid"]);
        assert_eq!(sql, "INSERT INTO payments (id, student_id, amount_paid) VALUES (?, ?, ?)");
    }

    #[test]
    fn update_sql_targets_primary_key() {
        let sql = build_update("students", &["first_name", "status"]);
        assert_eq!(sql, "UPDATE students SET first_name = ?, status = ? WHERE id = ?");
    }

    #[test]
    fn identifier_check_rejects_injection() {
        assert!(is_safe_ident("school_id"));
        assert!(is_safe_ident("a1_b2"));
        assert!(!is_safe_ident(""));
        assert!(!is_safe_ident("1abc"));
        assert!(!is_safe_ident("id; DROP TABLE students"));
        assert!(!is_safe_ident("id = 1 OR 1=1 --"));
    }

    #[test]
    #[should_panic(expected = "invalid column identifier")]
    fn filter_refuses_unsafe_column_names() {
        let _ = Filter::new().eq("id; DROP TABLE users", "x");
    }

    #[test]
    fn option_values_become_null() {
        assert_eq!(SqlValue::from(None::<String>), SqlValue::Null);
        assert_eq!(SqlValue::from(Some("x")), SqlValue::Text("x".into()));
    }

    #[test]
    fn enums_bind_as_their_wire_text() {
        assert_eq!(SqlValue::from(UserRole::SchoolDirector), SqlValue::Text("school_director".into()));
        assert_eq!(SqlValue::from(PaymentMethod::MobileMoney), SqlValue::Text("mobile_money".into()));
    }

    #[test]
    fn patch_structs_emit_only_present_fields() {
        struct Patch {
            first_name: Option<String>,
            status: Option<StudentStatus>,
        }
        impl ToColumns for Patch {
            fn columns(&self) -> Vec<(&'static str, SqlValue)> {
                let mut cols = Vec::new();
                patch_field!(cols, "first_name", self.first_name);
                patch_field!(cols, "status", self.status);
                cols
            }
        }

        let patch = Patch { first_name: Some("Awa".into()), status: None };
        let cols = patch.columns();
        assert_eq!(cols.len(), 1);
        assert_eq!(cols[0], ("first_name", SqlValue::Text("Awa".into())));
    }
}
