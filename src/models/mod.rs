//! Domain entities and their closed status enums.
//!
//! Status fields are real Rust enums backed by VARCHAR columns, so an unknown
//! value is rejected at deserialization time and can never reach the database.

#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

// ── Users ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id:            String,
    pub username:      String,
    pub email:         String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name:    Option<String>,
    pub last_name:     Option<String>,
    pub phone:         Option<String>,
    pub role:          UserRole,
    pub school_id:     Option<String>,
    pub is_active:     bool,
    pub created_at:    NaiveDateTime,
    pub updated_at:    NaiveDateTime,
    pub last_login:    Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    SchoolDirector,
    Teacher,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::SchoolDirector => "school_director",
            UserRole::Teacher => "teacher",
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "school_director" => Ok(UserRole::SchoolDirector),
            "teacher" => Ok(UserRole::Teacher),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

// ── Schools ──────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct School {
    pub id:          String,
    pub name:        String,
    pub code:        String,
    pub address:     Option<String>,
    pub city:        Option<String>,
    pub country:     String,
    pub phone:       Option<String>,
    pub email:       Option<String>,
    pub director_id: Option<String>,
    pub is_active:   bool,
    pub created_at:  NaiveDateTime,
    pub updated_at:  NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SchoolYear {
    pub id:         String,
    pub school_id:  String,
    pub name:       String,
    pub start_date: NaiveDate,
    pub end_date:   NaiveDate,
    pub is_current: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

// ── Classes / subjects ───────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Class {
    pub id:             String,
    pub school_id:      String,
    pub name:           String,
    pub level:          Option<String>,
    pub section:        Option<String>,
    pub capacity:       i32,
    pub teacher_id:     Option<String>,
    pub school_year_id: Option<String>,
    pub created_at:     NaiveDateTime,
    pub updated_at:     NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subject {
    pub id:          String,
    pub school_id:   String,
    pub name:        String,
    pub code:        Option<String>,
    pub description: Option<String>,
    pub coefficient: f64,
    pub created_at:  NaiveDateTime,
    pub updated_at:  NaiveDateTime,
}

// ── Students ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Student {
    pub id:              String,
    pub user_id:         Option<String>,
    pub school_id:       String,
    pub student_number:  String,
    pub first_name:      String,
    pub last_name:       String,
    pub date_of_birth:   Option<NaiveDate>,
    pub gender:          Option<String>,
    pub address:         Option<String>,
    pub phone:           Option<String>,
    pub parent_name:     Option<String>,
    pub parent_phone:    Option<String>,
    pub parent_email:    Option<String>,
    pub class_id:        Option<String>,
    pub enrollment_date: Option<NaiveDate>,
    pub status:          StudentStatus,
    pub created_at:      NaiveDateTime,
    pub updated_at:      NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum StudentStatus {
    Active,
    Suspended,
    Graduated,
    Expelled,
}

impl StudentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudentStatus::Active => "active",
            StudentStatus::Suspended => "suspended",
            StudentStatus::Graduated => "graduated",
            StudentStatus::Expelled => "expelled",
        }
    }
}

// ── Teachers ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Teacher {
    pub id:             String,
    pub user_id:        String,
    pub school_id:      String,
    pub teacher_number: String,
    pub qualification:  Option<String>,
    pub specialization: Option<String>,
    pub hire_date:      Option<NaiveDate>,
    pub status:         TeacherStatus,
    pub created_at:     NaiveDateTime,
    pub updated_at:     NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TeacherStatus {
    Active,
    OnLeave,
    Resigned,
    Terminated,
}

impl TeacherStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeacherStatus::Active => "active",
            TeacherStatus::OnLeave => "on_leave",
            TeacherStatus::Resigned => "resigned",
            TeacherStatus::Terminated => "terminated",
        }
    }
}

// ── Grades ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Grade {
    pub id:             String,
    pub student_id:     String,
    pub subject_id:     String,
    pub class_id:       String,
    pub school_year_id: String,
    pub exam_type:      ExamType,
    pub score:          f64,
    pub max_score:      f64,
    pub exam_date:      Option<NaiveDate>,
    pub remarks:        Option<String>,
    pub teacher_id:     Option<String>,
    pub created_at:     NaiveDateTime,
    pub updated_at:     NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ExamType {
    Interrogation,
    Devoir,
    Examen1,
    Examen2,
    ExamenFinal,
}

impl ExamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExamType::Interrogation => "interrogation",
            ExamType::Devoir => "devoir",
            ExamType::Examen1 => "examen1",
            ExamType::Examen2 => "examen2",
            ExamType::ExamenFinal => "examen_final",
        }
    }
}

// ── Timetable ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Timetable {
    pub id:             String,
    pub class_id:       String,
    pub subject_id:     String,
    pub teacher_id:     Option<String>,
    pub day_of_week:    DayOfWeek,
    pub start_time:     NaiveTime,
    pub end_time:       NaiveTime,
    pub room:           Option<String>,
    pub school_year_id: Option<String>,
    pub created_at:     NaiveDateTime,
    pub updated_at:     NaiveDateTime,
}

/// School days, French labels as stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DayOfWeek {
    Lundi,
    Mardi,
    Mercredi,
    Jeudi,
    Vendredi,
    Samedi,
}

impl DayOfWeek {
    pub fn as_str(&self) -> &'static str {
        match self {
            DayOfWeek::Lundi => "lundi",
            DayOfWeek::Mardi => "mardi",
            DayOfWeek::Mercredi => "mercredi",
            DayOfWeek::Jeudi => "jeudi",
            DayOfWeek::Vendredi => "vendredi",
            DayOfWeek::Samedi => "samedi",
        }
    }
}

// ── Fees / payments ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Fee {
    pub id:             String,
    pub school_id:      String,
    pub name:           String,
    pub description:    Option<String>,
    pub amount:         f64,
    pub class_id:       Option<String>,
    pub school_year_id: Option<String>,
    pub is_mandatory:   bool,
    pub created_at:     NaiveDateTime,
    pub updated_at:     NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Payment {
    pub id:               String,
    pub student_id:       String,
    pub fee_id:           String,
    pub amount_paid:      f64,
    pub payment_date:     NaiveDate,
    pub payment_method:   PaymentMethod,
    pub reference_number: Option<String>,
    pub status:           PaymentStatus,
    pub remarks:          Option<String>,
    pub recorded_by:      Option<String>,
    pub created_at:       NaiveDateTime,
    pub updated_at:       NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    MobileMoney,
    BankTransfer,
    Check,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::MobileMoney => "mobile_money",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Check => "check",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Cancelled,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "completed",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Cancelled => "cancelled",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

// ── Attendance ───────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attendance {
    pub id:          String,
    pub student_id:  String,
    pub class_id:    String,
    pub date:        NaiveDate,
    pub status:      AttendanceStatus,
    pub remarks:     Option<String>,
    pub recorded_by: Option<String>,
    pub created_at:  NaiveDateTime,
    pub updated_at:  NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }
}

// ── Notifications ────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id:              String,
    pub school_id:       String,
    pub title:           String,
    pub message:         String,
    pub target_audience: NotificationAudience,
    pub class_id:        Option<String>,
    pub priority:        NotificationPriority,
    pub is_read:         bool,
    pub sent_by:         Option<String>,
    pub created_at:      NaiveDateTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationAudience {
    All,
    Teachers,
    Students,
    Parents,
    SpecificClass,
}

impl NotificationAudience {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationAudience::All => "all",
            NotificationAudience::Teachers => "teachers",
            NotificationAudience::Students => "students",
            NotificationAudience::Parents => "parents",
            NotificationAudience::SpecificClass => "specific_class",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
}

impl NotificationPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationPriority::Low => "low",
            NotificationPriority::Medium => "medium",
            NotificationPriority::High => "high",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct NotificationRecipient {
    pub id:              String,
    pub notification_id: String,
    pub user_id:         String,
    pub is_read:         bool,
    pub read_at:         Option<NaiveDateTime>,
    pub created_at:      NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_enums_are_closed_sets() {
        assert!(serde_json::from_str::<StudentStatus>("\"active\"").is_ok());
        assert!(serde_json::from_str::<StudentStatus>("\"enrolled\"").is_err());
        assert!(serde_json::from_str::<PaymentStatus>("\"refunded\"").is_ok());
        assert!(serde_json::from_str::<PaymentStatus>("\"failed\"").is_err());
        assert!(serde_json::from_str::<AttendanceStatus>("\"excused\"").is_ok());
        assert!(serde_json::from_str::<AttendanceStatus>("\"sick\"").is_err());
        assert!(serde_json::from_str::<UserRole>("\"school_director\"").is_ok());
        assert!(serde_json::from_str::<UserRole>("\"admin\"").is_err());
        assert!(serde_json::from_str::<DayOfWeek>("\"lundi\"").is_ok());
        assert!(serde_json::from_str::<DayOfWeek>("\"dimanche\"").is_err());
    }

    #[test]
    fn enum_wire_format_is_snake_case() {
        assert_eq!(serde_json::to_string(&UserRole::SchoolDirector).unwrap(), "\"school_director\"");
        assert_eq!(serde_json::to_string(&TeacherStatus::OnLeave).unwrap(), "\"on_leave\"");
        assert_eq!(serde_json::to_string(&PaymentMethod::MobileMoney).unwrap(), "\"mobile_money\"");
    }

    #[test]
    fn as_str_matches_serde_rename() {
        for (v, s) in [
            (NotificationAudience::All, "all"),
            (NotificationAudience::SpecificClass, "specific_class"),
        ] {
            assert_eq!(v.as_str(), s);
            assert_eq!(serde_json::to_string(&v).unwrap(), format!("\"{s}\""));
        }
    }

    #[test]
    fn user_never_serializes_password_hash() {
        let user = User {
            id: "u1".into(),
            username: "director".into(),
            email: "d@x.com".into(),
            password_hash: "$argon2id$secret".into(),
            first_name: None,
            last_name: None,
            phone: None,
            role: UserRole::SchoolDirector,
            school_id: Some("s1".into()),
            is_active: true,
            created_at: chrono::NaiveDateTime::default(),
            updated_at: chrono::NaiveDateTime::default(),
            last_login: None,
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
