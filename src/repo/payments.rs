//! Payment repository — fee history and school revenue aggregates.

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    db::Db,
    errors::AppResult,
    models::{Payment, PaymentMethod, PaymentStatus},
};

use super::{bind_query_as, SqlValue, Table};

/// A payment joined with the fee it settles, newest first.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct PaymentWithFee {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub payment:    Payment,
    pub fee_name:   Option<String>,
    pub fee_amount: Option<f64>,
}

/// Completed revenue for one payment method.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct RevenueByMethod {
    pub payment_method: PaymentMethod,
    pub total_revenue:  Option<f64>,
    pub total_payments: i64,
}

#[derive(Clone, Copy)]
pub struct PaymentRepo {
    pub table: Table<Payment>,
}

impl PaymentRepo {
    pub fn new() -> Self {
        Self { table: Table::new("payments") }
    }

    pub async fn find_by_student(&self, pool: &Db, student_id: &str) -> AppResult<Vec<PaymentWithFee>> {
        let rows = sqlx::query_as::<_, PaymentWithFee>(
            "SELECT p.*,
                    f.name AS fee_name,
                    f.amount AS fee_amount
             FROM payments p
             LEFT JOIN fees f ON p.fee_id = f.id
             WHERE p.student_id = ?
             ORDER BY p.payment_date DESC",
        )
        .bind(student_id)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// All payments of a school's students, newest first. Scoped through the
    /// student ownership graph since payments carry no school column.
    pub async fn find_by_school(
        &self,
        pool: &Db,
        school_id: &str,
        status: Option<PaymentStatus>,
    ) -> AppResult<Vec<PaymentWithFee>> {
        let mut sql = String::from(
            "SELECT p.*,
                    f.name AS fee_name,
                    f.amount AS fee_amount
             FROM payments p
             LEFT JOIN fees f ON p.fee_id = f.id
             JOIN students s ON p.student_id = s.id
             WHERE s.school_id = ?",
        );
        let mut values = vec![SqlValue::Text(school_id.to_owned())];
        if let Some(status) = status {
            sql.push_str(" AND p.status = ?");
            values.push(status.into());
        }
        sql.push_str(" ORDER BY p.payment_date DESC");

        let rows = bind_query_as(sqlx::query_as::<_, PaymentWithFee>(&sql), &values)
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    /// Completed revenue of a school grouped by payment method, optionally
    /// bounded to a date range. The school scope goes through the student
    /// ownership graph.
    pub async fn school_revenue(
        &self,
        pool: &Db,
        school_id: &str,
        date_from: Option<NaiveDate>,
        date_to: Option<NaiveDate>,
    ) -> AppResult<Vec<RevenueByMethod>> {
        let mut sql = String::from(
            "SELECT p.payment_method,
                    SUM(p.amount_paid) AS total_revenue,
                    COUNT(*) AS total_payments
             FROM payments p
             JOIN students s ON p.student_id = s.id
             WHERE s.school_id = ? AND p.status = 'completed'",
        );
        let mut values = vec![SqlValue::Text(school_id.to_owned())];
        if let Some(from) = date_from {
            sql.push_str(" AND p.payment_date >= ?");
            values.push(SqlValue::Date(from));
        }
        if let Some(to) = date_to {
            sql.push_str(" AND p.payment_date <= ?");
            values.push(SqlValue::Date(to));
        }
        sql.push_str(" GROUP BY p.payment_method");

        let rows = bind_query_as(sqlx::query_as::<_, RevenueByMethod>(&sql), &values)
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }
}

impl Default for PaymentRepo {
    fn default() -> Self {
        Self::new()
    }
}
