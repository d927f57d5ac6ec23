//! User repository — identity lookups used by the auth service.

use crate::{
    db::Db,
    errors::AppResult,
    models::{User, UserRole},
};

use super::Table;

#[derive(Clone, Copy)]
pub struct UserRepo {
    pub table: Table<User>,
}

impl UserRepo {
    pub fn new() -> Self {
        Self { table: Table::new("users") }
    }

    pub async fn find_by_email(&self, pool: &Db, email: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ? LIMIT 1")
            .bind(email)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_username(&self, pool: &Db, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ? LIMIT 1")
            .bind(username)
            .fetch_optional(pool)
            .await?;
        Ok(user)
    }

    /// Users holding a role, optionally restricted to the members of one
    /// school (union of teacher and student membership).
    pub async fn find_by_role(
        &self,
        pool: &Db,
        role: UserRole,
        school_id: Option<&str>,
    ) -> AppResult<Vec<User>> {
        let users = match school_id {
            None => {
                sqlx::query_as::<_, User>("SELECT * FROM users WHERE role = ? ORDER BY id")
                    .bind(role.as_str())
                    .fetch_all(pool)
                    .await?
            }
            Some(school) => {
                sqlx::query_as::<_, User>(
                    "SELECT * FROM users
                     WHERE role = ?
                       AND id IN (
                         SELECT user_id FROM teachers WHERE school_id = ?
                         UNION
                         SELECT user_id FROM students WHERE school_id = ? AND user_id IS NOT NULL
                       )
                     ORDER BY id",
                )
                .bind(role.as_str())
                .bind(school)
                .bind(school)
                .fetch_all(pool)
                .await?
            }
        };
        Ok(users)
    }

    pub async fn stamp_last_login(&self, pool: &Db, user_id: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = ?")
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn set_password_hash(&self, pool: &Db, user_id: &str, hash: &str) -> AppResult<()> {
        sqlx::query("UPDATE users SET password_hash = ?, updated_at = NOW() WHERE id = ?")
            .bind(hash)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }
}

impl Default for UserRepo {
    fn default() -> Self {
        Self::new()
    }
}
