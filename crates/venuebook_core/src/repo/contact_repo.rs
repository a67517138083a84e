//! Contact directory lookup backing invite notifications.

use crate::model::identity::UserId;
use crate::repo::venue_repo::RepoResult;
use rusqlite::{params, Connection, OptionalExtension};

/// Read-only lookup from user identity to contact email address.
///
/// A `None` result means the user cannot be notified; the invite flow then
/// skips sending without failing.
pub trait ContactDirectory {
    fn contact_email(&self, user: &UserId) -> RepoResult<Option<String>>;
}

/// SQLite-backed contact directory over the `contacts` table.
pub struct SqliteContactDirectory<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteContactDirectory<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Records (or replaces) one user's contact email.
    pub fn set_contact_email(&self, user: &UserId, email: Option<&str>) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO contacts (user_id, email) VALUES (?1, ?2)
             ON CONFLICT (user_id) DO UPDATE SET email = excluded.email;",
            params![user.to_string(), email],
        )?;
        Ok(())
    }
}

impl ContactDirectory for SqliteContactDirectory<'_> {
    fn contact_email(&self, user: &UserId) -> RepoResult<Option<String>> {
        let email = self
            .conn
            .query_row(
                "SELECT email FROM contacts WHERE user_id = ?1;",
                [user.to_string()],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?;

        Ok(email.flatten())
    }
}
