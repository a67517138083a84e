//! Venue repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide stable CRUD APIs over the `venues` tables.
//! - Express every guarded mutation as one atomic SQL statement whose
//!   WHERE clause re-verifies the authorization predicate.
//!
//! # Invariants
//! - `venue_rsvps` keeps at most one row per (venue, user); upserts preserve
//!   the original `seq` so an entry never moves within the sequence.
//! - Guarded mutations report `false` instead of applying when their
//!   predicate no longer holds; callers map that to their own error.

use crate::db::DbError;
use crate::model::identity::UserId;
use crate::model::venue::{GeoPoint, Rsvp, RsvpEntry, Venue, VenueId};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const VENUE_SELECT_SQL: &str = "SELECT
    id,
    owner,
    x,
    y,
    title,
    description,
    is_public
FROM venues";

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for venue persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(VenueId),
    /// Field name with no corresponding venue column; the policy layer is
    /// expected to reject these before they reach SQL construction.
    UnknownField(String),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "venue not found: {id}"),
            Self::UnknownField(name) => write!(f, "unknown venue field: {name}"),
            Self::InvalidData(message) => write!(f, "invalid persisted venue data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::UnknownField(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Value accepted by the generic field-update path.
///
/// Deliberately untyped beyond text/number: the generic path performs no
/// content validation, matching the permissive store contract.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Real(f64),
}

/// One requested field write, by wire name.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldUpdate {
    pub name: String,
    pub value: FieldValue,
}

impl FieldUpdate {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FieldValue::Text(value.into()),
        }
    }

    pub fn real(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value: FieldValue::Real(value),
        }
    }
}

/// Query options for listing venues. Reads are unrestricted.
#[derive(Debug, Clone, Default)]
pub struct VenueListQuery {
    pub owner: Option<UserId>,
    pub is_public: Option<bool>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for the venue store.
pub trait VenueRepository {
    /// Persists a freshly constructed venue. Invite and rsvp state always
    /// starts empty; it only ever grows through the guarded mutations below.
    fn create_venue(&self, venue: &Venue) -> RepoResult<VenueId>;
    fn get_venue(&self, id: VenueId) -> RepoResult<Option<Venue>>;
    fn list_venues(&self, query: &VenueListQuery) -> RepoResult<Vec<Venue>>;

    /// Applies field updates guarded by `owner`; `false` when no row matched.
    fn update_fields(
        &self,
        id: VenueId,
        owner: &UserId,
        updates: &[FieldUpdate],
    ) -> RepoResult<bool>;

    /// Removes the venue, guarded by `owner` and the zero-yes condition;
    /// `false` when the guard did not hold.
    fn delete_venue(&self, id: VenueId, owner: &UserId) -> RepoResult<bool>;

    /// Set-adds one invite, guarded by `owner`, privacy and target != owner;
    /// `true` only when a row was actually inserted.
    fn add_invite(&self, id: VenueId, target: &UserId, owner: &UserId) -> RepoResult<bool>;

    /// Upserts one rsvp entry keyed by `user`, guarded by the visibility
    /// predicate; `false` when the venue is missing or not visible.
    fn upsert_rsvp(&self, id: VenueId, user: &UserId, response: Rsvp) -> RepoResult<bool>;
}

/// SQLite-backed venue repository.
pub struct SqliteVenueRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteVenueRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl VenueRepository for SqliteVenueRepository<'_> {
    fn create_venue(&self, venue: &Venue) -> RepoResult<VenueId> {
        self.conn.execute(
            "INSERT INTO venues (id, owner, x, y, title, description, is_public)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                venue.id.to_string(),
                venue.owner.to_string(),
                venue.location.x,
                venue.location.y,
                venue.title.as_str(),
                venue.description.as_str(),
                bool_to_int(venue.is_public),
            ],
        )?;

        Ok(venue.id)
    }

    fn get_venue(&self, id: VenueId) -> RepoResult<Option<Venue>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{VENUE_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            let venue = self.hydrate_venue(row)?;
            return Ok(Some(venue));
        }

        Ok(None)
    }

    fn list_venues(&self, query: &VenueListQuery) -> RepoResult<Vec<Venue>> {
        let mut sql = format!("{VENUE_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(owner) = query.owner {
            sql.push_str(" AND owner = ?");
            bind_values.push(Value::Text(owner.to_string()));
        }

        if let Some(is_public) = query.is_public {
            sql.push_str(" AND is_public = ?");
            bind_values.push(Value::Integer(bool_to_int(is_public)));
        }

        sql.push_str(" ORDER BY created_at DESC, id ASC");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut venues = Vec::new();

        while let Some(row) = rows.next()? {
            venues.push(self.hydrate_venue(row)?);
        }

        Ok(venues)
    }

    fn update_fields(
        &self,
        id: VenueId,
        owner: &UserId,
        updates: &[FieldUpdate],
    ) -> RepoResult<bool> {
        let mut assignments = Vec::with_capacity(updates.len() + 1);
        let mut bind_values: Vec<Value> = Vec::with_capacity(updates.len() + 2);

        for update in updates {
            let column = column_for_field(&update.name)
                .ok_or_else(|| RepoError::UnknownField(update.name.clone()))?;
            assignments.push(format!("{column} = ?"));
            bind_values.push(match &update.value {
                FieldValue::Text(text) => Value::Text(text.clone()),
                FieldValue::Real(real) => Value::Real(*real),
            });
        }
        assignments.push("updated_at = (strftime('%s', 'now') * 1000)".to_string());

        let sql = format!(
            "UPDATE venues SET {} WHERE id = ? AND owner = ?;",
            assignments.join(", ")
        );
        bind_values.push(Value::Text(id.to_string()));
        bind_values.push(Value::Text(owner.to_string()));

        let changed = self.conn.execute(&sql, params_from_iter(bind_values))?;
        Ok(changed > 0)
    }

    fn delete_venue(&self, id: VenueId, owner: &UserId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM venues
             WHERE id = ?1
               AND owner = ?2
               AND NOT EXISTS (
                   SELECT 1 FROM venue_rsvps r
                   WHERE r.venue_id = venues.id AND r.response = 'yes'
               );",
            params![id.to_string(), owner.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn add_invite(&self, id: VenueId, target: &UserId, owner: &UserId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO venue_invites (venue_id, user_id)
             SELECT v.id, ?2
             FROM venues v
             WHERE v.id = ?1
               AND v.owner = ?3
               AND v.is_public = 0
               AND v.owner != ?2;",
            params![id.to_string(), target.to_string(), owner.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn upsert_rsvp(&self, id: VenueId, user: &UserId, response: Rsvp) -> RepoResult<bool> {
        // Single-statement upsert addressed by user identity: the visibility
        // predicate runs inside the same statement as the write, and the
        // conflict clause only touches `response`, leaving `seq` (and with it
        // the entry's position) untouched.
        let changed = self.conn.execute(
            "INSERT INTO venue_rsvps (venue_id, user_id, response, seq)
             SELECT v.id, ?2, ?3,
                    (SELECT COALESCE(MAX(r.seq), 0) + 1
                     FROM venue_rsvps r
                     WHERE r.venue_id = v.id)
             FROM venues v
             WHERE v.id = ?1
               AND (v.is_public = 1
                    OR v.owner = ?2
                    OR EXISTS (
                        SELECT 1 FROM venue_invites i
                        WHERE i.venue_id = v.id AND i.user_id = ?2
                    ))
             ON CONFLICT (venue_id, user_id)
             DO UPDATE SET response = excluded.response;",
            params![id.to_string(), user.to_string(), response.as_str()],
        )?;
        Ok(changed > 0)
    }
}

impl SqliteVenueRepository<'_> {
    fn hydrate_venue(&self, row: &Row<'_>) -> RepoResult<Venue> {
        let id_text: String = row.get("id")?;
        let id = parse_uuid(&id_text, "venues.id")?;

        let owner_text: String = row.get("owner")?;
        let owner = parse_uuid(&owner_text, "venues.owner")?;

        let is_public = match row.get::<_, i64>("is_public")? {
            0 => false,
            1 => true,
            other => {
                return Err(RepoError::InvalidData(format!(
                    "invalid is_public value `{other}` in venues.is_public"
                )));
            }
        };

        Ok(Venue {
            id,
            owner,
            location: GeoPoint {
                x: row.get("x")?,
                y: row.get("y")?,
            },
            title: row.get("title")?,
            description: row.get("description")?,
            is_public,
            invited: self.load_invited(id)?,
            rsvps: self.load_rsvps(id)?,
        })
    }

    fn load_invited(&self, id: VenueId) -> RepoResult<BTreeSet<UserId>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id FROM venue_invites WHERE venue_id = ?1 ORDER BY user_id ASC;",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        let mut invited = BTreeSet::new();

        while let Some(row) = rows.next()? {
            let user_text: String = row.get("user_id")?;
            invited.insert(parse_uuid(&user_text, "venue_invites.user_id")?);
        }

        Ok(invited)
    }

    fn load_rsvps(&self, id: VenueId) -> RepoResult<Vec<RsvpEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, response
             FROM venue_rsvps
             WHERE venue_id = ?1
             ORDER BY seq ASC, user_id ASC;",
        )?;

        let mut rows = stmt.query([id.to_string()])?;
        let mut rsvps = Vec::new();

        while let Some(row) = rows.next()? {
            let user_text: String = row.get("user_id")?;
            let user = parse_uuid(&user_text, "venue_rsvps.user_id")?;

            let response_text: String = row.get("response")?;
            let response = Rsvp::parse(&response_text).ok_or_else(|| {
                RepoError::InvalidData(format!(
                    "invalid response `{response_text}` in venue_rsvps.response"
                ))
            })?;

            rsvps.push(RsvpEntry { user, response });
        }

        Ok(rsvps)
    }
}

fn column_for_field(name: &str) -> Option<&'static str> {
    match name {
        "title" => Some("title"),
        "description" => Some("description"),
        "x" => Some("x"),
        "y" => Some("y"),
        _ => None,
    }
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
