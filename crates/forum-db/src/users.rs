use std::sync::Arc;

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use crate::models::{FromRow, User};
use crate::{Database, Result, StoreError};

/// Registration, login and profile lookups. Owns password hashing.
#[derive(Clone)]
pub struct UserStore {
    db: Arc<Database>,
}

impl UserStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Hashes the password with Argon2id and inserts a new user,
    /// returning its id.
    ///
    /// The email check and the insert are separate statements, so two
    /// concurrent registrations with the same address can both succeed.
    pub fn create(&self, username: &str, email: &str, password: &str) -> Result<i64> {
        if self.db.with_conn(|conn| email_exists(conn, email))? {
            return Err(StoreError::DuplicateEmail);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| StoreError::PasswordHash(e.to_string()))?
            .to_string();

        let id = self.db.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)",
                (username, email, &password_hash),
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        debug!(user_id = id, "user created");
        Ok(id)
    }

    /// Returns the id of the user owning `email` if `password` matches.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<i64> {
        let (id, stored): (i64, String) = self
            .db
            .with_conn(|conn| {
                Ok(conn
                    .query_row(
                        "SELECT id, password_hash FROM users WHERE email = ?1",
                        [email],
                        |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)),
                    )
                    .optional()?)
            })?
            .ok_or(StoreError::InvalidCredentials)?;

        let parsed =
            PasswordHash::new(&stored).map_err(|e| StoreError::PasswordHash(e.to_string()))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(id),
            Err(password_hash::Error::Password) => Err(StoreError::InvalidCredentials),
            Err(e) => Err(StoreError::PasswordHash(e.to_string())),
        }
    }

    pub fn get(&self, id: i64) -> Result<User> {
        self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, email FROM users WHERE id = ?1",
                [id],
                User::from_row,
            )
            .optional()?
            .ok_or(StoreError::NotFound)
        })
    }
}

fn email_exists(conn: &Connection, email: &str) -> Result<bool> {
    let found = conn
        .query_row("SELECT id FROM users WHERE email = ?1", [email], |row| {
            row.get::<_, i64>(0)
        })
        .optional()?;
    Ok(found.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::open_temp;

    fn user_count(db: &Database) -> i64 {
        db.with_conn(|conn| Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |r| r.get(0))?))
            .unwrap()
    }

    #[test]
    fn authenticate_returns_created_id() {
        let (_dir, db) = open_temp();
        let users = UserStore::new(db);

        let id = users.create("alice", "alice@x.com", "Passw0rd").unwrap();
        assert_eq!(users.authenticate("alice@x.com", "Passw0rd").unwrap(), id);
    }

    #[test]
    fn wrong_password_is_invalid_credentials() {
        let (_dir, db) = open_temp();
        let users = UserStore::new(db);
        users.create("alice", "alice@x.com", "Passw0rd").unwrap();

        for candidate in ["passw0rd", "Passw0rd ", "", "Passw0rdPassw0rd"] {
            let err = users.authenticate("alice@x.com", candidate).unwrap_err();
            assert!(matches!(err, StoreError::InvalidCredentials), "{candidate:?}: {err}");
        }
    }

    #[test]
    fn unknown_email_is_invalid_credentials() {
        let (_dir, db) = open_temp();
        let users = UserStore::new(db);

        let err = users.authenticate("nobody@x.com", "Passw0rd").unwrap_err();
        assert!(matches!(err, StoreError::InvalidCredentials));
    }

    #[test]
    fn duplicate_email_is_rejected_without_insert() {
        let (_dir, db) = open_temp();
        let users = UserStore::new(db.clone());
        users.create("alice", "alice@x.com", "Passw0rd").unwrap();

        let err = users.create("alice2", "alice@x.com", "An0therOne").unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
        assert_eq!(user_count(&db), 1);
    }

    #[test]
    fn password_is_not_stored_in_clear() {
        let (_dir, db) = open_temp();
        let users = UserStore::new(db.clone());
        let id = users.create("alice", "alice@x.com", "Passw0rd").unwrap();

        let stored: String = db
            .with_conn(|conn| {
                Ok(conn.query_row("SELECT password_hash FROM users WHERE id = ?1", [id], |r| {
                    r.get(0)
                })?)
            })
            .unwrap();
        assert!(stored.starts_with("$argon2id$"));
        assert!(!stored.contains("Passw0rd"));
    }

    #[test]
    fn get_returns_profile() {
        let (_dir, db) = open_temp();
        let users = UserStore::new(db);
        let id = users.create("alice", "alice@x.com", "Passw0rd").unwrap();

        let user = users.get(id).unwrap();
        assert_eq!(
            user,
            User {
                id,
                username: "alice".into(),
                email: "alice@x.com".into(),
            }
        );
    }

    #[test]
    fn get_missing_is_not_found() {
        let (_dir, db) = open_temp();
        let users = UserStore::new(db);

        for id in [0, 1, 42, -7] {
            assert!(matches!(users.get(id).unwrap_err(), StoreError::NotFound));
        }
    }
}
