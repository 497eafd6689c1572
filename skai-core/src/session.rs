//! Authentication and the persisted session record.
//!
//! Sign-in is checked against a fixed credential table. A successful sign-in
//! is written to one named slot of the [`Database`] so the next start can
//! restore it; signing out clears that slot again.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SessionConfig;
use crate::db::Database;

/// The authenticated user and their organizational context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub username: String,
    /// Display name
    pub name: String,
    pub organization: String,
    pub role: String,
    pub region: String,
    /// Avatar image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Accent color the presentation layer uses for an organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrgAccent {
    Blue,
    Red,
    Cyan,
    Orange,
    Gray,
}

impl Session {
    pub fn accent(&self) -> OrgAccent {
        match self.organization.as_str() {
            "UNHCR" => OrgAccent::Blue,
            "International Red Cross" => OrgAccent::Red,
            "UNICEF" => OrgAccent::Cyan,
            "World Food Programme" => OrgAccent::Orange,
            _ => OrgAccent::Gray,
        }
    }
}

/// Returned when an identifier is unknown or its secret does not match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid username or password for {identifier:?}")]
pub struct AuthFailure {
    pub identifier: String,
}

struct Credential {
    secret: &'static str,
    session: Session,
}

/// Static identifier -> (secret, session) table.
pub struct CredentialTable {
    entries: HashMap<&'static str, Credential>,
}

impl CredentialTable {
    /// The four demo accounts.
    pub fn seeded() -> Self {
        let rows = [
            (
                "1",
                "unhcr.admin",
                "humanitarian2024",
                "Dr. Sarah Chen",
                "UNHCR",
                "Emergency Response Coordinator",
                "Caribbean Region",
                "https://images.pexels.com/photos/774909/pexels-photo-774909.jpeg?auto=compress&cs=tinysrgb&w=150",
            ),
            (
                "2",
                "redcross.field",
                "response123",
                "Marcus Rodriguez",
                "International Red Cross",
                "Field Operations Manager",
                "Haiti Operations",
                "https://images.pexels.com/photos/1222271/pexels-photo-1222271.jpeg?auto=compress&cs=tinysrgb&w=150",
            ),
            (
                "3",
                "unicef.analyst",
                "children2024",
                "Dr. Amara Okafor",
                "UNICEF",
                "Emergency Data Analyst",
                "West Africa Hub",
                "https://images.pexels.com/photos/1181686/pexels-photo-1181686.jpeg?auto=compress&cs=tinysrgb&w=150",
            ),
            (
                "4",
                "wfp.logistics",
                "foodsecurity",
                "Jean-Pierre Dubois",
                "World Food Programme",
                "Logistics Coordinator",
                "Central America",
                "https://images.pexels.com/photos/1043471/pexels-photo-1043471.jpeg?auto=compress&cs=tinysrgb&w=150",
            ),
        ];

        let entries = rows
            .into_iter()
            .map(
                |(id, username, secret, name, organization, role, region, avatar)| {
                    let session = Session {
                        id: id.to_string(),
                        username: username.to_string(),
                        name: name.to_string(),
                        organization: organization.to_string(),
                        role: role.to_string(),
                        region: region.to_string(),
                        avatar: Some(avatar.to_string()),
                    };
                    (username, Credential { secret, session })
                },
            )
            .collect();

        Self { entries }
    }

    /// Exact-match lookup. Identifiers are case-sensitive.
    pub fn verify(&self, identifier: &str, secret: &str) -> Option<&Session> {
        self.entries
            .get(identifier)
            .filter(|c| c.secret == secret)
            .map(|c| &c.session)
    }

    /// Known identifiers, sorted (for the login screen's hint list).
    pub fn identifiers(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

/// Owns the current session and the slot it is persisted in.
///
/// No other component reads or writes the session slot.
pub struct SessionStore {
    db: Arc<Database>,
    slot: String,
    latency: Duration,
    credentials: CredentialTable,
    current: Option<Session>,
}

impl SessionStore {
    pub fn new(db: Arc<Database>, config: &SessionConfig) -> Self {
        Self {
            db,
            slot: config.slot.clone(),
            latency: config.auth_latency(),
            credentials: CredentialTable::seeded(),
            current: None,
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }

    pub fn credentials(&self) -> &CredentialTable {
        &self.credentials
    }

    /// Check credentials after the configured artificial latency.
    ///
    /// On success the session becomes current and is persisted. A failed
    /// attempt leaves both the current session and the slot untouched.
    pub async fn authenticate(
        &mut self,
        identifier: &str,
        secret: &str,
    ) -> Result<Session, AuthFailure> {
        tokio::time::sleep(self.latency).await;

        let Some(session) = self.credentials.verify(identifier, secret).cloned() else {
            tracing::info!(identifier, "Sign-in rejected");
            return Err(AuthFailure {
                identifier: identifier.to_string(),
            });
        };

        // The in-memory session stands even if the slot cannot be written;
        // the user just has to sign in again next time.
        if let Err(e) = self.persist(&session) {
            tracing::warn!(error = %e, slot = %self.slot, "Failed to persist session");
        }

        tracing::info!(
            username = %session.username,
            organization = %session.organization,
            "Signed in"
        );
        self.current = Some(session.clone());
        Ok(session)
    }

    fn persist(&self, session: &Session) -> crate::Result<()> {
        let json = serde_json::to_string(session)?;
        self.db.write_slot(&self.slot, &json)
    }

    /// Load the persisted session, if a valid one exists.
    ///
    /// A record that fails to parse is discarded and the slot cleared.
    pub fn restore_session(&mut self) -> Option<Session> {
        let raw = match self.db.read_slot(&self.slot) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.current = None;
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, slot = %self.slot, "Failed to read session slot");
                self.current = None;
                return None;
            }
        };

        match serde_json::from_str::<Session>(&raw) {
            Ok(session) => {
                tracing::info!(username = %session.username, "Restored session");
                self.current = Some(session.clone());
                Some(session)
            }
            Err(e) => {
                tracing::warn!(error = %e, slot = %self.slot, "Discarding corrupt session record");
                if let Err(e) = self.db.clear_slot(&self.slot) {
                    tracing::warn!(error = %e, slot = %self.slot, "Failed to clear session slot");
                }
                self.current = None;
                None
            }
        }
    }

    /// Sign out. Safe to call when nobody is signed in.
    pub fn end_session(&mut self) {
        if let Some(session) = self.current.take() {
            tracing::info!(username = %session.username, "Signed out");
        }
        if let Err(e) = self.db.clear_slot(&self.slot) {
            tracing::warn!(error = %e, slot = %self.slot, "Failed to clear session slot");
        }
    }
}
