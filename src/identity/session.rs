use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::store::KeyValueStore;

/// Storage key the client identifier lives under.
pub const CLIENT_ID_KEY: &str = "mapplatform.client_id";

/// Stable per-installation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    pub client_id: Uuid,
}

/// Returns the persisted client id, minting and flushing a new one when the
/// store has none (or holds something that is not a UUID).
pub fn get_or_create_client_id(store: &dyn KeyValueStore) -> Result<ClientIdentity> {
    let existing = store
        .get(CLIENT_ID_KEY)
        .context("failed to read client id from store")?;

    if let Some(raw) = existing {
        match Uuid::parse_str(raw.trim()) {
            Ok(client_id) => return Ok(ClientIdentity { client_id }),
            Err(err) => warn!("Stored client id '{raw}' is invalid ({err}); replacing it"),
        }
    }

    let client_id = Uuid::new_v4();
    store
        .set(CLIENT_ID_KEY, &client_id.to_string())
        .context("failed to store client id")?;
    store.flush().context("failed to persist client id")?;
    info!("Minted new client id {client_id}");

    Ok(ClientIdentity { client_id })
}

/// One run of the pipeline. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub client_id: Uuid,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn begin(identity: ClientIdentity) -> Self {
        Self {
            id: Uuid::new_v4(),
            client_id: identity.client_id,
            started_at: Utc::now(),
        }
    }
}
