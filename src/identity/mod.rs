pub mod session;
pub mod store;

pub use session::{get_or_create_client_id, ClientIdentity, Session, CLIENT_ID_KEY};
pub use store::{JsonFileStore, KeyValueStore, MemoryStore};
