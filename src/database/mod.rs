pub mod manager;
pub mod models;
pub mod profile_store;

pub use manager::{DatabaseError, DatabaseManager};
pub use models::Profile;
pub use profile_store::{PgProfileStore, ProfileStore, ProfileStoreError};
