use crate::db::DbConnection;
use crate::storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub db: DbConnection,
    pub storage: Storage,
}
