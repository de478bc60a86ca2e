use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use corebank_api::{BankingError, BankingResult};

/// A stored row: a schemaless JSON map carrying at minimum `id`,
/// `created_at`, and `updated_at`.
pub type Record = serde_json::Map<String, Value>;

/// Table-oriented key/value storage with transactional scopes. The single
/// shared resource of the engine: domain objects are materialized from
/// records per operation and written back through their owning mapper.
pub trait StorageInterface: Send + Sync {
    fn save(&self, table: &str, id: &str, record: Record) -> BankingResult<()>;

    fn load(&self, table: &str, id: &str) -> BankingResult<Option<Record>>;

    fn load_all(&self, table: &str) -> BankingResult<Vec<Record>>;

    /// All records whose fields equal every `(field, value)` pair.
    fn find(&self, table: &str, filter: &[(&str, Value)]) -> BankingResult<Vec<Record>>;

    fn delete(&self, table: &str, id: &str) -> BankingResult<bool>;

    fn exists(&self, table: &str, id: &str) -> BankingResult<bool>;

    fn count(&self, table: &str) -> BankingResult<usize>;

    fn clear_table(&self, table: &str) -> BankingResult<()>;

    /// Open a transactional scope. Nested scopes join the outermost one:
    /// only the outermost commit makes the writes visible as a unit, and a
    /// rollback anywhere unwinds the whole scope.
    fn begin(&self) -> BankingResult<()>;

    fn commit(&self) -> BankingResult<()>;

    fn rollback(&self) -> BankingResult<()>;
}

/// Closure-scoped atomic execution on top of begin/commit/rollback.
pub trait StorageExt: StorageInterface {
    fn atomic<T>(&self, f: impl FnOnce() -> BankingResult<T>) -> BankingResult<T> {
        self.begin()?;
        match f() {
            Ok(value) => {
                self.commit()?;
                Ok(value)
            }
            Err(err) => {
                // Rollback failures must not mask the original error.
                let _ = self.rollback();
                Err(err)
            }
        }
    }
}

impl<S: StorageInterface + ?Sized> StorageExt for S {}

/// Contract between a model struct and its table: serde to and from the
/// schemaless record representation.
pub trait StorageModel: Serialize + DeserializeOwned {
    const TABLE: &'static str;

    fn record_id(&self) -> String;

    fn to_record(&self) -> BankingResult<Record> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(BankingError::StorageFailure(format!(
                "model for table {} did not serialize to an object",
                Self::TABLE
            ))),
        }
    }

    fn from_record(record: Record) -> BankingResult<Self> {
        Ok(serde_json::from_value(Value::Object(record))?)
    }
}
