use uuid::Uuid;

use crate::domain::CustomerProfile;
use crate::error::BankingResult;

/// External collaborator interface: the compliance gate's read-only view of
/// the customer registry. Customer CRUD lives outside the core.
pub trait CustomerDirectory: Send + Sync {
    fn profile(&self, customer_id: Uuid) -> BankingResult<Option<CustomerProfile>>;
}
