use crate::model::{AccountId, OwnerId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An account that transactions are ingested into.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: AccountId,
    #[serde(skip)]
    pub owner_id: OwnerId,
    pub name: String,
}
