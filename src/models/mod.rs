pub mod account;
pub mod category;
pub mod transaction;
pub mod transfer;

pub use account::{selectable_counterparts, Account, AccountPayload, DEFAULT_ACCOUNT_COLOR};
pub use category::{Category, CategoryPayload, CategoryType};
pub use transaction::{Transaction, TransactionPayload, TransactionWithRelations};
pub use transfer::{Transfer, TransferPayload, TransferWithAccounts};
