pub mod comment_store;
pub mod database;
pub mod interaction_store;
pub mod ledger_store;
pub mod prompt_store;
pub mod user_store;

pub use comment_store::CommentStore;
pub use database::{Database, DatabaseStats, PoolConfig, SharedDatabase};
pub use interaction_store::InteractionStore;
pub use ledger_store::LedgerStore;
pub use prompt_store::PromptStore;
pub use user_store::UserStore;
