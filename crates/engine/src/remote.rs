use std::future::Future;

use api_types::{
    auth::User,
    budget::Budget,
    transaction::{NewTransaction, Transaction},
};
use uuid::Uuid;

use crate::RemoteError;

/// Table operations and identity lookup offered by the hosted backend.
///
/// Row ownership is enforced by the backend; implementations only pass the
/// filters through.
pub trait RemoteService: Send + Sync {
    /// Resolves the signed-in user, `None` when there is no valid session.
    fn current_user(&self) -> impl Future<Output = Result<Option<User>, RemoteError>> + Send;

    /// Inserts one row and returns it as stored.
    fn insert_transaction(
        &self,
        row: &NewTransaction,
    ) -> impl Future<Output = Result<Transaction, RemoteError>> + Send;

    /// All transactions owned by `user_id`, newest first.
    fn list_transactions(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Transaction>, RemoteError>> + Send;

    /// Deletes the transaction with the given id.
    fn delete_transaction(&self, id: Uuid) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// All budgets owned by `user_id`, most recent month first.
    fn list_budgets(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = Result<Vec<Budget>, RemoteError>> + Send;

    /// Overwrites the budget row of `user_id` whose category matches `budget.category`.
    fn update_budget(
        &self,
        user_id: Uuid,
        budget: &Budget,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;
}
