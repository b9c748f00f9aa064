use api_types::{
    auth::User,
    budget::Budget,
    category::Category,
    summary::FinancialSummary,
    transaction::{NewTransaction, Transaction},
};
use tokio::sync::{broadcast, watch};
use uuid::Uuid;

use crate::{
    RemoteError, RemoteService, StoreError,
    aggregate::{self, Totals},
    toast::Toast,
};

const TOAST_CAPACITY: usize = 32;

/// In-memory mirror of the signed-in user's rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FinanceState {
    pub transactions: Vec<Transaction>,
    pub budgets: Vec<Budget>,
    pub categories: Vec<Category>,
    /// Outcome of the last failed operation, cleared when the next one starts.
    pub error: Option<StoreError>,
    in_flight: usize,
}

impl FinanceState {
    /// Builds a state with pre-filled caches and nothing in flight.
    pub fn with_cache(
        transactions: Vec<Transaction>,
        budgets: Vec<Budget>,
        categories: Vec<Category>,
    ) -> Self {
        Self {
            transactions,
            budgets,
            categories,
            ..Self::default()
        }
    }

    /// `true` while at least one operation is running.
    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    pub fn totals(&self) -> Totals {
        aggregate::aggregate(&self.transactions)
    }

    pub fn summary(&self) -> FinancialSummary {
        aggregate::summarize(&self.transactions, &self.budgets)
    }
}

/// Client-side state container for one signed-in session.
///
/// Every action marks the state as loading, talks to the backend, then either
/// patches the cache or records the error. Actions never fail towards the
/// caller: the outcome is in the state and on the toast channel.
pub struct FinanceStore<R> {
    remote: R,
    state: watch::Sender<FinanceState>,
    toasts: broadcast::Sender<Toast>,
}

/// Releases one loading mark when dropped, whatever way the action exits.
struct Loading<'a> {
    state: &'a watch::Sender<FinanceState>,
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.state
            .send_modify(|state| state.in_flight = state.in_flight.saturating_sub(1));
    }
}

impl<R: RemoteService> FinanceStore<R> {
    pub fn new(remote: R) -> Self {
        Self::with_state(remote, FinanceState::default())
    }

    pub fn with_state(remote: R, state: FinanceState) -> Self {
        let (state, _) = watch::channel(state);
        let (toasts, _) = broadcast::channel(TOAST_CAPACITY);
        Self {
            remote,
            state,
            toasts,
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> FinanceState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<FinanceState> {
        self.state.subscribe()
    }

    pub fn subscribe_toasts(&self) -> broadcast::Receiver<Toast> {
        self.toasts.subscribe()
    }

    pub fn clear_error(&self) {
        self.state.send_if_modified(|state| state.error.take().is_some());
    }

    /// Inserts a transaction for the signed-in user and appends the stored row
    /// to the cache. Returns whether it succeeded.
    pub async fn add_transaction(&self, input: NewTransaction) -> bool {
        let _loading = self.begin();
        match self.insert(input).await {
            Ok(row) => {
                self.state.send_modify(|state| {
                    state.transactions.push(row);
                    state.error = None;
                });
                self.notify(Toast::success("Transaction added successfully"));
                true
            }
            Err(err) => {
                self.fail("add_transaction", err, "Failed to add transaction");
                false
            }
        }
    }

    /// Replaces the cached transactions with the user's rows, newest first.
    pub async fn fetch_transactions(&self) {
        let _loading = self.begin();
        let result = async {
            let user = self
                .require_user("Please sign in to view transactions")
                .await?;
            Ok::<_, StoreError>(self.remote.list_transactions(user.id).await?)
        }
        .await;

        match result {
            Ok(rows) => {
                tracing::debug!("fetched {} transactions", rows.len());
                self.state.send_modify(|state| {
                    state.transactions = rows;
                    state.error = None;
                });
            }
            Err(err) => self.fail("fetch_transactions", err, "Failed to fetch transactions"),
        }
    }

    /// Replaces the cached budgets with the user's rows.
    pub async fn fetch_budgets(&self) {
        let _loading = self.begin();
        let result = async {
            let user = self.require_user("Please sign in to view budgets").await?;
            Ok::<_, StoreError>(self.remote.list_budgets(user.id).await?)
        }
        .await;

        match result {
            Ok(rows) => {
                self.state.send_modify(|state| {
                    state.budgets = rows;
                    state.error = None;
                });
            }
            Err(err) => self.fail("fetch_budgets", err, "Failed to fetch budgets"),
        }
    }

    /// Updates the budget matched by category and swaps it in the cache.
    ///
    /// The cache is patched locally, not re-fetched.
    pub async fn update_budget(&self, budget: Budget) {
        let _loading = self.begin();
        let result = async {
            let user = self.require_user(StoreError::NOT_AUTHENTICATED).await?;
            Ok::<_, StoreError>(self.remote.update_budget(user.id, &budget).await?)
        }
        .await;

        match result {
            Ok(()) => {
                self.state.send_modify(|state| {
                    for cached in state
                        .budgets
                        .iter_mut()
                        .filter(|b| b.category == budget.category)
                    {
                        *cached = budget.clone();
                    }
                    state.error = None;
                });
                self.notify(Toast::success("Budget updated successfully"));
            }
            Err(err) => self.fail("update_budget", err, "Failed to update budget"),
        }
    }

    /// Deletes a transaction and drops it from the cache.
    pub async fn delete_transaction(&self, id: Uuid) {
        let _loading = self.begin();
        match self.remote.delete_transaction(id).await {
            Ok(()) => {
                self.state.send_modify(|state| {
                    state.transactions.retain(|t| t.id != id);
                    state.error = None;
                });
                self.notify(Toast::success("Transaction deleted successfully"));
            }
            Err(err) => self.fail("delete_transaction", err.into(), "Failed to delete transaction"),
        }
    }

    async fn insert(&self, input: NewTransaction) -> Result<Transaction, StoreError> {
        let user = self.require_user(StoreError::NOT_AUTHENTICATED).await?;
        let row = self.remote.insert_transaction(&input.owned_by(user.id)).await?;
        Ok(row)
    }

    /// Resolves the signed-in user once for the calling action.
    async fn require_user(&self, message: &str) -> Result<User, StoreError> {
        match self.remote.current_user().await {
            Ok(Some(user)) => Ok(user),
            Ok(None) | Err(RemoteError::Unauthorized) => {
                Err(StoreError::Unauthenticated(message.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn begin(&self) -> Loading<'_> {
        self.state.send_modify(|state| {
            state.in_flight += 1;
            state.error = None;
        });
        Loading { state: &self.state }
    }

    fn fail(&self, operation: &str, err: StoreError, fallback: &str) {
        let err = err.or_fallback(fallback);
        tracing::error!(operation, "{err}");
        let message = err.to_string();
        self.state.send_modify(|state| state.error = Some(err));
        self.notify(Toast::error(message));
    }

    fn notify(&self, toast: Toast) {
        // No receiver is fine: nobody is showing toasts.
        let _ = self.toasts.send(toast);
    }
}
