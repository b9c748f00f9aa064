use std::io::Write;

use api_types::{auth::Session, transaction::NewTransaction};
use chrono::Utc;
use engine::{AuthService, AuthSubscription, FinanceStore, RemoteService};
use tokio::sync::broadcast::{Receiver, error::TryRecvError};

use crate::{
    config::{AppConfig, Command},
    dashboard,
    error::Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Auth,
    Dashboard,
}

/// One application session: the store plus the auth state it is gated on.
pub struct App<C> {
    client: C,
    store: FinanceStore<C>,
    session: Option<Session>,
    sign_in_error: Option<String>,
    auth_changes: AuthSubscription,
}

impl<C> App<C>
where
    C: RemoteService + AuthService + Clone,
{
    pub fn new(client: C) -> Self {
        let auth_changes = client.on_auth_state_change();
        let store = FinanceStore::new(client.clone());
        Self {
            client,
            store,
            session: None,
            sign_in_error: None,
            auth_changes,
        }
    }

    /// Remembers why signing in failed so the sign-in prompt can show it.
    pub fn sign_in_failed(&mut self, reason: impl Into<String>) {
        self.sign_in_error = Some(reason.into());
    }

    /// Reads the session the auth service already holds.
    pub async fn start(&mut self) -> Result<()> {
        self.session = self.client.get_session().await?;
        tracing::debug!(signed_in = self.session.is_some(), "session loaded");
        Ok(())
    }

    /// Applies auth changes that arrived since the last call.
    pub fn sync_session(&mut self) {
        while let Some(change) = self.auth_changes.try_recv() {
            tracing::info!(event = ?change.event, "auth state changed");
            self.session = change.session;
        }
    }

    pub fn screen(&self) -> Screen {
        if self.session.is_some() {
            Screen::Dashboard
        } else {
            Screen::Auth
        }
    }

    pub fn store(&self) -> &FinanceStore<C> {
        &self.store
    }

    /// Runs one command against the store and prints the outcome.
    ///
    /// Returns `false` when the command ended with an error in the store.
    pub async fn run(&mut self, command: Command, out: &mut impl Write) -> Result<bool> {
        self.sync_session();
        if self.screen() == Screen::Auth {
            if let Some(reason) = &self.sign_in_error {
                writeln!(out, "Sign in failed: {reason}")?;
            }
            writeln!(
                out,
                "Please sign in: set `email` and FINANCEFLOW_PASSWORD, then try again."
            )?;
            return Ok(false);
        }

        let mut toasts = self.store.subscribe_toasts();
        match command {
            Command::Dashboard { recent } => {
                self.store.fetch_transactions().await;
                // Starting another operation would clear this error.
                if self.store.snapshot().error.is_none() {
                    self.store.fetch_budgets().await;
                }
                if let Some(session) = &self.session {
                    let who = session.user.email.as_deref().unwrap_or("signed in");
                    writeln!(out, "FinanceFlow ({who})")?;
                    writeln!(out)?;
                }
                dashboard::render(out, &self.store.snapshot(), recent)?;
            }
            Command::Add {
                description,
                amount,
                category,
                kind,
                date,
            } => {
                let input = NewTransaction {
                    description,
                    amount: amount.abs(),
                    category,
                    kind,
                    date: date.unwrap_or_else(Utc::now),
                    user_id: None,
                };
                self.store.add_transaction(input).await;
            }
            Command::Delete { id } => {
                self.store.delete_transaction(id).await;
            }
            Command::Budget {
                category,
                limit,
                spent,
            } => {
                self.store.fetch_budgets().await;
                let existing = self
                    .store
                    .snapshot()
                    .budgets
                    .into_iter()
                    .find(|b| b.category == category);
                match existing {
                    Some(mut budget) => {
                        budget.limit = limit;
                        if let Some(spent) = spent {
                            budget.spent = spent;
                        }
                        self.store.update_budget(budget).await;
                    }
                    None if self.store.snapshot().error.is_none() => {
                        writeln!(out, "No budget found for category {category}.")?;
                        return Ok(false);
                    }
                    None => {}
                }
            }
        }

        drain_toasts(&mut toasts, out)?;
        Ok(self.store.snapshot().error.is_none())
    }

    /// Stops listening to auth changes.
    pub fn shutdown(self) {
        self.auth_changes.unsubscribe();
    }
}

fn drain_toasts(toasts: &mut Receiver<engine::Toast>, out: &mut impl Write) -> Result<()> {
    loop {
        match toasts.try_recv() {
            Ok(toast) => dashboard::render_toast(out, &toast)?,
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty | TryRecvError::Closed) => return Ok(()),
        }
    }
}

/// Signs in with the configured credentials when there are any.
pub async fn sign_in(client: &remote::SupabaseClient, config: &AppConfig) -> Result<()> {
    if !config.has_credentials() {
        return Ok(());
    }
    client
        .sign_in_with_password(config.email.trim(), &config.password)
        .await?;
    Ok(())
}
