use api_types::{
    auth::User,
    budget::Budget,
    transaction::{NewTransaction, Transaction},
};
use engine::{RemoteError, RemoteService};
use reqwest::{Method, header::ACCEPT};
use uuid::Uuid;

use crate::{SupabaseClient, error};

const TRANSACTIONS: &str = "rest/v1/transactions";
const BUDGETS: &str = "rest/v1/budgets";

/// Asks the REST layer to answer with the written rows.
const RETURN_REPRESENTATION: &str = "return=representation";
const RETURN_MINIMAL: &str = "return=minimal";
/// Makes the REST layer answer with a single object instead of an array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

fn eq(value: impl std::fmt::Display) -> String {
    format!("eq.{value}")
}

impl RemoteService for SupabaseClient {
    async fn current_user(&self) -> Result<Option<User>, RemoteError> {
        self.fetch_user().await
    }

    async fn insert_transaction(&self, row: &NewTransaction) -> Result<Transaction, RemoteError> {
        let request = self
            .request(Method::POST, TRANSACTIONS)?
            .header("Prefer", RETURN_REPRESENTATION)
            .header(ACCEPT, SINGLE_OBJECT)
            .json(row);
        let res = self.send(request).await?;
        res.json::<Transaction>().await.map_err(error::decode)
    }

    async fn list_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, RemoteError> {
        let request = self.request(Method::GET, TRANSACTIONS)?.query(&[
            ("select", "*".to_string()),
            ("user_id", eq(user_id)),
            ("order", "date.desc".to_string()),
        ]);
        let res = self.send(request).await?;
        res.json::<Vec<Transaction>>().await.map_err(error::decode)
    }

    async fn delete_transaction(&self, id: Uuid) -> Result<(), RemoteError> {
        let request = self
            .request(Method::DELETE, TRANSACTIONS)?
            .header("Prefer", RETURN_MINIMAL)
            .query(&[("id", eq(id))]);
        self.send(request).await?;
        Ok(())
    }

    async fn list_budgets(&self, user_id: Uuid) -> Result<Vec<Budget>, RemoteError> {
        let request = self.request(Method::GET, BUDGETS)?.query(&[
            ("select", "*".to_string()),
            ("user_id", eq(user_id)),
            ("order", "month.desc".to_string()),
        ]);
        let res = self.send(request).await?;
        res.json::<Vec<Budget>>().await.map_err(error::decode)
    }

    async fn update_budget(&self, user_id: Uuid, budget: &Budget) -> Result<(), RemoteError> {
        let mut row = budget.clone();
        row.user_id = Some(user_id);

        let request = self
            .request(Method::PATCH, BUDGETS)?
            .header("Prefer", RETURN_MINIMAL)
            .query(&[("category", eq(&budget.category)), ("user_id", eq(user_id))])
            .json(&row);
        self.send(request).await?;
        Ok(())
    }
}
