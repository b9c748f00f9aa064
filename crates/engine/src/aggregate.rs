//! Totals derived from the cached transactions.
//!
//! Nothing here is memoized: callers recompute on every render, which is a
//! single pass over the cache.

use std::collections::HashMap;

use api_types::{
    MoneyCents,
    budget::Budget,
    summary::FinancialSummary,
    transaction::{Transaction, TransactionKind},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    pub total_income: MoneyCents,
    pub total_expenses: MoneyCents,
    pub net_balance: MoneyCents,
}

/// Expense total of one category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: MoneyCents,
}

/// Sums income and expenses.
///
/// Income adds its amount as-is; everything else adds the magnitude of its
/// amount, so expenses stored with a negative sign are counted the same as
/// positive ones. Totals saturate instead of overflowing.
pub fn aggregate(transactions: &[Transaction]) -> Totals {
    let mut total_income = MoneyCents::ZERO;
    let mut total_expenses = MoneyCents::ZERO;

    for transaction in transactions {
        match transaction.kind {
            TransactionKind::Income => total_income += transaction.amount,
            TransactionKind::Expense => total_expenses += transaction.amount.abs(),
        }
    }

    Totals {
        total_income,
        total_expenses,
        net_balance: total_income - total_expenses,
    }
}

/// Net balance as a percentage of income.
///
/// A zero income is treated as 1 so the ratio is always defined.
pub fn net_balance_trend(totals: &Totals) -> f64 {
    let income = if totals.total_income.is_zero() {
        1.0
    } else {
        totals.total_income.as_f64()
    };
    totals.net_balance.as_f64() / income * 100.0
}

/// Expenses grouped by category, largest first.
pub fn expense_breakdown(transactions: &[Transaction]) -> Vec<CategoryTotal> {
    let mut totals: HashMap<&str, MoneyCents> = HashMap::new();
    for transaction in transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Expense)
    {
        *totals.entry(transaction.category.as_str()).or_default() += transaction.amount.abs();
    }

    let mut breakdown: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.to_string(),
            total,
        })
        .collect();
    breakdown.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    breakdown
}

/// Share of the budget already spent, in percent. Not capped at 100.
pub fn budget_progress(budget: &Budget) -> f64 {
    if budget.limit.cents() <= 0 {
        return 0.0;
    }
    budget.spent.as_f64() / budget.limit.as_f64() * 100.0
}

/// Assembles the dashboard summary. The monthly budget is the sum of the
/// cached budget limits.
pub fn summarize(transactions: &[Transaction], budgets: &[Budget]) -> FinancialSummary {
    let totals = aggregate(transactions);
    FinancialSummary {
        total_income: totals.total_income,
        total_expenses: totals.total_expenses,
        net_savings: totals.net_balance,
        monthly_budget: budgets.iter().map(|b| b.limit).sum(),
    }
}
