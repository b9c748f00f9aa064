//! Text rendering of the store state.

use std::io::{self, Write};

use api_types::{
    MoneyCents,
    transaction::{Transaction, TransactionKind},
};
use engine::{
    FinanceState, Toast, ToastLevel,
    aggregate::{budget_progress, expense_breakdown, net_balance_trend},
};

const RUPEE: &str = "₹";

/// Formats an amount in whole rupees with Indian digit grouping
/// (`₹1,00,000`). Fractions are rounded half away from zero.
pub fn format_inr(amount: MoneyCents) -> String {
    let cents = amount.cents().unsigned_abs();
    let rupees = (cents + 50) / 100;
    let digits = rupees.to_string();

    let grouped = if digits.len() <= 3 {
        digits
    } else {
        let (head, tail) = digits.split_at(digits.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 2 {
            groups.push(&head[end - 2..end]);
            end -= 2;
        }
        groups.push(&head[..end]);
        groups.reverse();
        format!("{},{tail}", groups.join(","))
    };

    let sign = if amount.is_negative() && rupees > 0 { "-" } else { "" };
    format!("{sign}{RUPEE}{grouped}")
}

/// Net balance trend as shown next to the balance card, e.g. `+70.0%`.
pub fn format_trend(trend: f64) -> String {
    let sign = if trend >= 0.0 { "+" } else { "" };
    format!("{sign}{trend:.1}%")
}

fn signed_amount(transaction: &Transaction) -> String {
    match transaction.kind {
        TransactionKind::Income => format!("+{}", format_inr(transaction.amount.abs())),
        TransactionKind::Expense => format!("-{}", format_inr(transaction.amount.abs())),
    }
}

pub fn render_toast(out: &mut impl Write, toast: &Toast) -> io::Result<()> {
    let marker = match toast.level {
        ToastLevel::Success => "✓",
        ToastLevel::Error => "✗",
    };
    writeln!(out, "[{marker}] {}", toast.message)
}

/// Writes the dashboard: error banner, stat cards, recent transactions,
/// expense breakdown and budget progress.
pub fn render(out: &mut impl Write, state: &FinanceState, recent: usize) -> io::Result<()> {
    if let Some(error) = state.error_message() {
        writeln!(out, "! {error}")?;
        writeln!(out)?;
    }

    let totals = state.totals();
    let summary = state.summary();
    writeln!(
        out,
        "{:<16}{:>14}  {}",
        "Net Balance",
        format_inr(totals.net_balance),
        format_trend(net_balance_trend(&totals))
    )?;
    writeln!(out, "{:<16}{:>14}", "Total Income", format_inr(totals.total_income))?;
    writeln!(out, "{:<16}{:>14}", "Total Expenses", format_inr(totals.total_expenses))?;
    writeln!(out, "{:<16}{:>14}", "Monthly Budget", format_inr(summary.monthly_budget))?;

    writeln!(out)?;
    writeln!(out, "Recent Transactions")?;
    if state.transactions.is_empty() {
        writeln!(out, "  (none)")?;
    }
    for transaction in state.transactions.iter().take(recent) {
        writeln!(
            out,
            "  {}  {:<24} {:<14} {:>12}  {}",
            transaction.date.format("%Y-%m-%d"),
            transaction.description,
            transaction.category,
            signed_amount(transaction),
            transaction.id
        )?;
    }

    let breakdown = expense_breakdown(&state.transactions);
    if !breakdown.is_empty() {
        writeln!(out)?;
        writeln!(out, "Expense Breakdown")?;
        for entry in &breakdown {
            let share = if totals.total_expenses.is_zero() {
                0.0
            } else {
                entry.total.as_f64() / totals.total_expenses.as_f64() * 100.0
            };
            writeln!(
                out,
                "  {:<14} {:>12}  {share:>5.1}%",
                entry.category,
                format_inr(entry.total)
            )?;
        }
    }

    if !state.budgets.is_empty() {
        writeln!(out)?;
        writeln!(out, "Budget Progress")?;
        for budget in &state.budgets {
            writeln!(
                out,
                "  {:<14} {:>10} / {:<10} {:>5.1}%",
                budget.category,
                format_inr(budget.spent),
                format_inr(budget.limit),
                budget_progress(budget)
            )?;
        }
    }

    Ok(())
}
