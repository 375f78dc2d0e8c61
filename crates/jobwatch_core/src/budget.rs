use crate::{Budget, BudgetKind};

/// Human-readable budget, e.g. `$25/hr`, `$15-$40/hr`, `$500`, `EUR 200-EUR 300`.
///
/// Zero amounts count as absent: the API reports unset hourly bounds as `0`.
pub fn format_budget(budget: Option<&Budget>) -> String {
    let Some(budget) = budget else {
        return "Budget not specified".to_string();
    };
    let prefix = currency_prefix(&budget.currency_code);
    let min = budget.min_amount.filter(|amount| *amount > 0.0);
    let max = budget.max_amount.filter(|amount| *amount > 0.0);

    let range = match (min, max) {
        (Some(min), Some(max)) if amounts_equal(min, max) => Some(format_amount(&prefix, min)),
        (Some(min), Some(max)) => Some(format!(
            "{}-{}",
            format_amount(&prefix, min),
            format_amount(&prefix, max)
        )),
        (Some(amount), None) | (None, Some(amount)) => Some(format_amount(&prefix, amount)),
        (None, None) => None,
    };

    match (budget.kind, range) {
        (BudgetKind::Hourly, Some(range)) => format!("{range}/hr"),
        (BudgetKind::Hourly, None) => "Hourly".to_string(),
        (BudgetKind::Fixed, Some(range)) => range,
        (BudgetKind::Fixed, None) => "Fixed price".to_string(),
    }
}

/// Compact client spend, e.g. `$950`, `$12K`, `$1.2M`.
pub fn format_total_spent(total_spent: Option<f64>) -> String {
    let Some(amount) = total_spent else {
        return "$0".to_string();
    };
    // Units are picked after rounding, so 999.6 reads `$1K`, not `$1000`.
    let amount = amount.max(0.0);
    let dollars = amount.round();
    if dollars < 1_000.0 {
        return format!("${}", trim_decimals(dollars, 0));
    }
    let thousands = (amount / 1_000.0).round();
    if thousands < 1_000.0 {
        return format!("${}K", trim_decimals(thousands, 0));
    }
    format!("${}M", trim_decimals(amount / 1_000_000.0, 1))
}

fn currency_prefix(code: &str) -> String {
    let code = code.trim();
    if code.is_empty() || code.eq_ignore_ascii_case("USD") {
        "$".to_string()
    } else {
        format!("{} ", code.to_ascii_uppercase())
    }
}

fn format_amount(prefix: &str, amount: f64) -> String {
    format!("{prefix}{}", trim_decimals(amount, 2))
}

fn amounts_equal(a: f64, b: f64) -> bool {
    (a - b).abs() < 0.005
}

fn trim_decimals(value: f64, places: usize) -> String {
    let text = format!("{value:.places$}");
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text
    }
}
