//! Fixed GL chart for travel expense posting.

use tripflow_travel::ExpenseCategory;

/// GL account (code, name) for an expense category.
pub fn gl_account(category: ExpenseCategory) -> (&'static str, &'static str) {
    match category {
        ExpenseCategory::Flight => ("7001", "Air Travel"),
        ExpenseCategory::Hotel => ("7002", "Lodging"),
        ExpenseCategory::Meals => ("7003", "Meals & Entertainment"),
        ExpenseCategory::GroundTransport => ("7004", "Ground Transport"),
        ExpenseCategory::Other => ("7009", "Misc Travel"),
    }
}
