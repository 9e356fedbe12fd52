use super::types::ListingOrder;

pub struct FilterOrder;

impl FilterOrder {
    /// Column and direction come from closed enums, so nothing user-supplied
    /// is ever spliced into the clause.
    pub fn generate(order: &ListingOrder) -> String {
        format!("ORDER BY {} {}", order.column.to_sql(), order.direction.to_sql())
    }
}
