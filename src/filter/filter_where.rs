use super::types::{PriceBound, SqlParam};

/// Builds the WHERE conjunction for the set price bounds, numbering
/// placeholders from `starting_param_index + 1`.
pub struct FilterWhere {
    param_values: Vec<SqlParam>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Returns an empty clause when no bound is set
    pub fn generate(bounds: &[PriceBound], starting_param_index: usize) -> (String, Vec<SqlParam>) {
        let mut filter_where = Self::new(starting_param_index);
        filter_where.build(bounds)
    }

    fn build(&mut self, bounds: &[PriceBound]) -> (String, Vec<SqlParam>) {
        let sql_conditions: Vec<String> = bounds
            .iter()
            .map(|bound| self.build_sql_condition(bound))
            .collect();
        (sql_conditions.join(" AND "), self.param_values.clone())
    }

    fn build_sql_condition(&mut self, bound: &PriceBound) -> String {
        match *bound {
            PriceBound::Min(min) => format!("c.price >= {}", self.param(SqlParam::Float(min))),
            PriceBound::Max(max) => format!("c.price <= {}", self.param(SqlParam::Float(max))),
        }
    }

    fn param(&mut self, value: SqlParam) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}
