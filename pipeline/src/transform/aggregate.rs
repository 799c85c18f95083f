//! Monthly aggregation of the wide relation, grouped by (month, part name).

/// Calendar month (1-12) of the order date. A null or missing order date
/// yields a null month, which forms its own group instead of dropping rows.
pub const MONTH_EXPR: &str = "CAST(EXTRACT(MONTH FROM CAST(o_orderdate AS DATE)) AS INT)";

pub const GROUP_KEY: &str = "part_name";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Sum,
    Avg,
    Min,
    Max,
}

impl Stat {
    pub const ALL: [Stat; 4] = [Stat::Sum, Stat::Avg, Stat::Min, Stat::Max];

    fn function(self) -> &'static str {
        match self {
            Stat::Sum => "SUM",
            Stat::Avg => "AVG",
            Stat::Min => "MIN",
            Stat::Max => "MAX",
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            Stat::Sum => "total",
            Stat::Avg => "avg",
            Stat::Min => "min",
            Stat::Max => "max",
        }
    }
}

/// Line item measures: (wide column, output suffix).
const MEASURES: &[(&str, &str)] = &[
    ("l_quantity", "quantity"),
    ("l_extendedprice", "extendedprice"),
    ("l_discount", "discount"),
    ("l_tax", "tax"),
];

const DISTINCT_COUNTS: &[(&str, &str)] = &[
    ("o_orderkey", "unique_orders"),
    ("customer_name", "unique_customers"),
    ("supplier_name", "unique_suppliers"),
];

const SUPPLY_TOTALS: &[(&str, &str)] = &[
    ("ps_availqty", "total_available_quantity"),
    ("ps_supplycost", "total_supply_cost"),
];

/// One aggregate column of the Monthly Metric Row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregate {
    pub name: String,
    pub expr: String,
}

impl Aggregate {
    fn new(name: impl Into<String>, expr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            expr: expr.into(),
        }
    }
}

/// Aggregates in output order: row count, the 4x4 measure statistics
/// (grouped by statistic), distinct counts, then part-supply totals.
pub fn aggregates() -> Vec<Aggregate> {
    let mut out = vec![Aggregate::new("order_count", "COUNT(*)")];
    for stat in Stat::ALL {
        for (column, suffix) in MEASURES {
            out.push(Aggregate::new(
                format!("{}_{suffix}", stat.prefix()),
                format!("{}({column})", stat.function()),
            ));
        }
    }
    for (column, name) in DISTINCT_COUNTS {
        out.push(Aggregate::new(*name, format!("COUNT(DISTINCT {column})")));
    }
    for (column, name) in SUPPLY_TOTALS {
        out.push(Aggregate::new(*name, format!("SUM({column})")));
    }
    out
}

/// Column names of the aggregated relation, group keys first.
pub fn monthly_columns() -> Vec<String> {
    let mut names = vec!["month".to_string(), GROUP_KEY.to_string()];
    names.extend(aggregates().into_iter().map(|a| a.name));
    names
}

pub fn monthly_metrics_sql(input: &str) -> String {
    let select = aggregates()
        .iter()
        .map(|a| format!("{} AS {}", a.expr, a.name))
        .collect::<Vec<_>>()
        .join(",\n    ");
    format!(
        "SELECT\n    {MONTH_EXPR} AS month,\n    {GROUP_KEY},\n    {select}\n\
         FROM {input}\n\
         GROUP BY {MONTH_EXPR}, {GROUP_KEY}"
    )
}
