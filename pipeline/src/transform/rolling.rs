use std::fmt;

use super::aggregate::GROUP_KEY;

/// Window ordering: month ascending, null months after all real months.
pub const WINDOW_ORDER: &str = "month ASC NULLS LAST";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(u32),
    CurrentRow,
    Following(u32),
}

impl fmt::Display for FrameBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameBound::UnboundedPreceding => f.write_str("UNBOUNDED PRECEDING"),
            FrameBound::Preceding(n) => write!(f, "{n} PRECEDING"),
            FrameBound::CurrentRow => f.write_str("CURRENT ROW"),
            FrameBound::Following(n) => write!(f, "{n} FOLLOWING"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowFunction {
    Avg,
    Sum,
    Min,
    Max,
}

impl fmt::Display for WindowFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WindowFunction::Avg => "AVG",
            WindowFunction::Sum => "SUM",
            WindowFunction::Min => "MIN",
            WindowFunction::Max => "MAX",
        })
    }
}

/// A rolling statistic over the monthly rows of one part, in a ROWS frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingMetric {
    pub name: &'static str,
    pub function: WindowFunction,
    pub column: &'static str,
    pub start: FrameBound,
    pub end: FrameBound,
}

impl RollingMetric {
    pub fn to_sql(&self) -> String {
        format!(
            "{}({}) OVER (PARTITION BY {GROUP_KEY} ORDER BY {WINDOW_ORDER} ROWS BETWEEN {} AND {}) AS {}",
            self.function, self.column, self.start, self.end, self.name
        )
    }
}

pub const ROLLING_METRICS: [RollingMetric; 5] = [
    RollingMetric {
        name: "avg_order_count_last_2_months",
        function: WindowFunction::Avg,
        column: "order_count",
        start: FrameBound::Preceding(1),
        end: FrameBound::CurrentRow,
    },
    RollingMetric {
        name: "avg_quantity_last_6_months",
        function: WindowFunction::Avg,
        column: "total_quantity",
        start: FrameBound::Preceding(5),
        end: FrameBound::CurrentRow,
    },
    RollingMetric {
        name: "total_extendedprice_last_4_months",
        function: WindowFunction::Sum,
        column: "total_extendedprice",
        start: FrameBound::Preceding(3),
        end: FrameBound::Following(1),
    },
    RollingMetric {
        name: "max_discount_up_to_last_4_months",
        function: WindowFunction::Max,
        column: "total_discount",
        start: FrameBound::UnboundedPreceding,
        end: FrameBound::Preceding(3),
    },
    RollingMetric {
        name: "min_tax_next_3_months",
        function: WindowFunction::Min,
        column: "total_tax",
        start: FrameBound::CurrentRow,
        end: FrameBound::Following(2),
    },
];

/// Final projection over the monthly relation, ordered by month then part.
pub fn rolling_metrics_sql(input: &str) -> String {
    let windows = ROLLING_METRICS
        .iter()
        .map(RollingMetric::to_sql)
        .collect::<Vec<_>>()
        .join(",\n    ");
    format!(
        "SELECT\n    *,\n    {windows}\nFROM {input}\n\
         ORDER BY {WINDOW_ORDER}, {GROUP_KEY} ASC NULLS LAST"
    )
}
