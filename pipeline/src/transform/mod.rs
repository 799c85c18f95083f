//! The transform query: wide join → monthly aggregates → rolling windows.
//!
//! Each stage renders its own SQL from typed descriptions; this module
//! stitches them together as CTEs into the single statement the engine runs.

pub mod aggregate;
pub mod rolling;
pub mod wide;

#[cfg(test)]
pub(crate) mod testing;

pub const WIDE_RELATION: &str = "wide_lineitem";
pub const MONTHLY_METRICS: &str = "monthly_metrics";

pub fn transform_query() -> String {
    format!(
        "WITH {WIDE_RELATION} AS (\n{}\n),\n{MONTHLY_METRICS} AS (\n{}\n)\n{}",
        wide::wide_relation_sql(),
        aggregate::monthly_metrics_sql(WIDE_RELATION),
        rolling::rolling_metrics_sql(MONTHLY_METRICS),
    )
}

/// Output columns in order: the Monthly Metric Row fields, then the rolling statistics.
pub fn output_columns() -> Vec<String> {
    let mut columns = aggregate::monthly_columns();
    columns.extend(rolling::ROLLING_METRICS.iter().map(|m| m.name.to_string()));
    columns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceTable;
    use testing::*;

    #[test]
    fn output_has_group_keys_aggregates_and_windows() {
        let columns = output_columns();
        assert_eq!(columns.len(), 2 + 22 + 5);
        assert_eq!(&columns[..3], &["month", "part_name", "order_count"]);
        assert_eq!(columns.last().map(String::as_str), Some("min_tax_next_3_months"));
    }

    #[tokio::test]
    async fn result_schema_matches_output_columns() {
        let engine = crate::engine::Engine::new(1);
        engine.bind(&base_source()).await.unwrap();
        let df = engine.context().sql(&transform_query()).await.unwrap();
        let names: Vec<String> = df
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().clone())
            .collect();

        assert_eq!(names, output_columns());
        assert_eq!(df.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn ordered_by_month_then_part_without_duplicates() {
        let mut source = base_source()
            .with_row(SourceTable::Customer, customer(1, "Customer#1", 0))
            .with_row(SourceTable::Supplier, supplier(1, "Supplier#1", 0));
        for (partkey, name) in [(1, "tan"), (2, "azure"), (3, "mint")] {
            source = source.with_row(SourceTable::Part, part(partkey, name));
        }
        // (orderkey, partkey, date) in scrambled order, two line items for (tan, March)
        let items = [
            (1, 1, "1996-03-02"),
            (2, 2, "1996-01-09"),
            (3, 3, "1996-03-20"),
            (4, 1, "1996-01-30"),
            (5, 2, "1996-02-14"),
            (6, 1, "1996-03-11"),
        ];
        for (orderkey, partkey, date) in items {
            source = source
                .with_row(SourceTable::LineItem, lineitem(orderkey, partkey, 1, 1.0, 1.0, 0.0, 0.0))
                .with_row(SourceTable::Orders, order(orderkey, 1, Some(date)));
        }

        let batches = query(&source, &transform_query()).await;
        let months = i64_values(&batches, "month");
        let parts = str_values(&batches, "part_name");
        let keys: Vec<(Option<i64>, Option<String>)> = months.into_iter().zip(parts).collect();

        let expected: Vec<(Option<i64>, Option<String>)> = [
            (1, "azure"),
            (1, "tan"),
            (2, "azure"),
            (3, "mint"),
            (3, "tan"),
        ]
        .into_iter()
        .map(|(m, p)| (Some(m), Some(p.to_string())))
        .collect();
        assert_eq!(keys, expected);
        assert_eq!(i64_values(&batches, "order_count"), vec![Some(1), Some(1), Some(1), Some(1), Some(2)]);
    }
}
