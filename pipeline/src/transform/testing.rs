//! Fixture rows and result accessors shared by the transform tests.

use datafusion::arrow::array::{Array, AsArray};
use datafusion::arrow::compute::cast;
use datafusion::arrow::datatypes::{DataType, Float64Type, Int64Type};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::scalar::ScalarValue;

use crate::engine::Engine;
use crate::source::memory::MemorySource;

type Row = Vec<(&'static str, ScalarValue)>;

pub(crate) fn base_source() -> MemorySource {
    MemorySource::new()
}

pub(crate) fn lineitem(
    orderkey: i64,
    partkey: i64,
    suppkey: i64,
    quantity: f64,
    extendedprice: f64,
    discount: f64,
    tax: f64,
) -> Row {
    vec![
        ("l_orderkey", orderkey.into()),
        ("l_partkey", partkey.into()),
        ("l_suppkey", suppkey.into()),
        ("l_quantity", quantity.into()),
        ("l_extendedprice", extendedprice.into()),
        ("l_discount", discount.into()),
        ("l_tax", tax.into()),
    ]
}

pub(crate) fn order(orderkey: i64, custkey: i64, orderdate: Option<&str>) -> Row {
    vec![
        ("o_orderkey", orderkey.into()),
        ("o_custkey", custkey.into()),
        ("o_orderdate", ScalarValue::Utf8(orderdate.map(str::to_string))),
    ]
}

pub(crate) fn customer(custkey: i64, name: &str, nationkey: i64) -> Row {
    vec![
        ("c_custkey", custkey.into()),
        ("c_name", name.into()),
        ("c_nationkey", nationkey.into()),
    ]
}

pub(crate) fn supplier(suppkey: i64, name: &str, nationkey: i64) -> Row {
    vec![
        ("s_suppkey", suppkey.into()),
        ("s_name", name.into()),
        ("s_nationkey", nationkey.into()),
    ]
}

pub(crate) fn nation(nationkey: i64, name: &str, regionkey: i64) -> Row {
    vec![
        ("n_nationkey", nationkey.into()),
        ("n_name", name.into()),
        ("n_regionkey", regionkey.into()),
    ]
}

pub(crate) fn region(regionkey: i64, name: &str) -> Row {
    vec![("r_regionkey", regionkey.into()), ("r_name", name.into())]
}

pub(crate) fn part(partkey: i64, name: &str) -> Row {
    vec![("p_partkey", partkey.into()), ("p_name", name.into())]
}

pub(crate) fn partsupp(partkey: i64, suppkey: i64, availqty: i64, supplycost: f64) -> Row {
    vec![
        ("ps_partkey", partkey.into()),
        ("ps_suppkey", suppkey.into()),
        ("ps_availqty", availqty.into()),
        ("ps_supplycost", supplycost.into()),
    ]
}

/// Bind `source` into a fresh engine and collect `sql`.
pub(crate) async fn query(source: &MemorySource, sql: &str) -> Vec<RecordBatch> {
    let engine = Engine::new(2);
    engine.bind(source).await.expect("bind memory source");
    engine
        .context()
        .sql(sql)
        .await
        .unwrap_or_else(|e| panic!("plan failed: {e}\n{sql}"))
        .collect()
        .await
        .unwrap_or_else(|e| panic!("execution failed: {e}\n{sql}"))
}

fn column(batches: &[RecordBatch], name: &str, to: &DataType) -> Vec<std::sync::Arc<dyn Array>> {
    batches
        .iter()
        .map(|batch| {
            let col = batch
                .column_by_name(name)
                .unwrap_or_else(|| panic!("missing column {name}"));
            cast(col, to).unwrap_or_else(|e| panic!("cannot cast {name}: {e}"))
        })
        .collect()
}

pub(crate) fn f64_values(batches: &[RecordBatch], name: &str) -> Vec<Option<f64>> {
    column(batches, name, &DataType::Float64)
        .iter()
        .flat_map(|a| a.as_primitive::<Float64Type>().iter().collect::<Vec<_>>())
        .collect()
}

pub(crate) fn i64_values(batches: &[RecordBatch], name: &str) -> Vec<Option<i64>> {
    column(batches, name, &DataType::Int64)
        .iter()
        .flat_map(|a| a.as_primitive::<Int64Type>().iter().collect::<Vec<_>>())
        .collect()
}

pub(crate) fn str_values(batches: &[RecordBatch], name: &str) -> Vec<Option<String>> {
    column(batches, name, &DataType::Utf8)
        .iter()
        .flat_map(|a| {
            a.as_string::<i32>()
                .iter()
                .map(|v| v.map(str::to_string))
                .collect::<Vec<_>>()
        })
        .collect()
}

pub(crate) fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.unwrap_or_else(|| panic!("expected {expected}, got null"));
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
