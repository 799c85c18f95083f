use async_trait::async_trait;
use datafusion::arrow::array::{ArrayRef, new_empty_array};
use datafusion::arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use datafusion::arrow::record_batch::RecordBatch;
use datafusion::datasource::MemTable;
use datafusion::prelude::SessionContext;
use datafusion::scalar::ScalarValue;
use std::collections::BTreeMap;
use std::sync::Arc;

use super::{BindError, SourceBinder, SourceTable};

// ---------- schemas ----------

fn fields(columns: &[(&str, DataType)]) -> SchemaRef {
    Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, data_type)| Field::new(*name, data_type.clone(), true))
            .collect::<Vec<_>>(),
    ))
}

/// Arrow schema of a source table as the SQLite loader exposes it:
/// integer keys, REAL measures, TEXT for everything else (dates included).
pub fn tpch_schema(table: SourceTable) -> SchemaRef {
    use DataType::{Float64 as F, Int64 as I, Utf8 as S};
    match table {
        SourceTable::LineItem => fields(&[
            ("l_orderkey", I),
            ("l_partkey", I),
            ("l_suppkey", I),
            ("l_linenumber", I),
            ("l_quantity", F),
            ("l_extendedprice", F),
            ("l_discount", F),
            ("l_tax", F),
            ("l_returnflag", S),
            ("l_linestatus", S),
            ("l_shipdate", S),
            ("l_commitdate", S),
            ("l_receiptdate", S),
            ("l_shipinstruct", S),
            ("l_shipmode", S),
            ("l_comment", S),
        ]),
        SourceTable::Orders => fields(&[
            ("o_orderkey", I),
            ("o_custkey", I),
            ("o_orderstatus", S),
            ("o_totalprice", F),
            ("o_orderdate", S),
            ("o_orderpriority", S),
            ("o_clerk", S),
            ("o_shippriority", I),
            ("o_comment", S),
        ]),
        SourceTable::Customer => fields(&[
            ("c_custkey", I),
            ("c_name", S),
            ("c_address", S),
            ("c_nationkey", I),
            ("c_phone", S),
            ("c_acctbal", F),
            ("c_mktsegment", S),
            ("c_comment", S),
        ]),
        SourceTable::Nation => fields(&[
            ("n_nationkey", I),
            ("n_name", S),
            ("n_regionkey", I),
            ("n_comment", S),
        ]),
        SourceTable::Region => fields(&[("r_regionkey", I), ("r_name", S), ("r_comment", S)]),
        SourceTable::Part => fields(&[
            ("p_partkey", I),
            ("p_name", S),
            ("p_mfgr", S),
            ("p_brand", S),
            ("p_type", S),
            ("p_size", I),
            ("p_container", S),
            ("p_retailprice", F),
            ("p_comment", S),
        ]),
        SourceTable::Supplier => fields(&[
            ("s_suppkey", I),
            ("s_name", S),
            ("s_address", S),
            ("s_nationkey", I),
            ("s_phone", S),
            ("s_acctbal", F),
            ("s_comment", S),
        ]),
        SourceTable::PartSupp => fields(&[
            ("ps_partkey", I),
            ("ps_suppkey", I),
            ("ps_availqty", I),
            ("ps_supplycost", F),
            ("ps_comment", S),
        ]),
    }
}

// ---------- in-memory source ----------

type Row = Vec<(String, ScalarValue)>;

/// In-memory source: rows are registered as DataFusion `MemTable`s.
///
/// Columns omitted from a row are null; values are cast to the column type,
/// so `ScalarValue::from(5)` fills an `Int64` or `Float64` column alike.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    rows: BTreeMap<SourceTable, Vec<Row>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_row<'a>(
        mut self,
        table: SourceTable,
        row: impl IntoIterator<Item = (&'a str, ScalarValue)>,
    ) -> Self {
        self.rows
            .entry(table)
            .or_default()
            .push(row.into_iter().map(|(k, v)| (k.to_string(), v)).collect());
        self
    }

    pub fn row_count(&self, table: SourceTable) -> usize {
        self.rows.get(&table).map_or(0, Vec::len)
    }

    /// Build the record batch for one table (None when the table has no rows).
    pub fn batch(&self, table: SourceTable) -> Result<Option<RecordBatch>, BindError> {
        let schema = tpch_schema(table);
        let rows = match self.rows.get(&table) {
            Some(rows) if !rows.is_empty() => rows,
            _ => return Ok(None),
        };

        for row in rows {
            if let Some((name, _)) = row.iter().find(|(name, _)| schema.index_of(name).is_err()) {
                return Err(BindError::Register(format!(
                    "{table}: unknown column '{name}'"
                )));
            }
        }

        let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
        for field in schema.fields() {
            let data_type = field.data_type();
            let values = rows
                .iter()
                .map(|row| {
                    let value = row
                        .iter()
                        .rev()
                        .find(|(name, _)| name == field.name())
                        .map(|(_, v)| v.clone())
                        .unwrap_or(ScalarValue::Null);
                    value.cast_to(data_type)
                })
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| BindError::Register(format!("{table}.{}: {e}", field.name())))?;

            let array = if values.is_empty() {
                new_empty_array(data_type)
            } else {
                ScalarValue::iter_to_array(values)
                    .map_err(|e| BindError::Register(format!("{table}.{}: {e}", field.name())))?
            };
            columns.push(array);
        }

        RecordBatch::try_new(schema, columns)
            .map(Some)
            .map_err(|e| BindError::Register(format!("{table}: {e}")))
    }
}

#[async_trait]
impl SourceBinder for MemorySource {
    fn describe(&self) -> String {
        let total: usize = self.rows.values().map(Vec::len).sum();
        format!("memory ({total} rows)")
    }

    async fn bind(&self, ctx: &SessionContext) -> Result<Vec<String>, BindError> {
        let mut registered = Vec::with_capacity(SourceTable::ALL.len());
        for table in SourceTable::ALL {
            let partition = self.batch(table)?.into_iter().collect::<Vec<_>>();
            let mem_table = MemTable::try_new(tpch_schema(table), vec![partition])
                .map_err(|e| BindError::Register(format!("{table}: {e}")))?;
            ctx.register_table(table.name(), Arc::new(mem_table))
                .map_err(|e| BindError::Register(format!("{table}: {e}")))?;
            tracing::debug!(table = %table, rows = self.row_count(table), "Registered in-memory table");
            registered.push(table.name().to_string());
        }
        Ok(registered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datafusion::arrow::array::Array;

    #[tokio::test]
    async fn bind_registers_every_table() {
        let ctx = SessionContext::new();
        let tables = MemorySource::new().bind(&ctx).await.unwrap();

        assert_eq!(tables.len(), SourceTable::ALL.len());
        for table in SourceTable::ALL {
            assert!(ctx.table_exist(table.name()).unwrap(), "{table} not registered");
        }

        let count = ctx.table("lineitem").await.unwrap().count().await.unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn omitted_columns_are_null_and_values_are_cast() {
        let source = MemorySource::new().with_row(
            SourceTable::LineItem,
            [("l_orderkey", ScalarValue::from(7)), ("l_quantity", ScalarValue::from(3))],
        );
        let batch = source.batch(SourceTable::LineItem).unwrap().unwrap();

        assert_eq!(batch.num_rows(), 1);
        let quantity = batch.column_by_name("l_quantity").unwrap();
        assert_eq!(quantity.data_type(), &DataType::Float64);
        assert_eq!(ScalarValue::try_from_array(quantity, 0).unwrap(), ScalarValue::Float64(Some(3.0)));
        assert!(batch.column_by_name("l_comment").unwrap().is_null(0));
    }

    #[test]
    fn unknown_column_is_rejected() {
        let source = MemorySource::new()
            .with_row(SourceTable::Part, [("p_colour", ScalarValue::from("red"))]);
        let err = source.batch(SourceTable::Part).unwrap_err();
        assert!(err.to_string().contains("p_colour"), "got: {err}");
    }

    #[test]
    fn every_table_keys_on_integers() {
        for table in SourceTable::ALL {
            let schema = tpch_schema(table);
            assert_eq!(schema.field(0).data_type(), &DataType::Int64, "{table}");
        }
    }
}
