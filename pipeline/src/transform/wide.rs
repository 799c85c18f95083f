//! Wide relation: every line item left-joined to its order, customer, part,
//! supplier and part-supply rows, with nation/region resolved on both sides.

/// One LEFT JOIN step of the wide relation.
#[derive(Debug, Clone, Copy)]
pub struct Join {
    pub table: &'static str,
    pub alias: &'static str,
    pub on: &'static str,
}

/// Join chain anchored on `lineitem l`. Order matters: later joins reference
/// aliases introduced by earlier ones.
pub const JOINS: &[Join] = &[
    Join { table: "orders", alias: "o", on: "l.l_orderkey = o.o_orderkey" },
    Join { table: "customer", alias: "c", on: "o.o_custkey = c.c_custkey" },
    Join { table: "nation", alias: "n_cust", on: "c.c_nationkey = n_cust.n_nationkey" },
    Join { table: "region", alias: "r_cust", on: "n_cust.n_regionkey = r_cust.r_regionkey" },
    Join { table: "part", alias: "p", on: "l.l_partkey = p.p_partkey" },
    Join { table: "supplier", alias: "s", on: "l.l_suppkey = s.s_suppkey" },
    Join { table: "nation", alias: "n_supp", on: "s.s_nationkey = n_supp.n_nationkey" },
    Join { table: "region", alias: "r_supp", on: "n_supp.n_regionkey = r_supp.r_regionkey" },
    Join {
        table: "partsupp",
        alias: "ps",
        on: "l.l_partkey = ps.ps_partkey AND l.l_suppkey = ps.ps_suppkey",
    },
];

/// Columns projected on top of `l.*`: (source column, output name).
/// Nation and region appear once per side, so both get side-specific names.
pub const PROJECTION: &[(&str, &str)] = &[
    ("o.o_orderkey", "o_orderkey"),
    ("o.o_orderstatus", "o_orderstatus"),
    ("o.o_totalprice", "o_totalprice"),
    ("o.o_orderdate", "o_orderdate"),
    ("o.o_orderpriority", "o_orderpriority"),
    ("o.o_clerk", "o_clerk"),
    ("o.o_shippriority", "o_shippriority"),
    ("o.o_comment", "order_comment"),
    ("c.c_name", "customer_name"),
    ("c.c_address", "customer_address"),
    ("c.c_phone", "customer_phone"),
    ("c.c_acctbal", "customer_acctbal"),
    ("c.c_mktsegment", "customer_mktsegment"),
    ("c.c_comment", "customer_comment"),
    ("n_cust.n_name", "customer_nation_name"),
    ("n_cust.n_regionkey", "customer_nation_regionkey"),
    ("n_cust.n_comment", "customer_nation_comment"),
    ("r_cust.r_name", "customer_region_name"),
    ("r_cust.r_comment", "customer_region_comment"),
    ("p.p_name", "part_name"),
    ("p.p_mfgr", "part_mfgr"),
    ("p.p_brand", "part_brand"),
    ("p.p_type", "part_type"),
    ("p.p_size", "part_size"),
    ("p.p_container", "part_container"),
    ("p.p_retailprice", "part_retailprice"),
    ("p.p_comment", "part_comment"),
    ("s.s_name", "supplier_name"),
    ("s.s_address", "supplier_address"),
    ("s.s_phone", "supplier_phone"),
    ("s.s_acctbal", "supplier_acctbal"),
    ("s.s_comment", "supplier_comment"),
    ("n_supp.n_name", "supplier_nation_name"),
    ("n_supp.n_regionkey", "supplier_nation_regionkey"),
    ("n_supp.n_comment", "supplier_nation_comment"),
    ("r_supp.r_name", "supplier_region_name"),
    ("r_supp.r_comment", "supplier_region_comment"),
    ("ps.ps_availqty", "ps_availqty"),
    ("ps.ps_supplycost", "ps_supplycost"),
    ("ps.ps_comment", "partsupp_comment"),
];

pub fn wide_relation_sql() -> String {
    let mut sql = String::from("SELECT l.*");
    for (source, output) in PROJECTION {
        sql.push_str(",\n    ");
        sql.push_str(source);
        sql.push_str(" AS ");
        sql.push_str(output);
    }
    sql.push_str("\nFROM lineitem l");
    for join in JOINS {
        sql.push_str(&format!(
            "\nLEFT JOIN {} {} ON {}",
            join.table, join.alias, join.on
        ));
    }
    sql
}
