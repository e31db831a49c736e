//! The sales schema the report catalog queries

use serde::Serialize;

/// A column as advertised to callers, e.g. `"TotalAmount: DECIMAL(15,2)"`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: &'static str,
    pub sql_type: &'static str,
}

impl Serialize for ColumnInfo {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("{}: {}", self.name, self.sql_type))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct TableInfo {
    pub name: &'static str,
    pub columns: &'static [ColumnInfo],
}

const fn col(name: &'static str, sql_type: &'static str) -> ColumnInfo {
    ColumnInfo { name, sql_type }
}

pub const TABLES: &[TableInfo] = &[
    TableInfo {
        name: "SalesRegions",
        columns: &[
            col("RegionID", "INT"),
            col("RegionName", "NVARCHAR(50)"),
            col("RegionManager", "NVARCHAR(100)"),
            col("HeadquartersLocation", "NVARCHAR(100)"),
        ],
    },
    TableInfo {
        name: "Products",
        columns: &[
            col("ProductID", "INT"),
            col("ProductName", "NVARCHAR(100)"),
            col("ProductCategory", "NVARCHAR(50)"),
            col("UnitPrice", "DECIMAL(10,2)"),
            col("ProductLine", "NVARCHAR(50)"),
            col("LaunchDate", "DATE"),
        ],
    },
    TableInfo {
        name: "Customers",
        columns: &[
            col("CustomerID", "INT"),
            col("CustomerName", "NVARCHAR(100)"),
            col("ContactName", "NVARCHAR(100)"),
            col("CustomerType", "NVARCHAR(50)"),
            col("RegionID", "INT"),
            col("Country", "NVARCHAR(50)"),
            col("City", "NVARCHAR(50)"),
        ],
    },
    TableInfo {
        name: "SalesData",
        columns: &[
            col("SalesID", "INT"),
            col("ProductID", "INT"),
            col("CustomerID", "INT"),
            col("SalesDate", "DATE"),
            col("Quantity", "INT"),
            col("UnitsSold", "INT"),
            col("TotalAmount", "DECIMAL(15,2)"),
            col("DiscountApplied", "DECIMAL(5,2)"),
            col("SalesChannel", "NVARCHAR(50)"),
            col("PromotionID", "INT"),
        ],
    },
];

/// SQLite rendition of the schema. Dates are stored as `YYYY-MM-DD` text
/// and money as REAL.
pub const SQLITE_DDL: &str = "
CREATE TABLE IF NOT EXISTS SalesRegions (
    RegionID INTEGER PRIMARY KEY,
    RegionName TEXT NOT NULL,
    RegionManager TEXT,
    HeadquartersLocation TEXT
);
CREATE TABLE IF NOT EXISTS Products (
    ProductID INTEGER PRIMARY KEY,
    ProductName TEXT NOT NULL,
    ProductCategory TEXT NOT NULL,
    UnitPrice REAL NOT NULL,
    ProductLine TEXT,
    LaunchDate TEXT
);
CREATE TABLE IF NOT EXISTS Customers (
    CustomerID INTEGER PRIMARY KEY,
    CustomerName TEXT NOT NULL,
    ContactName TEXT,
    CustomerType TEXT NOT NULL,
    RegionID INTEGER NOT NULL REFERENCES SalesRegions(RegionID),
    Country TEXT,
    City TEXT
);
CREATE TABLE IF NOT EXISTS SalesData (
    SalesID INTEGER PRIMARY KEY,
    ProductID INTEGER NOT NULL REFERENCES Products(ProductID),
    CustomerID INTEGER NOT NULL REFERENCES Customers(CustomerID),
    SalesDate TEXT NOT NULL,
    Quantity INTEGER NOT NULL,
    UnitsSold INTEGER NOT NULL,
    TotalAmount REAL NOT NULL,
    DiscountApplied REAL,
    SalesChannel TEXT NOT NULL,
    PromotionID INTEGER
);
";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_serializes_with_typed_columns() {
        let regions = serde_json::to_value(TABLES[0]).unwrap();
        assert_eq!(regions["Name"], json!("SalesRegions"));
        assert_eq!(regions["Columns"][1], json!("RegionName: NVARCHAR(50)"));
    }

    #[test]
    fn test_ddl_covers_every_table() {
        for table in TABLES {
            assert!(SQLITE_DDL.contains(&format!("CREATE TABLE IF NOT EXISTS {}", table.name)));
            for column in table.columns {
                assert!(SQLITE_DDL.contains(column.name), "{} missing", column.name);
            }
        }
    }
}
