//! Report query catalog
//!
//! Every report is a fixed, parameterized statement. Optional filters select
//! a distinct statement rather than splicing text, so caller values only
//! ever travel as bound parameters.

use crate::backend::Dialect;
use crate::error::{DbError, Result};
use crate::schema::{TABLES, TableInfo};
use crate::types::SqlParam;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default row count for the top-customers report
pub const DEFAULT_TOP_CUSTOMERS: i64 = 10;
/// Largest accepted top-customers limit
pub const MAX_LIMIT: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Text,
    Integer,
}

/// A positional parameter a report expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSlot {
    pub name: &'static str,
    pub kind: ParamKind,
    /// Value bound when the caller supplies none
    pub default: Option<i64>,
}

impl ParamSlot {
    const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Text,
            default: None,
        }
    }

    const fn integer(name: &'static str, default: i64) -> Self {
        Self {
            name,
            kind: ParamKind::Integer,
            default: Some(default),
        }
    }
}

/// A named report statement for one dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySpec {
    pub name: &'static str,
    pub description: &'static str,
    pub sql: &'static str,
    pub params: &'static [ParamSlot],
}

/// A statement with its parameters bound, ready for the executor
#[derive(Debug, Clone, PartialEq)]
pub struct BoundQuery {
    pub report: &'static str,
    pub sql: &'static str,
    pub params: Vec<SqlParam>,
}

impl QuerySpec {
    /// Number of `?` placeholders outside string literals
    pub fn placeholder_count(&self) -> usize {
        let mut in_literal = false;
        let mut count = 0;
        for c in self.sql.chars() {
            match c {
                '\'' => in_literal = !in_literal,
                '?' if !in_literal => count += 1,
                _ => {}
            }
        }
        count
    }

    /// Bind one optional value per slot, in slot order. Missing values take
    /// the slot default.
    pub fn bind(&self, args: Vec<Option<SqlParam>>) -> Result<BoundQuery> {
        if args.len() != self.params.len() {
            return Err(DbError::parameter_mismatch(
                self.name,
                format!("expected {} parameter(s), got {}", self.params.len(), args.len()),
            ));
        }

        let params = self
            .params
            .iter()
            .zip(args)
            .map(|(slot, arg)| match (arg, slot.kind) {
                (Some(value @ SqlParam::Text(_)), ParamKind::Text)
                | (Some(value @ SqlParam::Int(_)), ParamKind::Integer) => Ok(value),
                (Some(value), kind) => Err(DbError::parameter_mismatch(
                    self.name,
                    format!("'{}' expects {:?}, got {:?}", slot.name, kind, value),
                )),
                (None, _) => slot.default.map(SqlParam::Int).ok_or_else(|| {
                    DbError::parameter_mismatch(self.name, format!("missing value for '{}'", slot.name))
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BoundQuery {
            report: self.name,
            sql: self.sql,
            params,
        })
    }
}

/// Time bucket for the sales-over-time report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Month,
    Quarter,
}

impl FromStr for Period {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "month" => Ok(Period::Month),
            "quarter" => Ok(Period::Quarter),
            other => Err(DbError::parameter_mismatch(
                "sales_over_time",
                format!("period_type must be 'month' or 'quarter', got '{other}'"),
            )),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Month => f.write_str("month"),
            Period::Quarter => f.write_str("quarter"),
        }
    }
}

/// A report invocation with its already-validated inputs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportRequest {
    SalesByRegion { region_name: Option<String> },
    SalesByCategory,
    SalesByChannel,
    TopCustomers { limit: Option<i64> },
    ProductPerformance,
    ProductSales { product_category: Option<String> },
    CustomerSales { customer_type: Option<String> },
    SalesOverTime { period: Period },
}

impl ReportRequest {
    /// Name of the catalog entry this request resolves to
    pub fn report_name(&self) -> &'static str {
        match self {
            ReportRequest::SalesByRegion { region_name: None } => "sales_by_region",
            ReportRequest::SalesByRegion { .. } => "sales_by_region_filtered",
            ReportRequest::SalesByCategory => "sales_by_category",
            ReportRequest::SalesByChannel => "sales_by_channel",
            ReportRequest::TopCustomers { .. } => "top_customers",
            ReportRequest::ProductPerformance => "product_performance",
            ReportRequest::ProductSales {
                product_category: None,
            } => "product_sales",
            ReportRequest::ProductSales { .. } => "product_sales_filtered",
            ReportRequest::CustomerSales {
                customer_type: None,
            } => "customer_sales",
            ReportRequest::CustomerSales { .. } => "customer_sales_filtered",
            ReportRequest::SalesOverTime {
                period: Period::Month,
            } => "sales_over_time_month",
            ReportRequest::SalesOverTime {
                period: Period::Quarter,
            } => "sales_over_time_quarter",
        }
    }

    fn args(&self) -> Vec<Option<SqlParam>> {
        match self {
            ReportRequest::SalesByRegion {
                region_name: Some(value),
            }
            | ReportRequest::ProductSales {
                product_category: Some(value),
            }
            | ReportRequest::CustomerSales {
                customer_type: Some(value),
            } => vec![Some(SqlParam::Text(value.clone()))],
            ReportRequest::TopCustomers { limit } => vec![limit.map(SqlParam::Int)],
            _ => Vec::new(),
        }
    }
}

/// A tool-facing description of one report family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionInfo {
    pub name: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "no_parameters")]
    pub parameters: &'static [&'static str],
}

fn no_parameters(parameters: &&'static [&'static str]) -> bool {
    parameters.is_empty()
}

/// Schema and report summary handed to agents as context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatabaseInfo {
    pub tables: &'static [TableInfo],
    pub functions: &'static [FunctionInfo],
}

const FUNCTIONS: &[FunctionInfo] = &[
    FunctionInfo {
        name: "get_sales_by_region",
        description: "Get sales data grouped by region or for a specific region",
        parameters: &["region_name (optional)"],
    },
    FunctionInfo {
        name: "get_sales_by_category",
        description: "Get sales data grouped by product category",
        parameters: &[],
    },
    FunctionInfo {
        name: "get_sales_by_channel",
        description: "Get sales data grouped by sales channel",
        parameters: &[],
    },
    FunctionInfo {
        name: "get_top_customers",
        description: "Get top customers by total spend",
        parameters: &["limit (optional, default: 10)"],
    },
    FunctionInfo {
        name: "get_product_performance",
        description: "Get performance metrics for all products",
        parameters: &[],
    },
    FunctionInfo {
        name: "get_product_sales",
        description: "Get sales data per product, optionally for one product category",
        parameters: &["product_category (optional)"],
    },
    FunctionInfo {
        name: "get_customer_sales",
        description: "Get sales data grouped by customer type, or for one customer type",
        parameters: &["customer_type (optional)"],
    },
    FunctionInfo {
        name: "get_sales_over_time",
        description: "Get sales totals per month or per quarter",
        parameters: &["period_type (optional, 'month' or 'quarter', default: 'month')"],
    },
];

/// The fixed set of report statements for one dialect
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    dialect: Dialect,
    specs: &'static [QuerySpec],
}

impl Catalog {
    pub fn new(dialect: Dialect) -> Self {
        let specs = match dialect {
            Dialect::SqlServer => SQL_SERVER_REPORTS,
            Dialect::Sqlite => SQLITE_REPORTS,
        };
        Self { dialect, specs }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn get(&self, name: &str) -> Result<&'static QuerySpec> {
        self.specs
            .iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| DbError::UnknownReport(name.to_string()))
    }

    pub fn reports(&self) -> &'static [QuerySpec] {
        self.specs
    }

    /// Resolve a request to its statement and bind its arguments.
    pub fn plan(&self, request: &ReportRequest) -> Result<BoundQuery> {
        if let ReportRequest::TopCustomers { limit: Some(limit) } = request {
            if !(1..=MAX_LIMIT).contains(limit) {
                return Err(DbError::parameter_mismatch(
                    "top_customers",
                    format!("limit must be between 1 and {MAX_LIMIT}, got {limit}"),
                ));
            }
        }
        self.get(request.report_name())?.bind(request.args())
    }

    /// Schema and report summary
    pub fn describe(&self) -> DatabaseInfo {
        DatabaseInfo {
            tables: TABLES,
            functions: FUNCTIONS,
        }
    }
}

const REGION_FILTER: &[ParamSlot] = &[ParamSlot::text("region_name")];
const CATEGORY_FILTER: &[ParamSlot] = &[ParamSlot::text("product_category")];
const CUSTOMER_TYPE_FILTER: &[ParamSlot] = &[ParamSlot::text("customer_type")];
const TOP_LIMIT: &[ParamSlot] = &[ParamSlot::integer("limit", DEFAULT_TOP_CUSTOMERS)];

const SALES_BY_REGION: &str = "
SELECT
    r.RegionName,
    CAST(SUM(s.TotalAmount) AS FLOAT) AS TotalSales,
    COUNT(DISTINCT s.SalesID) AS NumberOfTransactions,
    SUM(s.UnitsSold) AS TotalUnitsSold
FROM SalesData s
    JOIN Customers c ON s.CustomerID = c.CustomerID
    JOIN SalesRegions r ON c.RegionID = r.RegionID
GROUP BY r.RegionName
ORDER BY TotalSales DESC";

const SALES_BY_REGION_FILTERED: &str = "
SELECT
    r.RegionName,
    CAST(SUM(s.TotalAmount) AS FLOAT) AS TotalSales,
    COUNT(DISTINCT s.SalesID) AS NumberOfTransactions,
    SUM(s.UnitsSold) AS TotalUnitsSold
FROM SalesData s
    JOIN Customers c ON s.CustomerID = c.CustomerID
    JOIN SalesRegions r ON c.RegionID = r.RegionID
WHERE r.RegionName = ?
GROUP BY r.RegionName";

const SALES_BY_CATEGORY: &str = "
SELECT
    p.ProductCategory,
    COUNT(DISTINCT s.SalesID) AS TotalOrders,
    SUM(s.UnitsSold) AS TotalUnitsSold,
    CAST(SUM(s.TotalAmount) AS FLOAT) AS TotalRevenue
FROM SalesData s
    JOIN Products p ON s.ProductID = p.ProductID
GROUP BY p.ProductCategory
ORDER BY TotalRevenue DESC";

const SALES_BY_CHANNEL: &str = "
SELECT
    s.SalesChannel,
    COUNT(DISTINCT s.SalesID) AS TotalOrders,
    SUM(s.UnitsSold) AS TotalUnitsSold,
    CAST(SUM(s.TotalAmount) AS FLOAT) AS TotalRevenue
FROM SalesData s
GROUP BY s.SalesChannel
ORDER BY TotalRevenue DESC";

const TOP_CUSTOMERS_MSSQL: &str = "
SELECT
    c.CustomerName,
    c.CustomerType,
    r.RegionName,
    c.Country,
    COUNT(DISTINCT s.SalesID) AS TotalOrders,
    CAST(SUM(s.TotalAmount) AS FLOAT) AS TotalSpent
FROM Customers c
    JOIN SalesData s ON c.CustomerID = s.CustomerID
    JOIN SalesRegions r ON c.RegionID = r.RegionID
GROUP BY c.CustomerName, c.CustomerType, r.RegionName, c.Country
ORDER BY TotalSpent DESC
OFFSET 0 ROWS
FETCH NEXT ? ROWS ONLY";

const TOP_CUSTOMERS_SQLITE: &str = "
SELECT
    c.CustomerName,
    c.CustomerType,
    r.RegionName,
    c.Country,
    COUNT(DISTINCT s.SalesID) AS TotalOrders,
    CAST(SUM(s.TotalAmount) AS FLOAT) AS TotalSpent
FROM Customers c
    JOIN SalesData s ON c.CustomerID = s.CustomerID
    JOIN SalesRegions r ON c.RegionID = r.RegionID
GROUP BY c.CustomerName, c.CustomerType, r.RegionName, c.Country
ORDER BY TotalSpent DESC
LIMIT ?";

const PRODUCT_PERFORMANCE: &str = "
SELECT
    p.ProductName,
    p.ProductCategory,
    p.ProductLine,
    COUNT(DISTINCT s.SalesID) AS TotalOrders,
    SUM(s.UnitsSold) AS TotalUnitsSold,
    CAST(SUM(s.TotalAmount) AS FLOAT) AS TotalRevenue,
    CAST(AVG(s.TotalAmount) AS FLOAT) AS AverageOrderValue
FROM Products p
    JOIN SalesData s ON p.ProductID = s.ProductID
GROUP BY p.ProductName, p.ProductCategory, p.ProductLine
ORDER BY TotalRevenue DESC";

const PRODUCT_SALES: &str = "
SELECT
    p.ProductName,
    p.ProductCategory,
    COUNT(DISTINCT s.SalesID) AS TotalOrders,
    SUM(s.UnitsSold) AS TotalUnitsSold,
    CAST(SUM(s.TotalAmount) AS FLOAT) AS TotalRevenue
FROM SalesData s
    JOIN Products p ON s.ProductID = p.ProductID
GROUP BY p.ProductName, p.ProductCategory
ORDER BY TotalRevenue DESC";

const PRODUCT_SALES_FILTERED: &str = "
SELECT
    p.ProductName,
    p.ProductCategory,
    COUNT(DISTINCT s.SalesID) AS TotalOrders,
    SUM(s.UnitsSold) AS TotalUnitsSold,
    CAST(SUM(s.TotalAmount) AS FLOAT) AS TotalRevenue
FROM SalesData s
    JOIN Products p ON s.ProductID = p.ProductID
WHERE p.ProductCategory = ?
GROUP BY p.ProductName, p.ProductCategory
ORDER BY TotalRevenue DESC";

const CUSTOMER_SALES: &str = "
SELECT
    c.CustomerType,
    COUNT(DISTINCT c.CustomerID) AS CustomerCount,
    COUNT(DISTINCT s.SalesID) AS TotalOrders,
    CAST(SUM(s.TotalAmount) AS FLOAT) AS TotalRevenue
FROM SalesData s
    JOIN Customers c ON s.CustomerID = c.CustomerID
GROUP BY c.CustomerType
ORDER BY TotalRevenue DESC";

const CUSTOMER_SALES_FILTERED: &str = "
SELECT
    c.CustomerType,
    COUNT(DISTINCT c.CustomerID) AS CustomerCount,
    COUNT(DISTINCT s.SalesID) AS TotalOrders,
    CAST(SUM(s.TotalAmount) AS FLOAT) AS TotalRevenue
FROM SalesData s
    JOIN Customers c ON s.CustomerID = c.CustomerID
WHERE c.CustomerType = ?
GROUP BY c.CustomerType";

const SALES_BY_MONTH_MSSQL: &str = "
SELECT
    FORMAT(s.SalesDate, 'yyyy-MM') AS Period,
    COUNT(DISTINCT s.SalesID) AS TotalOrders,
    SUM(s.UnitsSold) AS TotalUnitsSold,
    CAST(SUM(s.TotalAmount) AS FLOAT) AS TotalRevenue
FROM SalesData s
GROUP BY FORMAT(s.SalesDate, 'yyyy-MM')
ORDER BY Period";

const SALES_BY_QUARTER_MSSQL: &str = "
SELECT
    CONCAT(YEAR(s.SalesDate), '-Q', DATEPART(QUARTER, s.SalesDate)) AS Period,
    COUNT(DISTINCT s.SalesID) AS TotalOrders,
    SUM(s.UnitsSold) AS TotalUnitsSold,
    CAST(SUM(s.TotalAmount) AS FLOAT) AS TotalRevenue
FROM SalesData s
GROUP BY YEAR(s.SalesDate), DATEPART(QUARTER, s.SalesDate)
ORDER BY YEAR(s.SalesDate), DATEPART(QUARTER, s.SalesDate)";

const SALES_BY_MONTH_SQLITE: &str = "
SELECT
    strftime('%Y-%m', s.SalesDate) AS Period,
    COUNT(DISTINCT s.SalesID) AS TotalOrders,
    SUM(s.UnitsSold) AS TotalUnitsSold,
    CAST(SUM(s.TotalAmount) AS FLOAT) AS TotalRevenue
FROM SalesData s
GROUP BY Period
ORDER BY Period";

const SALES_BY_QUARTER_SQLITE: &str = "
SELECT
    strftime('%Y', s.SalesDate) || '-Q' || ((CAST(strftime('%m', s.SalesDate) AS INTEGER) + 2) / 3) AS Period,
    COUNT(DISTINCT s.SalesID) AS TotalOrders,
    SUM(s.UnitsSold) AS TotalUnitsSold,
    CAST(SUM(s.TotalAmount) AS FLOAT) AS TotalRevenue
FROM SalesData s
GROUP BY Period
ORDER BY Period";

macro_rules! report_set {
    (top_customers: $top:expr, by_month: $month:expr, by_quarter: $quarter:expr $(,)?) => {
        &[
            QuerySpec {
                name: "sales_by_region",
                description: "Sales totals per region",
                sql: SALES_BY_REGION,
                params: &[],
            },
            QuerySpec {
                name: "sales_by_region_filtered",
                description: "Sales totals for one region",
                sql: SALES_BY_REGION_FILTERED,
                params: REGION_FILTER,
            },
            QuerySpec {
                name: "sales_by_category",
                description: "Sales totals per product category",
                sql: SALES_BY_CATEGORY,
                params: &[],
            },
            QuerySpec {
                name: "sales_by_channel",
                description: "Sales totals per sales channel",
                sql: SALES_BY_CHANNEL,
                params: &[],
            },
            QuerySpec {
                name: "top_customers",
                description: "Customers ranked by total spend",
                sql: $top,
                params: TOP_LIMIT,
            },
            QuerySpec {
                name: "product_performance",
                description: "Order, unit and revenue metrics per product",
                sql: PRODUCT_PERFORMANCE,
                params: &[],
            },
            QuerySpec {
                name: "product_sales",
                description: "Sales totals per product",
                sql: PRODUCT_SALES,
                params: &[],
            },
            QuerySpec {
                name: "product_sales_filtered",
                description: "Sales totals per product within one category",
                sql: PRODUCT_SALES_FILTERED,
                params: CATEGORY_FILTER,
            },
            QuerySpec {
                name: "customer_sales",
                description: "Sales totals per customer type",
                sql: CUSTOMER_SALES,
                params: &[],
            },
            QuerySpec {
                name: "customer_sales_filtered",
                description: "Sales totals for one customer type",
                sql: CUSTOMER_SALES_FILTERED,
                params: CUSTOMER_TYPE_FILTER,
            },
            QuerySpec {
                name: "sales_over_time_month",
                description: "Sales totals per calendar month",
                sql: $month,
                params: &[],
            },
            QuerySpec {
                name: "sales_over_time_quarter",
                description: "Sales totals per calendar quarter",
                sql: $quarter,
                params: &[],
            },
        ]
    };
}

static SQL_SERVER_REPORTS: &[QuerySpec] = report_set!(
    top_customers: TOP_CUSTOMERS_MSSQL,
    by_month: SALES_BY_MONTH_MSSQL,
    by_quarter: SALES_BY_QUARTER_MSSQL,
);

static SQLITE_REPORTS: &[QuerySpec] = report_set!(
    top_customers: TOP_CUSTOMERS_SQLITE,
    by_month: SALES_BY_MONTH_SQLITE,
    by_quarter: SALES_BY_QUARTER_SQLITE,
);

#[cfg(test)]
mod tests {
    use super::*;

    const DIALECTS: [Dialect; 2] = [Dialect::SqlServer, Dialect::Sqlite];

    #[test]
    fn test_placeholders_match_slots() {
        for dialect in DIALECTS {
            for spec in Catalog::new(dialect).reports() {
                assert_eq!(
                    spec.placeholder_count(),
                    spec.params.len(),
                    "{} ({:?})",
                    spec.name,
                    dialect
                );
            }
        }
    }

    #[test]
    fn test_report_names_are_unique() {
        let reports = Catalog::new(Dialect::Sqlite).reports();
        for (i, spec) in reports.iter().enumerate() {
            assert!(reports[i + 1..].iter().all(|other| other.name != spec.name));
        }
    }

    #[test]
    fn test_top_customers_defaults_to_ten() {
        let catalog = Catalog::new(Dialect::SqlServer);
        let bound = catalog.plan(&ReportRequest::TopCustomers { limit: None }).unwrap();

        assert_eq!(bound.params, vec![SqlParam::Int(10)]);
        assert!(bound.sql.contains("FETCH NEXT ? ROWS ONLY"));
    }

    #[test]
    fn test_paging_differs_by_dialect() {
        let request = ReportRequest::TopCustomers { limit: Some(3) };
        let sqlite = Catalog::new(Dialect::Sqlite).plan(&request).unwrap();

        assert!(sqlite.sql.trim_end().ends_with("LIMIT ?"));
        assert_eq!(sqlite.params, vec![SqlParam::Int(3)]);
    }

    #[test]
    fn test_filter_selects_distinct_statement() {
        let catalog = Catalog::new(Dialect::SqlServer);
        let all = catalog
            .plan(&ReportRequest::SalesByRegion { region_name: None })
            .unwrap();
        let north = catalog
            .plan(&ReportRequest::SalesByRegion {
                region_name: Some("North".into()),
            })
            .unwrap();

        assert_eq!(all.report, "sales_by_region");
        assert!(all.params.is_empty());
        assert_eq!(north.report, "sales_by_region_filtered");
        assert_eq!(north.params, vec![SqlParam::from("North")]);
        assert!(!north.sql.contains("North"));
    }

    #[test]
    fn test_limit_out_of_range_is_rejected() {
        let catalog = Catalog::new(Dialect::Sqlite);
        for limit in [0, -5, MAX_LIMIT + 1] {
            let err = catalog
                .plan(&ReportRequest::TopCustomers { limit: Some(limit) })
                .unwrap_err();
            assert!(matches!(err, DbError::ParameterMismatch { .. }));
        }
    }

    #[test]
    fn test_bind_rejects_wrong_count_and_kind() {
        let spec = Catalog::new(Dialect::Sqlite).get("sales_by_region_filtered").unwrap();

        assert!(matches!(
            spec.bind(Vec::new()),
            Err(DbError::ParameterMismatch { .. })
        ));
        assert!(matches!(
            spec.bind(vec![Some(SqlParam::Int(1))]),
            Err(DbError::ParameterMismatch { .. })
        ));
        assert!(matches!(
            spec.bind(vec![None]),
            Err(DbError::ParameterMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_report() {
        let err = Catalog::new(Dialect::Sqlite).get("sales_by_planet").unwrap_err();
        assert!(matches!(err, DbError::UnknownReport(name) if name == "sales_by_planet"));
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!("Quarter".parse::<Period>().unwrap(), Period::Quarter);
        assert!("year".parse::<Period>().is_err());
        assert_eq!(
            ReportRequest::SalesOverTime { period: Period::default() }.report_name(),
            "sales_over_time_month"
        );
    }

    #[test]
    fn test_placeholder_inside_literal_is_ignored() {
        let spec = QuerySpec {
            name: "probe",
            description: "",
            sql: "SELECT '?' AS q WHERE x = ?",
            params: &[],
        };
        assert_eq!(spec.placeholder_count(), 1);
    }

    #[test]
    fn test_describe_lists_tables_and_functions() {
        let info = serde_json::to_value(Catalog::new(Dialect::Sqlite).describe()).unwrap();
        assert_eq!(info["Tables"].as_array().unwrap().len(), 4);
        assert_eq!(info["Functions"][0]["Name"], "get_sales_by_region");
        assert!(info["Functions"][1].get("Parameters").is_none());
    }
}
