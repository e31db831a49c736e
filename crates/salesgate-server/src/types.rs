use salesgate_db::{MAX_LIMIT, Period, ReportRequest, ResultRow};
use serde::{Deserialize, Serialize};

/// Body of the reports that take no parameters: only `{}` is accepted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoParamsRequest {}

/// Body of `/sql/sales/regions`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegionSalesRequest {
    #[serde(default)]
    pub region_name: Option<String>,
}

/// Body of `/sql/customers/top`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TopCustomersRequest {
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Body of `/sql/sales/products`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSalesRequest {
    #[serde(default)]
    pub product_category: Option<String>,
}

/// Body of `/sql/sales/customers`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CustomerSalesRequest {
    #[serde(default)]
    pub customer_type: Option<String>,
}

/// Body of `/sql/sales/time-series`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SalesOverTimeRequest {
    #[serde(default)]
    pub period_type: Option<Period>,
}

/// Conversion of a decoded body into a catalog request
pub trait IntoReport {
    fn into_report(self) -> Result<ReportRequest, String>;
}

/// Blank filters mean "no filter"
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl IntoReport for RegionSalesRequest {
    fn into_report(self) -> Result<ReportRequest, String> {
        Ok(ReportRequest::SalesByRegion {
            region_name: non_blank(self.region_name),
        })
    }
}

impl IntoReport for TopCustomersRequest {
    fn into_report(self) -> Result<ReportRequest, String> {
        match self.limit {
            Some(limit) if !(1..=MAX_LIMIT).contains(&limit) => Err(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {limit}"
            )),
            limit => Ok(ReportRequest::TopCustomers { limit }),
        }
    }
}

impl IntoReport for ProductSalesRequest {
    fn into_report(self) -> Result<ReportRequest, String> {
        Ok(ReportRequest::ProductSales {
            product_category: non_blank(self.product_category),
        })
    }
}

impl IntoReport for CustomerSalesRequest {
    fn into_report(self) -> Result<ReportRequest, String> {
        Ok(ReportRequest::CustomerSales {
            customer_type: non_blank(self.customer_type),
        })
    }
}

impl IntoReport for SalesOverTimeRequest {
    fn into_report(self) -> Result<ReportRequest, String> {
        Ok(ReportRequest::SalesOverTime {
            period: self.period_type.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportsResponse {
    pub results: Vec<ResultRow>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_region_means_all_regions() {
        let request: RegionSalesRequest = serde_json::from_str(r#"{"region_name": "  "}"#).unwrap();
        assert_eq!(
            request.into_report().unwrap(),
            ReportRequest::SalesByRegion { region_name: None }
        );
    }

    #[test]
    fn test_unknown_fields_are_rejected() {
        let err = serde_json::from_str::<RegionSalesRequest>(r#"{"region": "North"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
    }

    #[test]
    fn test_no_params_request_accepts_only_empty_object() {
        assert!(serde_json::from_str::<NoParamsRequest>("{}").is_ok());

        let err = serde_json::from_str::<NoParamsRequest>(r#"{"bogus": 1}"#).unwrap_err();
        assert!(err.to_string().contains("unknown field"));
        assert!(serde_json::from_str::<NoParamsRequest>(r#""text""#).is_err());
    }

    #[test]
    fn test_limit_bounds() {
        let too_small = TopCustomersRequest { limit: Some(0) };
        assert!(too_small.into_report().is_err());

        let null: TopCustomersRequest = serde_json::from_str(r#"{"limit": null}"#).unwrap();
        assert_eq!(
            null.into_report().unwrap(),
            ReportRequest::TopCustomers { limit: None }
        );
        assert!(serde_json::from_str::<TopCustomersRequest>(r#"{"limit": "five"}"#).is_err());
    }

    #[test]
    fn test_period_defaults_to_month() {
        let request: SalesOverTimeRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(
            request.into_report().unwrap(),
            ReportRequest::SalesOverTime {
                period: Period::Month
            }
        );
        assert!(serde_json::from_str::<SalesOverTimeRequest>(r#"{"period_type": "week"}"#).is_err());
    }
}
