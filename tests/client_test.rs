// Gateway client against a live server bound to a local port

mod common;

use salesgate_client::{ClientError, GatewayClient};
use salesgate_db::Period;
use salesgate_db::testing::REGIONS;

async fn spawn_gateway(dir: &std::path::Path) -> anyhow::Result<GatewayClient> {
    let router = common::seeded_router(dir).await?;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move { axum::serve(listener, router).await });

    Ok(GatewayClient::new(&format!("http://{addr}"), "test-subscription-key")?)
}

#[tokio::test]
async fn test_client_reads_reports() {
    let dir = tempfile::tempdir().unwrap();
    let client = spawn_gateway(dir.path()).await.unwrap();

    let regions = client.sales_by_region(None).await.unwrap();
    assert_eq!(regions.len(), REGIONS.len());

    let north = client.sales_by_region(Some("North")).await.unwrap();
    assert_eq!(north.len(), 1);
    assert_eq!(north[0].get("RegionName").and_then(|v| v.as_str()), Some("North"));

    let top = client.top_customers(Some(2)).await.unwrap();
    assert_eq!(top.len(), 2);

    assert_eq!(client.sales_by_category().await.unwrap().len(), 3);
    assert_eq!(client.sales_by_channel().await.unwrap().len(), 3);
    assert_eq!(client.product_performance().await.unwrap().len(), 5);
    assert_eq!(client.product_sales(Some("Apparel")).await.unwrap().len(), 1);
    assert_eq!(client.customer_sales(None).await.unwrap().len(), 3);
    assert_eq!(client.sales_over_time(Period::Quarter).await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_client_surfaces_error_envelope() {
    let dir = tempfile::tempdir().unwrap();
    let client = spawn_gateway(dir.path()).await.unwrap();

    let err = client.top_customers(Some(0)).await.unwrap_err();
    match err {
        ClientError::Gateway { status, error, details } => {
            assert_eq!(status, 500);
            assert_eq!(error, "Invalid request body");
            assert!(details.contains("limit"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
