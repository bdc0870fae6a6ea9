//! Remote order source client
//!
//! The board never owns order data; it reads and patches orders through this
//! interface. The production implementation speaks the WooCommerce-style
//! REST API the shop runs; tests substitute an in-memory mock.

use async_trait::async_trait;
use kds_common::config::RemoteConfig;
use kds_common::orders::{Order, OrderStatus};
use serde::Serialize;
use std::time::Duration;

use crate::error::{Error, Result};

const USER_AGENT: &str = concat!("kds-board/", env!("CARGO_PKG_VERSION"));
const ORDERS_PER_PAGE: u32 = 20;

/// Read/patch access to the remote order set
#[async_trait]
pub trait OrderSource: Send + Sync {
    /// Fetch full order records matching any of the given statuses
    async fn fetch_orders(&self, statuses: &[OrderStatus]) -> Result<Vec<Order>>;

    /// Update one order's status; returns the record as stored remotely.
    ///
    /// Safe to repeat with the same arguments.
    async fn update_status(&self, order_id: i64, status: OrderStatus) -> Result<Order>;
}

/// HTTP client for the shop's order API
pub struct HttpOrderSource {
    http_client: reqwest::Client,
    base_url: String,
    consumer_key: String,
    consumer_secret: String,
}

#[derive(Serialize)]
struct StatusPatch {
    status: OrderStatus,
}

impl HttpOrderSource {
    pub fn new(config: &RemoteConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            consumer_key: config.consumer_key.clone(),
            consumer_secret: config.consumer_secret.clone(),
        })
    }

    fn orders_url(&self) -> String {
        format!("{}/wp-json/wc/v3/orders", self.base_url)
    }
}

#[async_trait]
impl OrderSource for HttpOrderSource {
    async fn fetch_orders(&self, statuses: &[OrderStatus]) -> Result<Vec<Order>> {
        let status_params: Vec<(&str, String)> = statuses
            .iter()
            .map(|s| ("status", s.to_string()))
            .collect();

        let response = self
            .http_client
            .get(self.orders_url())
            .basic_auth(&self.consumer_key, Some(&self.consumer_secret))
            .query(&status_params)
            .query(&[("per_page", ORDERS_PER_PAGE)])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote { status, body });
        }

        let orders = response
            .json::<Vec<Order>>()
            .await
            .map_err(|e| Error::Decode(e.to_string()))?;
        Ok(orders)
    }

    async fn update_status(&self, order_id: i64, status: OrderStatus) -> Result<Order> {
        let url = format!("{}/{}", self.orders_url(), order_id);

        let response = self
            .http_client
            .put(url)
            .basic_auth(&self.consumer_key, Some(&self.consumer_secret))
            .json(&StatusPatch { status })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Remote { status, body });
        }

        let order = response
            .json::<Order>()
            .await
            .map_err(|e| Error::Decode(e.to_string()))?;
        Ok(order)
    }
}
