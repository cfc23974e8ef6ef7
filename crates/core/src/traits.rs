//! Capability interfaces for the external collaborators that feed the
//! engines. Implementations (live brokers, demo mode) live outside this
//! workspace; the engines depend only on these traits.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::contract::{OptionContract, OptionQuote};
use crate::position::Portfolio;
use crate::series::PriceSeries;

#[async_trait]
pub trait BrokerSource: Send + Sync {
    async fn connect(&mut self) -> Result<()>;
    async fn get_portfolio(&self) -> Result<Portfolio>;
    async fn get_quotes(
        &self,
        symbol: &str,
        expiry: NaiveDate,
    ) -> Result<Vec<(OptionContract, OptionQuote)>>;
}

#[async_trait]
pub trait BenchmarkSource: Send + Sync {
    async fn get_history(&self, symbol: &str, days: usize) -> Result<PriceSeries>;
}
