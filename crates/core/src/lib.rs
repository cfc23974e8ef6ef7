pub mod config;
pub mod config_loader;
pub mod contract;
pub mod error;
pub mod position;
pub mod series;
pub mod traits;

pub use config::{
    breakpoint_score, AppConfig, BubbleConfig, MonitorConfig, RiskConfig, StrategyConfig,
};
pub use config_loader::ConfigLoader;
pub use contract::{Greeks, OptionContract, OptionQuote, OptionType};
pub use error::{Error, Result};
pub use position::{Portfolio, Position};
pub use series::{annualized_vol, std_dev, PriceSeries, TRADING_DAYS_PER_YEAR};
pub use traits::{BenchmarkSource, BrokerSource};
