//! Shared AWS SDK configuration

use aws_config::{BehaviorVersion, Region};
use mediaquery_core::Config;

/// Load the SDK configuration from the default provider chain, with the region
/// overridden by `AWS_REGION` when set.
pub async fn load_sdk_config(config: &Config) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = &config.aws_region {
        loader = loader.region(Region::new(region.clone()));
    }
    loader.load().await
}
