//! YAML-backed test configuration with environment variable overrides.

mod environment;
mod parameters;
mod shop;
mod test_config;
mod value;

pub use environment::{EnvironmentSource, override_var_name};
pub use parameters::Parameters;
pub use shop::{
    BASE_SHOP_ID, SHOP_CONFIG_FILE, ShopEdition, ShopId, VERSION_DEFINE_FILE, detect_edition,
    read_config_shop_url,
};
pub use test_config::{
    CONFIG_FILE_NAME, TEST_SUITE_VAR, TestConfig, TestConfigOptions, discover_vendor_path,
};
pub use value::ConfigValue;
