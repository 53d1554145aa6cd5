pub mod config;
pub mod conversion;
pub mod converter;
pub mod format;
pub mod metrics;
pub mod store;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError,
};
pub use conversion::{ConversionService, Download, ServiceError};
pub use converter::{Converter, ConverterConfig, FfmpegConverter};
pub use format::{Format, MediaType};
pub use store::{FileStore, SessionStore, SqliteStore, StoreError};
