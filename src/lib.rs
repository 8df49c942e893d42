//! filmdesk
//!
//! Client core for the film production dashboard's resource screens:
//! remote collections, search and filters, forms and toasts.

pub mod api;
pub mod bid_request;
pub mod config;
pub mod context;
pub mod domain;
pub mod filter;
pub mod form;
pub mod notify;
pub mod resources;
pub mod screen;
pub mod store;

use std::path::Path;

pub use api::{AuthClient, HttpCollection, MemoryBackend, RemoteCollection, ReqwestTransport, Transport};
pub use bid_request::{BidRequestForm, EstimatedDuration, RequiredRole};
pub use config::{ClientConfig, ConfigError};
pub use context::Session;
pub use domain::{ClientError, ClientResult, FieldMap, FieldValue, Record, RecordId, ResourceSchema};
pub use filter::Query;
pub use form::{FieldIssue, FormController, FormError, FormMode};
pub use notify::{Notice, NoticeKey, NoticeLevel, NotificationSink, Operation, ToastBoard};
pub use screen::ResourceScreen;
pub use store::{CollectionStore, Confirm, RemoveOutcome};

pub use rolling_logger::{LoggerError, LoggerHandle};

/// Log file name prefix
pub const APP_NAME: &str = "filmdesk";

/// Route `log` output into rolling files under `dir`. Call once at startup.
pub fn init_logging(dir: impl AsRef<Path>) -> Result<LoggerHandle, LoggerError> {
    let handle = rolling_logger::init_logger(dir, APP_NAME)?;
    log::info!("{} {} logging to {}", APP_NAME, env!("CARGO_PKG_VERSION"), handle.active_file().display());
    Ok(handle)
}
