pub mod config;
pub mod consts;
pub mod error;
pub mod history;
pub mod metric;
pub mod param;
pub mod plugin;
pub mod profile;
pub mod registry;
pub mod report;
pub mod request;
pub mod search;
pub mod space;

pub use config::{Strategy, TunerConfig};
pub use error::{TunerError, TunerResult};
pub use plugin::{TunerPlugin, TuningContext, POLICY_EVENT};
pub use profile::{Profile, ProfileSource, ProfileStore};
pub use request::{EventContext, EventId};
pub use space::ParameterSpace;
