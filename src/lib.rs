//! Park Monitor Library
//!
//! Polls a park-reservation API for a facility's availability on a target
//! weekday and raises local and remote notifications.

pub mod api;
pub mod checker;
pub mod config;
pub mod dates;
pub mod monitor;
pub mod notify;

// Re-export commonly used types
pub use api::{DailyAvailability, FetchError, ParkApiClient};
pub use checker::{AvailabilityChecker, available_dates};
pub use config::{AppConfig, DateRange};
pub use dates::{long_label, short_label, weekday_name, weekday_of};
pub use monitor::{Monitor, RunOutcome, detail_list, summary_line};
#[cfg(feature = "desktop")]
pub use notify::DesktopNotifier;
pub use notify::{
    Channel, CommandNotifier, MockNotifier, Notification, Notifier, NotifyError, NtfyNotifier,
    Urgency, build_notifiers,
};
