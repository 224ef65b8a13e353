//! Single-shot check: sweep, classify, notify.

use chrono::Weekday;

use crate::{
    api::FetchError,
    checker::AvailabilityChecker,
    dates::{self, weekday_name},
    notify::{Channel, Notification, Notifier, Urgency},
};

/// Result of a completed run. Fatal fetch failures are the `Err` side of
/// [`Monitor::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Available { dates: Vec<String> },
    NotAvailable,
}

impl RunOutcome {
    pub fn from_dates(dates: Vec<String>) -> Self {
        if dates.is_empty() {
            Self::NotAvailable
        } else {
            Self::Available { dates }
        }
    }

    /// Channels notified for this outcome. Local alerts only fire when
    /// something is bookable; the phone always gets a status push.
    pub fn channels(&self) -> &'static [Channel] {
        match self {
            Self::Available { .. } => &[Channel::Local, Channel::Remote],
            Self::NotAvailable => &[Channel::Remote],
        }
    }
}

/// "Nov 7 | Nov 14 | Dec 19"
pub fn summary_line(dates: &[String]) -> String {
    dates
        .iter()
        .map(|date| dates::short_label(date).unwrap_or_else(|_| date.clone()))
        .collect::<Vec<_>>()
        .join(" | ")
}

/// One bullet per date with the full weekday/date label.
pub fn detail_list(dates: &[String]) -> String {
    dates
        .iter()
        .map(|date| {
            let label = dates::long_label(date).unwrap_or_else(|_| date.clone());
            format!("  • {}", label)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub struct Monitor {
    checker: AvailabilityChecker,
    notifiers: Vec<Box<dyn Notifier>>,
    facility_name: String,
    dry_run: bool,
}

impl Monitor {
    pub fn new(
        checker: AvailabilityChecker,
        notifiers: Vec<Box<dyn Notifier>>,
        facility_name: impl Into<String>,
    ) -> Self {
        Self {
            checker,
            notifiers,
            facility_name: facility_name.into(),
            dry_run: false,
        }
    }

    /// Log notifications instead of sending them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    fn target_weekday(&self) -> Weekday {
        self.checker.target_weekday()
    }

    /// Run one complete check.
    ///
    /// Notification failures are logged and never change the outcome; only
    /// fetch failures produce `Err`.
    pub async fn run(&self) -> Result<RunOutcome, FetchError> {
        tracing::info!("========== Checking {} ==========", self.facility_name);

        let dates = self.checker.check().await?;
        let outcome = RunOutcome::from_dates(dates);

        let notification = self.notification_for(&outcome);
        match &outcome {
            RunOutcome::Available { dates } => {
                tracing::info!(
                    "{} is available on {} date(s):\n{}",
                    self.facility_name,
                    dates.len(),
                    detail_list(dates)
                );
            }
            RunOutcome::NotAvailable => {
                tracing::info!("{}", notification.message);
            }
        }

        self.dispatch(outcome.channels(), &notification).await;

        tracing::info!("========== Check complete ==========");
        Ok(outcome)
    }

    /// Build the notification sent for an outcome.
    pub fn notification_for(&self, outcome: &RunOutcome) -> Notification {
        match outcome {
            RunOutcome::Available { dates } => Notification::new(
                format!("{} AVAILABLE!", self.facility_name),
                format!("Available: {}", summary_line(dates)),
                Urgency::High,
            ),
            RunOutcome::NotAvailable => Notification::new(
                format!("{} NOT AVAILABLE", self.facility_name),
                format!(
                    "No availability found for any target {}.",
                    weekday_name(self.target_weekday())
                ),
                Urgency::Low,
            ),
        }
    }

    async fn dispatch(&self, channels: &[Channel], notification: &Notification) {
        for notifier in self
            .notifiers
            .iter()
            .filter(|n| channels.contains(&n.channel()))
        {
            if self.dry_run {
                tracing::info!(
                    "[dry run] Would send {}: {}",
                    notifier.name(),
                    notification.title
                );
                continue;
            }

            match notifier.notify(notification).await {
                Ok(()) => tracing::info!("Sent {}", notifier.name()),
                Err(e) => tracing::error!("Failed to send {}: {}", notifier.name(), e),
            }
        }
    }
}
