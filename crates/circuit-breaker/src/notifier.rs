//! Hook fired when a new risky-venue alert is stored

use tracing::info;

use crate::model::RiskyVenueAlert;

/// Receives newly raised alerts (e.g. to show a notification)
///
/// Called at most once per stored alert; must not block.
pub trait VenueAlertNotifier: Send + Sync {
    fn notify(&self, alert: &RiskyVenueAlert);
}

/// Notifier that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingNotifier;

impl VenueAlertNotifier for LoggingNotifier {
    fn notify(&self, alert: &RiskyVenueAlert) {
        info!(
            check_in_id = %alert.check_in_id,
            venue_id = %alert.venue_id,
            approved_at = %alert.approved_at,
            "Risky venue alert raised"
        );
    }
}
