//! Role-conditioned navigation affordances.

use crate::auth::Identity;
use crate::routes::Route;
use crate::session::{SessionState, SessionStore};
use tokio::sync::watch;

/// Destinations offered in the navigation chrome, in display order.
const NAV_ORDER: [Route; 3] = [Route::Tickets, Route::TicketCreate, Route::Agents];

/// Computes the destinations the given identity may be offered.
///
/// Shares [`Route::required_capability`] with the authorization gate, so
/// the UI never offers an action the gate would bounce.
pub fn visible_routes(identity: Option<&Identity>) -> Vec<Route> {
    let Some(identity) = identity else {
        return vec![Route::Login];
    };
    NAV_ORDER
        .iter()
        .copied()
        .filter(|route| {
            route
                .required_capability()
                .map_or(true, |capability| identity.can(capability))
        })
        .collect()
}

/// Live view of the navigation affordances for the current session.
pub struct NavigationModel {
    session: watch::Receiver<SessionState>,
}

impl NavigationModel {
    /// Builds a model observing the given store.
    pub fn new(store: &SessionStore) -> Self {
        Self {
            session: store.subscribe(),
        }
    }

    /// Destinations visible right now.
    pub fn visible(&self) -> Vec<Route> {
        visible_routes(self.session.borrow().identity())
    }

    /// Waits for the next session change and returns the new affordances.
    pub async fn changed(&mut self) -> Vec<Route> {
        // The store outlives its subscribers, so a closed channel only
        // happens at shutdown; report the last known state then.
        let _ = self.session.changed().await;
        self.visible()
    }
}
