//! Drop guard for staged tables
//!
//! Covers the exit path that async code cannot intercept: the enclosing
//! future being dropped between create and cleanup. The guard then schedules
//! a `DROP TABLE IF EXISTS` on the current runtime.

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::session::Session;

pub(crate) struct DropGuard<S: Session + Clone + 'static> {
    session: Option<S>,
    table: String,
}

impl<S: Session + Clone + 'static> DropGuard<S> {
    pub(crate) fn arm(session: &S, table: &str) -> Self {
        Self {
            session: Some(session.clone()),
            table: table.to_string(),
        }
    }

    /// Cleanup is being handled inline
    pub(crate) fn disarm(mut self) {
        self.session = None;
    }
}

impl<S: Session + Clone + 'static> Drop for DropGuard<S> {
    fn drop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        let table = std::mem::take(&mut self.table);

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(table = %table, "scope abandoned, scheduling temporary table drop");
                handle.spawn(async move {
                    let cancel = CancellationToken::new();
                    if let Err(e) = session.drop_temp_table(&table, true, &cancel).await {
                        warn!(table = %table, error = %e, "deferred temporary table drop failed");
                    }
                });
            }
            Err(_) => {
                warn!(table = %table, "no runtime available, temporary table left behind");
            }
        }
    }
}
