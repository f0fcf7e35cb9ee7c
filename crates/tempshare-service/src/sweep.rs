use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{FileService, ServiceError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub total: usize,
    pub deleted: usize,
    pub errors: usize,
}

impl FileService {
    pub async fn sweep(&self) -> Result<SweepReport, ServiceError> {
        self.sweep_at(Utc::now()).await
    }

    /// Remove every record that expired before `now`, bytes first.
    ///
    /// A record is dropped even when its bytes could not be removed. Either
    /// failure counts once in `errors`; only a failed listing aborts the pass.
    pub async fn sweep_at(&self, now: DateTime<Utc>) -> Result<SweepReport, ServiceError> {
        let expired = self.db.list_expired(now).await?;
        let mut report = SweepReport {
            total: expired.len(),
            ..SweepReport::default()
        };

        for record in expired {
            if !self.storage.delete(&record.storage).await {
                report.errors += 1;
            }
            match self.db.delete_file(&record.access_id).await {
                Ok(true) => report.deleted += 1,
                Ok(false) => {
                    tracing::debug!(access_id = %record.access_id, "record already removed");
                }
                Err(e) => {
                    report.errors += 1;
                    tracing::error!(access_id = %record.access_id, error = %e, "failed to delete expired record");
                }
            }
        }

        match self.db.count_files().await {
            Ok(remaining) => tracing::info!(
                total = report.total,
                deleted = report.deleted,
                errors = report.errors,
                remaining,
                "sweep finished"
            ),
            Err(e) => {
                tracing::warn!(error = %e, "failed to count remaining records");
                tracing::info!(
                    total = report.total,
                    deleted = report.deleted,
                    errors = report.errors,
                    "sweep finished"
                );
            }
        }
        Ok(report)
    }
}
