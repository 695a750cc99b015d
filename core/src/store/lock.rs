use super::DocStore;
use crate::error::{ReconError, ReconResult};
use chrono::Utc;
use rusqlite::params;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    Read,
    Write,
}

impl LockMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read  => "read",
            Self::Write => "write",
        }
    }

    fn conflicts_with(&self, held: &str) -> bool {
        match self {
            // Readers only exclude writers.
            Self::Read  => held == "write",
            Self::Write => true,
        }
    }
}

impl DocStore {
    // ── Job locks ─────────────────────────────────────────────────

    /// Take a lock on `resource` for `holder`. Re-acquiring a lock the
    /// holder already has replaces its mode.
    pub fn acquire_lock(&self, resource: &str, mode: LockMode, holder: &str) -> ReconResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "SELECT holder, mode FROM job_lock WHERE resource = ?1 AND holder != ?2",
            )?;
            let held = stmt
                .query_map(params![resource, holder], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;

            if let Some((other, _)) = held.iter().find(|(_, m)| mode.conflicts_with(m)) {
                return Err(ReconError::LockHeld {
                    resource: resource.to_string(),
                    mode: mode.as_str(),
                    holder: other.clone(),
                });
            }
        }
        tx.execute(
            "INSERT OR REPLACE INTO job_lock (resource, holder, mode, acquired_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![resource, holder, mode.as_str(), Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        log::debug!("{} lock on '{resource}' acquired by {holder}", mode.as_str());
        Ok(())
    }

    /// Drop every lock `holder` has. Returns how many were released.
    pub fn release_locks(&self, holder: &str) -> ReconResult<usize> {
        let n = self
            .conn
            .execute("DELETE FROM job_lock WHERE holder = ?1", params![holder])?;
        Ok(n)
    }

    pub fn lock_holders(&self, resource: &str) -> ReconResult<Vec<(String, LockMode)>> {
        let mut stmt = self.conn.prepare(
            "SELECT holder, mode FROM job_lock WHERE resource = ?1 ORDER BY holder",
        )?;
        let rows = stmt
            .query_map(params![resource], |row| {
                let mode: String = row.get(1)?;
                let mode = if mode == "write" { LockMode::Write } else { LockMode::Read };
                Ok((row.get::<_, String>(0)?, mode))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
