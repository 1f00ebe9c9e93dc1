//! Versioned schema changes for the journal database.
//!
//! Each migration runs inside its own transaction and is recorded in
//! `schema_migrations` with a SHA-256 of its SQL, so an edited migration is
//! caught on the next open. File databases that already hold data are copied
//! to `backups/` before anything is applied.

use chrono::Utc;
use rusqlite::backup::Backup;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{JournalError, Result};

const KEEP_BACKUPS: usize = 5;
const BACKUP_PREFIX: &str = "journal_v";

pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 0,
        name: "bootstrap",
        sql: include_str!("migrations/000_bootstrap.sql"),
    },
    Migration {
        version: 1,
        name: "kv_store",
        sql: include_str!("migrations/001_kv_store.sql"),
    },
    Migration {
        version: 2,
        name: "sync_history",
        sql: include_str!("migrations/002_sync_history.sql"),
    },
];

impl Migration {
    pub fn checksum(&self) -> String {
        format!("{:x}", Sha256::digest(self.sql.as_bytes()))
    }

    fn apply(&self, conn: &Connection) -> Result<()> {
        let started = Instant::now();
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(self.sql)?;
        let elapsed_ms = started.elapsed().as_millis() as i64;
        tx.execute(
            "INSERT INTO schema_migrations (version, name, applied_at, checksum, execution_time_ms)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![self.version, self.name, Utc::now().timestamp(), self.checksum(), elapsed_ms],
        )?;
        tx.commit()?;
        log::debug!("Migration {} ({}) took {}ms", self.version, self.name, elapsed_ms);
        Ok(())
    }
}

/// What a call to [`migrate`] did.
#[derive(Debug, Default)]
pub struct MigrationReport {
    pub applied: Vec<u32>,
    pub backup: Option<PathBuf>,
}

pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

/// Highest applied version, `None` before the bookkeeping table exists.
pub fn current_version(conn: &Connection) -> Result<Option<u32>> {
    let has_table: bool = conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations')",
        [],
        |row| row.get(0),
    )?;
    if !has_table {
        return Ok(None);
    }
    let version = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get::<_, Option<u32>>(0)
        })
        .optional()?
        .flatten();
    Ok(version)
}

/// Brings `conn` up to [`latest_version`]. A failing migration is rolled back
/// and stops the run; the ones before it stay applied.
pub fn migrate(conn: &Connection, db_path: &str) -> Result<MigrationReport> {
    migrate_with(conn, db_path, MIGRATIONS)
}

fn migrate_with(conn: &Connection, db_path: &str, migrations: &[Migration]) -> Result<MigrationReport> {
    let current = current_version(conn)?;
    let pending: Vec<&Migration> = migrations
        .iter()
        .filter(|m| current.is_none_or(|v| m.version > v))
        .collect();

    let mut report = MigrationReport::default();
    let Some(target) = pending.last() else {
        log::info!("Schema is up to date at version {:?}", current);
        return Ok(report);
    };

    log::info!("{} pending migrations, target version {}", pending.len(), target.version);
    report.backup = backup_before(db_path, target.version)?;

    for migration in pending {
        if let Err(e) = migration.apply(conn) {
            log::error!("Migration {} ({}) failed: {}", migration.version, migration.name, e);
            if let Some(path) = &report.backup {
                log::error!("Restore from backup at {}", path.display());
            }
            return Err(e);
        }
        log::info!("Applied migration {}: {}", migration.version, migration.name);
        report.applied.push(migration.version);
    }
    Ok(report)
}

/// Fails when an applied migration's SQL no longer matches what was recorded.
pub fn verify(conn: &Connection) -> Result<()> {
    let mut stmt = conn.prepare("SELECT version, checksum FROM schema_migrations WHERE checksum IS NOT NULL")?;
    let recorded = stmt
        .query_map([], |row| Ok((row.get::<_, u32>(0)?, row.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for (version, checksum) in recorded {
        let Some(migration) = MIGRATIONS.iter().find(|m| m.version == version) else {
            continue;
        };
        if migration.checksum() != checksum {
            return Err(JournalError::Database(format!(
                "checksum mismatch for migration {} ({})",
                version, migration.name
            )));
        }
    }
    Ok(())
}

fn backup_before(db_path: &str, target: u32) -> Result<Option<PathBuf>> {
    let path = Path::new(db_path);
    let has_data = db_path != ":memory:" && fs::metadata(path).is_ok_and(|m| m.len() > 0);
    if !has_data {
        return Ok(None);
    }

    let dir = path.parent().unwrap_or(Path::new(".")).join("backups");
    fs::create_dir_all(&dir)?;
    let backup_path = dir.join(format!("{}{}_{}.db", BACKUP_PREFIX, target, Utc::now().timestamp_millis()));

    let src = Connection::open(path)?;
    let mut dst = Connection::open(&backup_path)?;
    Backup::new(&src, &mut dst)?.run_to_completion(5, Duration::from_millis(250), None)?;

    let integrity: String = dst.pragma_query_value(None, "integrity_check", |row| row.get(0))?;
    if integrity != "ok" {
        return Err(JournalError::Database(format!("backup integrity check failed: {}", integrity)));
    }

    log::info!("Backed up database to {}", backup_path.display());
    prune_backups(&dir);
    Ok(Some(backup_path))
}

/// Keeps the newest few backups. File names sort by creation time.
fn prune_backups(dir: &Path) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    let mut backups: Vec<PathBuf> = entries
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| {
            p.extension().is_some_and(|ext| ext == "db")
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(BACKUP_PREFIX))
        })
        .collect();
    backups.sort_by_key(|p| {
        p.file_stem()
            .and_then(|s| s.to_str())
            .and_then(|s| s.rsplit('_').next())
            .and_then(|ts| ts.parse::<i64>().ok())
            .unwrap_or(0)
    });

    let excess = backups.len().saturating_sub(KEEP_BACKUPS);
    for old in backups.into_iter().take(excess) {
        if let Err(e) = fs::remove_file(&old) {
            log::warn!("Could not remove old backup {}: {}", old.display(), e);
        }
    }
}
