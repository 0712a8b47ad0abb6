//! In-memory alert store with JSON snapshot persistence.

use crate::audit::CheckLogWriter;
use crate::error::StoreResult;
use parking_lot::{Mutex, RwLock};
use perpwatch_core::{AlertRule, AlertSettings, AlertStore, CheckLogEntry, CHECK_LOG_CAP};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// What survives a restart: rules and settings, but not the check log.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    alerts: Vec<AlertRule>,
    settings: AlertSettings,
}

#[derive(Debug)]
struct Inner {
    alerts: Vec<AlertRule>,
    settings: AlertSettings,
    /// Newest first, capped at `CHECK_LOG_CAP`.
    check_logs: VecDeque<CheckLogEntry>,
}

/// Source of truth for alert rules, settings and the bounded check log.
///
/// All mutation goes through `&self`; the store is shared between the
/// scheduler and whatever owns rule management via `Arc`.
pub struct MemoryStore {
    inner: RwLock<Inner>,
    audit: Option<Mutex<CheckLogWriter>>,
}

impl MemoryStore {
    pub fn new(settings: AlertSettings) -> Self {
        Self {
            inner: RwLock::new(Inner {
                alerts: Vec::new(),
                settings,
                check_logs: VecDeque::with_capacity(CHECK_LOG_CAP),
            }),
            audit: None,
        }
    }

    /// Mirror every check-log entry to a JSON Lines audit file.
    pub fn with_audit(mut self, writer: CheckLogWriter) -> Self {
        self.audit = Some(Mutex::new(writer));
        self
    }

    /// Load rules and settings from a JSON snapshot. A missing file yields
    /// an empty store with the given defaults.
    pub fn load_snapshot(path: &Path, defaults: AlertSettings) -> StoreResult<Self> {
        if !path.exists() {
            info!(path = %path.display(), "No snapshot found, starting empty");
            return Ok(Self::new(defaults));
        }
        let raw = std::fs::read_to_string(path)?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;
        info!(
            path = %path.display(),
            alerts = snapshot.alerts.len(),
            "Loaded alert snapshot"
        );
        Ok(Self {
            inner: RwLock::new(Inner {
                alerts: snapshot.alerts,
                settings: snapshot.settings,
                check_logs: VecDeque::with_capacity(CHECK_LOG_CAP),
            }),
            audit: None,
        })
    }

    /// Write rules and settings to a JSON snapshot. The check log is not
    /// persisted here; the audit mirror covers history.
    pub fn save_snapshot(&self, path: &Path) -> StoreResult<()> {
        let inner = self.inner.read();
        let snapshot = Snapshot {
            alerts: inner.alerts.clone(),
            settings: inner.settings,
        };
        let json = serde_json::to_string_pretty(&snapshot)?;
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, json)?;
        info!(path = %path.display(), alerts = snapshot.alerts.len(), "Saved alert snapshot");
        Ok(())
    }

    pub fn add_alert(&self, rule: AlertRule) {
        self.inner.write().alerts.push(rule);
    }

    /// Remove a rule by id; returns whether it existed.
    pub fn remove_alert(&self, id: Uuid) -> bool {
        let mut inner = self.inner.write();
        let before = inner.alerts.len();
        inner.alerts.retain(|a| a.id != id);
        inner.alerts.len() < before
    }

    /// Enable or disable a rule; returns whether it existed.
    pub fn set_enabled(&self, id: Uuid, enabled: bool) -> bool {
        let mut inner = self.inner.write();
        match inner.alerts.iter_mut().find(|a| a.id == id) {
            Some(rule) => {
                rule.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn set_settings(&self, settings: AlertSettings) {
        self.inner.write().settings = settings;
    }

    /// Check log, newest first.
    pub fn check_logs(&self) -> Vec<CheckLogEntry> {
        self.inner.read().check_logs.iter().cloned().collect()
    }
}

impl AlertStore for MemoryStore {
    fn alerts(&self) -> Vec<AlertRule> {
        self.inner.read().alerts.clone()
    }

    fn settings(&self) -> AlertSettings {
        self.inner.read().settings
    }

    fn mark_sent(&self, id: Uuid, symbols: &[String], now_ms: i64) {
        let mut inner = self.inner.write();
        if let Some(rule) = inner.alerts.iter_mut().find(|a| a.id == id) {
            for symbol in symbols {
                rule.sent_by_symbol.insert(symbol.clone(), now_ms);
            }
            rule.last_triggered_ms = Some(now_ms);
        }
    }

    fn reset_cooldown(&self, id: Uuid) {
        let mut inner = self.inner.write();
        if let Some(rule) = inner.alerts.iter_mut().find(|a| a.id == id) {
            rule.sent_by_symbol.clear();
            rule.last_triggered_ms = None;
        }
    }

    fn append_check_log(&self, entry: CheckLogEntry) {
        if let Some(audit) = &self.audit {
            if let Err(e) = audit.lock().append(&entry) {
                warn!(?e, "Failed to mirror check-log entry to audit file");
            }
        }
        let mut inner = self.inner.write();
        inner.check_logs.push_front(entry);
        inner.check_logs.truncate(CHECK_LOG_CAP);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perpwatch_core::{AlertKind, TimePeriod, SYMBOL_COOLDOWN_MS};
    use rust_decimal_macros::dec;

    fn rule(name: &str) -> AlertRule {
        AlertRule::new(
            name,
            AlertKind::PriceIncrease {
                period: TimePeriod::H24,
                threshold_pct: dec!(20),
            },
            0,
        )
    }

    #[test]
    fn test_add_remove_toggle() {
        let store = MemoryStore::new(AlertSettings::default());
        let r = rule("pump");
        let id = r.id;
        store.add_alert(r);
        assert_eq!(store.alerts().len(), 1);

        assert!(store.set_enabled(id, false));
        assert!(!store.alerts()[0].enabled);
        assert!(!store.set_enabled(Uuid::new_v4(), true));

        assert!(store.remove_alert(id));
        assert!(!store.remove_alert(id));
        assert!(store.alerts().is_empty());
    }

    #[test]
    fn test_mark_sent_and_reset() {
        let store = MemoryStore::new(AlertSettings::default());
        let r = rule("pump");
        let id = r.id;
        store.add_alert(r);

        store.mark_sent(id, &["BTCUSDT".to_string(), "ETHUSDT".to_string()], 5_000);
        let alerts = store.alerts();
        assert!(alerts[0].on_cooldown("BTCUSDT", 5_000 + SYMBOL_COOLDOWN_MS - 1));
        assert!(alerts[0].on_cooldown("ETHUSDT", 5_001));
        assert_eq!(alerts[0].last_triggered_ms, Some(5_000));

        store.reset_cooldown(id);
        let alerts = store.alerts();
        assert!(!alerts[0].on_cooldown("BTCUSDT", 5_001));
        assert!(alerts[0].last_triggered_ms.is_none());
        assert!(alerts[0].sent_by_symbol.is_empty());
    }

    #[test]
    fn test_check_log_ring_evicts_oldest() {
        let store = MemoryStore::new(AlertSettings::default());
        for i in 0..(CHECK_LOG_CAP as i64 + 10) {
            store.append_check_log(CheckLogEntry::for_alert(i, format!("a{i}"), 0, 0, &[]));
        }

        let logs = store.check_logs();
        assert_eq!(logs.len(), CHECK_LOG_CAP);
        // Newest first; entries 0..10 were evicted
        assert_eq!(logs[0].time_ms, CHECK_LOG_CAP as i64 + 9);
        assert_eq!(logs.last().unwrap().time_ms, 10);
    }

    #[test]
    fn test_snapshot_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("alerts.json");

        let store = MemoryStore::new(AlertSettings {
            check_interval_ms: 30_000,
            max_alerts: 5,
            auto_filter: false,
        });
        let r = rule("pump");
        let id = r.id;
        store.add_alert(r);
        store.mark_sent(id, &["BTCUSDT".to_string()], 7_000);
        store.append_check_log(CheckLogEntry::system(1, "boot"));
        store.save_snapshot(&path).unwrap();

        let restored = MemoryStore::load_snapshot(&path, AlertSettings::default()).unwrap();
        let alerts = restored.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].id, id);
        // Cooldown state survives restarts
        assert_eq!(alerts[0].sent_by_symbol.get("BTCUSDT"), Some(&7_000));
        assert_eq!(restored.settings().check_interval_ms, 30_000);
        assert!(!restored.settings().auto_filter);
        // The check log does not
        assert!(restored.check_logs().is_empty());
    }

    #[test]
    fn test_missing_snapshot_starts_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nope.json");
        let store = MemoryStore::load_snapshot(&path, AlertSettings::default()).unwrap();
        assert!(store.alerts().is_empty());
        assert_eq!(store.settings(), AlertSettings::default());
    }

    #[test]
    fn test_audit_mirror_receives_entries() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = MemoryStore::new(AlertSettings::default())
            .with_audit(CheckLogWriter::new(dir.path().to_str().unwrap()));

        store.append_check_log(CheckLogEntry::system(1, "boot"));
        store.append_check_log(CheckLogEntry::for_alert(2, "pump", 10, 0, &[]));
        drop(store);

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(entries.len(), 1);
        let raw = std::fs::read_to_string(entries[0].path()).unwrap();
        assert_eq!(raw.lines().count(), 2);
    }
}
