use tracing::info;

use super::CommandError;
use crate::cli::ClearTarget;
use crate::config::Config;
use crate::ledger::LedgerStore;
use crate::observability;

/// `minls clear <all|data|logs>`
///
/// Logging must already be console-only when logs are cleared, otherwise the
/// file sink keeps the directory alive.
pub fn run(config: &Config, target: ClearTarget) -> Result<(), CommandError> {
    if target.includes_data() {
        let mut store = LedgerStore::new(config.store_options());
        store.remove_all()?;
        info!(dir = %config.ledger_dir().display(), "Ledger data cleared");
    }

    if target.includes_logs() {
        let dir = config.logs_dir();
        observability::remove_logs_dir(&dir)?;
        info!(dir = %dir.display(), "Log files cleared");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::EntryDraft;
    use std::fs;
    use tempfile::TempDir;

    fn config_in(temp_dir: &TempDir) -> Config {
        Config {
            base_dir: Some(temp_dir.path().to_path_buf()),
            ..Config::default()
        }
    }

    fn seed(config: &Config) {
        let mut store = LedgerStore::new(config.store_options());
        store.init().unwrap();
        store
            .write_entry(EntryDraft::new("https://s.example/b/k", "https://sho.rt/k"))
            .unwrap();

        fs::create_dir_all(config.logs_dir()).unwrap();
        fs::write(config.logs_dir().join("minls_2024-01-01_00-00-00.log"), b"x").unwrap();
    }

    #[test]
    fn test_clear_data_keeps_logs() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        seed(&config);

        run(&config, ClearTarget::Data).unwrap();

        assert!(!config.ledger_dir().exists());
        assert!(config.logs_dir().exists());
    }

    #[test]
    fn test_clear_all() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        seed(&config);

        run(&config, ClearTarget::All).unwrap();

        assert!(!config.ledger_dir().exists());
        assert!(!config.logs_dir().exists());
        assert!(temp_dir.path().exists());
    }

    #[test]
    fn test_clear_nothing_there() {
        let temp_dir = TempDir::new().unwrap();
        run(&config_in(&temp_dir), ClearTarget::All).unwrap();
    }
}
