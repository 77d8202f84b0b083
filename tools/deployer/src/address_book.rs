use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::network::Network;

/// On-disk layout of `config-<network>.json`.
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    network: String,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// Name to value store for one network: deployed contract addresses plus
/// the deployment parameters (`Admin`, `FeeToken`, `EntryFee`, ...).
///
/// Every write is persisted before it returns. A write whose persist fails
/// is undone in memory, so the book never holds an entry the file lacks.
#[derive(Debug)]
pub struct AddressBook {
    path: PathBuf,
    network: Network,
    entries: BTreeMap<String, String>,
}

impl AddressBook {
    pub fn file_name(network: &Network) -> String {
        format!("config-{}.json", network.key())
    }

    /// Load the book for `network` from `dir`. A missing file is an empty book;
    /// a file recorded for another network is refused.
    pub fn load(dir: &Path, network: &Network) -> Result<Self> {
        let path = dir.join(Self::file_name(network));
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => {
                let snapshot: Snapshot = serde_json::from_str(&raw)?;
                if snapshot.network != network.key() {
                    return Err(Error::ForeignBook {
                        path: path.display().to_string(),
                        expected: network.key(),
                        found: snapshot.network,
                    });
                }
                snapshot.entries
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(Error::Persist(e)),
        };
        debug!("loaded {} entries from {}", entries.len(), path.display());

        Ok(Self {
            path,
            network: network.clone(),
            entries,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn require(&self, name: &str) -> Result<&str> {
        self.get(name)
            .ok_or_else(|| Error::MissingEntry(name.to_owned()))
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// Record `name = value` and persist.
    pub fn insert(&mut self, name: &str, value: &str) -> Result<()> {
        let previous = self.entries.insert(name.to_owned(), value.to_owned());
        if let Err(e) = self.save() {
            match previous {
                Some(old) => self.entries.insert(name.to_owned(), old),
                None => self.entries.remove(name),
            };
            return Err(e);
        }
        Ok(())
    }

    /// Write to a sibling temp file and rename over the target.
    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let snapshot = Snapshot {
            network: self.network.key(),
            entries: self.entries.clone(),
        };
        let body = serde_json::to_string_pretty(&snapshot)?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, body)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(Error::Persist(e));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ops::Deref;
    use std::time::{SystemTime, UNIX_EPOCH};

    /// Temp directory removed on drop.
    struct Scratch(PathBuf);

    impl Scratch {
        fn new(tag: &str) -> Self {
            let nanos = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos();
            let dir = std::env::temp_dir().join(format!(
                "lotto-book-{}-{}-{}",
                tag,
                std::process::id(),
                nanos
            ));
            fs::create_dir_all(&dir).unwrap();
            Self(dir)
        }
    }

    impl Deref for Scratch {
        type Target = Path;

        fn deref(&self) -> &Path {
            &self.0
        }
    }

    impl Drop for Scratch {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    #[test]
    fn missing_file_is_empty_book() {
        let dir = Scratch::new("missing");
        let book = AddressBook::load(&dir, &Network::Local).unwrap();

        assert!(book.entries().is_empty());
        assert_eq!(book.path(), dir.join("config-local.json"));
    }

    #[test]
    fn insert_persists_and_reloads() {
        let dir = Scratch::new("reload");
        let mut book = AddressBook::load(&dir, &Network::Testnet).unwrap();
        book.insert("Lottery", "CLOTTERY").unwrap();
        book.insert("Admin", "GADMIN").unwrap();

        let again = AddressBook::load(&dir, &Network::Testnet).unwrap();
        assert_eq!(again.get("Lottery"), Some("CLOTTERY"));
        assert_eq!(again.get("Admin"), Some("GADMIN"));
        assert!(!dir.join("config-testnet.json.tmp").exists());
    }

    #[test]
    fn books_are_per_network() {
        let dir = Scratch::new("split");
        let mut local = AddressBook::load(&dir, &Network::Local).unwrap();
        local.insert("Lottery", "CLOCAL").unwrap();

        let testnet = AddressBook::load(&dir, &Network::Testnet).unwrap();
        assert_eq!(testnet.get("Lottery"), None);
    }

    #[test]
    fn require_reports_missing_entry() {
        let dir = Scratch::new("require");
        let book = AddressBook::load(&dir, &Network::Local).unwrap();

        match book.require("FeeToken") {
            Err(Error::MissingEntry(name)) => assert_eq!(name, "FeeToken"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn corrupt_file_is_parse_error() {
        let dir = Scratch::new("corrupt");
        fs::write(dir.join("config-local.json"), "{ not json").unwrap();

        assert!(matches!(
            AddressBook::load(&dir, &Network::Local),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn failed_persist_rolls_back_entry() {
        let dir = Scratch::new("rollback");
        let mut book = AddressBook::load(&dir, &Network::Local).unwrap();
        book.insert("Admin", "GADMIN").unwrap();

        // Occupy the temp path with a directory so the write fails.
        fs::create_dir_all(dir.join("config-local.json.tmp")).unwrap();

        assert!(matches!(
            book.insert("Lottery", "CLOTTERY"),
            Err(Error::Persist(_))
        ));
        assert_eq!(book.get("Lottery"), None);
        assert!(matches!(book.insert("Admin", "GOTHER"), Err(Error::Persist(_))));
        assert_eq!(book.get("Admin"), Some("GADMIN"));
    }

    #[test]
    fn book_of_another_network_is_refused() {
        let dir = Scratch::new("foreign");
        let mut testnet = AddressBook::load(&dir, &Network::Testnet).unwrap();
        testnet.insert("Lottery", "CTESTNET").unwrap();
        fs::copy(dir.join("config-testnet.json"), dir.join("config-local.json")).unwrap();

        match AddressBook::load(&dir, &Network::Local) {
            Err(Error::ForeignBook { expected, found, .. }) => {
                assert_eq!(expected, "local");
                assert_eq!(found, "testnet");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn scratch_dir_is_removed() {
        let path = {
            let dir = Scratch::new("cleanup");
            let mut book = AddressBook::load(&dir, &Network::Local).unwrap();
            book.insert("Admin", "GADMIN").unwrap();
            dir.to_path_buf()
        };
        assert!(!path.exists());
    }
}
