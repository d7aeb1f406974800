//! # Macro Profiles
//!
//! Named snapshots of the macro store (macros, key bindings, echo flag)
//! persisted as JSON files in the store's profile directory.

use crate::script::MacroStore;
use crate::{EramudError, EramudResult};
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// A serializable macro-store snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub macros: BTreeMap<String, String>,
    pub bindings: BTreeMap<char, String>,
    pub echo: bool,
}

impl MacroStore {
    fn profile_path(&self, name: &str) -> EramudResult<PathBuf> {
        if name.is_empty()
            || !name
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
        {
            return Err(EramudError::InvalidAction(format!(
                "'{}' is not a valid profile name.",
                name
            )));
        }
        Ok(self.profile_dir().join(format!("{}.json", name)))
    }

    /// Writes the current macros, bindings, and echo flag to a named
    /// profile, creating the profile directory if needed.
    pub fn save_profile(&self, name: &str) -> EramudResult<()> {
        let path = self.profile_path(name)?;
        fs::create_dir_all(self.profile_dir())?;
        let profile = Profile {
            macros: self.macros().clone(),
            bindings: self.bindings_map().clone(),
            echo: self.echo,
        };
        fs::write(&path, serde_json::to_string_pretty(&profile)?)?;
        info!("saved profile '{}' to {}", name, path.display());
        Ok(())
    }

    /// Replaces the store contents from a named profile.
    pub fn load_profile(&mut self, name: &str) -> EramudResult<()> {
        let path = self.profile_path(name)?;
        let raw = fs::read_to_string(&path).map_err(|_| {
            EramudError::InvalidAction(format!("No profile named '{}'.", name))
        })?;
        let profile: Profile = serde_json::from_str(&raw)?;
        self.replace_contents(profile.macros, profile.bindings, profile.echo);
        info!("loaded profile '{}' from {}", name, path.display());
        Ok(())
    }

    /// Names of every saved profile, sorted. A missing profile directory is
    /// a first run, not an error.
    pub fn list_profiles(&self) -> EramudResult<Vec<String>> {
        let entries = match fs::read_dir(self.profile_dir()) {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Vec::new());
            }
            Err(error) => return Err(error.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in_tempdir() -> (MacroStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = MacroStore::new(dir.path().join("profiles"));
        (store, dir)
    }

    #[test]
    fn test_profile_round_trip() {
        let (mut store, _dir) = store_in_tempdir();
        store.add("sweep", "3n2e");
        store.bind('x', "look");
        store.echo = true;
        store.save_profile("default").unwrap();

        let mut other = MacroStore::new(store.profile_dir().clone());
        other.load_profile("default").unwrap();
        assert_eq!(other.get("sweep"), Some("3n2e"));
        assert_eq!(other.binding('x'), Some("look"));
        assert!(other.echo);
    }

    #[test]
    fn test_list_profiles() {
        let (store, _dir) = store_in_tempdir();
        assert!(store.list_profiles().unwrap().is_empty());
        store.save_profile("alpha").unwrap();
        store.save_profile("beta").unwrap();
        assert_eq!(store.list_profiles().unwrap(), vec!["alpha", "beta"]);
    }

    #[test]
    fn test_missing_profile_is_user_error() {
        let (mut store, _dir) = store_in_tempdir();
        assert!(matches!(
            store.load_profile("ghost"),
            Err(EramudError::InvalidAction(_))
        ));
    }

    #[test]
    fn test_profile_names_are_validated() {
        let (store, _dir) = store_in_tempdir();
        assert!(store.save_profile("../escape").is_err());
        assert!(store.save_profile("").is_err());
        assert!(store.save_profile("ok-name_2").is_ok());
    }
}
