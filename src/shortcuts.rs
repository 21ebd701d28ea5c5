use anyhow::{anyhow, bail, Context as _, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Parent of all top level entries.
pub const ROOT: &str = "default";

/// Keys that steer the interactive loop instead of picking a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Back,
    Skip,
    Quit,
    ShowAll,
}

impl Navigation {
    pub const ALL: [Navigation; 4] = [
        Navigation::Back,
        Navigation::Quit,
        Navigation::ShowAll,
        Navigation::Skip,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Navigation::Back => ".back",
            Navigation::Skip => ".skip",
            Navigation::Quit => ".quit",
            Navigation::ShowAll => ".show all",
        }
    }

    pub fn key(self) -> char {
        match self {
            Navigation::Back => 'b',
            Navigation::Skip => 's',
            Navigation::Quit => 'q',
            Navigation::ShowAll => 'a',
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|nav| nav.label() == label)
    }
}

/// Single character shortcuts for category path segments.
///
/// Every label can itself be the parent of further shortcuts, which gives
/// drill-down paths like `e` (Expenses) -> `f` (Food) -> `r` (Restaurants).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortcutTree {
    scopes: BTreeMap<String, BTreeMap<char, String>>,
}

impl ShortcutTree {
    /// A tree with the navigation keys reserved, so they win over any category.
    pub fn new() -> Self {
        let mut tree = Self::default();
        for nav in Navigation::ALL {
            tree.best_effort_assign(nav.key(), nav.label(), ROOT);
        }
        tree
    }

    /// Binds `key` to `label` under `parent` unless the key is already taken.
    pub fn best_effort_assign(&mut self, key: char, label: &str, parent: &str) -> bool {
        let scope = self.scopes.entry(parent.to_string()).or_default();
        if scope.contains_key(&key) {
            return false;
        }
        scope.insert(key, label.to_string());
        true
    }

    /// Binds `label` under `parent` to the first free character of the label,
    /// then of its upper case form, then to a free digit.
    pub fn auto_assign(&mut self, label: &str, parent: &str) -> Result<char> {
        let scope = self.scopes.entry(parent.to_string()).or_default();
        if let Some((key, _)) = scope.iter().find(|(_, existing)| *existing == label) {
            return Ok(*key);
        }
        let lower = label.to_lowercase();
        let upper = label.to_uppercase();
        let candidates = lower
            .chars()
            .chain(upper.chars())
            .filter(|c| c.is_alphanumeric())
            .chain('0'..='9');
        for key in candidates {
            if !scope.contains_key(&key) {
                scope.insert(key, label.to_string());
                return Ok(key);
            }
        }
        bail!("No free shortcut left for '{label}' under '{parent}'");
    }

    /// Registers every segment of a colon separated account path as a drill-down chain.
    pub fn assign_account(&mut self, account: &str) -> Result<()> {
        let mut segments = account.split(':');
        let first = segments
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("Empty account name"))?;
        self.auto_assign(first, ROOT)?;
        let mut parent = first;
        for segment in segments.filter(|s| !s.is_empty()) {
            self.auto_assign(segment, parent)?;
            parent = segment;
        }
        Ok(())
    }

    pub fn maps_to(&self, key: char, parent: &str) -> Option<&str> {
        self.scopes
            .get(parent)
            .and_then(|scope| scope.get(&key))
            .map(String::as_str)
    }

    pub fn has_children(&self, label: &str) -> bool {
        self.scopes
            .get(label)
            .is_some_and(|scope| !scope.is_empty())
    }

    /// Shortcuts under `parent`, sorted by label.
    pub fn options(&self, parent: &str) -> Vec<(char, &str)> {
        let mut options: Vec<(char, &str)> = self
            .scopes
            .get(parent)
            .map(|scope| scope.iter().map(|(k, v)| (*k, v.as_str())).collect())
            .unwrap_or_default();
        options.sort_by(|a, b| a.1.cmp(b.1));
        options
    }

    /// Returns a fresh tree if the file doesn't exist yet.
    ///
    /// Persisted bindings that clash with a navigation key are dropped, the
    /// affected labels get a new key when they are registered again.
    pub fn load(path: &Path) -> Result<Self> {
        log::info!("Loading shortcuts...");
        let mut tree = Self::new();
        if !path.try_exists()? {
            log::info!("Loading shortcuts...not found");
            return Ok(tree);
        }
        let content = std::fs::read_to_string(path)?;
        let persisted: ShortcutTree = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse shortcuts file {}", path.display()))?;
        for (parent, scope) in persisted.scopes {
            for (key, label) in scope {
                if Navigation::from_label(&label).is_some() {
                    continue;
                }
                if !tree.best_effort_assign(key, &label, &parent) {
                    log::warn!(
                        "Dropping shortcut '{key}' for '{label}' under '{parent}', key is taken"
                    );
                }
            }
        }
        log::info!("Loading shortcuts...done");
        Ok(tree)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        log::info!("Saving shortcuts...");
        let content = serde_yaml::to_string(self)?;

        // First write to temporary file so we don't lose data if writing fails halfway
        let filename = path
            .file_name()
            .ok_or_else(|| anyhow!("Path has no filename"))?
            .to_str()
            .ok_or_else(|| anyhow!("Filename isn't valid utf-8"))?;
        let tmppath = path.with_file_name(format!("{}.temp", filename));
        std::fs::write(&tmppath, content)?;
        std::fs::rename(&tmppath, path)?;

        log::info!("Saving shortcuts...done");
        Ok(())
    }
}
