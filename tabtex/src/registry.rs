//! Theme registry for theme discovery and selection
//!
//! [`ThemeRegistry`] holds the built-in themes, user-registered themes and the
//! "current" theme pointer. It is a plain value so it can be injected into the
//! pipeline; the process-wide instance returned by [`global`] wraps one in a
//! read/write lock and every access goes through that lock.

use crate::error::{Result, TableError};
use crate::theme::{Theme, ThemeRef};
use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Registry of table themes
///
/// # Examples
///
/// ```ignore
/// let mut registry = ThemeRegistry::new();
/// registry.register(Theme::new("report").with_striping(true), None, false)?;
/// registry.set_current(Some("report".into()))?;
/// ```
#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    builtins: BTreeMap<String, Theme>,
    custom: BTreeMap<String, Theme>,
    /// Named pointers are resolved on every read, so an overwrite shows through
    current: Option<ThemeRef>,
}

impl ThemeRegistry {
    /// Create a registry holding only the built-in themes
    pub fn new() -> Self {
        let builtins = Theme::builtins()
            .into_iter()
            .map(|theme| (theme.name.clone(), theme))
            .collect();
        ThemeRegistry {
            builtins,
            custom: BTreeMap::new(),
            current: None,
        }
    }

    /// Register a custom theme
    ///
    /// The theme is stored under `name`, or under its own name when `name` is
    /// `None`. Built-in names are always rejected; an existing custom name is
    /// rejected unless `overwrite` is set.
    pub fn register(&mut self, theme: Theme, name: Option<&str>, overwrite: bool) -> Result<()> {
        let name = name.unwrap_or(theme.name.as_str()).trim().to_string();
        if name.is_empty() {
            return Err(TableError::Configuration(
                "a theme needs a name to be registered".to_string(),
            ));
        }
        if self.builtins.contains_key(&name) {
            return Err(TableError::Configuration(format!(
                "cannot overwrite built-in theme '{name}'"
            )));
        }
        if self.custom.contains_key(&name) && !overwrite {
            return Err(TableError::Configuration(format!(
                "theme '{name}' is already registered (pass overwrite to replace it)"
            )));
        }

        let mut theme = theme;
        theme.name = name.clone();
        log::debug!("registering theme '{name}'");
        self.custom.insert(name, theme);
        Ok(())
    }

    /// Remove a custom theme, reporting whether anything was removed
    pub fn unregister(&mut self, name: &str) -> bool {
        let removed = self.custom.remove(name).is_some();
        if removed && matches!(&self.current, Some(ThemeRef::Named(current)) if current == name) {
            self.current = None;
        }
        removed
    }

    /// Remove every custom theme and return how many were removed
    pub fn clear(&mut self) -> usize {
        let count = self.custom.len();
        self.custom.clear();
        if let Some(ThemeRef::Named(current)) = &self.current {
            if !self.builtins.contains_key(current) {
                self.current = None;
            }
        }
        count
    }

    /// Set or clear the current theme
    pub fn set_current(&mut self, theme: Option<ThemeRef>) -> Result<()> {
        if let Some(ThemeRef::Named(name)) = &theme {
            self.lookup(name)?;
        }
        self.current = theme;
        Ok(())
    }

    pub fn current(&self) -> Option<&Theme> {
        match self.current.as_ref()? {
            ThemeRef::Named(name) => self.lookup(name).ok(),
            ThemeRef::Inline(theme) => Some(theme),
        }
    }

    /// Get a theme by name, custom registrations first
    pub fn lookup(&self, name: &str) -> Result<&Theme> {
        self.custom
            .get(name)
            .or_else(|| self.builtins.get(name))
            .ok_or_else(|| TableError::Configuration(format!("unknown theme '{name}'")))
    }

    /// Check if a theme exists
    pub fn has(&self, name: &str) -> bool {
        self.custom.contains_key(name) || self.builtins.contains_key(name)
    }

    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    /// List all available theme names (sorted)
    pub fn list_themes(&self) -> Vec<String> {
        let mut names: Vec<_> = self
            .builtins
            .keys()
            .chain(self.custom.keys())
            .cloned()
            .collect();
        names.sort();
        names.dedup();
        names
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: Lazy<RwLock<ThemeRegistry>> = Lazy::new(|| RwLock::new(ThemeRegistry::new()));

/// The process-wide registry
pub fn global() -> &'static RwLock<ThemeRegistry> {
    &GLOBAL
}

/// Read access to the process-wide registry.
///
/// A writer that panicked cannot leave the map half-updated (every mutation is
/// a single insert/remove), so a poisoned lock is still safe to read.
pub fn read_global() -> RwLockReadGuard<'static, ThemeRegistry> {
    GLOBAL.read().unwrap_or_else(PoisonError::into_inner)
}

fn write_global() -> RwLockWriteGuard<'static, ThemeRegistry> {
    GLOBAL.write().unwrap_or_else(PoisonError::into_inner)
}

/// [`ThemeRegistry::register`] on the process-wide registry
pub fn register_theme(theme: Theme, name: Option<&str>, overwrite: bool) -> Result<()> {
    write_global().register(theme, name, overwrite)
}

/// [`ThemeRegistry::unregister`] on the process-wide registry
pub fn unregister_theme(name: &str) -> bool {
    write_global().unregister(name)
}

/// [`ThemeRegistry::clear`] on the process-wide registry
pub fn clear_themes() -> usize {
    write_global().clear()
}

/// [`ThemeRegistry::set_current`] on the process-wide registry
pub fn set_current_theme(theme: Option<ThemeRef>) -> Result<()> {
    write_global().set_current(theme)
}

/// A copy of the process-wide current theme
pub fn current_theme() -> Option<Theme> {
    read_global().current().cloned()
}
