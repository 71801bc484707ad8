//! # Localization Module
//!
//! Risoluzione delle stringhe mostrate all'utente a partire da una coppia
//! (chiave, tabella) e da una lingua preferita configurata.
//!
//! ## Responsabilità:
//! - Definisce il trait `Localizer` consumato da errori e risposte
//! - Fornisce `StringTables`, implementazione in memoria con tabelle di default
//! - Carica tabelle aggiuntive da file JSON (`{locale: {table: {key: text}}}`)
//! - Sostituzione di placeholder `{nome}` nei messaggi
//!
//! ## Fallback:
//! 1. Lingua preferita
//! 2. Inglese (`en`)
//! 3. La chiave stessa

use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use tracing::debug;

/// Tabella dei messaggi della bridge
pub const PICKER_TABLE: &str = "SOSPicker";
/// Tabella dei messaggi del picker nativo
pub const GALLERY_TABLE: &str = "GMImagePicker";

const FALLBACK_LOCALE: &str = "en";

type Table = HashMap<String, String>;

/// Resolves a (key, table) pair to a display string
pub trait Localizer: Send + Sync {
    fn lookup(&self, key: &str, table: &str) -> Option<String>;

    fn localized(&self, key: &str, table: &str) -> String {
        self.lookup(key, table).unwrap_or_else(|| key.to_string())
    }

    fn format(&self, key: &str, table: &str, args: &[(&str, &str)]) -> String {
        args.iter().fold(self.localized(key, table), |text, (name, value)| {
            text.replace(&format!("{{{}}}", name), value)
        })
    }
}

/// In-memory string tables keyed by locale, then table name
pub struct StringTables {
    preferred: RwLock<String>,
    locales: HashMap<String, HashMap<String, Table>>,
}

impl StringTables {
    /// Tabelle vuote, senza nemmeno i default inglesi
    pub fn empty() -> Self {
        Self {
            preferred: RwLock::new(FALLBACK_LOCALE.to_string()),
            locales: HashMap::new(),
        }
    }

    pub fn with_defaults() -> Self {
        let mut tables = Self::empty();
        for (key, text) in [
            ("permission_denied", "Access to your photos was denied. Allow access in Settings to continue."),
            ("request_in_progress", "Another media request is already in progress."),
            ("invalid_configuration", "Invalid picker options: {detail}"),
            ("all_too_large", "Every selected item is above the maximum allowed size."),
            ("all_failed", "None of the selected items could be exported."),
            ("size_limit_exceeded", "Media above the size limit were not included."),
            ("video_export_failed", "Some videos could not be exported."),
            ("export_failed", "Some items could not be exported."),
            ("picker_failed", "Error: {detail}"),
            ("request_aborted", "The media request was interrupted."),
            ("file_access", "Cannot access file. (-1)"),
        ] {
            tables.insert(FALLBACK_LOCALE, PICKER_TABLE, key, text);
        }
        for (key, text) in [
            ("picker.navigation.title", "Photos"),
            ("picker.action.done", "Done"),
            ("picker.action.cancel", "Cancel"),
            ("picker.selection.limit", "You can only select up to {count} item(s)"),
        ] {
            tables.insert(FALLBACK_LOCALE, GALLERY_TABLE, key, text);
        }
        tables
    }

    pub fn insert(&mut self, locale: &str, table: &str, key: &str, text: &str) {
        self.locales
            .entry(locale.to_string())
            .or_default()
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), text.to_string());
    }

    /// Merge tables from a JSON file shaped `{locale: {table: {key: text}}}`
    pub async fn load_file(&mut self, path: &Path) -> Result<usize> {
        let content = tokio::fs::read_to_string(path).await?;
        let parsed: HashMap<String, HashMap<String, Table>> = serde_json::from_str(&content)?;

        let mut count = 0;
        for (locale, tables) in parsed {
            for (table, entries) in tables {
                for (key, text) in entries {
                    self.insert(&locale, &table, &key, &text);
                    count += 1;
                }
            }
        }
        debug!("Loaded {} localized strings from {}", count, path.display());
        Ok(count)
    }

    pub fn set_preferred_language(&self, locale: &str) {
        match self.preferred.write() {
            Ok(mut preferred) => *preferred = locale.to_string(),
            Err(poisoned) => *poisoned.into_inner() = locale.to_string(),
        }
    }

    pub fn preferred_language(&self) -> String {
        match self.preferred.read() {
            Ok(preferred) => preferred.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn lookup_in(&self, locale: &str, key: &str, table: &str) -> Option<String> {
        self.locales.get(locale)?.get(table)?.get(key).cloned()
    }
}

impl Localizer for StringTables {
    fn lookup(&self, key: &str, table: &str) -> Option<String> {
        let preferred = self.preferred_language();
        self.lookup_in(&preferred, key, table)
            .or_else(|| {
                // "it-IT" -> "it"
                let language = preferred.split(['-', '_']).next()?;
                self.lookup_in(language, key, table)
            })
            .or_else(|| self.lookup_in(FALLBACK_LOCALE, key, table))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_fallback_chain() {
        let mut tables = StringTables::with_defaults();
        tables.insert("it", PICKER_TABLE, "request_in_progress", "Una richiesta è già in corso.");
        tables.set_preferred_language("it-IT");

        assert_eq!(
            tables.localized("request_in_progress", PICKER_TABLE),
            "Una richiesta è già in corso."
        );
        // Missing in Italian, falls back to English
        assert_eq!(
            tables.localized("file_access", PICKER_TABLE),
            "Cannot access file. (-1)"
        );
        // Missing everywhere, falls back to the key
        assert_eq!(tables.localized("no_such_key", PICKER_TABLE), "no_such_key");
    }

    #[test]
    fn test_tables_are_separate() {
        let tables = StringTables::with_defaults();
        assert_eq!(tables.lookup("picker.action.done", GALLERY_TABLE).as_deref(), Some("Done"));
        assert!(tables.lookup("picker.action.done", PICKER_TABLE).is_none());
    }

    #[test]
    fn test_format_placeholders() {
        let tables = StringTables::with_defaults();
        let text = tables.format("picker.selection.limit", GALLERY_TABLE, &[("count", "5")]);
        assert_eq!(text, "You can only select up to 5 item(s)");
    }

    #[tokio::test]
    async fn test_load_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("strings.json");
        tokio::fs::write(
            &path,
            r#"{"fr": {"SOSPicker": {"all_failed": "Aucun élément n'a pu être exporté."}}}"#,
        )
        .await
        .unwrap();

        let mut tables = StringTables::with_defaults();
        assert_eq!(tables.load_file(&path).await.unwrap(), 1);
        tables.set_preferred_language("fr");
        assert_eq!(
            tables.localized("all_failed", PICKER_TABLE),
            "Aucun élément n'a pu être exporté."
        );
    }
}
