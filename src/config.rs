//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione del processo host della bridge.
//! I limiti per-richiesta (dimensioni, qualità, output) vivono invece in
//! `constraints`, perché arrivano dall'host ad ogni richiesta.
//!
//! ## Responsabilità:
//! - Definisce la struct `BridgeConfig` con i parametri di processo
//! - Fornisce validazione dei parametri
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `workers`: Numero massimo di export paralleli (default: 4)
//! - `temp_root`: Directory padre degli scope temporanei (default: None = temp di sistema)
//! - `locale`: Lingua preferita per i messaggi (default: "en")
//! - `strings_path`: File JSON con tabelle di localizzazione aggiuntive
//! - `default_max_images`: Limite di selezione se l'host non lo specifica (default: 20)
//! - `resize_algorithm`: Filtro di ridimensionamento (default: lanczos)
//!
//! ## Esempio:
//! ```rust,ignore
//! let config = BridgeConfig {
//!     workers: 2,
//!     locale: "it".to_string(),
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use crate::resize::ResizeAlgorithm;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration of the bridge process
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Number of parallel export workers
    pub workers: usize,
    /// Parent directory for request-scoped temp directories (None = system temp)
    pub temp_root: Option<PathBuf>,
    /// Preferred language for user-facing messages
    pub locale: String,
    /// Extra localization tables
    pub strings_path: Option<PathBuf>,
    /// Selection limit when the host does not send `maximumImagesCount`
    pub default_max_images: u32,
    /// Filter used when scaling photos
    pub resize_algorithm: ResizeAlgorithm,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            temp_root: None,
            locale: "en".to_string(),
            strings_path: None,
            default_max_images: 20,
            resize_algorithm: ResizeAlgorithm::Lanczos,
        }
    }
}

impl BridgeConfig {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        if self.default_max_images == 0 {
            return Err(anyhow::anyhow!("Default maximum images must be greater than 0"));
        }

        if self.locale.trim().is_empty() {
            return Err(anyhow::anyhow!("Locale must not be empty"));
        }

        if let Some(ref temp_root) = self.temp_root {
            if !temp_root.is_dir() {
                return Err(anyhow::anyhow!("Temp root is not a directory: {}", temp_root.display()));
            }
        }

        Ok(())
    }

    /// Percorso di default: `~/.media-picker/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".media-picker").join("config.json"))
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: BridgeConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
