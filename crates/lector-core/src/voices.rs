//! Voice catalog for the synthesis engine.
//!
//! A fixed table of British English voices and the quality levels each one
//! ships in. Asset names follow the engine's convention:
//! `en_GB-{voice}-{quality}.onnx` plus a sidecar `.onnx.json` config.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Voice used when the user has not picked one.
pub const DEFAULT_VOICE: &str = "jenny_dioco";

/// Quality level a voice model ships in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceQuality {
    /// Higher fidelity, larger model.
    Medium,
    /// Smaller, faster model.
    Low,
}

impl VoiceQuality {
    /// Label used in asset file names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for VoiceQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the voice catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Voice {
    /// Catalog name, e.g. `jenny_dioco`.
    pub name: &'static str,
    /// Quality levels this voice ships in, best first.
    pub qualities: &'static [VoiceQuality],
}

/// The full catalog, in display order.
pub const CATALOG: &[Voice] = &[
    Voice {
        name: "alan",
        qualities: &[VoiceQuality::Medium, VoiceQuality::Low],
    },
    Voice {
        name: "alba",
        qualities: &[VoiceQuality::Medium],
    },
    Voice {
        name: "aru",
        qualities: &[VoiceQuality::Medium],
    },
    Voice {
        name: "cori",
        qualities: &[VoiceQuality::Medium],
    },
    Voice {
        name: "jenny_dioco",
        qualities: &[VoiceQuality::Medium],
    },
    Voice {
        name: "northern_english_male",
        qualities: &[VoiceQuality::Medium],
    },
    Voice {
        name: "semaine",
        qualities: &[VoiceQuality::Medium],
    },
    Voice {
        name: "southern_english_female",
        qualities: &[VoiceQuality::Low],
    },
    Voice {
        name: "vctk",
        qualities: &[VoiceQuality::Medium],
    },
];

impl Voice {
    /// Look up a voice by catalog name.
    #[must_use]
    pub fn find(name: &str) -> Option<&'static Self> {
        CATALOG.iter().find(|v| v.name == name)
    }

    /// The default voice entry. The catalog always contains it.
    #[must_use]
    pub fn default_voice() -> &'static Self {
        CATALOG
            .iter()
            .find(|v| v.name == DEFAULT_VOICE)
            .unwrap_or(&CATALOG[0])
    }

    /// Best quality this voice ships in.
    #[must_use]
    pub fn best_quality(&self) -> VoiceQuality {
        self.qualities.first().copied().unwrap_or(VoiceQuality::Low)
    }

    /// Model asset file name for a quality level.
    #[must_use]
    pub fn model_file(&self, quality: VoiceQuality) -> String {
        format!("en_GB-{}-{}.onnx", self.name, quality)
    }

    /// Sidecar config file name for a quality level.
    #[must_use]
    pub fn config_file(&self, quality: VoiceQuality) -> String {
        format!("{}.json", self.model_file(quality))
    }

    /// Full path of the model asset under a voices directory.
    #[must_use]
    pub fn model_path(&self, voices_dir: &std::path::Path, quality: VoiceQuality) -> PathBuf {
        voices_dir.join(self.model_file(quality))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_voice_is_in_catalog() {
        let voice = Voice::default_voice();
        assert_eq!(voice.name, DEFAULT_VOICE);
        assert_eq!(voice.best_quality(), VoiceQuality::Medium);
    }

    #[test]
    fn lookup_by_name() {
        assert!(Voice::find("alan").is_some());
        assert!(Voice::find("nonexistent").is_none());
    }

    #[test]
    fn asset_names_follow_engine_convention() {
        let alan = Voice::find("alan").unwrap();
        assert_eq!(alan.model_file(VoiceQuality::Low), "en_GB-alan-low.onnx");
        assert_eq!(
            alan.config_file(VoiceQuality::Low),
            "en_GB-alan-low.onnx.json"
        );
    }

    #[test]
    fn southern_english_female_only_ships_low() {
        let voice = Voice::find("southern_english_female").unwrap();
        assert_eq!(voice.qualities, &[VoiceQuality::Low]);
        assert_eq!(voice.best_quality(), VoiceQuality::Low);
    }
}
