use std::num::NonZeroUsize;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use rowband_core::FilterKind;

pub const DEFAULT_INPUT: &str = "View.bmp";
pub const DEFAULT_OUTPUT: &str = "Processed_Image.bmp";

pub const INPUT_VAR: &str = "ROWBAND_INPUT";
pub const OUTPUT_VAR: &str = "ROWBAND_OUTPUT";
pub const WORKERS_VAR: &str = "ROWBAND_WORKERS";

/// Settings for one run, fixed before any image is read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub mode: FilterKind,
    pub input: PathBuf,
    pub output: PathBuf,
    pub workers: NonZeroUsize,
}

impl RunConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_sources(std::env::args().skip(1), |key| std::env::var(key).ok())
    }

    /// Build from positional arguments (program name excluded) and an
    /// environment lookup.
    pub fn from_sources<I, F>(args: I, env: F) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let Some(mode) = args.into_iter().next() else {
            bail!("usage: rowband <grey|blur>");
        };

        let workers = match env(WORKERS_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<NonZeroUsize>()
                .with_context(|| format!("{WORKERS_VAR} must be a positive integer, got {raw:?}"))?,
            None => std::thread::available_parallelism().unwrap_or(NonZeroUsize::MIN),
        };

        Ok(Self {
            mode: FilterKind::from_mode(&mode),
            input: env(INPUT_VAR).unwrap_or_else(|| DEFAULT_INPUT.into()).into(),
            output: env(OUTPUT_VAR).unwrap_or_else(|| DEFAULT_OUTPUT.into()).into(),
            workers,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(args: &[&str], vars: &[(&str, &str)]) -> Result<RunConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RunConfig::from_sources(args.iter().map(|a| a.to_string()), |key| {
            vars.get(key).cloned()
        })
    }

    #[test]
    fn grey_selects_grayscale() {
        let cfg = config(&["grey"], &[]).unwrap();
        assert_eq!(cfg.mode, FilterKind::Grayscale);
    }

    #[test]
    fn anything_else_selects_blur() {
        for mode in ["blur", "gray", "GREY", "x"] {
            assert_eq!(config(&[mode], &[]).unwrap().mode, FilterKind::Blur);
        }
    }

    #[test]
    fn missing_mode_is_an_error() {
        let err = config(&[], &[]).unwrap_err();
        assert!(err.to_string().contains("usage"));
    }

    #[test]
    fn defaults_match_fixed_file_names() {
        let cfg = config(&["grey"], &[]).unwrap();
        assert_eq!(cfg.input, PathBuf::from("View.bmp"));
        assert_eq!(cfg.output, PathBuf::from("Processed_Image.bmp"));
        assert!(cfg.workers.get() >= 1);
    }

    #[test]
    fn environment_overrides() {
        let cfg = config(
            &["blur"],
            &[
                (INPUT_VAR, "in.bmp"),
                (OUTPUT_VAR, "out.bmp"),
                (WORKERS_VAR, " 6 "),
            ],
        )
        .unwrap();
        assert_eq!(cfg.input, PathBuf::from("in.bmp"));
        assert_eq!(cfg.output, PathBuf::from("out.bmp"));
        assert_eq!(cfg.workers.get(), 6);
    }

    #[test]
    fn invalid_worker_counts_rejected() {
        for raw in ["0", "-2", "many", ""] {
            assert!(config(&["grey"], &[(WORKERS_VAR, raw)]).is_err(), "{raw:?}");
        }
    }

    #[test]
    fn extra_arguments_ignored() {
        let cfg = config(&["grey", "ignored"], &[]).unwrap();
        assert_eq!(cfg.mode, FilterKind::Grayscale);
    }

    #[test]
    fn serialization_roundtrip() {
        let cfg = config(&["grey"], &[(WORKERS_VAR, "3")]).unwrap();
        let json = serde_json::to_string(&cfg).unwrap();
        assert!(json.contains("\"grayscale\""));
        let back: RunConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cfg);
    }
}
