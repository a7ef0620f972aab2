//! Participant input directory scanning.
//!
//! Walks the fixed subfolder layout (`anthro_data`, `lungs_data`,
//! `meals_data`, `physio_data`) and resolves at most one file per category
//! by extension and filename pattern.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::category::{Category, REGISTRY};

/// Maps each discovered category to its input file.
///
/// Filename matching is case-insensitive. When several files match, the
/// first in file-name-sorted order wins, which keeps discovery deterministic
/// across platforms. A missing subfolder or no matching file means the
/// category is simply absent from the map.
pub fn discover_input_files(base_dir: &Path) -> Result<BTreeMap<Category, PathBuf>> {
    let mut discovered = BTreeMap::new();

    for spec in REGISTRY {
        let subfolder = base_dir.join(spec.subfolder);
        if !subfolder.is_dir() {
            continue;
        }
        let files = sorted_file_names(&subfolder)?;
        let matched = files.iter().find(|name| {
            let lower = name.to_lowercase();
            lower.ends_with(&format!(".{}", spec.extension)) && spec.name_rule.matches(&lower)
        });
        if let Some(name) = matched {
            discovered.insert(spec.category, subfolder.join(name));
        }
    }

    Ok(discovered)
}

/// Lists the participant subdirectories of an input root, sorted by name.
pub fn list_participants(input_dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(input_dir)
        .with_context(|| format!("reading input directory {}", input_dir.display()))?;

    let mut participants = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                participants.push(name.to_string());
            }
        }
    }
    participants.sort();
    Ok(participants)
}

fn sorted_file_names(dir: &Path) -> Result<Vec<String>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("reading directory {}", dir.display()))?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_discovers_physio_files_by_pattern() {
        let base = fixture_dir("health_hub_discover_physio");
        let physio = base.join("physio_data");
        fs::create_dir_all(&physio).unwrap();
        fs::write(physio.join("bp_2024.csv"), "logDate,systolic\n").unwrap();
        fs::write(physio.join("Heartrate_sessions.JSON"), "[]").unwrap();
        fs::write(physio.join("steps_2024.csv"), "logDate,steps\n").unwrap();
        fs::write(physio.join("notes.txt"), "ignored").unwrap();

        let files = discover_input_files(&base).unwrap();
        assert_eq!(files.len(), 3);
        assert!(files[&Category::BloodPressure].ends_with("physio_data/bp_2024.csv"));
        assert!(files[&Category::HeartRate].ends_with("physio_data/Heartrate_sessions.JSON"));
        assert!(files[&Category::Steps].ends_with("physio_data/steps_2024.csv"));

        fs::remove_dir_all(&base).unwrap();
    }

    #[test]
    fn test_missing_subfolders_mean_absent_categories() {
        let base = fixture_dir("health_hub_discover_empty");
        let files = discover_input_files(&base).unwrap();
        assert!(files.is_empty());
        fs::remove_dir_all(&base).unwrap();
    }

    #[test]
    fn test_tie_break_is_name_sorted() {
        let base = fixture_dir("health_hub_discover_tiebreak");
        let meals = base.join("meals_data");
        fs::create_dir_all(&meals).unwrap();
        fs::write(meals.join("b_meals.csv"), "time,dish\n").unwrap();
        fs::write(meals.join("a_meals.csv"), "time,dish\n").unwrap();

        let files = discover_input_files(&base).unwrap();
        assert!(files[&Category::Meals].ends_with("meals_data/a_meals.csv"));

        fs::remove_dir_all(&base).unwrap();
    }

    #[test]
    fn test_extension_must_match_category() {
        let base = fixture_dir("health_hub_discover_ext");
        let physio = base.join("physio_data");
        fs::create_dir_all(&physio).unwrap();
        // spo2 data as CSV does not match the json-only spo2 rule
        fs::write(physio.join("spo2_export.csv"), "logDate,spo2\n").unwrap();

        let files = discover_input_files(&base).unwrap();
        assert!(!files.contains_key(&Category::Spo2));

        fs::remove_dir_all(&base).unwrap();
    }

    #[test]
    fn test_list_participants_sorted_dirs_only() {
        let base = fixture_dir("health_hub_discover_participants");
        fs::create_dir_all(base.join("participant-2")).unwrap();
        fs::create_dir_all(base.join("participant-1")).unwrap();
        fs::write(base.join("stray.json"), "{}").unwrap();

        let participants = list_participants(&base).unwrap();
        assert_eq!(participants, vec!["participant-1", "participant-2"]);

        fs::remove_dir_all(&base).unwrap();
    }
}
