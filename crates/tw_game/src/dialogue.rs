use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Dialogue text keyed by the boundary name that triggers it.
#[derive(Debug, Clone, Default)]
pub struct DialogueTable {
    entries: HashMap<String, String>,
}

impl DialogueTable {
    pub fn from_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, zone: &str) -> Option<&str> {
        self.entries.get(zone).map(String::as_str)
    }

    pub fn contains(&self, zone: &str) -> bool {
        self.entries.contains_key(zone)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn load_dialogue_from_path(path: &Path) -> Result<DialogueTable, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read dialogue file {}: {e}", path.display()))?;
    let entries: HashMap<String, String> = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse dialogue JSON {}: {e}", path.display()))?;
    let table = DialogueTable::from_entries(entries);
    validate_dialogue(&table)?;
    Ok(table)
}

fn validate_dialogue(table: &DialogueTable) -> Result<(), String> {
    for (zone, text) in &table.entries {
        if zone.trim().is_empty() {
            return Err("Dialogue validation failed: empty zone name".to_string());
        }
        if text.trim().is_empty() {
            return Err(format!(
                "Dialogue validation failed: entry '{zone}' has no text"
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "tw_dialogue_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn loads_zone_to_text_map() {
        let path = temp_file_path("valid");
        fs::write(
            &path,
            r#"{ "pc": "This is my PC.", "bed": "Not sleepy yet." }"#,
        )
        .expect("write temp file");

        let table = load_dialogue_from_path(&path).expect("dialogue should load");
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("pc"), Some("This is my PC."));
        assert!(table.contains("bed"));
        assert_eq!(table.get("tv"), None);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn rejects_blank_text() {
        let path = temp_file_path("blank");
        fs::write(&path, r#"{ "pc": "   " }"#).expect("write temp file");
        let err = load_dialogue_from_path(&path).expect_err("blank text should fail");
        assert!(err.contains("'pc' has no text"));
        let _ = fs::remove_file(path);
    }
}
