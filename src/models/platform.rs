use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const BUILTIN_PLATFORMS: &str = include_str!("../../data/platforms.json");
const SERVER_ID_PLACEHOLDER: &str = "{serverId}";

/// Page layout of one voting site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformTemplate {
    #[serde(rename = "URL", alias = "url")]
    pub url: String,
    #[serde(rename = "nicknameSelector")]
    pub nickname_selector: String,
    #[serde(rename = "acceptSelector")]
    pub accept_selector: String,
    #[serde(rename = "submitSelector")]
    pub submit_selector: String,
}

impl PlatformTemplate {
    pub fn vote_url(&self, server_id: &str) -> String {
        self.url.replace(SERVER_ID_PLACEHOLDER, server_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PlatformCatalog {
    templates: HashMap<String, PlatformTemplate>,
}

impl PlatformCatalog {
    pub fn builtin() -> Result<Self, String> {
        Self::from_json(BUILTIN_PLATFORMS)
    }

    pub fn from_json(raw: &str) -> Result<Self, String> {
        let templates: HashMap<String, PlatformTemplate> = serde_json::from_str(raw)
            .map_err(|e| format!("failed_to_parse_platform_catalog: {}", e))?;
        let catalog = Self { templates };
        let problems = catalog.problems();
        if !problems.is_empty() {
            return Err(format!("invalid_platform_catalog: {}", problems.join("; ")));
        }
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| format!("failed_to_read_platform_catalog {:?}: {}", path, e))?;
        Self::from_json(&raw)
    }

    pub fn get(&self, platform_id: &str) -> Option<&PlatformTemplate> {
        self.templates.get(platform_id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn problems(&self) -> Vec<String> {
        let mut ids: Vec<&String> = self.templates.keys().collect();
        ids.sort();
        let mut problems = Vec::new();
        for id in ids {
            let template = &self.templates[id];
            if !template.url.contains(SERVER_ID_PLACEHOLDER) {
                problems.push(format!("{}: URL lacks {}", id, SERVER_ID_PLACEHOLDER));
            }
            for (name, value) in [
                ("nicknameSelector", &template.nickname_selector),
                ("acceptSelector", &template.accept_selector),
                ("submitSelector", &template.submit_selector),
            ] {
                if value.trim().is_empty() {
                    problems.push(format!("{}: {} is empty", id, name));
                }
            }
        }
        problems
    }
}
