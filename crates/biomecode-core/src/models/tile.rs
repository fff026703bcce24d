use serde::{Deserialize, Serialize};

/// Map layer registered with the remote platform.
///
/// Expiry is managed remotely; nothing here tracks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileHandle {
    pub mapid: String,
    #[serde(default)]
    pub token: String,
}

impl TileHandle {
    pub fn new(mapid: impl Into<String>, token: impl Into<String>) -> Self {
        Self { mapid: mapid.into(), token: token.into() }
    }

    /// `{z}/{x}/{y}` tile URL template rooted at `base_url`
    pub fn url_template(&self, base_url: &str) -> String {
        let base = base_url.trim_end_matches('/');
        if self.token.is_empty() {
            format!("{}/v1/{}/tiles/{{z}}/{{x}}/{{y}}", base, self.mapid)
        } else {
            format!("{}/v1/{}/tiles/{{z}}/{{x}}/{{y}}?token={}", base, self.mapid, self.token)
        }
    }
}
