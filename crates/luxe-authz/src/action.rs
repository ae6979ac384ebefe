use serde::{Deserialize, Serialize};

/// Privileged operations gated by the permission matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Create, update, or delete a property or car listing.
    #[serde(rename = "listing.write")]
    ListingWrite,
    /// Upload images to the media CDN.
    #[serde(rename = "media.upload")]
    MediaUpload,
    /// Read aggregate catalog statistics.
    #[serde(rename = "stats.view")]
    StatsView,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::ListingWrite, Action::MediaUpload, Action::StatsView];

    pub fn as_str(self) -> &'static str {
        match self {
            Action::ListingWrite => "listing.write",
            Action::MediaUpload => "media.upload",
            Action::StatsView => "stats.view",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "listing.write" => Ok(Action::ListingWrite),
            "media.upload" => Ok(Action::MediaUpload),
            "stats.view" => Ok(Action::StatsView),
            _ => Err(()),
        }
    }
}
