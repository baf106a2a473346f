//! External artist search results
//!
//! Fetching from SoundCloud or Spotify happens outside this crate; this
//! module holds the normalized result shape and its conversion into a
//! create payload.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::performer::{NewPerformer, SocialLinks};
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSource {
    SoundCloud,
    Spotify,
}

impl fmt::Display for SearchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchSource::SoundCloud => f.write_str("soundcloud"),
            SearchSource::Spotify => f.write_str("spotify"),
        }
    }
}

impl FromStr for SearchSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soundcloud" => Ok(SearchSource::SoundCloud),
            "spotify" => Ok(SearchSource::Spotify),
            other => Err(Error::InvalidInput(format!("Unknown search source: {}", other))),
        }
    }
}

/// One artist hit from an external search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistSearchResult {
    pub source: SearchSource,
    pub external_id: String,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    /// Profile URL on the source platform
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl ArtistSearchResult {
    /// Create payload for this hit: queue placement, zeroed rubric, the
    /// profile URL filed under the matching platform link
    pub fn into_new_performer(self) -> NewPerformer {
        let links = match self.source {
            SearchSource::SoundCloud => SocialLinks {
                soundcloud_url: self.url,
                ..SocialLinks::default()
            },
            SearchSource::Spotify => SocialLinks {
                spotify_url: self.url,
                ..SocialLinks::default()
            },
        };

        NewPerformer {
            name: self.name,
            bio: self.bio.filter(|b| !b.trim().is_empty()),
            image: self.image,
            links,
            ..NewPerformer::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rubric::Rubric;

    fn hit(source: SearchSource, name: &str, followers: u64) -> ArtistSearchResult {
        ArtistSearchResult {
            source,
            external_id: name.to_lowercase(),
            name: name.to_string(),
            image: None,
            bio: None,
            url: Some(format!("https://{}.example/{}", source, name)),
            followers,
            genres: Vec::new(),
        }
    }

    #[test]
    fn test_import_files_url_under_source() {
        let new = hit(SearchSource::Spotify, "Peggy", 1).into_new_performer();
        assert_eq!(new.name, "Peggy");
        assert_eq!(new.links.spotify_url.as_deref(), Some("https://spotify.example/Peggy"));
        assert_eq!(new.links.soundcloud_url, None);
        assert_eq!(new.tier, None);
        assert_eq!(new.rubric, Rubric::default());

        let new = hit(SearchSource::SoundCloud, "Ben", 1).into_new_performer();
        assert_eq!(new.links.soundcloud_url.as_deref(), Some("https://soundcloud.example/Ben"));
        assert_eq!(new.links.spotify_url, None);
    }

    #[test]
    fn test_source_serde() {
        assert_eq!(serde_json::to_string(&SearchSource::SoundCloud).unwrap(), "\"soundcloud\"");
        assert_eq!("Spotify".parse::<SearchSource>().unwrap(), SearchSource::Spotify);
    }
}
