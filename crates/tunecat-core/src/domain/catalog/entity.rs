//! Catalog entities
//!
//! Artists own tracks; a track title is unique per artist. Search results are
//! flat `(artist, title)` rows folded into [`TrackGroups`].

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Store-assigned artist identifier
pub type ArtistId = i64;

/// Store-assigned track identifier
pub type TrackId = i64;

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Page size used when the caller does not pick one
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Artist row
///
/// Created implicitly by the first track insert for its name and removed
/// together with its last track.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize, sqlx::FromRow)]
pub struct Artist {
    pub id: ArtistId,
    pub name: String,
}

/// Track row
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize, sqlx::FromRow)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist_id: ArtistId,
}

/// What a search value is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Case-insensitive substring of the track title
    Track,
    /// Exact artist name
    Artist,
}

impl Criterion {
    /// Whether the value is an exact artist name
    pub fn by_author(self) -> bool {
        matches!(self, Self::Artist)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Track => "track",
            Self::Artist => "artist",
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Criterion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "track" => Ok(Self::Track),
            "artist" => Ok(Self::Artist),
            other => Err(Error::InvalidInput(format!(
                "unknown search criterion '{}', expected track|artist",
                other
            ))),
        }
    }
}

/// One-based page window over an ordered result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: u32,
    page_size: u32,
}

impl Pagination {
    /// Validate a page request
    ///
    /// `page` starts at 1; `page_size` must be within `1..=MAX_PAGE_SIZE`.
    pub fn new(page: u32, page_size: u32) -> Result<Self> {
        if page == 0 {
            return Err(Error::InvalidInput("page must be at least 1".to_string()));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(Error::InvalidInput(format!(
                "page size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, page_size
            )));
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// SQL `LIMIT` value
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// SQL `OFFSET` value, `(page - 1) * page_size`
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

/// Track titles grouped by artist name
///
/// Keeps the order in which artists were first seen and, per artist, the
/// order in which titles arrived. Serializes as a JSON object in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackGroups {
    groups: Vec<(String, Vec<String>)>,
}

impl TrackGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold flat `(artist, title)` rows into groups
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut groups = Self::new();
        for (artist, title) in rows {
            groups.push(artist, title);
        }
        groups
    }

    /// Append a title under its artist, creating the group on first sight
    pub fn push(&mut self, artist: String, title: String) {
        match self.groups.iter_mut().find(|(name, _)| *name == artist) {
            Some((_, titles)) => titles.push(title),
            None => self.groups.push((artist, vec![title])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of artists
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Number of titles across all artists
    pub fn track_count(&self) -> usize {
        self.groups.iter().map(|(_, titles)| titles.len()).sum()
    }

    /// Titles for one artist, if present
    pub fn get(&self, artist: &str) -> Option<&[String]> {
        self.groups
            .iter()
            .find(|(name, _)| name == artist)
            .map(|(_, titles)| titles.as_slice())
    }

    /// Artist names in grouping order
    pub fn artists(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(name, titles)| (name.as_str(), titles.as_slice()))
    }

    pub fn into_inner(self) -> Vec<(String, Vec<String>)> {
        self.groups
    }
}

impl Serialize for TrackGroups {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.groups.len()))?;
        for (artist, titles) in &self.groups {
            map.serialize_entry(artist, titles)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(artist: &str, title: &str) -> (String, String) {
        (artist.to_string(), title.to_string())
    }

    #[test]
    fn test_groups_keep_first_seen_order() {
        let groups = TrackGroups::from_rows(vec![
            row("Radiohead", "Airbag"),
            row("Blur", "Song 2"),
            row("Radiohead", "Kid A"),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups.track_count(), 3);
        assert_eq!(groups.artists().collect::<Vec<_>>(), vec!["Radiohead", "Blur"]);
        assert_eq!(
            groups.get("Radiohead").unwrap(),
            &["Airbag".to_string(), "Kid A".to_string()]
        );
        assert!(groups.get("Oasis").is_none());
    }

    #[test]
    fn test_groups_serialize_in_order() {
        let groups = TrackGroups::from_rows(vec![row("Zappa", "Peaches"), row("Abba", "SOS")]);
        let json = serde_json::to_string(&groups).unwrap();
        assert_eq!(json, r#"{"Zappa":["Peaches"],"Abba":["SOS"]}"#);
        assert_eq!(serde_json::to_string(&TrackGroups::new()).unwrap(), "{}");
    }

    #[test]
    fn test_pagination_offsets() {
        let first = Pagination::new(1, 10).unwrap();
        assert_eq!(first.offset(), 0);
        assert_eq!(first.limit(), 10);

        let third = Pagination::new(3, 25).unwrap();
        assert_eq!(third.offset(), 50);
        assert_eq!(third.page(), 3);
        assert_eq!(third.page_size(), 25);
    }

    #[test]
    fn test_pagination_rejects_out_of_range() {
        assert!(matches!(Pagination::new(0, 10), Err(Error::InvalidInput(_))));
        assert!(matches!(Pagination::new(1, 0), Err(Error::InvalidInput(_))));
        assert!(Pagination::new(1, MAX_PAGE_SIZE).is_ok());
        assert!(Pagination::new(1, MAX_PAGE_SIZE + 1).is_err());
    }

    #[test]
    fn test_criterion_parsing() {
        assert_eq!("track".parse::<Criterion>().unwrap(), Criterion::Track);
        assert_eq!(" Artist ".parse::<Criterion>().unwrap(), Criterion::Artist);
        assert!("album".parse::<Criterion>().is_err());
        assert!(Criterion::Artist.by_author());
        assert!(!Criterion::Track.by_author());
        assert_eq!(Criterion::Track.to_string(), "track");
    }
}
