use chrono::NaiveDate;
use getset::{CopyGetters, Getters};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

#[cfg(feature = "graphql")]
use async_graphql::Enum;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters, CopyGetters)]
pub struct Movie {
    #[get_copy = "pub"]
    id: u64,
    #[get = "pub"]
    title: String,
    #[get = "pub"]
    original_title: Option<String>,
    #[get = "pub"]
    overview: Option<String>,
    #[get = "pub"]
    poster_path: Option<String>,
    #[get = "pub"]
    backdrop_path: Option<String>,
    #[get_copy = "pub"]
    release_date: Option<NaiveDate>,
    #[get = "pub"]
    genre_ids: Vec<u64>,
    #[get_copy = "pub"]
    vote_average: f64,
    #[get_copy = "pub"]
    vote_count: u64,
    #[get_copy = "pub"]
    popularity: f64,
    #[get_copy = "pub"]
    adult: bool,
}

impl Movie {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        title: String,
        original_title: Option<String>,
        overview: Option<String>,
        poster_path: Option<String>,
        backdrop_path: Option<String>,
        release_date: Option<NaiveDate>,
        genre_ids: Vec<u64>,
        vote_average: f64,
        vote_count: u64,
        popularity: f64,
        adult: bool,
    ) -> Self {
        Self {
            id,
            title,
            original_title,
            overview,
            poster_path,
            backdrop_path,
            release_date,
            genre_ids,
            vote_average,
            vote_count,
            popularity,
            adult,
        }
    }

    /// Movie carrying only an id and a title
    pub fn basic(id: u64, title: impl Into<String>) -> Self {
        Self::new(
            id,
            title.into(),
            None,
            None,
            None,
            None,
            None,
            Vec::new(),
            0.0,
            0,
            0.0,
            false,
        )
    }

    pub fn with_poster_path(mut self, poster_path: impl Into<String>) -> Self {
        self.poster_path = Some(poster_path.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Getters, CopyGetters)]
pub struct Genre {
    #[get_copy = "pub"]
    id: u64,
    #[get = "pub"]
    name: String,
}

impl Genre {
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Poster widths offered by the image CDN.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[cfg_attr(feature = "graphql", derive(Enum))]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ImageSize {
    W92,
    W154,
    W185,
    W342,
    W500,
    W780,
    Original,
}

/// Downloaded image and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[get = "pub"]
pub struct Image {
    url: String,
    data: Vec<u8>,
}

impl Image {
    pub fn new(url: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            url: url.into(),
            data,
        }
    }
}
