//! Response bodies and their conversion into models.

use crate::error::DecodeError;
use crate::models::{Genre, Image, Movie};
use crate::network::Mapper;
use crate::search::Page;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Deserialize;

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DecodeError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Envelope of every paginated listing.
#[derive(Debug, Deserialize)]
struct PageDto {
    page: Option<u32>,
    results: Option<Vec<serde_json::Value>>,
    total_pages: Option<u32>,
    #[allow(dead_code)]
    total_results: Option<u32>,
}

impl PageDto {
    /// Results that don't convert are left out of the page.
    fn into_page<K>(self, page: u32, transform: impl Fn(serde_json::Value) -> Option<K>) -> Page<K> {
        let number = self.page.unwrap_or(page);
        let has_next_page = number < self.total_pages.unwrap_or(0);
        let items = self
            .results
            .unwrap_or_default()
            .into_iter()
            .filter_map(transform)
            .collect();

        Page::new(number, items, has_next_page)
    }
}

#[derive(Debug, Deserialize)]
struct MovieDto {
    id: Option<u64>,
    title: Option<String>,
    original_title: Option<String>,
    overview: Option<String>,
    poster_path: Option<String>,
    backdrop_path: Option<String>,
    release_date: Option<String>,
    genre_ids: Option<Vec<u64>>,
    // Detail responses carry full genres instead of ids
    genres: Option<Vec<GenreDto>>,
    vote_average: Option<f64>,
    vote_count: Option<u64>,
    popularity: Option<f64>,
    adult: Option<bool>,
}

impl MovieDto {
    fn into_model(self) -> Option<Movie> {
        let genre_ids = match (self.genre_ids, self.genres) {
            (Some(ids), _) => ids,
            (None, Some(genres)) => genres.into_iter().filter_map(|genre| genre.id).collect(),
            (None, None) => Vec::new(),
        };
        let release_date = self
            .release_date
            .and_then(|date| NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok());

        Some(Movie::new(
            self.id?,
            self.title?,
            self.original_title,
            self.overview.filter(|overview| !overview.is_empty()),
            self.poster_path,
            self.backdrop_path,
            release_date,
            genre_ids,
            self.vote_average.unwrap_or_default(),
            self.vote_count.unwrap_or_default(),
            self.popularity.unwrap_or_default(),
            self.adult.unwrap_or_default(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct GenreDto {
    id: Option<u64>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenresDto {
    genres: Option<Vec<GenreDto>>,
}

/// A single movie; `None` when the payload lacks an id or title.
#[derive(Debug, Default, Clone, Copy)]
pub struct MovieMapper;

impl Mapper for MovieMapper {
    type Output = Option<Movie>;

    fn map(&self, bytes: &[u8]) -> Result<Self::Output, DecodeError> {
        Ok(decode::<MovieDto>(bytes)?.into_model())
    }
}

/// One page of a movie listing.
#[derive(Debug, Clone, Copy)]
pub struct MoviesMapper {
    pub page: u32,
}

impl MoviesMapper {
    pub fn new(page: u32) -> Self {
        Self { page }
    }
}

impl Mapper for MoviesMapper {
    type Output = Page<Movie>;

    fn map(&self, bytes: &[u8]) -> Result<Self::Output, DecodeError> {
        let dto: PageDto = decode(bytes)?;
        Ok(dto.into_page(self.page, |value| {
            serde_json::from_value::<MovieDto>(value)
                .ok()
                .and_then(MovieDto::into_model)
        }))
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GenreMapper;

impl Mapper for GenreMapper {
    type Output = Vec<Genre>;

    fn map(&self, bytes: &[u8]) -> Result<Self::Output, DecodeError> {
        let genres = decode::<GenresDto>(bytes)?
            .genres
            .ok_or(DecodeError::MissingField("genres"))?;

        Ok(genres
            .into_iter()
            .filter_map(|genre| Some(Genre::new(genre.id?, genre.name?)))
            .collect())
    }
}

/// Raw image bytes, tagged with the url they were downloaded from.
#[derive(Debug, Clone)]
pub struct ImageMapper {
    pub url: String,
}

impl ImageMapper {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl Mapper for ImageMapper {
    type Output = Image;

    fn map(&self, bytes: &[u8]) -> Result<Self::Output, DecodeError> {
        if bytes.is_empty() {
            return Err(DecodeError::EmptyBody);
        }
        Ok(Image::new(self.url.clone(), bytes.to_vec()))
    }
}
