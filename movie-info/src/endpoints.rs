//! TheMovieDB endpoints used by the services.

use crate::models::ImageSize;
use crate::network::request::{ApiEndpoint, QueryParameter};

const MOVIE_BASE: &str = "api.themoviedb.org/3/movie";
const SEARCH_BASE: &str = "api.themoviedb.org/3/search";
const GENRE_BASE: &str = "api.themoviedb.org/3/genre";
const IMAGE_BASE: &str = "image.tmdb.org/t/p";

fn page_parameter(page: u32) -> QueryParameter {
    QueryParameter::new("page", page)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieApi {
    LatestAddedMovie,
    NowPlaying { page: u32 },
    Popular { page: u32 },
    TopRated { page: u32 },
    Upcoming { page: u32 },
}

impl ApiEndpoint for MovieApi {
    fn base_url(&self) -> &str {
        MOVIE_BASE
    }

    fn path(&self) -> String {
        match self {
            MovieApi::LatestAddedMovie => "latest",
            MovieApi::NowPlaying { .. } => "now_playing",
            MovieApi::Popular { .. } => "popular",
            MovieApi::TopRated { .. } => "top_rated",
            MovieApi::Upcoming { .. } => "upcoming",
        }
        .to_string()
    }

    fn parameters(&self) -> Vec<QueryParameter> {
        match self {
            MovieApi::LatestAddedMovie => Vec::new(),
            MovieApi::NowPlaying { page }
            | MovieApi::Popular { page }
            | MovieApi::TopRated { page }
            | MovieApi::Upcoming { page } => vec![page_parameter(*page)],
        }
    }

    fn requires_auth(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchApi {
    Movies { query: String, page: u32 },
}

impl ApiEndpoint for SearchApi {
    fn base_url(&self) -> &str {
        SEARCH_BASE
    }

    fn path(&self) -> String {
        match self {
            SearchApi::Movies { .. } => "movie".to_string(),
        }
    }

    fn parameters(&self) -> Vec<QueryParameter> {
        match self {
            SearchApi::Movies { query, page } => vec![
                QueryParameter::new("query", query),
                page_parameter(*page),
            ],
        }
    }

    fn requires_auth(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenreApi {
    MovieGenres,
}

impl ApiEndpoint for GenreApi {
    fn base_url(&self) -> &str {
        GENRE_BASE
    }

    fn path(&self) -> String {
        match self {
            GenreApi::MovieGenres => "movie/list".to_string(),
        }
    }

    fn requires_auth(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageApi {
    Movie { poster_path: String, size: ImageSize },
}

impl ApiEndpoint for ImageApi {
    fn base_url(&self) -> &str {
        IMAGE_BASE
    }

    fn path(&self) -> String {
        match self {
            ImageApi::Movie { poster_path, size } => {
                format!("{}/{}", size, poster_path.trim_start_matches('/'))
            }
        }
    }

    fn requires_auth(&self) -> bool {
        false
    }
}
