//! Client for The Movie Database API.
//!
//! [`TheMovieDb`] wires a [`Session`], a [`RequestBuilder`] and a
//! [`Transport`] into the services exposed by the library. Genres and
//! posters are kept in single-flight caches, listings and searches are
//! exposed as paginated [`SearchController`]s.

pub mod cache;
pub mod config;
pub mod endpoints;
mod error;
pub mod mapper;
pub mod models;
pub mod network;
pub mod search;
pub mod services;


pub use cache::{CacheConfig, CacheStats, KeyedValueCache, ValueCache};
pub use config::{CacheSettings, ClientConfig};
pub use error::{DecodeError, Error, ErrorContext, ErrorKind, Result, TransportError};
pub use models::{Genre, Image, ImageSize, Movie};
pub use network::request::{Request, RequestBuilder};
pub use network::session::{Language, Session};
pub use network::{Mapper, Network, SurfTransport, Transport};
pub use search::{Page, Phase, SearchContext, SearchController, SearchState};
pub use services::{GenreService, ImageService, MovieFeed, MovieSearch, MovieService, SearchService};

use getset::Getters;
use std::sync::Arc;

#[derive(Clone, Getters)]
#[get = "pub"]
pub struct TheMovieDb {
    session: Session,
    request_builder: RequestBuilder,
    movies: MovieService,
    search: SearchService,
    genres: GenreService,
    images: ImageService,
}

impl TheMovieDb {
    /// Client talking to the API over HTTP.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_transport(config, Arc::new(SurfTransport::new()))
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let session = Session::new(
            config.api_key().clone(),
            config.user_agent().clone(),
            config.language().clone(),
        );
        let request_builder = RequestBuilder::new(session.clone());
        let network = Network::new(transport);

        log::info!(
            "Movie database client ready (language {})",
            session.language()
        );

        Self {
            movies: MovieService::new(network.clone(), request_builder.clone()),
            search: SearchService::new(network.clone(), request_builder.clone()),
            genres: GenreService::new(
                network.clone(),
                request_builder.clone(),
                config.cache().genres.clone(),
            ),
            images: ImageService::new(network, request_builder.clone(), config.cache().images.clone()),
            session,
            request_builder,
        }
    }

    /// Switches the language of every following request. Genre names are
    /// localized, so the cached list is dropped.
    pub fn set_language(&self, language: Language) {
        self.session.set_language(language);
        self.genres.invalidate();
    }

    pub fn set_api_key(&self, api_key: impl Into<String>) {
        self.session.set_api_key(api_key);
    }

    pub fn genre_cache_stats(&self) -> CacheStats {
        self.genres.cache_stats()
    }

    pub fn image_cache_stats(&self) -> CacheStats {
        self.images.cache_stats()
    }
}
