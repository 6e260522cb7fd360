use crate::cache::{CacheConfig, CacheStats, ValueCache};
use crate::endpoints::GenreApi;
use crate::error::{Error, ErrorContext, Result};
use crate::mapper::GenreMapper;
use crate::models::Genre;
use crate::network::request::RequestBuilder;
use crate::network::Network;

/// Movie genres, fetched once and shared.
#[derive(Clone)]
pub struct GenreService {
    genres: ValueCache<Vec<Genre>, Error>,
}

impl GenreService {
    pub fn new(network: Network, request_builder: RequestBuilder, config: CacheConfig) -> Self {
        let genres = ValueCache::with_config("MoviesGenres", config, move || {
            let request = request_builder.make(&GenreApi::MovieGenres);
            let network = network.clone();
            async move {
                network
                    .request(&request, &GenreMapper, ErrorContext::Genre)
                    .await
            }
        });

        Self { genres }
    }

    pub async fn genres(&self) -> Result<Vec<Genre>> {
        self.genres.value().await
    }

    pub async fn find_genre(&self, id: u64) -> Result<Option<Genre>> {
        let genres = self.genres.value().await?;
        Ok(genres.into_iter().find(|genre| genre.id() == id))
    }

    /// Drops the cached list, e.g. after a language change.
    pub fn invalidate(&self) {
        self.genres.invalidate();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.genres.stats()
    }
}
