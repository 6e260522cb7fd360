use crate::cache::{CacheConfig, CacheStats, KeyedValueCache};
use crate::endpoints::ImageApi;
use crate::error::{Error, ErrorContext, Result};
use crate::mapper::ImageMapper;
use crate::models::{Image, ImageSize, Movie};
use crate::network::request::{Request, RequestBuilder};
use crate::network::Network;

/// Poster downloads, cached per request.
#[derive(Clone)]
pub struct ImageService {
    request_builder: RequestBuilder,
    images: KeyedValueCache<Request, Image, Error>,
}

impl ImageService {
    pub fn new(network: Network, request_builder: RequestBuilder, config: CacheConfig) -> Self {
        let images = KeyedValueCache::with_config("Images", config, move |request: Request| {
            let network = network.clone();
            async move {
                let mapper = ImageMapper::new(request.url().clone());
                network.request(&request, &mapper, ErrorContext::Image).await
            }
        });

        Self {
            request_builder,
            images,
        }
    }

    pub async fn find_image(&self, movie: &Movie, size: ImageSize) -> Result<Image> {
        let Some(poster_path) = movie.poster_path() else {
            return Err(Error::MissingPoster {
                movie_id: movie.id(),
            });
        };

        let request = self.request_builder.make(&ImageApi::Movie {
            poster_path: poster_path.clone(),
            size,
        });
        self.images.value(request).await
    }

    pub fn clear_cache(&self) {
        self.images.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.images.stats()
    }
}
