use crate::endpoints::SearchApi;
use crate::error::{Error, ErrorContext};
use crate::mapper::MoviesMapper;
use crate::models::Movie;
use crate::network::request::RequestBuilder;
use crate::network::Network;
use crate::search::SearchController;

/// Movie search driven by a text query. Starting it with a blank query
/// yields an empty, exhausted result without any request.
pub type MovieSearch = SearchController<Movie, String, Error>;

#[derive(Clone)]
pub struct SearchService {
    network: Network,
    request_builder: RequestBuilder,
}

impl SearchService {
    pub fn new(network: Network, request_builder: RequestBuilder) -> Self {
        Self {
            network,
            request_builder,
        }
    }

    pub fn search(&self) -> MovieSearch {
        let network = self.network.clone();
        let request_builder = self.request_builder.clone();

        SearchController::new("SearchMovie", move |page: u32, query: String| {
            log::debug!("Searching '{}', page {}", query, page);
            let request = request_builder.make(&SearchApi::Movies {
                query: query.clone(),
                page,
            });
            let network = network.clone();
            async move {
                network
                    .request(
                        &request,
                        &MoviesMapper::new(page),
                        ErrorContext::SearchMovies { query },
                    )
                    .await
            }
        })
    }
}
