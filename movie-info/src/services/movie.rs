use crate::endpoints::MovieApi;
use crate::error::{Error, ErrorContext, Result};
use crate::mapper::{MovieMapper, MoviesMapper};
use crate::models::Movie;
use crate::network::request::RequestBuilder;
use crate::network::Network;
use crate::search::SearchController;

/// Paginated movie listing without any search input.
pub type MovieFeed = SearchController<Movie, (), Error>;

#[derive(Clone)]
pub struct MovieService {
    network: Network,
    request_builder: RequestBuilder,
}

impl MovieService {
    pub fn new(network: Network, request_builder: RequestBuilder) -> Self {
        Self {
            network,
            request_builder,
        }
    }

    /// The most recently added movie, `None` when the API returns an
    /// incomplete record.
    pub async fn latest_added_movie(&self) -> Result<Option<Movie>> {
        let request = self.request_builder.make(&MovieApi::LatestAddedMovie);
        self.network
            .request(&request, &MovieMapper, ErrorContext::LatestAddedMovie)
            .await
    }

    pub fn now_playing(&self) -> MovieFeed {
        self.feed(
            "NowPlaying",
            |page| MovieApi::NowPlaying { page },
            ErrorContext::NowPlayingMovies,
        )
    }

    pub fn popular(&self) -> MovieFeed {
        self.feed(
            "Popular",
            |page| MovieApi::Popular { page },
            ErrorContext::PopularMovies,
        )
    }

    pub fn top_rated(&self) -> MovieFeed {
        self.feed(
            "TopRated",
            |page| MovieApi::TopRated { page },
            ErrorContext::TopRatedMovies,
        )
    }

    pub fn upcoming(&self) -> MovieFeed {
        self.feed(
            "Upcoming",
            |page| MovieApi::Upcoming { page },
            ErrorContext::UpcomingMovies,
        )
    }

    fn feed(&self, name: &str, endpoint: fn(u32) -> MovieApi, context: ErrorContext) -> MovieFeed {
        let network = self.network.clone();
        let request_builder = self.request_builder.clone();

        SearchController::new(name, move |page: u32, _: ()| {
            let request = request_builder.make(&endpoint(page));
            let network = network.clone();
            let context = context.clone();
            async move {
                network
                    .request(&request, &MoviesMapper::new(page), context)
                    .await
            }
        })
    }
}
