use movie_info::{ClientConfig, ImageSize, Phase, TheMovieDb};
use std::path::Path;

/// Lists the first two pages of now playing movies with their genres.
///
/// Reads `movie-info.yaml` when present, the key can also come from
/// `MOVIE_INFO_API_KEY`.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let path = Path::new("movie-info.yaml");
    let config = ClientConfig::load(path.exists().then_some(path))?;
    let db = TheMovieDb::new(config);

    let genres = db.genres().genres().await?;
    println!("{} genres available", genres.len());

    let feed = db.movies().now_playing();
    feed.start(());
    let mut state = feed.settled().await;
    if feed.load_next() {
        state = feed.settled().await;
    }

    if let Phase::Failed(err) = state.phase() {
        println!("Stopped on page {}: {}", state.current_page(), err);
    }

    for movie in state.items() {
        let names: Vec<&str> = movie
            .genre_ids()
            .iter()
            .filter_map(|id| genres.iter().find(|genre| genre.id() == *id))
            .map(|genre| genre.name().as_str())
            .collect();
        println!("{:>8}  {}  [{}]", movie.id(), movie.title(), names.join(", "));
    }

    if let Some(movie) = state.items().iter().find(|movie| movie.poster_path().is_some()) {
        let poster = db.images().find_image(movie, ImageSize::W185).await?;
        println!("Poster of {}: {} bytes from {}", movie.title(), poster.data().len(), poster.url());
    }

    println!("Image cache: {:?}", db.image_cache_stats());
    Ok(())
}
