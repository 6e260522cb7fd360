mod genre;
mod image;
mod movie;
mod search;

pub use genre::GenreService;
pub use image::ImageService;
pub use movie::{MovieFeed, MovieService};
pub use search::{MovieSearch, SearchService};
