use std::fmt;
use strum_macros::Display;

/// Failure of the underlying HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("request to {url} failed: {message}")]
    Connection { url: String, message: String },
    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("invalid request url {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

/// The response arrived but could not be turned into the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed json: {0}")]
    Json(String),
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("empty response body")]
    EmptyBody,
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        DecodeError::Json(err.to_string())
    }
}

/// What the library was doing when a request failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorContext {
    LatestAddedMovie,
    NowPlayingMovies,
    PopularMovies,
    TopRatedMovies,
    UpcomingMovies,
    SearchMovies { query: String },
    Genre,
    Image,
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorContext::LatestAddedMovie => f.write_str("fetching the latest added movie"),
            ErrorContext::NowPlayingMovies => f.write_str("fetching now playing movies"),
            ErrorContext::PopularMovies => f.write_str("fetching popular movies"),
            ErrorContext::TopRatedMovies => f.write_str("fetching top rated movies"),
            ErrorContext::UpcomingMovies => f.write_str("fetching upcoming movies"),
            ErrorContext::SearchMovies { query } => write!(f, "searching movies for '{}'", query),
            ErrorContext::Genre => f.write_str("fetching genres"),
            ErrorContext::Image => f.write_str("fetching an image"),
        }
    }
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ErrorKind {
    Transport,
    Decode,
    Domain,
    Config,
}

/// Error surfaced by every service of the library.
///
/// It is `Clone` so one outcome can be broadcast to every waiter of a cache
/// entry or stored inside a failed search state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("transport error while {context}: {source}")]
    Transport {
        context: ErrorContext,
        source: TransportError,
    },
    #[error("decode error while {context}: {source}")]
    Decode {
        context: ErrorContext,
        source: DecodeError,
    },
    #[error("movie {movie_id} doesn't have a poster")]
    MissingPoster { movie_id: u64 },
    #[error("invalid language tag '{0}', expected a value like en-US")]
    InvalidLanguage(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn transport(context: ErrorContext, source: TransportError) -> Self {
        Error::Transport { context, source }
    }

    pub fn decode(context: ErrorContext, source: DecodeError) -> Self {
        Error::Decode { context, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport { .. } => ErrorKind::Transport,
            Error::Decode { .. } => ErrorKind::Decode,
            Error::MissingPoster { .. } | Error::InvalidLanguage(_) => ErrorKind::Domain,
            Error::Config(_) => ErrorKind::Config,
        }
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
