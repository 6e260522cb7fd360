use super::session::Session;
use getset::{CopyGetters, Getters};
use std::time::Duration;
use strum_macros::{AsRefStr, Display};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const JSON: &str = "application/json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryParameter {
    pub name: String,
    pub value: String,
}

impl QueryParameter {
    pub fn new(name: impl Into<String>, value: impl ToString) -> Self {
        Self {
            name: name.into(),
            value: value.to_string(),
        }
    }
}

/// Describes one remote endpoint.
pub trait ApiEndpoint {
    fn scheme(&self) -> &str {
        "https"
    }

    fn base_url(&self) -> &str;

    fn path(&self) -> String;

    fn parameters(&self) -> Vec<QueryParameter> {
        Vec::new()
    }

    fn method(&self) -> Method {
        Method::Get
    }

    fn requires_auth(&self) -> bool;
}

/// Fully described HTTP request, ready to hand to a transport.
///
/// Requests are plain values; two requests built for the same endpoint with
/// the same session compare equal, which lets them key a cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Getters, CopyGetters)]
pub struct Request {
    #[get_copy = "pub"]
    method: Method,
    /// Url without its query string
    #[get = "pub"]
    url: String,
    #[get = "pub"]
    headers: Vec<(String, String)>,
    #[get = "pub"]
    parameters: Vec<QueryParameter>,
    #[get_copy = "pub"]
    timeout: Duration,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            parameters: Vec::new(),
            timeout: REQUEST_TIMEOUT,
        }
    }

    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.push((name.into(), value.into()));
    }

    pub fn add_parameter(&mut self, parameter: QueryParameter) {
        self.parameters.push(parameter);
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|parameter| parameter.name == name)
            .map(|parameter| parameter.value.as_str())
    }

    /// Url including the percent-encoded query string.
    pub fn full_url(&self) -> String {
        if self.parameters.is_empty() {
            return self.url.clone();
        }

        let query = self
            .parameters
            .iter()
            .map(|parameter| {
                format!(
                    "{}={}",
                    urlencoding::encode(&parameter.name),
                    urlencoding::encode(&parameter.value)
                )
            })
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.url, query)
    }
}

/// Turns endpoints into requests using the session as it is at call time.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    session: Session,
}

impl RequestBuilder {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn make(&self, endpoint: &impl ApiEndpoint) -> Request {
        let url = format!(
            "{}://{}/{}",
            endpoint.scheme(),
            endpoint.base_url(),
            endpoint.path()
        );

        let mut request = Request::new(endpoint.method(), url);
        request.add_header("User-Agent", self.session.user_agent());
        request.add_header("Accept", JSON);

        for parameter in endpoint.parameters() {
            request.add_parameter(parameter);
        }

        request.add_parameter(QueryParameter::new(
            "language",
            self.session.language().as_str(),
        ));

        if endpoint.requires_auth() {
            request.add_parameter(QueryParameter::new("api_key", self.session.api_key()));
        }

        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::session::Language;

    struct Fixture {
        auth: bool,
    }

    impl ApiEndpoint for Fixture {
        fn base_url(&self) -> &str {
            "api.themoviedb.org/3/movie"
        }

        fn path(&self) -> String {
            "popular".to_string()
        }

        fn parameters(&self) -> Vec<QueryParameter> {
            vec![QueryParameter::new("page", 2)]
        }

        fn requires_auth(&self) -> bool {
            self.auth
        }
    }

    fn builder() -> RequestBuilder {
        RequestBuilder::new(Session::new("secret", "movie-info/0.1", Language::default()))
    }

    #[test]
    fn test_builds_authenticated_request() {
        let request = builder().make(&Fixture { auth: true });

        assert_eq!(request.method(), Method::Get);
        assert_eq!(request.url(), "https://api.themoviedb.org/3/movie/popular");
        assert_eq!(request.header("user-agent"), Some("movie-info/0.1"));
        assert_eq!(request.header("Accept"), Some("application/json"));
        assert_eq!(request.parameter("page"), Some("2"));
        assert_eq!(request.parameter("language"), Some("en-US"));
        assert_eq!(request.parameter("api_key"), Some("secret"));
        assert_eq!(request.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_api_key_only_when_required() {
        let request = builder().make(&Fixture { auth: false });

        assert_eq!(request.parameter("api_key"), None);
        assert_eq!(request.parameter("language"), Some("en-US"));
    }

    #[test]
    fn test_language_read_on_every_build() {
        let builder = builder();
        let before = builder.make(&Fixture { auth: true });

        builder
            .session()
            .set_language(Language::new("pt-BR").unwrap());
        let after = builder.make(&Fixture { auth: true });

        assert_eq!(before.parameter("language"), Some("en-US"));
        assert_eq!(after.parameter("language"), Some("pt-BR"));
        assert_ne!(before, after);
    }

    #[test]
    fn test_full_url_encodes_query() {
        let mut request = Request::new(Method::Get, "https://api.themoviedb.org/3/search/movie");
        request.add_parameter(QueryParameter::new("query", "the thing & co"));
        request.add_parameter(QueryParameter::new("page", 1));

        assert_eq!(
            request.full_url(),
            "https://api.themoviedb.org/3/search/movie?query=the%20thing%20%26%20co&page=1"
        );
        assert_eq!(Method::Get.to_string(), "GET");
    }
}
