use std::time::Instant;
use surf::middleware::{Middleware, Next};
use surf::{Client, Request, Response, Result, Url};

/// Query parameters whose values never reach the logs.
const REDACTED_PARAMS: &[&str] = &["api_key"];

/// Logs every outgoing request and the status it came back with.
#[derive(Debug, Default, Clone, Copy)]
pub struct SurfLogging;

#[surf::utils::async_trait]
impl Middleware for SurfLogging {
    async fn handle(&self, req: Request, client: Client, next: Next<'_>) -> Result<Response> {
        let method = req.method();
        let url = redacted(req.url());
        log::debug!("--> {} {}", method, url);

        let start = Instant::now();
        let res = next.run(req, client).await;

        match &res {
            Ok(response) => log::debug!(
                "<-- {} {} {} ({:?})",
                method,
                url,
                response.status(),
                start.elapsed()
            ),
            Err(err) => log::warn!("<-- {} {} failed: {}", method, url, err),
        }

        res
    }
}

fn redacted(url: &Url) -> String {
    if url.query().is_none() {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| {
            let value = if REDACTED_PARAMS.contains(&name.as_ref()) {
                "***".to_string()
            } else {
                value.into_owned()
            };
            (name.into_owned(), value)
        })
        .collect();

    let mut url = url.clone();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.to_string()
}
