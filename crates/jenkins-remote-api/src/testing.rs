//! In-memory [`HttpSession`] for unit tests

use std::collections::HashMap;
use std::fmt;
use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    PoisonError,
};

use async_trait::async_trait;

use crate::error::{
    JenkinsError,
    JenkinsResult,
};
use crate::transport::{
    Credentials,
    HttpResponse,
    HttpSession,
    PostBody,
};

/// Called after a POST is recorded; may rewrite canned GET responses
pub type PostHook = Arc<dyn Fn(&MockSession, &PostBody) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPost {
    pub url: String,
    pub body: PostBody,
}

#[derive(Default)]
struct State {
    gets: HashMap<String, HttpResponse>,
    post_responses: HashMap<String, HttpResponse>,
    hooks: HashMap<String, PostHook>,
    posts: Vec<RecordedPost>,
    get_counts: HashMap<String, usize>,
}

/// Canned-response session. Clones share state.
///
/// GETs match the exact URL first, then the URL without its query string;
/// anything unknown answers 404. POSTs are recorded and succeed unless a
/// failing response was configured for the URL.
#[derive(Clone, Default)]
pub struct MockSession {
    state: Arc<Mutex<State>>,
    credentials: Option<Credentials>,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(mut self, username: &str, token: &str) -> Self {
        self.credentials = Some(Credentials::new(username, token));
        self
    }

    pub fn shared(&self) -> Arc<dyn HttpSession> {
        Arc::new(self.clone())
    }

    pub fn set_get(&self, url: &str, body: impl Into<String>) {
        self.set_get_response(url, HttpResponse::ok(body));
    }

    pub fn set_json(&self, url: &str, value: serde_json::Value) {
        self.set_get(url, value.to_string());
    }

    pub fn set_get_response(&self, url: &str, response: HttpResponse) {
        self.lock().gets.insert(url.to_string(), response);
    }

    pub fn remove_get(&self, url: &str) {
        self.lock().gets.remove(url);
    }

    /// Canned body of a GET, as last set
    pub fn get_body(&self, url: &str) -> Option<String> {
        self.lock().gets.get(url).map(|r| r.body.clone())
    }

    pub fn set_post_response(&self, url: &str, response: HttpResponse) {
        self.lock().post_responses.insert(url.to_string(), response);
    }

    pub fn on_post<F>(&self, url: &str, hook: F)
    where
        F: Fn(&MockSession, &PostBody) + Send + Sync + 'static,
    {
        self.lock().hooks.insert(url.to_string(), Arc::new(hook));
    }

    pub fn posts(&self) -> Vec<RecordedPost> {
        self.lock().posts.clone()
    }

    pub fn posts_to(&self, url: &str) -> Vec<RecordedPost> {
        self.lock()
            .posts
            .iter()
            .filter(|p| strip_query(&p.url) == strip_query(url))
            .cloned()
            .collect()
    }

    pub fn get_count(&self, url: &str) -> usize {
        self.lock().get_counts.get(url).copied().unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn strip_query(url: &str) -> &str {
    url.split_once('?').map_or(url, |(base, _)| base)
}

fn lookup<'a, V>(map: &'a HashMap<String, V>, url: &str) -> Option<&'a V> {
    map.get(url).or_else(|| map.get(strip_query(url)))
}

fn into_result(url: &str, response: HttpResponse) -> JenkinsResult<HttpResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(JenkinsError::transport(
            url,
            Some(response.status),
            format!("HTTP {}", response.status),
        ))
    }
}

#[async_trait]
impl HttpSession for MockSession {
    async fn get(&self, url: &str) -> JenkinsResult<HttpResponse> {
        let response = {
            let mut state = self.lock();
            *state.get_counts.entry(url.to_string()).or_default() += 1;
            lookup(&state.gets, url).cloned()
        };

        match response {
            Some(response) => into_result(url, response),
            None => Err(JenkinsError::transport(url, Some(404), "Not Found")),
        }
    }

    async fn post(&self, url: &str, body: PostBody) -> JenkinsResult<HttpResponse> {
        let (response, hook) = {
            let mut state = self.lock();
            state.posts.push(RecordedPost {
                url: url.to_string(),
                body: body.clone(),
            });
            (
                lookup(&state.post_responses, url).cloned(),
                lookup(&state.hooks, url).cloned(),
            )
        };

        let response = response.unwrap_or_else(|| HttpResponse::with_status(200));
        let response = into_result(url, response)?;
        if let Some(hook) = hook {
            hook(self, &body);
        }
        Ok(response)
    }

    fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }
}

impl fmt::Debug for MockSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSession")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
