use crate::{
    catalog::Catalog,
    error::Result,
    net::HttpClient,
    types::{AnimeSummary, SearchRequest, SearchResponse},
};
use async_trait::async_trait;
use serde::Deserialize;

/// Advanced-search response page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdvancedSearchPage {
    #[serde(default)]
    current_page: Option<u32>,
    #[serde(default)]
    has_next_page: bool,
    #[serde(default)]
    results: Vec<AniListMedia>,
}

/// One media entry of a search page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AniListMedia {
    id: MediaId,
    title: MediaTitle,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    cover: Option<String>,
    #[serde(default, rename = "type")]
    format: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    rating: Option<u32>,
    #[serde(default)]
    release_date: Option<u16>,
    #[serde(default)]
    total_episodes: Option<u32>,
    #[serde(default)]
    genres: Vec<String>,
}

/// Ids arrive as strings or numbers depending on the provider.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MediaId {
    Text(String),
    Number(u64),
}

impl MediaId {
    fn into_string(self) -> String {
        match self {
            MediaId::Text(id) => id,
            MediaId::Number(id) => id.to_string(),
        }
    }
}

/// Titles arrive either as a language map or as a single string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MediaTitle {
    Languages {
        #[serde(default)]
        english: Option<String>,
        #[serde(default)]
        romaji: Option<String>,
        #[serde(default, rename = "userPreferred")]
        user_preferred: Option<String>,
        #[serde(default)]
        native: Option<String>,
    },
    Plain(String),
}

impl MediaTitle {
    /// Picks the first non-blank title, English first.
    fn best(self) -> String {
        let candidates = match self {
            MediaTitle::Plain(title) => vec![Some(title)],
            MediaTitle::Languages {
                english,
                romaji,
                user_preferred,
                native,
            } => vec![english, romaji, user_preferred, native],
        };

        candidates
            .into_iter()
            .flatten()
            .map(|title| title.trim().to_string())
            .find(|title| !title.is_empty())
            .unwrap_or_else(|| "Unknown Title".to_string())
    }
}

impl From<AniListMedia> for AnimeSummary {
    fn from(media: AniListMedia) -> Self {
        AnimeSummary {
            id: media.id.into_string(),
            title: media.title.best(),
            image: media.image,
            cover: media.cover,
            format: media.format,
            status: media.status,
            rating: media.rating,
            release_year: media.release_date,
            total_episodes: media.total_episodes,
            genres: media.genres,
        }
    }
}

/// AniList advanced search through a consumet-compatible API.
///
/// # Query Format
///
/// Requests go to `{base}/meta/anilist/advanced-search` with `page`,
/// `perPage` and `type=ANIME`, plus:
///
/// - `query` when non-empty
/// - `genres` and `sort` as JSON arrays (`["Action","Drama"]`)
/// - `year`, `season`, `format`, `status` only when constrained
///
/// # Examples
///
/// ```rust,no_run
/// use kensaku::catalogs::AniListCatalog;
/// use kensaku::prelude::*;
///
/// # async fn example() -> kensaku::Result<()> {
/// let catalog = AniListCatalog::new("https://api.consumet.org");
/// let request = FilterSelection::with_query("frieren").to_request(1, 17);
/// let page = catalog.advanced_search(&request).await?;
/// println!("{} results, more: {}", page.results.len(), page.has_next_page);
/// # Ok(())
/// # }
/// ```
pub struct AniListCatalog {
    client: HttpClient,
    api_base: String,
}

impl AniListCatalog {
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            client: HttpClient::new("anilist")
                .with_rate_limit(250)
                .with_max_retries(2),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    /// Replaces the HTTP client, e.g. to tune rate limiting.
    pub fn with_client(mut self, client: HttpClient) -> Self {
        self.client = client;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Full request URL for `request`.
    pub fn search_url(&self, request: &SearchRequest) -> String {
        format!(
            "{}/meta/anilist/advanced-search?{}",
            self.api_base,
            format_search_query(request)
        )
    }
}

fn format_search_query(request: &SearchRequest) -> String {
    let filters = &request.filters;
    let mut params: Vec<(&str, String)> = Vec::new();

    if !request.query.is_empty() {
        params.push(("query", request.query.clone()));
    }
    params.push(("page", request.page.to_string()));
    params.push(("perPage", request.page_size.to_string()));
    params.push(("type", "ANIME".to_string()));

    if !filters.genres.is_empty() {
        params.push(("genres", json_list(&filters.genres)));
    }
    if !filters.sort.is_empty() {
        params.push(("sort", json_list(&filters.sort)));
    }

    let singles = [
        ("year", &filters.year),
        ("season", &filters.season),
        ("format", &filters.format),
        ("status", &filters.status),
    ];
    for (name, value) in singles {
        if let Some(value) = value {
            params.push((name, value.clone()));
        }
    }

    params
        .iter()
        .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

fn json_list(values: &[String]) -> String {
    serde_json::to_string(values).unwrap_or_else(|_| "[]".to_string())
}

#[async_trait]
impl Catalog for AniListCatalog {
    fn id(&self) -> &str {
        self.client.endpoint()
    }

    async fn advanced_search(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let url = self.search_url(request);
        tracing::debug!(%url, "anilist advanced search");

        let page: AdvancedSearchPage = self.client.get_json(&url).await?;
        tracing::debug!(
            requested = request.page,
            current_page = ?page.current_page,
            results = page.results.len(),
            "anilist page received"
        );
        Ok(SearchResponse {
            results: page.results.into_iter().map(AnimeSummary::from).collect(),
            has_next_page: page.has_next_page,
        })
    }
}
