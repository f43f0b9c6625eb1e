use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::error::{AnigridError, FetchError, Result};
use crate::fetcher::PageFetcher;
use crate::types::{Anime, FilterSet, Genre, Page, PagedResult};

pub const DEFAULT_BASE_URL: &str = "https://api.jikan.moe/v4";

pub struct Jikan {
    client: Client,
    base_url: String,
}

impl std::fmt::Debug for Jikan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jikan")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl Jikan {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnigridError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn page_url(&self, page: Page, filters: &FilterSet) -> String {
        match filters.to_query() {
            Some(genres) => format!("{}/anime?page={}&genres={}", self.base_url, page, genres),
            None => format!("{}/anime?page={}", self.base_url, page),
        }
    }

    async fn get_text(&self, url: &str) -> std::result::Result<String, FetchError> {
        tracing::debug!(url, "jikan request");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            return Err(FetchError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(FetchError::Network(format!("Jikan API {}: {}", status, text)));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))
    }
}

// Jikan API response types

#[derive(Deserialize)]
struct JkAnimePage {
    data: Vec<JkAnime>,
    pagination: JkPagination,
}

#[derive(Deserialize)]
struct JkPagination {
    has_next_page: bool,
}

#[derive(Deserialize)]
struct JkAnime {
    mal_id: u64,
    title: String,
    url: Option<String>,
    images: Option<JkImages>,
    episodes: Option<u32>,
    status: Option<String>,
    aired: Option<JkAired>,
    rating: Option<String>,
    score: Option<f32>,
    rank: Option<u32>,
    #[serde(default)]
    genres: Vec<JkGenre>,
}

#[derive(Deserialize)]
struct JkImages {
    jpg: Option<JkImage>,
}

#[derive(Deserialize)]
struct JkImage {
    image_url: Option<String>,
}

#[derive(Deserialize)]
struct JkAired {
    from: Option<String>,
}

#[derive(Deserialize)]
struct JkGenre {
    mal_id: u32,
    name: String,
    count: Option<u32>,
}

#[derive(Deserialize)]
struct JkGenreList {
    data: Vec<JkGenre>,
}

fn parse_datetime(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&chrono::Utc))
        .ok()
}

impl From<JkGenre> for Genre {
    fn from(g: JkGenre) -> Self {
        Genre {
            id: g.mal_id,
            name: g.name,
            count: g.count,
        }
    }
}

impl From<JkAnime> for Anime {
    fn from(a: JkAnime) -> Self {
        Anime {
            id: a.mal_id,
            title: a.title,
            url: a.url,
            image_url: a.images.and_then(|i| i.jpg).and_then(|j| j.image_url),
            age_rating: a.rating,
            score: a.score,
            rank: a.rank,
            status: a.status.unwrap_or_else(|| "Unknown".to_string()),
            episodes: a.episodes,
            genres: a.genres.into_iter().map(Genre::from).collect(),
            aired_from: a.aired.and_then(|d| d.from).as_deref().and_then(parse_datetime),
        }
    }
}

fn decode_page(body: &str) -> std::result::Result<PagedResult<Anime>, FetchError> {
    let page: JkAnimePage =
        serde_json::from_str(body).map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

    Ok(PagedResult {
        items: page.data.into_iter().map(Anime::from).collect(),
        has_more: page.pagination.has_next_page,
    })
}

fn decode_genres(body: &str) -> std::result::Result<Vec<Genre>, FetchError> {
    let list: JkGenreList =
        serde_json::from_str(body).map_err(|e| FetchError::MalformedResponse(e.to_string()))?;
    let mut genres: Vec<Genre> = list.data.into_iter().map(Genre::from).collect();
    genres.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(genres)
}

#[async_trait]
impl PageFetcher for Jikan {
    fn name(&self) -> &str {
        "Jikan"
    }

    async fn fetch(
        &self,
        page: Page,
        filters: &FilterSet,
    ) -> std::result::Result<PagedResult<Anime>, FetchError> {
        let url = self.page_url(page, filters);
        let body = self.get_text(&url).await?;
        decode_page(&body)
    }

    async fn list_genres(&self) -> std::result::Result<Vec<Genre>, FetchError> {
        let url = format!("{}/genres/anime", self.base_url);
        let body = self.get_text(&url).await?;
        decode_genres(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jikan() -> Jikan {
        Jikan::new("https://api.jikan.moe/v4/", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn page_url_without_filters_omits_genres() {
        let url = jikan().page_url(Page::FIRST, &FilterSet::new());
        assert_eq!(url, "https://api.jikan.moe/v4/anime?page=1");
    }

    #[test]
    fn page_url_with_filters_is_sorted_csv() {
        let filters: FilterSet = [22, 1, 4].into_iter().collect();
        let url = jikan().page_url(Page::FIRST.next(), &filters);
        assert_eq!(url, "https://api.jikan.moe/v4/anime?page=2&genres=1,4,22");
    }

    #[test]
    fn decode_page_maps_fields() {
        let body = r#"{
            "pagination": {"last_visible_page": 1093, "has_next_page": true, "current_page": 1},
            "data": [{
                "mal_id": 1,
                "url": "https://myanimelist.net/anime/1/Cowboy_Bebop",
                "images": {"jpg": {"image_url": "https://cdn.myanimelist.net/images/anime/4/19644.jpg"}},
                "title": "Cowboy Bebop",
                "episodes": 26,
                "status": "Finished Airing",
                "aired": {"from": "1998-04-03T00:00:00+00:00", "to": "1999-04-24T00:00:00+00:00"},
                "rating": "R - 17+ (violence & profanity)",
                "score": 8.75,
                "rank": 46,
                "genres": [{"mal_id": 1, "type": "anime", "name": "Action", "url": ""}]
            }]
        }"#;

        let page = decode_page(body).unwrap();
        assert!(page.has_more);
        assert_eq!(page.items.len(), 1);

        let anime = &page.items[0];
        assert_eq!(anime.id, 1);
        assert_eq!(anime.title, "Cowboy Bebop");
        assert_eq!(anime.episodes, Some(26));
        assert_eq!(anime.rank, Some(46));
        assert_eq!(
            anime.image_url.as_deref(),
            Some("https://cdn.myanimelist.net/images/anime/4/19644.jpg")
        );
        assert_eq!(anime.genres[0].name, "Action");
        assert_eq!(
            anime.aired_from.map(|d| d.format("%Y").to_string()),
            Some("1998".to_string())
        );
    }

    #[test]
    fn decode_page_tolerates_nulls() {
        let body = r#"{
            "pagination": {"has_next_page": false},
            "data": [{
                "mal_id": 59999,
                "title": "Untitled",
                "images": null,
                "episodes": null,
                "status": null,
                "aired": {"from": null},
                "rating": null,
                "score": null,
                "rank": null
            }]
        }"#;

        let page = decode_page(body).unwrap();
        assert!(!page.has_more);
        let anime = &page.items[0];
        assert_eq!(anime.status, "Unknown");
        assert_eq!(anime.score, None);
        assert_eq!(anime.image_url, None);
        assert_eq!(anime.aired_from, None);
        assert!(anime.genres.is_empty());
    }

    #[test]
    fn missing_pagination_is_malformed() {
        let err = decode_page(r#"{"data": []}"#).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn missing_has_next_page_is_malformed() {
        let err = decode_page(r#"{"data": [], "pagination": {}}"#).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn non_json_is_malformed() {
        let err = decode_page("<html>").unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn decode_genres_sorts_by_name() {
        let body = r#"{"data": [
            {"mal_id": 4, "name": "Comedy", "count": 7000},
            {"mal_id": 1, "name": "Action", "count": 5000}
        ]}"#;
        let genres = decode_genres(body).unwrap();
        assert_eq!(genres[0].id, 1);
        assert_eq!(genres[1].name, "Comedy");
        assert_eq!(genres[1].count, Some(7000));
    }
}
