use async_trait::async_trait;

use crate::error::FetchError;
use crate::types::{Anime, FilterSet, Genre, Page, PagedResult};

/// A remote catalog that serves anime one page at a time.
///
/// Implementations map a request to a response and nothing else; pagination
/// state lives in the controller.
#[async_trait]
pub trait PageFetcher: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    async fn fetch(
        &self,
        page: Page,
        filters: &FilterSet,
    ) -> Result<PagedResult<Anime>, FetchError>;

    /// Genres offered in the filter picker.
    async fn list_genres(&self) -> Result<Vec<Genre>, FetchError> {
        Ok(vec![])
    }
}
