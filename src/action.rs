use crate::error::AnigridError;
use crate::types::{FetchOutcome, Genre};

#[derive(Debug, Clone)]
pub enum Action {
    Quit,
    ScrollUp,
    ScrollDown,
    PageUp,
    PageDown,
    GoToTop,
    GoToBottom,

    // Pagination
    PageLoaded(FetchOutcome),
    Retry,

    // Genre picker
    OpenGenrePicker,
    GenresLoaded(Vec<Genre>),
    PopupUp,
    PopupDown,
    ToggleGenre,
    ClearGenres,
    ApplyGenres,
    ClosePopup,

    // Selected anime
    OpenInBrowser,
    YankUrl,

    Error(String),
    None,
}

impl From<AnigridError> for Action {
    fn from(err: AnigridError) -> Self {
        Action::Error(err.to_string())
    }
}
