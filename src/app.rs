use crate::api::{ApiClient, FetchError, ThumbnailError};
use crate::launch;
use crate::model::{LibraryEnvelope, LibraryItem};
use crate::thumbnail::Thumbnail;
use image::RgbImage;
use reqwest::Url;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Semaphore, mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Width of one card in terminal columns, borders included.
pub const CARD_WIDTH: u16 = 20;
pub const MAX_COLUMNS: usize = 6;
/// Horizontal padding on each side of the library page.
pub const PAGE_MARGIN: u16 = 1;
/// Card thumbnails downloading at once.
pub const MAX_CARD_LOADS: usize = 4;

/// A card position: section index and item index within it.
pub type CardKey = (usize, usize);

/// Number of card columns that fit in `width`.
pub fn grid_columns(width: u16) -> usize {
    ((width / CARD_WIDTH) as usize).clamp(1, MAX_COLUMNS)
}

/// Outcome of the one library request.
#[derive(Debug)]
pub enum FetchState {
    Loading,
    Failed(String),
    Ready(LibraryEnvelope),
}

/// An item whose detail modal is showing.
#[derive(Debug, Clone)]
pub struct OpenItem {
    pub index: usize,
    pub thumbnail: Thumbnail,
}

/// UI state owned by one library section. The items themselves stay with
/// the fetched envelope and are lent in when needed.
#[derive(Debug, Clone, Default)]
pub struct SectionState {
    pub cursor: usize,
    pub open: Option<OpenItem>,
}

impl SectionState {
    /// Open the modal for `items[index]`. `request` tags the thumbnail load.
    pub fn open(
        &mut self,
        items: &[LibraryItem],
        index: usize,
        request: u64,
    ) -> Option<&mut OpenItem> {
        let item = items.get(index)?;
        self.cursor = index;
        self.open = Some(OpenItem {
            index,
            thumbnail: Thumbnail::new(item.thumbnail_source(), request),
        });
        self.open.as_mut()
    }

    pub fn close(&mut self) {
        self.open = None;
    }

    pub fn open_item<'a>(&self, items: &'a [LibraryItem]) -> Option<&'a LibraryItem> {
        self.open.as_ref().and_then(|open| items.get(open.index))
    }
}

/// Events a modal sends to its section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalAction {
    Close,
    OpenTrailer,
    CopyTrailer,
}

/// A finished thumbnail download.
#[derive(Debug)]
pub struct ThumbnailEvent {
    pub request: u64,
    pub result: Result<RgbImage, ThumbnailError>,
}

/// Main application state.
pub struct App {
    pub client: ApiClient,
    pub should_quit: bool,
    pub show_help: bool,

    pub fetch: FetchState,
    pub sections: Vec<SectionState>,
    /// Section that owns keyboard focus.
    pub focused: usize,
    /// Card columns at the current terminal width.
    pub columns: usize,

    pub status_msg: String,

    fetch_rx: Option<oneshot::Receiver<Result<LibraryEnvelope, FetchError>>>,
    fetch_task: Option<JoinHandle<()>>,

    thumbnail_tx: mpsc::UnboundedSender<ThumbnailEvent>,
    thumbnail_rx: mpsc::UnboundedReceiver<ThumbnailEvent>,
    thumbnail_task: Option<JoinHandle<()>>,
    next_request: u64,

    /// Poster slots of cards that have been on screen.
    cards: HashMap<CardKey, Thumbnail>,
    card_tasks: Vec<JoinHandle<()>>,
    card_permits: Arc<Semaphore>,
}

impl App {
    pub fn new(client: ApiClient) -> Self {
        let (thumbnail_tx, thumbnail_rx) = mpsc::unbounded_channel();
        Self {
            client,
            should_quit: false,
            show_help: false,

            fetch: FetchState::Loading,
            sections: Vec::new(),
            focused: 0,
            columns: 1,

            status_msg: "Loading libraries...".to_string(),

            fetch_rx: None,
            fetch_task: None,

            thumbnail_tx,
            thumbnail_rx,
            thumbnail_task: None,
            next_request: 0,

            cards: HashMap::new(),
            card_tasks: Vec::new(),
            card_permits: Arc::new(Semaphore::new(MAX_CARD_LOADS)),
        }
    }

    /// Issue the library request. Only the first call does anything.
    pub fn start_fetch(&mut self) {
        if self.fetch_rx.is_some() || !matches!(self.fetch, FetchState::Loading) {
            return;
        }
        let (tx, rx) = oneshot::channel();
        let client = self.client.clone();
        self.fetch_task = Some(tokio::spawn(async move {
            let result = client.fetch_libraries().await;
            // The receiver is gone if the UI already shut down.
            let _ = tx.send(result);
        }));
        self.fetch_rx = Some(rx);
    }

    /// Drain results that background tasks delivered since the last tick.
    pub fn poll_background(&mut self) {
        if let Some(rx) = self.fetch_rx.as_mut() {
            match rx.try_recv() {
                Ok(result) => {
                    self.fetch_rx = None;
                    self.fetch_task = None;
                    self.finish_fetch(result);
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.fetch_rx = None;
                    self.fetch_task = None;
                    self.finish_fetch(Err(FetchError::Interrupted));
                }
            }
        }

        while let Ok(event) = self.thumbnail_rx.try_recv() {
            self.apply_thumbnail(event);
        }
    }

    /// Leave `Loading` with the fetch outcome. Later results are ignored.
    pub fn finish_fetch(&mut self, result: Result<LibraryEnvelope, FetchError>) {
        if !matches!(self.fetch, FetchState::Loading) {
            debug!("ignoring fetch result after loading finished");
            return;
        }
        match result {
            Ok(envelope) => {
                info!(libraries = envelope.libraries.len(), "libraries loaded");
                self.sections = vec![SectionState::default(); envelope.libraries.len()];
                self.focused = first_non_empty(&envelope).unwrap_or(0);
                self.status_msg = format!("{} libraries loaded", envelope.libraries.len());
                self.fetch = FetchState::Ready(envelope);
            }
            Err(e) => {
                warn!(error = %e, "library fetch failed");
                self.status_msg.clear();
                self.fetch = FetchState::Failed(e.user_message());
            }
        }
    }

    /// Abort background work; anything still in flight is discarded.
    pub fn shutdown(&mut self) {
        if let Some(task) = self.fetch_task.take() {
            task.abort();
        }
        self.fetch_rx = None;
        if let Some(task) = self.thumbnail_task.take() {
            task.abort();
        }
        for task in self.card_tasks.drain(..) {
            task.abort();
        }
        self.card_permits.close();
    }

    pub fn update_viewport(&mut self, width: u16) {
        self.columns = grid_columns(width.saturating_sub(2 * PAGE_MARGIN));
    }

    pub fn envelope(&self) -> Option<&LibraryEnvelope> {
        match &self.fetch {
            FetchState::Ready(envelope) => Some(envelope),
            _ => None,
        }
    }

    fn item_count(&self, section: usize) -> usize {
        self.envelope()
            .and_then(|e| e.libraries.get(section))
            .map_or(0, |library| library.items.len())
    }

    /// Nearest section with items after (or before) `from`.
    fn neighbour(&self, from: usize, forward: bool) -> Option<usize> {
        let len = self.sections.len();
        if forward {
            (from + 1..len).find(|&s| self.item_count(s) > 0)
        } else {
            (0..from).rev().find(|&s| self.item_count(s) > 0)
        }
    }

    fn focus(&mut self, section: usize, cursor: usize) {
        self.focused = section;
        if let Some(state) = self.sections.get_mut(section) {
            state.cursor = cursor;
        }
    }

    pub fn cursor(&self) -> usize {
        self.sections.get(self.focused).map_or(0, |s| s.cursor)
    }

    pub fn move_left(&mut self) {
        let cursor = self.cursor();
        if cursor > 0 {
            self.focus(self.focused, cursor - 1);
        } else if let Some(prev) = self.neighbour(self.focused, false) {
            let last = self.item_count(prev) - 1;
            self.focus(prev, last);
        }
    }

    pub fn move_right(&mut self) {
        let cursor = self.cursor();
        if cursor + 1 < self.item_count(self.focused) {
            self.focus(self.focused, cursor + 1);
        } else if let Some(next) = self.neighbour(self.focused, true) {
            self.focus(next, 0);
        }
    }

    pub fn move_down(&mut self) {
        let columns = self.columns.max(1);
        let cursor = self.cursor();
        let count = self.item_count(self.focused);
        let row = cursor / columns;
        let last_row = count.saturating_sub(1) / columns;

        if cursor + columns < count {
            self.focus(self.focused, cursor + columns);
        } else if count > 0 && row < last_row {
            self.focus(self.focused, count - 1);
        } else if let Some(next) = self.neighbour(self.focused, true) {
            let column = cursor % columns;
            let target = column.min(self.item_count(next) - 1);
            self.focus(next, target);
        }
    }

    pub fn move_up(&mut self) {
        let columns = self.columns.max(1);
        let cursor = self.cursor();
        if cursor >= columns {
            self.focus(self.focused, cursor - columns);
        } else if let Some(prev) = self.neighbour(self.focused, false) {
            let count = self.item_count(prev);
            let last_row_start = (count - 1) / columns * columns;
            let target = (last_row_start + cursor % columns).min(count - 1);
            self.focus(prev, target);
        }
    }

    pub fn next_section(&mut self) {
        if let Some(next) = self.neighbour(self.focused, true) {
            self.focused = next;
        }
    }

    pub fn prev_section(&mut self) {
        if let Some(prev) = self.neighbour(self.focused, false) {
            self.focused = prev;
        }
    }

    pub fn jump_first(&mut self) {
        if let Some(first) = self.envelope().and_then(first_non_empty) {
            self.focus(first, 0);
        }
    }

    pub fn jump_last(&mut self) {
        if let Some(last) = self.neighbour(self.sections.len(), false) {
            let count = self.item_count(last);
            self.focus(last, count - 1);
        }
    }

    /// Open the detail modal for the focused card.
    pub fn open_focused(&mut self) {
        let request = self.next_request + 1;
        let focused = self.focused;
        let FetchState::Ready(envelope) = &self.fetch else {
            return;
        };
        let Some(library) = envelope.libraries.get(focused) else {
            return;
        };
        let Some(section) = self.sections.get_mut(focused) else {
            return;
        };
        let index = section.cursor;
        let Some(open) = section.open(&library.items, index, request) else {
            return;
        };
        self.next_request = request;

        if let Some(task) = self.thumbnail_task.take() {
            task.abort();
        }

        // A card already showing its poster hands the image over.
        if let Some(card) = self.cards.get(&(focused, index)).filter(|t| t.is_loaded()) {
            open.thumbnail = card.clone();
            return;
        }
        let source = open.thumbnail.source().map(str::to_owned);
        if let Some(source) = source {
            self.spawn_thumbnail(request, source);
        }
    }

    fn spawn_thumbnail(&mut self, request: u64, source: String) {
        let client = self.client.clone();
        let tx = self.thumbnail_tx.clone();
        self.thumbnail_task = Some(tokio::spawn(async move {
            let result = client.fetch_thumbnail(&source).await;
            let _ = tx.send(ThumbnailEvent { request, result });
        }));
    }

    /// Start poster loads for cards that just came on screen. Each card is
    /// requested at most once; cards without a thumbnail URL never load.
    pub fn load_card_thumbnails(&mut self, visible: &[CardKey]) {
        let Some(envelope) = self.envelope() else {
            return;
        };
        let fresh: Vec<(CardKey, Option<String>)> = visible
            .iter()
            .filter(|key| !self.cards.contains_key(*key))
            .filter_map(|&(section, index)| {
                let item = envelope.libraries.get(section)?.items.get(index)?;
                Some(((section, index), item.thumbnail_source().map(str::to_owned)))
            })
            .collect();
        if fresh.is_empty() {
            return;
        }

        self.card_tasks.retain(|task| !task.is_finished());
        for (key, source) in fresh {
            self.next_request += 1;
            let request = self.next_request;
            self.cards.insert(key, Thumbnail::new(source.as_deref(), request));
            let Some(source) = source else {
                continue;
            };

            let client = self.client.clone();
            let tx = self.thumbnail_tx.clone();
            let permits = Arc::clone(&self.card_permits);
            self.card_tasks.push(tokio::spawn(async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return;
                };
                let result = client.fetch_thumbnail(&source).await;
                let _ = tx.send(ThumbnailEvent { request, result });
            }));
        }
        debug!(cards = self.cards.len(), "card thumbnails requested");
    }

    pub fn card_thumbnail(&self, section: usize, index: usize) -> Option<&Thumbnail> {
        self.cards.get(&(section, index))
    }

    /// Route a finished thumbnail to the modal or card still waiting on it.
    pub fn apply_thumbnail(&mut self, event: ThumbnailEvent) {
        let ThumbnailEvent { request, result } = event;
        if let Err(e) = &result {
            warn!(request, error = %e, "thumbnail failed to load");
        }
        let waiting = self
            .sections
            .iter_mut()
            .filter_map(|s| s.open.as_mut())
            .map(|open| &mut open.thumbnail)
            .chain(self.cards.values_mut())
            .find(|thumbnail| thumbnail.pending_request() == Some(request));
        match waiting {
            Some(thumbnail) => {
                thumbnail.resolve(request, result);
            }
            None => debug!(request, "dropping stale thumbnail"),
        }
    }

    pub fn close_modal(&mut self) {
        for section in &mut self.sections {
            section.close();
        }
        if let Some(task) = self.thumbnail_task.take() {
            task.abort();
        }
    }

    pub fn modal_open(&self) -> bool {
        self.sections.iter().any(|s| s.open.is_some())
    }

    /// The item and thumbnail of the open modal.
    pub fn modal(&self) -> Option<(&LibraryItem, &Thumbnail)> {
        let envelope = self.envelope()?;
        self.sections
            .iter()
            .zip(envelope.libraries.iter())
            .find_map(|(section, library)| {
                let open = section.open.as_ref()?;
                let item = section.open_item(&library.items)?;
                Some((item, &open.thumbnail))
            })
    }

    pub fn handle_modal_action(&mut self, action: ModalAction) {
        match action {
            ModalAction::Close => self.close_modal(),
            ModalAction::OpenTrailer => self.open_trailer(),
            ModalAction::CopyTrailer => self.copy_trailer(),
        }
    }

    /// The open item's trailer as a web URL. Anything else is refused and
    /// reported in the status bar.
    fn web_trailer(&mut self) -> Option<Url> {
        let (item, _) = self.modal()?;
        let Some(source) = item.trailer_source() else {
            self.status_msg = "No trailer for this item".to_string();
            return None;
        };
        match self.client.resolve(source) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url),
            _ => {
                let source = source.to_string();
                warn!(%source, "refusing non-web trailer link");
                self.status_msg = format!("Unsupported trailer link: {}", source);
                None
            }
        }
    }

    fn open_trailer(&mut self) {
        let Some(link) = self.web_trailer() else {
            return;
        };
        match launch::open_external(link.as_str()) {
            Ok(()) => self.status_msg = format!("Opening: {}", link),
            Err(e) => {
                warn!(%link, error = %e, "could not open trailer");
                self.status_msg = format!("Could not open {}: {}", link, e);
            }
        }
    }

    fn copy_trailer(&mut self) {
        let Some(link) = self.web_trailer() else {
            return;
        };
        self.status_msg = if launch::copy_to_clipboard(link.as_str()) {
            format!("Copied: {}", link)
        } else {
            format!("Link: {} (clipboard not available)", link)
        };
    }
}

fn first_non_empty(envelope: &LibraryEnvelope) -> Option<usize> {
    envelope.libraries.iter().position(|l| !l.items.is_empty())
}
