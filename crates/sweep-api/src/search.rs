use futures_util::stream::Stream;
use reqwest::Method;
use tracing::{debug, warn};

use sweep_types::api::SearchResponse;
use sweep_types::models::{Message, RoomRef};

use crate::client::ApiClient;
use crate::error::TransportError;
use crate::transport::{ApiRequest, Transport};

/// Paginator position. `oldest_message_id` is fixed for the whole sweep;
/// `newest_message_id` only ever moves down.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCursor {
    pub offset: u64,
    pub newest_message_id: u64,
    oldest_message_id: u64,
}

impl SearchCursor {
    pub fn new(oldest_message_id: u64, newest_message_id: u64) -> Self {
        Self {
            offset: 0,
            newest_message_id,
            oldest_message_id,
        }
    }

    pub fn oldest_message_id(&self) -> u64 {
        self.oldest_message_id
    }

    fn contains(&self, id: u64) -> bool {
        self.oldest_message_id <= id && id <= self.newest_message_id
    }
}

/// A filtered page of hits plus the number of hits yielded so far, this batch included.
#[derive(Debug, Clone)]
pub struct SearchBatch {
    pub running_total: u64,
    pub messages: Vec<Message>,
}

/// Walks an author's search results from newest to oldest.
///
/// The search endpoint has no "before ID" parameter, so the sweep relies on
/// two things: results come back newest first, and messages we delete drop
/// out of the index. After each batch the upper bound is pulled below the
/// oldest yielded hit and the same offset is queried again. Pages that hold
/// nothing in range (e.g. messages we failed to delete) are skipped by
/// advancing the offset. Single pass, not restartable.
pub struct SearchPager<'a, T> {
    client: &'a ApiClient<T>,
    room: RoomRef,
    author_id: u64,
    cursor: SearchCursor,
    running_total: u64,
    exhausted: bool,
}

impl<T: Transport> ApiClient<T> {
    pub fn search_by_author(
        &self,
        room: RoomRef,
        author_id: u64,
        oldest_message_id: u64,
        newest_message_id: u64,
    ) -> SearchPager<'_, T> {
        SearchPager::new(self, room, author_id, oldest_message_id, newest_message_id)
    }
}

impl<'a, T: Transport> SearchPager<'a, T> {
    pub fn new(
        client: &'a ApiClient<T>,
        room: RoomRef,
        author_id: u64,
        oldest_message_id: u64,
        newest_message_id: u64,
    ) -> Self {
        Self {
            client,
            room,
            author_id,
            cursor: SearchCursor::new(oldest_message_id, newest_message_id),
            running_total: 0,
            exhausted: false,
        }
    }

    pub fn cursor(&self) -> &SearchCursor {
        &self.cursor
    }

    /// Pull the next non-empty batch, or `None` once the sweep is done.
    /// A failed page request ends the sweep and returns the error.
    pub async fn next_batch(&mut self) -> Result<Option<SearchBatch>, TransportError> {
        while !self.exhausted {
            let page = match self.fetch_page().await {
                Ok(page) => page,
                Err(e) => {
                    self.exhausted = true;
                    return Err(e);
                }
            };

            let page_size = page.page_size() as u64;
            let hits = page.into_hits();
            if hits.len() as u64 != page_size {
                debug!(
                    offset = self.cursor.offset,
                    dropped = page_size - hits.len() as u64,
                    "Search blocks without a hit"
                );
            }

            match hits.first() {
                None => {
                    self.exhausted = true;
                    break;
                }
                Some(first) if first.id < self.cursor.oldest_message_id => {
                    self.exhausted = true;
                    break;
                }
                Some(_) => {}
            }

            if !hits.windows(2).all(|pair| pair[0].id > pair[1].id) {
                warn!(
                    offset = self.cursor.offset,
                    "Search page is not ordered newest first; range narrowing may skip messages"
                );
            }

            let messages: Vec<Message> = hits
                .into_iter()
                .filter(|message| self.cursor.contains(message.id))
                .collect();

            let Some(lowest) = messages.iter().map(|message| message.id).min() else {
                self.cursor.offset += page_size;
                continue;
            };

            self.running_total += messages.len() as u64;
            self.cursor.newest_message_id = lowest.saturating_sub(1);
            if lowest == 0 {
                self.exhausted = true;
            }

            return Ok(Some(SearchBatch {
                running_total: self.running_total,
                messages,
            }));
        }

        Ok(None)
    }

    /// The same sweep as a stream of batches.
    pub fn into_stream(self) -> impl Stream<Item = Result<SearchBatch, TransportError>> + 'a {
        futures_util::stream::try_unfold(self, |mut pager| async move {
            let batch = pager.next_batch().await?;
            Ok::<_, TransportError>(batch.map(|batch| (batch, pager)))
        })
    }

    async fn fetch_page(&self) -> Result<SearchResponse, TransportError> {
        let request = ApiRequest::new(Method::GET, self.room.search_path())
            .query("author_id", self.author_id)
            .query("include_nsfw", true)
            .query("offset", self.cursor.offset)
            .query("sort_by", "timestamp");

        let response = self.client.request(request).await?;
        let page: SearchResponse = response.json()?;
        debug!(
            offset = self.cursor.offset,
            total_results = page.total_results,
            blocks = page.messages.len(),
            "Fetched search page"
        );
        Ok(page)
    }
}
