// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use tracing::debug;

use crate::error::ListingError;

use super::api::ListingApi;
use super::item::{ChannelItem, ListingPage};

/// One fetched page of the listing
#[derive(Debug, Clone)]
pub struct Page {
    /// 1-based page number
    pub number: u32,
    pub items: Vec<ChannelItem>,
    /// The API returned fewer entries than requested
    pub is_last: bool,
}

/// Walks the channel listing page by page, newest first.
///
/// The cursor only moves forward. Once the walk is finished (short page,
/// empty page, fetch failure or an explicit stop) no further requests are made.
pub struct PageWalker<'a, L: ?Sized> {
    api: &'a L,
    channel: String,
    page_size: u32,
    cursor: u32,
    pages_fetched: u32,
    finished: bool,
}

impl<'a, L: ListingApi + ?Sized> PageWalker<'a, L> {
    pub fn new(api: &'a L, channel: impl Into<String>, page_size: u32) -> Self {
        Self {
            api,
            channel: channel.into(),
            page_size,
            cursor: 1,
            pages_fetched: 0,
            finished: false,
        }
    }

    /// Fetch the next page, or `None` once the channel is exhausted
    pub async fn next_page(&mut self) -> Result<Option<Page>, ListingError> {
        if self.finished {
            return Ok(None);
        }

        let number = self.cursor;
        self.cursor += 1;

        let listing = match self
            .api
            .fetch_page(&self.channel, number, self.page_size)
            .await
        {
            Ok(listing) => listing,
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };
        self.pages_fetched += 1;

        debug!(
            page = number,
            items = listing.items.len(),
            returned = listing.raw_len,
            "fetched listing page"
        );

        if listing.is_empty() {
            self.finished = true;
            return Ok(None);
        }

        // Judge page length by what the API returned, not by what survived parsing
        let is_last = listing.raw_len < self.page_size as usize;
        if is_last {
            self.finished = true;
        }

        Ok(Some(Page {
            number,
            items: listing.items,
            is_last,
        }))
    }

    /// Stop the walk; subsequent calls to `next_page` return `None`
    pub fn stop(&mut self) {
        self.finished = true;
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::error::HttpError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedListing {
        page_sizes: Vec<usize>,
        fail_on: Option<u32>,
        /// Pages whose last entry is rejected while parsing
        rejects_on: Option<u32>,
        calls: Mutex<Vec<u32>>,
    }

    impl ScriptedListing {
        fn new(page_sizes: Vec<usize>) -> Self {
            Self {
                page_sizes,
                fail_on: None,
                rejects_on: None,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ListingApi for ScriptedListing {
        async fn fetch_page(
            &self,
            _channel: &str,
            page: u32,
            _page_size: u32,
        ) -> Result<ListingPage, ListingError> {
            self.calls.lock().unwrap().push(page);
            if self.fail_on == Some(page) {
                return Err(ListingError::Request {
                    page,
                    source: HttpError::Status {
                        url: "https://api.test".to_string(),
                        status: 500,
                    },
                });
            }
            let count = self
                .page_sizes
                .get(page as usize - 1)
                .copied()
                .unwrap_or(0);
            let mut items: Vec<ChannelItem> = (0..count)
                .map(|i| ChannelItem {
                    title: format!("p{page}-{i}"),
                    published_at: None,
                    source_url: format!("https://x.test/@c/p{page}-{i}"),
                })
                .collect();
            if self.rejects_on == Some(page) {
                items.pop();
            }
            Ok(ListingPage {
                items,
                raw_len: count,
            })
        }
    }

    #[tokio::test]
    async fn walk_stops_after_short_page() {
        let listing = ScriptedListing::new(vec![50, 50, 10]);
        let mut walker = PageWalker::new(&listing, "@c", 50);

        let mut seen = Vec::new();
        while let Some(page) = walker.next_page().await.unwrap() {
            seen.push((page.number, page.items.len(), page.is_last));
        }

        assert_eq!(seen, vec![(1, 50, false), (2, 50, false), (3, 10, true)]);
        assert_eq!(walker.pages_fetched(), 3);
        assert_eq!(*listing.calls.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn rejected_entry_does_not_shorten_page() {
        let mut listing = ScriptedListing::new(vec![3, 3, 1]);
        listing.rejects_on = Some(1);
        let mut walker = PageWalker::new(&listing, "@c", 3);

        let mut seen = Vec::new();
        while let Some(page) = walker.next_page().await.unwrap() {
            seen.push((page.number, page.items.len(), page.is_last));
        }

        assert_eq!(seen, vec![(1, 2, false), (2, 3, false), (3, 1, true)]);
        assert_eq!(*listing.calls.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn walk_stops_on_empty_page() {
        let listing = ScriptedListing::new(vec![2, 2]);
        let mut walker = PageWalker::new(&listing, "@c", 2);

        let mut pages = 0;
        while walker.next_page().await.unwrap().is_some() {
            pages += 1;
        }

        assert_eq!(pages, 2);
        // Third request returned nothing and ended the walk
        assert_eq!(*listing.calls.lock().unwrap(), vec![1, 2, 3]);
        assert!(walker.next_page().await.unwrap().is_none());
        assert_eq!(listing.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn walk_is_fail_stop() {
        let mut listing = ScriptedListing::new(vec![3, 3, 3]);
        listing.fail_on = Some(2);
        let mut walker = PageWalker::new(&listing, "@c", 3);

        assert!(walker.next_page().await.unwrap().is_some());
        assert!(walker.next_page().await.is_err());
        assert!(walker.is_finished());
        assert!(walker.next_page().await.unwrap().is_none());
        assert_eq!(*listing.calls.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn stop_prevents_further_requests() {
        let listing = ScriptedListing::new(vec![3, 3, 3]);
        let mut walker = PageWalker::new(&listing, "@c", 3);

        assert!(walker.next_page().await.unwrap().is_some());
        walker.stop();
        assert!(walker.next_page().await.unwrap().is_none());
        assert_eq!(*listing.calls.lock().unwrap(), vec![1]);
    }
}
