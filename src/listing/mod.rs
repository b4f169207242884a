mod api;
mod item;
mod walker;

pub use api::{ClaimSearchApi, ListingApi};
pub use item::{ChannelItem, ListingPage, parse_listing};
pub use walker::{Page, PageWalker};
