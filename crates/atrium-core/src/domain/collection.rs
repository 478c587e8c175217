//! Ordered collection editor: positional CRUD and reorder.
//!
//! Both ordered lists of the dashboard (`services` and `newsFeeds`) are edited
//! through the same pure function, [`apply_edit`], which takes the current
//! sequence and an [`Edit`] and either mutates the sequence in place or
//! rejects the edit without touching it.
//!
//! # Positional identity
//!
//! Items carry no stable id.  An item *is* its index, so removing index 2
//! renumbers every item after it, and a move changes the identity of exactly
//! two items.  Callers holding an index from an older snapshot can therefore
//! hit [`EditError::IndexOutOfRange`]; that is reported, never panics, and
//! leaves the sequence unchanged.
//!
//! ```text
//! [A, B, C, D]  Remove(1)    ─► [A, C, D]
//! [A, B, C, D]  MoveUp(2)    ─► [A, C, B, D]
//! [A, B, C, D]  MoveDown(3)  ─► [A, B, C, D]   (boundary, Unchanged)
//! ```

use thiserror::Error;

use crate::domain::config::{Configuration, Feed, Service};

/// One editing operation on an ordered collection of `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit<T> {
    /// Append to the end.
    Add(T),
    /// Replace the element at the index.
    Update(usize, T),
    /// Delete the element at the index; later elements shift down by one.
    Remove(usize),
    /// Swap with the previous element.  No-op at index 0.
    MoveUp(usize),
    /// Swap with the next element.  No-op at the last index.
    MoveDown(usize),
}

/// What an accepted edit did to the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditEffect {
    Changed,
    /// Boundary move; the sequence is exactly as before.
    Unchanged,
}

/// Errors from [`apply_edit`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("index {index} out of range for collection of length {len}")]
    IndexOutOfRange { index: usize, len: usize },
}

impl<T> Edit<T> {
    /// Short name used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Edit::Add(_) => "add",
            Edit::Update(..) => "update",
            Edit::Remove(_) => "remove",
            Edit::MoveUp(_) => "move_up",
            Edit::MoveDown(_) => "move_down",
        }
    }
}

/// Applies `edit` to `items`.
///
/// # Errors
///
/// Returns [`EditError::IndexOutOfRange`] when an indexed edit names a
/// position outside `0..items.len()`.  `items` is not modified in that case.
pub fn apply_edit<T>(items: &mut Vec<T>, edit: Edit<T>) -> Result<EditEffect, EditError> {
    let len = items.len();
    let check = |index: usize| {
        if index < len {
            Ok(index)
        } else {
            Err(EditError::IndexOutOfRange { index, len })
        }
    };

    match edit {
        Edit::Add(item) => {
            items.push(item);
            Ok(EditEffect::Changed)
        }
        Edit::Update(index, item) => {
            items[check(index)?] = item;
            Ok(EditEffect::Changed)
        }
        Edit::Remove(index) => {
            items.remove(check(index)?);
            Ok(EditEffect::Changed)
        }
        Edit::MoveUp(index) => {
            if check(index)? == 0 {
                return Ok(EditEffect::Unchanged);
            }
            items.swap(index - 1, index);
            Ok(EditEffect::Changed)
        }
        Edit::MoveDown(index) => {
            if check(index)? == len - 1 {
                return Ok(EditEffect::Unchanged);
            }
            items.swap(index, index + 1);
            Ok(EditEffect::Changed)
        }
    }
}

// ── Collection selectors ──────────────────────────────────────────────────────

/// Selects one ordered list inside a [`Configuration`].
///
/// Implemented by the marker types [`Services`] and [`NewsFeeds`] so that
/// editing code can be written once and pointed at either list.
pub trait Collection {
    type Item: Clone;

    /// Document key of the list, for logs and messages.
    const NAME: &'static str;

    fn items(config: &Configuration) -> &Vec<Self::Item>;
    fn items_mut(config: &mut Configuration) -> &mut Vec<Self::Item>;
}

/// The service grid.
#[derive(Debug, Clone, Copy)]
pub struct Services;

/// The news feed list.
#[derive(Debug, Clone, Copy)]
pub struct NewsFeeds;

impl Collection for Services {
    type Item = Service;
    const NAME: &'static str = "services";

    fn items(config: &Configuration) -> &Vec<Service> {
        &config.services
    }
    fn items_mut(config: &mut Configuration) -> &mut Vec<Service> {
        &mut config.services
    }
}

impl Collection for NewsFeeds {
    type Item = Feed;
    const NAME: &'static str = "newsFeeds";

    fn items(config: &Configuration) -> &Vec<Feed> {
        &config.news_feeds
    }
    fn items_mut(config: &mut Configuration) -> &mut Vec<Feed> {
        &mut config.news_feeds
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
