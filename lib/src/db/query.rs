//! Typed filters over stored collections.

use crate::post::{Post, Status};
use crate::profile::{Profile, Role};
use crate::UserId;

/// Filter over posts. Unset fields match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PostQuery {
    pub status: Option<Status>,
    pub author: Option<UserId>,
    pub category: Option<String>,
    pub tag: Option<String>,
}

impl PostQuery {
    pub fn published() -> Self {
        Self {
            status: Some(Status::Published),
            ..Default::default()
        }
    }

    pub fn by_author(author: UserId) -> Self {
        Self {
            author: Some(author),
            ..Default::default()
        }
    }

    /// Restricts to the category, ignoring empty values.
    pub fn category(mut self, category: Option<String>) -> Self {
        self.category = category.filter(|c| !c.is_empty());
        self
    }

    /// Restricts to posts carrying the tag, ignoring empty values.
    pub fn tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag.filter(|t| !t.is_empty());
        self
    }

    pub fn matches(&self, post: &Post) -> bool {
        self.status.map_or(true, |s| post.status == s)
            && self.author.map_or(true, |a| post.author_id == a)
            && self.category.as_ref().map_or(true, |c| &post.category == c)
            && self.tag.as_ref().map_or(true, |t| post.tags.contains(t))
    }
}

/// Filter over profiles, used by the admin user listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProfileQuery {
    pub role: Option<Role>,
    /// Case-insensitive substring of the profile name.
    pub search: Option<String>,
}

impl ProfileQuery {
    pub fn matches(&self, profile: &Profile) -> bool {
        self.role.map_or(true, |r| profile.role == r)
            && self.search.as_ref().map_or(true, |s| {
                profile.name.to_lowercase().contains(&s.to_lowercase())
            })
    }
}

/// Normalized pagination parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    /// One-based page number.
    pub page: usize,
    pub limit: usize,
}

impl PageRequest {
    /// Builds a page request from raw query values. A page below 1 becomes
    /// 1, a limit outside `1..=max` becomes `default`. Unparsable values are
    /// treated as absent.
    pub fn parse(page: Option<&str>, limit: Option<&str>, default: usize, max: usize) -> Self {
        let page = page
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1) as usize;
        let limit = limit
            .and_then(|l| l.trim().parse::<i64>().ok())
            .filter(|l| *l >= 1 && *l as usize <= max)
            .map(|l| l as usize)
            .unwrap_or(default);
        Self { page, limit }
    }

    pub fn skip(&self) -> usize {
        (self.page - 1) * self.limit
    }

    /// Cuts the page out of an already sorted list.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items.into_iter().skip(self.skip()).take(self.limit).collect()
    }
}
