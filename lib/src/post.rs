use std::str::FromStr;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::{Collectable, Database, Identifiable, PageRequest, PostQuery};
use crate::error::{ErrorKind, Result};
use crate::media::GroupId;
use crate::UserId;

pub type PostId = Uuid;

/// Tree mapping slugs onto post ids.
pub const POST_SLUGS: &str = "post_slugs";

const WORDS_PER_MINUTE: usize = 200;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Status {
    #[default]
    Draft,
    Published,
}

/// Blog post. Engagement counters are kept apart from the post document,
/// see [`PostCounters`](crate::engagement::PostCounters).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Post {
    pub id: PostId,
    pub author_id: UserId,

    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,

    pub cover_image: String,
    /// Image groups of a multi-image cover carousel.
    pub cover_images: Vec<GroupId>,

    pub category: String,
    pub tags: Vec<String>,
    pub status: Status,

    pub meta_title: String,
    pub meta_description: String,

    /// Estimated reading time in minutes.
    pub reading_time: u32,

    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Default for Post {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author_id: Uuid::nil(),
            title: "".to_string(),
            slug: "".to_string(),
            content: "".to_string(),
            excerpt: "".to_string(),
            cover_image: "".to_string(),
            cover_images: vec![],
            category: "".to_string(),
            tags: vec![],
            status: Status::Draft,
            meta_title: "".to_string(),
            meta_description: "".to_string(),
            reading_time: 1,
            published_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Collectable for Post {
    fn get_collection_name() -> &'static str {
        "post"
    }
}

impl Identifiable for Post {
    fn get_id(&self) -> Uuid {
        self.id
    }
}

impl Post {
    pub fn is_published(&self) -> bool {
        self.status == Status::Published
    }

    /// Drafts are only visible to their author.
    pub fn visible_to(&self, viewer: Option<UserId>) -> bool {
        self.is_published() || viewer == Some(self.author_id)
    }
}

/// Input for a new post.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub excerpt: String,
    pub cover_image: String,
    pub cover_images: Vec<GroupId>,
    pub category: String,
    pub tags: Vec<String>,
    pub status: Option<String>,
    pub meta_title: String,
    pub meta_description: String,
}

/// Partial post update. Absent fields are left untouched.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub cover_images: Option<Vec<GroupId>>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub status: Option<String>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

fn parse_status(status: &str) -> Result<Status> {
    Status::from_str(status).map_err(|_| {
        ErrorKind::BadInput("status must be 'draft' or 'published'".to_string()).into()
    })
}

/// Creates and stores a new post, claiming a unique slug derived from the
/// title.
pub fn create(db: &Database, author: UserId, new: NewPost) -> Result<Post> {
    if new.title.trim().is_empty() || new.content.trim().is_empty() {
        return Err(ErrorKind::BadInput("title and content are required".to_string()).into());
    }
    let status = match new.status.as_deref() {
        None | Some("") => Status::Draft,
        Some(s) => parse_status(s)?,
    };

    let now = Utc::now();
    let mut post = Post {
        author_id: author,
        reading_time: estimate_reading_time(&new.content),
        title: new.title,
        content: new.content,
        excerpt: new.excerpt,
        cover_image: new.cover_image,
        cover_images: new.cover_images,
        category: new.category,
        tags: new.tags,
        status,
        meta_title: new.meta_title,
        meta_description: new.meta_description,
        published_at: (status == Status::Published).then_some(now),
        created_at: now,
        updated_at: now,
        ..Default::default()
    };
    post.slug = claim_slug(db, &generate_slug(&post.title), post.id)?;
    db.set(&post)?;

    Ok(post)
}

/// Applies a partial update and stores the result.
///
/// A new title regenerates the slug, new content recomputes the reading
/// time, and the first transition to published stamps `published_at`.
pub fn update(db: &Database, mut post: Post, update: PostUpdate) -> Result<Post> {
    let status = update.status.as_deref().map(parse_status).transpose()?;

    if let Some(title) = update.title {
        if title.trim().is_empty() {
            return Err(ErrorKind::BadInput("title can't be empty".to_string()).into());
        }
        let slug = claim_slug(db, &generate_slug(&title), post.id)?;
        if slug != post.slug {
            release_slug(db, &post.slug, post.id)?;
            post.slug = slug;
        }
        post.title = title;
    }
    if let Some(content) = update.content {
        post.reading_time = estimate_reading_time(&content);
        post.content = content;
    }
    if let Some(excerpt) = update.excerpt {
        post.excerpt = excerpt;
    }
    if let Some(cover_image) = update.cover_image {
        post.cover_image = cover_image;
    }
    if let Some(cover_images) = update.cover_images {
        post.cover_images = cover_images;
    }
    if let Some(category) = update.category {
        post.category = category;
    }
    if let Some(tags) = update.tags {
        post.tags = tags;
    }
    if let Some(meta_title) = update.meta_title {
        post.meta_title = meta_title;
    }
    if let Some(meta_description) = update.meta_description {
        post.meta_description = meta_description;
    }
    if let Some(status) = status {
        post.status = status;
        if status == Status::Published && post.published_at.is_none() {
            post.published_at = Some(Utc::now());
        }
    }
    post.updated_at = Utc::now();

    db.set(&post)?;
    Ok(post)
}

/// Removes the post document and frees its slug. Engagement records are
/// handled by [`purge_post`](crate::engagement::purge_post).
pub fn remove(db: &Database, post: &Post) -> Result<()> {
    db.remove::<Post>(post.id)?;
    release_slug(db, &post.slug, post.id)?;
    Ok(())
}

pub fn find_by_slug(db: &Database, slug: &str) -> Result<Option<Post>> {
    match db.get_key::<PostId>(POST_SLUGS, slug.as_bytes())? {
        Some(id) => db.try_get::<Post>(id),
        None => Ok(None),
    }
}

/// Resolves either a post id or a slug.
pub fn find_by_id_or_slug(db: &Database, key: &str) -> Result<Option<Post>> {
    if let Ok(id) = Uuid::from_str(key) {
        if let Some(post) = db.try_get::<Post>(id)? {
            return Ok(Some(post));
        }
    }
    find_by_slug(db, key)
}

/// Resolves a slug to a published post, the only kind engagement applies to.
pub fn find_published(db: &Database, slug: &str) -> Result<Post> {
    find_by_slug(db, slug)?
        .filter(Post::is_published)
        .ok_or_else(|| ErrorKind::not_found("post").into())
}

/// Ordering applied to post listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sort {
    /// Newest `published_at` first.
    Published,
    /// Most recently edited first.
    Updated,
}

/// Returns one page of posts matching the query together with the total
/// number of matches.
pub fn list(
    db: &Database,
    query: &PostQuery,
    sort: Sort,
    page: PageRequest,
) -> Result<(Vec<Post>, usize)> {
    let mut posts = db
        .get_collection::<Post>()?
        .into_iter()
        .filter(|p| query.matches(p))
        .collect::<Vec<_>>();
    match sort {
        Sort::Published => posts.sort_by(|a, b| b.published_at.cmp(&a.published_at)),
        Sort::Updated => posts.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
    }
    let total = posts.len();
    Ok((page.slice(posts), total))
}

/// Turns a title into a url-friendly slug: lowercase, common latin accents
/// folded, everything that isn't a letter or digit collapsed into single
/// hyphens.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;
    for c in title.to_lowercase().chars().map(fold_accent) {
        if c.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'ã' | 'â' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'õ' | 'ô' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        _ => c,
    }
}

/// Minutes needed to read the content, never less than one.
pub fn estimate_reading_time(content: &str) -> u32 {
    (content.split_whitespace().count() / WORDS_PER_MINUTE).max(1) as u32
}

/// Claims the first free slug among `base`, `base-2`, `base-3`, ... for the
/// post. A slug already held by the same post counts as free.
pub fn claim_slug(db: &Database, base: &str, post: PostId) -> Result<String> {
    let base = if base.is_empty() { "post" } else { base };
    let mut counter = 1;
    loop {
        let candidate = if counter == 1 {
            base.to_string()
        } else {
            format!("{}-{}", base, counter)
        };
        if db.insert_if_absent(POST_SLUGS, candidate.as_bytes(), &post)? {
            return Ok(candidate);
        }
        if db.get_key::<PostId>(POST_SLUGS, candidate.as_bytes())? == Some(post) {
            return Ok(candidate);
        }
        counter += 1;
    }
}

fn release_slug(db: &Database, slug: &str, post: PostId) -> Result<()> {
    if db.get_key::<PostId>(POST_SLUGS, slug.as_bytes())? == Some(post) {
        db.remove_key(POST_SLUGS, slug.as_bytes())?;
    }
    Ok(())
}
