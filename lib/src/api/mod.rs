//! Request and response bodies of the JSON API.

use chrono::{DateTime, Utc};
use validator::Validate;

use crate::engagement::PostCounters;
use crate::media::GroupId;
use crate::post::Status;
use crate::{Comment, CommentId, Post, PostId, Profile, Role, User, UserId};

#[derive(Clone, Debug, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Account data safe to hand out.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub registration_date: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            registration_date: user.registration_date,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub profile: Profile,
    pub token: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub user: UserResponse,
    pub profile: Profile,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Raw pagination and filter parameters shared by the listing endpoints.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub role: Option<String>,
    pub search: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserListItem {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub avatar: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserListItem>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoleUpdate {
    pub role: String,
}

/// Name and avatar shown next to posts and comments.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuthorInfo {
    pub id: UserId,
    pub name: String,
    pub avatar: String,
}

impl From<&Profile> for AuthorInfo {
    fn from(profile: &Profile) -> Self {
        Self {
            id: profile.user_id,
            name: profile.name.clone(),
            avatar: profile.avatar.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostResponse {
    pub id: PostId,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub cover_image: String,
    pub cover_images: Vec<GroupId>,
    pub category: String,
    pub tags: Vec<String>,
    pub status: Status,
    pub meta_title: String,
    pub meta_description: String,
    pub reading_time: u32,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author: AuthorInfo,
    #[serde(flatten)]
    pub counters: PostCounters,
}

impl PostResponse {
    pub fn new(post: Post, author: AuthorInfo, counters: PostCounters) -> Self {
        Self {
            id: post.id,
            title: post.title,
            slug: post.slug,
            content: post.content,
            excerpt: post.excerpt,
            cover_image: post.cover_image,
            cover_images: post.cover_images,
            category: post.category,
            tags: post.tags,
            status: post.status,
            meta_title: post.meta_title,
            meta_description: post.meta_description,
            reading_time: post.reading_time,
            published_at: post.published_at,
            created_at: post.created_at,
            updated_at: post.updated_at,
            author,
            counters,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommentRequest {
    pub content: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: CommentId,
    pub post_id: PostId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub author_name: String,
    pub author_avatar: String,
}

impl CommentResponse {
    pub fn new(comment: Comment, author: Option<&Profile>) -> Self {
        Self {
            id: comment.id,
            post_id: comment.post_id,
            user_id: comment.user_id,
            content: comment.content,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            author_name: author.map(|p| p.name.clone()).unwrap_or_default(),
            author_avatar: author.map(|p| p.avatar.clone()).unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommentListResponse {
    pub comments: Vec<CommentResponse>,
    pub total: usize,
    pub page: usize,
    pub limit: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VariantResponse {
    pub size_label: String,
    pub width: u32,
    pub url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CoverUploadResponse {
    pub group_id: GroupId,
    pub images: Vec<VariantResponse>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
