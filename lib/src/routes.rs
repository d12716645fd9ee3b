pub const API: &str = "/api/v1";

pub const HEALTH: &str = "/health";

pub const AUTH_REGISTER: &str = "/auth/register";
pub const AUTH_LOGIN: &str = "/auth/login";
pub const AUTH_ME: &str = "/auth/me";

pub const PROFILE: &str = "/profile";
pub const PROFILE_AVATAR: &str = "/profile/avatar";

pub const USERS: &str = "/users";
pub const USER_ROLE: &str = "/users/:id/role";

pub const BLOG_POSTS: &str = "/blog/posts";
pub const BLOG_POSTS_MINE: &str = "/blog/posts/me";
pub const BLOG_POST: &str = "/blog/posts/:slug";

pub const BLOG_UPLOAD: &str = "/blog/upload";
pub const BLOG_UPLOAD_COVER: &str = "/blog/upload/cover";

pub const BLOG_IMAGES: &str = "/blog/images";
pub const BLOG_IMAGE: &str = "/blog/images/:id";
pub const BLOG_IMAGE_VARIANT: &str = "/blog/images/group/:group_id/:size_label";

pub const POST_VIEW: &str = "/blog/posts/:slug/view";
pub const POST_STATS: &str = "/blog/posts/:slug/stats";
pub const POST_LIKE: &str = "/blog/posts/:slug/like";
pub const POST_COMMENTS: &str = "/blog/posts/:slug/comments";
pub const POST_COMMENT: &str = "/blog/posts/:slug/comments/:id";
pub const POST_RECONCILE: &str = "/blog/posts/:slug/reconcile";
