//!
//! bloglist storage module
//! -----------------------
//! This module implements the store for bloglist: user identity records and
//! blog records held in memory and persisted as a single JSON snapshot file
//! under a configured root folder (`<root>/bloglist.json`).
//!
//! Key responsibilities:
//! - Credential-store record operations (lookup, validated creation).
//! - Post-registry mutations: create, like, ownership-checked delete.
//! - The popularity-sorted read model for listings.
//! - Crash-safe persistence: a mutation serializes the next snapshot, writes
//!   it to a temp file and renames it over the live one; the in-memory state
//!   is only swapped after the rename succeeds, so memory and disk always
//!   hold either the old state or the new one.
//!
//! The public API centers around the `Store` type, which is wrapped in a
//! thread-safe `SharedStore` (`Arc<Mutex<Store>>`) elsewhere in the codebase.
//! Holding the mutex across the whole read-modify-write is what makes
//! concurrent like increments lossless and keeps a blog and its owner's
//! `blogs` list in step.

use std::{fs, path::{Path, PathBuf}};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::identity::Principal;
use crate::security;

const SNAPSHOT_FILE: &str = "bloglist.json";

/// Minimum length for both usernames and passwords, checked before hashing.
pub const MIN_CREDENTIAL_LEN: usize = 3;

/// A stored user identity record. `password_hash` is an Argon2 PHC string;
/// the plaintext never reaches this type. `blogs` lists owned blog ids in
/// creation order and is updated in the same commit as the blog itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub password_hash: String,
    pub blogs: Vec<Uuid>,
}

/// A stored blog record. `title`, `author` and `url` are fixed at creation;
/// `likes` only ever increments; `user` is the owning user's id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blog {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub url: String,
    pub likes: i64,
    pub user: Uuid,
}

/// Owner fields joined into listing responses. Never includes the hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub name: String,
}

/// One row of the listing read model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogView {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub url: String,
    pub likes: i64,
    pub user: UserSummary,
}

/// The full persisted state. Blogs are kept in creation order, which is what
/// the stable popularity sort falls back to on equal like counts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    users: Vec<User>,
    blogs: Vec<Blog>,
}

pub struct Store {
    root: PathBuf,
    data: Snapshot,
}

impl Store {
    /// Open a store rooted at the given folder, loading the snapshot file if
    /// one exists. The folder is created if missing.
    pub fn open<P: AsRef<Path>>(root: P) -> AppResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        let path = root.join(SNAPSHOT_FILE);
        let data = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            serde_json::from_str(&raw)?
        } else {
            Snapshot::default()
        };
        debug!(target: "bloglist::storage", "store opened: root='{}' users={} blogs={}",
            root.display(), data.users.len(), data.blogs.len());
        Ok(Self { root, data })
    }

    fn snapshot_path(&self) -> PathBuf { self.root.join(SNAPSHOT_FILE) }

    /// Persist `next` and make it the live state. Write-to-temp then rename:
    /// a failure at any point leaves both memory and disk on the old state.
    fn commit(&mut self, next: Snapshot) -> AppResult<()> {
        let tmp = self.root.join(format!("{}.tmp", SNAPSHOT_FILE));
        let raw = serde_json::to_string_pretty(&next)?;
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, self.snapshot_path())?;
        self.data = next;
        Ok(())
    }

    // --- credential store ---

    /// Exact-match, case-sensitive username lookup.
    pub fn find_user_by_username(&self, username: &str) -> Option<&User> {
        self.data.users.iter().find(|u| u.username == username)
    }

    pub fn find_user(&self, id: Uuid) -> Option<&User> {
        self.data.users.iter().find(|u| u.id == id)
    }

    /// Create a user with a freshly hashed password. Length policy is checked
    /// before any hashing work; duplicate usernames are a conflict.
    pub fn create_user(&mut self, username: &str, name: &str, password: &str) -> AppResult<User> {
        self.insert_user(None, username, name, password, Vec::new())
    }

    /// Insert path shared with the test-support surface: the caller may pin
    /// the id and pre-populate the owned-blog list.
    pub fn insert_user(
        &mut self,
        id: Option<Uuid>,
        username: &str,
        name: &str,
        password: &str,
        blogs: Vec<Uuid>,
    ) -> AppResult<User> {
        if username.chars().count() < MIN_CREDENTIAL_LEN {
            return Err(AppError::user("validation", "username must be at least 3 characters"));
        }
        if password.chars().count() < MIN_CREDENTIAL_LEN {
            return Err(AppError::user("validation", "password must be at least 3 characters"));
        }
        if self.find_user_by_username(username).is_some() {
            return Err(AppError::conflict("username_taken", "username already exists"));
        }
        let password_hash = security::hash_password(password).map_err(|e| {
            error!("password hashing failed: {e}");
            AppError::internal("password_hash", "failed to hash password")
        })?;
        let user = User {
            id: id.unwrap_or_else(Uuid::new_v4),
            username: username.to_string(),
            name: name.to_string(),
            password_hash,
            blogs,
        };
        let mut next = self.data.clone();
        next.users.push(user.clone());
        self.commit(next)?;
        Ok(user)
    }

    pub fn user_count(&self) -> usize { self.data.users.len() }

    // --- post registry ---

    /// All blogs sorted by likes descending. The sort is recomputed from the
    /// live counters on every call; `sort_by` is stable, so equal counts keep
    /// creation order (ids are not monotonic and never enter the comparison).
    pub fn list_blogs(&self) -> Vec<BlogView> {
        let mut blogs = self.data.blogs.clone();
        blogs.sort_by(|a, b| b.likes.cmp(&a.likes));
        blogs.into_iter().map(|b| self.view(b)).collect()
    }

    pub fn blog_count(&self) -> usize { self.data.blogs.len() }

    pub fn find_blog(&self, id: Uuid) -> Option<&Blog> {
        self.data.blogs.iter().find(|b| b.id == id)
    }

    /// Create a blog owned by the authenticated identity. The blog record and
    /// the owner's `blogs` entry land in one commit.
    pub fn create_blog(&mut self, owner: &Principal, title: &str, author: &str, url: &str) -> AppResult<BlogView> {
        if title.trim().is_empty() {
            return Err(AppError::user("validation", "title is required"));
        }
        if url.trim().is_empty() {
            return Err(AppError::user("validation", "url is required"));
        }
        let blog = Blog {
            id: Uuid::new_v4(),
            title: title.to_string(),
            author: author.to_string(),
            url: url.to_string(),
            likes: 0,
            user: owner.user_id,
        };
        let blog = self.attach_blog(blog)?;
        Ok(self.view(blog))
    }

    /// Insert path shared with the test-support surface: id and initial like
    /// count may be pinned by the caller.
    pub fn insert_blog(
        &mut self,
        id: Option<Uuid>,
        title: &str,
        author: &str,
        url: &str,
        user_id: Uuid,
        likes: i64,
    ) -> AppResult<Blog> {
        if likes < 0 {
            return Err(AppError::user("validation", "likes must not be negative"));
        }
        let blog = Blog {
            id: id.unwrap_or_else(Uuid::new_v4),
            title: title.to_string(),
            author: author.to_string(),
            url: url.to_string(),
            likes,
            user: user_id,
        };
        self.attach_blog(blog)
    }

    fn attach_blog(&mut self, blog: Blog) -> AppResult<Blog> {
        let mut next = self.data.clone();
        let Some(owner) = next.users.iter_mut().find(|u| u.id == blog.user) else {
            // A signed token can outlive its user record; without the owner
            // the ownership invariant cannot be established.
            return Err(AppError::not_found("user_not_found", "owning user does not exist"));
        };
        owner.blogs.push(blog.id);
        next.blogs.push(blog.clone());
        self.commit(next)?;
        Ok(blog)
    }

    /// Increment a blog's like counter by one. No identity is consulted:
    /// likes are universally mutable, unlike deletion.
    pub fn like_blog(&mut self, id: Uuid) -> AppResult<BlogView> {
        let mut next = self.data.clone();
        let Some(blog) = next.blogs.iter_mut().find(|b| b.id == id) else {
            return Err(AppError::not_found("blog_not_found", "blog does not exist"));
        };
        blog.likes += 1;
        let updated = blog.clone();
        self.commit(next)?;
        Ok(self.view(updated))
    }

    /// Remove a blog. Only the owner may do this; the blog record and the
    /// owner's `blogs` entry disappear in one commit.
    pub fn delete_blog(&mut self, requester: Uuid, id: Uuid) -> AppResult<()> {
        let Some(blog) = self.find_blog(id) else {
            return Err(AppError::not_found("blog_not_found", "blog does not exist"));
        };
        if blog.user != requester {
            return Err(AppError::forbidden("not_owner", "only the creator may delete a blog"));
        }
        let mut next = self.data.clone();
        next.blogs.retain(|b| b.id != id);
        if let Some(owner) = next.users.iter_mut().find(|u| u.id == requester) {
            owner.blogs.retain(|bid| *bid != id);
        }
        self.commit(next)
    }

    /// Clear all users and blogs. Test-support only; the HTTP surface for it
    /// is never mounted in production mode.
    pub fn reset(&mut self) -> AppResult<()> {
        self.commit(Snapshot::default())
    }

    fn view(&self, blog: Blog) -> BlogView {
        // The create/delete invariant keeps an owner record for every blog;
        // a missing one (only reachable through hand-edited snapshots)
        // renders with blank public fields rather than failing the listing.
        let user = self
            .find_user(blog.user)
            .map(|u| UserSummary { id: u.id, username: u.username.clone(), name: u.name.clone() })
            .unwrap_or(UserSummary { id: blog.user, username: String::new(), name: String::new() });
        BlogView {
            id: blog.id,
            title: blog.title,
            author: blog.author,
            url: blog.url,
            likes: blog.likes,
            user,
        }
    }
}

/// Thread-safe handle shared across request handlers. All store operations
/// run under this mutex, which is the transaction boundary for every mutation.
#[derive(Clone)]
pub struct SharedStore(pub Arc<Mutex<Store>>);

impl SharedStore {
    pub fn new<P: AsRef<Path>>(root: P) -> AppResult<Self> {
        Ok(Self(Arc::new(Mutex::new(Store::open(root)?))))
    }
}
