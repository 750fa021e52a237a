use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::SnapshotError;
use crate::provider::{Clock, IdSource};

/// A participant. The map key in [`ConversationSnapshot::users`] is the
/// username, which doubles as the display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Index into the avatar set
    pub avatar: u32,
    /// Identity proof: encoded ciphertext of the username under the login key
    pub proof: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub user: String,
    pub created_at: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub author: String,
    pub created_at: u64,
    pub text: String,
    #[serde(default)]
    pub replies: Vec<String>,
    #[serde(default)]
    pub likes: Vec<Like>,
}

/// The whole conversation: everything a fragment carries.
///
/// Maps are ordered so that serializing the same snapshot always yields the
/// same text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSnapshot {
    #[serde(default)]
    pub users: BTreeMap<String, User>,
    #[serde(default)]
    pub posts: BTreeMap<String, Post>,
    #[serde(default)]
    pub root_post_ids: Vec<String>,
}

/// A `(username, proof)` pair as stored in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityProofRecord<'a> {
    pub username: &'a str,
    pub proof: &'a str,
}

impl ConversationSnapshot {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.posts.is_empty() && self.root_post_ids.is_empty()
    }

    /// Every `(username, proof)` record, in username order.
    pub fn identity_records(&self) -> impl Iterator<Item = IdentityProofRecord<'_>> {
        self.users.iter().map(|(name, user)| IdentityProofRecord {
            username: name.as_str(),
            proof: user.proof.as_str(),
        })
    }

    pub fn register_user(
        &mut self,
        username: &str,
        avatar: u32,
        proof: String,
    ) -> Result<(), SnapshotError> {
        if username.trim().is_empty() {
            return Err(SnapshotError::EmptyUsername);
        }
        if self.users.contains_key(username) {
            return Err(SnapshotError::DuplicateUser(username.to_string()));
        }
        self.users
            .insert(username.to_string(), User { avatar, proof });
        tracing::debug!(user = username, "registered user");
        Ok(())
    }

    /// Add a top-level post and return its id.
    pub fn add_post<P>(&mut self, author: &str, text: &str, provider: &P) -> Result<String, SnapshotError>
    where
        P: Clock + IdSource,
    {
        let id = self.insert_post(author, text, provider)?;
        self.root_post_ids.push(id.clone());
        Ok(id)
    }

    /// Add a reply under `parent` and return the reply's id.
    pub fn add_reply<P>(
        &mut self,
        parent: &str,
        author: &str,
        text: &str,
        provider: &P,
    ) -> Result<String, SnapshotError>
    where
        P: Clock + IdSource,
    {
        if !self.posts.contains_key(parent) {
            return Err(SnapshotError::UnknownPost(parent.to_string()));
        }
        let id = self.insert_post(author, text, provider)?;
        if let Some(parent) = self.posts.get_mut(parent) {
            parent.replies.push(id.clone());
        }
        Ok(id)
    }

    /// Like `post` as `user`, or remove the like if present.
    /// Returns whether the post is liked by `user` afterwards.
    pub fn toggle_like<C: Clock>(
        &mut self,
        post: &str,
        user: &str,
        clock: &C,
    ) -> Result<bool, SnapshotError> {
        if !self.users.contains_key(user) {
            return Err(SnapshotError::UnknownUser(user.to_string()));
        }
        let entry = self
            .posts
            .get_mut(post)
            .ok_or_else(|| SnapshotError::UnknownPost(post.to_string()))?;

        if let Some(pos) = entry.likes.iter().position(|l| l.user == user) {
            entry.likes.remove(pos);
            Ok(false)
        } else {
            entry.likes.push(Like {
                user: user.to_string(),
                created_at: clock.now_millis(),
            });
            Ok(true)
        }
    }

    /// Check the referential contract: roots and replies resolve to posts,
    /// authors and likers resolve to users.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        for root in &self.root_post_ids {
            if !self.posts.contains_key(root) {
                return Err(SnapshotError::DanglingRoot(root.clone()));
            }
        }
        for (key, post) in &self.posts {
            if key != &post.id {
                return Err(SnapshotError::MismatchedPostId {
                    key: key.clone(),
                    post: post.id.clone(),
                });
            }
            if !self.users.contains_key(&post.author) {
                return Err(SnapshotError::UnknownAuthor {
                    post: post.id.clone(),
                    author: post.author.clone(),
                });
            }
            if let Some(reply) = post.replies.iter().find(|r| !self.posts.contains_key(*r)) {
                return Err(SnapshotError::DanglingReply {
                    post: post.id.clone(),
                    reply: reply.clone(),
                });
            }
            if let Some(like) = post.likes.iter().find(|l| !self.users.contains_key(&l.user)) {
                return Err(SnapshotError::UnknownLiker {
                    post: post.id.clone(),
                    user: like.user.clone(),
                });
            }
        }
        Ok(())
    }

    /// Serialize to the canonical JSON text form.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    fn insert_post<P>(&mut self, author: &str, text: &str, provider: &P) -> Result<String, SnapshotError>
    where
        P: Clock + IdSource,
    {
        if !self.users.contains_key(author) {
            return Err(SnapshotError::UnknownUser(author.to_string()));
        }
        let id = provider.next_id();
        if self.posts.contains_key(&id) {
            return Err(SnapshotError::DuplicatePost(id));
        }
        let post = Post {
            id: id.clone(),
            author: author.to_string(),
            created_at: provider.now_millis(),
            text: text.to_string(),
            replies: Vec::new(),
            likes: Vec::new(),
        };
        self.posts.insert(id.clone(), post);
        tracing::debug!(post = %id, author, "added post");
        Ok(id)
    }
}
