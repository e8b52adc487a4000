//! Database layer (Firestore).

pub mod bookmarks;
pub mod comments;
pub mod firestore;
pub mod rants;
pub mod stances;
pub mod users;
pub mod votes;

pub use firestore::{CounterChange, FirestoreDb};

/// Collection names as constants.
///
/// These match the collections the web client already writes.
pub mod collections {
    pub const USERS: &str = "users";
    /// Lowercase username -> uid reservations
    pub const USERNAMES: &str = "usernames";
    pub const RANTS: &str = "rants";
    pub const COMMENTS: &str = "comments";
    /// Keyed `{userId}_{rantId}`
    pub const VOTES: &str = "votes";
    /// Keyed `{userId}_{rantId}`
    pub const BOOKMARKS: &str = "bookmarks";
    /// Keyed `{userId}_{rantId}`
    pub const USER_STANCES: &str = "user_stances";
}
