//! Shared fixtures for the store test modules.

use chrono::Utc;
use uuid::Uuid;

use crate::database::Database;
use crate::models::{Comment, CommunityPost, User, Video};

pub fn fixture_user(db: &Database, username: &str) -> User {
    let user = User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        full_name: format!("{username} test"),
        password_hash: "$argon2id$test".to_string(),
        avatar_url: String::new(),
        cover_image_url: String::new(),
        created_at: Utc::now(),
    };
    db.create_user(&user).unwrap();
    user
}

pub fn fixture_video(db: &Database, owner_id: Uuid, title: &str, views: i64) -> Video {
    let video = Video {
        id: Uuid::new_v4(),
        owner_id,
        title: title.to_string(),
        description: format!("{title} description"),
        video_url: format!("/media/{}", Uuid::new_v4()),
        thumbnail_url: format!("/media/{}", Uuid::new_v4()),
        duration: 42.0,
        views,
        published: true,
        created_at: Utc::now(),
    };
    db.create_video(&video).unwrap();
    video
}

pub fn fixture_comment(db: &Database, video_id: Uuid, owner_id: Uuid, content: &str) -> Comment {
    let comment = Comment {
        id: Uuid::new_v4(),
        video_id,
        owner_id,
        content: content.to_string(),
        created_at: Utc::now(),
    };
    db.create_comment(&comment).unwrap();
    comment
}

pub fn fixture_post(db: &Database, owner_id: Uuid, content: &str) -> CommunityPost {
    let post = CommunityPost {
        id: Uuid::new_v4(),
        owner_id,
        content: content.to_string(),
        created_at: Utc::now(),
    };
    db.create_post(&post).unwrap();
    post
}
