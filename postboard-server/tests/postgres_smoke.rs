use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{Duration, Utc};

use postboard_server::data::like_repository::LikeRepository;
use postboard_server::data::post_repository::{NewPost, PostRepository};
use postboard_server::data::repositories::postgres::like_repository::PostgresLikeRepository;
use postboard_server::data::repositories::postgres::post_repository::PostgresPostRepository;
use postboard_server::data::repositories::postgres::user_repository::PostgresUserRepository;
use postboard_server::data::user_repository::{NewUser, UserRepository};
use postboard_server::domain::like::LikeToggle;
use postboard_server::infrastructure::database::{create_pool, run_migrations};
use postboard_server::infrastructure::settings::DatabaseSettings;

fn unique_suffix() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock must be after unix epoch")
        .as_nanos();
    format!("{nanos}")
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL at DATABASE_URL"]
async fn conditional_publish_and_like_toggle_against_postgres() {
    dotenvy::dotenv().ok();
    let settings = DatabaseSettings::from_env().expect("DATABASE_URL must be set");
    let pool = create_pool(&settings).await.expect("connect");
    run_migrations(&pool).await.expect("migrate");

    let users = PostgresUserRepository::new(pool.clone());
    let posts = PostgresPostRepository::new(pool.clone());
    let likes = PostgresLikeRepository::new(pool);

    let suffix = unique_suffix();
    let owner = users
        .create_user(NewUser {
            name: format!("owner {suffix}"),
            email: format!("owner_{suffix}@example.com"),
            password_hash: "hash".to_string(),
        })
        .await
        .expect("create user");

    let now = Utc::now();
    let post = posts
        .create_post(NewPost {
            owner_id: owner.id,
            title: "scheduled".to_string(),
            content: "body".to_string(),
            image: None,
            is_published: false,
            scheduled_at: Some(now - Duration::seconds(5)),
        })
        .await
        .expect("create post");

    let early = posts
        .try_set_published(post.id, now - Duration::minutes(1))
        .await
        .expect("early write");
    assert!(!early, "a post must not be published before its time");

    assert!(posts.try_set_published(post.id, now).await.expect("first write"));
    assert!(!posts.try_set_published(post.id, now).await.expect("second write"));

    let stored = posts
        .get_post(post.id)
        .await
        .expect("get")
        .expect("post exists");
    assert!(stored.is_published);

    assert_eq!(
        likes.toggle_like(post.id, owner.id).await.expect("like"),
        LikeToggle::Liked
    );
    assert_eq!(
        likes.toggle_like(post.id, owner.id).await.expect("unlike"),
        LikeToggle::Unliked
    );
    assert_eq!(likes.count_likes(post.id).await.expect("count"), 0);

    assert!(posts.delete_post(post.id).await.expect("cleanup"));
}
