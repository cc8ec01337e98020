mod common;

use common::{memory_pool, register, user_service};
use house_finder::db::RepositoryError;
use house_finder::users::{
    Credentials, Registration, SqliteUserRepository, UserRepository, UserServiceError,
    UserValidationError,
};

fn credentials(username: &str, password: &str) -> Credentials {
    Credentials {
        username: username.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn duplicate_username_conflicts_and_keeps_first_account() {
    let pool = memory_pool().await;
    let first = register(&pool, "dilnoza").await;

    let err = user_service(&pool)
        .register(Registration {
            username: "dilnoza".to_string(),
            password: "another-secret".to_string(),
            email: Some("other@example.com".to_string()),
        })
        .await
        .expect_err("duplicate username");
    assert!(matches!(
        err,
        UserServiceError::Repository(RepositoryError::Conflict)
    ));

    let stored = SqliteUserRepository::new(pool.clone())
        .fetch(first.id)
        .await
        .expect("fetch user")
        .expect("first user kept");
    assert_eq!(stored, first);

    // The first password still works and the rejected one never landed.
    let service = user_service(&pool);
    assert!(service
        .authenticate(credentials("dilnoza", "hunter22"))
        .await
        .is_ok());
    assert!(matches!(
        service
            .authenticate(credentials("dilnoza", "another-secret"))
            .await,
        Err(UserServiceError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn authenticate_checks_password_and_username() {
    let pool = memory_pool().await;
    let user = register(&pool, "seller").await;
    let service = user_service(&pool);

    let authenticated = service
        .authenticate(credentials(" seller ", "hunter22"))
        .await
        .expect("valid login");
    assert_eq!(authenticated, user);

    assert!(matches!(
        service.authenticate(credentials("seller", "wrong-pass")).await,
        Err(UserServiceError::InvalidCredentials)
    ));
    assert!(matches!(
        service.authenticate(credentials("nobody", "hunter22")).await,
        Err(UserServiceError::InvalidCredentials)
    ));
}

#[tokio::test]
async fn stored_password_is_hashed() {
    let pool = memory_pool().await;
    register(&pool, "seller").await;

    let stored: String = sqlx::query_scalar("SELECT password FROM users WHERE username = ?")
        .bind("seller")
        .fetch_one(&pool)
        .await
        .expect("stored password");
    assert_ne!(stored, "hunter22");
    assert!(stored.starts_with("sha256$"));
}

#[tokio::test]
async fn invalid_registration_is_rejected_before_storage() {
    let pool = memory_pool().await;
    let err = user_service(&pool)
        .register(Registration {
            username: "ab".to_string(),
            password: "hunter22".to_string(),
            email: None,
        })
        .await
        .expect_err("short username");
    assert!(matches!(
        err,
        UserServiceError::Validation(UserValidationError::Username)
    ));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .expect("count users");
    assert_eq!(count, 0);
}
