//! HTTP handlers and route configuration.

mod auth;
mod authors;
mod books;
mod health;
mod users;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/login", web::post().to(auth::login))
        .route("/signup", web::post().to(auth::signup))
        .service(web::scope("/api").route("/health", web::get().to(health::health_check)))
        .service(
            web::scope("/users")
                .route("", web::get().to(users::list))
                .route("", web::post().to(users::create))
                .route("/{id}", web::get().to(users::get))
                .route("/{id}", web::put().to(users::update))
                .route("/{id}", web::delete().to(users::delete)),
        )
        .service(
            web::scope("/authors")
                .route("", web::get().to(authors::list))
                .route("", web::post().to(authors::create))
                .route("/{id}", web::get().to(authors::get))
                .route("/{id}", web::put().to(authors::update))
                .route("/{id}", web::delete().to(authors::delete)),
        )
        .service(
            web::scope("/books")
                .route("", web::get().to(books::list))
                .route("", web::post().to(books::create))
                // Registered ahead of the id routes so "catalog" is never
                // parsed as an id.
                .route("/catalog/pdf", web::get().to(books::catalog_pdf))
                .route("/{id}", web::get().to(books::get))
                .route("/{id}", web::put().to(books::update))
                .route("/{id}", web::delete().to(books::delete)),
        );
}

#[cfg(test)]
mod tests {
    use super::configure_routes;
    use crate::state::AppState;

    use actix_web::dev::{Service, ServiceResponse};
    use actix_web::{App, http::StatusCode, http::header, test, web};
    use serde_json::json;

    use folio_core::domain::User;
    use folio_shared::dto::{BookView, DetailResponse, LoginForm, TokenResponse, UserView};

    fn login_form(username: &str, password: &str) -> LoginForm {
        LoginForm {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    async fn spawn_app(
        state: &AppState,
    ) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
    {
        test::init_service(
            App::new()
                .app_data(web::Data::new(state.clone()))
                .configure(configure_routes),
        )
        .await
    }

    async fn seed_user(state: &AppState, login: &str, password: &str, admin: bool) {
        let hash = state.passwords.hash(password).unwrap();
        let mut user = User::new(format!("{login} name"), login.to_string(), hash, None);
        user.is_admin = admin;
        state.users.save(user).await.unwrap();
    }

    async fn login(
        app: &impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
        username: &str,
        password: &str,
    ) -> String {
        let req = test::TestRequest::post()
            .uri("/login")
            .set_form(login_form(username, password))
            .to_request();
        let body: TokenResponse = test::call_and_read_body_json(app, req).await;
        body.access_token
    }

    fn bearer(token: &str) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {token}"))
    }

    #[actix_web::test]
    async fn health_endpoint_is_public() {
        let (state, _store) = AppState::for_tests();
        let app = spawn_app(&state).await;

        let req = test::TestRequest::get().uri("/api/health").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn signup_creates_active_non_admin_and_login_issues_tokens() {
        let (state, _store) = AppState::for_tests();
        let app = spawn_app(&state).await;

        let req = test::TestRequest::post()
            .uri("/signup")
            .set_json(json!({ "name": "Ann", "login": "ann", "password": "s3cret" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let view: UserView = test::read_body_json(resp).await;
        assert!(view.is_active);
        assert!(!view.is_admin);

        // Wrong password and unknown login both answer 401.
        let req = test::TestRequest::post()
            .uri("/login")
            .set_form(login_form("ann", "wrong"))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );
        let req = test::TestRequest::post()
            .uri("/login")
            .set_form(login_form("nobody", "wrong"))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );

        let token = login(&app, "ann", "s3cret").await;
        assert!(!token.is_empty());
    }

    #[actix_web::test]
    async fn duplicate_signup_conflicts() {
        let (state, _store) = AppState::for_tests();
        let app = spawn_app(&state).await;

        let payload = json!({ "name": "Ann", "login": "ann", "password": "s3cret" });
        let req = test::TestRequest::post()
            .uri("/signup")
            .set_json(&payload)
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CREATED
        );

        let req = test::TestRequest::post()
            .uri("/signup")
            .set_json(&payload)
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CONFLICT
        );
    }

    #[actix_web::test]
    async fn listing_requires_a_token() {
        let (state, _store) = AppState::for_tests();
        let app = spawn_app(&state).await;

        let req = test::TestRequest::get().uri("/books").to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );

        let req = test::TestRequest::get()
            .uri("/books")
            .insert_header(bearer("not-a-jwt"))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn soft_deleted_principal_is_rejected_like_a_bad_token() {
        let (state, _store) = AppState::for_tests();
        let app = spawn_app(&state).await;

        seed_user(&state, "ann", "s3cret", false).await;
        let token = login(&app, "ann", "s3cret").await;

        let user = state.users.find_by_login("ann").await.unwrap().unwrap();
        state.users.soft_delete(user.id).await.unwrap();

        let req = test::TestRequest::get()
            .uri("/books")
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn mutations_are_admin_only() {
        let (state, _store) = AppState::for_tests();
        let app = spawn_app(&state).await;

        seed_user(&state, "ann", "s3cret", false).await;
        let token = login(&app, "ann", "s3cret").await;

        let req = test::TestRequest::post()
            .uri("/authors")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "Gogol" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::FORBIDDEN
        );

        // Reads stay open to any authenticated user.
        let req = test::TestRequest::get()
            .uri("/authors")
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn demoted_admin_loses_write_access_with_an_unexpired_token() {
        let (state, _store) = AppState::for_tests();
        let app = spawn_app(&state).await;

        seed_user(&state, "root", "adminpw", true).await;
        let token = login(&app, "root", "adminpw").await;

        // Admin can write while the flag holds.
        let req = test::TestRequest::post()
            .uri("/authors")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "Gogol" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CREATED
        );

        // Demote the account; the old token stays syntactically valid.
        let mut user = state.users.find_by_login("root").await.unwrap().unwrap();
        user.is_admin = false;
        state.users.save(user).await.unwrap();

        let req = test::TestRequest::post()
            .uri("/authors")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "Tolstoy" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::FORBIDDEN
        );
    }

    #[actix_web::test]
    async fn user_listing_is_served_and_hides_deactivated_accounts() {
        let (state, _store) = AppState::for_tests();
        let app = spawn_app(&state).await;

        seed_user(&state, "ann", "s3cret", false).await;
        seed_user(&state, "bob", "s3cret", false).await;
        let token = login(&app, "ann", "s3cret").await;

        let req = test::TestRequest::get()
            .uri("/users")
            .insert_header(bearer(&token))
            .to_request();
        let listing: Vec<UserView> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listing.len(), 2);
        assert!(listing.iter().any(|u| u.login == "bob"));

        let bob = state.users.find_by_login("bob").await.unwrap().unwrap();
        state.users.soft_delete(bob.id).await.unwrap();
        // The cached listing still holds both rows until it expires;
        // deletion through the API would have evicted it.
        state.cache.delete("users").await.unwrap();

        let req = test::TestRequest::get()
            .uri("/users")
            .insert_header(bearer(&token))
            .to_request();
        let listing: Vec<UserView> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].login, "ann");
    }

    #[actix_web::test]
    async fn admin_walks_author_and_book_lifecycle() {
        let (state, _store) = AppState::for_tests();
        let app = spawn_app(&state).await;

        seed_user(&state, "root", "adminpw", true).await;
        let token = login(&app, "root", "adminpw").await;

        let req = test::TestRequest::post()
            .uri("/authors")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": "Gogol" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let author: serde_json::Value = test::read_body_json(resp).await;
        let author_id = author["id"].as_i64().unwrap();

        let req = test::TestRequest::post()
            .uri("/books")
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "Dead Souls", "author_ids": [author_id] }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let book: BookView = test::read_body_json(resp).await;
        assert_eq!(book.authors.len(), 1);
        assert_eq!(book.authors[0].name, "Gogol");

        // Empty update body is rejected before anything is touched.
        let req = test::TestRequest::put()
            .uri(&format!("/books/{}", book.id))
            .insert_header(bearer(&token))
            .set_json(json!({}))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );

        // Soft-deleting the author removes it from the book's view.
        let req = test::TestRequest::delete()
            .uri(&format!("/authors/{author_id}"))
            .insert_header(bearer(&token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let detail: DetailResponse = test::read_body_json(resp).await;
        assert_eq!(detail.detail, "Author has been deleted");

        let req = test::TestRequest::get()
            .uri(&format!("/books/{}", book.id))
            .insert_header(bearer(&token))
            .to_request();
        let book: BookView = test::call_and_read_body_json(&app, req).await;
        assert!(book.authors.is_empty());

        // Deleting again is a 404: the row is no longer active.
        let req = test::TestRequest::delete()
            .uri(&format!("/authors/{author_id}"))
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[actix_web::test]
    async fn cached_book_listing_is_invalidated_by_create() {
        let (state, _store) = AppState::for_tests();
        let app = spawn_app(&state).await;

        seed_user(&state, "root", "adminpw", true).await;
        let token = login(&app, "root", "adminpw").await;

        // Prime the cache with the empty listing.
        let req = test::TestRequest::get()
            .uri("/books")
            .insert_header(bearer(&token))
            .to_request();
        let listing: Vec<BookView> = test::call_and_read_body_json(&app, req).await;
        assert!(listing.is_empty());

        let req = test::TestRequest::post()
            .uri("/books")
            .insert_header(bearer(&token))
            .set_json(json!({ "title": "The Nose" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::CREATED
        );

        let req = test::TestRequest::get()
            .uri("/books")
            .insert_header(bearer(&token))
            .to_request();
        let listing: Vec<BookView> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].title, "The Nose");
    }

    #[actix_web::test]
    async fn title_search_bypasses_cache_and_filters() {
        let (state, _store) = AppState::for_tests();
        let app = spawn_app(&state).await;

        seed_user(&state, "root", "adminpw", true).await;
        let token = login(&app, "root", "adminpw").await;

        for title in ["War and Peace", "Dead Souls"] {
            let req = test::TestRequest::post()
                .uri("/books")
                .insert_header(bearer(&token))
                .set_json(json!({ "title": title }))
                .to_request();
            assert_eq!(
                test::call_service(&app, req).await.status(),
                StatusCode::CREATED
            );
        }

        let req = test::TestRequest::get()
            .uri("/books?title=peace")
            .insert_header(bearer(&token))
            .to_request();
        let listing: Vec<BookView> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].title, "War and Peace");
    }

    #[actix_web::test]
    async fn catalog_pdf_returns_listing_and_enqueues_render_job() {
        let (state, _store) = AppState::for_tests();
        let app = spawn_app(&state).await;

        seed_user(&state, "ann", "s3cret", false).await;
        let token = login(&app, "ann", "s3cret").await;

        let req = test::TestRequest::get()
            .uri("/books/catalog/pdf")
            .insert_header(bearer(&token))
            .to_request();
        let listing: Vec<BookView> = test::call_and_read_body_json(&app, req).await;
        assert!(listing.is_empty());

        let stats = state.jobs.stats().await.unwrap();
        assert_eq!(stats.pending, 1);
    }
}
