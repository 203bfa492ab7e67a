use std::sync::Arc;

use reqwest::{StatusCode, header, redirect};

use stockroom_core::SystemClock;
use stockroom_infra::{CatalogService, InMemoryCatalogRepository, SqliteCatalogRepository};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let repo = Arc::new(InMemoryCatalogRepository::new());
        Self::spawn_with(CatalogService::new(repo, Arc::new(SystemClock))).await
    }

    async fn spawn_with(service: CatalogService) -> Self {
        // Same router as prod, bound to an ephemeral port.
        let app = stockroom_api::app::build_app(Arc::new(service));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Redirects are asserted, not followed.
        let client = reqwest::Client::builder()
            .redirect(redirect::Policy::none())
            .build()
            .unwrap();

        Self {
            base_url,
            client,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client.post(self.url(path)).form(form).send().await.unwrap()
    }

    async fn create_widget(&self) {
        let res = self
            .post_form(
                "/products/new",
                &[
                    ("name", "Widget"),
                    ("quantity", "10"),
                    ("purchase_price", "5"),
                    ("sell_price", "9"),
                ],
            )
            .await;
        assert_see_other_to_root(&res);
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn assert_see_other_to_root(res: &reqwest::Response) {
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(res.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn health_and_stylesheet_are_served() {
    let srv = TestServer::spawn().await;

    assert_eq!(srv.get("/health").await.status(), StatusCode::OK);

    let css = srv.get("/styles.css").await;
    assert_eq!(css.status(), StatusCode::OK);
    assert!(
        css.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/css")
    );
}

#[tokio::test]
async fn created_product_is_listed() {
    let srv = TestServer::spawn().await;
    srv.create_widget().await;

    let res = srv.get("/").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(body.contains(r#"<a href="/products/1">Widget</a>"#));
}

#[tokio::test]
async fn invalid_create_rerenders_form_with_every_message() {
    let srv = TestServer::spawn().await;

    let res = srv
        .post_form(
            "/products/new",
            &[
                ("name", ""),
                ("quantity", "many"),
                ("purchase_price", "5"),
                ("sell_price", "0"),
            ],
        )
        .await;

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = res.text().await.unwrap();
    assert!(body.contains("name is required"));
    assert_eq!(body.matches("expected a positive integer").count(), 2);
    // Submitted values are kept.
    assert!(body.contains(r#"value="many""#));

    let list = srv.get("/").await.text().await.unwrap();
    assert!(list.contains("No products yet."));
}

#[tokio::test]
async fn sell_decrements_stock_and_records_sale() {
    let srv = TestServer::spawn().await;
    srv.create_widget().await;

    let res = srv.post_form("/products/1", &[("quantity", "3")]).await;
    assert_see_other_to_root(&res);

    let body = srv.get("/products/1").await.text().await.unwrap();
    assert!(body.contains(r#"<dd id="stock">7</dd>"#));
    // One sale of 3 at sell price 9.
    assert!(body.contains("<td>3</td><td>27</td>"));
}

#[tokio::test]
async fn oversized_sale_is_rejected_and_stock_kept() {
    let srv = TestServer::spawn().await;
    srv.create_widget().await;

    let res = srv.post_form("/products/1", &[("quantity", "15")]).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = res.text().await.unwrap();
    assert!(body.contains("not enough stock: 10 available"));
    assert!(body.contains(r#"<dd id="stock">10</dd>"#));
    assert!(body.contains("No sales yet."));
}

#[tokio::test]
async fn malformed_sale_quantity_is_a_field_error() {
    let srv = TestServer::spawn().await;
    srv.create_widget().await;

    let res = srv.post_form("/products/1", &[("quantity", "abc")]).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.text().await.unwrap().contains("expected a positive integer"));

    let res = srv.post_form("/products/1", &[("quantity", "")]).await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.text().await.unwrap().contains("quantity is required"));
}

#[tokio::test]
async fn unknown_products_are_not_found() {
    let srv = TestServer::spawn().await;

    assert_eq!(srv.get("/products/999").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(srv.get("/products/abc").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(srv.get("/products/999/edit").await.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        srv.post_form("/products/999", &[("quantity", "1")]).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn edit_overwrites_product() {
    let srv = TestServer::spawn().await;
    srv.create_widget().await;

    let form = srv.get("/products/1/edit").await.text().await.unwrap();
    assert!(form.contains(r#"value="Widget""#));

    let res = srv
        .post_form(
            "/products/1/edit",
            &[
                ("name", "Gadget"),
                ("quantity", "4"),
                ("purchase_price", "2"),
                ("sell_price", "6"),
            ],
        )
        .await;
    assert_see_other_to_root(&res);

    let body = srv.get("/products/1").await.text().await.unwrap();
    assert!(body.contains("<h1>Gadget</h1>"));
    assert!(body.contains(r#"<dd id="stock">4</dd>"#));
}

#[tokio::test]
async fn invalid_edit_keeps_stored_values() {
    let srv = TestServer::spawn().await;
    srv.create_widget().await;

    let res = srv
        .post_form(
            "/products/1/edit",
            &[
                ("name", "Gadget"),
                ("quantity", "-1"),
                ("purchase_price", "2"),
                ("sell_price", "6"),
            ],
        )
        .await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = srv.get("/products/1").await.text().await.unwrap();
    assert!(body.contains("<h1>Widget</h1>"));
}

#[tokio::test]
async fn delete_removes_product() {
    let srv = TestServer::spawn().await;
    srv.create_widget().await;

    let res = srv.post_form("/products/1/delete", &[]).await;
    assert_see_other_to_root(&res);

    assert_eq!(srv.get("/products/1").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn user_text_is_escaped() {
    let srv = TestServer::spawn().await;
    let res = srv
        .post_form(
            "/products/new",
            &[
                ("name", "<script>alert(1)</script>"),
                ("quantity", "1"),
                ("purchase_price", "1"),
                ("sell_price", "1"),
            ],
        )
        .await;
    assert_see_other_to_root(&res);

    let body = srv.get("/").await.text().await.unwrap();
    assert!(!body.contains("<script>"));
    assert!(body.contains("&lt;script&gt;"));
}

#[tokio::test]
async fn sqlite_store_serves_the_same_flow() {
    let repo = SqliteCatalogRepository::in_memory().await.unwrap();
    let srv = TestServer::spawn_with(CatalogService::new(Arc::new(repo), Arc::new(SystemClock))).await;
    srv.create_widget().await;

    assert_see_other_to_root(&srv.post_form("/products/1", &[("quantity", "3")]).await);
    assert_eq!(
        srv.post_form("/products/1", &[("quantity", "8")]).await.status(),
        StatusCode::UNPROCESSABLE_ENTITY
    );

    let body = srv.get("/products/1").await.text().await.unwrap();
    assert!(body.contains(r#"<dd id="stock">7</dd>"#));
}

#[tokio::test]
async fn non_form_body_gets_html_error_page() {
    let srv = TestServer::spawn().await;

    for path in ["/products/new", "/products/1", "/products/1/edit"] {
        let res = srv
            .client
            .post(srv.url(path))
            .header(header::CONTENT_TYPE, "text/plain")
            .body("name=Widget")
            .send()
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE, "{path}");
        assert!(
            res.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/html")
        );
    }

    let list = srv.get("/").await.text().await.unwrap();
    assert!(list.contains("No products yet."));
}
