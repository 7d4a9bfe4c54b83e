use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use time::macros::datetime;
use tower::ServiceExt;
use url::Url;

use spacetravelling::application::chrome::ChromeService;
use spacetravelling::application::content::{ContentError, ContentSource, PreviewRef};
use spacetravelling::application::feed::FeedService;
use spacetravelling::application::pagination::{
    CursorPage, PageCursor, PageSource, TracingDiagnostics,
};
use spacetravelling::config::SiteSettings;
use spacetravelling::domain::posts::{
    Banner, ContentSection, Post, PostSummary, SiblingDirection, SiblingPost,
};
use spacetravelling::domain::rich_text::RichTextBlock;
use spacetravelling::infra::http::{HttpState, build_router};
use spacetravelling::presentation::views::CommentsView;

const ENDPOINT: &str = "https://spacetravelling.cdn.prismic.io/api/v2";

fn cursor(page: u32) -> PageCursor {
    PageCursor::from_api(&format!(
        "{ENDPOINT}/documents/search?ref=master&page={page}&pageSize=2"
    ))
    .expect("cursor")
}

fn summary(uid: &str) -> PostSummary {
    PostSummary {
        uid: uid.to_string(),
        first_publication_date: Some(datetime!(2021-03-15 19:25:28 UTC)),
        title: format!("Title {uid}"),
        subtitle: format!("Subtitle {uid}"),
        author: "Joseph Oliveira".to_string(),
    }
}

fn post(uid: &str, words: usize) -> Post {
    Post {
        id: format!("id-{uid}"),
        uid: uid.to_string(),
        first_publication_date: Some(datetime!(2021-03-15 19:25:28 UTC)),
        last_publication_date: Some(datetime!(2021-03-15 19:25:28 UTC)),
        title: format!("Title {uid}"),
        banner: Banner {
            url: "https://images.prismic.io/banner.png".to_string(),
            alt: None,
        },
        author: "Joseph Oliveira".to_string(),
        content: vec![ContentSection {
            heading: "Proin".to_string(),
            body: vec![RichTextBlock::paragraph(vec!["lorem"; words].join(" "))],
        }],
    }
}

#[derive(Default)]
struct InMemoryContent {
    first_page: Vec<PostSummary>,
    first_cursor: Option<PageCursor>,
    pages: HashMap<String, CursorPage<PostSummary>>,
    posts: HashMap<String, Post>,
    previous: HashMap<String, SiblingPost>,
    preview_only: HashMap<String, Post>,
    offline: bool,
}

impl InMemoryContent {
    fn check_online(&self) -> Result<(), ContentError> {
        if self.offline {
            Err(ContentError::Transport("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PageSource for InMemoryContent {
    async fn fetch_page(
        &self,
        cursor: &PageCursor,
    ) -> Result<CursorPage<PostSummary>, ContentError> {
        self.check_online()?;
        self.pages
            .get(&cursor.encode())
            .cloned()
            .ok_or_else(|| ContentError::Status {
                status: 404,
                body: "unknown page".to_string(),
            })
    }
}

#[async_trait]
impl ContentSource for InMemoryContent {
    async fn list_posts(
        &self,
        page_size: u32,
        _preview: Option<&PreviewRef>,
    ) -> Result<CursorPage<PostSummary>, ContentError> {
        self.check_online()?;
        let items = self
            .first_page
            .iter()
            .take(page_size as usize)
            .cloned()
            .collect();
        Ok(CursorPage::new(items, self.first_cursor.clone()))
    }

    async fn post_by_uid(
        &self,
        uid: &str,
        preview: Option<&PreviewRef>,
    ) -> Result<Option<Post>, ContentError> {
        self.check_online()?;
        let draft = preview.and_then(|_| self.preview_only.get(uid));
        Ok(draft.or_else(|| self.posts.get(uid)).cloned())
    }

    async fn sibling(
        &self,
        document_id: &str,
        direction: SiblingDirection,
        _preview: Option<&PreviewRef>,
    ) -> Result<Option<SiblingPost>, ContentError> {
        self.check_online()?;
        Ok(match direction {
            SiblingDirection::Previous => self.previous.get(document_id).cloned(),
            SiblingDirection::Next => None,
        })
    }

    async fn resolve_preview(
        &self,
        document_id: &str,
        _preview: &PreviewRef,
    ) -> Result<Option<String>, ContentError> {
        Ok(self
            .preview_only
            .values()
            .chain(self.posts.values())
            .find(|post| post.id == document_id)
            .map(|post| post.uid.clone()))
    }

    async fn health(&self) -> Result<(), ContentError> {
        self.check_online()
    }
}

fn blog() -> InMemoryContent {
    let mut pages = HashMap::new();
    pages.insert(
        cursor(2).encode(),
        CursorPage::new(vec![summary("c")], None),
    );

    let mut posts = HashMap::new();
    posts.insert("b".to_string(), post("b", 201));

    let mut previous = HashMap::new();
    previous.insert(
        "id-b".to_string(),
        SiblingPost {
            uid: "a".to_string(),
            title: "Title a".to_string(),
        },
    );

    let mut preview_only = HashMap::new();
    preview_only.insert("draft".to_string(), post("draft", 10));

    InMemoryContent {
        first_page: vec![summary("a"), summary("b")],
        first_cursor: Some(cursor(2)),
        pages,
        posts,
        previous,
        preview_only,
        offline: false,
    }
}

fn router(content: InMemoryContent, comments: Option<CommentsView>) -> Router {
    let feed = FeedService::new(
        Arc::new(content),
        Arc::new(TracingDiagnostics),
        Url::parse(ENDPOINT).expect("endpoint"),
        2,
        comments,
    );
    let chrome = ChromeService::new(&SiteSettings {
        title: "spacetraveling".to_string(),
        description: "Blog".to_string(),
        public_url: Url::parse("https://blog.example.com/").expect("public url"),
    });
    build_router(HttpState {
        feed: Arc::new(feed),
        chrome: Arc::new(chrome),
    })
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, header::HeaderMap, String) {
    let response = router.oneshot(request).await.expect("response");
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    (status, headers, String::from_utf8_lossy(&bytes).into_owned())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

fn encoded(cursor: &PageCursor) -> String {
    url::form_urlencoded::byte_serialize(cursor.encode().as_bytes()).collect()
}

#[tokio::test]
async fn home_lists_first_page_with_load_more() {
    let (status, _, body) = send(router(blog(), None), get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("href=\"/post/a\""));
    assert!(body.contains("Title b"));
    assert!(body.contains("15 mar 2021"));
    assert!(body.contains("Carregar mais posts"));
    assert!(body.contains("/ui/posts?cursor="));
    assert!(!body.contains("Sair do modo Preview"));
}

#[tokio::test]
async fn home_never_links_to_the_bare_fragment_endpoint() {
    let (status, _, body) = send(router(blog(), None), get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("<noscript>"));
    assert!(!body.contains("href=\"/ui/posts"));
    assert!(body.contains("@get('/ui/posts?cursor="));
}

#[tokio::test]
async fn home_without_more_pages_hides_load_more() {
    let content = InMemoryContent {
        first_page: vec![summary("a")],
        ..InMemoryContent::default()
    };

    let (status, _, body) = send(router(content, None), get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("Carregar mais posts"));
}

#[tokio::test]
async fn load_more_fragment_appends_next_page() {
    let uri = format!("/ui/posts?cursor={}", encoded(&cursor(2)));

    let (status, _, body) = send(router(blog(), None), get(&uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("href=\"/post/c\""));
    assert!(!body.contains("Carregar mais posts"));
}

#[tokio::test]
async fn load_more_over_datastar_streams_patches() {
    let uri = format!("/ui/posts?cursor={}", encoded(&cursor(2)));
    let request = Request::builder()
        .uri(uri)
        .header("datastar-request", "true")
        .body(Body::empty())
        .expect("request");

    let (status, headers, body) = send(router(blog(), None), request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("text/event-stream")
    );
    assert!(body.contains("#post-grid"));
    assert!(body.contains("#feed-sentinel-container"));
    assert!(body.contains("feedLoading"));
    assert!(body.contains("/post/c"));
}

#[tokio::test]
async fn failed_load_more_offers_the_same_cursor_again() {
    let content = InMemoryContent {
        offline: true,
        ..blog()
    };
    let uri = format!("/ui/posts?cursor={}", encoded(&cursor(2)));

    let (status, _, body) = send(router(content, None), get(&uri)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Carregar mais posts"));
    assert!(body.contains("page%3D2"));
}

#[tokio::test]
async fn load_more_rejects_missing_and_foreign_cursors() {
    let (status, _, _) = send(router(blog(), None), get("/ui/posts")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let foreign = url::form_urlencoded::byte_serialize(
        b"https://evil.example.com/api/v2/documents/search?page=2",
    )
    .collect::<String>();
    let (status, _, _) = send(
        router(blog(), None),
        get(&format!("/ui/posts?cursor={foreign}")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_page_renders_reading_time_and_siblings() {
    let comments = CommentsView {
        repo: "someone/blog-comments".to_string(),
        issue_term: "pathname".to_string(),
        theme: "github-dark".to_string(),
    };

    let (status, _, body) = send(router(blog(), Some(comments)), get("/post/b")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<title>Title b | spacetraveling</title>"));
    assert!(body.contains("2 min"));
    assert!(body.contains("Post anterior"));
    assert!(body.contains("href=\"/post/a\""));
    assert!(!body.contains("Próximo post"));
    assert!(body.contains("https://utteranc.es/client.js"));
    assert!(body.contains("repo=\"someone/blog-comments\""));
    assert!(body.contains("id=\"inject-comments-for-uterances\""));
    assert!(!body.contains("editado em"));
}

#[tokio::test]
async fn post_page_omits_comments_when_unconfigured() {
    let (status, _, body) = send(router(blog(), None), get("/post/b")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("utteranc.es"));
}

#[tokio::test]
async fn untitled_sections_render_without_heading() {
    let mut untitled = post("untitled", 10);
    untitled.content[0].heading = String::new();
    let mut content = blog();
    content.posts.insert("untitled".to_string(), untitled);

    let (status, _, body) = send(router(content, None), get("/post/untitled")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(!body.contains("<h2></h2>"));
    assert!(!body.contains("<h2>"));
    assert!(body.contains("<p>lorem"));
}

#[tokio::test]
async fn unknown_post_renders_not_found_page() {
    let (status, _, body) = send(router(blog(), None), get("/post/nope")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Página não encontrada"));
}

#[tokio::test]
async fn content_outage_is_a_bad_gateway() {
    let content = InMemoryContent {
        offline: true,
        ..blog()
    };

    let (status, _, _) = send(router(content, None), get("/")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn preview_cookie_unlocks_drafts_and_exit_clears_it() {
    let (status, headers, _) = send(
        router(blog(), None),
        get("/api/preview?token=preview-ref&documentId=id-draft"),
    )
    .await;

    assert!(status.is_redirection());
    assert_eq!(
        headers
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok()),
        Some("/post/draft")
    );
    let cookie = headers
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("preview cookie");
    assert!(cookie.starts_with("io.prismic.preview=preview-ref"));

    let request = Request::builder()
        .uri("/post/draft")
        .header(header::COOKIE, "io.prismic.preview=preview-ref")
        .body(Body::empty())
        .expect("request");
    let (status, headers, body) = send(router(blog(), None), request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Sair do modo Preview"));
    assert_eq!(
        headers
            .get(header::CACHE_CONTROL)
            .and_then(|value| value.to_str().ok()),
        Some("no-store")
    );

    let (status, _, _) = send(router(blog(), None), get("/post/draft")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, headers, _) = send(router(blog(), None), get("/api/exit-preview")).await;
    assert!(status.is_redirection());
    let cleared = headers
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .expect("cleared cookie");
    assert!(cleared.starts_with("io.prismic.preview="));
    assert!(cleared.contains("Max-Age=0"));
}

#[tokio::test]
async fn preview_without_token_is_rejected() {
    let (status, _, _) = send(router(blog(), None), get("/api/preview")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn health_reflects_content_reachability() {
    let (status, _, _) = send(router(blog(), None), get("/_health/content")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let content = InMemoryContent {
        offline: true,
        ..InMemoryContent::default()
    };
    let (status, _, _) = send(router(content, None), get("/_health/content")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn static_assets_and_fallback() {
    let (status, headers, _) = send(router(blog(), None), get("/static/site.css")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        headers
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok()),
        Some("text/css")
    );

    let (status, _, _) = send(router(blog(), None), get("/static/missing.css")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, body) = send(router(blog(), None), get("/nowhere")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("Voltar para o início"));
}
