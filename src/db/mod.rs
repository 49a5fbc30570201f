use anyhow::{Context, Result};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait, PaginatorTrait,
    Select, Statement,
};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

use repositories::{
    catalog::CatalogRepository, comment::CommentRepository, episode::EpisodeRepository,
    fixtures::FixtureRepository,
    library::LibraryRepository, release::ReleaseRepository, support::SupportRepository,
    tasks::TaskRepository, token::TokenRepository, user::UserRepository,
    voiceover::VoiceoverRepository,
};

/// 1-based page request, already clamped by the API layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    #[must_use]
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }
}

/// One page of rows plus the totals needed to render navigation links.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn new(items: Vec<T>, count: u64, request: PageRequest) -> Self {
        Self {
            items,
            count,
            page: request.page,
            page_size: request.page_size,
        }
    }

    /// An empty result set still has one (empty) page.
    #[must_use]
    pub const fn num_pages(&self) -> u64 {
        if self.count == 0 {
            1
        } else {
            self.count.div_ceil(self.page_size)
        }
    }

    #[must_use]
    pub const fn is_out_of_range(&self) -> bool {
        self.page > self.num_pages()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            count: self.count,
            page: self.page,
            page_size: self.page_size,
        }
    }
}

pub(crate) async fn fetch_page<E, C>(
    conn: &C,
    select: Select<E>,
    request: PageRequest,
) -> Result<Page<E::Model>>
where
    E: EntityTrait,
    E::Model: Send + Sync,
    C: ConnectionTrait,
{
    let paginator = select.paginate(conn, request.page_size);
    let count = paginator.num_items().await.context("Failed to count rows")?;
    let items = paginator
        .fetch_page(request.page - 1)
        .await
        .context("Failed to fetch page")?;

    Ok(Page::new(items, count, request))
}

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)
                    .with_context(|| format!("Failed to create database file {path_str}"))?;
            }
        }

        // Every pooled connection to `:memory:` would open its own empty database.
        let (max_connections, min_connections) = if in_memory {
            (1, 1)
        } else {
            (max_connections, min_connections)
        };

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .sqlx_logging(false);

        if !in_memory {
            opt.idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    #[must_use]
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn tokens(&self) -> TokenRepository {
        TokenRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn episodes(&self) -> EpisodeRepository {
        EpisodeRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn fixtures(&self) -> FixtureRepository {
        FixtureRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn voiceovers(&self) -> VoiceoverRepository {
        VoiceoverRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn comments(&self) -> CommentRepository {
        CommentRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn library(&self) -> LibraryRepository {
        LibraryRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn support(&self) -> SupportRepository {
        SupportRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn releases(&self) -> ReleaseRepository {
        ReleaseRepository::new(self.conn.clone())
    }

    #[must_use]
    pub fn tasks(&self) -> TaskRepository {
        TaskRepository::new(self.conn.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_counts() {
        let request = PageRequest::new(1, 12);
        let empty: Page<i32> = Page::new(Vec::new(), 0, request);
        assert_eq!(empty.num_pages(), 1);
        assert!(!empty.is_out_of_range());

        let page: Page<i32> = Page::new(vec![1], 25, PageRequest::new(3, 12));
        assert_eq!(page.num_pages(), 3);
        assert!(!page.is_out_of_range());

        let beyond: Page<i32> = Page::new(Vec::new(), 25, PageRequest::new(4, 12));
        assert!(beyond.is_out_of_range());
    }

    #[test]
    fn page_request_clamps_zero() {
        assert_eq!(PageRequest::new(0, 0), PageRequest { page: 1, page_size: 1 });
    }

    #[tokio::test]
    async fn in_memory_store_migrates() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        store.ping().await.unwrap();
    }
}
