use tracing::info;

use super::{CommandContext, CommandError, Options};
use crate::db::repositories::fixtures::FixtureCounts;

pub async fn cmd_generate_tests_anime(
    ctx: &CommandContext,
    options: &Options<'_>,
) -> Result<(), CommandError> {
    let defaults = FixtureCounts::default();
    let counts = FixtureCounts {
        genres: options.count("genres", defaults.genres)?,
        directors: options.count("directors", defaults.directors)?,
        studios: options.count("studios", defaults.studios)?,
        anime: options.count("anime", defaults.anime)?,
        arches: options.count("arches", defaults.arches)?,
        episodes: options.count("episodes", defaults.episodes)?,
        posters: options.count("posters", defaults.posters)?,
    };

    let report = ctx.state.store.fixtures().generate(counts).await?;

    info!(
        event = "test_anime_generated",
        genres = report.genres,
        directors = report.directors,
        studios = report.studios,
        anime = report.anime,
        arches = report.arches,
        episodes = report.episodes,
        posters = report.posters,
        "Test catalog generated"
    );
    println!(
        "Created {} genres, {} directors, {} studios, {} anime, {} arches, {} episodes, {} posters.",
        report.genres,
        report.directors,
        report.studios,
        report.anime,
        report.arches,
        report.episodes,
        report.posters
    );
    Ok(())
}

pub async fn cmd_remove_all_anime(ctx: &CommandContext) -> Result<(), CommandError> {
    let store = &ctx.state.store;
    let anime = store.catalog().remove_all().await?;
    let comments = store.comments().delete_all().await?;

    info!(event = "catalog_removed", anime, comments, "All anime removed");
    println!("Removed {anime} anime and {comments} comment(s).");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::tests::context;
    use crate::db::PageRequest;
    use crate::db::repositories::catalog::{AnimeFilter, AnimeOrdering};
    use crate::tasks::CommandPayload;
    use serde_json::Value;

    #[tokio::test]
    async fn generate_then_remove() {
        let ctx = context().await;
        let mut generate = CommandPayload::new("generate_tests_anime");
        generate.kwargs.insert("anime".into(), Value::from(4));
        generate.kwargs.insert("posters".into(), Value::from("0"));
        ctx.run(&generate).await.unwrap();

        let catalog = ctx.state.store.catalog();
        let page = catalog
            .list_anime(&AnimeFilter::default(), AnimeOrdering::Newest, PageRequest::new(1, 50))
            .await
            .unwrap();
        assert_eq!(page.count, 4);
        assert!(catalog.posters().await.unwrap().is_empty());

        ctx.run(&CommandPayload::new("remove_all_anime")).await.unwrap();
        let page = catalog
            .list_anime(&AnimeFilter::default(), AnimeOrdering::Newest, PageRequest::new(1, 50))
            .await
            .unwrap();
        assert_eq!(page.count, 0);
    }
}
