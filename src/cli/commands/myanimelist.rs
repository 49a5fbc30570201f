use super::{CommandContext, CommandError, Options};
use crate::services::{AuthOutcome, UpdateOptions};

pub async fn cmd_myanimelist_auth(ctx: &CommandContext) -> Result<(), CommandError> {
    match ctx.state.release_service.authorise().await? {
        AuthOutcome::Updated(id) => {
            println!("Active token found, stored update release #{id}.");
        }
        AuthOutcome::AuthorisationRequired { authorisation_url } => {
            println!("Open this url to authorise the application:");
            println!("{authorisation_url}");
        }
    }
    Ok(())
}

pub async fn cmd_myanimelist_update_releases(
    ctx: &CommandContext,
    options: &Options<'_>,
) -> Result<(), CommandError> {
    let id = ctx
        .state
        .release_service
        .update_releases(UpdateOptions {
            authorisation_code: options.string("authorisation_code"),
            access_token: options.string("access_token"),
            keyword: options.string("keyword"),
            user_id: None,
        })
        .await?;

    println!("Stored update release #{id}.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::tests::context;
    use super::*;
    use crate::services::ReleaseError;
    use crate::tasks::CommandPayload;

    #[tokio::test]
    async fn update_without_any_token_is_rejected() {
        let ctx = context().await;
        let result = ctx.run(&CommandPayload::new("myanimelist_update_releases")).await;
        assert!(matches!(
            result,
            Err(CommandError::Release(ReleaseError::TokenMissing))
        ));
    }

    #[tokio::test]
    async fn auth_without_token_starts_a_round() {
        let ctx = context().await;
        ctx.run(&CommandPayload::new("myanimelist_auth")).await.unwrap();

        let token = ctx.state.store.releases().newest_token().await.unwrap().unwrap();
        assert_eq!(token.code_verifier.len(), 128);
        assert!(token.authorisation_url.starts_with("https://myanimelist.net/v1/oauth2/authorize?"));
    }
}
