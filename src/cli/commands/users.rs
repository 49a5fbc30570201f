use tracing::{info, warn};

use super::{CommandContext, CommandError, Options};
use crate::api::validation::is_valid_username;
use crate::db::repositories::user::NewUser;

pub async fn cmd_create_default_superuser(
    ctx: &CommandContext,
    options: &Options<'_>,
) -> Result<(), CommandError> {
    let username = options.required("username")?;
    let email = options.required("email")?;
    let password = options.required("password")?;

    create_superuser(ctx, username, email, password).await
}

/// Migrations already ran when the store was opened; this only seeds the
/// administrator account from configuration.
pub async fn cmd_finalise_deploy(ctx: &CommandContext) -> Result<(), CommandError> {
    ctx.state.store.ping().await?;
    info!(event = "migrations_applied", "Database schema is up to date");

    let admin = ctx.state.config.admin.clone();
    if admin.password.is_empty() {
        warn!(
            event = "superuser_skipped",
            username = %admin.username,
            "ADMIN_PASSWORD is not set, superuser was not created"
        );
        return Ok(());
    }

    create_superuser(ctx, admin.username, admin.email, admin.password).await
}

pub async fn cmd_clear_expired_tokens(ctx: &CommandContext) -> Result<(), CommandError> {
    let removed = ctx.state.auth_service.clear_expired_tokens().await?;
    println!("Removed {removed} expired token(s).");
    Ok(())
}

async fn create_superuser(
    ctx: &CommandContext,
    username: String,
    email: String,
    password: String,
) -> Result<(), CommandError> {
    if !is_valid_username(&username) {
        return Err(CommandError::InvalidArgument {
            name: "username".into(),
            value: username,
        });
    }

    let users = ctx.state.store.users();

    if users.get_by_username(&username).await?.is_some() {
        warn!(event = "superuser_exists", username = %username, "Superuser exists already");
        return Ok(());
    }

    let user = users
        .create(
            NewUser {
                username,
                email,
                password,
                is_staff: true,
                is_superuser: true,
            },
            &ctx.state.config.security,
        )
        .await?;

    info!(
        event = "superuser_created",
        user_id = user.id,
        username = %user.username,
        "Superuser was created successfully"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::tests::context;
    use super::*;
    use crate::tasks::CommandPayload;
    use serde_json::Value;

    fn payload(kwargs: &[(&str, &str)]) -> CommandPayload {
        let mut payload = CommandPayload::new("create_default_superuser");
        for (k, v) in kwargs {
            payload.kwargs.insert((*k).to_string(), Value::from(*v));
        }
        payload
    }

    #[tokio::test]
    async fn superuser_is_created_once() {
        let ctx = context().await;
        let args = payload(&[("username", "root"), ("email", "root@example.com"), ("password", "pw")]);

        ctx.run(&args).await.unwrap();
        ctx.run(&args).await.unwrap();

        let user = ctx.state.store.users().get_by_username("root").await.unwrap().unwrap();
        assert!(user.is_staff);
        assert!(user.is_superuser);
    }

    #[tokio::test]
    async fn superuser_requires_all_arguments() {
        let ctx = context().await;
        let result = ctx.run(&payload(&[("username", "root")])).await;
        assert!(matches!(result, Err(CommandError::MissingArgument(name)) if name == "email"));
    }

    #[tokio::test]
    async fn superuser_username_must_be_a_single_segment() {
        let ctx = context().await;
        let args = payload(&[("username", "../root"), ("email", "root@example.com"), ("password", "pw")]);

        let result = ctx.run(&args).await;
        assert!(matches!(result, Err(CommandError::InvalidArgument { name, .. }) if name == "username"));
        assert!(ctx.state.store.users().get_by_username("../root").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn finalise_deploy_without_password_skips_admin() {
        let ctx = context().await;
        ctx.run(&CommandPayload::new("finalise_deploy")).await.unwrap();
        assert!(ctx.state.store.users().get_by_username("admin").await.unwrap().is_none());
    }
}
