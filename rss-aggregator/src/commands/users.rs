use super::{required_arg, CommandContext, PublicCommand};
use crate::types::Result;
use async_trait::async_trait;
use interfaces::UserStore;

pub struct Register;

#[async_trait]
impl PublicCommand for Register {
    async fn run(&self, ctx: &mut CommandContext, args: &[String]) -> Result<()> {
        let name = required_arg(args, 0, "register <name>")?;

        let user = ctx.store.create_user(name).await?;
        ctx.config.set_user(&user.name)?;

        println!("User {} created", user.name);
        Ok(())
    }
}

pub struct Login;

#[async_trait]
impl PublicCommand for Login {
    async fn run(&self, ctx: &mut CommandContext, args: &[String]) -> Result<()> {
        let name = required_arg(args, 0, "login <name>")?;

        let user = ctx.store.get_user(name).await?;
        ctx.config.set_user(&user.name)?;

        println!("User has been set to {}", user.name);
        Ok(())
    }
}

pub struct Reset;

#[async_trait]
impl PublicCommand for Reset {
    async fn run(&self, ctx: &mut CommandContext, _args: &[String]) -> Result<()> {
        ctx.store.reset().await?;
        println!("Database reset");
        Ok(())
    }
}

pub struct Users;

#[async_trait]
impl PublicCommand for Users {
    async fn run(&self, ctx: &mut CommandContext, _args: &[String]) -> Result<()> {
        let current = ctx.config.current_user();

        for user in ctx.store.list_users().await? {
            if Some(user.name.as_str()) == current {
                println!("* {} (current)", user.name);
            } else {
                println!("* {}", user.name);
            }
        }
        Ok(())
    }
}
