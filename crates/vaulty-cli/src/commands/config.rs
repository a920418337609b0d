//! Configuration commands

use vaulty_core::Context;

use super::print_data;
use crate::error::Result;

/// Run the config show command
pub fn run_config_show(ctx: &Context, json: bool) -> Result<()> {
    let config = ctx.config()?;
    print_data(config.as_ref(), json)
}

/// Run the config source command
pub fn run_config_source(ctx: &Context) -> Result<()> {
    println!("{}", ctx.config()?.source);
    Ok(())
}

/// Run the config default command
pub fn run_config_default(ctx: &Context, json: bool) -> Result<()> {
    print_data(&ctx.default_config(), json)
}
