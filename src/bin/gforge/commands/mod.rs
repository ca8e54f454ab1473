mod build;
mod create;
mod info;

use build::run_build;
use create::run_create;
use info::run_info;

use anyhow::Result;

use crate::cli::{Command, GlobalOptions};
use crate::display::Context;

pub fn dispatch(command: Command, global: &GlobalOptions, ctx: Context) -> Result<()> {
    match command {
        Command::Create(args) => run_create(args, global, ctx),
        Command::Build(args) => run_build(args, global, ctx),
        Command::Info(args) => run_info(args, global, ctx),
    }
}
