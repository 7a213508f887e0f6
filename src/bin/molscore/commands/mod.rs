mod metric;
mod top1;

use metric::run_metric;
use top1::run_top1;

use anyhow::Result;

use crate::cli::Command;
use crate::display::Context;

pub fn dispatch(command: Command, ctx: Context) -> Result<()> {
    match command {
        Command::Metric(args) => run_metric(args, ctx),
        Command::Top1(args) => run_top1(args, ctx),
    }
}
