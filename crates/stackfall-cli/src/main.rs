mod command;
mod logger;
mod ui;
mod util;

fn main() -> anyhow::Result<()> {
    command::run()
}
