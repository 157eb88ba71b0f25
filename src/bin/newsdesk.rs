use anyhow::Result;
use newsdesk::app::App;
use newsdesk::auth::EnvSession;
use newsdesk::config::Config;
use newsdesk::terminal;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load()?;
    config.validate()?;

    let auth = Arc::new(EnvSession::from_config(&config));
    let mut app = App::new(&config, auth);

    let mut term = terminal::setup()?;
    let result = app.run(&mut term).await;
    terminal::restore()?;

    result
}
