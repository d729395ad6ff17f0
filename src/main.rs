mod backend;
mod chatbot;
mod error;
mod generation;
mod logging;
mod prompts;
mod session;
mod settings;

use std::io;

use session::{ConsoleSession, Exit};
use settings::Settings;
use tracing::info;

fn main() -> error::Result<()> {
    let settings = Settings::load()?;
    logging::init_logging(&settings.log_filter)?;

    println!("Welcome to the Poetry Chatbot!");
    println!("This AI can chat with you and generate poems.");

    println!("\nInitializing chatbot...");
    let bot = backend::load(&settings)?;
    println!("Chatbot is ready!");

    let stdin = io::stdin();
    let exit = ConsoleSession::new(&bot, stdin.lock(), io::stdout()).run()?;
    info!(?exit, "session ended");
    if exit == Exit::Quit {
        // Leave right away, skipping destructors for the loaded models.
        std::process::exit(0);
    }
    Ok(())
}
