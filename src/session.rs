use std::io::{BufRead, Write};

use tracing::{debug, error};

use crate::chatbot::{PoetryChatbot, DEFAULT_CHAT_MAX_LENGTH, DEFAULT_POEM_MAX_LENGTH};
use crate::error::Result;
use crate::prompts::TOPIC_CATALOG;

const SEPARATOR_WIDTH: usize = 50;
const GENERATION_FAILED: &str =
    "Sorry, something went wrong while generating a response. Please try again.";

/// Where the user currently is in the menus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    MainMenu,
    Chat,
    /// Poem generation entered from inside chat; `back` returns to chat.
    ChatPoem,
    /// Poem generation entered from the main menu; `menu` returns there.
    Poem,
}

/// What a line of input means in a given [`Mode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Enter(Mode),
    Farewell,
    Quit,
    Topics,
    Invalid,
    Chat(String),
    Poem(String),
}

/// Why [`ConsoleSession::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// `3` at the main menu.
    Farewell,
    /// `quit` at any depth.
    Quit,
    EndOfInput,
}

impl Mode {
    /// Transition table. `input` is already trimmed.
    pub fn route(self, input: &str) -> Command {
        let keyword = input.to_lowercase();
        match (self, keyword.as_str()) {
            (Mode::MainMenu, _) => match input {
                "1" => Command::Enter(Mode::Chat),
                "2" => Command::Enter(Mode::Poem),
                "3" => Command::Farewell,
                _ => Command::Invalid,
            },
            (_, "quit") => Command::Quit,
            (Mode::Chat, "menu") | (Mode::Poem, "menu") => Command::Enter(Mode::MainMenu),
            (Mode::Chat, "poem") => Command::Enter(Mode::ChatPoem),
            (Mode::Chat, _) => Command::Chat(input.to_string()),
            (Mode::ChatPoem, "back") => Command::Enter(Mode::Chat),
            (Mode::ChatPoem, "topics") | (Mode::Poem, "topics") => Command::Topics,
            (Mode::ChatPoem, _) | (Mode::Poem, _) => Command::Poem(input.to_string()),
        }
    }

    fn input_prompt(self) -> &'static str {
        match self {
            Mode::MainMenu => "Enter your choice (1-3): ",
            Mode::Chat => "\nYou: ",
            Mode::ChatPoem | Mode::Poem => "\nEnter a theme for your poem: ",
        }
    }
}

/// Interactive menu loop over any line source and output sink.
pub struct ConsoleSession<'a, R, W> {
    bot: &'a PoetryChatbot,
    input: R,
    output: W,
}

impl<'a, R: BufRead, W: Write> ConsoleSession<'a, R, W> {
    pub fn new(bot: &'a PoetryChatbot, input: R, output: W) -> Self {
        ConsoleSession { bot, input, output }
    }

    pub fn run(&mut self) -> Result<Exit> {
        let mut mode = Mode::MainMenu;
        loop {
            if mode == Mode::MainMenu {
                self.show_banner(mode)?;
            }
            let Some(line) = self.read_line(mode.input_prompt())? else {
                debug!(?mode, "input closed");
                writeln!(self.output)?;
                return Ok(Exit::EndOfInput);
            };

            match mode.route(&line) {
                Command::Enter(next) => {
                    debug!(from = ?mode, to = ?next, "mode change");
                    mode = next;
                    if mode != Mode::MainMenu {
                        self.show_banner(mode)?;
                    }
                }
                Command::Farewell => {
                    writeln!(self.output, "Goodbye!")?;
                    return Ok(Exit::Farewell);
                }
                Command::Quit => return Ok(Exit::Quit),
                Command::Topics => self.show_topics()?,
                Command::Invalid => writeln!(self.output, "Invalid choice. Please try again.")?,
                Command::Chat(utterance) => self.chat(&utterance)?,
                Command::Poem(theme) => self.poem(&theme)?,
            }
        }
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut buffer = String::new();
        if self.input.read_line(&mut buffer)? == 0 {
            return Ok(None);
        }
        Ok(Some(buffer.trim().to_string()))
    }

    fn chat(&mut self, utterance: &str) -> Result<()> {
        match self
            .bot
            .generate_chat_response(utterance, DEFAULT_CHAT_MAX_LENGTH)
        {
            Ok(reply) => writeln!(self.output, "Bot: {reply}")?,
            Err(err) => {
                error!(error = %err, "chat generation failed");
                writeln!(self.output, "{GENERATION_FAILED}")?;
            }
        }
        Ok(())
    }

    fn poem(&mut self, theme: &str) -> Result<()> {
        writeln!(self.output, "\nGenerating your poem...")?;
        match self.bot.generate_poem(theme, DEFAULT_POEM_MAX_LENGTH) {
            Ok(poem) => {
                let separator = "-".repeat(SEPARATOR_WIDTH);
                writeln!(self.output, "\nYour generated poem:")?;
                writeln!(self.output, "{separator}")?;
                writeln!(self.output, "{poem}")?;
                writeln!(self.output, "{separator}")?;
            }
            Err(err) => {
                error!(error = %err, theme, "poem generation failed");
                writeln!(self.output, "{GENERATION_FAILED}")?;
            }
        }
        Ok(())
    }

    fn show_banner(&mut self, mode: Mode) -> Result<()> {
        let lines: &[&str] = match mode {
            Mode::MainMenu => &[
                "\n=== Main Menu ===",
                "1. Chat with AI",
                "2. Generate Poem",
                "3. Exit",
                "================",
            ],
            Mode::Chat => &[
                "\n=== Chat Mode ===",
                "Type 'menu' to return to main menu",
                "Type 'quit' to exit",
                "Type 'poem' to generate a poem",
                "=================",
            ],
            Mode::ChatPoem => &[
                "\n=== Poem Generation Mode ===",
                "Type 'back' to return to chat",
                "Type 'quit' to exit",
                "Type 'topics' to see available topics",
                "===========================",
            ],
            Mode::Poem => &[
                "\n=== Poem Generation Mode ===",
                "Type 'menu' to return to main menu",
                "Type 'quit' to exit",
                "Type 'topics' to see available topics",
                "===========================",
            ],
        };
        for line in lines {
            writeln!(self.output, "{line}")?;
        }
        Ok(())
    }

    fn show_topics(&mut self) -> Result<()> {
        writeln!(self.output, "\nAvailable poem topics:")?;
        for (index, (category, members)) in TOPIC_CATALOG.iter().enumerate() {
            if index > 0 {
                writeln!(self.output)?;
            }
            writeln!(self.output, "{}. {category}:", index + 1)?;
            for member in members.iter() {
                writeln!(self.output, "   - {member}")?;
            }
        }
        Ok(())
    }
}
