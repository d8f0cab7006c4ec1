use super::commands::{Command, HELP};
use super::render_results;
use crate::catalog::{DurationRange, SearchClient, Track};
use crate::error::Error;
use crate::playback::{PlayOutcome, Player};
use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

/// What the loop should do after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct App {
    search: SearchClient,
    player: Player,
    range: DurationRange,
    results: Vec<Track>,
}

impl App {
    pub fn new(search: SearchClient, player: Player, range: DurationRange) -> Self {
        Self {
            search,
            player,
            range,
            results: Vec::new(),
        }
    }

    pub fn results(&self) -> &[Track] {
        &self.results
    }

    pub fn range(&self) -> DurationRange {
        self.range
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Read commands line by line until quit or end of input
    pub async fn run<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        println!("Please type a search term, 'q' to quit or 'help'...");

        let mut lines = input.lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim() == "help" {
                println!("{}", HELP);
                continue;
            }

            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            };

            if self.handle(command).await == Flow::Exit {
                break;
            }
        }

        self.player.stop()?;
        info!("Session ended");
        Ok(())
    }

    /// Run one command. Errors are printed, never propagated.
    pub async fn handle(&mut self, command: Command) -> Flow {
        debug!("Command: {:?}", command);

        match command {
            Command::Empty => {}
            Command::Quit => return Flow::Exit,
            Command::Stop => match self.player.stop() {
                Ok(true) => println!("Stopped."),
                Ok(false) => println!("Nothing is playing (type 'q' to quit)."),
                Err(e) => report(&e),
            },
            Command::List => self.show_results(),
            Command::SetRange {
                min_minutes,
                max_minutes,
            } => {
                self.range = DurationRange::from_minutes(min_minutes, max_minutes);
                println!("Searching for tracks between {} and {} minutes", min_minutes, max_minutes);
            }
            Command::Info(index) => match self.results.get(index) {
                Some(track) if track.has_description() => println!("{}", track.description),
                Some(_) => println!("No description for track {}", index),
                None => println!("There is no such track in the list"),
            },
            Command::Play(index) => self.play(index).await,
            Command::Search(query) => {
                println!("Searching {}\n", query);
                match self.search.search(&query, self.range).await {
                    Ok(tracks) => {
                        self.results = tracks;
                        println!("... end of search");
                        self.show_results();
                    }
                    Err(e) => report(&e),
                }
            }
        }

        Flow::Continue
    }

    async fn play(&mut self, index: usize) {
        match self.player.play(&self.results, index).await {
            Ok(PlayOutcome::Staged { path, format, .. }) => {
                println!("🎵 Playing from local file {} ({:?})", path.display(), format);
            }
            Ok(PlayOutcome::Streaming { .. }) => println!("🎵 Streaming..."),
            Err(Error::NotReady { .. }) => println!("❌ Could not download the file ;("),
            Err(e) => report(&e),
        }
    }

    fn show_results(&self) {
        for line in render_results(&self.results) {
            println!("{}", line);
        }
    }
}

fn report(error: &Error) {
    println!("❌ {}", error);
}
