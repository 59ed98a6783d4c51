//! Console Module
//!
//! Interactive text menu over a [`CatalogService`].
//!
//! The console owns prompting, numeric parsing, confirmation and display.
//! Input errors are reported and the menu continues; the store is only
//! touched once a full, valid request has been collected.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use crate::error::{CatalogError, Result};
use crate::record::{Record, RecordPatch};
use crate::service::CatalogService;

const RULE_WIDE: usize = 50;
const RULE_NARROW: usize = 30;

/// One read from the console's input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    Text(String),
    /// No more input
    End,
    /// The user asked to quit (Ctrl-C)
    Interrupted,
}

/// Where the console reads its answers from
///
/// Every `BufRead` is a source. A line that is not valid UTF-8 comes back as
/// an `InvalidData` error after being consumed, so the next read moves on.
pub trait LineSource {
    fn next_line(&mut self) -> io::Result<Line>;
}

impl<T: BufRead> LineSource for T {
    fn next_line(&mut self) -> io::Result<Line> {
        let mut raw = Vec::new();
        if self.read_until(b'\n', &mut raw)? == 0 {
            return Ok(Line::End);
        }
        String::from_utf8(raw)
            .map(Line::Text)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// Whether the menu loop keeps going
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit,
}

/// Menu-driven front-end reading from `R` and writing to `W`
pub struct Console<R, W> {
    input: R,
    output: W,
    interrupted: bool,
}

impl<R: LineSource, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            interrupted: false,
        }
    }

    /// Run the menu until the user exits, input ends or an interrupt arrives
    pub fn run(&mut self, service: &mut CatalogService) -> Result<()> {
        loop {
            let flow = match self.step(service) {
                Ok(flow) => flow,
                Err(e) if e.is_validation() => {
                    self.report(&e)?;
                    Flow::Continue
                }
                Err(e) => return Err(e),
            };

            if flow == Flow::Exit {
                break;
            }
        }

        if self.interrupted {
            writeln!(self.output, "\nProgram interrupted. Closing the catalog.")?;
        }
        Ok(())
    }

    /// True if the last run ended on an interrupt
    pub fn was_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Consume the console, returning its output sink
    pub fn into_output(self) -> W {
        self.output
    }

    // =========================================================================
    // Menu actions
    // =========================================================================

    fn step(&mut self, service: &mut CatalogService) -> Result<Flow> {
        self.print_menu()?;
        let Some(choice) = self.prompt("Choose an option (1-6): ")? else {
            return Ok(Flow::Exit);
        };

        let flow = match choice.as_str() {
            "1" => self.add(service)?,
            "2" => self.edit(service)?,
            "3" => self.remove(service)?,
            "4" => self.search(service)?,
            "5" => {
                self.show_all(service)?;
                Flow::Continue
            }
            "6" => {
                writeln!(self.output, "Goodbye!")?;
                Flow::Exit
            }
            _ => {
                writeln!(self.output, "Invalid option. Please choose 1-6.")?;
                Flow::Continue
            }
        };
        Ok(flow)
    }

    fn add(&mut self, service: &mut CatalogService) -> Result<Flow> {
        writeln!(self.output, "\n--- ADD GAME ---")?;

        let Some(name) = self.prompt("Name: ")? else { return Ok(Flow::Exit) };
        let Some(age_rating) = self.prompt("Age rating (e.g. E, T, M, A): ")? else {
            return Ok(Flow::Exit);
        };
        let Some(difficulty) = self.prompt("Difficulty (e.g. Easy, Medium, Hard): ")? else {
            return Ok(Flow::Exit);
        };
        let Some(hours) = self.prompt("Approximate hours to play: ")? else {
            return Ok(Flow::Exit);
        };
        let Ok(hours_approx) = parse_number::<f64>(&hours) else {
            writeln!(self.output, "Error: hours must be a number.")?;
            return Ok(Flow::Continue);
        };
        let Some(platform) = self.prompt("Platform (e.g. PC, PS5, Xbox, Switch): ")? else {
            return Ok(Flow::Exit);
        };
        let Some(price) = self.prompt("Price: $")? else { return Ok(Flow::Exit) };
        let Ok(price) = parse_number::<f64>(&price) else {
            writeln!(self.output, "Error: price must be a number.")?;
            return Ok(Flow::Continue);
        };

        let record = Record::new(name, age_rating, difficulty, hours_approx, platform, price);
        let name = record.name.clone();
        match service.create(record) {
            Ok(id) => writeln!(self.output, "Game '{}' added with ID: {}", name, id)?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn edit(&mut self, service: &mut CatalogService) -> Result<Flow> {
        writeln!(self.output, "\n--- EDIT GAME ---")?;
        self.show_all(service)?;

        let Some((id, current)) = self.select(service, "ID of the game to edit: ")? else {
            return Ok(Flow::Continue);
        };

        writeln!(self.output, "\nEditing: {}", current.name)?;
        writeln!(self.output, "(Leave blank to keep the current value)")?;

        let mut patch = RecordPatch::new();
        let Some(name) = self.prompt(&format!("Name [{}]: ", current.name))? else {
            return Ok(Flow::Exit);
        };
        patch.name = non_blank(name);

        let Some(age) = self.prompt(&format!("Age rating [{}]: ", current.age_rating))? else {
            return Ok(Flow::Exit);
        };
        patch.age_rating = non_blank(age);

        let Some(difficulty) = self.prompt(&format!("Difficulty [{}]: ", current.difficulty))?
        else {
            return Ok(Flow::Exit);
        };
        patch.difficulty = non_blank(difficulty);

        let Some(hours) = self.prompt(&format!(
            "Hours approx [{}]: ",
            crate::search::render_number(current.hours_approx)
        ))?
        else {
            return Ok(Flow::Exit);
        };
        if !hours.is_empty() {
            let Ok(hours) = parse_number::<f64>(&hours) else {
                writeln!(self.output, "Error: hours must be a number.")?;
                return Ok(Flow::Continue);
            };
            patch.hours_approx = Some(hours);
        }

        let Some(platform) = self.prompt(&format!("Platform [{}]: ", current.platform))? else {
            return Ok(Flow::Exit);
        };
        patch.platform = non_blank(platform);

        let Some(price) = self.prompt(&format!(
            "Price [${}]: $",
            crate::search::render_number(current.price)
        ))?
        else {
            return Ok(Flow::Exit);
        };
        if !price.is_empty() {
            let Ok(price) = parse_number::<f64>(&price) else {
                writeln!(self.output, "Error: price must be a number.")?;
                return Ok(Flow::Continue);
            };
            patch.price = Some(price);
        }

        match service.update(id, patch) {
            Ok(updated) => writeln!(self.output, "Game '{}' updated.", updated.name)?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn remove(&mut self, service: &mut CatalogService) -> Result<Flow> {
        writeln!(self.output, "\n--- DELETE GAME ---")?;
        self.show_all(service)?;

        let Some((id, current)) = self.select(service, "ID of the game to delete: ")? else {
            return Ok(Flow::Continue);
        };

        let Some(answer) = self.prompt(&format!(
            "Are you sure you want to delete '{}'? (y/n): ",
            current.name
        ))?
        else {
            return Ok(Flow::Exit);
        };

        if !answer.eq_ignore_ascii_case("y") {
            writeln!(self.output, "Deletion cancelled.")?;
            return Ok(Flow::Continue);
        }

        match service.delete(id) {
            Ok(removed) => writeln!(self.output, "Game '{}' deleted.", removed.name)?,
            Err(e) => self.report(&e)?,
        }
        Ok(Flow::Continue)
    }

    fn search(&mut self, service: &CatalogService) -> Result<Flow> {
        writeln!(self.output, "\n--- SEARCH GAMES ---")?;

        if service.count() == 0 {
            writeln!(self.output, "The catalog is empty.")?;
            return Ok(Flow::Continue);
        }

        let Some(text) = self.prompt(
            "Text to search (name, age rating, difficulty, hours, platform or price): ",
        )?
        else {
            return Ok(Flow::Exit);
        };

        let results = match service.search(&text) {
            Ok(results) => results,
            Err(e) if e.is_validation() => {
                writeln!(self.output, "Please enter some text to search for.")?;
                return Ok(Flow::Continue);
            }
            Err(e) => return Err(e),
        };

        if results.is_empty() {
            writeln!(self.output, "No games match the search.")?;
            return Ok(Flow::Continue);
        }

        writeln!(self.output, "\nFound {} result(s):", results.len())?;
        writeln!(self.output, "{}", "-".repeat(RULE_WIDE))?;
        for (id, record) in &results {
            self.print_record(*id, record)?;
        }
        Ok(Flow::Continue)
    }

    fn show_all(&mut self, service: &CatalogService) -> Result<()> {
        writeln!(self.output, "\n--- ALL GAMES ---")?;

        let all = service.list();
        if all.is_empty() {
            writeln!(self.output, "The catalog is empty.")?;
            return Ok(());
        }
        for (id, record) in &all {
            self.print_record(*id, record)?;
        }
        Ok(())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Ask for an id and look it up; reports and returns `None` on failure
    fn select(&mut self, service: &CatalogService, label: &str) -> Result<Option<(u64, Record)>> {
        let Some(raw) = self.prompt(label)? else {
            return Ok(None);
        };
        let Ok(id) = parse_number::<u64>(&raw) else {
            writeln!(self.output, "Error: ID must be a whole number.")?;
            return Ok(None);
        };
        match service.read(id) {
            Ok(record) => Ok(Some((id, record))),
            Err(e) if e.is_not_found() => {
                writeln!(self.output, "Error: ID not found.")?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Print a prompt and read one trimmed line
    ///
    /// `None` at end of input or on interrupt. Undecodable input is a
    /// validation error, which `run` reports before showing the menu again.
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{}", label)?;
        self.output.flush()?;

        match self.input.next_line() {
            Ok(Line::Text(line)) => Ok(Some(line.trim().to_string())),
            Ok(Line::End) => Ok(None),
            Ok(Line::Interrupted) => {
                self.interrupted = true;
                Ok(None)
            }
            Err(e) if e.kind() == io::ErrorKind::InvalidData => Err(CatalogError::Validation(
                "input is not valid UTF-8 text".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    fn print_menu(&mut self) -> Result<()> {
        let wide = "=".repeat(RULE_WIDE);
        writeln!(self.output, "\n{}", wide)?;
        writeln!(self.output, "VIDEO GAME CATALOG")?;
        writeln!(self.output, "{}", wide)?;
        writeln!(self.output, "1. Add game")?;
        writeln!(self.output, "2. Edit game")?;
        writeln!(self.output, "3. Delete game")?;
        writeln!(self.output, "4. Search games")?;
        writeln!(self.output, "5. List all games")?;
        writeln!(self.output, "6. Exit")?;
        writeln!(self.output, "{}", "-".repeat(RULE_WIDE))?;
        Ok(())
    }

    fn print_record(&mut self, id: u64, record: &Record) -> Result<()> {
        writeln!(self.output, "ID: {}", id)?;
        writeln!(self.output, "{}", record)?;
        writeln!(self.output, "{}", "-".repeat(RULE_NARROW))?;
        Ok(())
    }

    /// Surface a service error without leaving the menu
    fn report(&mut self, err: &CatalogError) -> Result<()> {
        writeln!(self.output, "Error: {}", err)?;
        Ok(())
    }
}

fn parse_number<T: FromStr>(raw: &str) -> std::result::Result<T, T::Err> {
    raw.trim().parse::<T>()
}

fn non_blank(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
