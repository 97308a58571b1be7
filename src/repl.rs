//! Interactive command loop
//!
//! Reads one command per line from any [`BufRead`] and writes responses to
//! any [`Write`], so the loop runs the same against stdin/stdout and
//! in-memory buffers.

use std::io::{BufRead, Write};

use eyre::{Result, WrapErr};

use crate::calculator::Calculator;
use crate::error::CalcError;
use crate::format::format_decimal;
use crate::operations::Arithmetic;

/// A parsed REPL command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the named operation; operands are prompted for
    Calculate(String),
    History,
    Clear,
    Undo,
    Redo,
    Save,
    Load,
    Help,
    Exit,
    Unknown(String),
}

impl Command {
    /// Parse a command line (case-insensitive)
    ///
    /// Operation names are resolved against `calculator`'s registry, so
    /// runtime-registered operations are accepted too.
    pub fn parse(line: &str, calculator: &Calculator) -> Self {
        let command = line.trim().to_lowercase();
        match command.as_str() {
            "history" => Command::History,
            "clear" => Command::Clear,
            "undo" => Command::Undo,
            "redo" => Command::Redo,
            "save" => Command::Save,
            "load" => Command::Load,
            "help" => Command::Help,
            "exit" | "quit" => Command::Exit,
            name if calculator.registry().contains(name) => Command::Calculate(command),
            _ => Command::Unknown(command),
        }
    }
}

/// Whether the loop keeps going after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Line-oriented calculator session
pub struct Repl<R, W> {
    calculator: Calculator,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Repl<R, W> {
    pub fn new(calculator: Calculator, input: R, output: W) -> Self {
        Self {
            calculator,
            input,
            output,
        }
    }

    pub fn calculator(&self) -> &Calculator {
        &self.calculator
    }

    /// Hand back the calculator and output once the session is over
    pub fn into_parts(self) -> (Calculator, W) {
        (self.calculator, self.output)
    }

    /// Run until `exit` or end of input
    ///
    /// Calculator errors are printed and the loop continues; history is
    /// saved on the way out.
    ///
    /// # Errors
    /// Returns an error only if reading input or writing output fails.
    pub fn run(&mut self) -> Result<()> {
        writeln!(
            self.output,
            "Welcome to the calculator!\nType 'help' for available commands or 'exit' to quit."
        )
        .wrap_err("Failed to write greeting")?;

        loop {
            let Some(line) = self.prompt("\nEnter command: ")? else {
                writeln!(self.output, "\nInput terminated. Exiting...")?;
                self.save_on_exit()?;
                return Ok(());
            };

            if line.is_empty() {
                continue;
            }

            let command = Command::parse(&line, &self.calculator);
            log::debug!("Handling command: {command:?}");

            if self.handle(command)? == Flow::Stop {
                return Ok(());
            }
        }
    }

    fn handle(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Help => self.print_help()?,
            Command::Exit => {
                self.save_on_exit()?;
                return Ok(Flow::Stop);
            }
            Command::History => {
                let lines = self.calculator.show_history();
                if lines.is_empty() {
                    writeln!(self.output, "No calculations in history")?;
                } else {
                    writeln!(self.output, "\nCalculation History:")?;
                    for (i, line) in lines.iter().enumerate() {
                        writeln!(self.output, "{}. {line}", i + 1)?;
                    }
                }
            }
            Command::Clear => {
                self.calculator.clear();
                writeln!(self.output, "History cleared")?;
            }
            Command::Undo => {
                let message = if self.calculator.undo() {
                    "Operation undone"
                } else {
                    "Nothing to undo"
                };
                writeln!(self.output, "{message}")?;
            }
            Command::Redo => {
                let message = if self.calculator.redo() {
                    "Operation redone"
                } else {
                    "Nothing to redo"
                };
                writeln!(self.output, "{message}")?;
            }
            Command::Save => match self.calculator.save() {
                Ok(()) => writeln!(self.output, "History saved successfully")?,
                Err(e) => writeln!(self.output, "Error saving history: {e}")?,
            },
            Command::Load => match self.calculator.load() {
                Ok(()) => {
                    writeln!(self.output, "History loaded successfully")?;
                    for warning in self.calculator.integrity_warnings() {
                        writeln!(self.output, "Warning: {warning}")?;
                    }
                }
                Err(e) => writeln!(self.output, "Error loading history: {e}")?,
            },
            Command::Calculate(name) => return self.calculate(&name),
            Command::Unknown(command) => writeln!(
                self.output,
                "Unknown command: '{command}'. Type 'help' for available commands."
            )?,
        }
        Ok(Flow::Continue)
    }

    fn calculate(&mut self, name: &str) -> Result<Flow> {
        writeln!(self.output, "\nEnter numbers (or 'cancel' to abort):")?;

        let mut operands = Vec::with_capacity(2);
        for label in ["First number: ", "Second number: "] {
            match self.prompt(label)? {
                None => {
                    writeln!(self.output, "\nInput terminated. Exiting...")?;
                    self.save_on_exit()?;
                    return Ok(Flow::Stop);
                }
                Some(text) if text.eq_ignore_ascii_case("cancel") => {
                    writeln!(self.output, "Operation cancelled")?;
                    return Ok(Flow::Continue);
                }
                Some(text) => operands.push(text),
            }
        }

        let outcome = self
            .calculator
            .select_operation(name)
            .and_then(|()| self.calculator.perform(&operands[0], &operands[1]));

        match outcome {
            Ok(result) => {
                let shown = format_decimal(result, self.calculator.config().precision);
                writeln!(self.output, "\nResult: {shown}")?;
            }
            Err(e @ (CalcError::Validation(_) | CalcError::Operation(_))) => {
                writeln!(self.output, "Error: {e}")?;
            }
            Err(e) => writeln!(self.output, "Unexpected error: {e}")?,
        }
        Ok(Flow::Continue)
    }

    fn print_help(&mut self) -> Result<()> {
        writeln!(self.output, "\nAvailable commands:")?;
        for op in Arithmetic::ALL {
            writeln!(self.output, "  {:<11} - {}", op.key(), op.summary())?;
        }

        let custom: Vec<String> = self
            .calculator
            .registry()
            .names()
            .into_iter()
            .filter(|name| Arithmetic::ALL.iter().all(|op| op.key() != name.as_str()))
            .collect();
        if !custom.is_empty() {
            writeln!(self.output, "  {:<11} - custom operations", custom.join(", "))?;
        }

        writeln!(self.output, "  history     - Show calculation history")?;
        writeln!(self.output, "  clear       - Clear calculation history")?;
        writeln!(self.output, "  undo        - Undo the last calculation")?;
        writeln!(self.output, "  redo        - Redo the last undone calculation")?;
        writeln!(self.output, "  save        - Save calculation history to file")?;
        writeln!(self.output, "  load        - Load calculation history from file")?;
        writeln!(self.output, "  exit        - Exit the calculator")?;
        Ok(())
    }

    fn save_on_exit(&mut self) -> Result<()> {
        match self.calculator.save() {
            Ok(()) => writeln!(self.output, "History saved successfully.")?,
            Err(e) => writeln!(self.output, "Warning: Could not save history: {e}")?,
        }
        writeln!(self.output, "Goodbye!")?;
        Ok(())
    }

    /// Print `label` and read one trimmed line; `None` at end of input
    fn prompt(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{label}").wrap_err("Failed to write prompt")?;
        self.output.flush().wrap_err("Failed to flush output")?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .wrap_err("Failed to read line from input")?;

        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}
