//! Interaction with the user during the conversion of a contest.

use anyhow::{Context, Error};
use dialoguer::Confirm;

use polyconv_format::contest::{Confirmation, ValidationOutcome, Validator};
use polyconv_format::polygon::ContestProblem;

/// Asks on the terminal whether to continue after some validations failed.
#[derive(Debug, Clone, Default)]
pub struct TerminalConfirmation {
    /// Always continue, without asking.
    pub assume_yes: bool,
}

impl TerminalConfirmation {
    pub fn new(assume_yes: bool) -> TerminalConfirmation {
        TerminalConfirmation { assume_yes }
    }
}

impl Confirmation for TerminalConfirmation {
    fn confirm(&mut self, failed: &[String]) -> Result<bool, Error> {
        println!(
            "The validation has found some errors in: {}",
            failed.join(", ")
        );
        if self.assume_yes {
            println!("Continuing anyway (--yes)");
            return Ok(true);
        }
        Confirm::new()
            .with_prompt("Do you want to continue anyway?")
            .default(false)
            .interact()
            .context("Failed to ask for confirmation")
    }
}

/// Prints the outcome of the validations done by the inner validator. The output of the validation
/// is not printed, the inner validator is expected to echo it while it runs.
#[derive(Debug)]
pub struct PrintingValidator<V> {
    inner: V,
}

impl<V: Validator> PrintingValidator<V> {
    pub fn new(inner: V) -> PrintingValidator<V> {
        PrintingValidator { inner }
    }
}

impl<V: Validator> Validator for PrintingValidator<V> {
    fn validate(&mut self, problem: &ContestProblem) -> Result<ValidationOutcome, Error> {
        println!("Validating {} ({})...", problem.index, problem.short_name);
        let outcome = self.inner.validate(problem);
        match &outcome {
            Ok(outcome) if outcome.success => println!("{}: ok", problem.short_name),
            Ok(_) => println!("{}: FAILED", problem.short_name),
            Err(e) => println!("{}: FAILED ({:#})", problem.short_name, e),
        }
        outcome
    }
}
