//! The `quizgrade validate` command.

use std::path::PathBuf;

use anyhow::Result;

use super::Completion;

pub fn execute(bank_path: PathBuf) -> Result<Completion> {
    let banks = quizgrade_core::parser::load_banks(&bank_path)?;

    let mut total_warnings = 0;

    for bank in &banks {
        println!("Bank: {} ({} questions)", bank.name, bank.question_count());

        let warnings = quizgrade_core::parser::validate_bank(bank);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All question banks valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(Completion::Done)
}
