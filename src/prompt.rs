use std::io::{BufRead, Write};

use crate::error::{Error, Result};

/// Asks for a 1-based choice until a valid one is entered.
pub fn choose_index<R: BufRead, W: Write>(input: &mut R, output: &mut W, len: usize) -> Result<usize> {
    if len == 0 {
        return Err(Error::Prompt("nothing to choose from".to_string()));
    }
    let io_err = |e: std::io::Error| Error::Prompt(e.to_string());

    loop {
        write!(output, "\nSelect playlist (1-{len}): ").map_err(io_err)?;
        output.flush().map_err(io_err)?;

        let mut line = String::new();
        if input.read_line(&mut line).map_err(io_err)? == 0 {
            return Err(Error::Prompt("input closed before a choice was made".to_string()));
        }

        match line.trim().parse::<usize>() {
            Ok(choice) if (1..=len).contains(&choice) => return Ok(choice - 1),
            Ok(_) => writeln!(output, "Invalid selection. Please try again.").map_err(io_err)?,
            Err(_) => writeln!(output, "Please enter a valid number.").map_err(io_err)?,
        }
    }
}
