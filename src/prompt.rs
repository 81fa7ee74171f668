use crate::error::{LockerError, Result};
use std::io::{self, BufRead, Write};
use zeroize::Zeroizing;

const PASSWORD_ATTEMPTS: usize = 3;

/// Asks for a password twice until both entries match and meet `min_len`.
pub fn read_confirmed_password(min_len: usize) -> Result<String> {
    for _ in 0..PASSWORD_ATTEMPTS {
        let mut password = Zeroizing::new(rpassword::prompt_password("Password: ")?);
        if password.is_empty() {
            println!("Enter a password.");
            continue;
        }
        if password.chars().count() < min_len {
            println!("Password must be at least {min_len} characters.");
            continue;
        }
        let confirm = Zeroizing::new(rpassword::prompt_password("Confirm password: ")?);
        if *password != *confirm {
            println!("Passwords do not match.");
            continue;
        }
        return Ok(std::mem::take(&mut *password));
    }
    Err(LockerError::Cancelled)
}

/// Reads one line from stdin. `None` on end of input.
pub fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    let n = io::stdin().lock().read_line(&mut line)?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
